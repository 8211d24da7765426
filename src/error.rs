//! Error Types Module
//!
//! クレート全体で使用する構造化エラー型を定義するモジュール。
//! `thiserror`を使用して、エラーの自動変換とメッセージフォーマットを実現する。

use std::path::PathBuf;

use thiserror::Error;

/// xlsxdatasheetクレート全体で使用するエラー型
///
/// カタログの読み込み、製品の選択、データシートの描画中に発生する
/// 致命的なエラーを統一的に扱います。
///
/// 不正な列名や空のセル値、解析できない日付などの「回復可能」な問題は
/// このエラー型では表現されません。それらは表示から省略されるか、
/// 生の値にフォールバックします。
///
/// # 使用例
///
/// ```rust,no_run
/// use xlsxdatasheet::{CatalogLoader, DatasheetError};
///
/// fn product_count(path: &str) -> Result<usize, DatasheetError> {
///     let catalog = CatalogLoader::default().load_path(path)?;
///     Ok(catalog.product_names().len())
/// }
/// ```
#[derive(Error, Debug)]
pub enum DatasheetError {
    /// I/O操作中に発生したエラー
    ///
    /// `#[from]`属性により、`std::io::Error`から自動的に変換されます。
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// スプレッドシートの解析中に発生したエラー（calamine由来）
    #[error("Failed to parse spreadsheet: {0}")]
    Parse(#[from] calamine::Error),

    /// ZIPアーカイブの解析エラー
    #[error("ZIP archive error: {0}")]
    Zip(String),

    /// カタログを構築できないエラー
    ///
    /// 識別子列（`id`）や製品名列（`nom`）が存在しない場合、
    /// シートが空の場合などに発生します。
    #[error("Failed to load catalog: {0}")]
    Load(String),

    /// フッター用の静的画像が存在しない、または読み込めない
    #[error("Static asset missing: {}", path.display())]
    AssetMissing {
        /// 見つからなかった画像のパス
        path: PathBuf,
    },

    /// 指定された製品名がカタログに存在しない
    #[error("Product '{0}' not found in catalog")]
    ProductNotFound(String),

    /// 設定の検証に失敗したエラー
    ///
    /// `ViewerBuilder::build()`時に設定を検証し、無効な設定が検出された
    /// 場合に発生します。
    ///
    /// ```rust,no_run
    /// use xlsxdatasheet::{DateFormat, DatasheetError, ViewerBuilder};
    ///
    /// let result = ViewerBuilder::new()
    ///     .with_date_format(DateFormat::Custom(String::new()))
    ///     .build();
    ///
    /// if let Err(DatasheetError::Config(msg)) = result {
    ///     println!("設定エラー: {}", msg);
    /// }
    /// ```
    #[error("Configuration error: {0}")]
    Config(String),

    /// セキュリティ制限に違反したエラー
    ///
    /// ZIP bomb、パストラバーサル、入力サイズ上限などの違反です。
    #[error("Security violation: {0}")]
    SecurityViolation(String),
}
