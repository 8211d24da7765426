//! Footer Assets Module
//!
//! フッターに表示する2つの静的画像（`images/afaq.png`、`images/latty.jpg`）と
//! 固定文言を扱うモジュール。画像が存在しない場合、フッターは描画できません。

use std::path::{Path, PathBuf};

use crate::error::DatasheetError;

/// 画像を配置するサブディレクトリ
const IMAGES_DIR: &str = "images";

/// フッター画像の表示幅（ピクセル）
const DISPLAY_WIDTH: u32 = 60;

/// 保管に関する注意書き（参照文書名の前後）
pub(crate) const STORAGE_NOTICE_LEAD: &str =
    "Les recommandations et limites de stockage avant utilisation sont décrites dans le document référencé";
pub(crate) const STORAGE_DOCUMENT: &str = "AQ SPE 009";
pub(crate) const STORAGE_NOTICE_TAIL: &str = "disponible sur notre site internet.";

/// 会社所在地
pub(crate) const COMPANY_ADDRESS: &str =
    "LATTY® International – 1 rue Xavier Latty – 28160 BROU – www.latty.com";

/// フッター画像
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FooterImage {
    /// 出力中で参照する相対パス（例: `images/afaq.png`）
    pub href: String,
    /// 代替テキスト
    pub alt: &'static str,
    /// 表示幅
    pub width: u32,
    /// 縦横比を保った表示高さ
    pub height: u32,
    /// 読み込んだ画像ファイル
    pub(crate) source: PathBuf,
}

impl FooterImage {
    fn load(root: &Path, file_name: &str, alt: &'static str) -> Result<Self, DatasheetError> {
        let path: PathBuf = root.join(IMAGES_DIR).join(file_name);
        if !path.is_file() {
            return Err(DatasheetError::AssetMissing { path });
        }

        // ヘッダーのみを読み取り、画像として解釈できることを確認する
        let (width, height) = match image::image_dimensions(&path) {
            Ok(dims) => dims,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "footer image is not decodable");
                return Err(DatasheetError::AssetMissing { path });
            }
        };

        Ok(Self {
            href: format!("{}/{}", IMAGES_DIR, file_name),
            alt,
            width: DISPLAY_WIDTH,
            height: scaled_height(width, height),
            source: path,
        })
    }

    /// 読み込んだ画像ファイルのパス
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// `dir`を基準に`href`の位置へ画像を複製する（同一ファイルの場合は何もしない）
    fn publish(&self, dir: &Path) -> Result<(), DatasheetError> {
        let target = dir.join(&self.href);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        if target.exists()
            && std::fs::canonicalize(&target)? == std::fs::canonicalize(&self.source)?
        {
            return Ok(());
        }
        std::fs::copy(&self.source, &target)?;
        Ok(())
    }
}

/// データシートのフッター
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Footer {
    /// 左側の画像（AFAQ認証マーク）
    pub left: FooterImage,
    /// 右側の画像（会社ロゴ）
    pub right: FooterImage,
}

impl Footer {
    /// `root/images/`から2つの画像を読み込む
    ///
    /// # 発生し得るエラー
    ///
    /// * `DatasheetError::AssetMissing` - いずれかの画像が存在しない、または読み込めない
    pub fn load(root: impl AsRef<Path>) -> Result<Self, DatasheetError> {
        let root = root.as_ref();
        Ok(Self {
            left: FooterImage::load(root, "afaq.png", "AFAQ")?,
            right: FooterImage::load(root, "latty.jpg", "LATTY")?,
        })
    }

    /// 出力ディレクトリから`href`で参照できるよう、画像を`dir/images/`へ複製する
    pub fn publish(&self, dir: impl AsRef<Path>) -> Result<(), DatasheetError> {
        let dir = dir.as_ref();
        self.left.publish(dir)?;
        self.right.publish(dir)?;
        tracing::debug!(dir = %dir.display(), "footer images published");
        Ok(())
    }

    /// 保管に関する注意書き（プレーンテキスト）
    pub fn storage_notice(&self) -> String {
        format!(
            "{} {} {}",
            STORAGE_NOTICE_LEAD, STORAGE_DOCUMENT, STORAGE_NOTICE_TAIL
        )
    }

    pub fn address(&self) -> &'static str {
        COMPANY_ADDRESS
    }
}

fn scaled_height(width: u32, height: u32) -> u32 {
    if width == 0 {
        return DISPLAY_WIDTH;
    }
    let scaled = (u64::from(height) * u64::from(DISPLAY_WIDTH) + u64::from(width) / 2)
        / u64::from(width);
    u32::try_from(scaled.max(1)).unwrap_or(u32::MAX)
}
