//! Workbook Inspector
//!
//! calamineに渡す前にXLSX（ZIPアーカイブ）を検査し、セキュリティ制限の確認と
//! `xl/workbook.xml`からの1904年エポックフラグの取得を行います。

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::DatasheetError;
use crate::security::SecurityConfig;

/// ZIPのローカルファイルヘッダ署名
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

/// ワークブックの検査結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct WorkbookMetadata {
    /// 1904年エポックを使用するか（Mac版Excel由来のファイル）
    pub is_1904: bool,
    /// ZIPアーカイブ内のエントリ数（ZIP形式でない場合は0）
    pub entry_count: usize,
}

/// ワークブックインスペクター
pub(crate) struct WorkbookInspector;

impl WorkbookInspector {
    /// ファイル内容を検査する
    ///
    /// ZIP形式（xlsx/xlsb/ods）でない場合（旧形式のxlsなど）は、入力サイズ以外の
    /// 検査を行わずにデフォルトのメタデータを返します。
    ///
    /// # 発生し得るエラー
    ///
    /// * `DatasheetError::SecurityViolation` - 制限違反
    /// * `DatasheetError::Zip` - アーカイブが破損している
    pub fn inspect(
        bytes: &[u8],
        security_config: &SecurityConfig,
    ) -> Result<WorkbookMetadata, DatasheetError> {
        security_config.check_input_size(bytes.len())?;

        if !bytes.starts_with(ZIP_SIGNATURE) {
            return Ok(WorkbookMetadata::default());
        }

        let mut archive =
            ZipArchive::new(Cursor::new(bytes)).map_err(|e| DatasheetError::Zip(e.to_string()))?;
        security_config.check_entry_count(archive.len())?;

        let mut budget = security_config.budget();
        for i in 0..archive.len() {
            let file = archive
                .by_index(i)
                .map_err(|e| DatasheetError::Zip(e.to_string()))?;
            budget.admit(file.name(), file.size())?;
        }
        tracing::trace!(decompressed = budget.total(), "archive within limits");

        let is_1904 = Self::read_date_system(&mut archive)?;

        Ok(WorkbookMetadata {
            is_1904,
            entry_count: archive.len(),
        })
    }

    /// `<workbookPr date1904="1"/>` を読み取る
    ///
    /// `xl/workbook.xml`が存在しない場合（odsなど）は`false`。
    fn read_date_system(archive: &mut ZipArchive<Cursor<&[u8]>>) -> Result<bool, DatasheetError> {
        let mut workbook_file = match archive.by_name("xl/workbook.xml") {
            Ok(file) => file,
            Err(_) => return Ok(false),
        };

        let mut xml_content = Vec::new();
        workbook_file.read_to_end(&mut xml_content)?;

        Self::parse_date1904(&xml_content)
    }

    fn parse_date1904(xml_content: &[u8]) -> Result<bool, DatasheetError> {
        let mut reader = Reader::from_reader(xml_content);
        reader.trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) | Ok(Event::Empty(e))
                    if e.local_name().as_ref() == b"workbookPr" =>
                {
                    for attr in e.attributes() {
                        let attr = attr.map_err(|e| {
                            DatasheetError::Load(format!("XML attribute error: {}", e))
                        })?;
                        if attr.key.local_name().as_ref() == b"date1904" {
                            let value = attr.value.as_ref();
                            return Ok(value == b"1" || value == b"true");
                        }
                    }
                    return Ok(false);
                }
                Ok(Event::Eof) => return Ok(false),
                Err(e) => {
                    return Err(DatasheetError::Load(format!(
                        "XML parse error in workbook.xml: {}",
                        e
                    )))
                }
                _ => {}
            }
            buf.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date1904_empty_element() {
        let xml = br#"<?xml version="1.0"?><workbook><workbookPr date1904="1"/><sheets/></workbook>"#;
        assert!(WorkbookInspector::parse_date1904(xml).unwrap());
    }

    #[test]
    fn test_parse_date1904_absent() {
        let xml = br#"<workbook><workbookPr defaultThemeVersion="124226"/></workbook>"#;
        assert!(!WorkbookInspector::parse_date1904(xml).unwrap());

        let xml = br#"<workbook><sheets/></workbook>"#;
        assert!(!WorkbookInspector::parse_date1904(xml).unwrap());
    }

    #[test]
    fn test_inspect_non_zip_input() {
        let metadata =
            WorkbookInspector::inspect(b"\xD0\xCF\x11\xE0legacy", &SecurityConfig::default())
                .unwrap();
        assert_eq!(metadata, WorkbookMetadata::default());
    }

    #[test]
    fn test_inspect_input_size_limit() {
        let config = SecurityConfig {
            max_input_file_size: 4,
            ..SecurityConfig::default()
        };
        let result = WorkbookInspector::inspect(b"PK\x03\x04more", &config);
        assert!(matches!(result, Err(DatasheetError::SecurityViolation(_))));
    }

    #[test]
    fn test_inspect_corrupt_zip() {
        let result = WorkbookInspector::inspect(b"PK\x03\x04garbage", &SecurityConfig::default());
        assert!(matches!(result, Err(DatasheetError::Zip(_))));
    }
}
