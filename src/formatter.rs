//! Formatter Module
//!
//! セル値の表示文字列への変換を提供するモジュール。
//! 日付の再フォーマット（`date_maj`）とExcelシリアル日付の変換もここで扱います。

use std::fmt::Write;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime};

use crate::api::DateFormat;
use crate::types::CellValue;

/// 文字列として受け付ける日付・日時の形式（先頭から順に試行）
const TEXT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d.%m.%Y"];

const TEXT_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// 1900年システムで表現できる最大のシリアル値（9999-12-31）
const MAX_SERIAL: f64 = 2_958_465.0;

/// セル値フォーマッター
///
/// 値の表示形式を一元管理します。同じ入力に対して常に同じ文字列を返します。
#[derive(Debug, Clone)]
pub(crate) struct ValueFormatter {
    date_format: DateFormat,
}

impl ValueFormatter {
    pub fn new(date_format: DateFormat) -> Self {
        Self { date_format }
    }

    /// セル値を表示用文字列に変換
    ///
    /// * 数値: `f64`の`Display`（`120.0` → `120`）
    /// * 論理値: `TRUE` / `FALSE`
    /// * 日時: 時刻が0時ちょうどなら日付のみ、それ以外は`HH:MM`を付加
    pub fn format(&self, value: &CellValue) -> String {
        match value {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) => n.to_string(),
            CellValue::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            CellValue::DateTime(dt) => self.format_datetime(dt),
        }
    }

    /// 最終更新日（`date_maj`）を日付形式に変換
    ///
    /// 日付セルはそのままフォーマットし、文字列は既知の形式で解析を試みます。
    /// 解析に失敗した場合は元の文字列をそのまま返します（エラーにはしない）。
    ///
    /// # 使用例（内部）
    ///
    /// * `"2023-05-01"` → `"01/05/2023"`
    /// * `"not-a-date"` → `"not-a-date"`
    pub fn format_update_date(&self, value: &CellValue) -> String {
        match value {
            CellValue::DateTime(dt) => self.format_date(dt),
            CellValue::Text(s) => match parse_date_text(s) {
                Some(dt) => {
                    format_with(&dt, self.date_format.pattern()).unwrap_or_else(|| s.clone())
                }
                None => s.clone(),
            },
            other => self.format(other),
        }
    }

    fn format_datetime(&self, dt: &NaiveDateTime) -> String {
        let date = self.format_date(dt);
        if dt.time() == NaiveTime::MIN {
            date
        } else {
            format!("{} {}", date, dt.format("%H:%M"))
        }
    }

    /// 日付形式で出力できない場合はISO 8601にフォールバック
    fn format_date(&self, dt: &NaiveDateTime) -> String {
        format_with(dt, self.date_format.pattern())
            .unwrap_or_else(|| dt.format("%Y-%m-%d").to_string())
    }
}

/// フォーマット文字列で日時を出力（タイムゾーン指定子など出力できない場合は`None`）
fn format_with(dt: &NaiveDateTime, pattern: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", dt.format(pattern)).ok()?;
    Some(out)
}

/// 日付形式が`NaiveDateTime`に対して出力可能かを検査
pub(crate) fn is_renderable_pattern(pattern: &str) -> bool {
    NaiveDate::from_ymd_opt(2023, 5, 1)
        .map(|date| date.and_time(NaiveTime::MIN))
        .and_then(|sample| format_with(&sample, pattern))
        .is_some()
}

/// 文字列を日付・日時として解析（ベストエフォート）
pub(crate) fn parse_date_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();

    for pattern in TEXT_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, pattern) {
            return Some(dt);
        }
    }

    for pattern in TEXT_DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, pattern) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }

    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.naive_local())
}

/// Excelのシリアル日付値を日時に変換
///
/// # エポックシステム
///
/// - 1900年システム（デフォルト）: シリアル値1 = 1900年1月1日。
///   Excelの1900年うるう年バグにより、シリアル値60（存在しない1900-02-29）以降は
///   1899年12月30日起算になります。60は1900-02-28として扱います。
/// - 1904年システム: シリアル値0 = 1904年1月1日
///
/// 範囲外の値は`None`。
pub(crate) fn serial_to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(0.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }

    let (epoch, days) = if is_1904 {
        (NaiveDate::from_ymd_opt(1904, 1, 1)?, serial.floor() as i64)
    } else if serial < 61.0 {
        let days = if serial < 60.0 { serial.floor() as i64 } else { 59 };
        (NaiveDate::from_ymd_opt(1899, 12, 31)?, days)
    } else {
        (NaiveDate::from_ymd_opt(1899, 12, 30)?, serial.floor() as i64)
    };

    let date = epoch.checked_add_signed(Duration::try_days(days)?)?;
    let seconds = (serial.fract() * 86_400.0).round() as i64;
    date.and_time(NaiveTime::MIN)
        .checked_add_signed(Duration::try_seconds(seconds)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_time(NaiveTime::MIN)
    }

    #[test]
    fn test_format_number_and_bool() {
        let formatter = ValueFormatter::new(DateFormat::DayMonthYear);
        assert_eq!(formatter.format(&CellValue::Number(120.0)), "120");
        assert_eq!(formatter.format(&CellValue::Number(0.25)), "0.25");
        assert_eq!(formatter.format(&CellValue::Bool(true)), "TRUE");
        assert_eq!(
            formatter.format(&CellValue::Text("Noir".to_string())),
            "Noir"
        );
    }

    #[test]
    fn test_format_datetime_value() {
        let formatter = ValueFormatter::new(DateFormat::DayMonthYear);
        assert_eq!(
            formatter.format(&CellValue::DateTime(ymd(2023, 5, 1))),
            "01/05/2023"
        );

        let with_time = ymd(2023, 5, 1) + Duration::minutes(90);
        assert_eq!(
            formatter.format(&CellValue::DateTime(with_time)),
            "01/05/2023 01:30"
        );
    }

    #[test]
    fn test_format_update_date_from_text() {
        let formatter = ValueFormatter::new(DateFormat::DayMonthYear);
        let date = |s: &str| formatter.format_update_date(&CellValue::Text(s.to_string()));

        assert_eq!(date("2023-05-01"), "01/05/2023");
        assert_eq!(date("2023-05-01 00:00:00"), "01/05/2023");
        assert_eq!(date("2023-05-01T10:20:30"), "01/05/2023");
        assert_eq!(date("2023/05/01"), "01/05/2023");
        assert_eq!(date("2023-05-01T10:20:30+02:00"), "01/05/2023");
    }

    #[test]
    fn test_format_update_date_fallback() {
        let formatter = ValueFormatter::new(DateFormat::DayMonthYear);
        assert_eq!(
            formatter.format_update_date(&CellValue::Text("not-a-date".to_string())),
            "not-a-date"
        );
        assert_eq!(
            formatter.format_update_date(&CellValue::Number(2023.0)),
            "2023"
        );
    }

    #[test]
    fn test_format_update_date_custom_format() {
        let formatter = ValueFormatter::new(DateFormat::Iso8601);
        assert_eq!(
            formatter.format_update_date(&CellValue::DateTime(ymd(2024, 12, 31))),
            "2024-12-31"
        );
    }

    #[test]
    fn test_serial_to_datetime_1900() {
        assert_eq!(serial_to_datetime(1.0, false), Some(ymd(1900, 1, 1)));
        assert_eq!(serial_to_datetime(59.0, false), Some(ymd(1900, 2, 28)));
        assert_eq!(serial_to_datetime(61.0, false), Some(ymd(1900, 3, 1)));
        assert_eq!(serial_to_datetime(45047.0, false), Some(ymd(2023, 5, 1)));
        assert_eq!(
            serial_to_datetime(45047.5, false),
            Some(ymd(2023, 5, 1) + Duration::hours(12))
        );
    }

    #[test]
    fn test_serial_to_datetime_1904() {
        assert_eq!(serial_to_datetime(0.0, true), Some(ymd(1904, 1, 1)));
        assert_eq!(serial_to_datetime(1.0, true), Some(ymd(1904, 1, 2)));
    }

    #[test]
    fn test_serial_to_datetime_invalid() {
        assert_eq!(serial_to_datetime(-1.0, false), None);
        assert_eq!(serial_to_datetime(f64::NAN, false), None);
        assert_eq!(serial_to_datetime(f64::INFINITY, false), None);
    }

    #[test]
    fn test_serial_to_datetime_out_of_range() {
        assert_eq!(serial_to_datetime(MAX_SERIAL, false), Some(ymd(9999, 12, 31)));
        assert_eq!(serial_to_datetime(MAX_SERIAL + 1.0, false), None);
        assert_eq!(serial_to_datetime(1e20, false), None);
        assert_eq!(serial_to_datetime(1e20, true), None);
    }

    #[test]
    fn test_timezone_pattern_falls_back() {
        let formatter = ValueFormatter::new(DateFormat::Custom("%d/%m/%Y %z".to_string()));
        let text = CellValue::Text("2023-05-01".to_string());
        assert_eq!(formatter.format_update_date(&text), "2023-05-01");

        let native = CellValue::DateTime(ymd(2023, 5, 1));
        assert_eq!(formatter.format_update_date(&native), "2023-05-01");
        assert_eq!(formatter.format(&native), "2023-05-01");
    }

    #[test]
    fn test_is_renderable_pattern() {
        assert!(is_renderable_pattern("%d/%m/%Y"));
        assert!(is_renderable_pattern("%Y-%m-%d %H:%M"));
        assert!(!is_renderable_pattern("%z"));
        assert!(!is_renderable_pattern("%d/%m/%Y %Z"));
        assert!(!is_renderable_pattern("%:z"));
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_update_date_never_fails(text in "\\PC{0,24}") {
                let formatter = ValueFormatter::new(DateFormat::DayMonthYear);
                let formatted = formatter.format_update_date(&CellValue::Text(text.clone()));
                if parse_date_text(&text).is_none() {
                    prop_assert_eq!(formatted, text);
                }
            }

            #[test]
            fn test_iso_dates_are_reformatted(y in 1900i32..2100, m in 1u32..=12, d in 1u32..=28) {
                let formatter = ValueFormatter::new(DateFormat::DayMonthYear);
                let text = format!("{:04}-{:02}-{:02}", y, m, d);
                let formatted = formatter.format_update_date(&CellValue::Text(text));
                prop_assert_eq!(formatted, format!("{:02}/{:02}/{:04}", d, m, y));
            }
        }
    }
}
