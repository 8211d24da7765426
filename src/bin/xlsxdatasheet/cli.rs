//! CLI argument definitions for the datasheet renderer.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, ValueEnum};
use xlsxdatasheet::{DateFormat, OutputFormat, SheetSelector};

#[derive(Parser, Debug)]
#[command(
    name = "xlsxdatasheet",
    version,
    about = "Render product datasheets from a spreadsheet catalog",
    long_about = "Render product datasheets from a spreadsheet catalog.\n\n\
                  Columns are grouped by prefix (composition_, caract_, param_, \
                  homologation_, obs_) and rendered as Markdown, HTML or JSON."
)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["list", "product", "all", "check"])
))]
pub struct Cli {
    /// Path to the catalog spreadsheet (.xlsx, .xls, .xlsb, .ods).
    #[arg(value_name = "CATALOG")]
    pub catalog: PathBuf,

    /// Print the distinct product names, one per line.
    #[arg(long)]
    pub list: bool,

    /// Render the datasheet of one product.
    #[arg(long, value_name = "NAME")]
    pub product: Option<String>,

    /// Render every product into OUT_DIR, one file per product.
    #[arg(long, requires = "out_dir")]
    pub all: bool,

    /// Report schema issues and duplicate names or identifiers.
    #[arg(long)]
    pub check: bool,

    /// Output directory for --all.
    #[arg(long = "out-dir", value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Output format (--check prints a JSON report with `json`).
    #[arg(long, value_enum, default_value = "markdown")]
    pub format: FormatArg,

    /// Sheet name holding the catalog (default: first sheet).
    #[arg(long, value_name = "NAME", conflicts_with = "sheet_index")]
    pub sheet: Option<String>,

    /// Zero-based sheet index holding the catalog.
    #[arg(long = "sheet-index", value_name = "N")]
    pub sheet_index: Option<usize>,

    /// Directory containing images/afaq.png and images/latty.jpg
    /// (default: the catalog's directory).
    #[arg(long, value_name = "DIR")]
    pub assets: Option<PathBuf>,

    /// Write the datasheet to FILE instead of stdout.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// chrono format for dates (default: %d/%m/%Y).
    #[arg(long = "date-format", value_name = "FMT")]
    pub date_format: Option<String>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long)]
    pub quiet: bool,
}

/// What the invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    List,
    Product(String),
    All(PathBuf),
    Check,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if let Some(name) = &self.product {
            return Mode::Product(name.clone());
        }
        match (&self.out_dir, self.all) {
            (Some(dir), true) => Mode::All(dir.clone()),
            _ if self.check => Mode::Check,
            _ => Mode::List,
        }
    }

    pub fn sheet_selector(&self) -> SheetSelector {
        match (&self.sheet, self.sheet_index) {
            (Some(name), _) => SheetSelector::Name(name.clone()),
            (None, Some(index)) => SheetSelector::Index(index),
            (None, None) => SheetSelector::First,
        }
    }

    pub fn date_format(&self) -> DateFormat {
        match &self.date_format {
            Some(pattern) => DateFormat::Custom(pattern.clone()),
            None => DateFormat::DayMonthYear,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    Markdown,
    Html,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Markdown => OutputFormat::Markdown,
            FormatArg::Html => OutputFormat::Html,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_product_mode() {
        let cli = Cli::try_parse_from([
            "xlsxdatasheet",
            "bd.xlsx",
            "--product",
            "Produit A",
            "--format",
            "html",
            "--sheet-index",
            "1",
        ])
        .unwrap();
        assert_eq!(cli.mode(), Mode::Product("Produit A".to_string()));
        assert_eq!(cli.sheet_selector(), SheetSelector::Index(1));
        assert_eq!(OutputFormat::from(cli.format), OutputFormat::Html);
    }

    #[test]
    fn test_all_requires_out_dir() {
        assert!(Cli::try_parse_from(["xlsxdatasheet", "bd.xlsx", "--all"]).is_err());

        let cli =
            Cli::try_parse_from(["xlsxdatasheet", "bd.xlsx", "--all", "--out-dir", "out"]).unwrap();
        assert_eq!(cli.mode(), Mode::All(PathBuf::from("out")));
    }

    #[test]
    fn test_modes_are_exclusive() {
        assert!(Cli::try_parse_from(["xlsxdatasheet", "bd.xlsx"]).is_err());
        assert!(
            Cli::try_parse_from(["xlsxdatasheet", "bd.xlsx", "--list", "--check"]).is_err()
        );
    }

    #[test]
    fn test_verbosity_flags() {
        let cli = Cli::try_parse_from(["xlsxdatasheet", "bd.xlsx", "--list", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(Cli::try_parse_from(["xlsxdatasheet", "bd.xlsx", "--list", "-v", "-q"]).is_err());
    }
}
