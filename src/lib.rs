//! xlsxdatasheet - Product datasheet renderer for spreadsheet-backed catalogs
//!
//! This crate reads a product catalog kept in a spreadsheet (one row per product),
//! groups the columns of a selected product by their naming convention
//! (`composition_*`, `caract_*`, `param_*`, `homologation_*`, `obs_*`) and renders
//! a datasheet as Markdown, a self-contained HTML page, or JSON.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use xlsxdatasheet::ViewerBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let viewer = ViewerBuilder::new().build()?;
//!     let catalog = viewer.open_catalog("bd.xlsx")?;
//!
//!     for name in catalog.product_names() {
//!         println!("{}", name);
//!     }
//!
//!     let markdown = viewer.render_to_string(&catalog, "Produit A")?;
//!     println!("{}", markdown);
//!     Ok(())
//! }
//! ```
//!
//! # Custom Configuration
//!
//! ```rust,no_run
//! use xlsxdatasheet::{DateFormat, OutputFormat, SheetSelector, ViewerBuilder};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let viewer = ViewerBuilder::new()
//!         .with_sheet_selector(SheetSelector::Name("Produits".to_string()))
//!         .with_date_format(DateFormat::Iso8601)
//!         .with_output_format(OutputFormat::Html)
//!         .with_assets_dir("static")
//!         .build()?;
//!
//!     let catalog = viewer.open_catalog("bd.xlsx")?;
//!     let written = viewer.export_all(&catalog, "out")?;
//!     println!("{} datasheets written", written.len());
//!     Ok(())
//! }
//! ```
//!
//! # Reloading on change
//!
//! ```rust,no_run
//! use xlsxdatasheet::ViewerBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let viewer = ViewerBuilder::new().build()?;
//! let mut cache = viewer.cache();
//!
//! // The file is parsed again only when its modification time changes
//! let catalog = cache.get("bd.xlsx")?;
//! viewer.render(&catalog, "Produit A", std::io::stdout())?;
//! # Ok(())
//! # }
//! ```

mod api;
mod assets;
mod builder;
mod cache;
mod catalog;
mod certification;
mod classifier;
mod datasheet;
mod error;
mod formatter;
mod output;
mod parser;
mod remarks;
mod schema;
mod security;
mod types;

// 公開API
pub use api::{DateFormat, OutputFormat, SheetSelector};
pub use assets::{Footer, FooterImage};
pub use builder::{Viewer, ViewerBuilder};
pub use cache::CatalogCache;
pub use catalog::{Catalog, CatalogLoader};
pub use certification::{BamDetail, BamField, CertificationBlock};
pub use classifier::{GroupedField, Unit};
pub use datasheet::{Block, Datasheet, Section};
pub use error::DatasheetError;
pub use schema::{
    DatasheetSchema, FieldGroup, GroupKind, SchemaIssue, SchemaIssueKind, SchemaReport,
};
pub use types::{CellValue, ProductRow, RowId};
