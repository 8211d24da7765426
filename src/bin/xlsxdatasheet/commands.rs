//! Command implementations.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use serde_json::json;
use xlsxdatasheet::{Catalog, DatasheetError, OutputFormat, Viewer, ViewerBuilder};

use crate::cli::{Cli, Mode};

pub fn run(cli: &Cli) -> Result<(), DatasheetError> {
    let viewer = build_viewer(cli)?;
    let catalog = viewer.open_catalog(&cli.catalog)?;

    match cli.mode() {
        Mode::List => run_list(&catalog),
        Mode::Product(name) => run_product(&viewer, &catalog, &name, cli.output.as_deref()),
        Mode::All(dir) => run_all(&viewer, &catalog, &dir),
        Mode::Check => match OutputFormat::from(cli.format) {
            OutputFormat::Json => run_check_json(&catalog),
            _ => run_check(&catalog),
        },
    }
}

fn build_viewer(cli: &Cli) -> Result<Viewer, DatasheetError> {
    let mut builder = ViewerBuilder::new()
        .with_sheet_selector(cli.sheet_selector())
        .with_date_format(cli.date_format())
        .with_output_format(cli.format.into());
    if let Some(dir) = &cli.assets {
        builder = builder.with_assets_dir(dir);
    }
    builder.build()
}

fn run_list(catalog: &Catalog) -> Result<(), DatasheetError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for name in catalog.product_names() {
        writeln!(out, "{}", name)?;
    }
    out.flush()?;
    Ok(())
}

fn run_product(
    viewer: &Viewer,
    catalog: &Catalog,
    name: &str,
    output: Option<&Path>,
) -> Result<(), DatasheetError> {
    match output {
        Some(path) => {
            viewer.render(catalog, name, File::create(path)?)?;
            tracing::info!(product = %name, path = %path.display(), "datasheet written");
        }
        None => viewer.render(catalog, name, io::stdout().lock())?,
    }
    Ok(())
}

fn run_all(viewer: &Viewer, catalog: &Catalog, dir: &Path) -> Result<(), DatasheetError> {
    let written = viewer.export_all(catalog, dir)?;
    tracing::info!(count = written.len(), dir = %dir.display(), "datasheets exported");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    for path in &written {
        writeln!(out, "{}", path.display())?;
    }
    out.flush()?;
    Ok(())
}

fn run_check(catalog: &Catalog) -> Result<(), DatasheetError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(
        out,
        "sheet '{}': {} rows, {} products",
        catalog.sheet_name(),
        catalog.len(),
        catalog.product_names().len()
    )?;

    let report = catalog.schema_report();
    if report.is_clean() {
        writeln!(out, "schema: ok")?;
    } else {
        writeln!(out, "schema: {} issue(s)", report.issues().len())?;
        for issue in report.issues() {
            writeln!(out, "  - {}", issue)?;
        }
    }

    for name in catalog.duplicate_names() {
        writeln!(out, "duplicate product name: {}", name)?;
    }
    for id in catalog.duplicate_ids() {
        writeln!(out, "duplicate identifier: {}", id)?;
    }

    out.flush()?;
    Ok(())
}

fn run_check_json(catalog: &Catalog) -> Result<(), DatasheetError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, &check_report(catalog)).map_err(io::Error::from)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

/// `--check`の結果をJSONとして組み立てる
fn check_report(catalog: &Catalog) -> serde_json::Value {
    let duplicate_ids: Vec<&str> = catalog.duplicate_ids().iter().map(|id| id.as_str()).collect();
    json!({
        "sheet": catalog.sheet_name(),
        "rows": catalog.len(),
        "products": catalog.product_names().len(),
        "schema": catalog.schema_report(),
        "duplicate_names": catalog.duplicate_names(),
        "duplicate_ids": duplicate_ids,
    })
}
