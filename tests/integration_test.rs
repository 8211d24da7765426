//! Integration Tests for xlsxdatasheet
//!
//! カタログの読み込みからデータシートの出力までを、rust_xlsxwriterで生成した
//! 実際のワークブックと一時ディレクトリ上の画像を使って検証します。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rust_xlsxwriter::*;
use tempfile::TempDir;
use xlsxdatasheet::{
    Block, DatasheetError, DateFormat, OutputFormat, SheetSelector, Unit, ViewerBuilder,
};

// Helper module for generating test fixtures
mod fixtures {
    use super::*;

    /// セルの内容
    pub enum Cell<'a> {
        S(&'a str),
        N(f64),
        Date(u16, u8, u8),
        Empty,
    }

    pub const HEADER: &[&str] = &[
        "id",
        "nom",
        "date_maj",
        "version_ft",
        "description",
        "composition_graphite_%",
        "caract_viscosite_cm3",
        "caract_durete_adim",
        "caract_couleur",
        "param_pression_bar",
        "homologation_1",
        "homologation_2",
        "pmuc_ref",
        "bam_ref",
        "bam_application",
        "bam_tmax_pressionox_1",
        "bam_tmax_pressionox_2",
        "obs_1",
        "observation_2",
    ];

    pub fn catalog_rows() -> Vec<Vec<Cell<'static>>> {
        use Cell::*;
        vec![
            vec![
                N(1.0),
                S("Joint A"),
                S("2023-05-01"),
                S("V3"),
                S("Joint graphite haute température"),
                N(40.0),
                N(120.0),
                N(85.0),
                S("Noir"),
                N(40.0),
                S("PMUC approved"),
                S("DVGW"),
                S("REF-123"),
                Empty,
                Empty,
                Empty,
                Empty,
                S("Sans amiante"),
                S("Résiste aux acides"),
            ],
            vec![
                N(2.0),
                S("Joint B"),
                S("not-a-date"),
                S("V1"),
                S("Joint PTFE"),
                Empty,
                Empty,
                Empty,
                Empty,
                Empty,
                S("BAM"),
                Empty,
                Empty,
                S("BAM-42"),
                S("Oxygène gazeux"),
                S("60 °C / 40 bar"),
                Empty,
                Empty,
                Empty,
            ],
            vec![
                N(3.0),
                S("Joint A"),
                S("2024-01-01"),
                S("V9"),
                S("Doublon"),
            ],
            vec![N(4.0)],
            vec![
                N(5.0),
                S("Joint C"),
                Date(2023, 5, 1),
                S("V2"),
                Empty,
                N(25.0),
                Empty,
                Empty,
                Empty,
                Empty,
                Empty,
                Empty,
                Empty,
                Empty,
                Empty,
                Empty,
                Empty,
                S("nan"),
                S("   "),
            ],
        ]
    }

    pub fn write_sheet(
        worksheet: &mut Worksheet,
        header: &[&str],
        rows: &[Vec<Cell>],
    ) -> Result<(), XlsxError> {
        let date_format = Format::new().set_num_format("yyyy-mm-dd");

        for (col, name) in header.iter().enumerate() {
            worksheet.write_string(0, col as u16, *name)?;
        }
        for (row_idx, row) in rows.iter().enumerate() {
            let row_num = row_idx as u32 + 1;
            for (col, cell) in row.iter().enumerate() {
                let col = col as u16;
                match cell {
                    Cell::S(s) => {
                        worksheet.write_string(row_num, col, *s)?;
                    }
                    Cell::N(n) => {
                        worksheet.write_number(row_num, col, *n)?;
                    }
                    Cell::Date(y, m, d) => {
                        let date = ExcelDateTime::from_ymd(*y, *m, *d)?;
                        worksheet.write_datetime_with_format(row_num, col, &date, &date_format)?;
                    }
                    Cell::Empty => {}
                }
            }
        }
        Ok(())
    }

    /// 標準のカタログを生成
    pub fn generate_catalog() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        write_sheet(worksheet, HEADER, &catalog_rows())?;
        Ok(workbook.save_to_buffer()?)
    }

    /// 2シート目にカタログがあるワークブック
    pub fn generate_catalog_on_second_sheet() -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();

        let notes = workbook.add_worksheet();
        notes.set_name("Notes")?;
        notes.write_string(0, 0, "Lisez-moi")?;

        let products = workbook.add_worksheet();
        products.set_name("Produits")?;
        write_sheet(products, HEADER, &catalog_rows())?;

        Ok(workbook.save_to_buffer()?)
    }

    /// 指定した製品名だけを持つカタログ
    pub fn generate_named_catalog(names: &[&str]) -> Result<Vec<u8>, XlsxError> {
        let rows: Vec<Vec<Cell>> = names
            .iter()
            .enumerate()
            .map(|(idx, name)| vec![Cell::N(idx as f64 + 1.0), Cell::S(name)])
            .collect();
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        write_sheet(worksheet, &["id", "nom"], &rows)?;
        Ok(workbook.save_to_buffer()?)
    }

    /// `images/afaq.png`（120x60）と`images/latty.jpg`（60x60）を作成
    pub fn write_assets(dir: &Path) {
        let images = dir.join("images");
        std::fs::create_dir_all(&images).unwrap();
        image::RgbImage::new(120, 60)
            .save(images.join("afaq.png"))
            .unwrap();
        image::RgbImage::new(60, 60)
            .save(images.join("latty.jpg"))
            .unwrap();
    }

    /// カタログと画像を一時ディレクトリに配置
    pub fn workspace(catalog: Vec<u8>) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bd.xlsx");
        std::fs::write(&path, catalog).unwrap();
        write_assets(dir.path());
        (dir, path)
    }
}

use fixtures::*;

fn render(format: OutputFormat, product: &str) -> String {
    let (_dir, path) = workspace(generate_catalog().unwrap());
    let viewer = ViewerBuilder::new()
        .with_output_format(format)
        .build()
        .unwrap();
    let catalog = viewer.open_catalog(&path).unwrap();
    viewer.render_to_string(&catalog, product).unwrap()
}

#[test]
fn test_product_names_are_distinct_and_ordered() {
    let (_dir, path) = workspace(generate_catalog().unwrap());
    let viewer = ViewerBuilder::new().build().unwrap();
    let catalog = viewer.open_catalog(&path).unwrap();

    assert_eq!(catalog.product_names(), &["Joint A", "Joint B", "Joint C"]);
    assert_eq!(catalog.duplicate_names(), &["Joint A"]);
    assert_eq!(catalog.len(), 5);
    assert!(catalog.schema_report().is_clean());
}

#[test]
fn test_markdown_datasheet() {
    let output = render(OutputFormat::Markdown, "Joint A");

    assert!(output.starts_with("# Joint A\n"));
    assert!(output.contains("*Fiche technique: V3 (dernière mise à jour : 01/05/2023)*"));
    assert!(output.contains("**Joint graphite haute température**"));

    // グループの順序
    let composition = output.find("#### 🔬 Composition moyenne").unwrap();
    let caract = output.find("#### 📐 Caractéristiques techniques").unwrap();
    let param = output
        .find("#### ⚙️ Paramètres de fonctionnement (non associés)")
        .unwrap();
    let homologation = output.find("#### 🛡️ Homologation(s)").unwrap();
    let remarks = output.find("#### 🗨️ Informations complémentaires").unwrap();
    assert!(composition < caract && caract < param && param < homologation && homologation < remarks);

    assert!(output.contains("| viscosite   | 120 cm³ |"));
    assert!(output.contains("| graphite    | 40 %   |"));
    assert!(!output.contains("adim"));

    assert!(output.contains("**- PMUC approved, DVGW**"));
    assert!(output.contains("**Référence PMUC**: REF-123"));
    assert!(!output.contains("BAM"));

    assert!(output.contains("- Sans amiante\n- Résiste aux acides\n"));
    assert!(output.contains("**AQ SPE 009**"));
    assert!(output.contains("LATTY® International – 1 rue Xavier Latty – 28160 BROU – www.latty.com"));
}

#[test]
fn test_bam_companions_and_unparsable_date() {
    let output = render(OutputFormat::Markdown, "Joint B");

    assert!(output.contains("(dernière mise à jour : not-a-date)"));
    assert!(output.contains("**- BAM**"));
    assert!(output.contains("**Référence BAM**: BAM-42"));
    assert!(output.contains("📄 **Application BAM**: Oxygène gazeux"));
    assert!(output.contains("🔥 **Conditions BAM (1)**: 60 °C / 40 bar"));
    assert!(!output.contains("Conditions BAM (2)"));
    assert!(!output.contains("Référence PMUC"));

    // 値のないグループは見出しも出力しない
    assert!(!output.contains("Composition moyenne"));
    assert!(!output.contains("Informations complémentaires"));
}

#[test]
fn test_native_date_and_null_markers() {
    let output = render(OutputFormat::Markdown, "Joint C");

    assert!(output.contains("(dernière mise à jour : 01/05/2023)"));
    assert!(!output.contains("nan"));
    assert!(!output.contains("Informations complémentaires"));
    assert!(!output.contains("Homologation"));
}

#[test]
fn test_duplicate_name_uses_first_row() {
    let output = render(OutputFormat::Markdown, "Joint A");
    assert!(output.contains("Fiche technique: V3"));
    assert!(!output.contains("V9"));
}

#[test]
fn test_rendering_is_idempotent() {
    let (_dir, path) = workspace(generate_catalog().unwrap());

    for format in [OutputFormat::Markdown, OutputFormat::Html, OutputFormat::Json] {
        let viewer = ViewerBuilder::new()
            .with_output_format(format)
            .build()
            .unwrap();
        let catalog = viewer.open_catalog(&path).unwrap();

        let first = viewer.render_to_string(&catalog, "Joint A").unwrap();
        let second = viewer.render_to_string(&catalog, "Joint A").unwrap();
        assert_eq!(first, second, "{:?} output differs between renders", format);
    }
}

#[test]
fn test_html_datasheet() {
    let output = render(OutputFormat::Html, "Joint A");

    assert!(output.starts_with("<!DOCTYPE html>"));
    assert!(output.contains("<title>Joint A</title>"));
    assert!(output.contains("<td>120 cm<sup>3</sup></td>"));
    assert!(output.contains("<tr><th>durete</th><td>85</td></tr>"));
    assert!(output.contains("<p><strong>Référence PMUC</strong>: REF-123</p>"));
    assert!(output.contains("</ul>\n<hr>"));
    assert!(output.contains(
        "<img src=\"images/afaq.png\" alt=\"AFAQ\" width=\"60\" height=\"30\">"
    ));
    assert!(output.contains(
        "<img src=\"images/latty.jpg\" alt=\"LATTY\" width=\"60\" height=\"60\">"
    ));
}

#[test]
fn test_json_datasheet() {
    let output = render(OutputFormat::Json, "Joint A");
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(value["title"], "Joint A");
    assert_eq!(value["version"], "V3");
    assert_eq!(value["updated"], "01/05/2023");

    let blocks = value["blocks"].as_array().unwrap();
    assert_eq!(blocks.len(), 5);
    assert_eq!(blocks[1]["fields"][0]["label"], "viscosite");
    assert_eq!(blocks[1]["fields"][0]["unit"], "cm³");
    assert!(blocks[1]["fields"][1]["unit"].is_null());
    assert_eq!(blocks[3]["kind"], "certifications");
    assert_eq!(blocks[3]["labels"][1], "DVGW");
    assert_eq!(blocks[4]["items"][0], "Sans amiante");
}

#[test]
fn test_structured_datasheet() {
    let (_dir, path) = workspace(generate_catalog().unwrap());
    let viewer = ViewerBuilder::new().build().unwrap();
    let catalog = viewer.open_catalog(&path).unwrap();

    let sheet = viewer.datasheet(&catalog, "Joint A").unwrap();
    match &sheet.blocks[1] {
        Block::Fields(section) => {
            assert_eq!(section.fields[0].label, "viscosite");
            assert_eq!(section.fields[0].unit, Unit::Measure("cm3".to_string()));
            assert_eq!(section.fields[1].unit, Unit::Dimensionless);
            assert_eq!(section.fields[2].unit, Unit::None);
        }
        other => panic!("Expected fields block, got {:?}", other),
    }
}

#[test]
fn test_product_not_found() {
    let (_dir, path) = workspace(generate_catalog().unwrap());
    let viewer = ViewerBuilder::new().build().unwrap();
    let catalog = viewer.open_catalog(&path).unwrap();

    let result = viewer.render_to_string(&catalog, "Joint Z");
    assert!(matches!(result, Err(DatasheetError::ProductNotFound(name)) if name == "Joint Z"));
}

#[test]
fn test_missing_assets() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bd.xlsx");
    std::fs::write(&path, generate_catalog().unwrap()).unwrap();

    let viewer = ViewerBuilder::new().build().unwrap();
    let catalog = viewer.open_catalog(&path).unwrap();
    let result = viewer.render_to_string(&catalog, "Joint A");
    match result {
        Err(DatasheetError::AssetMissing { path }) => {
            assert!(path.ends_with("images/afaq.png"));
        }
        other => panic!("Expected AssetMissing, got {:?}", other),
    }
}

#[test]
fn test_undecodable_asset() {
    let (dir, path) = workspace(generate_catalog().unwrap());
    std::fs::write(dir.path().join("images/latty.jpg"), b"not an image").unwrap();

    let viewer = ViewerBuilder::new().build().unwrap();
    let catalog = viewer.open_catalog(&path).unwrap();
    let result = viewer.render_to_string(&catalog, "Joint A");
    assert!(matches!(result, Err(DatasheetError::AssetMissing { .. })));
}

#[test]
fn test_explicit_assets_dir() {
    let catalog_dir = TempDir::new().unwrap();
    let path = catalog_dir.path().join("bd.xlsx");
    std::fs::write(&path, generate_catalog().unwrap()).unwrap();

    let assets_dir = TempDir::new().unwrap();
    write_assets(assets_dir.path());

    let viewer = ViewerBuilder::new()
        .with_assets_dir(assets_dir.path())
        .build()
        .unwrap();
    let catalog = viewer.open_catalog(&path).unwrap();
    assert!(viewer.render_to_string(&catalog, "Joint B").is_ok());
}

#[test]
fn test_custom_date_format() {
    let (_dir, path) = workspace(generate_catalog().unwrap());
    let viewer = ViewerBuilder::new()
        .with_date_format(DateFormat::Custom("%d.%m.%Y".to_string()))
        .build()
        .unwrap();
    let catalog = viewer.open_catalog(&path).unwrap();

    let output = viewer.render_to_string(&catalog, "Joint C").unwrap();
    assert!(output.contains("(dernière mise à jour : 01.05.2023)"));
}

#[test]
fn test_sheet_selection() {
    let (_dir, path) = workspace(generate_catalog_on_second_sheet().unwrap());

    let by_name = ViewerBuilder::new()
        .with_sheet_selector(SheetSelector::Name("Produits".to_string()))
        .build()
        .unwrap();
    let catalog = by_name.open_catalog(&path).unwrap();
    assert_eq!(catalog.sheet_name(), "Produits");
    assert_eq!(catalog.product_names().len(), 3);

    let by_index = ViewerBuilder::new()
        .with_sheet_selector(SheetSelector::Index(1))
        .build()
        .unwrap();
    assert_eq!(by_index.open_catalog(&path).unwrap().sheet_name(), "Produits");

    // 最初のシートには識別子列がない
    let first = ViewerBuilder::new().build().unwrap();
    assert!(matches!(first.open_catalog(&path), Err(DatasheetError::Load(_))));

    let unknown = ViewerBuilder::new()
        .with_sheet_selector(SheetSelector::Name("Inconnue".to_string()))
        .build()
        .unwrap();
    assert!(matches!(unknown.open_catalog(&path), Err(DatasheetError::Load(_))));
}

#[test]
fn test_missing_catalog_file() {
    let viewer = ViewerBuilder::new().build().unwrap();
    let result = viewer.open_catalog("/nonexistent/dir/bd.xlsx");
    assert!(matches!(result, Err(DatasheetError::Io(_))));
}

#[test]
fn test_export_all() {
    let (dir, path) = workspace(generate_catalog().unwrap());
    let viewer = ViewerBuilder::new()
        .with_output_format(OutputFormat::Html)
        .build()
        .unwrap();
    let catalog = viewer.open_catalog(&path).unwrap();

    let out_dir = dir.path().join("out");
    let written = viewer.export_all(&catalog, &out_dir).unwrap();

    assert_eq!(
        written,
        vec![
            out_dir.join("Joint_A.html"),
            out_dir.join("Joint_B.html"),
            out_dir.join("Joint_C.html"),
        ]
    );

    // 並列出力の内容は単独の描画と一致する
    let exported = std::fs::read_to_string(&written[1]).unwrap();
    assert_eq!(exported, viewer.render_to_string(&catalog, "Joint B").unwrap());

    // 出力ファイルが参照する画像は出力先に複製される
    assert!(exported.contains("src=\"images/afaq.png\""));
    assert!(out_dir.join("images/afaq.png").is_file());
    assert!(out_dir.join("images/latty.jpg").is_file());
    assert!(xlsxdatasheet::Footer::load(&out_dir).is_ok());
}

#[test]
fn test_cache_reloads_changed_file() {
    let (_dir, path) = workspace(generate_named_catalog(&["Joint A"]).unwrap());
    let viewer = ViewerBuilder::new().build().unwrap();
    let mut cache = viewer.cache();

    let first = cache.get(&path).unwrap();
    let second = cache.get(&path).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(cache.len(), 1);

    std::fs::write(
        &path,
        generate_named_catalog(&["Joint A", "Joint B", "Joint C", "Joint D"]).unwrap(),
    )
    .unwrap();

    let reloaded = cache.get(&path).unwrap();
    assert!(!Arc::ptr_eq(&first, &reloaded));
    assert_eq!(reloaded.product_names().len(), 4);

    assert!(cache.invalidate(&path));
    assert!(cache.is_empty());
}
