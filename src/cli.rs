use anyhow::{bail, Context, Result};
use rust_xlsxwriter::Workbook;
use std::path::Path;

use crate::convert::prepare_sheets;
use crate::flatten::FlattenOptions;
use crate::generator::{XlsxTablesGenerator, XlsxTablesGeneratorOptions};
use crate::naming::NamingRegistry;
use crate::parser::xml::XmlParserOptions;
use crate::parser::{parse_document, FileType, ParserOptions};

/// Everything a conversion needs besides the input and output paths.
#[derive(Debug, Clone, Default)]
pub struct ConversionOptions {
    /// Input type; guessed from the file extension when absent.
    pub file_type: Option<FileType>,
    pub xml: XmlParserOptions,
    pub flatten: FlattenOptions,
    pub registry: NamingRegistry,
    pub generator: XlsxTablesGeneratorOptions,
}

/// Checks the requested input type against the file extension, or guesses
/// the type when none was requested.
pub fn resolve_file_type(input_path: &Path, requested: Option<FileType>) -> Result<FileType> {
    let detected = FileType::from_path(input_path);
    match (requested, detected) {
        (Some(requested), Some(detected)) if requested == detected => Ok(requested),
        (Some(requested), _) => bail!(
            "This is no .{} file: {}",
            requested.extension(),
            input_path.display()
        ),
        (None, Some(detected)) => Ok(detected),
        (None, None) => bail!(
            "Cannot determine the type of {}; use --json, --xml or --yml",
            input_path.display()
        ),
    }
}

/// Converts one input document into an XLSX workbook with a sheet per
/// flattened table.
pub fn run_conversion(input_path: &Path, output_path: &Path, options: ConversionOptions) -> Result<()> {
    let file_type = resolve_file_type(input_path, options.file_type)?;
    let content = std::fs::read_to_string(input_path)
        .with_context(|| format!("Failed to read {}", input_path.display()))?;

    let parser_options = match file_type {
        FileType::Xml => ParserOptions::Xml(options.xml),
        other => ParserOptions::for_file_type(other),
    };
    let document = parse_document(&content, parser_options)
        .with_context(|| format!("Failed to parse {}", input_path.display()))?;

    let sheets = prepare_sheets(document, &options.registry, &options.flatten)
        .with_context(|| format!("Failed to flatten {}", input_path.display()))?;
    log::info!("{} tables extracted from {}", sheets.len(), input_path.display());

    let mut workbook = Workbook::new();
    XlsxTablesGenerator::new(options.generator).output_to_workbook(&mut workbook, &sheets)?;
    workbook
        .save(output_path)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{Builder, NamedTempFile};

    fn input_file(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_resolve_file_type() {
        let json = Path::new("doc.json");
        assert_eq!(resolve_file_type(json, None).unwrap(), FileType::Json);
        assert_eq!(
            resolve_file_type(json, Some(FileType::Json)).unwrap(),
            FileType::Json
        );
        let err = resolve_file_type(json, Some(FileType::Xml)).unwrap_err();
        assert_eq!(err.to_string(), "This is no .xml file: doc.json");
        assert_eq!(
            resolve_file_type(Path::new("doc.yaml"), Some(FileType::Yml)).unwrap(),
            FileType::Yml
        );
        assert!(resolve_file_type(Path::new("doc.txt"), None).is_err());
    }

    #[test]
    fn test_run_conversion_xml() {
        let input = input_file(
            ".xml",
            r#"<?xml version="1.0"?>
<TradbegrotingIbis>
  <bgr><nme>Test</nme></bgr>
  <mst><mstid>1</mstid><rgl><oms>a</oms></rgl><rgl><oms>b</oms></rgl></mst>
  <mst><mstid>2</mstid></mst>
</TradbegrotingIbis>
"#,
        );
        let output = NamedTempFile::with_suffix(".xlsx").unwrap();
        let options = ConversionOptions {
            registry: NamingRegistry::builtin().unwrap(),
            ..Default::default()
        };
        run_conversion(input.path(), output.path(), options).unwrap();

        let spreadsheet = umya_spreadsheet::reader::xlsx::read(output.path()).unwrap();
        let names: Vec<&str> = (0..3)
            .map(|i| spreadsheet.get_sheet(&i).unwrap().get_name())
            .collect();
        assert_eq!(names, vec!["TradbegrotingIbis", "meetstaten", "TradbegrotingIbis.mst.rgl1"]);

        let root = spreadsheet.get_sheet(&0).unwrap();
        assert_eq!(root.get_value((4, 1)).as_str(), "naam (TradbegrotingIbis.bgr.nme)");
        assert_eq!(root.get_value((4, 2)).as_str(), "Test");

        let rgl = spreadsheet.get_sheet(&2).unwrap();
        assert_eq!(rgl.get_value((1, 1)).as_str(), "TradbegrotingIbis.mst.rgl1");
        assert_eq!(rgl.get_value((4, 1)).as_str(), "omschrijving (oms)");
        assert_eq!(rgl.get_value((4, 3)).as_str(), "b");
    }

    #[test]
    fn test_run_conversion_yaml() {
        let input = input_file(".yml", "name: A\nchildren:\n  - x\n  - y\n  - z\n");
        let output = NamedTempFile::with_suffix(".xlsx").unwrap();
        run_conversion(input.path(), output.path(), ConversionOptions::default()).unwrap();

        let spreadsheet = umya_spreadsheet::reader::xlsx::read(output.path()).unwrap();
        let children = spreadsheet.get_sheet_by_name("children").unwrap();
        assert_eq!(children.get_value((4, 4)).as_str(), "z");
        assert_eq!(children.get_value((3, 4)).as_str(), "3");
    }

    #[test]
    fn test_run_conversion_rejects_non_object_root() {
        let input = input_file(".json", "[1, 2, 3]");
        let output = NamedTempFile::with_suffix(".xlsx").unwrap();
        let err = run_conversion(input.path(), output.path(), ConversionOptions::default())
            .unwrap_err();
        assert!(format!("{:#}", err).contains("root must be an object"));
    }
}
