pub mod json;
pub mod xml;
pub mod yaml;

use crate::document::Value;
use clap::ValueEnum;
use std::path::Path;
use thiserror::Error;

/// Represents errors that can occur while parsing an input document.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid XML at position {position}: {message}")]
    Xml { position: u64, message: String },
    #[error("unsupported value in document: {0}")]
    Unsupported(String),
}

/// Source format of an input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileType {
    Json,
    Xml,
    Yml,
}

impl FileType {
    /// The file extension expected for this type.
    pub fn extension(&self) -> &'static str {
        match self {
            FileType::Json => "json",
            FileType::Xml => "xml",
            FileType::Yml => "yml",
        }
    }

    /// Guesses the type from a file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let extension = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "json" => Some(FileType::Json),
            "xml" => Some(FileType::Xml),
            "yml" | "yaml" => Some(FileType::Yml),
            _ => None,
        }
    }
}

pub enum ParserOptions {
    Json,
    Xml(xml::XmlParserOptions),
    Yaml,
}

impl ParserOptions {
    /// Default options for the given file type.
    pub fn for_file_type(file_type: FileType) -> Self {
        match file_type {
            FileType::Json => ParserOptions::Json,
            FileType::Xml => ParserOptions::Xml(xml::XmlParserOptions::default()),
            FileType::Yml => ParserOptions::Yaml,
        }
    }
}

/// Parses `input` into a generic document.
pub fn parse_document(input: &str, options: ParserOptions) -> Result<Value, ParseError> {
    match options {
        ParserOptions::Json => json::JsonParser::new().parse(input),
        ParserOptions::Xml(xml_options) => xml::XmlParser::new(xml_options).parse(input),
        ParserOptions::Yaml => yaml::YamlParser::new().parse(input),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_type_from_path() {
        assert_eq!(FileType::from_path("a/b.json"), Some(FileType::Json));
        assert_eq!(FileType::from_path("b.XML"), Some(FileType::Xml));
        assert_eq!(FileType::from_path("b.yml"), Some(FileType::Yml));
        assert_eq!(FileType::from_path("b.yaml"), Some(FileType::Yml));
        assert_eq!(FileType::from_path("b.txt"), None);
        assert_eq!(FileType::from_path("noext"), None);
    }

    #[test]
    fn test_parse_document_dispatch() {
        let from_json = parse_document(r#"{"a": {"b": "1"}}"#, ParserOptions::Json).unwrap();
        let from_yaml = parse_document("a:\n  b: '1'\n", ParserOptions::Yaml).unwrap();
        let from_xml = parse_document(
            "<a><b>1</b></a>",
            ParserOptions::for_file_type(FileType::Xml),
        )
        .unwrap();
        assert_eq!(from_json, from_yaml);
        assert_eq!(from_json, from_xml);
    }
}
