use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of data: an ordered mapping from field name to a scalar JSON value.
///
/// Field order is insertion order (`serde_json` is built with `preserve_order`),
/// so the shape-preserving generators can emit fields the way the source
/// document listed them. Nested values may survive parsing one level deep; flat
/// targets stringify them at generation time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

/// The canonical in-memory representation every parser produces and every
/// generator consumes. Created once per conversion request and never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordSet {
    pub records: Vec<Record>,
}

impl RecordSet {
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<Record>> for RecordSet {
    fn from(records: Vec<Record>) -> Self {
        Self { records }
    }
}

/// Inferred type of a projected column, derived from the values actually
/// present in that column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Numeric,
    Boolean,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

/// Ordered, unique column names (first-seen order across the record set) plus
/// per-column inferred types. Derived on demand, never stored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnSchema {
    pub columns: Vec<Column>,
}

impl ColumnSchema {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Formats the parsers accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputFormat {
    Json,
    Csv,
    Tsv,
    Xml,
    Yaml,
}

impl InputFormat {
    /// Fixed priority order used when auto-detection is inconclusive and the
    /// orchestrator falls back to trying every parser.
    pub const FALLBACK_ORDER: [InputFormat; 5] = [
        InputFormat::Json,
        InputFormat::Csv,
        InputFormat::Tsv,
        InputFormat::Xml,
        InputFormat::Yaml,
    ];

    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            "xml" => Some(Self::Xml),
            "yaml" | "yml" => Some(Self::Yaml),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Csv => "CSV",
            Self::Tsv => "TSV",
            Self::Xml => "XML",
            Self::Yaml => "YAML",
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Formats the generators can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Json,
    Csv,
    Tsv,
    Xml,
    Yaml,
    Excel,
    Html,
}

impl OutputFormat {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            "xml" => Some(Self::Xml),
            "yaml" | "yml" => Some(Self::Yaml),
            "excel" | "xlsx" => Some(Self::Excel),
            "html" => Some(Self::Html),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Csv => "CSV",
            Self::Tsv => "TSV",
            Self::Xml => "XML",
            Self::Yaml => "YAML",
            Self::Excel => "Excel",
            Self::Html => "HTML",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Csv => "text/csv",
            Self::Tsv => "text/tab-separated-values",
            Self::Xml => "application/xml",
            Self::Yaml => "application/x-yaml",
            Self::Excel => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Html => "text/html",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => ".json",
            Self::Csv => ".csv",
            Self::Tsv => ".tsv",
            Self::Xml => ".xml",
            Self::Yaml => ".yaml",
            Self::Excel => ".xlsx",
            Self::Html => ".html",
        }
    }

    /// Generators that lay records out against a fixed column set. The rest
    /// preserve each record's own field order.
    pub fn is_table_shaped(&self) -> bool {
        matches!(self, Self::Csv | Self::Tsv | Self::Excel | Self::Html)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of content-based format detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectedFormat {
    Format(InputFormat),
    Unknown,
}

impl fmt::Display for DetectedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Format(format) => f.write_str(format.name()),
            Self::Unknown => f.write_str("Unknown"),
        }
    }
}

/// Knobs callers can turn per request.
#[derive(Debug, Clone, Copy)]
pub struct ConvertOptions {
    /// Delimiter override for CSV/TSV parsing and generation.
    pub delimiter: Option<char>,
    /// Pretty-print JSON and XML output.
    pub pretty: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            pretty: true,
        }
    }
}

/// One conversion request. Immutable once constructed; the orchestrator
/// processes it start to finish with no retained state.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub input: Vec<u8>,
    /// Explicit input format; `None` means auto-detect.
    pub input_format: Option<InputFormat>,
    pub output_format: OutputFormat,
    pub options: ConvertOptions,
}

impl ConversionRequest {
    pub fn new(input: impl Into<Vec<u8>>, output_format: OutputFormat) -> Self {
        Self {
            input: input.into(),
            input_format: None,
            output_format,
            options: ConvertOptions::default(),
        }
    }

    pub fn with_input_format(mut self, format: InputFormat) -> Self {
        self.input_format = Some(format);
        self
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }
}

/// Output bytes plus the metadata a caller needs to hand the result on.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionOutput {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
    pub extension: &'static str,
}
