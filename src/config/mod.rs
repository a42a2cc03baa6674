use clap::Parser;

use crate::utils::error::Result;
use crate::utils::validation::{
    validate_delimiter, validate_input_tag, validate_non_empty_string, validate_output_tag,
    Validate,
};

#[derive(Debug, Clone, Parser)]
#[command(name = "rowcast")]
#[command(about = "Convert record-oriented data between JSON, CSV, TSV, XML, YAML, Excel, and HTML")]
pub struct CliConfig {
    /// Input file path, or `-` to read from stdin.
    pub input: String,

    #[arg(long, default_value = "auto", help = "Input format tag (json, csv, tsv, xml, yaml) or auto")]
    pub from: String,

    #[arg(long, help = "Output format tag (json, csv, tsv, xml, yaml, excel, html)")]
    pub to: String,

    #[arg(
        short,
        long,
        help = "Output file path; defaults to converted_data_<timestamp> with the format's extension"
    )]
    pub output: Option<String>,

    #[arg(long, help = "Field delimiter override for CSV/TSV")]
    pub delimiter: Option<char>,

    #[arg(long, help = "Emit compact output for JSON and XML")]
    pub compact: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("input", &self.input)?;
        validate_input_tag(&self.from)?;
        validate_output_tag(&self.to)?;
        validate_delimiter(self.delimiter)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(from: &str, to: &str) -> CliConfig {
        CliConfig {
            input: "data.json".to_string(),
            from: from.to_string(),
            to: to.to_string(),
            output: None,
            delimiter: None,
            compact: false,
            verbose: false,
        }
    }

    #[test]
    fn valid_config_passes() {
        assert!(config("auto", "excel").validate().is_ok());
        assert!(config("csv", "json").validate().is_ok());
    }

    #[test]
    fn unknown_tags_fail_validation() {
        assert!(config("parquet", "json").validate().is_err());
        assert!(config("auto", "pdf").validate().is_err());
    }
}
