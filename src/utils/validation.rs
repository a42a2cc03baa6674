use crate::domain::model::{InputFormat, OutputFormat};
use crate::utils::error::{ConvertError, Result};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ConvertError::validation(format!(
            "{field_name} cannot be empty or whitespace-only"
        )));
    }
    Ok(())
}

/// An input tag must be `auto` or one of the recognized parser formats.
pub fn validate_input_tag(tag: &str) -> Result<()> {
    if tag.eq_ignore_ascii_case("auto") || InputFormat::parse(tag).is_some() {
        return Ok(());
    }
    Err(ConvertError::UnknownFormat {
        tag: tag.to_string(),
    })
}

pub fn validate_output_tag(tag: &str) -> Result<()> {
    if OutputFormat::parse(tag).is_some() {
        return Ok(());
    }
    Err(ConvertError::UnknownFormat {
        tag: tag.to_string(),
    })
}

/// CSV/TSV delimiters have to fit in a single byte for the csv reader/writer.
pub fn validate_delimiter(delimiter: Option<char>) -> Result<()> {
    match delimiter {
        Some(ch) if !ch.is_ascii() => Err(ConvertError::validation(format!(
            "delimiter must be an ASCII character, got {ch:?}"
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_input_tag() {
        assert!(validate_input_tag("auto").is_ok());
        assert!(validate_input_tag("json").is_ok());
        assert!(validate_input_tag("YAML").is_ok());
        assert!(validate_input_tag("excel").is_err());
        assert!(validate_input_tag("parquet").is_err());
    }

    #[test]
    fn test_validate_output_tag() {
        assert!(validate_output_tag("excel").is_ok());
        assert!(validate_output_tag("html").is_ok());
        assert!(validate_output_tag("auto").is_err());
    }

    #[test]
    fn test_validate_delimiter() {
        assert!(validate_delimiter(None).is_ok());
        assert!(validate_delimiter(Some(';')).is_ok());
        assert!(validate_delimiter(Some('€')).is_err());
    }
}
