use tracing::debug;

use crate::core::{detect, generate, parse, project};
use crate::domain::model::{
    ConversionOutput, ConversionRequest, ConvertOptions, DetectedFormat, InputFormat, OutputFormat,
    RecordSet,
};
use crate::utils::error::{ConvertError, Result};

/// Drives one conversion request through the whole pipeline:
/// detection (only when no format hint is given), parsing, validation,
/// projection, and generation. Strictly linear; once a parser has structurally
/// succeeded there is no fallback, even if validation then fails.
pub fn convert(request: &ConversionRequest) -> Result<ConversionOutput> {
    let records = match request.input_format {
        Some(format) => {
            debug!("parsing with explicit input format {format}");
            parse::parse(&request.input, format, &request.options)?
        }
        None => parse_with_detection(&request.input, &request.options)?,
    };
    debug!("parsed {} records", records.len());

    // Projection is cheap and needed by four of the seven targets; computing
    // it unconditionally keeps the pipeline branch-free.
    let schema = project::project(&records);
    debug!("projected {} columns", schema.len());

    generate::generate(&records, &schema, request.output_format, &request.options)
}

/// String-tag boundary for callers that work with raw format tags
/// (`"auto"` or an explicit input format).
pub fn convert_tagged(
    input: &[u8],
    input_tag: &str,
    output_tag: &str,
    options: ConvertOptions,
) -> Result<ConversionOutput> {
    let output_format = OutputFormat::parse(output_tag).ok_or_else(|| ConvertError::UnknownFormat {
        tag: output_tag.to_string(),
    })?;
    let input_format = if input_tag.eq_ignore_ascii_case("auto") {
        None
    } else {
        Some(
            InputFormat::parse(input_tag).ok_or_else(|| ConvertError::UnknownFormat {
                tag: input_tag.to_string(),
            })?,
        )
    };

    let mut request = ConversionRequest::new(input, output_format).with_options(options);
    request.input_format = input_format;
    convert(&request)
}

fn parse_with_detection(input: &[u8], options: &ConvertOptions) -> Result<RecordSet> {
    let text = String::from_utf8_lossy(input);
    match detect::detect_format(&text) {
        DetectedFormat::Format(format) => {
            debug!("detected input format {format}");
            parse::parse(input, format, options)
        }
        DetectedFormat::Unknown => {
            debug!("detection inconclusive, trying parsers in fallback order");
            let mut attempts: Vec<(InputFormat, String)> = Vec::new();
            for format in InputFormat::FALLBACK_ORDER {
                match parse::parse(input, format, options) {
                    Ok(records) => {
                        debug!("fallback parser {format} accepted the input");
                        return Ok(records);
                    }
                    Err(err) => attempts.push((format, err.to_string())),
                }
            }
            Err(ConvertError::DetectionExhausted { attempts })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convert_str(input: &str, from: &str, to: &str) -> Result<ConversionOutput> {
        convert_tagged(input.as_bytes(), from, to, ConvertOptions::default())
    }

    #[test]
    fn explicit_hint_skips_detection_and_surfaces_parser_error() {
        // Valid CSV, but the caller claims JSON: the JSON parser's error must
        // come back verbatim, with no fallback.
        let err = convert_str("a,b\n1,2", "json", "csv").unwrap_err();
        assert!(matches!(err, ConvertError::Parse { format: InputFormat::Json, .. }), "got {err}");
    }

    #[test]
    fn auto_detection_parses_json_to_csv() {
        let output = convert_str(r#"[{"name":"John","age":30},{"name":"Jane","age":25}]"#, "auto", "csv")
            .expect("conversion");
        assert_eq!(String::from_utf8(output.bytes).expect("utf8"), "name,age\nJohn,30\nJane,25\n");
        assert_eq!(output.mime_type, "text/csv");
        assert_eq!(output.extension, ".csv");
    }

    #[test]
    fn unknown_output_tag_is_rejected() {
        let err = convert_str("[]", "auto", "parquet").unwrap_err();
        assert!(matches!(err, ConvertError::UnknownFormat { .. }), "got {err}");
    }

    #[test]
    fn unknown_input_tag_is_rejected() {
        let err = convert_str("[]", "excel", "json").unwrap_err();
        assert!(matches!(err, ConvertError::UnknownFormat { .. }), "got {err}");
    }

    #[test]
    fn exhausted_detection_aggregates_all_attempts() {
        // Single line, no delimiters, not valid in any format.
        let err = convert_str("plainword", "auto", "json").unwrap_err();
        match err {
            ConvertError::DetectionExhausted { attempts } => {
                let formats: Vec<InputFormat> = attempts.iter().map(|(f, _)| *f).collect();
                assert_eq!(formats, InputFormat::FALLBACK_ORDER);
                assert!(attempts.iter().all(|(_, message)| !message.is_empty()));
            }
            other => panic!("expected DetectionExhausted, got {other}"),
        }
    }

    #[test]
    fn detected_yaml_validation_failure_does_not_fall_back() {
        // Detected as YAML, but decodes to a sequence with a scalar element:
        // shape-invalid, and because the parse structurally succeeded there is
        // no fallback to try.
        let err = convert_str("- a: 1\n- 2", "auto", "json").unwrap_err();
        assert!(matches!(err, ConvertError::Validation { .. }), "got {err}");
    }

    #[test]
    fn hinted_yaml_scalar_is_a_validation_error() {
        let err = convert_str("hello", "yaml", "json").unwrap_err();
        assert!(matches!(err, ConvertError::Validation { .. }), "got {err}");
    }
}
