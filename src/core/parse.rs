use std::collections::HashSet;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Number, Value};

use crate::domain::model::{ConvertOptions, InputFormat, Record, RecordSet};
use crate::utils::error::{ConvertError, Result};

/// Parses raw bytes in the given format into the canonical record set, then
/// applies the uniform shape validation.
pub fn parse(raw: &[u8], format: InputFormat, options: &ConvertOptions) -> Result<RecordSet> {
    let text = std::str::from_utf8(raw)
        .map_err(|err| ConvertError::parse(format, format!("input is not valid UTF-8: {err}")))?;
    let records = match format {
        InputFormat::Json => parse_json(text)?,
        InputFormat::Csv => parse_delimited(text, format, options.delimiter.unwrap_or(','))?,
        InputFormat::Tsv => parse_delimited(text, format, options.delimiter.unwrap_or('\t'))?,
        InputFormat::Xml => parse_xml(text)?,
        InputFormat::Yaml => parse_yaml(text)?,
    };
    validate(&records)?;
    Ok(records)
}

/// Uniform validation applied after every parse: the set must contain at least
/// one record. The "first element is a field-mapping" condition is enforced
/// structurally by `Record`; parsers report shape failures before this point.
pub fn validate(records: &RecordSet) -> Result<()> {
    if records.is_empty() {
        return Err(ConvertError::validation(
            "record set is empty; input must contain at least one record",
        ));
    }
    Ok(())
}

fn parse_json(text: &str) -> Result<RecordSet> {
    let value: Value = serde_json::from_str(text)
        .map_err(|err| ConvertError::parse(InputFormat::Json, err.to_string()))?;
    match value {
        Value::Array(items) => {
            let mut records = Vec::with_capacity(items.len());
            for (idx, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(map) => records.push(Record::from(map)),
                    other => {
                        return Err(ConvertError::parse(
                            InputFormat::Json,
                            format!("element {idx} is not an object (found {})", value_kind(&other)),
                        ))
                    }
                }
            }
            Ok(RecordSet::from(records))
        }
        Value::Object(map) => Ok(RecordSet::from(vec![Record::from(map)])),
        other => Err(ConvertError::parse(
            InputFormat::Json,
            format!(
                "expected an array of objects or a single object, found {}",
                value_kind(&other)
            ),
        )),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Per-column value shape for delimited inputs, inferred from the non-empty
/// cells so a whole column coerces consistently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellKind {
    Integer,
    Float,
    Boolean,
    Text,
}

fn parse_delimited(text: &str, format: InputFormat, delimiter: char) -> Result<RecordSet> {
    if !delimiter.is_ascii() {
        return Err(ConvertError::parse(
            format,
            format!("delimiter must be an ASCII character, got {delimiter:?}"),
        ));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter as u8)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| ConvertError::parse(format, err.to_string()))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut seen = HashSet::new();
    for name in &headers {
        if !seen.insert(name.as_str()) {
            return Err(ConvertError::parse(
                format,
                format!("duplicate header column: {name}"),
            ));
        }
    }

    let mut rows: Vec<Vec<Option<String>>> = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row.map_err(|err| ConvertError::parse(format, err.to_string()))?;
        // Ragged rows with extra fields are rejected outright; short rows pad
        // with nulls for the missing trailing columns.
        if row.len() > headers.len() {
            return Err(ConvertError::parse(
                format,
                format!(
                    "row {} has {} fields but the header defines {} columns",
                    idx + 2,
                    row.len(),
                    headers.len()
                ),
            ));
        }
        let mut cells: Vec<Option<String>> = row
            .iter()
            .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
            .collect();
        cells.resize(headers.len(), None);
        rows.push(cells);
    }

    let kinds: Vec<CellKind> = (0..headers.len())
        .map(|col| infer_cell_kind(rows.iter().filter_map(|row| row[col].as_deref())))
        .collect();

    let mut records = Vec::with_capacity(rows.len());
    for cells in rows {
        let mut record = Record::new();
        for ((name, cell), kind) in headers.iter().zip(cells).zip(&kinds) {
            let value = match cell {
                None => Value::Null,
                Some(text) => coerce_cell(&text, *kind),
            };
            record.insert(name.clone(), value);
        }
        records.push(record);
    }
    Ok(RecordSet::from(records))
}

fn infer_cell_kind<'a>(values: impl Iterator<Item = &'a str>) -> CellKind {
    let mut any = false;
    let mut all_integer = true;
    let mut all_float = true;
    let mut all_boolean = true;
    for value in values {
        any = true;
        all_integer &= value.parse::<i64>().is_ok();
        all_float &= value.parse::<f64>().is_ok();
        all_boolean &=
            value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false");
        if !all_float && !all_boolean {
            return CellKind::Text;
        }
    }
    if !any {
        return CellKind::Text;
    }
    if all_integer {
        CellKind::Integer
    } else if all_float {
        CellKind::Float
    } else if all_boolean {
        CellKind::Boolean
    } else {
        CellKind::Text
    }
}

fn coerce_cell(text: &str, kind: CellKind) -> Value {
    match kind {
        CellKind::Integer => text
            .parse::<i64>()
            .map(|n| Value::Number(n.into()))
            .unwrap_or_else(|_| Value::String(text.to_string())),
        CellKind::Float => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(text.to_string())),
        CellKind::Boolean => Value::Bool(text.eq_ignore_ascii_case("true")),
        CellKind::Text => Value::String(text.to_string()),
    }
}

#[derive(Debug, Clone)]
struct XmlElement {
    name: String,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn new(name: String) -> Self {
        Self {
            name,
            text: String::new(),
            children: Vec::new(),
        }
    }
}

/// Reads a whole XML document into a small element tree. Attributes, comments,
/// and namespaces are dropped; only tag names and immediate text survive.
fn read_xml_tree(text: &str) -> std::result::Result<XmlElement, String> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;
    loop {
        match reader.read_event() {
            Ok(Event::Start(tag)) => {
                if root.is_some() && stack.is_empty() {
                    return Err("document has more than one root element".to_string());
                }
                let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                stack.push(XmlElement::new(name));
            }
            Ok(Event::Empty(tag)) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                let node = XmlElement::new(name);
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => {
                        if root.is_some() {
                            return Err("document has more than one root element".to_string());
                        }
                        root = Some(node);
                    }
                }
            }
            Ok(Event::End(_)) => {
                if let Some(node) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(node),
                        None => root = Some(node),
                    }
                }
            }
            Ok(Event::Text(text_event)) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(
                        text_event.xml_content().map_err(|err| err.to_string())?.as_ref(),
                    );
                }
            }
            Ok(Event::CData(cdata)) => {
                // CDATA content is literal; no entity decoding applies.
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&cdata.into_inner()));
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => return Err(err.to_string()),
            Ok(_) => {}
        }
    }
    if !stack.is_empty() {
        return Err("unexpected end of document".to_string());
    }
    root.ok_or_else(|| "document has no root element".to_string())
}

/// True when the text parses as a complete XML document. Used by the detector
/// to confirm its angle-bracket guess.
pub(crate) fn xml_well_formed(text: &str) -> bool {
    read_xml_tree(text).is_ok()
}

/// Depth-1 flattening: each root-level child becomes one record. A child with
/// children contributes one field per grandchild (tag -> immediate text); a
/// leaf child contributes its own tag/text as the sole field. Deeper nesting
/// is discarded beyond the container's immediate text, which is a documented
/// non-goal.
fn parse_xml(text: &str) -> Result<RecordSet> {
    let root = read_xml_tree(text).map_err(|message| ConvertError::parse(InputFormat::Xml, message))?;
    let mut records = Vec::new();
    if root.children.is_empty() {
        // Childless root: a single record with no fields, matching the
        // original tool's single-record branch.
        records.push(Record::new());
    } else {
        for child in &root.children {
            let mut record = Record::new();
            if child.children.is_empty() {
                record.insert(child.name.clone(), Value::String(child.text.clone()));
            } else {
                for grandchild in &child.children {
                    record.insert(grandchild.name.clone(), Value::String(grandchild.text.clone()));
                }
            }
            records.push(record);
        }
    }
    Ok(RecordSet::from(records))
}

fn parse_yaml(text: &str) -> Result<RecordSet> {
    let doc: serde_yaml::Value = serde_yaml::from_str(text)
        .map_err(|err| ConvertError::parse(InputFormat::Yaml, err.to_string()))?;
    // Shape failures past this point are validation errors: the parse
    // succeeded, the decoded value just cannot be tabulated.
    match yaml_to_json(doc) {
        Value::Array(items) => {
            let mut records = Vec::with_capacity(items.len());
            for (idx, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(map) => records.push(Record::from(map)),
                    other => {
                        return Err(ConvertError::validation(format!(
                            "YAML sequence element {idx} is not a mapping (found {})",
                            value_kind(&other)
                        )))
                    }
                }
            }
            Ok(RecordSet::from(records))
        }
        Value::Object(map) => Ok(RecordSet::from(vec![Record::from(map)])),
        other => Err(ConvertError::validation(format!(
            "YAML must decode to a sequence of mappings or a single mapping, found {}",
            value_kind(&other)
        ))),
    }
}

fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(num) => {
            if let Some(i) = num.as_i64() {
                Value::Number(Number::from(i))
            } else if let Some(u) = num.as_u64() {
                Value::Number(Number::from(u))
            } else if let Some(f) = num.as_f64() {
                Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
            } else {
                Value::Null
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => {
            Value::Array(seq.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(map) => {
            let mut obj = Map::new();
            for (key, val) in map.into_iter() {
                let key = match key {
                    serde_yaml::Value::String(s) => s,
                    other => serde_yaml::to_string(&other)
                        .unwrap_or_default()
                        .trim()
                        .to_string(),
                };
                obj.insert(key, yaml_to_json(val));
            }
            Value::Object(obj)
        }
        serde_yaml::Value::Tagged(tagged) => {
            let tagged = *tagged;
            yaml_to_json(tagged.value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse_ok(raw: &str, format: InputFormat) -> RecordSet {
        parse(raw.as_bytes(), format, &ConvertOptions::default()).expect("parse should succeed")
    }

    #[test]
    fn json_array_of_objects() {
        let records = parse_ok(r#"[{"name":"John","age":30},{"name":"Jane","age":25}]"#, InputFormat::Json);
        assert_eq!(records.len(), 2);
        assert_eq!(records.records[0].get("name"), Some(&json!("John")));
        assert_eq!(records.records[1].get("age"), Some(&json!(25)));
    }

    #[test]
    fn json_bare_object_wraps_into_one_record() {
        let records = parse_ok(r#"{"name":"Ada"}"#, InputFormat::Json);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn json_array_of_scalars_is_a_parse_error() {
        let err = parse(b"[1, 2, 3]", InputFormat::Json, &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, ConvertError::Parse { format: InputFormat::Json, .. }), "got {err}");
    }

    #[test]
    fn csv_coerces_columns_like_the_source_tool() {
        let records = parse_ok("name,age,active\nJohn,30,true\nJane,25,false", InputFormat::Csv);
        assert_eq!(records.records[0].get("age"), Some(&json!(30)));
        assert_eq!(records.records[0].get("active"), Some(&json!(true)));
        assert_eq!(records.records[1].get("name"), Some(&json!("Jane")));
    }

    #[test]
    fn csv_mixed_column_stays_text() {
        let records = parse_ok("v\n1\nx", InputFormat::Csv);
        assert_eq!(records.records[0].get("v"), Some(&json!("1")));
    }

    #[test]
    fn csv_short_row_pads_trailing_nulls() {
        let records = parse_ok("a,b\n1,2\n3", InputFormat::Csv);
        assert_eq!(records.records[1].get("b"), Some(&Value::Null));
    }

    #[test]
    fn csv_ragged_row_is_rejected_not_truncated() {
        let err = parse(b"a,b\n1,2,3", InputFormat::Csv, &ConvertOptions::default()).unwrap_err();
        match err {
            ConvertError::Parse { format, message } => {
                assert_eq!(format, InputFormat::Csv);
                assert!(message.contains("3 fields"), "message: {message}");
            }
            other => panic!("expected parse error, got {other}"),
        }
    }

    #[test]
    fn csv_duplicate_headers_are_rejected() {
        let err = parse(b"a,a\n1,2", InputFormat::Csv, &ConvertOptions::default()).unwrap_err();
        assert!(err.to_string().contains("duplicate header"), "got {err}");
    }

    #[test]
    fn tsv_uses_tab_delimiter() {
        let records = parse_ok("name\tage\nJohn\t30", InputFormat::Tsv);
        assert_eq!(records.records[0].get("age"), Some(&json!(30)));
    }

    #[test]
    fn custom_delimiter_override() {
        let options = ConvertOptions {
            delimiter: Some(';'),
            ..ConvertOptions::default()
        };
        let records = parse(b"a;b\n1;2", InputFormat::Csv, &options).expect("parse");
        assert_eq!(records.records[0].get("b"), Some(&json!(2)));
    }

    #[test]
    fn xml_children_become_records_with_string_fields() {
        let records = parse_ok(
            "<data><record><name>John</name><age>30</age></record></data>",
            InputFormat::Xml,
        );
        assert_eq!(records.len(), 1);
        // XML has no native numeric type; everything is a string at parse time.
        assert_eq!(records.records[0].get("age"), Some(&json!("30")));
        assert_eq!(records.records[0].get("name"), Some(&json!("John")));
    }

    #[test]
    fn xml_leaf_child_contributes_its_own_tag() {
        let records = parse_ok("<data><name>Ada</name><name>Bob</name></data>", InputFormat::Xml);
        assert_eq!(records.len(), 2);
        assert_eq!(records.records[1].get("name"), Some(&json!("Bob")));
    }

    #[test]
    fn xml_entities_are_decoded_in_element_text() {
        let records = parse_ok("<data><r><name>Smith &amp; Sons</name></r></data>", InputFormat::Xml);
        assert_eq!(records.records[0].get("name"), Some(&json!("Smith & Sons")));
    }

    #[test]
    fn xml_cdata_text_is_preserved() {
        let records = parse_ok(
            "<data><r><name><![CDATA[John & Co]]></name></r></data>",
            InputFormat::Xml,
        );
        assert_eq!(records.records[0].get("name"), Some(&json!("John & Co")));
    }

    #[test]
    fn xml_empty_element_maps_to_empty_string() {
        let records = parse_ok("<data><r><name/></r></data>", InputFormat::Xml);
        assert_eq!(records.records[0].get("name"), Some(&json!("")));
    }

    #[test]
    fn xml_malformed_is_a_parse_error() {
        let err = parse(b"<data><r></data>", InputFormat::Xml, &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, ConvertError::Parse { format: InputFormat::Xml, .. }), "got {err}");
    }

    #[test]
    fn yaml_sequence_of_mappings() {
        let records = parse_ok("- name: John\n  age: 30\n- name: Jane\n  age: 25", InputFormat::Yaml);
        assert_eq!(records.len(), 2);
        assert_eq!(records.records[0].get("age"), Some(&json!(30)));
    }

    #[test]
    fn yaml_single_mapping_wraps_into_one_record() {
        let records = parse_ok("name: Ada\nlang: rust", InputFormat::Yaml);
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn yaml_scalar_is_a_validation_error_not_parse() {
        let err = parse(b"hello", InputFormat::Yaml, &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, ConvertError::Validation { .. }), "got {err}");
    }

    #[test]
    fn yaml_sequence_of_scalars_is_a_validation_error() {
        let err = parse(b"- 1\n- 2", InputFormat::Yaml, &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, ConvertError::Validation { .. }), "got {err}");
    }

    #[test]
    fn empty_json_array_fails_validation() {
        let err = parse(b"[]", InputFormat::Json, &ConvertOptions::default()).unwrap_err();
        assert!(matches!(err, ConvertError::Validation { .. }), "got {err}");
    }
}
