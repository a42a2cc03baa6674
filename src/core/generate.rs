use chrono::Local;
use serde_json::Value;

use crate::core::excel;
use crate::domain::model::{
    ColumnSchema, ConversionOutput, ConvertOptions, OutputFormat, RecordSet,
};
use crate::utils::error::{ConvertError, Result};

/// Serializes the record set into the requested output format.
///
/// CSV, TSV, Excel, and HTML consume the projected schema so ragged records
/// line up; JSON, XML, and YAML keep each record's own field order instead.
pub fn generate(
    records: &RecordSet,
    schema: &ColumnSchema,
    format: OutputFormat,
    options: &ConvertOptions,
) -> Result<ConversionOutput> {
    let bytes = match format {
        OutputFormat::Json => generate_json(records, options.pretty)?,
        OutputFormat::Csv => generate_delimited(records, schema, options.delimiter.unwrap_or(','))?,
        OutputFormat::Tsv => generate_delimited(records, schema, options.delimiter.unwrap_or('\t'))?,
        OutputFormat::Xml => generate_xml(records, options.pretty).into_bytes(),
        OutputFormat::Yaml => generate_yaml(records)?,
        OutputFormat::Excel => excel::generate_excel(records, schema)?,
        OutputFormat::Html => generate_html(records, schema).into_bytes(),
    };
    Ok(ConversionOutput {
        bytes,
        mime_type: format.mime_type(),
        extension: format.extension(),
    })
}

/// Stringifies a field value for a single table cell. Null becomes the empty
/// string; any container that survived parsing is stringified as JSON.
pub(crate) fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_default(),
    }
}

fn generate_json(records: &RecordSet, pretty: bool) -> Result<Vec<u8>> {
    let serialized = if pretty {
        serde_json::to_vec_pretty(&records.records)
    } else {
        serde_json::to_vec(&records.records)
    };
    serialized.map_err(|err| ConvertError::Generation(err.to_string()))
}

fn generate_delimited(
    records: &RecordSet,
    schema: &ColumnSchema,
    delimiter: char,
) -> Result<Vec<u8>> {
    if !delimiter.is_ascii() {
        return Err(ConvertError::Generation(format!(
            "delimiter must be an ASCII character, got {delimiter:?}"
        )));
    }
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter as u8)
        .from_writer(Vec::new());
    writer
        .write_record(schema.names())
        .map_err(|err| ConvertError::Generation(err.to_string()))?;
    for record in records.iter() {
        let row: Vec<String> = schema
            .names()
            .map(|name| record.get(name).map(cell_text).unwrap_or_default())
            .collect();
        writer
            .write_record(&row)
            .map_err(|err| ConvertError::Generation(err.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|err| ConvertError::Generation(err.to_string()))
}

fn generate_xml(records: &RecordSet, pretty: bool) -> String {
    let newline = if pretty { "\n" } else { "" };
    let indent = if pretty { "  " } else { "" };
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>");
    out.push_str(newline);
    out.push_str("<data>");
    out.push_str(newline);
    for (idx, record) in records.iter().enumerate() {
        out.push_str(indent);
        out.push_str(&format!("<record_{}>", idx + 1));
        out.push_str(newline);
        for (name, value) in record.iter() {
            let tag = name.replace(' ', "_");
            out.push_str(indent);
            out.push_str(indent);
            out.push_str(&format!("<{tag}>{}</{tag}>", xml_escape(&cell_text(value))));
            out.push_str(newline);
        }
        out.push_str(indent);
        out.push_str(&format!("</record_{}>", idx + 1));
        out.push_str(newline);
    }
    out.push_str("</data>");
    out.push_str(newline);
    out
}

fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn generate_yaml(records: &RecordSet) -> Result<Vec<u8>> {
    serde_yaml::to_string(&records.records)
        .map(String::into_bytes)
        .map_err(|err| ConvertError::Generation(err.to_string()))
}

fn generate_html(records: &RecordSet, schema: &ColumnSchema) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");

    let mut table = String::from("<table>\n<thead>\n<tr>");
    for name in schema.names() {
        table.push_str(&format!("<th>{}</th>", html_escape(name)));
    }
    table.push_str("</tr>\n</thead>\n<tbody>\n");
    for record in records.iter() {
        table.push_str("<tr>");
        for name in schema.names() {
            let text = record.get(name).map(cell_text).unwrap_or_default();
            table.push_str(&format!("<td>{}</td>", html_escape(&text)));
        }
        table.push_str("</tr>\n");
    }
    table.push_str("</tbody>\n</table>");

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Data Export</title>\n\
         <style>\n\
         body {{ font-family: sans-serif; padding: 20px; }}\n\
         table {{ border-collapse: collapse; margin-top: 20px; }}\n\
         th, td {{ border: 1px solid #ccc; padding: 6px 12px; text-align: left; }}\n\
         th {{ background-color: #4472c4; color: white; }}\n\
         tr:nth-child(even) {{ background-color: #f2f2f2; }}\n\
         </style>\n</head>\n<body>\n<h1>Exported Data</h1>\n\
         <p>Generated on: {timestamp}</p>\n{table}\n</body>\n</html>\n"
    )
}

fn html_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
