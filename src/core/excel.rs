use std::io::Cursor;

use serde_json::Value;
use umya_spreadsheet::helper::coordinate::string_from_column_index;

use crate::core::generate::cell_text;
use crate::domain::model::{ColumnSchema, ColumnType, RecordSet};
use crate::utils::error::{ConvertError, Result};

const SHEET_NAME: &str = "Data";
const HEADER_FILL_ARGB: &str = "FF4472C4";
const HEADER_FONT_ARGB: &str = "FFFFFFFF";
const NUMERIC_FORMAT: &str = "#,##0.00";
const MAX_COLUMN_WIDTH: f64 = 50.0;

/// Builds a single-sheet xlsx workbook: styled header row from the projected
/// schema, one row per record, numeric formatting on numeric columns, and
/// column widths sized to the content.
pub fn generate_excel(records: &RecordSet, schema: &ColumnSchema) -> Result<Vec<u8>> {
    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_mut(&0)
        .ok_or_else(|| ConvertError::Generation("workbook has no default sheet".to_string()))?;
    sheet.set_name(SHEET_NAME);

    for (col_idx, column) in schema.columns.iter().enumerate() {
        let col = col_idx as u32 + 1;
        let cell = sheet.get_cell_mut((col, 1));
        cell.set_value_string(column.name.as_str());
        let style = cell.get_style_mut();
        style.get_font_mut().set_bold(true);
        style.get_font_mut().get_color_mut().set_argb(HEADER_FONT_ARGB);
        style.set_background_color(HEADER_FILL_ARGB);
    }

    // Track the widest stringified cell per column, seeded with the header.
    let mut widths: Vec<usize> = schema
        .columns
        .iter()
        .map(|column| column.name.chars().count())
        .collect();

    for (row_idx, record) in records.iter().enumerate() {
        let row = row_idx as u32 + 2;
        for (col_idx, column) in schema.columns.iter().enumerate() {
            let col = col_idx as u32 + 1;
            let value = record.get(&column.name);
            let text = value.map(cell_text).unwrap_or_default();
            widths[col_idx] = widths[col_idx].max(text.chars().count());

            let cell = sheet.get_cell_mut((col, row));
            match value {
                Some(Value::Number(number)) => {
                    cell.set_value_number(number.as_f64().unwrap_or_default());
                }
                Some(Value::Bool(flag)) => {
                    cell.set_value_bool(*flag);
                }
                Some(Value::Null) | None => {}
                Some(_) => {
                    cell.set_value_string(text);
                }
            }
            if column.column_type == ColumnType::Numeric {
                cell.get_style_mut()
                    .get_number_format_mut()
                    .set_format_code(NUMERIC_FORMAT);
            }
        }
    }

    for (col_idx, width) in widths.iter().enumerate() {
        let letter = string_from_column_index(&(col_idx as u32 + 1));
        sheet
            .get_column_dimension_mut(&letter)
            .set_width((*width as f64 + 2.0).min(MAX_COLUMN_WIDTH));
    }

    let mut cursor = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut cursor)
        .map_err(|err| ConvertError::Generation(err.to_string()))?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{parse, project};
    use crate::domain::model::{ConvertOptions, InputFormat};

    fn workbook_for(json: &str) -> umya_spreadsheet::Spreadsheet {
        let records =
            parse::parse(json.as_bytes(), InputFormat::Json, &ConvertOptions::default())
                .expect("test input should parse");
        let schema = project::project(&records);
        let bytes = generate_excel(&records, &schema).expect("xlsx generation");
        let cursor = Cursor::new(bytes);
        umya_spreadsheet::reader::xlsx::read_reader(cursor, true).expect("written xlsx should read back")
    }

    #[test]
    fn worksheet_is_named_data_with_header_and_rows() {
        let book = workbook_for(r#"[{"name":"John","age":30},{"name":"Jane","age":25}]"#);
        let sheet = book.get_sheet_by_name("Data").expect("Data sheet");
        assert_eq!(sheet.get_value((1, 1)), "name");
        assert_eq!(sheet.get_value((2, 1)), "age");
        assert_eq!(sheet.get_value((1, 2)), "John");
        assert_eq!(sheet.get_value((2, 3)), "25");
    }

    #[test]
    fn header_row_is_bold() {
        let book = workbook_for(r#"[{"name":"Ada"}]"#);
        let sheet = book.get_sheet_by_name("Data").expect("Data sheet");
        let cell = sheet.get_cell((1, 1)).expect("header cell");
        let bold = cell
            .get_style()
            .get_font()
            .map(|font| *font.get_bold())
            .unwrap_or(false);
        assert!(bold, "header cells should be bold");
    }

    #[test]
    fn numeric_columns_get_comma_decimal_format() {
        let book = workbook_for(r#"[{"price":29.99}]"#);
        let sheet = book.get_sheet_by_name("Data").expect("Data sheet");
        let cell = sheet.get_cell((1, 2)).expect("data cell");
        let code = cell
            .get_style()
            .get_number_format()
            .map(|format| format.get_format_code().to_string())
            .unwrap_or_default();
        assert_eq!(code, NUMERIC_FORMAT);
    }

    #[test]
    fn column_width_is_capped() {
        let long = "x".repeat(200);
        let book = workbook_for(&format!(r#"[{{"v":"{long}"}}]"#));
        let sheet = book.get_sheet_by_name("Data").expect("Data sheet");
        let width = sheet
            .get_column_dimension("A")
            .map(|dimension| *dimension.get_width())
            .unwrap_or_default();
        assert!(width <= MAX_COLUMN_WIDTH);
        assert!(width > 0.0);
    }
}
