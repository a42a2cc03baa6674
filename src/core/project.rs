use std::collections::HashSet;

use serde_json::Value;

use crate::domain::model::{Column, ColumnSchema, ColumnType, RecordSet};

/// Derives the column schema for table-shaped outputs: unique column names in
/// first-seen order across the record set, each with an inferred type.
///
/// Deterministic by construction, which is what guarantees stable column
/// ordering across repeated projections of the same record set.
pub fn project(records: &RecordSet) -> ColumnSchema {
    let mut names: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for record in records.iter() {
        for (name, _) in record.iter() {
            if seen.insert(name.clone()) {
                names.push(name.clone());
            }
        }
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let column_type = infer_column_type(records, &name);
            Column { name, column_type }
        })
        .collect();
    ColumnSchema { columns }
}

/// Single pure pass per column. Only present, non-null values participate, so
/// rows missing a field never disqualify a numeric or boolean column.
fn infer_column_type(records: &RecordSet, name: &str) -> ColumnType {
    let mut saw_value = false;
    let mut all_numeric = true;
    let mut all_boolean = true;
    for record in records.iter() {
        let Some(value) = record.get(name) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        saw_value = true;
        all_numeric &= parses_as_numeric(value);
        all_boolean &= parses_as_boolean(value);
        if !all_numeric && !all_boolean {
            return ColumnType::Text;
        }
    }
    if !saw_value {
        ColumnType::Text
    } else if all_numeric {
        ColumnType::Numeric
    } else if all_boolean {
        ColumnType::Boolean
    } else {
        ColumnType::Text
    }
}

fn parses_as_numeric(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::String(s) => {
            let trimmed = s.trim();
            !trimmed.is_empty() && trimmed.parse::<f64>().is_ok()
        }
        _ => false,
    }
}

fn parses_as_boolean(value: &Value) -> bool {
    match value {
        Value::Bool(_) => true,
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed.eq_ignore_ascii_case("true") || trimmed.eq_ignore_ascii_case("false")
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parse;
    use crate::domain::model::{ConvertOptions, InputFormat};

    fn records_from_json(text: &str) -> RecordSet {
        parse::parse(text.as_bytes(), InputFormat::Json, &ConvertOptions::default())
            .expect("test input should parse")
    }

    #[test]
    fn columns_follow_first_seen_order() {
        let records = records_from_json(r#"[{"b":1,"a":2},{"c":3,"a":4}]"#);
        let schema = project(&records);
        let names: Vec<&str> = schema.names().collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn projection_is_stable_across_calls() {
        let records = records_from_json(r#"[{"x":1},{"y":2},{"z":3}]"#);
        assert_eq!(project(&records), project(&records));
    }

    #[test]
    fn numeric_column_from_numbers_and_numeric_strings() {
        let records = records_from_json(r#"[{"n":1},{"n":"2.5"}]"#);
        let schema = project(&records);
        assert_eq!(schema.columns[0].column_type, ColumnType::Numeric);
    }

    #[test]
    fn boolean_column_is_case_insensitive() {
        let records = records_from_json(r#"[{"flag":"TRUE"},{"flag":"false"}]"#);
        let schema = project(&records);
        assert_eq!(schema.columns[0].column_type, ColumnType::Boolean);
    }

    #[test]
    fn missing_and_null_values_do_not_disqualify() {
        let records = records_from_json(r#"[{"n":1,"m":null},{"m":2}]"#);
        let schema = project(&records);
        let n = schema.columns.iter().find(|c| c.name == "n").expect("n column");
        let m = schema.columns.iter().find(|c| c.name == "m").expect("m column");
        assert_eq!(n.column_type, ColumnType::Numeric);
        assert_eq!(m.column_type, ColumnType::Numeric);
    }

    #[test]
    fn mixed_column_is_text() {
        let records = records_from_json(r#"[{"v":1},{"v":"abc"}]"#);
        let schema = project(&records);
        assert_eq!(schema.columns[0].column_type, ColumnType::Text);
    }

    #[test]
    fn all_null_column_defaults_to_text() {
        let records = records_from_json(r#"[{"v":null}]"#);
        let schema = project(&records);
        assert_eq!(schema.columns[0].column_type, ColumnType::Text);
    }
}
