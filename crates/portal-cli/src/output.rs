use crate::cli::OutputFormat;
use colored::Colorize;
use serde_json::Value;
use tabled::builder::Builder;
use tabled::settings::Style;

pub fn print_value(value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => println!("{}", pretty(value)),
        OutputFormat::Table => print_as_table(value),
    }
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn print_as_table(value: &Value) {
    match render_table(value) {
        Some(table) => println!("{table}"),
        None => println!("{}", pretty(value)),
    }
}

/// Rows of a list payload: a bare array, or the `data` array of an envelope.
fn extract_rows(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(rows) => Some(rows),
        Value::Object(obj) => obj.get("data")?.as_array(),
        _ => None,
    }
}

/// Renders an array of objects as a table, with one column per key seen.
pub fn render_table(value: &Value) -> Option<String> {
    let rows = extract_rows(value)?;
    if rows.is_empty() {
        return Some("No records found.".to_string());
    }

    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for key in row.as_object()?.keys() {
            if !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let mut builder = Builder::default();
    builder.push_record(columns.iter().copied());
    for row in rows {
        builder.push_record(columns.iter().map(|col| cell(row.get(*col))));
    }

    let mut table = builder.build().with(Style::rounded()).to_string();
    table.push_str(&format!("\nTotal: {}", rows.len()));
    Some(table)
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_table_from_envelope() {
        let value = json!({"data": [
            {"id": 1, "name": "Acme"},
            {"id": 2, "name": "Globex", "status": "active"}
        ]});
        let table = render_table(&value).unwrap();
        assert!(table.contains("name"));
        assert!(table.contains("status"));
        assert!(table.contains("Globex"));
        assert!(table.ends_with("Total: 2"));
    }

    #[test]
    fn test_render_table_falls_back() {
        assert!(render_table(&json!({"id": 1})).is_none());
        assert!(render_table(&json!([1, 2, 3])).is_none());
        assert_eq!(render_table(&json!([])).unwrap(), "No records found.");
    }
}
