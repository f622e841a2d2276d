//! Output formatting for the CLI.

use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;

/// Output format.
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print any serializable value as pretty JSON.
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a success message.
pub fn print_success(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => println!("{}", message),
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({ "status": "success", "message": message })
            );
        }
    }
}

/// Print an error message.
pub fn print_error(message: &str, format: &OutputFormat) {
    match format {
        OutputFormat::Text => eprintln!("Error: {}", message),
        OutputFormat::Json => {
            eprintln!(
                "{}",
                serde_json::json!({ "status": "error", "message": message })
            );
        }
    }
}

/// Print a table row.
pub fn print_row(label: &str, value: &str) {
    println!("  {:<16} {}", format!("{}:", label), value);
}

/// Print a divider line.
pub fn print_divider(width: usize) {
    println!("{}", "-".repeat(width));
}

/// Print a heading.
pub fn print_heading(text: &str) {
    println!("\n{}", text);
    print_divider(50);
}

/// String form of `entity[field]` for table cells: strings as-is, numbers and
/// booleans rendered, anything else `-`.
pub fn field(entity: &Value, field: &str) -> String {
    match entity.get(field) {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => "-".to_string(),
    }
}

/// First present field among `fields`.
pub fn first_field(entity: &Value, fields: &[&str]) -> String {
    fields
        .iter()
        .map(|f| field(entity, f))
        .find(|v| v != "-")
        .unwrap_or_else(|| "-".to_string())
}

/// Cut `text` to at most `width` characters.
pub fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Print a list of entities as a table of `(header, width, fields)` columns,
/// or as JSON.
pub fn print_table(
    entities: &[Value],
    columns: &[(&str, usize, &[&str])],
    empty: &str,
    format: &OutputFormat,
) -> anyhow::Result<()> {
    if let OutputFormat::Json = format {
        return print_json(entities);
    }

    if entities.is_empty() {
        println!("{}", empty);
        return Ok(());
    }

    let header: Vec<String> = columns
        .iter()
        .map(|(name, width, _)| format!("{:<width$}", name, width = *width))
        .collect();
    println!("{}", header.join(" ").trim_end());
    print_divider(columns.iter().map(|(_, w, _)| w + 1).sum());

    for entity in entities {
        let row: Vec<String> = columns
            .iter()
            .map(|(_, width, fields)| {
                let value = truncate(&first_field(entity, fields), *width);
                format!("{:<width$}", value, width = *width)
            })
            .collect();
        println!("{}", row.join(" ").trim_end());
    }
    Ok(())
}
