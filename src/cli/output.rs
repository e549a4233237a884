//! Table and JSON rendering for the CLI commands.

use crate::registry::WidgetTypeDescriptor;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde_json::json;

fn base_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

/// View model for widget type display
#[derive(Debug, Clone, serde::Serialize)]
pub struct WidgetTypeView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub component: Option<String>,
    pub has_secrets_schema: bool,
    pub has_secrets: bool,
}

impl WidgetTypeView {
    pub fn new(descriptor: &WidgetTypeDescriptor, has_secrets: bool) -> Self {
        Self {
            id: descriptor.id.clone(),
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            component: descriptor.component.clone(),
            has_secrets_schema: descriptor.secrets_schema.is_some(),
            has_secrets,
        }
    }
}

/// View model for a stored secrets bucket
#[derive(Debug, Clone, serde::Serialize)]
pub struct SecretsBucketView {
    pub widget_id: String,
    pub fields: usize,
    pub known_type: bool,
}

/// Format widget types as a table
pub fn format_widgets_table(widgets: &[WidgetTypeView]) -> String {
    let mut table = base_table(vec!["ID", "Name", "Description", "Secrets"]);

    for w in widgets {
        let secrets_str = if w.has_secrets {
            "stored".green().to_string()
        } else if w.has_secrets_schema {
            "missing".yellow().to_string()
        } else {
            "-".to_string()
        };

        table.add_row(vec![
            Cell::new(&w.id),
            Cell::new(&w.name),
            Cell::new(&w.description),
            Cell::new(secrets_str),
        ]);
    }

    table.to_string()
}

/// Format widget types as JSON
pub fn format_widgets_json(widgets: &[WidgetTypeView]) -> String {
    serde_json::to_string_pretty(&json!({
        "widgets": widgets
    }))
    .unwrap()
}

/// Format stored secrets buckets as a table
pub fn format_secrets_table(buckets: &[SecretsBucketView]) -> String {
    let mut table = base_table(vec!["Widget", "Fields", "Type"]);

    for b in buckets {
        let type_str = if b.known_type {
            "registered".green().to_string()
        } else {
            "unknown".yellow().to_string()
        };

        table.add_row(vec![
            Cell::new(&b.widget_id),
            Cell::new(b.fields),
            Cell::new(type_str),
        ]);
    }

    table.to_string()
}

/// Format stored secrets buckets as JSON
pub fn format_secrets_json(buckets: &[SecretsBucketView]) -> String {
    serde_json::to_string_pretty(&json!({
        "widgets": buckets
    }))
    .unwrap()
}

/// Format a masked secrets bucket as a table.
///
/// Callers must pass the already-masked bucket; this function never sees
/// plaintext secret values.
pub fn format_masked_table(widget_id: &str, masked: &serde_json::Value) -> String {
    let mut table = base_table(vec!["Field", "Value"]);

    if let Some(fields) = masked.as_object() {
        for (key, value) in fields {
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            table.add_row(vec![Cell::new(key), Cell::new(rendered)]);
        }
    }

    format!("Secrets for '{}':\n{}", widget_id, table)
}
