//! Table rendering for CLI output using comfy-table.
//!
//! ## Tables Overview
//!
//! | Tool | Table Function |
//! |---------|----------------|
//! | `chunk-inspect` | `render_fields_table()` |
//! | `chunk-migrate` | `render_counters_table()` |

use chunkbridge_store::vector::{CollectionSchema, FieldSchema};
use comfy_table::presets::NOTHING;
use comfy_table::{Cell, CellAlignment, ColumnConstraint, Table, Width};

use super::format::format_thousands;

/// Flags column for a field: `primary`, `auto_id`.
pub fn field_flags(field: &FieldSchema) -> String {
    let mut flags = Vec::new();
    if field.is_primary {
        flags.push("primary");
    }
    if field.auto_id {
        flags.push("auto_id");
    }
    flags.join(", ")
}

/// Params column for a field: `dim=1536`, `max_length=65535`.
pub fn field_params(field: &FieldSchema) -> String {
    let mut params = Vec::new();
    if let Some(dim) = field.dim {
        params.push(format!("dim={}", dim));
    }
    if let Some(max_length) = field.max_length {
        params.push(format!("max_length={}", max_length));
    }
    params.join(", ")
}

/// Render the field list of a collection for `chunk-inspect`.
///
/// # Example Output
///
/// ```text
/// FIELD         TYPE          FLAGS     PARAMS
/// id            Int64         primary
/// text          VarChar                 max_length=65535
/// embedding     FloatVector             dim=1536
/// ```
pub fn render_fields_table(schema: &CollectionSchema) -> String {
    if schema.fields.is_empty() {
        return "(no fields)".to_string();
    }

    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_header(vec![
        Cell::new("FIELD"),
        Cell::new("TYPE"),
        Cell::new("FLAGS"),
        Cell::new("PARAMS"),
    ]);
    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(12)), // FIELD
        ColumnConstraint::LowerBoundary(Width::Fixed(12)), // TYPE
        ColumnConstraint::LowerBoundary(Width::Fixed(8)),  // FLAGS
        ColumnConstraint::LowerBoundary(Width::Fixed(8)),  // PARAMS
    ]);

    for field in &schema.fields {
        table.add_row(vec![
            Cell::new(&field.name),
            Cell::new(field.data_type.as_str()),
            Cell::new(field_flags(field)),
            Cell::new(field_params(field)),
        ]);
    }

    table.trim_fmt().to_string()
}

/// Render label/count pairs with right-aligned counts.
///
/// # Example Output
///
/// ```text
/// scanned     1,200
/// inserted    1,180
/// ```
pub fn render_counters_table(rows: &[(&str, u64)]) -> String {
    let mut table = Table::new();
    table.load_preset(NOTHING);
    table.set_constraints(vec![
        ColumnConstraint::LowerBoundary(Width::Fixed(14)),
        ColumnConstraint::LowerBoundary(Width::Fixed(8)),
    ]);

    for (label, count) in rows {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(format_thousands(*count)).set_alignment(CellAlignment::Right),
        ]);
    }

    table.trim_fmt().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_table_lists_every_field() {
        let output = render_fields_table(&CollectionSchema::chunk(1536));
        assert!(output.contains("FIELD"));
        assert!(output.contains("embedding"));
        assert!(output.contains("FloatVector"));
        assert!(output.contains("dim=1536"));
        assert!(output.contains("max_length=65535"));
        assert!(output.contains("primary"));
    }

    #[test]
    fn test_empty_schema() {
        let schema = CollectionSchema {
            fields: Vec::new(),
            enable_dynamic_field: false,
        };
        assert_eq!(render_fields_table(&schema), "(no fields)");
    }

    #[test]
    fn test_field_columns() {
        let schema = CollectionSchema::chunk(8);
        let id = schema.field("id").unwrap();
        assert_eq!(field_flags(id), "primary");
        assert_eq!(field_params(id), "");
        let embedding = schema.field("embedding").unwrap();
        assert_eq!(field_params(embedding), "dim=8");
    }

    #[test]
    fn test_counters_table() {
        let output = render_counters_table(&[("scanned", 1200), ("failed", 0)]);
        assert!(output.contains("scanned"));
        assert!(output.contains("1,200"));
        assert!(output.lines().count() >= 2);
    }
}
