use serde_json::Value;

use super::EditError;
use super::positions::restack_sections;
use crate::models::{CustomSection, Invoice, SectionKind, TableRow, DEFAULT_SECTION_COLOR};

pub const DEFAULT_SECTION_TITLE: &str = "Custom Section";
pub const DEFAULT_TABLE_TITLE: &str = "Table Section";

pub fn default_columns() -> Vec<String> {
    (1..=3).map(|n| format!("Column {}", n)).collect()
}

/// Append an empty normal section and return its id
pub fn add_section(invoice: &mut Invoice) -> String {
    let section = CustomSection::new(DEFAULT_SECTION_TITLE, "", DEFAULT_SECTION_COLOR);
    let id = section.id.clone();
    invoice.custom_sections.push(section);
    id
}

/// Append a table section with the default columns and no rows
pub fn add_table_section(invoice: &mut Invoice) -> String {
    let mut section = CustomSection::new(DEFAULT_TABLE_TITLE, "", DEFAULT_SECTION_COLOR);
    section.kind = SectionKind::Table;
    section.columns = Some(default_columns());
    section.rows = Some(Vec::new());
    let id = section.id.clone();
    invoice.custom_sections.push(section);
    id
}

/// Remove a section along with its stored offset
pub fn remove_section(invoice: &mut Invoice, id: &str) -> Result<CustomSection, EditError> {
    let index = section_index(invoice, id)?;
    invoice.element_positions.remove(id);
    Ok(invoice.custom_sections.remove(index))
}

pub fn update_section(
    invoice: &mut Invoice,
    id: &str,
    title: Option<&str>,
    content: Option<&str>,
    color: Option<&str>,
) -> Result<(), EditError> {
    let section = section_mut(invoice, id)?;
    if let Some(title) = title {
        section.title = title.to_string();
    }
    if let Some(content) = content {
        section.content = content.to_string();
    }
    if let Some(color) = color {
        section.color = color.to_string();
    }
    Ok(())
}

/// Change a section's kind. A section becoming a table gets the default
/// columns if it has none; existing columns and rows are kept either way.
pub fn set_section_kind(
    invoice: &mut Invoice,
    id: &str,
    kind: SectionKind,
) -> Result<(), EditError> {
    let section = section_mut(invoice, id)?;
    section.kind = kind;
    if kind == SectionKind::Table {
        if section.columns.as_ref().is_none_or(Vec::is_empty) {
            section.columns = Some(default_columns());
        }
        section.rows.get_or_insert_with(Vec::new);
    }
    Ok(())
}

/// Move a section to a new list position and restack every section offset
pub fn move_section(
    invoice: &mut Invoice,
    from: usize,
    to: usize,
    spacing: f64,
) -> Result<(), EditError> {
    let count = invoice.custom_sections.len();
    if from >= count {
        return Err(EditError::SectionNotFound(from.to_string()));
    }
    let section = invoice.custom_sections.remove(from);
    invoice.custom_sections.insert(to.min(count - 1), section);
    restack_sections(&mut invoice.element_positions, &invoice.custom_sections, spacing);
    Ok(())
}

/// Append the first free `Column N` (counting from the column count + 1).
/// Rows get an empty cell unless they already hold one under that name.
pub fn add_column(invoice: &mut Invoice, id: &str) -> Result<String, EditError> {
    let section = table_mut(invoice, id)?;
    let columns = section.columns.get_or_insert_with(Vec::new);
    let name = (columns.len() + 1..)
        .map(|n| format!("Column {}", n))
        .find(|candidate| !columns.contains(candidate))
        .unwrap_or_default();
    columns.push(name.clone());
    for row in section.rows.get_or_insert_with(Vec::new) {
        row.entry(name.clone()).or_insert_with(|| Value::String(String::new()));
    }
    Ok(name)
}

/// Rename the column at `index`.
///
/// Row cells stay under their old key.
pub fn rename_column(
    invoice: &mut Invoice,
    id: &str,
    index: usize,
    name: &str,
) -> Result<(), EditError> {
    let section = table_mut(invoice, id)?;
    let column = section
        .columns
        .as_mut()
        .and_then(|columns| columns.get_mut(index))
        .ok_or(EditError::ColumnNotFound(index))?;
    *column = name.to_string();
    Ok(())
}

/// Remove the column at `index`.
///
/// From each row this deletes the cell at the same position of the row's
/// key order, which is not necessarily the cell named like the column
/// after a rename.
pub fn remove_column(invoice: &mut Invoice, id: &str, index: usize) -> Result<String, EditError> {
    let section = table_mut(invoice, id)?;
    let columns = section.columns.get_or_insert_with(Vec::new);
    if index >= columns.len() {
        return Err(EditError::ColumnNotFound(index));
    }
    if columns.len() <= 1 {
        return Err(EditError::LastColumn);
    }
    let removed = columns.remove(index);

    for row in section.rows.iter_mut().flatten() {
        let Some(key) = row.keys().nth(index).cloned() else {
            continue;
        };
        if key != removed {
            log::warn!(
                "Removing column '{}' deletes cell '{}' from a row of section {}",
                removed,
                key,
                section.id
            );
        }
        row.shift_remove(&key);
    }
    Ok(removed)
}

/// Append a row with an empty cell per column
pub fn add_row(invoice: &mut Invoice, id: &str) -> Result<usize, EditError> {
    let section = table_mut(invoice, id)?;
    let row: TableRow = section
        .columns
        .iter()
        .flatten()
        .map(|column| (column.clone(), Value::String(String::new())))
        .collect();
    let rows = section.rows.get_or_insert_with(Vec::new);
    rows.push(row);
    Ok(rows.len() - 1)
}

pub fn remove_row(invoice: &mut Invoice, id: &str, index: usize) -> Result<(), EditError> {
    let section = table_mut(invoice, id)?;
    let rows = section.rows.get_or_insert_with(Vec::new);
    if index >= rows.len() {
        return Err(EditError::RowNotFound(index));
    }
    rows.remove(index);
    Ok(())
}

/// Set the cell under `column` (by name) in row `row`
pub fn set_cell(
    invoice: &mut Invoice,
    id: &str,
    row: usize,
    column: &str,
    value: &str,
) -> Result<(), EditError> {
    let section = table_mut(invoice, id)?;
    if !section.columns.iter().flatten().any(|c| c == column) {
        return Err(EditError::UnknownColumn(column.to_string()));
    }
    let row = section
        .rows
        .as_mut()
        .and_then(|rows| rows.get_mut(row))
        .ok_or(EditError::RowNotFound(row))?;
    row.insert(column.to_string(), Value::String(value.to_string()));
    Ok(())
}

fn section_index(invoice: &Invoice, id: &str) -> Result<usize, EditError> {
    invoice
        .custom_sections
        .iter()
        .position(|s| s.id == id)
        .ok_or_else(|| EditError::SectionNotFound(id.to_string()))
}

fn section_mut<'a>(invoice: &'a mut Invoice, id: &str) -> Result<&'a mut CustomSection, EditError> {
    invoice
        .custom_sections
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| EditError::SectionNotFound(id.to_string()))
}

fn table_mut<'a>(invoice: &'a mut Invoice, id: &str) -> Result<&'a mut CustomSection, EditError> {
    let section = section_mut(invoice, id)?;
    if section.kind != SectionKind::Table {
        return Err(EditError::NotATable(id.to_string()));
    }
    Ok(section)
}
