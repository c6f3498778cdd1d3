//! Comma-delimited dataset parsing.
//!
//! Headers are matched by alias, case-insensitively, so datasets with
//! reordered or renamed columns parse to the same rows. Only the name column
//! is mandatory.

use std::collections::HashMap;

use crate::error::CatalogError;

use super::normalize::NOT_SPECIFIED;

/// Logical dataset columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Name,
    Category,
    Serving,
    Quantity,
    Calories,
    Carbohydrates,
    Protein,
    Fats,
}

impl Column {
    pub const ALL: [Column; 8] = [
        Column::Name,
        Column::Category,
        Column::Serving,
        Column::Quantity,
        Column::Calories,
        Column::Carbohydrates,
        Column::Protein,
        Column::Fats,
    ];

    /// Header spellings recognized for this column (compared case-insensitively).
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            Column::Name => &["Dish Name", "Name"],
            Column::Category => &["Category"],
            Column::Serving => &["Serving"],
            Column::Quantity => &["Quantity"],
            Column::Calories => &["Calories (kcal)", "Calories"],
            Column::Carbohydrates => &["Carbohydrates (g)", "Carbohydrates"],
            Column::Protein => &["Protein (g)", "Protein"],
            Column::Fats => &["Fats (g)", "Fats"],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Column::Name => "name",
            Column::Category => "category",
            Column::Serving => "serving",
            Column::Quantity => "quantity",
            Column::Calories => "calories",
            Column::Carbohydrates => "carbohydrates",
            Column::Protein => "protein",
            Column::Fats => "fats",
        }
    }

    fn matches(self, header: &str) -> bool {
        let header = header.trim();
        self.aliases().iter().any(|alias| alias.eq_ignore_ascii_case(header))
    }
}

/// One data row keyed by logical column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    cells: HashMap<Column, String>,
}

impl RawRow {
    /// Raw cell text; `"-"` when the column is absent or the cell was empty.
    pub fn get(&self, column: Column) -> &str {
        self.cells.get(&column).map(String::as_str).unwrap_or(NOT_SPECIFIED)
    }
}

/// Header position of each recognized column, resolved once per input.
#[derive(Debug, Clone, Default)]
pub struct ColumnIndex {
    positions: HashMap<Column, usize>,
}

impl ColumnIndex {
    pub fn resolve(header: &[String]) -> Self {
        let positions = Column::ALL
            .iter()
            .filter_map(|&column| {
                header
                    .iter()
                    .position(|cell| column.matches(cell))
                    .map(|pos| (column, pos))
            })
            .collect();
        Self { positions }
    }

    pub fn position(&self, column: Column) -> Option<usize> {
        self.positions.get(&column).copied()
    }

    fn row(&self, record: &[String]) -> Option<RawRow> {
        let name = self
            .position(Column::Name)
            .and_then(|pos| record.get(pos))
            .map(|cell| cell.trim())
            .unwrap_or_default();
        if name.is_empty() {
            return None;
        }

        let cells = self
            .positions
            .iter()
            .map(|(&column, &pos)| {
                let cell = match record.get(pos) {
                    Some(cell) if !cell.trim().is_empty() => cell.clone(),
                    _ => NOT_SPECIFIED.to_string(),
                };
                (column, cell)
            })
            .collect();
        Some(RawRow { cells })
    }
}

/// Parses dataset text into rows. Fails only when no name column exists.
pub fn parse_rows(content: &str) -> Result<Vec<RawRow>, CatalogError> {
    let mut records = split_records(content).into_iter();
    let header = records.next().unwrap_or_default();
    let index = ColumnIndex::resolve(&header);

    if index.position(Column::Name).is_none() {
        return Err(CatalogError::MissingRequiredColumn {
            column: Column::Name.label(),
            headers: header.iter().map(|h| h.trim().to_string()).collect(),
        });
    }

    Ok(records.filter_map(|record| index.row(&record)).collect())
}

/// Splits delimited text into records of fields.
///
/// Handles quoted fields with `""` escapes and embedded commas/newlines,
/// `\n` and `\r\n` line endings, and a leading BOM. Lines with no content are
/// skipped.
pub fn split_records(content: &str) -> Vec<Vec<String>> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                record.push(std::mem::take(&mut field));
                push_record(&mut records, std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        push_record(&mut records, record);
    }
    records
}

fn push_record(records: &mut Vec<Vec<String>>, record: Vec<String>) {
    if record.iter().any(|f| !f.trim().is_empty()) {
        records.push(record);
    }
}
