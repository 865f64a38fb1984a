use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::ValidationError;

/// Name of the implicit first column of every table.
pub const ID_COLUMN: &str = "id";

/// Text written for (and read back as) a missing cell.
pub const NULL: &str = "NULL";

fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Cells are stored one row per line, tab-separated.
fn check_cell(value: &Option<String>) -> Result<(), ValidationError> {
    match value {
        Some(text) if text.contains(['\t', '\n', '\r']) => {
            Err(ValidationError::IllegalCellValue(text.clone()))
        }
        _ => Ok(()),
    }
}

/// A named column. Equality and hashing ignore case.
#[derive(Debug, Clone)]
pub struct Column {
    name: String,
    index: usize,
}

impl Column {
    pub fn new(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn is_id(&self) -> bool {
        same_name(&self.name, ID_COLUMN)
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        same_name(&self.name, &other.name)
    }
}

impl Eq for Column {}

impl Hash for Column {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_lowercase().hash(state);
    }
}

/// A stored row. `values[0]` always holds the id; `None` is a null cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    id: u64,
    values: Vec<Option<String>>,
}

impl Row {
    pub(crate) fn new(id: u64, values: Vec<Option<String>>) -> Self {
        Self { id, values }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// The cell at `index`, or `None` when it is null. A stored `NULL` text
    /// counts as null.
    pub fn cell(&self, index: usize) -> Option<&str> {
        self.values
            .get(index)
            .and_then(|v| v.as_deref())
            .filter(|v| *v != NULL)
    }

    /// The cell at `index` as displayed to clients.
    pub fn display_value(&self, index: usize) -> String {
        self.values
            .get(index)
            .and_then(|v| v.clone())
            .unwrap_or_else(|| NULL.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    rows: Vec<Row>,
    next_id: u64,
}

impl Table {
    /// Creates an empty table holding only the `id` column.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            columns: vec![Column::new(ID_COLUMN, 0)],
            rows: Vec::new(),
            next_id: 1,
        }
    }

    pub fn with_columns<S: AsRef<str>>(name: &str, columns: &[S]) -> Result<Self, ValidationError> {
        let mut table = Table::new(name);
        for column in columns {
            table.add_column(column.as_ref())?;
        }
        Ok(table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn row(&self, id: u64) -> Option<&Row> {
        self.rows.iter().find(|r| r.id == id)
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .find(|c| same_name(&c.name, name))
            .map(|c| c.index)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    pub fn require_column(&self, name: &str) -> Result<usize, ValidationError> {
        self.column_index(name)
            .ok_or_else(|| ValidationError::UnknownColumn(name.to_string()))
    }

    /// Appends a column; existing rows get a null cell.
    pub fn add_column(&mut self, name: &str) -> Result<(), ValidationError> {
        if self.has_column(name) {
            return Err(ValidationError::ColumnExists(name.to_string()));
        }
        self.columns.push(Column::new(name, self.columns.len()));
        for row in &mut self.rows {
            row.values.push(None);
        }
        Ok(())
    }

    pub fn drop_column(&mut self, name: &str) -> Result<(), ValidationError> {
        if same_name(name, ID_COLUMN) {
            return Err(ValidationError::IdColumnProtected("drop"));
        }
        let index = self.require_column(name)?;

        self.columns.remove(index);
        for (i, column) in self.columns.iter_mut().enumerate().skip(index) {
            column.index = i;
        }
        for row in &mut self.rows {
            row.values.remove(index);
        }
        Ok(())
    }

    /// Appends a row of non-id values and returns its freshly assigned id.
    pub fn insert_row(&mut self, values: Vec<Option<String>>) -> Result<u64, ValidationError> {
        let expected = self.columns.len() - 1;
        if values.len() != expected {
            return Err(ValidationError::ValueCountMismatch {
                expected,
                found: values.len(),
            });
        }
        values.iter().try_for_each(check_cell)?;

        let id = self.next_id;
        let mut cells = Vec::with_capacity(self.columns.len());
        cells.push(Some(id.to_string()));
        cells.extend(values);
        self.rows.push(Row::new(id, cells));
        self.next_id += 1;
        Ok(id)
    }

    /// Adds a row read back from storage, keeping `next_id` past its id.
    /// Returns false, leaving the table untouched, when no id can follow it.
    pub(crate) fn restore_row(&mut self, row: Row) -> bool {
        match row.id.checked_add(1) {
            Some(next) => {
                self.next_id = self.next_id.max(next);
                self.rows.push(row);
                true
            }
            None => false,
        }
    }

    /// Writes `assignments` (column index, new cell) into the row with `id`.
    pub fn update_row(
        &mut self,
        id: u64,
        assignments: &[(usize, Option<String>)],
    ) -> Result<(), ValidationError> {
        if assignments.iter().any(|(index, _)| *index == 0) {
            return Err(ValidationError::IdColumnProtected("update"));
        }
        assignments.iter().try_for_each(|(_, value)| check_cell(value))?;
        let width = self.columns.len();
        let row = self
            .rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ValidationError::UnknownRow(id))?;

        for (index, value) in assignments {
            if *index >= width {
                return Err(ValidationError::UnknownColumn(index.to_string()));
            }
            row.values[*index] = value.clone();
        }
        Ok(())
    }

    pub fn delete_row(&mut self, id: u64) -> bool {
        match self.rows.iter().position(|r| r.id == id) {
            Some(pos) => {
                self.rows.remove(pos);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Database {
    name: String,
    tables: HashMap<String, Table>,
}

impl Database {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_lowercase(),
            tables: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.get(&name.to_lowercase())
    }

    pub fn table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(&name.to_lowercase())
    }

    pub fn has_table(&self, name: &str) -> bool {
        self.tables.contains_key(&name.to_lowercase())
    }

    pub fn add_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    pub fn remove_table(&mut self, name: &str) -> Option<Table> {
        self.tables.remove(&name.to_lowercase())
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Output of a command: a header and rows of display values. A result with
/// no columns carries no output.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.columns.join("\t"))?;
        for row in &self.rows {
            write!(f, "\n{}", row.join("\t"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marks() -> Table {
        Table::with_columns("Marks", &["name", "mark"]).unwrap()
    }

    #[test]
    fn new_table_starts_with_id_column() {
        let table = marks();
        assert_eq!(table.name(), "marks");
        assert_eq!(table.column_names(), vec!["id", "name", "mark"]);
        assert_eq!(table.next_id(), 1);
    }

    #[test]
    fn column_equality_ignores_case() {
        assert_eq!(Column::new("Name", 1), Column::new("nAME", 4));
        let table = marks();
        assert_eq!(table.column_index("MARK"), Some(2));
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let mut table = marks();
        assert_eq!(
            table.add_column("NAME"),
            Err(ValidationError::ColumnExists("NAME".to_string()))
        );
        assert!(Table::with_columns("t", &["id"]).is_err());
    }

    #[test]
    fn insert_checks_value_count() {
        let mut table = marks();
        assert_eq!(
            table.insert_row(vec![Some("Alice".into())]),
            Err(ValidationError::ValueCountMismatch { expected: 2, found: 1 })
        );
        let id = table.insert_row(vec![Some("Alice".into()), Some("70".into())]).unwrap();
        assert_eq!(id, 1);
        assert_eq!(table.row(1).unwrap().values()[0].as_deref(), Some("1"));
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut table = marks();
        table.insert_row(vec![None, None]).unwrap();
        table.insert_row(vec![None, None]).unwrap();
        assert!(table.delete_row(2));
        assert!(!table.delete_row(2));
        assert_eq!(table.insert_row(vec![None, None]).unwrap(), 3);
    }

    #[test]
    fn add_and_drop_column_keep_rows_aligned() {
        let mut table = marks();
        table.insert_row(vec![Some("Bob".into()), Some("55".into())]).unwrap();

        table.add_column("pass").unwrap();
        assert_eq!(table.rows()[0].values().len(), 4);
        assert_eq!(table.rows()[0].cell(3), None);

        table.drop_column("name").unwrap();
        assert_eq!(table.column_names(), vec!["id", "mark", "pass"]);
        assert_eq!(table.columns()[2].index(), 2);
        assert_eq!(table.rows()[0].cell(1), Some("55"));
        assert_eq!(table.rows()[0].values().len(), 3);
    }

    #[test]
    fn id_column_cannot_be_dropped_or_updated() {
        let mut table = marks();
        table.insert_row(vec![None, None]).unwrap();
        assert_eq!(table.drop_column("ID"), Err(ValidationError::IdColumnProtected("drop")));
        assert_eq!(
            table.update_row(1, &[(0, Some("9".into()))]),
            Err(ValidationError::IdColumnProtected("update"))
        );
    }

    #[test]
    fn tabs_and_line_breaks_are_rejected_in_cells() {
        let mut table = marks();
        assert_eq!(
            table.insert_row(vec![Some("x\ty".into()), None]),
            Err(ValidationError::IllegalCellValue("x\ty".into()))
        );
        assert!(table.rows().is_empty());
        assert_eq!(table.next_id(), 1);

        table.insert_row(vec![Some("Ann".into()), None]).unwrap();
        assert_eq!(
            table.update_row(1, &[(2, Some("line\nbreak".into()))]),
            Err(ValidationError::IllegalCellValue("line\nbreak".into()))
        );
        assert_eq!(table.row(1).unwrap().cell(2), None);
    }

    #[test]
    fn restoring_the_largest_id_is_refused() {
        let mut table = marks();
        assert!(table.restore_row(Row::new(7, vec![Some("7".into()), None, None])));
        assert!(!table.restore_row(Row::new(u64::MAX, vec![None, None, None])));
        assert_eq!(table.rows().len(), 1);
        assert_eq!(table.next_id(), 8);
    }

    #[test]
    fn null_text_reads_as_null() {
        let row = Row::new(1, vec![Some("1".into()), Some(NULL.into()), None]);
        assert_eq!(row.cell(1), None);
        assert_eq!(row.cell(2), None);
        assert_eq!(row.display_value(2), "NULL");
    }

    #[test]
    fn query_result_renders_tab_separated() {
        let mut result = QueryResult::new(vec!["id".into(), "name".into()]);
        result.push_row(vec!["1".into(), "Alice".into()]);
        assert_eq!(result.to_string(), "id\tname\n1\tAlice");
        assert!(QueryResult::empty().is_empty());
    }
}
