use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult, ValidationError};
use crate::model::{Database, Row, Table, ID_COLUMN, NULL};
use crate::tokenizer::is_keyword;

/// Extension of table files inside a database directory.
pub const TABLE_EXTENSION: &str = "tab";

/// Rewrites a table file in full: a header line of column names, then one
/// tab-separated line per row.
pub fn write_table_file(path: &Path, table: &Table) -> DbResult<()> {
    let context = || format!("failed to write table file {}", path.display());
    let file = File::create(path).map_err(|e| DbError::persistence(context(), e))?;
    let mut writer = BufWriter::new(file);
    write_rows(&mut writer, table).map_err(|e| DbError::persistence(context(), e))?;
    debug!(table = table.name(), rows = table.rows().len(), "rewrote table file");
    Ok(())
}

fn write_rows<W: Write>(writer: &mut W, table: &Table) -> io::Result<()> {
    writeln!(writer, "{}", table.column_names().join("\t"))?;
    for row in table.rows() {
        let cells: Vec<&str> = row
            .values()
            .iter()
            .map(|v| v.as_deref().unwrap_or(NULL))
            .collect();
        writeln!(writer, "{}", cells.join("\t"))?;
    }
    writer.flush()
}

/// Loads a table file. The next id is one past the largest id read.
pub fn read_table_file(path: &Path, name: &str) -> DbResult<Table> {
    let corrupt = |reason: String| DbError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };
    let file = File::open(path).map_err(|e| {
        DbError::persistence(format!("failed to read table file {}", path.display()), e)
    })?;
    let mut lines = BufReader::new(file).lines();

    let header = match lines.next() {
        Some(line) => line.map_err(|e| DbError::persistence("failed to read header", e))?,
        None => return Err(corrupt("empty table file".to_string())),
    };
    let header = header.trim_end_matches('\r');
    let mut headers = header.split('\t');
    match headers.next() {
        Some(first) if first.eq_ignore_ascii_case(ID_COLUMN) => {}
        _ => return Err(corrupt(format!("first column must be '{}'", ID_COLUMN))),
    }
    let columns: Vec<&str> = headers.collect();
    let mut table = Table::with_columns(name, &columns).map_err(|e| corrupt(e.to_string()))?;
    let width = table.columns().len();

    let mut seen = HashSet::new();
    for line in lines {
        let line = line.map_err(|e| DbError::persistence("failed to read row", e))?;
        let line = line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() > width {
            return Err(corrupt(format!(
                "row has {} fields but the table has {} columns",
                fields.len(),
                width
            )));
        }
        let id: u64 = fields[0]
            .parse()
            .map_err(|_| corrupt(format!("invalid row id '{}'", fields[0])))?;
        if !seen.insert(id) {
            return Err(corrupt(format!("duplicate row id {}", id)));
        }

        let mut values: Vec<Option<String>> = Vec::with_capacity(width);
        values.push(Some(id.to_string()));
        for field in &fields[1..] {
            values.push(if *field == NULL { None } else { Some(field.to_string()) });
        }
        values.resize(width, None);
        if !table.restore_row(Row::new(id, values)) {
            return Err(corrupt(format!("row id {} leaves no room for another id", id)));
        }
    }

    Ok(table)
}

/// Owns every database in memory and mirrors each table to a file under
/// `<root>/<database>/<table>.tab`.
///
/// There is no locking here: callers must run one mutating operation at a
/// time.
#[derive(Debug)]
pub struct StorageManager {
    root: PathBuf,
    databases: HashMap<String, Database>,
}

impl StorageManager {
    /// Opens (creating if needed) the storage root and loads every database.
    pub fn open(root: impl Into<PathBuf>) -> DbResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            DbError::persistence(format!("failed to create {}", root.display()), e)
        })?;

        let mut manager = Self {
            root,
            databases: HashMap::new(),
        };
        manager.load_databases()?;
        info!(
            root = %manager.root.display(),
            databases = manager.databases.len(),
            "storage opened"
        );
        Ok(manager)
    }

    fn load_databases(&mut self) -> DbResult<()> {
        let entries = fs::read_dir(&self.root).map_err(|e| {
            DbError::persistence(format!("failed to list {}", self.root.display()), e)
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| DbError::persistence("failed to read entry", e))?;
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(name) => name.to_lowercase(),
                None => continue,
            };
            match Self::load_database(&path, &name) {
                Ok(database) => {
                    self.databases.insert(name, database);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable database"),
            }
        }
        Ok(())
    }

    fn load_database(dir: &Path, name: &str) -> DbResult<Database> {
        let mut database = Database::new(name);
        let entries = fs::read_dir(dir).map_err(|e| {
            DbError::persistence(format!("failed to list {}", dir.display()), e)
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| DbError::persistence("failed to read entry", e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TABLE_EXTENSION) {
                continue;
            }
            let table_name = match path.file_stem().and_then(|s| s.to_str()) {
                Some(stem) => stem.to_string(),
                None => continue,
            };
            match read_table_file(&path, &table_name) {
                Ok(table) => {
                    debug!(database = name, table = table.name(), rows = table.rows().len(), "loaded table");
                    database.add_table(table);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable table"),
            }
        }
        Ok(database)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn database_path(&self, database: &str) -> PathBuf {
        self.root.join(database.to_lowercase())
    }

    fn table_path(&self, database: &str, table: &str) -> PathBuf {
        self.database_path(database)
            .join(format!("{}.{}", table.to_lowercase(), TABLE_EXTENSION))
    }

    pub fn has_database(&self, name: &str) -> bool {
        self.databases.contains_key(&name.to_lowercase())
    }

    pub fn database(&self, name: &str) -> Option<&Database> {
        self.databases.get(&name.to_lowercase())
    }

    pub fn database_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.databases.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn create_database(&mut self, name: &str) -> DbResult<()> {
        let key = name.to_lowercase();
        let path = self.database_path(&key);
        if self.databases.contains_key(&key) || path.exists() {
            return Err(ValidationError::DatabaseExists(key).into());
        }

        fs::create_dir_all(&path).map_err(|e| {
            DbError::persistence(format!("failed to create {}", path.display()), e)
        })?;
        info!(database = %key, "created database");
        self.databases.insert(key.clone(), Database::new(&key));
        Ok(())
    }

    /// Removes the database directory recursively and forgets the database.
    pub fn drop_database(&mut self, name: &str) -> DbResult<()> {
        let key = name.to_lowercase();
        if !self.databases.contains_key(&key) {
            return Err(ValidationError::UnknownDatabase(key).into());
        }

        let path = self.database_path(&key);
        if path.exists() {
            fs::remove_dir_all(&path).map_err(|e| {
                DbError::persistence(format!("failed to remove {}", path.display()), e)
            })?;
        }
        self.databases.remove(&key);
        info!(database = %key, "dropped database");
        Ok(())
    }

    pub fn table(&self, database: &str, table: &str) -> DbResult<&Table> {
        self.database(database)
            .ok_or_else(|| ValidationError::UnknownDatabase(database.to_lowercase()))?
            .table(table)
            .ok_or_else(|| ValidationError::UnknownTable(table.to_lowercase()).into())
    }

    fn table_mut(&mut self, database: &str, table: &str) -> DbResult<&mut Table> {
        self.databases
            .get_mut(&database.to_lowercase())
            .ok_or_else(|| ValidationError::UnknownDatabase(database.to_lowercase()))?
            .table_mut(table)
            .ok_or_else(|| ValidationError::UnknownTable(table.to_lowercase()).into())
    }

    /// Creates a table with an implicit id column and writes its header.
    pub fn create_table<S: AsRef<str>>(
        &mut self,
        database: &str,
        name: &str,
        columns: &[S],
    ) -> DbResult<()> {
        let path = self.table_path(database, name);
        let db = self
            .databases
            .get_mut(&database.to_lowercase())
            .ok_or_else(|| ValidationError::UnknownDatabase(database.to_lowercase()))?;
        if db.has_table(name) {
            return Err(ValidationError::TableExists(name.to_lowercase()).into());
        }
        if let Some(keyword) = columns.iter().map(|c| c.as_ref()).find(|c| is_keyword(c)) {
            return Err(ValidationError::ReservedKeyword(keyword.to_string()).into());
        }

        let table = Table::with_columns(name, columns)?;
        write_table_file(&path, &table)?;
        info!(database = db.name(), table = table.name(), "created table");
        db.add_table(table);
        Ok(())
    }

    pub fn drop_table(&mut self, database: &str, name: &str) -> DbResult<()> {
        let path = self.table_path(database, name);
        let db = self
            .databases
            .get_mut(&database.to_lowercase())
            .ok_or_else(|| ValidationError::UnknownDatabase(database.to_lowercase()))?;
        if !db.has_table(name) {
            return Err(ValidationError::UnknownTable(name.to_lowercase()).into());
        }

        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                DbError::persistence(format!("failed to remove {}", path.display()), e)
            })?;
        }
        db.remove_table(name);
        info!(database = db.name(), table = %name.to_lowercase(), "dropped table");
        Ok(())
    }

    pub fn insert_row(
        &mut self,
        database: &str,
        table: &str,
        values: Vec<Option<String>>,
    ) -> DbResult<u64> {
        let path = self.table_path(database, table);
        let table = self.table_mut(database, table)?;
        let id = table.insert_row(values)?;
        write_table_file(&path, table)?;
        Ok(id)
    }

    /// Applies the same assignments to each listed row, then rewrites the
    /// file. Rows updated before a failure stay updated and are persisted.
    pub fn update_rows(
        &mut self,
        database: &str,
        table: &str,
        ids: &[u64],
        assignments: &[(usize, Option<String>)],
    ) -> DbResult<()> {
        let path = self.table_path(database, table);
        let table = self.table_mut(database, table)?;
        let outcome = ids
            .iter()
            .try_for_each(|id| table.update_row(*id, assignments));
        write_table_file(&path, table)?;
        outcome.map_err(DbError::from)
    }

    /// Removes each listed row and returns how many were present.
    pub fn delete_rows(&mut self, database: &str, table: &str, ids: &[u64]) -> DbResult<usize> {
        let path = self.table_path(database, table);
        let table = self.table_mut(database, table)?;
        let deleted = ids.iter().filter(|id| table.delete_row(**id)).count();
        write_table_file(&path, table)?;
        Ok(deleted)
    }

    pub fn add_column(&mut self, database: &str, table: &str, column: &str) -> DbResult<()> {
        let path = self.table_path(database, table);
        let table = self.table_mut(database, table)?;
        table.add_column(column)?;
        write_table_file(&path, table)
    }

    pub fn drop_column(&mut self, database: &str, table: &str, column: &str) -> DbResult<()> {
        let path = self.table_path(database, table);
        let table = self.table_mut(database, table)?;
        table.drop_column(column)?;
        write_table_file(&path, table)
    }
}
