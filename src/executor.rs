use tracing::debug;

use crate::ast::{
    AlterAction, AlterTableCommand, Command, Condition, CreateDatabaseCommand, CreateTableCommand,
    DeleteCommand, DropDatabaseCommand, DropTableCommand, InsertCommand, JoinCommand, Projection,
    SelectCommand, UpdateCommand, UseCommand,
};
use crate::error::{DbResult, ValidationError};
use crate::model::{QueryResult, Table, ID_COLUMN};
use crate::storage::StorageManager;

/// Per-client state: which database unqualified table names refer to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    active_database: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_database(&self) -> Option<&str> {
        self.active_database.as_deref()
    }

    pub fn use_database(&mut self, name: &str) {
        self.active_database = Some(name.to_lowercase());
    }

    /// Forgets the active database if it is `name`.
    pub fn forget_database(&mut self, name: &str) {
        if self.active_database.as_deref() == Some(name.to_lowercase().as_str()) {
            self.active_database = None;
        }
    }

    pub fn require_database(&self) -> Result<&str, ValidationError> {
        self.active_database()
            .ok_or(ValidationError::NoDatabaseSelected)
    }
}

impl Command {
    pub fn execute(&self, storage: &mut StorageManager, session: &mut Session) -> DbResult<QueryResult> {
        Executor::new(storage, session).execute(self)
    }

    fn kind(&self) -> &'static str {
        match self {
            Command::Use(_) => "USE",
            Command::CreateDatabase(_) => "CREATE DATABASE",
            Command::CreateTable(_) => "CREATE TABLE",
            Command::DropDatabase(_) => "DROP DATABASE",
            Command::DropTable(_) => "DROP TABLE",
            Command::AlterTable(_) => "ALTER TABLE",
            Command::Insert(_) => "INSERT",
            Command::Select(_) => "SELECT",
            Command::Update(_) => "UPDATE",
            Command::Delete(_) => "DELETE",
            Command::Join(_) => "JOIN",
        }
    }
}

pub struct Executor<'a> {
    storage: &'a mut StorageManager,
    session: &'a mut Session,
}

impl<'a> Executor<'a> {
    pub fn new(storage: &'a mut StorageManager, session: &'a mut Session) -> Self {
        Self { storage, session }
    }

    pub fn execute(&mut self, command: &Command) -> DbResult<QueryResult> {
        debug!(
            command = command.kind(),
            database = self.session.active_database().unwrap_or("-"),
            "executing"
        );
        match command {
            Command::Use(c) => self.execute_use(c),
            Command::CreateDatabase(c) => self.execute_create_database(c),
            Command::CreateTable(c) => self.execute_create_table(c),
            Command::DropDatabase(c) => self.execute_drop_database(c),
            Command::DropTable(c) => self.execute_drop_table(c),
            Command::AlterTable(c) => self.execute_alter_table(c),
            Command::Insert(c) => self.execute_insert(c),
            Command::Select(c) => self.execute_select(c),
            Command::Update(c) => self.execute_update(c),
            Command::Delete(c) => self.execute_delete(c),
            Command::Join(c) => self.execute_join(c),
        }
    }

    fn active_database(&self) -> DbResult<String> {
        Ok(self.session.require_database()?.to_string())
    }

    fn execute_use(&mut self, stmt: &UseCommand) -> DbResult<QueryResult> {
        if !self.storage.has_database(&stmt.database) {
            return Err(ValidationError::UnknownDatabase(stmt.database.to_lowercase()).into());
        }
        self.session.use_database(&stmt.database);
        Ok(QueryResult::empty())
    }

    fn execute_create_database(&mut self, stmt: &CreateDatabaseCommand) -> DbResult<QueryResult> {
        self.storage.create_database(&stmt.database)?;
        Ok(QueryResult::empty())
    }

    fn execute_create_table(&mut self, stmt: &CreateTableCommand) -> DbResult<QueryResult> {
        let db = self.active_database()?;
        self.storage.create_table(&db, &stmt.table, &stmt.columns)?;
        Ok(QueryResult::empty())
    }

    fn execute_drop_database(&mut self, stmt: &DropDatabaseCommand) -> DbResult<QueryResult> {
        self.storage.drop_database(&stmt.database)?;
        self.session.forget_database(&stmt.database);
        Ok(QueryResult::empty())
    }

    fn execute_drop_table(&mut self, stmt: &DropTableCommand) -> DbResult<QueryResult> {
        let db = self.active_database()?;
        self.storage.drop_table(&db, &stmt.table)?;
        Ok(QueryResult::empty())
    }

    fn execute_alter_table(&mut self, stmt: &AlterTableCommand) -> DbResult<QueryResult> {
        let db = self.active_database()?;
        match &stmt.action {
            AlterAction::AddColumn(column) => self.storage.add_column(&db, &stmt.table, column)?,
            AlterAction::DropColumn(column) => self.storage.drop_column(&db, &stmt.table, column)?,
        }
        Ok(QueryResult::empty())
    }

    fn execute_insert(&mut self, stmt: &InsertCommand) -> DbResult<QueryResult> {
        let db = self.active_database()?;
        let values = stmt.values.iter().map(|v| v.to_cell()).collect();
        let id = self.storage.insert_row(&db, &stmt.table, values)?;
        debug!(table = %stmt.table, id, "inserted row");
        Ok(QueryResult::empty())
    }

    fn execute_select(&self, stmt: &SelectCommand) -> DbResult<QueryResult> {
        let db = self.active_database()?;
        let table = self.storage.table(&db, &stmt.table)?;

        let indexes: Vec<usize> = match &stmt.projection {
            Projection::All => (0..table.columns().len()).collect(),
            Projection::Columns(names) => names
                .iter()
                .map(|name| table.require_column(name))
                .collect::<Result<_, _>>()?,
        };

        let header = indexes
            .iter()
            .map(|&i| table.columns()[i].name().to_string())
            .collect();
        let mut result = QueryResult::new(header);

        for row in table.rows() {
            if let Some(condition) = &stmt.condition {
                if !condition.evaluate(table, row)? {
                    continue;
                }
            }
            result.push_row(indexes.iter().map(|&i| row.display_value(i)).collect());
        }
        Ok(result)
    }

    fn execute_update(&mut self, stmt: &UpdateCommand) -> DbResult<QueryResult> {
        let db = self.active_database()?;
        let table = self.storage.table(&db, &stmt.table)?;

        if stmt
            .assignments
            .iter()
            .any(|(column, _)| column.eq_ignore_ascii_case(ID_COLUMN))
        {
            return Err(ValidationError::IdColumnProtected("update").into());
        }
        let assignments = stmt
            .assignments
            .iter()
            .map(|(column, value)| {
                table
                    .require_column(column)
                    .map(|index| (index, value.to_cell()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let ids = matching_ids(table, &stmt.condition)?;
        self.storage.update_rows(&db, &stmt.table, &ids, &assignments)?;
        debug!(table = %stmt.table, rows = ids.len(), "updated rows");
        Ok(QueryResult::empty())
    }

    fn execute_delete(&mut self, stmt: &DeleteCommand) -> DbResult<QueryResult> {
        let db = self.active_database()?;
        let table = self.storage.table(&db, &stmt.table)?;
        let ids = matching_ids(table, &stmt.condition)?;
        let deleted = self.storage.delete_rows(&db, &stmt.table, &ids)?;
        debug!(table = %stmt.table, rows = deleted, "deleted rows");
        Ok(QueryResult::empty())
    }

    /// Nested-loop inner join on raw cell text. Null cells never match.
    fn execute_join(&self, stmt: &JoinCommand) -> DbResult<QueryResult> {
        let db = self.active_database()?;
        let left = self.storage.table(&db, &stmt.left_table)?;
        let right = self.storage.table(&db, &stmt.right_table)?;
        let left_key = join_column(left, &stmt.left_attribute)?;
        let right_key = join_column(right, &stmt.right_attribute)?;

        let mut header = vec![ID_COLUMN.to_string()];
        // prefixed with the table names as written in the command
        for (prefix, table) in [(&stmt.left_table, left), (&stmt.right_table, right)] {
            header.extend(
                table
                    .columns()
                    .iter()
                    .filter(|c| !c.is_id())
                    .map(|c| format!("{}.{}", prefix, c.name())),
            );
        }
        let mut result = QueryResult::new(header);

        let mut next_id = 1u64;
        for left_row in left.rows() {
            let key = match left_row.cell(left_key) {
                Some(key) => key,
                None => continue,
            };
            for right_row in right.rows() {
                if right_row.cell(right_key) != Some(key) {
                    continue;
                }
                let mut joined = vec![next_id.to_string()];
                joined.extend((1..left.columns().len()).map(|i| left_row.display_value(i)));
                joined.extend((1..right.columns().len()).map(|i| right_row.display_value(i)));
                result.push_row(joined);
                next_id += 1;
            }
        }
        Ok(result)
    }
}

/// Ids of every row satisfying `condition`, collected before any mutation.
fn matching_ids(table: &Table, condition: &Condition) -> DbResult<Vec<u64>> {
    let mut ids = Vec::new();
    for row in table.rows() {
        if condition.evaluate(table, row)? {
            ids.push(row.id());
        }
    }
    Ok(ids)
}

fn join_column(table: &Table, attribute: &str) -> DbResult<usize> {
    table.column_index(attribute).ok_or_else(|| {
        ValidationError::UnknownColumn(format!("{}.{}", table.name(), attribute)).into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_command;
    use tempfile::TempDir;

    fn run(storage: &mut StorageManager, session: &mut Session, sql: &str) -> DbResult<QueryResult> {
        parse_command(sql)?.execute(storage, session)
    }

    #[test]
    fn session_starts_unselected() {
        let session = Session::new();
        assert_eq!(session.active_database(), None);
        assert_eq!(session.require_database(), Err(ValidationError::NoDatabaseSelected));
    }

    #[test]
    fn use_switches_and_drop_clears_active_database() {
        let tmp = TempDir::new().unwrap();
        let mut storage = StorageManager::open(tmp.path()).unwrap();
        let mut session = Session::new();

        run(&mut storage, &mut session, "CREATE DATABASE one;").unwrap();
        run(&mut storage, &mut session, "CREATE DATABASE two;").unwrap();
        run(&mut storage, &mut session, "USE One;").unwrap();
        assert_eq!(session.active_database(), Some("one"));
        run(&mut storage, &mut session, "USE two;").unwrap();
        assert_eq!(session.active_database(), Some("two"));

        run(&mut storage, &mut session, "DROP DATABASE one;").unwrap();
        assert_eq!(session.active_database(), Some("two"));
        run(&mut storage, &mut session, "DROP DATABASE TWO;").unwrap();
        assert_eq!(session.active_database(), None);
    }

    #[test]
    fn use_unknown_database_fails_and_keeps_selection() {
        let tmp = TempDir::new().unwrap();
        let mut storage = StorageManager::open(tmp.path()).unwrap();
        let mut session = Session::new();
        run(&mut storage, &mut session, "CREATE DATABASE one;").unwrap();
        run(&mut storage, &mut session, "USE one;").unwrap();
        assert!(run(&mut storage, &mut session, "USE nowhere;").is_err());
        assert_eq!(session.active_database(), Some("one"));
    }

    #[test]
    fn table_commands_need_an_active_database() {
        let tmp = TempDir::new().unwrap();
        let mut storage = StorageManager::open(tmp.path()).unwrap();
        let mut session = Session::new();
        for sql in [
            "CREATE TABLE t;",
            "SELECT * FROM t;",
            "INSERT INTO t VALUES(1);",
            "JOIN a AND b ON x AND y;",
        ] {
            let err = run(&mut storage, &mut session, sql).unwrap_err();
            assert_eq!(err.to_string(), "no database selected", "{}", sql);
        }
    }

    #[test]
    fn update_collects_matches_before_mutating() {
        let tmp = TempDir::new().unwrap();
        let mut storage = StorageManager::open(tmp.path()).unwrap();
        let mut session = Session::new();
        for sql in [
            "CREATE DATABASE d;",
            "USE d;",
            "CREATE TABLE t(n);",
            "INSERT INTO t VALUES(1);",
            "INSERT INTO t VALUES(2);",
            "UPDATE t SET n=2 WHERE n==1;",
        ] {
            run(&mut storage, &mut session, sql).unwrap();
        }
        let result = run(&mut storage, &mut session, "SELECT id FROM t WHERE n==2;").unwrap();
        assert_eq!(result.rows().len(), 2);
    }
}
