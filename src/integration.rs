use std::path::PathBuf;

use tracing::warn;

use crate::error::DbResult;
use crate::executor::Session;
use crate::model::QueryResult;
use crate::parser::parse_command;
use crate::storage::StorageManager;

/// Storage plus one client session: runs raw statement text end to end.
pub struct Engine {
    storage: StorageManager,
    session: Session,
}

impl Engine {
    pub fn open(root: impl Into<PathBuf>) -> DbResult<Self> {
        Ok(Self::new(StorageManager::open(root)?))
    }

    pub fn new(storage: StorageManager) -> Self {
        Self {
            storage,
            session: Session::new(),
        }
    }

    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Tokenizes, parses and executes a single statement.
    pub fn execute(&mut self, query: &str) -> DbResult<QueryResult> {
        let command = parse_command(query)?;
        command.execute(&mut self.storage, &mut self.session)
    }

    /// Runs `query` and renders the outcome as the text sent to clients.
    pub fn handle_command(&mut self, query: &str) -> String {
        match self.execute(query) {
            Ok(result) => format_success(&result),
            Err(e) => {
                warn!(query, error = %e, "command failed");
                format!("[ERROR] {}", e)
            }
        }
    }
}

fn format_success(result: &QueryResult) -> String {
    if result.is_empty() {
        "[OK]".to_string()
    } else {
        format!("[OK]\n{}", result)
    }
}
