pub mod tokenizer;
pub mod parser;
pub mod ast;
pub mod condition;
pub mod model;
pub mod executor;
pub mod storage;
pub mod integration;
pub mod server;
pub mod config;
pub mod error;

pub use ast::{Command, Comparison, Condition, Literal};
pub use error::{DbError, DbResult, ParseError, ValidationError};
pub use executor::Session;
pub use integration::Engine;
pub use model::{Column, Database, QueryResult, Row, Table};
pub use parser::{parse_command, parse_sql};
pub use storage::StorageManager;
pub use tokenizer::tokenize;
