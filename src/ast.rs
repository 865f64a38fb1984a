#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Use(UseCommand),
    CreateDatabase(CreateDatabaseCommand),
    CreateTable(CreateTableCommand),
    DropDatabase(DropDatabaseCommand),
    DropTable(DropTableCommand),
    AlterTable(AlterTableCommand),
    Insert(InsertCommand),
    Select(SelectCommand),
    Update(UpdateCommand),
    Delete(DeleteCommand),
    Join(JoinCommand),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UseCommand {
    pub database: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateDatabaseCommand {
    pub database: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableCommand {
    pub table: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropDatabaseCommand {
    pub database: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropTableCommand {
    pub table: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlterAction {
    AddColumn(String),
    DropColumn(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlterTableCommand {
    pub table: String,
    pub action: AlterAction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertCommand {
    pub table: String,
    pub values: Vec<Literal>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    All,
    Columns(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectCommand {
    pub projection: Projection,
    pub table: String,
    pub condition: Option<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateCommand {
    pub table: String,
    pub assignments: Vec<(String, Literal)>,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteCommand {
    pub table: String,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinCommand {
    pub left_table: String,
    pub right_table: String,
    pub left_attribute: String,
    pub right_attribute: String,
}

/// A value written in a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// A single-quoted string, quotes removed.
    Text(String),
    /// Numeric text exactly as written.
    Number(String),
    Boolean(bool),
    Null,
}

impl Literal {
    /// The cell this literal stores when inserted or assigned.
    pub fn to_cell(&self) -> Option<String> {
        match self {
            Literal::Text(s) | Literal::Number(s) => Some(s.clone()),
            Literal::Boolean(true) => Some("TRUE".to_string()),
            Literal::Boolean(false) => Some("FALSE".to_string()),
            Literal::Null => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub attribute: String,
    pub value: Literal,
}

impl Comparison {
    pub fn new(attribute: impl Into<String>, value: Literal) -> Self {
        Self {
            attribute: attribute.into(),
            value,
        }
    }
}

/// WHERE clause predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Equals(Comparison),
    NotEquals(Comparison),
    GreaterThan(Comparison),
    LessThan(Comparison),
    GreaterOrEqual(Comparison),
    LessOrEqual(Comparison),
    Like(Comparison),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
}
