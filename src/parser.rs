use crate::ast::{
    AlterAction, AlterTableCommand, Command, Comparison, Condition, CreateDatabaseCommand,
    CreateTableCommand, DeleteCommand, DropDatabaseCommand, DropTableCommand, InsertCommand,
    JoinCommand, Literal, Projection, SelectCommand, UpdateCommand, UseCommand,
};
use crate::error::ParseError;
use crate::tokenizer::{tokenize, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, ""));
        }
        Self { tokens, current: 0 }
    }

    /// Parses exactly one command terminated by a single `;`.
    pub fn parse(&mut self) -> Result<Command, ParseError> {
        let command = self.parse_command()?;
        self.expect(TokenKind::Semicolon, "';' at end of command")?;
        if self.peek().kind != TokenKind::Eof {
            return Err(self.unexpected("end of input after ';'"));
        }
        Ok(command)
    }

    fn parse_command(&mut self) -> Result<Command, ParseError> {
        let keyword = match self.peek() {
            token if token.kind == TokenKind::Keyword => token.value.clone(),
            token => return Err(ParseError::UnknownCommand(token.to_string())),
        };
        match keyword.as_str() {
            "USE" => { self.advance(); self.parse_use() }
            "CREATE" => { self.advance(); self.parse_create() }
            "DROP" => { self.advance(); self.parse_drop() }
            "ALTER" => { self.advance(); self.parse_alter() }
            "INSERT" => { self.advance(); self.parse_insert() }
            "SELECT" => { self.advance(); self.parse_select() }
            "UPDATE" => { self.advance(); self.parse_update() }
            "DELETE" => { self.advance(); self.parse_delete() }
            "JOIN" => { self.advance(); self.parse_join() }
            _ => Err(ParseError::UnknownCommand(self.peek().to_string())),
        }
    }

    fn parse_use(&mut self) -> Result<Command, ParseError> {
        let database = self.expect_identifier("database name")?;
        Ok(Command::Use(UseCommand { database }))
    }

    fn parse_create(&mut self) -> Result<Command, ParseError> {
        if self.match_keyword("DATABASE") {
            let database = self.expect_identifier("database name")?;
            return Ok(Command::CreateDatabase(CreateDatabaseCommand { database }));
        }
        if !self.match_keyword("TABLE") {
            return Err(self.unexpected("'DATABASE' or 'TABLE' after 'CREATE'"));
        }

        let table = self.expect_identifier("table name")?;
        let mut columns = Vec::new();
        if self.match_kind(TokenKind::LeftParen) {
            loop {
                columns.push(self.expect_identifier("column name")?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RightParen, "')' after column definitions")?;
        }
        Ok(Command::CreateTable(CreateTableCommand { table, columns }))
    }

    fn parse_drop(&mut self) -> Result<Command, ParseError> {
        if self.match_keyword("DATABASE") {
            let database = self.expect_identifier("database name")?;
            Ok(Command::DropDatabase(DropDatabaseCommand { database }))
        } else if self.match_keyword("TABLE") {
            let table = self.expect_identifier("table name")?;
            Ok(Command::DropTable(DropTableCommand { table }))
        } else {
            Err(self.unexpected("'DATABASE' or 'TABLE' after 'DROP'"))
        }
    }

    fn parse_alter(&mut self) -> Result<Command, ParseError> {
        self.expect_keyword("TABLE", "'TABLE' after 'ALTER'")?;
        let table = self.expect_identifier("table name")?;

        let add = if self.match_keyword("ADD") {
            true
        } else if self.match_keyword("DROP") {
            false
        } else {
            return Err(self.unexpected("'ADD' or 'DROP' after table name"));
        };

        let column = self.expect_identifier("column name")?;
        let action = if add {
            AlterAction::AddColumn(column)
        } else {
            AlterAction::DropColumn(column)
        };
        Ok(Command::AlterTable(AlterTableCommand { table, action }))
    }

    fn parse_insert(&mut self) -> Result<Command, ParseError> {
        self.expect_keyword("INTO", "'INTO' after 'INSERT'")?;
        let table = self.expect_identifier("table name")?;
        self.expect_keyword("VALUES", "'VALUES' after table name")?;
        self.expect(TokenKind::LeftParen, "'(' after 'VALUES'")?;

        let mut values = Vec::new();
        loop {
            values.push(self.parse_literal()?);
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }

        self.expect(TokenKind::RightParen, "')' after values")?;
        Ok(Command::Insert(InsertCommand { table, values }))
    }

    fn parse_select(&mut self) -> Result<Command, ParseError> {
        let projection = if self.match_kind(TokenKind::Star) {
            Projection::All
        } else {
            let mut columns = Vec::new();
            loop {
                columns.push(self.expect_identifier("attribute name")?);
                if !self.match_kind(TokenKind::Comma) {
                    break;
                }
            }
            Projection::Columns(columns)
        };

        self.expect_keyword("FROM", "'FROM' after attribute list")?;
        let table = self.expect_identifier("table name")?;

        let condition = if self.match_keyword("WHERE") {
            Some(self.parse_condition()?)
        } else {
            None
        };

        Ok(Command::Select(SelectCommand { projection, table, condition }))
    }

    fn parse_update(&mut self) -> Result<Command, ParseError> {
        let table = self.expect_identifier("table name")?;
        self.expect_keyword("SET", "'SET' after table name")?;

        let mut assignments = Vec::new();
        loop {
            let column = self.expect_identifier("attribute name")?;
            if !(self.peek().kind == TokenKind::Operator && self.peek().value == "=") {
                return Err(self.unexpected("'=' after attribute name"));
            }
            self.advance();
            assignments.push((column, self.parse_literal()?));
            if !self.match_kind(TokenKind::Comma) {
                break;
            }
        }

        self.expect_keyword("WHERE", "'WHERE' after assignments")?;
        let condition = self.parse_condition()?;
        Ok(Command::Update(UpdateCommand { table, assignments, condition }))
    }

    fn parse_delete(&mut self) -> Result<Command, ParseError> {
        self.expect_keyword("FROM", "'FROM' after 'DELETE'")?;
        let table = self.expect_identifier("table name")?;
        self.expect_keyword("WHERE", "'WHERE' after table name")?;
        let condition = self.parse_condition()?;
        Ok(Command::Delete(DeleteCommand { table, condition }))
    }

    fn parse_join(&mut self) -> Result<Command, ParseError> {
        let left_table = self.expect_identifier("first table name")?;
        self.expect_keyword("AND", "'AND' after first table name")?;
        let right_table = self.expect_identifier("second table name")?;
        self.expect_keyword("ON", "'ON' after second table name")?;
        let left_attribute = self.expect_identifier("first attribute name")?;
        self.expect_keyword("AND", "'AND' after first attribute name")?;
        let right_attribute = self.expect_identifier("second attribute name")?;

        Ok(Command::Join(JoinCommand {
            left_table,
            right_table,
            left_attribute,
            right_attribute,
        }))
    }

    /// A parenthesised condition may be followed by AND/OR, whose right operand
    /// is everything that follows. There is no precedence between AND and OR.
    fn parse_condition(&mut self) -> Result<Condition, ParseError> {
        if self.match_kind(TokenKind::LeftParen) {
            let inner = self.parse_condition()?;
            self.expect(TokenKind::RightParen, "')' after condition")?;

            if self.match_keyword("AND") {
                let rest = self.parse_condition()?;
                return Ok(Condition::And(Box::new(inner), Box::new(rest)));
            }
            if self.match_keyword("OR") {
                let rest = self.parse_condition()?;
                return Ok(Condition::Or(Box::new(inner), Box::new(rest)));
            }
            return Ok(inner);
        }

        let attribute = self.expect_identifier("attribute name")?;
        let operator = match self.peek() {
            token if token.kind == TokenKind::Operator || token.is_keyword("LIKE") => {
                token.value.clone()
            }
            _ => return Err(self.unexpected("comparison operator")),
        };
        self.advance();

        let comparison = Comparison::new(attribute, self.parse_literal()?);
        match operator.as_str() {
            "==" => Ok(Condition::Equals(comparison)),
            "!=" => Ok(Condition::NotEquals(comparison)),
            ">" => Ok(Condition::GreaterThan(comparison)),
            "<" => Ok(Condition::LessThan(comparison)),
            ">=" => Ok(Condition::GreaterOrEqual(comparison)),
            "<=" => Ok(Condition::LessOrEqual(comparison)),
            "LIKE" => Ok(Condition::Like(comparison)),
            _ => Err(ParseError::UnsupportedOperator(operator)),
        }
    }

    fn parse_literal(&mut self) -> Result<Literal, ParseError> {
        let token = self.peek().clone();
        let literal = match token.kind {
            TokenKind::StringLiteral => Literal::Text(token.value),
            TokenKind::Number => Literal::Number(token.value),
            TokenKind::Keyword if token.value == "TRUE" => Literal::Boolean(true),
            TokenKind::Keyword if token.value == "FALSE" => Literal::Boolean(false),
            TokenKind::Keyword if token.value == "NULL" => Literal::Null,
            _ => return Err(self.unexpected("value")),
        };
        self.advance();
        Ok(literal)
    }

    fn advance(&mut self) -> &Token {
        let token = &self.tokens[self.current.min(self.tokens.len() - 1)];
        if self.current < self.tokens.len() - 1 {
            self.current += 1;
        }
        token
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn match_kind(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_keyword(&mut self, keyword: &str) -> bool {
        if self.peek().is_keyword(keyword) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<(), ParseError> {
        if self.match_kind(kind) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_keyword(&mut self, keyword: &str, expected: &str) -> Result<(), ParseError> {
        if self.match_keyword(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn expect_identifier(&mut self, expected: &str) -> Result<String, ParseError> {
        if self.peek().kind == TokenKind::Identifier {
            Ok(self.advance().value.clone())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::Unexpected {
            expected: expected.to_string(),
            found: self.peek().to_string(),
        }
    }
}

/// Parses an already tokenized statement.
pub fn parse_sql(tokens: Vec<Token>) -> Result<Command, ParseError> {
    let mut parser = Parser::new(tokens);
    parser.parse()
}

/// Tokenizes and parses a single statement.
pub fn parse_command(input: &str) -> Result<Command, ParseError> {
    parse_sql(tokenize(input)?)
}
