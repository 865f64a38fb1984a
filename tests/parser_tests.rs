#[cfg(test)]
mod tests {
    use tabsql::ast::{
        AlterAction, AlterTableCommand, Command, Comparison, Condition, CreateDatabaseCommand,
        CreateTableCommand, DeleteCommand, DropDatabaseCommand, DropTableCommand, InsertCommand,
        JoinCommand, Literal, Projection, SelectCommand, UpdateCommand, UseCommand,
    };
    use tabsql::error::ParseError;
    use tabsql::parser::parse_sql;
    use tabsql::tokenizer::tokenize;

    fn parse(sql: &str) -> Result<Command, ParseError> {
        parse_sql(tokenize(sql)?)
    }

    fn text(s: &str) -> Literal {
        Literal::Text(s.to_string())
    }

    fn num(n: &str) -> Literal {
        Literal::Number(n.to_string())
    }

    #[test]
    fn test_parse_use_and_database_commands() {
        assert_eq!(
            parse("USE markbook;").unwrap(),
            Command::Use(UseCommand { database: "markbook".to_string() })
        );
        assert_eq!(
            parse("create database Shop;").unwrap(),
            Command::CreateDatabase(CreateDatabaseCommand { database: "Shop".to_string() })
        );
        assert_eq!(
            parse("DROP DATABASE shop;").unwrap(),
            Command::DropDatabase(DropDatabaseCommand { database: "shop".to_string() })
        );
    }

    #[test]
    fn test_parse_create_table() {
        assert_eq!(
            parse("CREATE TABLE marks(name, mark);").unwrap(),
            Command::CreateTable(CreateTableCommand {
                table: "marks".to_string(),
                columns: vec!["name".to_string(), "mark".to_string()],
            })
        );
        assert_eq!(
            parse("CREATE TABLE empty;").unwrap(),
            Command::CreateTable(CreateTableCommand {
                table: "empty".to_string(),
                columns: vec![],
            })
        );
    }

    #[test]
    fn test_parse_drop_table_and_alter() {
        assert_eq!(
            parse("DROP TABLE marks;").unwrap(),
            Command::DropTable(DropTableCommand { table: "marks".to_string() })
        );
        assert_eq!(
            parse("ALTER TABLE marks ADD pass;").unwrap(),
            Command::AlterTable(AlterTableCommand {
                table: "marks".to_string(),
                action: AlterAction::AddColumn("pass".to_string()),
            })
        );
        assert_eq!(
            parse("ALTER TABLE marks DROP pass;").unwrap(),
            Command::AlterTable(AlterTableCommand {
                table: "marks".to_string(),
                action: AlterAction::DropColumn("pass".to_string()),
            })
        );
    }

    #[test]
    fn test_parse_insert() {
        let expected = Command::Insert(InsertCommand {
            table: "marks".to_string(),
            values: vec![text("Alice"), num("70"), Literal::Boolean(true), Literal::Null],
        });
        assert_eq!(parse("INSERT INTO marks VALUES('Alice', 70, TRUE, NULL);").unwrap(), expected);
    }

    #[test]
    fn test_parse_select() {
        let expected = Command::Select(SelectCommand {
            projection: Projection::Columns(vec!["name".to_string(), "mark".to_string()]),
            table: "marks".to_string(),
            condition: Some(Condition::GreaterThan(Comparison::new("mark", num("60")))),
        });
        assert_eq!(parse("SELECT name, mark FROM marks WHERE mark > 60;").unwrap(), expected);

        let star = parse("SELECT * FROM marks;").unwrap();
        assert_eq!(
            star,
            Command::Select(SelectCommand {
                projection: Projection::All,
                table: "marks".to_string(),
                condition: None,
            })
        );
    }

    #[test]
    fn test_parse_update_multiple_assignments() {
        let expected = Command::Update(UpdateCommand {
            table: "marks".to_string(),
            assignments: vec![
                ("mark".to_string(), num("38")),
                ("pass".to_string(), Literal::Boolean(false)),
            ],
            condition: Condition::Equals(Comparison::new("name", text("Chris"))),
        });
        let result = parse("UPDATE marks SET mark = 38, pass = FALSE WHERE name == 'Chris';").unwrap();
        assert_eq!(result, expected);
    }

    #[test]
    fn test_parse_delete() {
        let expected = Command::Delete(DeleteCommand {
            table: "marks".to_string(),
            condition: Condition::Like(Comparison::new("name", text("li"))),
        });
        assert_eq!(parse("DELETE FROM marks WHERE name LIKE 'li';").unwrap(), expected);
    }

    #[test]
    fn test_parse_join() {
        let expected = Command::Join(JoinCommand {
            left_table: "coursework".to_string(),
            right_table: "marks".to_string(),
            left_attribute: "submission".to_string(),
            right_attribute: "id".to_string(),
        });
        assert_eq!(parse("JOIN coursework AND marks ON submission AND id;").unwrap(), expected);
    }

    #[test]
    fn test_parse_nested_condition() {
        let result = parse("SELECT * FROM marks WHERE ((pass == TRUE) AND (mark >= 50)) OR name != 'Bob';")
            .unwrap();
        let expected = Condition::Or(
            Box::new(Condition::And(
                Box::new(Condition::Equals(Comparison::new("pass", Literal::Boolean(true)))),
                Box::new(Condition::GreaterOrEqual(Comparison::new("mark", num("50")))),
            )),
            Box::new(Condition::NotEquals(Comparison::new("name", text("Bob")))),
        );
        match result {
            Command::Select(stmt) => assert_eq!(stmt.condition, Some(expected)),
            other => panic!("expected SELECT, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_semicolon_fails() {
        assert!(parse("SELECT * FROM marks").is_err());
        assert!(parse("SELECT * FROM marks;;").is_err());
    }

    #[test]
    fn test_delete_requires_where() {
        assert!(parse("DELETE FROM logs;").is_err());
        assert!(parse("UPDATE logs SET a = 1;").is_err());
    }

    #[test]
    fn test_unknown_command_fails() {
        assert!(matches!(parse("TRUNCATE marks;"), Err(ParseError::UnknownCommand(_))));
        assert!(matches!(parse("SELECT * FROM t WHERE a = 1;"), Err(ParseError::UnsupportedOperator(_))));
    }

    #[test]
    fn test_unterminated_string_fails() {
        assert!(matches!(
            parse("INSERT INTO t VALUES('oops);"),
            Err(ParseError::UnterminatedString(_))
        ));
    }
}
