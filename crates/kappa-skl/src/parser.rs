//! Recursive-descent parser for SKL statements.

use crate::ast::{
    CreateNamespaceStatement, DropNamespaceStatement, ShowNamespacesStatement, Statement,
    UseStatement,
};
use crate::error::ParseError;
use crate::scanner::BufScanner;
use crate::tokens::{tokstr, Pos, Token};
use kappa_commons::NamespaceName;

/// Parses a statement string into its AST representation.
pub fn parse_statement(input: &str) -> Result<Statement, ParseError> {
    Parser::new(input).parse_statement()
}

/// An SKL parser over a buffered scanner.
pub struct Parser {
    s: BufScanner,
}

impl Parser {
    pub fn new(input: &str) -> Self {
        Self {
            s: BufScanner::new(input),
        }
    }

    /// Parses a single statement.
    pub fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let (tok, pos, lit) = self.scan_ignore_whitespace();
        match tok {
            Token::Use => self.parse_use_statement(),
            Token::Create => self.parse_create_statement(),
            Token::Drop => self.parse_drop_statement(),
            Token::Show => self.parse_show_statement(),
            // Reserved statement keywords without an executor yet.
            Token::Select
            | Token::Insert
            | Token::Update
            | Token::Describe
            | Token::Subscribe
            | Token::Unsubscribe
            | Token::Add
            | Token::Remove
            | Token::Set => Err(ParseError::with_message(
                format!("unsupported statement '{}'", tokstr(tok, &lit)),
                pos,
            )),
            _ => Err(ParseError::new(
                tokstr(tok, &lit),
                vec!["USE", "CREATE", "DROP", "SHOW"],
                pos,
            )),
        }
    }

    /// Assumes the `USE` token has already been consumed.
    fn parse_use_statement(&mut self) -> Result<Statement, ParseError> {
        let name = self.parse_namespace()?;
        Ok(Statement::Use(UseStatement { name }))
    }

    /// Assumes the `CREATE` token has already been consumed.
    fn parse_create_statement(&mut self) -> Result<Statement, ParseError> {
        let (tok, pos, lit) = self.scan_ignore_whitespace();
        match tok {
            Token::Namespace => {
                let name = self.parse_namespace()?;
                Ok(Statement::CreateNamespace(CreateNamespaceStatement { name }))
            }
            _ => Err(ParseError::new(tokstr(tok, &lit), vec!["NAMESPACE"], pos)),
        }
    }

    /// Assumes the `DROP` token has already been consumed.
    fn parse_drop_statement(&mut self) -> Result<Statement, ParseError> {
        let (tok, pos, lit) = self.scan_ignore_whitespace();
        match tok {
            Token::Namespace => {
                let name = self.parse_namespace()?;
                Ok(Statement::DropNamespace(DropNamespaceStatement { name }))
            }
            _ => Err(ParseError::new(tokstr(tok, &lit), vec!["NAMESPACE"], pos)),
        }
    }

    /// Assumes the `SHOW` token has already been consumed.
    fn parse_show_statement(&mut self) -> Result<Statement, ParseError> {
        let (tok, pos, lit) = self.scan_ignore_whitespace();
        match tok {
            Token::Namespaces => Ok(Statement::ShowNamespaces(ShowNamespacesStatement)),
            _ => Err(ParseError::new(tokstr(tok, &lit), vec!["NAMESPACES"], pos)),
        }
    }

    /// Parses a period-delimited namespace path.
    ///
    /// Reads an identifier, then alternating `.` and identifier tokens until
    /// something else shows up; that terminator is pushed back. A path may not
    /// end on a period.
    fn parse_namespace(&mut self) -> Result<NamespaceName, ParseError> {
        let (tok, pos, lit) = self.scan_ignore_whitespace();
        if tok != Token::Ident {
            return Err(ParseError::new(tokstr(tok, &lit), vec!["namespace"], pos));
        }
        let mut namespace = lit;

        let mut end_period = false;
        let (term_tok, term_pos, term_lit) = loop {
            let (tok, pos, lit) = self.scan();
            match tok {
                Token::Dot => {
                    namespace.push('.');
                    end_period = true;
                }
                Token::Ident => {
                    namespace.push_str(&lit);
                    end_period = false;
                }
                _ => break (tok, pos, lit),
            }
        };

        // Put the terminating token back for the caller.
        self.unscan();

        if end_period {
            return Err(ParseError::new(
                tokstr(term_tok, &term_lit),
                vec!["identifier"],
                term_pos,
            ));
        }
        Ok(NamespaceName::new(namespace))
    }

    fn scan(&mut self) -> (Token, Pos, String) {
        self.s.scan()
    }

    fn unscan(&mut self) {
        self.s.unscan()
    }

    /// Scans the next token, skipping a single leading whitespace run.
    fn scan_ignore_whitespace(&mut self) -> (Token, Pos, String) {
        let (tok, pos, lit) = self.scan();
        if tok == Token::Ws {
            return self.scan();
        }
        (tok, pos, lit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kappa_commons::NamespaceName;

    struct Case {
        input: &'static str,
        stmt: Option<Statement>,
        err: &'static str,
    }

    fn ok(input: &'static str, stmt: Statement) -> Case {
        Case {
            input,
            stmt: Some(stmt),
            err: "",
        }
    }

    fn fail(input: &'static str, err: &'static str) -> Case {
        Case {
            input,
            stmt: None,
            err,
        }
    }

    #[test]
    fn test_statements() {
        let tests = vec![
            ok(
                "USE acme.example",
                Statement::Use(UseStatement {
                    name: NamespaceName::new("acme.example"),
                }),
            ),
            ok(
                "USE acme",
                Statement::Use(UseStatement {
                    name: NamespaceName::new("acme"),
                }),
            ),
            ok(
                "CREATE NAMESPACE acme",
                Statement::CreateNamespace(CreateNamespaceStatement {
                    name: NamespaceName::new("acme"),
                }),
            ),
            ok(
                "CREATE NAMESPACE acme.logs.events",
                Statement::CreateNamespace(CreateNamespaceStatement {
                    name: NamespaceName::new("acme.logs.events"),
                }),
            ),
            ok(
                "DROP NAMESPACE acme.logs",
                Statement::DropNamespace(DropNamespaceStatement {
                    name: NamespaceName::new("acme.logs"),
                }),
            ),
            ok(
                "SHOW NAMESPACES",
                Statement::ShowNamespaces(ShowNamespacesStatement),
            ),
            // Errors
            fail(
                "a bad statement.",
                "found a, expected USE, CREATE, DROP, SHOW at line 1, char 1",
            ),
            fail("USE ", "found EOF, expected namespace at line 1, char 5"),
            fail(
                "USE acme.example.",
                "found EOF, expected identifier at line 1, char 18",
            ),
            fail(
                "USE acme.example. ",
                "found WS, expected identifier at line 1, char 18",
            ),
            fail(
                "CREATE NAMESPACE acme.example.",
                "found EOF, expected identifier at line 1, char 31",
            ),
            fail(
                "USE .example",
                "found ., expected namespace at line 1, char 5",
            ),
            fail(
                "CREATE TABLE acme",
                "found TABLE, expected NAMESPACE at line 1, char 8",
            ),
            fail(
                "SHOW TABLES",
                "found TABLES, expected NAMESPACES at line 1, char 6",
            ),
            fail(
                "SELECT FROM acme",
                "unsupported statement 'SELECT' at line 1, char 1",
            ),
        ];

        for (i, case) in tests.iter().enumerate() {
            let result = parse_statement(case.input);
            match (&case.stmt, result) {
                (Some(expected), Ok(stmt)) => {
                    assert_eq!(&stmt, expected, "{}. {:?}", i, case.input);
                }
                (None, Err(err)) => {
                    assert_eq!(err.to_string(), case.err, "{}. {:?}", i, case.input);
                }
                (expected, got) => {
                    panic!("{}. {:?}: exp={:?} got={:?}", i, case.input, expected, got);
                }
            }
        }
    }

    #[test]
    fn test_roundtrip_through_display() {
        let statements = [
            "USE acme.example",
            "CREATE NAMESPACE acme",
            "CREATE NAMESPACE acme.logs.events",
            "DROP NAMESPACE acme.logs",
            "SHOW NAMESPACES",
        ];
        for input in statements {
            let stmt = parse_statement(input).unwrap();
            let reparsed = parse_statement(&stmt.to_string()).unwrap();
            assert_eq!(stmt, reparsed, "{}", input);
        }
    }

    #[test]
    fn test_terminator_is_pushed_back() {
        // The token after the namespace must still be visible to the caller.
        let mut parser = Parser::new("USE acme.example extra");
        parser.parse_statement().unwrap();
        let (tok, _, _) = parser.scan_ignore_whitespace();
        assert_eq!(tok, Token::Ident);
    }
}
