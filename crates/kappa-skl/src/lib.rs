//! SKL, the SQL-like command language spoken by the Kappa server.
//!
//! One statement per line. Each line goes through a hand-written lexer, a
//! buffered scanner with push-back, and a recursive-descent parser producing
//! a typed [`Statement`]. Parse failures carry the offending literal and its
//! exact source position.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod scanner;
pub mod tokens;

pub use ast::{
    CreateNamespaceStatement, DropNamespaceStatement, NodeType, ShowNamespacesStatement,
    Statement, UseStatement,
};
pub use error::ParseError;
pub use lexer::Lexer;
pub use parser::{parse_statement, Parser};
pub use tokens::{Pos, Token};
