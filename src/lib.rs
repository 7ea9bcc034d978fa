//! tawk - an AWK-style pattern/action processor for JSON trees
//!
//! A tawk program is a list of pattern/action blocks. The input document
//! is walked depth-first, visiting every node once on entry and once on
//! exit; each visit whose path matches a block's pattern runs that block's
//! action. Actions are expressions over a dynamic value universe with
//! total coercion, and variables persist across visits.
//!
//! # Example
//!
//! ```
//! use tawk::{Interpreter, Lexer, Parser};
//!
//! // Print every top-level element on entry
//! let tokens = Lexer::new("^* { println($0) }").tokenize().unwrap();
//! let program = Parser::new(tokens).parse().unwrap();
//!
//! let data = tawk::json::parse_document("[1, 2]").unwrap();
//! let mut output = Vec::new();
//! Interpreter::new(&program, &data).run(&mut output).unwrap();
//!
//! assert_eq!(String::from_utf8(output).unwrap(), "1.0\n2.0\n");
//! ```
//!
//! # Accumulating across visits
//!
//! ```
//! use tawk::{Interpreter, Lexer, Parser};
//!
//! // Sum the elements on entry, report on the root's exit
//! let source = "^* { total += $0 } { println(total) }";
//! let tokens = Lexer::new(source).tokenize().unwrap();
//! let program = Parser::new(tokens).parse().unwrap();
//!
//! let data = tawk::json::parse_document("[1, 2]").unwrap();
//! let mut output = Vec::new();
//! Interpreter::new(&program, &data).run(&mut output).unwrap();
//!
//! assert_eq!(String::from_utf8(output).unwrap(), "3.0\n");
//! ```
//!
//! # Filters
//!
//! ```
//! use tawk::{Interpreter, Lexer, Parser};
//!
//! // A parenthesised pattern segment is an arbitrary predicate
//! let tokens = Lexer::new("^($0 == 3) {}").tokenize().unwrap();
//! let program = Parser::new(tokens).parse().unwrap();
//!
//! let data = tawk::json::parse_document("[2, 3]").unwrap();
//! let mut output = Vec::new();
//! Interpreter::new(&program, &data).run(&mut output).unwrap();
//!
//! // the empty action defaults to println($0)
//! assert_eq!(String::from_utf8(output).unwrap(), "3.0\n");
//! ```

pub mod ast;
pub mod error;
pub mod interpreter;
pub mod json;
pub mod lexer;
pub mod parser;
pub mod value;
pub mod walker;

pub use error::{Error, Result, SourceLocation};
pub use interpreter::Interpreter;
pub use lexer::{Lexer, Token, TokenKind};
pub use parser::Parser;
pub use value::{Value, ValueKind};
pub use walker::{PathSegment, TreeWalker, WalkItem};
