pub mod environment;
pub mod error;
pub mod expr;
pub mod format;
pub mod function;
pub mod interpreter;
pub mod json;
pub mod kvc;
pub mod library;
pub mod node;
pub mod parser;
pub mod scanner;
pub mod value;

pub use environment::{MapProvider, Provider, ProviderRef};
pub use error::{Error, EvalError, SyntaxError};
pub use interpreter::Interpreter;
pub use parser::{parse, parse_space_separated, parse_template, ParseResult};
pub use value::Value;
