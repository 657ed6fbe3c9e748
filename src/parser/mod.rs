// Path expression parser module

pub mod ast;
pub mod lexer;
pub mod path;

// Public API re-exports
pub use ast::{PathExpr, Segment};
pub use path::parse_path_expr;
