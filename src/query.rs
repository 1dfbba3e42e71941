//! # JSONPath Queries
//!
//! An implementation of RFC 9535 JSONPath:
//! - Name, wildcard, index and slice selectors, child and descendant segments
//! - Filter expressions with comparisons and logical operators
//! - Function extensions (`length`, `count`, `value`, `match`, `search`) and
//!   user-registered functions
//! - Cooperative cancellation of long running queries
//!
//! Results are references into the queried [`serde_json::Value`], in the
//! order the RFC prescribes.

pub mod ast;
pub mod common;
pub mod compiled;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod value;

// Re-exports
pub use ast::*;
pub use common::{CancellationToken, QueryError};
pub use compiled::{CompiledQuery, compile, compile_utf8, query};
pub use evaluator::{QueryContext, apply_segments, evaluate};
pub use functions::{
    FunctionBody, FunctionContext, FunctionDefinition, FunctionKind,
    FunctionRegistry, FunctionRegistryBuilder, translate_iregexp,
};
pub use parser::{
    MAX_SAFE_INTEGER, ParseError, ParseErrorKind, parse_query, parse_query_utf8,
};
pub use value::{ExpressionValue, Primitive};
