/*!
# Compiled Queries

Entry points for running queries: compile once with [`compile`], then
execute the [`CompiledQuery`] against any number of documents, possibly from
several threads at once.

# Examples

```
use jpq::query::compile;
use serde_json::json;

let query = compile("$.store.book[?@.price < 10].title").expect("valid query");
let doc = json!({"store": {"book": [
    {"title": "Sayings of the Century", "price": 8.95},
    {"title": "Sword of Honour", "price": 12.99},
]}});
assert_eq!(query.execute(&doc), vec![&json!("Sayings of the Century")]);
```
*/
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::query::ast::Query;
use crate::query::common::{CancellationToken, QueryError};
use crate::query::evaluator::{QueryContext, apply_segments};
use crate::query::functions::FunctionRegistry;
use crate::query::parser::{ParseError, parse_query_utf8};

/// A parsed query bound to the functions it may call.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    query: Query,
    registry: Arc<FunctionRegistry>,
}

impl CompiledQuery {
    /// Binds a parsed query to a function registry.
    #[must_use]
    pub const fn bind(query: Query, registry: Arc<FunctionRegistry>) -> Self {
        Self { query, registry }
    }

    /// Compiles `text` against a custom function registry.
    ///
    /// # Errors
    ///
    /// Returns the parse errors if `text` is not a valid query.
    pub fn with_registry(
        text: &str,
        registry: Arc<FunctionRegistry>,
    ) -> Result<Self, Vec<ParseError>> {
        let query = parse_query_utf8(text.as_bytes()).map_err(|e| vec![e])?;
        Ok(Self::bind(query, registry))
    }

    /// The parsed query.
    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }

    /// Returns the nodes of `document` the query selects, in order.
    #[must_use]
    pub fn execute<'a>(&self, document: &'a Value) -> Vec<&'a Value> {
        // A token nobody else holds can never be cancelled
        self.execute_with_cancellation(document, &CancellationToken::new())
            .unwrap_or_default()
    }

    /// Like [`CompiledQuery::execute`], aborting once `cancellation` is
    /// signalled.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Cancelled`] if `cancellation` was signalled
    /// before the query completed.
    pub fn execute_with_cancellation<'a>(
        &self,
        document: &'a Value,
        cancellation: &CancellationToken,
    ) -> Result<Vec<&'a Value>, QueryError> {
        let ctx = QueryContext::new(document, &self.registry, cancellation);
        apply_segments(vec![document], &self.query.segments, &ctx)
    }

    /// Returns the selected nodes copied into a JSON array.
    #[must_use]
    pub fn execute_to_array(&self, document: &Value) -> Value {
        Value::Array(self.execute(document).into_iter().cloned().collect())
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.query)
    }
}

/// Compiles a query using the built-in functions.
///
/// # Errors
///
/// Returns the parse errors if `text` is not a valid query.
pub fn compile(text: &str) -> Result<CompiledQuery, Vec<ParseError>> {
    compile_utf8(text.as_bytes())
}

/// Compiles a UTF-8 encoded query using the built-in functions.
///
/// # Errors
///
/// Returns the parse errors if `text` is not a valid query.
pub fn compile_utf8(text: &[u8]) -> Result<CompiledQuery, Vec<ParseError>> {
    let query = parse_query_utf8(text).map_err(|e| vec![e])?;
    Ok(CompiledQuery::bind(query, Arc::new(FunctionRegistry::new())))
}

/// Parses `text` and runs it once against `document`.
///
/// # Errors
///
/// Returns the parse errors if `text` is not a valid query.
pub fn query<'a>(
    text: &str,
    document: &'a Value,
) -> Result<Vec<&'a Value>, Vec<ParseError>> {
    Ok(compile(text)?.execute(document))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{ExpressionValue, FunctionDefinition, FunctionKind};
    use serde_json::json;

    #[test]
    fn compile_and_execute() {
        let compiled = compile("$.a").unwrap();
        assert_eq!(compiled.execute(&json!({"a": 1})), vec![&json!(1)]);
        assert!(compiled.execute(&json!([1])).is_empty());
        assert_eq!(compiled.to_string(), "$.a");
    }

    #[test]
    fn compile_errors() {
        let errors = compile("$.a[").unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(compile("a").is_err());
        assert!(compile_utf8(b"$.\xFF").is_err());
    }

    #[test]
    fn execute_to_array_preserves_duplicates() {
        let compiled = compile("$[0, 0, 1]").unwrap();
        assert_eq!(
            compiled.execute_to_array(&json!(["x", "y"])),
            json!(["x", "x", "y"])
        );
    }

    #[test]
    fn single_shot_query() {
        let doc = json!([0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(
            query("$[1:5:2]", &doc).unwrap(),
            vec![&json!(1), &json!(3)]
        );
    }

    #[test]
    fn bound_registry() {
        let registry = FunctionRegistry::builder()
            .function(FunctionDefinition::new(
                "first",
                FunctionKind::Value,
                vec![FunctionKind::Nodes],
                |arguments, _| match arguments[0].as_nodes().first().copied() {
                    Some(node) => ExpressionValue::Node(node),
                    None => ExpressionValue::Nothing,
                },
            ))
            .build();
        let compiled = CompiledQuery::with_registry(
            "$[?first(@.*) == 1]",
            Arc::new(registry),
        )
        .unwrap();
        let doc = json!([[1, 2], [2, 1], []]);
        assert_eq!(compiled.execute(&doc), vec![&json!([1, 2])]);
        let builtins = compile("$[?first(@.*) == 1]").unwrap();
        assert!(builtins.execute(&doc).is_empty());
    }

    #[test]
    fn cancelled_execution() {
        let compiled = compile("$..*").unwrap();
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(
            compiled.execute_with_cancellation(&json!({"a": 1}), &token),
            Err(QueryError::Cancelled)
        );
    }

    #[test]
    fn shared_across_threads() {
        let compiled = Arc::new(compile("$.items[?@ > 1]").unwrap());
        let handles: Vec<_> = (0..4)
            .map(|n| {
                let compiled = Arc::clone(&compiled);
                std::thread::spawn(move || {
                    let doc = json!({"items": (0..=n).collect::<Vec<_>>()});
                    compiled.execute(&doc).len()
                })
            })
            .collect();
        let counts: Vec<usize> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(counts, vec![0, 0, 1, 2]);
    }
}
