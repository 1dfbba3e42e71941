/*!
# Query Evaluator

Applies query segments to node lists and evaluates filter expressions.

Node lists keep document order and duplicates. Selectors that do not apply to
a node (a name on an array, an index on an object, an index out of bounds)
contribute nothing; evaluation never fails on the shape of the document. The
only error is [`QueryError::Cancelled`], raised when the caller's
[`CancellationToken`] is signalled. The token is polled before every segment,
at every node visited by a descendant segment, and before every filter
candidate.
*/
use std::cmp::Ordering;

use serde_json::Value;

use crate::query::ast::{
    BinaryOperator, Expression, QueryKind, Segment, Selector, Slice,
};
use crate::query::common::{CancellationToken, QueryError};
use crate::query::functions::{FunctionContext, FunctionRegistry};
use crate::query::value::{ExpressionValue, Primitive};

type Result<T> = std::result::Result<T, QueryError>;

/// State of a single query execution.
#[derive(Debug, Clone, Copy)]
pub struct QueryContext<'a, 'q> {
    /// Document root, the node `$` refers to
    root: &'a Value,
    registry: &'q FunctionRegistry,
    cancellation: &'q CancellationToken,
}

impl<'a, 'q> QueryContext<'a, 'q> {
    /// Creates the context for executing a query against `root`.
    #[must_use]
    pub const fn new(
        root: &'a Value,
        registry: &'q FunctionRegistry,
        cancellation: &'q CancellationToken,
    ) -> Self {
        Self { root, registry, cancellation }
    }

    /// The document root.
    #[must_use]
    pub const fn root(&self) -> &'a Value {
        self.root
    }
}

/// Applies `segments` in order, starting from `nodes`.
///
/// # Errors
///
/// Returns [`QueryError::Cancelled`] if the context's token is cancelled.
pub fn apply_segments<'a>(
    nodes: Vec<&'a Value>,
    segments: &[Segment],
    ctx: &QueryContext<'a, '_>,
) -> Result<Vec<&'a Value>> {
    segments
        .iter()
        .try_fold(nodes, |nodes, segment| apply_segment(nodes, segment, ctx))
}

fn apply_segment<'a>(
    nodes: Vec<&'a Value>,
    segment: &Segment,
    ctx: &QueryContext<'a, '_>,
) -> Result<Vec<&'a Value>> {
    ctx.cancellation.check()?;
    log::trace!("applying {segment} to {} node(s)", nodes.len());

    let mut results = vec![];
    for node in nodes {
        match segment {
            Segment::Child(selector) => {
                select(node, selector, ctx, &mut results)?;
            }
            Segment::Bracketed(selectors) => {
                for selector in selectors {
                    select(node, selector, ctx, &mut results)?;
                }
            }
            Segment::Descendant(target) => {
                descend(node, target.selectors(), ctx, &mut results)?;
            }
        }
    }
    Ok(results)
}

/// Applies `selectors` to `node`, then to each of its descendants in
/// document order.
fn descend<'a>(
    node: &'a Value,
    selectors: &[Selector],
    ctx: &QueryContext<'a, '_>,
    results: &mut Vec<&'a Value>,
) -> Result<()> {
    ctx.cancellation.check()?;
    for selector in selectors {
        select(node, selector, ctx, results)?;
    }
    match node {
        Value::Array(array) => {
            for child in array {
                descend(child, selectors, ctx, results)?;
            }
        }
        Value::Object(object) => {
            for child in object.values() {
                descend(child, selectors, ctx, results)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Appends the nodes `selector` selects from `node` to `results`.
fn select<'a>(
    node: &'a Value,
    selector: &Selector,
    ctx: &QueryContext<'a, '_>,
    results: &mut Vec<&'a Value>,
) -> Result<()> {
    match (selector, node) {
        (
            Selector::Name(name) | Selector::MemberNameShorthand(name),
            Value::Object(object),
        ) => results.extend(object.get(name)),
        (Selector::Wildcard, Value::Array(array)) => results.extend(array),
        (Selector::Wildcard, Value::Object(object)) => {
            results.extend(object.values());
        }
        (Selector::Index(index), Value::Array(array)) => {
            results.extend(
                normalize_index(*index, array.len())
                    .and_then(|i| array.get(i)),
            );
        }
        (Selector::Slice(slice), Value::Array(array)) => {
            results
                .extend(slice_indices(slice, array.len()).map(|i| &array[i]));
        }
        (Selector::Filter(expression), Value::Array(array)) => {
            for child in array {
                filter(expression, child, ctx, results)?;
            }
        }
        (Selector::Filter(expression), Value::Object(object)) => {
            for child in object.values() {
                filter(expression, child, ctx, results)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn filter<'a>(
    expression: &Expression,
    candidate: &'a Value,
    ctx: &QueryContext<'a, '_>,
    results: &mut Vec<&'a Value>,
) -> Result<()> {
    ctx.cancellation.check()?;
    if evaluate(expression, ctx, candidate)?.is_truthy() {
        results.push(candidate);
    }
    Ok(())
}

fn length_i64(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

/// Resolves a possibly negative index against an array of length `len`.
fn normalize_index(index: i64, len: usize) -> Option<usize> {
    let index = if index < 0 {
        length_i64(len).checked_add(index)?
    } else {
        index
    };
    usize::try_from(index).ok().filter(|&i| i < len)
}

/// Indices selected by `slice` from an array of length `len`, in selection
/// order.
fn slice_indices(slice: &Slice, len: usize) -> impl Iterator<Item = usize> {
    let len = length_i64(len);
    let step = slice.step.unwrap_or(1);
    let normalize = |i: i64| if i < 0 { len.saturating_add(i) } else { i };

    let (mut i, bound) = match step.cmp(&0) {
        Ordering::Greater => {
            let start = slice.start.map_or(0, normalize);
            let end = slice.end.map_or(len, normalize);
            (start.clamp(0, len), end.clamp(0, len))
        }
        Ordering::Less => {
            let start = slice.start.map_or(len - 1, normalize);
            let end = slice.end.map_or(-len - 1, normalize);
            (start.clamp(-1, len - 1), end.clamp(-1, len - 1))
        }
        // zero step selects nothing
        Ordering::Equal => (0, 0),
    };

    std::iter::from_fn(move || {
        let in_range = if step > 0 { i < bound } else { bound < i };
        if !in_range {
            return None;
        }
        let current = i;
        i = i.saturating_add(step);
        usize::try_from(current).ok()
    })
}

/// Evaluates `expression` with `current` as the node `@` refers to.
///
/// # Errors
///
/// Returns [`QueryError::Cancelled`] if the context's token is cancelled
/// while an embedded query is evaluated.
pub fn evaluate<'a>(
    expression: &Expression,
    ctx: &QueryContext<'a, '_>,
    current: &'a Value,
) -> Result<ExpressionValue<'a>> {
    let value = match expression {
        Expression::Integer(i) => ExpressionValue::from(*i),
        Expression::Float(x) => ExpressionValue::from(*x),
        Expression::String(s) => ExpressionValue::from(s.clone()),
        Expression::Boolean(b) => ExpressionValue::Logical(*b),
        Expression::Null => ExpressionValue::Primitive(Primitive::Null),
        Expression::SingularQuery { kind, segments } => {
            let mut nodes = query(*kind, segments, ctx, current)?;
            if nodes.len() == 1 {
                ExpressionValue::Node(nodes.remove(0))
            } else {
                ExpressionValue::Nodes(nodes)
            }
        }
        Expression::FilterQuery { kind, segments } => {
            ExpressionValue::Nodes(query(*kind, segments, ctx, current)?)
        }
        Expression::LogicalNot(inner) => {
            let value = evaluate(inner, ctx, current)?;
            if value.is_nothing() {
                value
            } else {
                ExpressionValue::Logical(!value.is_truthy())
            }
        }
        Expression::Parenthesized(inner) => evaluate(inner, ctx, current)?,
        Expression::Binary { left, operator: BinaryOperator::And, right } => {
            let result = evaluate(left, ctx, current)?.is_truthy()
                && evaluate(right, ctx, current)?.is_truthy();
            ExpressionValue::Logical(result)
        }
        Expression::Binary { left, operator: BinaryOperator::Or, right } => {
            let result = evaluate(left, ctx, current)?.is_truthy()
                || evaluate(right, ctx, current)?.is_truthy();
            ExpressionValue::Logical(result)
        }
        Expression::Binary { left, operator, right } => {
            let left = evaluate(left, ctx, current)?;
            let right = evaluate(right, ctx, current)?;
            ExpressionValue::Logical(compare(*operator, left, right))
        }
        Expression::FunctionCall { name, arguments } => {
            let arguments = arguments
                .iter()
                .map(|argument| evaluate(argument, ctx, current))
                .collect::<Result<Vec<_>>>()?;
            let context = FunctionContext::new(ctx.cancellation);
            ctx.registry.call(name, arguments, &context)
        }
    };
    Ok(value)
}

fn query<'a>(
    kind: QueryKind,
    segments: &[Segment],
    ctx: &QueryContext<'a, '_>,
    current: &'a Value,
) -> Result<Vec<&'a Value>> {
    let start = match kind {
        QueryKind::Root => ctx.root,
        QueryKind::Current => current,
    };
    apply_segments(vec![start], segments, ctx)
}

/// Normalizes a comparison operand to a primitive. Arrays and objects
/// become `Boolean(true)`. `None` stands for an operand without a value.
fn operand(value: ExpressionValue<'_>) -> Option<Primitive> {
    match value {
        ExpressionValue::Nothing => None,
        ExpressionValue::Logical(b) => Some(Primitive::Boolean(b)),
        ExpressionValue::Node(node) => Some(node_primitive(node)),
        ExpressionValue::Nodes(nodes) => match nodes[..] {
            [node] => Some(node_primitive(node)),
            _ => None,
        },
        ExpressionValue::Primitive(primitive) => Some(primitive),
    }
}

fn node_primitive(node: &Value) -> Primitive {
    Primitive::from_json(node).unwrap_or(Primitive::Boolean(true))
}

/// Applies a comparison operator. Comparisons whose result is undefined
/// are false.
fn compare(
    operator: BinaryOperator,
    left: ExpressionValue<'_>,
    right: ExpressionValue<'_>,
) -> bool {
    let (Some(left), Some(right)) = (operand(left), operand(right)) else {
        return false;
    };
    let (left, right) = (&left, &right);
    match operator {
        BinaryOperator::Eq => equal(left, right) == Some(true),
        BinaryOperator::Ne => equal(left, right) == Some(false),
        BinaryOperator::Lt => less(left, right) == Some(true),
        BinaryOperator::Gt => less(right, left) == Some(true),
        BinaryOperator::Le => or_equal(less(left, right), equal(left, right)),
        BinaryOperator::Ge => or_equal(less(right, left), equal(left, right)),
        BinaryOperator::And | BinaryOperator::Or => false,
    }
}

/// `<=` and `>=` need both the ordering and the equality to be defined.
const fn or_equal(less: Option<bool>, equal: Option<bool>) -> bool {
    matches!((less, equal), (Some(true), Some(_)) | (Some(_), Some(true)))
}

/// Equality of two operands, `None` when their kinds are not comparable.
fn equal(left: &Primitive, right: &Primitive) -> Option<bool> {
    match (left, right) {
        (Primitive::Null, _) | (_, Primitive::Null) => Some(left == right),
        (Primitive::Boolean(a), Primitive::Boolean(b)) => Some(a == b),
        (Primitive::String(a), Primitive::String(b)) => Some(a == b),
        _ => compare_numbers(left, right).map(Ordering::is_eq),
    }
}

/// Ordering of two operands, `None` unless both are numbers or both are
/// strings.
fn less(left: &Primitive, right: &Primitive) -> Option<bool> {
    match (left, right) {
        (Primitive::String(a), Primitive::String(b)) => Some(a < b),
        _ => compare_numbers(left, right).map(Ordering::is_lt),
    }
}

fn compare_numbers(left: &Primitive, right: &Primitive) -> Option<Ordering> {
    match (left, right) {
        (Primitive::Integer(a), Primitive::Integer(b)) => Some(a.cmp(b)),
        (Primitive::Integer(a), Primitive::Float(b)) => {
            compare_integer_float(*a, *b)
        }
        (Primitive::Float(a), Primitive::Integer(b)) => {
            compare_integer_float(*b, *a).map(Ordering::reverse)
        }
        (Primitive::Float(a), Primitive::Float(b)) => a.partial_cmp(b),
        _ => None,
    }
}

/// Exact comparison of an integer with a float, without rounding the
/// integer to the nearest `f64`.
#[allow(clippy::cast_possible_truncation)]
fn compare_integer_float(integer: i64, float: f64) -> Option<Ordering> {
    // -2^63 and 2^63 are exact in f64
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    if float.is_nan() {
        return None;
    }
    if float >= BOUND {
        return Some(Ordering::Less);
    }
    if float < -BOUND {
        return Some(Ordering::Greater);
    }
    let whole = float.trunc() as i64;
    match integer.cmp(&whole) {
        Ordering::Equal => 0.0_f64.partial_cmp(&float.fract()),
        ordering => Some(ordering),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::functions::{FunctionDefinition, FunctionKind};
    use crate::query::parser::parse_query;
    use serde_json::json;

    fn run_with<'a>(
        query: &str,
        doc: &'a Value,
        registry: &FunctionRegistry,
        token: &CancellationToken,
    ) -> Result<Vec<&'a Value>> {
        let query = parse_query(query).unwrap();
        let ctx = QueryContext::new(doc, registry, token);
        apply_segments(vec![doc], &query.segments, &ctx)
    }

    fn run(query: &str, doc: &Value) -> Vec<Value> {
        let registry = FunctionRegistry::new();
        let token = CancellationToken::new();
        run_with(query, doc, &registry, &token)
            .unwrap()
            .into_iter()
            .cloned()
            .collect()
    }

    #[test]
    fn root_returns_document() {
        for doc in
            [json!(null), json!(1), json!("s"), json!([1]), json!({"a": 1})]
        {
            assert_eq!(run("$", &doc), vec![doc.clone()]);
        }
    }

    #[test]
    fn child_names() {
        let doc = json!({"a": 1, "b": {"c": 2}});
        assert_eq!(run("$.a", &doc), vec![json!(1)]);
        assert_eq!(run("$['b']['c']", &doc), vec![json!(2)]);
        assert!(run("$.missing", &doc).is_empty());
        assert!(run("$.a.b", &doc).is_empty());
        assert!(run("$.a", &json!([1, 2])).is_empty());
    }

    #[test]
    fn wildcard_keeps_document_order() {
        let doc = json!({"z": 1, "a": 2, "m": [3, 4]});
        assert_eq!(run("$.*", &doc), vec![json!(1), json!(2), json!([3, 4])]);
        assert_eq!(run("$.m[*]", &doc), vec![json!(3), json!(4)]);
        assert!(run("$.z.*", &doc).is_empty());
    }

    #[test]
    fn duplicate_selectors() {
        let doc = json!([1, 2]);
        assert_eq!(
            run("$[*, *]", &doc),
            vec![json!(1), json!(2), json!(1), json!(2)]
        );
        assert_eq!(run("$[0, 0]", &doc), vec![json!(1), json!(1)]);
    }

    #[test]
    fn index_selector() {
        let doc = json!([7, 2, 4]);
        assert_eq!(run("$[0]", &doc), vec![json!(7)]);
        assert_eq!(run("$[-1]", &doc), vec![json!(4)]);
        assert_eq!(run("$[-3]", &doc), vec![json!(7)]);
        assert!(run("$[3]", &doc).is_empty());
        assert!(run("$[-4]", &doc).is_empty());
        assert!(run("$[-10, 7, 3]", &doc).is_empty());
        assert!(run("$[0]", &json!({"0": 1})).is_empty());
    }

    #[test]
    fn slice_selector() {
        let doc = json!([0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(run("$[1:5:2]", &doc), vec![json!(1), json!(3)]);
        assert_eq!(run("$[5:1:-2]", &doc), vec![json!(5), json!(3)]);
        assert_eq!(run("$[:2]", &doc), vec![json!(0), json!(1)]);
        assert_eq!(run("$[-2:]", &doc), vec![json!(5), json!(6)]);
        assert_eq!(run("$[::3]", &doc), vec![json!(0), json!(3), json!(6)]);
        assert_eq!(run("$[-100:2]", &doc), vec![json!(0), json!(1)]);
        assert_eq!(run("$[5:100]", &doc), vec![json!(5), json!(6)]);
        assert!(run("$[::0]", &doc).is_empty());
        assert!(run("$[4:1]", &doc).is_empty());
        assert!(run("$[1:2]", &json!({"a": 1})).is_empty());
    }

    #[test]
    fn slice_reverse() {
        let doc = json!([0, 1, 2, 3]);
        assert_eq!(
            run("$[::-1]", &doc),
            vec![json!(3), json!(2), json!(1), json!(0)]
        );
        assert!(run("$[::-1]", &json!([])).is_empty());
    }

    #[test]
    fn slice_indices_follow_arithmetic_sequence() {
        for len in 0..6 {
            for start in -7..7 {
                for end in -7..7 {
                    for step in [-3, -2, -1, 1, 2, 3] {
                        let slice = Slice {
                            start: Some(start),
                            end: Some(end),
                            step: Some(step),
                        };
                        let actual: Vec<usize> =
                            slice_indices(&slice, len).collect();
                        let last = len as i64;
                        let n = |i: i64| if i < 0 { last + i } else { i };
                        let (lo, hi) = if step > 0 {
                            (n(start).clamp(0, last), n(end).clamp(0, last))
                        } else {
                            (
                                n(end).clamp(-1, last - 1),
                                n(start).clamp(-1, last - 1),
                            )
                        };
                        let expected: Vec<usize> = if step > 0 {
                            (lo..hi)
                                .step_by(step as usize)
                                .map(|i| i as usize)
                                .collect()
                        } else {
                            ((lo + 1)..=hi)
                                .rev()
                                .step_by(step.unsigned_abs() as usize)
                                .map(|i| i as usize)
                                .collect()
                        };
                        assert_eq!(
                            actual, expected,
                            "{start}:{end}:{step} len {len}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn descendant_order() {
        let doc = json!({"a": {"b": 2}, "c": 3});
        assert_eq!(
            run("$..*", &doc),
            vec![json!({"b": 2}), json!(3), json!(2)]
        );
        assert_eq!(run("$..b", &doc), vec![json!(2)]);
    }

    #[test]
    fn descendant_bracketed() {
        let doc = json!({"o": [{"a": 1}, [{"a": 2}]]});
        assert_eq!(run("$..a", &doc), vec![json!(1), json!(2)]);
        assert_eq!(run("$..[0]", &doc), vec![json!({"a": 1}), json!({"a": 2})]);
    }

    #[test]
    fn literal_comparisons() {
        let doc = json!([0]);
        let holds = |expr: &str| !run(&format!("$[?{expr}]"), &doc).is_empty();
        assert!(holds("2 == 2"));
        assert!(!holds("2 == 3"));
        assert!(holds("'a' < 'b'"));
        assert!(holds("1 == 1.0"));
        assert!(holds("1 < 1.5"));
        assert!(holds("2 <= 2.0"));
        assert!(holds("-1.5 < -1"));
        assert!(holds("9007199254740993 > 9007199254740992.0"));
        assert!(!holds("9007199254740993 == 9007199254740992.0"));
        assert!(holds("'3'=='2' || 4==4"));
        assert!(!holds("'3'=='3' && 4==3"));
        assert!(holds("null == null"));
        assert!(holds("true != false"));
        for op in ["==", "!=", "<", "<=", ">", ">="] {
            assert!(!holds(&format!("'1' {op} 1")), "'1' {op} 1");
            assert!(!holds(&format!("1 {op} '1'")), "1 {op} '1'");
        }
    }

    #[test]
    fn ordering_operators() {
        let doc = json!([1, 2, 3, "2", null]);
        assert_eq!(run("$[?@ <= 2]", &doc), vec![json!(1), json!(2)]);
        assert_eq!(run("$[?@ >= 2]", &doc), vec![json!(2), json!(3)]);
        assert_eq!(run("$[?@ > 2]", &doc), vec![json!(3)]);
        assert_eq!(run("$[?@ < '3']", &doc), vec![json!("2")]);
    }

    #[test]
    fn missing_operands_are_undefined() {
        let doc = json!([{}, {"a": null}, {"a": 1}]);
        assert!(run("$[?@.x == @.y]", &doc).is_empty());
        assert!(run("$[?@.x != @.y]", &doc).is_empty());
        assert_eq!(run("$[?@.a == null]", &doc), vec![json!({"a": null})]);
        assert_eq!(run("$[?@.a != null]", &doc), vec![json!({"a": 1})]);
    }

    #[test]
    fn containers_compare_as_true() {
        let doc = json!([{"a": {}}, {"a": [1]}, {"a": 1}, {"a": false}]);
        assert_eq!(
            run("$[?@.a == true]", &doc),
            vec![json!({"a": {}}), json!({"a": [1]})]
        );
        assert_eq!(run("$[?@.a != true]", &doc), vec![json!({"a": false})]);

        let doc = json!({"a": {"x": 1}, "b": {"y": 2}});
        assert_eq!(run("$[?$.a == $.b]", &doc).len(), 2);
        // booleans have no ordering
        assert!(run("$[?@ <= $.b]", &doc).is_empty());
    }

    #[test]
    fn undefined_ordering_is_false() {
        let doc = json!([null, true]);
        assert!(run("$[?@ <= null]", &doc).is_empty());
        assert!(run("$[?@ >= true]", &doc).is_empty());
        assert_eq!(run("$[?@ == null]", &doc), vec![json!(null)]);
    }

    #[test]
    fn existence_tests() {
        let doc = json!([{"a": 1}, {"b": 2}, {"a": false}]);
        assert_eq!(
            run("$[?@.a]", &doc),
            vec![json!({"a": 1}), json!({"a": false})]
        );
        assert_eq!(run("$[?!@.a]", &doc), vec![json!({"b": 2})]);
        assert_eq!(run("$[?@.a || @.b]", &doc).len(), 3);
    }

    #[test]
    fn filter_on_object_values() {
        let doc = json!({"x": {"p": 1}, "y": {"p": 5}});
        assert_eq!(run("$[?@.p > 2]", &doc), vec![json!({"p": 5})]);
        assert!(run("$[?@.p > 2]", &json!(5)).is_empty());
    }

    #[test]
    fn root_query_in_filter() {
        let doc = json!({"limit": 2, "items": [1, 2, 3]});
        assert_eq!(run("$.items[?@ > $.limit]", &doc), vec![json!(3)]);
    }

    #[test]
    fn function_calls() {
        let doc = json!([
            {"name": "Bob", "tags": ["a", "b"]},
            {"name": "Alice", "tags": []},
            {"name": "Al\nx"}
        ]);
        assert_eq!(run("$[?length(@.name) == 3]", &doc).len(), 1);
        assert_eq!(run("$[?count(@.tags[*]) == 2]", &doc).len(), 1);
        assert_eq!(run("$[?match(@.name, 'A.*')]", &doc).len(), 1);
        assert_eq!(run("$[?search(@.name, 'l')]", &doc).len(), 2);
        assert_eq!(run("$[?value(@.tags[0]) == 'a']", &doc).len(), 1);
        assert!(run("$[?unknown(@.name)]", &doc).is_empty());
        assert!(run("$[?length(@.name, 1) == 3]", &doc).is_empty());
    }

    #[test]
    fn logical_not_keeps_nothing() {
        let doc = json!(null);
        let registry = FunctionRegistry::new();
        let token = CancellationToken::new();
        let ctx = QueryContext::new(&doc, &registry, &token);
        let unknown = Expression::FunctionCall {
            name: "unknown".into(),
            arguments: vec![],
        };
        let not_unknown = Expression::LogicalNot(Box::new(unknown));
        assert_eq!(
            evaluate(&not_unknown, &ctx, &doc),
            Ok(ExpressionValue::Nothing)
        );
        assert_eq!(
            evaluate(&Expression::Boolean(true), &ctx, &doc),
            Ok(ExpressionValue::Logical(true))
        );
    }

    #[test]
    fn cancelled_before_start() {
        let doc = json!({"a": 1});
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(
            run_with("$.a", &doc, &FunctionRegistry::new(), &token),
            Err(QueryError::Cancelled)
        );
        // no segments, nothing to poll
        assert!(run_with("$", &doc, &FunctionRegistry::new(), &token).is_ok());
    }

    #[test]
    fn cancelled_between_filter_candidates() {
        let registry = FunctionRegistry::builder()
            .function(FunctionDefinition::new(
                "stop",
                FunctionKind::Logical,
                vec![],
                |_, context| {
                    context.cancellation_token().cancel();
                    ExpressionValue::Logical(true)
                },
            ))
            .build();
        let token = CancellationToken::new();
        let doc = json!([1, 2, 3]);
        assert_eq!(
            run_with("$[?stop()]", &doc, &registry, &token),
            Err(QueryError::Cancelled)
        );
        assert!(token.is_cancelled());
    }
}
