/*!
# Expression Values

The values filter expressions evaluate to. A value is either absent
([`ExpressionValue::Nothing`]), a logical result, a reference to one or more
nodes of the queried document, or a primitive literal.
*/
use std::fmt;

use serde_json::Value;

/// A literal scalar produced by the expression language.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Integer number
    Integer(i64),
    /// Number with fraction or exponent, or one outside the `i64` range
    Float(f64),
    /// String
    String(String),
    /// `true` or `false`
    Boolean(bool),
    /// `null`
    Null,
}

impl Primitive {
    /// Converts a JSON scalar into a primitive. Returns `None` for arrays and
    /// objects.
    #[must_use]
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(Self::Null),
            Value::Bool(b) => Some(Self::Boolean(*b)),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float)),
            Value::String(s) => Some(Self::String(s.clone())),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Null => write!(f, "null"),
        }
    }
}

/// The result of evaluating an expression.
///
/// Node variants borrow from the queried document for the lifetime `'a`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ExpressionValue<'a> {
    /// No value, e.g. a missing member or a function undefined for its input
    #[default]
    Nothing,
    /// Result of a test, comparison or logical function
    Logical(bool),
    /// A single node of the document
    Node(&'a Value),
    /// An ordered, possibly empty, list of document nodes
    Nodes(Vec<&'a Value>),
    /// A literal value
    Primitive(Primitive),
}

impl<'a> ExpressionValue<'a> {
    /// Returns whether this is [`ExpressionValue::Nothing`].
    #[must_use]
    pub const fn is_nothing(&self) -> bool {
        matches!(self, Self::Nothing)
    }

    /// Boolean interpretation used by filters and logical operators: logical
    /// values and boolean primitives are themselves, node lists are true when
    /// non-empty, and everything else is false.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Logical(b) | Self::Primitive(Primitive::Boolean(b)) => *b,
            Self::Nodes(nodes) => !nodes.is_empty(),
            _ => false,
        }
    }

    /// Returns the boolean of a logical value or boolean primitive.
    #[must_use]
    pub const fn logical(&self) -> Option<bool> {
        match self {
            Self::Logical(b) | Self::Primitive(Primitive::Boolean(b)) => {
                Some(*b)
            }
            _ => None,
        }
    }

    /// Returns the node of a [`ExpressionValue::Node`].
    #[must_use]
    pub const fn node(&self) -> Option<&'a Value> {
        match self {
            Self::Node(node) => Some(*node),
            _ => None,
        }
    }

    /// Returns the nodes of a [`ExpressionValue::Nodes`].
    #[must_use]
    pub fn nodes(&self) -> Option<&[&'a Value]> {
        match self {
            Self::Nodes(nodes) => Some(nodes),
            _ => None,
        }
    }

    /// Returns the literal of a [`ExpressionValue::Primitive`].
    #[must_use]
    pub const fn primitive(&self) -> Option<&Primitive> {
        match self {
            Self::Primitive(primitive) => Some(primitive),
            _ => None,
        }
    }

    /// Returns the text of a string primitive or of a node holding a string.
    #[must_use]
    pub fn string(&self) -> Option<&str> {
        match self {
            Self::Primitive(Primitive::String(s)) => Some(s),
            Self::Node(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Unwraps a logical value or boolean primitive.
    ///
    /// # Panics
    ///
    /// Panics if the value is of any other variant.
    #[must_use]
    pub fn as_logical(&self) -> bool {
        self.logical()
            .unwrap_or_else(|| panic!("expected a logical value, got {self}"))
    }

    /// Unwraps a single node.
    ///
    /// # Panics
    ///
    /// Panics if the value is not [`ExpressionValue::Node`].
    #[must_use]
    pub fn as_node(&self) -> &'a Value {
        self.node()
            .unwrap_or_else(|| panic!("expected a node, got {self}"))
    }

    /// Unwraps a node list.
    ///
    /// # Panics
    ///
    /// Panics if the value is not [`ExpressionValue::Nodes`].
    #[must_use]
    pub fn as_nodes(&self) -> &[&'a Value] {
        self.nodes()
            .unwrap_or_else(|| panic!("expected a node list, got {self}"))
    }

    /// Unwraps a literal.
    ///
    /// # Panics
    ///
    /// Panics if the value is not [`ExpressionValue::Primitive`].
    #[must_use]
    pub fn as_primitive(&self) -> &Primitive {
        self.primitive()
            .unwrap_or_else(|| panic!("expected a primitive, got {self}"))
    }
}

impl From<bool> for ExpressionValue<'_> {
    fn from(value: bool) -> Self {
        Self::Logical(value)
    }
}

impl From<i64> for ExpressionValue<'_> {
    fn from(value: i64) -> Self {
        Self::Primitive(Primitive::Integer(value))
    }
}

impl From<f64> for ExpressionValue<'_> {
    fn from(value: f64) -> Self {
        Self::Primitive(Primitive::Float(value))
    }
}

impl From<String> for ExpressionValue<'_> {
    fn from(value: String) -> Self {
        Self::Primitive(Primitive::String(value))
    }
}

impl<'a> From<&'a Value> for ExpressionValue<'a> {
    fn from(value: &'a Value) -> Self {
        Self::Node(value)
    }
}

impl<'a> From<Vec<&'a Value>> for ExpressionValue<'a> {
    fn from(value: Vec<&'a Value>) -> Self {
        Self::Nodes(value)
    }
}

impl fmt::Display for ExpressionValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nothing => write!(f, "Nothing"),
            Self::Logical(b) => write!(f, "Logical({b})"),
            Self::Node(node) => write!(f, "Node({node})"),
            Self::Nodes(nodes) => {
                write!(f, "Nodes[")?;
                for (i, node) in nodes.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{node}")?;
                }
                write!(f, "]")
            }
            Self::Primitive(primitive) => write!(f, "Primitive({primitive})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn truthiness() {
        let node = json!(true);
        assert!(ExpressionValue::Logical(true).is_truthy());
        assert!(!ExpressionValue::Logical(false).is_truthy());
        assert!(
            ExpressionValue::Primitive(Primitive::Boolean(true)).is_truthy()
        );
        assert!(ExpressionValue::Nodes(vec![&node]).is_truthy());
        assert!(!ExpressionValue::Nodes(vec![]).is_truthy());
        assert!(!ExpressionValue::Nothing.is_truthy());
        // a single node is not a test result on its own
        assert!(!ExpressionValue::Node(&node).is_truthy());
        assert!(!ExpressionValue::from(1_i64).is_truthy());
    }

    #[test]
    fn checked_accessors() {
        let doc = json!({"a": "text"});
        let node = ExpressionValue::from(&doc["a"]);
        assert_eq!(node.node(), Some(&json!("text")));
        assert_eq!(node.string(), Some("text"));
        assert_eq!(node.nodes(), None);
        assert_eq!(node.logical(), None);
        assert_eq!(
            ExpressionValue::from("x".to_string()).string(),
            Some("x")
        );
        assert_eq!(
            ExpressionValue::from(2.5_f64).primitive(),
            Some(&Primitive::Float(2.5))
        );
    }

    #[test]
    fn unchecked_accessors() {
        let doc = json!([1, 2]);
        let nodes = ExpressionValue::from(vec![&doc[0], &doc[1]]);
        assert_eq!(nodes.as_nodes().len(), 2);
        assert!(ExpressionValue::Logical(true).as_logical());
        assert_eq!(
            ExpressionValue::from(3_i64).as_primitive(),
            &Primitive::Integer(3)
        );
    }

    #[test]
    #[should_panic(expected = "expected a node")]
    fn wrong_variant_panics() {
        let _ = ExpressionValue::Nothing.as_node();
    }

    #[test]
    fn primitive_from_json() {
        assert_eq!(Primitive::from_json(&json!(null)), Some(Primitive::Null));
        assert_eq!(
            Primitive::from_json(&json!(-4)),
            Some(Primitive::Integer(-4))
        );
        assert_eq!(
            Primitive::from_json(&json!(1.5)),
            Some(Primitive::Float(1.5))
        );
        assert_eq!(
            Primitive::from_json(&json!(u64::MAX)),
            Some(Primitive::Float(u64::MAX as f64))
        );
        assert_eq!(Primitive::from_json(&json!([])), None);
    }

    #[test]
    fn display() {
        let doc = json!([1, "a"]);
        assert_eq!(
            ExpressionValue::from(vec![&doc[0], &doc[1]]).to_string(),
            r#"Nodes[1, "a"]"#
        );
        assert_eq!(ExpressionValue::Nothing.to_string(), "Nothing");
    }
}
