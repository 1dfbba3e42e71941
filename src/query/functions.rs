/*!
# Function Extensions

Registry of the function extensions callable from filter expressions, and the
five functions every registry starts with: `length`, `count`, `value`,
`match` and `search`.

Calls are resolved when evaluated, not when parsed. Calling a name that is not
registered, or calling a function with the wrong number of arguments, yields
[`ExpressionValue::Nothing`].

# Examples

Registering a user function next to the built-ins:

```
use jpq::query::{
    ExpressionValue, FunctionDefinition, FunctionKind, FunctionRegistry,
};

let registry = FunctionRegistry::builder()
    .function(FunctionDefinition::new(
        "is_even",
        FunctionKind::Logical,
        vec![FunctionKind::Value],
        |arguments, _| match arguments[0].node().and_then(|n| n.as_i64()) {
            Some(n) => ExpressionValue::Logical(n % 2 == 0),
            None => ExpressionValue::Logical(false),
        },
    ))
    .build();
assert!(registry.lookup("is_even").is_some());
assert!(registry.lookup("length").is_some());
```
*/
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use regex::Regex;
use serde_json::Value;

use crate::query::common::CancellationToken;
use crate::query::value::ExpressionValue;

/// Upper bound of compiled patterns kept per regex function.
const REGEX_CACHE_CAPACITY: usize = 64;

/// Declared type of a function parameter or result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// A single JSON value or `Nothing`
    Value,
    /// A logical result
    Logical,
    /// A node list
    Nodes,
}

/// Execution context handed to every function call.
#[derive(Debug, Clone, Copy)]
pub struct FunctionContext<'c> {
    cancellation: &'c CancellationToken,
}

impl<'c> FunctionContext<'c> {
    /// Creates a context observing `cancellation`.
    #[must_use]
    pub const fn new(cancellation: &'c CancellationToken) -> Self {
        Self { cancellation }
    }

    /// The cancellation token of the running query.
    #[must_use]
    pub const fn cancellation_token(&self) -> &'c CancellationToken {
        self.cancellation
    }

    /// Returns whether the running query has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// Implementation of a function extension.
pub type FunctionBody = Arc<
    dyn for<'a> Fn(
            Vec<ExpressionValue<'a>>,
            &FunctionContext<'_>,
        ) -> ExpressionValue<'a>
        + Send
        + Sync,
>;

/// A named function with its declared signature.
#[derive(Clone)]
pub struct FunctionDefinition {
    name: String,
    result: FunctionKind,
    parameters: Vec<FunctionKind>,
    body: FunctionBody,
}

impl FunctionDefinition {
    /// Creates a function definition. Arguments reach `body` already
    /// converted to the declared `parameters` kinds.
    pub fn new<F>(
        name: impl Into<String>,
        result: FunctionKind,
        parameters: Vec<FunctionKind>,
        body: F,
    ) -> Self
    where
        F: for<'a> Fn(
                Vec<ExpressionValue<'a>>,
                &FunctionContext<'_>,
            ) -> ExpressionValue<'a>
            + Send
            + Sync
            + 'static,
    {
        Self { name: name.into(), result, parameters, body: Arc::new(body) }
    }

    /// The function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared result kind.
    #[must_use]
    pub const fn result(&self) -> FunctionKind {
        self.result
    }

    /// The declared parameter kinds, in order.
    #[must_use]
    pub fn parameters(&self) -> &[FunctionKind] {
        &self.parameters
    }

    /// Checks the argument count, converts each argument to its declared
    /// kind, and runs the body.
    #[must_use]
    pub fn invoke<'a>(
        &self,
        arguments: Vec<ExpressionValue<'a>>,
        context: &FunctionContext<'_>,
    ) -> ExpressionValue<'a> {
        if arguments.len() != self.parameters.len() {
            log::debug!(
                "{}() expects {} argument(s), got {}",
                self.name,
                self.parameters.len(),
                arguments.len()
            );
            return ExpressionValue::Nothing;
        }
        let arguments = arguments
            .into_iter()
            .zip(&self.parameters)
            .map(|(argument, kind)| coerce(argument, *kind))
            .collect();
        (self.body)(arguments, context)
    }
}

impl fmt::Debug for FunctionDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionDefinition")
            .field("name", &self.name)
            .field("result", &self.result)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

/// Converts an evaluated argument to the kind a parameter declares.
fn coerce(
    argument: ExpressionValue<'_>,
    kind: FunctionKind,
) -> ExpressionValue<'_> {
    match (kind, argument) {
        (FunctionKind::Value, ExpressionValue::Nodes(nodes)) => {
            match nodes[..] {
                [node] => ExpressionValue::Node(node),
                _ => ExpressionValue::Nothing,
            }
        }
        (FunctionKind::Nodes, ExpressionValue::Node(node)) => {
            ExpressionValue::Nodes(vec![node])
        }
        (FunctionKind::Logical, argument) => {
            ExpressionValue::Logical(argument.is_truthy())
        }
        (_, argument) => argument,
    }
}

/// Functions callable from filter expressions, keyed by name.
#[derive(Clone, Debug)]
pub struct FunctionRegistry {
    functions: HashMap<String, FunctionDefinition>,
}

impl FunctionRegistry {
    /// Creates a registry holding the built-in functions.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self::empty();
        for function in builtins() {
            registry.register(function);
        }
        registry
    }

    /// Creates a registry without any function.
    #[must_use]
    pub fn empty() -> Self {
        Self { functions: HashMap::new() }
    }

    /// Starts a builder seeded with the built-in functions.
    #[must_use]
    pub fn builder() -> FunctionRegistryBuilder {
        FunctionRegistryBuilder { registry: Self::new() }
    }

    /// Adds a function, replacing any function of the same name.
    pub fn register(&mut self, function: FunctionDefinition) {
        self.functions.insert(function.name.clone(), function);
    }

    /// Finds a function by name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&FunctionDefinition> {
        self.functions.get(name)
    }

    /// Number of registered functions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns whether no function is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Invokes the function `name`, or returns `Nothing` if it is not
    /// registered.
    #[must_use]
    pub fn call<'a>(
        &self,
        name: &str,
        arguments: Vec<ExpressionValue<'a>>,
        context: &FunctionContext<'_>,
    ) -> ExpressionValue<'a> {
        match self.lookup(name) {
            Some(function) => function.invoke(arguments, context),
            None => {
                log::debug!("unknown function {name}()");
                ExpressionValue::Nothing
            }
        }
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for registries extending the built-in functions.
pub struct FunctionRegistryBuilder {
    registry: FunctionRegistry,
}

impl FunctionRegistryBuilder {
    /// Adds a function, replacing a built-in of the same name.
    #[must_use]
    pub fn function(mut self, function: FunctionDefinition) -> Self {
        self.registry.register(function);
        self
    }

    /// Return the built registry.
    #[must_use]
    pub fn build(self) -> FunctionRegistry {
        self.registry
    }
}

fn builtins() -> [FunctionDefinition; 5] {
    [
        FunctionDefinition::new(
            "length",
            FunctionKind::Value,
            vec![FunctionKind::Value],
            length,
        ),
        FunctionDefinition::new(
            "count",
            FunctionKind::Value,
            vec![FunctionKind::Nodes],
            count,
        ),
        FunctionDefinition::new(
            "value",
            FunctionKind::Value,
            vec![FunctionKind::Nodes],
            value,
        ),
        regex_function("match", true),
        regex_function("search", false),
    ]
}

fn size(len: usize) -> ExpressionValue<'static> {
    i64::try_from(len).map_or(ExpressionValue::Nothing, ExpressionValue::from)
}

/// Number of characters of a string, elements of an array or members of an
/// object.
fn length<'a>(
    arguments: Vec<ExpressionValue<'a>>,
    _: &FunctionContext<'_>,
) -> ExpressionValue<'a> {
    match arguments.first() {
        Some(ExpressionValue::Node(Value::Array(array))) => size(array.len()),
        Some(ExpressionValue::Node(Value::Object(object))) => {
            size(object.len())
        }
        Some(argument) => argument
            .string()
            .map_or(ExpressionValue::Nothing, |s| size(s.chars().count())),
        None => ExpressionValue::Nothing,
    }
}

/// Number of nodes in a node list.
fn count<'a>(
    arguments: Vec<ExpressionValue<'a>>,
    _: &FunctionContext<'_>,
) -> ExpressionValue<'a> {
    match arguments.first() {
        Some(ExpressionValue::Nodes(nodes)) => size(nodes.len()),
        _ => ExpressionValue::Nothing,
    }
}

/// The single node of a one-element node list.
fn value<'a>(
    arguments: Vec<ExpressionValue<'a>>,
    _: &FunctionContext<'_>,
) -> ExpressionValue<'a> {
    match arguments.first() {
        Some(ExpressionValue::Nodes(nodes)) if nodes.len() == 1 => {
            ExpressionValue::Node(nodes[0])
        }
        _ => ExpressionValue::Nothing,
    }
}

/// `match` when `whole` is set, `search` otherwise.
fn regex_function(name: &str, whole: bool) -> FunctionDefinition {
    let cache = RegexCache::new(whole);
    FunctionDefinition::new(
        name,
        FunctionKind::Logical,
        vec![FunctionKind::Value, FunctionKind::Value],
        move |arguments, _| {
            let (Some(input), Some(pattern)) =
                (arguments[0].string(), arguments[1].string())
            else {
                return ExpressionValue::Logical(false);
            };
            let matched = cache
                .get_or_compile(pattern)
                .is_some_and(|regex| regex.is_match(input));
            ExpressionValue::Logical(matched)
        },
    )
}

/// Compiled I-Regexp patterns, including those that failed to compile.
struct RegexCache {
    /// Whether patterns must match the whole input
    whole: bool,
    entries: RwLock<HashMap<String, Option<Regex>>>,
}

impl RegexCache {
    fn new(whole: bool) -> Self {
        Self { whole, entries: RwLock::new(HashMap::new()) }
    }

    fn get_or_compile(&self, pattern: &str) -> Option<Regex> {
        if let Ok(entries) = self.entries.read() {
            if let Some(entry) = entries.get(pattern) {
                return entry.clone();
            }
        }

        let translated = translate_iregexp(pattern);
        let source = if self.whole {
            format!(r"\A(?:{translated})\z")
        } else {
            translated
        };
        let compiled = Regex::new(&source)
            .inspect_err(|e| log::debug!("invalid regex {pattern:?}: {e}"))
            .ok();

        if let Ok(mut entries) = self.entries.write() {
            if entries.len() < REGEX_CACHE_CAPACITY {
                entries.insert(pattern.to_string(), compiled.clone());
            }
        }
        compiled
    }
}

/// Rewrites an I-Regexp (RFC 9485) pattern for the `regex` crate: outside of
/// character classes `.` matches any character except `\n` and `\r`.
#[must_use]
pub fn translate_iregexp(pattern: &str) -> String {
    let mut result = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    let mut in_class = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                result.push(c);
                if let Some(escaped) = chars.next() {
                    result.push(escaped);
                }
            }
            '[' if !in_class => {
                in_class = true;
                result.push(c);
                if chars.next_if_eq(&'^').is_some() {
                    result.push('^');
                }
                // a leading `]` is a literal member of the class
                if chars.next_if_eq(&']').is_some() {
                    result.push_str(r"\]");
                }
            }
            // nested classes are not I-Regexp syntax
            '[' => result.push_str(r"\["),
            ']' if in_class => {
                in_class = false;
                result.push(c);
            }
            '.' if !in_class => result.push_str(r"[^\n\r]"),
            _ => result.push(c),
        }
    }
    result
}
