//! Builds queries programmatically and registers a custom function.
//!
//! Run with `cargo run --example query_builder`.

use std::sync::Arc;

use jpq::query::{
    BinaryOperator, CancellationToken, CompiledQuery, Expression,
    ExpressionValue, FunctionDefinition, FunctionKind, FunctionRegistry,
    QueryBuilder, Segment, Selector,
};
use serde_json::{Value, json};

fn main() {
    let doc = json!({
        "store": {
            "book": [
                {
                    "title": "Sayings of the Century",
                    "price": 8.95,
                    "tags": ["quotes"]
                },
                {"title": "Sword of Honour", "price": 12.99, "tags": []},
                {
                    "title": "Moby Dick",
                    "price": 8.99,
                    "tags": ["sea", "whales"]
                },
            ]
        }
    });

    // $.store.book[?@.price < 10].title
    let price = Expression::current(vec![Segment::Child(
        Selector::MemberNameShorthand("price".to_string()),
    )]);
    let query = QueryBuilder::new()
        .name("store")
        .name("book")
        .filter(Expression::binary(
            price,
            BinaryOperator::Lt,
            Expression::Integer(10),
        ))
        .name("title")
        .build();
    println!("{query}");

    let registry = Arc::new(FunctionRegistry::new());
    let cheap = CompiledQuery::bind(query, Arc::clone(&registry));
    for title in cheap.execute(&doc) {
        println!("  {title}");
    }

    // A user function that is true for arrays with more than one element
    let registry = FunctionRegistry::builder()
        .function(FunctionDefinition::new(
            "plural",
            FunctionKind::Logical,
            vec![FunctionKind::Value],
            |arguments, _| {
                let plural = matches!(
                    arguments[0].node(),
                    Some(Value::Array(items)) if items.len() > 1
                );
                ExpressionValue::Logical(plural)
            },
        ))
        .build();
    let tagged = CompiledQuery::with_registry(
        "$.store.book[?plural(@.tags)].title",
        Arc::new(registry),
    )
    .expect("valid query");
    println!("{tagged}");

    match tagged.execute_with_cancellation(&doc, &CancellationToken::new()) {
        Ok(titles) => titles.iter().for_each(|title| println!("  {title}")),
        Err(err) => eprintln!("{err}"),
    }
}
