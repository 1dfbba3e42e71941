/*!
# `jpq` Library

Compiles RFC 9535 JSONPath queries and runs them against
[`serde_json::Value`] documents.

```
use jpq::query::compile;
use serde_json::json;

let doc = json!({"a": [1, 2, 3]});
let query = compile("$.a[-1]").expect("valid query");
assert_eq!(query.execute(&doc), vec![&json!(3)]);
```
*/

pub mod commands;
pub mod query;
pub mod tokenizer;
pub mod utils;

pub use utils::*;
