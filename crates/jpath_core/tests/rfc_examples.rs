//! Examples from RFC 9535 and edge cases, driven by JSON case tables

#![allow(clippy::unwrap_used, clippy::panic)]

use jpath_core::Query;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Deserialize)]
struct Case {
    query: String,
    /// Defaults to the table's fixture
    #[serde(default)]
    document: Option<Value>,
    #[serde(default)]
    result: Option<Vec<Value>>,
    /// 1-based offset, as shown in error messages
    #[serde(default)]
    error_at: Option<usize>,
}

const BOOKSTORE: &str = r#"
{
  "store": {
    "book": [
      {"category": "reference", "author": "Nigel Rees", "title": "Sayings of the Century", "price": 8.95},
      {"category": "fiction", "author": "Evelyn Waugh", "title": "Sword of Honour", "price": 12.99},
      {"category": "fiction", "author": "Herman Melville", "title": "Moby Dick", "isbn": "0-553-21311-3", "price": 8.99},
      {"category": "fiction", "author": "J. R. R. Tolkien", "title": "The Lord of the Rings", "isbn": "0-395-19395-8", "price": 22.99}
    ],
    "bicycle": {"color": "red", "price": 399}
  }
}
"#;

const BOOKSTORE_CASES: &str = r#"
[
  {"query": "$.store.book[*].author",
   "result": ["Nigel Rees", "Evelyn Waugh", "Herman Melville", "J. R. R. Tolkien"]},
  {"query": "$..author",
   "result": ["Nigel Rees", "Evelyn Waugh", "Herman Melville", "J. R. R. Tolkien"]},
  {"query": "$.store..price", "result": [8.95, 12.99, 8.99, 22.99, 399]},
  {"query": "$..book[2].author", "result": ["Herman Melville"]},
  {"query": "$..book[2].publisher", "result": []},
  {"query": "$..book[-1].title", "result": ["The Lord of the Rings"]},
  {"query": "$..book[0,1].title", "result": ["Sayings of the Century", "Sword of Honour"]},
  {"query": "$..book[:2].title", "result": ["Sayings of the Century", "Sword of Honour"]},
  {"query": "$..book[?@.isbn].title", "result": ["Moby Dick", "The Lord of the Rings"]},
  {"query": "$..book[?@.price<10].title", "result": ["Sayings of the Century", "Moby Dick"]},
  {"query": "$..book[?(@.price<10)].title", "result": ["Sayings of the Century", "Moby Dick"]},
  {"query": "$.store.bicycle.*", "result": ["red", 399]},
  {"query": "$..book[?@.price > $.store.bicycle.price]", "result": []},
  {"query": "$.store.book[?@.category == 'fiction' && @.price < 10].author", "result": ["Herman Melville"]},
  {"query": "$.store[?count(@.*) == 2].color", "result": ["red"]}
]
"#;

const FILTER: &str = r#"
{
  "a": [3, 5, 1, 2, 4, 6, {"b": "j"}, {"b": "k"}, {"b": {}}, {"b": "kilo"}],
  "o": {"p": 1, "q": 2, "r": 3, "s": 5, "t": {"u": 6}},
  "e": "f"
}
"#;

const FILTER_CASES: &str = r#"
[
  {"query": "$.a[?@.b == 'kilo']", "result": [{"b": "kilo"}]},
  {"query": "$.a[?(@.b == 'kilo')]", "result": [{"b": "kilo"}]},
  {"query": "$.a[?@>3.5]", "result": [5, 4, 6]},
  {"query": "$.a[?@.b]", "result": [{"b": "j"}, {"b": "k"}, {"b": {}}, {"b": "kilo"}]},
  {"query": "$[?@[?@.b]][0]", "result": [3]},
  {"query": "$.o[?@<3, ?@<3]", "result": [1, 2, 1, 2]},
  {"query": "$.a[?@<2 || @.b == \"k\"]", "result": [1, {"b": "k"}]},
  {"query": "$.a[?match(@.b, \"[jk]\")]", "result": [{"b": "j"}, {"b": "k"}]},
  {"query": "$.a[?search(@.b, \"[jk]\")]", "result": [{"b": "j"}, {"b": "k"}, {"b": "kilo"}]},
  {"query": "$.o[?@>1 && @<4]", "result": [2, 3]},
  {"query": "$.o[?@.u || @.x]", "result": [{"u": 6}]},
  {"query": "$.a[?@.b == $.x]", "result": [3, 5, 1, 2, 4, 6]},
  {"query": "$.a[?@ == @]",
   "result": [3, 5, 1, 2, 4, 6, {"b": "j"}, {"b": "k"}, {"b": {}}, {"b": "kilo"}]},
  {"query": "$.o[?!@.u].*", "result": []},
  {"query": "$.o[?value(@..u) == 6]", "result": [{"u": 6}]},
  {"query": "$.o[*][?@ == 6]", "result": [6]}
]
"#;

const LETTERS: &str = r#"["a", "b", "c", "d", "e", "f", "g"]"#;

const SLICE_CASES: &str = r#"
[
  {"query": "$[2:5]", "result": ["c", "d", "e"]},
  {"query": "$[::-1]", "result": ["g", "f", "e", "d", "c", "b", "a"]},
  {"query": "$[5:1:-2]", "result": ["f", "d"]},
  {"query": "$[1:5:2]", "result": ["b", "d"]},
  {"query": "$[::0]", "result": []},
  {"query": "$[-2:]", "result": ["f", "g"]},
  {"query": "$[:-5]", "result": ["a", "b"]},
  {"query": "$[10:]", "result": []},
  {"query": "$[-10:2]", "result": ["a", "b"]},
  {"query": "$[6:-10:-3]", "result": ["g", "d", "a"]},
  {"query": "$[0:3][1]", "result": []},
  {"query": "$[0, 0:2, -1]", "result": ["a", "a", "b", "g"]}
]
"#;

const SEMANTIC_CASES: &str = r#"
[
  {"query": "$[?length(@) == 2]", "document": ["👋🏻", "ab", "abc", [1, 2], {"a": 1}],
   "result": ["👋🏻", "ab", [1, 2]]},
  {"query": "$[?length(@.a) == 3]",
   "document": [{"a": "abc"}, {"a": [1, 2]}, {"a": 3}, {"b": "xyz"}],
   "result": [{"a": "abc"}]},
  {"query": "$[?match(@, '.')]", "document": ["xx", "x", "\n", "\r"], "result": ["x"]},
  {"query": "$[?search(@, '.')]", "document": ["xx", "x", "\n", "\r"], "result": ["xx", "x"]},
  {"query": "$[?match(@, 'a.c')]", "document": ["abc", "a\nc", "a c"], "result": ["abc", "a c"]},
  {"query": "$[?match(@, '[')]", "document": ["["], "result": []},
  {"query": "$[?search(@, 'a$')]", "document": ["a$", "^b", "a"], "result": ["a$"]},
  {"query": "$[?match(@, '^b')]", "document": ["a$", "^b", "a"], "result": ["^b"]},
  {"query": "$[?match(@, '\\\\w')]", "document": ["a$", "^b", "a"], "result": []},
  {"query": "$[?@ == 1]", "document": [1, 1.0, "1", true, [1]], "result": [1, 1.0]},
  {"query": "$[?@.a == @.b]",
   "document": [{"a": [1, 2], "b": [1, 2]}, {"a": [1], "b": [2]}, {"a": {"x": 1}, "b": {"x": 1.0}}, {}],
   "result": [{"a": [1, 2], "b": [1, 2]}, {"a": {"x": 1}, "b": {"x": 1.0}}, {}]},
  {"query": "$[?@ <= true]", "document": [true, false, 1, "x", null], "result": [true]},
  {"query": "$[?@ < 'b']", "document": ["a", "B", "ba", 1], "result": ["a", "B"]},
  {"query": "$[?count(@.*) == 0]", "document": [[], {}, [1], 5], "result": [[], {}, 5]},
  {"query": "$[?@.*]", "document": [[], [0], {"a": null}, "s"], "result": [[0], {"a": null}]},
  {"query": "$.*", "document": {"z": 1, "y": 2, "x": 3}, "result": [1, 2, 3]},
  {"query": "$['\\u0000', '\\u0041', \"'\"]", "document": {"\u0000": 1, "A": 2, "'": 3}, "result": [1, 2, 3]},
  {"query": "$.true", "document": {"true": 1}, "result": [1]}
]
"#;

const ERROR_CASES: &str = r#"
[
  {"query": "$.62", "error_at": 3},
  {"query": "", "error_at": 1},
  {"query": "$..", "error_at": 4},
  {"query": "$[?@.a == 1", "error_at": 12},
  {"query": "$['a' 'b']", "error_at": 7},
  {"query": "$[?@.a==1]]", "error_at": 11},
  {"query": "$.a ", "error_at": 4},
  {"query": "$[?count(@.a)]", "error_at": 4},
  {"query": "$[?@.* == 1]", "error_at": 4},
  {"query": "$[?!@.a == 1]", "error_at": 9},
  {"query": "$[?nope(@)]", "error_at": 4},
  {"query": "$[1.5]", "error_at": 3},
  {"query": "$[-0]", "error_at": 3},
  {"query": "$[9007199254740992]", "error_at": 3},
  {"query": "$['\\x']", "error_at": 4},
  {"query": "$['\\uDC00']", "error_at": 4},
  {"query": "$[\"\u0001\"]", "error_at": 4},
  {"query": "$[?@.a = 1]", "error_at": 8},
  {"query": "$[?@.a & @.b]", "error_at": 8},
  {"query": "$.a.tru\\u0065", "error_at": 8}
]
"#;

fn run(cases: &str, fixture: &str) {
    let fixture: Value = serde_json::from_str(fixture).unwrap();
    let cases: Vec<Case> = serde_json::from_str(cases).unwrap();
    for case in cases {
        let document = case.document.as_ref().unwrap_or(&fixture);
        match (Query::parse(&case.query), &case.result, case.error_at) {
            (Ok(query), Some(expected), None) => {
                let actual: Vec<Value> = query.select(document).into_iter().cloned().collect();
                assert_eq!(&actual, expected, "{}", case.query);
            }
            (Err(err), None, Some(at)) => {
                assert_eq!(err.position().map(|p| p + 1), Some(at), "{}: {err}", case.query);
                assert!(err.to_string().ends_with(&format!("at position {at}")));
            }
            (outcome, _, _) => panic!("{}: unexpected outcome {outcome:?}", case.query),
        }
    }
}

#[test]
fn test_bookstore() {
    run(BOOKSTORE_CASES, BOOKSTORE);
}

#[test]
fn test_filters() {
    run(FILTER_CASES, FILTER);
}

#[test]
fn test_slices() {
    run(SLICE_CASES, LETTERS);
}

#[test]
fn test_semantics() {
    run(SEMANTIC_CASES, "null");
}

#[test]
fn test_errors() {
    run(ERROR_CASES, "null");
}

#[test]
fn test_deterministic() {
    let doc: Value = serde_json::from_str(BOOKSTORE).unwrap();
    let query = Query::parse("$..*").unwrap();
    let first = query.select(&doc);
    assert_eq!(first.len(), 27);
    for _ in 0..3 {
        assert_eq!(query.select(&doc), first);
    }
}
