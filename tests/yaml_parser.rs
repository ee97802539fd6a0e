use std::path::Path;

use configd::errors::ConfigdError;
use configd::fs::mock::MockFileSystem;
use configd::value::Value;
use configd::yaml::{parse_file, parse_str, MAX_DEPTH};

fn s(text: &str) -> Value {
    Value::from(text)
}

#[test]
fn empty_documents_parse_to_nil() {
    assert_eq!(parse_str("").unwrap(), Value::Nil);
    assert_eq!(parse_str("# only a comment\n").unwrap(), Value::Nil);
}

#[test]
fn missing_values_are_empty_strings() {
    assert_eq!(
        parse_str("key:\nlist:\n  -\n").unwrap(),
        Value::Map(vec![
            (s("key"), s("")),
            (s("list"), Value::List(vec![s("")])),
        ])
    );
}

#[test]
fn scalars_stay_strings() {
    assert_eq!(parse_str("42").unwrap(), s("42"));
    assert_eq!(parse_str("true").unwrap(), s("true"));
    assert_eq!(parse_str("'quoted'").unwrap(), s("quoted"));
}

#[test]
fn nested_collections_keep_order() {
    let doc = "\
server:
  listen: [\"80\", \"443\"]
  names:
    - example.org
    - www.example.org
mode: strict
";
    let expected = Value::Map(vec![
        (
            s("server"),
            Value::Map(vec![
                (s("listen"), Value::List(vec![s("80"), s("443")])),
                (
                    s("names"),
                    Value::List(vec![s("example.org"), s("www.example.org")]),
                ),
            ]),
        ),
        (s("mode"), s("strict")),
    ]);
    assert_eq!(parse_str(doc).unwrap(), expected);
}

#[test]
fn duplicate_keys_are_preserved() {
    let value = parse_str("a: 1\na: 2\n").unwrap();
    assert_eq!(
        value,
        Value::Map(vec![(s("a"), s("1")), (s("a"), s("2"))])
    );
}

#[test]
fn only_the_first_document_is_read() {
    let value = parse_str("first: 1\n---\nsecond: 2\n").unwrap();
    assert_eq!(value, Value::Map(vec![(s("first"), s("1"))]));
}

#[test]
fn malformed_input_is_a_syntax_error() {
    let err = parse_str("key: [unclosed\n").unwrap_err();
    assert!(matches!(err, ConfigdError::YamlSyntax(_)), "got {err:?}");
    assert!(err.is_parse_error());
}

#[test]
fn aliases_are_rejected() {
    let err = parse_str("base: &b x\ncopy: *b\n").unwrap_err();
    assert!(matches!(err, ConfigdError::UnexpectedEvent(_)), "got {err:?}");
}

#[test]
fn nesting_beyond_the_limit_fails() {
    let deep = format!("{}{}", "[".repeat(MAX_DEPTH + 2), "]".repeat(MAX_DEPTH + 2));
    let err = parse_str(&deep).unwrap_err();
    assert!(err.is_parse_error(), "got {err:?}");
}

#[test]
fn parse_file_reports_unreadable_sources() {
    let fs = MockFileSystem::new();
    fs.add_file("/src/app.yml", "name: app\n");

    let value = parse_file(&fs, Path::new("/src/app.yml")).unwrap();
    assert_eq!(value.get("name"), Some(&s("app")));

    let err = parse_file(&fs, Path::new("/src/missing.yml")).unwrap_err();
    assert!(matches!(err, ConfigdError::SourceUnreadable { .. }), "got {err:?}");
}
