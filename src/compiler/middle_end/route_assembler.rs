//! Route assembly: schema validation, body precedence and header merging

use crate::compiler::frontend::ast::{Node, NodeKind, SyntaxTree};
use crate::compiler::middle_end::struct_decoder::decode_struct;
use crate::error::{CompilerError, Result};
use crate::types::{
    Field, Literal, Route, StructLiteral, CONTENT_TYPE, CONTENT_TYPE_HTML, CONTENT_TYPE_JSON,
    CONTENT_TYPE_TEXT, DEFAULT_STATUS, ROUTE_KEYS,
};
use indexmap::IndexMap;

/// Body keys in priority order; the first one present decides the body
const BODY_KEYS: [&str; 3] = ["html", "json", "text"];

/// Decoded body of one route, restricted to the keys in `ROUTE_KEYS`
#[derive(Debug, Clone)]
pub struct RouteProperties {
    props: StructLiteral,
}

impl RouteProperties {
    /// Check every key against the closed route schema
    pub fn from_struct(props: StructLiteral, file: &str) -> Result<Self> {
        for (key, field) in props.iter() {
            if !ROUTE_KEYS.contains(&key.as_str()) {
                return Err(CompilerError::unknown_key(file, field.line, key.as_str()));
            }
        }
        Ok(Self { props })
    }

    pub fn field(&self, key: &str) -> Option<&Field> {
        self.props.field(key)
    }
}

/// Build a `Route` from a `route` node: `(route (string) (method) (struct))`
pub fn assemble_route(tree: &SyntaxTree, node: &Node) -> Result<Route> {
    let file = tree.file();
    let malformed = || CompilerError::grammar(file, node.start_line(), "Malformed route definition");

    let path_node = node
        .named_child(0)
        .filter(|n| n.kind() == NodeKind::String)
        .ok_or_else(malformed)?;
    let method_node = node.named_child(1).ok_or_else(malformed)?;
    let body_node = node
        .named_child(2)
        .filter(|n| n.kind() == NodeKind::Struct)
        .ok_or_else(malformed)?;

    let path = tree.unquoted(path_node);
    let method = tree.text(method_node).to_ascii_uppercase();

    let props = RouteProperties::from_struct(decode_struct(tree, body_node)?, file)?;
    build_route(path, &method, &props, file)
}

/// Apply defaults and precedence rules to validated properties
pub fn build_route(path: &str, method: &str, props: &RouteProperties, file: &str) -> Result<Route> {
    let status = match props.field("status") {
        Some(Field { value: Literal::Integer(status), .. }) => *status,
        Some(field) => {
            return Err(CompilerError::type_mismatch(
                file,
                field.line,
                "status",
                "integer",
                field.value.type_name(),
            ))
        }
        None => DEFAULT_STATUS,
    };

    let mut headers = IndexMap::new();
    let body = resolve_body(path, props, file, &mut headers)?;

    if let Some(field) = props.field("headers") {
        let Literal::Struct(entries) = &field.value else {
            return Err(CompilerError::type_mismatch(
                file,
                field.line,
                "headers",
                "struct",
                field.value.type_name(),
            ));
        };
        for (name, entry) in entries.iter() {
            let Literal::String(value) = &entry.value else {
                return Err(CompilerError::type_mismatch(
                    file,
                    entry.line,
                    format!("headers.{}", name),
                    "string",
                    entry.value.type_name(),
                ));
            };
            set_header(&mut headers, name, value);
        }
    }

    Ok(Route::new(path, method, status, headers, body))
}

/// Pick the body from the first of `html`, `json`, `text` that is present and
/// record the matching default Content-Type.
fn resolve_body(
    path: &str,
    props: &RouteProperties,
    file: &str,
    headers: &mut IndexMap<String, String>,
) -> Result<String> {
    let present: Vec<&str> = BODY_KEYS
        .iter()
        .copied()
        .filter(|key| props.field(key).is_some())
        .collect();
    if present.len() > 1 {
        log::warn!(
            "{}: route \"{}\" declares {}; only \"{}\" is used",
            file,
            path,
            present.join(", "),
            present[0]
        );
    }

    if let Some(field) = props.field("html") {
        let html = expect_string(field, "html", file)?;
        headers.insert(CONTENT_TYPE.to_string(), CONTENT_TYPE_HTML.to_string());
        Ok(html.to_string())
    } else if let Some(field) = props.field("json") {
        let Literal::Struct(object) = &field.value else {
            return Err(CompilerError::type_mismatch(
                file,
                field.line,
                "json",
                "struct",
                field.value.type_name(),
            ));
        };
        let value = object
            .to_json()
            .map_err(|e| CompilerError::serialization(file, field.line, e.to_string()))?;
        let body = serde_json::to_string(&value)
            .map_err(|e| CompilerError::serialization(file, field.line, e.to_string()))?;
        headers.insert(CONTENT_TYPE.to_string(), CONTENT_TYPE_JSON.to_string());
        Ok(body)
    } else if let Some(field) = props.field("text") {
        let text = expect_string(field, "text", file)?;
        headers.insert(CONTENT_TYPE.to_string(), CONTENT_TYPE_TEXT.to_string());
        Ok(text.to_string())
    } else {
        Ok(String::new())
    }
}

fn expect_string<'f>(field: &'f Field, key: &str, file: &str) -> Result<&'f str> {
    match &field.value {
        Literal::String(s) => Ok(s),
        other => Err(CompilerError::type_mismatch(
            file,
            field.line,
            key,
            "string",
            other.type_name(),
        )),
    }
}

/// Insert a header, replacing any existing entry whose name matches case-insensitively
fn set_header(headers: &mut IndexMap<String, String>, name: &str, value: &str) {
    if !headers.contains_key(name) {
        headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
    }
    headers.insert(name.to_string(), value.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::frontend::parse_source;

    fn compile_one(source: &str) -> Result<Route> {
        let tree = parse_source(source, "test.tera").unwrap();
        let node = tree.root().named_children()[0].clone();
        assemble_route(&tree, &node)
    }

    #[test]
    fn test_ping_route() {
        let route = compile_one(r#"route "/ping" GET { text: "pong" }"#).unwrap();
        let mut headers = IndexMap::new();
        headers.insert("Content-Type".to_string(), "text/plain".to_string());
        assert_eq!(route, Route::new("/ping", "GET", 200, headers, "pong"));
    }

    #[test]
    fn test_json_route_with_status() {
        let route = compile_one(r#"route "/x" GET { status: 404, json: { ok: false } }"#).unwrap();
        assert_eq!(route.status(), 404);
        assert_eq!(route.header("Content-Type"), Some("application/json"));
        assert_eq!(route.body(), r#"{"ok":false}"#);
    }

    #[test]
    fn test_default_status_and_empty_body() {
        let route = compile_one(r#"route "/empty" DELETE {}"#).unwrap();
        assert_eq!(route.status(), 200);
        assert_eq!(route.body(), "");
        assert!(route.headers().is_empty());
    }

    #[test]
    fn test_method_is_uppercased() {
        let route = compile_one(r#"route "/" post { text: "x" }"#).unwrap();
        assert_eq!(route.method(), "POST");
    }

    #[test]
    fn test_html_wins_over_json_and_text() {
        let route = compile_one(
            r#"route "/" GET { text: "t", json: { a: 1 }, html: "<h1>h</h1>" }"#,
        )
        .unwrap();
        assert_eq!(route.body(), "<h1>h</h1>");
        assert_eq!(route.header("Content-Type"), Some("text/html"));
    }

    #[test]
    fn test_json_wins_over_text() {
        let route = compile_one(r#"route "/" GET { text: "t", json: { a: 1 } }"#).unwrap();
        assert_eq!(route.body(), r#"{"a":1}"#);
        assert_eq!(route.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_nested_json_body_is_valid_json() {
        let route = compile_one(
            r#"route "/" GET { json: { user: { id: 1, tags: { a: "b" } }, ratio: 0.25, on: true } }"#,
        )
        .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(route.body()).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!({"user": {"id": 1, "tags": {"a": "b"}}, "ratio": 0.25, "on": true})
        );
    }

    #[test]
    fn test_explicit_content_type_overrides_default() {
        let route = compile_one(
            r#"route "/" GET { json: { a: 1 }, headers: { "Content-Type": "application/vnd.api+json" } }"#,
        )
        .unwrap();
        assert_eq!(route.header("Content-Type"), Some("application/vnd.api+json"));
        assert_eq!(route.headers().len(), 1);
    }

    #[test]
    fn test_header_override_ignores_case() {
        let route =
            compile_one(r#"route "/" GET { text: "x", headers: { content-type: "text/csv" } }"#)
                .unwrap();
        assert_eq!(route.headers().len(), 1);
        assert_eq!(route.header("Content-Type"), Some("text/csv"));
    }

    #[test]
    fn test_headers_are_merged() {
        let route = compile_one(
            r#"route "/" GET { headers: { X-Powered-By: "tera", "Cache-Control": "no-store" }, text: "x" }"#,
        )
        .unwrap();
        assert_eq!(route.headers().len(), 3);
        assert_eq!(route.header("x-powered-by"), Some("tera"));
        assert_eq!(route.header("Cache-Control"), Some("no-store"));
        assert_eq!(route.header("Content-Type"), Some("text/plain"));
    }

    #[test]
    fn test_unknown_key() {
        let err = compile_one("route \"/\" GET {\n  text: \"x\"\n  foo: 1\n}").unwrap_err();
        match err {
            CompilerError::UnknownRouteKey { key, line, .. } => {
                assert_eq!(key, "foo");
                assert_eq!(line, 3);
            }
            other => panic!("Expected unknown key error, got {:?}", other),
        }
    }

    #[test]
    fn test_status_must_be_integer() {
        let err = compile_one("route \"/\" GET {\n  status: \"200\"\n}").unwrap_err();
        match err {
            CompilerError::TypeMismatch { key, expected, found, line, .. } => {
                assert_eq!(key, "status");
                assert_eq!(expected, "integer");
                assert_eq!(found, "string");
                assert_eq!(line, 2);
            }
            other => panic!("Expected type mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_headers_must_be_struct_of_strings() {
        let err = compile_one(r#"route "/" GET { headers: "x" }"#).unwrap_err();
        assert!(matches!(err, CompilerError::TypeMismatch { ref key, .. } if key == "headers"));

        let err = compile_one(r#"route "/" GET { headers: { X-Count: 5 } }"#).unwrap_err();
        assert!(matches!(
            err,
            CompilerError::TypeMismatch { ref key, found: "integer", .. } if key == "headers.X-Count"
        ));
    }

    #[test]
    fn test_json_must_be_struct() {
        let err = compile_one(r#"route "/" GET { json: "[]" }"#).unwrap_err();
        assert!(matches!(err, CompilerError::TypeMismatch { ref key, .. } if key == "json"));
    }

    #[test]
    fn test_text_must_be_string() {
        let err = compile_one(r#"route "/" GET { text: 5 }"#).unwrap_err();
        assert!(matches!(err, CompilerError::TypeMismatch { ref key, .. } if key == "text"));
    }

    #[test]
    fn test_non_finite_json_float_is_serialization_error() {
        let err = compile_one(r#"route "/" GET { json: { big: 1e999 } }"#).unwrap_err();
        assert!(matches!(err, CompilerError::Serialization { .. }));
    }
}
