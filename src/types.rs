//! Core types for the Tera compiler: literal values, routes and the route table

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::fmt;
use thiserror::Error;

/// Default file extension for Tera sources, appended to extension-less imports
pub const TERA_EXTENSION: &str = "tera";

/// Status used when a route does not declare one
pub const DEFAULT_STATUS: i64 = 200;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const CONTENT_TYPE_HTML: &str = "text/html";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_TEXT: &str = "text/plain";

/// Keys accepted inside a route body
pub const ROUTE_KEYS: &[&str] = &["status", "headers", "json", "html", "text"];

/// A literal that has no JSON representation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JsonError {
    #[error("float value {0} cannot be represented in JSON")]
    NonFiniteFloat(f64),
}

/// A parsed value of the source language
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Struct(StructLiteral),
}

impl Literal {
    /// Human readable kind, used in type errors
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::String(_) => "string",
            Literal::Integer(_) => "integer",
            Literal::Float(_) => "float",
            Literal::Boolean(_) => "boolean",
            Literal::Struct(_) => "struct",
        }
    }

    /// Convert to a JSON value. Fails on floats JSON cannot represent.
    pub fn to_json(&self) -> std::result::Result<Value, JsonError> {
        Ok(match self {
            Literal::String(s) => Value::String(s.clone()),
            Literal::Integer(i) => Value::Number(Number::from(*i)),
            Literal::Float(f) => Number::from_f64(*f)
                .map(Value::Number)
                .ok_or(JsonError::NonFiniteFloat(*f))?,
            Literal::Boolean(b) => Value::Bool(*b),
            Literal::Struct(s) => s.to_json()?,
        })
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) => write!(f, "\"{}\"", s),
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Float(n) => write!(f, "{}", n),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Struct(s) => {
                write!(f, "{{ ")?;
                for (i, (key, field)) in s.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, field.value)?;
                }
                write!(f, " }}")
            }
        }
    }
}

/// One `key: value` entry of a struct literal, with the line its key sits on
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub value: Literal,
    pub line: usize,
}

/// Ordered key/value mapping. Keys are unique; re-inserting a key replaces the
/// value but keeps the original position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructLiteral {
    fields: IndexMap<String, Field>,
}

impl StructLiteral {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, returning the previous value for that key
    pub fn insert(&mut self, key: impl Into<String>, value: Literal, line: usize) -> Option<Literal> {
        self.fields
            .insert(key.into(), Field { value, line })
            .map(|old| old.value)
    }

    pub fn get(&self, key: &str) -> Option<&Literal> {
        self.fields.get(key).map(|field| &field.value)
    }

    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.fields.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn to_json(&self) -> std::result::Result<Value, JsonError> {
        let mut object = Map::new();
        for (key, field) in &self.fields {
            object.insert(key.clone(), field.value.to_json()?);
        }
        Ok(Value::Object(object))
    }
}

/// One compiled HTTP path/method/response mapping. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Route {
    path: String,
    method: String,
    status: i64,
    headers: IndexMap<String, String>,
    body: String,
}

impl Route {
    pub fn new(
        path: impl Into<String>,
        method: impl Into<String>,
        status: i64,
        headers: IndexMap<String, String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            method: method.into(),
            status,
            headers,
            body: body.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn status(&self) -> i64 {
        self.status
    }

    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    /// Whether a request with `method` is served by this route. An empty
    /// request method counts as GET.
    pub fn accepts(&self, method: &str) -> bool {
        method == self.method || (method.is_empty() && self.method == "GET")
    }
}

/// Ordered collection of compiled routes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, route: Route) {
        self.routes.push(route);
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Route> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn into_routes(self) -> Vec<Route> {
        self.routes
    }
}

impl<'a> IntoIterator for &'a RouteTable {
    type Item = &'a Route;
    type IntoIter = std::slice::Iter<'a, Route>;

    fn into_iter(self) -> Self::IntoIter {
        self.routes.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struct_literal_keeps_first_position_on_replace() {
        let mut s = StructLiteral::new();
        s.insert("a", Literal::Integer(1), 1);
        s.insert("b", Literal::Integer(2), 2);
        let old = s.insert("a", Literal::Integer(3), 3);

        assert_eq!(old, Some(Literal::Integer(1)));
        assert_eq!(s.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(s.get("a"), Some(&Literal::Integer(3)));
        assert_eq!(s.field("a").map(|f| f.line), Some(3));
    }

    #[test]
    fn test_nested_struct_to_json() {
        let mut inner = StructLiteral::new();
        inner.insert("id", Literal::Integer(7), 2);
        inner.insert("score", Literal::Float(1.5), 3);
        let mut outer = StructLiteral::new();
        outer.insert("user", Literal::Struct(inner), 1);
        outer.insert("ok", Literal::Boolean(true), 4);
        outer.insert("name", Literal::String("tera".into()), 5);

        let json = outer.to_json().unwrap();
        assert_eq!(
            json,
            serde_json::json!({"user": {"id": 7, "score": 1.5}, "ok": true, "name": "tera"})
        );
    }

    #[test]
    fn test_non_finite_float_is_rejected() {
        assert_eq!(
            Literal::Float(f64::INFINITY).to_json(),
            Err(JsonError::NonFiniteFloat(f64::INFINITY))
        );
    }

    #[test]
    fn test_literal_display_and_type_name() {
        let mut inner = StructLiteral::new();
        inner.insert("ok", Literal::Boolean(false), 1);
        inner.insert("name", Literal::String("tera".into()), 1);
        let value = Literal::Struct(inner);

        assert_eq!(value.to_string(), "{ ok: false, name: \"tera\" }");
        assert_eq!(value.type_name(), "struct");
        assert_eq!(Literal::Float(0.5).type_name(), "float");
    }

    #[test]
    fn test_route_accepts_method() {
        let get = Route::new("/", "GET", 200, IndexMap::new(), "");
        assert!(get.accepts("GET"));
        assert!(get.accepts(""));
        assert!(!get.accepts("POST"));

        let post = Route::new("/", "POST", 200, IndexMap::new(), "");
        assert!(post.accepts("POST"));
        assert!(!post.accepts(""));
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = IndexMap::new();
        headers.insert("Content-Type".to_string(), "text/plain".to_string());
        let route = Route::new("/", "GET", 200, headers, "");
        assert_eq!(route.header("content-type"), Some("text/plain"));
        assert_eq!(route.header("x-missing"), None);
    }
}
