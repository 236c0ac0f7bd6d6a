//! Canned response definitions and route identities.

use std::borrow::Borrow;
use std::fmt;

/// Body served by the built-in routes.
pub const WELCOME_BODY: &str = "Welcome to mocker!";

/// Key joining a path and an upper-cased method: `"{path} | {METHOD}"`.
///
/// The exact string form is what lookups compare against, so both the
/// registry and the dispatch side must build it through [`RouteId::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(String);

impl RouteId {
    pub fn new(path: &str, method: &str) -> Self {
        Self(format!("{} | {}", path, method.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RouteId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// One candidate reply registered under a route.
///
/// Built with the `with_*` methods and immutable afterwards: there are no
/// setters, and the route path and method are fixed by [`ResponseDefinition::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDefinition {
    route_path: String,
    route_method: String,
    body: String,
    status: u16,
    content_type: Option<String>,
    headers: Vec<(String, String)>,
    keyword: Option<String>,
    pattern: Option<String>,
}

impl ResponseDefinition {
    /// Create an empty `200` response for the given route.
    pub fn new(path: impl Into<String>, method: &str) -> Self {
        Self {
            route_path: path.into(),
            route_method: method.to_uppercase(),
            body: String::new(),
            status: 200,
            content_type: None,
            headers: Vec::new(),
            keyword: None,
            pattern: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Set a header, replacing any existing header whose name differs only by case.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let value = value.into();
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(&name))
        {
            Some(slot) => *slot = (name, value),
            None => self.headers.push((name, value)),
        }
        self
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn route_id(&self) -> RouteId {
        RouteId::new(&self.route_path, &self.route_method)
    }

    pub fn path(&self) -> &str {
        &self.route_path
    }

    pub fn method(&self) -> &str {
        &self.route_method
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Headers in the order they were first set.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref()
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }
}
