//! Configuration for the mocker server.
//!
//! Holds the server settings loaded from YAML and the route payloads accepted
//! by the `/create`, `/import` and `/export` endpoints.

use crate::error::ConfigError;
use crate::group::RouteGroup;
use crate::matcher::{ModeRepr, SelectionMode};
use crate::response::ResponseDefinition;
use axum::http::{HeaderName, HeaderValue, Method};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Fields a route payload must carry.
const REQUIRED_FIELDS: [&str; 4] = ["path", "method", "mode", "responses"];

/// Main configuration for the mocker server.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MockerConfig {
    /// Global settings
    #[serde(default)]
    pub settings: GlobalSettings,

    /// Routes registered at startup
    #[serde(default)]
    pub routes: Vec<RoutePayload>,
}

impl MockerConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration by building every route without registering it.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.settings.max_body_bytes == 0 {
            anyhow::bail!("settings.max_body_bytes must be greater than zero");
        }
        HeaderValue::from_str(&self.settings.default_content_type).map_err(|e| {
            anyhow::anyhow!(
                "Invalid default_content_type {:?}: {}",
                self.settings.default_content_type,
                e
            )
        })?;
        for (i, route) in self.routes.iter().enumerate() {
            route
                .to_group()
                .map_err(|e| anyhow::anyhow!("Route {} ({} {}): {}", i, route.method, route.path, e))?;
        }
        Ok(())
    }
}

/// Global settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalSettings {
    /// Log every request that matched a registered response
    #[serde(default = "default_true")]
    pub log_matches: bool,

    /// Log requests answered with the default response
    #[serde(default = "default_true")]
    pub log_unmatched: bool,

    /// Content type for responses that set none
    #[serde(default = "default_content_type")]
    pub default_content_type: String,

    /// Largest request body read for matching
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            log_matches: true,
            log_unmatched: true,
            default_content_type: default_content_type(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_content_type() -> String {
    "text/html; charset=utf-8".to_string()
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// A route registration: what `/create` accepts and `/export` emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePayload {
    pub path: String,
    pub method: String,
    pub mode: SelectionMode,
    pub responses: Vec<ResponsePayload>,
}

/// One candidate response inside a [`RoutePayload`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponsePayload {
    #[serde(default = "default_content")]
    pub content: String,

    #[serde(default)]
    pub content_type: Option<String>,

    #[serde(default = "default_status")]
    pub status_code: u16,

    /// Trigger substring for keyword mode
    #[serde(default)]
    pub keyword: Option<String>,

    /// Trigger expression for pattern mode
    #[serde(default)]
    pub regular: Option<String>,

    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
}

fn default_content() -> String {
    "hello world".to_string()
}

fn default_status() -> u16 {
    200
}

impl RoutePayload {
    /// Read a route payload out of a JSON value without modifying it.
    ///
    /// Missing fields are reported before type problems, and an empty
    /// response list after both.
    pub fn from_json(value: &Value) -> Result<Self, ConfigError> {
        let object = value
            .as_object()
            .ok_or_else(|| ConfigError::InvalidRequest("expected a JSON object".to_string()))?;

        for field in REQUIRED_FIELDS {
            if !object.contains_key(field) {
                return Err(ConfigError::MissingField(field));
            }
        }

        mode_from_json(&object["mode"])?;

        let payload = RoutePayload::deserialize(value)
            .map_err(|e| ConfigError::InvalidRequest(e.to_string()))?;
        if payload.responses.is_empty() {
            return Err(ConfigError::EmptyResponse);
        }
        Ok(payload)
    }

    /// Build the route group this payload describes.
    pub fn to_group(&self) -> Result<RouteGroup, ConfigError> {
        if self.responses.is_empty() {
            return Err(ConfigError::EmptyResponse);
        }
        if !self.path.starts_with('/') {
            return Err(ConfigError::InvalidRequest(format!(
                "path {:?} must start with '/'",
                self.path
            )));
        }
        Method::from_bytes(self.method.as_bytes()).map_err(|_| {
            ConfigError::InvalidRequest(format!("method {:?} is not a valid HTTP method", self.method))
        })?;

        let definitions = self
            .responses
            .iter()
            .map(|response| response.to_definition(&self.path, &self.method))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RouteGroup::from_responses(definitions, self.mode)?)
    }

    /// Describe a registered group in payload form.
    pub fn from_group(group: &RouteGroup) -> Self {
        Self {
            path: group.path().to_string(),
            method: group.method().to_string(),
            mode: group.mode(),
            responses: group
                .responses()
                .iter()
                .map(|def| ResponsePayload::from_definition(def))
                .collect(),
        }
    }
}

impl ResponsePayload {
    fn to_definition(&self, path: &str, method: &str) -> Result<ResponseDefinition, ConfigError> {
        if !(100..=599).contains(&self.status_code) {
            return Err(ConfigError::InvalidStatus(self.status_code));
        }

        let mut definition = ResponseDefinition::new(path, method)
            .with_body(self.content.as_str())
            .with_status(self.status_code);

        if let Some(content_type) = &self.content_type {
            check_header("Content-Type", content_type)?;
            definition = definition.with_content_type(content_type.as_str());
        }
        if let Some(keyword) = &self.keyword {
            definition = definition.with_keyword(keyword.as_str());
        }
        if let Some(regular) = &self.regular {
            definition = definition.with_pattern(regular.as_str());
        }
        for (name, value) in self.headers.iter().flatten() {
            check_header(name, value)?;
            definition = definition.with_header(name.as_str(), value.as_str());
        }

        Ok(definition)
    }

    fn from_definition(definition: &ResponseDefinition) -> Self {
        Self {
            content: definition.body().to_string(),
            content_type: definition.content_type().map(String::from),
            status_code: definition.status(),
            keyword: definition.keyword().map(String::from),
            regular: definition.pattern().map(String::from),
            headers: Some(
                definition
                    .headers()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
        }
    }
}

/// Document produced by `/export`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    /// Export time as an HTTP date
    pub date: String,
    pub data: Vec<RoutePayload>,
}

impl ExportDocument {
    pub fn new(data: Vec<RoutePayload>) -> Self {
        Self {
            date: chrono::Utc::now()
                .format("%a, %d %b %Y %H:%M:%S GMT")
                .to_string(),
            data,
        }
    }
}

/// Pull the route entries out of an `/import` document.
pub fn import_entries(document: &Value) -> Result<&[Value], ConfigError> {
    match document.get("data") {
        Some(Value::Array(entries)) if !entries.is_empty() => Ok(entries),
        Some(Value::Array(_)) => Err(ConfigError::ImportFailed("data is empty".to_string())),
        Some(_) => Err(ConfigError::ImportFailed("data must be a list".to_string())),
        None => Err(ConfigError::ImportFailed("data is missing".to_string())),
    }
}

/// Unknown mode numbers and non-integer values are reported separately.
fn mode_from_json(value: &Value) -> Result<SelectionMode, ConfigError> {
    let raw = ModeRepr::deserialize(value)
        .ok()
        .and_then(|repr| repr.number())
        .ok_or_else(|| ConfigError::InvalidRequest(format!("mode {} is not an integer", value)))?;

    Ok(SelectionMode::try_from(raw)?)
}

fn check_header(name: &str, value: &str) -> Result<(), ConfigError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|e| ConfigError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}
