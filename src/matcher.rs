//! Response selection logic.
//!
//! Picks one candidate out of a route group for an inbound request body.

use crate::error::RouteError;
use crate::response::ResponseDefinition;
use memchr::memmem;
use regex::bytes::Regex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How a route group chooses among its candidates.
///
/// Serialized as the integers `0`, `1` and `2`. Numeric strings are accepted
/// on input as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ModeRepr", into = "u8")]
pub enum SelectionMode {
    /// Always the first candidate.
    Fixed,
    /// First candidate whose keyword occurs in the body.
    Keyword,
    /// First candidate whose pattern matches somewhere in the body.
    Pattern,
}

impl SelectionMode {
    pub fn as_u8(self) -> u8 {
        match self {
            SelectionMode::Fixed => 0,
            SelectionMode::Keyword => 1,
            SelectionMode::Pattern => 2,
        }
    }
}

impl TryFrom<i64> for SelectionMode {
    type Error = RouteError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SelectionMode::Fixed),
            1 => Ok(SelectionMode::Keyword),
            2 => Ok(SelectionMode::Pattern),
            other => Err(RouteError::UnknownMode(other)),
        }
    }
}

impl From<SelectionMode> for u8 {
    fn from(mode: SelectionMode) -> Self {
        mode.as_u8()
    }
}

/// Wire form of a mode: an integer or a numeric string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ModeRepr {
    Number(i64),
    Text(String),
}

impl ModeRepr {
    /// The mode number, if the value holds an integer.
    pub(crate) fn number(&self) -> Option<i64> {
        match self {
            ModeRepr::Number(n) => Some(*n),
            ModeRepr::Text(s) => s.trim().parse::<i64>().ok(),
        }
    }
}

impl TryFrom<ModeRepr> for SelectionMode {
    type Error = String;

    fn try_from(repr: ModeRepr) -> Result<Self, Self::Error> {
        let value = repr
            .number()
            .ok_or_else(|| format!("mode {:?} is not an integer", repr))?;
        SelectionMode::try_from(value).map_err(|e| e.to_string())
    }
}

/// Selection strategy for one route group.
///
/// Holds the compiled pattern of every admitted candidate, index-aligned with
/// the group's response list. Selection itself keeps no state between calls.
#[derive(Debug, Clone)]
pub struct Selector {
    mode: SelectionMode,
    /// `None` for candidates without a usable pattern, or outside pattern mode
    patterns: Vec<Option<Regex>>,
}

impl Selector {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            mode,
            patterns: Vec::new(),
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Prepare matching state for the next candidate in registration order.
    ///
    /// Fails when a pattern-mode candidate carries an expression that does not
    /// compile, so a bad pattern never reaches dispatch.
    pub fn admit(&mut self, candidate: &ResponseDefinition) -> Result<(), RouteError> {
        let compiled = match (self.mode, candidate.pattern()) {
            (SelectionMode::Pattern, Some(pattern)) if !pattern.is_empty() => {
                let regex = Regex::new(pattern).map_err(|e| RouteError::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: e.to_string(),
                })?;
                Some(regex)
            }
            _ => None,
        };
        self.patterns.push(compiled);
        Ok(())
    }

    /// Pick the first candidate that matches `body`, in registration order.
    pub fn select<'a>(
        &self,
        candidates: &'a [Arc<ResponseDefinition>],
        body: &[u8],
    ) -> Option<&'a Arc<ResponseDefinition>> {
        match self.mode {
            SelectionMode::Fixed => candidates.first(),
            SelectionMode::Keyword => candidates.iter().find(|candidate| {
                candidate
                    .keyword()
                    .map(|keyword| memmem::find(body, keyword.as_bytes()).is_some())
                    .unwrap_or(false)
            }),
            SelectionMode::Pattern => candidates
                .iter()
                .zip(&self.patterns)
                .find(|(_, pattern)| {
                    pattern
                        .as_ref()
                        .map(|regex| regex.is_match(body))
                        .unwrap_or(false)
                })
                .map(|(candidate, _)| candidate),
        }
    }
}
