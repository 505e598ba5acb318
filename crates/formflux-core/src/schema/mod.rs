//! Declarative per-step validation.
//!
//! A [`StepSchema`] describes the rules of one wizard step and is
//! evaluated against the *whole* answer bag, so rules may reference
//! nested paths (`address.street`) and other fields (confirm password).
//! Evaluation collects every failure in one pass; it never
//! short-circuits, so the UI can mark all invalid fields at once.

use crate::answers::FormAnswers;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub mod registration;

/// A single field failure: dot-separated path plus a human message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub path: String,
    pub message: String,
}

/// Field path -> message. A path absent from the map is currently
/// valid; any present key blocks advancing past the owning step.
pub type ErrorMap = BTreeMap<String, String>;

pub fn merge_errors(map: &mut ErrorMap, errors: &[FieldError]) {
    for error in errors {
        map.insert(error.path.clone(), error.message.clone());
    }
}

/// Capability seam for step validation. Any engine can drive any
/// validator that judges a full answer bag.
pub trait Validator: Send + Sync {
    /// Empty result means the answers satisfy this validator.
    fn validate(&self, answers: &FormAnswers) -> Vec<FieldError>;
}

/// One declarative rule a field value must satisfy.
///
/// Format checks (`Email`, `Url`, `Matches`, `MinLen`) skip blank
/// values: optional fields only validate once filled. `Required`
/// carries the presence semantics.
#[derive(Debug, Clone)]
pub enum Check {
    Required { message: &'static str },
    /// The value must be a JSON object. When this fails, rules nested
    /// under the path are suppressed for the pass, so an entirely
    /// missing sub-object reports one parent-level message.
    ObjectRequired { message: &'static str },
    NumberRequired { message: &'static str },
    Email { message: &'static str },
    Url { message: &'static str },
    Matches { pattern: &'static Lazy<Regex>, message: &'static str },
    MinLen { min: usize, message: &'static str },
    MinItems { min: usize, message: &'static str },
    /// Cross-field equality, evaluated only when both sides are present.
    EqualsField { other: &'static str, message: &'static str },
    MustBeTrue { message: &'static str },
}

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

impl Check {
    fn apply(&self, path: &str, value: Option<&Value>, answers: &FormAnswers) -> Option<FieldError> {
        let fail = |message: &str| {
            Some(FieldError {
                path: path.to_string(),
                message: message.to_string(),
            })
        };

        match self {
            Check::Required { message } => {
                if is_blank(value) {
                    fail(message)
                } else {
                    None
                }
            }
            Check::ObjectRequired { message } => match value {
                Some(Value::Object(_)) => None,
                _ => fail(message),
            },
            Check::NumberRequired { message } => match value {
                Some(Value::Number(_)) => None,
                _ => fail(message),
            },
            Check::Email { message } => match non_blank_str(value) {
                None => None,
                Some(s) if EMAIL_RE.is_match(s) => None,
                Some(_) => fail(message),
            },
            Check::Url { message } => match non_blank_str(value) {
                None => None,
                Some(s) if url::Url::parse(s).is_ok() => None,
                Some(_) => fail(message),
            },
            Check::Matches { pattern, message } => match non_blank_str(value) {
                None => None,
                Some(s) if pattern.is_match(s) => None,
                Some(_) => fail(message),
            },
            Check::MinLen { min, message } => match non_blank_str(value) {
                None => None,
                Some(s) if s.chars().count() >= *min => None,
                Some(_) => fail(message),
            },
            Check::MinItems { min, message } => {
                let len = value.and_then(Value::as_array).map_or(0, Vec::len);
                if len < *min { fail(message) } else { None }
            }
            Check::EqualsField { other, message } => {
                match (non_blank(value), non_blank(answers.get(other))) {
                    (Some(a), Some(b)) if a != b => fail(message),
                    _ => None,
                }
            }
            Check::MustBeTrue { message } => match value {
                Some(Value::Bool(true)) => None,
                _ => fail(message),
            },
        }
    }
}

/// All checks attached to one field path.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub path: &'static str,
    pub checks: Vec<Check>,
}

impl FieldRule {
    pub fn new(path: &'static str, checks: Vec<Check>) -> Self {
        Self { path, checks }
    }
}

/// The declarative rule set of a single wizard step.
#[derive(Debug, Clone, Default)]
pub struct StepSchema {
    rules: Vec<FieldRule>,
}

impl StepSchema {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    /// A schema with no rules: the step is always valid.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The field paths this schema owns, used to scope error clearing
    /// to a single step.
    pub fn owned_paths(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules.iter().map(|rule| rule.path)
    }
}

impl Validator for StepSchema {
    fn validate(&self, answers: &FormAnswers) -> Vec<FieldError> {
        let mut errors: Vec<FieldError> = Vec::new();
        for rule in &self.rules {
            // A failed parent object suppresses its children this pass.
            let suppressed = errors
                .iter()
                .any(|e| rule.path.starts_with(&format!("{}.", e.path)));
            if suppressed {
                continue;
            }

            let value = answers.get(rule.path);
            for check in &rule.checks {
                if let Some(error) = check.apply(rule.path, value, answers) {
                    errors.push(error);
                }
            }
        }
        errors
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        _ => false,
    }
}

fn non_blank(value: Option<&Value>) -> Option<&Value> {
    if is_blank(value) { None } else { value }
}

fn non_blank_str(value: Option<&Value>) -> Option<&str> {
    non_blank(value)?.as_str()
}
