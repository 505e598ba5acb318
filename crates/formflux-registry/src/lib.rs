//! Registration collaborator.
//!
//! Flattens a finished answer bag into the backend wire shape, posts
//! it to the registration endpoint, and maps the response back into
//! either a token pair or the engine's error-map format. Implements
//! the core [`CompletionHandler`] so a wizard shell can drive it
//! directly.

use async_trait::async_trait;
use formflux_core::answers::FormAnswers;
use formflux_core::schema::ErrorMap;
use formflux_core::wizard::{CompletionError, CompletionHandler, CompletionSuccess};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;

pub const REGISTER_ROUTE: &str = "/auth/register-business/";

/// Tokens the backend hands out for a freshly registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    /// The server rejected the payload with per-field messages.
    #[error("registration rejected: {general}")]
    Rejected {
        fields: HashMap<String, Vec<String>>,
        general: String,
    },
    #[error("registration request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response from registration endpoint: {0}")]
    Unexpected(String),
}

/// Flattened wire payload: business + user + address fields with
/// blank values stripped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RegistrationPayload(Map<String, Value>);

impl RegistrationPayload {
    /// Maps the answer bag onto the backend's field names. Empty
    /// strings, nulls, and empty containers are dropped entirely.
    pub fn from_answers(answers: &FormAnswers) -> Self {
        const FIELD_MAP: &[(&str, &str)] = &[
            ("email", "email"),
            ("password", "password"),
            ("name", "first_name"),
            ("lastName", "last_name"),
            ("phone", "phone"),
            ("businessName", "business_name"),
            ("businessEmail", "business_email"),
            ("businessPhone", "business_phone"),
            ("businessDescription", "business_description"),
        ];

        let mut map = Map::new();
        for (source, target) in FIELD_MAP {
            if let Some(value) = answers.get(source) {
                if !is_blank(value) {
                    map.insert((*target).to_string(), value.clone());
                }
            }
        }

        if let Some(Value::Object(address)) = answers.get("address") {
            let stripped: Map<String, Value> = address
                .iter()
                .filter(|(_, v)| !is_blank(v))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            if !stripped.is_empty() {
                map.insert("address".to_string(), Value::Object(stripped));
            }
        }

        Self(map)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Joins per-field server messages into the engine's error-map shape.
pub fn field_errors(fields: &HashMap<String, Vec<String>>) -> ErrorMap {
    fields
        .iter()
        .map(|(field, messages)| (field.clone(), messages.join(" ")))
        .collect()
}

#[derive(Clone, Debug)]
pub struct RegistrationClient {
    http: reqwest::Client,
    base_url: String,
}

impl RegistrationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap();
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { http, base_url }
    }

    /// Posts the payload to the registration endpoint. A 2xx response
    /// must carry the token pair; any other status is mapped to a
    /// structured rejection.
    #[tracing::instrument(skip(self, payload))]
    pub async fn register(
        &self,
        payload: &RegistrationPayload,
    ) -> Result<TokenPair, RegistrationError> {
        let url = format!("{}{}", self.base_url, REGISTER_ROUTE);
        let response = self.http.post(&url).json(payload).send().await?;
        let status = response.status();

        if status.is_success() {
            let body: Value = response.json().await?;
            let access = body.get("access").and_then(Value::as_str);
            let refresh = body.get("refresh").and_then(Value::as_str);
            match (access, refresh) {
                (Some(access), Some(refresh)) => Ok(TokenPair {
                    access: access.to_string(),
                    refresh: refresh.to_string(),
                }),
                _ => Err(RegistrationError::Unexpected(
                    "success response is missing the token pair".to_string(),
                )),
            }
        } else {
            let body: Value = response.json().await.unwrap_or(Value::Null);
            tracing::debug!(status = status.as_u16(), "registration rejected");
            Err(rejection_from_body(status.as_u16(), body))
        }
    }
}

fn rejection_from_body(status: u16, body: Value) -> RegistrationError {
    let fallback = format!("Registration failed with status {status}. Please try again.");
    match body {
        Value::Object(map) => {
            let mut fields = HashMap::new();
            let mut parts = Vec::new();
            for (field, value) in &map {
                let messages: Vec<String> = match value {
                    Value::Array(items) => items
                        .iter()
                        .map(|m| m.as_str().map(str::to_string).unwrap_or_else(|| m.to_string()))
                        .collect(),
                    other => vec![
                        other
                            .as_str()
                            .map(str::to_string)
                            .unwrap_or_else(|| other.to_string()),
                    ],
                };
                parts.push(messages.join(" "));
                fields.insert(field.clone(), messages);
            }
            let general = if parts.is_empty() { fallback } else { parts.join(" ") };
            RegistrationError::Rejected { fields, general }
        }
        Value::String(general) => RegistrationError::Rejected {
            fields: HashMap::new(),
            general,
        },
        _ => RegistrationError::Rejected {
            fields: HashMap::new(),
            general: fallback,
        },
    }
}

#[async_trait]
impl CompletionHandler for RegistrationClient {
    async fn complete(
        &self,
        answers: &FormAnswers,
    ) -> Result<CompletionSuccess, CompletionError> {
        let payload = RegistrationPayload::from_answers(answers);
        match self.register(&payload).await {
            Ok(tokens) => Ok(CompletionSuccess {
                access_token: Some(tokens.access),
                refresh_token: Some(tokens.refresh),
            }),
            Err(RegistrationError::Rejected { fields, general }) => {
                Err(CompletionError::Fields {
                    errors: field_errors(&fields),
                    message: general,
                })
            }
            Err(e) => {
                tracing::error!(error = %e, "registration request failed");
                Err(CompletionError::Message(
                    "Registration failed. Please try again.".to_string(),
                ))
            }
        }
    }
}
