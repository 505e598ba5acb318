//! The form state engine: the single owner of all wizard state.
//!
//! Forward navigation is gated on validating the step being left;
//! retreating is always allowed. After every change to the persisted
//! subset of state a snapshot goes through the injected
//! [`SnapshotStore`]; persistence failures are logged and swallowed so
//! the wizard keeps working from memory.

use crate::answers::FormAnswers;
use crate::events::{EngineEvent, EngineEventBus};
use crate::schema::{self, ErrorMap, StepSchema, Validator};
use crate::store::{Snapshot, SnapshotStore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Idle,
    Submitting,
    Success,
    Error,
}

/// Direction of the last navigation, kept for transition animations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationDirection {
    Forward,
    Back,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordStrength {
    Weak,
    Fair,
    Strong,
}

/// Scores a password by character classes present (uppercase,
/// lowercase, digit, special). Anything under 8 characters is weak
/// regardless of mix.
pub fn password_strength(password: &str) -> PasswordStrength {
    if password.chars().count() < 8 {
        return PasswordStrength::Weak;
    }
    let classes = [
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_alphanumeric()),
    ];
    match classes.iter().filter(|present| **present).count() {
        n if n >= 3 => PasswordStrength::Strong,
        2 => PasswordStrength::Fair,
        _ => PasswordStrength::Weak,
    }
}

/// Everything a flow needs to run: where snapshots live, the default
/// answer set, and one schema slot per step. A `None` slot means the
/// step is always valid.
pub struct FormEngineConfig {
    pub session_key: String,
    pub defaults: FormAnswers,
    pub schemas: Vec<Option<StepSchema>>,
}

struct EngineState {
    current_step: usize,
    answers: FormAnswers,
    errors: ErrorMap,
    general_error: Option<String>,
    visited_steps: BTreeSet<usize>,
    step_validity: Vec<bool>,
    submission_status: SubmissionStatus,
    navigation_history: Vec<usize>,
    navigation_direction: Option<NavigationDirection>,
}

impl EngineState {
    fn fresh(config: &FormEngineConfig) -> Self {
        Self {
            current_step: 0,
            answers: config.defaults.clone(),
            errors: ErrorMap::new(),
            general_error: None,
            visited_steps: BTreeSet::from([0]),
            step_validity: vec![false; config.schemas.len()],
            submission_status: SubmissionStatus::Idle,
            navigation_history: vec![0],
            navigation_direction: None,
        }
    }
}

/// The engine instance. Constructed once per wizard mount; all
/// mutations are funneled through its operations, invoked serially by
/// the host, so there is exactly one writer at a time.
pub struct FormEngine {
    config: FormEngineConfig,
    store: Arc<dyn SnapshotStore>,
    events: EngineEventBus,
    state: EngineState,
}

impl FormEngine {
    /// Builds the engine, seeding state from a persisted snapshot when
    /// one exists under the configured session key. Snapshot answers
    /// are deep-merged over the defaults so fields added after the
    /// snapshot was written still get their defaults.
    pub async fn new(config: FormEngineConfig, store: Arc<dyn SnapshotStore>) -> Self {
        let snapshot = load_snapshot(&*store, &config.session_key).await;
        let mut state = EngineState::fresh(&config);

        if let Some(snapshot) = snapshot {
            let last = config.schemas.len().saturating_sub(1);
            state.current_step = snapshot.current_step.min(last);
            state.answers = FormAnswers::deep_merge(&config.defaults, snapshot.form_data);
            if !snapshot.navigation_history.is_empty() {
                state.navigation_history = snapshot.navigation_history;
            }
            if !snapshot.visited_steps.is_empty() {
                state.visited_steps = snapshot.visited_steps.into_iter().collect();
            }
        }

        Self {
            config,
            store,
            events: EngineEventBus::new(64),
            state,
        }
    }

    // =====================================================================
    // Read access
    // =====================================================================

    pub fn total_steps(&self) -> usize {
        self.config.schemas.len()
    }

    pub fn current_step(&self) -> usize {
        self.state.current_step
    }

    pub fn answers(&self) -> &FormAnswers {
        &self.state.answers
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.state.errors
    }

    pub fn general_error(&self) -> Option<&str> {
        self.state.general_error.as_deref()
    }

    pub fn visited_steps(&self) -> &BTreeSet<usize> {
        &self.state.visited_steps
    }

    pub fn step_validity(&self) -> &[bool] {
        &self.state.step_validity
    }

    pub fn submission_status(&self) -> SubmissionStatus {
        self.state.submission_status
    }

    pub fn navigation_history(&self) -> &[usize] {
        &self.state.navigation_history
    }

    pub fn navigation_direction(&self) -> Option<NavigationDirection> {
        self.state.navigation_direction
    }

    pub fn is_current_step_valid(&self) -> bool {
        self.state
            .step_validity
            .get(self.state.current_step)
            .copied()
            .unwrap_or(false)
    }

    pub fn can_go_next(&self) -> bool {
        self.state.current_step + 1 < self.total_steps()
    }

    pub fn can_go_back(&self) -> bool {
        self.state.current_step > 0
    }

    pub fn password_strength(&self) -> PasswordStrength {
        password_strength(self.state.answers.get_str("password").unwrap_or(""))
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<EngineEvent> {
        self.events.subscribe()
    }

    // =====================================================================
    // Answer updates
    // =====================================================================

    /// Merges one key into the answers. Clears that field's error and
    /// invalidates the current and every later step: a change early in
    /// the flow must not leave later steps marked valid from stale data.
    pub async fn update_field(&mut self, field: &str, value: Value) {
        self.state.answers.set(field, value);
        self.state.errors.remove(field);
        self.invalidate_from(self.state.current_step);
        self.state.general_error = None;
        self.persist().await;
    }

    /// Replaces the whole answer set. Bulk replace implies a full step
    /// reset, so every field error is cleared, not just one.
    pub async fn set_answers(&mut self, answers: FormAnswers) {
        self.state.answers = answers;
        self.after_bulk_change().await;
    }

    /// Bulk update through a closure over the current answers. Same
    /// invalidation and error-clearing rules as [`Self::set_answers`].
    pub async fn update_answers(&mut self, update: impl FnOnce(&mut FormAnswers)) {
        update(&mut self.state.answers);
        self.after_bulk_change().await;
    }

    async fn after_bulk_change(&mut self) {
        self.state.errors.clear();
        self.invalidate_from(self.state.current_step);
        self.state.general_error = None;
        self.persist().await;
    }

    /// Merges externally produced field errors (e.g. server-side
    /// rejection) into the error map.
    pub fn merge_field_errors(&mut self, errors: &ErrorMap) {
        for (path, message) in errors {
            self.state.errors.insert(path.clone(), message.clone());
        }
    }

    pub fn set_general_error(&mut self, message: Option<String>) {
        self.state.general_error = message;
    }

    pub fn set_submission_status(&mut self, status: SubmissionStatus) {
        if self.state.submission_status != status {
            self.state.submission_status = status;
            self.events.emit(EngineEvent::SubmissionStatus { status });
        }
    }

    // =====================================================================
    // Validation
    // =====================================================================

    /// Validates one step against the current answers. A step without a
    /// schema is always valid. Success clears the errors the schema
    /// owns; failure merges the field errors and raises a step-level
    /// general error.
    #[tracing::instrument(skip(self))]
    pub async fn validate_step(&mut self, step: usize) -> bool {
        self.state.general_error = None;

        let Some(schema) = self.config.schemas.get(step).and_then(Option::as_ref) else {
            if let Some(valid) = self.state.step_validity.get_mut(step) {
                *valid = true;
            }
            return true;
        };

        let failures = schema.validate(&self.state.answers);
        if failures.is_empty() {
            let owned: Vec<&str> = schema.owned_paths().collect();
            self.state.errors.retain(|path, _| {
                !owned
                    .iter()
                    .any(|p| path.as_str() == *p || path.starts_with(&format!("{p}.")))
            });
            if let Some(valid) = self.state.step_validity.get_mut(step) {
                *valid = true;
            }
            true
        } else {
            tracing::debug!(step, failures = failures.len(), "step validation failed");
            let error_count = failures.len();
            schema::merge_errors(&mut self.state.errors, &failures);
            self.state.general_error =
                Some(format!("Please correct the errors in Step {}.", step + 1));
            if let Some(valid) = self.state.step_validity.get_mut(step) {
                *valid = false;
            }
            self.events
                .emit(EngineEvent::ValidationFailed { step, error_count });
            false
        }
    }

    // =====================================================================
    // Navigation
    // =====================================================================

    /// Moves to `target`. Out-of-range targets and the current step are
    /// no-ops. A forward move first validates the step being left and
    /// aborts when it fails; retreating never validates.
    pub async fn go_to_step(&mut self, target: usize, direction: NavigationDirection) {
        if target >= self.total_steps() || target == self.state.current_step {
            return;
        }

        if direction == NavigationDirection::Forward
            && target > self.state.current_step
            && !self.validate_step(self.state.current_step).await
        {
            return;
        }

        let from = self.state.current_step;
        self.state.current_step = target;
        self.state.visited_steps.insert(target);
        self.state.navigation_history.push(target);
        self.state.navigation_direction = Some(direction);
        self.state.general_error = None;
        self.events.emit(EngineEvent::StepChanged {
            from,
            to: target,
            direction,
        });
        self.persist().await;
    }

    pub async fn go_next(&mut self) {
        if self.can_go_next() {
            self.go_to_step(self.state.current_step + 1, NavigationDirection::Forward)
                .await;
        }
    }

    /// Retreats one step, unconditionally. No validity is required to
    /// go back.
    pub async fn go_back(&mut self) {
        if self.state.current_step == 0 {
            return;
        }
        let from = self.state.current_step;
        self.state.current_step -= 1;
        self.state.navigation_history.push(self.state.current_step);
        self.state.navigation_direction = Some(NavigationDirection::Back);
        self.state.general_error = None;
        self.events.emit(EngineEvent::StepChanged {
            from,
            to: self.state.current_step,
            direction: NavigationDirection::Back,
        });
        self.persist().await;
    }

    // =====================================================================
    // Submission & reset
    // =====================================================================

    /// Validates every step with a schema, in order. Stops at the first
    /// failure, jumps the wizard there, and returns false; later steps
    /// are not evaluated. Returns true when every step passes.
    #[tracing::instrument(skip(self))]
    pub async fn submit_form(&mut self) -> bool {
        self.set_submission_status(SubmissionStatus::Submitting);
        self.state.general_error = None;

        for step in 0..self.total_steps() {
            let has_schema = self
                .config
                .schemas
                .get(step)
                .is_some_and(|slot| slot.is_some());
            if !has_schema {
                continue;
            }
            if !self.validate_step(step).await {
                let from = self.state.current_step;
                self.state.current_step = step;
                self.state.navigation_direction = Some(if step < from {
                    NavigationDirection::Back
                } else {
                    NavigationDirection::Forward
                });
                self.set_submission_status(SubmissionStatus::Idle);
                self.state.general_error = Some(format!(
                    "Please correct the errors in Step {} before submitting.",
                    step + 1
                ));
                if from != step {
                    self.events.emit(EngineEvent::StepChanged {
                        from,
                        to: step,
                        direction: self.state.navigation_direction.unwrap_or(NavigationDirection::Back),
                    });
                }
                self.persist().await;
                return false;
            }
        }

        self.set_submission_status(SubmissionStatus::Idle);
        true
    }

    /// Clears the persisted snapshot and reinitializes every piece of
    /// state to the configured defaults.
    pub async fn reset_form(&mut self) {
        if let Err(e) = self.store.remove(&self.config.session_key).await {
            tracing::warn!(error = %e, "failed to clear persisted form snapshot");
        }
        self.state = EngineState::fresh(&self.config);
    }

    // =====================================================================
    // Persistence
    // =====================================================================

    fn invalidate_from(&mut self, step: usize) {
        for valid in self.state.step_validity.iter_mut().skip(step) {
            *valid = false;
        }
    }

    async fn persist(&self) {
        let snapshot = Snapshot {
            current_step: self.state.current_step,
            form_data: self.state.answers.clone(),
            navigation_history: self.state.navigation_history.clone(),
            visited_steps: self.state.visited_steps.iter().copied().collect(),
        };
        match serde_json::to_string(&snapshot) {
            Ok(raw) => {
                if let Err(e) = self.store.put(&self.config.session_key, &raw).await {
                    tracing::warn!(error = %e, "failed to persist form snapshot");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize form snapshot"),
        }
    }
}

async fn load_snapshot(store: &dyn SnapshotStore, key: &str) -> Option<Snapshot> {
    match store.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse persisted form snapshot");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, "failed to read persisted form snapshot");
            None
        }
    }
}
