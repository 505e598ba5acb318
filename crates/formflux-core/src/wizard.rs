//! The wizard shell: a thin, headless driver around the engine.
//!
//! Hosts describe each step as a title plus a render callback that
//! turns the current answers and errors into a view model. The shell
//! wires Back/Continue/Submit to the engine's validate-and-navigate
//! operations and hands the finished form to an injected
//! [`CompletionHandler`]. An in-flight guard rejects a navigation or
//! submission started while another is still pending; attempts are
//! never queued.

use crate::answers::FormAnswers;
use crate::engine::{FormEngine, SubmissionStatus};
use crate::schema::ErrorMap;
use async_trait::async_trait;
use serde_json::Value;

/// What the outside world returns for an accepted form.
#[derive(Debug, Clone, Default)]
pub struct CompletionSuccess {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone)]
pub enum CompletionError {
    /// The server judged individual fields; merged back into the
    /// engine's error map.
    Fields { errors: ErrorMap, message: String },
    /// Anything else the user can only retry.
    Message(String),
}

/// Seam for the final hand-off of a completed form.
#[async_trait]
pub trait CompletionHandler: Send + Sync {
    async fn complete(&self, answers: &FormAnswers)
    -> Result<CompletionSuccess, CompletionError>;
}

/// Render output for one step: a flat list of field view models the
/// host turns into widgets.
#[derive(Debug, Clone, Default)]
pub struct StepContent {
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone)]
pub struct FieldView {
    pub name: String,
    pub label: String,
    pub value: Value,
    pub error: Option<String>,
}

type RenderFn = Box<dyn Fn(&FormAnswers, &ErrorMap) -> StepContent + Send + Sync>;

pub struct StepDefinition {
    pub title: String,
    render: RenderFn,
}

impl StepDefinition {
    pub fn new(
        title: impl Into<String>,
        render: impl Fn(&FormAnswers, &ErrorMap) -> StepContent + Send + Sync + 'static,
    ) -> Self {
        Self {
            title: title.into(),
            render: Box::new(render),
        }
    }
}

/// Render-ready description of the active step.
#[derive(Debug, Clone)]
pub struct StepView {
    pub step_index: usize,
    pub total_steps: usize,
    pub title: String,
    pub content: StepContent,
    pub general_error: Option<String>,
    /// Back is hidden on the first step.
    pub can_go_back: bool,
    pub is_final_step: bool,
    /// True while a navigation or submission is in flight.
    pub controls_disabled: bool,
}

pub struct WizardShell {
    engine: FormEngine,
    steps: Vec<StepDefinition>,
    handler: Box<dyn CompletionHandler>,
    in_flight: bool,
}

impl WizardShell {
    pub fn new(
        engine: FormEngine,
        steps: Vec<StepDefinition>,
        handler: Box<dyn CompletionHandler>,
    ) -> Self {
        if steps.len() != engine.total_steps() {
            tracing::warn!(
                steps = steps.len(),
                engine_steps = engine.total_steps(),
                "step definitions do not match the engine's step count"
            );
        }
        Self {
            engine,
            steps,
            handler,
            in_flight: false,
        }
    }

    pub fn engine(&self) -> &FormEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut FormEngine {
        &mut self.engine
    }

    /// Renders the active step.
    pub fn view(&self) -> StepView {
        let index = self.engine.current_step();
        let total = self.engine.total_steps();
        let (title, content) = match self.steps.get(index) {
            Some(step) => (
                step.title.clone(),
                (step.render)(self.engine.answers(), self.engine.errors()),
            ),
            None => (String::new(), StepContent::default()),
        };
        StepView {
            step_index: index,
            total_steps: total,
            title,
            content,
            general_error: self.engine.general_error().map(str::to_string),
            can_go_back: index > 0,
            is_final_step: index + 1 == total,
            controls_disabled: self.in_flight
                || self.engine.submission_status() == SubmissionStatus::Submitting,
        }
    }

    pub async fn update_field(&mut self, field: &str, value: Value) {
        self.engine.update_field(field, value).await;
    }

    pub fn dismiss_error(&mut self) {
        self.engine.set_general_error(None);
    }

    /// Continue: validates the current step and advances on success.
    /// Returns whether the wizard moved.
    pub async fn proceed(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        let before = self.engine.current_step();
        self.engine.go_next().await;
        self.in_flight = false;
        self.engine.current_step() != before
    }

    /// Back: always allowed off the first step.
    pub async fn back(&mut self) -> bool {
        if self.in_flight {
            return false;
        }
        self.in_flight = true;
        let before = self.engine.current_step();
        self.engine.go_back().await;
        self.in_flight = false;
        self.engine.current_step() != before
    }

    /// Submit: full-schema sweep, then the completion hand-off. On
    /// success the engine is reset (clearing the snapshot) and the
    /// handler's result is returned; on rejection the server's field
    /// errors land in the engine's error map and `None` comes back.
    pub async fn submit(&mut self) -> Option<CompletionSuccess> {
        if self.in_flight || self.engine.submission_status() == SubmissionStatus::Submitting {
            return None;
        }
        self.in_flight = true;
        let outcome = self.run_submit().await;
        self.in_flight = false;
        outcome
    }

    async fn run_submit(&mut self) -> Option<CompletionSuccess> {
        if !self.engine.submit_form().await {
            return None;
        }

        self.engine.set_submission_status(SubmissionStatus::Submitting);
        match self.handler.complete(self.engine.answers()).await {
            Ok(success) => {
                tracing::info!("form submission accepted");
                self.engine.reset_form().await;
                self.engine.set_submission_status(SubmissionStatus::Success);
                Some(success)
            }
            Err(CompletionError::Fields { errors, message }) => {
                tracing::debug!(fields = errors.len(), "submission rejected per field");
                self.engine.merge_field_errors(&errors);
                self.engine.set_general_error(Some(message));
                self.engine.set_submission_status(SubmissionStatus::Idle);
                None
            }
            Err(CompletionError::Message(message)) => {
                self.engine.set_general_error(Some(message));
                self.engine.set_submission_status(SubmissionStatus::Idle);
                None
            }
        }
    }
}
