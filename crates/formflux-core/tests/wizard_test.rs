use async_trait::async_trait;
use formflux_core::answers::FormAnswers;
use formflux_core::engine::{FormEngine, FormEngineConfig, SubmissionStatus};
use formflux_core::schema::{Check, ErrorMap, FieldRule, StepSchema};
use formflux_core::store::MemoryStore;
use formflux_core::wizard::{
    CompletionError, CompletionHandler, CompletionSuccess, FieldView, StepContent,
    StepDefinition, WizardShell,
};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Clone)]
enum Script {
    Accept,
    RejectFields,
    RejectMessage,
}

struct ScriptedHandler {
    script: Script,
    calls: Arc<AtomicUsize>,
}

impl ScriptedHandler {
    fn new(script: Script) -> (Box<Self>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Box::new(Self {
                script,
                calls: calls.clone(),
            }),
            calls,
        )
    }
}

#[async_trait]
impl CompletionHandler for ScriptedHandler {
    async fn complete(
        &self,
        _answers: &FormAnswers,
    ) -> Result<CompletionSuccess, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.script {
            Script::Accept => Ok(CompletionSuccess {
                access_token: Some("access-token".to_string()),
                refresh_token: Some("refresh-token".to_string()),
            }),
            Script::RejectFields => Err(CompletionError::Fields {
                errors: ErrorMap::from([(
                    "x".to_string(),
                    "That value is already taken.".to_string(),
                )]),
                message: "The server rejected the form.".to_string(),
            }),
            Script::RejectMessage => Err(CompletionError::Message(
                "Something went wrong. Please try again.".to_string(),
            )),
        }
    }
}

fn config() -> FormEngineConfig {
    FormEngineConfig {
        session_key: "test-wizard".to_string(),
        defaults: FormAnswers::from_value(json!({ "x": "", "y": "" })),
        schemas: vec![
            Some(StepSchema::new(vec![FieldRule::new(
                "x",
                vec![Check::Required { message: "x is required." }],
            )])),
            Some(StepSchema::empty()),
            Some(StepSchema::empty()),
        ],
    }
}

fn steps() -> Vec<StepDefinition> {
    let field_step = |title: &str, field: &'static str| {
        StepDefinition::new(title, move |answers: &FormAnswers, errors: &ErrorMap| {
            StepContent {
                fields: vec![FieldView {
                    name: field.to_string(),
                    label: field.to_uppercase(),
                    value: answers.get(field).cloned().unwrap_or(json!(null)),
                    error: errors.get(field).cloned(),
                }],
            }
        })
    };
    vec![
        field_step("Details", "x"),
        field_step("Extras", "y"),
        StepDefinition::new("Review", |_, _| StepContent::default()),
    ]
}

async fn shell(script: Script) -> (WizardShell, Arc<AtomicUsize>) {
    let engine = FormEngine::new(config(), Arc::new(MemoryStore::new())).await;
    let (handler, calls) = ScriptedHandler::new(script);
    (WizardShell::new(engine, steps(), handler), calls)
}

#[tokio::test]
async fn test_view_describes_the_active_step() {
    let (shell, _) = shell(Script::Accept).await;
    let view = shell.view();
    assert_eq!(view.step_index, 0);
    assert_eq!(view.total_steps, 3);
    assert_eq!(view.title, "Details");
    assert_eq!(view.content.fields[0].name, "x");
    assert_eq!(view.content.fields[0].value, json!(""));
    assert!(view.content.fields[0].error.is_none());
    assert!(!view.can_go_back);
    assert!(!view.is_final_step);
    assert!(!view.controls_disabled);
}

#[tokio::test]
async fn test_proceed_blocked_until_step_is_valid() {
    let (mut shell, _) = shell(Script::Accept).await;
    assert!(!shell.proceed().await);

    let view = shell.view();
    assert_eq!(view.step_index, 0);
    assert!(view.general_error.is_some());
    assert_eq!(
        view.content.fields[0].error.as_deref(),
        Some("x is required.")
    );

    shell.update_field("x", json!("filled")).await;
    assert!(shell.proceed().await);
    let view = shell.view();
    assert_eq!(view.step_index, 1);
    assert_eq!(view.title, "Extras");
    assert!(view.can_go_back);
}

#[tokio::test]
async fn test_back_returns_without_validation() {
    let (mut shell, _) = shell(Script::Accept).await;
    assert!(!shell.back().await, "back is a no-op on the first step");

    shell.update_field("x", json!("filled")).await;
    shell.proceed().await;
    shell.update_field("x", json!("")).await;
    assert!(shell.back().await, "invalid answers never block retreat");
    assert_eq!(shell.view().step_index, 0);
}

#[tokio::test]
async fn test_dismiss_error_clears_the_banner() {
    let (mut shell, _) = shell(Script::Accept).await;
    shell.proceed().await;
    assert!(shell.view().general_error.is_some());
    shell.dismiss_error();
    assert!(shell.view().general_error.is_none());
}

#[tokio::test]
async fn test_submit_success_resets_the_wizard() {
    let (mut shell, calls) = shell(Script::Accept).await;
    shell.update_field("x", json!("filled")).await;

    let success = shell.submit().await.expect("submission should succeed");
    assert_eq!(success.access_token.as_deref(), Some("access-token"));
    assert_eq!(success.refresh_token.as_deref(), Some("refresh-token"));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        shell.engine().submission_status(),
        SubmissionStatus::Success
    );
    assert_eq!(shell.view().step_index, 0);
    assert_eq!(shell.engine().answers().get_str("x"), Some(""));
}

#[tokio::test]
async fn test_submit_with_invalid_step_never_reaches_the_handler() {
    let (mut shell, calls) = shell(Script::Accept).await;
    assert!(shell.submit().await.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(shell.view().step_index, 0);
}

#[tokio::test]
async fn test_server_field_rejection_lands_in_the_error_map() {
    let (mut shell, calls) = shell(Script::RejectFields).await;
    shell.update_field("x", json!("filled")).await;

    assert!(shell.submit().await.is_none());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(shell.engine().submission_status(), SubmissionStatus::Idle);
    let view = shell.view();
    assert_eq!(
        view.general_error.as_deref(),
        Some("The server rejected the form.")
    );
    assert_eq!(
        view.content.fields[0].error.as_deref(),
        Some("That value is already taken.")
    );
    // Answers are kept so the user can correct and resubmit.
    assert_eq!(shell.engine().answers().get_str("x"), Some("filled"));
}

#[tokio::test]
async fn test_server_message_rejection_sets_only_the_banner() {
    let (mut shell, _) = shell(Script::RejectMessage).await;
    shell.update_field("x", json!("filled")).await;

    assert!(shell.submit().await.is_none());
    let view = shell.view();
    assert_eq!(
        view.general_error.as_deref(),
        Some("Something went wrong. Please try again.")
    );
    assert!(view.content.fields[0].error.is_none());
}

#[tokio::test]
async fn test_controls_disabled_while_submitting() {
    let (mut shell, _) = shell(Script::Accept).await;
    shell
        .engine_mut()
        .set_submission_status(SubmissionStatus::Submitting);
    assert!(shell.view().controls_disabled);
    assert!(shell.submit().await.is_none(), "reentrant submit is rejected");
}
