use crate::engine::{NavigationDirection, SubmissionStatus};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Observable engine transitions.
///
/// Broadcast on every state-machine transition so hosts can drive
/// progress indicators, transition animations, or telemetry without
/// polling the engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EngineEvent {
    /// The active step changed, by navigation or a submit redirect.
    StepChanged {
        from: usize,
        to: usize,
        direction: NavigationDirection,
    },
    /// A step schema rejected the current answers.
    ValidationFailed { step: usize, error_count: usize },
    /// Submission status moved between idle/submitting/success/error.
    SubmissionStatus { status: SubmissionStatus },
}

#[derive(Clone, Debug)]
pub struct EngineEventBus(broadcast::Sender<EngineEvent>);

impl EngineEventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self(tx)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EngineEvent> {
        self.0.subscribe()
    }

    /// No receivers is fine; a lagging channel must never fail an
    /// engine operation.
    pub(crate) fn emit(&self, event: EngineEvent) {
        let _ = self.0.send(event);
    }
}
