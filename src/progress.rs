//! Conversion lifecycle: the per-request state machine and its observer.
//!
//! Every request walks `Idle → Validating → Converting → {Done, Failed}`.
//! `Failed` can be entered from `Validating` or `Converting`; the terminal
//! states have no exits and nothing is retried automatically.
//!
//! Inject an [`Arc<dyn ConversionObserver>`] via
//! [`crate::convert::OrchestratorBuilder::observer`] to receive the
//! transitions, e.g. to drive a spinner:
//!
//! ```rust
//! use edgequake_pdf2docx::{ConversionObserver, ConversionState};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Recorder(Mutex<Vec<ConversionState>>);
//!
//! impl ConversionObserver for Recorder {
//!     fn on_state_change(&self, _from: ConversionState, to: ConversionState) {
//!         self.0.lock().unwrap().push(to);
//!     }
//! }
//!
//! let observer: Arc<dyn ConversionObserver> = Arc::new(Recorder::default());
//! observer.on_state_change(ConversionState::Idle, ConversionState::Validating);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// State of a single conversion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionState {
    Idle,
    Validating,
    Converting,
    Done,
    Failed,
}

impl ConversionState {
    /// Whether the machine may move from `self` to `next`.
    pub fn can_transition_to(self, next: ConversionState) -> bool {
        use ConversionState::*;
        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Converting)
                | (Validating, Failed)
                | (Converting, Done)
                | (Converting, Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ConversionState::Done | ConversionState::Failed)
    }
}

impl fmt::Display for ConversionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConversionState::Idle => "idle",
            ConversionState::Validating => "validating",
            ConversionState::Converting => "converting",
            ConversionState::Done => "done",
            ConversionState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Steps performed while in [`ConversionState::Converting`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionStage {
    /// Writing the upload into the request workspace.
    Staging,
    /// Waiting on the external PDF→DOCX engine.
    Engine,
    /// Translating paragraphs of the produced DOCX.
    Translating,
    /// Exporting the translated DOCX to PDF.
    Exporting,
}

impl fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConversionStage::Staging => "staging upload",
            ConversionStage::Engine => "converting PDF to DOCX",
            ConversionStage::Translating => "translating",
            ConversionStage::Exporting => "exporting PDF",
        };
        f.write_str(s)
    }
}

/// Receives lifecycle events for each request.
///
/// Implementations must be `Send + Sync`: one orchestrator serves many
/// concurrent web requests. All methods default to no-ops.
pub trait ConversionObserver: Send + Sync {
    /// Called on every state transition.
    fn on_state_change(&self, from: ConversionState, to: ConversionState) {
        let _ = (from, to);
    }

    /// Called when a step inside `Converting` begins.
    fn on_stage(&self, stage: ConversionStage) {
        let _ = stage;
    }

    /// Called once when the request enters `Failed`.
    fn on_failure(&self, message: &str) {
        let _ = message;
    }
}

/// A no-op observer.
pub struct NoopObserver;

impl ConversionObserver for NoopObserver {}

/// Convenience alias for the shared observer handle.
pub type ObserverHandle = Arc<dyn ConversionObserver>;

/// Per-request driver of the state machine.
pub(crate) struct StateTracker {
    state: ConversionState,
    observer: Option<ObserverHandle>,
}

impl StateTracker {
    pub(crate) fn new(observer: Option<ObserverHandle>) -> Self {
        Self {
            state: ConversionState::Idle,
            observer,
        }
    }

    pub(crate) fn state(&self) -> ConversionState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: ConversionState) {
        if !self.state.can_transition_to(next) {
            warn!("Ignoring illegal transition {} → {}", self.state, next);
            return;
        }
        debug!("Conversion state: {} → {}", self.state, next);
        let from = std::mem::replace(&mut self.state, next);
        if let Some(ref obs) = self.observer {
            obs.on_state_change(from, next);
        }
    }

    pub(crate) fn stage(&self, stage: ConversionStage) {
        debug!("Conversion stage: {}", stage);
        if let Some(ref obs) = self.observer {
            obs.on_stage(stage);
        }
    }

    pub(crate) fn fail(&mut self, message: &str) {
        self.advance(ConversionState::Failed);
        if let Some(ref obs) = self.observer {
            obs.on_failure(message);
        }
    }
}
