//! Wizard session: the explicit context object every transition runs against.
//!
//! A session owns the transcript, the last rendered result, the pending
//! questions, the user-facing notice and the auto-revert deadline. All
//! operations here are synchronous and take the current instant as an
//! argument, so transitions can be tested without a clock.

use std::time::{Duration, Instant};

use crate::domain::foundation::{SessionId, StateMachine, Timestamp};

use super::context::SessionContext;
use super::errors::SessionError;
use super::response::{Phase, ResponseStatus, WizardResponse};
use super::state::WizardState;

/// Status line shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub is_error: bool,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }
}

/// State of one wizard run.
#[derive(Debug, Clone)]
pub struct WizardSession {
    id: SessionId,
    started_at: Timestamp,
    state: WizardState,
    context: Option<SessionContext>,
    phases: Vec<Phase>,
    questions: Vec<String>,
    has_rendered_result: bool,
    notice: Option<Notice>,
    revert_at: Option<Instant>,
}

impl WizardSession {
    pub fn new() -> Self {
        Self {
            id: SessionId::new(),
            started_at: Timestamp::now(),
            state: WizardState::AwaitingInput,
            context: None,
            phases: Vec::new(),
            questions: Vec::new(),
            has_rendered_result: false,
            notice: None,
            revert_at: None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn started_at(&self) -> &Timestamp {
        &self.started_at
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn transcript(&self) -> Option<&str> {
        self.context.as_ref().map(SessionContext::transcript)
    }

    /// Phases of the most recent complete result.
    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Questions awaiting answers, in the order the engine asked them.
    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn has_rendered_result(&self) -> bool {
        self.has_rendered_result
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn revert_at(&self) -> Option<Instant> {
        self.revert_at
    }

    /// Starts a new run from the project description.
    ///
    /// Returns the transcript to send.
    pub fn begin_start(&mut self, intent: &str) -> Result<String, SessionError> {
        self.require(WizardState::AwaitingInput, WizardState::InFlight)?;
        if intent.trim().is_empty() {
            return Err(SessionError::EmptyIntent);
        }

        let context = SessionContext::from_intent(intent);
        let transcript = context.transcript().to_string();
        self.context = Some(context);
        self.enter_in_flight()?;
        Ok(transcript)
    }

    /// Records answers to the pending questions, paired by position.
    ///
    /// Blank answers are skipped. When no answer is provided the session stays
    /// on the question screen with an error notice.
    pub fn begin_reply(&mut self, answers: &[String]) -> Result<String, SessionError> {
        self.require(WizardState::ShowingMissingInfo, WizardState::InFlight)?;

        let answered: Vec<(String, String)> = self
            .questions
            .iter()
            .zip(answers)
            .filter(|(_, answer)| !answer.trim().is_empty())
            .map(|(question, answer)| (question.clone(), answer.trim().to_string()))
            .collect();

        if answered.is_empty() {
            self.notice = Some(Notice::error(SessionError::NoAnswerProvided.to_string()));
            return Err(SessionError::NoAnswerProvided);
        }

        let context = self.context_mut()?;
        context.append_answers(&answered);
        let transcript = context.transcript().to_string();
        self.enter_in_flight()?;
        Ok(transcript)
    }

    /// Records a refinement note. A blank note is ignored and returns `None`.
    pub fn begin_refine(&mut self, note: &str) -> Result<Option<String>, SessionError> {
        if note.trim().is_empty() {
            return Ok(None);
        }
        self.require(WizardState::ShowingResult, WizardState::InFlight)?;

        let context = self.context_mut()?;
        context.append_refinement(note);
        let transcript = context.transcript().to_string();
        self.enter_in_flight()?;
        Ok(Some(transcript))
    }

    /// Applies a parsed response to the in-flight turn.
    ///
    /// An unrecognized status leaves the session in flight and returns an
    /// error; the caller is expected to [`fail`](Self::fail) the turn.
    pub fn complete(&mut self, response: WizardResponse) -> Result<WizardState, SessionError> {
        let target = match &response.status {
            ResponseStatus::Ok => WizardState::ShowingResult,
            ResponseStatus::InsufficientInformation => WizardState::ShowingMissingInfo,
            ResponseStatus::Unrecognized(raw) => {
                return Err(SessionError::UnrecognizedStatus(raw.clone()))
            }
        };
        self.transition(target)?;

        match target {
            WizardState::ShowingResult => {
                self.phases = response.phases;
                self.questions.clear();
                self.has_rendered_result = true;
                self.notice = Some(Notice::info("Completed"));
            }
            _ => {
                self.questions = response.missing_information;
                self.notice = Some(Notice::info("Missing information"));
            }
        }
        Ok(target)
    }

    /// Fails the in-flight turn and schedules the auto-revert.
    pub fn fail(
        &mut self,
        message: impl Into<String>,
        now: Instant,
        revert_delay: Duration,
    ) -> Result<(), SessionError> {
        self.transition(WizardState::FailedTransient)?;
        self.notice = Some(Notice::error(message));
        self.revert_at = Some(now + revert_delay);
        Ok(())
    }

    /// The screen a failed turn reverts to.
    pub fn revert_target(&self) -> WizardState {
        if self.has_rendered_result {
            WizardState::ShowingResult
        } else {
            WizardState::AwaitingInput
        }
    }

    /// Reverts a failed turn once its deadline has passed.
    ///
    /// Returns true when the session changed state.
    pub fn poll_revert(&mut self, now: Instant) -> bool {
        match (self.state, self.revert_at) {
            (WizardState::FailedTransient, Some(deadline)) if now >= deadline => {
                let target = self.revert_target();
                self.state = target;
                self.revert_at = None;
                if target == WizardState::AwaitingInput {
                    self.context = None;
                    self.questions.clear();
                }
                tracing::debug!(session_id = %self.id, state = ?target, "failed turn reverted");
                true
            }
            _ => false,
        }
    }

    fn enter_in_flight(&mut self) -> Result<(), SessionError> {
        self.transition(WizardState::InFlight)?;
        self.notice = Some(Notice::info("Analyzing..."));
        self.revert_at = None;
        Ok(())
    }

    fn require(&self, expected: WizardState, to: WizardState) -> Result<(), SessionError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                from: self.state,
                to,
            })
        }
    }

    fn transition(&mut self, to: WizardState) -> Result<(), SessionError> {
        let from = self.state;
        self.state = from
            .transition_to(to)
            .map_err(|_| SessionError::InvalidTransition { from, to })?;
        tracing::debug!(session_id = %self.id, ?from, ?to, "wizard transition");
        Ok(())
    }

    fn context_mut(&mut self) -> Result<&mut SessionContext, SessionError> {
        let state = self.state;
        self.context
            .as_mut()
            .ok_or(SessionError::InvalidTransition {
                from: state,
                to: WizardState::InFlight,
            })
    }
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new()
    }
}
