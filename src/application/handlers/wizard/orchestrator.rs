//! WizardOrchestrator - Runs wizard turns against the engine.
//!
//! Every turn follows the same path: compose the request, send it, wait out
//! the settle delay, fall back to the channel's alternative retrieval path if
//! the reply looks unsettled, then extract and parse. The parsed status decides
//! the next screen. Any failure moves the session to `FailedTransient` with a
//! user-facing notice and a revert deadline; irrecoverable replies are written
//! to the error log first.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::{sleep, sleep_until, Instant};

use crate::domain::wizard::{
    parse_wizard_response, ErrorLogEntry, ExtractionError, ParseError, ProtocolComposer,
    RawEngineReply, SessionError, WizardResponse, WizardSession, WizardState,
};
use crate::ports::{EngineChannel, ErrorLogError, ErrorLogStore, TransportError};

/// Timing for wizard turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorTiming {
    /// Wait after a reply arrives before reading it.
    pub settle_delay: Duration,
    /// How long a failure stays on screen before reverting.
    pub revert_delay: Duration,
}

impl Default for OrchestratorTiming {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(1000),
            revert_delay: Duration::from_millis(4000),
        }
    }
}

/// Errors surfaced by wizard operations.
#[derive(Debug, Error)]
pub enum WizardError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("engine transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The reply could not be parsed and the failure could not be logged either.
    #[error("failed to record unparseable reply: {0}")]
    ErrorLog(#[from] ErrorLogError),
}

impl WizardError {
    /// Message shown to the user. Parser details stay in the error log.
    pub fn user_message(&self) -> String {
        match self {
            Self::Session(err) => err.to_string(),
            Self::Transport(err) => format!("Engine failure: {}", err),
            Self::Parse(ParseError::Extraction(ExtractionError::EmptyResponse)) => {
                "Empty response from engine".to_string()
            }
            Self::Parse(ParseError::Extraction(ExtractionError::NoJsonStructure)) => {
                "No JSON structure in reply, logged".to_string()
            }
            Self::Parse(ParseError::Persistent { .. }) => "JSON syntax error, logged".to_string(),
            Self::ErrorLog(err) => format!("JSON syntax error, could not write log: {}", err),
        }
    }

    /// True when the failure was a local validation that did not start a turn.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::Session(SessionError::EmptyIntent | SessionError::NoAnswerProvided)
        )
    }
}

/// Drives a [`WizardSession`] through turns.
pub struct WizardOrchestrator {
    engine: Arc<dyn EngineChannel>,
    error_log: Arc<dyn ErrorLogStore>,
    composer: ProtocolComposer,
    timing: OrchestratorTiming,
}

impl WizardOrchestrator {
    pub fn new(
        engine: Arc<dyn EngineChannel>,
        error_log: Arc<dyn ErrorLogStore>,
        composer: ProtocolComposer,
        timing: OrchestratorTiming,
    ) -> Self {
        Self {
            engine,
            error_log,
            composer,
            timing,
        }
    }

    pub fn timing(&self) -> OrchestratorTiming {
        self.timing
    }

    /// Submits the project description. Requires `AwaitingInput`.
    pub async fn start(
        &self,
        session: &mut WizardSession,
        intent: &str,
    ) -> Result<WizardState, WizardError> {
        let transcript = session.begin_start(intent)?;
        self.run_turn(session, transcript).await
    }

    /// Submits answers to the pending questions, paired by position.
    pub async fn reply(
        &self,
        session: &mut WizardSession,
        answers: &[String],
    ) -> Result<WizardState, WizardError> {
        let transcript = session.begin_reply(answers)?;
        self.run_turn(session, transcript).await
    }

    /// Submits a refinement note. A blank note does nothing.
    pub async fn refine(
        &self,
        session: &mut WizardSession,
        note: &str,
    ) -> Result<WizardState, WizardError> {
        match session.begin_refine(note)? {
            Some(transcript) => self.run_turn(session, transcript).await,
            None => Ok(session.state()),
        }
    }

    /// Sleeps until a failed turn's revert deadline and reverts it.
    ///
    /// Returns false immediately when no revert is pending.
    pub async fn await_revert(&self, session: &mut WizardSession) -> bool {
        let Some(deadline) = session.revert_at() else {
            return false;
        };
        sleep_until(Instant::from_std(deadline)).await;
        session.poll_revert(Instant::now().into_std())
    }

    /// Reverts a failed turn if its deadline has already passed.
    pub fn poll_revert(&self, session: &mut WizardSession) -> bool {
        session.poll_revert(Instant::now().into_std())
    }

    async fn run_turn(
        &self,
        session: &mut WizardSession,
        transcript: String,
    ) -> Result<WizardState, WizardError> {
        let request = self.composer.compose(&transcript);
        let channel = self.engine.channel_info();
        tracing::info!(
            session_id = %session.id(),
            channel = %channel.name,
            model = %channel.model,
            request_len = request.len(),
            "sending wizard request"
        );

        let outcome = match self.execute(&request).await {
            Ok(response) => session.complete(response).map_err(WizardError::from),
            Err(err) => Err(err),
        };

        match outcome {
            Ok(state) => {
                tracing::info!(session_id = %session.id(), ?state, "wizard turn completed");
                Ok(state)
            }
            Err(err) => Err(self.fail_turn(session, err)),
        }
    }

    async fn execute(&self, request: &str) -> Result<WizardResponse, WizardError> {
        let reply = self.engine.send_and_wait(request).await?;

        sleep(self.timing.settle_delay).await;
        let reply = self.settle(reply).await;

        match parse_wizard_response(&reply) {
            Ok(parsed) => {
                tracing::debug!(
                    repaired = parsed.repaired,
                    status = parsed.response.status.as_str(),
                    "engine reply parsed"
                );
                Ok(parsed.response)
            }
            Err(err) => Err(self.record_parse_failure(&reply, err).await),
        }
    }

    /// Swaps an unsettled reply for the channel's alternative one, when available.
    async fn settle(&self, reply: RawEngineReply) -> RawEngineReply {
        if !reply.is_blank() && reply.has_json_marker() {
            return reply;
        }

        match self.engine.last_reply().await {
            Ok(Some(alternative)) if !alternative.is_blank() => {
                tracing::info!(
                    reply_len = alternative.len(),
                    "reply unsettled, using alternative retrieval"
                );
                alternative
            }
            Ok(_) => reply,
            Err(err) => {
                tracing::warn!(error = %err, "alternative retrieval failed");
                reply
            }
        }
    }

    async fn record_parse_failure(&self, reply: &RawEngineReply, err: ParseError) -> WizardError {
        let loggable = matches!(
            err,
            ParseError::Persistent { .. } | ParseError::Extraction(ExtractionError::NoJsonStructure)
        );
        if !loggable {
            return WizardError::Parse(err);
        }

        let entry = ErrorLogEntry::now(reply.as_str(), err.log_message());
        match self.error_log.append(entry).await {
            Ok(()) => {
                tracing::warn!(
                    reply_len = reply.len(),
                    error = %err.log_message(),
                    "irrecoverable engine reply logged"
                );
                WizardError::Parse(err)
            }
            Err(log_err) => {
                tracing::error!(
                    error = %log_err,
                    parse_error = %err.log_message(),
                    "failed to append to error log"
                );
                WizardError::ErrorLog(log_err)
            }
        }
    }

    fn fail_turn(&self, session: &mut WizardSession, err: WizardError) -> WizardError {
        tracing::warn!(session_id = %session.id(), error = %err, "wizard turn failed");
        if let Err(state_err) = session.fail(
            err.user_message(),
            Instant::now().into_std(),
            self.timing.revert_delay,
        ) {
            tracing::error!(error = %state_err, "could not mark turn as failed");
        }
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::engine::MockEngine;
    use crate::adapters::error_log::InMemoryErrorLogStore;
    use crate::domain::wizard::Notice;

    const QUESTIONS: &str = r#"{"status":"INSUFFICIENT_INFORMATION","missing_information":["A","B"],"phases":[]}"#;
    const RESULT: &str = r#"{"status":"OK","missing_information":[],"phases":[{"phase_id":"PHASE_1","title":"PROBLEM MODELING","steps":[{"step_id":"1","label":"Goal","content":"Track todos"}]},{"phase_id":"PHASE_3","title":"IMPLEMENTATION","steps":[{"step_id":"9","label":"IMPLEMENTATION","content":"<p class=\\\"x\\\">hi</p>\\nbye"}]}]}"#;

    struct Fixture {
        engine: MockEngine,
        store: InMemoryErrorLogStore,
        orchestrator: WizardOrchestrator,
    }

    fn fixture(engine: MockEngine) -> Fixture {
        fixture_with_store(engine, InMemoryErrorLogStore::new())
    }

    fn fixture_with_store(engine: MockEngine, store: InMemoryErrorLogStore) -> Fixture {
        let orchestrator = WizardOrchestrator::new(
            Arc::new(engine.clone()),
            Arc::new(store.clone()),
            ProtocolComposer::default(),
            OrchestratorTiming::default(),
        );
        Fixture {
            engine,
            store,
            orchestrator,
        }
    }

    fn answers(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    mod happy_path {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn ok_reply_shows_result() {
            let f = fixture(MockEngine::new().with_reply(RESULT));
            let mut session = WizardSession::new();

            let state = f.orchestrator.start(&mut session, "todo app").await.unwrap();

            assert_eq!(state, WizardState::ShowingResult);
            assert_eq!(session.phases().len(), 2);
            assert_eq!(session.notice(), Some(&Notice::info("Completed")));
            assert_eq!(
                session.phases()[1].steps[0].content,
                "<p class=\"x\">hi</p>\nbye"
            );
        }

        #[tokio::test(start_paused = true)]
        async fn request_is_transcript_plus_contract() {
            let f = fixture(MockEngine::new().with_reply(RESULT));
            let mut session = WizardSession::new();
            f.orchestrator.start(&mut session, "todo app").await.unwrap();

            let request = f.engine.last_request().unwrap();
            assert!(request.starts_with("PROJECT: todo app\n\n"));
            assert!(request.contains("JSON SCHEMA"));
        }

        #[tokio::test(start_paused = true)]
        async fn settle_delay_is_observed() {
            let f = fixture(MockEngine::new().with_reply(RESULT));
            let mut session = WizardSession::new();

            let started = Instant::now();
            f.orchestrator.start(&mut session, "app").await.unwrap();
            assert!(started.elapsed() >= Duration::from_millis(1000));
        }

        #[tokio::test(start_paused = true)]
        async fn two_ok_turns_leave_error_log_untouched() {
            let f = fixture(MockEngine::new().with_reply(RESULT).with_reply(RESULT));
            let mut session = WizardSession::new();

            f.orchestrator.start(&mut session, "app").await.unwrap();
            f.orchestrator.refine(&mut session, "dark mode").await.unwrap();

            assert!(f.store.is_empty().await);
            assert_eq!(f.engine.call_count(), 2);
        }
    }

    mod missing_information {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn partial_answers_are_sent_in_order() {
            let f = fixture(MockEngine::new().with_reply(QUESTIONS).with_reply(RESULT));
            let mut session = WizardSession::new();

            let state = f.orchestrator.start(&mut session, "app").await.unwrap();
            assert_eq!(state, WizardState::ShowingMissingInfo);

            f.orchestrator
                .reply(&mut session, &answers(&["x", ""]))
                .await
                .unwrap();

            let request = f.engine.last_request().unwrap();
            assert!(request.starts_with("PROJECT: app\nANSWERS:\n\n* A: x\n\n"));
            assert!(!request.contains("* B:"));
        }

        #[tokio::test(start_paused = true)]
        async fn zero_answers_do_not_advance() {
            let f = fixture(MockEngine::new().with_reply(QUESTIONS));
            let mut session = WizardSession::new();
            f.orchestrator.start(&mut session, "app").await.unwrap();

            let err = f
                .orchestrator
                .reply(&mut session, &answers(&["", " "]))
                .await
                .unwrap_err();

            assert!(matches!(
                err,
                WizardError::Session(SessionError::NoAnswerProvided)
            ));
            assert!(err.is_validation());
            assert_eq!(session.state(), WizardState::ShowingMissingInfo);
            assert_eq!(f.engine.call_count(), 1);
        }
    }

    mod refinement {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn blank_note_sends_nothing() {
            let f = fixture(MockEngine::new().with_reply(RESULT));
            let mut session = WizardSession::new();
            f.orchestrator.start(&mut session, "app").await.unwrap();

            let state = f.orchestrator.refine(&mut session, "   ").await.unwrap();

            assert_eq!(state, WizardState::ShowingResult);
            assert_eq!(f.engine.call_count(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn note_asks_for_full_implementation() {
            let f = fixture(MockEngine::new().with_reply(RESULT).with_reply(RESULT));
            let mut session = WizardSession::new();
            f.orchestrator.start(&mut session, "app").await.unwrap();
            f.orchestrator.refine(&mut session, "add login").await.unwrap();

            let request = f.engine.last_request().unwrap();
            assert!(request.contains("REFINEMENT: add login."));
            assert!(request.contains("not a diff"));
        }
    }

    mod failures {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn transport_failure_fails_turn_and_reverts_to_input() {
            let f = fixture(MockEngine::new().with_error(TransportError::unavailable("down")));
            let mut session = WizardSession::new();

            let err = f.orchestrator.start(&mut session, "app").await.unwrap_err();

            assert!(matches!(err, WizardError::Transport(_)));
            assert_eq!(session.state(), WizardState::FailedTransient);
            assert!(session.notice().unwrap().is_error);
            assert!(f.store.is_empty().await);

            let started = Instant::now();
            assert!(f.orchestrator.await_revert(&mut session).await);
            assert!(started.elapsed() >= Duration::from_millis(4000));
            assert_eq!(session.state(), WizardState::AwaitingInput);
        }

        #[tokio::test(start_paused = true)]
        async fn failure_after_result_reverts_to_result() {
            let f = fixture(
                MockEngine::new()
                    .with_reply(RESULT)
                    .with_error(TransportError::network("reset")),
            );
            let mut session = WizardSession::new();
            f.orchestrator.start(&mut session, "app").await.unwrap();
            f.orchestrator.refine(&mut session, "more").await.unwrap_err();

            assert!(!f.orchestrator.poll_revert(&mut session));
            assert!(f.orchestrator.await_revert(&mut session).await);
            assert_eq!(session.state(), WizardState::ShowingResult);
        }

        #[tokio::test(start_paused = true)]
        async fn persistent_parse_failure_is_logged_once_with_raw_reply() {
            let raw = "Here: {\"status\": OK, [[[ }";
            let f = fixture(MockEngine::new().with_reply(raw));
            let mut session = WizardSession::new();

            let err = f.orchestrator.start(&mut session, "app").await.unwrap_err();

            assert!(matches!(err, WizardError::Parse(ParseError::Persistent { .. })));
            assert_eq!(err.user_message(), "JSON syntax error, logged");
            assert_eq!(
                session.notice(),
                Some(&Notice::error("JSON syntax error, logged"))
            );

            let entries = f.store.read_all().await.unwrap();
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].raw_content(), raw);
            assert!(entries[0].error_message().contains("strict parse"));
            assert!(entries[0].error_message().contains("sanitized parse"));
        }

        #[tokio::test(start_paused = true)]
        async fn repaired_reply_is_not_logged() {
            let f = fixture(MockEngine::new().with_reply(
                "{\"status\":\"OK\",\"phases\":[{\"phase_id\":\"PHASE_3\",\"title\":\"IMPLEMENTATION\",\"steps\":[{\"step_id\":\"9\",\"label\":\"IMPLEMENTATION\",\"content\":\"a\nb\"}]}]}",
            ));
            let mut session = WizardSession::new();

            let state = f.orchestrator.start(&mut session, "app").await.unwrap();

            assert_eq!(state, WizardState::ShowingResult);
            assert_eq!(session.phases()[0].steps[0].content, "a\nb");
            assert!(f.store.is_empty().await);
        }

        #[tokio::test(start_paused = true)]
        async fn no_json_structure_is_logged() {
            let f = fixture(MockEngine::new().with_reply("I can't help with that."));
            let mut session = WizardSession::new();

            let err = f.orchestrator.start(&mut session, "app").await.unwrap_err();

            assert!(matches!(
                err,
                WizardError::Parse(ParseError::Extraction(ExtractionError::NoJsonStructure))
            ));
            assert_eq!(f.store.len().await, 1);
        }

        #[tokio::test(start_paused = true)]
        async fn empty_reply_is_not_logged() {
            let f = fixture(MockEngine::new().with_reply("   "));
            let mut session = WizardSession::new();

            let err = f.orchestrator.start(&mut session, "app").await.unwrap_err();

            assert_eq!(err.user_message(), "Empty response from engine");
            assert!(f.store.is_empty().await);
            assert_eq!(session.state(), WizardState::FailedTransient);
        }

        #[tokio::test(start_paused = true)]
        async fn log_append_failure_is_surfaced() {
            let f = fixture_with_store(
                MockEngine::new().with_reply("{ not json at all }"),
                InMemoryErrorLogStore::unavailable(),
            );
            let mut session = WizardSession::new();

            let err = f.orchestrator.start(&mut session, "app").await.unwrap_err();

            assert!(matches!(err, WizardError::ErrorLog(ErrorLogError::Unavailable(_))));
            assert_eq!(session.state(), WizardState::FailedTransient);
            assert!(session.notice().unwrap().message.contains("could not write log"));
        }

        #[tokio::test(start_paused = true)]
        async fn unrecognized_status_fails_turn_without_logging() {
            let f = fixture(MockEngine::new().with_reply(r#"{"status":"THINKING"}"#));
            let mut session = WizardSession::new();

            let err = f.orchestrator.start(&mut session, "app").await.unwrap_err();

            assert!(matches!(
                err,
                WizardError::Session(SessionError::UnrecognizedStatus(ref s)) if s == "THINKING"
            ));
            assert_eq!(session.state(), WizardState::FailedTransient);
            assert!(f.store.is_empty().await);
        }
    }

    mod fallback_retrieval {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn unsettled_reply_uses_alternative() {
            let f = fixture(
                MockEngine::new()
                    .with_reply("Still generating...")
                    .with_fallback_reply(RESULT),
            );
            let mut session = WizardSession::new();

            let state = f.orchestrator.start(&mut session, "app").await.unwrap();

            assert_eq!(state, WizardState::ShowingResult);
            assert_eq!(f.engine.fallback_calls(), 1);
        }

        #[tokio::test(start_paused = true)]
        async fn settled_reply_skips_alternative() {
            let f = fixture(MockEngine::new().with_reply(RESULT).with_fallback_reply("{}"));
            let mut session = WizardSession::new();
            f.orchestrator.start(&mut session, "app").await.unwrap();

            assert_eq!(f.engine.fallback_calls(), 0);
        }

        #[tokio::test(start_paused = true)]
        async fn missing_alternative_keeps_primary_reply() {
            let f = fixture(MockEngine::new().with_reply(""));
            let mut session = WizardSession::new();

            let err = f.orchestrator.start(&mut session, "app").await.unwrap_err();

            assert!(matches!(
                err,
                WizardError::Parse(ParseError::Extraction(ExtractionError::EmptyResponse))
            ));
            assert_eq!(f.engine.fallback_calls(), 1);
        }
    }

    mod operation_guards {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn start_requires_awaiting_input() {
            let f = fixture(MockEngine::new().with_reply(RESULT));
            let mut session = WizardSession::new();
            f.orchestrator.start(&mut session, "app").await.unwrap();

            let err = f.orchestrator.start(&mut session, "again").await.unwrap_err();
            assert!(matches!(
                err,
                WizardError::Session(SessionError::InvalidTransition { .. })
            ));
            assert_eq!(session.state(), WizardState::ShowingResult);
        }

        #[tokio::test(start_paused = true)]
        async fn blank_intent_is_validation_error() {
            let f = fixture(MockEngine::new());
            let mut session = WizardSession::new();

            let err = f.orchestrator.start(&mut session, "  ").await.unwrap_err();
            assert!(err.is_validation());
            assert_eq!(f.engine.call_count(), 0);
        }
    }
}
