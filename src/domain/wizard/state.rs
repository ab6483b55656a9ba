//! Wizard state machine.
//!
//! Defines the screens a wizard run moves through and the valid transitions.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

/// The lifecycle state of a wizard run.
///
/// - `AwaitingInput`: nothing submitted yet, waiting for the project description
/// - `InFlight`: one request is outstanding with the engine
/// - `ShowingResult`: a complete protocol document is displayed
/// - `ShowingMissingInfo`: the engine's questions are displayed for answering
/// - `FailedTransient`: a turn failed; reverts after a fixed delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WizardState {
    #[default]
    AwaitingInput,
    InFlight,
    ShowingResult,
    ShowingMissingInfo,
    FailedTransient,
}

impl WizardState {
    /// True when the user may submit something that starts a turn.
    pub fn accepts_user_action(&self) -> bool {
        matches!(
            self,
            Self::AwaitingInput | Self::ShowingResult | Self::ShowingMissingInfo
        )
    }
}

impl StateMachine for WizardState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use WizardState::*;
        matches!(
            (self, target),
            // Initial submission
            (AwaitingInput, InFlight) |
            // Turn outcomes
            (InFlight, ShowingResult) |
            (InFlight, ShowingMissingInfo) |
            (InFlight, FailedTransient) |
            // Refinement and answers start a new turn
            (ShowingResult, InFlight) |
            (ShowingMissingInfo, InFlight) |
            // Auto-revert
            (FailedTransient, ShowingResult) |
            (FailedTransient, AwaitingInput)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use WizardState::*;
        match self {
            AwaitingInput => vec![InFlight],
            InFlight => vec![ShowingResult, ShowingMissingInfo, FailedTransient],
            ShowingResult => vec![InFlight],
            ShowingMissingInfo => vec![InFlight],
            FailedTransient => vec![ShowingResult, AwaitingInput],
        }
    }
}
