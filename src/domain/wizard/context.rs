//! Running transcript of one wizard run.

/// Append-only transcript: the initial intent, answer blocks and refinement notes.
///
/// Nothing is ever removed; a new run starts from a fresh context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    transcript: String,
}

impl SessionContext {
    /// Starts a transcript from the user's project description.
    pub fn from_intent(intent: &str) -> Self {
        Self {
            transcript: format!("PROJECT: {}", intent.trim()),
        }
    }

    pub fn transcript(&self) -> &str {
        &self.transcript
    }

    /// Appends an answers block, one `* question: answer` line per pair, in order.
    ///
    /// Returns the number of lines appended; nothing is appended for an empty slice.
    pub fn append_answers(&mut self, answered: &[(String, String)]) -> usize {
        if answered.is_empty() {
            return 0;
        }
        self.transcript.push_str("\nANSWERS:\n");
        for (question, answer) in answered {
            self.transcript
                .push_str(&format!("\n* {}: {}", question, answer.trim()));
        }
        answered.len()
    }

    /// Appends a refinement instruction asking for the full updated implementation.
    pub fn append_refinement(&mut self, note: &str) {
        self.transcript.push_str(&format!(
            "\nREFINEMENT: {}. Generate the complete version in PHASE_3 \
             with the full updated implementation, not a diff.",
            note.trim()
        ));
    }
}
