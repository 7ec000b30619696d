//! Guidance form for regenerating a message's response.

use serde::Serialize;

use crate::models::RefinementInput;
use crate::validation::InputValidator;

/// Inline error shown when the backend rejects a regeneration
pub const SUBMIT_FAILED: &str = "Failed to submit refinement. Please try again.";

/// State of the "Refine response" form in the detail pane
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefinementForm {
    guidance: String,
    submitting: bool,
    error: Option<String>,
}

impl RefinementForm {
    /// Empty form
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the guidance text. Editing clears a previous error.
    pub fn set_guidance(&mut self, guidance: impl Into<String>) {
        self.guidance = guidance.into();
        self.error = None;
    }

    /// Typed guidance
    #[must_use]
    pub fn guidance(&self) -> &str {
        &self.guidance
    }

    /// Whether a submission is in flight
    #[must_use]
    pub const fn is_submitting(&self) -> bool {
        self.submitting
    }

    /// Inline error under the form
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Submit button state
    #[must_use]
    pub fn can_submit(&self) -> bool {
        !self.submitting && !self.guidance.trim().is_empty()
    }

    /// Validate and lock the form for submission.
    ///
    /// Returns the request to send, or `None` when the guidance is blank
    /// (the inline error is set) or a submission is already running.
    pub fn begin_submit(&mut self, message_id: &str) -> Option<RefinementInput> {
        if self.submitting {
            return None;
        }
        match InputValidator::validate_guidance(&self.guidance) {
            Ok(guidance) => {
                self.submitting = true;
                self.error = None;
                Some(RefinementInput { message_id: message_id.to_string(), guidance })
            }
            Err(e) => {
                self.error = Some(e.inline_message());
                None
            }
        }
    }

    /// Resolve a submission. Success clears the form; failure keeps the
    /// typed guidance and shows an inline error.
    pub fn finish_submit(&mut self, succeeded: bool) {
        self.submitting = false;
        if succeeded {
            self.guidance.clear();
            self.error = None;
        } else {
            self.error = Some(SUBMIT_FAILED.to_string());
        }
    }

    /// Unlock without touching text or error (the result was discarded)
    pub fn abandon(&mut self) {
        self.submitting = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_guidance_cannot_submit() {
        let mut form = RefinementForm::new();
        form.set_guidance("   ");
        assert!(!form.can_submit());
        assert!(form.begin_submit("1").is_none());
        assert_eq!(form.error(), Some("Please provide guidance for regeneration"));
        assert!(!form.is_submitting());
    }

    #[test]
    fn test_submit_locks_until_finished() {
        let mut form = RefinementForm::new();
        form.set_guidance(" cite the IRS rule ");
        let request = form.begin_submit("1").unwrap();
        assert_eq!(request.guidance, "cite the IRS rule");
        assert!(!form.can_submit());
        assert!(form.begin_submit("1").is_none());

        form.finish_submit(true);
        assert_eq!(form.guidance(), "");
        assert!(form.error().is_none());
    }

    #[test]
    fn test_failure_keeps_guidance() {
        let mut form = RefinementForm::new();
        form.set_guidance("shorter please");
        form.begin_submit("1").unwrap();
        form.finish_submit(false);
        assert_eq!(form.guidance(), "shorter please");
        assert_eq!(form.error(), Some(SUBMIT_FAILED));
        assert!(form.can_submit());
    }
}
