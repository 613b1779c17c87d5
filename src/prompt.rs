// SPDX-License-Identifier: GPL-3.0-only

//! Prompt controller state machine
//!
//! The only decision logic with externally observable effect: a detected
//! payload moves the controller to prompt-shown; the user's answer either
//! triggers a photo capture and stops the session (confirm) or resumes
//! scanning (cancel).
//!
//! Detections are not deduplicated and offers are not suppressed while a
//! prompt is showing; consecutive frames decoding the same payload each
//! produce a fresh prompt-shown transition, so a code held in view
//! re-prompts until the user confirms or looks away. Tests pin this.

use crate::scanner::Detection;
use tracing::info;

/// Prompt visibility state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptState {
    #[default]
    NoPrompt,
    PromptShown,
}

/// The user's answer to the confirmation dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptChoice {
    Confirm,
    Cancel,
}

/// What the consumer loop should do after the dialog resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptOutcome {
    /// Capture a photo if the session is running, then stop it
    CaptureAndStop,
    /// Keep the session running; scanning continues
    Resume,
}

/// Two-state prompt controller
#[derive(Debug, Default)]
pub struct PromptController {
    state: PromptState,
    payload: Option<String>,
    prompts_shown: u64,
}

impl PromptController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a detection; transitions to prompt-shown and returns the
    /// payload to display
    ///
    /// A later offer while a prompt is already showing replaces the
    /// displayed payload (no suppression).
    pub fn offer(&mut self, detection: Detection) -> &str {
        info!(payload = %detection.payload, "QR code detected");
        self.state = PromptState::PromptShown;
        self.prompts_shown += 1;
        self.payload = Some(detection.payload);
        self.payload.as_deref().unwrap_or_default()
    }

    /// Resolve the showing prompt with the user's choice
    ///
    /// Returns None when no prompt is showing.
    pub fn resolve(&mut self, choice: PromptChoice) -> Option<PromptOutcome> {
        if self.state != PromptState::PromptShown {
            return None;
        }
        self.state = PromptState::NoPrompt;
        self.payload = None;
        match choice {
            PromptChoice::Confirm => Some(PromptOutcome::CaptureAndStop),
            PromptChoice::Cancel => Some(PromptOutcome::Resume),
        }
    }

    /// Current state
    pub fn state(&self) -> PromptState {
        self.state
    }

    /// Payload of the showing prompt, if any
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    /// Total number of prompt-shown transitions
    pub fn prompts_shown(&self) -> u64 {
        self.prompts_shown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(payload: &str) -> Detection {
        Detection {
            payload: payload.to_string(),
        }
    }

    #[test]
    fn test_initial_state_is_no_prompt() {
        let controller = PromptController::new();
        assert_eq!(controller.state(), PromptState::NoPrompt);
        assert!(controller.payload().is_none());
    }

    #[test]
    fn test_offer_shows_prompt() {
        let mut controller = PromptController::new();
        let shown = controller.offer(detection("HELLO"));
        assert_eq!(shown, "HELLO");
        assert_eq!(controller.state(), PromptState::PromptShown);
        assert_eq!(controller.payload(), Some("HELLO"));
    }

    #[test]
    fn test_confirm_requests_capture_and_stop() {
        let mut controller = PromptController::new();
        controller.offer(detection("HELLO"));
        let outcome = controller.resolve(PromptChoice::Confirm);
        assert_eq!(outcome, Some(PromptOutcome::CaptureAndStop));
        assert_eq!(controller.state(), PromptState::NoPrompt);
    }

    #[test]
    fn test_cancel_resumes_scanning() {
        let mut controller = PromptController::new();
        controller.offer(detection("HELLO"));
        let outcome = controller.resolve(PromptChoice::Cancel);
        assert_eq!(outcome, Some(PromptOutcome::Resume));
        assert_eq!(controller.state(), PromptState::NoPrompt);
    }

    #[test]
    fn test_resolve_without_prompt_is_noop() {
        let mut controller = PromptController::new();
        assert_eq!(controller.resolve(PromptChoice::Confirm), None);
        assert_eq!(controller.resolve(PromptChoice::Cancel), None);
    }

    #[test]
    fn test_repeated_detection_shows_repeated_prompts() {
        // Current behavior: no deduplication of identical payloads across
        // consecutive frames, each one is an independent transition
        let mut controller = PromptController::new();
        controller.offer(detection("HELLO"));
        controller.offer(detection("HELLO"));
        assert_eq!(controller.prompts_shown(), 2);
        assert_eq!(controller.state(), PromptState::PromptShown);
    }
}
