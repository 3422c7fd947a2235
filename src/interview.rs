//! Interview state tracking
//!
//! Two-state machine driven by user utterances. Start requires the whole
//! normalized utterance to be an affirmation token; stop only requires a
//! stop keyword anywhere in the utterance.

use serde::Serialize;

/// Utterances that start an interview when they are the entire message
const START_TOKENS: &[&str] = &["да", "готов", "поехали", "начинай"];

/// Substrings that end an interview from any state
const STOP_KEYWORDS: &[&str] = &["останови", "заверши", "прекрати", "хватит"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewState {
    #[default]
    Inactive,
    Active,
}

impl InterviewState {
    pub fn is_active(self) -> bool {
        self == InterviewState::Active
    }
}

/// Pure transition function
pub fn transition(state: InterviewState, utterance: &str) -> InterviewState {
    let normalized = utterance.trim().to_lowercase();

    if STOP_KEYWORDS.iter().any(|k| normalized.contains(k)) {
        return InterviewState::Inactive;
    }
    if START_TOKENS.contains(&normalized.as_str()) {
        return InterviewState::Active;
    }
    state
}

/// Owns the interview flag for one conversation
#[derive(Debug, Default)]
pub struct InterviewTracker {
    state: InterviewState,
}

impl InterviewTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one user utterance, returning the resulting state
    pub fn track(&mut self, utterance: &str) -> InterviewState {
        let next = transition(self.state, utterance);
        if next != self.state {
            tracing::debug!(from = ?self.state, to = ?next, "Interview state changed");
        }
        self.state = next;
        next
    }

    pub fn state(&self) -> InterviewState {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = InterviewState::Inactive;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_start_token_activates() {
        let mut tracker = InterviewTracker::new();
        assert_eq!(tracker.track("Да"), InterviewState::Active);
    }

    #[test]
    fn test_start_token_is_trimmed_and_case_folded() {
        assert_eq!(
            transition(InterviewState::Inactive, "  ПОЕХАЛИ \n"),
            InterviewState::Active
        );
    }

    #[test]
    fn test_start_requires_exact_match() {
        assert_eq!(
            transition(InterviewState::Inactive, "поехали, начинаем"),
            InterviewState::Inactive
        );
        assert_eq!(
            transition(InterviewState::Inactive, "да, конечно"),
            InterviewState::Inactive
        );
    }

    #[test]
    fn test_stop_keyword_matches_substring() {
        let mut tracker = InterviewTracker::new();
        tracker.track("готов");
        assert!(tracker.state().is_active());
        assert_eq!(tracker.track("хочу прекратить всё"), InterviewState::Inactive);
    }

    #[test]
    fn test_stop_from_inactive_stays_inactive() {
        assert_eq!(
            transition(InterviewState::Inactive, "Хватит"),
            InterviewState::Inactive
        );
    }

    #[test]
    fn test_other_utterances_keep_state() {
        assert_eq!(
            transition(InterviewState::Active, "HashMap хранит пары ключ-значение"),
            InterviewState::Active
        );
        assert_eq!(
            transition(InterviewState::Inactive, "проведи собеседование"),
            InterviewState::Inactive
        );
    }

    #[test]
    fn test_reset() {
        let mut tracker = InterviewTracker::new();
        tracker.track("начинай");
        tracker.reset();
        assert_eq!(tracker.state(), InterviewState::Inactive);
    }

    fn arb_state() -> impl Strategy<Value = InterviewState> {
        prop_oneof![Just(InterviewState::Inactive), Just(InterviewState::Active)]
    }

    proptest! {
        #[test]
        fn stop_keyword_anywhere_deactivates(
            state in arb_state(),
            prefix in "[a-zа-я ]{0,12}",
            suffix in "[a-zа-я ]{0,12}",
            idx in 0usize..4,
        ) {
            let utterance = format!("{prefix}{}{suffix}", STOP_KEYWORDS[idx]);
            prop_assert_eq!(transition(state, &utterance), InterviewState::Inactive);
        }

        #[test]
        fn text_without_keywords_never_transitions(
            state in arb_state(),
            utterance in "[a-z0-9 ,.?]{0,40}",
        ) {
            prop_assert_eq!(transition(state, &utterance), state);
        }
    }
}
