use crate::outcome::{Cause, Failure, Outcome};

/// Text placed in [`FormState::error`] when a submit is rejected.
pub const INVALID_INPUT: &str = "Invalid information";

/// What a screen is told after a submit trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message<T> {
    Success(T),
    Error {
        message: String,
        cause: Option<Cause>,
    },
    /// Submit was attempted while the form was invalid. No operation ran.
    InvalidInput,
}

impl<T> Message<T> {
    pub fn error(message: impl Into<String>) -> Self {
        Message::Error {
            message: message.into(),
            cause: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Message::Success(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Message::Error { .. })
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Message::InvalidInput)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Message::Error { message, .. } => Some(message),
            _ => None,
        }
    }
}

impl<T> From<Outcome<T>> for Message<T> {
    fn from(outcome: Outcome<T>) -> Self {
        match outcome {
            Outcome::Success(value) => Message::Success(value),
            Outcome::Failure(Failure { message, cause }) => Message::Error { message, cause },
        }
    }
}

/// Loading changes and messages of one engine, interleaved in the order they
/// happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activity<T> {
    Loading(bool),
    Message(Message<T>),
}

/// Everything a screen needs to render the submission side of a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormState {
    pub is_loading: bool,
    pub error: Option<String>,
    pub message: Option<String>,
}

impl FormState {
    pub fn idle() -> Self {
        FormState::default()
    }

    pub fn loading() -> Self {
        FormState {
            is_loading: true,
            error: None,
            message: None,
        }
    }

    pub fn succeeded(message: impl Into<String>) -> Self {
        FormState {
            is_loading: false,
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        FormState {
            is_loading: false,
            error: Some(error.into()),
            message: None,
        }
    }

    /// True once a submission has produced a visible result.
    pub fn is_complete(&self) -> bool {
        !self.is_loading && (self.error.is_some() || self.message.is_some())
    }

    /// Folds one step of engine activity into the state. `describe` renders a
    /// successful result for display.
    pub fn apply<T>(self, activity: &Activity<T>, describe: impl FnOnce(&T) -> String) -> Self {
        match activity {
            Activity::Loading(true) => FormState::loading(),
            Activity::Loading(false) => FormState {
                is_loading: false,
                ..self
            },
            Activity::Message(Message::Success(value)) => FormState::succeeded(describe(value)),
            Activity::Message(Message::Error { message, .. }) => FormState::failed(message.clone()),
            Activity::Message(Message::InvalidInput) => FormState {
                error: Some(INVALID_INPUT.to_string()),
                message: None,
                ..self
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn describe(value: &u32) -> String {
        format!("done {value}")
    }

    #[test]
    fn test_outcome_maps_to_message() {
        assert_eq!(Message::from(Outcome::Success(1)), Message::Success(1));
        assert_eq!(
            Message::<u8>::from(Outcome::failure("network down")),
            Message::error("network down")
        );
    }

    #[test]
    fn test_state_follows_a_successful_submission() {
        let state = FormState::idle()
            .apply(&Activity::Loading(true), describe)
            .apply(&Activity::Message(Message::Success(4)), describe)
            .apply(&Activity::<u32>::Loading(false), describe);

        assert_eq!(state, FormState::succeeded("done 4"));
        assert!(state.is_complete());
    }

    #[test]
    fn test_state_follows_a_failed_submission() {
        let state = FormState::idle()
            .apply(&Activity::Loading(true), describe)
            .apply(&Activity::Message(Message::error("network down")), describe)
            .apply(&Activity::<u32>::Loading(false), describe);

        assert_eq!(state, FormState::failed("network down"));
    }

    #[test]
    fn test_invalid_input_keeps_loading_flag() {
        let state = FormState::idle().apply(&Activity::<u32>::Message(Message::InvalidInput), describe);
        assert!(!state.is_loading);
        assert_eq!(state.error.as_deref(), Some(INVALID_INPUT));
    }
}
