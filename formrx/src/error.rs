use thiserror::Error;

/// Errors returned by fallible engine calls.
///
/// None of these describe a failed submission: those travel on the message
/// stream as [`Message::Error`](crate::Message::Error) so the screen can
/// render them.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum FormError {
    /// The engine was disposed and accepts no further events.
    #[error("engine has been disposed")]
    Disposed,

    /// The form does not declare the field an input was addressed to.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// The engine task ended before it could answer a request.
    #[error("engine task stopped before replying")]
    Stopped,
}

impl FormError {
    /// Returns true if this error was caused by using a disposed engine.
    pub fn is_disposed(&self) -> bool {
        matches!(self, FormError::Disposed)
    }

    /// Returns true if this error names an undeclared field.
    pub fn is_unknown_field(&self) -> bool {
        matches!(self, FormError::UnknownField(_))
    }

    pub fn unknown_field(field: impl std::fmt::Debug) -> Self {
        FormError::UnknownField(format!("{field:?}"))
    }
}
