use std::error::Error;
use std::fmt;
use std::sync::Arc;

/// Message used when a collaborator hands back something that is neither a
/// success nor a failure.
pub const UNKNOWN_RESULT: &str = "Unknown result";

/// The underlying error of a failed operation, shared between every copy of
/// the message that carries it.
#[derive(Clone)]
pub struct Cause(Arc<dyn Error + Send + Sync>);

impl Cause {
    pub fn new<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Cause(Arc::new(error))
    }

    pub fn get_ref(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl fmt::Debug for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// Causes compare by rendered message; error values themselves are not
// comparable.
impl PartialEq for Cause {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.to_string() == other.0.to_string()
    }
}

impl Eq for Cause {}

/// A failed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub message: String,
    pub cause: Option<Cause>,
}

impl Failure {
    pub fn new(message: impl Into<String>) -> Self {
        Failure {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Failure {
            message: message.into(),
            cause: Some(Cause::new(cause)),
        }
    }

    /// The failure reported for a result of unrecognized shape.
    pub fn unknown() -> Self {
        Failure::new(UNKNOWN_RESULT)
    }
}

/// What an external operation resolves to. Operations never reject: every
/// problem is reported as a [`Outcome::Failure`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Success(T),
    Failure(Failure),
}

impl<T> Outcome<T> {
    pub fn success(value: T) -> Self {
        Outcome::Success(value)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Outcome::Failure(Failure::new(message))
    }

    pub fn failure_with_cause<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Outcome::Failure(Failure::with_cause(message, cause))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn value(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            Outcome::Failure(_) => None,
        }
    }
}

/// Conversion of whatever a repository produces into an [`Outcome`].
pub trait IntoOutcome<T> {
    fn into_outcome(self) -> Outcome<T>;
}

impl<T> IntoOutcome<T> for Outcome<T> {
    fn into_outcome(self) -> Outcome<T> {
        self
    }
}

impl<T, E> IntoOutcome<T> for Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn into_outcome(self) -> Outcome<T> {
        match self {
            Ok(value) => Outcome::Success(value),
            Err(error) => Outcome::failure_with_cause(error.to_string(), error),
        }
    }
}

/// Decodes a JSON result of the form `{"kind": "success", "value": ..}` or
/// `{"kind": "failure", "message": ".."}`. Anything else becomes the
/// [`UNKNOWN_RESULT`] failure.
#[cfg(feature = "serde")]
impl<T> IntoOutcome<T> for serde_json::Value
where
    T: serde::de::DeserializeOwned,
{
    fn into_outcome(self) -> Outcome<T> {
        #[derive(serde::Deserialize)]
        #[serde(tag = "kind", rename_all = "snake_case")]
        enum Wire<T> {
            Success { value: T },
            Failure { message: String },
        }

        match serde_json::from_value::<Wire<T>>(self) {
            Ok(Wire::Success { value }) => Outcome::Success(value),
            Ok(Wire::Failure { message }) => Outcome::failure(message),
            Err(error) => {
                tracing::warn!(%error, "collaborator returned an unrecognized result");
                Outcome::Failure(Failure::unknown())
            }
        }
    }
}
