//! The two screens the engine ships with, and the repository they call.

mod change_password;
mod login;

pub use change_password::*;
pub use login::*;

use crate::outcome::Outcome;
use std::fmt::Debug;
use std::future::Future;

/// Login request, snapshotted from the form when a submission is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordChange {
    pub password: String,
    pub new_password: String,
}

/// The remote or local store that performs authentication.
///
/// Shared between engines, so implementations must handle concurrent,
/// independent calls. Calls resolve to an [`Outcome`] and never panic on
/// ordinary failures.
pub trait AuthRepository: Send + Sync + 'static {
    type User: Debug + Clone + Send + Sync + 'static;

    fn login(&self, credential: Credential) -> impl Future<Output = Outcome<Self::User>> + Send;

    fn change_password(&self, change: PasswordChange) -> impl Future<Output = Outcome<()>> + Send;
}
