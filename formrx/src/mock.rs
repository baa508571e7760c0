//! A scriptable [`AuthRepository`] for tests and demos.

use crate::forms::{AuthRepository, Credential, PasswordChange};
use crate::outcome::Outcome;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::sleep;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockUser {
    pub email: String,
}

/// One recorded repository call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Login(Credential),
    ChangePassword(PasswordChange),
}

/// Records every call and answers from queued outcomes.
///
/// An empty queue answers with success. A held repository parks every call
/// until [`release`](MockAuthRepository::release) hands out a permit, which
/// keeps an operation in flight for as long as a test needs.
#[derive(Debug, Default)]
pub struct MockAuthRepository {
    logins: Mutex<VecDeque<Outcome<MockUser>>>,
    changes: Mutex<VecDeque<Outcome<()>>>,
    calls: Mutex<Vec<MockCall>>,
    gate: Option<Arc<Semaphore>>,
    delay: Option<Duration>,
}

impl MockAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn held() -> Self {
        MockAuthRepository {
            gate: Some(Arc::new(Semaphore::new(0))),
            ..Self::default()
        }
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        MockAuthRepository {
            delay: Some(delay),
            ..self
        }
    }

    pub fn push_login(&self, outcome: Outcome<MockUser>) {
        self.logins.lock().push_back(outcome);
    }

    pub fn push_change_password(&self, outcome: Outcome<()>) {
        self.changes.lock().push_back(outcome);
    }

    /// Lets one parked call through. Does nothing for a repository that is
    /// not held.
    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    async fn pass(&self) {
        if let Some(gate) = &self.gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
    }
}

impl AuthRepository for MockAuthRepository {
    type User = MockUser;

    fn login(&self, credential: Credential) -> impl Future<Output = Outcome<MockUser>> + Send {
        async move {
            self.calls.lock().push(MockCall::Login(credential.clone()));
            self.pass().await;
            let queued = self.logins.lock().pop_front();
            queued.unwrap_or_else(|| {
                Outcome::Success(MockUser {
                    email: credential.email,
                })
            })
        }
    }

    fn change_password(&self, change: PasswordChange) -> impl Future<Output = Outcome<()>> + Send {
        async move {
            self.calls.lock().push(MockCall::ChangePassword(change));
            self.pass().await;
            let queued = self.changes.lock().pop_front();
            queued.unwrap_or(Outcome::Success(()))
        }
    }
}
