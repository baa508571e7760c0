use crate::tracing_setup::tracing_init;
use formrx::{
    Activity, AuthRepository, ChangePasswordEngine, ChangePasswordForm, Credential, EngineConfig,
    FormStreamExt, LoginEngine, LoginField, LoginForm, Message, Outcome, PasswordChange, PasswordField,
    TracingProbe,
};
use futures::StreamExt;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

mod tracing_setup;

#[derive(Debug, Clone)]
struct User {
    email: String,
}

/// Accounts kept in memory, answering after a short pause.
struct InMemoryAuth {
    accounts: Mutex<HashMap<String, String>>,
    current: Mutex<Option<String>>,
    latency: Duration,
}

impl InMemoryAuth {
    fn with_account(email: &str, password: &str) -> Self {
        InMemoryAuth {
            accounts: Mutex::new(HashMap::from([(email.to_string(), password.to_string())])),
            current: Mutex::new(None),
            latency: Duration::from_millis(300),
        }
    }
}

impl AuthRepository for InMemoryAuth {
    type User = User;

    fn login(&self, credential: Credential) -> impl Future<Output = Outcome<User>> + Send {
        async move {
            sleep(self.latency).await;
            let known = match self.accounts.lock() {
                Ok(accounts) => accounts.get(&credential.email) == Some(&credential.password),
                Err(_) => return Outcome::failure("account store unavailable"),
            };
            if !known {
                return Outcome::failure("Invalid email or password");
            }
            if let Ok(mut current) = self.current.lock() {
                *current = Some(credential.email.clone());
            }
            Outcome::success(User {
                email: credential.email,
            })
        }
    }

    fn change_password(&self, change: PasswordChange) -> impl Future<Output = Outcome<()>> + Send {
        async move {
            sleep(self.latency).await;
            let email = match self.current.lock() {
                Ok(current) => current.clone(),
                Err(_) => None,
            };
            let Some(email) = email else {
                return Outcome::failure("Not logged in");
            };
            let Ok(mut accounts) = self.accounts.lock() else {
                return Outcome::failure("account store unavailable");
            };
            match accounts.get_mut(&email) {
                Some(password) if *password == change.password => {
                    *password = change.new_password;
                    Outcome::success(())
                }
                _ => Outcome::failure("Current password is wrong"),
            }
        }
    }
}

async fn type_slowly(engine: &LoginEngine<InMemoryAuth>, field: LoginField, text: &str) {
    let mut typed = String::new();
    for c in text.chars() {
        typed.push(c);
        if let Err(error) = engine.input(field, typed.clone()) {
            warn!(%error, "keystroke lost");
        }
        sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::main]
async fn main() {
    tracing_init();

    let repository = Arc::new(InMemoryAuth::with_account("ada@example.com", "analytical"));

    info!("==========================================");
    warn!("screen: login");

    let login = LoginEngine::with_config(
        LoginForm::new(repository.clone()),
        EngineConfig::default()
            .with_name("login-screen")
            .with_probe(TracingProbe),
    );

    let mut email_errors = login.error(LoginField::Email).expect("email is a login field");
    tokio::spawn(async move {
        while let Some(error) = email_errors.next().await {
            info!("  Renderer | email error: {:?}", error);
        }
    });
    let activity = login.activity();
    let renderer = tokio::spawn(async move {
        activity
            .for_each(|activity| async move {
                match activity {
                    Activity::Loading(loading) => info!("  Renderer | loading: {}", loading),
                    Activity::Message(Message::Success(user)) => {
                        info!("  Renderer | welcome {}", user.email)
                    }
                    Activity::Message(message) => info!("  Renderer | message: {:?}", message),
                }
            })
            .await;
    });

    type_slowly(&login, LoginField::Email, "ada@example").await;
    // the tap lands before the address is complete
    let _ = login.submit();
    type_slowly(&login, LoginField::Email, "ada@example.com").await;
    type_slowly(&login, LoginField::Password, "analytical").await;
    for _ in 0..3 {
        let _ = login.submit();
    }

    let states = login.state();
    states
        .stop_if(|state| state.message.is_some())
        .for_each(|state| async move {
            info!("  Main | state: {:?}", state);
        })
        .await;

    login.dispose();
    let _ = renderer.await;

    info!("==========================================");
    warn!("screen: change password");

    let change = ChangePasswordEngine::new(ChangePasswordForm::new(repository.clone()));
    let _ = change.input(PasswordField::Password, "analytical");
    let _ = change.input(PasswordField::NewPassword, "analytical");
    if let Ok(snapshot) = change.snapshot().await {
        info!("  Main | same password: {:?}", snapshot.errors);
    }
    let _ = change.input(PasswordField::NewPassword, "difference-engine");
    let _ = change.submit();

    change
        .state()
        .until_complete()
        .for_each(|state| async move {
            info!("  Main | state: {:?}", state);
        })
        .await;

    change.dispose();
    sleep(Duration::from_millis(50)).await;
    info!("==========================================");
    info!("  Main | Finish");
}
