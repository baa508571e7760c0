use crate::unit_tests::{held_repository, repository, Recorder};
use crate::validation::{INVALID_EMAIL, PASSWORD_TOO_SHORT};
use crate::{
    EngineConfig, FieldValues, Form, FormEngine, FormError, FormState, LoginEngine, LoginField,
    LoginForm, Message, Outcome,
};
use futures::StreamExt;
use futures_signals::signal::SignalExt;
use std::future::Future;
use std::sync::Arc;

#[tokio::test]
async fn test_initial_snapshot() -> Result<(), FormError> {
    let engine = LoginEngine::new(LoginForm::new(repository()));

    let snapshot = engine.snapshot().await?;

    assert_eq!(snapshot.values.get(LoginField::Email), "");
    assert_eq!(snapshot.error(LoginField::Email), Some(INVALID_EMAIL));
    assert_eq!(snapshot.error(LoginField::Password), Some(PASSWORD_TOO_SHORT));
    assert!(!snapshot.is_valid);
    assert!(!snapshot.is_loading);
    assert_eq!(snapshot.state, FormState::idle());
    Ok(())
}

#[tokio::test]
async fn test_snapshot_sees_every_queued_input() -> Result<(), FormError> {
    let engine = LoginEngine::new(LoginForm::new(repository()));

    engine.input(LoginField::Email, "ada")?;
    engine.input(LoginField::Email, "ada@example.com")?;
    engine.input(LoginField::Password, "abc123")?;
    let snapshot = engine.snapshot().await?;

    assert_eq!(snapshot.values.get(LoginField::Email), "ada@example.com");
    assert_eq!(snapshot.values.get(LoginField::Password), "abc123");
    assert_eq!(snapshot.error(LoginField::Email), None);
    assert_eq!(snapshot.error(LoginField::Password), None);
    assert!(snapshot.is_valid);
    Ok(())
}

#[tokio::test]
async fn test_values_stream_replays_latest() -> Result<(), FormError> {
    let engine = LoginEngine::new(LoginForm::new(repository()));
    engine.input(LoginField::Email, "ada@example.com")?;
    engine.snapshot().await?;

    let mut values = engine.values();
    let latest = values.next().await.expect("replayed value");

    assert_eq!(latest.get(LoginField::Email), "ada@example.com");
    assert!(values.try_next().is_none());
    Ok(())
}

#[tokio::test]
async fn test_request_is_snapshotted_at_submit() -> Result<(), FormError> {
    let repository = held_repository();
    let engine = LoginEngine::new(LoginForm::new(repository.clone()));
    let mut messages = engine.messages();

    engine.input(LoginField::Email, "ada@example.com")?;
    engine.input(LoginField::Password, "abc123")?;
    engine.submit()?;
    // typed after the submission was accepted
    engine.input(LoginField::Password, "changed-later")?;
    engine.snapshot().await?;

    repository.release();
    let message = messages.next().await.expect("a message");

    assert!(message.is_success());
    assert_eq!(
        repository.calls(),
        vec![crate::mock::MockCall::Login(crate::Credential {
            email: "ada@example.com".to_string(),
            password: "abc123".to_string(),
        })]
    );
    Ok(())
}

#[tokio::test]
async fn test_login_is_invalid_while_loading() -> Result<(), FormError> {
    let repository = held_repository();
    let engine = LoginEngine::new(LoginForm::new(repository.clone()));
    let mut messages = engine.messages();

    engine.input(LoginField::Email, "ada@example.com")?;
    engine.input(LoginField::Password, "abc123")?;
    assert!(engine.snapshot().await?.is_valid);

    engine.submit()?;
    let during = engine.snapshot().await?;
    assert!(during.is_loading);
    assert!(!during.is_valid);
    assert_eq!(during.state, FormState::loading());

    repository.release();
    messages.next().await;
    let after = engine.snapshot().await?;
    assert!(!after.is_loading);
    assert!(after.is_valid);
    Ok(())
}

#[tokio::test]
async fn test_failure_keeps_cause() -> Result<(), FormError> {
    #[derive(Debug, thiserror::Error)]
    #[error("socket closed")]
    struct SocketClosed;

    let repository = repository();
    repository.push_login(Outcome::failure_with_cause("network down", SocketClosed));
    let engine = LoginEngine::new(LoginForm::new(repository.clone()));
    let mut messages = engine.messages();

    engine.input(LoginField::Email, "ada@example.com")?;
    engine.input(LoginField::Password, "abc123")?;
    engine.submit()?;

    match messages.next().await {
        Some(Message::Error { message, cause }) => {
            assert_eq!(message, "network down");
            assert_eq!(cause.map(|c| c.to_string()).as_deref(), Some("socket closed"));
        }
        other => panic!("expected an error message, got {other:?}"),
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoteField {
    Title,
    Body,
}

/// Declares only the title; the body is never tracked.
struct NoteForm;

impl Form for NoteForm {
    type Field = NoteField;
    type Request = String;
    type Output = String;

    fn fields(&self) -> &'static [NoteField] {
        &[NoteField::Title]
    }

    fn validate(&self, field: NoteField, values: &FieldValues<NoteField>) -> Option<String> {
        values.get(field).is_empty().then(|| "required".to_string())
    }

    fn request(&self, values: &FieldValues<NoteField>) -> String {
        values.get(NoteField::Title).to_string()
    }

    fn submit(&self, request: String) -> impl Future<Output = Outcome<String>> + Send {
        std::future::ready(Outcome::Success(request))
    }
}

#[tokio::test]
async fn test_undeclared_field_is_rejected() {
    let engine = FormEngine::new(NoteForm);

    assert_eq!(
        engine.input(NoteField::Body, "text"),
        Err(FormError::UnknownField("Body".to_string()))
    );
    assert!(engine.error(NoteField::Body).is_err());
    assert!(engine.error(NoteField::Title).is_ok());
}

#[tokio::test]
async fn test_custom_form_round_trip() -> Result<(), FormError> {
    let engine = FormEngine::new(NoteForm);
    let mut messages = engine.messages();

    engine.submit()?;
    engine.input(NoteField::Title, "groceries")?;
    engine.submit()?;

    assert_eq!(messages.next().await, Some(Message::InvalidInput));
    assert_eq!(messages.next().await, Some(Message::Success("groceries".to_string())));
    assert_eq!(engine.name(), "form");
    Ok(())
}

#[tokio::test]
async fn test_state_signal_tracks_latest_state() -> Result<(), FormError> {
    let repository = repository();
    repository.push_login(Outcome::failure("network down"));
    let engine = LoginEngine::new(LoginForm::new(repository));
    let mut messages = engine.messages();

    engine.input(LoginField::Email, "ada@example.com")?;
    engine.input(LoginField::Password, "abc123")?;
    engine.submit()?;
    messages.next().await;
    engine.snapshot().await?;

    let rendered = engine.state_signal().to_stream().next().await;
    assert_eq!(rendered, Some(FormState::failed("network down")));
    assert_eq!(engine.current_state(), FormState::failed("network down"));
    Ok(())
}

#[tokio::test]
async fn test_probe_records_named_streams() -> Result<(), FormError> {
    let recorder = Arc::new(Recorder::default());
    let config = EngineConfig::default()
        .with_name("screen-1")
        .with_probe(recorder.clone());
    let engine = LoginEngine::with_config(LoginForm::new(repository()), config);

    engine.input(LoginField::Email, "ada@example.com")?;
    engine.snapshot().await?;

    let records = recorder.records();
    assert_eq!(engine.name(), "screen-1");
    assert!(records.contains(&"screen-1/input:Email=\"ada@example.com\"".to_string()));
    assert!(records.contains(&"screen-1/error:Email=None".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_default_name_comes_from_form() {
    let engine = LoginEngine::new(LoginForm::new(repository()));
    assert_eq!(engine.name(), "login");
}

#[tokio::test]
async fn test_subscribers_share_one_computation() -> Result<(), FormError> {
    let engine = LoginEngine::new(LoginForm::new(repository()));
    let mut first = engine.validity();
    let mut second = engine.validity();

    engine.input(LoginField::Email, "ada@example.com")?;
    engine.input(LoginField::Password, "abc123")?;
    engine.snapshot().await?;

    assert_eq!(first.try_next(), Some(false));
    assert_eq!(first.try_next(), Some(true));
    assert_eq!(second.try_next(), Some(false));
    assert_eq!(second.try_next(), Some(true));
    Ok(())
}
