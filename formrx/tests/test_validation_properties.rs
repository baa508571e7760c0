use crate::common::{change_password_engine, login_engine};
use formrx::mock::MockAuthRepository;
use formrx::validation::{
    distinct_password_error, email_error, is_valid_email, is_valid_password, password_error,
    SAME_PASSWORD,
};
use formrx::{LoginField, PasswordField, SubjectStream};
use proptest::prelude::*;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};

mod common;

fn runtime() -> Runtime {
    Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

fn text(alphabet: &'static [char], len: std::ops::Range<usize>) -> impl Strategy<Value = String> {
    prop::collection::vec(prop::sample::select(alphabet), len)
        .prop_map(|chars| chars.into_iter().collect())
}

fn email() -> impl Strategy<Value = String> {
    prop_oneof![
        text(&['a', 'b', '@', '.', ' '], 0..10),
        (
            text(&['a', 'b'], 0..4),
            text(&['a', 'b'], 0..4),
            text(&['c', 'o'], 0..3)
        )
            .prop_map(|(local, domain, tld)| format!("{local}@{domain}.{tld}")),
    ]
}

fn password() -> impl Strategy<Value = String> {
    text(&['a', 'b', '1', '2'], 0..9)
}

fn login_inputs() -> impl Strategy<Value = Vec<(LoginField, String)>> {
    prop::collection::vec(
        prop_oneof![
            email().prop_map(|value| (LoginField::Email, value)),
            password().prop_map(|value| (LoginField::Password, value)),
        ],
        1..16,
    )
}

fn password_inputs() -> impl Strategy<Value = Vec<(PasswordField, String)>> {
    prop::collection::vec(
        prop_oneof![
            password().prop_map(|value| (PasswordField::Password, value)),
            password().prop_map(|value| (PasswordField::NewPassword, value)),
        ],
        1..16,
    )
}

/// Two passwords long enough to pass the length rule, equal about half the time.
fn password_pair() -> impl Strategy<Value = (String, String)> {
    let long = || text(&['a', 'b', '1'], 6..9);
    (long(), long(), any::<bool>()).prop_map(|(first, second, same)| {
        if same {
            (first.clone(), first)
        } else {
            (first, second)
        }
    })
}

fn drain<T>(stream: &mut SubjectStream<T>) -> Vec<T> {
    std::iter::from_fn(|| stream.try_next()).collect()
}

fn has_repeats<T: PartialEq>(values: &[T]) -> bool {
    values.windows(2).any(|pair| pair[0] == pair[1])
}

proptest! {
    #[test]
    fn test_login_validity_follows_field_rules(inputs in login_inputs()) {
        runtime().block_on(async {
            let repository = Arc::new(MockAuthRepository::new());
            let engine = login_engine(&repository);
            let mut email_errors = engine.error(LoginField::Email).expect("declared field");
            let mut password_errors = engine.error(LoginField::Password).expect("declared field");
            let mut validity = engine.validity();
            let (mut email, mut password) = (String::new(), String::new());

            for (field, value) in inputs {
                match field {
                    LoginField::Email => email = value.clone(),
                    LoginField::Password => password = value.clone(),
                }
                engine.input(field, value).expect("live engine");
                let snapshot = engine.snapshot().await.expect("snapshot");

                prop_assert_eq!(
                    snapshot.is_valid,
                    is_valid_email(&email) && is_valid_password(&password)
                );
                prop_assert_eq!(
                    snapshot.error(LoginField::Email).map(str::to_string),
                    email_error(&email)
                );
                prop_assert_eq!(
                    snapshot.error(LoginField::Password).map(str::to_string),
                    password_error(&password)
                );
            }

            let emails = drain(&mut email_errors);
            let passwords = drain(&mut password_errors);
            let validities = drain(&mut validity);
            prop_assert!(!has_repeats(&emails), "repeated email error in {:?}", emails);
            prop_assert!(!has_repeats(&passwords), "repeated password error in {:?}", passwords);
            prop_assert!(!has_repeats(&validities), "repeated validity in {:?}", validities);
            prop_assert_eq!(emails.last().cloned().flatten(), email_error(&email));
            prop_assert_eq!(passwords.last().cloned().flatten(), password_error(&password));
            Ok(())
        })?;
    }

    #[test]
    fn test_change_password_validity_follows_field_rules(inputs in password_inputs()) {
        runtime().block_on(async {
            let repository = Arc::new(MockAuthRepository::new());
            let engine = change_password_engine(&repository);
            let mut current_errors = engine.error(PasswordField::Password).expect("declared field");
            let mut new_errors = engine.error(PasswordField::NewPassword).expect("declared field");
            let (mut current, mut new) = (String::new(), String::new());

            for (field, value) in inputs {
                match field {
                    PasswordField::Password => current = value.clone(),
                    PasswordField::NewPassword => new = value.clone(),
                }
                engine.input(field, value).expect("live engine");
                let snapshot = engine.snapshot().await.expect("snapshot");
                let current_error = distinct_password_error(&current, &new);
                let new_error = distinct_password_error(&new, &current);

                prop_assert_eq!(snapshot.is_valid, current_error.is_none() && new_error.is_none());
                prop_assert_eq!(
                    snapshot.error(PasswordField::Password).map(str::to_string),
                    current_error
                );
                prop_assert_eq!(
                    snapshot.error(PasswordField::NewPassword).map(str::to_string),
                    new_error
                );
            }

            let currents = drain(&mut current_errors);
            let news = drain(&mut new_errors);
            prop_assert!(!has_repeats(&currents), "repeated error in {:?}", currents);
            prop_assert!(!has_repeats(&news), "repeated error in {:?}", news);
            Ok(())
        })?;
    }

    #[test]
    fn test_same_password_rule_is_symmetric((current, new) in password_pair()) {
        runtime().block_on(async {
            let repository = Arc::new(MockAuthRepository::new());
            let engine = change_password_engine(&repository);

            engine.input(PasswordField::Password, current.clone()).expect("live engine");
            engine.input(PasswordField::NewPassword, new.clone()).expect("live engine");
            let snapshot = engine.snapshot().await.expect("snapshot");

            let expected = (current == new).then_some(SAME_PASSWORD);
            prop_assert_eq!(snapshot.error(PasswordField::Password), expected);
            prop_assert_eq!(snapshot.error(PasswordField::NewPassword), expected);
            prop_assert_eq!(snapshot.is_valid, current != new);
            Ok(())
        })?;
    }
}
