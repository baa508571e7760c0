use super::{AuthRepository, PasswordChange};
use crate::engine::{Form, FormEngine};
use crate::outcome::Outcome;
use crate::validation::{distinct_password_error, FieldValues};
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum PasswordField {
    Password,
    NewPassword,
}

pub type ChangePasswordEngine<R> = FormEngine<ChangePasswordForm<R>>;

/// Current and new password. Both need six characters and must differ; an
/// equal pair flags both fields.
pub struct ChangePasswordForm<R> {
    repository: Arc<R>,
}

impl<R> ChangePasswordForm<R> {
    pub fn new(repository: Arc<R>) -> Self {
        ChangePasswordForm { repository }
    }
}

impl<R: AuthRepository> Form for ChangePasswordForm<R> {
    type Field = PasswordField;
    type Request = PasswordChange;
    type Output = ();

    fn name(&self) -> &'static str {
        "change_password"
    }

    fn fields(&self) -> &'static [PasswordField] {
        &[PasswordField::Password, PasswordField::NewPassword]
    }

    fn validate(&self, field: PasswordField, values: &FieldValues<PasswordField>) -> Option<String> {
        let password = values.get(PasswordField::Password);
        let new_password = values.get(PasswordField::NewPassword);
        match field {
            PasswordField::Password => distinct_password_error(password, new_password),
            PasswordField::NewPassword => distinct_password_error(new_password, password),
        }
    }

    fn request(&self, values: &FieldValues<PasswordField>) -> PasswordChange {
        PasswordChange {
            password: values.get(PasswordField::Password).to_string(),
            new_password: values.get(PasswordField::NewPassword).to_string(),
        }
    }

    fn submit(&self, request: PasswordChange) -> impl Future<Output = Outcome<()>> + Send {
        self.repository.change_password(request)
    }

    fn success_message(&self, _: &()) -> String {
        "Change password successfully".to_string()
    }
}
