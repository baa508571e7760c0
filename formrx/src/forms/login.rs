use super::{AuthRepository, Credential};
use crate::engine::{Form, FormEngine};
use crate::outcome::Outcome;
use crate::validation::{email_error, password_error, FieldValues};
use std::future::Future;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum LoginField {
    Email,
    Password,
}

pub type LoginEngine<R> = FormEngine<LoginForm<R>>;

/// Email and password login. The form counts as invalid while a login is in
/// flight.
pub struct LoginForm<R> {
    repository: Arc<R>,
}

impl<R> LoginForm<R> {
    pub fn new(repository: Arc<R>) -> Self {
        LoginForm { repository }
    }
}

impl<R: AuthRepository> Form for LoginForm<R> {
    type Field = LoginField;
    type Request = Credential;
    type Output = R::User;

    fn name(&self) -> &'static str {
        "login"
    }

    fn fields(&self) -> &'static [LoginField] {
        &[LoginField::Email, LoginField::Password]
    }

    fn validate(&self, field: LoginField, values: &FieldValues<LoginField>) -> Option<String> {
        match field {
            LoginField::Email => email_error(values.get(LoginField::Email)),
            LoginField::Password => password_error(values.get(LoginField::Password)),
        }
    }

    fn request(&self, values: &FieldValues<LoginField>) -> Credential {
        Credential {
            email: values.get(LoginField::Email).to_string(),
            password: values.get(LoginField::Password).to_string(),
        }
    }

    fn submit(&self, request: Credential) -> impl Future<Output = Outcome<R::User>> + Send {
        self.repository.login(request)
    }

    fn gates_on_loading(&self) -> bool {
        true
    }

    fn success_message(&self, _user: &R::User) -> String {
        "Login successfully".to_string()
    }
}
