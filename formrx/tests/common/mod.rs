#![allow(dead_code)]

use formrx::mock::MockAuthRepository;
use formrx::{
    ends_round, Activity, ChangePasswordEngine, ChangePasswordForm, FormStreamExt, LoginEngine,
    LoginForm, SubjectStream,
};
use futures::StreamExt;
use std::sync::Arc;

pub fn login_engine(repository: &Arc<MockAuthRepository>) -> LoginEngine<MockAuthRepository> {
    LoginEngine::new(LoginForm::new(repository.clone()))
}

pub fn change_password_engine(
    repository: &Arc<MockAuthRepository>,
) -> ChangePasswordEngine<MockAuthRepository> {
    ChangePasswordEngine::new(ChangePasswordForm::new(repository.clone()))
}

/// Collects activity until the current submission round is over.
pub async fn one_round<T>(activity: SubjectStream<Activity<T>>) -> Vec<Activity<T>> {
    activity.stop_if(ends_round).collect().await
}
