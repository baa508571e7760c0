use crate::lifecycle::Lifecycle;
use crate::ops;
use crate::replay::Replay;
use crate::subject::{Source, Subject};
use std::fmt::Debug;

pub const INVALID_EMAIL: &str = "Invalid email address";
pub const PASSWORD_TOO_SHORT: &str = "Min length of password is 6 characters";
pub const SAME_PASSWORD: &str = "New password is same old password";

pub const MIN_PASSWORD_LENGTH: usize = 6;

/// The latest value of every field of a form, each seeded with `""`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FieldValues<F> {
    entries: Vec<(F, String)>,
}

impl<F: Copy + Eq> FieldValues<F> {
    pub fn seeded(fields: &[F]) -> Self {
        FieldValues {
            entries: fields.iter().map(|field| (*field, String::new())).collect(),
        }
    }

    /// The value of `field`; `""` for a field the form does not declare.
    pub fn get(&self, field: F) -> &str {
        self.entries
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    pub fn contains(&self, field: F) -> bool {
        self.entries.iter().any(|(f, _)| *f == field)
    }

    pub fn with(mut self, field: F, value: &str) -> Self {
        if let Some((_, slot)) = self.entries.iter_mut().find(|(f, _)| *f == field) {
            slot.clear();
            slot.push_str(value);
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (F, &str)> {
        self.entries.iter().map(|(f, v)| (*f, v.as_str()))
    }
}

/// A deliberately small address check: one `@`, a non-empty local part and a
/// dotted domain without blank labels or whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

pub fn is_valid_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}

pub fn email_error(email: &str) -> Option<String> {
    (!is_valid_email(email)).then(|| INVALID_EMAIL.to_string())
}

pub fn password_error(password: &str) -> Option<String> {
    (!is_valid_password(password)).then(|| PASSWORD_TOO_SHORT.to_string())
}

/// Error for one of two passwords that must differ. The length rule wins;
/// otherwise equal passwords flag both fields and distinct ones clear both.
pub fn distinct_password_error(password: &str, other: &str) -> Option<String> {
    password_error(password).or_else(|| (password == other).then(|| SAME_PASSWORD.to_string()))
}

/// Streams derived from the field subjects of one engine.
pub(crate) struct ValidationStreams<F> {
    pub values: Replay<FieldValues<F>>,
    pub errors: Vec<(F, Replay<Option<String>>)>,
    pub validity: Replay<bool>,
}

/// Wires the field subjects into the latest-values record, one distinct error
/// stream per field and the aggregate validity. When `gate_on_loading` is set
/// the form counts as invalid while `loading` is true.
pub(crate) fn wire<F, V>(
    inputs: &[(F, Subject<String>)],
    loading: &Replay<bool>,
    gate_on_loading: bool,
    lifecycle: &Lifecycle,
    validate: V,
) -> ValidationStreams<F>
where
    F: Copy + Eq + Debug + Send + Sync + 'static,
    V: Fn(F, &FieldValues<F>) -> Option<String> + Clone + Send + Sync + 'static,
{
    let fields: Vec<F> = inputs.iter().map(|(field, _)| *field).collect();

    // combine-latest over the field subjects
    let values = Replay::new(FieldValues::seeded(&fields));
    lifecycle.track(&values);
    for (field, subject) in inputs {
        let (field, values) = (*field, values.clone());
        lifecycle.own(subject.subscribe(move |value: &String| {
            values.update(|latest| latest.with(field, value));
        }));
    }

    let errors: Vec<(F, Replay<Option<String>>)> = fields
        .iter()
        .map(|field| {
            let (field, validate) = (*field, validate.clone());
            let error = ops::map_distinct(&values, lifecycle, move |latest| validate(field, latest));
            (field, error)
        })
        .collect();

    let all_valid = {
        let fields = fields.clone();
        ops::map_distinct(&values, lifecycle, move |latest| {
            fields.iter().all(|field| validate(*field, latest).is_none())
        })
    };

    let validity = ops::combine_latest(&all_valid, loading, lifecycle, move |valid, loading| {
        *valid && !(gate_on_loading && *loading)
    });

    ValidationStreams {
        values,
        errors,
        validity,
    }
}
