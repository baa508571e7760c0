//! Reactive engine for form-driven screens.
//!
//! A [`FormEngine`] turns raw field input and submit taps into per-field
//! validation errors, an aggregate validity flag, a loading flag and a stream
//! of [`Message`]s, calling an external operation at most once at a time.
//! Each engine runs its own task; every emission of an engine happens on that
//! task, in the order inputs were queued.

mod controller;
mod engine;
mod error;
mod lifecycle;
mod message;
mod outcome;
mod replay;
mod stream_ext;
mod subject;

pub mod forms;
pub mod mock;
pub mod ops;
pub mod validation;

pub use engine::*;
pub use error::*;
pub use forms::*;
pub use lifecycle::*;
pub use message::*;
pub use outcome::*;
pub use replay::*;
pub use stream_ext::*;
pub use subject::*;
pub use validation::FieldValues;

#[cfg(test)]
mod unit_tests;
