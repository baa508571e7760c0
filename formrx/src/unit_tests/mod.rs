use crate::mock::MockAuthRepository;
use crate::Probe;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

mod engine_test;

pub fn repository() -> Arc<MockAuthRepository> {
    Arc::new(MockAuthRepository::new())
}

pub fn held_repository() -> Arc<MockAuthRepository> {
    Arc::new(MockAuthRepository::held())
}

/// Collects every probe record as `engine/stream=value`.
#[derive(Default)]
pub struct Recorder(Mutex<Vec<String>>);

impl Recorder {
    pub fn records(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

impl Probe for Arc<Recorder> {
    fn record(&self, engine: &str, stream: &str, value: &dyn fmt::Debug) {
        self.0.lock().push(format!("{engine}/{stream}={value:?}"));
    }
}
