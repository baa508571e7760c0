use crate::engine::{Command, Form};
use crate::message::Message;
use crate::replay::Replay;
use crate::subject::Subject;
use crate::validation::FieldValues;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Submitting { attempt: u64 },
}

/// Gates submit triggers and runs at most one operation at a time.
///
/// Lives on the engine task: `trigger` is called from the submit subject and
/// `settle` when the engine task receives the outcome of the running
/// operation.
pub(crate) struct SubmissionController<F: Form> {
    form: Arc<F>,
    phase: Phase,
    attempts: u64,
    values: Replay<FieldValues<F::Field>>,
    loading: Replay<bool>,
    messages: Subject<Message<F::Output>>,
    commands: UnboundedSender<Command<F>>,
    token: CancellationToken,
    engine: String,
}

impl<F: Form> SubmissionController<F> {
    pub(crate) fn new(
        form: Arc<F>,
        values: Replay<FieldValues<F::Field>>,
        loading: Replay<bool>,
        messages: Subject<Message<F::Output>>,
        commands: UnboundedSender<Command<F>>,
        token: CancellationToken,
        engine: String,
    ) -> Self {
        SubmissionController {
            form,
            phase: Phase::Idle,
            attempts: 0,
            values,
            loading,
            messages,
            commands,
            token,
            engine,
        }
    }

    /// Handles one submit trigger paired with the latest validity.
    pub(crate) fn trigger(&mut self, valid: bool) {
        if self.token.is_cancelled() {
            return;
        }
        if let Phase::Submitting { attempt } = self.phase {
            trace!(engine = %self.engine, attempt, "submit dropped, operation in flight");
            return;
        }
        if !valid {
            debug!(engine = %self.engine, "submit rejected, form is invalid");
            self.messages.emit(&Message::InvalidInput);
            return;
        }

        self.attempts += 1;
        let attempt = self.attempts;
        let request = self.form.request(&self.values.get());
        debug!(engine = %self.engine, attempt, ?request, "submitting");

        self.phase = Phase::Submitting { attempt };
        self.loading.emit_distinct(true);

        let form = Arc::clone(&self.form);
        let commands = self.commands.clone();
        let token = self.token.clone();
        let engine = self.engine.clone();
        tokio::spawn(async move {
            let outcome = form.submit(request).await;
            if token.is_cancelled() {
                debug!(%engine, attempt, "engine disposed, result discarded");
                return;
            }
            if commands.send(Command::Settled { attempt, outcome }).is_err() {
                trace!(%engine, attempt, "engine task stopped, result dropped");
            }
        });
    }

    /// Folds the outcome of the running operation into a message.
    pub(crate) fn settle(&mut self, attempt: u64, message: Message<F::Output>) {
        if self.token.is_cancelled() {
            debug!(engine = %self.engine, attempt, "engine disposed, result discarded");
            return;
        }
        if self.phase != (Phase::Submitting { attempt }) {
            trace!(engine = %self.engine, attempt, "stale settlement ignored");
            return;
        }
        debug!(
            engine = %self.engine,
            attempt,
            success = message.is_success(),
            "operation settled"
        );
        self.phase = Phase::Idle;
        self.messages.emit(&message);
        self.loading.emit_distinct(false);
    }
}
