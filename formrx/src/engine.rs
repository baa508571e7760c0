use crate::controller::SubmissionController;
use crate::error::FormError;
use crate::lifecycle::{Lifecycle, Probe};
use crate::message::{Activity, FormState, Message};
use crate::ops;
use crate::outcome::Outcome;
use crate::replay::Replay;
use crate::subject::{Source, Subject, SubjectStream};
use crate::validation::{self, FieldValues};
use futures_signals::signal::MutableSignalCloned;
use parking_lot::Mutex;
use std::fmt::{self, Debug};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// One kind of form screen: its fields, their rules and the operation a
/// valid submission calls.
pub trait Form: Send + Sync + 'static {
    type Field: Copy + Eq + Debug + Send + Sync + 'static;
    /// Snapshot of the fields taken when a submission is accepted.
    type Request: Debug + Send + 'static;
    type Output: Debug + Clone + Send + Sync + 'static;

    /// Label for tracing output when the config does not name the engine.
    fn name(&self) -> &'static str {
        "form"
    }

    fn fields(&self) -> &'static [Self::Field];

    /// The error to show for `field`, or `None` when it is valid. May look at
    /// other fields for cross-field rules.
    fn validate(&self, field: Self::Field, values: &FieldValues<Self::Field>) -> Option<String>;

    fn request(&self, values: &FieldValues<Self::Field>) -> Self::Request;

    fn submit(&self, request: Self::Request) -> impl Future<Output = Outcome<Self::Output>> + Send;

    /// Whether an operation in flight makes the whole form invalid.
    fn gates_on_loading(&self) -> bool {
        false
    }

    /// Text for [`FormState::message`] after a successful submission.
    fn success_message(&self, _output: &Self::Output) -> String {
        "Success".to_string()
    }
}

/// Engine settings. The name labels tracing output; the probe, when set,
/// sees every value of every stream the engine creates.
#[derive(Clone, Default)]
pub struct EngineConfig {
    pub name: String,
    pub probe: Option<Arc<dyn Probe>>,
}

impl EngineConfig {
    pub fn with_name(self, name: impl Into<String>) -> Self {
        EngineConfig {
            name: name.into(),
            ..self
        }
    }

    pub fn with_probe(self, probe: impl Probe) -> Self {
        EngineConfig {
            probe: Some(Arc::new(probe)),
            ..self
        }
    }
}

impl Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("name", &self.name)
            .field("probe", &self.probe.is_some())
            .finish()
    }
}

/// Consistent view of an engine, taken on the engine task between two
/// commands.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Snapshot<F> {
    pub values: FieldValues<F>,
    pub errors: Vec<(F, Option<String>)>,
    pub is_valid: bool,
    pub is_loading: bool,
    pub state: FormState,
}

impl<F: Copy + Eq> Snapshot<F> {
    pub fn error(&self, field: F) -> Option<&str> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .and_then(|(_, error)| error.as_deref())
    }
}

pub(crate) enum Command<F: Form> {
    Input { field: F::Field, value: String },
    Submit,
    Settled { attempt: u64, outcome: Outcome<F::Output> },
    Snapshot(oneshot::Sender<Snapshot<F::Field>>),
}

struct Streams<F: Form> {
    inputs: Vec<(F::Field, Subject<String>)>,
    submits: Subject<()>,
    values: Replay<FieldValues<F::Field>>,
    errors: Vec<(F::Field, Replay<Option<String>>)>,
    validity: Replay<bool>,
    loading: Replay<bool>,
    messages: Subject<Message<F::Output>>,
    activity: Subject<Activity<F::Output>>,
    state: Replay<FormState>,
}

impl<F: Form> Clone for Streams<F> {
    fn clone(&self) -> Self {
        Streams {
            inputs: self.inputs.clone(),
            submits: self.submits.clone(),
            values: self.values.clone(),
            errors: self.errors.clone(),
            validity: self.validity.clone(),
            loading: self.loading.clone(),
            messages: self.messages.clone(),
            activity: self.activity.clone(),
            state: self.state.clone(),
        }
    }
}

impl<F: Form> Streams<F> {
    fn input(&self, field: F::Field) -> Option<&Subject<String>> {
        self.inputs
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, subject)| subject)
    }

    fn error(&self, field: F::Field) -> Option<&Replay<Option<String>>> {
        self.errors
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, error)| error)
    }

    fn snapshot(&self) -> Snapshot<F::Field> {
        Snapshot {
            values: self.values.get(),
            errors: self
                .errors
                .iter()
                .map(|(field, error)| (*field, error.get()))
                .collect(),
            is_valid: self.validity.get(),
            is_loading: self.loading.get(),
            state: self.state.get(),
        }
    }

    fn observe(&self, lifecycle: &Lifecycle) {
        for (field, input) in &self.inputs {
            lifecycle.observe(format!("input:{field:?}"), input);
        }
        lifecycle.observe("submit", &self.submits);
        lifecycle.observe("values", &self.values);
        for (field, error) in &self.errors {
            lifecycle.observe(format!("error:{field:?}"), error);
        }
        lifecycle.observe("validity", &self.validity);
        lifecycle.observe("loading", &self.loading);
        lifecycle.observe("messages", &self.messages);
        lifecycle.observe("state", &self.state);
    }
}

/// The engine task: every command is handled here, one at a time, so all
/// subject emissions of an engine happen on a single timeline.
struct Timeline<F: Form> {
    streams: Streams<F>,
    controller: Arc<Mutex<SubmissionController<F>>>,
}

impl<F: Form> Timeline<F> {
    async fn run(self, mut commands: UnboundedReceiver<Command<F>>, token: CancellationToken) {
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                command = commands.recv() => match command {
                    Some(command) => self.dispatch(command),
                    None => break,
                },
            }
        }
        debug!("engine task stopped");
    }

    fn dispatch(&self, command: Command<F>) {
        match command {
            Command::Input { field, value } => {
                if let Some(input) = self.streams.input(field) {
                    input.emit(&value);
                }
            }
            Command::Submit => self.streams.submits.emit(&()),
            Command::Settled { attempt, outcome } => {
                self.controller.lock().settle(attempt, Message::from(outcome));
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.streams.snapshot());
            }
        }
    }
}

/// A running form engine.
///
/// Inputs and submit triggers are queued to the engine task and processed in
/// call order; the derived streams can be subscribed to from anywhere. Every
/// stream handed out replays its latest value on subscription except
/// [`messages`](FormEngine::messages) and [`activity`](FormEngine::activity),
/// which only carry what happens afterwards.
///
/// Must be created inside a tokio runtime. Dropping the engine disposes it.
pub struct FormEngine<F: Form> {
    form: Arc<F>,
    streams: Streams<F>,
    commands: UnboundedSender<Command<F>>,
    lifecycle: Arc<Lifecycle>,
}

impl<F: Form> FormEngine<F> {
    pub fn new(form: F) -> Self {
        Self::with_config(form, EngineConfig::default())
    }

    pub fn with_config(form: F, config: EngineConfig) -> Self {
        let form = Arc::new(form);
        let name = if config.name.is_empty() {
            form.name().to_string()
        } else {
            config.name
        };
        let lifecycle = Arc::new(Lifecycle::new(name.clone(), config.probe));
        let (commands, receiver) = mpsc::unbounded_channel();

        let inputs: Vec<(F::Field, Subject<String>)> = form
            .fields()
            .iter()
            .map(|field| (*field, Subject::new()))
            .collect();
        for (_, input) in &inputs {
            lifecycle.track(input);
        }
        let submits: Subject<()> = Subject::new();
        lifecycle.track(&submits);
        let loading = Replay::new(false);
        lifecycle.track(&loading);
        let messages: Subject<Message<F::Output>> = Subject::new();
        lifecycle.track(&messages);

        let validation = {
            let form = Arc::clone(&form);
            validation::wire(
                &inputs,
                &loading,
                form.gates_on_loading(),
                &lifecycle,
                move |field, values: &FieldValues<F::Field>| form.validate(field, values),
            )
        };

        let controller = Arc::new(Mutex::new(SubmissionController::new(
            Arc::clone(&form),
            validation.values.clone(),
            loading.clone(),
            messages.clone(),
            commands.clone(),
            lifecycle.token(),
            name.clone(),
        )));
        {
            let controller = Arc::clone(&controller);
            ops::with_latest_from(
                &submits,
                &validation.validity,
                &lifecycle,
                move |_: &(), valid| controller.lock().trigger(valid),
            );
        }

        let activity = ops::merge(
            &loading,
            &messages,
            &lifecycle,
            |loading: &bool| Activity::Loading(*loading),
            |message: &Message<F::Output>| Activity::Message(message.clone()),
        );
        let state = {
            let form = Arc::clone(&form);
            ops::fold(
                &activity,
                &lifecycle,
                FormState::idle(),
                move |state: FormState, activity: &Activity<F::Output>| {
                    state.apply(activity, |output| form.success_message(output))
                },
            )
        };

        let streams = Streams {
            inputs,
            submits,
            values: validation.values,
            errors: validation.errors,
            validity: validation.validity,
            loading,
            messages,
            activity,
            state,
        };
        streams.observe(&lifecycle);

        let timeline = Timeline {
            streams: streams.clone(),
            controller,
        };
        tokio::spawn(timeline.run(receiver, lifecycle.token()));
        debug!(engine = %name, fields = streams.inputs.len(), "engine started");

        FormEngine {
            form,
            streams,
            commands,
            lifecycle,
        }
    }

    /// The form this engine runs.
    pub fn form(&self) -> &F {
        &self.form
    }

    /// The configured name, or the form's own name when none was given.
    pub fn name(&self) -> &str {
        self.lifecycle.name()
    }

    /// Queues a new value for `field`.
    pub fn input(&self, field: F::Field, value: impl Into<String>) -> Result<(), FormError> {
        self.ensure_live()?;
        if self.streams.input(field).is_none() {
            return Err(FormError::unknown_field(field));
        }
        self.send(Command::Input {
            field,
            value: value.into(),
        })
    }

    /// Queues a submit trigger.
    pub fn submit(&self) -> Result<(), FormError> {
        self.ensure_live()?;
        self.send(Command::Submit)
    }

    /// Waits until every command queued before this call has been handled and
    /// returns the resulting state.
    pub async fn snapshot(&self) -> Result<Snapshot<F::Field>, FormError> {
        self.ensure_live()?;
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx))?;
        rx.await.map_err(|_| FormError::Stopped)
    }

    /// The latest value of every field, replayed on subscription.
    ///
    /// Values follow inputs in call order; a value typed after a submission
    /// was accepted does not change the request of that submission.
    pub fn values(&self) -> SubjectStream<FieldValues<F::Field>> {
        self.streams.values.to_stream()
    }

    /// The validation error of `field`: `None` while the field is valid,
    /// otherwise the form's message for it. Consecutive duplicates are never
    /// emitted and the latest value is replayed on subscription.
    ///
    /// Fails with [`FormError::UnknownField`] for a field the form does not
    /// declare.
    pub fn error(&self, field: F::Field) -> Result<SubjectStream<Option<String>>, FormError> {
        self.streams
            .error(field)
            .map(|error| error.to_stream())
            .ok_or_else(|| FormError::unknown_field(field))
    }

    /// Whether every field is valid and, for forms that gate on loading, no
    /// operation is in flight. Distinct, seeded with the initial validity.
    pub fn validity(&self) -> SubjectStream<bool> {
        self.streams.validity.to_stream()
    }

    /// `true` from the moment a submission is accepted until its message has
    /// been emitted. Seeded with `false`.
    pub fn loading(&self) -> SubjectStream<bool> {
        self.streams.loading.to_stream()
    }

    /// One message per handled submit: the outcome of an operation, or
    /// [`Message::InvalidInput`] for a submit rejected by validation.
    /// Submits dropped while an operation is in flight produce nothing.
    pub fn messages(&self) -> SubjectStream<Message<F::Output>> {
        self.streams.messages.to_stream()
    }

    /// Loading changes and messages merged in the order they happened. A
    /// successful round reads `Loading(true)`, `Message(..)`,
    /// `Loading(false)`.
    pub fn activity(&self) -> SubjectStream<Activity<F::Output>> {
        self.streams.activity.to_stream()
    }

    /// The [`FormState`] record folded from [`activity`](FormEngine::activity),
    /// replayed on subscription.
    pub fn state(&self) -> SubjectStream<FormState> {
        self.streams.state.to_stream()
    }

    /// Lossy signal of [`validity`](FormEngine::validity) for renderers that
    /// only care about the latest value.
    pub fn validity_signal(&self) -> MutableSignalCloned<bool> {
        self.streams.validity.to_signal()
    }

    /// Lossy signal of [`loading`](FormEngine::loading).
    pub fn loading_signal(&self) -> MutableSignalCloned<bool> {
        self.streams.loading.to_signal()
    }

    /// Lossy signal of [`state`](FormEngine::state).
    ///
    /// ```no_run
    /// # use formrx::{Form, FormEngine};
    /// # async fn render<F: Form>(engine: &FormEngine<F>) {
    /// use futures_signals::signal::SignalExt;
    ///
    /// engine
    ///     .state_signal()
    ///     .for_each(|state| {
    ///         println!("loading: {}", state.is_loading);
    ///         async {}
    ///     })
    ///     .await;
    /// # }
    /// ```
    pub fn state_signal(&self) -> MutableSignalCloned<FormState> {
        self.streams.state.to_signal()
    }

    /// The latest state record, without waiting for queued commands.
    pub fn current_state(&self) -> FormState {
        self.streams.state.get()
    }

    pub fn is_disposed(&self) -> bool {
        self.lifecycle.is_disposed()
    }

    /// Stops the engine task, releases every subscription and closes every
    /// stream. An operation already in flight runs to completion but its
    /// result is discarded. Calling this again does nothing.
    pub fn dispose(&self) {
        self.lifecycle.dispose();
    }

    fn ensure_live(&self) -> Result<(), FormError> {
        if self.lifecycle.is_disposed() {
            Err(FormError::Disposed)
        } else {
            Ok(())
        }
    }

    fn send(&self, command: Command<F>) -> Result<(), FormError> {
        self.commands.send(command).map_err(|_| FormError::Disposed)
    }
}

impl<F: Form> Debug for FormEngine<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormEngine")
            .field("lifecycle", &self.lifecycle)
            .field("state", &self.streams.state.get())
            .finish()
    }
}

impl<F: Form> Drop for FormEngine<F> {
    fn drop(&mut self) {
        self.lifecycle.dispose();
    }
}
