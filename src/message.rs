//--------------------------------------------------------------------------------------------------
// STRUCTS & TRAITS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Key Methods       |
// |-------------------------|---------------------------------------------------|------------------|
// | Message                 | Carrier passed through a dispatch cycle          | parameter, name   |
//--------------------------------------------------------------------------------------------------

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use serde_json::Value;

use crate::dispatcher::{Dispatcher, DispatcherInner};

/// Opaque shared reference to the object an event concerns.
pub type Subject = Arc<dyn Any + Send + Sync>;

/// Carrier passed through one dispatch cycle.
///
/// A message holds the subject the event concerns, the event name, an
/// immutable parameter mapping, and the mutable state the dispatch
/// protocols cooperate through: the `processed` flag (`notify_until`),
/// the propagation flag (`notify`) and the return-value slot (`filter`).
/// The two flags are independent; each protocol consults only its own.
///
/// Messages are short-lived: created per dispatch, discarded after.
pub struct Message {
    /// Object this event concerns; shared, never deep-copied
    subject: Subject,
    /// Registry key; stamped by `notify` or set up-front
    name: Option<String>,
    /// Immutable after construction
    parameters: HashMap<String, Value>,
    /// Rewritten by the `filter` protocol
    return_value: Option<Value>,
    /// Cooperative "handled" flag, consulted by `notify_until`
    processed: bool,
    /// Cooperative early-exit flag, consulted by `notify`
    propagation_stopped: bool,
    /// Informational back-reference to the dispatching dispatcher
    dispatcher: Weak<DispatcherInner>,
}

impl Message {
    /// Creates a message without a name; `notify` (or [`set_name`])
    /// supplies it later.
    ///
    /// [`set_name`]: Message::set_name
    pub fn new(subject: Subject) -> Self {
        Self {
            subject,
            name: None,
            parameters: HashMap::new(),
            return_value: None,
            processed: false,
            propagation_stopped: false,
            dispatcher: Weak::new(),
        }
    }

    /// Creates a message carrying its event name up-front.
    pub fn named(subject: Subject, name: impl Into<String>) -> Self {
        let mut message = Self::new(subject);
        message.name = Some(name.into());
        message
    }

    /// Adds one parameter. Builder method, used before dispatch.
    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Replaces the whole parameter mapping. Builder method.
    pub fn with_parameters(mut self, parameters: HashMap<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Returns the subject this event concerns.
    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    /// Returns the subject downcast to a concrete type.
    pub fn subject_downcast<T: Any>(&self) -> Option<&T> {
        self.subject.downcast_ref::<T>()
    }

    /// Returns the event name, if one has been set.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Sets the event name, overwriting unconditionally.
    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Returns the parameter mapping.
    pub fn parameters(&self) -> &HashMap<String, Value> {
        &self.parameters
    }

    /// Returns the parameter stored under `key`, or `None` when absent.
    pub fn parameter(&self, key: &str) -> Option<&Value> {
        self.parameters.get(key)
    }

    /// Returns the value stored by the `filter` protocol.
    pub fn return_value(&self) -> Option<&Value> {
        self.return_value.as_ref()
    }

    /// Stores the return value.
    pub fn set_return_value(&mut self, value: Value) -> &mut Self {
        self.return_value = Some(value);
        self
    }

    /// Whether a `notify_until` listener has claimed this event.
    pub fn is_processed(&self) -> bool {
        self.processed
    }

    /// Marks the event as handled. Idempotent.
    pub fn mark_processed(&mut self) -> &mut Self {
        self.processed = true;
        self
    }

    /// Clears the handled flag. Idempotent.
    pub fn mark_unprocessed(&mut self) -> &mut Self {
        self.processed = false;
        self
    }

    /// Whether a listener has stopped propagation of this event.
    pub fn is_propagation_stopped(&self) -> bool {
        self.propagation_stopped
    }

    /// Stops propagation: `notify` skips the remaining listeners.
    pub fn stop_propagation(&mut self) -> &mut Self {
        self.propagation_stopped = true;
        self
    }

    /// Restarts propagation. Last call wins.
    pub fn start_propagation(&mut self) -> &mut Self {
        self.propagation_stopped = false;
        self
    }

    /// Associates the dispatching dispatcher with this message.
    ///
    /// Stamped by the dispatcher at dispatch time; listeners read it
    /// through [`dispatcher`](Message::dispatcher) but never set it.
    pub fn set_dispatcher(&mut self, dispatcher: &Dispatcher) -> &mut Self {
        self.dispatcher = dispatcher.downgrade();
        self
    }

    /// Returns the dispatcher currently dispatching this message, if it
    /// is still alive. Informational only.
    pub fn dispatcher(&self) -> Option<Dispatcher> {
        self.dispatcher.upgrade().map(Dispatcher::from_inner)
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("return_value", &self.return_value)
            .field("processed", &self.processed)
            .field("propagation_stopped", &self.propagation_stopped)
            .finish_non_exhaustive()
    }
}
