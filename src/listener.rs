use serde_json::Value;

use crate::dispatcher::Dispatcher;
use crate::error::EventResult;
use crate::message::Message;

/// Broadcast-shaped listener, invoked by `notify` and `notify_until`.
///
/// The returned flag is the "handled" signal: `notify_until` stops
/// invoking further listeners once a listener returns `true`, while
/// `notify` ignores it.
pub type NotifyFn = dyn Fn(&mut Message) -> EventResult<bool> + Send + Sync;

/// Filter-shaped listener, invoked by `filter` to transform the carried value.
pub type FilterFn = dyn Fn(&mut Message, Value) -> EventResult<Value> + Send + Sync;

/// A listener registered with the dispatcher.
///
/// The shape is fixed once at registration. A dispatch protocol that
/// reaches a callback of the other shape fails with
/// [`EventError::CallbackMismatch`](crate::EventError::CallbackMismatch)
/// instead of proceeding.
pub enum Callback {
    /// Serves the `notify` and `notify_until` protocols
    Notify(Box<NotifyFn>),
    /// Serves the `filter` protocol
    Filter(Box<FilterFn>),
}

impl Callback {
    /// Wraps a broadcast listener.
    pub fn notify<F>(listener: F) -> Self
    where
        F: Fn(&mut Message) -> EventResult<bool> + Send + Sync + 'static,
    {
        Callback::Notify(Box::new(listener))
    }

    /// Wraps a filter listener.
    pub fn filter<F>(listener: F) -> Self
    where
        F: Fn(&mut Message, Value) -> EventResult<Value> + Send + Sync + 'static,
    {
        Callback::Filter(Box::new(listener))
    }

    /// Shape label used in logs and mismatch errors.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Callback::Notify(_) => "notify",
            Callback::Filter(_) => "filter",
        }
    }
}

/// One entry of a subscriber's listener mapping.
pub enum Mapping {
    /// Callback registered at the dispatcher's default priority
    Direct(String, Callback),
    /// Callback registered at an explicit priority
    WithPriority(String, Callback, i32),
}

impl Mapping {
    /// Entry using the dispatcher's default priority.
    pub fn direct(name: impl Into<String>, callback: Callback) -> Self {
        Mapping::Direct(name.into(), callback)
    }

    /// Entry with an explicit priority.
    pub fn with_priority(name: impl Into<String>, callback: Callback, priority: i32) -> Self {
        Mapping::WithPriority(name.into(), callback, priority)
    }
}

/// Implemented by components that register their own listeners.
///
/// `mapping` is the mandatory override: it declares which events the
/// component wants and with what priority. `register` is provided and
/// connects every entry against the given dispatcher.
pub trait Subscriber {
    /// Returns the listener mappings this subscriber wants connected.
    fn mapping(&self) -> Vec<Mapping>;

    /// Connects every mapping entry against `dispatcher`.
    ///
    /// Entries without a priority use the dispatcher's configured
    /// default. Fails on the first rejected registration.
    fn register(&self, dispatcher: &Dispatcher) -> EventResult<()> {
        for entry in self.mapping() {
            match entry {
                Mapping::Direct(name, callback) => {
                    dispatcher.connect(name, callback)?;
                }
                Mapping::WithPriority(name, callback, priority) => {
                    dispatcher.connect_with_priority(name, callback, priority)?;
                }
            }
        }
        Ok(())
    }
}
