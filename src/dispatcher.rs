//--------------------------------------------------------------------------------------------------
// STRUCTS & TRAITS
//--------------------------------------------------------------------------------------------------
// | Name                    | Description                                       | Key Methods       |
// |-------------------------|---------------------------------------------------|------------------|
// | Dispatcher              | Routes messages to priority-ordered listeners    | connect, notify   |
//--------------------------------------------------------------------------------------------------

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{EventError, EventResult};
use crate::listener::Callback;
use crate::message::Message;
use crate::queue::{ListenerQueue, PriorityQueue, QueueFactory};

/// Priority assigned when a listener is registered without one.
///
/// Lower values run earlier. Deployments with their own baseline
/// configure it via [`Dispatcher::with_default_priority`].
pub const DEFAULT_PRIORITY: i32 = 100;

/// Routes messages to listeners registered against named event channels.
///
/// A `Dispatcher` is a cheap-to-clone handle over shared state: clones
/// dispatch into the same registry, and the handle can be passed to the
/// modules that need to publish or subscribe. Registration happens
/// through [`connect`](Dispatcher::connect); delivery through one of the
/// three synchronous protocols:
///
/// - [`notify`](Dispatcher::notify) broadcasts to every listener until
///   one stops propagation,
/// - [`notify_until`](Dispatcher::notify_until) stops once a listener
///   reports the event handled,
/// - [`filter`](Dispatcher::filter) folds a value through the listener
///   chain.
///
/// All three run listeners inline on the caller's stack, in ascending
/// priority order with stable ties. Iteration works on a snapshot taken
/// when the dispatch call begins: a listener that connects another
/// listener for the in-flight name only affects the next dispatch.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

pub(crate) struct DispatcherInner {
    /// Map of event name to its priority-ordered listener queue
    registry: RwLock<HashMap<String, Box<dyn ListenerQueue>>>,
    /// Produces the queue backing a newly seen event name
    queue_factory: QueueFactory,
    /// Priority used when `connect` is called without one
    default_priority: i32,
}

impl Dispatcher {
    /// Creates a dispatcher with the default priority baseline and the
    /// built-in [`PriorityQueue`] ordering.
    pub fn new() -> Self {
        Self::with_config(DEFAULT_PRIORITY, default_queue_factory())
    }

    /// Creates a dispatcher whose unprioritized registrations land at
    /// `default_priority` instead of [`DEFAULT_PRIORITY`].
    pub fn with_default_priority(default_priority: i32) -> Self {
        Self::with_config(default_priority, default_queue_factory())
    }

    /// Creates a dispatcher backed by an alternative listener-queue
    /// implementation.
    ///
    /// The factory is invoked once per event name, lazily, on the first
    /// `connect` for that name. The produced queue must iterate in
    /// ascending priority order with stable ties.
    pub fn with_queue_factory(queue_factory: QueueFactory) -> Self {
        Self::with_config(DEFAULT_PRIORITY, queue_factory)
    }

    /// Creates a dispatcher with both knobs set.
    pub fn with_config(default_priority: i32, queue_factory: QueueFactory) -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                registry: RwLock::new(HashMap::new()),
                queue_factory,
                default_priority,
            }),
        }
    }

    /// Connects `callback` to the event `name` at the dispatcher's
    /// default priority.
    pub fn connect(&self, name: impl Into<String>, callback: Callback) -> EventResult<&Self> {
        self.connect_with_priority(name, callback, self.inner.default_priority)
    }

    /// Connects `callback` to the event `name` at `priority`.
    ///
    /// Lower priority values run earlier; listeners with equal priority
    /// run in registration order. There is no duplicate detection: a
    /// callback registered twice runs once per registration. Registering
    /// against an empty name is a configuration mistake and fails with
    /// [`EventError::InvalidName`].
    pub fn connect_with_priority(
        &self,
        name: impl Into<String>,
        callback: Callback,
        priority: i32,
    ) -> EventResult<&Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(EventError::InvalidName(name));
        }

        let kind = callback.kind();
        let mut registry = self.inner.registry.write();
        let queue = registry
            .entry(name.clone())
            .or_insert_with(|| (self.inner.queue_factory)());
        queue.push(Arc::new(callback), priority);

        debug!(
            "Registered {} listener for event '{}' with priority {}",
            kind, name, priority
        );
        Ok(self)
    }

    /// Returns the number of listeners connected to `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.inner
            .registry
            .read()
            .get(name)
            .map_or(0, |queue| queue.len())
    }

    /// Notifies all listeners connected to `name`.
    ///
    /// The message is stamped (unprocessed, propagating, event name,
    /// dispatcher back-reference) before the first listener runs. Any
    /// listener may call
    /// [`stop_propagation`](Message::stop_propagation); the remaining
    /// listeners are then skipped. Returns the message, possibly mutated
    /// by the listeners.
    pub fn notify(&self, name: &str, mut message: Message) -> EventResult<Message> {
        message
            .mark_unprocessed()
            .start_propagation()
            .set_dispatcher(self)
            .set_name(name);

        let Some(listeners) = self.snapshot(name) else {
            debug!("No listeners registered for event: {}", name);
            return Ok(message);
        };

        for listener in &listeners {
            if message.is_propagation_stopped() {
                trace!("Propagation of '{}' stopped, skipping listener", name);
                continue;
            }
            invoke_broadcast(listener, name, "notify", &mut message)?;
        }
        Ok(message)
    }

    /// Notifies listeners connected to `name` until one claims the event.
    ///
    /// A listener returning `true` marks the message processed; the
    /// remaining listeners are then skipped. Returns the message.
    pub fn notify_until(&self, name: &str, mut message: Message) -> EventResult<Message> {
        message.mark_unprocessed();

        let Some(listeners) = self.snapshot(name) else {
            debug!("No listeners registered for event: {}", name);
            return Ok(message);
        };

        for listener in &listeners {
            if message.is_processed() {
                continue;
            }
            if invoke_broadcast(listener, name, "notify_until", &mut message)? {
                trace!("Event '{}' claimed as processed", name);
                message.mark_processed();
            }
        }
        Ok(message)
    }

    /// Filters `value` through the listener chain connected to `name`.
    ///
    /// Every listener runs regardless of the processed/propagation
    /// flags; each receives the previous listener's output. The final
    /// value is stored as the message's return value. When no listener
    /// is connected, the initial `value` is stored untouched.
    pub fn filter(&self, name: &str, mut message: Message, value: Value) -> EventResult<Message> {
        let mut value = value;

        if let Some(listeners) = self.snapshot(name) {
            for listener in &listeners {
                value = match listener.as_ref() {
                    Callback::Filter(f) => f(&mut message, value)?,
                    Callback::Notify(_) => {
                        return Err(EventError::CallbackMismatch {
                            name: name.to_string(),
                            protocol: "filter",
                            registered: listener.kind(),
                        });
                    }
                };
            }
        } else {
            debug!("No listeners registered for event: {}", name);
        }

        message.set_return_value(value);
        Ok(message)
    }

    /// Takes a snapshot of the listener queue for `name`.
    ///
    /// Returns `None` without touching the queue collaborator when no
    /// listener was ever connected for `name`. The registry lock is
    /// released before any listener runs, so listeners may re-enter the
    /// dispatcher; additions to the in-flight name join the next
    /// dispatch.
    fn snapshot(&self, name: &str) -> Option<Vec<Arc<Callback>>> {
        let registry = self.inner.registry.read();
        let queue = registry.get(name)?;
        let mut listeners = Vec::with_capacity(queue.len());
        queue.each(&mut |listener| listeners.push(Arc::clone(listener)));
        Some(listeners)
    }

    pub(crate) fn downgrade(&self) -> Weak<DispatcherInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn from_inner(inner: Arc<DispatcherInner>) -> Self {
        Self { inner }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("channels", &self.inner.registry.read().len())
            .field("default_priority", &self.inner.default_priority)
            .finish_non_exhaustive()
    }
}

fn default_queue_factory() -> QueueFactory {
    Box::new(|| Box::new(PriorityQueue::new()) as Box<dyn ListenerQueue>)
}

/// Invokes a broadcast-shaped listener for `notify`/`notify_until`.
fn invoke_broadcast(
    listener: &Callback,
    name: &str,
    protocol: &'static str,
    message: &mut Message,
) -> EventResult<bool> {
    match listener {
        Callback::Notify(f) => f(message),
        Callback::Filter(_) => Err(EventError::CallbackMismatch {
            name: name.to_string(),
            protocol,
            registered: listener.kind(),
        }),
    }
}
