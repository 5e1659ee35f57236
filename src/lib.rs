//! In-process publish/subscribe mediator: named event channels with
//! priority-ordered listener invocation, cooperative short-circuiting
//! and value-filtering chains. Fully synchronous: listeners run inline
//! on the caller's stack.

// Expose the modules
pub mod dispatcher;
pub mod error;
pub mod listener;
pub mod message;
pub mod queue;


// Re-export key types for easier usage
pub use dispatcher::{DEFAULT_PRIORITY, Dispatcher};
pub use error::{EventError, EventResult};
pub use listener::{Callback, FilterFn, Mapping, NotifyFn, Subscriber};
pub use message::{Message, Subject};
pub use queue::{ListenerQueue, PriorityQueue, QueueFactory};
