use std::sync::Arc;

use crate::listener::Callback;

/// Priority-ordered listener sequence backing one event name.
///
/// Implementations must visit listeners in ascending priority-number
/// order (lower value runs earlier) and keep insertion order for equal
/// priorities.
pub trait ListenerQueue: Send + Sync {
    /// Inserts a listener with the given priority.
    fn push(&mut self, listener: Arc<Callback>, priority: i32);

    /// Visits every listener in ascending priority order.
    fn each(&self, visit: &mut dyn FnMut(&Arc<Callback>));

    /// Returns the number of registered listeners.
    fn len(&self) -> usize;

    /// Returns `true` when no listener has been pushed yet.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Produces the queue backing a newly registered event name.
pub type QueueFactory = Box<dyn Fn() -> Box<dyn ListenerQueue> + Send + Sync>;

/// Default [`ListenerQueue`] backed by a sorted vector.
///
/// Entries pushed with an already present priority land after the
/// existing ones, so registration order is the tie-break.
#[derive(Default)]
pub struct PriorityQueue {
    entries: Vec<(i32, Arc<Callback>)>,
}

impl PriorityQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }
}

impl ListenerQueue for PriorityQueue {
    fn push(&mut self, listener: Arc<Callback>, priority: i32) {
        let at = self.entries.partition_point(|(p, _)| *p <= priority);
        self.entries.insert(at, (priority, listener));
    }

    fn each(&self, visit: &mut dyn FnMut(&Arc<Callback>)) {
        for (_, listener) in &self.entries {
            visit(listener);
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}
