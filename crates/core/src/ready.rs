//! Deferred initialization queue
//!
//! Widgets that need another field's value cannot look it up while the tree
//! is still being built, because the field may come later in schema order.
//! They queue a task instead; once the outermost construction pass ends the
//! queue is drained until empty, including tasks queued by other tasks.

use crate::error::FormError;
use std::collections::VecDeque;

/// A deferred task run against the owning context
pub type ReadyTask<C> = Box<dyn FnOnce(&mut C) -> Result<(), FormError>>;

pub struct ReadyQueue<C> {
    tasks: VecDeque<ReadyTask<C>>,
    /// Nesting depth of construction passes
    depth: usize,
    draining: bool,
}

impl<C> ReadyQueue<C> {
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
            depth: 0,
            draining: false,
        }
    }

    /// Enter a (possibly nested) construction pass
    pub fn begin_pass(&mut self) {
        self.depth += 1;
    }

    /// Leave a construction pass; true when it was the outermost one
    pub fn end_pass(&mut self) -> bool {
        self.depth = self.depth.saturating_sub(1);
        self.depth == 0
    }

    /// No construction pass open and no drain in progress: tasks can run
    /// right away
    pub fn is_settled(&self) -> bool {
        self.depth == 0 && !self.draining
    }

    pub fn push(&mut self, task: ReadyTask<C>) {
        self.tasks.push_back(task);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Drop every queued task
    pub fn clear(&mut self) {
        self.tasks.clear();
    }
}

impl<C> Default for ReadyQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// Run queued tasks in registration order until the queue stays empty.
///
/// `queue` projects the queue out of the context so tasks get the whole
/// context while running. The first failing task stops the drain and discards
/// whatever is still queued.
pub fn drain<C>(cx: &mut C, queue: fn(&mut C) -> &mut ReadyQueue<C>) -> Result<(), FormError> {
    if queue(cx).draining {
        return Ok(());
    }
    queue(cx).draining = true;

    let mut ran = 0usize;
    let result = loop {
        let Some(task) = queue(cx).tasks.pop_front() else {
            break Ok(());
        };
        ran += 1;
        if let Err(e) = task(cx) {
            queue(cx).tasks.clear();
            break Err(e);
        }
    };

    queue(cx).draining = false;
    log::debug!("Ready queue drained ({} tasks)", ran);
    result
}
