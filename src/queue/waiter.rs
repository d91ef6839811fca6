use crate::loom::{
    alloc::Track,
    sync::{Arc, Condvar, MutexGuard},
};
use std::{collections::VecDeque, sync::PoisonError};

/// A consumer blocked in [`FairQueue::dequeue`](super::FairQueue::dequeue).
///
/// Each waiter owns its own condition variable, and exactly one thread ever
/// waits on it. Notifying a waiter therefore wakes exactly that thread.
#[derive(Debug)]
pub(super) struct Waiter {
    id: usize,
    cond: Track<Condvar>,
}

/// The list of parked waiters, oldest first.
///
/// The list is only ever pushed to at the back (when a consumer parks) and
/// popped from the front (when the oldest consumer retires), so waiters are
/// retired in exactly the order they parked.
#[derive(Debug)]
pub(super) struct WaitList {
    list: VecDeque<Arc<Waiter>>,
    next_id: usize,
}

// === impl Waiter ===

impl Waiter {
    #[track_caller]
    fn new(id: usize) -> Self {
        Self {
            id,
            cond: Track::new(Condvar::new()),
        }
    }

    pub(super) fn id(&self) -> usize {
        self.id
    }

    /// Blocks the current thread on this waiter's condition variable,
    /// releasing `guard` while blocked and reacquiring it before returning.
    ///
    /// This may return spuriously; callers must re-check whether it is their
    /// turn.
    pub(super) fn wait<'a, C>(&self, guard: MutexGuard<'a, C>) -> MutexGuard<'a, C> {
        self.cond
            .get_ref()
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self) {
        self.cond.get_ref().notify_one();
    }
}

// === impl WaitList ===

impl WaitList {
    pub(super) const fn new() -> Self {
        Self {
            list: VecDeque::new(),
            next_id: 0,
        }
    }

    pub(super) fn len(&self) -> usize {
        self.list.len()
    }

    pub(super) fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Appends a new waiter to the back of the list, returning a handle the
    /// parking thread waits on.
    #[track_caller]
    pub(super) fn park(&mut self) -> Arc<Waiter> {
        let waiter = Arc::new(Waiter::new(self.next_id));
        self.next_id = self.next_id.wrapping_add(1);
        self.list.push_back(waiter.clone());
        waiter
    }

    /// Returns `true` if `waiter` is the oldest waiter in the list.
    pub(super) fn is_head(&self, waiter: &Waiter) -> bool {
        self.list.front().is_some_and(|head| head.id == waiter.id)
    }

    /// Notifies the oldest waiter, if there is one.
    ///
    /// Returns `true` if a waiter was notified.
    pub(super) fn wake_head(&self) -> bool {
        match self.list.front() {
            Some(head) => {
                trace!(waiter = head.id, waiting = self.list.len(), "WaitList::wake_head");
                head.notify();
                true
            }
            None => false,
        }
    }

    /// Unlinks `waiter`, which must be the oldest waiter in the list.
    pub(super) fn retire(&mut self, waiter: &Waiter) {
        let retired = self.list.pop_front();
        debug_assert!(
            retired.as_ref().is_some_and(|head| head.id == waiter.id),
            "retired waiter {} out of order (head was {:?})",
            waiter.id,
            retired.as_ref().map(|head| head.id),
        );
    }
}
