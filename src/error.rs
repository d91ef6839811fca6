use std::{collections::TryReserveError, fmt};
use thiserror::Error;

/// An error returned by [`FairQueue::try_dequeue`] when no item could be
/// taken without blocking.
///
/// [`FairQueue::try_dequeue`]: crate::FairQueue::try_dequeue
#[derive(Copy, Clone, Debug, Eq, PartialEq, Error)]
pub enum TryDequeueError {
    /// The queue contains no items.
    #[error("queue is empty")]
    Empty,

    /// The queue contains items, but other consumers are already blocked in
    /// [`FairQueue::dequeue`], and those items are reserved for them.
    ///
    /// [`FairQueue::dequeue`]: crate::FairQueue::dequeue
    #[error("queued items are reserved for blocked consumers")]
    Reserved,
}

/// An error returned by [`FairQueue::try_enqueue`] when the queue could not
/// allocate space for a new item.
///
/// The item that could not be enqueued is returned to the caller, and can be
/// recovered with [`EnqueueError::into_inner`].
///
/// [`FairQueue::try_enqueue`]: crate::FairQueue::try_enqueue
#[derive(Error)]
#[error("queue could not allocate space for a new item")]
pub struct EnqueueError<T> {
    item: T,
    #[source]
    source: TryReserveError,
}

// === impl EnqueueError ===

impl<T> EnqueueError<T> {
    pub(crate) fn new(item: T, source: TryReserveError) -> Self {
        Self { item, source }
    }

    /// Returns a reference to the item that could not be enqueued.
    #[must_use]
    pub fn item(&self) -> &T {
        &self.item
    }

    /// Consumes the error, returning the item that could not be enqueued.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.item
    }
}

impl<T> fmt::Debug for EnqueueError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnqueueError")
            .field("item", &format_args!("..."))
            .field("source", &self.source)
            .finish()
    }
}
