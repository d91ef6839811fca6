//! A fair, blocking first-in, first-out queue.
//!
//! See the [`FairQueue`] type's documentation for details.
use self::waiter::WaitList;
use crate::{
    loom::sync::{
        atomic::{AtomicUsize, Ordering::Relaxed},
        Mutex, MutexGuard,
    },
    util::CachePadded,
    EnqueueError, TryDequeueError,
};
use std::{
    collections::VecDeque,
    fmt,
    sync::{PoisonError, TryLockError},
};

mod waiter;


/// A multi-producer, multi-consumer queue whose blocking consumers are served
/// in first-in, first-out order.
///
/// Items are always dequeued in the order they were [enqueued][enqueue]. In
/// addition, when several threads are blocked in [`dequeue`][dequeue], they are
/// woken in the order in which they started waiting: a consumer that arrives
/// while others are already waiting joins the back of the line, even if items
/// are available.
///
/// # Wakeups
///
/// Every blocked consumer parks on its own condition variable, and only one
/// consumer is ever woken at a time:
///
/// - An [`enqueue`][enqueue] signals the oldest waiter only when it takes the
///   queue from empty to non-empty.
/// - A consumer that wakes takes a single item and retires. If there are still
///   items left *and* still consumers waiting, it *relays* the wakeup to the
///   next waiter in line.
///
/// Thus, a waiter is only signaled when there is an item for it to take, and an
/// enqueue never wakes more than one thread.
///
/// # Sharing
///
/// A `FairQueue` is shared between threads by reference, typically inside an
/// [`Arc`](std::sync::Arc). Because [`FairQueue::new`] is a `const fn`, a queue
/// may also be stored in a `static`:
///
/// ```
/// use hypha::FairQueue;
/// use std::thread;
///
/// static QUEUE: FairQueue<usize> = FairQueue::new();
///
/// let consumers = (0..4)
///     .map(|_| thread::spawn(|| QUEUE.dequeue()))
///     .collect::<Vec<_>>();
///
/// for i in 0..4 {
///     QUEUE.enqueue(i);
/// }
///
/// let mut got = consumers
///     .into_iter()
///     .map(|consumer| consumer.join().unwrap())
///     .collect::<Vec<_>>();
/// got.sort();
/// assert_eq!(got, vec![0, 1, 2, 3]);
/// ```
///
/// # Teardown
///
/// A blocked consumer holds a borrow of the queue, so a queue can only be
/// [destroyed][destroy] (or dropped) once every consumer has returned. Any
/// items still in the queue are handed back by [`destroy`][destroy], or
/// dropped along with the queue.
///
/// [enqueue]: FairQueue::enqueue
/// [dequeue]: FairQueue::dequeue
/// [destroy]: FairQueue::destroy
pub struct FairQueue<T> {
    /// The item list and the waiter list.
    core: Mutex<Core<T>>,

    /// The total number of items ever dequeued.
    ///
    /// This is read without holding the lock, so it is only ever a
    /// best-effort statistic.
    served: CachePadded<AtomicUsize>,
}

struct Core<T> {
    items: VecDeque<T>,
    waiters: WaitList,
}

// === impl FairQueue ===

impl<T> FairQueue<T> {
    loom_const_fn! {
        /// Returns a new, empty `FairQueue`.
        #[must_use]
        pub fn new() -> Self {
            Self {
                core: Mutex::new(Core::new(VecDeque::new())),
                served: CachePadded(AtomicUsize::new(0)),
            }
        }
    }

    /// Returns a new, empty `FairQueue` with space for at least `capacity`
    /// items before it must reallocate.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            core: Mutex::new(Core::new(VecDeque::with_capacity(capacity))),
            served: CachePadded(AtomicUsize::new(0)),
        }
    }

    /// Appends `item` to the back of the queue.
    ///
    /// If consumers are blocked in [`dequeue`](Self::dequeue) and the queue
    /// was empty, the consumer that has been waiting the longest is woken.
    ///
    /// This never blocks, except to acquire the queue's lock.
    ///
    /// # Panics
    ///
    /// Like any other collection, this aborts the process if the queue cannot
    /// allocate space for the new item. Use [`try_enqueue`](Self::try_enqueue)
    /// to handle allocation failure.
    pub fn enqueue(&self, item: T) {
        self.lock().push(item);
    }

    /// Appends `item` to the back of the queue, returning an error if the
    /// queue could not allocate space for it.
    ///
    /// This behaves identically to [`enqueue`](Self::enqueue), except that the
    /// item is handed back inside an [`EnqueueError`] if allocation fails.
    pub fn try_enqueue(&self, item: T) -> Result<(), EnqueueError<T>> {
        let mut core = self.lock();
        if let Err(source) = core.items.try_reserve(1) {
            debug!(queue.len = core.items.len(), %source, "FairQueue::try_enqueue -> alloc failed");
            return Err(EnqueueError::new(item, source));
        }
        core.push(item);
        Ok(())
    }

    /// Removes the item at the front of the queue, blocking the current
    /// thread until one is available.
    ///
    /// If no other thread is blocked in `dequeue`, and the queue contains
    /// items, the front item is returned immediately. Otherwise, the calling
    /// thread joins the back of the line of waiting consumers, and is woken
    /// once every consumer ahead of it has been served and an item is
    /// available.
    ///
    /// # Examples
    ///
    /// ```
    /// use hypha::FairQueue;
    ///
    /// let q = FairQueue::new();
    /// q.enqueue('a');
    /// q.enqueue('b');
    ///
    /// assert_eq!(q.dequeue(), 'a');
    /// assert_eq!(q.dequeue(), 'b');
    /// assert!(q.is_empty());
    /// ```
    pub fn dequeue(&self) -> T {
        let mut core = self.lock();

        if core.waiters.is_empty() {
            if let Some(item) = core.items.pop_front() {
                self.served.fetch_add(1, Relaxed);
                trace!(queue.len = core.items.len(), "FairQueue::dequeue -> fast path");
                return item;
            }
        }

        let waiter = core.waiters.park();
        enter_test_debug_span!("FairQueue::dequeue", waiter = waiter.id());
        debug!(
            waiter = waiter.id(),
            waiting = core.waiters.len(),
            queue.len = core.items.len(),
            "FairQueue::dequeue -> parked",
        );

        // The underlying condition variable may wake us spuriously, so we only
        // proceed once we are the oldest waiter and there is an item to take.
        let item = loop {
            if test_dbg!(core.waiters.is_head(&waiter)) {
                if let Some(item) = core.items.pop_front() {
                    break item;
                }
            }
            core = waiter.wait(core);
        };
        self.served.fetch_add(1, Relaxed);
        core.waiters.retire(&waiter);

        // Hand off anything we left behind to the next waiter in line.
        if !core.items.is_empty() {
            core.waiters.wake_head();
        }

        debug!(
            waiter = waiter.id(),
            waiting = core.waiters.len(),
            queue.len = core.items.len(),
            "FairQueue::dequeue -> woken",
        );
        item
    }

    /// Removes the item at the front of the queue without blocking.
    ///
    /// # Errors
    ///
    /// - [`TryDequeueError::Empty`] if the queue contains no items.
    /// - [`TryDequeueError::Reserved`] if the queue contains items, but other
    ///   threads are already blocked in [`dequeue`](Self::dequeue). Those items
    ///   belong to the blocked consumers, and taking them would let this call
    ///   jump the line.
    ///
    /// # Examples
    ///
    /// ```
    /// use hypha::{FairQueue, TryDequeueError};
    ///
    /// let q = FairQueue::new();
    /// assert_eq!(q.try_dequeue(), Err(TryDequeueError::Empty));
    ///
    /// q.enqueue(1);
    /// assert_eq!(q.try_dequeue(), Ok(1));
    /// ```
    pub fn try_dequeue(&self) -> Result<T, TryDequeueError> {
        let mut core = self.lock();

        if core.items.is_empty() {
            trace!("FairQueue::try_dequeue -> empty");
            return Err(TryDequeueError::Empty);
        }

        if !core.waiters.is_empty() {
            trace!(
                waiting = core.waiters.len(),
                queue.len = core.items.len(),
                "FairQueue::try_dequeue -> reserved"
            );
            return Err(TryDequeueError::Reserved);
        }

        let item = core.items.pop_front().ok_or(TryDequeueError::Empty)?;
        self.served.fetch_add(1, Relaxed);
        trace!(queue.len = core.items.len(), "FairQueue::try_dequeue -> dequeued");
        Ok(item)
    }

    /// Returns the number of items currently in the queue.
    ///
    /// This is a snapshot; other threads may change the queue as soon as it
    /// is returned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Returns `true` if the queue currently contains no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Returns the number of threads currently blocked in
    /// [`dequeue`](Self::dequeue).
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.lock().waiters.len()
    }

    /// Returns the total number of items that have been dequeued from this
    /// queue, by [`dequeue`](Self::dequeue) or
    /// [`try_dequeue`](Self::try_dequeue).
    ///
    /// This does not acquire the queue's lock. The count never decreases, but
    /// under concurrency it may lag behind dequeues that have already
    /// returned. It means "at least this many items had been served, a moment
    /// ago".
    #[must_use]
    pub fn served(&self) -> usize {
        self.served.load(Relaxed)
    }

    /// Tears down the queue, returning any items it still contains, in FIFO
    /// order.
    ///
    /// Since this consumes the queue, no thread can be blocked in
    /// [`dequeue`](Self::dequeue) while it runs.
    #[must_use = "items still in the queue are returned to the caller"]
    pub fn destroy(self) -> Vec<T> {
        let core = self
            .core
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        debug_assert!(
            core.waiters.is_empty(),
            "a queue may not be destroyed while consumers are waiting"
        );
        debug!(
            queue.len = core.items.len(),
            served = self.served.load(Relaxed),
            "FairQueue::destroy"
        );
        Vec::from(core.items)
    }

    fn lock(&self) -> MutexGuard<'_, Core<T>> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Default for FairQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for FairQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("FairQueue");
        let core = match self.core.try_lock() {
            Ok(core) => Some(core),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        };
        match core {
            Some(core) => s
                .field("len", &core.items.len())
                .field("waiting", &core.waiters.len()),
            None => s.field("core", &format_args!("<locked>")),
        };
        s.field("served", &self.served()).finish()
    }
}

// === impl Core ===

impl<T> Core<T> {
    const fn new(items: VecDeque<T>) -> Self {
        Self {
            items,
            waiters: WaitList::new(),
        }
    }

    fn push(&mut self, item: T) {
        self.items.push_back(item);

        // Only the transition from empty to non-empty needs a new wakeup; any
        // later items are relayed by the consumers that are already awake.
        if self.items.len() == 1 {
            self.waiters.wake_head();
        }

        trace!(
            queue.len = self.items.len(),
            waiting = self.waiters.len(),
            "FairQueue::enqueue"
        );
    }
}
