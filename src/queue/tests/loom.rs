use super::*;
use crate::loom::{self, sync::Arc, thread};

#[test]
fn dequeue_then_enqueue() {
    loom::model(|| {
        let q = Arc::new(FairQueue::new());
        let consumer = thread::spawn({
            let q = q.clone();
            move || q.dequeue()
        });

        q.enqueue(1);

        assert_eq!(consumer.join().unwrap(), 1);
        assert_eq!(q.len(), 0);
        assert_eq!(q.waiting(), 0);
        assert_eq!(q.served(), 1);
    });
}

#[test]
fn two_consumers_relay() {
    loom::model(|| {
        let q = Arc::new(FairQueue::new());

        fn consumer(q: &Arc<FairQueue<usize>>) -> thread::JoinHandle<usize> {
            let q = q.clone();
            thread::spawn(move || q.dequeue())
        }

        let consumer1 = consumer(&q);
        let consumer2 = consumer(&q);

        q.enqueue(1);
        q.enqueue(2);

        let mut got = [consumer1.join().unwrap(), consumer2.join().unwrap()];
        got.sort_unstable();
        assert_eq!(got, [1, 2]);
        assert_eq!(q.waiting(), 0);
        assert_eq!(q.served(), 2);
    });
}

#[test]
fn concurrent_producer() {
    loom::model(|| {
        let q = Arc::new(FairQueue::new());

        let producer = thread::spawn({
            let q = q.clone();
            move || {
                q.enqueue(1);
                q.enqueue(2);
            }
        });

        assert_eq!(q.dequeue(), 1);
        assert_eq!(q.dequeue(), 2);

        producer.join().unwrap();
        assert_eq!(q.len(), 0);
    });
}

#[test]
fn try_dequeue_races_waiter() {
    loom::model(|| {
        let q = Arc::new(FairQueue::new());
        let consumer = thread::spawn({
            let q = q.clone();
            move || q.dequeue()
        });

        q.enqueue(1);

        // if the consumer hadn't parked yet, `try_dequeue` may take the item;
        // otherwise, the item is reserved for the parked consumer.
        let served = match q.try_dequeue() {
            Ok(item) => {
                assert_eq!(item, 1);
                q.enqueue(2);
                assert_eq!(consumer.join().unwrap(), 2);
                2
            }
            Err(_) => {
                assert_eq!(consumer.join().unwrap(), 1);
                1
            }
        };

        assert_eq!(q.len(), 0);
        assert_eq!(q.waiting(), 0);
        assert_eq!(q.served(), served);
    });
}

#[test]
fn producers_preserve_order() {
    let mut builder = loom::model::Builder::new();
    builder.preemption_bound = Some(2);
    builder.check(|| {
        let q = Arc::new(FairQueue::new());

        let producers = (0..2)
            .map(|producer| {
                let q = q.clone();
                thread::spawn(move || {
                    q.enqueue((producer, 0));
                    q.enqueue((producer, 1));
                })
            })
            .collect::<Vec<_>>();

        let mut next = [0, 0];
        for _ in 0..4 {
            let (producer, i) = q.dequeue();
            assert_eq!(next[producer], i, "producer {producer}'s items out of order");
            next[producer] += 1;
        }

        for producer in producers {
            producer.join().unwrap();
        }
        assert_eq!(q.served(), 4);
    });
}

#[test]
fn destroy_after_drain() {
    loom::model(|| {
        let q = FairQueue::new();
        q.enqueue(1);
        q.enqueue(2);

        assert_eq!(q.dequeue(), 1);
        assert_eq!(q.try_dequeue(), Ok(2));
        assert_eq!(q.waiting(), 0);

        assert!(q.destroy().is_empty());
    });
}
