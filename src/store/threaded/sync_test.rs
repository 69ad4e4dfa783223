#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use crate::store::threaded::{Barrier, OneShot};

    #[test]
    fn test_oneshot_delivers_value() {
        let slot: Arc<OneShot<u32>> = Arc::new(OneShot::new());
        let waiter = {
            let slot = Arc::clone(&slot);
            thread::spawn(move || slot.wait())
        };
        thread::sleep(Duration::from_millis(20));
        slot.notify(7);
        assert_eq!(waiter.join().unwrap(), 7);
    }

    #[test]
    fn test_oneshot_notify_before_wait() {
        let slot: OneShot<&'static str> = OneShot::new();
        slot.notify("done");
        assert_eq!(slot.wait(), "done");
    }

    #[test]
    fn test_barrier_blocks_until_full() {
        let barrier = Arc::new(Barrier::new(3));
        let arrived = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..2 {
            let barrier = Arc::clone(&barrier);
            let arrived = Arc::clone(&arrived);
            handles.push(thread::spawn(move || {
                let coordinator = barrier.arrive();
                arrived.fetch_add(1, Ordering::SeqCst);
                coordinator
            }));
        }

        // Two of three arrivers must still be parked.
        thread::sleep(Duration::from_millis(50));
        assert_eq!(arrived.load(Ordering::SeqCst), 0);

        let own = barrier.arrive();
        let mut coordinators = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect::<Vec<_>>();
        coordinators.push(own);
        assert_eq!(coordinators.iter().filter(|&&c| c).count(), 1);
    }

    #[test]
    fn test_barrier_single_participant_is_coordinator() {
        let barrier = Barrier::new(1);
        assert!(barrier.arrive());
    }
}
