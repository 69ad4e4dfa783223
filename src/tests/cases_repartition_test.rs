//! Repartitioning: durability, flag transitions, and auto mode.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use crate::engine::BTreeEngine;
    use crate::store::{KvStore, SoftThreadedStore};
    use crate::tests::support::{all_flavors, options, settle};

    #[test]
    fn test_repartition_preserves_untracked_data() {
        for (name, store) in all_flavors(4) {
            // Written with tracking off: the partitioner never sees these.
            for i in 1..=20 {
                store
                    .write(&format!("untracked_key_{i}"), format!("u{i}").as_bytes())
                    .unwrap();
            }

            store.enable_tracking(true);
            for i in 1..=10 {
                store
                    .write(&format!("tracked_key_{i}"), format!("t{i}").as_bytes())
                    .unwrap();
            }
            // Give the tracked keys some co-access so the graph partitions.
            store.scan("tracked_key_", 10).unwrap();
            settle();

            store.repartition();
            assert!(!store.is_repartitioning(), "flavor {name}");
            assert!(!store.is_tracking(), "flavor {name}");

            for i in 1..=20 {
                assert_eq!(
                    store.read(&format!("untracked_key_{i}")).unwrap(),
                    format!("u{i}").as_bytes(),
                    "flavor {name}"
                );
            }
            for i in 1..=10 {
                assert_eq!(
                    store.read(&format!("tracked_key_{i}")).unwrap(),
                    format!("t{i}").as_bytes(),
                    "flavor {name}"
                );
            }
        }
    }

    #[test]
    fn test_repartition_clears_graph_on_success() {
        for (name, store) in all_flavors(2) {
            for i in 0..6 {
                store.write(&format!("k{i}"), b"v").unwrap();
            }
            store.enable_tracking(true);
            store.scan("k", 6).unwrap();
            settle();
            assert!(store.graph().vertex_count() > 1, "flavor {name}");

            store.repartition();
            assert_eq!(store.graph().vertex_count(), 0, "flavor {name}");
        }
    }

    #[test]
    fn test_repartition_with_empty_graph_is_a_no_op() {
        for (name, store) in all_flavors(4) {
            for i in 0..8 {
                store
                    .write(&format!("k{i}"), format!("v{i}").as_bytes())
                    .unwrap();
            }
            store.repartition();
            for i in 0..8 {
                assert_eq!(
                    store.read(&format!("k{i}")).unwrap(),
                    format!("v{i}").as_bytes(),
                    "flavor {name}"
                );
            }
        }
    }

    #[test]
    fn test_repartition_flag_transitions() {
        let store = Arc::new(
            SoftThreadedStore::<BTreeEngine>::new(options(4)).unwrap(),
        );
        for i in 0..8 {
            store.write(&format!("k{i}"), b"v").unwrap();
        }
        store.enable_tracking(true);
        store.scan("k", 8).unwrap();
        settle();

        assert!(!store.is_repartitioning());
        let observer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                // Poll for the window where the flag is raised.
                for _ in 0..2000 {
                    if store.is_repartitioning() {
                        return true;
                    }
                    thread::sleep(Duration::from_micros(50));
                }
                false
            })
        };
        store.repartition();
        assert!(observer.join().unwrap(), "flag never observed raised");
        assert!(!store.is_repartitioning());
        assert!(!store.is_tracking());
    }

    #[test]
    fn test_auto_repartition_loop_runs_and_survives() {
        let store = SoftThreadedStore::<BTreeEngine>::new(
            options(4)
                .with_tracking_duration(Duration::from_millis(40))
                .with_repartition_interval(Duration::from_millis(40)),
        )
        .unwrap();

        for i in 0..16 {
            store
                .write(&format!("k{i:02}"), format!("v{i}").as_bytes())
                .unwrap();
        }
        // Cross a few loop cycles while issuing scans so tracking windows
        // capture co-access.
        for _ in 0..6 {
            let _ = store.scan("k", 8);
            thread::sleep(Duration::from_millis(30));
        }

        for i in 0..16 {
            assert_eq!(
                store.read(&format!("k{i:02}")).unwrap(),
                format!("v{i}").as_bytes()
            );
        }
        // Dropping the store here joins the loop, the workers, and the
        // tracker without hanging.
    }

    #[test]
    fn test_single_partition_never_auto_repartitions() {
        let store = SoftThreadedStore::<BTreeEngine>::new(
            options(1)
                .with_tracking_duration(Duration::from_millis(10))
                .with_repartition_interval(Duration::from_millis(10)),
        )
        .unwrap();
        store.write("k", b"v").unwrap();
        thread::sleep(Duration::from_millis(60));
        // No loop thread exists, so tracking was never toggled on.
        assert!(!store.is_tracking());
        assert_eq!(store.read("k").unwrap(), b"v");
    }
}
