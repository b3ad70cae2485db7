//! Test file for concurrent use of EventBus

#[cfg(test)]
mod tests {
    use crate::testing::RecordingReporter;
    use crate::{listener, Event, EventBus, FamilyType};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Barrier, Mutex};
    use std::thread;

    pub trait TestEvent: Event {}
    pub trait TestListener: Send + Sync {}

    pub struct CounterEvent {
        pub id: u64,
    }

    impl TestEvent for CounterEvent {}

    #[derive(Default)]
    pub struct Tally {
        seen: AtomicUsize,
        ids: Mutex<Vec<u64>>,
    }

    impl TestListener for Tally {}

    #[listener(events = dyn TestEvent, family = dyn TestListener)]
    impl Tally {
        #[subscribe]
        pub fn on_counter(&self, event: &CounterEvent) {
            self.seen.fetch_add(1, Ordering::SeqCst);
            self.ids.lock().unwrap().push(event.id);
        }
    }

    /// Runs early and registers a late listener while the bus is dispatching.
    pub struct Recruiter {
        bus: Arc<EventBus<dyn TestEvent, dyn TestListener>>,
        recruit: Arc<Tally>,
    }

    impl TestListener for Recruiter {}

    #[listener(events = dyn TestEvent, family = dyn TestListener)]
    impl Recruiter {
        #[subscribe(priority = -1)]
        pub fn on_counter(&self, _event: &CounterEvent) {
            if !self.bus.is_registered(&self.recruit) {
                self.bus.register_listener(&self.recruit).unwrap();
            }
        }
    }

    fn bus(reporter: Arc<RecordingReporter>) -> Arc<EventBus<dyn TestEvent, dyn TestListener>> {
        let bus = EventBus::<dyn TestEvent, dyn TestListener>::builder()
            .event_family(FamilyType::of::<dyn TestEvent>())
            .listener_family(FamilyType::of::<dyn TestListener>())
            .with_reporter(reporter)
            .build()
            .unwrap();
        Arc::new(bus)
    }

    #[test]
    fn test_concurrent_emission() {
        let bus = bus(Arc::new(RecordingReporter::new()));
        let tally = Arc::new(Tally::default());
        bus.register_listener(&tally).unwrap();

        let handles: Vec<_> = (0..8u64)
            .map(|thread_id| {
                let bus = Arc::clone(&bus);
                thread::spawn(move || {
                    for i in 0..100u64 {
                        bus.fire_event(&CounterEvent {
                            id: thread_id * 1000 + i,
                        });
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(tally.seen.load(Ordering::SeqCst), 800);
        assert_eq!(tally.ids.lock().unwrap().len(), 800);
    }

    #[test]
    fn test_concurrent_registration() {
        let bus = bus(Arc::new(RecordingReporter::new()));
        let barrier = Arc::new(Barrier::new(4));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let bus = Arc::clone(&bus);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let tallies: Vec<Arc<Tally>> =
                        (0..25).map(|_| Arc::new(Tally::default())).collect();
                    for tally in &tallies {
                        bus.register_listener(tally).unwrap();
                    }
                    tallies
                })
            })
            .collect();

        let tallies: Vec<Arc<Tally>> = handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect();

        assert_eq!(bus.handler_count::<CounterEvent>(), 100);

        bus.fire_event(&CounterEvent { id: 7 });
        assert!(tallies
            .iter()
            .all(|tally| tally.seen.load(Ordering::SeqCst) == 1));

        for tally in &tallies {
            assert_eq!(bus.unregister_listener(tally), 1);
        }
        assert_eq!(bus.total_handler_count(), 0);
        assert_eq!(bus.unit_factory().domain_count(), 0);
    }

    #[test]
    fn test_emission_while_registering() {
        let bus = bus(Arc::new(RecordingReporter::new()));
        let anchor = Arc::new(Tally::default());
        bus.register_listener(&anchor).unwrap();

        let writer = {
            let bus = Arc::clone(&bus);
            thread::spawn(move || {
                for _ in 0..50 {
                    let tally = Arc::new(Tally::default());
                    bus.register_listener(&tally).unwrap();
                    bus.unregister_listener(&tally);
                }
            })
        };

        for id in 0..200 {
            bus.fire_event(&CounterEvent { id });
        }
        writer.join().unwrap();

        // The anchor is in every snapshot, whatever the writer was doing.
        assert_eq!(anchor.seen.load(Ordering::SeqCst), 200);
        assert_eq!(bus.handler_count::<CounterEvent>(), 1);
    }

    #[test]
    fn test_registration_from_handler() {
        let reporter = Arc::new(RecordingReporter::new());
        let bus = bus(Arc::clone(&reporter));
        let recruit = Arc::new(Tally::default());
        let recruiter = Arc::new(Recruiter {
            bus: Arc::clone(&bus),
            recruit: Arc::clone(&recruit),
        });
        bus.register_listener(&recruiter).unwrap();

        // The running dispatch keeps its snapshot, so the recruit only sees
        // the next event.
        bus.fire_event(&CounterEvent { id: 1 });
        assert_eq!(recruit.seen.load(Ordering::SeqCst), 0);

        bus.fire_event(&CounterEvent { id: 2 });
        assert_eq!(*recruit.ids.lock().unwrap(), vec![2]);
        assert!(reporter.is_empty());

        bus.unregister_listener(&recruiter);
    }
}
