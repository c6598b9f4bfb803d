//! In-memory service registry tests

use parking_lot::Mutex;
use scr_domain::constants::SERVICE_RANKING;
use scr_domain::ports::{
    ServiceEvent, ServiceEventKind, ServiceFactory, ServiceListener, ServiceRegistry, ServiceSource,
};
use scr_domain::{
    ConsumerId, Filter, Properties, ServiceId, ServiceObject, ServiceReference, downcast_service,
    service_object,
};
use scr_infrastructure::InMemoryServiceRegistry;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn register(registry: &InMemoryServiceRegistry, label: &str, ranking: i64) -> ServiceReference {
    registry
        .register(
            &ConsumerId::new("provider"),
            &["ILog".to_string()],
            ServiceSource::Object(service_object(label.to_string())),
            Properties::new().with("label", label).with(SERVICE_RANKING, ranking),
        )
        .unwrap()
}

#[derive(Default)]
struct EventLog {
    events: Mutex<Vec<(ServiceEventKind, ServiceId, bool)>>,
    registry: Mutex<Option<Arc<InMemoryServiceRegistry>>>,
}

impl ServiceListener for EventLog {
    fn service_changed(&self, event: &ServiceEvent) {
        // Re-enters the registry to observe whether the service is still visible
        let visible = self
            .registry
            .lock()
            .as_ref()
            .is_some_and(|r| r.reference(event.reference.id()).is_some());
        self.events
            .lock()
            .push((event.kind, event.reference.id(), visible));
    }
}

#[derive(Default)]
struct CountingFactory {
    gets: AtomicUsize,
    ungets: AtomicUsize,
}

impl ServiceFactory for CountingFactory {
    fn get_service(&self, consumer: &ConsumerId, _reference: &ServiceReference) -> Option<ServiceObject> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Some(service_object(consumer.to_string()))
    }

    fn unget_service(&self, _consumer: &ConsumerId, _reference: &ServiceReference, _service: &ServiceObject) {
        self.ungets.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_ids_ascend_and_query_is_ranked() {
    let registry = InMemoryServiceRegistry::new();
    let a = register(&registry, "a", 5);
    let b = register(&registry, "b", 10);
    let c = register(&registry, "c", 1);
    let d = register(&registry, "d", 5);

    assert_eq!([a.id(), b.id(), c.id(), d.id()], [ServiceId(1), ServiceId(2), ServiceId(3), ServiceId(4)]);

    let labels: Vec<String> = registry
        .query("ILog", None)
        .iter()
        .filter_map(|r| r.properties().string("label").map(str::to_string))
        .collect();
    assert_eq!(labels, ["b", "a", "d", "c"]);

    let filter = Filter::parse("(|(label=a)(label=c))").unwrap();
    assert_eq!(registry.query("ILog", Some(&filter)).len(), 2);
    assert!(registry.query("IOther", None).is_empty());
}

#[test]
fn test_factory_usage_counting() {
    let registry = InMemoryServiceRegistry::new();
    let factory = Arc::new(CountingFactory::default());
    let reference = registry
        .register(
            &ConsumerId::new("provider"),
            &["IGreeter".to_string()],
            ServiceSource::Factory(Arc::clone(&factory) as Arc<dyn ServiceFactory>),
            Properties::new(),
        )
        .unwrap();
    let alice = ConsumerId::new("alice");
    let bob = ConsumerId::new("bob");

    let first = registry.acquire(&reference, &alice).unwrap();
    let second = registry.acquire(&reference, &alice).unwrap();
    let other = registry.acquire(&reference, &bob).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(downcast_service::<String>(&other).as_deref().map(String::as_str), Some("bob"));
    assert_eq!(factory.gets.load(Ordering::SeqCst), 2);
    assert_eq!(registry.usage_count(reference.id(), &alice), 2);

    assert!(registry.release(&reference, &alice));
    assert_eq!(factory.ungets.load(Ordering::SeqCst), 0);
    assert!(registry.release(&reference, &alice));
    assert_eq!(factory.ungets.load(Ordering::SeqCst), 1);
    assert!(!registry.release(&reference, &alice));

    // Remaining users are released on unregistration
    registry.unregister(reference.id()).unwrap();
    assert_eq!(factory.ungets.load(Ordering::SeqCst), 2);
}

#[test]
fn test_events_and_unregistering_visibility() {
    let registry = Arc::new(InMemoryServiceRegistry::new());
    let log = Arc::new(EventLog::default());
    *log.registry.lock() = Some(Arc::clone(&registry));
    let listener = registry.add_service_listener(Arc::clone(&log) as Arc<dyn ServiceListener>);

    let reference = register(&registry, "a", 0);
    registry
        .set_properties(reference.id(), Properties::new().with("label", "renamed"))
        .unwrap();
    assert_eq!(
        registry.reference(reference.id()).unwrap().properties().string("label"),
        Some("renamed")
    );
    assert_eq!(registry.reference(reference.id()).unwrap().interfaces(), ["ILog"]);
    registry.unregister(reference.id()).unwrap();

    assert_eq!(
        *log.events.lock(),
        vec![
            (ServiceEventKind::Registered, reference.id(), true),
            (ServiceEventKind::Modified, reference.id(), true),
            (ServiceEventKind::Unregistering, reference.id(), true),
        ]
    );
    assert!(registry.unregister(reference.id()).is_err());

    registry.remove_service_listener(listener);
    register(&registry, "b", 0);
    assert_eq!(log.events.lock().len(), 3);
}

#[test]
fn test_register_permission() {
    let registry = InMemoryServiceRegistry::new();
    let owner = ConsumerId::new("provider");
    registry.deny_register_permission("ILog");

    assert!(!registry.has_register_permission(&owner, "ILog"));
    assert!(registry.has_register_permission(&owner, "IOther"));
    assert!(
        registry
            .register(
                &owner,
                &["ILog".to_string()],
                ServiceSource::Object(service_object(())),
                Properties::new()
            )
            .is_err()
    );

    registry.allow_register_permission("ILog");
    assert!(registry.has_register_permission(&owner, "ILog"));
    assert_eq!(registry.service_count(), 0);
}
