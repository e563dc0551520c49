use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use plugboard::{
    Consumer, Dynamic, Eager, Injector, Lazy, Overrides, Registry, ResolutionErrorKind, assign,
    resolve,
};
use serial_test::serial;

struct MyComponent;

struct Component;

#[derive(Debug, PartialEq)]
struct Endpoint(String);

#[derive(Consumer)]
#[require(my_component: MyComponent, component: Component)]
#[require(endpoint: Endpoint)]
struct Service {
    injector: Injector,
}

impl Service {
    fn new() -> Self {
        Self::with_overrides(Overrides::new())
    }

    fn with_overrides(overrides: Overrides) -> Self {
        Self {
            injector: Injector::bound::<Self>(overrides),
        }
    }
}

#[derive(Consumer)]
#[require(session: Component)]
struct Worker {
    #[allow(unused)]
    id: usize,
    #[injector]
    state: Injector,
}

#[test]
fn test_binding() {
    let binding = Service::binding();
    assert_eq!(binding.consumer(), "Service");
    assert_eq!(binding.names(), &["my_component", "component", "endpoint"]);
    assert_eq!(Worker::binding().names(), &["session"]);
}

#[test]
#[serial]
fn test_dependency_not_found() {
    Registry::new().install();
    let err = Service::new().endpoint().unwrap_err();
    assert_eq!(err.kind(), &ResolutionErrorKind::NotFound);
    assert_eq!(err.name(), "endpoint");
    assert_eq!(err.consumer(), Some("Service"));
}

#[test]
#[serial]
fn test_default_names() {
    let my_component = Arc::new(MyComponent);
    Registry::new()
        .with(Eager::from_arc(my_component.clone()))
        .with(Lazy::new(|| Component))
        .install();
    let service = Service::new();
    assert!(Arc::ptr_eq(&service.my_component().unwrap(), &my_component));
    assert!(Arc::ptr_eq(
        &service.component().unwrap(),
        &Service::new().component().unwrap()
    ));
}

#[test]
#[serial]
fn test_manual_setter_injection() {
    Registry::new().install();
    let service = Service::new();
    assert!(service.endpoint().is_err());
    service.set_endpoint(Endpoint("localhost".into()));
    assert_eq!(*service.endpoint().unwrap(), Endpoint("localhost".into()));
    assert!(Service::new().endpoint().is_err());
}

#[test]
#[serial]
fn test_manual_setter_injection_without_registry() {
    Registry::uninstall();
    let service = Service::new();
    let err = service.endpoint().unwrap_err();
    assert_eq!(err.kind(), &ResolutionErrorKind::NoRegistry);
    assign(&service, "endpoint", Endpoint("remote".into())).unwrap();
    assert_eq!(*service.endpoint().unwrap(), Endpoint("remote".into()));
}

#[test]
#[serial]
fn test_manual_constructor_injection() {
    Registry::new().install();
    let service = Service::with_overrides(
        Overrides::new()
            .with("endpoint", Endpoint("localhost".into()))
            .with("unknown", 1u8),
    );
    assert_eq!(*service.endpoint().unwrap(), Endpoint("localhost".into()));
    assert!(!service.injector().has_override("unknown"));
}

#[test]
#[serial]
fn test_registry_resolution_precedes_override() {
    Registry::new()
        .with(Eager::new(Endpoint("registry".into())))
        .install();
    let service =
        Service::with_overrides(Overrides::new().with("endpoint", Endpoint("manual".into())));
    assert_eq!(*service.endpoint().unwrap(), Endpoint("registry".into()));
    Registry::uninstall();
    assert_eq!(*service.endpoint().unwrap(), Endpoint("manual".into()));
}

#[test]
#[serial]
fn test_per_consumer_lazy_dependency() {
    Registry::new()
        .with(Lazy::new(|| Component).named("session").per_consumer())
        .install();
    let first = Worker {
        id: 1,
        state: Injector::new(),
    };
    let second = Worker {
        id: 2,
        state: Injector::new(),
    };
    let session = first.session().unwrap();
    assert!(Arc::ptr_eq(&session, &first.session().unwrap()));
    assert!(!Arc::ptr_eq(&session, &second.session().unwrap()));
}

#[test]
#[serial]
fn test_lazy_dependency_matrix() {
    #[derive(Consumer)]
    #[require(tt: Component, tf: Component, ft: Component, ff: Component)]
    struct Matrix {
        injector: Injector,
    }

    fn matrix() -> Matrix {
        Matrix {
            injector: Injector::new(),
        }
    }

    Registry::new()
        .with(Lazy::new(|| Component).named("tt").scoped(true, true))
        .with(Lazy::new(|| Component).named("tf").scoped(true, false))
        .with(Lazy::new(|| Component).named("ft").scoped(false, true))
        .with(Lazy::new(|| Component).named("ff").scoped(false, false))
        .install();

    let (a1, a2) = (matrix(), matrix());
    let names = ["tt", "tf", "ft", "ff"];
    let main: Vec<_> = names
        .iter()
        .map(|name| {
            (
                resolve::<_, Component>(&a1, name).unwrap(),
                resolve::<_, Component>(&a2, name).unwrap(),
            )
        })
        .collect();
    let other: Vec<_> = thread::scope(|s| {
        s.spawn(|| {
            names
                .iter()
                .map(|name| resolve::<_, Component>(&a1, name).unwrap())
                .collect::<Vec<_>>()
        })
        .join()
        .unwrap()
    });

    for (index, name) in names.iter().enumerate() {
        let per_thread = name.starts_with('t');
        let per_consumer = name.ends_with('t');
        let (first, second) = &main[index];
        assert!(Arc::ptr_eq(first, &resolve::<_, Component>(&a1, name).unwrap()));
        assert_eq!(!Arc::ptr_eq(first, second), per_consumer, "{name}");
        assert_eq!(!Arc::ptr_eq(first, &other[index]), per_thread, "{name}");
    }
}

#[test]
#[serial]
fn test_dynamic_dependency() {
    let calls = Arc::new(AtomicUsize::new(0));
    Registry::new()
        .with(
            Dynamic::new({
                let calls = calls.clone();
                move || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Component
                }
            })
            .named("component"),
        )
        .install();
    let service = Service::new();
    service.component().unwrap();
    service.component().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
#[serial]
fn test_concurrent_reads_construct_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    Registry::new()
        .with(Lazy::new({
            let calls = calls.clone();
            move || {
                calls.fetch_add(1, Ordering::SeqCst);
                Component
            }
        }))
        .install();
    let service = Service::new();
    let values: Vec<_> = thread::scope(|s| {
        let handles: Vec<_> = (0..32)
            .map(|_| s.spawn(|| service.component().unwrap()))
            .collect();
        handles.into_iter().map(|v| v.join().unwrap()).collect()
    });
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(values.iter().all(|v| Arc::ptr_eq(v, &values[0])));
}
