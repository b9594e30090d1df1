use ferrous_wire::{impl_wire, BuildStatus, ContainerBuilder, DiError, Inject, Key, Wire};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug)]
struct Engine {
    power: u32,
}
impl_wire!(Engine {});

struct Car {
    engine: Inject<Engine>,
    spare: Inject<Engine>,
}
impl_wire!(Car { engine, spare });

fn new_car() -> Car {
    Car {
        engine: Inject::new(),
        spare: Inject::named("spare"),
    }
}

#[test]
fn test_singleton_is_memoized() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let mut builder = ContainerBuilder::new();
    builder
        .register::<Engine, _>(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Engine { power: 100 }
        })
        .unwrap();
    let container = builder.build();

    let first = container.get::<Engine>().unwrap();
    let second = container.get::<Engine>().unwrap();

    assert!(Arc::ptr_eq(&first, &second)); // Same instance
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(container.status(&Key::of::<Engine>()), Some(BuildStatus::Done));
}

#[test]
fn test_duplicate_registration_keeps_first() {
    let mut builder = ContainerBuilder::new();
    builder.register::<Engine, _>(|| Engine { power: 1 }).unwrap();

    let err = builder.register::<Engine, _>(|| Engine { power: 2 }).unwrap_err();
    assert!(matches!(err, DiError::DuplicateRegistration(key) if key == Key::of::<Engine>()));

    // Same type under a fresh name is fine.
    builder.register_named::<Engine, _>("spare", || Engine { power: 3 }).unwrap();

    let container = builder.build();
    assert_eq!(container.get::<Engine>().unwrap().power, 1);
    assert_eq!(container.get_named::<Engine>("spare").unwrap().power, 3);
}

#[test]
fn test_unresolved_dependency_leaves_no_record() {
    let container = ContainerBuilder::new().build();

    let err = container.get::<Engine>().unwrap_err();
    assert!(matches!(err, DiError::UnresolvedDependency(key) if key == Key::of::<Engine>()));
    assert_eq!(container.status(&Key::of::<Engine>()), None);

    let err = container.get_named::<Engine>("missing").unwrap_err();
    assert_eq!(err.to_string(), format!("No factory registered for: {}#missing", std::any::type_name::<Engine>()));
}

#[test]
fn test_named_registrations_are_independent() {
    let mut builder = ContainerBuilder::new();
    builder.register::<Engine, _>(|| Engine { power: 150 }).unwrap();
    builder.register_named::<Engine, _>("spare", || Engine { power: 90 }).unwrap();
    builder.register_named::<Engine, _>("racing", || Engine { power: 400 }).unwrap();
    let container = builder.build();

    let unnamed = container.get::<Engine>().unwrap();
    let spare = container.get_named::<Engine>("spare").unwrap();
    let racing = container.get_named::<Engine>("racing").unwrap();

    assert!(!Arc::ptr_eq(&unnamed, &spare));
    assert!(!Arc::ptr_eq(&spare, &racing));
    assert_eq!((unnamed.power, spare.power, racing.power), (150, 90, 400));
}

#[test]
fn test_car_gets_engine_and_spare() {
    let mut builder = ContainerBuilder::new();
    builder.register::<Engine, _>(|| Engine { power: 150 }).unwrap();
    builder.register_named::<Engine, _>("spare", || Engine { power: 90 }).unwrap();
    builder.register::<Car, _>(new_car).unwrap();
    let container = builder.build();

    let car = container.get::<Car>().unwrap();
    assert!(Arc::ptr_eq(Inject::get(&car.engine).unwrap(), &container.get::<Engine>().unwrap()));
    assert!(Arc::ptr_eq(Inject::get(&car.spare).unwrap(), &container.get_named::<Engine>("spare").unwrap()));
    assert_eq!(car.spare.power, 90);
}

#[test]
fn test_missing_named_dependency_fails_the_dependent() {
    let mut builder = ContainerBuilder::new();
    builder.register::<Engine, _>(|| Engine { power: 150 }).unwrap();
    builder.register::<Car, _>(new_car).unwrap();
    let container = builder.build();

    let err = container.get::<Car>().map(|_| ()).unwrap_err();
    assert!(matches!(&err, DiError::UnresolvedDependency(key) if *key == Key::named::<Engine>("spare")));

    // The failure is memoized for the dependent, not for the missing key.
    assert_eq!(container.status(&Key::of::<Car>()), Some(BuildStatus::Failed));
    assert_eq!(container.status(&Key::named::<Engine>("spare")), None);
    assert!(matches!(container.get::<Car>().map(|_| ()), Err(DiError::UnresolvedDependency(_))));
}

#[test]
fn test_tagged_slots() {
    struct Garage {
        main: Inject<Engine>,
        backup: Inject<Engine>,
        fallback: Inject<Engine>,
    }
    impl_wire!(Garage { main, backup, fallback });

    let mut builder = ContainerBuilder::new();
    builder.register::<Engine, _>(|| Engine { power: 1 }).unwrap();
    builder.register_named::<Engine, _>("spare", || Engine { power: 2 }).unwrap();
    builder
        .register::<Garage, _>(|| Garage {
            main: Inject::tagged("type"),
            backup: Inject::tagged("type;alias:spare"),
            // Malformed annotations inject the unnamed registration.
            fallback: Inject::tagged("alias:spare;"),
        })
        .unwrap();

    let garage = builder.build().get::<Garage>().unwrap();
    assert_eq!(garage.main.power, 1);
    assert_eq!(garage.backup.power, 2);
    assert_eq!(garage.fallback.power, 1);
}

#[test]
fn test_trait_object_registration() {
    trait Transmission: Wire {
        fn gears(&self) -> u8;
    }

    struct Manual {
        engine: Inject<Engine>,
    }
    impl_wire!(Manual { engine });
    impl Transmission for Manual {
        fn gears(&self) -> u8 {
            if self.engine.power > 100 { 6 } else { 5 }
        }
    }

    struct Drivetrain {
        transmission: Inject<dyn Transmission>,
    }
    impl_wire!(Drivetrain { transmission });

    let mut builder = ContainerBuilder::new();
    builder.register::<Engine, _>(|| Engine { power: 150 }).unwrap();
    builder
        .register_shared::<dyn Transmission, _>(|| Arc::new(Manual { engine: Inject::new() }) as Arc<dyn Transmission>)
        .unwrap();
    builder
        .register::<Drivetrain, _>(|| Drivetrain { transmission: Inject::new() })
        .unwrap();
    let container = builder.build();

    // Wiring reaches the concrete type behind the trait object.
    let drivetrain = container.get::<Drivetrain>().unwrap();
    assert_eq!(drivetrain.transmission.gears(), 6);
    assert!(Arc::ptr_eq(
        Inject::get(&drivetrain.transmission).unwrap(),
        &container.get::<dyn Transmission>().unwrap()
    ));
}

#[test]
fn test_indirection_layers_are_wired() {
    let mut builder = ContainerBuilder::new();
    builder.register::<Engine, _>(|| Engine { power: 150 }).unwrap();
    builder.register_named::<Engine, _>("spare", || Engine { power: 90 }).unwrap();
    builder.register::<Option<Car>, _>(|| Some(new_car())).unwrap();
    builder.register::<Box<Car>, _>(|| Box::new(new_car())).unwrap();
    builder.register::<Option<Engine>, _>(|| None).unwrap();
    let container = builder.build();

    let optional = container.get::<Option<Car>>().unwrap();
    let car = (*optional).as_ref().unwrap();
    assert!(Inject::is_wired(&car.spare));

    let boxed = container.get::<Box<Car>>().unwrap();
    assert_eq!(boxed.engine.power, 150);

    // An empty layer has nothing to wire.
    assert!(container.get::<Option<Engine>>().unwrap().is_none());
}

#[test]
fn test_wire_external_value() {
    let mut builder = ContainerBuilder::new();
    builder.register::<Engine, _>(|| Engine { power: 150 }).unwrap();
    builder.register_named::<Engine, _>("spare", || Engine { power: 90 }).unwrap();
    let container = builder.build();

    let car = new_car();
    container.wire(&car).unwrap();
    assert!(Arc::ptr_eq(Inject::get(&car.engine).unwrap(), &container.get::<Engine>().unwrap()));

    // Already wired slots are left alone.
    container.wire(&car).unwrap();
    assert_eq!(car.spare.power, 90);

    // External values are not memoized.
    assert_eq!(container.status(&Key::of::<Car>()), None);
}

#[test]
fn test_wire_external_value_reports_missing_dependency() {
    let container = ContainerBuilder::new().build();
    let car = new_car();

    let err = container.wire(&car).unwrap_err();
    assert!(matches!(err, DiError::UnresolvedDependency(key) if key == Key::of::<Engine>()));
    assert!(!Inject::is_wired(&car.engine));
}

#[test]
fn test_factory_panic_is_memoized() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();

    let mut builder = ContainerBuilder::new();
    builder
        .register::<Engine, _>(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            panic!("engine factory exploded")
        })
        .unwrap();
    let container = builder.build();

    let first = catch_unwind(AssertUnwindSafe(|| container.get::<Engine>()));
    assert!(first.is_err());

    let err = container.get::<Engine>().unwrap_err();
    assert!(matches!(err, DiError::FactoryPanicked(key) if key == Key::of::<Engine>()));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_resolve_by_key_checks_type() {
    let mut builder = ContainerBuilder::new();
    builder.register_named::<u32, _>("port", || 8080).unwrap();
    let container = builder.build();

    let key = Key::named::<u32>("port");
    assert_eq!(*container.resolve::<u32>(&key).unwrap(), 8080);
    assert!(matches!(container.resolve::<u64>(&key), Err(DiError::TypeMismatch(_))));
}

#[test]
#[should_panic(expected = "Failed to resolve")]
fn test_get_required_panics_when_missing() {
    let container = ContainerBuilder::new().build();
    let _ = container.get_required::<Engine>();
}

#[test]
fn test_get_named_required() {
    let mut builder = ContainerBuilder::new();
    builder.register_named::<String, _>("greeting", || "hello".to_string()).unwrap();
    let container = builder.build();

    assert_eq!(*container.get_named_required::<String>("greeting"), "hello");
    assert!(container.is_registered(&Key::named::<String>("greeting")));
    assert!(!container.is_registered(&Key::of::<String>()));
}
