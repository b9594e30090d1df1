#![no_main]

use ferrous_wire::{BuildStatus, ContainerBuilder, DiError, Key};
use libfuzzer_sys::fuzz_target;

const NAMES: [&str; 8] = ["a", "b", "c", "d", "e", "f", "g", "h"];

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    // First byte selects which names are registered
    let mask = data[0];
    let mut builder = ContainerBuilder::new();
    for (i, name) in NAMES.iter().enumerate() {
        if mask & (1 << i) != 0 {
            builder.register_named::<u32, _>(*name, move || i as u32).unwrap();
        }
    }
    let container = builder.build();

    // Remaining bytes are a request sequence
    for &byte in &data[1..] {
        let i = (byte % 8) as usize;
        let name = NAMES[i];
        match container.get_named::<u32>(name) {
            Ok(value) => {
                assert!(mask & (1 << i) != 0);
                assert_eq!(*value, i as u32);
                assert_eq!(container.status(&Key::named::<u32>(name)), Some(BuildStatus::Done));
            }
            Err(DiError::UnresolvedDependency(key)) => {
                assert!(mask & (1 << i) == 0);
                assert_eq!(container.status(&key), None);
            }
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
});
