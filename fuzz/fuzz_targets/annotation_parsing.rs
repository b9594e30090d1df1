#![no_main]

use ferrous_wire::tag;
use ferrous_wire::InjectSpec;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(annotation) = std::str::from_utf8(data) else {
        return;
    };

    match tag::parse(annotation) {
        Ok(directives) => {
            // Every accepted directive has a non-empty key
            assert!(!directives.is_empty());
            for (key, value) in directives.iter() {
                assert!(!key.is_empty());
                assert!(!key.contains(';') && !key.contains(':'));
                if let Some(value) = value {
                    assert!(!value.is_empty());
                }
            }
        }
        Err(err) => {
            let _ = err.to_string();
        }
    }

    // Descriptors need a 'static annotation
    let leaked: &'static str = Box::leak(annotation.to_owned().into_boxed_str());
    let spec = InjectSpec::from_tag(leaked);
    if let Some(alias) = spec.alias {
        assert!(leaked.contains(alias));
    }
});
