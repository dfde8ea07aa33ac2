//! Readers running alongside refresh batches.

use crate::helpers::fixtures::*;
use crate::helpers::workspace::FakeWorkspace;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

const MODULES: usize = 40;

fn path(i: usize) -> String {
    format!("m{i}/pom.xml")
}

#[test]
fn test_readers_never_observe_torn_facades() {
    let ws = Arc::new(FakeWorkspace::new());
    for i in 0..MODULES {
        let artifact = format!("m{i}");
        let previous = format!("m{}", i.saturating_sub(1));
        ws.put(&path(i), module(&artifact, "1.0", &[previous.as_str()]));
    }
    let manager = manager(&ws);
    let paths: Vec<String> = (0..MODULES).map(path).collect();
    let refs: Vec<&str> = paths.iter().map(String::as_str).collect();
    refresh(&manager, &refs);

    let done = AtomicBool::new(false);
    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                while !done.load(Ordering::Acquire) {
                    for facade in manager.facades() {
                        let artifact = facade.artifact_key().artifact().to_string();
                        assert_eq!(facade.id(), &id(&format!("{artifact}/pom.xml")));
                        assert!(matches!(facade.artifact_key().version(), "1.0" | "2.0"));
                        assert_eq!(facade.dependencies().len(), 1);
                    }
                    let _ = manager.registry().dependents(&id(&path(0)), false);
                }
            });
        }

        for i in 0..MODULES {
            let artifact = format!("m{i}");
            let previous = format!("m{}", i.saturating_sub(1));
            ws.put(&path(i), module(&artifact, "2.0", &[previous.as_str()]));
        }
        refresh(&manager, &refs);
        done.store(true, Ordering::Release);
    });

    assert_eq!(manager.facades().len(), MODULES);
    assert!(
        manager
            .facades()
            .iter()
            .all(|f| f.artifact_key().version() == "2.0")
    );
}

#[test]
fn test_concurrent_batches_are_serialized() {
    let ws = Arc::new(FakeWorkspace::new());
    ws.put("a/pom.xml", module("a", "1.0", &[]));
    ws.put("b/pom.xml", module("b", "1.0", &["a"]));
    let manager = Arc::new(manager(&ws));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let manager = manager.clone();
            thread::spawn(move || {
                try_refresh(&manager, &["a/pom.xml", "b/pom.xml"], false).is_ok()
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().unwrap());
    }

    assert_eq!(ws.resolutions_of("a/pom.xml"), 1);
    assert_eq!(ws.resolutions_of("b/pom.xml"), 1);
}
