#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use vigil_core::{Registry, ValueSource};

fn ticking(start: f64, step: Arc<AtomicU64>) -> ValueSource {
    ValueSource::new(move || start + step.fetch_add(1, Ordering::Relaxed) as f64)
}

#[test]
fn vector_scrapes_are_stable_in_shape_and_fresh_in_value() {
    let ticks = Arc::new(AtomicU64::new(0));
    let mut registry = Registry::bare();
    registry
        .create_counter_vec(
            "hits",
            "Hits by route and status code",
            &["route", "code"],
            vec![
                (vec!["/a".into(), "200".into()], ticking(1.0, Arc::clone(&ticks))),
                (vec!["/b".into(), "404".into()], ticking(2.0, Arc::clone(&ticks))),
            ],
        )
        .expect("register hits");

    let first = registry.gather();
    let second = registry.gather();

    for snap in [&first, &second] {
        assert_eq!(snap.families.len(), 1);
        let labels: Vec<Vec<String>> = snap.families[0]
            .samples
            .iter()
            .map(|s| s.label_values.to_vec())
            .collect();
        assert_eq!(labels, vec![vec!["/a", "200"], vec!["/b", "404"]]);
    }

    let v1: Vec<f64> = first.families[0].samples.iter().map(|s| s.value).collect();
    let v2: Vec<f64> = second.families[0].samples.iter().map(|s| s.value).collect();
    assert_eq!(v1, vec![1.0, 3.0]);
    assert_eq!(v2, vec![3.0, 5.0]);
    assert_eq!(ticks.load(Ordering::Relaxed), 4);
}

#[test]
fn concurrent_scrapes_share_a_frozen_registry() {
    let calls = Arc::new(AtomicU64::new(0));
    let mut registry = Registry::bare();
    for i in 0..8 {
        let calls = Arc::clone(&calls);
        registry
            .create_gauge(&format!("g{i}"), "", ValueSource::new(move || {
                calls.fetch_add(1, Ordering::Relaxed);
                i as f64
            }))
            .unwrap();
    }
    let registry = Arc::new(registry);

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..25 {
                    let snap = registry.gather();
                    assert_eq!(snap.families.len(), 8);
                    assert!(snap.failures.is_empty());
                    for (i, f) in snap.families.iter().enumerate() {
                        assert_eq!(f.descriptor.name(), format!("g{i}"));
                        assert_eq!(f.samples[0].value, i as f64);
                    }
                }
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(calls.load(Ordering::Relaxed), 4 * 25 * 8);
}
