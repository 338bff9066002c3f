#![cfg(feature = "metrics")]

use once_cell::sync::Lazy;
use std::{
    collections::BTreeMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Instant,
};

use crate::error::Stage;

/* ───────────── Roh‑Latenzen ─────────────────────────── */

static TIMES: Lazy<Mutex<Vec<(Stage, u128)>>> =
    Lazy::new(|| Mutex::new(Vec::new()));

/// Im Session-Code aufrufen: `record(Stage::Context, t)`
pub fn record(stage: Stage, start: Instant) {
    let dur = start.elapsed().as_micros();
    // ein vergifteter Mutex kostet nur die Messung
    if let Ok(mut times) = TIMES.lock() {
        times.push((stage, dur));
    }
}

/* ───────────── Buffer‑Allokationen ───────────────────── */

pub static ALLOCS:      AtomicUsize = AtomicUsize::new(0);
pub static ALLOC_BYTES: AtomicUsize = AtomicUsize::new(0);

/// Mean and p95 latency per stage, in microseconds, in stage order.
/// Drains the recorded samples.
pub fn drain_latencies() -> Vec<(Stage, u128, u128)> {
    let mut map: BTreeMap<Stage, Vec<u128>> = BTreeMap::new();
    if let Ok(mut times) = TIMES.lock() {
        for (stage, us) in times.drain(..) {
            map.entry(stage).or_default().push(us);
        }
    }

    map.into_iter()
        .map(|(stage, mut v)| {
            v.sort_unstable();
            let mean = v.iter().sum::<u128>() / v.len() as u128;
            let p95  = v[((v.len() * 95) / 100).saturating_sub(1)];
            (stage, mean, p95)
        })
        .collect()
}

/* ───────────── Zusammenfassung ausgeben ─────────────── */

/// Am Programmende aufrufen, z. B. in `main()`
pub fn summary() {
    println!("── metrics summary ──");
    for (stage, mean, p95) in drain_latencies() {
        println!("{:<10} mean={:>5} µs   p95={:>5} µs", stage.as_str(), mean, p95);
    }

    let allocs = ALLOCS.load(Ordering::Relaxed);
    let bytes  = ALLOC_BYTES.load(Ordering::Relaxed);
    println!("live buffers: {}   ({} KiB)", allocs, bytes / 1024);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latencies_are_grouped_by_stage_in_order() {
        let t = Instant::now();
        record(Stage::Queue, t);
        record(Stage::Context, t);
        record(Stage::Queue, t);

        let stats = drain_latencies();
        let stages: Vec<Stage> = stats.iter().map(|s| s.0).collect();
        assert!(stages.contains(&Stage::Context));
        assert!(stages.windows(2).all(|w| w[0] < w[1]));
    }
}
