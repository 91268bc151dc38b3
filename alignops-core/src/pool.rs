//! Scoped worker pool for independent per-stem work.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Worker count used when none is configured.
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Apply `f` to every item on up to `jobs` threads.
///
/// Results come back in input order regardless of which worker finished
/// first, so callers can fold them deterministically.
pub fn map<T, R, F>(jobs: usize, items: Vec<T>, f: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync,
{
    let workers = jobs.max(1).min(items.len());
    if workers <= 1 {
        return items.into_iter().map(f).collect();
    }

    let next = AtomicUsize::new(0);
    let inputs: Vec<Mutex<Option<T>>> = items.into_iter().map(|t| Mutex::new(Some(t))).collect();
    let outputs: Vec<Mutex<Option<R>>> = inputs.iter().map(|_| Mutex::new(None)).collect();

    std::thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| {
                loop {
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    let Some(input) = inputs.get(i) else {
                        break;
                    };
                    let item = input.lock().ok().and_then(|mut slot| slot.take());
                    if let Some(item) = item {
                        let result = f(item);
                        if let Ok(mut slot) = outputs[i].lock() {
                            *slot = Some(result);
                        }
                    }
                }
            });
        }
    });

    outputs
        .into_iter()
        .filter_map(|slot| slot.into_inner().ok().flatten())
        .collect()
}
