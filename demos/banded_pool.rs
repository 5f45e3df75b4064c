// Manually banded pool walkthrough: one worker per tier, mixed-priority
// submissions, completion signalled through captured state.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use roost::priority::ALL_TIERS;
use roost::{ThreadPool, logging};

fn main() -> anyhow::Result<()> {
    logging::init_default();

    let pool = ThreadPool::with_tier_counts([1, 1, 1, 1, 1])?;
    println!("banded pool started with {} workers", pool.thread_count());

    let done = Arc::new(AtomicUsize::new(0));
    const JOBS: usize = 50;

    for i in 0..JOBS {
        let tier = ALL_TIERS[i % 5];
        let done = Arc::clone(&done);
        pool.submit_with_priority(tier, move || {
            std::thread::sleep(Duration::from_millis(5));
            println!("job {:3} finished (tier {})", i, tier);
            done.fetch_add(1, Ordering::SeqCst);
        })?;
    }

    while done.load(Ordering::SeqCst) < JOBS {
        std::thread::sleep(Duration::from_millis(20));
    }

    println!("all {} jobs finished; shutting down", JOBS);
    pool.shutdown()?;
    Ok(())
}
