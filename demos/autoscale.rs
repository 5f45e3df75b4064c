// Autoscaling observation loop: a fixed-ceiling pool under a burst of work,
// with metrics printed while the observer grows and then shrinks the pool.

use std::time::Duration;

use roost::{PoolConfig, ScalingMode, ThreadPool, logging};

fn main() -> anyhow::Result<()> {
    logging::init_default();

    let pool = ThreadPool::with_config(PoolConfig {
        scaling_mode: ScalingMode::FixedCeiling(4),
        observer_cadence: Duration::from_millis(50),
        ..PoolConfig::default()
    })?;

    // A burst of slow jobs so the queue backlog drives the counter up.
    for _ in 0..200 {
        pool.submit(|| std::thread::sleep(Duration::from_millis(10)))?;
    }

    // Watch the pool work through the burst and then idle back down.
    for _ in 0..100 {
        let m = pool.metrics();
        println!(
            "state={:?} workers={} queue={} ceiling={}",
            m.state, m.thread_count, m.queue_depth, m.max_threads
        );
        if m.queue_depth == 0 && m.thread_count == 1 {
            break;
        }
        std::thread::sleep(Duration::from_millis(200));
    }

    pool.shutdown()?;
    println!("pool stopped");
    Ok(())
}
