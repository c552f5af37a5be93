//! Fake I/O example
//!
//! Simulates a request handler whose response waits on slow I/O: each
//! request defers a random 100-200ms, then the delayed callback submits
//! "write response" to the worker pool.
//!
//! # Environment Variables
//!
//! - `DTASK_LOG=debug` - Log filter (EnvFilter syntax)
//! - `DTASK_NUM_WORKERS=4` - Worker threads
//! - `DTASK_QUEUE_FULL=timeout:500` - Backpressure policy
//! - `FAKE_IO_REQUESTS=200` - Number of simulated requests
//
// DTASK_LOG=debug FAKE_IO_REQUESTS=50 cargo run -p dtask-fake-io

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dtask::{env_get, init_logging, DTaskResult, Scheduler, SchedulerConfig, TaskHandle};
use tracing::{debug, info, warn};

const IO_MIN: Duration = Duration::from_millis(100);
const IO_MAX: Duration = Duration::from_millis(200);

fn main() -> DTaskResult<()> {
    println!("=== dtask Fake I/O Example ===\n");
    init_logging();

    let requests: usize = env_get("FAKE_IO_REQUESTS", 200);
    let config = SchedulerConfig::from_env();
    println!(
        "workers={} capacity={} policy={:?} requests={}",
        config.num_workers, config.queue_capacity, config.queue_full, requests
    );

    let scheduler = Scheduler::new(config)?;
    let responses = Arc::new(AtomicUsize::new(0));
    let writes: Arc<Mutex<Vec<TaskHandle>>> = Arc::new(Mutex::new(Vec::with_capacity(requests)));
    let start = Instant::now();

    for request in 0..requests {
        let handle = scheduler.handle();
        let responses = Arc::clone(&responses);
        let writes = Arc::clone(&writes);
        scheduler.after_random(IO_MIN..IO_MAX, move || {
            debug!(request, "I/O complete");
            let submitted = handle.submit(move || {
                // "write response"
                std::thread::sleep(Duration::from_millis(1));
                responses.fetch_add(1, Ordering::Relaxed);
            });
            match submitted {
                Ok(write) => writes.lock().unwrap_or_else(|e| e.into_inner()).push(write),
                Err(e) => warn!(request, error = %e, "response dropped"),
            }
        })?;
    }
    info!(requests, "all requests accepted");

    if !scheduler.wait_idle(Duration::from_secs(30)) {
        warn!("timed out waiting for responses");
    }
    let elapsed = start.elapsed();
    let stats = scheduler.shutdown();
    let done = writes
        .lock()
        .unwrap_or_else(|e| e.into_inner())
        .iter()
        .filter(|w| w.is_done())
        .count();

    println!("\n=== Results ===");
    println!("Responses written: {}/{}", responses.load(Ordering::Relaxed), requests);
    println!("Writes done:       {}", done);
    println!("Elapsed:           {:?}", elapsed);
    println!("Timers fired:      {}", stats.timers_fired);
    println!("Pool completed:    {}", stats.pool.completed);
    println!("Pool rejected:     {}", stats.pool.rejected);
    if let Some(poller) = stats.poller {
        println!("Poller scans:      {}", poller.poll_count);
        println!("Largest batch:     {}", poller.max_batch_size);
        println!("Inline fallbacks:  {}", poller.inline_fallbacks);
    }
    Ok(())
}
