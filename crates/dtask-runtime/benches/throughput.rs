use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dtask_runtime::timer::{create_backend, TimerBackendType};
use dtask_runtime::{DelayQueue, PoolConfig, WorkerPool};

fn benchmark_pool_submit(c: &mut Criterion) {
    let pool = WorkerPool::new(PoolConfig::new(4, 4096).thread_prefix("bench")).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    c.bench_function("pool_submit_1000", |b| {
        b.iter(|| {
            for _ in 0..1000 {
                let counter = Arc::clone(&counter);
                pool.submit(move || {
                    counter.fetch_add(1, Ordering::Relaxed);
                })
                .unwrap();
            }
            pool.wait_idle(Duration::from_secs(10));
        })
    });

    c.bench_function("pool_submit_with_result", |b| {
        b.iter(|| pool.submit_with_result(|| black_box(21) * 2).unwrap().wait().unwrap())
    });

    pool.shutdown();
}

fn benchmark_delay_queue(c: &mut Criterion) {
    let queue = DelayQueue::new(create_backend(TimerBackendType::Buckets, None));

    c.bench_function("delay_queue_insert_pop_1000", |b| {
        b.iter(|| {
            let base = Instant::now();
            for i in 0..1000u64 {
                // 16 distinct deadlines, so buckets hold several entries
                queue
                    .insert_at(base + Duration::from_micros(i % 16), Box::new(|| {}))
                    .unwrap();
            }
            let due = queue.pop_due(base + Duration::from_millis(1));
            black_box(due.len())
        })
    });

    c.bench_function("delay_queue_insert_cancel", |b| {
        b.iter(|| {
            let handle = queue.insert(Duration::from_secs(60), Box::new(|| {})).unwrap();
            black_box(queue.cancel(handle))
        })
    });
}

criterion_group!(benches, benchmark_pool_submit, benchmark_delay_queue);
criterion_main!(benches);
