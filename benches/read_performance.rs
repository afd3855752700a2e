//! Performance benchmarks for hotlog-conf.
//!
//! The logging hot path only ever calls `LogConf::get` and walks the
//! matching rules; these measure that path, with and without reloads
//! happening at the same time, plus the cost of a full build.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use hotlog_conf::core::ConfigLoader;
use hotlog_conf::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

const BENCH_CONF: &str = r#"
@buf_size_min 4KB
@buf_size_max 4MB
@level TRACE = 10, LOG_DEBUG

&simple "%m%n"
&detail "%d(%F %T.%ms) %-5V [%p:%F:%L] %c %m%n"

app_.TRACE          >stdout; simple
app_db.=ERROR       "/var/log/app/db.err", 10MB * 5 ~ "/var/log/app/db.#r.err"; detail
app_http.!DEBUG     "/var/log/app/http.log", 1MB; detail
metrics.INFO        $emit, "statsd"; simple
*.FATAL             >syslog, LOG_LOCAL0
!.*                 >stderr
"#;

fn bench_conf() -> LogConf {
    LogConf::builder()
        .with_text("bench.conf", BENCH_CONF)
        .strict(true)
        .build()
        .unwrap()
}

/// Benchmark single-threaded read latency
fn benchmark_read_latency(c: &mut Criterion) {
    let conf = bench_conf();

    let mut group = c.benchmark_group("read_latency");
    group.bench_function("get", |b| {
        b.iter(|| {
            let active = conf.get();
            black_box(active);
        });
    });
    group.finish();
}

/// Benchmark rule lookup for a few representative categories
fn benchmark_matching_rules(c: &mut Criterion) {
    let conf = bench_conf();
    let active = conf.get().unwrap();

    let mut group = c.benchmark_group("matching_rules");
    for (category, level) in [("app_db", 100u8), ("app_http", 40), ("unclaimed", 40)] {
        group.bench_with_input(
            BenchmarkId::from_parameter(category),
            &(category, level),
            |b, &(category, level)| {
                b.iter(|| black_box(active.matching_rules(category, level).count()));
            },
        );
    }
    group.finish();
}

/// Benchmark concurrent reads with varying thread counts
fn benchmark_concurrent_reads(c: &mut Criterion) {
    let mut group = c.benchmark_group("concurrent_reads");

    for num_threads in [1, 2, 4, 8] {
        group.throughput(Throughput::Elements(num_threads as u64 * 1000));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_threads", num_threads)),
            &num_threads,
            |b, &num_threads| {
                let conf = bench_conf();
                let barrier = Arc::new(Barrier::new(num_threads + 1));

                b.iter_custom(|iters| {
                    let handles: Vec<_> = (0..num_threads)
                        .map(|_| {
                            let conf = conf.clone();
                            let barrier = Arc::clone(&barrier);
                            thread::spawn(move || {
                                barrier.wait();
                                let start = Instant::now();
                                for _ in 0..iters {
                                    let active = conf.get().unwrap();
                                    black_box(active.matching_rules("app_db", 100).count());
                                }
                                start.elapsed()
                            })
                        })
                        .collect();

                    barrier.wait();
                    let total: Duration = handles.into_iter().map(|h| h.join().unwrap()).sum();
                    total / num_threads as u32
                });
            },
        );
    }

    group.finish();
}

/// Benchmark reloads while readers hammer the handle
fn benchmark_reload_under_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("reload_under_load");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("reload_with_8_readers", |b| {
        b.iter_custom(|iters| {
            let conf = bench_conf();
            let keep_running = Arc::new(AtomicBool::new(true));
            let reads_completed = Arc::new(AtomicUsize::new(0));

            let readers: Vec<_> = (0..8)
                .map(|_| {
                    let conf = conf.clone();
                    let running = Arc::clone(&keep_running);
                    let counter = Arc::clone(&reads_completed);
                    thread::spawn(move || {
                        while running.load(Ordering::Relaxed) {
                            let active = conf.get().unwrap();
                            black_box(active.rules().len());
                            counter.fetch_add(1, Ordering::Relaxed);
                        }
                    })
                })
                .collect();

            let start = Instant::now();
            for _ in 0..iters {
                conf.reload(None).unwrap();
            }
            let duration = start.elapsed();

            keep_running.store(false, Ordering::Relaxed);
            for reader in readers {
                reader.join().unwrap();
            }
            println!(
                "  Completed {} reads during {} reloads",
                reads_completed.load(Ordering::Relaxed),
                iters
            );
            duration
        });
    });

    group.finish();
}

/// Benchmark building a configuration from text
fn benchmark_build(c: &mut Criterion) {
    let source = TextSource::new("bench.conf", BENCH_CONF);
    let loader = ConfigLoader::new(true);

    let mut group = c.benchmark_group("build");
    group.throughput(Throughput::Bytes(BENCH_CONF.len() as u64));
    group.bench_function("load_text", |b| {
        b.iter(|| black_box(loader.load(Some(&source)).unwrap()));
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_read_latency,
    benchmark_matching_rules,
    benchmark_concurrent_reads,
    benchmark_reload_under_load,
    benchmark_build,
);

criterion_main!(benches);
