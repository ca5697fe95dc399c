#![allow(unused)]
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dual_logger::{for_dev, for_ops, LogConfig, Logger};
use std::io;
use std::sync::Once;
use std::time::Instant;
use tempfile::tempdir;
use log::{info, LevelFilter};
use log4rs::{
    append::file::FileAppender,
    config::{Appender, Config, Root},
    encode::pattern::PatternEncoder,
};

const ITERATIONS: usize = 50_000;

static LOG4RS_INIT: Once = Once::new();

#[derive(Debug)]
struct TestEvent {
    id: i32,
    active: bool,
    large_number: u64,
    description: String,
}

impl std::fmt::Display for TestEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event[id={}, active={}, large_number={}, desc={}]",
            self.id, self.active, self.large_number, self.description)
    }
}

fn test_event() -> TestEvent {
    TestEvent {
        id: 42,
        active: true,
        large_number: u64::MAX,
        description: "CPU: 95%, Memory: 2.5GB, Network: 1.2Gbps".to_string(),
    }
}

fn setup_log4rs(log_file: &str) {
    LOG4RS_INIT.call_once(|| {
        let logfile = FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{d} - {m}{n}")))
            .append(true)
            .build(log_file)
            .unwrap();

        let config = Config::builder()
            .appender(Appender::builder().build("logfile", Box::new(logfile)))
            .build(Root::builder()
                .appender("logfile")
                .build(LevelFilter::Info))
            .unwrap();

        log4rs::init_config(config).unwrap();
    });
}

/// Producer-side cost of handing entries to the dispatch thread, file sink on.
fn bench_file_logging(c: &mut Criterion) {
    let mut group = c.benchmark_group("File Logging");
    group.sample_size(10);

    group.bench_function("dual_logger_vs_log4rs_vs_tracing_appender", |b| {
        b.iter(|| {
            let dir = tempdir().unwrap();
            let event = test_event();

            // dual_logger: console off so only the file sink is measured
            let logger = Logger::builder()
                .config(LogConfig { console_enabled: false, ..LogConfig::default() })
                .console_writer(io::sink())
                .build()
                .unwrap();
            let prefix = dir.path().join("dual");
            logger.configure(None, prefix.to_str()).unwrap();

            let dual_start = Instant::now();
            for i in 0..ITERATIONS {
                for_ops!(logger, "Test perf: iteration={}, event={}", i, event);
            }
            logger.shutdown();
            let dual_duration = dual_start.elapsed();

            // log4rs, synchronous file appender
            let log4rs_file = dir.path().join("log4rs.log");
            setup_log4rs(log4rs_file.to_str().unwrap());
            let log4rs_start = Instant::now();
            for i in 0..ITERATIONS {
                info!("Test perf: iteration={}, event={}", i, event);
            }
            let log4rs_duration = log4rs_start.elapsed();

            // tracing-appender, daily rolling file behind its non-blocking writer
            let appender = tracing_appender::rolling::daily(dir.path(), "tracing.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let subscriber = tracing_subscriber::fmt().with_writer(writer).finish();
            let tracing_start = Instant::now();
            tracing::subscriber::with_default(subscriber, || {
                for i in 0..ITERATIONS {
                    tracing::info!("Test perf: iteration={}, event={}", i, event);
                }
            });
            drop(guard);
            let tracing_duration = tracing_start.elapsed();

            println!("\nFile logging ({} iterations):", ITERATIONS);
            println!("dual_logger: {:?}", dual_duration);
            println!("log4rs: {:?}", log4rs_duration);
            println!("tracing-appender: {:?}", tracing_duration);

            black_box((dual_duration, log4rs_duration, tracing_duration))
        });
    });

    group.finish();
}

/// Gate rejection should cost next to nothing.
fn bench_gated_dev(c: &mut Criterion) {
    let logger = Logger::builder()
        .config(LogConfig { log_all_dev: false, ..LogConfig::default() })
        .console_writer(io::sink())
        .build()
        .unwrap();

    c.bench_function("dev_gate_rejected", |b| {
        b.iter(|| for_dev!(logger, black_box("NET"), "dropped {}", black_box(1)))
    });

    logger.shutdown();
}

criterion_group!(benches, bench_file_logging, bench_gated_dev);
criterion_main!(benches);
