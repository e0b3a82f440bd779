use std::hint::black_box;
use std::io;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::json;

use loggify::cli::ColorMode;
use loggify::{Config, ContextId, ContextOptions, LogLevel, LogOptions, Loggify};

/// Realistic application messages, some with style and glyph tokens.
fn generate_message(variant: usize) -> String {
    match variant % 5 {
        0 => format!("request completed GET /api/v1/users/{variant} status=200"),
        1 => "[ansi:green]payment processed[ansi:reset] amount=99.99 currency=USD".to_string(),
        2 => "[emoji:warning] high memory usage detected on [ansi:bold]prod-web-03[ansi:reset]".to_string(),
        3 => format!("╭ batch {variant} [ansi:cyan]started[ansi:reset]"),
        _ => "database query executed in [ansi:yellow]23ms[ansi:reset] rows=150".to_string(),
    }
}

fn generate_batch(count: usize) -> Vec<String> {
    (0..count).map(generate_message).collect()
}

fn quiet_config() -> Config {
    Config {
        color_mode: ColorMode::Always,
        init_silent: true,
        ..Config::default()
    }
}

fn bench_console(c: &mut Criterion) {
    let mut log = Loggify::with_writer(quiet_config(), io::sink());
    let lines = generate_batch(1000);
    let options = LogOptions::default();

    let mut group = c.benchmark_group("throughput");
    group.throughput(Throughput::Elements(lines.len() as u64));

    group.bench_function("console_1k_lines", |b| {
        b.iter(|| {
            for line in &lines {
                black_box(log.console(black_box(line.as_str()), "info", &options, None));
            }
        });
    });

    group.finish();
}

fn bench_segments(c: &mut Criterion) {
    let lines = generate_batch(1000);
    let options = LogOptions::default();

    let mut group = c.benchmark_group("segments");
    group.throughput(Throughput::Elements(lines.len() as u64));

    let variants = [
        ("message_only", false, false, false),
        ("with_timestamp", true, false, false),
        ("with_memory", false, true, false),
        ("with_caller", false, false, true),
    ];
    for (label, timestamp, memory_usage, caller_info) in variants {
        let config = Config {
            timestamp,
            memory_usage,
            caller_info,
            ..quiet_config()
        };
        let mut log = Loggify::with_writer(config, io::sink());
        group.bench_function(BenchmarkId::from_parameter(label), |b| {
            b.iter(|| {
                for line in &lines {
                    black_box(log.console(black_box(line.as_str()), "debug", &options, None));
                }
            });
        });
    }

    group.finish();
}

fn bench_level_filtering(c: &mut Criterion) {
    let config = Config {
        log_level: LogLevel::Off,
        ..quiet_config()
    };
    let mut log = Loggify::with_writer(config, io::sink());
    let lines = generate_batch(1000);
    let options = LogOptions::default();

    let mut group = c.benchmark_group("level_filter");
    group.throughput(Throughput::Elements(lines.len() as u64));

    group.bench_function("filter_1k_lines", |b| {
        b.iter(|| {
            for line in &lines {
                black_box(log.console(black_box(line.as_str()), "info", &options, None));
            }
        });
    });

    group.finish();
}

fn bench_objects(c: &mut Criterion) {
    let config = Config {
        caller_info: false,
        ..quiet_config()
    };
    let mut log = Loggify::with_writer(config, io::sink());
    let options = LogOptions::default();

    let mut group = c.benchmark_group("object");

    let payloads = [
        ("small", json!({"level": "info", "port": 8080})),
        (
            "nested",
            json!({
                "http": {"method": "POST", "url": "/api/v1/orders", "status": 201},
                "user": "john@example.com",
                "tags": ["a", "b", "c"],
                "trace": {"id": "abc123", "span": {"id": "def456", "parent": null}}
            }),
        ),
        (
            "wide",
            serde_json::Value::Object(
                (0..40)
                    .map(|i| (format!("field_{i}"), json!(format!("value_with_extra_content_{i}"))))
                    .collect(),
            ),
        ),
    ];

    for (label, payload) in payloads {
        group.throughput(Throughput::Bytes(payload.to_string().len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(label), &payload, |b, payload| {
            b.iter(|| {
                black_box(log.console("payload", "info", &options, Some(payload.clone())));
            });
        });
    }

    group.finish();
}

fn bench_contexts(c: &mut Criterion) {
    let config = Config {
        caller_info: false,
        memory_usage: false,
        ..quiet_config()
    };
    let mut log = Loggify::with_writer(config, io::sink());
    let lines = generate_batch(100);

    let mut group = c.benchmark_group("context");
    group.throughput(Throughput::Elements(lines.len() as u64));

    group.bench_function("buffer_and_flush_100_lines", |b| {
        let id = ContextId::from("bench");
        let options = LogOptions::default().context(ContextOptions::new("bench").title("Bench"));
        b.iter(|| {
            for line in &lines {
                log.console(black_box(line.as_str()), "info", &options, None);
            }
            black_box(log.flush(&id, false));
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_console,
    bench_segments,
    bench_level_filtering,
    bench_objects,
    bench_contexts,
);
criterion_main!(benches);
