//! Performance benchmarks for LineCodec.
//!
//! These benchmarks measure the throughput and latency of the codec. Each
//! connected reader is polled twice a second, so a fleet of readers produces
//! a steady stream of short lines; the codec has to stay invisible next to
//! the serial link itself.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench codec_bench
//! ```

use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use lodestone_core::{Depletion, SampleKind};
use lodestone_protocol::{Command, LineCodec};
use std::hint::black_box;
use tokio_util::codec::{Decoder, Encoder};

/// The cheapest command a session sends, for baseline numbers.
fn poll_command() -> Command {
    Command::QueryName
}

/// The largest command: a full RAW sample write with its depletion marker.
fn write_command() -> Command {
    Command::WriteSample {
        kind: SampleKind::Raw,
        traits: vec![
            "Creating".to_string(),
            "Krystal".to_string(),
            "Destroying".to_string(),
            "Energy".to_string(),
        ],
        depletion: Some(Depletion::Depleted),
    }
}

/// The shortest interesting reader line.
fn status_line() -> &'static [u8] {
    b"Write complete!\n"
}

/// The longest routine reader line: a card echo with a full trait list.
fn tag_found_line() -> &'static [u8] {
    b"Tag found: X1 RAW CREATING KRYSTAL DESTROYING ENERGY DEPLETED\n"
}

/// Benchmark encoding the `NAME` poll.
fn bench_encode_poll(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_poll");
    group.throughput(Throughput::Elements(1));

    let cmd = poll_command();

    group.bench_function("encode_name_poll", |b| {
        b.iter(|| {
            let mut codec = LineCodec::new();
            let mut buffer = BytesMut::new();
            codec.encode(black_box(cmd.clone()), &mut buffer).unwrap();
            black_box(buffer);
        });
    });

    group.finish();
}

/// Benchmark encoding a full `WRITESAMPLE` command.
fn bench_encode_write_sample(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_write_sample");
    group.throughput(Throughput::Elements(1));

    let cmd = write_command();

    group.bench_function("encode_raw_write", |b| {
        b.iter(|| {
            let mut codec = LineCodec::new();
            let mut buffer = BytesMut::new();
            codec.encode(black_box(cmd.clone()), &mut buffer).unwrap();
            black_box(buffer);
        });
    });

    group.finish();
}

/// Benchmark decoding the shortest reader line.
fn bench_decode_status(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_status");
    group.throughput(Throughput::Elements(1));

    group.bench_function("decode_write_complete", |b| {
        b.iter(|| {
            let mut codec = LineCodec::new();
            let mut buffer = BytesMut::from(status_line());
            let event = codec.decode(&mut buffer).unwrap();
            black_box(event);
        });
    });

    group.finish();
}

/// Benchmark decoding a card echo with a full trait list.
fn bench_decode_tag_found(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_tag_found");
    group.throughput(Throughput::Elements(1));

    group.bench_function("decode_raw_echo", |b| {
        b.iter(|| {
            let mut codec = LineCodec::new();
            let mut buffer = BytesMut::from(tag_found_line());
            let event = codec.decode(&mut buffer).unwrap();
            black_box(event);
        });
    });

    group.finish();
}

/// Benchmark decoding batches of buffered lines.
fn bench_decode_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_batch");

    for batch_size in [10, 100, 1000].iter() {
        group.throughput(Throughput::Elements(*batch_size as u64));

        // Pre-buffer the batch the way a busy port would deliver it.
        let mut encoded = BytesMut::new();
        for _ in 0..*batch_size {
            encoded.extend_from_slice(tag_found_line());
        }
        let encoded_bytes = encoded.freeze();

        group.bench_with_input(
            BenchmarkId::from_parameter(batch_size),
            batch_size,
            |b, _| {
                b.iter(|| {
                    let mut codec = LineCodec::new();
                    let mut buffer = BytesMut::from(&encoded_bytes[..]);
                    let mut count = 0;

                    while let Ok(Some(_)) = codec.decode(&mut buffer) {
                        count += 1;
                    }

                    black_box(count);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark throughput - poll commands per second.
fn bench_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("throughput");
    group.throughput(Throughput::Elements(1000));

    let commands: Vec<Command> = (0..1000).map(|_| poll_command()).collect();

    group.bench_function("encode_1000_polls", |b| {
        b.iter(|| {
            let mut codec = LineCodec::new();
            let mut buffer = BytesMut::new();

            for cmd in &commands {
                codec.encode(black_box(cmd.clone()), &mut buffer).unwrap();
            }

            black_box(buffer);
        });
    });

    group.finish();
}

/// Benchmark decoding with partial lines across multiple decode calls.
///
/// Serial ports hand bytes over in small bursts, so a line routinely takes
/// several decode() calls to assemble.
fn bench_decode_partial_streaming(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_partial_streaming");
    group.throughput(Throughput::Elements(1));

    let full_line = tag_found_line();

    for chunk_size in [8, 16, 32].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("chunk_{}_bytes", chunk_size)),
            chunk_size,
            |b, &size| {
                b.iter(|| {
                    let mut codec = LineCodec::new();
                    let mut buffer = BytesMut::new();
                    let mut event = None;

                    for chunk in full_line.chunks(size) {
                        buffer.extend_from_slice(chunk);
                        if let Ok(Some(decoded)) = codec.decode(&mut buffer) {
                            event = Some(decoded);
                            break;
                        }
                    }

                    black_box(event);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_encode_poll,
    bench_encode_write_sample,
    bench_decode_status,
    bench_decode_tag_found,
    bench_decode_batch,
    bench_throughput,
    bench_decode_partial_streaming,
);

criterion_main!(benches);
