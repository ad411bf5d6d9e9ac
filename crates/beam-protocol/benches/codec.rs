//! Codec benchmarks for beam-protocol.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use beam_protocol::{codec, RosterEntry, ServerFrame};

fn bench_encode_slide_change(c: &mut Criterion) {
    let frame = ServerFrame::slide_change(42);

    c.bench_function("encode_slide_change", |b| {
        b.iter(|| codec::encode(black_box(&frame)))
    });
}

fn bench_encode_roster(c: &mut Criterion) {
    let roster: Vec<RosterEntry> = (0..100)
        .map(|i| RosterEntry::new(format!("participant-{i}"), format!("Attendee {i}")))
        .collect();
    let frame = ServerFrame::participants(roster);
    let encoded = codec::encode(&frame).unwrap();

    let mut group = c.benchmark_group("encode");
    group.throughput(Throughput::Bytes(encoded.len() as u64));
    group.bench_function("roster_100", |b| b.iter(|| codec::encode(black_box(&frame))));
    group.finish();
}

fn bench_decode_join(c: &mut Criterion) {
    let text = r#"{"type":"join","sessionId":"d41b6be2","role":"participant"}"#;

    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("join", |b| b.iter(|| codec::decode(black_box(text))));
    group.finish();
}

criterion_group!(
    benches,
    bench_encode_slide_change,
    bench_encode_roster,
    bench_decode_join
);
criterion_main!(benches);
