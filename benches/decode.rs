/// Decode throughput and latency benchmarks

use byteorder::{ByteOrder, LittleEndian};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use feed_cache::Decoder;

fn ltp_packet(security_id: u32, time: u32) -> [u8; 23] {
    let mut b = [0u8; 23];
    b[0] = 61;
    LittleEndian::write_f32(&mut b[1..5], 100.5);
    LittleEndian::write_u32(&mut b[5..9], time);
    LittleEndian::write_u32(&mut b[9..13], security_id);
    b[13] = 1;
    b[14] = 3;
    b
}

fn full_packet(security_id: u32, time: u32) -> [u8; 175] {
    let mut b = [0u8; 175];
    b[0] = 63;
    for i in 0..5 {
        let o = 1 + i * 20;
        LittleEndian::write_u32(&mut b[o..o + 4], 100);
        LittleEndian::write_u32(&mut b[o + 4..o + 8], 120);
        LittleEndian::write_u16(&mut b[o + 8..o + 10], 10);
        LittleEndian::write_u16(&mut b[o + 10..o + 12], 12);
        LittleEndian::write_f32(&mut b[o + 12..o + 16], 99.5);
        LittleEndian::write_f32(&mut b[o + 16..o + 20], 100.5);
    }
    LittleEndian::write_f32(&mut b[101..105], 100.0);
    LittleEndian::write_u32(&mut b[105..109], time);
    LittleEndian::write_u32(&mut b[109..113], security_id);
    b[113] = 1;
    b[114] = 4;
    b
}

fn create_frame(packet_count: usize) -> Vec<u8> {
    let mut buffer = Vec::new();
    for i in 0..packet_count {
        if i % 4 == 0 {
            buffer.extend_from_slice(&full_packet(i as u32, 1000 + i as u32));
        } else {
            buffer.extend_from_slice(&ltp_packet(i as u32, 1000 + i as u32));
        }
    }
    buffer
}

fn bench_decode_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_throughput");

    for packet_count in [1000, 10000, 100000].iter() {
        let buffer = black_box(create_frame(*packet_count));

        group.bench_with_input(
            BenchmarkId::from_parameter(packet_count),
            packet_count,
            |b, _| {
                b.iter(|| {
                    let (records, _) = Decoder::decode(&buffer);
                    records.len()
                });
            },
        );
    }
    group.finish();
}

fn bench_decode_packet_types(c: &mut Criterion) {
    let mut group = c.benchmark_group("packet_types");

    let ltp = ltp_packet(13, 1000);
    let full = full_packet(13, 1000);

    group.bench_function("ltp", |b| b.iter(|| Decoder::decode(black_box(&ltp))));
    group.bench_function("full", |b| b.iter(|| Decoder::decode(black_box(&full))));

    group.finish();
}

criterion_group!(benches, bench_decode_throughput, bench_decode_packet_types);
criterion_main!(benches);
