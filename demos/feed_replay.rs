/// Synthetic feed replay
///
/// Generates a binary frame of random quote/index packets, decodes it and
/// runs the records through a snapshot store backed by the in-process
/// backend. Useful for eyeballing the decode→save→fetch pipeline without a
/// live feed or a Redis instance.

use std::env;
use std::sync::Arc;

use byteorder::{ByteOrder, LittleEndian};
use rand::Rng;

use feed_cache::{CacheSettings, Decoder, MemoryBackend, SnapshotStore};

fn ltp_packet(rng: &mut impl Rng, security_id: u32, time: u32) -> Vec<u8> {
    let mut b = vec![0u8; 23];
    b[0] = 61;
    LittleEndian::write_f32(&mut b[1..5], rng.gen_range(90.0..110.0));
    LittleEndian::write_u32(&mut b[5..9], time);
    LittleEndian::write_u32(&mut b[9..13], security_id);
    b[13] = 1;
    b[14] = 3;
    LittleEndian::write_f32(&mut b[15..19], rng.gen_range(-2.0..2.0));
    LittleEndian::write_f32(&mut b[19..23], rng.gen_range(-1.0..1.0));
    b
}

fn index_ltp_packet(rng: &mut impl Rng, security_id: u32, time: u32) -> Vec<u8> {
    let mut b = vec![0u8; 23];
    b[0] = 64;
    LittleEndian::write_f32(&mut b[1..5], rng.gen_range(19000.0..21000.0));
    LittleEndian::write_u32(&mut b[5..9], time);
    LittleEndian::write_u32(&mut b[9..13], security_id);
    b[13] = 0;
    b[14] = 1;
    LittleEndian::write_f32(&mut b[15..19], rng.gen_range(-50.0..50.0));
    LittleEndian::write_f32(&mut b[19..23], rng.gen_range(-0.5..0.5));
    b
}

fn index_quote_packet(rng: &mut impl Rng, security_id: u32) -> Vec<u8> {
    let mut b = vec![0u8; 43];
    b[0] = 65;
    LittleEndian::write_f32(&mut b[1..5], rng.gen_range(19000.0..21000.0));
    LittleEndian::write_u32(&mut b[5..9], security_id);
    b[9] = 0;
    b[10] = 2;
    for field in 0..8 {
        let o = 11 + field * 4;
        LittleEndian::write_f32(&mut b[o..o + 4], rng.gen_range(18000.0..22000.0));
    }
    b
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: Vec<String> = env::args().collect();
    let packet_count: usize = if args.len() > 1 {
        args[1].parse().unwrap_or(100)
    } else {
        100
    };

    let mut rng = rand::thread_rng();
    let mut frame = Vec::new();
    for i in 0..packet_count {
        let security_id = rng.gen_range(1u32..=5);
        let time = 1_700_000_000 + i as u32;
        match rng.gen_range(0u8..3) {
            0 => frame.extend_from_slice(&ltp_packet(&mut rng, security_id, time)),
            1 => frame.extend_from_slice(&index_ltp_packet(&mut rng, security_id, time)),
            _ => frame.extend_from_slice(&index_quote_packet(&mut rng, security_id)),
        }
    }

    println!("Generated frame: {} packets, {} bytes", packet_count, frame.len());

    let (records, consumed) = Decoder::decode(&frame);
    println!("Decoded {} records ({} bytes consumed)", records.len(), consumed);

    let settings = CacheSettings {
        cache_uri: "memory://".to_string(),
        ttl_seconds: 300,
        max_snapshots: 10,
        scan_batch_size: 100,
        key_prefix: "market".to_string(),
    };
    let store = SnapshotStore::new(Arc::new(MemoryBackend::new()), settings);

    for record in &records {
        if let Err(error) = store.save(record).await {
            eprintln!("save failed: {error}");
            return;
        }
    }
    println!("Saved {} snapshots", store.metrics().snapshots_saved());

    match store.fetch("market:*").await {
        Ok(fetched) => {
            println!("Fetched {} freshest snapshots:", fetched.len());
            for record in fetched {
                println!(
                    "  {:?} security_id={} price={} t={}",
                    record.packet_type(),
                    record.security_id(),
                    record.last_price(),
                    record.freshness_timestamp()
                );
            }
        }
        Err(error) => eprintln!("fetch failed: {error}"),
    }
}
