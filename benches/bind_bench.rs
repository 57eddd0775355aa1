//! Quick benchmark for split + resolve + bind throughput

use regex::Regex;
use remarshal::{record, resolve_fields, split, unmarshal, Record};
use std::hint::black_box;
use std::time::Instant;

#[derive(Default)]
struct Access {
    ip: String,
    method: String,
    path: String,
    status: u16,
    bytes: u64,
    millis: f64,
}

record!(Access {
    ip = "IP",
    method = "Method",
    path = "Path",
    status = "Status",
    bytes = "Bytes",
    millis = "Millis",
});

fn main() {
    let re = Regex::new(
        r"^(?P<IP>\S+) (?P<Method>[A-Z]+) (?P<Path>\S+) (?P<Status>\d+) (?P<Bytes>\d+) (?P<Millis>[\d.]+)$",
    )
    .unwrap();

    let lines = vec![
        "10.0.0.1 GET /index.html 200 5120 0.42",
        "10.0.0.2 POST /api/v1/items 201 128 12.7",
        "192.168.1.20 GET /static/app.js 304 0 0.05",
    ];

    println!("Bind Performance Test");
    println!("=====================\n");

    let iterations = 100_000u32;

    // Splitting alone
    let start = Instant::now();
    for _ in 0..iterations {
        for line in &lines {
            let _ = black_box(split(line, &re));
        }
    }
    let elapsed = start.elapsed();
    println!("split:");
    println!("  Time for {} lines: {:?}", iterations as usize * lines.len(), elapsed);
    println!("  Per line: {:?}\n", elapsed / (iterations * lines.len() as u32));

    // Field resolution alone
    let record = Access::default();
    let start = Instant::now();
    for _ in 0..iterations {
        let _ = black_box(resolve_fields(&record.fields()));
    }
    let elapsed = start.elapsed();
    println!("resolve_fields:");
    println!("  Time for {} records: {:?}", iterations, elapsed);
    println!("  Per record: {:?}\n", elapsed / iterations);

    // Full pass
    let mut record = Access::default();
    let start = Instant::now();
    for _ in 0..iterations {
        for line in &lines {
            let _ = black_box(unmarshal(line, &mut record, &re));
        }
    }
    let elapsed = start.elapsed();
    println!("unmarshal:");
    println!("  Time for {} lines: {:?}", iterations as usize * lines.len(), elapsed);
    println!("  Per line: {:?}", elapsed / (iterations * lines.len() as u32));
    println!(
        "  Last record: {} {} {} {} {} {}",
        record.ip, record.method, record.path, record.status, record.bytes, record.millis
    );
}
