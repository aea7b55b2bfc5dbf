//! Keep-the-latest sampling with an overwriting ring buffer.
//!
//! Several sensor threads write readings faster than the consumer drains
//! them. The ring keeps the newest `capacity` readings; each writer learns
//! how many of its older readings were dropped.
//!
//! Run with: `cargo run --example latest_samples`

use ringover_rs::{Config, Disposition, RingBuffer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const SENSORS: usize = 3;
const READINGS: u64 = 100_000;

fn main() {
    let ring = Arc::new(
        RingBuffer::<usize, u64>::new(Config::with_slots(256).with_metrics(true))
            .expect("valid config"),
    );
    let done = Arc::new(AtomicBool::new(false));

    let sensors: Vec<_> = (0..SENSORS)
        .map(|id| {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                let mut dropped = 0u64;
                for reading in 0..READINGS {
                    if ring.write(id, reading).is_some() {
                        dropped += 1;
                    }
                }
                dropped
            })
        })
        .collect();

    let consumer = {
        let ring = Arc::clone(&ring);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut consumed = 0u64;
            while !done.load(Ordering::Acquire) {
                match ring.read() {
                    Some(_) => consumed += 1,
                    None => thread::sleep(Duration::from_micros(50)),
                }
            }
            consumed
        })
    };

    let dropped: u64 = sensors.into_iter().map(|h| h.join().unwrap()).sum();
    done.store(true, Ordering::Release);
    let consumed = consumer.join().unwrap();

    let metrics = ring.metrics();
    println!("written:  {}", metrics.writes);
    println!("consumed: {}", consumed);
    println!("dropped:  {} (writers saw {})", metrics.overwrites, dropped);

    let ring = Arc::try_unwrap(ring).ok().expect("threads joined");
    let mut latest = Vec::new();
    ring.cleanup(|_, d| {
        if let Disposition::Unread { key, value } = d {
            latest.push((key, value));
        }
    });
    println!("left unread: {}", latest.len());
    if let Some((sensor, reading)) = latest.last() {
        println!("newest: sensor {} reading {}", sensor, reading);
    }
}
