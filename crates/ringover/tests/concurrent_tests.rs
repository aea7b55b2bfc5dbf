#![cfg(not(feature = "loom"))]

use ringover_rs::{Config, Disposition, RingBuffer};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

#[test]
fn test_no_loss_single_writer_single_reader() {
    const N: u64 = 50_000;
    // Capacity >= N: no overwrite can happen
    let ring = Arc::new(RingBuffer::<u64, u64>::new(Config::with_slots(N as usize)).unwrap());
    let done = Arc::new(AtomicBool::new(false));

    let writer = {
        let ring = Arc::clone(&ring);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            for i in 0..N {
                assert!(ring.write(i, i * 2).is_none());
            }
            done.store(true, Ordering::Release);
        })
    };

    let reader = {
        let ring = Arc::clone(&ring);
        thread::spawn(move || {
            let mut received = Vec::with_capacity(N as usize);
            loop {
                match ring.read() {
                    Some(entry) => received.push(entry),
                    None if done.load(Ordering::Acquire) => {
                        // Writer finished: drain whatever is left
                        while let Some(entry) = ring.read() {
                            received.push(entry);
                        }
                        break;
                    }
                    None => std::hint::spin_loop(),
                }
            }
            received
        })
    };

    writer.join().unwrap();
    let received = reader.join().unwrap();

    assert_eq!(received.len(), N as usize);
    for (i, (k, v)) in received.into_iter().enumerate() {
        assert_eq!(k, i as u64, "FIFO violation at {}", i);
        assert_eq!(v, k * 2);
    }
}

#[test]
fn test_multi_writer_per_writer_order_with_overwrites() {
    const WRITERS: usize = 4;
    const PER_WRITER: u64 = 20_000;

    // Small ring so overwrites are frequent
    let ring = Arc::new(RingBuffer::<usize, u64>::new(Config::with_slots(32)).unwrap());
    let done = Arc::new(AtomicBool::new(false));

    let writers: Vec<_> = (0..WRITERS)
        .map(|w| {
            let ring = Arc::clone(&ring);
            thread::spawn(move || {
                let mut overwritten = Vec::new();
                for i in 0..PER_WRITER {
                    if let Some(old) = ring.write(w, i) {
                        overwritten.push(old);
                    }
                }
                overwritten
            })
        })
        .collect();

    let reader = {
        let ring = Arc::clone(&ring);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut last_seen = vec![None::<u64>; WRITERS];
            let mut received = Vec::new();
            while !done.load(Ordering::Acquire) {
                if let Some((w, i)) = ring.read() {
                    if let Some(prev) = last_seen[w] {
                        assert!(i > prev, "writer {} order violated: {} after {}", w, i, prev);
                    }
                    last_seen[w] = Some(i);
                    received.push((w, i));
                }
            }
            received
        })
    };

    let mut overwritten = Vec::new();
    for h in writers {
        overwritten.extend(h.join().unwrap());
    }
    done.store(true, Ordering::Release);
    let received = reader.join().unwrap();

    let ring = Arc::try_unwrap(ring).ok().expect("all clones joined");
    let mut leftover = Vec::new();
    ring.cleanup(|_, d| {
        if let Disposition::Unread { key, value } = d {
            leftover.push((key, value));
        }
    });

    // Every written entry surfaces exactly once: read, overwritten, or left over
    let mut all: Vec<(usize, u64)> = received;
    all.extend(overwritten);
    all.extend(leftover);
    all.sort_unstable();
    let expected: Vec<(usize, u64)> = (0..WRITERS)
        .flat_map(|w| (0..PER_WRITER).map(move |i| (w, i)))
        .collect();
    assert_eq!(all, expected);
}

#[test]
fn test_mpmc_accounts_for_every_entry() {
    const WRITERS: usize = 4;
    const READERS: usize = 3;
    const PER_WRITER: u64 = 10_000;

    let ring = Arc::new(RingBuffer::<usize, u64>::new(Config::new(17, true)).unwrap());
    let done = Arc::new(AtomicBool::new(false));
    let sink = Arc::new(Mutex::new(Vec::new()));

    let readers: Vec<_> = (0..READERS)
        .map(|_| {
            let ring = Arc::clone(&ring);
            let done = Arc::clone(&done);
            let sink = Arc::clone(&sink);
            thread::spawn(move || {
                let mut local = Vec::new();
                while !done.load(Ordering::Acquire) {
                    if let Some(entry) = ring.read() {
                        local.push(entry);
                    }
                }
                sink.lock().unwrap().extend(local);
            })
        })
        .collect();

    let writers: Vec<_> = (0..WRITERS)
        .map(|w| {
            let ring = Arc::clone(&ring);
            let sink = Arc::clone(&sink);
            thread::spawn(move || {
                let mut local = Vec::new();
                for i in 0..PER_WRITER {
                    if let Some(old) = ring.write(w, i) {
                        local.push(old);
                    }
                }
                sink.lock().unwrap().extend(local);
            })
        })
        .collect();

    for h in writers {
        h.join().unwrap();
    }
    done.store(true, Ordering::Release);
    for h in readers {
        h.join().unwrap();
    }

    let mut ring = Arc::try_unwrap(ring).ok().expect("all clones joined");
    assert_eq!(ring.validate(None), Ok(()));

    let metrics = ring.metrics();
    assert_eq!(metrics.writes, WRITERS as u64 * PER_WRITER);

    let mut all = Arc::try_unwrap(sink).unwrap().into_inner().unwrap();
    let mut unread = 0;
    let mut drained = 0;
    ring.cleanup(|_, d| match d {
        Disposition::Unread { key, value } => {
            all.push((key, value));
            unread += 1;
        }
        Disposition::Drained => drained += 1,
    });
    assert_eq!(unread + drained, 16);

    all.sort_unstable();
    let expected: Vec<(usize, u64)> = (0..WRITERS)
        .flat_map(|w| (0..PER_WRITER).map(move |i| (w, i)))
        .collect();
    assert_eq!(all, expected);
}
