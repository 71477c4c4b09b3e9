use std::collections::BTreeMap;
use std::io::{self, ErrorKind, Read};

use log::{debug, trace};

use crate::BUFFER_SIZE;

/// Occurrence count per byte value. Only bytes present in the source have an entry.
pub type FreqTable = BTreeMap<u8, u64>;

/// Scan `reader` once in `BUFFER_SIZE` chunks and count every byte value.
pub fn count_frequencies<R: Read>(reader: &mut R) -> io::Result<FreqTable> {
    let mut counts = [0u64; 256];
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        for &byte in &buffer[..read] {
            counts[byte as usize] += 1;
        }
        total += read as u64;
        trace!("Counted chunk of {} bytes", read);
    }

    let freq: FreqTable = counts
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count > 0)
        .map(|(byte, &count)| (byte as u8, count))
        .collect();

    debug!(
        "Frequency scan finished: {} bytes, {} unique symbols",
        total,
        freq.len()
    );
    Ok(freq)
}

/// Shannon entropy of the table in bits per symbol.
pub fn entropy_from_freq(freq: &FreqTable) -> f64 {
    let total: u64 = freq.values().sum();
    if total == 0 {
        return 0.0;
    }
    let total_f = total as f64;

    let entropy: f64 = freq
        .values()
        .map(|&count| {
            let p = count as f64 / total_f;
            -p * p.log2()
        })
        .sum();

    debug!(
        "Calculated entropy: {:.4} bits/symbol (Total samples: {})",
        entropy, total
    );
    entropy
}
