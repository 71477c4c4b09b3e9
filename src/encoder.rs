use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;
use std::time::Instant;

use log::{debug, info};

use crate::bitstream::BitWriter;
use crate::error::{EncodeError, EncodeResult};
use crate::frequency::{FreqTable, count_frequencies};
use crate::header::write_tree;
use crate::huffman::{CodeTable, HuffmanTree};
use crate::BUFFER_SIZE;

/// Outcome of a successful encode.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EncodeStats {
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub distinct_symbols: usize,
    pub payload_bits: u64,
    pub frequencies: FreqTable,
}

impl EncodeStats {
    /// Space saved as a percentage of the input size.
    pub fn ratio(&self) -> f64 {
        if self.input_bytes == 0 {
            return 0.0;
        }
        100.0 * (1.0 - self.output_bytes as f64 / self.input_bytes as f64)
    }
}

/// Compress `source` into `destination`.
///
/// The source is read twice: once for the frequency table and once, after
/// rewinding, for the payload. An empty source produces an empty destination.
pub fn encode<R, W>(source: &mut R, mut destination: W) -> EncodeResult<EncodeStats>
where
    R: Read + Seek,
    W: Write,
{
    let start_time = Instant::now();
    let frequencies = count_frequencies(source).map_err(EncodeError::Read)?;
    let input_bytes: u64 = frequencies.values().sum();

    let Some(tree) = HuffmanTree::from_frequencies(&frequencies) else {
        info!("Source is empty, nothing to encode");
        return Ok(EncodeStats::default());
    };
    let code_table = tree.code_table();
    debug!("Code table built with {} entries.", code_table.len());

    let header_bytes = write_tree(&tree, &mut destination).map_err(EncodeError::Write)?;

    source.rewind().map_err(EncodeError::Read)?;
    let (payload_bits, payload_bytes) = encode_data(source, &mut destination, &code_table)?;

    let stats = EncodeStats {
        input_bytes,
        output_bytes: header_bytes as u64 + payload_bytes + 1,
        distinct_symbols: frequencies.len(),
        payload_bits,
        frequencies,
    };
    debug!(
        "Encoding finished in {:.2?}: {} -> {} bytes",
        start_time.elapsed(),
        stats.input_bytes,
        stats.output_bytes
    );
    Ok(stats)
}

/// Stream the source through the code table, then append the trailer byte.
///
/// Returns the number of code bits and the number of payload bytes written,
/// the trailer excluded.
fn encode_data<R: Read, W: Write>(
    source: &mut R,
    destination: &mut W,
    code_table: &CodeTable,
) -> EncodeResult<(u64, u64)> {
    debug!("Starting data encoding...");
    let mut writer = BitWriter::new(&mut *destination);
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let read = match source.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(EncodeError::Read(e)),
        };
        for byte in &buffer[..read] {
            let code = code_table.get(byte).ok_or_else(|| {
                EncodeError::Read(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("byte {byte:#04x} appeared after the frequency scan"),
                ))
            })?;
            writer.write_code(code).map_err(EncodeError::Write)?;
        }
    }

    let payload_bits = writer.total_bits();
    let (_, padding) = writer.finish().map_err(EncodeError::Write)?;
    destination.write_all(&[padding]).map_err(EncodeError::Write)?;
    destination.flush().map_err(EncodeError::Write)?;

    debug!(
        "Payload: {} bits, {} padding bits in the last byte",
        payload_bits, padding
    );
    Ok((payload_bits, payload_bits.div_ceil(8)))
}

/// Compress the file at `source` into a new file at `destination`.
pub fn encode_file(source: &Path, destination: &Path) -> EncodeResult<EncodeStats> {
    info!(
        "Encoding {} -> {}",
        source.display(),
        destination.display()
    );
    let mut input = File::open(source).map_err(|e| EncodeError::Io {
        path: source.to_path_buf(),
        source: e,
    })?;
    let output = File::create(destination).map_err(|e| EncodeError::Io {
        path: destination.to_path_buf(),
        source: e,
    })?;

    encode(&mut input, output).map_err(|e| e.at(source, destination))
}
