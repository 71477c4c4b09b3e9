use std::fs::File;
use std::io::{BufWriter, ErrorKind, Read, Write};
use std::path::Path;
use std::time::Instant;

use log::{debug, info, trace};

use crate::bitstream::bit_at;
use crate::error::{DecodeError, DecodeResult};
use crate::header::{deserialize_tree, header_byte_len, leaf_count_from_byte};
use crate::huffman::{HuffmanTree, Node, NodeId};
use crate::BUFFER_SIZE;

/// Outcome of a successful decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeStats {
    pub input_bytes: u64,
    pub output_bytes: u64,
    pub distinct_symbols: usize,
}

/// Walks the tree one bit at a time, yielding a byte at every leaf.
struct TreeWalker<'a> {
    tree: &'a HuffmanTree,
    cursor: NodeId,
}

impl<'a> TreeWalker<'a> {
    fn new(tree: &'a HuffmanTree) -> Self {
        Self {
            tree,
            cursor: tree.root(),
        }
    }

    fn step(&mut self, bit: bool) -> DecodeResult<Option<u8>> {
        match self.tree.node(self.cursor) {
            // Only a single-leaf tree has a leaf under the cursor: one `0` bit per byte.
            Node::Leaf { byte } => {
                if bit {
                    return Err(DecodeError::CorruptPayload(
                        "set bit in a single-symbol payload".to_string(),
                    ));
                }
                Ok(Some(byte))
            }
            Node::Internal { left, right } => {
                let next = if bit { right } else { left };
                match self.tree.node(next) {
                    Node::Leaf { byte } => {
                        self.cursor = self.tree.root();
                        Ok(Some(byte))
                    }
                    Node::Internal { .. } => {
                        self.cursor = next;
                        Ok(None)
                    }
                }
            }
        }
    }

    fn at_root(&self) -> bool {
        self.cursor == self.tree.root()
    }
}

/// Read until `buf` is full or the source is exhausted.
fn read_full<R: Read>(source: &mut R, buf: &mut [u8]) -> DecodeResult<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(DecodeError::Read(e)),
        }
    }
    Ok(filled)
}

/// Decompress `source` into `destination`.
///
/// An empty source decodes to an empty destination.
pub fn decode<R, W>(source: &mut R, destination: W) -> DecodeResult<DecodeStats>
where
    R: Read,
    W: Write,
{
    let start_time = Instant::now();

    let mut leaf_count_byte = [0u8; 1];
    if read_full(source, &mut leaf_count_byte)? == 0 {
        info!("Source is empty, nothing to decode");
        return Ok(DecodeStats::default());
    }
    let leaf_count = leaf_count_from_byte(leaf_count_byte[0]);

    let mut header = vec![0u8; header_byte_len(leaf_count)];
    let got = read_full(source, &mut header)?;
    if got < header.len() {
        return Err(DecodeError::CorruptHeader(format!(
            "expected {} header bytes for {} leaves, file has {}",
            header.len(),
            leaf_count,
            got
        )));
    }
    let tree = deserialize_tree(leaf_count_byte[0], &header)?;

    let mut output = BufWriter::with_capacity(BUFFER_SIZE, destination);
    let (payload_bytes, output_bytes) = decode_data(source, &tree, &mut output)?;
    output.flush().map_err(DecodeError::Write)?;

    let stats = DecodeStats {
        input_bytes: 1 + header.len() as u64 + payload_bytes,
        output_bytes,
        distinct_symbols: leaf_count,
    };
    debug!(
        "Bitstream decoding finished in {:.2?}: {} -> {} bytes",
        start_time.elapsed(),
        stats.input_bytes,
        stats.output_bytes
    );
    Ok(stats)
}

/// Decode the payload that follows the header.
///
/// The final two bytes are held back while streaming: the last one is the
/// trailer (count of unused low-order bits), the one before it is the last
/// content byte. Returns the number of payload bytes consumed, trailer
/// included, and the number of bytes written.
fn decode_data<R: Read, W: Write>(
    source: &mut R,
    tree: &HuffmanTree,
    output: &mut W,
) -> DecodeResult<(u64, u64)> {
    debug!("Starting bitstream decoding...");
    let mut walker = TreeWalker::new(tree);
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut tail: Vec<u8> = Vec::with_capacity(2);
    let mut consumed = 0u64;
    let mut written = 0u64;

    loop {
        let read = read_full(source, &mut buffer)?;
        if read == 0 {
            break;
        }
        consumed += read as u64;
        trace!("Decoding chunk of {} bytes", read);

        let available = tail.len() + read;
        let process = available - available.min(2);
        let from_tail = process.min(tail.len());
        let from_chunk = process - from_tail;

        for &byte in tail[..from_tail].iter().chain(&buffer[..from_chunk]) {
            written += feed_byte(&mut walker, byte, 8, output)?;
        }

        let mut next_tail = tail.split_off(from_tail);
        next_tail.extend_from_slice(&buffer[from_chunk..read]);
        tail = next_tail;
    }

    let [last_content, trailer] = tail[..] else {
        return Err(DecodeError::CorruptPayload(format!(
            "expected a content byte and a trailer, found {} bytes",
            tail.len()
        )));
    };
    if trailer > 8 {
        return Err(DecodeError::CorruptPayload(format!(
            "trailer {} is outside 0..=8",
            trailer
        )));
    }
    written += feed_byte(&mut walker, last_content, 8 - trailer as usize, output)?;

    if !walker.at_root() {
        return Err(DecodeError::CorruptPayload(
            "payload ends in the middle of a code".to_string(),
        ));
    }
    Ok((consumed, written))
}

/// Feed the first `bits` bits of `byte` to the walker, lowest bit first.
fn feed_byte<W: Write>(
    walker: &mut TreeWalker<'_>,
    byte: u8,
    bits: usize,
    output: &mut W,
) -> DecodeResult<u64> {
    let mut written = 0;
    for index in 0..bits {
        if let Some(value) = walker.step(bit_at(byte, index))? {
            output.write_all(&[value]).map_err(DecodeError::Write)?;
            written += 1;
        }
    }
    Ok(written)
}

/// Decompress the file at `source` into a new file at `destination`.
pub fn decode_file(source: &Path, destination: &Path) -> DecodeResult<DecodeStats> {
    info!(
        "Decoding {} -> {}",
        source.display(),
        destination.display()
    );
    let mut input = File::open(source).map_err(|e| DecodeError::Io {
        path: source.to_path_buf(),
        source: e,
    })?;
    let output = File::create(destination).map_err(|e| DecodeError::Io {
        path: destination.to_path_buf(),
        source: e,
    })?;

    decode(&mut input, output).map_err(|e| e.at(source, destination))
}
