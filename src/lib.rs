//! # huffpack
//!
//! Whole-file Huffman compression with a self-describing header.
//!
//! A compressed file is laid out as:
//!
//! | field            | size                      |
//! |------------------|---------------------------|
//! | leaf count `L`   | 1 byte (256 stored as 0)  |
//! | tree header      | `ceil((10 * L - 1) / 8)`  |
//! | payload          | `ceil(N / 8)` for N code bits |
//! | trailer          | 1 byte, unused bits in the last payload byte |
//!
//! ```no_run
//! use std::path::Path;
//!
//! let stats = huffpack::encode_file(Path::new("notes.txt"), Path::new("notes.txt.huff"))?;
//! println!("saved {:.2}%", stats.ratio());
//! huffpack::decode_file(Path::new("notes.txt.huff"), Path::new("notes.txt"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod bitstream;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frequency;
pub mod header;
pub mod huffman;
pub mod paths;

/// Chunk size for reading sources and flushing payload bytes.
pub const BUFFER_SIZE: usize = 8 * 1024;

pub use decoder::{DecodeStats, decode, decode_file};
pub use encoder::{EncodeStats, encode, encode_file};
pub use error::{DecodeError, EncodeError};
pub use frequency::{FreqTable, count_frequencies, entropy_from_freq};
pub use huffman::{CodeTable, HuffmanTree, Node};
