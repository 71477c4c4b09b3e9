//! Self-describing tree header.
//!
//! The file starts with one byte holding the number of leaves `L` (256 is
//! stored as 0), followed by the preorder serialization of the tree: `0` for
//! an internal node, `1` plus the 8-bit byte value for a leaf. The serialized
//! shape is exactly `10 * L - 1` bits long, zero-padded to a byte boundary.

use std::io::{self, Write};

use log::{debug, trace};

use crate::bitstream::{BitCursor, BitWriter};
use crate::error::{DecodeError, DecodeResult};
use crate::huffman::{HuffmanTree, Node, NodeId};

/// Number of header bits for a tree with `leaf_count` leaves.
pub fn header_bit_len(leaf_count: usize) -> usize {
    10 * leaf_count - 1
}

/// Number of header bytes following the leaf-count byte.
pub fn header_byte_len(leaf_count: usize) -> usize {
    header_bit_len(leaf_count).div_ceil(8)
}

/// Map the stored leaf-count byte to the real number of leaves.
pub fn leaf_count_from_byte(byte: u8) -> usize {
    if byte == 0 { 256 } else { byte as usize }
}

pub fn leaf_count_to_byte(leaf_count: usize) -> u8 {
    (leaf_count % 256) as u8
}

/// Write the leaf-count byte and the padded preorder bitstream of `tree`.
pub fn write_tree<W: Write>(tree: &HuffmanTree, writer: &mut W) -> io::Result<usize> {
    let leaf_count = tree.leaf_count();
    writer.write_all(&[leaf_count_to_byte(leaf_count)])?;

    let mut bits = BitWriter::new(&mut *writer);
    let mut stack = vec![tree.root()];

    while let Some(id) = stack.pop() {
        match tree.node(id) {
            Node::Leaf { byte } => {
                trace!("Header leaf {:#04x} at bit {}", byte, bits.total_bits());
                bits.write_bit(true)?;
                bits.write_byte_msb(byte)?;
            }
            Node::Internal { left, right } => {
                bits.write_bit(false)?;
                stack.push(right);
                stack.push(left);
            }
        }
    }

    debug_assert_eq!(bits.total_bits() as usize, header_bit_len(leaf_count));
    bits.finish()?;

    let written = 1 + header_byte_len(leaf_count);
    debug!(
        "Wrote tree header: {} leaves, {} bits, {} bytes",
        leaf_count,
        header_bit_len(leaf_count),
        written
    );
    Ok(written)
}

/// Rebuild the tree from the header bytes that follow the leaf-count byte.
pub fn deserialize_tree(leaf_count_byte: u8, header: &[u8]) -> DecodeResult<HuffmanTree> {
    let leaf_count = leaf_count_from_byte(leaf_count_byte);
    let bit_len = header_bit_len(leaf_count);
    let byte_len = header_byte_len(leaf_count);

    if header.len() < byte_len {
        return Err(DecodeError::CorruptHeader(format!(
            "expected {} header bytes for {} leaves, found {}",
            byte_len,
            leaf_count,
            header.len()
        )));
    }

    let mut cursor = BitCursor::new(&header[..byte_len], bit_len);
    // Placeholder leaves are overwritten once their decision bit is read.
    let mut nodes = vec![Node::Leaf { byte: 0 }];
    let mut stack: Vec<NodeId> = vec![0];
    let mut leaves = 0usize;

    while let Some(bit) = cursor.read_bit() {
        let id = stack.pop().ok_or_else(|| {
            DecodeError::CorruptHeader(format!(
                "tree complete before bit {} of {}",
                cursor.position() - 1,
                bit_len
            ))
        })?;

        if bit {
            let byte = cursor.read_byte_msb().ok_or_else(|| {
                DecodeError::CorruptHeader(format!(
                    "leaf value at bit {} runs past the header",
                    cursor.position()
                ))
            })?;
            nodes[id] = Node::Leaf { byte };
            leaves += 1;
            trace!("Header leaf {:#04x}", byte);
        } else {
            let left = nodes.len();
            let right = left + 1;
            nodes.push(Node::Leaf { byte: 0 });
            nodes.push(Node::Leaf { byte: 0 });
            nodes[id] = Node::Internal { left, right };
            stack.push(right);
            stack.push(left);
        }
    }

    if !stack.is_empty() {
        return Err(DecodeError::CorruptHeader(format!(
            "{} nodes left without a value after {} bits",
            stack.len(),
            bit_len
        )));
    }
    if leaves != leaf_count {
        return Err(DecodeError::CorruptHeader(format!(
            "declared {} leaves, found {}",
            leaf_count, leaves
        )));
    }

    debug!("Rebuilt tree with {} leaves from {} header bits", leaves, bit_len);
    Ok(HuffmanTree::from_parts(nodes, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::FreqTable;

    fn tree_of(pairs: &[(u8, u64)]) -> HuffmanTree {
        let freq: FreqTable = pairs.iter().copied().collect();
        HuffmanTree::from_frequencies(&freq).unwrap()
    }

    fn serialize_tree(tree: &HuffmanTree) -> Vec<u8> {
        let mut out = Vec::<u8>::new();
        let written = write_tree(tree, &mut out).unwrap();
        assert_eq!(written, out.len());
        out
    }

    #[test]
    fn test_header_lengths() {
        assert_eq!(header_bit_len(1), 9);
        assert_eq!(header_byte_len(1), 2);
        assert_eq!(header_bit_len(3), 29);
        assert_eq!(header_byte_len(3), 4);
        assert_eq!(header_bit_len(256), 2559);
        assert_eq!(header_byte_len(256), 320);
    }

    #[test]
    fn test_leaf_count_sentinel() {
        assert_eq!(leaf_count_to_byte(256), 0);
        assert_eq!(leaf_count_from_byte(0), 256);
        assert_eq!(leaf_count_to_byte(17), 17);
        assert_eq!(leaf_count_from_byte(17), 17);
    }

    #[test]
    fn test_three_leaf_header_bytes() {
        let tree = tree_of(&[(0x41, 2), (0x42, 1), (0x43, 1)]);
        let header = serialize_tree(&tree);

        // 0 | 1 01000001 | 0 | 1 01000010 | 1 01000011
        assert_eq!(header, vec![0x03, 0x0A, 0x2A, 0x54, 0x18]);
    }

    #[test]
    fn test_deserialize_rebuilds_same_codes() {
        let tree = tree_of(&[(1, 45), (2, 13), (3, 12), (4, 16), (5, 9), (6, 5)]);
        let header = serialize_tree(&tree);
        let rebuilt = deserialize_tree(header[0], &header[1..]).unwrap();

        assert_eq!(rebuilt.leaf_count(), 6);
        assert_eq!(rebuilt.code_table(), tree.code_table());
    }

    #[test]
    fn test_single_leaf_header() {
        let tree = tree_of(&[(0x7F, 3)]);
        let header = serialize_tree(&tree);
        assert_eq!(header.len(), 1 + 2);

        let rebuilt = deserialize_tree(header[0], &header[1..]).unwrap();
        assert_eq!(rebuilt.node(rebuilt.root()), Node::Leaf { byte: 0x7F });
    }

    #[test]
    fn test_full_alphabet_header() {
        let freq: FreqTable = (0..=255u8).map(|b| (b, 1 + (b as u64 % 5))).collect();
        let tree = HuffmanTree::from_frequencies(&freq).unwrap();
        let header = serialize_tree(&tree);

        assert_eq!(header[0], 0);
        assert_eq!(header.len(), 1 + 320);
        let rebuilt = deserialize_tree(header[0], &header[1..]).unwrap();
        assert_eq!(rebuilt.code_table(), tree.code_table());
    }

    #[test]
    fn test_truncated_header() {
        let tree = tree_of(&[(b'a', 1), (b'b', 2), (b'c', 3)]);
        let header = serialize_tree(&tree);
        let err = deserialize_tree(header[0], &header[1..3]).unwrap_err();
        assert!(matches!(err, DecodeError::CorruptHeader(_)));
    }

    #[test]
    fn test_shape_disagrees_with_leaf_count() {
        // Two leaves declared, but the first bit says the root is a leaf.
        let bogus = [0b0000_0011, 0x00, 0x00];
        let err = deserialize_tree(2, &bogus).unwrap_err();
        assert!(matches!(err, DecodeError::CorruptHeader(_)));

        // Two leaves declared, all-zero bits never close the tree.
        let err = deserialize_tree(2, &[0x00, 0x00, 0x00]).unwrap_err();
        assert!(matches!(err, DecodeError::CorruptHeader(_)));
    }
}
