use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use log::{debug, trace};

use crate::frequency::FreqTable;

/// Bit string assigned to a byte value; `false` is a left step, `true` a right step.
pub type Code = Vec<bool>;
pub type CodeTable = HashMap<u8, Code>;

/// Index of a node inside a [`HuffmanTree`] arena.
pub type NodeId = usize;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Node {
    Leaf { byte: u8 },
    Internal { left: NodeId, right: NodeId },
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }
}

/// A strict binary prefix-code tree. The arena owns every node; children are
/// referenced by index, so the tree is immutable once built.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct HuffmanTree {
    nodes: Vec<Node>,
    root: NodeId,
}

#[derive(Eq, PartialEq)]
struct HeapNode {
    freq: u64,
    order: u64,
    node: NodeId,
}

impl Ord for HeapNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for Min-Heap behavior in BinaryHeap (which is max-heap by default).
        // Equal weights pop in insertion order.
        other
            .freq
            .cmp(&self.freq)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for HeapNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl HuffmanTree {
    /// Build the tree by repeatedly merging the two lightest nodes.
    ///
    /// Leaves are seeded in ascending byte order and ties are broken FIFO,
    /// so the same table always yields the same tree. Returns `None` for an
    /// empty table.
    pub fn from_frequencies(frequencies: &FreqTable) -> Option<Self> {
        debug!(
            "Building Huffman Tree from {} unique symbols",
            frequencies.len()
        );

        let mut nodes = Vec::with_capacity(frequencies.len() * 2);
        let mut heap = BinaryHeap::with_capacity(frequencies.len());
        let mut order = 0u64;

        for (&byte, &freq) in frequencies {
            nodes.push(Node::Leaf { byte });
            heap.push(HeapNode {
                freq,
                order,
                node: nodes.len() - 1,
            });
            order += 1;
        }

        while heap.len() > 1 {
            let (Some(left), Some(right)) = (heap.pop(), heap.pop()) else {
                break;
            };

            nodes.push(Node::Internal {
                left: left.node,
                right: right.node,
            });
            heap.push(HeapNode {
                freq: left.freq + right.freq,
                order,
                node: nodes.len() - 1,
            });
            order += 1;
        }

        let root = heap.pop()?.node;
        debug!("Tree construction complete: {} nodes.", nodes.len());
        Some(HuffmanTree { nodes, root })
    }

    /// Assemble a tree from an already-linked arena.
    pub(crate) fn from_parts(nodes: Vec<Node>, root: NodeId) -> Self {
        HuffmanTree { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Node {
        self.nodes[id]
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Derive the byte-to-code mapping, `0` for each left step and `1` for each right step.
    ///
    /// A tree made of a single leaf has no edges, so that byte is given the
    /// one-bit code `0` and every occurrence still costs one payload bit.
    pub fn code_table(&self) -> CodeTable {
        let mut table = CodeTable::new();
        if let Node::Leaf { byte } = self.node(self.root) {
            table.insert(byte, vec![false]);
            return table;
        }
        self.build_code_table(self.root, Code::new(), &mut table);
        table
    }

    fn build_code_table(&self, id: NodeId, prefix: Code, table: &mut CodeTable) {
        match self.node(id) {
            Node::Leaf { byte } => {
                trace!(
                    "Assigning code to byte {:#04x} ('{}') : {}",
                    byte,
                    byte as char,
                    format_code(&prefix)
                );
                table.insert(byte, prefix);
            }
            Node::Internal { left, right } => {
                let mut left_prefix = prefix.clone();
                left_prefix.push(false);
                self.build_code_table(left, left_prefix, table);

                let mut right_prefix = prefix;
                right_prefix.push(true);
                self.build_code_table(right, right_prefix, table);
            }
        }
    }
}

/// Render a code as a string of `0` and `1`.
pub fn format_code(code: &[bool]) -> String {
    code.iter().map(|&bit| if bit { '1' } else { '0' }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(pairs: &[(u8, u64)]) -> FreqTable {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_empty_table_has_no_tree() {
        assert!(HuffmanTree::from_frequencies(&FreqTable::new()).is_none());
    }

    #[test]
    fn test_single_symbol_root_is_leaf() {
        let tree = HuffmanTree::from_frequencies(&table(&[(b'A', 10_000)])).unwrap();
        assert_eq!(tree.node(tree.root()), Node::Leaf { byte: b'A' });
        assert_eq!(tree.code_table()[&b'A'], vec![false]);
    }

    #[test]
    fn test_three_symbol_codes() {
        let tree =
            HuffmanTree::from_frequencies(&table(&[(b'A', 2), (b'B', 1), (b'C', 1)])).unwrap();
        let codes = tree.code_table();

        assert_eq!(format_code(&codes[&b'A']), "0");
        assert_eq!(format_code(&codes[&b'B']), "10");
        assert_eq!(format_code(&codes[&b'C']), "11");
    }

    #[test]
    fn test_leaf_and_internal_counts() {
        let freq: FreqTable = (0..=255u8).map(|b| (b, b as u64 + 1)).collect();
        let tree = HuffmanTree::from_frequencies(&freq).unwrap();

        assert_eq!(tree.leaf_count(), 256);
        assert_eq!(tree.nodes.len(), 2 * 256 - 1);
    }

    #[test]
    fn test_codes_are_prefix_free() {
        let freq = table(&[(1, 45), (2, 13), (3, 12), (4, 16), (5, 9), (6, 5)]);
        let codes = HuffmanTree::from_frequencies(&freq).unwrap().code_table();

        for (a, code_a) in &codes {
            for (b, code_b) in &codes {
                if a != b {
                    assert!(!code_b.starts_with(code_a), "{a} prefixes {b}");
                }
            }
        }
        // The most frequent symbol gets the shortest code.
        let shortest = codes.values().map(Vec::len).min().unwrap();
        assert_eq!(codes[&1].len(), shortest);
    }

    #[test]
    fn test_build_is_deterministic() {
        let freq = table(&[(b'x', 3), (b'y', 3), (b'z', 3), (b'w', 3)]);
        let first = HuffmanTree::from_frequencies(&freq).unwrap();
        let second = HuffmanTree::from_frequencies(&freq).unwrap();
        assert_eq!(first, second);
    }
}
