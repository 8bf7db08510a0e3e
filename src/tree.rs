use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

use crate::error::{Error, Result};
use crate::frequency::FrequencyTable;

/// A node of the prefix-code tree. Internal nodes own both children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf {
        weight: u64,
        symbol: u8,
    },
    Internal {
        weight: u64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

impl Node {
    pub fn weight(&self) -> u64 {
        match self {
            Node::Leaf { weight, .. } | Node::Internal { weight, .. } => *weight,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    fn merge(left: Node, right: Node) -> Node {
        Node::Internal {
            weight: left.weight() + right.weight(),
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn leaf_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Node::Leaf { .. } => count += 1,
                Node::Internal { left, right, .. } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        count
    }

    /// Length of the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0)];
        while let Some((node, depth)) = stack.pop() {
            match node {
                Node::Leaf { .. } => deepest = deepest.max(depth),
                Node::Internal { left, right, .. } => {
                    stack.push((right, depth + 1));
                    stack.push((left, depth + 1));
                }
            }
        }
        deepest
    }
}

// Heap entry ordered so that BinaryHeap pops the smallest (weight, order) first.
struct Pending {
    weight: u64,
    order: u32,
    node: Node,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        (other.weight, other.order).cmp(&(self.weight, self.order))
    }
}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Build the Huffman tree for `table`.
///
/// Ties on weight are broken by an order key: leaves use their symbol value,
/// merged nodes are numbered from 256 upwards in creation order. The first
/// node popped becomes the left child.
pub fn build(table: &FrequencyTable) -> Result<Node> {
    let mut heap: BinaryHeap<Pending> = table
        .present()
        .map(|(symbol, weight)| Pending {
            weight,
            order: symbol as u32,
            node: Node::Leaf { weight, symbol },
        })
        .collect();

    let mut next_order = 256;
    loop {
        let Some(first) = heap.pop() else {
            return Err(Error::EmptyInput);
        };
        let Some(second) = heap.pop() else {
            return Ok(first.node);
        };
        let node = Node::merge(first.node, second.node);
        heap.push(Pending {
            weight: node.weight(),
            order: next_order,
            node,
        });
        next_order += 1;
    }
}

/// The bit path from the root to a leaf; `false` is left, `true` is right.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Code(Vec<bool>);

impl Code {
    pub fn bits(&self) -> &[bool] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_prefix_of(&self, other: &Code) -> bool {
        other.0.starts_with(&self.0)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.0 {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Symbol to code mapping derived from a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    codes: Vec<Option<Code>>,
}

impl CodeTable {
    /// Walk `root` once and record the path to every leaf.
    ///
    /// A tree that is a lone leaf gives that leaf the empty code.
    pub fn from_tree(root: &Node) -> Self {
        let mut codes = vec![None; 256];
        let mut stack = vec![(root, Vec::new())];
        while let Some((node, path)) = stack.pop() {
            match node {
                Node::Leaf { symbol, .. } => codes[*symbol as usize] = Some(Code(path)),
                Node::Internal { left, right, .. } => {
                    let mut right_path = path.clone();
                    right_path.push(true);
                    stack.push((right, right_path));

                    let mut left_path = path;
                    left_path.push(false);
                    stack.push((left, left_path));
                }
            }
        }
        Self { codes }
    }

    pub fn get(&self, symbol: u8) -> Option<&Code> {
        self.codes[symbol as usize].as_ref()
    }

    /// Coded symbols in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &Code)> + '_ {
        self.codes
            .iter()
            .enumerate()
            .filter_map(|(symbol, code)| code.as_ref().map(|code| (symbol as u8, code)))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.iter().all(Option::is_none)
    }

    /// Payload size in bits of a source with these frequencies.
    pub fn payload_bits(&self, table: &FrequencyTable) -> u64 {
        table
            .present()
            .map(|(symbol, count)| {
                let len = self.get(symbol).map_or(0, Code::len);
                count * len as u64
            })
            .sum()
    }
}
