// Copyright (c) 2026 Joseph Verdicchio and EvidenceOS Contributors
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::hashtree::{empty_digest, fork_digest, labeled_digest, leaf_digest, HashTree};
use crate::Hash32;

pub type Label = Vec<u8>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum Entry {
    Leaf {
        #[serde(with = "serde_bytes")]
        value: Vec<u8>,
        digest: Hash32,
    },
    Sub(Node),
}

impl Entry {
    fn digest(&self) -> Hash32 {
        match self {
            Entry::Leaf { digest, .. } => *digest,
            Entry::Sub(node) => node.digest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Node {
    children: BTreeMap<Label, Entry>,
    digest: Hash32,
}

fn largest_power_of_two_less_than(n: usize) -> usize {
    debug_assert!(n > 1);
    1usize << (usize::BITS - 1 - (n - 1).leading_zeros())
}

/// Balanced fork digest over an ordered run of labeled-child digests.
fn fork_range(digests: &[Hash32]) -> Hash32 {
    match digests.len() {
        0 => empty_digest(),
        1 => digests[0],
        n => {
            let k = largest_power_of_two_less_than(n);
            fork_digest(&fork_range(&digests[..k]), &fork_range(&digests[k..]))
        }
    }
}

impl Node {
    fn new() -> Self {
        Self {
            children: BTreeMap::new(),
            digest: empty_digest(),
        }
    }

    fn labeled_digests(&self) -> Vec<Hash32> {
        self.children
            .iter()
            .map(|(label, entry)| labeled_digest(label, &entry.digest()))
            .collect()
    }

    fn rehash(&mut self) {
        self.digest = fork_range(&self.labeled_digests());
    }

    fn put<L: AsRef<[u8]>>(&mut self, path: &[L], value: &[u8]) {
        let Some((label, rest)) = path.split_first() else {
            return;
        };
        if rest.is_empty() {
            self.children.insert(
                label.as_ref().to_vec(),
                Entry::Leaf {
                    value: value.to_vec(),
                    digest: leaf_digest(value),
                },
            );
        } else {
            let entry = self
                .children
                .entry(label.as_ref().to_vec())
                .or_insert_with(|| Entry::Sub(Node::new()));
            if let Entry::Leaf { .. } = entry {
                *entry = Entry::Sub(Node::new());
            }
            match entry {
                Entry::Sub(node) => node.put(rest, value),
                Entry::Leaf { .. } => unreachable!("leaf replaced by subtree above"),
            }
        }
        self.rehash();
    }

    fn delete<L: AsRef<[u8]>>(&mut self, path: &[L]) {
        let Some((label, rest)) = path.split_first() else {
            return;
        };
        if rest.is_empty() {
            self.children.remove(label.as_ref());
        } else if let Some(Entry::Sub(node)) = self.children.get_mut(label.as_ref()) {
            node.delete(rest);
            if node.children.is_empty() {
                self.children.remove(label.as_ref());
            }
        }
        self.rehash();
    }

    fn witness(&self, paths: &[&[&[u8]]]) -> HashTree {
        let mut targets: BTreeMap<&[u8], Vec<&[&[u8]]>> = BTreeMap::new();
        for path in paths {
            if let Some((first, rest)) = path.split_first() {
                targets.entry(*first).or_default().push(rest);
            }
        }
        let children: Vec<(&Label, &Entry)> = self.children.iter().collect();
        let labeled: Vec<Hash32> = self.labeled_digests();
        Self::witness_range(&children, &labeled, &targets)
    }

    fn witness_range(
        children: &[(&Label, &Entry)],
        labeled: &[Hash32],
        targets: &BTreeMap<&[u8], Vec<&[&[u8]]>>,
    ) -> HashTree {
        match children {
            [] => HashTree::Empty,
            [(label, entry)] => match targets.get(label.as_slice()) {
                None => HashTree::Pruned(labeled[0]),
                Some(rests) => HashTree::Labeled(
                    label.to_vec(),
                    Box::new(entry.witness_entry(rests)),
                ),
            },
            _ => {
                let k = largest_power_of_two_less_than(children.len());
                let (left, left_digests) = (&children[..k], &labeled[..k]);
                let (right, right_digests) = (&children[k..], &labeled[k..]);
                let half = |side: &[(&Label, &Entry)], digests: &[Hash32]| {
                    if side
                        .iter()
                        .any(|(label, _)| targets.contains_key(label.as_slice()))
                    {
                        Self::witness_range(side, digests, targets)
                    } else {
                        HashTree::Pruned(fork_range(digests))
                    }
                };
                HashTree::Fork(
                    Box::new(half(left, left_digests)),
                    Box::new(half(right, right_digests)),
                )
            }
        }
    }
}

impl Entry {
    fn witness_entry(&self, rests: &[&[&[u8]]]) -> HashTree {
        match self {
            Entry::Leaf { value, digest } => {
                if rests.iter().any(|rest| rest.is_empty()) {
                    HashTree::Leaf(value.clone())
                } else {
                    HashTree::Pruned(*digest)
                }
            }
            Entry::Sub(node) => node.witness(rests),
        }
    }
}

/// A mutable labeled trie whose nodes cache their structural digests.
///
/// Labels are arbitrary byte strings; a leaf carries an opaque value.
/// The digest of a node is the balanced fork combination of its
/// label-sorted children, so witness generation can prune any fork
/// subtree without changing the recomputed root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleTree {
    root: Node,
}

impl Default for MerkleTree {
    fn default() -> Self {
        Self::new()
    }
}

impl MerkleTree {
    pub fn new() -> Self {
        Self { root: Node::new() }
    }

    /// 32-byte structural root digest; this is the certified value.
    pub fn root_hash(&self) -> Hash32 {
        self.root.digest
    }

    /// Insert or overwrite the leaf at `path`.
    ///
    /// Any entry encountered along the way (leaf or subtree) is
    /// replaced by the structure the new path requires. Empty paths
    /// are ignored.
    pub fn put<L: AsRef<[u8]>>(&mut self, path: &[L], value: &[u8]) {
        self.root.put(path, value);
    }

    /// Remove the entry at `path` (a leaf or a whole subtree) and
    /// prune emptied ancestors.
    pub fn delete<L: AsRef<[u8]>>(&mut self, path: &[L]) {
        self.root.delete(path);
    }

    /// Leaf value at `path`, if one exists.
    pub fn get<L: AsRef<[u8]>>(&self, path: &[L]) -> Option<&[u8]> {
        let (last, init) = path.split_last()?;
        let mut node = &self.root;
        for label in init {
            match node.children.get(label.as_ref())? {
                Entry::Sub(sub) => node = sub,
                Entry::Leaf { .. } => return None,
            }
        }
        match node.children.get(last.as_ref())? {
            Entry::Leaf { value, .. } => Some(value),
            Entry::Sub(_) => None,
        }
    }

    pub fn contains<L: AsRef<[u8]>>(&self, path: &[L]) -> bool {
        self.get(path).is_some()
    }

    /// Witness revealing a single path; see [`MerkleTree::reveals`].
    pub fn reveal<L: AsRef<[u8]>>(&self, path: &[L]) -> HashTree {
        self.reveals(std::slice::from_ref(&path))
    }

    /// Produce one pruned witness covering every requested path.
    ///
    /// The witness contains the leaf value of every requested path that
    /// exists, shares fork structure between paths, and its
    /// [`HashTree::digest`] always equals [`MerkleTree::root_hash`].
    /// Paths that do not exist stay pruned.
    pub fn reveals<P, L>(&self, paths: &[P]) -> HashTree
    where
        P: AsRef<[L]>,
        L: AsRef<[u8]>,
    {
        let borrowed: Vec<Vec<&[u8]>> = paths
            .iter()
            .map(|path| path.as_ref().iter().map(|label| label.as_ref()).collect())
            .collect();
        let slices: Vec<&[&[u8]]> = borrowed.iter().map(|path| path.as_slice()).collect();
        self.root.witness(&slices)
    }
}
