// Copyright (c) 2026 Joseph Verdicchio and EvidenceOS Contributors
// SPDX-License-Identifier: Apache-2.0

use serde::ser::{Serialize, SerializeSeq, Serializer};
use serde_bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::Hash32;

/// A structural witness over certified data.
///
/// The variants and their digests follow the platform's hash-tree
/// grammar; `Pruned` stands in for a subtree whose contents are not
/// revealed but whose digest still contributes to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashTree {
    Empty,
    Fork(Box<HashTree>, Box<HashTree>),
    Labeled(Vec<u8>, Box<HashTree>),
    Leaf(Vec<u8>),
    Pruned(Hash32),
}

fn domain_hasher(tag: &[u8]) -> Sha256 {
    let mut h = Sha256::new();
    h.update([tag.len() as u8]);
    h.update(tag);
    h
}

pub(crate) fn empty_digest() -> Hash32 {
    domain_hasher(b"ic-hashtree-empty").finalize().into()
}

pub(crate) fn fork_digest(left: &Hash32, right: &Hash32) -> Hash32 {
    let mut h = domain_hasher(b"ic-hashtree-fork");
    h.update(left);
    h.update(right);
    h.finalize().into()
}

pub(crate) fn labeled_digest(label: &[u8], subtree: &Hash32) -> Hash32 {
    let mut h = domain_hasher(b"ic-hashtree-labeled");
    h.update(label);
    h.update(subtree);
    h.finalize().into()
}

pub(crate) fn leaf_digest(value: &[u8]) -> Hash32 {
    let mut h = domain_hasher(b"ic-hashtree-leaf");
    h.update(value);
    h.finalize().into()
}

impl HashTree {
    /// Structural root digest of this (possibly pruned) tree.
    pub fn digest(&self) -> Hash32 {
        match self {
            HashTree::Empty => empty_digest(),
            HashTree::Fork(left, right) => fork_digest(&left.digest(), &right.digest()),
            HashTree::Labeled(label, tree) => labeled_digest(label, &tree.digest()),
            HashTree::Leaf(value) => leaf_digest(value),
            HashTree::Pruned(digest) => *digest,
        }
    }

    /// Resolve a label path through forks to a revealed leaf value.
    ///
    /// Returns `None` when the path runs into a pruned subtree or the
    /// tree simply does not contain it.
    pub fn lookup_path<L: AsRef<[u8]>>(&self, path: &[L]) -> Option<&[u8]> {
        match path.split_first() {
            None => match self {
                HashTree::Leaf(value) => Some(value),
                _ => None,
            },
            Some((label, rest)) => self.lookup_label(label.as_ref())?.lookup_path(rest),
        }
    }

    fn lookup_label(&self, label: &[u8]) -> Option<&HashTree> {
        match self {
            HashTree::Fork(left, right) => left
                .lookup_label(label)
                .or_else(|| right.lookup_label(label)),
            HashTree::Labeled(own, tree) if own.as_slice() == label => Some(tree),
            _ => None,
        }
    }
}

impl Serialize for HashTree {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            HashTree::Empty => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(&0u8)?;
                seq.end()
            }
            HashTree::Fork(left, right) => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(&1u8)?;
                seq.serialize_element(left.as_ref())?;
                seq.serialize_element(right.as_ref())?;
                seq.end()
            }
            HashTree::Labeled(label, tree) => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(&2u8)?;
                seq.serialize_element(Bytes::new(label))?;
                seq.serialize_element(tree.as_ref())?;
                seq.end()
            }
            HashTree::Leaf(value) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(&3u8)?;
                seq.serialize_element(Bytes::new(value))?;
                seq.end()
            }
            HashTree::Pruned(digest) => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(&4u8)?;
                seq.serialize_element(Bytes::new(digest))?;
                seq.end()
            }
        }
    }
}

/// CBOR-encode a witness, prefixed with the self-describing tag so
/// gateways can sniff the payload.
pub fn encode_witness(tree: &HashTree) -> Result<Vec<u8>, serde_cbor::Error> {
    let mut encoded = Vec::new();
    let mut serializer = serde_cbor::Serializer::new(&mut encoded);
    serializer.self_describe()?;
    tree.serialize(&mut serializer)?;
    Ok(encoded)
}
