// Copyright [2026] [Joseph Verdicchio]
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// Copyright (c) 2026 Joseph Verdicchio and EvidenceOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! httpcert-tree
//!
//! A labeled, hash-consed Merkle tree for certified canister data.
//!
//! This crate implements the authenticated-index half of the certified
//! HTTP stack:
//! - `HashTree`: the platform's witness value (empty / fork / labeled /
//!   leaf / pruned) with domain-separated structural hashing
//! - `MerkleTree`: a mutable labeled trie over byte-string paths whose
//!   nodes cache their digests, supporting `put`, `delete`, `root_hash`
//!   and pruned-witness generation for arbitrary path sets
//! - CBOR witness encoding per the platform witness grammar

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod hashtree;
pub mod store;

pub use crate::hashtree::{encode_witness, HashTree};
pub use crate::store::MerkleTree;

pub type Hash32 = [u8; 32];
