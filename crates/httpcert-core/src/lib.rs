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

//! httpcert-core
//!
//! Server-side certification of canister HTTP responses.
//!
//! A canister serving HTTP cannot be trusted on its own; the platform
//! instead signs the 32-byte root of a per-canister data tree. This
//! crate maintains that tree so each certified HTTP exchange becomes a
//! leaf the client can check:
//! - `Endpoint` / `EndpointRecord`: declarative description of one
//!   certified exchange (path, method, headers, query, status, body)
//! - expression compiler: the `ic-certificateexpression` text, its
//!   CBOR expression path and its hash
//! - request/response hashing per the platform's Response Verification
//!   v2 specification (representation-independent map hashing)
//! - `CertifiedAssets`: the engine that keeps the Merkle tree, the
//!   metadata directory and the host's certified-data register in
//!   lockstep, and binds witnesses onto outgoing responses

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod assets;
pub mod endpoint;
pub mod error;
pub mod expression;
pub mod hash;
pub mod http;
pub mod metadata;
pub mod platform;
pub mod uri;

pub use crate::assets::{init_stable_store, CertifiedAssets, CertifiedTree, StableStore};
pub use crate::endpoint::{Endpoint, EndpointRecord};
pub use crate::error::{HttpCertError, HttpCertResult};
pub use crate::http::{HeaderField, HttpRequest, HttpResponse};
pub use crate::metadata::{Metadata, MetadataIndex};
pub use crate::platform::{InMemoryPlatform, Platform};

pub use httpcert_tree::{HashTree, MerkleTree};

pub type Hash32 = httpcert_tree::Hash32;
