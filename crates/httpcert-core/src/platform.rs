// Copyright (c) 2026 Joseph Verdicchio and EvidenceOS Contributors
// SPDX-License-Identifier: Apache-2.0

use crate::Hash32;

/// The host platform's certified-data interface.
///
/// The library never talks to the host directly; production glue
/// implements this over the canister SDK (`set_certified_data` /
/// `data_certificate` system calls), and tests use
/// [`InMemoryPlatform`]. Note the host only signs certified data
/// between rounds: a certificate read in the same message that set the
/// data will still cover the previous root.
pub trait Platform {
    /// Install the 32-byte tree root as this node's certified value.
    fn set_certified_data(&mut self, digest: &Hash32);

    /// The host-signed certificate over the certified data, available
    /// in query context only.
    fn data_certificate(&self) -> Option<Vec<u8>>;
}

/// A stand-in host keeping everything in memory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryPlatform {
    pub certified_data: Option<Hash32>,
    pub certificate: Option<Vec<u8>>,
}

impl Platform for InMemoryPlatform {
    fn set_certified_data(&mut self, digest: &Hash32) {
        self.certified_data = Some(*digest);
    }

    fn data_certificate(&self) -> Option<Vec<u8>> {
        self.certificate.clone()
    }
}
