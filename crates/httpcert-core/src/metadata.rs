// Copyright (c) 2026 Joseph Verdicchio and EvidenceOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! The two-level metadata directory: `url → unique http hash → list`.
//!
//! The inner key separates the three certification modes of one URL
//! (body only / body+status / body+status+method); the ordered list
//! keeps insertion order and deliberately permits duplicates, since a
//! caller may certify several response bodies for one URL+method+status.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::endpoint::EndpointRecord;
use crate::hash::unique_http_hash_parts;
use crate::Hash32;

/// Everything stored per certified exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub endpoint: EndpointRecord,
    /// Exact (whitespace-normalized) certification expression string.
    pub expression_text: String,
    /// CBOR-encoded expression path, shipped base64 in the header.
    #[serde(with = "serde_bytes")]
    pub encoded_expr_path: Vec<u8>,
    /// Tree key of the exchange:
    /// `["http_expr", seg…, wildcard, expr_hash, request_hash, response_hash]`.
    pub full_expr_path: Vec<Vec<u8>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataIndex {
    entries: BTreeMap<String, BTreeMap<Hash32, Vec<Metadata>>>,
}

impl MetadataIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: Hash32, metadata: Metadata) {
        self.entries
            .entry(metadata.endpoint.url.clone())
            .or_default()
            .entry(key)
            .or_default()
            .push(metadata);
    }

    /// Drop every entry under `url`, returning them for tree cleanup.
    pub fn remove_url(&mut self, url: &str) -> Vec<Metadata> {
        self.entries
            .remove(url)
            .map(|inner| inner.into_values().flatten().collect())
            .unwrap_or_default()
    }

    /// Remove the first entry under `(url, key)` whose tree path is an
    /// exact match.
    pub fn remove_exact(
        &mut self,
        url: &str,
        key: Hash32,
        full_expr_path: &[Vec<u8>],
    ) -> Option<Metadata> {
        let inner = self.entries.get_mut(url)?;
        let list = inner.get_mut(&key)?;
        let at = list
            .iter()
            .position(|metadata| metadata.full_expr_path == full_expr_path)?;
        let removed = list.remove(at);
        if list.is_empty() {
            inner.remove(&key);
        }
        if inner.is_empty() {
            self.entries.remove(url);
        }
        Some(removed)
    }

    /// Match an incoming exchange against the directory.
    ///
    /// The three inner keys are tried in increasing certification
    /// strength, stopping at the first level that holds any entries;
    /// within that level the first entry whose certified headers and
    /// query parameters are all present on the incoming exchange wins.
    pub fn lookup(&self, incoming: &EndpointRecord) -> Option<&Metadata> {
        let inner = self.entries.get(&incoming.url)?;
        let levels = [
            unique_http_hash_parts(&incoming.body_hash, None, None),
            unique_http_hash_parts(&incoming.body_hash, Some(incoming.status), None),
            unique_http_hash_parts(
                &incoming.body_hash,
                Some(incoming.status),
                Some(&incoming.method),
            ),
        ];
        let candidates = levels
            .iter()
            .filter_map(|key| inner.get(key))
            .find(|list| !list.is_empty())?;
        candidates
            .iter()
            .find(|metadata| metadata_matches(metadata, incoming))
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &EndpointRecord> {
        self.iter().map(|metadata| &metadata.endpoint)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Metadata> {
        self.entries
            .values()
            .flat_map(|inner| inner.values().flatten())
    }

    pub fn urls(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn expr_paths_for<'a>(&'a self, url: &str) -> impl Iterator<Item = &'a [Vec<u8>]> + 'a {
        self.entries
            .get(url)
            .into_iter()
            .flat_map(|inner| inner.values().flatten())
            .map(|metadata| metadata.full_expr_path.as_slice())
    }

    pub fn contains_url(&self, url: &str) -> bool {
        self.entries.contains_key(url)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Certified pairs must all be present, verbatim, on the incoming
/// exchange; extra incoming headers or parameters never invalidate a
/// match.
fn metadata_matches(metadata: &Metadata, incoming: &EndpointRecord) -> bool {
    let stored = &metadata.endpoint;
    pairs_subset(&stored.request_headers, &incoming.request_headers)
        && pairs_subset(&stored.response_headers, &incoming.response_headers)
        && pairs_subset(&stored.query_params, &incoming.query_params)
}

fn pairs_subset(stored: &[(String, String)], incoming: &[(String, String)]) -> bool {
    stored.iter().all(|pair| incoming.contains(pair))
}
