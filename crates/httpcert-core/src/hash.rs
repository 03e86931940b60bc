// Copyright (c) 2026 Joseph Verdicchio and EvidenceOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Hashing primitives and the certification digest derivations.
//!
//! The platform's representation-independent hash (RIH) canonicalizes
//! a map of named values: every entry contributes
//! `SHA-256(key) ∥ SHA-256(encoded value)`, the pairs sort
//! lexicographically, and the concatenation hashes to the digest. Map
//! order therefore never matters — which is why this module must not
//! sort header lists itself anywhere else.

use sha2::{Digest, Sha256};

use crate::endpoint::EndpointRecord;
use crate::Hash32;

pub fn sha256(data: &[u8]) -> Hash32 {
    let mut h = Sha256::new();
    h.update(data);
    h.finalize().into()
}

/// One streaming pass over chunked content.
pub fn sha256_chunks<C: AsRef<[u8]>>(chunks: &[C]) -> Hash32 {
    let mut h = Sha256::new();
    for chunk in chunks {
        h.update(chunk.as_ref());
    }
    h.finalize().into()
}

/// A value in a representation-independent map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Blob(Vec<u8>),
    Nat(u64),
}

fn leb128(mut n: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(10);
    loop {
        let byte = (n & 0x7f) as u8;
        n >>= 7;
        if n == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

fn value_digest(value: &Value) -> Hash32 {
    match value {
        Value::Text(text) => sha256(text.as_bytes()),
        Value::Blob(blob) => sha256(blob),
        Value::Nat(n) => sha256(&leb128(*n)),
    }
}

/// Representation-independent hash of a `(text key → value)` map.
pub fn hash_of_map(entries: &[(String, Value)]) -> Hash32 {
    let mut pairs: Vec<[u8; 64]> = entries
        .iter()
        .map(|(key, value)| {
            let mut pair = [0u8; 64];
            pair[..32].copy_from_slice(&sha256(key.as_bytes()));
            pair[32..].copy_from_slice(&value_digest(value));
            pair
        })
        .collect();
    pairs.sort_unstable();
    let mut h = Sha256::new();
    for pair in &pairs {
        h.update(pair);
    }
    h.finalize().into()
}

fn concat_digest(left: &Hash32, right: &[u8]) -> Hash32 {
    let mut h = Sha256::new();
    h.update(left);
    h.update(right);
    h.finalize().into()
}

/// Certified digest of the request side of an exchange.
///
/// Empty when the endpoint's flags exclude request certification; a
/// 32-byte digest otherwise.
pub fn request_hash(record: &EndpointRecord) -> Vec<u8> {
    if record.no_certification || record.no_request_certification {
        return Vec::new();
    }
    let mut entries: Vec<(String, Value)> = record
        .request_headers
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| (name.to_lowercase(), Value::Text(value.clone())))
        .collect();
    entries.push((
        ":ic-cert-method".to_string(),
        Value::Text(record.method.clone()),
    ));
    let query = record
        .query_params
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    entries.push((
        ":ic-cert-query".to_string(),
        Value::Blob(sha256(query.as_bytes()).to_vec()),
    ));
    let header_hash = hash_of_map(&entries);
    // Request bodies are not certified; GET/HEAD/OPTIONS carry none.
    concat_digest(&header_hash, &sha256(b"")).to_vec()
}

/// Certified digest of the response side of an exchange.
///
/// Empty when the endpoint opted out of certification entirely.
pub fn response_hash(record: &EndpointRecord, expression_text: &str) -> Vec<u8> {
    if record.no_certification {
        return Vec::new();
    }
    let mut entries: Vec<(String, Value)> = record
        .response_headers
        .iter()
        .filter(|(name, value)| !value.is_empty() && name.to_lowercase() != "ic-certificate")
        .map(|(name, value)| (name.to_lowercase(), Value::Text(value.clone())))
        .collect();
    entries.push((
        "ic-certificateexpression".to_string(),
        Value::Text(expression_text.to_string()),
    ));
    entries.push((":ic-cert-status".to_string(), Value::Nat(record.status.into())));
    let header_hash = hash_of_map(&entries);
    concat_digest(&header_hash, &record.body_hash).to_vec()
}

/// The metadata directory's inner key.
///
/// Three shapes exist per URL, one per certification mode: body only,
/// body+status, body+status+method.
pub fn unique_http_hash(record: &EndpointRecord) -> Hash32 {
    let status = (!record.no_certification).then_some(record.status);
    let method = (!record.no_certification && !record.no_request_certification)
        .then_some(record.method.as_str());
    unique_http_hash_parts(&record.body_hash, status, method)
}

pub(crate) fn unique_http_hash_parts(
    body_hash: &Hash32,
    status: Option<u16>,
    method: Option<&str>,
) -> Hash32 {
    let mut entries = vec![(
        ":ic-cert-body".to_string(),
        Value::Blob(body_hash.to_vec()),
    )];
    if let Some(method) = method {
        entries.push((":ic-cert-method".to_string(), Value::Text(method.to_string())));
    }
    if let Some(status) = status {
        entries.push((":ic-cert-status".to_string(), Value::Nat(status.into())));
    }
    hash_of_map(&entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::Endpoint;
    use proptest::prelude::*;

    #[test]
    fn sha256_known_vectors() {
        assert_eq!(
            hex::encode(sha256(b"")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            hex::encode(sha256(b"hello")),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn chunked_hash_equals_whole_body_hash() {
        assert_eq!(sha256_chunks(&[b"he".as_slice(), b"llo"]), sha256(b"hello"));
        assert_eq!(sha256_chunks::<&[u8]>(&[]), sha256(b""));
    }

    #[test]
    fn leb128_boundaries() {
        assert_eq!(leb128(0), vec![0x00]);
        assert_eq!(leb128(127), vec![0x7f]);
        assert_eq!(leb128(128), vec![0x80, 0x01]);
        assert_eq!(leb128(300), vec![0xac, 0x02]);
    }

    #[test]
    fn map_hash_distinguishes_value_kinds() {
        let as_text = hash_of_map(&[("k".into(), Value::Text("7".into()))]);
        let as_blob = hash_of_map(&[("k".into(), Value::Blob(b"7".to_vec()))]);
        let as_nat = hash_of_map(&[("k".into(), Value::Nat(7))]);
        // Text and Blob encode to the same bytes on purpose; Nat is LEB128.
        assert_eq!(as_text, as_blob);
        assert_ne!(as_text, as_nat);
    }

    #[test]
    fn flag_monotonicity() {
        let full = Endpoint::new("/x", Some(b"body")).build();
        let expr = "expr";
        assert_eq!(request_hash(&full).len(), 32);
        assert_eq!(response_hash(&full, expr).len(), 32);

        let response_only = Endpoint::new("/x", Some(b"body"))
            .no_request_certification()
            .build();
        assert!(request_hash(&response_only).is_empty());
        assert_eq!(response_hash(&response_only, expr).len(), 32);

        let uncertified = Endpoint::new("/x", Some(b"body")).no_certification().build();
        assert!(request_hash(&uncertified).is_empty());
        assert!(response_hash(&uncertified, expr).is_empty());
    }

    #[test]
    fn request_hash_follows_the_platform_recipe() {
        let record = Endpoint::new("/search?q=ic", None)
            .query_param("q", "ic")
            .request_header("accept", "text/html")
            .build();
        let expected_headers = hash_of_map(&[
            ("accept".into(), Value::Text("text/html".into())),
            (":ic-cert-method".into(), Value::Text("GET".into())),
            (
                ":ic-cert-query".into(),
                Value::Blob(sha256(b"q=ic").to_vec()),
            ),
        ]);
        let expected = concat_digest(&expected_headers, &sha256(b"")).to_vec();
        assert_eq!(request_hash(&record), expected);
    }

    #[test]
    fn empty_header_values_are_skipped() {
        let with_empty = Endpoint::new("/x", None).request_header("x-skip", "").build();
        let without = Endpoint::new("/x", None).build();
        assert_eq!(request_hash(&with_empty), request_hash(&without));
    }

    #[test]
    fn existing_certificate_header_is_excluded_from_response_hash() {
        let clean = Endpoint::new("/x", Some(b"b"))
            .response_header("content-type", "text/plain")
            .build();
        let with_cert = Endpoint::new("/x", Some(b"b"))
            .response_header("content-type", "text/plain")
            .response_header("IC-Certificate", "certificate=:stale:")
            .build();
        assert_eq!(response_hash(&clean, "e"), response_hash(&with_cert, "e"));
    }

    #[test]
    fn unique_hash_separates_the_three_modes() {
        let body = sha256(b"body");
        let h1 = unique_http_hash_parts(&body, None, None);
        let h2 = unique_http_hash_parts(&body, Some(200), None);
        let h3 = unique_http_hash_parts(&body, Some(200), Some("GET"));
        assert_ne!(h1, h2);
        assert_ne!(h2, h3);
        assert_ne!(h1, h3);
    }

    proptest! {
        #[test]
        fn map_hash_is_order_independent(
            mut entries in prop::collection::vec(("[a-z]{1,8}", any::<u64>()), 1..12),
        ) {
            entries.sort();
            entries.dedup_by(|a, b| a.0 == b.0);
            let forward: Vec<(String, Value)> = entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::Nat(*v)))
                .collect();
            let mut reversed = forward.clone();
            reversed.reverse();
            prop_assert_eq!(hash_of_map(&forward), hash_of_map(&reversed));
        }

        #[test]
        fn chunk_splits_never_change_the_digest(
            body in prop::collection::vec(any::<u8>(), 0..64),
            split in any::<prop::sample::Index>(),
        ) {
            let at = split.index(body.len() + 1);
            let (a, b) = body.split_at(at);
            prop_assert_eq!(sha256_chunks(&[a, b]), sha256(&body));
        }
    }
}
