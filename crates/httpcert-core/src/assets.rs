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

//! The certification engine and response binder.
//!
//! `CertifiedAssets` owns the stable store (Merkle tree + metadata
//! directory) and keeps the host's certified-data register equal to the
//! tree root after every mutation. At request time it matches the
//! exchange against the directory, reveals the covering witness and
//! hands back the `ic-certificate` / `ic-certificateexpression`
//! headers the response must carry.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use httpcert_tree::{encode_witness, HashTree, MerkleTree};

use crate::endpoint::{Endpoint, EndpointRecord};
use crate::error::{HttpCertError, HttpCertResult};
use crate::expression::{self, CompiledExpression, EXPR_PATH_ROOT};
use crate::hash::{self, sha256};
use crate::http::{HeaderField, HttpRequest, HttpResponse};
use crate::metadata::{Metadata, MetadataIndex};
use crate::platform::Platform;
use crate::uri;
use crate::Hash32;

pub const CERTIFICATE_HEADER: &str = "ic-certificate";
pub const CERTIFICATE_EXPRESSION_HEADER: &str = "ic-certificateexpression";

/// Top label of the legacy v1 subtree: `http_assets/<url> → body hash`.
const ASSETS_ROOT: &str = "http_assets";

/// The upgrade-persistent state: callers keep this in stable memory
/// (it is fully serde-serializable) and hand it back after an upgrade.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StableStore {
    pub tree: MerkleTree,
    pub metadata: MetadataIndex,
}

pub fn init_stable_store() -> StableStore {
    StableStore::default()
}

/// Certificate and encoded witness over a set of certified keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertifiedTree {
    pub certificate: Vec<u8>,
    pub tree: Vec<u8>,
}

pub struct CertifiedAssets<P: Platform> {
    store: StableStore,
    platform: P,
}

impl<P: Platform> CertifiedAssets<P> {
    pub fn new(platform: P) -> Self {
        Self::with_store(init_stable_store(), platform)
    }

    pub fn with_store(store: StableStore, platform: P) -> Self {
        Self { store, platform }
    }

    /// Hand the stable store back, e.g. in a pre-upgrade hook.
    pub fn into_store(self) -> StableStore {
        self.store
    }

    pub fn store(&self) -> &StableStore {
        &self.store
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn root_hash(&self) -> Hash32 {
        self.store.tree.root_hash()
    }

    /// Certify one endpoint: insert its v1 leaf and v2 expression leaf,
    /// refresh the certified data and record its metadata.
    pub fn certify(&mut self, endpoint: Endpoint) -> HttpCertResult<()> {
        let record = endpoint.build();
        self.store.tree.put(
            &[ASSETS_ROOT.as_bytes(), record.url.as_bytes()],
            &record.body_hash,
        );

        let expr = expression::compile(&record)?;
        let request_hash = hash::request_hash(&record);
        let response_hash = hash::response_hash(&record, &expr.text);
        if record.no_certification && !(request_hash.is_empty() && response_hash.is_empty()) {
            return Err(HttpCertError::InternalInvariant(
                "an uncertified endpoint produced a request or response hash",
            ));
        }

        let full_expr_path = full_expr_path(&expr, &request_hash, &response_hash);
        self.store.tree.put(&full_expr_path, b"");
        self.refresh_certified_data();

        let key = hash::unique_http_hash(&record);
        tracing::debug!(url = %record.url, root = %hex::encode(self.root_hash()), "certified endpoint");
        self.store.metadata.insert(
            key,
            Metadata {
                endpoint: record,
                expression_text: expr.text,
                encoded_expr_path: expr.encoded_path,
                full_expr_path,
            },
        );
        Ok(())
    }

    /// Remove one certified endpoint, matched by its exact parameters.
    ///
    /// Unknown endpoints reduce to deleting the v1 leaf (and a
    /// certified-data refresh); nothing else changes.
    pub fn remove(&mut self, endpoint: Endpoint) -> HttpCertResult<()> {
        let record = endpoint.build();
        self.store
            .tree
            .delete(&[ASSETS_ROOT.as_bytes(), record.url.as_bytes()]);

        let expr = expression::compile(&record)?;
        let request_hash = hash::request_hash(&record);
        let response_hash = hash::response_hash(&record, &expr.text);
        let path = full_expr_path(&expr, &request_hash, &response_hash);
        let key = hash::unique_http_hash(&record);
        if let Some(metadata) = self.store.metadata.remove_exact(&record.url, key, &path) {
            self.store.tree.delete(&metadata.full_expr_path);
        }
        self.refresh_certified_data();
        tracing::debug!(url = %record.url, "removed endpoint");
        Ok(())
    }

    /// Drop every certified exchange under `url` (in its reduced form).
    pub fn remove_all(&mut self, url: &str) {
        self.store
            .tree
            .delete(&[ASSETS_ROOT.as_bytes(), url.as_bytes()]);
        for metadata in self.store.metadata.remove_url(url) {
            self.store.tree.delete(&metadata.full_expr_path);
        }
        self.refresh_certified_data();
        tracing::debug!(url, "removed all endpoints for url");
    }

    /// Drop both certified subtrees and the whole directory.
    pub fn clear(&mut self) {
        self.store.tree.delete(&[ASSETS_ROOT.as_bytes()]);
        self.store.tree.delete(&[EXPR_PATH_ROOT.as_bytes()]);
        self.store.metadata.clear();
        self.refresh_certified_data();
        tracing::debug!("cleared all certified endpoints");
    }

    /// Every certified endpoint, in insertion order within each list
    /// (no ordering guarantee across URLs).
    pub fn endpoints(&self) -> impl Iterator<Item = &EndpointRecord> {
        self.store.metadata.endpoints()
    }

    /// The certification headers for an outgoing exchange.
    ///
    /// `body_hash` short-circuits hashing the response body when the
    /// caller already knows its digest.
    pub fn get_certificate(
        &self,
        request: &HttpRequest,
        response: &HttpResponse,
        body_hash: Option<Hash32>,
    ) -> HttpCertResult<Vec<HeaderField>> {
        if request.certificate_version == Some(2) {
            self.certificate_headers_v2(request, response, body_hash)
        } else {
            self.certificate_headers_v1(request)
        }
    }

    /// The response with certification headers appended.
    pub fn get_certified_response(
        &self,
        request: &HttpRequest,
        response: &HttpResponse,
        body_hash: Option<Hash32>,
    ) -> HttpCertResult<HttpResponse> {
        let headers = self.get_certificate(request, response, body_hash)?;
        let mut certified = response.clone();
        certified.headers.extend(headers);
        Ok(certified)
    }

    /// Certificate plus one witness revealing the given URLs (all
    /// certified URLs when `keys` is `None`): each URL's v1 leaf and
    /// every expression path recorded under it.
    pub fn get_certified_tree(&self, keys: Option<&[&str]>) -> HttpCertResult<CertifiedTree> {
        let certificate = self
            .platform
            .data_certificate()
            .ok_or(HttpCertError::NoRootCertificate)?;
        let mut paths: Vec<Vec<Vec<u8>>> = Vec::new();
        let mut reveal_url = |url: &str| {
            paths.push(vec![
                ASSETS_ROOT.as_bytes().to_vec(),
                url.as_bytes().to_vec(),
            ]);
            for path in self.store.metadata.expr_paths_for(url) {
                paths.push(path.to_vec());
            }
        };
        match keys {
            Some(keys) => {
                for url in keys.iter().copied() {
                    reveal_url(url);
                }
            }
            None => {
                let urls: Vec<String> = self.store.metadata.urls().map(str::to_string).collect();
                for url in &urls {
                    reveal_url(url.as_str());
                }
            }
        }
        let witness = self.store.tree.reveals(&paths);
        Ok(CertifiedTree {
            certificate,
            tree: encode(&witness)?,
        })
    }

    fn certificate_headers_v1(&self, request: &HttpRequest) -> HttpCertResult<Vec<HeaderField>> {
        // v1 keys the tree by the raw (undecoded) path.
        let path = uri::raw_path(&request.url);
        let certified = self.get_certified_tree(Some(&[path]))?;
        Ok(vec![(
            CERTIFICATE_HEADER.to_string(),
            format!(
                "certificate=:{}:, tree=:{}:",
                BASE64.encode(&certified.certificate),
                BASE64.encode(&certified.tree)
            ),
        )])
    }

    fn certificate_headers_v2(
        &self,
        request: &HttpRequest,
        response: &HttpResponse,
        body_hash: Option<Hash32>,
    ) -> HttpCertResult<Vec<HeaderField>> {
        let incoming = EndpointRecord {
            url: uri::reduce_url(&request.url),
            body_hash: body_hash.unwrap_or_else(|| sha256(&response.body)),
            method: request.method.clone(),
            query_params: uri::parse_query(&request.url),
            request_headers: request.headers.clone(),
            status: response.status_code,
            response_headers: response.headers.clone(),
            no_certification: false,
            no_request_certification: false,
            is_fallback_path: false,
        };
        let Some(metadata) = self.store.metadata.lookup(&incoming) else {
            tracing::trace!(url = %incoming.url, "no certified metadata matched the exchange");
            return Err(HttpCertError::NoMetadata);
        };
        let witness = self.store.tree.reveal(&metadata.full_expr_path);
        let tree = encode(&witness)?;
        let certificate = self
            .platform
            .data_certificate()
            .ok_or(HttpCertError::NoRootCertificate)?;
        Ok(vec![
            (
                CERTIFICATE_HEADER.to_string(),
                format!(
                    "certificate=:{}:, tree=:{}:, version=2, expr_path=:{}:",
                    BASE64.encode(&certificate),
                    BASE64.encode(&tree),
                    BASE64.encode(&metadata.encoded_expr_path)
                ),
            ),
            (
                CERTIFICATE_EXPRESSION_HEADER.to_string(),
                metadata.expression_text.clone(),
            ),
        ])
    }

    fn refresh_certified_data(&mut self) {
        let root = self.store.tree.root_hash();
        self.platform.set_certified_data(&root);
    }
}

fn full_expr_path(
    expr: &CompiledExpression,
    request_hash: &[u8],
    response_hash: &[u8],
) -> Vec<Vec<u8>> {
    let mut path = Vec::with_capacity(expr.segments.len() + 5);
    path.push(EXPR_PATH_ROOT.as_bytes().to_vec());
    path.extend(expr.segments.iter().map(|segment| segment.clone().into_bytes()));
    path.push(expr.wildcard.as_bytes().to_vec());
    path.push(expr.hash.to_vec());
    path.push(request_hash.to_vec());
    path.push(response_hash.to_vec());
    path
}

fn encode(witness: &HashTree) -> HttpCertResult<Vec<u8>> {
    encode_witness(witness)
        .map_err(|_| HttpCertError::InternalInvariant("cbor encoding of a witness failed"))
}
