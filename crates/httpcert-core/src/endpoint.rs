// Copyright (c) 2026 Joseph Verdicchio and EvidenceOS Contributors
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

use crate::hash::{sha256, sha256_chunks};
use crate::uri;
use crate::Hash32;

/// The frozen, normalized description of one certified HTTP exchange.
///
/// Produced by [`Endpoint::build`]; field contents already reflect the
/// certification flags (excluded fields are empty).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointRecord {
    pub url: String,
    pub body_hash: Hash32,
    pub method: String,
    pub query_params: Vec<(String, String)>,
    pub request_headers: Vec<(String, String)>,
    pub status: u16,
    pub response_headers: Vec<(String, String)>,
    pub no_certification: bool,
    pub no_request_certification: bool,
    pub is_fallback_path: bool,
}

/// Fluent, by-value builder for a certified endpoint.
///
/// The URL is reduced on entry (query stripped, one trailing slash
/// removed, percent-decoded). Everything else defaults to a plain
/// `GET` returning `200` with an empty body.
#[derive(Debug, Clone)]
pub struct Endpoint {
    url: String,
    body_hash: Hash32,
    method: String,
    status: u16,
    query_params: Vec<(String, String)>,
    request_headers: Vec<(String, String)>,
    response_headers: Vec<(String, String)>,
    no_certification: bool,
    no_request_certification: bool,
    is_fallback_path: bool,
}

impl Endpoint {
    pub fn new(url: &str, body: Option<&[u8]>) -> Self {
        Self {
            url: uri::reduce_url(url),
            body_hash: sha256(body.unwrap_or_default()),
            method: "GET".to_string(),
            status: 200,
            query_params: Vec::new(),
            request_headers: Vec::new(),
            response_headers: Vec::new(),
            no_certification: false,
            no_request_certification: false,
            is_fallback_path: false,
        }
    }

    /// Replace the body, recomputing its hash.
    pub fn body(mut self, body: &[u8]) -> Self {
        self.body_hash = sha256(body);
        self
    }

    /// Use an externally computed body hash (the caller stores only
    /// the digest, not the bytes).
    pub fn hash(mut self, body_hash: Hash32) -> Self {
        self.body_hash = body_hash;
        self
    }

    /// Hash a body assembled from chunks, without concatenating them.
    pub fn chunks<C: AsRef<[u8]>>(mut self, chunks: &[C]) -> Self {
        self.body_hash = sha256_chunks(chunks);
        self
    }

    /// Verb of the exchange; stored opaquely, callers pass it uppercase.
    pub fn method(mut self, method: &str) -> Self {
        self.method = method.to_string();
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    pub fn request_header(mut self, name: &str, value: &str) -> Self {
        self.request_headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn request_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.request_headers.extend(headers);
        self
    }

    pub fn query_param(mut self, name: &str, value: &str) -> Self {
        self.query_params.push((name.to_string(), value.to_string()));
        self
    }

    pub fn query_params(mut self, params: Vec<(String, String)>) -> Self {
        self.query_params.extend(params);
        self
    }

    pub fn response_header(mut self, name: &str, value: &str) -> Self {
        self.response_headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn response_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.response_headers.extend(headers);
        self
    }

    /// Certify this endpoint as the fallback for every descendant URL
    /// without a more specific entry.
    pub fn is_fallback_path(mut self) -> Self {
        self.is_fallback_path = true;
        self
    }

    /// Certify the response only; the request side stays open.
    pub fn no_request_certification(mut self) -> Self {
        self.no_request_certification = true;
        self
    }

    /// Opt out of certification entirely (implies
    /// [`Endpoint::no_request_certification`]).
    pub fn no_certification(mut self) -> Self {
        self.no_certification = true;
        self
    }

    pub fn build(self) -> EndpointRecord {
        let no_certification = self.no_certification;
        let no_request_certification = self.no_request_certification || no_certification;
        EndpointRecord {
            url: self.url,
            body_hash: self.body_hash,
            method: self.method,
            query_params: if no_request_certification {
                Vec::new()
            } else {
                self.query_params
            },
            request_headers: if no_request_certification {
                Vec::new()
            } else {
                self.request_headers
            },
            status: self.status,
            response_headers: if no_certification {
                Vec::new()
            } else {
                self.response_headers
            },
            no_certification,
            no_request_certification,
            is_fallback_path: self.is_fallback_path,
        }
    }
}
