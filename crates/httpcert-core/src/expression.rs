// Copyright (c) 2026 Joseph Verdicchio and EvidenceOS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Compiles an [`EndpointRecord`] into its certification expression:
//! the `ic-certificateexpression` header text, the CBOR-encoded
//! expression path and the expression hash that anchors the exchange
//! in the tree.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::endpoint::EndpointRecord;
use crate::error::{HttpCertError, HttpCertResult};
use crate::Hash32;

pub const EXPR_PATH_ROOT: &str = "http_expr";
pub const WILDCARD_EXACT: &str = "<$>";
pub const WILDCARD_FALLBACK: &str = "<*>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledExpression {
    /// Whitespace-normalized expression text, exactly the bytes both
    /// hashed and shipped in the header.
    pub text: String,
    pub segments: Vec<String>,
    pub wildcard: &'static str,
    /// CBOR array `["http_expr", …segments, wildcard]`.
    pub encoded_path: Vec<u8>,
    pub hash: Hash32,
}

/// URL path segments; `""` has a single empty segment, and empty
/// segments between consecutive slashes are preserved.
pub fn segments(url: &str) -> Vec<String> {
    if url.is_empty() {
        vec![String::new()]
    } else {
        url.split('/').map(str::to_string).collect()
    }
}

/// Collapse runs of spaces and newlines to single spaces and trim.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_gap = false;
    for ch in text.chars() {
        if ch == ' ' || ch == '\n' {
            pending_gap = true;
            continue;
        }
        if pending_gap && !out.is_empty() {
            out.push(' ');
        }
        pending_gap = false;
        out.push(ch);
    }
    out
}

fn render(record: &EndpointRecord) -> String {
    if record.no_certification {
        return "default_certification (
  ValidationArgs {
    no_certification: Empty { }
  }
)"
        .to_string();
    }
    let response_headers: Vec<&str> = record
        .response_headers
        .iter()
        .map(|(name, _)| name.as_str())
        .collect();
    if record.no_request_certification {
        format!(
            "default_certification (
  ValidationArgs {{
    certification: Certification {{
      no_request_certification: Empty {{ }},
      response_certification: ResponseCertification {{
        certified_response_headers: ResponseHeaderList {{
          headers: {response_headers:?}
        }}
      }}
    }}
  }}
)"
        )
    } else {
        let request_headers: Vec<&str> = record
            .request_headers
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        let query_params: Vec<&str> = record
            .query_params
            .iter()
            .map(|(name, _)| name.as_str())
            .collect();
        format!(
            "default_certification (
  ValidationArgs {{
    certification: Certification {{
      request_certification: RequestCertification {{
        certified_request_headers: {request_headers:?},
        certified_query_parameters: {query_params:?}
      }},
      response_certification: ResponseCertification {{
        certified_response_headers: ResponseHeaderList {{
          headers: {response_headers:?}
        }}
      }}
    }}
  }}
)"
        )
    }
}

pub fn compile(record: &EndpointRecord) -> HttpCertResult<CompiledExpression> {
    let segments = segments(&record.url);
    let wildcard = if record.is_fallback_path {
        WILDCARD_FALLBACK
    } else {
        WILDCARD_EXACT
    };

    let mut text_path: Vec<&str> = Vec::with_capacity(segments.len() + 2);
    text_path.push(EXPR_PATH_ROOT);
    text_path.extend(segments.iter().map(String::as_str));
    text_path.push(wildcard);
    let encoded_path = encode_text_array(&text_path)?;

    let text = normalize_whitespace(&render(record));
    let hash = {
        let mut h = Sha256::new();
        h.update(text.as_bytes());
        h.finalize().into()
    };

    Ok(CompiledExpression {
        text,
        segments,
        wildcard,
        encoded_path,
        hash,
    })
}

fn encode_text_array<T: Serialize>(value: &T) -> HttpCertResult<Vec<u8>> {
    serde_cbor::to_vec(value)
        .map_err(|_| HttpCertError::InternalInvariant("cbor encoding of an expression path failed"))
}
