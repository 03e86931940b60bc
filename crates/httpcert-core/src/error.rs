// Copyright (c) 2026 Joseph Verdicchio and EvidenceOS Contributors
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

pub type HttpCertResult<T> = Result<T, HttpCertError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpCertError {
    /// The host had no root certificate for us. Certified data only
    /// becomes signed one round after it is set, and the certificate is
    /// only exposed to queries.
    #[error("no root certificate found; serve certified responses from a query context, after certified data was set in an earlier update")]
    NoRootCertificate,

    #[error("no metadata found for this url")]
    NoMetadata,

    /// An internally constructed value failed to encode, or a
    /// certification invariant did not hold. Not recoverable.
    #[error("internal invariant violated ({0}); this is a bug, please report it")]
    InternalInvariant(&'static str),
}
