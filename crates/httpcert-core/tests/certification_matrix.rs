// Copyright (c) 2026 Joseph Verdicchio and EvidenceOS Contributors
// SPDX-License-Identifier: Apache-2.0

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use httpcert_core::assets::{CERTIFICATE_EXPRESSION_HEADER, CERTIFICATE_HEADER};
use httpcert_core::hash::sha256;
use httpcert_core::{
    CertifiedAssets, Endpoint, HttpCertError, HttpRequest, HttpResponse, InMemoryPlatform,
    MerkleTree,
};
use httpcert_tree::encode_witness;

fn host() -> InMemoryPlatform {
    InMemoryPlatform {
        certified_data: None,
        certificate: Some(b"host-signed-certificate".to_vec()),
    }
}

fn assets() -> CertifiedAssets<InMemoryPlatform> {
    CertifiedAssets::new(host())
}

fn request(url: &str, certificate_version: Option<u16>) -> HttpRequest {
    HttpRequest {
        method: "GET".to_string(),
        url: url.to_string(),
        headers: vec![],
        body: vec![],
        certificate_version,
    }
}

fn response(status_code: u16, body: &[u8]) -> HttpResponse {
    HttpResponse {
        status_code,
        headers: vec![],
        body: body.to_vec(),
    }
}

fn header_field<'a>(value: &'a str, name: &str) -> &'a str {
    value
        .split(", ")
        .find_map(|part| part.strip_prefix(&format!("{name}=:")))
        .and_then(|rest| rest.strip_suffix(':'))
        .expect("field present")
}

#[test]
fn minimal_get_certifies_both_tree_paths() {
    let mut assets = assets();
    assets
        .certify(Endpoint::new("/hello", Some(b"hello")))
        .expect("certify");

    let record = assets.endpoints().next().expect("one endpoint");
    assert_eq!(record.url, "/hello");
    assert_eq!(record.method, "GET");
    assert_eq!(record.status, 200);
    assert_eq!(record.body_hash, sha256(b"hello"));
    assert!(!record.no_certification && !record.no_request_certification);
    assert!(!record.is_fallback_path);

    let store = assets.store();
    assert_eq!(
        store.tree.get(&[b"http_assets".as_slice(), b"/hello"]),
        Some(sha256(b"hello").as_slice())
    );

    let metadata = store.metadata.iter().next().expect("metadata");
    let path = &metadata.full_expr_path;
    assert_eq!(path.len(), 7);
    assert_eq!(path[0], b"http_expr");
    assert_eq!(path[1], b"");
    assert_eq!(path[2], b"hello");
    assert_eq!(path[3], b"<$>");
    assert_eq!(path[4].len(), 32, "expression hash");
    assert_eq!(path[5].len(), 32, "request hash");
    assert_eq!(path[6].len(), 32, "response hash");
    assert_eq!(store.tree.get(path), Some(b"".as_slice()));
}

#[test]
fn fallback_root_with_no_certification() {
    let mut assets = assets();
    assets
        .certify(
            Endpoint::new("/", None)
                .is_fallback_path()
                .no_certification(),
        )
        .expect("certify");

    let metadata = assets.store().metadata.iter().next().expect("metadata");
    let record = &metadata.endpoint;
    assert_eq!(record.url, "");
    assert_eq!(record.body_hash, sha256(b""));

    let path = &metadata.full_expr_path;
    assert_eq!(path.len(), 6);
    assert_eq!(path[0], b"http_expr");
    assert_eq!(path[1], b"");
    assert_eq!(path[2], b"<*>");
    assert_eq!(path[3].len(), 32, "expression hash");
    assert!(path[4].is_empty(), "request hash is the empty blob");
    assert!(path[5].is_empty(), "response hash is the empty blob");

    let decoded: Vec<String> =
        serde_cbor::from_slice(&metadata.encoded_expr_path).expect("decode expr path");
    assert_eq!(decoded, vec!["http_expr", "", "<*>"]);
}

#[test]
fn query_strings_stay_out_of_the_url() {
    let mut assets = assets();
    assets
        .certify(Endpoint::new("/search?q=ic", Some(b"results")).query_param("q", "ic"))
        .expect("certify");
    let record = assets.endpoints().next().expect("endpoint");
    assert_eq!(record.url, "/search");
    assert_eq!(
        record.query_params,
        vec![("q".to_string(), "ic".to_string())]
    );
}

#[test]
fn response_only_certification_uses_its_template() {
    let mut assets = assets();
    assets
        .certify(
            Endpoint::new("/page", Some(b"<html>"))
                .query_param("ignored", "1")
                .request_header("ignored", "1")
                .response_header("content-type", "text/html")
                .no_request_certification(),
        )
        .expect("certify");

    let metadata = assets.store().metadata.iter().next().expect("metadata");
    assert!(metadata.endpoint.query_params.is_empty());
    assert!(metadata.endpoint.request_headers.is_empty());
    assert!(metadata
        .expression_text
        .contains("no_request_certification: Empty { }"));
    assert!(metadata.expression_text.contains(r#"["content-type"]"#));
    assert!(!metadata.expression_text.contains("RequestCertification"));
}

#[test]
fn percent_encoded_urls_are_stored_decoded() {
    let mut assets = assets();
    assets
        .certify(Endpoint::new("/caf%C3%A9", None))
        .expect("certify");
    let record = assets.endpoints().next().expect("endpoint");
    assert_eq!(record.url, "/café");

    // The v1 tree is keyed by the decoded form; a raw-path lookup
    // misses it. This asymmetry is inherited from the platform.
    let store = assets.store();
    assert!(store.tree.contains(&[b"http_assets".as_slice(), "/café".as_bytes()]));
    assert!(!store.tree.contains(&[b"http_assets".as_slice(), b"/caf%C3%A9"]));
}

#[test]
fn v2_roundtrip_produces_both_headers() {
    let mut assets = assets();
    assets
        .certify(
            Endpoint::new("/search?q=ic", Some(b"results"))
                .query_param("q", "ic")
                .response_header("content-type", "text/html"),
        )
        .expect("certify");

    let req = request("/search?q=ic", Some(2));
    let mut res = response(200, b"results");
    res.headers
        .push(("content-type".to_string(), "text/html".to_string()));
    // Extra uncertified headers must not spoil the match.
    res.headers.push(("x-request-id".to_string(), "123".to_string()));

    let headers = assets.get_certificate(&req, &res, None).expect("headers");
    assert_eq!(headers.len(), 2);
    assert_eq!(headers[0].0, CERTIFICATE_HEADER);
    assert_eq!(headers[1].0, CERTIFICATE_EXPRESSION_HEADER);

    let value = &headers[0].1;
    assert!(value.contains(", version=2, "));
    let certificate = BASE64
        .decode(header_field(value, "certificate"))
        .expect("certificate b64");
    assert_eq!(certificate, b"host-signed-certificate");

    let metadata = assets.store().metadata.iter().next().expect("metadata");
    let tree = BASE64.decode(header_field(value, "tree")).expect("tree b64");
    let witness = assets.store().tree.reveal(&metadata.full_expr_path);
    assert_eq!(tree, encode_witness(&witness).expect("encode"));
    assert_eq!(witness.digest(), assets.root_hash());
    assert_eq!(witness.lookup_path(&metadata.full_expr_path), Some(b"".as_slice()));

    let expr_path = BASE64
        .decode(header_field(value, "expr_path"))
        .expect("expr_path b64");
    assert_eq!(expr_path, metadata.encoded_expr_path);
    assert_eq!(headers[1].1, metadata.expression_text);

    let certified = assets
        .get_certified_response(&req, &res, None)
        .expect("response");
    assert_eq!(certified.headers.len(), res.headers.len() + 2);
    assert_eq!(certified.body, res.body);
}

#[test]
fn v2_match_is_strict_about_certified_pairs() {
    let mut assets = assets();
    assets
        .certify(
            Endpoint::new("/api", Some(b"data")).request_header("accept", "application/json"),
        )
        .expect("certify");

    let mut req = request("/api", Some(2));
    let res = response(200, b"data");
    assert_eq!(
        assets.get_certificate(&req, &res, None),
        Err(HttpCertError::NoMetadata),
        "certified header absent from the request"
    );

    req.headers
        .push(("accept".to_string(), "application/json".to_string()));
    req.headers.push(("x-extra".to_string(), "anything".to_string()));
    assert!(assets.get_certificate(&req, &res, None).is_ok());

    let wrong_body = response(200, b"other");
    assert_eq!(
        assets.get_certificate(&req, &wrong_body, None),
        Err(HttpCertError::NoMetadata),
        "body hash participates in the inner key"
    );

    // An explicit body-hash override stands in for the real body.
    let empty_body_response = response(200, b"");
    assert!(assets
        .get_certificate(&req, &empty_body_response, Some(sha256(b"data")))
        .is_ok());
}

#[test]
fn v1_header_has_certificate_and_tree() {
    let mut assets = assets();
    assets
        .certify(Endpoint::new("/hello", Some(b"hello")))
        .expect("certify");

    let headers = assets
        .get_certificate(&request("/hello", None), &response(200, b"hello"), None)
        .expect("headers");
    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0].0, CERTIFICATE_HEADER);
    let value = &headers[0].1;
    assert!(!value.contains("version=2"));

    let tree = BASE64.decode(header_field(value, "tree")).expect("tree b64");
    let witness: serde_cbor::Value = serde_cbor::from_slice(&tree).expect("witness decodes");
    drop(witness);
}

#[test]
fn overwrite_keeps_the_root_and_doubles_the_metadata() {
    let mut assets = assets();
    let endpoint = || Endpoint::new("/twice", Some(b"same"));
    assets.certify(endpoint()).expect("first");
    let root_once = assets.root_hash();
    assets.certify(endpoint()).expect("second");
    assert_eq!(assets.root_hash(), root_once);
    assert_eq!(assets.endpoints().count(), 2);

    assets.remove_all("/twice");
    assert_eq!(assets.root_hash(), MerkleTree::new().root_hash());
    assert_eq!(assets.endpoints().count(), 0);
}

#[test]
fn removal_leaves_nothing_revealable() {
    let mut assets = assets();
    assets
        .certify(Endpoint::new("/hello", Some(b"hello")))
        .expect("certify");
    assets.remove_all("/hello");

    assert_eq!(assets.endpoints().count(), 0);
    let store = assets.store();
    assert_eq!(store.tree.get(&[b"http_assets".as_slice(), b"/hello"]), None);

    // v1 still answers, but the witness no longer carries the leaf.
    let headers = assets
        .get_certificate(&request("/hello", None), &response(200, b"hello"), None)
        .expect("headers");
    let tree = BASE64
        .decode(header_field(&headers[0].1, "tree"))
        .expect("tree b64");
    assert!(!tree.is_empty());
    let witness = store
        .tree
        .reveal(&[b"http_assets".as_slice(), b"/hello"]);
    assert_eq!(witness.lookup_path(&[b"http_assets".as_slice(), b"/hello"]), None);
    assert_eq!(witness.digest(), assets.root_hash());

    // v2 has no metadata left to match.
    assert_eq!(
        assets.get_certificate(&request("/hello", Some(2)), &response(200, b"hello"), None),
        Err(HttpCertError::NoMetadata)
    );
}

#[test]
fn remove_deletes_the_exact_exchange_only() {
    let mut assets = assets();
    assets
        .certify(Endpoint::new("/doc", Some(b"v1")))
        .expect("certify v1");
    assets
        .certify(Endpoint::new("/doc", Some(b"v2")))
        .expect("certify v2");
    assert_eq!(assets.endpoints().count(), 2);

    assets
        .remove(Endpoint::new("/doc", Some(b"v1")))
        .expect("remove");
    let remaining: Vec<_> = assets.endpoints().collect();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].body_hash, sha256(b"v2"));

    // Removing an endpoint that was never certified is a no-op beyond
    // the v1 leaf.
    assets
        .remove(Endpoint::new("/doc", Some(b"never")))
        .expect("remove unknown");
    assert_eq!(assets.endpoints().count(), 1);
}

#[test]
fn clear_restores_the_empty_root() {
    let mut assets = assets();
    assets
        .certify(Endpoint::new("/a", Some(b"one")))
        .expect("certify");
    assets
        .certify(Endpoint::new("/b", Some(b"two")).is_fallback_path())
        .expect("certify");
    assets.clear();

    assert_eq!(assets.endpoints().count(), 0);
    assert_eq!(assets.root_hash(), MerkleTree::new().root_hash());
    assert_eq!(
        assets.platform().certified_data,
        Some(assets.root_hash())
    );
}

#[test]
fn certified_tree_covers_all_urls_by_default() {
    let mut assets = assets();
    assets
        .certify(Endpoint::new("/a", Some(b"one")))
        .expect("certify");
    assets
        .certify(Endpoint::new("/b", Some(b"two")))
        .expect("certify");

    let certified = assets.get_certified_tree(None).expect("tree");
    assert_eq!(certified.certificate, b"host-signed-certificate");

    let store = assets.store();
    let all_paths: Vec<Vec<Vec<u8>>> = ["/a", "/b"]
        .iter()
        .flat_map(|url| {
            let mut paths = vec![vec![b"http_assets".to_vec(), url.as_bytes().to_vec()]];
            paths.extend(
                store
                    .metadata
                    .expr_paths_for(url)
                    .map(|path| path.to_vec()),
            );
            paths
        })
        .collect();
    let witness = store.tree.reveals(&all_paths);
    assert_eq!(certified.tree, encode_witness(&witness).expect("encode"));
    assert_eq!(witness.digest(), assets.root_hash());
    assert_eq!(
        witness.lookup_path(&[b"http_assets".as_slice(), b"/a"]),
        Some(sha256(b"one").as_slice())
    );
    assert_eq!(
        witness.lookup_path(&[b"http_assets".as_slice(), b"/b"]),
        Some(sha256(b"two").as_slice())
    );
}

#[test]
fn fallback_wildcard_reaches_the_header() {
    let mut assets = assets();
    assets
        .certify(Endpoint::new("/spa", Some(b"index")).is_fallback_path())
        .expect("certify");
    let metadata = assets.store().metadata.iter().next().expect("metadata");
    let decoded: Vec<String> =
        serde_cbor::from_slice(&metadata.encoded_expr_path).expect("decode");
    assert_eq!(decoded.last().map(String::as_str), Some("<*>"));
}
