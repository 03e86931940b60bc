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
#![no_main]

use httpcert_core::{CertifiedAssets, Endpoint, HttpRequest, HttpResponse, InMemoryPlatform};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: (&str, Vec<u8>, u16, bool)| {
    let (url, body, status, fallback) = input;

    let mut platform = InMemoryPlatform::default();
    platform.certificate = Some(b"certificate".to_vec());
    let mut assets = CertifiedAssets::new(platform);

    let mut endpoint = Endpoint::new(url, Some(&body)).status(status);
    if fallback {
        endpoint = endpoint.is_fallback_path();
    }
    if assets.certify(endpoint).is_err() {
        return;
    }
    assert_eq!(
        assets.platform().certified_data,
        Some(assets.root_hash())
    );

    let request = HttpRequest {
        method: "GET".to_string(),
        url: url.to_string(),
        headers: vec![],
        body: vec![],
        certificate_version: Some(2),
    };
    let response = HttpResponse {
        status_code: status,
        headers: vec![],
        body,
    };
    // Serving the exchange that was just certified must always match.
    let headers = assets
        .get_certificate(&request, &response, None)
        .unwrap_or_else(|e| panic!("certified exchange failed to match: {e}"));
    assert_eq!(headers.len(), 2);
});
