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

use httpcert_core::uri::{parse_query, raw_path, reduce_url};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|url: &str| {
    let reduced = reduce_url(url);
    assert!(!reduced.contains('?'));

    let raw = raw_path(url);
    assert!(!raw.contains('?'));
    assert!(url.contains(raw));

    // Query parsing never produces pairs from a query-less URL.
    let pairs = parse_query(url);
    if !url.contains('?') {
        assert!(pairs.is_empty());
    }
});
