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

use arbitrary::Arbitrary;
use httpcert_tree::MerkleTree;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Op {
    Put { path: Vec<Vec<u8>>, value: Vec<u8> },
    Delete { path: Vec<Vec<u8>> },
    Reveal { path: Vec<Vec<u8>> },
}

fuzz_target!(|ops: Vec<Op>| {
    let mut tree = MerkleTree::new();
    for op in ops {
        match op {
            Op::Put { path, value } => tree.put(&path, &value),
            Op::Delete { path } => tree.delete(&path),
            Op::Reveal { path } => {
                let witness = tree.reveal(&path);
                assert_eq!(witness.digest(), tree.root_hash());
                assert_eq!(witness.lookup_path(&path), tree.get(&path));
            }
        }
    }
});
