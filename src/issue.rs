// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//    http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Non-fatal analysis diagnostics.

use std::fmt;

/// A single accumulated, non-fatal diagnostic raised during analysis —
/// an invalid jump target, a child-contract extraction that could not
/// be completed, a recursion bound being hit. These never abort
/// analysis; they are collected and surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub offset: usize,
    pub message: String,
}

impl Issue {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Issue {
            offset,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.offset, self.message)
    }
}
