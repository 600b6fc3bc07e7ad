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

//! The top-level analyzed model: decodes bytecode, builds its
//! control-flow graph, runs the symbolic executor to a fixpoint, and
//! recursively recovers any child contracts it constructs.

use crate::block::CFNode;
use crate::cfg;
use crate::contract;
use crate::instruction::{Decoder, Instruction};
use crate::issue::Issue;
use std::collections::BTreeMap;

/// A fully analyzed program: its bytecode, decoded instructions,
/// basic-block graph, accumulated issues, and any statically
/// recoverable child programs.
pub struct Program {
    bytecode: Vec<u8>,
    instructions: BTreeMap<usize, Instruction>,
    blocks: BTreeMap<usize, CFNode>,
    issues: Vec<Issue>,
    created_contracts: Vec<Program>,
}

impl Program {
    /// Analyze a raw byte sequence. Never fails: bytecode that decodes
    /// to nothing produces an invalid (zero-instruction) program, and
    /// every other irregularity becomes an accumulated [`Issue`]
    /// rather than an error.
    pub fn new(bytecode: Vec<u8>) -> Self {
        Self::new_at_depth(bytecode, 0, contract::DEFAULT_MAX_DEPTH)
    }

    fn new_at_depth(bytecode: Vec<u8>, depth: usize, max_depth: usize) -> Self {
        let mut decoder = Decoder::new();
        let insns = decoder.decode_all(&bytecode);
        let instructions: BTreeMap<usize, Instruction> =
            insns.into_iter().map(|i| (i.offset, i)).collect();

        let mut blocks = crate::block::segment(
            &instructions.values().cloned().collect::<Vec<_>>(),
        );

        let mut issues = cfg::build_initial_edges(&mut blocks, &instructions);

        let mut next_id = instructions
            .values()
            .flat_map(|i| i.outputs.iter().map(|o| o.idx))
            .max()
            .map(|m| m + 1)
            .unwrap_or(0);
        issues.extend(crate::executor::execute(&mut blocks, &instructions, &mut next_id));

        let mut child_issues = Vec::new();
        let child_bytes = contract::find_children(
            &blocks,
            &instructions,
            &bytecode,
            depth,
            max_depth,
            &mut child_issues,
        );
        issues.extend(child_issues);

        let created_contracts = child_bytes
            .into_iter()
            .map(|b| Program::new_at_depth(b, depth + 1, max_depth))
            .filter(|p| !p.instructions.is_empty())
            .collect();

        log::debug!(
            "analyzed {} bytes into {} instructions, {} blocks, {} issues, {} children",
            bytecode.len(),
            instructions.len(),
            blocks.len(),
            issues.len(),
            created_contracts.len()
        );

        Program {
            bytecode,
            instructions,
            blocks,
            issues,
            created_contracts,
        }
    }

    pub fn bytecode(&self) -> &[u8] {
        &self.bytecode
    }

    pub fn instructions(&self) -> &BTreeMap<usize, Instruction> {
        &self.instructions
    }

    pub fn blocks(&self) -> &BTreeMap<usize, CFNode> {
        &self.blocks
    }

    pub fn issues(&self) -> &[Issue] {
        &self.issues
    }

    pub fn created_contracts(&self) -> &[Program] {
        &self.created_contracts
    }

    /// A program with no decoded instructions is considered invalid;
    /// consumers should skip it (it cannot appear as a recovered
    /// child, see [`Program::new_at_depth`]'s filter).
    pub fn is_valid(&self) -> bool {
        !self.instructions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bytecode_is_invalid() {
        let p = Program::new(Vec::new());
        assert!(!p.is_valid());
        assert!(p.blocks().is_empty());
        assert!(p.created_contracts().is_empty());
    }

    #[test]
    fn single_stop_is_one_reachable_block() {
        let p = Program::new(vec![0x00]);
        assert!(p.is_valid());
        assert_eq!(p.blocks().len(), 1);
        assert!(p.blocks()[&0].is_reachable());
    }

    #[test]
    fn push_add_stop_folds_and_has_no_issues() {
        let p = Program::new(vec![0x60, 0x01, 0x60, 0x02, 0x01, 0x00]);
        assert!(p.issues().is_empty());
        let add = &p.instructions()[&4];
        assert!(add.outputs[0].is_constant);
    }

    #[test]
    fn invalid_jump_is_recorded_as_issue() {
        let p = Program::new(vec![0x60, 0x02, 0x56, 0x00]);
        assert_eq!(p.issues().len(), 1);
        assert_eq!(p.issues()[0].offset, 2);
    }

    #[test]
    fn recovers_a_nested_child_program() {
        let code_offset = 12u8;
        let bytes = vec![
            0x60, 0x01, 0x60, code_offset, 0x60, 0x00, 0x39, 0x60, 0x01, 0x60, 0x00, 0xf3, 0x00,
        ];
        let p = Program::new(bytes);
        assert_eq!(p.created_contracts().len(), 1);
        assert!(p.created_contracts()[0].is_valid());
    }
}
