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

//! Recovery of statically-determinable child contracts: the
//! code-copy-then-return pattern a constructor uses to deploy the
//! bytes it actually wants to leave on chain.

use crate::block::CFNode;
use crate::instruction::Instruction;
use crate::issue::Issue;
use crate::opcode;
use std::collections::BTreeMap;

pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Scan every reachable block for a `CODECOPY` with all-constant
/// operands, followed (in linear offset order, not CFG order) by the
/// first stop-category instruction. If that instruction is
/// specifically `RETURN` with constant operands, extract and return
/// the corresponding byte slice. Any other stop terminates the search
/// for that `CODECOPY` without a result.
pub fn find_children(
    blocks: &BTreeMap<usize, CFNode>,
    instructions: &BTreeMap<usize, Instruction>,
    bytecode: &[u8],
    depth: usize,
    max_depth: usize,
    issues: &mut Vec<Issue>,
) -> Vec<Vec<u8>> {
    let mut children = Vec::new();

    for node in blocks.values() {
        if !node.is_reachable() {
            continue;
        }
        for (_, insn) in instructions.range(node.start..node.end) {
            if insn.opcode.code != opcode::CODECOPY || !insn.all_operands_constant() {
                continue;
            }
            let mem_loc = match insn.operands[0].as_offset() {
                Some(v) => v,
                None => continue,
            };
            let code_offset = match insn.operands[1].as_offset() {
                Some(v) => v,
                None => continue,
            };
            let size = match insn.operands[2].as_offset() {
                Some(v) => v,
                None => continue,
            };

            if let Some(slice) = scan_for_return(instructions, insn.offset, mem_loc, code_offset, size, bytecode) {
                if depth >= max_depth {
                    issues.push(Issue::new(
                        insn.offset,
                        "child-contract recursion depth exceeded".to_string(),
                    ));
                    continue;
                }
                if !slice.is_empty() {
                    children.push(slice);
                }
            }
        }
    }

    children
}

/// Walk forward in offset order from `after`, looking for the first
/// stop-category instruction. Returns the extracted slice only if that
/// instruction is `RETURN` with constant operands.
fn scan_for_return(
    instructions: &BTreeMap<usize, Instruction>,
    after: usize,
    mem_loc: usize,
    code_offset: usize,
    size: usize,
    bytecode: &[u8],
) -> Option<Vec<u8>> {
    for (_, insn) in instructions.range(after + 1..) {
        if !insn.opcode.is_stop {
            continue;
        }
        if insn.opcode.code != opcode::RETURN {
            // Any other stop terminates the search without a result.
            return None;
        }
        if !insn.all_operands_constant() {
            return None;
        }
        let ret_loc = insn.operands[0].as_offset()?;
        let ret_size = insn.operands[1].as_offset()?;
        if ret_loc < mem_loc {
            return None;
        }
        let start = code_offset + (ret_loc - mem_loc);
        let end = (start + ret_size).min(code_offset + size).min(bytecode.len());
        let start = start.min(bytecode.len());
        if start >= end {
            return None;
        }
        return Some(bytecode[start..end].to_vec());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Decoder;

    fn analyze(bytes: &[u8]) -> (BTreeMap<usize, CFNode>, BTreeMap<usize, Instruction>) {
        let mut d = Decoder::new();
        let insns = d.decode_all(bytes);
        let blocks = crate::block::segment(&insns);
        let imap: BTreeMap<usize, Instruction> =
            insns.into_iter().map(|i| (i.offset, i)).collect();
        (blocks, imap)
    }

    #[test]
    fn codecopy_then_return_extracts_child() {
        // Child bytes live at the tail: a single STOP (0x00).
        // PUSH1 1 (size); PUSH1 <codeOffset>; PUSH1 0 (memLoc); CODECOPY;
        // PUSH1 1 (retSize); PUSH1 0 (retLoc); RETURN; <child: STOP>
        let code_offset = 12u8;
        let bytes = [
            0x60, 0x01, // size=1
            0x60, code_offset, // codeOffset
            0x60, 0x00, // memLoc=0
            0x39, // CODECOPY
            0x60, 0x01, // retSize=1
            0x60, 0x00, // retLoc=0
            0xf3, // RETURN
            0x00, // child contract bytes start here (offset 12)
        ];
        let (blocks, imap) = analyze(&bytes);
        let mut issues = Vec::new();
        let children = find_children(&blocks, &imap, &bytes, 0, DEFAULT_MAX_DEPTH, &mut issues);
        assert_eq!(children.len(), 1);
        assert_eq!(children[0], vec![0x00]);
        assert!(issues.is_empty());
    }

    #[test]
    fn codecopy_followed_by_revert_yields_no_child() {
        let bytes = [
            0x60, 0x01, 0x60, 0x00, 0x60, 0x00, 0x39, // CODECOPY
            0x60, 0x00, 0x60, 0x00, 0xfd, // REVERT
        ];
        let (blocks, imap) = analyze(&bytes);
        let mut issues = Vec::new();
        let children = find_children(&blocks, &imap, &bytes, 0, DEFAULT_MAX_DEPTH, &mut issues);
        assert!(children.is_empty());
    }

    #[test]
    fn depth_at_bound_records_issue_instead_of_child() {
        let code_offset = 12u8;
        let bytes = [
            0x60, 0x01, 0x60, code_offset, 0x60, 0x00, 0x39, 0x60, 0x01, 0x60, 0x00, 0xf3, 0x00,
        ];
        let (blocks, imap) = analyze(&bytes);
        let mut issues = Vec::new();
        let children = find_children(&blocks, &imap, &bytes, 8, 8, &mut issues);
        assert!(children.is_empty());
        assert_eq!(issues.len(), 1);
    }
}
