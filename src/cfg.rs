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

//! Initial control-flow edge construction from the linear decode pass.
//!
//! This is only the seeding step: fall-through edges are always sound,
//! but a branch target that is not yet constant in the linear pass may
//! become constant once the symbolic executor (see
//! [`crate::executor`]) walks a specific path. The executor calls
//! [`connect`] again as it discovers new constant targets.

use crate::block::CFNode;
use crate::instruction::Instruction;
use crate::issue::Issue;
use std::collections::BTreeMap;

/// Attempt to add the edge from `from_start` to whatever block the
/// last instruction of `from_start` branches or falls through to.
/// Returns any issue raised (an invalid jump target).
///
/// Deliberately separated from the simulation logic that computes
/// stack states: `blocks` must be borrowed mutably to insert an edge,
/// which would conflict with the immutable borrows a simulation pass
/// holds over sibling blocks if the two were interleaved in one
/// function.
pub fn connect(
    blocks: &mut BTreeMap<usize, CFNode>,
    instructions: &BTreeMap<usize, Instruction>,
    from_start: usize,
    branch_target: Option<usize>,
) -> Option<Issue> {
    let from_end = blocks[&from_start].end;
    let last = instructions
        .range(..from_end)
        .next_back()
        .map(|(_, i)| i)
        .filter(|i| i.offset >= from_start);

    let mut issue = None;

    if let Some(last) = last {
        if last.opcode.is_fall_through {
            if blocks.contains_key(&from_end) {
                add_edge(blocks, from_start, from_end);
            }
        }
        if last.opcode.is_branch {
            if let Some(target) = branch_target {
                match blocks.get(&target) {
                    Some(b) if b.is_jump_dest => {
                        add_edge(blocks, from_start, target);
                    }
                    Some(_) => {
                        issue = Some(Issue::new(
                            last.offset,
                            format!("invalid jump from {} to {}", from_start, target),
                        ));
                    }
                    None => {}
                }
            }
        }
    }

    issue
}

fn add_edge(blocks: &mut BTreeMap<usize, CFNode>, from: usize, to: usize) {
    blocks.get_mut(&from).unwrap().next.insert(to);
    blocks.get_mut(&to).unwrap().prev.insert(from);
}

/// Build the initial edge set using only the constant targets visible
/// after the linear decode pass (§4.1). Indirect jumps whose targets
/// are not yet constant are left unresolved; the symbolic executor
/// may resolve them later along specific paths.
pub fn build_initial_edges(
    blocks: &mut BTreeMap<usize, CFNode>,
    instructions: &BTreeMap<usize, Instruction>,
) -> Vec<Issue> {
    let starts: Vec<usize> = blocks.keys().copied().collect();
    let mut issues = Vec::new();
    for start in starts {
        let end = blocks[&start].end;
        let last = instructions
            .range(..end)
            .next_back()
            .map(|(_, i)| i)
            .filter(|i| i.offset >= start);
        let target = last.and_then(|i| {
            if i.opcode.is_branch {
                i.operands.first().and_then(|o| o.as_offset())
            } else {
                None
            }
        });
        if let Some(issue) = connect(blocks, instructions, start, target) {
            issues.push(issue);
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Decoder;

    fn build(bytes: &[u8]) -> (BTreeMap<usize, CFNode>, BTreeMap<usize, Instruction>) {
        let mut d = Decoder::new();
        let insns = d.decode_all(bytes);
        let blocks = crate::block::segment(&insns);
        let imap: BTreeMap<usize, Instruction> =
            insns.into_iter().map(|i| (i.offset, i)).collect();
        (blocks, imap)
    }

    #[test]
    fn unconditional_jump_adds_single_edge() {
        let (mut blocks, imap) = build(&[0x60, 0x04, 0x56, 0x5b, 0x00]);
        let issues = build_initial_edges(&mut blocks, &imap);
        assert!(issues.is_empty());
        assert_eq!(blocks[&0].next, [3].into_iter().collect());
        assert_eq!(blocks[&3].prev, [0].into_iter().collect());
    }

    #[test]
    fn invalid_jump_records_issue_and_no_edge() {
        // PUSH1 2; JUMP; STOP -- target 2 lands mid-immediate, not a JUMPDEST
        let (mut blocks, imap) = build(&[0x60, 0x02, 0x56, 0x00]);
        let issues = build_initial_edges(&mut blocks, &imap);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].offset, 2);
        assert!(blocks[&0].next.is_empty());
    }

    #[test]
    fn jumpi_adds_both_fallthrough_and_branch_edges() {
        let (mut blocks, imap) =
            build(&[0x60, 0x06, 0x60, 0x01, 0x57, 0x00, 0x5b, 0x00]);
        let issues = build_initial_edges(&mut blocks, &imap);
        assert!(issues.is_empty());
        assert_eq!(blocks[&0].next, [5, 6].into_iter().collect());
    }
}
