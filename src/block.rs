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

//! Basic blocks and their segmentation from a decoded instruction
//! stream.

use crate::instruction::Instruction;
use crate::symbol::{Path, Stack};
use std::collections::{BTreeMap, BTreeSet};

/// A maximal straight-line run of instructions, identified by its
/// starting offset. Blocks are held in an arena (`Program::blocks`,
/// keyed by `start`) and reference each other by that same key — an
/// index-based adjacency list, not shared pointers, so the block graph
/// can be cyclic without ever forming a reference cycle.
#[derive(Debug, Clone)]
pub struct CFNode {
    pub idx: usize,
    pub start: usize,
    pub end: usize,
    pub is_jump_dest: bool,
    pub next: BTreeSet<usize>,
    pub prev: BTreeSet<usize>,
    pub entry_states: BTreeMap<Stack, BTreeSet<Path>>,
    pub exit_states: BTreeMap<Stack, BTreeSet<Path>>,
}

impl CFNode {
    fn new(idx: usize, start: usize) -> Self {
        CFNode {
            idx,
            start,
            end: start,
            is_jump_dest: false,
            next: BTreeSet::new(),
            prev: BTreeSet::new(),
            entry_states: BTreeMap::new(),
            exit_states: BTreeMap::new(),
        }
    }

    /// A block is reachable if it is the entry block, or some other
    /// block has an edge into it.
    pub fn is_reachable(&self) -> bool {
        self.idx == 0 || !self.prev.is_empty()
    }
}

/// Partition a decoded, offset-ordered instruction stream into basic
/// blocks.
///
/// Rules: a block closes after a branch or a stop instruction; a
/// `JUMPDEST` that is not itself the first instruction of the current
/// block closes the preceding block (without including the
/// `JUMPDEST`) and starts a fresh, `is_jump_dest` block at that offset.
pub fn segment(instructions: &[Instruction]) -> BTreeMap<usize, CFNode> {
    let mut blocks = BTreeMap::new();
    if instructions.is_empty() {
        return blocks;
    }

    let mut idx = 0usize;
    let mut cur_start = instructions[0].offset;
    let mut cur_is_jumpdest = instructions[0].opcode.code == crate::opcode::JUMPDEST;
    let mut cur_end = cur_start;
    let mut empty = true;

    let mut i = 0;
    while i < instructions.len() {
        let insn = &instructions[i];
        let is_jumpdest = insn.opcode.code == crate::opcode::JUMPDEST;

        if is_jumpdest && !empty {
            // Close the current block before this JUMPDEST.
            blocks.insert(
                cur_start,
                finish(idx, cur_start, cur_end, cur_is_jumpdest),
            );
            idx += 1;
            cur_start = insn.offset;
            cur_is_jumpdest = true;
            cur_end = cur_start;
            empty = true;
        }

        cur_end = insn.offset + insn.length();
        empty = false;

        if !insn.opcode.is_fall_through || insn.opcode.is_branch {
            blocks.insert(
                cur_start,
                finish(idx, cur_start, cur_end, cur_is_jumpdest),
            );
            idx += 1;
            i += 1;
            empty = true;
            if i < instructions.len() {
                cur_start = instructions[i].offset;
                cur_is_jumpdest = instructions[i].opcode.code == crate::opcode::JUMPDEST;
                cur_end = cur_start;
            }
            continue;
        }

        i += 1;
    }

    if !empty {
        blocks.insert(cur_start, finish(idx, cur_start, cur_end, cur_is_jumpdest));
    }

    blocks
}

fn finish(idx: usize, start: usize, end: usize, is_jump_dest: bool) -> CFNode {
    let mut n = CFNode::new(idx, start);
    n.end = end;
    n.is_jump_dest = is_jump_dest;
    n
}
