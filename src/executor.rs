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

//! The path-sensitive symbolic stack executor: a worklist fixpoint
//! over `(block, predecessor)` pairs that computes every reachable
//! entry/exit stack state and discovers the control-flow edges that
//! only become visible once a jump target's operand is known to be
//! constant along a specific path.
//!
//! Instructions are never mutated here. Each visit simulates a block
//! against a local copy of the entry stack; the persisted
//! [`crate::instruction::Instruction`] records keep whatever
//! operands/outputs the initial linear decode pass (§4.1) assigned
//! them. This is a deliberate divergence from literally re-deriving
//! per-path operand identities: see the module-level discussion in
//! `DESIGN.md` under "stable symbolic identifiers".

use crate::block::CFNode;
use crate::cfg;
use crate::instruction::Instruction;
use crate::issue::Issue;
use crate::opcode;
use crate::symbol::{Path, SymbolicValue, Stack};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Cached result of simulating one block against one distinct entry
/// stack: the exit stack produced, and any newly discovered edge
/// target.
struct SimResult {
    exit: Stack,
    branch_target: Option<(usize, Option<Issue>)>,
}

/// Drives the fixpoint over every reachable `(block, predecessor)`
/// pair, mutating `blocks`' `entry_states`/`exit_states` and adding
/// edges as indirect jump targets resolve to constants along specific
/// paths. Returns the issues raised along the way (invalid jump
/// targets discovered mid-simulation).
pub fn execute(
    blocks: &mut BTreeMap<usize, CFNode>,
    instructions: &BTreeMap<usize, Instruction>,
    next_id: &mut usize,
) -> Vec<Issue> {
    let mut issues = Vec::new();
    if blocks.is_empty() {
        return issues;
    }

    // seen (block, predecessor) pairs; `None` predecessor models the
    // entry block's synthetic seed.
    let mut seen: BTreeSet<(usize, Option<usize>)> = BTreeSet::new();
    let mut worklist: VecDeque<(usize, Option<usize>)> = VecDeque::new();

    let entry_start = *blocks.keys().next().unwrap();
    worklist.push_back((entry_start, None));

    // Per-block cache of already-simulated entry stacks, so each
    // distinct entry stack is simulated exactly once regardless of how
    // many times it is rediscovered from different predecessors.
    let mut simulated: BTreeMap<usize, BTreeMap<Stack, SimResult>> = BTreeMap::new();

    while let Some((block_start, pred)) = worklist.pop_back() {
        if !seen.insert((block_start, pred)) {
            continue;
        }

        // Step 1: compute newly visible entry states for this block.
        let new_entries: Vec<(Stack, BTreeSet<Path>)> = if let Some(pred_start) = pred {
            let pred_node = &blocks[&pred_start];
            pred_node
                .exit_states
                .iter()
                .map(|(stack, paths)| {
                    let extended: BTreeSet<Path> = paths
                        .iter()
                        .map(|p| {
                            let mut np = p.clone();
                            np.push(blocks[&pred_start].idx);
                            np
                        })
                        .collect();
                    (stack.clone(), extended)
                })
                .collect()
        } else {
            vec![(Stack::new(), BTreeSet::from([Path::new()]))]
        };

        for (stack, paths) in new_entries {
            let entry = blocks.get_mut(&block_start).unwrap();
            entry
                .entry_states
                .entry(stack.clone())
                .or_default()
                .extend(paths.clone());
        }

        // Step 2: simulate every entry stack not yet cached for this
        // block.
        let entry_stacks: Vec<Stack> = blocks[&block_start].entry_states.keys().cloned().collect();
        let block_cache = simulated.entry(block_start).or_default();
        for stack in &entry_stacks {
            if block_cache.contains_key(stack) {
                continue;
            }
            let result = simulate_one(blocks, instructions, block_start, stack, next_id);
            block_cache.insert(stack.clone(), result);
        }

        // Step 3: record exit states and wire up any newly discovered
        // constant branch target.
        let mut newly_enqueued = Vec::new();
        {
            let paths_by_stack: BTreeMap<Stack, BTreeSet<Path>> =
                blocks[&block_start].entry_states.clone();
            let block_cache = &simulated[&block_start];
            let node = blocks.get_mut(&block_start).unwrap();
            for (stack, paths) in &paths_by_stack {
                let result = &block_cache[stack];
                node.exit_states
                    .entry(result.exit.clone())
                    .or_default()
                    .extend(paths.clone());
            }
        }

        for stack in &entry_stacks {
            let result = &simulated[&block_start][stack];
            if let Some((target, issue)) = &result.branch_target {
                if let Some(issue) = issue {
                    issues.push(issue.clone());
                } else {
                    cfg::connect(blocks, instructions, block_start, Some(*target));
                }
            }
        }

        for n in blocks[&block_start].next.iter().copied() {
            newly_enqueued.push((n, Some(block_start)));
        }
        for pair in newly_enqueued {
            if !seen.contains(&pair) {
                worklist.push_back(pair);
            }
        }
    }

    issues
}

/// Simulate a single block's instructions starting from a copy of
/// `entry`, threading synthesized `"argument"` fillers for any
/// underflowing pop (with a counter local to this simulation) and
/// minting fresh symbol ids from the shared, never-resetting `next_id`
/// counter for every pushed output.
fn simulate_one(
    blocks: &BTreeMap<usize, CFNode>,
    instructions: &BTreeMap<usize, Instruction>,
    block_start: usize,
    entry: &Stack,
    next_id: &mut usize,
) -> SimResult {
    let node = &blocks[&block_start];
    let mut stack = entry.clone();
    let mut arg_counter = 0usize;
    let mut branch_target = None;

    for (_, insn) in instructions.range(block_start..node.end) {
        let mut operands = Vec::with_capacity(insn.opcode.stack_in);
        for _ in 0..insn.opcode.stack_in {
            let v = stack.pop().unwrap_or_else(|| {
                let v = SymbolicValue::argument(arg_counter);
                arg_counter += 1;
                v
            });
            operands.push(v);
        }

        let mut outputs = Vec::with_capacity(insn.opcode.stack_out);
        for _ in 0..insn.opcode.stack_out {
            if insn.opcode.immediate_len > 0 && insn.opcode.stack_out == 1 && outputs.is_empty() {
                let id = *next_id;
                *next_id += 1;
                outputs.push(SymbolicValue::constant(id, insn.immediate.clone()));
            } else {
                let id = *next_id;
                *next_id += 1;
                outputs.push(SymbolicValue::fresh(id));
            }
        }

        let mut sim = Instruction {
            offset: insn.offset,
            opcode: insn.opcode,
            immediate: insn.immediate.clone(),
            operands,
            outputs,
        };
        sim.simplify(&mut || {
            let id = *next_id;
            *next_id += 1;
            id
        });

        if sim.opcode.is_branch {
            if let Some(target) = sim.operands.first().and_then(|o| o.as_offset()) {
                match blocks.get(&target) {
                    Some(b) if b.is_jump_dest => {
                        branch_target = Some((target, None));
                    }
                    Some(_) => {
                        branch_target = Some((
                            target,
                            Some(Issue::new(
                                sim.offset,
                                format!("invalid jump from {} to {}", block_start, target),
                            )),
                        ));
                    }
                    None => {}
                }
            }
        }

        for o in sim.outputs.iter().rev() {
            stack.push(o.clone());
        }
    }

    SimResult {
        exit: stack,
        branch_target,
    }
}

/// True if the given opcode byte is a stop-category terminator.
pub fn is_stop_code(code: u8) -> bool {
    opcode::lookup(code).is_stop
}
