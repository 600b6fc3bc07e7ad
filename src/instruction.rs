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

//! Decoded instructions: one record per opcode occurrence, carrying
//! the operands it pops and the outputs it pushes.

use crate::opcode::{self, OpCode};
use crate::symbol::SymbolicValue;
use std::fmt;

/// A single decoded instruction.
///
/// `operands` are listed in pop order (index 0 is the item that was on
/// top of the stack at the moment this instruction executed).
/// `outputs` are listed in push order (index 0 becomes the new top).
///
/// Once decoded, an instruction is immutable: the symbolic executor
/// (see [`crate::executor`]) never mutates a persisted record to
/// explore an alternate path. Per-path operand/output values live only
/// in the executor's local simulation state.
#[derive(Debug, Clone)]
pub struct Instruction {
    pub offset: usize,
    pub opcode: OpCode,
    pub immediate: Vec<u8>,
    pub operands: Vec<SymbolicValue>,
    pub outputs: Vec<SymbolicValue>,
}

impl Instruction {
    pub fn new(offset: usize, opcode: OpCode, immediate: Vec<u8>) -> Self {
        Instruction {
            offset,
            opcode,
            immediate,
            operands: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Total byte length occupied by this instruction (opcode byte plus
    /// immediate data).
    pub fn length(&self) -> usize {
        1 + self.immediate.len()
    }

    pub fn all_operands_constant(&self) -> bool {
        self.operands.iter().all(|o| o.is_constant)
    }

    fn all_operands_as_i64(&self) -> Option<Vec<i64>> {
        let mut out = Vec::with_capacity(self.operands.len());
        for o in &self.operands {
            out.push(o.as_i64()?);
        }
        Some(out)
    }

    /// Apply local simplification in place: dup/swap identity rewiring
    /// and, where every operand decodes as a constant signed 64-bit
    /// integer, constant folding of the single output.
    ///
    /// `next_id` is called to mint a fresh symbol index whenever a new
    /// constant output value must replace a previously-assigned
    /// symbolic one.
    pub fn simplify(&mut self, next_id: &mut impl FnMut() -> usize) {
        if let Some(k) = self.opcode.dup_num {
            // operands[0..k] are the top k items (0 = original top);
            // outputs mirror operands, plus a duplicate of the deepest
            // popped item (operand k-1) pushed as the new top.
            let dup = self.operands[k - 1].clone();
            self.outputs = vec![dup];
            self.outputs.extend(self.operands.iter().cloned());
            return;
        }
        if let Some(k) = self.opcode.swap_num {
            // operands[0] and operands[k] trade places; everything
            // else mirrors the input order.
            let mut outs = self.operands.clone();
            outs.swap(0, k);
            self.outputs = outs;
            return;
        }
        if self.opcode.is_arithmetic && self.all_operands_constant() {
            if let Some(inputs) = self.all_operands_as_i64() {
                if let Some(result) = self.opcode.solve(&inputs) {
                    let bytes = crate::symbol::encode_be_minimal(result);
                    let idx = next_id();
                    self.outputs = vec![SymbolicValue::constant(idx, bytes)];
                }
            }
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.outputs.is_empty() && self.operands.is_empty() {
            write!(f, "{}", self.opcode.name)
        } else {
            write!(f, "(")?;
            for (i, o) in self.outputs.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", o)?;
            }
            write!(f, ") := {}(", self.opcode.name)?;
            for (i, o) in self.operands.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", o)?;
            }
            write!(f, ")")
        }
    }
}

/// Decodes a flat byte sequence into an offset-ordered instruction
/// stream, synthesizing `"argument"` entries for any pop that
/// underflows the scratch stack accumulated so far, and assigning a
/// program-wide fresh symbolic id to every pushed output.
///
/// The underflow counter resets at every `JUMPDEST`, since a jump
/// destination may be reached with an a-priori unknown stack shape;
/// the global output-id counter never resets.
pub struct Decoder {
    next_id: usize,
    next_arg: usize,
}

impl Decoder {
    pub fn new() -> Self {
        Decoder {
            next_id: 0,
            next_arg: 0,
        }
    }

    pub fn fresh_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Linearly decode the whole byte sequence, returning instructions
    /// keyed by offset in ascending order. This is the approximating
    /// first pass described in the module notes: it seeds the initial
    /// control-flow graph and is superseded, edge by edge, by the
    /// symbolic executor.
    pub fn decode_all(&mut self, bytecode: &[u8]) -> Vec<Instruction> {
        let mut out = Vec::new();
        let mut scratch: Vec<SymbolicValue> = Vec::new();
        let mut p = 0usize;
        while p < bytecode.len() {
            let code = bytecode[p];
            let desc = opcode::lookup(code);
            if code == opcode::JUMPDEST {
                self.next_arg = 0;
            }
            let imm_len = desc.immediate_len.min(bytecode.len() - p - 1);
            let immediate = bytecode[p + 1..p + 1 + imm_len].to_vec();
            let mut insn = Instruction::new(p, desc, immediate);

            let mut operands = Vec::with_capacity(desc.stack_in);
            for _ in 0..desc.stack_in {
                let v = scratch.pop().unwrap_or_else(|| {
                    let id = self.next_arg;
                    self.next_arg += 1;
                    SymbolicValue::argument(id)
                });
                operands.push(v);
            }
            insn.operands = operands;

            let mut outputs = Vec::with_capacity(desc.stack_out);
            for _ in 0..desc.stack_out {
                if desc.immediate_len > 0 && desc.stack_out == 1 && outputs.is_empty() {
                    // PUSH_k: the sole output carries the immediate as
                    // a constant.
                    let id = self.fresh_id();
                    outputs.push(SymbolicValue::constant(id, insn.immediate.clone()));
                } else {
                    let id = self.fresh_id();
                    outputs.push(SymbolicValue::fresh(id));
                }
            }
            insn.outputs = outputs;

            insn.simplify(&mut || {
                let id = self.next_id;
                self.next_id += 1;
                id
            });

            // Push outputs back onto the scratch stack in push order
            // (index 0 ends up on top).
            for o in insn.outputs.iter().rev() {
                scratch.push(o.clone());
            }

            p += insn.length();
            out.push(insn);
        }
        out
    }
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_add_stop_folds_to_constant() {
        let bytes = [0x60, 0x01, 0x60, 0x02, 0x01, 0x00];
        let mut d = Decoder::new();
        let insns = d.decode_all(&bytes);
        assert_eq!(insns.len(), 4);
        let add = &insns[2];
        assert_eq!(add.opcode.name, "ADD");
        assert_eq!(add.outputs.len(), 1);
        assert!(add.outputs[0].is_constant);
        assert_eq!(add.outputs[0].constant_value, vec![0x03]);
    }

    #[test]
    fn underflowing_pop_synthesizes_argument() {
        let bytes = [0x01, 0x00]; // ADD with no prior pushes, then STOP
        let mut d = Decoder::new();
        let insns = d.decode_all(&bytes);
        let add = &insns[0];
        assert_eq!(add.operands.len(), 2);
        assert!(add.operands.iter().all(|o| o.label == "argument"));
    }

    #[test]
    fn dup_preserves_deep_identity() {
        // PUSH1 1; PUSH1 2; DUP2; STOP
        let bytes = [0x60, 0x01, 0x60, 0x02, 0x81, 0x00];
        let mut d = Decoder::new();
        let insns = d.decode_all(&bytes);
        let dup = &insns[2];
        assert_eq!(dup.opcode.name, "DUP2");
        assert_eq!(dup.operands.len(), 2);
        assert_eq!(dup.outputs[0].idx, dup.operands[1].idx);
    }

    #[test]
    fn swap_exchanges_top_and_kth() {
        // PUSH1 1; PUSH1 2; SWAP1; STOP
        let bytes = [0x60, 0x01, 0x60, 0x02, 0x90, 0x00];
        let mut d = Decoder::new();
        let insns = d.decode_all(&bytes);
        let swap = &insns[2];
        assert_eq!(swap.outputs[0].idx, swap.operands[1].idx);
        assert_eq!(swap.outputs[1].idx, swap.operands[0].idx);
    }
}
