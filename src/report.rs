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

//! Textual rendering of an analyzed [`crate::program::Program`]: the
//! disassembly report and a symbol pretty-printer for expressing a
//! symbolic value back in terms of the instructions that produced it.

use crate::hex::ToHexString;
use crate::program::Program;
use crate::registry::Registry;
use crate::symbol::SymbolicValue;
use std::fmt::Write as _;

/// Knobs controlling how much of the disassembly is rendered.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub show_stack_ops: bool,
    pub show_unreachable: bool,
}

/// Render the full disassembly report for `program`, following the
/// block-header / reachability / exits / instruction-line contract.
pub fn disassembly_report(program: &Program, registry: &Registry, opts: ReportOptions) -> String {
    let mut out = String::new();

    for node in program.blocks().values() {
        if !opts.show_unreachable && !node.is_reachable() {
            let has_unknown = program
                .instructions()
                .range(node.start..node.end)
                .any(|(_, i)| i.opcode.is_unknown);
            if has_unknown {
                writeln!(out, "/* Possible data section: */").unwrap();
                write_hex_dump(&mut out, &program.bytecode()[node.start..node.end]);
                continue;
            }
        }

        if node.is_jump_dest {
            writeln!(out, "loc_{}:", node.idx).unwrap();
        } else {
            writeln!(out, "/* Block {} */", node.idx).unwrap();
        }

        if node.is_reachable() {
            if node.prev.is_empty() {
                writeln!(out, "/* Reachable */").unwrap();
            } else {
                write!(out, "/* Reachable from").unwrap();
                for p in &node.prev {
                    write!(out, " {}", program.blocks()[p].idx).unwrap();
                }
                writeln!(out).unwrap();
            }
        } else {
            writeln!(out, "/* Unreachable */").unwrap();
        }

        if !node.next.is_empty() {
            write!(out, "/* Exits to:").unwrap();
            for n in &node.next {
                write!(out, " {}", program.blocks()[n].idx).unwrap();
            }
            writeln!(out).unwrap();
        }

        for (_, insn) in program.instructions().range(node.start..node.end) {
            if insn.opcode.is_stack_manipulator_only && !opts.show_stack_ops {
                continue;
            }
            writeln!(
                out,
                "{} (0x{:x}): {}",
                insn.offset, insn.offset, insn
            )
            .unwrap();
        }
        writeln!(out).unwrap();
    }

    let known = known_entry_points(program, registry);
    if !known.is_empty() {
        writeln!(out, "/* Known entry points: */").unwrap();
        for (selector, name) in known {
            writeln!(out, "0x{:08x} {}", selector, name).unwrap();
        }
    }

    out
}

fn write_hex_dump(out: &mut String, bytes: &[u8]) {
    for chunk in bytes.chunks(16) {
        writeln!(out, "{}", chunk.to_hex_string()).unwrap();
    }
}

/// Scan the program's top-level instructions for a four-byte constant
/// compared via `EQ` and look each one up in `registry`. Produces
/// nothing when the registry is empty.
fn known_entry_points(program: &Program, registry: &Registry) -> Vec<(u32, String)> {
    let mut out = Vec::new();
    if registry.is_empty() {
        return out;
    }
    for (_, insn) in program.instructions() {
        if insn.opcode.name != "EQ" {
            continue;
        }
        for operand in &insn.operands {
            if operand.is_constant && operand.constant_value.len() <= 4 {
                let selector = crate::symbol::decode_be_i64(&operand.constant_value) as u32;
                if let Some(entry) = registry.lookup(selector) {
                    out.push((selector, entry.name.clone()));
                }
            }
        }
    }
    out
}

/// Render a symbolic value as an expression, recursively resolving
/// non-constant operands back to the instruction that produced them.
/// Recursion is bounded defensively: dup/swap rewiring can reintroduce
/// older identifiers, so the symbol graph is a DAG in the common case
/// but not provably acyclic under every rewiring sequence.
pub fn render_symbol(program: &Program, value: &SymbolicValue) -> String {
    render_symbol_bounded(program, value, 64)
}

fn render_symbol_bounded(program: &Program, value: &SymbolicValue, depth: usize) -> String {
    if value.is_constant || !value.label.is_empty() || depth == 0 {
        return format!("{}", value);
    }
    let defining = program
        .instructions()
        .values()
        .find(|i| i.outputs.iter().any(|o| o.idx == value.idx));
    let insn = match defining {
        Some(i) => i,
        None => return format!("{}", value),
    };
    let rendered: Vec<String> = insn
        .operands
        .iter()
        .map(|o| render_symbol_bounded(program, o, depth - 1))
        .collect();
    if let Some(infix) = insn.opcode.infix {
        if rendered.len() == 2 {
            return format!("({} {} {})", rendered[0], infix, rendered[1]);
        }
    }
    format!("{}({})", insn.opcode.name, rendered.join(", "))
}
