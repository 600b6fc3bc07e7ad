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

//! The fixed opcode table: byte value, name, stack arity and the
//! constant-folding evaluator for arithmetic opcodes.

// 0s: Stop and Arithmetic Operations
pub const STOP: u8 = 0x00;
pub const ADD: u8 = 0x01;
pub const MUL: u8 = 0x02;
pub const SUB: u8 = 0x03;
pub const DIV: u8 = 0x04;
pub const SDIV: u8 = 0x05;
pub const MOD: u8 = 0x06;
pub const SMOD: u8 = 0x07;
pub const ADDMOD: u8 = 0x08;
pub const MULMOD: u8 = 0x09;
pub const EXP: u8 = 0x0a;
pub const SIGNEXTEND: u8 = 0x0b;
// 10s: Comparison & Bitwise Logic Operations
pub const LT: u8 = 0x10;
pub const GT: u8 = 0x11;
pub const SLT: u8 = 0x12;
pub const SGT: u8 = 0x13;
pub const EQ: u8 = 0x14;
pub const ISZERO: u8 = 0x15;
pub const AND: u8 = 0x16;
pub const OR: u8 = 0x17;
pub const XOR: u8 = 0x18;
pub const NOT: u8 = 0x19;
pub const BYTE: u8 = 0x1a;
pub const SHL: u8 = 0x1b;
pub const SHR: u8 = 0x1c;
pub const SAR: u8 = 0x1d;
// 20s: SHA3
pub const KECCAK256: u8 = 0x20;
// 30s: Environment Information
pub const ADDRESS: u8 = 0x30;
pub const BALANCE: u8 = 0x31;
pub const ORIGIN: u8 = 0x32;
pub const CALLER: u8 = 0x33;
pub const CALLVALUE: u8 = 0x34;
pub const CALLDATALOAD: u8 = 0x35;
pub const CALLDATASIZE: u8 = 0x36;
pub const CALLDATACOPY: u8 = 0x37;
pub const CODESIZE: u8 = 0x38;
pub const CODECOPY: u8 = 0x39;
pub const GASPRICE: u8 = 0x3a;
pub const EXTCODESIZE: u8 = 0x3b;
pub const EXTCODECOPY: u8 = 0x3c;
pub const RETURNDATASIZE: u8 = 0x3d;
pub const RETURNDATACOPY: u8 = 0x3e;
pub const EXTCODEHASH: u8 = 0x3f;
// 40s: Block Information
pub const BLOCKHASH: u8 = 0x40;
pub const COINBASE: u8 = 0x41;
pub const TIMESTAMP: u8 = 0x42;
pub const NUMBER: u8 = 0x43;
pub const DIFFICULTY: u8 = 0x44;
pub const GASLIMIT: u8 = 0x45;
pub const CHAINID: u8 = 0x46;
pub const SELFBALANCE: u8 = 0x47;
// 50s: Stack, Memory, Storage and Flow Operations
pub const POP: u8 = 0x50;
pub const MLOAD: u8 = 0x51;
pub const MSTORE: u8 = 0x52;
pub const MSTORE8: u8 = 0x53;
pub const SLOAD: u8 = 0x54;
pub const SSTORE: u8 = 0x55;
pub const JUMP: u8 = 0x56;
pub const JUMPI: u8 = 0x57;
pub const PC: u8 = 0x58;
pub const MSIZE: u8 = 0x59;
pub const GAS: u8 = 0x5a;
pub const JUMPDEST: u8 = 0x5b;
// 60s & 70s: Push Operations
pub const PUSH1: u8 = 0x60;
pub const PUSH32: u8 = 0x7f;
// 80s: Duplication Operations
pub const DUP1: u8 = 0x80;
pub const DUP16: u8 = 0x8f;
// 90s: Exchange Operations
pub const SWAP1: u8 = 0x90;
pub const SWAP16: u8 = 0x9f;
// a0s: Logging Operations
pub const LOG0: u8 = 0xa0;
pub const LOG4: u8 = 0xa4;
// f0s: System operations
pub const CREATE: u8 = 0xf0;
pub const CALL: u8 = 0xf1;
pub const CALLCODE: u8 = 0xf2;
pub const RETURN: u8 = 0xf3;
pub const DELEGATECALL: u8 = 0xf4;
pub const CREATE2: u8 = 0xf5;
pub const STATICCALL: u8 = 0xfa;
pub const REVERT: u8 = 0xfd;
pub const INVALID: u8 = 0xfe;
pub const SELFDESTRUCT: u8 = 0xff;

/// Descriptor for a single opcode: its static stack effect and, for
/// arithmetic opcodes, a `solve` evaluator used for constant folding.
#[derive(Debug, Clone, Copy)]
pub struct OpCode {
    pub code: u8,
    pub name: &'static str,
    pub immediate_len: usize,
    pub stack_in: usize,
    pub stack_out: usize,
    pub is_branch: bool,
    pub is_stop: bool,
    pub is_fall_through: bool,
    pub is_arithmetic: bool,
    pub is_stack_manipulator_only: bool,
    pub dup_num: Option<usize>,
    pub swap_num: Option<usize>,
    pub is_unknown: bool,
    pub infix: Option<&'static str>,
}

impl OpCode {
    /// Fold a constant-operand application of this opcode. Operands are
    /// given top-of-stack (index 0, i.e. pop order) first, as signed
    /// 64-bit integers. Returns `None` if this opcode has no arithmetic
    /// evaluator (folding does not apply).
    pub fn solve(&self, inputs: &[i64]) -> Option<i64> {
        let r = match self.code {
            ADD => inputs[0].wrapping_add(inputs[1]),
            MUL => inputs[0].wrapping_mul(inputs[1]),
            SUB => inputs[0].wrapping_sub(inputs[1]),
            DIV => {
                if inputs[1] == 0 {
                    0
                } else {
                    (inputs[0] as u64 / inputs[1] as u64) as i64
                }
            }
            SDIV => {
                if inputs[1] == 0 {
                    0
                } else {
                    inputs[0].wrapping_div(inputs[1])
                }
            }
            MOD => {
                if inputs[1] == 0 {
                    0
                } else {
                    (inputs[0] as u64 % inputs[1] as u64) as i64
                }
            }
            SMOD => {
                if inputs[1] == 0 {
                    0
                } else {
                    inputs[0].wrapping_rem(inputs[1])
                }
            }
            ADDMOD => {
                if inputs[2] == 0 {
                    0
                } else {
                    ((inputs[0] as i128 + inputs[1] as i128) % inputs[2] as i128) as i64
                }
            }
            MULMOD => {
                if inputs[2] == 0 {
                    0
                } else {
                    ((inputs[0] as i128 * inputs[1] as i128) % inputs[2] as i128) as i64
                }
            }
            EXP => pow_wrapping(inputs[0], inputs[1]),
            LT => ((inputs[0] as u64) < (inputs[1] as u64)) as i64,
            GT => ((inputs[0] as u64) > (inputs[1] as u64)) as i64,
            SLT => (inputs[0] < inputs[1]) as i64,
            SGT => (inputs[0] > inputs[1]) as i64,
            EQ => (inputs[0] == inputs[1]) as i64,
            ISZERO => (inputs[0] == 0) as i64,
            AND => inputs[0] & inputs[1],
            OR => inputs[0] | inputs[1],
            XOR => inputs[0] ^ inputs[1],
            NOT => !inputs[0],
            SHL => {
                if inputs[0] >= 64 {
                    0
                } else {
                    ((inputs[1] as u64) << inputs[0]) as i64
                }
            }
            SHR => {
                if inputs[0] >= 64 {
                    0
                } else {
                    ((inputs[1] as u64) >> inputs[0]) as i64
                }
            }
            SAR => {
                if inputs[0] >= 64 {
                    if inputs[1] < 0 {
                        -1
                    } else {
                        0
                    }
                } else {
                    inputs[1] >> inputs[0]
                }
            }
            _ => return None,
        };
        Some(r)
    }
}

/// Binary exponentiation, bounded to O(log n) iterations regardless of
/// the magnitude of the exponent.
fn pow_wrapping(mut base: i64, mut exp: i64) -> i64 {
    if exp < 0 {
        return 0;
    }
    let mut result: i64 = 1;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result.wrapping_mul(base);
        }
        base = base.wrapping_mul(base);
        exp >>= 1;
    }
    result
}

const UNKNOWN: OpCode = OpCode {
    code: 0,
    name: "UNKNOWN",
    immediate_len: 0,
    stack_in: 0,
    stack_out: 0,
    is_branch: false,
    is_stop: false,
    is_fall_through: true,
    is_arithmetic: false,
    is_stack_manipulator_only: false,
    dup_num: None,
    swap_num: None,
    is_unknown: true,
    infix: None,
};

const fn base(code: u8, name: &'static str, stack_in: usize, stack_out: usize) -> OpCode {
    OpCode {
        code,
        name,
        immediate_len: 0,
        stack_in,
        stack_out,
        is_branch: false,
        is_stop: false,
        is_fall_through: true,
        is_arithmetic: false,
        is_stack_manipulator_only: false,
        dup_num: None,
        swap_num: None,
        is_unknown: false,
        infix: None,
    }
}

const fn arith(code: u8, name: &'static str, stack_in: usize, infix: Option<&'static str>) -> OpCode {
    let mut op = base(code, name, stack_in, 1);
    op.is_arithmetic = true;
    op.infix = infix;
    op
}

/// Look up the descriptor for a raw opcode byte. Unrecognized bytes
/// yield the catch-all `UNKNOWN` descriptor per the fall-through,
/// zero-arity convention.
pub fn lookup(code: u8) -> OpCode {
    match code {
        STOP => {
            let mut op = base(STOP, "STOP", 0, 0);
            op.is_stop = true;
            op.is_fall_through = false;
            op
        }
        ADD => arith(ADD, "ADD", 2, Some("+")),
        MUL => arith(MUL, "MUL", 2, Some("*")),
        SUB => arith(SUB, "SUB", 2, Some("-")),
        DIV => arith(DIV, "DIV", 2, Some("/")),
        SDIV => arith(SDIV, "SDIV", 2, Some("/")),
        MOD => arith(MOD, "MOD", 2, Some("%")),
        SMOD => arith(SMOD, "SMOD", 2, Some("%")),
        ADDMOD => arith(ADDMOD, "ADDMOD", 3, None),
        MULMOD => arith(MULMOD, "MULMOD", 3, None),
        EXP => arith(EXP, "EXP", 2, Some("**")),
        SIGNEXTEND => base(SIGNEXTEND, "SIGNEXTEND", 2, 1),
        LT => arith(LT, "LT", 2, Some("<")),
        GT => arith(GT, "GT", 2, Some(">")),
        SLT => arith(SLT, "SLT", 2, Some("<")),
        SGT => arith(SGT, "SGT", 2, Some(">")),
        EQ => arith(EQ, "EQ", 2, Some("==")),
        ISZERO => arith(ISZERO, "ISZERO", 1, None),
        AND => arith(AND, "AND", 2, Some("&")),
        OR => arith(OR, "OR", 2, Some("|")),
        XOR => arith(XOR, "XOR", 2, Some("^")),
        NOT => arith(NOT, "NOT", 1, None),
        BYTE => base(BYTE, "BYTE", 2, 1),
        SHL => arith(SHL, "SHL", 2, Some("<<")),
        SHR => arith(SHR, "SHR", 2, Some(">>")),
        SAR => arith(SAR, "SAR", 2, Some(">>")),
        KECCAK256 => base(KECCAK256, "KECCAK256", 2, 1),
        ADDRESS => base(ADDRESS, "ADDRESS", 0, 1),
        BALANCE => base(BALANCE, "BALANCE", 1, 1),
        ORIGIN => base(ORIGIN, "ORIGIN", 0, 1),
        CALLER => base(CALLER, "CALLER", 0, 1),
        CALLVALUE => base(CALLVALUE, "CALLVALUE", 0, 1),
        CALLDATALOAD => base(CALLDATALOAD, "CALLDATALOAD", 1, 1),
        CALLDATASIZE => base(CALLDATASIZE, "CALLDATASIZE", 0, 1),
        CALLDATACOPY => base(CALLDATACOPY, "CALLDATACOPY", 3, 0),
        CODESIZE => base(CODESIZE, "CODESIZE", 0, 1),
        CODECOPY => base(CODECOPY, "CODECOPY", 3, 0),
        GASPRICE => base(GASPRICE, "GASPRICE", 0, 1),
        EXTCODESIZE => base(EXTCODESIZE, "EXTCODESIZE", 1, 1),
        EXTCODECOPY => base(EXTCODECOPY, "EXTCODECOPY", 4, 0),
        RETURNDATASIZE => base(RETURNDATASIZE, "RETURNDATASIZE", 0, 1),
        RETURNDATACOPY => base(RETURNDATACOPY, "RETURNDATACOPY", 3, 0),
        EXTCODEHASH => base(EXTCODEHASH, "EXTCODEHASH", 1, 1),
        BLOCKHASH => base(BLOCKHASH, "BLOCKHASH", 1, 1),
        COINBASE => base(COINBASE, "COINBASE", 0, 1),
        TIMESTAMP => base(TIMESTAMP, "TIMESTAMP", 0, 1),
        NUMBER => base(NUMBER, "NUMBER", 0, 1),
        DIFFICULTY => base(DIFFICULTY, "DIFFICULTY", 0, 1),
        GASLIMIT => base(GASLIMIT, "GASLIMIT", 0, 1),
        CHAINID => base(CHAINID, "CHAINID", 0, 1),
        SELFBALANCE => base(SELFBALANCE, "SELFBALANCE", 0, 1),
        POP => {
            let mut op = base(POP, "POP", 1, 0);
            op.is_stack_manipulator_only = true;
            op
        }
        MLOAD => base(MLOAD, "MLOAD", 1, 1),
        MSTORE => base(MSTORE, "MSTORE", 2, 0),
        MSTORE8 => base(MSTORE8, "MSTORE8", 2, 0),
        SLOAD => base(SLOAD, "SLOAD", 1, 1),
        SSTORE => base(SSTORE, "SSTORE", 2, 0),
        JUMP => {
            let mut op = base(JUMP, "JUMP", 1, 0);
            op.is_branch = true;
            op.is_fall_through = false;
            op
        }
        JUMPI => {
            let mut op = base(JUMPI, "JUMPI", 2, 0);
            op.is_branch = true;
            op
        }
        PC => base(PC, "PC", 0, 1),
        MSIZE => base(MSIZE, "MSIZE", 0, 1),
        GAS => base(GAS, "GAS", 0, 1),
        JUMPDEST => base(JUMPDEST, "JUMPDEST", 0, 0),
        c if (PUSH1..=PUSH32).contains(&c) => {
            let n = (c - PUSH1 + 1) as usize;
            let mut op = base(c, push_name(n), 0, 1);
            op.immediate_len = n;
            op
        }
        c if (DUP1..=DUP16).contains(&c) => {
            let k = (c - DUP1 + 1) as usize;
            let mut op = base(c, dup_name(k), k, k + 1);
            op.dup_num = Some(k);
            op.is_stack_manipulator_only = true;
            op
        }
        c if (SWAP1..=SWAP16).contains(&c) => {
            let k = (c - SWAP1 + 1) as usize;
            let mut op = base(c, swap_name(k), k + 1, k + 1);
            op.swap_num = Some(k);
            op.is_stack_manipulator_only = true;
            op
        }
        c if (LOG0..=LOG4).contains(&c) => {
            let n = (c - LOG0) as usize;
            base(c, log_name(n), n + 2, 0)
        }
        CREATE => base(CREATE, "CREATE", 3, 1),
        CALL => base(CALL, "CALL", 7, 1),
        CALLCODE => base(CALLCODE, "CALLCODE", 7, 1),
        RETURN => {
            let mut op = base(RETURN, "RETURN", 2, 0);
            op.is_stop = true;
            op.is_fall_through = false;
            op
        }
        DELEGATECALL => base(DELEGATECALL, "DELEGATECALL", 6, 1),
        CREATE2 => base(CREATE2, "CREATE2", 4, 1),
        STATICCALL => base(STATICCALL, "STATICCALL", 6, 1),
        REVERT => {
            let mut op = base(REVERT, "REVERT", 2, 0);
            op.is_stop = true;
            op.is_fall_through = false;
            op
        }
        INVALID => {
            let mut op = base(INVALID, "INVALID", 0, 0);
            op.is_stop = true;
            op.is_fall_through = false;
            op
        }
        SELFDESTRUCT => {
            let mut op = base(SELFDESTRUCT, "SELFDESTRUCT", 1, 0);
            op.is_stop = true;
            op.is_fall_through = false;
            op
        }
        _ => UNKNOWN,
    }
}

fn push_name(n: usize) -> &'static str {
    const NAMES: [&str; 32] = [
        "PUSH1", "PUSH2", "PUSH3", "PUSH4", "PUSH5", "PUSH6", "PUSH7", "PUSH8", "PUSH9", "PUSH10",
        "PUSH11", "PUSH12", "PUSH13", "PUSH14", "PUSH15", "PUSH16", "PUSH17", "PUSH18", "PUSH19",
        "PUSH20", "PUSH21", "PUSH22", "PUSH23", "PUSH24", "PUSH25", "PUSH26", "PUSH27", "PUSH28",
        "PUSH29", "PUSH30", "PUSH31", "PUSH32",
    ];
    NAMES[n - 1]
}

fn dup_name(k: usize) -> &'static str {
    const NAMES: [&str; 16] = [
        "DUP1", "DUP2", "DUP3", "DUP4", "DUP5", "DUP6", "DUP7", "DUP8", "DUP9", "DUP10", "DUP11",
        "DUP12", "DUP13", "DUP14", "DUP15", "DUP16",
    ];
    NAMES[k - 1]
}

fn swap_name(k: usize) -> &'static str {
    const NAMES: [&str; 16] = [
        "SWAP1", "SWAP2", "SWAP3", "SWAP4", "SWAP5", "SWAP6", "SWAP7", "SWAP8", "SWAP9", "SWAP10",
        "SWAP11", "SWAP12", "SWAP13", "SWAP14", "SWAP15", "SWAP16",
    ];
    NAMES[k - 1]
}

fn log_name(n: usize) -> &'static str {
    const NAMES: [&str; 5] = ["LOG0", "LOG1", "LOG2", "LOG3", "LOG4"];
    NAMES[n]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dup_arity_matches_index() {
        for k in 1..=16 {
            let code = DUP1 + (k - 1) as u8;
            let op = lookup(code);
            assert_eq!(op.stack_in, k);
            assert_eq!(op.stack_out, k + 1);
        }
    }

    #[test]
    fn swap_arity_matches_index() {
        for k in 1..=16 {
            let code = SWAP1 + (k - 1) as u8;
            let op = lookup(code);
            assert_eq!(op.stack_in, k + 1);
            assert_eq!(op.stack_out, k + 1);
        }
    }

    #[test]
    fn push_immediate_len_matches_index() {
        for n in 1..=32 {
            let code = PUSH1 + (n - 1) as u8;
            let op = lookup(code);
            assert_eq!(op.immediate_len, n);
            assert_eq!(op.stack_out, 1);
        }
    }

    #[test]
    fn unknown_opcode_is_zero_arity_fallthrough() {
        let op = lookup(0x0c);
        assert!(op.is_unknown);
        assert_eq!(op.stack_in, 0);
        assert_eq!(op.stack_out, 0);
        assert!(op.is_fall_through);
    }

    #[test]
    fn add_solves_constants() {
        let op = lookup(ADD);
        assert_eq!(op.solve(&[1, 2]), Some(3));
    }

    #[test]
    fn div_by_zero_folds_to_zero() {
        let op = lookup(DIV);
        assert_eq!(op.solve(&[7, 0]), Some(0));
    }

    #[test]
    fn exp_matches_repeated_multiplication() {
        let op = lookup(EXP);
        assert_eq!(op.solve(&[2, 10]), Some(1024));
    }
}
