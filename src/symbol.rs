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

//! Symbolic stack entries: a value on the abstract stack is either a
//! known constant or an opaque reference to the instruction that
//! produced it.

use std::fmt;

/// A single entry on the symbolic stack.
///
/// Two entries compare equal, and order, lexicographically over
/// `(idx, label, is_constant, constant_value)` — this mirrors the
/// reference implementation's field-order comparison exactly, and lets
/// `BTreeSet`/`BTreeMap` give us deterministic path/stack ordering for
/// free.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolicValue {
    pub idx: usize,
    pub label: String,
    pub is_constant: bool,
    pub constant_value: Vec<u8>,
}

impl SymbolicValue {
    /// A fresh, non-constant value with no label.
    pub fn fresh(idx: usize) -> Self {
        SymbolicValue {
            idx,
            label: String::new(),
            is_constant: false,
            constant_value: Vec::new(),
        }
    }

    /// An `"argument"`-labelled value synthesized to fill an
    /// underflowing pop.
    pub fn argument(idx: usize) -> Self {
        SymbolicValue {
            idx,
            label: "argument".to_string(),
            is_constant: false,
            constant_value: Vec::new(),
        }
    }

    /// A fresh constant carrying the given big-endian bytes.
    pub fn constant(idx: usize, bytes: Vec<u8>) -> Self {
        SymbolicValue {
            idx,
            label: String::new(),
            is_constant: true,
            constant_value: bytes,
        }
    }

    /// Decode this value's constant bytes as a signed 64-bit integer,
    /// if it is constant and fits within 8 bytes.
    pub fn as_i64(&self) -> Option<i64> {
        if !self.is_constant || self.constant_value.len() > 8 {
            return None;
        }
        Some(decode_be_i64(&self.constant_value))
    }

    /// Decode this value's constant bytes as a non-negative offset, if
    /// it is constant, fits within 8 bytes, and is non-negative.
    pub fn as_offset(&self) -> Option<usize> {
        let v = self.as_i64()?;
        if v < 0 {
            None
        } else {
            Some(v as usize)
        }
    }
}

impl fmt::Display for SymbolicValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_constant {
            write!(f, "0x")?;
            for b in &self.constant_value {
                write!(f, "{:02x}", b)?;
            }
            Ok(())
        } else if !self.label.is_empty() {
            write!(f, "{}_{}", self.label, self.idx)
        } else {
            write!(f, "%{}", self.idx)
        }
    }
}

/// A symbolic stack, top of stack at the last position — matching the
/// layout the executor pushes/pops against.
pub type Stack = Vec<SymbolicValue>;

/// A sequence of block indices describing one way to reach a block
/// from the entry block.
pub type Path = Vec<usize>;

/// Decode a big-endian byte vector (at most 8 bytes) as a signed
/// 64-bit integer, zero-extending from the byte width actually given
/// (zero bytes decode as `0`). Only a full 8-byte vector can read as
/// negative, via natural two's-complement reinterpretation — a
/// narrower vector is never sign-extended, matching the accumulation
/// loop in the reference `getInt64FromVec`.
pub fn decode_be_i64(bytes: &[u8]) -> i64 {
    if bytes.is_empty() {
        return 0;
    }
    let mut buf = [0u8; 8];
    let start = 8 - bytes.len();
    buf[start..].copy_from_slice(bytes);
    i64::from_be_bytes(buf)
}

/// Encode a signed 64-bit integer as the shortest non-empty big-endian
/// byte sequence representing its value as an unsigned word (matching
/// the reference `getVecFromInt64` behaviour: negative values are
/// represented via their 8-byte two's-complement form, trimmed of
/// leading `0x00` bytes down to at least one byte; the high bit of the
/// remaining bytes is preserved as-is).
pub fn encode_be_minimal(v: i64) -> Vec<u8> {
    let buf = v.to_be_bytes();
    let mut start = 0;
    while start < 7 && buf[start] == 0x00 {
        start += 1;
    }
    buf[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_round_trip_positive() {
        let v = 0x03;
        let bytes = encode_be_minimal(v);
        assert_eq!(bytes, vec![0x03]);
        assert_eq!(decode_be_i64(&bytes), v);
    }

    #[test]
    fn encode_decode_round_trip_large() {
        let v = 1024;
        let bytes = encode_be_minimal(v);
        assert_eq!(decode_be_i64(&bytes), v);
    }

    #[test]
    fn encode_decode_round_trip_positive_with_high_bit() {
        // A minimal single-byte encoding whose leading (and only) byte
        // has its high bit set must still decode as positive — only a
        // full 8-byte vector reinterprets via two's complement.
        let v = 128;
        let bytes = encode_be_minimal(v);
        assert_eq!(bytes, vec![0x80]);
        assert_eq!(decode_be_i64(&bytes), v);
    }

    #[test]
    fn encode_decode_round_trip_multi_byte_with_high_bit() {
        let v = 200 * 256 + 1;
        let bytes = encode_be_minimal(v);
        assert_eq!(bytes, vec![0xc8, 0x01]);
        assert_eq!(decode_be_i64(&bytes), v);
    }

    #[test]
    fn zero_encodes_as_single_byte() {
        assert_eq!(encode_be_minimal(0), vec![0x00]);
    }

    #[test]
    fn ordering_is_lexicographic_over_fields() {
        let a = SymbolicValue::fresh(1);
        let b = SymbolicValue::fresh(2);
        assert!(a < b);
    }

    #[test]
    fn display_of_constant_is_hex() {
        let v = SymbolicValue::constant(0, vec![0x01, 0x02]);
        assert_eq!(format!("{}", v), "0x0102");
    }
}
