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

//! Hex codec helpers for reading bytecode input and rendering
//! constant values.

use std::fmt::Write;
use std::num::ParseIntError;

/// A simple trait allowing something to be converted into a hex
/// string.
pub trait ToHexString {
    fn to_hex_string(&self) -> String;
}

/// A simple trait allowing something to be converted from a hex
/// string.
pub trait FromHexString {
    type Error;

    fn from_hex_string(&self) -> Result<Vec<u8>, Self::Error>;
}

impl ToHexString for [u8] {
    fn to_hex_string(&self) -> String {
        let size = 2 + (2 * self.len());
        let mut hexstr = String::with_capacity(size);
        write!(hexstr, "0x").unwrap();
        for b in self {
            write!(hexstr, "{:02x}", b).unwrap();
        }
        hexstr
    }
}

impl FromHexString for str {
    type Error = ParseIntError;

    fn from_hex_string(&self) -> Result<Vec<u8>, Self::Error> {
        let mut bytes: Vec<u8> = Vec::new();
        let slice = if self.len() > 2 && &self[0..2] == "0x" {
            &self[2..]
        } else {
            self
        };
        if (slice.len() % 2) != 0 {
            bytes.push(u8::from_str_radix(&slice[0..1], 16)?);
            for i in (1..slice.len()).step_by(2) {
                bytes.push(u8::from_str_radix(&slice[i..i + 2], 16)?);
            }
        } else {
            for i in (0..slice.len()).step_by(2) {
                bytes.push(u8::from_str_radix(&slice[i..i + 2], 16)?);
            }
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_with_0x_prefix() {
        let bytes = [0x01, 0x02, 0xff];
        assert_eq!(bytes.to_hex_string(), "0x0102ff");
    }

    #[test]
    fn decodes_with_or_without_prefix() {
        assert_eq!("0x0102ff".from_hex_string().unwrap(), vec![0x01, 0x02, 0xff]);
        assert_eq!("0102ff".from_hex_string().unwrap(), vec![0x01, 0x02, 0xff]);
    }

    #[test]
    fn decodes_odd_length() {
        assert_eq!("102ff".from_hex_string().unwrap(), vec![0x01, 0x02, 0xff]);
    }
}
