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

//! Known-entry-point registry: an injected selector-to-name lookup
//! consumed only at reporting time. The analyzer core never touches a
//! filesystem path — loading is the caller's responsibility.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

/// A single decoded argument slot of a known entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: String,
    pub ty: String,
}

/// A human-readable record behind a 4-byte method selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
    pub arguments: Vec<Argument>,
}

/// Lookup table from a 32-bit method selector to its known entry
/// point, if any.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: BTreeMap<u32, EntryPoint>,
}

impl Registry {
    pub fn empty() -> Self {
        Registry {
            entries: BTreeMap::new(),
        }
    }

    /// Load a registry from the line-oriented text format:
    /// `<hexHash> <name> <argc> <name_1> ... <name_argc> <type_1> ... <type_argc>`
    ///
    /// A missing file yields an empty registry rather than an error,
    /// matching the reporting contract; malformed lines are skipped.
    pub fn load(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Registry::empty()),
            Err(e) => return Err(e),
        };
        let mut entries = BTreeMap::new();
        for line in contents.lines() {
            if let Some((selector, entry)) = parse_line(line) {
                entries.insert(selector, entry);
            }
        }
        Ok(Registry { entries })
    }

    pub fn lookup(&self, selector: u32) -> Option<&EntryPoint> {
        self.entries.get(&selector)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_line(line: &str) -> Option<(u32, EntryPoint)> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let mut parts = line.split_whitespace();
    let hex = parts.next()?;
    let hex = hex.strip_prefix("0x").unwrap_or(hex);
    let selector = u32::from_str_radix(hex, 16).ok()?;
    let name = parts.next()?.to_string();
    let argc: usize = parts.next()?.parse().ok()?;
    let rest: Vec<&str> = parts.collect();
    if rest.len() != argc * 2 {
        return None;
    }
    let arguments = (0..argc)
        .map(|i| Argument {
            name: rest[i].to_string(),
            ty: rest[argc + i].to_string(),
        })
        .collect();
    Some((selector, EntryPoint { name, arguments }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_registry_has_no_matches() {
        let r = Registry::empty();
        assert!(r.lookup(0xdeadbeef).is_none());
    }

    #[test]
    fn parses_a_valid_line() {
        let (selector, entry) = parse_line("0xa9059cbb transfer 2 to amount address uint256").unwrap();
        assert_eq!(selector, 0xa9059cbb);
        assert_eq!(entry.name, "transfer");
        assert_eq!(entry.arguments.len(), 2);
        assert_eq!(entry.arguments[0].name, "to");
        assert_eq!(entry.arguments[0].ty, "address");
    }

    #[test]
    fn malformed_line_is_skipped() {
        assert!(parse_line("not enough fields").is_none());
    }

    #[test]
    fn missing_file_yields_empty_registry() {
        let r = Registry::load("/nonexistent/path/to/registry.txt").unwrap();
        assert!(r.is_empty());
    }
}
