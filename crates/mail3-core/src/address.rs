//! Address classification and display helpers.
//!
//! Every address-shape decision goes through [`classify`]; callers match on
//! [`AddressKind`] instead of sniffing strings themselves.

use serde::{Deserialize, Serialize};

use crate::constants::SUPPORTED_ALIAS_SUFFIXES;

/// Length of a raw chain address without the `0x` prefix
const PRIMITIVE_HEX_LEN: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AddressKind {
    /// Raw chain address (`0x` + 40 hex digits)
    Primitive,
    /// Human-readable name with a supported suffix (e.g. `vitalik.eth`)
    Alias,
    /// Anything the avatar service cannot resolve
    Unsupported,
}

impl AddressKind {
    /// Classify with the built-in alias suffixes.
    pub fn of(address: &str) -> Self {
        classify(address, SUPPORTED_ALIAS_SUFFIXES)
    }

    /// Primitive and alias addresses are both backed by the avatar service.
    pub fn is_supported(&self) -> bool {
        !matches!(self, AddressKind::Unsupported)
    }
}

pub fn is_primitive_address(address: &str) -> bool {
    let Some(hex) = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
    else {
        return false;
    };
    hex.len() == PRIMITIVE_HEX_LEN && hex.chars().all(|c| c.is_ascii_hexdigit())
}

fn is_alias<S: AsRef<str>>(address: &str, suffixes: &[S]) -> bool {
    let lower = address.to_ascii_lowercase();
    suffixes.iter().any(|suffix| {
        let suffix = suffix.as_ref().to_ascii_lowercase();
        match lower.strip_suffix(suffix.as_str()) {
            Some(label) => !label.is_empty() && !label.contains(char::is_whitespace),
            None => false,
        }
    })
}

/// Classify an address. Tested in order: primitive, alias, unsupported.
pub fn classify<S: AsRef<str>>(address: &str, alias_suffixes: &[S]) -> AddressKind {
    let address = address.trim();
    if is_primitive_address(address) {
        AddressKind::Primitive
    } else if is_alias(address, alias_suffixes) {
        AddressKind::Alias
    } else {
        AddressKind::Unsupported
    }
}

/// Keep `head` leading and `tail` trailing characters joined by `sep`.
/// Strings that are already short enough are returned unchanged.
pub fn truncate_middle(value: &str, head: usize, tail: usize, sep: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= head + tail {
        return value.to_string();
    }
    let start: String = chars[..head].iter().collect();
    let end: String = chars[chars.len() - tail..].iter().collect();
    format!("{}{}{}", start, sep, end)
}

/// Short form used in lists: primitive addresses are shortened, aliases kept.
pub fn truncate_address(address: &str) -> String {
    if is_primitive_address(address) {
        truncate_middle(address, 6, 4, "...")
    } else {
        address.to_string()
    }
}

/// Name shown for a writer: the profile nickname when set, otherwise a
/// shortened primitive address, otherwise the alias label before the first dot.
pub fn display_name(address: &str, nickname: Option<&str>) -> String {
    if let Some(nickname) = nickname.filter(|n| !n.is_empty()) {
        return nickname.to_string();
    }
    match AddressKind::of(address) {
        AddressKind::Primitive => truncate_middle(address, 6, 4, "_"),
        AddressKind::Alias => address
            .split('.')
            .next()
            .unwrap_or(address)
            .to_string(),
        AddressKind::Unsupported => String::new(),
    }
}
