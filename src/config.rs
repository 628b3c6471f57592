//! Environment configuration.

use std::num::NonZeroU64;

/// Environment variable holding the Zopfli iteration count.
pub const ITERATIONS_VAR: &str = "TEXBZ_NUMITER";
/// Older name for [`ITERATIONS_VAR`], read when the new one is unset.
pub const LEGACY_ITERATIONS_VAR: &str = "HNH_NUMITER";
pub const DEFAULT_ITERATIONS: NonZeroU64 = NonZeroU64::MIN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Zopfli iterations per block.
    pub iterations: NonZeroU64,
}

impl Default for Options {
    fn default() -> Self {
        Self { iterations: DEFAULT_ITERATIONS }
    }
}

impl Options {
    /// Absent or unparsable values fall back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`Options::from_env`] over an arbitrary variable source. The
    /// first variable that is set decides, even if it does not parse.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            iterations: lookup(ITERATIONS_VAR)
                .or_else(|| lookup(LEGACY_ITERATIONS_VAR))
                .and_then(|s| parse_iterations(&s))
                .unwrap_or(DEFAULT_ITERATIONS),
        }
    }
}

/// Parse a positive iteration count.
///
/// Accepts the same spellings as `strtoul(s, _, 0)`: decimal, `0x` hex and
/// leading-zero octal, after optional leading whitespace and `+`. Anything
/// left over after the digits, or a value of zero, is rejected.
pub fn parse_iterations(s: &str) -> Option<NonZeroU64> {
    let s = s.trim_start();
    let s = s.strip_prefix('+').unwrap_or(s);
    let value = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        digits(hex, 16)?
    } else if s.len() > 1 && s.starts_with('0') {
        digits(&s[1..], 8)?
    } else {
        digits(s, 10)?
    };
    NonZeroU64::new(value)
}

/// `from_str_radix` minus its tolerance for a leading sign.
fn digits(s: &str, radix: u32) -> Option<u64> {
    if s.is_empty() || !s.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    u64::from_str_radix(s, radix).ok()
}
