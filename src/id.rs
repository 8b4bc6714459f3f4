//! Product identifiers: the typed id, the raw-string coercion policy, and the
//! per-store generator for locally created products.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Integer product identifier. Remote ids are small (1..=20 on the demo API);
/// local ids are millisecond timestamps, so the two ranges stay apart in practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl ProductId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<u64> for ProductId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// How raw string ids (route params, form hidden fields) are turned into a [`ProductId`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdMatch {
    /// `parseInt` semantics: leading whitespace, optional `+`, leading digits; the rest is ignored.
    /// `"12abc"` resolves to 12.
    #[default]
    Lenient,
    /// The whole (trimmed) string must be ASCII digits.
    Strict,
}

impl IdMatch {
    pub fn coerce(self, raw: &str) -> Option<ProductId> {
        match self {
            IdMatch::Lenient => parse_leading_int(raw).map(ProductId),
            IdMatch::Strict => {
                let t = raw.trim();
                if t.is_empty() || !t.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                t.parse::<u64>().ok().map(ProductId)
            }
        }
    }
}

impl FromStr for IdMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" | "loose" => Ok(IdMatch::Lenient),
            "strict" | "exact" => Ok(IdMatch::Strict),
            other => Err(format!("unknown id match policy '{other}' (expected lenient|strict)")),
        }
    }
}

/// Leading-integer parse. Negative numbers and digit-less input never name a product.
pub fn parse_leading_int(raw: &str) -> Option<u64> {
    let s = raw.trim_start();
    let s = match s.as_bytes().first() {
        Some(b'+') => &s[1..],
        Some(b'-') => return None,
        _ => s,
    };
    let end = s
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(s.len());
    if end == 0 {
        return None;
    }
    // Overflowing input cannot match any stored id.
    s[..end].parse::<u64>().ok()
}

/// Anything the store can resolve to a [`ProductId`] under a given policy.
pub trait IdQuery {
    fn resolve(&self, policy: IdMatch) -> Option<ProductId>;
}

impl IdQuery for ProductId {
    fn resolve(&self, _policy: IdMatch) -> Option<ProductId> {
        Some(*self)
    }
}

impl IdQuery for u64 {
    fn resolve(&self, _policy: IdMatch) -> Option<ProductId> {
        Some(ProductId(*self))
    }
}

impl IdQuery for str {
    fn resolve(&self, policy: IdMatch) -> Option<ProductId> {
        policy.coerce(self)
    }
}

impl IdQuery for String {
    fn resolve(&self, policy: IdMatch) -> Option<ProductId> {
        policy.coerce(self)
    }
}

impl<T: IdQuery + ?Sized> IdQuery for &T {
    fn resolve(&self, policy: IdMatch) -> Option<ProductId> {
        (**self).resolve(policy)
    }
}

/// Monotonic id source for locally created products.
///
/// Each id is `max(now_millis, last + 1)`, so ids keep their timestamp shape
/// but two creations inside the same millisecond still get distinct values.
/// The store additionally skips ids that are already taken.
#[derive(Debug)]
pub struct IdGenerator {
    last: u64,
    clock: fn() -> u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::with_clock(now_millis)
    }

    pub fn with_clock(clock: fn() -> u64) -> Self {
        Self { last: 0, clock }
    }

    pub fn next_id(&mut self, taken: impl Fn(ProductId) -> bool) -> ProductId {
        let mut candidate = (self.clock)().max(self.last.saturating_add(1));
        while taken(ProductId(candidate)) {
            candidate = candidate.saturating_add(1);
        }
        self.last = candidate;
        ProductId(candidate)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
