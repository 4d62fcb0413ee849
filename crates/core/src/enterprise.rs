//! Enterprise identifiers, limits and readings

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sequentially assigned enterprise id, starting at 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnterpriseId(u64);

impl EnterpriseId {
    pub const FIRST: Self = Self(0);

    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    pub const fn value(&self) -> u64 {
        self.0
    }

    /// The id assigned after this one
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for EnterpriseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for EnterpriseId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

impl From<u64> for EnterpriseId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Per-enterprise thresholds. A metric above its limit is non-compliant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    pub metric1: u64,
    pub metric2: u64,
}

impl Limits {
    pub const fn new(metric1: u64, metric2: u64) -> Self {
        Self { metric1, metric2 }
    }
}

/// A pair of metric values submitted for compliance evaluation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub metric1: u64,
    pub metric2: u64,
}

impl Reading {
    pub const fn new(metric1: u64, metric2: u64) -> Self {
        Self { metric1, metric2 }
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.metric1, self.metric2)
    }
}
