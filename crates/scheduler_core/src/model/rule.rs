//! Recurrence rule model.
//!
//! # Invariants
//! - `Daily(n)` always satisfies `1 <= n <= 400`.
//! - `Display` output parses back to the same rule.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Largest accepted day interval for `d <n>` rules.
pub const MAX_DAILY_INTERVAL: u32 = 400;

static RULE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:d\s+(\d{1,3})|y)$").expect("valid repeat rule regex"));

/// How a task repeats once it is done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RecurRule {
    /// One-off task, removed on completion. Wire form `""`.
    #[default]
    None,
    /// Every `n` days. Wire form `d <n>`.
    Daily(u32),
    /// Every calendar year on the anchor's month/day. Wire form `y`.
    Yearly,
}

impl RecurRule {
    /// Returns whether this rule schedules further occurrences.
    pub fn is_recurring(&self) -> bool {
        !matches!(self, Self::None)
    }
}

/// Rule text that is neither empty, `d <1..=400>` nor `y`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleFormatError {
    pub raw: String,
}

impl Display for RuleFormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "incorrect repeat format: `{}`", self.raw)
    }
}

impl Error for RuleFormatError {}

impl FromStr for RecurRule {
    type Err = RuleFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Ok(Self::None);
        }

        let invalid = || RuleFormatError { raw: s.to_string() };
        let captures = RULE_RE.captures(trimmed).ok_or_else(invalid)?;
        let Some(days) = captures.get(1) else {
            return Ok(Self::Yearly);
        };

        let days: u32 = days.as_str().parse().map_err(|_| invalid())?;
        if !(1..=MAX_DAILY_INTERVAL).contains(&days) {
            return Err(invalid());
        }
        Ok(Self::Daily(days))
    }
}

impl Display for RecurRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::Daily(days) => write!(f, "d {days}"),
            Self::Yearly => write!(f, "y"),
        }
    }
}

impl TryFrom<String> for RecurRule {
    type Error = RuleFormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecurRule> for String {
    fn from(value: RecurRule) -> Self {
        value.to_string()
    }
}
