// SPDX-License-Identifier: MIT

//! noa-core: value types shared by every node-observability-agent crate.
//!
//! Mirrors the shape of the daemon workspace's `oj-core`: small,
//! dependency-light, no I/O. Everything here is a pure value or a
//! trait for testable time handling.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod clock;
pub mod run;
pub mod task;

pub use clock::{Clock, FakeClock, SystemClock};
pub use run::Run;
pub use task::{TaskKind, TaskOutcome};

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier assigned to an admitted run.
///
/// A 128-bit UUID, matching the original agent's `github.com/google/uuid`
/// identifiers. Serializes as its canonical hyphenated textual form, e.g.
/// `dd37122b-daaf-4d75-9250-c0747e9c5c47`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Mint a fresh, globally-unique identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The all-zero nil identifier, used as a sentinel when a marker
    /// file cannot be parsed.
    pub const fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for RunId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl std::str::FromStr for RunId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}
