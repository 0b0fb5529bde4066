// SPDX-License-Identifier: MIT

//! A single collector's kind and outcome.

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Which collector produced a [`TaskOutcome`].
///
/// `Unknown` is reserved for the synthetic outcome the coordinator
/// appends when the deadline expires before every collector reports in.
///
/// Wire names are inherited from the original Go agent: the runtime
/// (CRI-O) collector keeps the legacy `"CRIO"` spelling, and the script
/// collector is spelled `"Scripting"` on the wire though named `Script`
/// in code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    Kubelet,
    #[serde(rename = "CRIO")]
    Runtime,
    #[serde(rename = "Scripting")]
    Script,
    Unknown,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TaskKind::Kubelet => "Kubelet",
            TaskKind::Runtime => "CRIO",
            TaskKind::Script => "Scripting",
            TaskKind::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// The result of one collector: kind, success flag, timestamps, error text.
///
/// Invariant: `begin_time <= end_time`. Invariant: `error` is empty iff
/// `successful`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutcome {
    #[serde(rename = "Type")]
    pub kind: TaskKind,
    #[serde(rename = "Successful")]
    pub successful: bool,
    #[serde(rename = "BeginTime", alias = "BeginDate")]
    pub begin_time: DateTime<Utc>,
    #[serde(rename = "EndTime", alias = "EndDate")]
    pub end_time: DateTime<Utc>,
    #[serde(
        rename = "Error",
        default,
        serialize_with = "serialize_error",
        deserialize_with = "deserialize_error"
    )]
    pub error: String,
}

impl TaskOutcome {
    /// Build a successful outcome.
    pub fn success(kind: TaskKind, begin_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self { kind, successful: true, begin_time, end_time, error: String::new() }
    }

    /// Build a failed outcome. `error` must not be empty.
    pub fn failure(
        kind: TaskKind,
        begin_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        error: impl Into<String>,
    ) -> Self {
        Self { kind, successful: false, begin_time, end_time, error: error.into() }
    }

    /// The synthetic outcome recorded when the coordinator's deadline
    /// expires before a collector reports in.
    pub fn timeout(now: DateTime<Utc>, deadline_secs: u64) -> Self {
        Self::failure(
            TaskKind::Unknown,
            now,
            now,
            format!("timeout after waiting {deadline_secs}s"),
        )
    }
}

// The original agent's JSON encodes a successful outcome's error as a
// JSON `null`, not an empty string, in some captured fixtures; we accept
// both on deserialize but always emit `""` on serialize per spec.md §3.
fn serialize_error<S: Serializer>(error: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(error)
}

fn deserialize_error<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value: Option<String> = Option::deserialize(deserializer).map_err(D::Error::custom)?;
    Ok(value.unwrap_or_default())
}
