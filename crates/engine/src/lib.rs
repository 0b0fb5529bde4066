// SPDX-License-Identifier: MIT

//! The run coordinator: fan-out, bounded-wait join, commit, release.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

mod coordinator;

pub use coordinator::{Collectors, Coordinator, Mode, PROFILE_DEADLINE, SCRIPT_DEADLINE};
