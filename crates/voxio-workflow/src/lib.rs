// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable call lifecycle orchestration for the Voxio call system.
//!
//! The control path for one outbound call: a pure, replay-safe decision
//! machine ([`machine::CallMachine`]), an async driver that feeds it a
//! serialized event stream ([`workflow::CallWorkflow`]), and an activity
//! layer with per-attempt timeouts and bounded retry ([`activity`]). The
//! orchestrator never touches audio; it exchanges coarse-grained signals
//! with the bridge and delegates every side effect to idempotent
//! activities.

pub mod activity;
pub mod machine;
pub mod workflow;

pub use activity::{run_activity, RetryPolicy};
pub use machine::{CallMachine, Command, WorkflowEvent};
pub use workflow::{CallHandle, CallWorkflow, WorkflowDeps};
