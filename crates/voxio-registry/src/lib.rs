// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session registry for the Voxio call system.
//!
//! Maps a call id to the session metadata any process instance needs to
//! attach a transport connection: configuration for the AI session, the
//! current status, and the provider call id. The registry is the only
//! state shared across processes; every write is an atomic per-key upsert
//! and records expire by TTL.

pub mod adapter;
pub mod memory;
pub mod record;

pub use adapter::SessionRegistry;
pub use memory::MemoryRegistry;
pub use record::SessionRecord;
