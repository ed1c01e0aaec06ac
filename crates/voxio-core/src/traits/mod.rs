// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for Voxio's external collaborators.
//!
//! All adapters extend the [`Adapter`] base trait and use `#[async_trait]`
//! for dynamic dispatch compatibility. Providers' raw errors are classified
//! into [`crate::VoxioError`] before they cross these boundaries.

pub mod adapter;
pub mod ai;
pub mod persistence;
pub mod signals;
pub mod telephony;

// Re-export all traits at the traits module level for convenience.
pub use adapter::Adapter;
pub use ai::{AiSession, AiSessionAdapter, SessionPrewarmer};
pub use persistence::PersistenceAdapter;
pub use signals::SignalSink;
pub use telephony::TelephonyAdapter;
