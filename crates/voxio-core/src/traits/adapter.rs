// SPDX-FileCopyrightText: 2026 Voxio Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait that all external-collaborator adapters implement.

use async_trait::async_trait;

use crate::error::VoxioError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for all Voxio adapters.
///
/// Every adapter (telephony, AI, persistence, registry) implements this
/// trait, which provides identity, health checks, and graceful shutdown.
#[async_trait]
pub trait Adapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the type of adapter (telephony, AI, etc.).
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, VoxioError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), VoxioError>;
}
