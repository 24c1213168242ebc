// ABOUTME: Infrastructure and settings lookup traits consumed by the assembler.
// ABOUTME: Absent records are None; the assembler turns them into precondition errors.

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{CloudCredentials, EncryptedDataDetail, InfrastructureMapping};
use crate::types::{AppId, InfraMappingId, SettingId};

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("lookup backend unavailable: {0}")]
    Unavailable(String),
}

/// Infrastructure mapping lookups.
#[async_trait]
pub trait InfraOps: Send + Sync {
    async fn infrastructure_mapping(
        &self,
        id: &InfraMappingId,
        app_id: &AppId,
    ) -> Result<Option<InfrastructureMapping>, LookupError>;
}

/// Compute-provider settings and secret lookups.
#[async_trait]
pub trait SettingsOps: Send + Sync {
    /// Resolve credentials for a compute-provider setting, with the
    /// encrypted-field details attached.
    async fn credentials(
        &self,
        setting_id: &SettingId,
    ) -> Result<Option<(CloudCredentials, Vec<EncryptedDataDetail>)>, LookupError>;
}
