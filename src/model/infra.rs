// ABOUTME: Infrastructure mapping and credential records resolved by the assembler.
// ABOUTME: Mappings are type-checked; a non-scale-set mapping is a precondition error.

use serde::{Deserialize, Serialize};

use crate::types::{InfraMappingId, SettingId};

/// Infrastructure mapping for a scale-set target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaleSetInfraMapping {
    pub id: InfraMappingId,
    pub subscription_id: String,
    pub resource_group: String,
    pub compute_provider_setting_id: SettingId,
}

/// The mapping as stored by the infrastructure service; phases only accept
/// the `ScaleSet` variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InfrastructureMapping {
    ScaleSet(ScaleSetInfraMapping),
    Other { kind: String },
}

/// Cloud-provider credentials resolved through the settings service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudCredentials {
    pub client_id: String,
    pub tenant_id: String,
    /// Reference to the encrypted key, resolved by the delegate.
    pub key_reference: String,
}

/// Pointer to one encrypted field attached to a credential set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncryptedDataDetail {
    pub field_name: String,
    pub identifier: String,
}
