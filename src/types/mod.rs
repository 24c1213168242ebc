// ABOUTME: Type-safe identifiers and validated domain types.
// ABOUTME: Uses phantom types to prevent ID confusion at compile time.

mod id;
mod scale_set;

pub use id::{ActivityId, AppId, EnvId, ExecutionId, InfraMappingId, ServiceId, SettingId};
pub use scale_set::{
    NamePrefix, NamePrefixError, default_name_prefix, scale_set_resource_id,
};
