// ABOUTME: Sweeping output store operations for cross-phase state.
// ABOUTME: Saves overwrite whole values; reads within one execution see prior writes.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::model::{SweepingOutputInquiry, SweepingOutputInstance};

#[derive(Debug, Error)]
pub enum SweepingError {
    #[error("sweeping output store unavailable: {0}")]
    Unavailable(String),

    #[error("sweeping output value malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Sweeping output persistence.
///
/// The store must guarantee a write durably precedes any later read within
/// the same execution id; cross-execution isolation follows from the key
/// being scoped by execution id.
#[async_trait]
pub trait SweepingOutputs: Send + Sync {
    /// Persist an instance, replacing any existing value for the same
    /// (execution, scope, name).
    async fn save(&self, instance: SweepingOutputInstance) -> Result<(), SweepingError>;

    /// Find the current value for an inquiry, or `None`.
    async fn find(
        &self,
        inquiry: &SweepingOutputInquiry,
    ) -> Result<Option<SweepingOutputInstance>, SweepingError>;
}

/// Find and decode a typed sweeping output value.
pub async fn find_typed<T, S>(
    store: &S,
    inquiry: &SweepingOutputInquiry,
) -> Result<Option<T>, SweepingError>
where
    T: DeserializeOwned,
    S: SweepingOutputs + ?Sized,
{
    match store.find(inquiry).await? {
        Some(instance) => Ok(Some(instance.decode()?)),
        None => Ok(None),
    }
}
