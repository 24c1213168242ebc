// ABOUTME: Assembles the immutable per-phase state data snapshot from the context.
// ABOUTME: Any missing link in the resolution chain is a fatal precondition error.

use crate::backend::{InfraOps, SettingsOps};
use crate::context::{Application, Artifact, Environment, ExecutionContext, Service};
use crate::error::{PhaseError, Result};
use crate::model::{
    CloudCredentials, EncryptedDataDetail, InfrastructureMapping, ScaleSetInfraMapping,
};

/// Everything a phase needs from the context, resolved once per phase.
///
/// Immutable after assembly; phases pass it around by reference.
#[derive(Debug, Clone)]
pub struct ScaleSetStateData {
    pub application: Application,
    pub environment: Environment,
    pub service: Service,
    pub artifact: Artifact,
    pub infra: ScaleSetInfraMapping,
    pub credentials: CloudCredentials,
    pub encrypted_details: Vec<EncryptedDataDetail>,
}

/// Resolve application → environment → service → infrastructure mapping →
/// credentials → artifact.
///
/// Errors name the missing link so the failure is diagnosable from the
/// message alone. None of these failures is retried.
pub async fn assemble_state_data<B>(
    ctx: &dyn ExecutionContext,
    backend: &B,
) -> Result<ScaleSetStateData>
where
    B: InfraOps + SettingsOps,
{
    let account_id = ctx.account_id();

    let application = ctx
        .app()
        .cloned()
        .ok_or_else(|| missing(format!("application can't be null, accountId: {}", account_id)))?;

    let environment = ctx
        .env()
        .cloned()
        .ok_or_else(|| missing(format!("environment can't be null, accountId: {}", account_id)))?;

    let service = ctx
        .service()
        .cloned()
        .ok_or_else(|| missing(format!("service can't be null, accountId: {}", account_id)))?;

    let infra_mapping_id = ctx.infra_mapping_id().ok_or_else(|| {
        missing(format!(
            "infrastructure mapping id can't be null, accountId: {}",
            account_id
        ))
    })?;

    let mapping = backend
        .infrastructure_mapping(infra_mapping_id, &application.id)
        .await
        .map_err(|e| PhaseError::Unexpected(e.to_string()))?
        .ok_or_else(|| {
            missing(format!(
                "unable to find infrastructure mapping with id: {}",
                infra_mapping_id
            ))
        })?;

    let infra = match mapping {
        InfrastructureMapping::ScaleSet(infra) => infra,
        InfrastructureMapping::Other { kind } => {
            return Err(missing(format!(
                "infrastructure mapping {} is not a scale-set mapping (found {})",
                infra_mapping_id, kind
            )));
        }
    };

    let (credentials, encrypted_details) = backend
        .credentials(&infra.compute_provider_setting_id)
        .await
        .map_err(|e| PhaseError::Unexpected(e.to_string()))?
        .ok_or_else(|| {
            missing(format!(
                "unable to resolve credentials for setting id: {}",
                infra.compute_provider_setting_id
            ))
        })?;

    let artifact = ctx.default_artifact(&service.id).ok_or_else(|| {
        missing(format!(
            "unable to find artifact for service id: {}",
            service.id
        ))
    })?;

    Ok(ScaleSetStateData {
        application,
        environment,
        service,
        artifact,
        infra,
        credentials,
        encrypted_details,
    })
}

fn missing(message: String) -> PhaseError {
    PhaseError::InvalidRequest(message)
}
