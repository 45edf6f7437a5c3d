use chrono::{DateTime, SecondsFormat, Utc};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use serde_json::json;
use std::collections::HashSet;
use tracing::{debug, instrument};

use crate::accessor::ClusterAccess;
use crate::errors::KickError;
use crate::timeout::{LONGER_TIMEOUT, OpContext};

/// Annotation set on a Deployment's pod template to force a rollout. Inert
/// to the desired state; it only changes the template's content hash so the
/// deployment controller replaces the pods under its usual surge limits.
pub const FORCE_DEPLOY_ANNOTATION: &str = "force/deploy";

/// Strategic-merge document that stamps the forced-rollout annotation onto
/// the pod template metadata. Only this field path is touched.
pub fn force_deploy_patch(stamp: &DateTime<Utc>) -> serde_json::Value {
    json!({
        "spec": {
            "template": {
                "metadata": {
                    "annotations": {
                        FORCE_DEPLOY_ANNOTATION:
                            stamp.to_rfc3339_opts(SecondsFormat::Secs, true),
                    }
                }
            }
        }
    })
}

/// Forces a re-deployment of the given Deployments by patching each with the
/// forced-rollout annotation. Every patch in the batch carries the same
/// `stamp`, so one operator action is correlated across all the Deployments
/// it touched. The same (namespace, name) identity is never patched twice.
///
/// The first patch failure aborts the remaining batch and surfaces the
/// error; no partial result is returned.
#[instrument(
    level = "debug",
    skip(access, ctx, deployments),
    fields(deployments = deployments.len(), %stamp)
)]
pub async fn kick_deployments(
    access: &dyn ClusterAccess,
    ctx: OpContext,
    deployments: &[Deployment],
    stamp: DateTime<Utc>,
) -> Result<Vec<Deployment>, KickError> {
    let (ctx, _) = ctx.ensure_deadline(LONGER_TIMEOUT);
    let patch = force_deploy_patch(&stamp);

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut updated = Vec::with_capacity(deployments.len());

    for deployment in deployments {
        let namespace = deployment.namespace().unwrap_or_default();
        let name = deployment.name_any();
        if !seen.insert((namespace.clone(), name.clone())) {
            debug!(%name, %namespace, "already kicked in this batch");
            continue;
        }

        let kicked = access
            .patch_deployment(ctx, &name, &namespace, &patch)
            .await?;
        updated.push(kicked);
    }

    Ok(updated)
}

/// Forced replacement of pods that have no owning controller. Patching such
/// a pod's annotations replaces nothing, since no controller is watching to
/// reconcile it; pods that are backed by ReplicaSets are handled through
/// [`kick_deployments`] instead.
pub fn kick_pods(_pods: &[Pod]) -> Result<Vec<Pod>, KickError> {
    Err(KickError::OwnerlessUnsupported)
}
