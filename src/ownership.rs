use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::ResourceExt;
use std::collections::HashSet;
use tracing::{instrument, warn};

use crate::accessor::ClusterAccess;
use crate::errors::KickError;
use crate::timeout::{LONGER_TIMEOUT, OpContext};

/// First ownership reference of the given kind, if any. At most one
/// reference per kind is authoritative for traversal.
fn owner_of<'a>(refs: &'a [OwnerReference], kind: &str) -> Option<&'a OwnerReference> {
    refs.iter().find(|r| r.kind == kind)
}

/// Resolves the ReplicaSet that owns `pod`, looked up in the pod's own
/// namespace.
pub async fn replica_set_for_pod(
    access: &dyn ClusterAccess,
    ctx: OpContext,
    pod: &Pod,
) -> Result<ReplicaSet, KickError> {
    let namespace = pod.namespace().unwrap_or_default();
    match owner_of(pod.owner_references(), "ReplicaSet") {
        Some(owner) => access.get_replica_set(ctx, &owner.name, &namespace).await,
        None => Err(KickError::OwnerNotFound {
            owner_kind: "ReplicaSet",
            kind: "Pod",
            name: pod.name_any(),
            namespace,
        }),
    }
}

/// Resolves the Deployment that owns `replica_set`, looked up in the
/// replica set's own namespace.
pub async fn deployment_for_replica_set(
    access: &dyn ClusterAccess,
    ctx: OpContext,
    replica_set: &ReplicaSet,
) -> Result<Deployment, KickError> {
    let namespace = replica_set.namespace().unwrap_or_default();
    match owner_of(replica_set.owner_references(), "Deployment") {
        Some(owner) => access.get_deployment(ctx, &owner.name, &namespace).await,
        None => Err(KickError::OwnerNotFound {
            owner_kind: "Deployment",
            kind: "ReplicaSet",
            name: replica_set.name_any(),
            namespace,
        }),
    }
}

/// Resolves the distinct Deployments that own the given pods, walking
/// pod -> ReplicaSet -> Deployment for each.
///
/// A pod whose ReplicaSet cannot be resolved (no ReplicaSet ownership
/// reference, or the referenced ReplicaSet is gone) is skipped: ad-hoc pods
/// are an expected case. A ReplicaSet whose Deployment cannot be resolved
/// aborts the whole batch: that is an inconsistent ownership graph. Any
/// other failure (timeout, transport) aborts as well.
#[instrument(level = "debug", skip(access, ctx, pods), fields(pods = pods.len()))]
pub async fn deployments_for_pods(
    access: &dyn ClusterAccess,
    ctx: OpContext,
    pods: &[Pod],
) -> Result<Vec<Deployment>, KickError> {
    let (ctx, _) = ctx.ensure_deadline(LONGER_TIMEOUT);

    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut deployments = Vec::new();

    for pod in pods {
        let replica_set = match replica_set_for_pod(access, ctx, pod).await {
            Ok(rs) => rs,
            Err(err @ KickError::OwnerNotFound { .. }) => {
                warn!(pod = %pod.name_any(), %err, "skipping ad-hoc pod");
                continue;
            }
            Err(err) if err.is_not_found() => {
                warn!(
                    pod = %pod.name_any(),
                    %err,
                    "skipping pod with dangling ReplicaSet reference"
                );
                continue;
            }
            Err(err) => return Err(err),
        };

        let deployment =
            deployment_for_replica_set(access, ctx, &replica_set).await?;

        let key = (
            deployment.namespace().unwrap_or_default(),
            deployment.name_any(),
        );
        if seen.insert(key) {
            deployments.push(deployment);
        }
    }

    Ok(deployments)
}
