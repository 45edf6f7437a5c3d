use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;

use crate::accessor::ClusterAccess;
use crate::errors::KickError;
use crate::timeout::OpContext;

/// Filtering criteria applied to a list of Pods. An empty name matches
/// every pod.
#[derive(Clone, Debug, Default)]
pub struct PodFilter {
    pub name: String,
}

/// Returns, in original order, the pods whose name contains the filter's
/// name as a contiguous substring. `None` or an empty filter is the
/// identity. Pure; no cluster access.
pub fn select_pods(pods: Vec<Pod>, filter: Option<&PodFilter>) -> Vec<Pod> {
    let Some(filter) = filter else {
        return pods;
    };
    if filter.name.is_empty() {
        return pods;
    }

    pods.into_iter()
        .filter(|pod| pod.name_any().contains(&filter.name))
        .collect()
}

/// Lists pods in `namespace` (all namespaces when `None`) and applies the
/// filter to the result.
pub async fn pods_with_filter(
    access: &dyn ClusterAccess,
    ctx: OpContext,
    filter: Option<&PodFilter>,
    namespace: Option<&str>,
) -> Result<Vec<Pod>, KickError> {
    let pods = access.list_pods(ctx, namespace).await?;
    Ok(select_pods(pods, filter))
}
