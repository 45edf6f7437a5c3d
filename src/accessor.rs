use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::core::v1::Pod;
use kube::api::{Api, ListParams, Patch, PatchParams, PostParams};
use kube::{Client, Resource, ResourceExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::debug;

use crate::errors::KickError;
use crate::timeout::{DEFAULT_TIMEOUT, OpContext};

/// The core's boundary toward the cluster store: idempotent create, get,
/// list and patch for the three kinds involved in a forced rollout. A
/// `namespace` of `None` on the list operations means all namespaces.
#[async_trait]
pub trait ClusterAccess: Send + Sync {
    async fn create_deployment(
        &self,
        ctx: OpContext,
        deployment: &Deployment,
        namespace: &str,
    ) -> Result<Deployment, KickError>;

    async fn create_pod(
        &self,
        ctx: OpContext,
        pod: &Pod,
        namespace: &str,
    ) -> Result<Pod, KickError>;

    async fn get_deployment(
        &self,
        ctx: OpContext,
        name: &str,
        namespace: &str,
    ) -> Result<Deployment, KickError>;

    async fn get_replica_set(
        &self,
        ctx: OpContext,
        name: &str,
        namespace: &str,
    ) -> Result<ReplicaSet, KickError>;

    async fn list_pods(
        &self,
        ctx: OpContext,
        namespace: Option<&str>,
    ) -> Result<Vec<Pod>, KickError>;

    async fn list_deployments(
        &self,
        ctx: OpContext,
        namespace: Option<&str>,
    ) -> Result<Vec<Deployment>, KickError>;

    /// Applies `patch` as a strategic merge onto the live object and returns
    /// the updated object. Fails when the object no longer exists.
    async fn patch_deployment(
        &self,
        ctx: OpContext,
        name: &str,
        namespace: &str,
        patch: &serde_json::Value,
    ) -> Result<Deployment, KickError>;
}

/// `kube::Client`-backed implementation of [`ClusterAccess`]. Stateless;
/// every returned object is a fresh snapshot from the API server.
#[derive(Clone)]
pub struct KubeAccess {
    client: Client,
}

impl KubeAccess {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn namespaced<K>(&self, namespace: &str) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn scoped<K>(&self, namespace: Option<&str>) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope>,
        K::DynamicType: Default,
    {
        match namespace {
            Some(ns) if !ns.trim().is_empty() => {
                Api::namespaced(self.client.clone(), ns)
            }
            _ => Api::all(self.client.clone()),
        }
    }

    /// Creates `obj`, falling back to a get when the store reports it
    /// already exists. A namespace set on the object wins over `namespace`.
    async fn create_or_fetch<K>(
        &self,
        ctx: OpContext,
        obj: &K,
        namespace: &str,
    ) -> Result<K, KickError>
    where
        K: Resource<Scope = NamespaceResourceScope>
            + Clone
            + DeserializeOwned
            + Serialize
            + Debug,
        K::DynamicType: Default,
    {
        let (ctx, _) = ctx.ensure_deadline(DEFAULT_TIMEOUT);
        let ns = obj.namespace().unwrap_or_else(|| namespace.to_string());
        let name = obj.name_any();
        let api: Api<K> = self.namespaced(&ns);

        match ctx.run("create", api.create(&PostParams::default(), obj)).await {
            Ok(created) => Ok(created),
            Err(err) if err.is_already_exists() => {
                debug!(%name, %ns, "object already exists, fetching it instead");
                ctx.run("get", api.get(&name)).await
            }
            Err(err) => Err(err),
        }
    }

    async fn get<K>(
        &self,
        ctx: OpContext,
        name: &str,
        namespace: &str,
    ) -> Result<K, KickError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        let (ctx, _) = ctx.ensure_deadline(DEFAULT_TIMEOUT);
        let api: Api<K> = self.namespaced(namespace);
        ctx.run("get", api.get(name)).await
    }

    async fn list<K>(
        &self,
        ctx: OpContext,
        namespace: Option<&str>,
    ) -> Result<Vec<K>, KickError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        let (ctx, _) = ctx.ensure_deadline(DEFAULT_TIMEOUT);
        let api: Api<K> = self.scoped(namespace);
        let list = ctx.run("list", api.list(&ListParams::default())).await?;
        Ok(list.items)
    }

    async fn patch<K>(
        &self,
        ctx: OpContext,
        name: &str,
        namespace: &str,
        patch: &serde_json::Value,
    ) -> Result<K, KickError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        K::DynamicType: Default,
    {
        let (ctx, _) = ctx.ensure_deadline(DEFAULT_TIMEOUT);
        let api: Api<K> = self.namespaced(namespace);
        ctx.run(
            "patch",
            api.patch(name, &PatchParams::default(), &Patch::Strategic(patch)),
        )
        .await
    }
}

#[async_trait]
impl ClusterAccess for KubeAccess {
    async fn create_deployment(
        &self,
        ctx: OpContext,
        deployment: &Deployment,
        namespace: &str,
    ) -> Result<Deployment, KickError> {
        self.create_or_fetch(ctx, deployment, namespace).await
    }

    async fn create_pod(
        &self,
        ctx: OpContext,
        pod: &Pod,
        namespace: &str,
    ) -> Result<Pod, KickError> {
        self.create_or_fetch(ctx, pod, namespace).await
    }

    async fn get_deployment(
        &self,
        ctx: OpContext,
        name: &str,
        namespace: &str,
    ) -> Result<Deployment, KickError> {
        self.get(ctx, name, namespace).await
    }

    async fn get_replica_set(
        &self,
        ctx: OpContext,
        name: &str,
        namespace: &str,
    ) -> Result<ReplicaSet, KickError> {
        self.get(ctx, name, namespace).await
    }

    async fn list_pods(
        &self,
        ctx: OpContext,
        namespace: Option<&str>,
    ) -> Result<Vec<Pod>, KickError> {
        self.list(ctx, namespace).await
    }

    async fn list_deployments(
        &self,
        ctx: OpContext,
        namespace: Option<&str>,
    ) -> Result<Vec<Deployment>, KickError> {
        self.list(ctx, namespace).await
    }

    async fn patch_deployment(
        &self,
        ctx: OpContext,
        name: &str,
        namespace: &str,
        patch: &serde_json::Value,
    ) -> Result<Deployment, KickError> {
        self.patch(ctx, name, namespace, patch).await
    }
}
