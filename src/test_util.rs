//! In-memory stand-in for the cluster store used by unit tests.

use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{Deployment, ReplicaSet};
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use kube::core::ErrorResponse;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use crate::accessor::ClusterAccess;
use crate::errors::KickError;
use crate::timeout::OpContext;

pub fn pod(name: &str, namespace: &str) -> Pod {
    serde_json::from_value(json!({
        "metadata": { "name": name, "namespace": namespace }
    }))
    .unwrap()
}

pub fn owned_pod(name: &str, namespace: &str, replica_set: &str) -> Pod {
    serde_json::from_value(json!({
        "metadata": {
            "name": name,
            "namespace": namespace,
            "ownerReferences": [{
                "apiVersion": "apps/v1",
                "kind": "ReplicaSet",
                "name": replica_set,
                "uid": format!("uid-{replica_set}"),
                "controller": true
            }]
        }
    }))
    .unwrap()
}

pub fn replica_set(name: &str, namespace: &str) -> ReplicaSet {
    serde_json::from_value(json!({
        "metadata": { "name": name, "namespace": namespace }
    }))
    .unwrap()
}

pub fn owned_replica_set(
    name: &str,
    namespace: &str,
    deployment: &str,
) -> ReplicaSet {
    serde_json::from_value(json!({
        "metadata": {
            "name": name,
            "namespace": namespace,
            "ownerReferences": [{
                "apiVersion": "apps/v1",
                "kind": "Deployment",
                "name": deployment,
                "uid": format!("uid-{deployment}"),
                "controller": true
            }]
        }
    }))
    .unwrap()
}

pub fn deployment(name: &str, namespace: &str) -> Deployment {
    serde_json::from_value(json!({
        "metadata": { "name": name, "namespace": namespace },
        "spec": {
            "replicas": 1,
            "selector": { "matchLabels": { "app": name } },
            "template": {
                "metadata": { "labels": { "app": name } }
            }
        }
    }))
    .unwrap()
}

fn api_error(code: u16, reason: &str, message: String) -> KickError {
    KickError::Kube(kube::Error::Api(ErrorResponse {
        status: "Failure".into(),
        message,
        reason: reason.into(),
        code,
    }))
}

fn not_found(kind: &str, name: &str) -> KickError {
    api_error(404, "NotFound", format!("{kind} \"{name}\" not found"))
}

type Key = (String, String);

/// In-memory [`ClusterAccess`] implementation. Objects are keyed by
/// (namespace, name); patches apply only the forced-rollout annotation path.
#[derive(Default)]
pub struct FakeCluster {
    pods: Mutex<HashMap<Key, Pod>>,
    replica_sets: Mutex<HashMap<Key, ReplicaSet>>,
    deployments: Mutex<HashMap<Key, Deployment>>,
    fail_patch_of: Option<String>,
    patched: Mutex<Vec<String>>,
    create_calls: Mutex<Vec<String>>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pod(self, pod: Pod) -> Self {
        let key = (pod.namespace().unwrap_or_default(), pod.name_any());
        self.pods.lock().unwrap().insert(key, pod);
        self
    }

    pub fn with_replica_set(self, rs: ReplicaSet) -> Self {
        let key = (rs.namespace().unwrap_or_default(), rs.name_any());
        self.replica_sets.lock().unwrap().insert(key, rs);
        self
    }

    pub fn with_deployment(self, deployment: Deployment) -> Self {
        let key = (
            deployment.namespace().unwrap_or_default(),
            deployment.name_any(),
        );
        self.deployments.lock().unwrap().insert(key, deployment);
        self
    }

    /// Make every patch of the named Deployment fail with a conflict.
    pub fn fail_patch_of(mut self, name: &str) -> Self {
        self.fail_patch_of = Some(name.to_string());
        self
    }

    /// Names of Deployments patched so far, in patch order.
    pub async fn patched_names(&self) -> Vec<String> {
        self.patched.lock().unwrap().clone()
    }

    /// Names passed to create operations, in call order.
    pub async fn create_calls(&self) -> Vec<String> {
        self.create_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ClusterAccess for FakeCluster {
    async fn create_deployment(
        &self,
        _ctx: OpContext,
        deployment: &Deployment,
        namespace: &str,
    ) -> Result<Deployment, KickError> {
        let ns = deployment
            .namespace()
            .unwrap_or_else(|| namespace.to_string());
        let name = deployment.name_any();
        self.create_calls.lock().unwrap().push(name.clone());

        let mut store = self.deployments.lock().unwrap();
        match store.get(&(ns.clone(), name.clone())) {
            // The accessor contract hides the AlreadyExists race by
            // fetching the existing object.
            Some(existing) => Ok(existing.clone()),
            None => {
                store.insert((ns, name), deployment.clone());
                Ok(deployment.clone())
            }
        }
    }

    async fn create_pod(
        &self,
        _ctx: OpContext,
        pod: &Pod,
        namespace: &str,
    ) -> Result<Pod, KickError> {
        let ns = pod.namespace().unwrap_or_else(|| namespace.to_string());
        let name = pod.name_any();
        self.create_calls.lock().unwrap().push(name.clone());

        let mut store = self.pods.lock().unwrap();
        match store.get(&(ns.clone(), name.clone())) {
            Some(existing) => Ok(existing.clone()),
            None => {
                store.insert((ns, name), pod.clone());
                Ok(pod.clone())
            }
        }
    }

    async fn get_deployment(
        &self,
        _ctx: OpContext,
        name: &str,
        namespace: &str,
    ) -> Result<Deployment, KickError> {
        self.deployments
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| not_found("deployments.apps", name))
    }

    async fn get_replica_set(
        &self,
        _ctx: OpContext,
        name: &str,
        namespace: &str,
    ) -> Result<ReplicaSet, KickError> {
        self.replica_sets
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| not_found("replicasets.apps", name))
    }

    async fn list_pods(
        &self,
        _ctx: OpContext,
        namespace: Option<&str>,
    ) -> Result<Vec<Pod>, KickError> {
        let store = self.pods.lock().unwrap();
        let mut pods: Vec<Pod> = store
            .values()
            .filter(|p| match namespace {
                Some(ns) => p.namespace().as_deref() == Some(ns),
                None => true,
            })
            .cloned()
            .collect();
        pods.sort_by_key(|p| p.name_any());
        Ok(pods)
    }

    async fn list_deployments(
        &self,
        _ctx: OpContext,
        namespace: Option<&str>,
    ) -> Result<Vec<Deployment>, KickError> {
        let store = self.deployments.lock().unwrap();
        let mut deployments: Vec<Deployment> = store
            .values()
            .filter(|d| match namespace {
                Some(ns) => d.namespace().as_deref() == Some(ns),
                None => true,
            })
            .cloned()
            .collect();
        deployments.sort_by_key(|d| d.name_any());
        Ok(deployments)
    }

    async fn patch_deployment(
        &self,
        _ctx: OpContext,
        name: &str,
        namespace: &str,
        patch: &serde_json::Value,
    ) -> Result<Deployment, KickError> {
        if self.fail_patch_of.as_deref() == Some(name) {
            return Err(api_error(
                409,
                "Conflict",
                format!("operation cannot be fulfilled on deployment \"{name}\""),
            ));
        }

        let mut store = self.deployments.lock().unwrap();
        let key = (namespace.to_string(), name.to_string());
        let deployment = store
            .get_mut(&key)
            .ok_or_else(|| not_found("deployments.apps", name))?;

        let annotations: BTreeMap<String, String> = serde_json::from_value(
            patch["spec"]["template"]["metadata"]["annotations"].clone(),
        )
        .unwrap_or_default();
        let spec = deployment.spec.get_or_insert_with(Default::default);
        let metadata = spec.template.metadata.get_or_insert_with(Default::default);
        metadata
            .annotations
            .get_or_insert_with(Default::default)
            .extend(annotations);

        self.patched.lock().unwrap().push(name.to_string());
        Ok(deployment.clone())
    }
}
