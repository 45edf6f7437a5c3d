//! Demo workload: a couple of postgres Deployments and an ad-hoc busybox
//! pod, enough to exercise the filter, the ownership chain and the
//! ownerless-pod skip path on a live cluster.

use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
use k8s_openapi::api::core::v1::{
    Container, ContainerPort, EnvVar, Pod, PodSpec, PodTemplateSpec,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{
    LabelSelector, ObjectMeta,
};
use std::collections::BTreeMap;
use tracing::info;

use crate::accessor::ClusterAccess;
use crate::errors::KickError;
use crate::timeout::OpContext;

fn app_labels(name: &str) -> BTreeMap<String, String> {
    BTreeMap::from([("app".to_string(), name.to_string())])
}

/// A two-replica postgres Deployment named `postgres-{name}`.
pub fn postgres_deployment(name: &str, namespace: &str) -> Deployment {
    let full_name = format!("postgres-{name}");
    let labels = app_labels(&full_name);

    Deployment {
        metadata: ObjectMeta {
            name: Some(full_name.clone()),
            namespace: Some(namespace.to_string()),
            labels: Some(labels.clone()),
            ..Default::default()
        },
        spec: Some(DeploymentSpec {
            replicas: Some(2),
            selector: LabelSelector {
                match_labels: Some(labels.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: "postgres".to_string(),
                        image: Some("postgres:latest".to_string()),
                        env: Some(vec![
                            env_var("POSTGRES_DB", "app"),
                            env_var("POSTGRES_HOSTNAME", "localhost"),
                            env_var("POSTGRES_USER", "app_db_user"),
                            env_var("POSTGRES_PASSWORD", "app_db_pass"),
                        ]),
                        ports: Some(vec![ContainerPort {
                            name: Some("psql".to_string()),
                            container_port: 5432,
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// An ad-hoc busybox pod named `busybox-{name}`, owned by nothing.
pub fn busybox_pod(name: &str, namespace: &str) -> Pod {
    let full_name = format!("busybox-{name}");

    Pod {
        metadata: ObjectMeta {
            name: Some(full_name.clone()),
            namespace: Some(namespace.to_string()),
            labels: Some(app_labels(&full_name)),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![Container {
                name: "busybox".to_string(),
                image: Some("busybox:latest".to_string()),
                command: Some(vec![
                    "sleep".to_string(),
                    "infinity".to_string(),
                ]),
                ..Default::default()
            }],
            ..Default::default()
        }),
        ..Default::default()
    }
}

fn env_var(name: &str, value: &str) -> EnvVar {
    EnvVar {
        name: name.to_string(),
        value: Some(value.to_string()),
        ..Default::default()
    }
}

/// Seeds the demo workload: two Deployments with "database" in the name and
/// one ownerless pod. Idempotent through the accessor's create-or-fetch.
pub async fn seed(
    access: &dyn ClusterAccess,
    ctx: OpContext,
    namespace: &str,
) -> Result<(), KickError> {
    for name in ["test-database", "database-test"] {
        let deployment = access
            .create_deployment(ctx, &postgres_deployment(name, namespace), namespace)
            .await?;
        info!(name = %deployment.metadata.name.as_deref().unwrap_or(""), "demo deployment ready");
    }

    let pod = access
        .create_pod(ctx, &busybox_pod("adhoc", namespace), namespace)
        .await?;
    info!(name = %pod.metadata.name.as_deref().unwrap_or(""), "demo pod ready");

    Ok(())
}
