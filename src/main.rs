use std::time::Duration;

use chrono::Utc;
use envconfig::Envconfig;
use kube::{Client, ResourceExt};
use rollkick::accessor::KubeAccess;
use rollkick::config::RollkickConfig;
use rollkick::filter::{PodFilter, pods_with_filter};
use rollkick::kick::kick_deployments;
use rollkick::ownership::deployments_for_pods;
use rollkick::timeout::OpContext;
use rollkick::{demo, init_tracing, util};
use tracing::info;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    init_tracing("info");

    let cfg = RollkickConfig::init_from_env()?;
    info!(?cfg, "starting rollkick");

    let client = Client::try_default().await?;
    let default_namespace = client.default_namespace().to_string();
    let access = KubeAccess::new(client);

    let ctx = match cfg.deadline_secs {
        Some(secs) => OpContext::with_deadline_in(Duration::from_secs(secs)),
        None => OpContext::new(),
    };

    if cfg.seed_demo {
        let ns = cfg.namespace.as_deref().unwrap_or(&default_namespace);
        demo::seed(&access, ctx, ns).await?;
    }

    let filter = (!cfg.filter.is_empty()).then(|| PodFilter {
        name: cfg.filter.clone(),
    });
    let pods = pods_with_filter(
        &access,
        ctx,
        filter.as_ref(),
        cfg.namespace.as_deref(),
    )
    .await?;

    let deployments = deployments_for_pods(&access, ctx, &pods).await?;
    let kicked = kick_deployments(&access, ctx, &deployments, Utc::now()).await?;

    println!("Kicked {} Deployments for {} Pods:", kicked.len(), pods.len());
    let width = util::digit_count(kicked.len()).max(2);
    for (i, deployment) in kicked.iter().enumerate() {
        println!(
            "depl[{:0width$}]: {}",
            i + 1,
            deployment.name_any(),
            width = width
        );
    }

    Ok(())
}
