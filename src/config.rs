use envconfig::Envconfig;

#[derive(Envconfig, Clone, Debug)]
pub struct RollkickConfig {
    /// Namespace to operate in. Unset scans all namespaces.
    /// Env: ROLLKICK_NAMESPACE
    #[envconfig(from = "ROLLKICK_NAMESPACE")]
    pub namespace: Option<String>,

    /// Substring a pod name must contain to be kicked. Empty matches all.
    /// Env: ROLLKICK_FILTER
    #[envconfig(from = "ROLLKICK_FILTER", default = "")]
    pub filter: String,

    /// Overall deadline for the whole run, in seconds. Unset lets each
    /// operation fall back to its own timeout tier.
    /// Env: ROLLKICK_DEADLINE_SECS
    #[envconfig(from = "ROLLKICK_DEADLINE_SECS")]
    pub deadline_secs: Option<u64>,

    /// Create the demo workload (postgres Deployments and a busybox pod)
    /// before kicking. Env: ROLLKICK_SEED_DEMO
    #[envconfig(from = "ROLLKICK_SEED_DEMO", default = "false")]
    pub seed_demo: bool,
}
