use thiserror::Error;

#[derive(Error, Debug)]
pub enum KickError {
    #[error("kubernetes api error: {0}")]
    Kube(#[from] kube::Error),

    /// No usable ownership reference of the expected kind on the object.
    #[error("failed to find {owner_kind} for {kind}: {name} (ns: {namespace})")]
    OwnerNotFound {
        owner_kind: &'static str,
        kind: &'static str,
        name: String,
        namespace: String,
    },

    #[error("{op} did not complete before the context deadline")]
    Timeout { op: &'static str },

    #[error(
        "forced replacement is not supported for pods without an owning controller"
    )]
    OwnerlessUnsupported,
}

impl KickError {
    /// True when the underlying store reported that the object is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, KickError::Kube(kube::Error::Api(resp)) if resp.code == 404)
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(
            self,
            KickError::Kube(kube::Error::Api(resp))
                if resp.code == 409 || resp.reason == "AlreadyExists"
        )
    }
}
