use crate::types::DbId;

/// A failure inside a persistence collaborator, surfaced unchanged.
///
/// Store implementations construct this via [`StoreError::backend`] so the
/// original backend error stays available through the source chain.
#[derive(Debug, thiserror::Error)]
#[error("store failure: {0}")]
pub struct StoreError(#[from] pub anyhow::Error);

impl StoreError {
    /// Wrap an arbitrary backend error.
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self(anyhow::Error::new(err))
    }
}

/// Domain-level error type for the directory core.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{entity} not found: id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("malformed value for '{key}': {reason}")]
    MalformedInput { key: String, reason: String },

    /// A failure while applying one entry of a partial update. Wraps the
    /// originating cause and names the offending attribute key.
    #[error("update failed on '{key}'")]
    UpdateFailed {
        key: String,
        #[source]
        source: Box<CoreError>,
    },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn malformed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Wrap an error in [`CoreError::UpdateFailed`] for the given attribute
    /// key. Idempotent for errors already wrapped under the same key.
    pub fn update_failed(key: impl Into<String>, source: CoreError) -> Self {
        let key = key.into();
        match source {
            Self::UpdateFailed { key: k, source } if k == key => {
                Self::UpdateFailed { key: k, source }
            }
            other => Self::UpdateFailed {
                key,
                source: Box::new(other),
            },
        }
    }

    /// Walk through [`CoreError::UpdateFailed`] wrapping down to the error
    /// that originally aborted the update.
    pub fn root_cause(&self) -> &CoreError {
        match self {
            Self::UpdateFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
