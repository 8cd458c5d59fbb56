//! Error types for catalogue construction and document loading.
//!
//! Query-time "not found" results are not modeled as errors (see
//! [`crate::stats`]) — only load-time failures, which abort the run, live
//! here.

#[derive(thiserror::Error, Debug)]
pub enum CatalogueError {
    #[error("stop {0:?} already exists")]
    DuplicateStop(String),
    #[error("bus {0:?} already exists")]
    DuplicateBus(String),
    #[error("unknown stop {0:?}")]
    UnknownStop(String),
    #[error("circular bus {0:?} must start and end at the same stop")]
    InvalidCircularRoute(String),
    #[error("bus {0:?} has no stops")]
    EmptyRoute(String),
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error("malformed input: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Catalogue(#[from] CatalogueError),
    #[error("malformed render_settings: {0}")]
    InvalidColor(String),
}
