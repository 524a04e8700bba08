use thiserror::Error;

/// Rejected configuration. These are fatal: the engine refuses to be built or updated.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The render window would be too small to cover the viewport.
    #[error("batches_to_render must be at least {minimum} (got {requested})")]
    TooFewBatches { requested: usize, minimum: usize },

    /// Content-position anchoring needs an `id_from_index` mapping to recognize entries.
    #[error("maintain_visible_content_position requires an id_from_index mapping")]
    AnchorWithoutIdentity,
}
