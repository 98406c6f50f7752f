use uuid::Uuid;

/// Failure modes of the persistence boundary. Repository traits live next
/// to the aggregates they load (`rentra-fleet`, `rentra-booking`); every
/// implementation reports through this error so callers can distinguish a
/// missing row from a lost optimistic-concurrency race.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("entity not found: {0}")]
    NotFound(Uuid),

    /// The entity changed since it was read. Callers surface this as a
    /// retryable transient failure; the store never resolves the race
    /// itself.
    #[error("version conflict on entity {0}")]
    VersionConflict(Uuid),

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
