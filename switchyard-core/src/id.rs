//! Identifier generation seam.

/// Produces identifiers for requests and tool calls.
pub trait IdGenerator: Send + Sync + 'static {
    /// Generate a new identifier.
    fn generate_id(&self) -> String;
}

impl<F> IdGenerator for F
where
    F: Fn() -> String + Send + Sync + 'static,
{
    fn generate_id(&self) -> String {
        (self)()
    }
}
