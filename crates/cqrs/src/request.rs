use common::Outcome;

/// A request that mutates state and reports only success or failure.
pub trait Command: Send + Sync + 'static {
    /// Stable request name used for routing, logs and metric labels.
    const NAME: &'static str;

    /// Checks the request before it reaches its handler.
    ///
    /// A failure here is returned to the caller and the handler is not run.
    fn validate(&self) -> Outcome {
        Outcome::ok()
    }
}

/// A request that reads state and returns a value.
pub trait Query: Send + Sync + 'static {
    /// Stable request name used for routing, logs and metric labels.
    const NAME: &'static str;

    type Output: Send + 'static;

    /// Checks the request before it reaches its handler.
    fn validate(&self) -> Outcome {
        Outcome::ok()
    }
}
