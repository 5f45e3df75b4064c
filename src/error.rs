use thiserror::Error;

/// Errors raised by the priority heap and its queue adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// The collection holds no entries. Workers racing on the queue treat
    /// this as a benign signal and retry on the next poll.
    #[error("Queue is empty")]
    Empty,
}

/// Errors related to pool lifecycle and configuration.
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Pool has been shut down")]
    Disposed,
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Thread setup error: {0}")]
    ThreadSetup(String),
    #[error("Failed during shutdown: {0}")]
    Shutdown(String),
    #[error("Internal pool error: {0}")]
    Other(#[from] anyhow::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(QueueError::Empty.to_string(), "Queue is empty");
        assert_eq!(PoolError::Disposed.to_string(), "Pool has been shut down");
        assert_eq!(
            PoolError::InvalidConfig("zero workers".into()).to_string(),
            "Invalid configuration: zero workers"
        );
        assert_eq!(
            PoolError::ThreadSetup("spawn failed".into()).to_string(),
            "Thread setup error: spawn failed"
        );
    }

    #[test]
    fn test_anyhow_wrapping() {
        let err: PoolError = anyhow::anyhow!("inner fault").into();
        assert_eq!(err.to_string(), "Internal pool error: inner fault");
    }
}
