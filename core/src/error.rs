use gridla_kernels::KernelError;
use thiserror::Error;

/// Failures reported by the message-passing layer.
///
/// A collective that fails on one process is assumed fatal for the whole
/// group: peers blocked on it observe [`CommError::Disconnected`] once the
/// failing process unwinds and drops its endpoints.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommError {
    /// The peer dropped its endpoint (it finished early or panicked).
    #[error("Peer {peer} disconnected")]
    Disconnected { peer: usize },
    /// A message from a different communicator arrived first, meaning the
    /// processes issued collectives in different orders.
    #[error("Collective desynchronised: expected context {expected}, got {got} from rank {peer}")]
    ContextMismatch { expected: u64, got: u64, peer: usize },
    /// The payload did not carry the element type the receiver asked for.
    #[error("Payload from rank {peer} has the wrong element type")]
    TypeMismatch { peer: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An exactly zero pivot was met at global diagonal position `index`.
    #[error("Singular matrix: zero pivot at diagonal index {index}")]
    Singular { index: usize },
    /// The requested grid shape does not multiply out to the process count.
    #[error("Invalid grid: {height}x{width} does not cover {size} processes")]
    InvalidGrid {
        height: usize,
        width: usize,
        size: usize,
    },
    /// An iterative solver ran out of sweeps.
    #[error("No convergence after {sweeps} sweeps")]
    NoConvergence { sweeps: usize },
    #[error(transparent)]
    Comm(#[from] CommError),
}

impl From<KernelError> for Error {
    fn from(err: KernelError) -> Self {
        match err {
            KernelError::Singular { index } => Error::Singular { index },
            KernelError::NoConvergence { sweeps } => Error::NoConvergence { sweeps },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Runs a local kernel on a diagonal block starting at global index `offset`
/// and lifts its error into [`Error`] with a global pivot index.
pub(crate) fn at_offset<T>(offset: usize, res: gridla_kernels::Result<T>) -> Result<T> {
    res.map_err(|e| Error::from(e.offset(offset)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_errors_lift_to_global() {
        let singular: Result<()> = at_offset(4, Err(KernelError::Singular { index: 1 }));
        assert!(matches!(singular, Err(Error::Singular { index: 5 })));

        let stalled: Result<()> = at_offset(4, Err(KernelError::NoConvergence { sweeps: 30 }));
        let err = stalled.unwrap_err();
        assert!(matches!(err, Error::NoConvergence { sweeps: 30 }));
        assert_eq!(err.to_string(), "No convergence after 30 sweeps");
    }
}
