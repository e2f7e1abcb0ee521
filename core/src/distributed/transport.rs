use crate::error::CommError;
use std::any::Any;

/// One point-to-point message.
///
/// The payload is a type-erased `Vec<T>`; the receiver downcasts it back.
/// `context` identifies the communicator the message was sent on so that a
/// process that issues collectives out of order is caught instead of
/// silently consuming a foreign message.
pub struct Packet {
    pub context: u64,
    pub payload: Box<dyn Any + Send>,
}

impl std::fmt::Debug for Packet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Packet").field("context", &self.context).finish_non_exhaustive()
    }
}

/// Abstraction over the wire between processes.
///
/// Implementations must deliver packets between each ordered pair of ranks
/// in FIFO order and must never block in `send`. Every collective in
/// [`Comm`](super::comm::Comm) is built on these two calls, which keeps the
/// collectives deadlock-free as long as every process issues them in the
/// same order.
pub trait Transport: Send + Sync {
    /// Rank of the calling process in the world.
    fn rank(&self) -> usize;

    /// Number of processes in the world.
    fn size(&self) -> usize;

    fn send(&self, to: usize, packet: Packet) -> Result<(), CommError>;

    /// Blocks until the next packet from `from` arrives.
    fn recv(&self, from: usize) -> Result<Packet, CommError>;
}
