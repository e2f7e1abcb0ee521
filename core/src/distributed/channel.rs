use super::comm::Comm;
use super::transport::{Packet, Transport};
use crate::error::CommError;
use crossbeam::channel::{Receiver, Sender, unbounded};
use std::sync::Arc;
use std::thread;
use tracing::debug;

/// In-process transport: one unbounded `crossbeam` channel per ordered pair
/// of ranks, including a loop-back channel per rank.
///
/// Each channel has exactly one sender. When a rank's thread ends (or
/// panics) its senders are dropped and every peer waiting on it gets
/// [`CommError::Disconnected`], so a failure cascades through the group
/// instead of deadlocking it.
pub struct ChannelTransport {
    rank: usize,
    senders: Vec<Sender<Packet>>,
    receivers: Vec<Receiver<Packet>>,
}

impl ChannelTransport {
    /// Builds a fully connected mesh of `size` endpoints; endpoint `r` is rank `r`.
    pub fn mesh(size: usize) -> Vec<ChannelTransport> {
        // channels[from][to]
        let channels: Vec<Vec<(Sender<Packet>, Receiver<Packet>)>> = (0..size)
            .map(|_| (0..size).map(|_| unbounded()).collect())
            .collect();

        (0..size)
            .map(|rank| ChannelTransport {
                rank,
                senders: (0..size).map(|to| channels[rank][to].0.clone()).collect(),
                receivers: (0..size).map(|from| channels[from][rank].1.clone()).collect(),
            })
            .collect()
    }
}

impl Transport for ChannelTransport {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.senders.len()
    }

    fn send(&self, to: usize, packet: Packet) -> Result<(), CommError> {
        self.senders[to]
            .send(packet)
            .map_err(|_| CommError::Disconnected { peer: to })
    }

    fn recv(&self, from: usize) -> Result<Packet, CommError> {
        self.receivers[from]
            .recv()
            .map_err(|_| CommError::Disconnected { peer: from })
    }
}

/// Runs `f` as an SPMD program on `nprocs` threads wired together with
/// [`ChannelTransport`], returning each rank's result in rank order.
///
/// If any rank panics, the panic is re-raised on the caller after every
/// thread has finished.
pub fn spmd<F, R>(nprocs: usize, f: F) -> Vec<R>
where
    F: Fn(Comm) -> R + Sync,
    R: Send,
{
    assert!(nprocs > 0, "spmd needs at least one process");
    debug!(nprocs, "launching spmd group");
    let transports = ChannelTransport::mesh(nprocs);
    let f = &f;
    let outcomes: Vec<thread::Result<R>> = thread::scope(|scope| {
        let handles: Vec<_> = transports
            .into_iter()
            .map(|transport| {
                scope.spawn(move || {
                    let transport: Arc<dyn Transport> = Arc::new(transport);
                    f(Comm::world(transport))
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join()).collect()
    });

    let mut results = Vec::with_capacity(nprocs);
    for outcome in outcomes {
        match outcome {
            Ok(r) => results.push(r),
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }
    results
}
