use super::transport::{Packet, Transport};
use crate::error::{CommError, Result};
use std::sync::Arc;
use tracing::trace;

/// Context id of the communicator spanning every process.
pub const WORLD_CONTEXT: u64 = 0;

/// An ordered group of processes that issue collectives together.
///
/// A `Comm` is a view onto a shared [`Transport`]: `members[r]` is the world
/// rank of the process with rank `r` in this communicator. Every collective
/// is blocking and must be entered by all members in the same order.
///
/// Collectives are written as "send everything, then receive everything".
/// Sends never block, so no ordering of the sends can deadlock.
#[derive(Clone)]
pub struct Comm {
    transport: Arc<dyn Transport>,
    members: Arc<[usize]>,
    rank: usize,
    context: u64,
}

impl std::fmt::Debug for Comm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Comm")
            .field("rank", &self.rank)
            .field("size", &self.members.len())
            .field("context", &self.context)
            .finish()
    }
}

impl Comm {
    /// The communicator of all processes reachable through `transport`,
    /// ordered by world rank.
    pub fn world(transport: Arc<dyn Transport>) -> Self {
        let size = transport.size();
        let rank = transport.rank();
        Self {
            transport,
            members: (0..size).collect(),
            rank,
            context: WORLD_CONTEXT,
        }
    }

    /// A sub-communicator over the given world ranks, in the given order.
    ///
    /// Splitting is purely local: every member must call it with the same
    /// `members` and `context`, and `context` must be unique among the
    /// communicators that can have messages in flight between two processes.
    ///
    /// # Panics
    ///
    /// If the calling process is not one of `members`.
    pub fn subset(&self, members: Vec<usize>, context: u64) -> Comm {
        let me = self.transport.rank();
        let rank = members
            .iter()
            .position(|&w| w == me)
            .unwrap_or_else(|| panic!("world rank {me} is not a member of {members:?}"));
        Comm {
            transport: Arc::clone(&self.transport),
            members: members.into(),
            rank,
            context,
        }
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn context(&self) -> u64 {
        self.context
    }

    /// World rank of the member with rank `rank` in this communicator.
    pub fn world_rank(&self, rank: usize) -> usize {
        self.members[rank]
    }

    pub fn send<T: Send + 'static>(&self, to: usize, data: Vec<T>) -> Result<()> {
        let packet = Packet {
            context: self.context,
            payload: Box::new(data),
        };
        self.transport.send(self.members[to], packet)?;
        Ok(())
    }

    pub fn recv<T: Send + 'static>(&self, from: usize) -> Result<Vec<T>> {
        let packet = self.transport.recv(self.members[from])?;
        if packet.context != self.context {
            return Err(CommError::ContextMismatch {
                expected: self.context,
                got: packet.context,
                peer: from,
            }
            .into());
        }
        let data = packet
            .payload
            .downcast::<Vec<T>>()
            .map_err(|_| CommError::TypeMismatch { peer: from })?;
        Ok(*data)
    }

    /// Sends `data` to `to` and then receives from `from`.
    pub fn send_recv<T: Send + 'static>(&self, data: Vec<T>, to: usize, from: usize) -> Result<Vec<T>> {
        self.send(to, data)?;
        self.recv(from)
    }

    /// Returns the root's `data` on every member. Non-root inputs are ignored.
    pub fn broadcast<T: Clone + Send + 'static>(&self, data: Vec<T>, root: usize) -> Result<Vec<T>> {
        trace!(context = self.context, root, "broadcast");
        if self.rank == root {
            for q in (0..self.size()).filter(|&q| q != root) {
                self.send(q, data.clone())?;
            }
            Ok(data)
        } else {
            self.recv(root)
        }
    }

    /// Collects every member's `data` on `root`, indexed by rank.
    pub fn gather<T: Send + 'static>(&self, data: Vec<T>, root: usize) -> Result<Option<Vec<Vec<T>>>> {
        trace!(context = self.context, root, "gather");
        if self.rank != root {
            self.send(root, data)?;
            return Ok(None);
        }
        let mut own = Some(data);
        let mut out = Vec::with_capacity(self.size());
        for q in 0..self.size() {
            if q == root {
                out.push(own.take().unwrap_or_default());
            } else {
                out.push(self.recv(q)?);
            }
        }
        Ok(Some(out))
    }

    /// Every member ends up with every member's `data`, indexed by rank.
    /// Contributions may differ in length.
    pub fn all_gather<T: Clone + Send + 'static>(&self, data: Vec<T>) -> Result<Vec<Vec<T>>> {
        trace!(context = self.context, size = self.size(), len = data.len(), "all_gather");
        for q in (0..self.size()).filter(|&q| q != self.rank) {
            self.send(q, data.clone())?;
        }
        let mut own = Some(data);
        let mut out = Vec::with_capacity(self.size());
        for q in 0..self.size() {
            if q == self.rank {
                out.push(own.take().unwrap_or_default());
            } else {
                out.push(self.recv(q)?);
            }
        }
        Ok(out)
    }

    /// Member `q` receives `sends[q]` from every member; the result is indexed
    /// by the sending rank.
    pub fn all_to_all<T: Send + 'static>(&self, sends: Vec<Vec<T>>) -> Result<Vec<Vec<T>>> {
        assert_eq!(
            sends.len(),
            self.size(),
            "all_to_all needs one buffer per member"
        );
        trace!(context = self.context, size = self.size(), "all_to_all");
        let mut own = None;
        for (q, buf) in sends.into_iter().enumerate() {
            if q == self.rank {
                own = Some(buf);
            } else {
                self.send(q, buf)?;
            }
        }
        let mut out = Vec::with_capacity(self.size());
        for q in 0..self.size() {
            if q == self.rank {
                out.push(own.take().unwrap_or_default());
            } else {
                out.push(self.recv(q)?);
            }
        }
        Ok(out)
    }

    /// `contributions[q]` is this member's partial sum of member `q`'s piece.
    /// Returns the fully summed piece owned by the caller.
    ///
    /// Partial sums are added in rank order, so the result does not depend on
    /// message arrival order.
    pub fn reduce_scatter_sum<T>(&self, contributions: Vec<Vec<T>>) -> Result<Vec<T>>
    where
        T: Copy + Send + std::ops::AddAssign + 'static,
    {
        trace!(context = self.context, size = self.size(), "reduce_scatter_sum");
        let pieces = self.all_to_all(contributions)?;
        let mut iter = pieces.into_iter();
        let mut acc = iter.next().unwrap_or_default();
        for piece in iter {
            assert_eq!(acc.len(), piece.len(), "reduce_scatter_sum: ragged contributions");
            for (a, b) in acc.iter_mut().zip(piece) {
                *a += b;
            }
        }
        Ok(acc)
    }

    /// Ring all-reduce with an arbitrary associative operator.
    ///
    /// Phase one is a scatter-reduce: after `size - 1` steps each member holds
    /// one fully reduced chunk. Phase two circulates the reduced chunks
    /// (all-gather). Every member ends with bitwise identical data because
    /// each chunk is reduced exactly once and then copied.
    pub fn all_reduce<T, F>(&self, mut data: Vec<T>, op: F) -> Result<Vec<T>>
    where
        T: Copy + Send + 'static,
        F: Fn(T, T) -> T,
    {
        let size = self.size();
        if size == 1 {
            return Ok(data);
        }
        trace!(context = self.context, size, len = data.len(), "all_reduce");
        let total = data.len();
        let chunk = total.div_ceil(size);
        let right = (self.rank + 1) % size;
        let left = (self.rank + size - 1) % size;
        let bounds = |idx: usize| {
            let start = (idx * chunk).min(total);
            (start, (start + chunk).min(total))
        };

        // --- Phase 1: Scatter-Reduce ---
        for step in 0..size - 1 {
            let send_idx = (self.rank + size - step) % size;
            let recv_idx = (self.rank + size - step - 1) % size;
            let (s0, s1) = bounds(send_idx);
            self.send(right, data[s0..s1].to_vec())?;
            let incoming: Vec<T> = self.recv(left)?;
            let (r0, _) = bounds(recv_idx);
            for (i, v) in incoming.into_iter().enumerate() {
                data[r0 + i] = op(data[r0 + i], v);
            }
        }

        // --- Phase 2: All-Gather ---
        for step in 0..size - 1 {
            let send_idx = (self.rank + size + 1 - step) % size;
            let recv_idx = (self.rank + size - step) % size;
            let (s0, s1) = bounds(send_idx);
            self.send(right, data[s0..s1].to_vec())?;
            let incoming: Vec<T> = self.recv(left)?;
            let (r0, _) = bounds(recv_idx);
            data[r0..r0 + incoming.len()].copy_from_slice(&incoming);
        }
        Ok(data)
    }

    pub fn all_reduce_sum<T>(&self, data: Vec<T>) -> Result<Vec<T>>
    where
        T: Copy + Send + std::ops::Add<Output = T> + 'static,
    {
        self.all_reduce(data, |a, b| a + b)
    }

    pub fn all_reduce_max<T>(&self, data: Vec<T>) -> Result<Vec<T>>
    where
        T: Copy + Send + PartialOrd + 'static,
    {
        self.all_reduce(data, |a, b| if b > a { b } else { a })
    }

    /// Returns once every member has entered the barrier.
    pub fn barrier(&self) -> Result<()> {
        trace!(context = self.context, "barrier");
        self.all_gather(Vec::<u8>::new())?;
        Ok(())
    }
}
