//! # Processes, Communicators & the Process Grid
//!
//! Everything in `gridla` runs SPMD: every process executes the same
//! algorithm text on its own shard of the data, and the processes only
//! meet at explicit, blocking collectives.
//!
//! ## 🧩 Layers
//!
//! *   [`Transport`](transport::Transport): ordered point-to-point delivery
//!     between ranks. [`ChannelTransport`](channel::ChannelTransport) wires
//!     threads of one OS process together with `crossbeam` channels.
//! *   [`Comm`](comm::Comm): an ordered subset of processes plus the
//!     collectives the matrix layer needs (broadcast, gather, all-gather,
//!     all-to-all, reduce-scatter, ring all-reduce, barrier).
//! *   [`Grid`](grid::Grid): factors the processes into `height x width`
//!     and derives the column, row, vector and diagonal communicators.
//!
//! ## 🚀 Quick Start
//!
//! ```rust
//! use gridla::distributed::{Grid, spmd};
//!
//! let sums = spmd(4, |comm| {
//!     let grid = Grid::new(&comm).unwrap();
//!     let col = grid.mc_comm().all_reduce_sum(vec![grid.row() as f64]).unwrap();
//!     col[0]
//! });
//! assert_eq!(sums, vec![1.0; 4]);
//! ```
//!
//! ## ⚠️ Collective Symmetry
//!
//! A collective that some member never reaches blocks the others forever.
//! Every branch that guards a collective must therefore be decided from
//! data that all members share (shapes, alignments, replicated values).

pub mod channel;
pub mod comm;
pub mod grid;
pub mod transport;

pub use channel::{ChannelTransport, spmd};
pub use comm::Comm;
pub use grid::{Grid, GridOrder};
pub use transport::{Packet, Transport};
