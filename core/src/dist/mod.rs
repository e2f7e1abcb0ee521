//! # Distributions and Distributed Matrices
//!
//! A distribution says, for each dimension of a global matrix, which
//! processes store a given row (or column). It is a pair `[U,V]`: `U`
//! distributes the row indices (the "column distribution", because it
//! decides who holds each entry of a column) and `V` the column indices.
//!
//! | value  | stride              | owner of index `i` (alignment `a`)                |
//! |--------|---------------------|---------------------------------------------------|
//! | `MC`   | grid height `r`     | grid row `(i + a) % r`                            |
//! | `MR`   | grid width `c`      | grid column `(i + a) % c`                         |
//! | `VC`   | `p`                 | VC rank `(i + a) % p`                             |
//! | `VR`   | `p`                 | VR rank `(i + a) % p`                             |
//! | `MD`   | `lcm(r, c)`         | path rank `(i + a) % lcm` on diagonal path `root` |
//! | `STAR` | 1                   | everyone                                          |
//! | `CIRC` | 1                   | only the process with VC rank `root`              |
//!
//! The local block of a process holds global indices
//! `shift, shift + stride, shift + 2 * stride, ...` where
//! `shift = (rank - align) mod stride`.

mod access;
mod matrix;
mod meta;
pub mod redist;
pub mod route;

pub use matrix::{DistMatrix, DistMut, DistRef};
pub use meta::{DimMeta, DistMeta, IndexOwner};
pub use route::{copy, transpose_copy};

use crate::distributed::{Comm, Grid};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How one dimension of a matrix is spread over the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Dist {
    Mc,
    Md,
    Mr,
    Vc,
    Vr,
    Star,
    Circ,
}

impl Dist {
    pub fn stride(self, grid: &Grid) -> usize {
        match self {
            Dist::Mc => grid.height(),
            Dist::Mr => grid.width(),
            Dist::Vc | Dist::Vr => grid.size(),
            Dist::Md => grid.lcm(),
            Dist::Star | Dist::Circ => 1,
        }
    }

    /// This distribution's rank of the process at grid position `(row, col)`.
    pub fn rank_at(self, grid: &Grid, row: usize, col: usize) -> usize {
        match self {
            Dist::Mc => row,
            Dist::Mr => col,
            Dist::Vc => row + col * grid.height(),
            Dist::Vr => col + row * grid.width(),
            Dist::Md => grid.diag_path_rank_of(row, col),
            Dist::Star | Dist::Circ => 0,
        }
    }

    /// The communicator over which this distribution partitions an index
    /// range. Its rank order agrees with [`Dist::rank_at`].
    pub fn comm(self, grid: &Grid) -> &Comm {
        match self {
            Dist::Mc => grid.mc_comm(),
            Dist::Mr => grid.mr_comm(),
            Dist::Vc => grid.vc_comm(),
            Dist::Vr => grid.vr_comm(),
            Dist::Md => grid.md_comm(),
            Dist::Star | Dist::Circ => grid.self_comm(),
        }
    }

    /// Grid axes `(row axis, column axis)` that ownership depends on.
    pub fn axes(self) -> (bool, bool) {
        match self {
            Dist::Mc => (true, false),
            Dist::Mr => (false, true),
            Dist::Vc | Dist::Vr | Dist::Md | Dist::Circ => (true, true),
            Dist::Star => (false, false),
        }
    }

    /// The distribution obtained by gathering within the grid row (for `VC`)
    /// or grid column (for `VR`).
    pub fn partial(self) -> Option<Dist> {
        match self {
            Dist::Vc => Some(Dist::Mc),
            Dist::Vr => Some(Dist::Mr),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Dist::Mc => "MC",
            Dist::Md => "MD",
            Dist::Mr => "MR",
            Dist::Vc => "VC",
            Dist::Vr => "VR",
            Dist::Star => "STAR",
            Dist::Circ => "CIRC",
        }
    }
}

/// A `[column distribution, row distribution]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Distribution {
    pub col: Dist,
    pub row: Dist,
}

impl Distribution {
    pub const CIRC_CIRC: Distribution = Distribution::new(Dist::Circ, Dist::Circ);
    pub const MC_MR: Distribution = Distribution::new(Dist::Mc, Dist::Mr);
    pub const MC_STAR: Distribution = Distribution::new(Dist::Mc, Dist::Star);
    pub const MD_STAR: Distribution = Distribution::new(Dist::Md, Dist::Star);
    pub const MR_MC: Distribution = Distribution::new(Dist::Mr, Dist::Mc);
    pub const MR_STAR: Distribution = Distribution::new(Dist::Mr, Dist::Star);
    pub const STAR_MC: Distribution = Distribution::new(Dist::Star, Dist::Mc);
    pub const STAR_MD: Distribution = Distribution::new(Dist::Star, Dist::Md);
    pub const STAR_MR: Distribution = Distribution::new(Dist::Star, Dist::Mr);
    pub const STAR_STAR: Distribution = Distribution::new(Dist::Star, Dist::Star);
    pub const STAR_VC: Distribution = Distribution::new(Dist::Star, Dist::Vc);
    pub const STAR_VR: Distribution = Distribution::new(Dist::Star, Dist::Vr);
    pub const VC_STAR: Distribution = Distribution::new(Dist::Vc, Dist::Star);
    pub const VR_STAR: Distribution = Distribution::new(Dist::Vr, Dist::Star);

    /// Every supported pair, in a fixed order used to index routing tables.
    pub const ALL: [Distribution; 14] = [
        Distribution::CIRC_CIRC,
        Distribution::MC_MR,
        Distribution::MC_STAR,
        Distribution::MD_STAR,
        Distribution::MR_MC,
        Distribution::MR_STAR,
        Distribution::STAR_MC,
        Distribution::STAR_MD,
        Distribution::STAR_MR,
        Distribution::STAR_STAR,
        Distribution::STAR_VC,
        Distribution::STAR_VR,
        Distribution::VC_STAR,
        Distribution::VR_STAR,
    ];

    pub const fn new(col: Dist, row: Dist) -> Self {
        Self { col, row }
    }

    /// Position in [`Distribution::ALL`], or `None` for an unsupported pair.
    pub fn index(self) -> Option<usize> {
        Distribution::ALL.iter().position(|&d| d == self)
    }

    pub fn is_supported(self) -> bool {
        self.index().is_some()
    }

    /// The distribution of `A^T` when `A` is distributed as `self`.
    pub fn transposed(self) -> Distribution {
        Distribution::new(self.row, self.col)
    }

    /// Grid axes that carry ownership, i.e. along which the matrix is not replicated.
    pub fn axes(self) -> (bool, bool) {
        let (cr, cc) = self.col.axes();
        let (rr, rc) = self.row.axes();
        (cr || rr, cc || rc)
    }

    /// `MD` and `CIRC` matrices live on a subset of the grid.
    pub fn has_root(self) -> bool {
        matches!(self.col, Dist::Md | Dist::Circ) || matches!(self.row, Dist::Md | Dist::Circ)
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.col.name(), self.row.name())
    }
}

/// `(rank - align) mod stride`: the first global index a process holds.
#[inline]
pub fn shift(rank: usize, align: usize, stride: usize) -> usize {
    (rank + stride - align % stride) % stride
}

/// Number of indices below `n` held by a process with the given shift.
#[inline]
pub fn length(n: usize, shift: usize, stride: usize) -> usize {
    if n > shift { (n - shift - 1) / stride + 1 } else { 0 }
}

/// Rank that holds global index `i`.
#[inline]
pub fn owner(i: usize, align: usize, stride: usize) -> usize {
    (i + align) % stride
}
