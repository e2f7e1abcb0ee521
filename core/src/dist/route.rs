//! # Routing Between Distributions
//!
//! The 14 supported distributions form a graph whose edges are the direct
//! primitives of [`redist`](super::redist). [`copy`] looks the source and
//! destination up in a table of cheapest paths, computed once per process,
//! and walks the path through scoped temporaries.
//!
//! Temporaries take their alignments from the destination wherever the
//! distributions are related, so that every hop after the first lines up.
//! A hop whose primitive does not fit the actual alignments falls back to
//! [`exchange`](super::redist::exchange).

use super::matrix::{DistMatrix, DistMut, DistRef};
use super::meta::{DimMeta, DistMeta};
use super::redist::{self, can_all_to_all, can_col_gather, can_filter, can_row_gather, can_swap};
use super::{Dist, Distribution};
use crate::distributed::Grid;
use crate::error::Result;
use crate::matrix::Matrix;
use gridla_kernels::{Scalar, cpu_transpose};
use std::sync::OnceLock;
use tracing::trace;

/// The primitive behind one edge of the routing graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hop {
    Filter,
    ColGather,
    RowGather,
    AllToAll,
    Swap,
    Exchange,
}

impl Hop {
    /// Relative price used by the path search.
    fn cost(self) -> u32 {
        match self {
            Hop::Filter => 1,
            Hop::Swap | Hop::AllToAll => 2,
            Hop::ColGather | Hop::RowGather => 4,
            Hop::Exchange => 8,
        }
    }
}

/// How one dimension can move from `s` to `d` on its own.
fn dim_hop(s: Dist, d: Dist, col: bool) -> Option<Hop> {
    let gather = if col { Hop::ColGather } else { Hop::RowGather };
    match (s, d) {
        (Dist::Star, Dist::Circ) => None,
        (Dist::Star, _) => Some(Hop::Filter),
        (Dist::Mc, Dist::Vc) | (Dist::Mr, Dist::Vr) => Some(Hop::Filter),
        (Dist::Mc | Dist::Mr | Dist::Vc | Dist::Vr, Dist::Star) => Some(gather),
        (Dist::Vc, Dist::Mc) | (Dist::Vr, Dist::Mr) => Some(gather),
        _ => None,
    }
}

/// The direct edge from `s` to `d`, if any.
pub fn direct_hop(s: Distribution, d: Distribution) -> Option<Hop> {
    use Distribution as D;
    if s == d {
        return None;
    }
    if s.row == d.row {
        if let Some(hop) = dim_hop(s.col, d.col, true) {
            return Some(hop);
        }
    }
    if s.col == d.col {
        if let Some(hop) = dim_hop(s.row, d.row, false) {
            return Some(hop);
        }
    }
    match (s, d) {
        (D::VC_STAR, D::MC_MR)
        | (D::MC_MR, D::VC_STAR)
        | (D::VR_STAR, D::MR_MC)
        | (D::MR_MC, D::VR_STAR)
        | (D::STAR_VR, D::MC_MR)
        | (D::MC_MR, D::STAR_VR)
        | (D::STAR_VC, D::MR_MC)
        | (D::MR_MC, D::STAR_VC) => Some(Hop::AllToAll),
        (D::VC_STAR, D::VR_STAR) | (D::VR_STAR, D::VC_STAR) | (D::STAR_VC, D::STAR_VR) | (D::STAR_VR, D::STAR_VC) => {
            Some(Hop::Swap)
        }
        (D::STAR_STAR, D::CIRC_CIRC) => Some(Hop::Filter),
        (D::MC_MR, D::CIRC_CIRC) | (D::CIRC_CIRC, D::MC_MR) | (D::MD_STAR, D::STAR_STAR) | (D::STAR_MD, D::STAR_STAR) => {
            Some(Hop::Exchange)
        }
        _ => None,
    }
}

const N: usize = Distribution::ALL.len();

/// Cheapest paths between every pair of supported distributions.
pub struct RouteTable {
    paths: Vec<Vec<Vec<Distribution>>>,
}

impl RouteTable {
    fn build() -> Self {
        let mut paths = vec![vec![Vec::new(); N]; N];
        for (s, row) in paths.iter_mut().enumerate() {
            // Dijkstra from `s`; ties go to the lower table index so the
            // result is identical on every process.
            let mut dist = [u32::MAX; N];
            let mut prev = [usize::MAX; N];
            let mut done = [false; N];
            dist[s] = 0;
            for _ in 0..N {
                let Some(u) = (0..N).filter(|&u| !done[u] && dist[u] != u32::MAX).min_by_key(|&u| dist[u]) else {
                    break;
                };
                done[u] = true;
                for v in 0..N {
                    if let Some(hop) = direct_hop(Distribution::ALL[u], Distribution::ALL[v]) {
                        let alt = dist[u] + hop.cost();
                        if alt < dist[v] {
                            dist[v] = alt;
                            prev[v] = u;
                        }
                    }
                }
            }
            for (t, path) in row.iter_mut().enumerate() {
                let mut nodes = vec![t];
                let mut cur = t;
                while cur != s && prev[cur] != usize::MAX {
                    cur = prev[cur];
                    nodes.push(cur);
                }
                nodes.reverse();
                *path = nodes.into_iter().map(|k| Distribution::ALL[k]).collect();
            }
        }
        Self { paths }
    }

    /// The process-wide table.
    pub fn get() -> &'static RouteTable {
        static TABLE: OnceLock<RouteTable> = OnceLock::new();
        TABLE.get_or_init(RouteTable::build)
    }

    /// Distributions visited from `from` to `to`, both included.
    pub fn path(&self, from: Distribution, to: Distribution) -> &[Distribution] {
        let index = |d: Distribution| d.index().unwrap_or_else(|| panic!("unsupported distribution {d}"));
        &self.paths[index(from)][index(to)]
    }
}

/// Alignment for an intermediate dimension `d`, lined up with `target`
/// (the destination) or failing that with `origin` (the source).
fn translate_align(grid: &Grid, d: Dist, target: DimMeta, origin: DimMeta) -> usize {
    let from = |t: DimMeta| match (d, t.dist) {
        (Dist::Star | Dist::Circ, _) => Some(0),
        (x, y) if x == y => Some(t.align),
        (Dist::Mc, Dist::Vc) => Some(t.align % grid.height()),
        (Dist::Mr, Dist::Vr) => Some(t.align % grid.width()),
        (Dist::Vc, Dist::Mc) | (Dist::Vr, Dist::Mr) => Some(t.align),
        _ => None,
    };
    from(target).or_else(|| from(origin)).unwrap_or(0)
}

fn root_for(d: Distribution, dst: &DistMeta, src: &DistMeta) -> usize {
    let same_kind = |m: &DistMeta| (d.col == Dist::Circ) == (m.dist().col == Dist::Circ) && m.dist().has_root();
    if !d.has_root() {
        0
    } else if same_kind(dst) {
        dst.root()
    } else if same_kind(src) {
        src.root()
    } else {
        0
    }
}

/// Runs a single hop, falling back to [`redist::exchange`] when the
/// alignments do not suit the edge's primitive.
fn run_hop<T: Scalar>(hop: Hop, src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) -> Result<()> {
    let dst_meta = dst.meta().clone();
    let (s, d) = (src.meta(), &dst_meta);
    trace!(from = %s.dist(), to = %d.dist(), ?hop, "redistribution hop");
    match hop {
        Hop::Filter if can_filter(s, d) => {
            redist::filter(src, dst);
            Ok(())
        }
        Hop::ColGather if can_col_gather(s, d) => {
            if d.dist().col == Dist::Star {
                redist::col_all_gather(src, dst)
            } else {
                redist::partial_col_all_gather(src, dst)
            }
        }
        Hop::RowGather if can_row_gather(s, d) => {
            if d.dist().row == Dist::Star {
                redist::row_all_gather(src, dst)
            } else {
                redist::partial_row_all_gather(src, dst)
            }
        }
        Hop::AllToAll if can_all_to_all(s, d) => {
            let col_pair = matches!(s.dist().col, Dist::Vc | Dist::Vr) || matches!(d.dist().col, Dist::Vc | Dist::Vr);
            if col_pair {
                redist::partial_col_all_to_all(src, dst)
            } else {
                redist::partial_row_all_to_all(src, dst)
            }
        }
        Hop::Swap if can_swap(s, d) => redist::vector_swap(src, dst),
        _ => redist::exchange(src, dst),
    }
}

/// `dst := src` for any pair of distributions on the same grid.
///
/// `dst` keeps its distribution, alignments and root; only its contents
/// change. Collective over the whole grid.
///
/// # Panics
///
/// If the grids or shapes differ.
pub fn copy<T: Scalar>(src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) -> Result<()> {
    assert!(
        src.grid().same_as(dst.grid()),
        "copy: {} and {} live on different grids",
        src.dist(),
        dst.dist()
    );
    assert!(
        src.height() == dst.height() && src.width() == dst.width(),
        "copy: cannot assign a {}x{} {} matrix to a {}x{} {} matrix",
        src.height(),
        src.width(),
        src.dist(),
        dst.height(),
        dst.width(),
        dst.dist()
    );
    if src.meta().conforms(dst.meta()) {
        dst.copy_local_from(src);
        return Ok(());
    }
    if src.dist() == dst.dist() {
        // Same layout, different alignment or root.
        return redist::exchange(src, dst);
    }

    let path = RouteTable::get().path(src.dist(), dst.dist());
    let hops = path.len() - 1;
    let (sm, dm) = (src.meta().clone(), dst.meta().clone());
    let grid = sm.grid().clone();

    let mut current: Option<DistMatrix<T>> = None;
    for k in 0..hops {
        let (from, to) = (path[k], path[k + 1]);
        let hop = direct_hop(from, to).unwrap_or(Hop::Exchange);
        let from_ref = match &current {
            Some(m) => m.as_ref(),
            None => src.clone(),
        };
        if k + 1 == hops {
            return run_hop(hop, &from_ref, dst);
        }
        let meta = DistMeta::new(
            grid.clone(),
            to,
            sm.height(),
            sm.width(),
            translate_align(&grid, to.col, dm.col_dim(), sm.col_dim()),
            translate_align(&grid, to.row, dm.row_dim(), sm.row_dim()),
            root_for(to, &dm, &sm),
        );
        let mut next = DistMatrix::from_meta(meta);
        run_hop(hop, &from_ref, &mut next.as_mut())?;
        current = Some(next);
    }
    Ok(())
}

/// `dst := src^T`, or `src^H` when `conjugate` is set.
///
/// Transposing the local block of an `[U,V]` matrix yields the local block
/// of its transpose under `[V,U]` with the alignments swapped, so the only
/// communication is the routing from `[V,U]` to `dst`'s layout.
pub fn transpose_copy<T: Scalar>(src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>, conjugate: bool) -> Result<()> {
    assert!(
        src.height() == dst.width() && src.width() == dst.height(),
        "transpose_copy: cannot assign the transpose of a {}x{} matrix to a {}x{} matrix",
        src.height(),
        src.width(),
        dst.height(),
        dst.width()
    );
    let sm = src.meta();
    let meta = DistMeta::new(
        sm.grid().clone(),
        sm.dist().transposed(),
        sm.width(),
        sm.height(),
        sm.row_align(),
        sm.col_align(),
        sm.root(),
    );
    let local = src.local();
    let mut flipped = Matrix::zeros(local.width(), local.height());
    cpu_transpose(&local, &mut flipped.as_mut(), conjugate);
    let transposed = DistMatrix::from_local(meta, flipped);
    copy(&transposed.as_ref(), dst)
}

impl<T: Scalar> DistMatrix<T> {
    /// A new matrix with distribution `dist` holding the contents of `src`,
    /// aligned like `src` where the distributions are related.
    pub fn redistributed(src: &DistRef<'_, T>, dist: Distribution) -> Result<Self> {
        let grid = src.grid().clone();
        let sm = src.meta();
        let meta = DistMeta::new(
            grid.clone(),
            dist,
            sm.height(),
            sm.width(),
            translate_align(&grid, dist.col, sm.col_dim(), sm.col_dim()),
            translate_align(&grid, dist.row, sm.row_dim(), sm.row_dim()),
            root_for(dist, sm, sm),
        );
        let mut out = DistMatrix::from_meta(meta);
        copy(src, &mut out.as_mut())?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_pair_is_routable() {
        let table = RouteTable::get();
        for s in Distribution::ALL {
            for d in Distribution::ALL {
                let path = table.path(s, d);
                assert_eq!(path.first(), Some(&s), "{s} -> {d}");
                assert_eq!(path.last(), Some(&d), "{s} -> {d}");
                for w in path.windows(2) {
                    assert!(direct_hop(w[0], w[1]).is_some(), "{} -> {} is not an edge", w[0], w[1]);
                }
            }
        }
    }

    #[test]
    fn test_classic_routes() {
        let table = RouteTable::get();
        use Distribution as D;
        assert_eq!(table.path(D::MC_MR, D::STAR_STAR).len(), 3);
        assert_eq!(table.path(D::MC_MR, D::VC_STAR), &[D::MC_MR, D::VC_STAR]);
        // Three cheap hops (all-to-all, swap, all-to-all) beat any gather.
        assert_eq!(table.path(D::MC_MR, D::MR_MC).len(), 4);
        assert_eq!(table.path(D::STAR_STAR, D::MC_MR).len(), 3);
        assert_eq!(direct_hop(D::VC_STAR, D::MC_STAR), Some(Hop::ColGather));
        assert_eq!(direct_hop(D::MC_STAR, D::VC_STAR), Some(Hop::Filter));
        assert_eq!(direct_hop(D::STAR_MR, D::MC_MR), Some(Hop::Filter));
    }
}
