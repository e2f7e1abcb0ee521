//! # Redistribution Primitives
//!
//! Each primitive moves a matrix between two distributions that differ in
//! a way one collective can bridge. `dst` arrives with its distribution and
//! alignments already chosen; the primitive only fills its local block.
//!
//! | primitive                 | collective            | example                    |
//! |---------------------------|-----------------------|----------------------------|
//! | `col_filter`/`row_filter` | none                  | `[STAR,MR] -> [MC,MR]`     |
//! | `col_all_gather`          | all-gather            | `[MC,MR] -> [STAR,MR]`     |
//! | `partial_col_all_gather`  | all-gather in a row   | `[VC,STAR] -> [MC,STAR]`   |
//! | `col_sum_scatter`         | reduce-scatter        | `[STAR,MR] -> [MC,MR]`     |
//! | `partial_col_all_to_all`  | all-to-all in a row   | `[VC,STAR] -> [MC,MR]`     |
//! | `vector_swap`             | point-to-point        | `[VC,STAR] -> [VR,STAR]`   |
//! | `exchange`                | all-to-all over VC    | anything, e.g. `[CIRC,CIRC]` |
//!
//! The row variants mirror the column ones. Every primitive is collective
//! over the communicator it names and panics when the layouts do not fit
//! it, since that is a programming error.

use super::matrix::{DistMut, DistRef};
use super::meta::{DimMeta, DistMeta};
use super::{Dist, Distribution};
use crate::distributed::{Comm, Grid};
use crate::error::Result;
use gridla_kernels::{MatrixMut, MatrixRef, Scalar};
use tracing::trace;

/// Grid coordinates of member `q` of `dist.comm(grid)`.
fn member_coords(grid: &Grid, dist: Dist, q: usize) -> (usize, usize) {
    match dist {
        Dist::Mc => (q, grid.col()),
        Dist::Mr => (grid.row(), q),
        Dist::Vc => grid.coords_of_vc(q),
        Dist::Vr => grid.coords_of_vr(q),
        _ => (grid.row(), grid.col()),
    }
}

fn pack<T: Scalar>(a: &MatrixRef<'_, T>, rows: &[usize], cols: &[usize]) -> Vec<T> {
    let mut out = Vec::with_capacity(rows.len() * cols.len());
    for &j in cols {
        let col = a.column(j);
        out.extend(rows.iter().map(|&i| col[i]));
    }
    out
}

fn unpack<T: Scalar>(a: &mut MatrixMut<'_, T>, rows: &[usize], cols: &[usize], data: &[T]) {
    assert_eq!(data.len(), rows.len() * cols.len(), "received block has the wrong size");
    for (b, &j) in cols.iter().enumerate() {
        let col = a.column_mut(j);
        for (a_, &i) in rows.iter().enumerate() {
            col[i] = data[a_ + b * rows.len()];
        }
    }
}

/// Local positions, on the calling process, of the given global indices
/// along one dimension of `meta`.
struct LocalIndex {
    shift: usize,
    stride: usize,
}

impl LocalIndex {
    fn rows(meta: &DistMeta) -> Self {
        Self {
            shift: meta.col_shift(),
            stride: meta.col_stride(),
        }
    }

    fn cols(meta: &DistMeta) -> Self {
        Self {
            shift: meta.row_shift(),
            stride: meta.row_stride(),
        }
    }

    #[inline]
    fn of(&self, g: usize) -> usize {
        (g - self.shift) / self.stride
    }
}

fn check_same_shape<T: Scalar>(op: &str, src: &DistRef<'_, T>, dst: &DistMut<'_, T>) {
    assert!(
        src.grid().same_as(dst.grid()),
        "{op}: {} and {} live on different grids",
        src.dist(),
        dst.dist()
    );
    assert!(
        src.height() == dst.height() && src.width() == dst.width(),
        "{op}: {} is {}x{} but {} is {}x{}",
        src.dist(),
        src.height(),
        src.width(),
        dst.dist(),
        dst.height(),
        dst.width()
    );
}

fn same_dim(a: DimMeta, b: DimMeta) -> bool {
    a.dist == b.dist && a.align == b.align
}

/// Whether every index `dst` holds along this dimension is already held
/// locally under `src`.
fn filter_dim_ok(grid: &Grid, s: DimMeta, d: DimMeta) -> bool {
    match (s.dist, d.dist) {
        (Dist::Star, _) => true,
        (x, y) if x == y => s.align == d.align,
        (Dist::Mc, Dist::Vc) => d.align % grid.height() == s.align,
        (Dist::Mr, Dist::Vr) => d.align % grid.width() == s.align,
        _ => false,
    }
}

/// The team of processes (named by the distribution whose communicator it
/// is) that together hold what one member holds after gathering `s` into `d`.
fn gather_team(s: Dist, d: Dist) -> Option<Dist> {
    match (s, d) {
        (Dist::Mc | Dist::Mr | Dist::Vc | Dist::Vr, Dist::Star) => Some(s),
        (Dist::Vc, Dist::Mc) => Some(Dist::Mr),
        (Dist::Vr, Dist::Mr) => Some(Dist::Mc),
        _ => None,
    }
}

fn gather_dim_ok(grid: &Grid, s: DimMeta, d: DimMeta) -> bool {
    match (s.dist, d.dist) {
        (Dist::Vc, Dist::Mc) => d.align == s.align % grid.height(),
        (Dist::Vr, Dist::Mr) => d.align == s.align % grid.width(),
        _ => gather_team(s.dist, d.dist).is_some(),
    }
}

/// Team and affected dimension (`true` for columns) of the partial
/// all-to-all pairs.
fn all_to_all_team(s: Distribution, d: Distribution) -> Option<(Dist, bool)> {
    use Distribution as D;
    match (s, d) {
        (D::VC_STAR, D::MC_MR) | (D::MC_MR, D::VC_STAR) => Some((Dist::Mr, true)),
        (D::VR_STAR, D::MR_MC) | (D::MR_MC, D::VR_STAR) => Some((Dist::Mc, true)),
        (D::STAR_VR, D::MC_MR) | (D::MC_MR, D::STAR_VR) => Some((Dist::Mc, false)),
        (D::STAR_VC, D::MR_MC) | (D::MR_MC, D::STAR_VC) => Some((Dist::Mr, false)),
        _ => None,
    }
}

/// The `MC`/`MR` dimension must start where the `VC`/`VR` one does.
fn vector_dims_line_up(grid: &Grid, a: DimMeta, b: DimMeta) -> bool {
    let (v, m) = if matches!(a.dist, Dist::Vc | Dist::Vr) { (a, b) } else { (b, a) };
    m.align == v.align % m.dist.stride(grid)
}

pub(crate) fn can_filter(src: &DistMeta, dst: &DistMeta) -> bool {
    if src.dist().has_root() {
        return src.dist() == dst.dist()
            && src.root() == dst.root()
            && same_dim(src.col_dim(), dst.col_dim())
            && same_dim(src.row_dim(), dst.row_dim());
    }
    filter_dim_ok(src.grid(), src.col_dim(), dst.col_dim()) && filter_dim_ok(src.grid(), src.row_dim(), dst.row_dim())
}

pub(crate) fn can_col_gather(src: &DistMeta, dst: &DistMeta) -> bool {
    same_dim(src.row_dim(), dst.row_dim()) && gather_dim_ok(src.grid(), src.col_dim(), dst.col_dim())
}

pub(crate) fn can_row_gather(src: &DistMeta, dst: &DistMeta) -> bool {
    same_dim(src.col_dim(), dst.col_dim()) && gather_dim_ok(src.grid(), src.row_dim(), dst.row_dim())
}

pub(crate) fn can_all_to_all(src: &DistMeta, dst: &DistMeta) -> bool {
    match all_to_all_team(src.dist(), dst.dist()) {
        Some((_, true)) => vector_dims_line_up(src.grid(), src.col_dim(), dst.col_dim()),
        Some((_, false)) => vector_dims_line_up(src.grid(), src.row_dim(), dst.row_dim()),
        None => false,
    }
}

pub(crate) fn can_swap(src: &DistMeta, dst: &DistMeta) -> bool {
    use Distribution as D;
    let pair = matches!(
        (src.dist(), dst.dist()),
        (D::VC_STAR, D::VR_STAR) | (D::VR_STAR, D::VC_STAR) | (D::STAR_VC, D::STAR_VR) | (D::STAR_VR, D::STAR_VC)
    );
    pair && src.col_align() == dst.col_align() && src.row_align() == dst.row_align()
}

/// Keeps the locally owned part of `src`; no communication.
pub fn filter<T: Scalar>(src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) {
    check_same_shape("filter", src, dst);
    assert!(
        can_filter(src.meta(), dst.meta()),
        "filter: {} (aligns {}, {}) does not hold everything {} (aligns {}, {}) needs",
        src.dist(),
        src.col_align(),
        src.row_align(),
        dst.dist(),
        dst.col_align(),
        dst.row_align()
    );
    let dm = dst.meta().clone();
    let (sr, sc) = (LocalIndex::rows(src.meta()), LocalIndex::cols(src.meta()));
    let rows: Vec<usize> = (0..dm.local_height()).map(|i| sr.of(dm.global_row(i))).collect();
    let cols: Vec<usize> = (0..dm.local_width()).map(|j| sc.of(dm.global_col(j))).collect();
    let local = src.local();
    dst.local_mut().for_each_mut(|i, j, v| *v = local.get(rows[i], cols[j]));
}

/// Filter that only narrows the column dimension, e.g. `[STAR,MR] -> [MC,MR]`.
pub fn col_filter<T: Scalar>(src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) {
    assert!(
        same_dim(src.meta().row_dim(), dst.meta().row_dim()),
        "col_filter: {} -> {} changes the row distribution",
        src.dist(),
        dst.dist()
    );
    filter(src, dst);
}

/// Filter that only narrows the row dimension, e.g. `[MC,STAR] -> [MC,MR]`.
pub fn row_filter<T: Scalar>(src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) {
    assert!(
        same_dim(src.meta().col_dim(), dst.meta().col_dim()),
        "row_filter: {} -> {} changes the column distribution",
        src.dist(),
        dst.dist()
    );
    filter(src, dst);
}

/// All-gathers within `team`; every member's block lands in `dst`.
fn gather_in<T: Scalar>(team: Dist, src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) -> Result<()> {
    let grid = src.grid().clone();
    let comm = team.comm(&grid);
    trace!(from = %src.dist(), to = %dst.dist(), team = ?team, "gather");
    let blocks = comm.all_gather(src.local().to_vec())?;
    let (sm, dm) = (src.meta().clone(), dst.meta().clone());
    let (dr, dc) = (LocalIndex::rows(&dm), LocalIndex::cols(&dm));
    let mut out = dst.local_mut();
    for (q, block) in blocks.iter().enumerate() {
        let (r, c) = member_coords(&grid, team, q);
        let rows: Vec<usize> = sm.rows_at(r, c).into_iter().map(|g| dr.of(g)).collect();
        let cols: Vec<usize> = sm.cols_at(r, c).into_iter().map(|g| dc.of(g)).collect();
        unpack(&mut out, &rows, &cols, block);
    }
    Ok(())
}

/// `[U,V] -> [STAR,V]` for `U` in `MC, MR, VC, VR`.
pub fn col_all_gather<T: Scalar>(src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) -> Result<()> {
    check_same_shape("col_all_gather", src, dst);
    assert!(
        dst.dist().col == Dist::Star && can_col_gather(src.meta(), dst.meta()),
        "col_all_gather: cannot gather {} into {}",
        src.dist(),
        dst.dist()
    );
    gather_in(src.dist().col, src, dst)
}

/// `[U,V] -> [U,STAR]` for `V` in `MC, MR, VC, VR`.
pub fn row_all_gather<T: Scalar>(src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) -> Result<()> {
    check_same_shape("row_all_gather", src, dst);
    assert!(
        dst.dist().row == Dist::Star && can_row_gather(src.meta(), dst.meta()),
        "row_all_gather: cannot gather {} into {}",
        src.dist(),
        dst.dist()
    );
    gather_in(src.dist().row, src, dst)
}

/// `[VC,V] -> [MC,V]` (gathering within a grid row) or `[VR,V] -> [MR,V]`
/// (within a grid column).
pub fn partial_col_all_gather<T: Scalar>(src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) -> Result<()> {
    check_same_shape("partial_col_all_gather", src, dst);
    let team = gather_team(src.dist().col, dst.dist().col).filter(|_| dst.dist().col != Dist::Star);
    assert!(
        team.is_some() && can_col_gather(src.meta(), dst.meta()),
        "partial_col_all_gather: cannot gather {} (align {}) into {} (align {})",
        src.dist(),
        src.col_align(),
        dst.dist(),
        dst.col_align()
    );
    gather_in(team.unwrap_or(Dist::Star), src, dst)
}

/// `[U,VC] -> [U,MC]` or `[U,VR] -> [U,MR]`.
pub fn partial_row_all_gather<T: Scalar>(src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) -> Result<()> {
    check_same_shape("partial_row_all_gather", src, dst);
    let team = gather_team(src.dist().row, dst.dist().row).filter(|_| dst.dist().row != Dist::Star);
    assert!(
        team.is_some() && can_row_gather(src.meta(), dst.meta()),
        "partial_row_all_gather: cannot gather {} (align {}) into {} (align {})",
        src.dist(),
        src.row_align(),
        dst.dist(),
        dst.row_align()
    );
    gather_in(team.unwrap_or(Dist::Star), src, dst)
}

/// Sums the partial copies held across `team` and leaves each member the
/// part it owns under `dst`. With `update`, `dst += alpha * sum`;
/// otherwise `dst = sum`.
fn sum_scatter_in<T: Scalar>(
    team: Dist,
    src: &DistRef<'_, T>,
    dst: &mut DistMut<'_, T>,
    alpha: T,
    update: bool,
) -> Result<()> {
    let grid = src.grid().clone();
    let comm = team.comm(&grid);
    trace!(from = %src.dist(), to = %dst.dist(), team = ?team, update, "sum_scatter");
    let (sm, dm) = (src.meta().clone(), dst.meta().clone());
    let (sr, sc) = (LocalIndex::rows(&sm), LocalIndex::cols(&sm));
    let local = src.local();
    let contributions = (0..comm.size())
        .map(|q| {
            let (r, c) = member_coords(&grid, team, q);
            let rows: Vec<usize> = dm.rows_at(r, c).into_iter().map(|g| sr.of(g)).collect();
            let cols: Vec<usize> = dm.cols_at(r, c).into_iter().map(|g| sc.of(g)).collect();
            pack(&local, &rows, &cols)
        })
        .collect();
    let summed = comm.reduce_scatter_sum(contributions)?;
    let lh = dm.local_height();
    dst.local_mut().for_each_mut(|i, j, v| {
        let s = summed[i + j * lh];
        *v = if update { *v + alpha * s } else { s };
    });
    Ok(())
}

fn check_col_scatter<T: Scalar>(op: &str, src: &DistRef<'_, T>, dst: &DistMut<'_, T>, partial: bool) -> Dist {
    check_same_shape(op, src, dst);
    let team = gather_team(dst.dist().col, src.dist().col);
    let ok = same_dim(src.meta().row_dim(), dst.meta().row_dim())
        && (src.dist().col == Dist::Star) != partial
        && team.is_some()
        && (!partial || vector_dims_line_up(src.grid(), src.meta().col_dim(), dst.meta().col_dim()));
    assert!(ok, "{op}: cannot sum-scatter {} into {}", src.dist(), dst.dist());
    team.unwrap_or(Dist::Star)
}

fn check_row_scatter<T: Scalar>(op: &str, src: &DistRef<'_, T>, dst: &DistMut<'_, T>, partial: bool) -> Dist {
    check_same_shape(op, src, dst);
    let team = gather_team(dst.dist().row, src.dist().row);
    let ok = same_dim(src.meta().col_dim(), dst.meta().col_dim())
        && (src.dist().row == Dist::Star) != partial
        && team.is_some()
        && (!partial || vector_dims_line_up(src.grid(), src.meta().row_dim(), dst.meta().row_dim()));
    assert!(ok, "{op}: cannot sum-scatter {} into {}", src.dist(), dst.dist());
    team.unwrap_or(Dist::Star)
}

/// `[STAR,V] -> [U,V]`: sums the copies held by the `U` team.
pub fn col_sum_scatter<T: Scalar>(src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) -> Result<()> {
    let team = check_col_scatter("col_sum_scatter", src, dst, false);
    sum_scatter_in(team, src, dst, T::one(), false)
}

/// `dst += alpha * col_sum_scatter(src)`.
pub fn col_sum_scatter_update<T: Scalar>(alpha: T, src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) -> Result<()> {
    let team = check_col_scatter("col_sum_scatter_update", src, dst, false);
    sum_scatter_in(team, src, dst, alpha, true)
}

/// `[U,STAR] -> [U,V]`: sums the copies held by the `V` team.
pub fn row_sum_scatter<T: Scalar>(src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) -> Result<()> {
    let team = check_row_scatter("row_sum_scatter", src, dst, false);
    sum_scatter_in(team, src, dst, T::one(), false)
}

pub fn row_sum_scatter_update<T: Scalar>(alpha: T, src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) -> Result<()> {
    let team = check_row_scatter("row_sum_scatter_update", src, dst, false);
    sum_scatter_in(team, src, dst, alpha, true)
}

/// `[MC,V] -> [VC,V]` summing within a grid row, or `[MR,V] -> [VR,V]`
/// summing within a grid column.
pub fn partial_col_sum_scatter<T: Scalar>(src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) -> Result<()> {
    let team = check_col_scatter("partial_col_sum_scatter", src, dst, true);
    sum_scatter_in(team, src, dst, T::one(), false)
}

pub fn partial_col_sum_scatter_update<T: Scalar>(
    alpha: T,
    src: &DistRef<'_, T>,
    dst: &mut DistMut<'_, T>,
) -> Result<()> {
    let team = check_col_scatter("partial_col_sum_scatter_update", src, dst, true);
    sum_scatter_in(team, src, dst, alpha, true)
}

pub fn partial_row_sum_scatter<T: Scalar>(src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) -> Result<()> {
    let team = check_row_scatter("partial_row_sum_scatter", src, dst, true);
    sum_scatter_in(team, src, dst, T::one(), false)
}

pub fn partial_row_sum_scatter_update<T: Scalar>(
    alpha: T,
    src: &DistRef<'_, T>,
    dst: &mut DistMut<'_, T>,
) -> Result<()> {
    let team = check_row_scatter("partial_row_sum_scatter_update", src, dst, true);
    sum_scatter_in(team, src, dst, alpha, true)
}

/// `dst += alpha * sum` (or `dst = sum`) where `src` holds partial sums
/// replicated along every `STAR` dimension that `dst` partitions. Both
/// dimensions may be scattered, e.g. `[STAR,STAR] -> [MC,MR]`, in which
/// case the column team is reduced first.
pub fn sum_scatter<T: Scalar>(alpha: T, src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>, update: bool) -> Result<()> {
    check_same_shape("sum_scatter", src, dst);
    let (s, d) = (src.dist(), dst.dist());
    if s.col == Dist::Star && d.col != Dist::Star && s.row == Dist::Star && d.row != Dist::Star {
        let mut mid = super::DistMatrix::aligned(
            src.grid(),
            Distribution::new(d.col, Dist::Star),
            src.height(),
            src.width(),
            dst.col_align(),
            0,
            0,
        );
        col_sum_scatter(src, &mut mid.as_mut())?;
        let team = check_row_scatter("sum_scatter", &mid.as_ref(), dst, false);
        return sum_scatter_in(team, &mid.as_ref(), dst, alpha, update);
    }
    if s.col != d.col {
        let team = check_col_scatter("sum_scatter", src, dst, s.col != Dist::Star);
        sum_scatter_in(team, src, dst, alpha, update)
    } else {
        let team = check_row_scatter("sum_scatter", src, dst, s.row != Dist::Star);
        sum_scatter_in(team, src, dst, alpha, update)
    }
}

/// Relays entries inside `team`. Sender `s` ships to receiver `y` every
/// entry it holds under `src` that `y` holds under `dst`, provided
/// `provides(s, y)`. The rule must pick exactly one provider per entry.
fn relay<T: Scalar>(
    team: Dist,
    src: &DistRef<'_, T>,
    dst: &mut DistMut<'_, T>,
    provides: impl Fn((usize, usize), (usize, usize)) -> bool,
) -> Result<()> {
    let grid = src.grid().clone();
    let comm: &Comm = team.comm(&grid);
    let me = (grid.row(), grid.col());
    let (sm, dm) = (src.meta().clone(), dst.meta().clone());
    let (my_rows, my_cols) = (sm.rows_at(me.0, me.1), sm.cols_at(me.0, me.1));
    let local = src.local();

    let sends = (0..comm.size())
        .map(|q| {
            let target = member_coords(&grid, team, q);
            if !provides(me, target) {
                return Vec::new();
            }
            let (ro, co) = (dm.col_owner_at(target.0, target.1), dm.row_owner_at(target.0, target.1));
            let rows: Vec<usize> = (0..my_rows.len()).filter(|&a| ro.holds(my_rows[a])).collect();
            let cols: Vec<usize> = (0..my_cols.len()).filter(|&b| co.holds(my_cols[b])).collect();
            pack(&local, &rows, &cols)
        })
        .collect();
    let received = comm.all_to_all(sends)?;

    let (ro, co) = (dm.col_owner_at(me.0, me.1), dm.row_owner_at(me.0, me.1));
    let (dr, dc) = (LocalIndex::rows(&dm), LocalIndex::cols(&dm));
    let mut out = dst.local_mut();
    for (q, data) in received.into_iter().enumerate() {
        let sender = member_coords(&grid, team, q);
        if !provides(sender, me) {
            continue;
        }
        let rows: Vec<usize> = sm
            .rows_at(sender.0, sender.1)
            .into_iter()
            .filter(|&g| ro.holds(g))
            .map(|g| dr.of(g))
            .collect();
        let cols: Vec<usize> = sm
            .cols_at(sender.0, sender.1)
            .into_iter()
            .filter(|&g| co.holds(g))
            .map(|g| dc.of(g))
            .collect();
        unpack(&mut out, &rows, &cols, &data);
    }
    Ok(())
}

fn partial_all_to_all<T: Scalar>(op: &str, col: bool, src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) -> Result<()> {
    check_same_shape(op, src, dst);
    let team = all_to_all_team(src.dist(), dst.dist()).filter(|&(_, c)| c == col);
    assert!(
        team.is_some() && can_all_to_all(src.meta(), dst.meta()),
        "{op}: no partial all-to-all from {} (aligns {}, {}) to {} (aligns {}, {})",
        src.dist(),
        src.col_align(),
        src.row_align(),
        dst.dist(),
        dst.col_align(),
        dst.row_align()
    );
    let (team, _) = team.unwrap_or((Dist::Star, col));
    trace!(from = %src.dist(), to = %dst.dist(), team = ?team, "partial all_to_all");
    relay(team, src, dst, |_, _| true)
}

/// `[VC,STAR] <-> [MC,MR]` within a grid row and `[VR,STAR] <-> [MR,MC]`
/// within a grid column.
pub fn partial_col_all_to_all<T: Scalar>(src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) -> Result<()> {
    partial_all_to_all("partial_col_all_to_all", true, src, dst)
}

/// `[STAR,VR] <-> [MC,MR]` within a grid column and `[STAR,VC] <-> [MR,MC]`
/// within a grid row.
pub fn partial_row_all_to_all<T: Scalar>(src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) -> Result<()> {
    partial_all_to_all("partial_row_all_to_all", false, src, dst)
}

/// `[VC,STAR] <-> [VR,STAR]` and `[STAR,VC] <-> [STAR,VR]` with equal
/// alignments: the block of VC rank `v` is exactly the block of VR rank
/// `v`, so each process ships its whole block to one peer.
pub fn vector_swap<T: Scalar>(src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) -> Result<()> {
    check_same_shape("vector_swap", src, dst);
    assert!(
        can_swap(src.meta(), dst.meta()),
        "vector_swap: cannot swap {} (aligns {}, {}) into {} (aligns {}, {})",
        src.dist(),
        src.col_align(),
        src.row_align(),
        dst.dist(),
        dst.col_align(),
        dst.row_align()
    );
    let grid = src.grid().clone();
    let to_vr = matches!(src.dist().col, Dist::Vc) || matches!(src.dist().row, Dist::Vc);
    // The process whose VR rank equals my VC rank, named by its VC rank
    // (the rank order of `vc_comm`).
    let partner = {
        let (r, c) = grid.coords_of_vr(grid.vc_rank());
        r + c * grid.height()
    };
    let (to, from) = if to_vr {
        (partner, grid.vr_rank())
    } else {
        (grid.vr_rank(), partner)
    };
    trace!(from = %src.dist(), to = %dst.dist(), "vector_swap");
    let received = grid.vc_comm().send_recv(src.local().to_vec(), to, from)?;
    let lh = dst.local_height();
    dst.local_mut().for_each_mut(|i, j, v| *v = received[i + j * lh]);
    Ok(())
}

/// General redistribution over the whole grid. Handles any pair of
/// layouts, including `CIRC`/`MD` roots and arbitrary realignment, at the
/// price of an all-to-all over every process.
///
/// Each entry is sent by one process: the owner that agrees with the
/// receiver on every grid axis along which `src` is replicated.
pub fn exchange<T: Scalar>(src: &DistRef<'_, T>, dst: &mut DistMut<'_, T>) -> Result<()> {
    check_same_shape("exchange", src, dst);
    trace!(from = %src.dist(), to = %dst.dist(), "exchange");
    let (row_axis, col_axis) = src.dist().axes();
    relay(Dist::Vc, src, dst, |s, y| (row_axis || s.0 == y.0) && (col_axis || s.1 == y.1))
}

/// Replaces the local block by its sum over `comm`, turning partial sums
/// into totals on every member.
pub fn sum_over<T: Scalar>(comm: &Comm, a: &mut DistMut<'_, T>) -> Result<()> {
    trace!(context = comm.context(), "sum_over");
    let summed = comm.all_reduce_sum(a.local().to_vec())?;
    let lh = a.local_height();
    a.local_mut().for_each_mut(|i, j, v| *v = summed[i + j * lh]);
    Ok(())
}
