use crate::dist::{DistMut, copy, transpose_copy};
use crate::error::Result;
use gridla_kernels::{Orientation, Scalar, UpperOrLower};
use tracing::trace;

/// Swaps two global rows (`by_rows`) or columns of `a`. The owners of the
/// two indices trade their local slices; everyone else has nothing to do.
fn swap_lines<T: Scalar>(a: &mut DistMut<'_, T>, by_rows: bool, to: usize, from: usize) -> Result<()> {
    let meta = a.meta().clone();
    let extent = if by_rows { meta.height() } else { meta.width() };
    assert!(
        to < extent && from < extent,
        "swap: indices {to} and {from} out of range for a {}x{} matrix",
        meta.height(),
        meta.width()
    );
    if to == from || !meta.participating() {
        return Ok(());
    }
    let grid = meta.grid().clone();
    let dim = if by_rows { meta.col_dim() } else { meta.row_dim() };
    let comm = dim.dist.comm(&grid);
    let stride = dim.stride(&grid);
    let owner = |i: usize| (i + dim.align) % stride;
    let (owner_to, owner_from) = (owner(to), owner(from));
    let me = comm.rank();
    let local_index = |i: usize| {
        if by_rows {
            meta.local_row(i)
        } else {
            meta.local_col(i)
        }
    };
    let other_extent = if by_rows { a.local_width() } else { a.local_height() };
    let at = |line: usize, k: usize| if by_rows { (line, k) } else { (k, line) };

    if owner_to == me && owner_from == me {
        let (lt, lf) = (local_index(to), local_index(from));
        let mut local = a.local_mut();
        for k in 0..other_extent {
            let (it, jt) = at(lt, k);
            let (i_f, j_f) = at(lf, k);
            let tmp = local.get(it, jt);
            local.set(it, jt, local.get(i_f, j_f));
            local.set(i_f, j_f, tmp);
        }
        return Ok(());
    }
    let (mine, partner) = if owner_to == me {
        (to, owner_from)
    } else if owner_from == me {
        (from, owner_to)
    } else {
        return Ok(());
    };
    trace!(mine, partner, by_rows, "swap with remote owner");
    let line = local_index(mine);
    let outgoing: Vec<T> = (0..other_extent)
        .map(|k| {
            let (i, j) = at(line, k);
            a.get_local(i, j)
        })
        .collect();
    let incoming = comm.send_recv(outgoing, partner, partner)?;
    for (k, v) in incoming.into_iter().enumerate() {
        let (i, j) = at(line, k);
        a.set_local(i, j, v);
    }
    Ok(())
}

/// Interchanges global rows `to` and `from`.
pub fn row_swap<T: Scalar>(a: &mut DistMut<'_, T>, to: usize, from: usize) -> Result<()> {
    swap_lines(a, true, to, from)
}

/// Interchanges global columns `to` and `from`.
pub fn column_swap<T: Scalar>(a: &mut DistMut<'_, T>, to: usize, from: usize) -> Result<()> {
    swap_lines(a, false, to, from)
}

/// `A <-> B` for `Normal`, otherwise `A := op(B)` and `B := op(A)` at once.
pub fn swap<T: Scalar>(orient: Orientation, a: &mut DistMut<'_, T>, b: &mut DistMut<'_, T>) -> Result<()> {
    let a_old = a.as_ref().to_owned();
    if orient.is_normal() {
        copy(&b.as_ref(), a)?;
        copy(&a_old.as_ref(), b)
    } else {
        let conjugate = orient.conjugates();
        transpose_copy(&b.as_ref(), a, conjugate)?;
        transpose_copy(&a_old.as_ref(), b, conjugate)
    }
}

/// `B := op(A)` on two disjoint windows of the same matrix and vice versa.
fn swap_windows<T: Scalar>(
    a: &mut DistMut<'_, T>,
    conjugate: bool,
    (i0, j0, h0, w0): (usize, usize, usize, usize),
    (i1, j1, h1, w1): (usize, usize, usize, usize),
) -> Result<()> {
    let first = a.as_ref().view(i0, j0, h0, w0).to_owned();
    let second = a.as_ref().view(i1, j1, h1, w1).to_owned();
    transpose_copy(&second.as_ref(), &mut a.view_mut(i0, j0, h0, w0), conjugate)?;
    transpose_copy(&first.as_ref(), &mut a.view_mut(i1, j1, h1, w1), conjugate)
}

/// Applies the permutation `to <-> from` symmetrically (`P A P^T`) to a
/// symmetric (or Hermitian, with `conjugate`) matrix of which only the
/// `uplo` triangle is stored and touched.
pub fn symmetric_swap<T: Scalar>(
    uplo: UpperOrLower,
    a: &mut DistMut<'_, T>,
    to: usize,
    from: usize,
    conjugate: bool,
) -> Result<()> {
    let n = a.height();
    assert_eq!(n, a.width(), "symmetric_swap: matrix must be square, got {}x{}", n, a.width());
    assert!(to < n && from < n, "symmetric_swap: indices {to} and {from} out of range for order {n}");
    if to == from {
        return Ok(());
    }
    let (to, from) = (to.min(from), to.max(from));
    let inner = from - to - 1;

    match uplo {
        UpperOrLower::Lower => {
            if from + 1 < n {
                column_swap(&mut a.view_mut(from + 1, 0, n - from - 1, n), to, from)?;
            }
            if inner > 0 {
                swap_windows(a, conjugate, (to + 1, to, inner, 1), (from, to + 1, 1, inner))?;
            }
        }
        UpperOrLower::Upper => {
            if from + 1 < n {
                row_swap(&mut a.view_mut(0, from + 1, n, n - from - 1), to, from)?;
            }
            if inner > 0 {
                swap_windows(a, conjugate, (to, to + 1, 1, inner), (to + 1, from, inner, 1))?;
            }
        }
    }

    let corner = match uplo {
        UpperOrLower::Lower => (from, to),
        UpperOrLower::Upper => (to, from),
    };
    if conjugate {
        let v = a.as_ref().get(corner.0, corner.1)?;
        a.set(corner.0, corner.1, v.conjugate());
    }

    let d_to = a.as_ref().get(to, to)?;
    let d_from = a.as_ref().get(from, from)?;
    a.set(to, to, d_from);
    a.set(from, from, d_to);

    if to > 0 {
        match uplo {
            UpperOrLower::Lower => row_swap(&mut a.view_mut(0, 0, n, to), to, from)?,
            UpperOrLower::Upper => column_swap(&mut a.view_mut(0, 0, to, n), to, from)?,
        }
    }
    Ok(())
}
