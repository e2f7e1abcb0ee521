//! Global-index access with ownership routing.
//!
//! Reads are collective over the whole grid: the single canonical owner of
//! each entry contributes it verbatim and everyone receives the result. Writes are
//! local: owners write, everybody else does nothing, so every process must
//! pass the same values.

use super::matrix::{DistMatrix, DistMut, DistRef};
use super::meta::DistMeta;
use crate::error::Result;
use crate::matrix::Matrix;
use gridla_kernels::Scalar;

/// Number of entries on diagonal `offset` of a `height x width` matrix.
/// Positive offsets are above the main diagonal.
pub fn diagonal_length(height: usize, width: usize, offset: isize) -> usize {
    if offset >= 0 {
        height.min(width.saturating_sub(offset.unsigned_abs()))
    } else {
        height.saturating_sub(offset.unsigned_abs()).min(width)
    }
}

fn diagonal_entry(k: usize, offset: isize) -> (usize, usize) {
    if offset >= 0 {
        (k, k + offset.unsigned_abs())
    } else {
        (k + offset.unsigned_abs(), k)
    }
}

fn check_entry(meta: &DistMeta, i: usize, j: usize) {
    assert!(
        i < meta.height() && j < meta.width(),
        "entry ({i}, {j}) out of range for {}x{} matrix",
        meta.height(),
        meta.width()
    );
}

/// VC rank of the process that answers reads of `(i, j)`.
fn canonical_owner(meta: &DistMeta, i: usize, j: usize) -> usize {
    let grid = meta.grid();
    let (row_axis, col_axis) = meta.dist().axes();
    let rows = if row_axis { 0..grid.height() } else { 0..1 };
    for row in rows {
        let cols = if col_axis { 0..grid.width() } else { 0..1 };
        for col in cols {
            if meta.owns_at(i, j, row, col) {
                return row + col * grid.height();
            }
        }
    }
    unreachable!("entry ({i}, {j}) of a {} matrix has no owner", meta.dist())
}

impl<T: Scalar> DistRef<'_, T> {
    /// Global entry `(i, j)`, returned on every process.
    pub fn get(&self, i: usize, j: usize) -> Result<T> {
        let meta = self.meta();
        check_entry(meta, i, j);
        let root = canonical_owner(meta, i, j);
        let mine = if meta.grid().vc_rank() == root {
            vec![self.get_local(meta.local_row(i), meta.local_col(j))]
        } else {
            Vec::new()
        };
        let value = meta.grid().vc_comm().broadcast(mine, root)?;
        Ok(value[0])
    }

    /// Gathers the listed entries onto every process, in list order.
    ///
    /// Each canonical owner ships only the entries it answers for; the
    /// receivers recompute the owner of every entry and take values from
    /// the owners' buffers in the same order.
    fn gather_entries(&self, entries: &[(usize, usize)]) -> Result<Vec<T>> {
        let meta = self.meta();
        let me = meta.grid().vc_rank();
        let owners: Vec<usize> = entries
            .iter()
            .map(|&(i, j)| {
                check_entry(meta, i, j);
                canonical_owner(meta, i, j)
            })
            .collect();
        let mine: Vec<T> = entries
            .iter()
            .zip(&owners)
            .filter(|&(_, &q)| q == me)
            .map(|(&(i, j), _)| self.get_local(meta.local_row(i), meta.local_col(j)))
            .collect();
        let gathered = meta.grid().vc_comm().all_gather(mine)?;
        let mut cursors: Vec<_> = gathered.into_iter().map(Vec::into_iter).collect();
        let mut out = Vec::with_capacity(entries.len());
        for &q in &owners {
            match cursors[q].next() {
                Some(v) => out.push(v),
                None => unreachable!("VC rank {q} sent fewer entries than it owns"),
            }
        }
        Ok(out)
    }

    /// The sub-matrix at the given global rows and columns, replicated on
    /// every process.
    pub fn get_submatrix(&self, rows: &[usize], cols: &[usize]) -> Result<Matrix<T>> {
        let entries: Vec<(usize, usize)> = cols
            .iter()
            .flat_map(|&j| rows.iter().map(move |&i| (i, j)))
            .collect();
        let values = self.gather_entries(&entries)?;
        Ok(Matrix::from_column_major(rows.len(), cols.len(), values))
    }

    /// Diagonal `offset` as a replicated column vector.
    pub fn get_diagonal(&self, offset: isize) -> Result<Matrix<T>> {
        let meta = self.meta();
        let len = diagonal_length(meta.height(), meta.width(), offset);
        let entries: Vec<(usize, usize)> = (0..len).map(|k| diagonal_entry(k, offset)).collect();
        let values = self.gather_entries(&entries)?;
        Ok(Matrix::from_column_major(len, 1, values))
    }

    /// Gathers the whole matrix onto every process.
    ///
    /// Every canonical owner contributes its local block as is and the
    /// receivers scatter each block to the global indices its owner stores.
    pub fn to_global(&self) -> Result<Matrix<T>> {
        let meta = self.meta();
        let grid = meta.grid();
        let mine = if meta.is_canonical_at(grid.row(), grid.col()) {
            self.local().to_vec()
        } else {
            Vec::new()
        };
        let blocks = grid.vc_comm().all_gather(mine)?;
        let mut out = Matrix::zeros(meta.height(), meta.width());
        for (q, block) in blocks.into_iter().enumerate() {
            let (row, col) = grid.coords_of_vc(q);
            if !meta.is_canonical_at(row, col) {
                continue;
            }
            let (rows, cols) = (meta.rows_at(row, col), meta.cols_at(row, col));
            debug_assert_eq!(block.len(), rows.len() * cols.len());
            for (b, &j) in cols.iter().enumerate() {
                for (a, &i) in rows.iter().enumerate() {
                    out.set(i, j, block[a + b * rows.len()]);
                }
            }
        }
        Ok(out)
    }
}

impl<T: Scalar> DistMut<'_, T> {
    /// Writes `value` at `(i, j)` on every owner.
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        self.write(i, j, |_| value);
    }

    /// Adds `value` to `(i, j)` on every owner.
    pub fn update(&mut self, i: usize, j: usize, value: T) {
        self.write(i, j, |old| old + value);
    }

    fn write(&mut self, i: usize, j: usize, f: impl FnOnce(T) -> T) {
        let meta = self.meta().clone();
        check_entry(&meta, i, j);
        if meta.owns(i, j) {
            let (il, jl) = (meta.local_row(i), meta.local_col(j));
            let old = self.get_local(il, jl);
            self.set_local(il, jl, f(old));
        }
    }

    /// Sets the entries at the given rows and columns from a replicated matrix.
    pub fn set_submatrix(&mut self, rows: &[usize], cols: &[usize], values: &Matrix<T>) {
        self.update_submatrix_with(rows, cols, values, |_, v| v);
    }

    /// Adds `alpha` times a replicated matrix to the entries at the given
    /// rows and columns.
    pub fn update_submatrix(&mut self, rows: &[usize], cols: &[usize], alpha: T, values: &Matrix<T>) {
        self.update_submatrix_with(rows, cols, values, |old, v| old + alpha * v);
    }

    fn update_submatrix_with(&mut self, rows: &[usize], cols: &[usize], values: &Matrix<T>, f: impl Fn(T, T) -> T) {
        assert_eq!(
            (values.height(), values.width()),
            (rows.len(), cols.len()),
            "sub-matrix of {}x{} indices given {}x{} values",
            rows.len(),
            cols.len(),
            values.height(),
            values.width()
        );
        let meta = self.meta().clone();
        for (b, &j) in cols.iter().enumerate() {
            for (a, &i) in rows.iter().enumerate() {
                check_entry(&meta, i, j);
                if meta.owns(i, j) {
                    let (il, jl) = (meta.local_row(i), meta.local_col(j));
                    let old = self.get_local(il, jl);
                    self.set_local(il, jl, f(old, values.get(a, b)));
                }
            }
        }
    }

    /// Overwrites diagonal `offset` with the replicated column vector `d`.
    pub fn set_diagonal(&mut self, d: &Matrix<T>, offset: isize) {
        self.update_diagonal_with(d, offset, |_, v| v);
    }

    /// Adds `alpha * d` to diagonal `offset`.
    pub fn update_diagonal(&mut self, alpha: T, d: &Matrix<T>, offset: isize) {
        self.update_diagonal_with(d, offset, |old, v| old + alpha * v);
    }

    fn update_diagonal_with(&mut self, d: &Matrix<T>, offset: isize, f: impl Fn(T, T) -> T) {
        let meta = self.meta().clone();
        let len = diagonal_length(meta.height(), meta.width(), offset);
        assert!(
            d.height() == len && d.width() == 1,
            "diagonal {offset} of a {}x{} matrix has length {len}, got {}x{}",
            meta.height(),
            meta.width(),
            d.height(),
            d.width()
        );
        for k in 0..len {
            let (i, j) = diagonal_entry(k, offset);
            if meta.owns(i, j) {
                let (il, jl) = (meta.local_row(i), meta.local_col(j));
                let old = self.get_local(il, jl);
                self.set_local(il, jl, f(old, d.get(k, 0)));
            }
        }
    }
}

impl<T: Scalar> DistMatrix<T> {
    pub fn get(&self, i: usize, j: usize) -> Result<T> {
        self.as_ref().get(i, j)
    }

    pub fn set(&mut self, i: usize, j: usize, value: T) {
        self.as_mut().set(i, j, value);
    }

    pub fn update(&mut self, i: usize, j: usize, value: T) {
        self.as_mut().update(i, j, value);
    }

    pub fn get_submatrix(&self, rows: &[usize], cols: &[usize]) -> Result<Matrix<T>> {
        self.as_ref().get_submatrix(rows, cols)
    }

    pub fn set_submatrix(&mut self, rows: &[usize], cols: &[usize], values: &Matrix<T>) {
        self.as_mut().set_submatrix(rows, cols, values);
    }

    pub fn update_submatrix(&mut self, rows: &[usize], cols: &[usize], alpha: T, values: &Matrix<T>) {
        self.as_mut().update_submatrix(rows, cols, alpha, values);
    }

    pub fn get_diagonal(&self, offset: isize) -> Result<Matrix<T>> {
        self.as_ref().get_diagonal(offset)
    }

    pub fn set_diagonal(&mut self, d: &Matrix<T>, offset: isize) {
        self.as_mut().set_diagonal(d, offset);
    }

    pub fn update_diagonal(&mut self, alpha: T, d: &Matrix<T>, offset: isize) {
        self.as_mut().update_diagonal(alpha, d, offset);
    }

    pub fn to_global(&self) -> Result<Matrix<T>> {
        self.as_ref().to_global()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagonal_length() {
        assert_eq!(diagonal_length(4, 6, 0), 4);
        assert_eq!(diagonal_length(4, 6, 3), 3);
        assert_eq!(diagonal_length(4, 6, 7), 0);
        assert_eq!(diagonal_length(4, 6, -1), 3);
        assert_eq!(diagonal_length(4, 6, -5), 0);
        assert_eq!(diagonal_entry(2, -1), (3, 2));
        assert_eq!(diagonal_entry(2, 2), (2, 4));
    }
}
