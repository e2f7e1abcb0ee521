use super::meta::{DimMeta, DistMeta};
use super::{Dist, Distribution};
use crate::distributed::Grid;
use crate::matrix::Matrix;
use gridla_kernels::{MatrixMut, MatrixRef, Scalar};

/// A `height x width` matrix spread over a [`Grid`] according to a
/// [`Distribution`].
///
/// Each process owns the local block of entries it is responsible for,
/// stored as a column-major [`Matrix`]. Read-only and mutable windows are
/// handed out as [`DistRef`] and [`DistMut`], which borrow from the matrix.
#[derive(Debug, Clone)]
pub struct DistMatrix<T> {
    meta: DistMeta,
    local: Matrix<T>,
}

/// A borrowed, read-only window of a distributed matrix.
#[derive(Debug, Clone)]
pub struct DistRef<'a, T> {
    meta: DistMeta,
    local: MatrixRef<'a, T>,
}

/// A borrowed, mutable window of a distributed matrix.
#[derive(Debug)]
pub struct DistMut<'a, T> {
    meta: DistMeta,
    local: MatrixMut<'a, T>,
}

macro_rules! meta_accessors {
    () => {
        pub fn meta(&self) -> &DistMeta {
            &self.meta
        }

        pub fn grid(&self) -> &Grid {
            self.meta.grid()
        }

        pub fn dist(&self) -> Distribution {
            self.meta.dist()
        }

        pub fn height(&self) -> usize {
            self.meta.height()
        }

        pub fn width(&self) -> usize {
            self.meta.width()
        }

        pub fn col_align(&self) -> usize {
            self.meta.col_align()
        }

        pub fn row_align(&self) -> usize {
            self.meta.row_align()
        }

        pub fn root(&self) -> usize {
            self.meta.root()
        }

        pub fn col_shift(&self) -> usize {
            self.meta.col_shift()
        }

        pub fn row_shift(&self) -> usize {
            self.meta.row_shift()
        }

        pub fn col_stride(&self) -> usize {
            self.meta.col_stride()
        }

        pub fn row_stride(&self) -> usize {
            self.meta.row_stride()
        }

        pub fn local_height(&self) -> usize {
            self.meta.local_height()
        }

        pub fn local_width(&self) -> usize {
            self.meta.local_width()
        }

        pub fn participating(&self) -> bool {
            self.meta.participating()
        }
    };
}

/// The alignment `dim` must take so that it lines up with `target`, if the
/// two distributions are related at all.
fn compatible_align(grid: &Grid, dim: Dist, target: DimMeta) -> Option<usize> {
    match (dim, target.dist) {
        (Dist::Star | Dist::Circ, _) => Some(0),
        (d, t) if d == t => Some(target.align),
        (Dist::Mc, Dist::Vc) => Some(target.align % grid.height()),
        (Dist::Mr, Dist::Vr) => Some(target.align % grid.width()),
        (Dist::Vc, Dist::Mc) | (Dist::Vr, Dist::Mr) => Some(target.align),
        _ => None,
    }
}

impl<T: Scalar> DistMatrix<T> {
    meta_accessors!();

    /// An empty `0 x 0` matrix.
    pub fn new(grid: &Grid, dist: Distribution) -> Self {
        Self::zeros(grid, dist, 0, 0)
    }

    pub fn zeros(grid: &Grid, dist: Distribution, height: usize, width: usize) -> Self {
        Self::aligned(grid, dist, height, width, 0, 0, 0)
    }

    pub fn aligned(
        grid: &Grid,
        dist: Distribution,
        height: usize,
        width: usize,
        col_align: usize,
        row_align: usize,
        root: usize,
    ) -> Self {
        Self::from_meta(DistMeta::new(
            grid.clone(),
            dist,
            height,
            width,
            col_align,
            row_align,
            root,
        ))
    }

    /// Zero matrix with the given layout.
    pub fn from_meta(meta: DistMeta) -> Self {
        let local = Matrix::zeros(meta.local_height(), meta.local_width());
        Self { meta, local }
    }

    /// Wraps an existing local block.
    ///
    /// # Panics
    ///
    /// If `local` does not have the local shape `meta` prescribes.
    pub fn from_local(meta: DistMeta, local: Matrix<T>) -> Self {
        assert_eq!(
            (local.height(), local.width()),
            (meta.local_height(), meta.local_width()),
            "local block does not match {} layout of a {}x{} matrix",
            meta.dist(),
            meta.height(),
            meta.width()
        );
        Self { meta, local }
    }

    /// Distributes a matrix that every process holds in full. Each process
    /// keeps the entries it owns; no communication takes place.
    pub fn from_global(grid: &Grid, dist: Distribution, global: &Matrix<T>) -> Self {
        let mut out = Self::zeros(grid, dist, global.height(), global.width());
        let meta = out.meta.clone();
        out.local
            .as_mut()
            .for_each_mut(|i, j, v| *v = global.get(meta.global_row(i), meta.global_col(j)));
        out
    }

    pub fn local(&self) -> &Matrix<T> {
        &self.local
    }

    pub fn local_mut(&mut self) -> &mut Matrix<T> {
        &mut self.local
    }

    pub fn into_local(self) -> Matrix<T> {
        self.local
    }

    /// Reallocates to `height x width` zeros, keeping distribution and alignments.
    pub fn resize(&mut self, height: usize, width: usize) {
        let (ca, ra) = (self.col_align(), self.row_align());
        self.align_and_resize(ca, ra, height, width);
    }

    /// Back to `0 x 0` with default alignments.
    pub fn empty(&mut self) {
        self.meta = DistMeta::new(self.grid().clone(), self.dist(), 0, 0, 0, 0, 0);
        self.local = Matrix::zeros(0, 0);
    }

    /// Changes the alignments and zeroes the contents.
    pub fn align(&mut self, col_align: usize, row_align: usize) {
        let (h, w) = (self.height(), self.width());
        self.align_and_resize(col_align, row_align, h, w);
    }

    pub fn align_and_resize(&mut self, col_align: usize, row_align: usize, height: usize, width: usize) {
        self.meta = self.meta.reshaped(height, width, col_align, row_align);
        self.local = Matrix::zeros(self.meta.local_height(), self.meta.local_width());
    }

    /// Moves the matrix to another diagonal path (`MD`) or owning process
    /// (`CIRC`). Contents are zeroed.
    pub fn set_root(&mut self, root: usize) {
        let m = &self.meta;
        self.meta = DistMeta::new(
            m.grid().clone(),
            m.dist(),
            m.height(),
            m.width(),
            m.col_align(),
            m.row_align(),
            root,
        );
        self.local = Matrix::zeros(self.meta.local_height(), self.meta.local_width());
    }

    /// Picks alignments under which each dimension lines up with the
    /// matching dimension of `other`, so that local blocks pair up without
    /// communication. Dimensions with no counterpart keep their alignment.
    /// Contents are zeroed.
    pub fn align_with(&mut self, other: &DistMeta) {
        let grid = self.grid().clone();
        let find = |d: Dist, current: usize| {
            compatible_align(&grid, d, other.col_dim())
                .or_else(|| compatible_align(&grid, d, other.row_dim()))
                .unwrap_or(current)
        };
        let col_align = find(self.dist().col, self.col_align());
        let row_align = find(self.dist().row, self.row_align());
        self.align(col_align, row_align);
    }

    pub fn as_ref(&self) -> DistRef<'_, T> {
        DistRef {
            meta: self.meta.clone(),
            local: self.local.as_ref(),
        }
    }

    pub fn as_mut(&mut self) -> DistMut<'_, T> {
        DistMut {
            meta: self.meta.clone(),
            local: self.local.as_mut(),
        }
    }

    /// Read-only window of rows `i..i + height` and columns `j..j + width`.
    pub fn view(&self, i: usize, j: usize, height: usize, width: usize) -> DistRef<'_, T> {
        self.as_ref().view(i, j, height, width)
    }

    pub fn view_mut(&mut self, i: usize, j: usize, height: usize, width: usize) -> DistMut<'_, T> {
        self.as_mut().into_view(i, j, height, width)
    }

    #[inline]
    pub fn get_local(&self, i_loc: usize, j_loc: usize) -> T {
        self.local.get(i_loc, j_loc)
    }

    #[inline]
    pub fn set_local(&mut self, i_loc: usize, j_loc: usize, value: T) {
        self.local.set(i_loc, j_loc, value);
    }

    #[inline]
    pub fn update_local(&mut self, i_loc: usize, j_loc: usize, value: T) {
        self.local.update(i_loc, j_loc, value);
    }
}

impl<'a, T: Scalar> DistRef<'a, T> {
    meta_accessors!();

    pub(crate) fn from_parts(meta: DistMeta, local: MatrixRef<'a, T>) -> Self {
        debug_assert_eq!((local.height(), local.width()), (meta.local_height(), meta.local_width()));
        Self { meta, local }
    }

    pub fn local(&self) -> MatrixRef<'a, T> {
        self.local
    }

    pub fn view(&self, i: usize, j: usize, height: usize, width: usize) -> DistRef<'a, T> {
        let (meta, i_loc, j_loc) = self.meta.window(i, j, height, width);
        let local = self
            .local
            .view(i_loc, j_loc, meta.local_height(), meta.local_width());
        DistRef { meta, local }
    }

    #[inline]
    pub fn get_local(&self, i_loc: usize, j_loc: usize) -> T {
        self.local.get(i_loc, j_loc)
    }

    /// Copies the window into a new, independently owned matrix.
    pub fn to_owned(&self) -> DistMatrix<T> {
        let local = Matrix::from_column_major(self.local.height(), self.local.width(), self.local.to_vec());
        DistMatrix {
            meta: self.meta.clone(),
            local,
        }
    }
}

impl<'a, T: Scalar> DistMut<'a, T> {
    meta_accessors!();

    pub fn local(&self) -> MatrixRef<'_, T> {
        self.local.as_ref()
    }

    pub fn local_mut(&mut self) -> MatrixMut<'_, T> {
        self.local.reborrow()
    }

    pub fn as_ref(&self) -> DistRef<'_, T> {
        DistRef {
            meta: self.meta.clone(),
            local: self.local.as_ref(),
        }
    }

    pub fn reborrow(&mut self) -> DistMut<'_, T> {
        DistMut {
            meta: self.meta.clone(),
            local: self.local.reborrow(),
        }
    }

    pub fn view_mut(&mut self, i: usize, j: usize, height: usize, width: usize) -> DistMut<'_, T> {
        self.reborrow().into_view(i, j, height, width)
    }

    pub fn into_view(self, i: usize, j: usize, height: usize, width: usize) -> DistMut<'a, T> {
        let (meta, i_loc, j_loc) = self.meta.window(i, j, height, width);
        let (lh, lw) = (meta.local_height(), meta.local_width());
        let local = self.local.into_view(i_loc, j_loc, lh, lw);
        DistMut { meta, local }
    }

    #[inline]
    pub fn get_local(&self, i_loc: usize, j_loc: usize) -> T {
        self.local.get(i_loc, j_loc)
    }

    #[inline]
    pub fn set_local(&mut self, i_loc: usize, j_loc: usize, value: T) {
        self.local.set(i_loc, j_loc, value);
    }

    #[inline]
    pub fn update_local(&mut self, i_loc: usize, j_loc: usize, value: T) {
        let old = self.local.get(i_loc, j_loc);
        self.local.set(i_loc, j_loc, old + value);
    }

    /// Overwrites the local block with `src`'s, which must have the same layout.
    pub fn copy_local_from(&mut self, src: &DistRef<'_, T>) {
        assert!(
            self.meta.conforms(src.meta()),
            "local copy between non-conforming {} {}x{} and {} {}x{}",
            src.dist(),
            src.height(),
            src.width(),
            self.dist(),
            self.height(),
            self.width()
        );
        self.local.copy_from(&src.local());
    }
}
