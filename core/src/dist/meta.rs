use super::{Dist, Distribution, length, owner, shift};
use crate::distributed::Grid;

/// One dimension of a distributed matrix: its global length, how it is
/// distributed and where the distribution starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimMeta {
    pub dist: Dist,
    pub len: usize,
    pub align: usize,
}

impl DimMeta {
    pub fn stride(&self, grid: &Grid) -> usize {
        self.dist.stride(grid)
    }

    /// First global index held by the process at `(row, col)`.
    pub fn shift_at(&self, grid: &Grid, row: usize, col: usize) -> usize {
        shift(self.dist.rank_at(grid, row, col), self.align, self.stride(grid))
    }

    /// Global indices held by the process at `(row, col)`, ignoring whether
    /// that process participates in the matrix at all.
    pub fn indices_at(&self, grid: &Grid, row: usize, col: usize) -> impl Iterator<Item = usize> + use<> {
        let stride = self.stride(grid);
        (self.shift_at(grid, row, col)..self.len).step_by(stride)
    }

    /// Whether the distribution rank `rank` holds global index `i`.
    pub fn holds(&self, grid: &Grid, rank: usize, i: usize) -> bool {
        owner(i, self.align, self.stride(grid)) == rank
    }
}

/// Answers "does this process hold index `i`" along one dimension.
#[derive(Debug, Clone, Copy)]
pub struct IndexOwner {
    participates: bool,
    rank: usize,
    align: usize,
    stride: usize,
}

impl IndexOwner {
    #[inline]
    pub fn holds(&self, i: usize) -> bool {
        self.participates && owner(i, self.align, self.stride) == self.rank
    }
}

/// Everything about a distributed matrix except its local data.
///
/// `root` only matters for `MD` (the diagonal path holding the matrix) and
/// `CIRC` (the VC rank holding the matrix). Processes outside the root
/// hold an empty local block.
#[derive(Debug, Clone)]
pub struct DistMeta {
    grid: Grid,
    dist: Distribution,
    height: usize,
    width: usize,
    col_align: usize,
    row_align: usize,
    root: usize,
}

impl DistMeta {
    /// # Panics
    ///
    /// On an unsupported distribution pair, an alignment outside
    /// `0..stride` or a root outside the grid.
    pub fn new(
        grid: Grid,
        dist: Distribution,
        height: usize,
        width: usize,
        col_align: usize,
        row_align: usize,
        root: usize,
    ) -> Self {
        assert!(dist.is_supported(), "unsupported distribution {dist}");
        let (cs, rs) = (dist.col.stride(&grid), dist.row.stride(&grid));
        assert!(col_align < cs, "column alignment {col_align} out of range for {dist} (stride {cs})");
        assert!(row_align < rs, "row alignment {row_align} out of range for {dist} (stride {rs})");
        let roots = if matches!(dist.col, Dist::Circ) {
            grid.size()
        } else if matches!(dist.col, Dist::Md) || matches!(dist.row, Dist::Md) {
            grid.gcd()
        } else {
            1
        };
        assert!(root < roots.max(1), "root {root} out of range for {dist}");
        Self {
            grid,
            dist,
            height,
            width,
            col_align,
            row_align,
            root,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn dist(&self) -> Distribution {
        self.dist
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn col_align(&self) -> usize {
        self.col_align
    }

    pub fn row_align(&self) -> usize {
        self.row_align
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn col_dim(&self) -> DimMeta {
        DimMeta {
            dist: self.dist.col,
            len: self.height,
            align: self.col_align,
        }
    }

    pub fn row_dim(&self) -> DimMeta {
        DimMeta {
            dist: self.dist.row,
            len: self.width,
            align: self.row_align,
        }
    }

    pub fn col_stride(&self) -> usize {
        self.dist.col.stride(&self.grid)
    }

    pub fn row_stride(&self) -> usize {
        self.dist.row.stride(&self.grid)
    }

    /// Whether the process at `(row, col)` stores any part of the matrix.
    pub fn participates_at(&self, row: usize, col: usize) -> bool {
        let on_path = |d: Dist| d != Dist::Md || self.grid.diag_path_of(row, col) == self.root;
        let is_root = |d: Dist| d != Dist::Circ || row + col * self.grid.height() == self.root;
        on_path(self.dist.col) && on_path(self.dist.row) && is_root(self.dist.col) && is_root(self.dist.row)
    }

    pub fn participating(&self) -> bool {
        self.participates_at(self.grid.row(), self.grid.col())
    }

    pub fn col_shift_at(&self, row: usize, col: usize) -> usize {
        self.col_dim().shift_at(&self.grid, row, col)
    }

    pub fn row_shift_at(&self, row: usize, col: usize) -> usize {
        self.row_dim().shift_at(&self.grid, row, col)
    }

    pub fn col_shift(&self) -> usize {
        self.col_shift_at(self.grid.row(), self.grid.col())
    }

    pub fn row_shift(&self) -> usize {
        self.row_shift_at(self.grid.row(), self.grid.col())
    }

    /// Local height on the process at `(row, col)`.
    pub fn local_height_at(&self, row: usize, col: usize) -> usize {
        if !self.participates_at(row, col) {
            return 0;
        }
        length(self.height, self.col_shift_at(row, col), self.col_stride())
    }

    /// Local width on the process at `(row, col)`.
    pub fn local_width_at(&self, row: usize, col: usize) -> usize {
        if !self.participates_at(row, col) {
            return 0;
        }
        length(self.width, self.row_shift_at(row, col), self.row_stride())
    }

    pub fn local_height(&self) -> usize {
        self.local_height_at(self.grid.row(), self.grid.col())
    }

    pub fn local_width(&self) -> usize {
        self.local_width_at(self.grid.row(), self.grid.col())
    }

    /// Global rows stored on the process at `(row, col)`, in local order.
    pub fn rows_at(&self, row: usize, col: usize) -> Vec<usize> {
        if !self.participates_at(row, col) {
            return Vec::new();
        }
        self.col_dim().indices_at(&self.grid, row, col).collect()
    }

    /// Global columns stored on the process at `(row, col)`, in local order.
    pub fn cols_at(&self, row: usize, col: usize) -> Vec<usize> {
        if !self.participates_at(row, col) {
            return Vec::new();
        }
        self.row_dim().indices_at(&self.grid, row, col).collect()
    }

    /// Row ownership of the process at `(row, col)`.
    pub fn col_owner_at(&self, row: usize, col: usize) -> IndexOwner {
        IndexOwner {
            participates: self.participates_at(row, col),
            rank: self.dist.col.rank_at(&self.grid, row, col),
            align: self.col_align,
            stride: self.col_stride(),
        }
    }

    /// Column ownership of the process at `(row, col)`.
    pub fn row_owner_at(&self, row: usize, col: usize) -> IndexOwner {
        IndexOwner {
            participates: self.participates_at(row, col),
            rank: self.dist.row.rank_at(&self.grid, row, col),
            align: self.row_align,
            stride: self.row_stride(),
        }
    }

    /// Whether the process at `(row, col)` stores entry `(i, j)`.
    pub fn owns_at(&self, i: usize, j: usize, row: usize, col: usize) -> bool {
        self.col_owner_at(row, col).holds(i) && self.row_owner_at(row, col).holds(j)
    }

    pub fn owns(&self, i: usize, j: usize) -> bool {
        self.owns_at(i, j, self.grid.row(), self.grid.col())
    }

    /// Whether the calling process is the designated owner of `(i, j)`:
    /// it owns the entry and sits at coordinate zero on every grid axis
    /// along which the entry is replicated. Exactly one process qualifies.
    pub fn is_canonical_owner(&self, i: usize, j: usize) -> bool {
        self.owns(i, j) && self.is_canonical_at(self.grid.row(), self.grid.col())
    }

    /// Whether the process at `(row, col)` is the designated owner of every
    /// entry it stores. The blocks of these processes tile the matrix.
    pub fn is_canonical_at(&self, row: usize, col: usize) -> bool {
        let (row_axis, col_axis) = self.dist.axes();
        self.participates_at(row, col) && (row_axis || row == 0) && (col_axis || col == 0)
    }

    /// Local row index of global row `i`; the caller must own it.
    #[inline]
    pub fn local_row(&self, i: usize) -> usize {
        (i - self.col_shift()) / self.col_stride()
    }

    #[inline]
    pub fn local_col(&self, j: usize) -> usize {
        (j - self.row_shift()) / self.row_stride()
    }

    #[inline]
    pub fn global_row(&self, i_loc: usize) -> usize {
        self.col_shift() + i_loc * self.col_stride()
    }

    #[inline]
    pub fn global_col(&self, j_loc: usize) -> usize {
        self.row_shift() + j_loc * self.row_stride()
    }

    /// Metadata of the same distribution with a new shape and alignments.
    pub fn reshaped(&self, height: usize, width: usize, col_align: usize, row_align: usize) -> DistMeta {
        DistMeta::new(self.grid.clone(), self.dist, height, width, col_align, row_align, self.root)
    }

    /// Metadata of the `height x width` window starting at `(i, j)`, along
    /// with where that window starts inside the local block.
    ///
    /// # Panics
    ///
    /// If the window does not fit.
    pub fn window(&self, i: usize, j: usize, height: usize, width: usize) -> (DistMeta, usize, usize) {
        assert!(
            i + height <= self.height && j + width <= self.width,
            "window ({i}, {j}) {height}x{width} exceeds {}x{} matrix",
            self.height,
            self.width
        );
        let (cs, rs) = (self.col_stride(), self.row_stride());
        let meta = DistMeta {
            grid: self.grid.clone(),
            dist: self.dist,
            height,
            width,
            col_align: (self.col_align + i) % cs,
            row_align: (self.row_align + j) % rs,
            root: self.root,
        };
        if !self.participating() {
            return (meta, 0, 0);
        }
        let i_loc = length(i, self.col_shift(), cs);
        let j_loc = length(j, self.row_shift(), rs);
        (meta, i_loc, j_loc)
    }

    /// Same distribution, grid, shape and alignments.
    pub fn conforms(&self, other: &DistMeta) -> bool {
        self.grid.same_as(&other.grid)
            && self.dist == other.dist
            && self.height == other.height
            && self.width == other.width
            && self.col_align == other.col_align
            && self.row_align == other.row_align
            && self.root == other.root
    }
}
