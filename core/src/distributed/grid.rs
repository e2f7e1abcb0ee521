use super::comm::Comm;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

// Context ids of the communicators a grid derives. Two processes can share
// several of them, so each must be distinct.
const VC_CONTEXT: u64 = 1;
const VR_CONTEXT: u64 = 2;
const MC_CONTEXT: u64 = 3;
const MR_CONTEXT: u64 = 4;
const MD_CONTEXT: u64 = 5;
const SELF_CONTEXT: u64 = 6;

/// How world ranks are laid onto the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GridOrder {
    /// World rank `w` sits at `(w % height, w / height)`.
    #[default]
    ColumnMajor,
    /// World rank `w` sits at `(w / width, w % width)`.
    RowMajor,
}

struct GridInner {
    height: usize,
    width: usize,
    order: GridOrder,
    row: usize,
    col: usize,
    gcd: usize,
    lcm: usize,
    world: Comm,
    vc: Comm,
    vr: Comm,
    mc: Comm,
    mr: Comm,
    md: Comm,
    self_comm: Comm,
}

/// A `height x width` arrangement of the processes of a communicator.
///
/// Besides the two grid axes, the grid exposes two "vector" orderings of
/// all processes: VC (column-major, `vc = row + col * height`) and VR
/// (row-major, `vr = col + row * width`). It also splits the processes into
/// `gcd(height, width)` diagonal paths of `lcm(height, width)` processes
/// each: path `p` visits `(k % height, (k + p) % width)` for
/// `k = 0..lcm`, which is how `MD` distributions walk the grid.
///
/// Grids are immutable and cheap to clone; matrices hold a clone.
#[derive(Clone)]
pub struct Grid(Arc<GridInner>);

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grid")
            .field("height", &self.0.height)
            .field("width", &self.0.width)
            .field("row", &self.0.row)
            .field("col", &self.0.col)
            .finish()
    }
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Largest `h <= sqrt(p)` dividing `p`, giving the squarest `h x (p / h)` grid.
pub fn default_height(size: usize) -> usize {
    let mut h = (size as f64).sqrt() as usize;
    while h * h > size {
        h -= 1;
    }
    while (h + 1) * (h + 1) <= size {
        h += 1;
    }
    let mut h = h.max(1);
    while size % h != 0 {
        h -= 1;
    }
    h
}

impl Grid {
    /// The squarest grid over all processes of `comm`, column-major.
    pub fn new(comm: &Comm) -> Result<Grid> {
        let height = default_height(comm.size());
        Grid::with_shape(comm, height, comm.size() / height, GridOrder::ColumnMajor)
    }

    /// # Errors
    ///
    /// [`Error::InvalidGrid`] if `height * width` differs from the size of `comm`.
    pub fn with_shape(comm: &Comm, height: usize, width: usize, order: GridOrder) -> Result<Grid> {
        let size = comm.size();
        if height == 0 || width == 0 || height * width != size {
            return Err(Error::InvalidGrid { height, width, size });
        }

        // Express every grid coordinate as a rank of `comm`.
        let at = |row: usize, col: usize| -> usize {
            let w = match order {
                GridOrder::ColumnMajor => row + col * height,
                GridOrder::RowMajor => col + row * width,
            };
            comm.world_rank(w)
        };
        let me = comm.rank();
        let (row, col) = match order {
            GridOrder::ColumnMajor => (me % height, me / height),
            GridOrder::RowMajor => (me / width, me % width),
        };
        let g = gcd(height, width);
        let lcm = height / g * width;

        // `subset` takes transport ranks, which is what `at` yields.
        let world = comm.clone();
        let vc = comm.subset(
            (0..size).map(|v| at(v % height, v / height)).collect(),
            VC_CONTEXT,
        );
        let vr = comm.subset(
            (0..size).map(|v| at(v / width, v % width)).collect(),
            VR_CONTEXT,
        );
        let mc = comm.subset((0..height).map(|r| at(r, col)).collect(), MC_CONTEXT);
        let mr = comm.subset((0..width).map(|c| at(row, c)).collect(), MR_CONTEXT);
        let path = (col + width - row % width) % g;
        let md = comm.subset(
            (0..lcm).map(|k| at(k % height, (k + path) % width)).collect(),
            MD_CONTEXT,
        );
        let self_comm = comm.subset(vec![at(row, col)], SELF_CONTEXT);

        info!(height, width, ?order, "created process grid");
        Ok(Grid(Arc::new(GridInner {
            height,
            width,
            order,
            row,
            col,
            gcd: g,
            lcm,
            world,
            vc,
            vr,
            mc,
            mr,
            md,
            self_comm,
        })))
    }

    pub fn height(&self) -> usize {
        self.0.height
    }

    pub fn width(&self) -> usize {
        self.0.width
    }

    pub fn size(&self) -> usize {
        self.0.height * self.0.width
    }

    pub fn order(&self) -> GridOrder {
        self.0.order
    }

    /// The calling process's rank in column-major (VC) order.
    pub fn rank(&self) -> usize {
        self.vc_rank()
    }

    pub fn row(&self) -> usize {
        self.0.row
    }

    pub fn col(&self) -> usize {
        self.0.col
    }

    pub fn vc_rank(&self) -> usize {
        self.0.row + self.0.col * self.0.height
    }

    pub fn vr_rank(&self) -> usize {
        self.0.col + self.0.row * self.0.width
    }

    pub fn gcd(&self) -> usize {
        self.0.gcd
    }

    pub fn lcm(&self) -> usize {
        self.0.lcm
    }

    /// Diagonal path through grid position `(row, col)`.
    pub fn diag_path_of(&self, row: usize, col: usize) -> usize {
        (col + self.0.width - row % self.0.width) % self.0.gcd
    }

    /// Position of `(row, col)` along its diagonal path.
    pub fn diag_path_rank_of(&self, row: usize, col: usize) -> usize {
        let (h, w) = (self.0.height, self.0.width);
        let path = self.diag_path_of(row, col);
        (0..self.0.lcm / h)
            .map(|t| row + t * h)
            .find(|&k| (k + path) % w == col)
            .unwrap_or_else(|| unreachable!("({row}, {col}) lies on diagonal path {path}"))
    }

    pub fn diag_path(&self) -> usize {
        self.diag_path_of(self.0.row, self.0.col)
    }

    pub fn diag_path_rank(&self) -> usize {
        self.diag_path_rank_of(self.0.row, self.0.col)
    }

    /// Grid coordinates of the process with VC rank `vc`.
    pub fn coords_of_vc(&self, vc: usize) -> (usize, usize) {
        (vc % self.0.height, vc / self.0.height)
    }

    /// Grid coordinates of the process with VR rank `vr`.
    pub fn coords_of_vr(&self, vr: usize) -> (usize, usize) {
        (vr / self.0.width, vr % self.0.width)
    }

    /// The communicator the grid was built from, in its original order.
    pub fn world_comm(&self) -> &Comm {
        &self.0.world
    }

    /// All processes, ordered by VC rank.
    pub fn vc_comm(&self) -> &Comm {
        &self.0.vc
    }

    /// All processes, ordered by VR rank.
    pub fn vr_comm(&self) -> &Comm {
        &self.0.vr
    }

    /// The processes of this grid column, ordered by row.
    pub fn mc_comm(&self) -> &Comm {
        &self.0.mc
    }

    /// The processes of this grid row, ordered by column.
    pub fn mr_comm(&self) -> &Comm {
        &self.0.mr
    }

    /// The processes of this diagonal path, ordered along the path.
    pub fn md_comm(&self) -> &Comm {
        &self.0.md
    }

    pub fn self_comm(&self) -> &Comm {
        &self.0.self_comm
    }

    /// Whether two handles refer to the same grid object.
    pub fn same_as(&self, other: &Grid) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_height_is_squarest_divisor() {
        assert_eq!(default_height(1), 1);
        assert_eq!(default_height(4), 2);
        assert_eq!(default_height(6), 2);
        assert_eq!(default_height(7), 1);
        assert_eq!(default_height(12), 3);
        assert_eq!(default_height(16), 4);
    }

    #[test]
    fn test_gcd() {
        assert_eq!(gcd(4, 6), 2);
        assert_eq!(gcd(3, 2), 1);
        assert_eq!(gcd(5, 5), 5);
    }
}
