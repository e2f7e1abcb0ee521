//! Borrowed column-major matrix views.
//!
//! A view is a slice plus `(height, width, ldim)`. Views are cheap to create,
//! never own memory, and the borrow checker guarantees that they cannot
//! outlive the buffer they look into.

/// Number of slice elements a `height x width` block with leading dimension
/// `ldim` touches.
#[inline]
pub fn extent(height: usize, width: usize, ldim: usize) -> usize {
    if height == 0 || width == 0 {
        0
    } else {
        (width - 1) * ldim + height
    }
}

#[inline]
fn check_shape(len: usize, height: usize, width: usize, ldim: usize) {
    assert!(
        ldim >= height.max(1),
        "leading dimension {ldim} is smaller than height {height}"
    );
    assert!(
        len >= extent(height, width, ldim),
        "buffer of length {len} cannot hold a {height}x{width} block with ldim {ldim}"
    );
}

/// Maps the local row (or column) index of a block to its global index:
/// `global = shift + local * stride`.
///
/// Kernels that mask by triangle use it so that "lower" and "upper" refer to
/// the global matrix even when the local block is a strided sample of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexMap {
    pub shift: usize,
    pub stride: usize,
}

impl IndexMap {
    pub const IDENTITY: IndexMap = IndexMap { shift: 0, stride: 1 };

    pub fn new(shift: usize, stride: usize) -> Self {
        Self { shift, stride }
    }

    #[inline]
    pub fn global(&self, local: usize) -> usize {
        self.shift + local * self.stride
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MatrixRef<'a, T> {
    data: &'a [T],
    height: usize,
    width: usize,
    ldim: usize,
}

impl<'a, T: Copy> MatrixRef<'a, T> {
    pub fn new(data: &'a [T], height: usize, width: usize, ldim: usize) -> Self {
        check_shape(data.len(), height, width, ldim);
        Self {
            data,
            height,
            width,
            ldim,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn ldim(&self) -> usize {
        self.ldim
    }

    pub fn data(&self) -> &'a [T] {
        self.data
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> T {
        debug_assert!(i < self.height && j < self.width);
        self.data[i + j * self.ldim]
    }

    pub fn column(&self, j: usize) -> &'a [T] {
        assert!(j < self.width, "column {j} out of range for width {}", self.width);
        if self.height == 0 {
            return &[];
        }
        let start = j * self.ldim;
        &self.data[start..start + self.height]
    }

    /// The `height x width` block whose top-left entry is `(i, j)`.
    pub fn view(&self, i: usize, j: usize, height: usize, width: usize) -> MatrixRef<'a, T> {
        assert!(
            i + height <= self.height && j + width <= self.width,
            "view ({i}, {j}) {height}x{width} exceeds {}x{} matrix",
            self.height,
            self.width
        );
        if height == 0 || width == 0 {
            return MatrixRef::new(&[], height, width, self.ldim);
        }
        let start = i + j * self.ldim;
        let end = start + extent(height, width, self.ldim);
        MatrixRef::new(&self.data[start..end], height, width, self.ldim)
    }

    /// Copies the block into a dense column-major vector (`ldim == height`).
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.height * self.width);
        for j in 0..self.width {
            out.extend_from_slice(self.column(j));
        }
        out
    }
}

#[derive(Debug)]
pub struct MatrixMut<'a, T> {
    data: &'a mut [T],
    height: usize,
    width: usize,
    ldim: usize,
}

impl<'a, T: Copy> MatrixMut<'a, T> {
    pub fn new(data: &'a mut [T], height: usize, width: usize, ldim: usize) -> Self {
        check_shape(data.len(), height, width, ldim);
        Self {
            data,
            height,
            width,
            ldim,
        }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn ldim(&self) -> usize {
        self.ldim
    }

    pub fn data(&self) -> &[T] {
        &*self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut *self.data
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> T {
        debug_assert!(i < self.height && j < self.width);
        self.data[i + j * self.ldim]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        debug_assert!(i < self.height && j < self.width);
        self.data[i + j * self.ldim] = value;
    }

    pub fn as_ref(&self) -> MatrixRef<'_, T> {
        MatrixRef::new(&*self.data, self.height, self.width, self.ldim)
    }

    pub fn reborrow(&mut self) -> MatrixMut<'_, T> {
        MatrixMut::new(&mut *self.data, self.height, self.width, self.ldim)
    }

    pub fn column_mut(&mut self, j: usize) -> &mut [T] {
        assert!(j < self.width, "column {j} out of range for width {}", self.width);
        if self.height == 0 {
            return &mut [];
        }
        let start = j * self.ldim;
        &mut self.data[start..start + self.height]
    }

    pub fn view_mut(&mut self, i: usize, j: usize, height: usize, width: usize) -> MatrixMut<'_, T> {
        assert!(
            i + height <= self.height && j + width <= self.width,
            "view ({i}, {j}) {height}x{width} exceeds {}x{} matrix",
            self.height,
            self.width
        );
        if height == 0 || width == 0 {
            return MatrixMut::new(&mut [], height, width, self.ldim);
        }
        let start = i + j * self.ldim;
        let end = start + extent(height, width, self.ldim);
        MatrixMut::new(&mut self.data[start..end], height, width, self.ldim)
    }

    /// Consuming form of [`MatrixMut::view_mut`] that keeps the original lifetime.
    pub fn into_view(self, i: usize, j: usize, height: usize, width: usize) -> MatrixMut<'a, T> {
        assert!(
            i + height <= self.height && j + width <= self.width,
            "view ({i}, {j}) {height}x{width} exceeds {}x{} matrix",
            self.height,
            self.width
        );
        if height == 0 || width == 0 {
            return MatrixMut::new(&mut [], height, width, self.ldim);
        }
        let start = i + j * self.ldim;
        let end = start + extent(height, width, self.ldim);
        MatrixMut::new(&mut self.data[start..end], height, width, self.ldim)
    }

    /// Applies `f` to every entry together with its local coordinates.
    pub fn for_each_mut(&mut self, mut f: impl FnMut(usize, usize, &mut T)) {
        // An empty column block may hold no storage at all.
        if self.height == 0 {
            return;
        }
        for j in 0..self.width {
            let start = j * self.ldim;
            for (i, x) in self.data[start..start + self.height].iter_mut().enumerate() {
                f(i, j, x);
            }
        }
    }

    /// Overwrites this block with `src`, which must have the same shape.
    pub fn copy_from(&mut self, src: &MatrixRef<'_, T>) {
        assert_eq!(
            (self.height, self.width),
            (src.height(), src.width()),
            "copy between blocks of different shapes"
        );
        for j in 0..self.width {
            self.column_mut(j).copy_from_slice(src.column(j));
        }
    }
}
