//! Process-local dense matrices.

use gridla_kernels::{MatrixMut, MatrixRef, Scalar, cpu_transpose};

/// An owned, column-major `height x width` matrix with leading dimension
/// `max(1, height)`.
///
/// This is the storage behind every distributed matrix's local block and
/// the type used for replicated results (diagonals, eigenvalues, gathered
/// sub-matrices). Borrowed views come from the kernels crate
/// ([`MatrixRef`]/[`MatrixMut`]), so a view can never outlive its matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    height: usize,
    width: usize,
    ldim: usize,
    data: Vec<T>,
}

impl<T: Scalar> Matrix<T> {
    pub fn zeros(height: usize, width: usize) -> Self {
        Self {
            height,
            width,
            ldim: height.max(1),
            data: vec![T::zero(); height * width],
        }
    }

    pub fn identity(n: usize) -> Self {
        Self::from_fn(n, n, |i, j| if i == j { T::one() } else { T::zero() })
    }

    pub fn from_fn(height: usize, width: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(height * width);
        for j in 0..width {
            for i in 0..height {
                data.push(f(i, j));
            }
        }
        Self {
            height,
            width,
            ldim: height.max(1),
            data,
        }
    }

    /// Wraps column-major data.
    ///
    /// # Panics
    ///
    /// If `data.len() != height * width`.
    pub fn from_column_major(height: usize, width: usize, data: Vec<T>) -> Self {
        assert_eq!(
            data.len(),
            height * width,
            "{height}x{width} matrix needs {} entries, got {}",
            height * width,
            data.len()
        );
        Self {
            height,
            width,
            ldim: height.max(1),
            data,
        }
    }

    /// Builds a matrix from row slices, which reads naturally in tests.
    pub fn from_rows(rows: &[&[T]]) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, |r| r.len());
        assert!(rows.iter().all(|r| r.len() == width), "ragged rows");
        Self::from_fn(height, width, |i, j| rows[i][j])
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
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> T {
        assert!(
            i < self.height && j < self.width,
            "({i}, {j}) out of range for {}x{} matrix",
            self.height,
            self.width
        );
        self.data[i + j * self.ldim]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        assert!(
            i < self.height && j < self.width,
            "({i}, {j}) out of range for {}x{} matrix",
            self.height,
            self.width
        );
        self.data[i + j * self.ldim] = value;
    }

    #[inline]
    pub fn update(&mut self, i: usize, j: usize, value: T) {
        let old = self.get(i, j);
        self.set(i, j, old + value);
    }

    /// Reallocates to `height x width` zeros.
    pub fn resize(&mut self, height: usize, width: usize) {
        *self = Self::zeros(height, width);
    }

    pub fn as_ref(&self) -> MatrixRef<'_, T> {
        MatrixRef::new(&self.data, self.height, self.width, self.ldim)
    }

    pub fn as_mut(&mut self) -> MatrixMut<'_, T> {
        MatrixMut::new(&mut self.data, self.height, self.width, self.ldim)
    }

    pub fn view(&self, i: usize, j: usize, height: usize, width: usize) -> MatrixRef<'_, T> {
        self.as_ref().view(i, j, height, width)
    }

    pub fn view_mut(&mut self, i: usize, j: usize, height: usize, width: usize) -> MatrixMut<'_, T> {
        self.as_mut().into_view(i, j, height, width)
    }

    pub fn transpose(&self) -> Self {
        let mut out = Self::zeros(self.width, self.height);
        cpu_transpose(&self.as_ref(), &mut out.as_mut(), false);
        out
    }

    pub fn adjoint(&self) -> Self {
        let mut out = Self::zeros(self.width, self.height);
        cpu_transpose(&self.as_ref(), &mut out.as_mut(), true);
        out
    }

    /// Largest entrywise distance to `other`, used to compare results.
    pub fn max_abs_diff(&self, other: &Matrix<T>) -> T::Real {
        assert_eq!(
            (self.height, self.width),
            (other.height, other.width),
            "comparing {}x{} with {}x{}",
            self.height,
            self.width,
            other.height,
            other.width
        );
        let mut worst = <T::Real as num_traits::Zero>::zero();
        for j in 0..self.width {
            for i in 0..self.height {
                let d = (self.get(i, j) - other.get(i, j)).magnitude();
                if d > worst {
                    worst = d;
                }
            }
        }
        worst
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_is_column_major() {
        let m = Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0], &[5.0, 6.0]]);
        assert_eq!(m.height(), 3);
        assert_eq!(m.data(), &[1.0, 3.0, 5.0, 2.0, 4.0, 6.0]);
        assert_eq!(m.get(2, 1), 6.0);
    }

    #[test]
    fn test_transpose_and_views() {
        let m = Matrix::from_fn(3, 2, |i, j| (i * 10 + j) as f64);
        let t = m.transpose();
        assert_eq!(t.height(), 2);
        assert_eq!(t.get(1, 2), 21.0);
        assert_eq!(m.view(1, 0, 2, 2).get(1, 1), 21.0);
    }

    #[test]
    fn test_empty_matrix_has_unit_ldim() {
        let m = Matrix::<f64>::zeros(0, 3);
        assert_eq!(m.ldim(), 1);
        assert!(m.as_ref().to_vec().is_empty());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_get_panics() {
        let m = Matrix::<f32>::zeros(2, 2);
        m.get(2, 0);
    }
}
