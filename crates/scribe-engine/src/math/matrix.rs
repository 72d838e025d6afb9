use core::ops::Mul;

use super::Vec4;

/// Row-major `R × C` matrix of `f32`.
///
/// Dimensions are part of the type, so `A * B` only compiles when
/// `A.columns == B.rows`. Points are column vectors (`Matrix<4, 1>`) and
/// transforms are applied as `M * p`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Matrix<const R: usize, const C: usize> {
    values: [[f32; C]; R],
}

pub type Mat4 = Matrix<4, 4>;
pub type Column4 = Matrix<4, 1>;

impl<const R: usize, const C: usize> Matrix<R, C> {
    #[inline]
    pub const fn from_rows(values: [[f32; C]; R]) -> Self {
        Self { values }
    }

    #[inline]
    pub const fn zero() -> Self {
        Self { values: [[0.0; C]; R] }
    }

    #[inline]
    pub const fn rows(&self) -> usize {
        R
    }

    #[inline]
    pub const fn columns(&self) -> usize {
        C
    }

    /// Value at `row`, `col`. Out-of-range indices panic.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.values[row][col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.values[row][col] = value;
    }

    #[inline]
    pub fn as_rows(&self) -> &[[f32; C]; R] {
        &self.values
    }

    pub fn transposed(&self) -> Matrix<C, R> {
        let mut out = Matrix::<C, R>::zero();
        for r in 0..R {
            for c in 0..C {
                out.values[c][r] = self.values[r][c];
            }
        }
        out
    }
}

impl<const N: usize> Matrix<N, N> {
    /// Diagonal matrix with `value` on the diagonal.
    pub fn identity_scaled(value: f32) -> Self {
        let mut m = Self::zero();
        for i in 0..N {
            m.values[i][i] = value;
        }
        m
    }

    #[inline]
    pub fn identity() -> Self {
        Self::identity_scaled(1.0)
    }

    /// Transposes in place.
    pub fn transpose(&mut self) -> &mut Self {
        for r in 0..N {
            for c in (r + 1)..N {
                let tmp = self.values[r][c];
                self.values[r][c] = self.values[c][r];
                self.values[c][r] = tmp;
            }
        }
        self
    }
}

impl Mat4 {
    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::identity();
        m.values[0][3] = x;
        m.values[1][3] = y;
        m.values[2][3] = z;
        m
    }

    pub fn scale(x: f32, y: f32, z: f32) -> Self {
        let mut m = Self::identity();
        m.values[0][0] = x;
        m.values[1][1] = y;
        m.values[2][2] = z;
        m
    }

    /// Euler rotation `Rz(a) · Ry(b) · Rx(g)` (radians).
    ///
    /// `a` turns about the drawing-plane normal, so 2D rotation only needs
    /// `rotation_xyz(angle, 0.0, 0.0)`.
    pub fn rotation_xyz(a: f32, b: f32, g: f32) -> Self {
        let (sa, ca) = a.sin_cos();
        let (sb, cb) = b.sin_cos();
        let (sg, cg) = g.sin_cos();

        Self::from_rows([
            [ca * cb, ca * sb * sg - sa * cg, ca * sb * cg + sa * sg, 0.0],
            [sa * cb, sa * sb * sg + ca * cg, sa * sb * cg - ca * sg, 0.0],
            [-sb, cb * sg, cb * cg, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Right-handed perspective projection (camera looks down -Z).
    ///
    /// Produces clip-space `w = -z` and GL depth range `[-1, 1]`; the vertex
    /// shaders remap depth to wgpu's `[0, 1]`.
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let tan = (fov_y / 2.0).tan();
        let mut m = Self::zero();
        m.values[0][0] = 1.0 / (aspect * tan);
        m.values[1][1] = 1.0 / tan;
        m.values[2][2] = -(far + near) / (far - near);
        m.values[2][3] = -(2.0 * far * near) / (far - near);
        m.values[3][2] = -1.0;
        m
    }

    /// Column-major copy, the memory order WGSL `mat4x4<f32>` expects.
    pub fn to_column_major(&self) -> [[f32; 4]; 4] {
        *self.transposed().as_rows()
    }

    #[inline]
    pub fn transform(&self, p: Vec4) -> Vec4 {
        (*self * Column4::from(p)).into()
    }
}

impl<const R: usize, const K: usize, const C: usize> Mul<Matrix<K, C>> for Matrix<R, K> {
    type Output = Matrix<R, C>;

    fn mul(self, rhs: Matrix<K, C>) -> Matrix<R, C> {
        let mut out = Matrix::<R, C>::zero();
        for r in 0..R {
            for c in 0..C {
                let mut acc = 0.0;
                for k in 0..K {
                    acc += self.values[r][k] * rhs.values[k][c];
                }
                out.values[r][c] = acc;
            }
        }
        out
    }
}

impl From<Vec4> for Column4 {
    #[inline]
    fn from(v: Vec4) -> Self {
        Self::from_rows([[v.x], [v.y], [v.z], [v.w]])
    }
}

impl From<Column4> for Vec4 {
    #[inline]
    fn from(m: Column4) -> Self {
        Vec4::new(m.values[0][0], m.values[1][0], m.values[2][0], m.values[3][0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::to_radians;

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn identity_scaled_fills_diagonal() {
        let m = Mat4::identity_scaled(2.0);
        for r in 0..4 {
            for c in 0..4 {
                assert_eq!(m.get(r, c), if r == c { 2.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn multiply_rows_by_columns() {
        let a = Matrix::<2, 3>::from_rows([[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        let b = Matrix::<3, 2>::from_rows([[7.0, 8.0], [9.0, 10.0], [11.0, 12.0]]);
        let p = a * b;
        assert_eq!(p.as_rows(), &[[58.0, 64.0], [139.0, 154.0]]);
    }

    #[test]
    fn transpose_in_place_swaps_off_diagonal() {
        let mut m = Mat4::translation(1.0, 2.0, 3.0);
        m.transpose();
        assert_eq!(m.get(3, 0), 1.0);
        assert_eq!(m.get(3, 1), 2.0);
        assert_eq!(m.get(3, 2), 3.0);
        assert_eq!(m.get(0, 3), 0.0);
    }

    #[test]
    fn rotation_about_plane_normal() {
        let r = Mat4::rotation_xyz(to_radians(90.0), 0.0, 0.0);
        let p = r.transform(Vec4::point(1.0, 0.0, 0.0));
        assert!(close(p.x, 0.0) && close(p.y, 1.0) && close(p.z, 0.0));
    }

    #[test]
    fn perspective_maps_near_and_far_planes() {
        let proj = Mat4::perspective(to_radians(45.0), 1.5, 0.1, 10.0);

        let near = proj.transform(Vec4::point(0.0, 0.0, -0.1));
        assert!(close(near.w, 0.1));
        assert!(close(near.z / near.w, -1.0));

        let far = proj.transform(Vec4::point(0.0, 0.0, -10.0));
        assert!(close(far.w, 10.0));
        assert!(close(far.z / far.w, 1.0));
    }

    #[test]
    fn column_major_upload_layout() {
        let m = Mat4::translation(5.0, 6.0, 7.0);
        let cm = m.to_column_major();
        assert_eq!(cm[3], [5.0, 6.0, 7.0, 1.0]);
    }
}
