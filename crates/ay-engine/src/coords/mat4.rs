use core::ops::Mul;

use bytemuck::{Pod, Zeroable};

use super::{Vec3, Vec4};

/// 4×4 matrix stored column-major.
///
/// `cols[c][r]` is the element at row `r`, column `c`. Flattening walks the
/// columns in order, which is the layout the native `uniformMatrix` entry
/// point reads.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Mat4 {
    pub cols: [[f32; 4]; 4],
}

impl Mat4 {
    pub const ZERO: Self = Self { cols: [[0.0; 4]; 4] };

    pub const IDENTITY: Self = Self {
        cols: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    #[inline]
    pub const fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self {
            cols: [
                [c0.x, c0.y, c0.z, c0.w],
                [c1.x, c1.y, c1.z, c1.w],
                [c2.x, c2.y, c2.z, c2.w],
                [c3.x, c3.y, c3.z, c3.w],
            ],
        }
    }

    /// Builds a matrix from 16 floats in column-major order.
    #[inline]
    pub fn from_cols_array(m: &[f32; 16]) -> Self {
        bytemuck::cast(*m)
    }

    /// Flattens into 16 floats in column-major order.
    #[inline]
    pub fn to_cols_array(&self) -> [f32; 16] {
        bytemuck::cast(*self)
    }

    #[inline]
    pub fn col(&self, c: usize) -> Vec4 {
        let [x, y, z, w] = self.cols[c];
        Vec4::new(x, y, z, w)
    }

    #[inline]
    pub fn row(&self, r: usize) -> Vec4 {
        Vec4::new(self.cols[0][r], self.cols[1][r], self.cols[2][r], self.cols[3][r])
    }

    pub fn transpose(&self) -> Self {
        Self::from_cols(self.row(0), self.row(1), self.row(2), self.row(3))
    }

    pub fn translation(t: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[3] = [t.x, t.y, t.z, 1.0];
        m
    }

    pub fn scale(s: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.cols[0][0] = s.x;
        m.cols[1][1] = s.y;
        m.cols[2][2] = s.z;
        m
    }

    /// Right-handed perspective projection into GL clip space (`z ∈ [-1, 1]`).
    ///
    /// `fov_y` is in radians.
    pub fn perspective_rh(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov_y * 0.5).tan();
        let range = near - far;
        Self {
            cols: [
                [f / aspect, 0.0, 0.0, 0.0],
                [0.0, f, 0.0, 0.0],
                [0.0, 0.0, (far + near) / range, -1.0],
                [0.0, 0.0, 2.0 * far * near / range, 0.0],
            ],
        }
    }

    /// Right-handed orthographic projection into GL clip space.
    pub fn orthographic_rh(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Self {
        let rl = right - left;
        let tb = top - bottom;
        let fnr = far - near;
        Self {
            cols: [
                [2.0 / rl, 0.0, 0.0, 0.0],
                [0.0, 2.0 / tb, 0.0, 0.0],
                [0.0, 0.0, -2.0 / fnr, 0.0],
                [-(right + left) / rl, -(top + bottom) / tb, -(far + near) / fnr, 1.0],
            ],
        }
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    fn mul(self, v: Vec4) -> Vec4 {
        self.col(0) * v.x + self.col(1) * v.y + self.col(2) * v.z + self.col(3) * v.w
    }
}

impl Mul for Mat4 {
    type Output = Mat4;
    fn mul(self, rhs: Mat4) -> Mat4 {
        Mat4::from_cols(
            self * rhs.col(0),
            self * rhs.col(1),
            self * rhs.col(2),
            self * rhs.col(3),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sequential() -> Mat4 {
        let mut m = [0.0f32; 16];
        for (i, v) in m.iter_mut().enumerate() {
            *v = i as f32;
        }
        Mat4::from_cols_array(&m)
    }

    #[test]
    fn flatten_is_column_major() {
        let m = sequential();
        // Column 1 holds elements 4..8.
        assert_eq!(m.col(1), Vec4::new(4.0, 5.0, 6.0, 7.0));
        assert_eq!(m.row(0), Vec4::new(0.0, 4.0, 8.0, 12.0));
        let flat = m.to_cols_array();
        for (i, v) in flat.iter().enumerate() {
            assert_eq!(*v, i as f32);
        }
    }

    #[test]
    fn translation_lives_in_last_column() {
        let m = Mat4::translation(Vec3::new(1.0, 2.0, 3.0));
        let flat = m.to_cols_array();
        assert_eq!(&flat[12..16], &[1.0, 2.0, 3.0, 1.0]);
    }

    #[test]
    fn transpose_swaps_rows_and_cols() {
        let m = sequential();
        let t = m.transpose();
        assert_eq!(t.col(0), m.row(0));
        assert_eq!(t.transpose(), m);
    }

    #[test]
    fn identity_is_neutral() {
        let m = sequential();
        assert_eq!(Mat4::IDENTITY * m, m);
        assert_eq!(m * Mat4::IDENTITY, m);
    }

    #[test]
    fn translate_point() {
        let m = Mat4::translation(Vec3::new(1.0, -1.0, 0.5));
        let p = m * Vec4::new(1.0, 1.0, 1.0, 1.0);
        assert_eq!(p, Vec4::new(2.0, 0.0, 1.5, 1.0));
    }

    #[test]
    fn perspective_maps_near_plane_to_minus_one() {
        let m = Mat4::perspective_rh(core::f32::consts::FRAC_PI_2, 1.0, 1.0, 10.0);
        let p = (m * Vec4::new(0.0, 0.0, -1.0, 1.0)).to_vec3();
        assert!((p.z + 1.0).abs() < 1e-5);
        let p = (m * Vec4::new(0.0, 0.0, -10.0, 1.0)).to_vec3();
        assert!((p.z - 1.0).abs() < 1e-5);
    }
}
