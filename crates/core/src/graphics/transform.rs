//! 4×4 transform matrices
//!
//! Column-major storage, matching the layout vertex shaders receive through
//! their `Mat4` bindings. Vectors are columns: `clip = projection * view * model * v`.

use std::ops::Mul;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    /// Column-major elements: `m[col * 4 + row]`
    pub m: [f32; 16],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub fn from_cols_array(m: [f32; 16]) -> Self {
        Self { m }
    }

    #[inline]
    pub fn at(&self, row: usize, col: usize) -> f32 {
        self.m[col * 4 + row]
    }

    pub fn translation(x: f32, y: f32, z: f32) -> Self {
        let mut out = Self::IDENTITY;
        out.m[12] = x;
        out.m[13] = y;
        out.m[14] = z;
        out
    }

    pub fn scale(x: f32, y: f32, z: f32) -> Self {
        let mut out = Self::IDENTITY;
        out.m[0] = x;
        out.m[5] = y;
        out.m[10] = z;
        out
    }

    pub fn rotation_x(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        let mut out = Self::IDENTITY;
        out.m[5] = c;
        out.m[6] = s;
        out.m[9] = -s;
        out.m[10] = c;
        out
    }

    pub fn rotation_y(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        let mut out = Self::IDENTITY;
        out.m[0] = c;
        out.m[2] = -s;
        out.m[8] = s;
        out.m[10] = c;
        out
    }

    pub fn rotation_z(radians: f32) -> Self {
        let (s, c) = radians.sin_cos();
        let mut out = Self::IDENTITY;
        out.m[0] = c;
        out.m[1] = s;
        out.m[4] = -s;
        out.m[5] = c;
        out
    }

    /// Right-handed perspective projection mapping `[-near, -far]` view depth
    /// onto `[-1, 1]` NDC depth
    pub fn perspective(fov_y_radians: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov_y_radians * 0.5).tan();
        let range = near - far;
        let mut m = [0.0; 16];
        m[0] = f / aspect;
        m[5] = f;
        m[10] = (far + near) / range;
        m[11] = -1.0;
        m[14] = 2.0 * far * near / range;
        Self { m }
    }

    /// Transform a homogeneous point
    #[inline]
    pub fn transform(&self, v: [f32; 4]) -> [f32; 4] {
        let m = &self.m;
        [
            m[0] * v[0] + m[4] * v[1] + m[8] * v[2] + m[12] * v[3],
            m[1] * v[0] + m[5] * v[1] + m[9] * v[2] + m[13] * v[3],
            m[2] * v[0] + m[6] * v[1] + m[10] * v[2] + m[14] * v[3],
            m[3] * v[0] + m[7] * v[1] + m[11] * v[2] + m[15] * v[3],
        ]
    }

    /// Transform a direction (w = 0), returning the xyz part
    #[inline]
    pub fn transform_vector(&self, v: [f32; 3]) -> [f32; 3] {
        let [x, y, z, _] = self.transform([v[0], v[1], v[2], 0.0]);
        [x, y, z]
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut m = [0.0; 16];
        for col in 0..4 {
            for row in 0..4 {
                m[col * 4 + row] = (0..4).map(|k| self.at(row, k) * rhs.at(k, col)).sum();
            }
        }
        Mat4 { m }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: [f32; 4], b: [f32; 4]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-5)
    }

    #[test]
    fn test_identity_transform() {
        let v = [1.0, -2.0, 3.0, 1.0];
        assert_eq!(Mat4::IDENTITY.transform(v), v);
        assert_eq!(Mat4::default(), Mat4::IDENTITY);
    }

    #[test]
    fn test_translation_moves_points_not_vectors() {
        let t = Mat4::translation(1.0, 2.0, 3.0);
        assert_eq!(t.transform([0.0, 0.0, 0.0, 1.0]), [1.0, 2.0, 3.0, 1.0]);
        assert_eq!(t.transform_vector([1.0, 0.0, 0.0]), [1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_multiplication_order() {
        // Scale first, then translate
        let m = Mat4::translation(1.0, 0.0, 0.0) * Mat4::scale(2.0, 2.0, 2.0);
        assert_eq!(m.transform([1.0, 1.0, 1.0, 1.0]), [3.0, 2.0, 2.0, 1.0]);
    }

    #[test]
    fn test_rotation_z_quarter_turn() {
        let r = Mat4::rotation_z(std::f32::consts::FRAC_PI_2);
        assert!(approx(r.transform([1.0, 0.0, 0.0, 1.0]), [0.0, 1.0, 0.0, 1.0]));
    }

    #[test]
    fn test_perspective_maps_near_and_far() {
        let p = Mat4::perspective(std::f32::consts::FRAC_PI_2, 1.0, 1.0, 10.0);
        let near = p.transform([0.0, 0.0, -1.0, 1.0]);
        let far = p.transform([0.0, 0.0, -10.0, 1.0]);
        assert!((near[2] / near[3] + 1.0).abs() < 1e-5);
        assert!((far[2] / far[3] - 1.0).abs() < 1e-5);
        assert!((near[3] - 1.0).abs() < 1e-6);
    }
}
