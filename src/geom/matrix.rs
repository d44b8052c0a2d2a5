//! 2×3 affine transforms.
//!
//! Column-vector convention: a point maps through
//! `x' = a·x + c·y + e`, `y' = b·x + d·y + f`. The builder methods
//! post-multiply, so chained calls read in application order:
//! `Matrix::identity().translate(x, y).rotate(r)` first rotates, then
//! translates, matching the `T·R` product written left to right.

use serde::Serialize;

/// A 2×3 affine transformation matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// Full product `self · other`: `other` applies first, then `self`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.c * other.b,
            b: self.b * other.a + self.d * other.b,
            c: self.a * other.c + self.c * other.d,
            d: self.b * other.c + self.d * other.d,
            e: self.a * other.e + self.c * other.f + self.e,
            f: self.b * other.e + self.d * other.f + self.f,
        }
    }

    pub fn translate(&self, x: f64, y: f64) -> Matrix {
        self.multiply(&Matrix {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: x,
            f: y,
        })
    }

    pub fn rotate(&self, radians: f64) -> Matrix {
        let (sin, cos) = radians.sin_cos();
        self.multiply(&Matrix {
            a: cos,
            b: sin,
            c: -sin,
            d: cos,
            e: 0.0,
            f: 0.0,
        })
    }

    pub fn scale(&self, sx: f64, sy: f64) -> Matrix {
        self.multiply(&Matrix {
            a: sx,
            b: 0.0,
            c: 0.0,
            d: sy,
            e: 0.0,
            f: 0.0,
        })
    }

    pub fn transform_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Local placement matrix for a shape.
    ///
    /// `T(x,y) · T(w/2,h/2) · R(rot) · S(±1,±1) · T(-w/2,-h/2)`: rotation and
    /// flips pivot around the shape center.
    pub fn for_shape(
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        rot_deg: f64,
        flip_h: bool,
        flip_v: bool,
    ) -> Matrix {
        Matrix::identity()
            .translate(x, y)
            .translate(w / 2.0, h / 2.0)
            .rotate(rot_deg.to_radians())
            .scale(if flip_h { -1.0 } else { 1.0 }, if flip_v { -1.0 } else { 1.0 })
            .translate(-w / 2.0, -h / 2.0)
    }

    /// Child-coordinate mapping for a group shape.
    ///
    /// Composed after the group's placement: children expressed in the
    /// `(ch_x, ch_y, ch_w, ch_h)` child space land inside the group's
    /// `(w, h)` extent.
    pub fn for_group_children(&self, w: f64, h: f64, ch_x: f64, ch_y: f64, ch_w: f64, ch_h: f64) -> Matrix {
        let sx = if ch_w != 0.0 { w / ch_w } else { 1.0 };
        let sy = if ch_h != 0.0 { h / ch_h } else { 1.0 };
        self.scale(sx, sy).translate(-ch_x, -ch_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: (f64, f64), expected: (f64, f64)) {
        assert!(
            (actual.0 - expected.0).abs() < 1e-6 && (actual.1 - expected.1).abs() < 1e-6,
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn test_identity() {
        let m = Matrix::identity();
        assert_close(m.transform_point(3.5, -2.0), (3.5, -2.0));
    }

    #[test]
    fn test_translate_then_rotate_order() {
        // translate∘rotate: the point rotates about the origin first.
        let m = Matrix::identity().translate(10.0, 0.0).rotate(std::f64::consts::FRAC_PI_2);
        assert_close(m.transform_point(1.0, 0.0), (10.0, 1.0));
    }

    #[test]
    fn test_shape_rotation_about_center() {
        // 200x50 rect rotated 90° in place: center stays put.
        let m = Matrix::for_shape(0.0, 0.0, 200.0, 50.0, 90.0, false, false);
        assert_close(m.transform_point(100.0, 25.0), (100.0, 25.0));
        assert_close(m.transform_point(0.0, 0.0), (125.0, -75.0));
    }

    #[test]
    fn test_flip_h_about_center() {
        let m = Matrix::for_shape(0.0, 0.0, 100.0, 40.0, 0.0, true, false);
        assert_close(m.transform_point(0.0, 0.0), (100.0, 0.0));
        assert_close(m.transform_point(100.0, 40.0), (0.0, 40.0));
    }

    #[test]
    fn test_group_child_mapping() {
        // Group occupies 100x100, children expressed in a 200x200 space
        // offset by (50, 50).
        let group = Matrix::identity().translate(10.0, 10.0);
        let m = group.for_group_children(100.0, 100.0, 50.0, 50.0, 200.0, 200.0);
        assert_close(m.transform_point(50.0, 50.0), (10.0, 10.0));
        assert_close(m.transform_point(250.0, 250.0), (110.0, 110.0));
    }

    #[test]
    fn test_grouped_rotation_scenario() {
        // A group at (100,100) rotated 90° with no recorded extent,
        // containing a 200x50 rect at (0,0): corners follow the group.
        let group = Matrix::for_shape(100.0, 100.0, 0.0, 0.0, 90.0, false, false)
            .for_group_children(0.0, 0.0, 0.0, 0.0, 0.0, 0.0);
        let child = group.multiply(&Matrix::for_shape(0.0, 0.0, 200.0, 50.0, 0.0, false, false));
        assert_close(child.transform_point(0.0, 0.0), (100.0, 100.0));
        assert_close(child.transform_point(200.0, 0.0), (100.0, 300.0));
    }
}
