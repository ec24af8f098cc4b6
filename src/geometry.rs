use std::ops::{Add, Mul, MulAssign, Neg, Sub};

/// A point in path space.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
pub(crate) struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub(crate) fn equals(p1: Self, p2: Self, tol: f32) -> bool {
        (p2 - p1).mag2() < tol * tol
    }
}

impl Add<Vector> for Position {
    type Output = Self;

    #[inline]
    fn add(self, other: Vector) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub<Vector> for Position {
    type Output = Self;

    #[inline]
    fn sub(self, other: Vector) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Sub for Position {
    type Output = Vector;

    #[inline]
    fn sub(self, other: Self) -> Vector {
        Vector {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

/// A displacement in path space. Edge directions, normals and miter
/// extrusions are all `Vector`s.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct Vector {
    pub x: f32,
    pub y: f32,
}

impl Vector {
    pub fn x(x: f32) -> Self {
        Self { x, y: 0.0 }
    }

    /// Expresses `self` in the coordinate frame spanned by the two basis vectors.
    pub fn with_basis(self, basis_x: Self, basis_y: Self) -> Self {
        basis_x * self.x + basis_y * self.y
    }

    pub fn cross(self, other: Self) -> f32 {
        self.orthogonal().dot(other)
    }

    #[inline]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    #[inline]
    pub fn mag2(self) -> f32 {
        self.dot(self)
    }

    /// The vector rotated a quarter turn, `(y, -x)`.
    #[inline]
    pub fn orthogonal(self) -> Self {
        Self { x: self.y, y: -self.x }
    }

    #[inline]
    pub fn from_angle(angle: f32) -> Self {
        let (y, x) = angle.sin_cos();
        Self { x, y }
    }

    #[inline]
    pub fn angle(&self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Scales the vector to unit length and returns the original magnitude.
    /// Near-zero vectors are left untouched so degenerate edges never
    /// produce NaN components.
    pub fn normalize(&mut self) -> f32 {
        let d = self.x.hypot(self.y);

        if d > 1e-6 {
            let id = 1.0 / d;
            self.x *= id;
            self.y *= id;
        }

        d
    }
}

impl Add for Vector {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for Vector {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Neg for Vector {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self { x: -self.x, y: -self.y }
    }
}

impl Mul<f32> for Vector {
    type Output = Self;

    #[inline]
    fn mul(self, other: f32) -> Self {
        Self {
            x: self.x * other,
            y: self.y * other,
        }
    }
}

impl MulAssign<f32> for Vector {
    #[inline]
    fn mul_assign(&mut self, other: f32) {
        self.x *= other;
        self.y *= other;
    }
}

/// Axis-aligned bounding box accumulated while flattening a path.
///
/// The default value is an inverted sentinel box so that the first point
/// folded into it establishes all four edges.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    pub minx: f32,
    pub miny: f32,
    pub maxx: f32,
    pub maxy: f32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            minx: 1e6,
            miny: 1e6,
            maxx: -1e6,
            maxy: -1e6,
        }
    }
}

impl Bounds {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        (self.minx..=self.maxx).contains(&x) && (self.miny..=self.maxy).contains(&y)
    }

    pub(crate) fn include(&mut self, pos: Position) {
        self.minx = self.minx.min(pos.x);
        self.miny = self.miny.min(pos.y);
        self.maxx = self.maxx.max(pos.x);
        self.maxy = self.maxy.max(pos.y);
    }
}
