use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 3D point type
pub type Point3D = Point3<f64>;

/// 3D vector type
pub type Vector3D = Vector3<f64>;

/// Axis selecting which coordinate a slice plane holds fixed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Coordinate index (x=0, y=1, z=2)
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        }
    }
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x" | "X" => Ok(Axis::X),
            "y" | "Y" => Ok(Axis::Y),
            "z" | "Z" => Ok(Axis::Z),
            other => Err(format!("invalid axis: {}", other)),
        }
    }
}

/// Triangle defined by three vertices
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Triangle {
    pub v0: Point3D,
    pub v1: Point3D,
    pub v2: Point3D,
}

impl Triangle {
    pub fn new(v0: Point3D, v1: Point3D, v2: Point3D) -> Self {
        Self { v0, v1, v2 }
    }

    pub fn vertices(&self) -> [Point3D; 3] {
        [self.v0, self.v1, self.v2]
    }

    /// Min/max of the three vertices along one coordinate axis
    pub fn axis_bounds(&self, axis: Axis) -> (f64, f64) {
        let i = axis.index();
        let lo = self.v0[i].min(self.v1[i]).min(self.v2[i]);
        let hi = self.v0[i].max(self.v1[i]).max(self.v2[i]);
        (lo, hi)
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Point3D,
    pub max: Point3D,
}

impl Aabb {
    /// Empty box: min at +infinity, max at -infinity, so the first
    /// `update` snaps both to the point
    pub fn empty() -> Self {
        Self {
            min: Point3D::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3D::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3D>) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb.update(p);
        }
        aabb
    }

    /// Grow the box to contain a point
    pub fn update(&mut self, p: &Point3D) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x
    }

    pub fn center(&self) -> Point3D {
        Point3D::from((self.min.coords + self.max.coords) / 2.0)
    }

    pub fn extent(&self) -> Vector3D {
        self.max - self.min
    }

    /// Largest extent across the three axes
    pub fn max_extent(&self) -> f64 {
        let e = self.extent();
        e.x.max(e.y).max(e.z)
    }

    /// Whether `value` falls within the box's span on one axis
    pub fn contains_on_axis(&self, axis: Axis, value: f64) -> bool {
        let i = axis.index();
        value >= self.min[i] && value <= self.max[i]
    }
}
