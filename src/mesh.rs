use crate::geometry::{Aabb, Point3D, Triangle, Vector3D};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("Failed to load mesh: {0}")]
    LoadError(String),

    #[error("Empty mesh")]
    EmptyMesh,
}

/// 3D triangular surface mesh.
///
/// The mesh is consumed only as a bounding volume and inside/outside oracle;
/// triangle-level rendering belongs to the display layer.
#[derive(Debug, Clone)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
    pub bounds: Aabb,
    /// Bounding sphere center (bounding-box center)
    pub sphere_center: Point3D,
    /// Bounding sphere radius: max vertex distance from the center
    pub sphere_radius: f64,
}

impl Mesh {
    /// Create a new mesh from triangles
    pub fn new(triangles: Vec<Triangle>) -> Result<Self, MeshError> {
        if triangles.is_empty() {
            return Err(MeshError::EmptyMesh);
        }

        let mut bounds = Aabb::empty();
        for tri in &triangles {
            for vertex in tri.vertices() {
                bounds.update(&vertex);
            }
        }

        let sphere_center = bounds.center();
        let sphere_radius = triangles
            .iter()
            .flat_map(|tri| tri.vertices())
            .map(|v| (v - sphere_center).norm())
            .fold(0.0_f64, f64::max);

        Ok(Self {
            triangles,
            bounds,
            sphere_center,
            sphere_radius,
        })
    }

    /// Load mesh from STL file
    pub fn from_stl<P: AsRef<Path>>(path: P) -> Result<Self, MeshError> {
        let mut file =
            std::fs::File::open(path).map_err(|e| MeshError::LoadError(e.to_string()))?;

        let stl = stl_io::read_stl(&mut file).map_err(|e| MeshError::LoadError(e.to_string()))?;

        // IndexedMesh stores deduplicated vertices + indexed triangles
        let triangles: Vec<Triangle> = stl
            .faces
            .iter()
            .map(|face| {
                let v0 = &stl.vertices[face.vertices[0]];
                let v1 = &stl.vertices[face.vertices[1]];
                let v2 = &stl.vertices[face.vertices[2]];

                Triangle::new(
                    Point3D::new(v0[0] as f64, v0[1] as f64, v0[2] as f64),
                    Point3D::new(v1[0] as f64, v1[1] as f64, v1[2] as f64),
                    Point3D::new(v2[0] as f64, v2[1] as f64, v2[2] as f64),
                )
            })
            .collect();

        Self::new(triangles)
    }

    /// Get mesh dimensions
    pub fn dimensions(&self) -> Vector3D {
        self.bounds.extent()
    }

    /// Number of triangles in mesh
    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    /// Display transform for this mesh: bounding-box center to the origin,
    /// bounding-sphere radius rescaled to `reference_radius` units.
    pub fn display_transform(&self, reference_radius: f64) -> DisplayTransform {
        let scale = if self.sphere_radius > 0.0 {
            reference_radius / self.sphere_radius
        } else {
            1.0
        };
        DisplayTransform {
            center: self.sphere_center.coords,
            scale,
        }
    }
}

/// Mapping between the mesh's original coordinate frame and the display
/// frame the slice sliders operate in.
///
/// Slice planes are expressed in display units, but the scalar samples live
/// in the original frame, so every query point must round-trip through
/// `to_world` before interpolation. Forward: `display = (world - center) * scale`.
#[derive(Debug, Clone, Copy)]
pub struct DisplayTransform {
    pub center: Vector3D,
    pub scale: f64,
}

impl DisplayTransform {
    /// Identity transform (display frame == world frame)
    pub fn identity() -> Self {
        Self {
            center: Vector3D::zeros(),
            scale: 1.0,
        }
    }

    pub fn to_display(&self, world: &Point3D) -> Point3D {
        Point3D::from((world.coords - self.center) * self.scale)
    }

    pub fn to_world(&self, display: &Point3D) -> Point3D {
        Point3D::from(display.coords / self.scale + self.center)
    }

    /// Display-frame image of a world-frame bounding box
    pub fn bounds_to_display(&self, bounds: &Aabb) -> Aabb {
        Aabb {
            min: self.to_display(&bounds.min),
            max: self.to_display(&bounds.max),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mesh_creation() {
        let triangles = vec![Triangle::new(
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(1.0, 0.0, 0.0),
            Point3D::new(0.0, 1.0, 0.0),
        )];

        let mesh = Mesh::new(triangles).unwrap();
        assert_eq!(mesh.num_triangles(), 1);
    }

    #[test]
    fn test_mesh_bounds() {
        let triangles = vec![Triangle::new(
            Point3D::new(0.0, 0.0, 0.0),
            Point3D::new(1.0, 0.0, 0.0),
            Point3D::new(0.0, 1.0, 1.0),
        )];

        let mesh = Mesh::new(triangles).unwrap();
        assert_eq!(mesh.bounds.min, Point3D::new(0.0, 0.0, 0.0));
        assert_eq!(mesh.bounds.max, Point3D::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_empty_mesh_rejected() {
        assert!(matches!(Mesh::new(Vec::new()), Err(MeshError::EmptyMesh)));
    }

    #[test]
    fn test_display_transform_maps_sphere_to_reference() {
        // Two triangles spanning [-2, 2]^3 corners
        let triangles = vec![
            Triangle::new(
                Point3D::new(-2.0, -2.0, -2.0),
                Point3D::new(2.0, -2.0, -2.0),
                Point3D::new(2.0, 2.0, 2.0),
            ),
            Triangle::new(
                Point3D::new(-2.0, -2.0, -2.0),
                Point3D::new(-2.0, 2.0, 2.0),
                Point3D::new(2.0, 2.0, 2.0),
            ),
        ];
        let mesh = Mesh::new(triangles).unwrap();
        let transform = mesh.display_transform(50.0);

        // Corner vertex should land exactly on the reference sphere
        let corner = Point3D::new(2.0, 2.0, 2.0);
        let display = transform.to_display(&corner);
        assert!(
            (display.coords.norm() - 50.0).abs() < 1e-9,
            "Farthest vertex should map to the reference radius, got {}",
            display.coords.norm()
        );
    }

    #[test]
    fn test_display_transform_roundtrip() {
        let transform = DisplayTransform {
            center: Vector3D::new(3.0, -1.0, 2.0),
            scale: 12.5,
        };
        let p = Point3D::new(4.5, 0.25, -7.0);
        let back = transform.to_world(&transform.to_display(&p));

        assert!((back.x - p.x).abs() < 1e-12, "x roundtrip");
        assert!((back.y - p.y).abs() < 1e-12, "y roundtrip");
        assert!((back.z - p.z).abs() < 1e-12, "z roundtrip");
    }
}
