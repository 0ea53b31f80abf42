// Point-in-solid tests used to mask slice pixels outside the part

use crate::geometry::{Axis, Point3D};
use crate::mesh::Mesh;
use serde::{Deserialize, Serialize};

/// Slack added to the per-triangle prefilter bounds so rays grazing an edge
/// are not rejected early
const PREFILTER_SLACK: f32 = 1e-4;

/// How a point is decided to be inside the solid.
///
/// `RayParity` casts a ray from the point along +X and -X and counts
/// triangle crossings; the point is inside iff crossings exist on both
/// sides. Correct for closed, non-self-intersecting meshes, and the
/// authoritative default, but it walks the triangle list per query.
///
/// `BoundingSphere` instead accepts points within `fraction` of the mesh
/// bounding-sphere radius. Cheap and coarse: fine when only a rough visual
/// mask is needed, wrong near any non-spherical boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainmentStrategy {
    RayParity,
    BoundingSphere { fraction: f64 },
}

impl Default for ContainmentStrategy {
    fn default() -> Self {
        ContainmentStrategy::RayParity
    }
}

/// Decides whether a world-frame point lies inside the solid described by
/// the mesh. Read-only after construction; safe to share across slice
/// computations.
pub struct ContainmentOracle {
    strategy: ContainmentStrategy,
    /// Mesh triangles in parry form (ray-parity strategy only)
    triangles: Vec<parry3d::shape::Triangle>,
    /// Per-triangle (min_y, max_y, min_z, max_z) for fast ray rejection
    prefilter: Vec<[f32; 4]>,
    sphere_center: Point3D,
    sphere_radius: f64,
}

impl ContainmentOracle {
    pub fn build(mesh: &Mesh, strategy: ContainmentStrategy) -> Self {
        let (triangles, prefilter) = match strategy {
            ContainmentStrategy::RayParity => {
                let triangles: Vec<parry3d::shape::Triangle> = mesh
                    .triangles
                    .iter()
                    .map(|tri| {
                        parry3d::shape::Triangle::new(
                            to_f32(&tri.v0),
                            to_f32(&tri.v1),
                            to_f32(&tri.v2),
                        )
                    })
                    .collect();

                let prefilter = mesh
                    .triangles
                    .iter()
                    .map(|tri| {
                        let (min_y, max_y) = tri.axis_bounds(Axis::Y);
                        let (min_z, max_z) = tri.axis_bounds(Axis::Z);
                        [
                            min_y as f32 - PREFILTER_SLACK,
                            max_y as f32 + PREFILTER_SLACK,
                            min_z as f32 - PREFILTER_SLACK,
                            max_z as f32 + PREFILTER_SLACK,
                        ]
                    })
                    .collect();

                (triangles, prefilter)
            }
            ContainmentStrategy::BoundingSphere { .. } => (Vec::new(), Vec::new()),
        };

        Self {
            strategy,
            triangles,
            prefilter,
            sphere_center: mesh.sphere_center,
            sphere_radius: mesh.sphere_radius,
        }
    }

    /// Whether `point` (world frame, i.e. the mesh's original coordinates)
    /// lies inside the solid
    pub fn is_inside(&self, point: &Point3D) -> bool {
        match self.strategy {
            ContainmentStrategy::RayParity => self.is_inside_ray_parity(point),
            ContainmentStrategy::BoundingSphere { fraction } => {
                (point - self.sphere_center).norm() <= fraction * self.sphere_radius
            }
        }
    }

    /// Cast along the X axis in both directions and count surface crossings.
    /// A point with mesh surface on both sides is enclosed.
    fn is_inside_ray_parity(&self, point: &Point3D) -> bool {
        use parry3d::query::{Ray, RayCast};

        let origin = to_f32(point);
        let forward = Ray::new(origin, nalgebra::Vector3::new(1.0_f32, 0.0, 0.0));
        let backward = Ray::new(origin, nalgebra::Vector3::new(-1.0_f32, 0.0, 0.0));

        let mut hits_forward = 0usize;
        let mut hits_backward = 0usize;

        for (tri, bounds) in self.triangles.iter().zip(&self.prefilter) {
            // The ray runs parallel to X: a triangle whose Y/Z span misses
            // the origin can never be crossed.
            if origin.y < bounds[0]
                || origin.y > bounds[1]
                || origin.z < bounds[2]
                || origin.z > bounds[3]
            {
                continue;
            }

            if tri.cast_local_ray(&forward, f32::MAX, false).is_some() {
                hits_forward += 1;
            }
            if tri.cast_local_ray(&backward, f32::MAX, false).is_some() {
                hits_backward += 1;
            }
        }

        hits_forward > 0 && hits_backward > 0
    }
}

fn to_f32(p: &Point3D) -> nalgebra::Point3<f32> {
    nalgebra::Point3::new(p.x as f32, p.y as f32, p.z as f32)
}
