//! Analytic sphere, plane and line routines shared by the classifier and the
//! patch enumerator.

use crate::error::Degeneracy;
use nalgebra::{Point3, Vector3};

/// Squared center distance below which two atoms are taken as coincident
pub(crate) const COINCIDENT_DISTANCE_SQ: f32 = 1e-4;

/// A plane through `center` with unit `normal`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub center: Point3<f32>,
    pub normal: Vector3<f32>,
}

/// An infinite line through `point` along unit `direction`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line {
    pub point: Point3<f32>,
    pub direction: Vector3<f32>,
}

/// Where a line meets a sphere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LineSphereIntersection {
    Miss,
    Tangent(Point3<f32>),
    Secant(Point3<f32>, Point3<f32>),
}

impl LineSphereIntersection {
    pub fn points(&self) -> Vec<Point3<f32>> {
        match *self {
            LineSphereIntersection::Miss => Vec::new(),
            LineSphereIntersection::Tangent(p) => vec![p],
            LineSphereIntersection::Secant(p, q) => vec![p, q],
        }
    }
}

/// Plane containing the intersection circle of two spheres.
///
/// The plane center lies on the segment axis at `a + h * (b - a)` with
/// `h = 0.5 + (ra² - rb²) / (2 |b - a|²)`; the normal points from `a` to `b`.
pub fn radical_plane(
    center_a: &Point3<f32>,
    radius_a: f32,
    center_b: &Point3<f32>,
    radius_b: f32,
) -> Result<Plane, Degeneracy> {
    let axis = center_b - center_a;
    let dist_sq = axis.norm_squared();
    if dist_sq <= COINCIDENT_DISTANCE_SQ {
        return Err(Degeneracy::CoincidentCenters);
    }
    let h = 0.5 + (radius_a * radius_a - radius_b * radius_b) / (2.0 * dist_sq);
    Ok(Plane {
        center: center_a + axis * h,
        normal: axis / dist_sq.sqrt(),
    })
}

/// Intersection line of two planes.
///
/// Fails with [`Degeneracy::ParallelPlanes`] when `|dot(na, nb)|` reaches
/// `parallel_tolerance`.
pub fn intersect_planes(a: &Plane, b: &Plane, parallel_tolerance: f32) -> Result<Line, Degeneracy> {
    let cos = a.normal.dot(&b.normal);
    if cos.abs() >= parallel_tolerance {
        return Err(Degeneracy::ParallelPlanes);
    }
    // Solve relative to a.center to keep the offsets small
    let offset_b = b.normal.dot(&(b.center - a.center));
    let denom = 1.0 - cos * cos;
    let point = a.center + a.normal * (-offset_b * cos / denom) + b.normal * (offset_b / denom);
    Ok(Line {
        point,
        direction: a.normal.cross(&b.normal).normalize(),
    })
}

/// Value under the square root of the line-sphere intersection formula.
///
/// Negative: no intersection. Zero: tangent. Positive: two points.
pub fn line_sphere_discriminant(line: &Line, center: &Point3<f32>, radius: f32) -> f32 {
    let w = line.point - center;
    let b = line.direction.dot(&w);
    b * b - (w.norm_squared() - radius * radius)
}

pub fn line_sphere_intersection(
    line: &Line,
    center: &Point3<f32>,
    radius: f32,
) -> LineSphereIntersection {
    let discriminant = line_sphere_discriminant(line, center, radius);
    if discriminant < 0.0 {
        return LineSphereIntersection::Miss;
    }
    let left = -line.direction.dot(&(line.point - center));
    if discriminant == 0.0 {
        return LineSphereIntersection::Tangent(line.point + line.direction * left);
    }
    let right = discriminant.sqrt();
    LineSphereIntersection::Secant(
        line.point + line.direction * (left + right),
        line.point + line.direction * (left - right),
    )
}

/// Unit vector perpendicular to `v`.
///
/// The construction is chosen from the dominant components so the result
/// never vanishes, including for axis-aligned input.
pub fn perpendicular(v: &Vector3<f32>) -> Vector3<f32> {
    let p = if v.x.abs() > v.z.abs() {
        Vector3::new(-v.y, v.x, 0.0)
    } else {
        Vector3::new(0.0, -v.z, v.y)
    };
    p.normalize()
}

/// `sqrt(|radicand|)`, rejecting radicands more than `epsilon` below zero.
pub fn guarded_sqrt(radicand: f32, epsilon: f32) -> Result<f32, Degeneracy> {
    if radicand < -epsilon {
        Err(Degeneracy::NegativeRadicand)
    } else {
        Ok(radicand.abs().sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f32 = 1e-5;

    #[test]
    fn test_radical_plane_equal_radii() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(4.0, 0.0, 0.0);
        let plane = radical_plane(&a, 3.0, &b, 3.0).unwrap();
        assert!((plane.center - Point3::new(2.0, 0.0, 0.0)).norm() < TOL);
        assert!((plane.normal - Vector3::x()).norm() < TOL);
    }

    #[test]
    fn test_radical_plane_holds_circle() {
        let a = Point3::new(1.0, -2.0, 0.5);
        let b = Point3::new(3.0, 1.0, -0.5);
        let (ra, rb) = (3.2_f32, 2.4_f32);
        let plane = radical_plane(&a, ra, &b, rb).unwrap();

        // Any point on the plane at the circle radius lies on both spheres
        let x = (plane.center - a).norm();
        let circle_radius = (ra * ra - x * x).sqrt();
        let point = plane.center + perpendicular(&plane.normal) * circle_radius;
        assert!(((point - a).norm() - ra).abs() < 1e-4);
        assert!(((point - b).norm() - rb).abs() < 1e-4);
    }

    #[test]
    fn test_radical_plane_coincident() {
        let a = Point3::new(1.0, 1.0, 1.0);
        assert_eq!(
            radical_plane(&a, 2.0, &a, 2.0),
            Err(Degeneracy::CoincidentCenters)
        );
    }

    #[test]
    fn test_intersect_planes() {
        let a = Plane {
            center: Point3::new(1.0, 0.0, 0.0),
            normal: Vector3::x(),
        };
        let b = Plane {
            center: Point3::new(0.0, 2.0, 0.0),
            normal: Vector3::y(),
        };
        let line = intersect_planes(&a, &b, 0.999).unwrap();
        assert!((line.point.x - 1.0).abs() < TOL);
        assert!((line.point.y - 2.0).abs() < TOL);
        assert!((line.direction.z.abs() - 1.0).abs() < TOL);
    }

    #[test]
    fn test_intersect_parallel_planes() {
        let a = Plane {
            center: Point3::new(1.0, 0.0, 0.0),
            normal: Vector3::x(),
        };
        let b = Plane {
            center: Point3::new(-1.0, 0.0, 0.0),
            normal: -Vector3::x(),
        };
        assert_eq!(
            intersect_planes(&a, &b, 0.999),
            Err(Degeneracy::ParallelPlanes)
        );
    }

    #[test]
    fn test_line_sphere_cases() {
        let center = Point3::new(0.0, 0.0, 0.0);
        let line = Line {
            point: Point3::new(0.0, 1.0, 0.0),
            direction: Vector3::x(),
        };
        assert!(line_sphere_discriminant(&line, &center, 2.0) > 0.0);
        assert!(line_sphere_discriminant(&line, &center, 0.5) < 0.0);

        match line_sphere_intersection(&line, &center, 2.0) {
            LineSphereIntersection::Secant(p, q) => {
                assert!((p.coords.norm() - 2.0).abs() < TOL);
                assert!((q.coords.norm() - 2.0).abs() < TOL);
                assert!((p.x + q.x).abs() < TOL);
            }
            other => panic!("expected two points, got {other:?}"),
        }
        assert_eq!(
            line_sphere_intersection(&line, &center, 1.0),
            LineSphereIntersection::Tangent(Point3::new(0.0, 1.0, 0.0))
        );
        assert!(line_sphere_intersection(&line, &center, 0.5)
            .points()
            .is_empty());
    }

    #[test]
    fn test_perpendicular_axis_aligned() {
        for v in [
            Vector3::x(),
            Vector3::y(),
            Vector3::z(),
            -Vector3::z(),
            Vector3::new(1.0, 1.0, 1.0).normalize(),
            Vector3::new(1e-8, 0.0, 1.0).normalize(),
        ] {
            let p = perpendicular(&v);
            assert!((p.norm() - 1.0).abs() < TOL, "{v:?} -> {p:?}");
            assert!(p.dot(&v).abs() < TOL, "{v:?} -> {p:?}");
        }
    }

    #[test]
    fn test_guarded_sqrt() {
        assert_eq!(guarded_sqrt(4.0, 1e-4), Ok(2.0));
        assert_eq!(guarded_sqrt(-1e-5, 1e-4), Ok(1e-5_f32.sqrt()));
        assert_eq!(guarded_sqrt(-1.0, 1e-4), Err(Degeneracy::NegativeRadicand));
    }
}
