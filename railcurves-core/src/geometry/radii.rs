use geo::Coord;

use super::{circumradius, local_spacing};
use crate::config::{
    CurveRadiusOptions, MIN_RELIABLE_RADIUS_SPACING_FACTOR,
    MIN_SPACING_FOR_RELIABILITY_CHECK_METERS,
};

/// Estimates the curve radius at every vertex of a path.
///
/// The radius at `i` is the circumradius of the points `i - stride`, `i`
/// and `i + stride`. Vertices closer than `stride` to either end, collinear
/// vertices and radii that the local point spacing cannot resolve are
/// `None`. Remaining radii are clamped to
/// `[min_plausible_radius_meters, max_radius_meters]`.
pub fn radii_at_vertices(coords: &[Coord<f64>], options: &CurveRadiusOptions) -> Vec<Option<f64>> {
    let n = coords.len();
    let mut radii = vec![None; n];
    if n < 3 {
        return radii;
    }

    let stride = options.effective_stride();
    if n <= 2 * stride {
        return radii;
    }

    for i in stride..n - stride {
        let Some(radius) = circumradius(coords[i - stride], coords[i], coords[i + stride]) else {
            continue;
        };

        // sparse points draw sharper angles than the real track
        let spacing = local_spacing(coords, i, stride);
        if spacing > MIN_SPACING_FOR_RELIABILITY_CHECK_METERS
            && radius < spacing * MIN_RELIABLE_RADIUS_SPACING_FACTOR
        {
            continue;
        }

        radii[i] = Some(radius.clamp(
            options.min_plausible_radius_meters,
            options.max_radius_meters,
        ));
    }

    radii
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::coord;

    fn options() -> CurveRadiusOptions {
        CurveRadiusOptions::default()
    }

    /// Points on a circle of `radius` meters around (lon, lat), `step` degrees apart.
    fn arc(center: (f64, f64), radius: f64, count: usize, step_deg: f64) -> Vec<Coord<f64>> {
        let meters_per_deg_lat = 111_195.0;
        let meters_per_deg_lon = meters_per_deg_lat * center.1.to_radians().cos();
        (0..count)
            .map(|k| {
                let theta = (k as f64 * step_deg).to_radians();
                coord! {
                    x: center.0 + radius * theta.cos() / meters_per_deg_lon,
                    y: center.1 + radius * theta.sin() / meters_per_deg_lat,
                }
            })
            .collect()
    }

    #[test]
    fn endpoints_are_none() {
        let coords = arc((6.14, 46.2), 500.0, 10, 5.0);
        let radii = radii_at_vertices(&coords, &options());
        assert_eq!(radii.len(), 10);
        assert_eq!(radii[0], None);
        assert_eq!(radii[9], None);
        assert!(radii[1..9].iter().all(Option::is_some));
    }

    #[test]
    fn estimates_arc_radius() {
        let coords = arc((6.14, 46.2), 500.0, 10, 5.0);
        let radii = radii_at_vertices(&coords, &options());
        for radius in radii[1..9].iter().flatten() {
            assert!((radius - 500.0).abs() < 5.0, "radius {radius}");
        }
    }

    #[test]
    fn stride_leaves_more_endpoints_empty() {
        let coords = arc((6.14, 46.2), 500.0, 10, 5.0);
        let options = CurveRadiusOptions {
            stride: 2,
            ..options()
        };
        let radii = radii_at_vertices(&coords, &options);
        assert_eq!(&radii[..2], &[None, None]);
        assert_eq!(&radii[8..], &[None, None]);
        assert!(radii[2..8].iter().all(Option::is_some));

        // not enough points for the stride
        assert!(radii_at_vertices(&coords[..4], &options)
            .iter()
            .all(Option::is_none));
    }

    #[test]
    fn short_paths_have_no_radii() {
        let coords = [coord! { x: 0.0, y: 0.0 }, coord! { x: 0.001, y: 0.0 }];
        assert_eq!(radii_at_vertices(&coords, &options()), vec![None, None]);
        assert!(radii_at_vertices(&[], &options()).is_empty());
    }

    #[test]
    fn radii_are_clamped() {
        // ~28 m radius is raised to the plausible floor
        let tight = [
            coord! { x: 6.14, y: 46.2 },
            coord! { x: 6.14, y: 46.20036 },
            coord! { x: 6.14052, y: 46.20036 },
        ];
        assert_eq!(radii_at_vertices(&tight, &options())[1], Some(50.0));

        // very wide arc is capped
        let wide = arc((6.14, 46.2), 50_000.0, 5, 0.1);
        for radius in radii_at_vertices(&wide, &options()).iter().flatten() {
            assert_eq!(*radius, 10_000.0);
        }
    }

    #[test]
    fn sparse_sharp_vertex_is_unreliable() {
        // 90° corner with 1 km legs gives ~707 m, below 1.5 * spacing
        let coords = [
            coord! { x: 6.14, y: 46.2 },
            coord! { x: 6.14, y: 46.209 },
            coord! { x: 6.153, y: 46.209 },
        ];
        assert_eq!(radii_at_vertices(&coords, &options())[1], None);
    }
}
