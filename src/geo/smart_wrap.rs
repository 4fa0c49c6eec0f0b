// ============================================================================
// spark-marker - Smart Wrap
// Pick the world copy of a coordinate that keeps on-screen motion continuous
// ============================================================================

use crate::core::constants::{HALF_WORLD_DEGREES, WORLD_DEGREES};
use crate::geo::lng_lat::LngLat;
use crate::geo::point::Point;
use crate::geo::transform::Transform;

/// Choose the representative of `lng_lat` (its longitude +/- whole worlds)
/// that best continues from `prior_pos`.
///
/// 1. When a prior screen position is known, try one world west and one
///    world east; keep whichever lands strictly closer to `prior_pos`. This
///    keeps an object in place when the map center itself gets wrapped while
///    the user is still dragging.
/// 2. Then walk toward the view center, one world at a time, until the point
///    is on screen or is already within half a world of the center. Copies
///    too far out to reach the viewport are skipped in one jump first, so
///    the walk stays short for any finite longitude.
pub fn smart_wrap(lng_lat: LngLat, prior_pos: Option<Point>, transform: &Transform) -> LngLat {
    let mut lng_lat = lng_lat;

    if let Some(prior) = prior_pos {
        let left = lng_lat.shifted(-1.0);
        let right = lng_lat.shifted(1.0);
        let delta = transform.location_point(lng_lat).dist_sqr(&prior);

        if transform.location_point(left).dist_sqr(&prior) < delta {
            lng_lat = left;
        } else if transform.location_point(right).dist_sqr(&prior) < delta {
            lng_lat = right;
        }
    }

    lng_lat = skip_distant_worlds(lng_lat, transform);

    while (lng_lat.lng - transform.center.lng).abs() > HALF_WORLD_DEGREES {
        let pos = transform.location_point(lng_lat);
        if transform.contains_point(&pos) {
            break;
        }
        if lng_lat.lng > transform.center.lng {
            lng_lat.lng -= WORLD_DEGREES;
        } else {
            lng_lat.lng += WORLD_DEGREES;
        }
    }

    lng_lat
}

/// Shift `lng_lat` toward the view center by every whole world whose copy
/// lies horizontally beyond the viewport. The result is within half the
/// viewport width plus one world of the center, and no skipped copy was on
/// screen.
fn skip_distant_worlds(lng_lat: LngLat, transform: &Transform) -> LngLat {
    let half_view = transform.width / 2.0 * WORLD_DEGREES / transform.world_size();
    let delta = lng_lat.lng - transform.center.lng;
    let excess = delta.abs() - half_view - WORLD_DEGREES;
    if !excess.is_finite() || excess <= 0.0 {
        return lng_lat;
    }

    let worlds = (excess / WORLD_DEGREES).floor();
    lng_lat.shifted(-delta.signum() * worlds)
}

// =============================================================================
// TESTS
// =============================================================================
