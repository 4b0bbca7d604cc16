use std::cmp::Ordering;
use crate::core::distance::{distance_km, eta_minutes};
use crate::models::{Casualty, EngineConfig, Facility, FacilityMatch, TriageColor};

/// Lowest facility role a casualty of this triage colour may be sent to
#[inline]
pub fn min_role_level(triage: TriageColor) -> u8 {
    match triage {
        TriageColor::Red => 2,
        _ => 1,
    }
}

/// Check if a facility can receive a casualty of the given triage colour
#[inline]
pub fn is_eligible(facility: &Facility, triage: TriageColor) -> bool {
    facility.available && facility.role.level() >= min_role_level(triage)
}

/// All eligible facilities for a casualty, best match first.
///
/// The first entry is the nearest facility; any facility within the
/// equidistance tolerance of it competes on higher role level, then on the
/// smaller id. The remaining entries follow in distance order.
pub fn rank_eligible(
    casualty: &Casualty,
    facilities: &[Facility],
    config: &EngineConfig,
) -> Vec<FacilityMatch> {
    let mut candidates: Vec<FacilityMatch> = facilities
        .iter()
        .filter(|facility| is_eligible(facility, casualty.triage_color))
        .map(|facility| {
            let distance = distance_km(casualty.location, facility.location);
            FacilityMatch {
                facility: facility.clone(),
                distance_km: distance,
                eta_minutes: eta_minutes(distance, config.ground_speed_kmh),
            }
        })
        .collect();

    candidates.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then_with(|| prefer(a, b))
    });

    let Some(nearest) = candidates.first() else {
        return candidates;
    };

    let cutoff = nearest.distance_km + config.equidistance_tolerance_km;
    let best_index = candidates
        .iter()
        .enumerate()
        .take_while(|(_, m)| m.distance_km <= cutoff)
        .min_by(|(_, a), (_, b)| prefer(a, b).then_with(|| a.distance_km.total_cmp(&b.distance_km)))
        .map(|(index, _)| index)
        .unwrap_or(0);

    if best_index != 0 {
        let best = candidates.remove(best_index);
        candidates.insert(0, best);
    }

    candidates
}

/// Find the nearest eligible facility, `None` when nothing qualifies
pub fn find_nearest(
    casualty: &Casualty,
    facilities: &[Facility],
    config: &EngineConfig,
) -> Option<FacilityMatch> {
    rank_eligible(casualty, facilities, config).into_iter().next()
}

/// Higher role first, then lexicographically smaller id
fn prefer(a: &FacilityMatch, b: &FacilityMatch) -> Ordering {
    b.facility
        .role
        .level()
        .cmp(&a.facility.role.level())
        .then_with(|| a.facility.id.cmp(&b.facility.id))
}
