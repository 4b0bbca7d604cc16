use thiserror::Error;
use crate::models::{Casualty, ComplianceStatus, FacilityMatch, ScoringWeights, TimelineAssessment, TriageColor};

/// Weight sets that would let a lower tier overtake a higher one
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeightsError {
    #[error("scoring weight `{0}` must be positive and finite")]
    NonPositive(&'static str),

    #[error("tier `{tier}` increment {increment} does not exceed lower tiers' range {lower_range}")]
    TierOverlap {
        tier: &'static str,
        increment: f64,
        lower_range: f64,
    },
}

impl ScoringWeights {
    /// Verify that each tier's smallest increment outweighs every
    /// combination of the tiers below it.
    pub fn check_dominance(&self) -> Result<(), WeightsError> {
        let positive = [
            ("red_base", self.red_base),
            ("yellow_base", self.yellow_base),
            ("violation_per_minute", self.violation_per_minute),
            ("elapsed_per_minute", self.elapsed_per_minute),
            ("distance_max", self.distance_max),
            ("distance_scale_km", self.distance_scale_km),
            ("max_counted_minutes", self.max_counted_minutes as f64),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(WeightsError::NonPositive(name));
            }
        }

        let distance_range = self.distance_max;
        let elapsed_range = self.elapsed_per_minute * self.max_counted_minutes as f64;
        let violation_range = self.violation_per_minute * (self.max_counted_minutes as f64 + 1.0);

        let tiers = [
            ("elapsed", self.elapsed_per_minute, distance_range),
            ("violation", self.violation_per_minute, elapsed_range + distance_range),
            (
                "triage",
                self.red_base - self.yellow_base,
                violation_range + elapsed_range + distance_range,
            ),
        ];
        for (tier, increment, lower_range) in tiers {
            if increment <= lower_range {
                return Err(WeightsError::TierOverlap { tier, increment, lower_range });
            }
        }

        Ok(())
    }
}

/// Calculate the composite urgency score for a casualty (higher = more urgent)
///
/// Tiers, each outweighing everything below it:
/// 1. triage base (RED over YELLOW)
/// 2. whole minutes past the tighter 10-1-2 window
/// 3. whole minutes since injury
/// 4. distance to the matched facility, full penalty when unmatched
pub fn calculate_urgency_score(
    casualty: &Casualty,
    timeline: &TimelineAssessment,
    facility: Option<&FacilityMatch>,
    weights: &ScoringWeights,
) -> f64 {
    let triage = triage_base(casualty.triage_color, weights);
    let violation = violation_term(timeline, weights);
    let elapsed = weights.elapsed_per_minute * counted_minutes(timeline.elapsed_minutes, weights);
    let distance = distance_term(facility.map(|m| m.distance_km), weights);

    triage + violation + elapsed + distance
}

#[inline]
fn triage_base(triage: TriageColor, weights: &ScoringWeights) -> f64 {
    match triage {
        TriageColor::Red => weights.red_base,
        TriageColor::Yellow => weights.yellow_base,
        _ => 0.0,
    }
}

/// Whole minutes, capped so the term stays inside its band
#[inline]
fn counted_minutes(minutes: f64, weights: &ScoringWeights) -> f64 {
    minutes.max(0.0).min(weights.max_counted_minutes as f64).floor()
}

#[inline]
fn violation_term(timeline: &TimelineAssessment, weights: &ScoringWeights) -> f64 {
    match timeline.status {
        ComplianceStatus::Compliant => 0.0,
        ComplianceStatus::AtRisk | ComplianceStatus::Violated => {
            weights.violation_per_minute * (1.0 + counted_minutes(timeline.overdue_minutes, weights))
        }
    }
}

/// Saturating distance penalty in [0, distance_max)
#[inline]
fn distance_term(distance_km: Option<f64>, weights: &ScoringWeights) -> f64 {
    match distance_km {
        Some(km) => weights.distance_max * (1.0 - (-km.max(0.0) / weights.distance_scale_km).exp()),
        None => weights.distance_max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::{Facility, FacilityRole, GeoPoint, TimelineWindow};

    fn create_casualty(triage: TriageColor) -> Casualty {
        Casualty {
            id: "c".to_string(),
            name: "Casualty".to_string(),
            triage_color: triage,
            location: GeoPoint::new(0.0, 0.0),
            injured_at: Utc::now(),
        }
    }

    fn timeline(status: ComplianceStatus, elapsed: f64, overdue: f64) -> TimelineAssessment {
        TimelineAssessment {
            elapsed_minutes: elapsed,
            status,
            window: TimelineWindow::Surgical,
            overdue_minutes: overdue,
        }
    }

    fn facility_at(distance_km: f64) -> FacilityMatch {
        FacilityMatch {
            facility: Facility {
                id: "f".to_string(),
                name: "Facility".to_string(),
                role: FacilityRole::Role2,
                location: GeoPoint::new(0.0, 0.0),
                available: true,
            },
            distance_km,
            eta_minutes: distance_km,
        }
    }

    #[test]
    fn test_default_weights_dominate() {
        assert_eq!(ScoringWeights::default().check_dominance(), Ok(()));
    }

    #[test]
    fn test_overlapping_weights_rejected() {
        let weights = ScoringWeights {
            elapsed_per_minute: 0.5,
            ..ScoringWeights::default()
        };
        assert!(matches!(
            weights.check_dominance(),
            Err(WeightsError::TierOverlap { tier: "elapsed", .. })
        ));

        let weights = ScoringWeights {
            red_base: 12_000_000.0,
            ..ScoringWeights::default()
        };
        assert!(matches!(
            weights.check_dominance(),
            Err(WeightsError::TierOverlap { tier: "triage", .. })
        ));

        let weights = ScoringWeights {
            distance_scale_km: 0.0,
            ..ScoringWeights::default()
        };
        assert_eq!(weights.check_dominance(), Err(WeightsError::NonPositive("distance_scale_km")));
    }

    #[test]
    fn test_red_beats_worst_yellow() {
        let weights = ScoringWeights::default();
        let best_red = calculate_urgency_score(
            &create_casualty(TriageColor::Red),
            &timeline(ComplianceStatus::Compliant, 0.0, 0.0),
            Some(&facility_at(0.0)),
            &weights,
        );
        let worst_yellow = calculate_urgency_score(
            &create_casualty(TriageColor::Yellow),
            &timeline(ComplianceStatus::Violated, 100_000.0, 100_000.0),
            None,
            &weights,
        );
        assert!(best_red > worst_yellow, "{} <= {}", best_red, worst_yellow);
    }

    #[test]
    fn test_compliant_has_no_violation_term() {
        let weights = ScoringWeights::default();
        let t = timeline(ComplianceStatus::Compliant, 5.0, 0.0);
        assert_eq!(violation_term(&t, &weights), 0.0);
    }

    #[test]
    fn test_longer_violation_scores_higher() {
        let weights = ScoringWeights::default();
        let casualty = create_casualty(TriageColor::Yellow);
        let short = calculate_urgency_score(&casualty, &timeline(ComplianceStatus::Violated, 130.0, 70.0), None, &weights);
        let long = calculate_urgency_score(&casualty, &timeline(ComplianceStatus::Violated, 300.0, 240.0), None, &weights);
        assert!(long > short);
    }

    #[test]
    fn test_violation_minute_outweighs_elapsed_and_distance() {
        let weights = ScoringWeights::default();
        let casualty = create_casualty(TriageColor::Red);
        // One more overdue minute against a full day of elapsed time and no facility
        let a = calculate_urgency_score(&casualty, &timeline(ComplianceStatus::AtRisk, 16.0, 6.0), Some(&facility_at(0.0)), &weights);
        let b = calculate_urgency_score(&casualty, &timeline(ComplianceStatus::AtRisk, 5000.0, 5.0), None, &weights);
        assert!(a > b);
    }

    #[test]
    fn test_distance_is_lowest_tier() {
        let weights = ScoringWeights::default();
        let casualty = create_casualty(TriageColor::Yellow);
        let t = timeline(ComplianceStatus::Compliant, 20.0, 0.0);

        let near = calculate_urgency_score(&casualty, &t, Some(&facility_at(1.0)), &weights);
        let far = calculate_urgency_score(&casualty, &t, Some(&facility_at(80.0)), &weights);
        let unmatched = calculate_urgency_score(&casualty, &t, None, &weights);
        let older = calculate_urgency_score(&casualty, &timeline(ComplianceStatus::Compliant, 21.0, 0.0), Some(&facility_at(0.0)), &weights);

        assert!(far > near);
        assert!(unmatched > far);
        assert!(older > unmatched);
    }
}
