use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use chrono::{DateTime, Utc};
use crate::core::{
    facilities::rank_eligible,
    intake::{validate_casualty, validate_facility, RecordError},
    scoring::calculate_urgency_score,
    timeline::assess,
};
use crate::models::{
    CasualtyRecord, EngineConfig, EvacuationRecommendation, Facility, FacilityRecord,
    RecommendedFacility, SkippedCasualty, TriageColor, TriageSummary,
};

/// Result of one ranking pass
#[derive(Debug, Clone, PartialEq)]
pub struct RankingResult {
    /// Most urgent first
    pub recommendations: Vec<EvacuationRecommendation>,
    pub mascal: bool,
    pub mascal_threshold: usize,
    pub skipped: Vec<SkippedCasualty>,
    pub triage_summary: TriageSummary,
    pub evaluated_at: DateTime<Utc>,
}

/// Evacuation priority ranking engine
///
/// # Pipeline Stages
/// 1. Triage filter (RED/YELLOW) and record validation
/// 2. 10-1-2 timeline assessment
/// 3. Nearest eligible facility
/// 4. Urgency scoring and ranking
///
/// A pass is a pure function of its inputs and `now`; the ranker holds no
/// mutable state and can be shared across threads.
#[derive(Debug, Clone)]
pub struct Ranker {
    config: EngineConfig,
}

impl Ranker {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self {
            config: EngineConfig::default(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rank casualties for evacuation
    ///
    /// # Arguments
    /// * `casualties` - Casualty records at the point of interest
    /// * `facilities` - Candidate medical facilities
    /// * `now` - Evaluation instant
    ///
    /// # Returns
    /// RankingResult with ordered recommendations, the MASCAL flag and
    /// the casualties that could not be ranked
    pub fn rank(
        &self,
        casualties: &[CasualtyRecord],
        facilities: &[FacilityRecord],
        now: DateTime<Utc>,
    ) -> RankingResult {
        let facilities: Vec<Facility> = facilities
            .iter()
            .filter_map(|record| match validate_facility(record) {
                Ok(facility) => Some(facility),
                Err(e) => {
                    tracing::warn!("Ignoring facility {:?}: {}", record.id, e);
                    None
                }
            })
            .collect();

        let mut triage_summary = TriageSummary::default();
        let mut skipped = Vec::new();
        // Colour of the first record seen for each id, and ids already ranked
        let mut first_seen: HashMap<&str, TriageColor> = HashMap::with_capacity(casualties.len());
        let mut ranked_ids: HashSet<&str> = HashSet::with_capacity(casualties.len());
        let mut recommendations = Vec::new();

        for record in casualties {
            let id = record.id.trim();

            // Stage 1: count each casualty once, rank RED/YELLOW only.
            // Blank ids are never merged, each is its own unusable record.
            let earlier = if id.is_empty() { None } else { first_seen.get(id).copied() };
            if earlier.is_none() {
                if !id.is_empty() {
                    first_seen.insert(id, record.triage_color);
                }
                triage_summary.record(record.triage_color);
            }

            if !record.triage_color.is_ranked() {
                continue;
            }

            // The first valid record for an id wins
            if ranked_ids.contains(id) || matches!(earlier, Some(color) if !color.is_ranked()) {
                skip(&mut skipped, record, RecordError::DuplicateId);
                continue;
            }

            let casualty = match validate_casualty(record) {
                Ok(casualty) => casualty,
                Err(e) => {
                    skip(&mut skipped, record, e);
                    continue;
                }
            };
            ranked_ids.insert(id);

            // Stage 2: timeline
            let timeline = assess(&casualty, now, &self.config.windows);

            // Stage 3: facility
            let mut matches = rank_eligible(&casualty, &facilities, &self.config).into_iter();
            let nearest = matches.next();
            let alternatives: Vec<RecommendedFacility> = matches
                .take(self.config.alternatives_limit)
                .map(|m| RecommendedFacility::from(&m))
                .collect();

            // Stage 4: score
            let urgency_score = calculate_urgency_score(
                &casualty,
                &timeline,
                nearest.as_ref(),
                &self.config.weights,
            );

            tracing::debug!(
                "Casualty {} ({}): {:?} after {:.1} min, facility {:?}, score {:.3}",
                casualty.id,
                casualty.triage_color.as_str(),
                timeline.status,
                timeline.elapsed_minutes,
                nearest.as_ref().map(|m| m.facility.id.as_str()),
                urgency_score
            );

            recommendations.push(EvacuationRecommendation {
                rank: 0,
                casualty_id: casualty.id,
                name: casualty.name,
                triage_color: casualty.triage_color,
                latitude: casualty.location.latitude,
                longitude: casualty.location.longitude,
                injured_at: casualty.injured_at,
                time_since_injury_minutes: timeline.elapsed_minutes,
                compliance_status: timeline.status,
                timeline_window: timeline.window,
                overdue_minutes: timeline.overdue_minutes,
                facility: nearest.as_ref().map(RecommendedFacility::from),
                alternatives,
                urgency_score,
            });
        }

        recommendations.sort_by(compare_recommendations);
        for (index, recommendation) in recommendations.iter_mut().enumerate() {
            recommendation.rank = index + 1;
        }

        let mascal = triage_summary.urgent() > self.config.mascal_threshold;
        if mascal {
            tracing::warn!(
                "MASCAL: {} RED/YELLOW casualties exceed threshold {}",
                triage_summary.urgent(),
                self.config.mascal_threshold
            );
        }

        tracing::info!(
            "Ranked {} casualties ({} skipped, {} facilities usable)",
            recommendations.len(),
            skipped.len(),
            facilities.len()
        );

        RankingResult {
            recommendations,
            mascal,
            mascal_threshold: self.config.mascal_threshold,
            skipped,
            triage_summary,
            evaluated_at: now,
        }
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Self::with_defaults()
    }
}

fn skip(skipped: &mut Vec<SkippedCasualty>, record: &CasualtyRecord, reason: RecordError) {
    tracing::warn!("Skipping casualty {:?}: {}", record.id, reason);
    skipped.push(SkippedCasualty {
        casualty_id: record.id.clone(),
        reason: reason.to_string(),
    });
}

/// Score descending, then RED before YELLOW, earlier injury, smaller id
fn compare_recommendations(a: &EvacuationRecommendation, b: &EvacuationRecommendation) -> Ordering {
    b.urgency_score
        .total_cmp(&a.urgency_score)
        .then_with(|| triage_order(a.triage_color).cmp(&triage_order(b.triage_color)))
        .then_with(|| a.injured_at.cmp(&b.injured_at))
        .then_with(|| a.casualty_id.cmp(&b.casualty_id))
}

#[inline]
fn triage_order(triage: TriageColor) -> u8 {
    match triage {
        TriageColor::Red => 0,
        TriageColor::Yellow => 1,
        _ => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use crate::models::{ComplianceStatus, FacilityRole};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn create_casualty(id: &str, triage: TriageColor, lat: f64, lon: f64, minutes_ago: i64) -> CasualtyRecord {
        CasualtyRecord::new(
            id,
            format!("Casualty {}", id),
            triage,
            lat,
            lon,
            now() - Duration::minutes(minutes_ago),
        )
    }

    fn create_facility(id: &str, role: FacilityRole, lat: f64, lon: f64) -> FacilityRecord {
        FacilityRecord::new(id, format!("Facility {}", id), role, lat, lon)
    }

    fn recommendation(id: &str, triage: TriageColor, minutes_ago: i64, score: f64) -> EvacuationRecommendation {
        EvacuationRecommendation {
            rank: 0,
            casualty_id: id.to_string(),
            name: id.to_string(),
            triage_color: triage,
            latitude: 0.0,
            longitude: 0.0,
            injured_at: now() - Duration::minutes(minutes_ago),
            time_since_injury_minutes: minutes_ago as f64,
            compliance_status: ComplianceStatus::Compliant,
            timeline_window: crate::models::TimelineWindow::Surgical,
            overdue_minutes: 0.0,
            facility: None,
            alternatives: vec![],
            urgency_score: score,
        }
    }

    #[test]
    fn test_red_violation_outranks_nearby_yellow() {
        let ranker = Ranker::with_defaults();
        let facilities = vec![
            create_facility("r2", FacilityRole::Role2, 42.045, -8.0),
            create_facility("r1", FacilityRole::Role1, 41.991, -8.0),
        ];
        let casualties = vec![
            create_casualty("C2", TriageColor::Yellow, 42.0, -8.0, 30),
            create_casualty("C1", TriageColor::Red, 42.0, -8.0, 70),
        ];

        let result = ranker.rank(&casualties, &facilities, now());

        assert_eq!(result.recommendations.len(), 2);
        let first = &result.recommendations[0];
        assert_eq!(first.casualty_id, "C1");
        assert_eq!(first.rank, 1);
        assert_eq!(first.compliance_status, ComplianceStatus::Violated);
        assert_eq!(first.facility.as_ref().unwrap().id, "r2");

        let second = &result.recommendations[1];
        assert_eq!(second.casualty_id, "C2");
        assert_eq!(second.facility.as_ref().unwrap().id, "r1");
        assert!(!result.mascal);
    }

    #[test]
    fn test_only_red_and_yellow_ranked() {
        let ranker = Ranker::with_defaults();
        let casualties = vec![
            create_casualty("g", TriageColor::Green, 42.0, -8.0, 10),
            create_casualty("k", TriageColor::Black, 42.0, -8.0, 10),
            create_casualty("y", TriageColor::Yellow, 42.0, -8.0, 10),
        ];

        let result = ranker.rank(&casualties, &[], now());

        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(result.triage_summary.green, 1);
        assert_eq!(result.triage_summary.black, 1);
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn test_malformed_records_skipped() {
        let ranker = Ranker::with_defaults();
        let mut no_coords = create_casualty("a", TriageColor::Red, 42.0, -8.0, 10);
        no_coords.latitude = None;
        let mut bad_time = create_casualty("b", TriageColor::Yellow, 42.0, -8.0, 10);
        bad_time.injured_at = Some("not a time".to_string());
        let good = create_casualty("c", TriageColor::Red, 42.0, -8.0, 10);

        let result = ranker.rank(&[no_coords, bad_time, good], &[], now());

        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(result.skipped.len(), 2);
        assert_eq!(result.skipped[0].casualty_id, "a");
        assert_eq!(result.skipped[0].reason, "missing coordinates");
        assert_eq!(result.skipped[1].casualty_id, "b");
    }

    #[test]
    fn test_duplicate_ids_ranked_once() {
        let ranker = Ranker::with_defaults();
        let casualties = vec![
            create_casualty("dup", TriageColor::Red, 42.0, -8.0, 10),
            create_casualty("dup", TriageColor::Red, 42.1, -8.0, 20),
        ];

        let result = ranker.rank(&casualties, &[], now());

        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(result.skipped[0].reason, "duplicate casualty id");
        assert_eq!(result.triage_summary.red, 1);
    }

    #[test]
    fn test_first_valid_record_for_id_wins() {
        let ranker = Ranker::with_defaults();
        let mut broken = create_casualty("dup", TriageColor::Red, 42.0, -8.0, 10);
        broken.latitude = None;
        let fixed = create_casualty("dup", TriageColor::Red, 42.1, -8.0, 20);
        let repeat = create_casualty("dup", TriageColor::Red, 42.2, -8.0, 30);

        let result = ranker.rank(&[broken, fixed, repeat], &[], now());

        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(result.recommendations[0].latitude, 42.1);
        let reasons: Vec<&str> = result.skipped.iter().map(|s| s.reason.as_str()).collect();
        assert_eq!(reasons, vec!["missing coordinates", "duplicate casualty id"]);
        assert_eq!(result.triage_summary.red, 1);
    }

    #[test]
    fn test_blank_ids_are_not_duplicates() {
        let ranker = Ranker::with_defaults();
        let casualties = vec![
            create_casualty("", TriageColor::Red, 42.0, -8.0, 10),
            create_casualty(" ", TriageColor::Yellow, 42.0, -8.0, 10),
        ];

        let result = ranker.rank(&casualties, &[], now());

        assert!(result.recommendations.is_empty());
        assert!(result.skipped.iter().all(|s| s.reason == "missing id"));
        assert_eq!(result.skipped.len(), 2);
        assert_eq!(result.triage_summary.urgent(), 2);
    }

    #[test]
    fn test_mascal_threshold_boundary() {
        let ranker = Ranker::with_defaults();
        let mut casualties: Vec<CasualtyRecord> = (0..8)
            .map(|i| create_casualty(&format!("c{}", i), TriageColor::Yellow, 42.0, -8.0, 5))
            .collect();

        assert!(!ranker.rank(&casualties, &[], now()).mascal);

        casualties.push(create_casualty("c8", TriageColor::Red, 42.0, -8.0, 5));
        let result = ranker.rank(&casualties, &[], now());
        assert!(result.mascal);
        assert_eq!(result.mascal_threshold, 8);
    }

    #[test]
    fn test_alternatives_limited() {
        let ranker = Ranker::with_defaults();
        let facilities: Vec<FacilityRecord> = (1..=6)
            .map(|i| create_facility(&format!("f{}", i), FacilityRole::Role3, 42.0 + i as f64 * 0.01, -8.0))
            .collect();
        let casualties = vec![create_casualty("c", TriageColor::Red, 42.0, -8.0, 5)];

        let result = ranker.rank(&casualties, &facilities, now());
        let rec = &result.recommendations[0];

        assert_eq!(rec.facility.as_ref().unwrap().id, "f1");
        let alternative_ids: Vec<&str> = rec.alternatives.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(alternative_ids, vec!["f2", "f3", "f4"]);
    }

    #[test]
    fn test_tie_break_order() {
        let mut recs = vec![
            recommendation("y", TriageColor::Yellow, 30, 10.0),
            recommendation("r-late", TriageColor::Red, 10, 10.0),
            recommendation("r-b", TriageColor::Red, 20, 10.0),
            recommendation("r-a", TriageColor::Red, 20, 10.0),
            recommendation("top", TriageColor::Yellow, 1, 11.0),
        ];

        recs.sort_by(compare_recommendations);

        let order: Vec<&str> = recs.iter().map(|r| r.casualty_id.as_str()).collect();
        assert_eq!(order, vec!["top", "r-a", "r-b", "r-late", "y"]);
    }
}
