//! Evac Rank - evacuation priority ranking for casualty/medical facility pictures
//!
//! This library provides the deterministic ranking engine used to decide which
//! casualties to evacuate first and to which medical facility, following the
//! NATO 10-1-2 timeline and AJMedP-2 facility roles.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{Ranker, RankingResult, distance::{haversine_distance, eta_minutes}};
pub use crate::models::{CasualtyRecord, FacilityRecord, EngineConfig, EvacuationRecommendation, ScoringWeights, RankingResponse};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Verify that the library exports work correctly
        assert!(haversine_distance(40.7128, -74.0060, 40.72, -74.01) > 0.0);
        assert_eq!(Ranker::default().config().mascal_threshold, 8);
    }
}
