use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::core::RankingResult;
use crate::models::domain::{EvacuationRecommendation, SkippedCasualty, TriageSummary};

/// Response for the ranking endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingResponse {
    pub recommendations: Vec<EvacuationRecommendation>,
    pub mascal: bool,
    #[serde(rename = "mascalThreshold")]
    pub mascal_threshold: usize,
    pub skipped: Vec<SkippedCasualty>,
    #[serde(rename = "triageSummary")]
    pub triage_summary: TriageSummary,
    #[serde(rename = "evaluatedAt")]
    pub evaluated_at: DateTime<Utc>,
}

impl From<RankingResult> for RankingResponse {
    fn from(result: RankingResult) -> Self {
        Self {
            recommendations: result.recommendations,
            mascal: result.mascal,
            mascal_threshold: result.mascal_threshold,
            skipped: result.skipped,
            triage_summary: result.triage_summary,
            evaluated_at: result.evaluated_at,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
