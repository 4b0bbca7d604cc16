// Model exports
pub mod domain;
pub(crate) mod lenient;
pub mod requests;
pub mod responses;

pub use domain::{
    Casualty, CasualtyRecord, ComplianceStatus, DoctrineWindows, EngineConfig,
    EvacuationRecommendation, Facility, FacilityMatch, FacilityRecord, FacilityRole, GeoPoint,
    RecommendedFacility, ScoringWeights, SkippedCasualty, TimelineAssessment, TimelineWindow,
    TriageColor, TriageSummary,
};
pub use requests::{PoiQuery, RankEvacuationsRequest};
pub use responses::{ErrorResponse, HealthResponse, RankingResponse};
