use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;
use crate::models::domain::{CasualtyRecord, FacilityRecord};
use crate::models::lenient;

/// Request to rank an inline casualty/facility picture
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RankEvacuationsRequest {
    /// Read record by record; malformed entries end up in the skipped list
    #[serde(default, deserialize_with = "lenient::records")]
    pub casualties: Vec<CasualtyRecord>,
    #[serde(default, deserialize_with = "lenient::records")]
    pub facilities: Vec<FacilityRecord>,
    /// Evaluation instant, defaults to the time the request is handled
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
    #[validate(range(min = 1))]
    #[serde(alias = "mascal_threshold", rename = "mascalThreshold", default)]
    pub mascal_threshold: Option<usize>,
}

/// Point-of-interest query, casualties and facilities are fetched from CMOP
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PoiQuery {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(range(min = 1, max = 500000))]
    #[serde(alias = "radius_m", rename = "radiusM", default)]
    pub radius_m: Option<u32>,
}
