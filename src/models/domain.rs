use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::models::lenient;

/// NATO triage classification colours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TriageColor {
    /// T1, immediate
    Red,
    /// T2, urgent
    Yellow,
    /// T3, minimal
    Green,
    /// T4, expectant
    Blue,
    Black,
    #[default]
    #[serde(other)]
    Unknown,
}

impl TriageColor {
    /// Only RED and YELLOW casualties are ranked for evacuation
    pub fn is_ranked(self) -> bool {
        matches!(self, TriageColor::Red | TriageColor::Yellow)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TriageColor::Red => "RED",
            TriageColor::Yellow => "YELLOW",
            TriageColor::Green => "GREEN",
            TriageColor::Blue => "BLUE",
            TriageColor::Black => "BLACK",
            TriageColor::Unknown => "UNKNOWN",
        }
    }
}

/// Medical facility role (AJMedP-2 echelons)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FacilityRole {
    #[serde(rename = "medical_role_1", alias = "role_1")]
    Role1,
    #[serde(rename = "medical_role_2", alias = "role_2")]
    Role2,
    #[serde(rename = "medical_role_2basic")]
    Role2Basic,
    #[serde(rename = "medical_role_2enhanced")]
    Role2Enhanced,
    #[serde(rename = "medical_role_3", alias = "role_3")]
    Role3,
    #[serde(rename = "medical_role_4", alias = "role_4")]
    Role4,
    #[serde(rename = "medical_facility_multinational")]
    Multinational,
    #[default]
    #[serde(other)]
    Unknown,
}

impl FacilityRole {
    /// Numeric role level used for eligibility and tie-breaking.
    /// Unrecognised roles are level 0 and never eligible.
    pub fn level(self) -> u8 {
        match self {
            FacilityRole::Role1 => 1,
            FacilityRole::Role2 | FacilityRole::Role2Basic | FacilityRole::Role2Enhanced => 2,
            FacilityRole::Role3 | FacilityRole::Multinational => 3,
            FacilityRole::Role4 => 4,
            FacilityRole::Unknown => 0,
        }
    }

    /// Parse the CMOP `tipo_elemento` value
    pub fn from_element_type(value: &str) -> Self {
        match value {
            "medical_role_1" => FacilityRole::Role1,
            "medical_role_2" => FacilityRole::Role2,
            "medical_role_2basic" => FacilityRole::Role2Basic,
            "medical_role_2enhanced" => FacilityRole::Role2Enhanced,
            "medical_role_3" => FacilityRole::Role3,
            "medical_role_4" => FacilityRole::Role4,
            "medical_facility_multinational" => FacilityRole::Multinational,
            _ => FacilityRole::Unknown,
        }
    }
}

/// WGS84 position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Casualty as supplied by the data source, before validation.
///
/// Deserialization never rejects a field value; badly typed fields surface
/// as validation failures so the record is skipped with a reason.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CasualtyRecord {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "triageColor", alias = "triage_color", default, deserialize_with = "lenient::triage")]
    pub triage_color: TriageColor,
    #[serde(default, deserialize_with = "lenient::coordinate")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient::coordinate")]
    pub longitude: Option<f64>,
    /// RFC 3339 text; naive ISO timestamps are read as UTC
    #[serde(rename = "injuredAt", alias = "injured_at", default, deserialize_with = "lenient::timestamp")]
    pub injured_at: Option<String>,
}

impl CasualtyRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        triage_color: TriageColor,
        latitude: f64,
        longitude: f64,
        injured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            triage_color,
            latitude: Some(latitude),
            longitude: Some(longitude),
            injured_at: Some(injured_at.to_rfc3339()),
        }
    }
}

/// Validated casualty, ready for ranking
#[derive(Debug, Clone, PartialEq)]
pub struct Casualty {
    pub id: String,
    pub name: String,
    pub triage_color: TriageColor,
    pub location: GeoPoint,
    pub injured_at: DateTime<Utc>,
}

/// Medical facility as supplied by the data source, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityRecord {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::role")]
    pub role: FacilityRole,
    #[serde(default, deserialize_with = "lenient::coordinate")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient::coordinate")]
    pub longitude: Option<f64>,
    #[serde(default = "default_true", deserialize_with = "lenient::flag")]
    pub available: bool,
}

impl Default for FacilityRecord {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            role: FacilityRole::Unknown,
            latitude: None,
            longitude: None,
            available: true,
        }
    }
}

impl FacilityRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: FacilityRole,
        latitude: f64,
        longitude: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role,
            latitude: Some(latitude),
            longitude: Some(longitude),
            available: true,
        }
    }
}

/// Validated medical facility
#[derive(Debug, Clone, PartialEq)]
pub struct Facility {
    pub id: String,
    pub name: String,
    pub role: FacilityRole,
    pub location: GeoPoint,
    pub available: bool,
}

fn default_true() -> bool { true }

/// 10-1-2 compliance classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplianceStatus {
    Compliant,
    AtRisk,
    Violated,
}

/// The 10-1-2 doctrine windows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineWindow {
    /// 10 minutes to initial care
    InitialCare,
    /// 1 hour to surgical capability
    Surgical,
    /// 2 hours to definitive care
    Definitive,
}

/// Output of the timeline compliance check for one casualty
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineAssessment {
    pub elapsed_minutes: f64,
    pub status: ComplianceStatus,
    /// Window being met (COMPLIANT), missed (AT_RISK) or breached (VIOLATED)
    pub window: TimelineWindow,
    /// Minutes past the tighter window of the casualty's triage class, 0 when compliant
    pub overdue_minutes: f64,
}

/// Nearest eligible facility for a casualty
#[derive(Debug, Clone, PartialEq)]
pub struct FacilityMatch {
    pub facility: Facility,
    pub distance_km: f64,
    pub eta_minutes: f64,
}

/// Facility part of a recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedFacility {
    pub id: String,
    pub name: String,
    pub role: FacilityRole,
    #[serde(rename = "roleLevel")]
    pub role_level: u8,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
    #[serde(rename = "etaMinutes")]
    pub eta_minutes: f64,
}

impl From<&FacilityMatch> for RecommendedFacility {
    fn from(m: &FacilityMatch) -> Self {
        Self {
            id: m.facility.id.clone(),
            name: m.facility.name.clone(),
            role: m.facility.role,
            role_level: m.facility.role.level(),
            distance_km: m.distance_km,
            eta_minutes: m.eta_minutes,
        }
    }
}

/// Ranked evacuation recommendation for one casualty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvacuationRecommendation {
    /// 1-based position in the ranking
    pub rank: usize,
    #[serde(rename = "casualtyId")]
    pub casualty_id: String,
    pub name: String,
    #[serde(rename = "triageColor")]
    pub triage_color: TriageColor,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "injuredAt")]
    pub injured_at: DateTime<Utc>,
    #[serde(rename = "timeSinceInjuryMinutes")]
    pub time_since_injury_minutes: f64,
    #[serde(rename = "complianceStatus")]
    pub compliance_status: ComplianceStatus,
    #[serde(rename = "timelineWindow")]
    pub timeline_window: TimelineWindow,
    #[serde(rename = "overdueMinutes")]
    pub overdue_minutes: f64,
    /// `None` when no eligible facility exists
    pub facility: Option<RecommendedFacility>,
    #[serde(default)]
    pub alternatives: Vec<RecommendedFacility>,
    #[serde(rename = "urgencyScore")]
    pub urgency_score: f64,
}

/// Casualty left out of the ranking because its record is unusable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedCasualty {
    #[serde(rename = "casualtyId")]
    pub casualty_id: String,
    pub reason: String,
}

/// Casualty counts per triage colour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageSummary {
    pub red: usize,
    pub yellow: usize,
    pub green: usize,
    pub blue: usize,
    pub black: usize,
    pub unknown: usize,
}

impl TriageSummary {
    pub fn record(&mut self, color: TriageColor) {
        match color {
            TriageColor::Red => self.red += 1,
            TriageColor::Yellow => self.yellow += 1,
            TriageColor::Green => self.green += 1,
            TriageColor::Blue => self.blue += 1,
            TriageColor::Black => self.black += 1,
            TriageColor::Unknown => self.unknown += 1,
        }
    }

    /// RED + YELLOW, the count MASCAL detection looks at
    pub fn urgent(&self) -> usize {
        self.red + self.yellow
    }
}

/// Scoring weights
///
/// Every tier must outweigh the full range of all tiers below it,
/// checked by `ScoringWeights::check_dominance`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub red_base: f64,
    pub yellow_base: f64,
    pub violation_per_minute: f64,
    pub elapsed_per_minute: f64,
    pub distance_max: f64,
    pub distance_scale_km: f64,
    /// Minute-valued terms stop growing past this many minutes
    pub max_counted_minutes: u32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            red_base: 100_000_000.0,
            yellow_base: 10_000_000.0,
            violation_per_minute: 3_000.0,
            elapsed_per_minute: 2.0,
            distance_max: 1.0,
            distance_scale_km: 25.0,
            max_counted_minutes: 1_440,
        }
    }
}

/// 10-1-2 window lengths in minutes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DoctrineWindows {
    pub initial_care_minutes: f64,
    pub surgical_minutes: f64,
    pub definitive_minutes: f64,
}

impl DoctrineWindows {
    pub fn minutes(&self, window: TimelineWindow) -> f64 {
        match window {
            TimelineWindow::InitialCare => self.initial_care_minutes,
            TimelineWindow::Surgical => self.surgical_minutes,
            TimelineWindow::Definitive => self.definitive_minutes,
        }
    }
}

impl Default for DoctrineWindows {
    fn default() -> Self {
        Self {
            initial_care_minutes: 10.0,
            surgical_minutes: 60.0,
            definitive_minutes: 120.0,
        }
    }
}

/// Parameters of one ranking pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    pub ground_speed_kmh: f64,
    pub mascal_threshold: usize,
    pub windows: DoctrineWindows,
    pub equidistance_tolerance_km: f64,
    pub alternatives_limit: usize,
    pub weights: ScoringWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ground_speed_kmh: 60.0,
            mascal_threshold: 8,
            windows: DoctrineWindows::default(),
            equidistance_tolerance_km: 0.01,
            alternatives_limit: 3,
            weights: ScoringWeights::default(),
        }
    }
}
