use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;
use crate::models::{Casualty, CasualtyRecord, Facility, FacilityRecord, GeoPoint};

/// Reasons a source record cannot be used for ranking.
///
/// The `Display` text is what operators see in the skipped list.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("missing id")]
    MissingId,

    #[error("missing coordinates")]
    MissingCoordinates,

    #[error("malformed coordinates")]
    MalformedCoordinates,

    #[error("coordinates out of range: ({latitude}, {longitude})")]
    CoordinatesOutOfRange { latitude: f64, longitude: f64 },

    #[error("missing injury timestamp")]
    MissingInjuryTime,

    #[error("malformed injury timestamp: {0}")]
    MalformedInjuryTime(String),

    #[error("duplicate casualty id")]
    DuplicateId,
}

/// Validate a casualty record into a rankable casualty
pub fn validate_casualty(record: &CasualtyRecord) -> Result<Casualty, RecordError> {
    if record.id.trim().is_empty() {
        return Err(RecordError::MissingId);
    }
    let location = validate_position(record.latitude, record.longitude)?;
    let raw_time = record
        .injured_at
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(RecordError::MissingInjuryTime)?;
    let injured_at = parse_timestamp(raw_time)?;

    Ok(Casualty {
        id: record.id.clone(),
        name: record.name.clone(),
        triage_color: record.triage_color,
        location,
        injured_at,
    })
}

/// Validate a facility record
pub fn validate_facility(record: &FacilityRecord) -> Result<Facility, RecordError> {
    if record.id.trim().is_empty() {
        return Err(RecordError::MissingId);
    }
    let location = validate_position(record.latitude, record.longitude)?;

    Ok(Facility {
        id: record.id.clone(),
        name: record.name.clone(),
        role: record.role,
        location,
        available: record.available,
    })
}

fn validate_position(latitude: Option<f64>, longitude: Option<f64>) -> Result<GeoPoint, RecordError> {
    let (latitude, longitude) = match (latitude, longitude) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => return Err(RecordError::MissingCoordinates),
    };

    if !latitude.is_finite() || !longitude.is_finite() {
        return Err(RecordError::MalformedCoordinates);
    }
    if latitude.abs() > 90.0 || longitude.abs() > 180.0 {
        return Err(RecordError::CoordinatesOutOfRange { latitude, longitude });
    }

    Ok(GeoPoint::new(latitude, longitude))
}

/// Parse an RFC 3339 timestamp; naive ISO timestamps are taken as UTC
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RecordError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(RecordError::MalformedInjuryTime(raw.to_string()))
}
