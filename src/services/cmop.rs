use crate::models::lenient;
use crate::models::{CasualtyRecord, FacilityRecord, FacilityRole, TriageColor};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with the CMOP map API
#[derive(Debug, Error)]
pub enum CmopError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// CMOP map entity, Spanish field names as served by the API.
///
/// Field values are read leniently: a badly typed casualty still reaches the
/// ranker and is reported there as skipped instead of vanishing here.
#[derive(Debug, Clone, Deserialize)]
pub struct CmopEntity {
    #[serde(default, deserialize_with = "lenient::id")]
    pub id: String,
    #[serde(rename = "nombre", alias = "name", default, deserialize_with = "lenient::text")]
    pub name: String,
    #[serde(rename = "categoria", alias = "category", default, deserialize_with = "lenient::optional_text")]
    pub category: Option<String>,
    #[serde(rename = "tipo_elemento", alias = "element_type", default, deserialize_with = "lenient::optional_text")]
    pub element_type: Option<String>,
    #[serde(rename = "activo", alias = "active", default = "default_true", deserialize_with = "lenient::flag")]
    pub active: bool,
    #[serde(rename = "latitud", alias = "latitude", default, deserialize_with = "lenient::coordinate")]
    pub latitude: Option<f64>,
    #[serde(rename = "longitud", alias = "longitude", default, deserialize_with = "lenient::coordinate")]
    pub longitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "lenient::object")]
    pub medical: Option<CmopMedical>,
}

/// Medical record attached to a casualty entity
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CmopMedical {
    #[serde(default, deserialize_with = "lenient::triage")]
    pub triage_color: TriageColor,
    #[serde(default, deserialize_with = "lenient::optional_text")]
    pub casualty_status: Option<String>,
}

fn default_true() -> bool { true }

const FACILITY_CATEGORY: &str = "medical_facility";

impl CmopEntity {
    pub fn is_casualty(&self) -> bool {
        self.medical.is_some()
    }

    pub fn is_facility(&self) -> bool {
        self.category.as_deref() == Some(FACILITY_CATEGORY)
    }

    /// Injury time is the entity creation time; KIA casualties count as BLACK
    pub fn to_casualty_record(&self) -> CasualtyRecord {
        let medical = self.medical.clone().unwrap_or_default();
        let triage_color = match medical.casualty_status.as_deref() {
            Some("KIA") => TriageColor::Black,
            _ => medical.triage_color,
        };

        CasualtyRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            triage_color,
            latitude: self.latitude,
            longitude: self.longitude,
            injured_at: self.created_at.clone(),
        }
    }

    pub fn to_facility_record(&self) -> FacilityRecord {
        FacilityRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            role: self
                .element_type
                .as_deref()
                .map(FacilityRole::from_element_type)
                .unwrap_or_default(),
            latitude: self.latitude,
            longitude: self.longitude,
            available: self.active,
        }
    }
}

/// Casualties and facilities fetched for one ranking pass
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub casualties: Vec<CasualtyRecord>,
    pub facilities: Vec<FacilityRecord>,
}

impl Snapshot {
    /// Split mixed map entities into casualties and medical facilities
    pub fn from_entities(entities: &[CmopEntity]) -> Self {
        let casualties = entities
            .iter()
            .filter(|e| e.is_casualty())
            .map(CmopEntity::to_casualty_record)
            .collect();
        let facilities = entities
            .iter()
            .filter(|e| e.is_facility())
            .map(CmopEntity::to_facility_record)
            .collect();

        Self { casualties, facilities }
    }
}

/// CMOP map REST API client
///
/// Supplies the casualty and facility picture the ranking engine works on:
/// - all casualties with a medical record
/// - all medical facilities
/// - every entity around a point of interest
pub struct CmopClient {
    base_url: String,
    client: Client,
}

impl CmopClient {
    /// Create a new CMOP client
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, CmopError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { base_url, client })
    }

    /// GET /api/medical/casualties
    pub async fn get_casualties(&self) -> Result<Vec<CmopEntity>, CmopError> {
        self.get_entities("/api/medical/casualties", &[]).await
    }

    /// GET /api/entities/categoria/medical_facility
    pub async fn get_facilities(&self) -> Result<Vec<CmopEntity>, CmopError> {
        let path = format!("/api/entities/categoria/{}", FACILITY_CATEGORY);
        self.get_entities(&path, &[]).await
    }

    /// GET /api/entities/cerca/:lng/:lat?radio=meters
    pub async fn get_nearby_entities(
        &self,
        latitude: f64,
        longitude: f64,
        radius_m: u32,
    ) -> Result<Vec<CmopEntity>, CmopError> {
        let path = format!("/api/entities/cerca/{}/{}", longitude, latitude);
        self.get_entities(&path, &[("radio", radius_m.to_string())]).await
    }

    /// Everything around a point of interest
    pub async fn fetch_poi(
        &self,
        latitude: f64,
        longitude: f64,
        radius_m: u32,
    ) -> Result<Snapshot, CmopError> {
        let entities = self.get_nearby_entities(latitude, longitude, radius_m).await?;
        Ok(Snapshot::from_entities(&entities))
    }

    /// Every casualty against every medical facility
    pub async fn fetch_all(&self) -> Result<Snapshot, CmopError> {
        let (casualties, facilities) = tokio::try_join!(self.get_casualties(), self.get_facilities())?;

        Ok(Snapshot {
            casualties: casualties.iter().map(CmopEntity::to_casualty_record).collect(),
            facilities: facilities
                .iter()
                .filter(|e| e.is_facility())
                .map(CmopEntity::to_facility_record)
                .collect(),
        })
    }

    async fn get_entities(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<CmopEntity>, CmopError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);

        tracing::debug!("Fetching CMOP entities from: {}", url);

        let response = self.client.get(&url).query(query).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CmopError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("CMOP request {} failed: {} - {}", path, status, body);
            return Err(CmopError::ApiError(format!("{} returned {}", path, status)));
        }

        let json: Value = response.json().await?;

        // Payloads are either a bare array or wrapped as { "data": [...] }
        let items = json
            .get("data")
            .unwrap_or(&json)
            .as_array()
            .ok_or_else(|| CmopError::InvalidResponse(format!("{}: expected an entity array", path)))?;

        let entities: Vec<CmopEntity> = items
            .iter()
            .filter_map(|item| match serde_json::from_value(item.clone()) {
                Ok(entity) => Some(entity),
                Err(e) => {
                    tracing::warn!("Dropping unparseable CMOP entity from {}: {}", path, e);
                    None
                }
            })
            .collect();

        tracing::debug!("Fetched {} entities from {}", entities.len(), path);

        Ok(entities)
    }
}
