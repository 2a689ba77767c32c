use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TidewatchError;

// --- Geo Types ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

/// Haversine great-circle distance between two lat/lng points in kilometers.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const EARTH_RADIUS_KM: f64 = 6371.0;
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let lat1_r = lat1.to_radians();
    let lat2_r = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1_r.cos() * lat2_r.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();
    EARTH_RADIUS_KM * c
}

impl GeoPoint {
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        haversine_km(self.lat, self.lng, other.lat, other.lng)
    }
}

// --- Enums ---

/// Ordered severity scale. The derived `Ord` follows declaration order
/// (Low < Medium < High < Critical); `max()` over it is how dominant
/// severity and "highest severity" are computed everywhere.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "low"),
            Severity::Medium => write!(f, "medium"),
            Severity::High => write!(f, "high"),
            Severity::Critical => write!(f, "critical"),
        }
    }
}

impl FromStr for Severity {
    type Err = TidewatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(TidewatchError::Validation(format!(
                "unknown severity: {other}"
            ))),
        }
    }
}

/// The ocean hazard taxonomy. Parsing is strict: an unknown hazard type is a
/// validation error, never coerced to a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardType {
    Tsunami,
    StormSurge,
    HighWaves,
    Flooding,
    CoastalCurrent,
    AbnormalTide,
}

impl HazardType {
    pub const ALL: [HazardType; 6] = [
        HazardType::Tsunami,
        HazardType::StormSurge,
        HazardType::HighWaves,
        HazardType::Flooding,
        HazardType::CoastalCurrent,
        HazardType::AbnormalTide,
    ];
}

impl std::fmt::Display for HazardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HazardType::Tsunami => write!(f, "tsunami"),
            HazardType::StormSurge => write!(f, "storm_surge"),
            HazardType::HighWaves => write!(f, "high_waves"),
            HazardType::Flooding => write!(f, "flooding"),
            HazardType::CoastalCurrent => write!(f, "coastal_current"),
            HazardType::AbnormalTide => write!(f, "abnormal_tide"),
        }
    }
}

impl FromStr for HazardType {
    type Err = TidewatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "tsunami" => Ok(HazardType::Tsunami),
            "storm_surge" => Ok(HazardType::StormSurge),
            "high_waves" => Ok(HazardType::HighWaves),
            "flooding" => Ok(HazardType::Flooding),
            "coastal_current" => Ok(HazardType::CoastalCurrent),
            "abnormal_tide" => Ok(HazardType::AbnormalTide),
            other => Err(TidewatchError::Validation(format!(
                "unknown hazard type: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Twitter,
    Facebook,
    Youtube,
    Mock,
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Twitter => write!(f, "twitter"),
            Platform::Facebook => write!(f, "facebook"),
            Platform::Youtube => write!(f, "youtube"),
            Platform::Mock => write!(f, "mock"),
        }
    }
}

/// Where an alert came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSource {
    System,
    Crowdsourced,
    ExternalFeed,
}

impl std::fmt::Display for AlertSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSource::System => write!(f, "system"),
            AlertSource::Crowdsourced => write!(f, "crowdsourced"),
            AlertSource::ExternalFeed => write!(f, "external_feed"),
        }
    }
}

// --- Posts and signals ---

/// A raw social-media post as normalized by a collector. Immutable once
/// ingested; identity is (platform, external_id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub platform: Platform,
    pub external_id: String,
    pub content: String,
    pub author: Option<String>,
    pub location: Option<GeoPoint>,
    pub engagement: HashMap<String, u64>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Dedup key: one stored signal per (platform, external_id).
    pub fn identity(&self) -> (Platform, String) {
        (self.platform, self.external_id.clone())
    }
}

/// A post that passed through text analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedSignal {
    pub id: Uuid,
    pub post: Post,
    pub hazard_keywords: BTreeSet<String>,
    /// Compound polarity in [-1, 1].
    pub sentiment_score: f64,
    /// Hazard relevance in [0, 1].
    pub hazard_probability: f64,
    pub processed_at: DateTime<Utc>,
}

// --- Hazard reports ---

/// A user-submitted hazard observation. Verification is a one-way
/// transition performed by a privileged actor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HazardReport {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
    pub hazard_type: HazardType,
    pub severity: Severity,
    pub location: GeoPoint,
    pub media_urls: Vec<String>,
    pub is_verified: bool,
    pub verified_by: Option<Uuid>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl HazardReport {
    /// Mark this report verified. Idempotent: re-verifying keeps the
    /// original verifier and timestamp.
    pub fn verify(&mut self, verifier: Uuid, now: DateTime<Utc>) {
        if self.is_verified {
            return;
        }
        self.is_verified = true;
        self.verified_by = Some(verifier);
        self.verified_at = Some(now);
    }

    /// Whether this report should feed alert generation.
    pub fn warrants_alert(&self) -> bool {
        self.is_verified && self.severity >= Severity::High
    }
}

// --- Hotspots ---

/// A spatio-temporal cluster of reports and signals. A run of the
/// aggregator emits a fresh generation; old generations age out by TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hotspot {
    pub id: Uuid,
    pub generation: Uuid,
    pub center: GeoPoint,
    pub radius_km: f64,
    pub report_count: u32,
    pub severity: Severity,
    pub hazard_types: BTreeSet<HazardType>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Hotspot {
    /// Construct a hotspot, enforcing its invariants: at least one
    /// contributing member and an expiry strictly after creation.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        generation: Uuid,
        center: GeoPoint,
        radius_km: f64,
        report_count: u32,
        severity: Severity,
        hazard_types: BTreeSet<HazardType>,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<Self, TidewatchError> {
        if report_count == 0 {
            return Err(TidewatchError::InvariantViolation(
                "hotspot requires at least one contributing report or signal".to_string(),
            ));
        }
        if expires_at <= created_at {
            return Err(TidewatchError::InvariantViolation(format!(
                "hotspot expiry {expires_at} is not after creation {created_at}"
            )));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            generation,
            center,
            radius_km,
            report_count,
            severity,
            hazard_types,
            created_at,
            expires_at,
        })
    }
}

// --- Alerts ---

/// An issued alert. Lifecycle: active → inactive (terminal). Inactive
/// alerts are kept for audit, never deleted and never reactivated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub alert_type: HazardType,
    pub title: String,
    pub message: String,
    pub severity: Severity,
    pub source: AlertSource,
    /// Optional affected-area polygon (exterior ring).
    pub affected_area: Option<Vec<GeoPoint>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Alert {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

/// Per-user delivery/read state for one alert. Created at fanout; the only
/// mutation is flipping `is_read`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAlert {
    pub user_id: Uuid,
    pub alert_id: Uuid,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// The slice of a registered user the pipeline needs for fanout.
/// Registration and profiles live outside the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub registered_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn severity_total_order() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
        let max = [Severity::High, Severity::Low, Severity::Critical]
            .into_iter()
            .max()
            .unwrap();
        assert_eq!(max, Severity::Critical);
    }

    #[test]
    fn hazard_type_parse_roundtrip() {
        for ht in HazardType::ALL {
            assert_eq!(ht.to_string().parse::<HazardType>().unwrap(), ht);
        }
    }

    #[test]
    fn unknown_hazard_type_rejected() {
        let err = "sharknado".parse::<HazardType>().unwrap_err();
        assert!(matches!(err, TidewatchError::Validation(_)));
    }

    #[test]
    fn haversine_chennai_to_mumbai() {
        // Chennai to Mumbai is ~1030km
        let dist = haversine_km(13.0827, 80.2707, 19.0760, 72.8777);
        assert!(
            (dist - 1030.0).abs() < 20.0,
            "Chennai to Mumbai should be ~1030km, got {dist}"
        );
    }

    #[test]
    fn haversine_same_point_is_zero() {
        let dist = haversine_km(13.0827, 80.2707, 13.0827, 80.2707);
        assert!(dist < 0.001, "Same point should be 0km, got {dist}");
    }

    #[test]
    fn report_verification_is_one_way() {
        let now = Utc::now();
        let first_verifier = Uuid::new_v4();
        let mut report = HazardReport {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "High waves at Marina Beach".to_string(),
            description: "Water levels rising rapidly".to_string(),
            hazard_type: HazardType::HighWaves,
            severity: Severity::High,
            location: GeoPoint { lat: 13.05, lng: 80.28 },
            media_urls: vec![],
            is_verified: false,
            verified_by: None,
            verified_at: None,
            created_at: now,
        };
        assert!(!report.warrants_alert());

        report.verify(first_verifier, now);
        assert!(report.is_verified);
        assert!(report.warrants_alert());

        report.verify(Uuid::new_v4(), now + Duration::hours(1));
        assert_eq!(report.verified_by, Some(first_verifier));
        assert_eq!(report.verified_at, Some(now));
    }

    #[test]
    fn medium_verified_report_does_not_warrant_alert() {
        let now = Utc::now();
        let mut report = HazardReport {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Choppy water".to_string(),
            description: "Somewhat rough".to_string(),
            hazard_type: HazardType::HighWaves,
            severity: Severity::Medium,
            location: GeoPoint { lat: 13.05, lng: 80.28 },
            media_urls: vec![],
            is_verified: false,
            verified_by: None,
            verified_at: None,
            created_at: now,
        };
        report.verify(Uuid::new_v4(), now);
        assert!(!report.warrants_alert());
    }

    #[test]
    fn hotspot_rejects_zero_members() {
        let now = Utc::now();
        let err = Hotspot::new(
            Uuid::new_v4(),
            GeoPoint { lat: 13.0, lng: 80.0 },
            2.0,
            0,
            Severity::Medium,
            BTreeSet::new(),
            now,
            now + Duration::hours(6),
        )
        .unwrap_err();
        assert!(matches!(err, TidewatchError::InvariantViolation(_)));
    }

    #[test]
    fn hotspot_rejects_expiry_before_creation() {
        let now = Utc::now();
        let err = Hotspot::new(
            Uuid::new_v4(),
            GeoPoint { lat: 13.0, lng: 80.0 },
            2.0,
            3,
            Severity::High,
            BTreeSet::from([HazardType::Flooding]),
            now,
            now - Duration::minutes(1),
        )
        .unwrap_err();
        assert!(matches!(err, TidewatchError::InvariantViolation(_)));
    }
}
