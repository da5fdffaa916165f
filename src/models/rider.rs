use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String")]
pub enum TransportMode {
    Bicycle,
    Bike,
    Car,
    Van,
    Truck,
}

impl TransportMode {
    pub fn speed_kmh(self) -> f64 {
        match self {
            TransportMode::Bicycle => 12.0,
            TransportMode::Bike => 20.0,
            TransportMode::Car => 30.0,
            TransportMode::Van => 30.0,
            TransportMode::Truck => 25.0,
        }
    }
}

impl From<String> for TransportMode {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "bicycle" => TransportMode::Bicycle,
            "car" => TransportMode::Car,
            "van" => TransportMode::Van,
            "truck" => TransportMode::Truck,
            // unrecognized modes ride at bike speed
            _ => TransportMode::Bike,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VerificationStatus {
    Inactive,
    PendingVerification,
    Active,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RiderDocuments {
    pub id_card: bool,
    pub vehicle_papers: bool,
    pub profile_photo: bool,
}

impl RiderDocuments {
    pub fn complete(&self) -> bool {
        self.id_card && self.vehicle_papers && self.profile_photo
    }

    pub fn any_uploaded(&self) -> bool {
        self.id_card || self.vehicle_papers || self.profile_photo
    }

    pub fn verification_status(&self) -> VerificationStatus {
        if self.complete() {
            VerificationStatus::Active
        } else if self.any_uploaded() {
            VerificationStatus::PendingVerification
        } else {
            VerificationStatus::Inactive
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rider {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub phone: String,
    pub transport_mode: TransportMode,
    pub online: bool,
    pub verification: VerificationStatus,
    pub documents: RiderDocuments,
    pub location: Option<GeoPoint>,
    pub updated_at: DateTime<Utc>,
}

impl Rider {
    pub fn can_take_orders(&self) -> bool {
        self.online && self.verification == VerificationStatus::Active
    }
}
