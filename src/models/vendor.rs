use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::rider::GeoPoint;

pub const DELETED_VENDOR_PLACEHOLDER: &str = "deleted vendor";

/// Vendors are soft-deleted: orders keep the vendor id and any view that
/// resolves the name falls back to a placeholder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub id: Uuid,
    pub name: String,
    pub location: GeoPoint,
    pub deleted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub price_kobo: i64,
    pub parent_id: Option<Uuid>,
}
