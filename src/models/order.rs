use std::fmt::{self, Display};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::rider::GeoPoint;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    ReadyForPickup,
    PickedUp,
    InTransit,
    NearDelivery,
    Delivered,
    Canceled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
    }

    /// Statuses during which the assigned rider is considered occupied.
    pub fn is_active_delivery(self) -> bool {
        matches!(
            self,
            OrderStatus::Confirmed
                | OrderStatus::Preparing
                | OrderStatus::ReadyForPickup
                | OrderStatus::PickedUp
                | OrderStatus::InTransit
                | OrderStatus::NearDelivery
        )
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        match (self, next) {
            (Pending, Confirmed) => true,
            (Confirmed, Preparing) => true,
            (Preparing, ReadyForPickup) => true,
            (ReadyForPickup, PickedUp) => true,
            (PickedUp, InTransit) => true,
            (InTransit, NearDelivery) => true,
            // confirmation can land before the courier ever crossed the
            // near-delivery threshold
            (InTransit, Delivered) => true,
            (NearDelivery, Delivered) => true,
            (from, Canceled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::ReadyForPickup => "ready_for_pickup",
            OrderStatus::PickedUp => "picked_up",
            OrderStatus::InTransit => "in_transit",
            OrderStatus::NearDelivery => "near_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price_kobo: i64,
}

impl OrderItem {
    pub fn line_total_kobo(&self) -> i64 {
        self.unit_price_kobo * i64::from(self.quantity)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryOtp {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub vendor_id: Uuid,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub destination: GeoPoint,
    pub distance_km: f64,
    pub delivery_fee_kobo: i64,
    pub total_kobo: i64,
    pub rider: Option<Uuid>,
    // never serialized: the code reaches the customer through the
    // notification channel only
    #[serde(skip)]
    pub otp: Option<DeliveryOtp>,
    pub estimated_pickup_time: Option<DateTime<Utc>>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub actual_pickup_time: Option<DateTime<Utc>>,
    pub actual_delivery_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub status_history: Vec<StatusChange>,
}

impl Order {
    /// Moves the order along one edge of the lifecycle. A rejected edge
    /// leaves the order untouched.
    pub fn transition(&mut self, next: OrderStatus, at: DateTime<Utc>) -> Result<(), AppError> {
        if !self.status.can_transition_to(next) {
            return Err(AppError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }

        match next {
            OrderStatus::PickedUp => self.actual_pickup_time = Some(at),
            OrderStatus::Delivered => {
                self.actual_delivery_time = Some(at);
                self.otp = None;
            }
            OrderStatus::Canceled => self.otp = None,
            _ => {}
        }

        self.status_history.push(StatusChange {
            from: self.status,
            to: next,
            at,
        });
        self.status = next;

        Ok(())
    }
}
