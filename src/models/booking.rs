use crate::error::{ApiError, Result};
use crate::models::ListingId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a booking as stored by the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    /// Set by the owner's "Tenant Left" action
    Left,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Cancelled => "Cancelled",
            BookingStatus::Left => "Tenant Left",
            BookingStatus::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// Owner-side status transition.
///
/// The server accepts these lowercase and stores them capitalized, so a
/// `TenantLeft` update comes back as [`BookingStatus::Left`] while the
/// dashboard labels it "Tenant Left". The wire values are sent exactly as
/// the server expects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    Confirm,
    Cancel,
    TenantLeft,
}

impl StatusUpdate {
    pub fn wire_value(self) -> &'static str {
        match self {
            StatusUpdate::Confirm => "confirmed",
            StatusUpdate::Cancel => "cancelled",
            StatusUpdate::TenantLeft => "left",
        }
    }
}

impl std::str::FromStr for StatusUpdate {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "confirm" | "confirmed" => Ok(StatusUpdate::Confirm),
            "cancel" | "cancelled" => Ok(StatusUpdate::Cancel),
            "left" | "tenant-left" => Ok(StatusUpdate::TenantLeft),
            other => Err(format!("unknown booking status '{}'", other)),
        }
    }
}

/// Listing summary embedded in a booking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingListing {
    pub id: ListingId,
    pub title: String,
    #[serde(default)]
    pub street_address: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub main_image_url: Option<String>,
}

/// Tenant summary shown on the owner dashboard
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tenant {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile_no: Option<String>,
}

/// A visit request against a listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Booking {
    /// The owner dashboard names this `booking_id`
    #[serde(alias = "booking_id")]
    pub id: u64,
    pub booking_date: chrono::NaiveDate,
    pub attendees: u32,
    pub status: BookingStatus,
    #[serde(default)]
    pub listing: Option<BookingListing>,
    #[serde(default)]
    pub tenant: Option<Tenant>,
}

/// Body of `POST /bookings/create`
#[derive(Debug, Clone, Serialize)]
pub struct NewBooking {
    pub listing_id: ListingId,
    pub attendees: u32,
}

impl NewBooking {
    /// Rejects requests the server would refuse anyway
    pub fn new(listing_id: ListingId, attendees: u32) -> Result<Self> {
        if attendees == 0 {
            return Err(ApiError::Validation(
                "attendees must be a positive number".to_string(),
            ));
        }
        Ok(Self {
            listing_id,
            attendees,
        })
    }
}
