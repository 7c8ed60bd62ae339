pub mod booking;
pub mod dashboard;

use crate::error::{ApiError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

pub use booking::{Booking, BookingListing, BookingStatus, NewBooking, StatusUpdate, Tenant};
pub use dashboard::{DashboardSummary, OwnerDashboard};

/// Server-assigned listing identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(pub u64);

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a listing still has seats left today
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum Availability {
    #[default]
    Available,
    Booked,
}

/// Public information about the owner of a listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Owner {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub mobile_no: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
}

/// Postal address of a property
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Address {
    #[serde(rename = "street_address")]
    pub street: String,
    pub city: String,
    pub state: String,
    pub pincode: String,
}

impl Address {
    /// Short "city, state" label used in list views
    pub fn locality(&self) -> String {
        match (self.city.is_empty(), self.state.is_empty()) {
            (false, false) => format!("{}, {}", self.city, self.state),
            (false, true) => self.city.clone(),
            (true, false) => self.state.clone(),
            (true, true) => String::new(),
        }
    }

    fn fields(&self) -> [&str; 4] {
        [&self.street, &self.city, &self.state, &self.pincode]
    }
}

/// A review left by a tenant after a completed visit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: u64,
    pub author_username: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: Option<String>,
    pub created_at: String,
}

/// Body of `POST /listings/{id}/reviews`
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewReview {
    pub rating: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl NewReview {
    /// Star ratings run from 1 to 5; a blank comment is dropped
    pub fn new(rating: u8, comment: Option<String>) -> Result<Self> {
        if !(1..=5).contains(&rating) {
            return Err(ApiError::Validation(format!(
                "rating must be between 1 and 5, got {}",
                rating
            )));
        }
        Ok(Self {
            rating,
            comment: comment
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        })
    }
}

/// Core rental listing snapshot as returned by the marketplace API
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub id: ListingId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub address: Address,
    #[serde(rename = "propertyType", default)]
    pub property_type: Option<String>,
    #[serde(rename = "monthlyRent")]
    pub monthly_rent: f64,
    #[serde(rename = "securityDeposit", default)]
    pub security_deposit: f64,
    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: u32,
    #[serde(default)]
    pub seating: u32,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub furnishing: Option<String>,
    #[serde(default)]
    pub amenities: BTreeSet<String>,
    #[serde(default)]
    pub pid: Option<String>,
    #[serde(rename = "ownerName", default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(rename = "image_urls", default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub owner: Option<Owner>,
    #[serde(rename = "availability_status", default)]
    pub availability: Availability,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub review_count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reviews: Vec<Review>,
}

impl Listing {
    /// First image is the cover
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    /// Average rating, with unrated listings counted as zero
    pub fn rating(&self) -> f64 {
        self.average_rating.unwrap_or(0.0)
    }

    /// Case-insensitive match against the title and every address field
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }

        std::iter::once(self.title.as_str())
            .chain(self.address.fields())
            .any(|field| field.to_lowercase().contains(&needle))
    }
}

/// Response of `GET /listings`: curated featured subset plus everything
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ListingsOverview {
    #[serde(default)]
    pub featured: Vec<Listing>,
    #[serde(rename = "all_listings", default)]
    pub all: Vec<Listing>,
}

/// Listing summary returned by `GET /favorites`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FavoriteSummary {
    pub id: ListingId,
    pub title: String,
    #[serde(rename = "monthlyRent")]
    pub monthly_rent: f64,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub main_image_url: Option<String>,
}

/// Account role as reported at login
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[serde(alias = "Owner")]
    Owner,
    #[serde(rename = "user", alias = "User", alias = "tenant")]
    Tenant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Owner => f.write_str("owner"),
            Role::Tenant => f.write_str("tenant"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "user" | "tenant" => Ok(Role::Tenant),
            other => Err(format!("unknown role '{}', expected owner or user", other)),
        }
    }
}

/// Profile snapshot of the signed-in viewer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: u64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile_no: Option<String>,
    pub role: Role,
}
