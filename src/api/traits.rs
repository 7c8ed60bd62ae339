use crate::api::types::{Credentials, ForgotPassword, LoginResponse, Registration, SearchParams};
use crate::error::Result;
use crate::models::{
    Booking, FavoriteSummary, Listing, ListingId, ListingsOverview, NewBooking, NewReview,
    OwnerDashboard, Review, StatusUpdate,
};
use async_trait::async_trait;

/// Public listing endpoints
#[async_trait]
pub trait ListingsApi: Send + Sync {
    /// `GET /listings`
    async fn overview(&self) -> Result<ListingsOverview>;

    /// `GET /listings/search`
    async fn search(&self, params: &SearchParams) -> Result<Vec<Listing>>;

    /// `GET /listings/{id}`, including reviews
    async fn listing(&self, id: ListingId) -> Result<Listing>;

    /// `POST /listings/{id}/reviews`; the server only accepts reviews after a
    /// completed visit
    async fn submit_review(&self, id: ListingId, review: &NewReview) -> Result<Review>;
}

/// Viewer-scoped favorite set, bearer authenticated
#[async_trait]
pub trait FavoritesApi: Send + Sync {
    async fn favorites(&self) -> Result<Vec<FavoriteSummary>>;

    async fn add_favorite(&self, id: ListingId) -> Result<()>;

    async fn remove_favorite(&self, id: ListingId) -> Result<()>;
}

/// Authentication contract
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse>;

    /// Creates an unverified account; returns the server's message
    async fn register(&self, registration: &Registration) -> Result<String>;

    /// Asks for a reset link by email
    async fn forgot_password(&self, request: &ForgotPassword) -> Result<String>;

    /// Exchange a refresh token for a new access token
    async fn refresh(&self, refresh_token: &str) -> Result<String>;

    /// Returns the server's confirmation message
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<String>;
}

/// Booking requests and owner dashboard actions
#[async_trait]
pub trait BookingsApi: Send + Sync {
    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking>;

    /// Bookings made by the viewer
    async fn my_bookings(&self) -> Result<Vec<Booking>>;

    /// Bookings against the viewer's own listings
    async fn owner_bookings(&self) -> Result<Vec<Booking>>;

    /// `GET /owner/dashboard`: summary numbers, listings and bookings
    async fn owner_dashboard(&self) -> Result<OwnerDashboard>;

    async fn update_booking_status(&self, id: u64, update: StatusUpdate) -> Result<Booking>;

    async fn cancel_booking(&self, id: u64) -> Result<()>;
}
