pub mod client;
pub mod traits;
pub mod types;

pub use client::{BearerToken, HttpApiClient};
pub use traits::{AuthApi, BookingsApi, FavoritesApi, ListingsApi};
pub use types::{
    Credentials, ForgotPassword, LoginResponse, Registration, RentOrder, SearchParams,
};
