use crate::api::traits::{AuthApi, BookingsApi, FavoritesApi, ListingsApi};
use crate::api::types::{
    ApiEnvelope, Credentials, ForgotPassword, LoginResponse, MessageBody, PasswordReset,
    RefreshResponse, Registration, SearchParams, StatusBody,
};
use crate::config::Config;
use crate::error::{ApiError, Result};
use crate::models::{
    Booking, FavoriteSummary, Listing, ListingId, ListingsOverview, NewBooking, NewReview,
    OwnerDashboard, Review, StatusUpdate,
};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Shared slot for the viewer's access token.
///
/// The session writes it, the HTTP client reads it on every request.
#[derive(Debug, Clone, Default)]
pub struct BearerToken(Arc<RwLock<Option<String>>>);

impl BearerToken {
    pub fn set(&self, token: impl Into<String>) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Some(token.into());
    }

    pub fn clear(&self) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn get(&self) -> Option<String> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_present(&self) -> bool {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

/// reqwest-backed client for the marketplace REST API
pub struct HttpApiClient {
    client: Client,
    base_url: String,
    token: BearerToken,
}

impl HttpApiClient {
    pub fn new(config: &Config, token: BearerToken) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .user_agent(concat!("rental-scout/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Every outgoing request goes through here so the bearer header is
    /// attached in one place.
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let builder = self.client.request(method, url);
        match self.token.get() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Login, registration and password recovery carry their credentials in
    /// the body and go out without the session token.
    fn anonymous(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("{} {}", method, url);
        self.client.request(method, url)
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder.build()?;
        let signed = request.headers().contains_key(AUTHORIZATION);
        let response = self.client.execute(request).await?;
        Self::check(response, signed).await
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        let body = response.text().await?;
        debug!("Received {} bytes", body.len());
        Ok(serde_json::from_str(&body)?)
    }

    async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        self.send(builder).await?;
        Ok(())
    }

    /// Turn non-2xx responses into typed errors carrying the server message.
    ///
    /// 401/422 only mean an expired or malformed session when a token was
    /// sent; without one they are the server rejecting what was submitted.
    async fn check(response: Response, signed: bool) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<MessageBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .unwrap_or_else(|| {
                if body.is_empty() {
                    status.to_string()
                } else {
                    body.clone()
                }
            });

        warn!("API returned status {}: {}", status, message);

        Err(match status {
            StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY if signed => {
                ApiError::AuthenticationRequired
            }
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ => ApiError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl ListingsApi for HttpApiClient {
    async fn overview(&self) -> Result<ListingsOverview> {
        let envelope: ApiEnvelope<ListingsOverview> =
            self.send_json(self.request(Method::GET, "/listings")).await?;

        info!(
            featured = envelope.data.featured.len(),
            all = envelope.data.all.len(),
            "Fetched listings"
        );
        Ok(envelope.data)
    }

    async fn search(&self, params: &SearchParams) -> Result<Vec<Listing>> {
        let builder = self
            .request(Method::GET, "/listings/search")
            .query(&params.to_query());
        let envelope: ApiEnvelope<Vec<Listing>> = self.send_json(builder).await?;

        info!(count = envelope.data.len(), "Search returned listings");
        Ok(envelope.data)
    }

    async fn listing(&self, id: ListingId) -> Result<Listing> {
        let path = format!("/listings/{}", id);
        let envelope: ApiEnvelope<Listing> =
            self.send_json(self.request(Method::GET, &path)).await?;
        Ok(envelope.data)
    }

    async fn submit_review(&self, id: ListingId, review: &NewReview) -> Result<Review> {
        let path = format!("/listings/{}/reviews", id);
        let builder = self.request(Method::POST, &path).json(review);
        let envelope: ApiEnvelope<Review> = self.send_json(builder).await?;
        info!(listing = %id, rating = review.rating, "Review submitted");
        Ok(envelope.data)
    }
}

#[async_trait]
impl FavoritesApi for HttpApiClient {
    async fn favorites(&self) -> Result<Vec<FavoriteSummary>> {
        let envelope: ApiEnvelope<Vec<FavoriteSummary>> =
            self.send_json(self.request(Method::GET, "/favorites")).await?;
        Ok(envelope.data)
    }

    async fn add_favorite(&self, id: ListingId) -> Result<()> {
        let path = format!("/favorites/{}", id);
        match self.send_empty(self.request(Method::POST, &path)).await {
            // Already favorited on the server, which is the state we wanted
            Err(ApiError::Api { status: 409, .. }) => Ok(()),
            other => other,
        }
    }

    async fn remove_favorite(&self, id: ListingId) -> Result<()> {
        let path = format!("/favorites/{}", id);
        match self.send_empty(self.request(Method::DELETE, &path)).await {
            // Not in the server's set either, so the removal holds
            Err(ApiError::NotFound(message)) => {
                debug!(%id, "Favorite already gone: {}", message);
                Ok(())
            }
            other => other,
        }
    }
}

#[async_trait]
impl AuthApi for HttpApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        let builder = self.anonymous(Method::POST, "/login").json(credentials);
        let response: LoginResponse = self.send_json(builder).await?;
        info!(username = %response.user.username, role = %response.user.role, "Logged in");
        Ok(response)
    }

    async fn register(&self, registration: &Registration) -> Result<String> {
        let builder = self.anonymous(Method::POST, "/register").json(registration);
        let body: MessageBody = self.send_json(builder).await?;
        info!(username = %registration.username, role = %registration.role, "Registered");
        Ok(body
            .message
            .unwrap_or_else(|| "Check email for verification link".to_string()))
    }

    async fn forgot_password(&self, request: &ForgotPassword) -> Result<String> {
        let builder = self.anonymous(Method::POST, "/forgot-password").json(request);
        let body: MessageBody = self.send_json(builder).await?;
        Ok(body.message.unwrap_or_else(|| {
            "If an account with that email exists, a reset link has been sent.".to_string()
        }))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<String> {
        // The refresh endpoint wants the refresh token, not the access token
        let builder = self
            .client
            .post(self.url("/refresh"))
            .bearer_auth(refresh_token);
        let response: RefreshResponse = self.send_json(builder).await?;
        Ok(response.access_token)
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<String> {
        let path = format!("/reset-password/{}", token);
        let builder = self.anonymous(Method::POST, &path).json(&PasswordReset {
            new_password: new_password.to_string(),
        });
        let body: MessageBody = self.send_json(builder).await?;
        Ok(body
            .message
            .unwrap_or_else(|| "Password updated successfully".to_string()))
    }
}

#[async_trait]
impl BookingsApi for HttpApiClient {
    async fn create_booking(&self, booking: &NewBooking) -> Result<Booking> {
        let builder = self.request(Method::POST, "/bookings/create").json(booking);
        let envelope: ApiEnvelope<Booking> = self.send_json(builder).await?;
        Ok(envelope.data)
    }

    async fn my_bookings(&self) -> Result<Vec<Booking>> {
        let envelope: ApiEnvelope<Vec<Booking>> =
            self.send_json(self.request(Method::GET, "/bookings/my")).await?;
        Ok(envelope.data)
    }

    async fn owner_bookings(&self) -> Result<Vec<Booking>> {
        let envelope: ApiEnvelope<Vec<Booking>> =
            self.send_json(self.request(Method::GET, "/bookings/owner")).await?;
        Ok(envelope.data)
    }

    async fn owner_dashboard(&self) -> Result<OwnerDashboard> {
        let envelope: ApiEnvelope<OwnerDashboard> =
            self.send_json(self.request(Method::GET, "/owner/dashboard")).await?;
        info!(
            listings = envelope.data.summary.total_listings,
            bookings = envelope.data.summary.total_bookings,
            "Fetched owner dashboard"
        );
        Ok(envelope.data)
    }

    async fn update_booking_status(&self, id: u64, update: StatusUpdate) -> Result<Booking> {
        let path = format!("/bookings/{}", id);
        let builder = self.request(Method::PATCH, &path).json(&StatusBody {
            status: update.wire_value(),
        });
        let envelope: ApiEnvelope<Booking> = self.send_json(builder).await?;
        Ok(envelope.data)
    }

    async fn cancel_booking(&self, id: u64) -> Result<()> {
        let path = format!("/bookings/{}/cancel", id);
        self.send_empty(self.request(Method::DELETE, &path)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    fn config(base: &str) -> Config {
        Config {
            api_base_url: base.to_string(),
            state_file: PathBuf::from("unused.json"),
            http_timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_bearer_token_slot_is_shared() {
        let token = BearerToken::default();
        let copy = token.clone();

        token.set("abc");
        assert_eq!(copy.get().as_deref(), Some("abc"));

        copy.clear();
        assert!(!token.is_present());
    }

    #[test]
    fn test_urls_join_without_double_slash() {
        let client = HttpApiClient::new(&config("http://localhost:5000/"), BearerToken::default())
            .unwrap();
        assert_eq!(client.url("/listings/4"), "http://localhost:5000/listings/4");
        assert_eq!(client.url("favorites"), "http://localhost:5000/favorites");
    }

    #[test]
    fn test_bearer_header_attached_when_logged_in() {
        let token = BearerToken::default();
        let client = HttpApiClient::new(&config("http://localhost:5000"), token.clone()).unwrap();

        let anonymous = client.request(Method::GET, "/favorites").build().unwrap();
        assert!(anonymous.headers().get("authorization").is_none());

        token.set("t0k3n");
        let signed = client.request(Method::GET, "/favorites").build().unwrap();
        assert_eq!(
            signed.headers().get("authorization").unwrap(),
            "Bearer t0k3n"
        );
    }

    /// Answers a single request with `status` and `body`; the task yields the
    /// raw request it received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            request
        });

        (base, handle)
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&buf);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    fn client_for(base: &str, token: &BearerToken) -> HttpApiClient {
        HttpApiClient::new(&config(base), token.clone()).unwrap()
    }

    fn credentials() -> Credentials {
        Credentials {
            username: "riya".to_string(),
            password: "wrong".to_string(),
        }
    }

    #[tokio::test]
    async fn test_rejected_login_keeps_server_message() {
        let (base, server) =
            serve_once("401 Unauthorized", r#"{"success":false,"message":"Invalid credentials"}"#)
                .await;
        let token = BearerToken::default();
        token.set("stale-token");

        let err = client_for(&base, &token)
            .login(&credentials())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Api { status: 401, .. }));
        assert_eq!(err.user_message(), "Invalid credentials");
        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("post /login "));
        assert!(!request.contains("authorization:"));
    }

    #[tokio::test]
    async fn test_expired_session_requires_login() {
        for status in ["401 Unauthorized", "422 Unprocessable Entity"] {
            let (base, server) = serve_once(status, r#"{"msg":"Token has expired"}"#).await;
            let token = BearerToken::default();
            token.set("old");

            let err = client_for(&base, &token).favorites().await.unwrap_err();

            assert!(matches!(err, ApiError::AuthenticationRequired), "{}", status);
            let request = server.await.unwrap().to_lowercase();
            assert!(request.contains("authorization: bearer old"));
        }
    }

    #[tokio::test]
    async fn test_unsigned_401_is_an_api_rejection() {
        let (base, _server) =
            serve_once("401 Unauthorized", r#"{"message":"Missing token"}"#).await;

        let err = client_for(&base, &BearerToken::default())
            .favorites()
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ApiError::Api { status: 401, ref message } if message == "Missing token"
        ));
    }

    #[tokio::test]
    async fn test_duplicate_favorite_counts_as_added() {
        let (base, server) = serve_once(
            "409 Conflict",
            r#"{"success":false,"message":"Listing already in favorites"}"#,
        )
        .await;
        let token = BearerToken::default();
        token.set("t");

        client_for(&base, &token)
            .add_favorite(ListingId(5))
            .await
            .unwrap();

        assert!(server.await.unwrap().starts_with("POST /favorites/5 "));
    }

    #[tokio::test]
    async fn test_missing_favorite_counts_as_removed() {
        let (base, server) = serve_once(
            "404 Not Found",
            r#"{"success":false,"message":"Listing not in favorites"}"#,
        )
        .await;
        let token = BearerToken::default();
        token.set("t");

        client_for(&base, &token)
            .remove_favorite(ListingId(5))
            .await
            .unwrap();

        assert!(server.await.unwrap().starts_with("DELETE /favorites/5 "));
    }

    #[tokio::test]
    async fn test_missing_listing_is_not_found() {
        let (base, _server) =
            serve_once("404 Not Found", r#"{"success":false,"message":"Listing not found"}"#).await;

        let err = client_for(&base, &BearerToken::default())
            .listing(ListingId(99))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ApiError::NotFound(ref message) if message == "Listing not found"
        ));
    }

    #[tokio::test]
    async fn test_error_without_json_message_falls_back() {
        let (base, _server) = serve_once("500 Internal Server Error", "upstream exploded").await;
        let err = client_for(&base, &BearerToken::default())
            .overview()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Api { status: 500, ref message } if message == "upstream exploded"
        ));

        let (base, _server) = serve_once("503 Service Unavailable", "").await;
        let err = client_for(&base, &BearerToken::default())
            .overview()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApiError::Api { status: 503, ref message } if message == "503 Service Unavailable"
        ));
    }

    #[tokio::test]
    async fn test_no_content_is_accepted() {
        let (base, server) = serve_once("204 No Content", "").await;
        let token = BearerToken::default();
        token.set("t");

        client_for(&base, &token).cancel_booking(12).await.unwrap();

        assert!(server.await.unwrap().starts_with("DELETE /bookings/12/cancel "));
    }

    #[tokio::test]
    async fn test_search_sends_location_query() {
        let (base, server) =
            serve_once("200 OK", r#"{"success":true,"count":0,"data":[]}"#).await;

        let found = client_for(&base, &BearerToken::default())
            .search(&SearchParams::location("Pune"))
            .await
            .unwrap();

        assert!(found.is_empty());
        assert!(server
            .await
            .unwrap()
            .starts_with("GET /listings/search?location=Pune "));
    }
}
