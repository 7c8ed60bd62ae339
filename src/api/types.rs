use crate::error::{ApiError, Result};
use crate::models::{Role, UserProfile};
use serde::{Deserialize, Serialize};

const PASSWORD_SYMBOLS: &str = "@$!%*?&";

/// Server-side ordering accepted by `GET /listings/search`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentOrder {
    RentAsc,
    RentDesc,
}

impl RentOrder {
    fn as_str(self) -> &'static str {
        match self {
            RentOrder::RentAsc => "rent_asc",
            RentOrder::RentDesc => "rent_desc",
        }
    }
}

/// Query parameters for `GET /listings/search`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Matched against street, city, state and pincode
    pub location: Option<String>,
    /// Minimum monthly rent
    pub min_rent: Option<f64>,
    /// Maximum monthly rent
    pub max_rent: Option<f64>,
    /// Every amenity listed must be present
    pub amenities: Vec<String>,
    /// Matched against title, description, pid and owner name
    pub keyword: Option<String>,
    pub sort_by: Option<RentOrder>,
}

impl SearchParams {
    pub fn location(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..Default::default()
        }
    }

    /// Pairs for the query string, skipping anything unset or blank
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();

        if let Some(location) = non_blank(&self.location) {
            query.push(("location", location.to_string()));
        }
        if let Some(min) = self.min_rent {
            query.push(("min_rent", min.to_string()));
        }
        if let Some(max) = self.max_rent {
            query.push(("max_rent", max.to_string()));
        }
        let amenities: Vec<&str> = self
            .amenities
            .iter()
            .map(|a| a.trim())
            .filter(|a| !a.is_empty())
            .collect();
        if !amenities.is_empty() {
            query.push(("amenities", amenities.join(",")));
        }
        if let Some(keyword) = non_blank(&self.keyword) {
            query.push(("keyword", keyword.to_string()));
        }
        if let Some(order) = self.sort_by {
            query.push(("sort_by", order.as_str().to_string()));
        }

        query
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// `{ success, data }` wrapper used by most endpoints
#[derive(Debug, Deserialize)]
pub struct ApiEnvelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: T,
}

/// `{ success, message }` body of plain acknowledgements and errors
#[derive(Debug, Default, Deserialize)]
pub struct MessageBody {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `POST /login`
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Body of `POST /register`
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub mobile_no: String,
    pub role: Role,
}

impl Registration {
    /// Applies the server's field rules locally so a bad form never leaves
    /// the client.
    pub fn new(
        username: &str,
        email: &str,
        password: &str,
        mobile_no: &str,
        role: Role,
    ) -> Result<Self> {
        let (username, email, mobile_no) = (username.trim(), email.trim(), mobile_no.trim());
        if username.is_empty() || email.is_empty() || password.is_empty() || mobile_no.is_empty()
        {
            return Err(invalid("Missing fields"));
        }
        if !is_email(email) {
            return Err(invalid("Invalid email format"));
        }
        if !is_strong_password(password) {
            return Err(invalid(
                "Password needs 8+ characters with upper and lower case letters, a digit and one of @$!%*?&",
            ));
        }
        if !is_mobile_number(mobile_no) {
            return Err(invalid("Invalid mobile number format"));
        }

        Ok(Self {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            mobile_no: mobile_no.to_string(),
            role,
        })
    }
}

/// Body of `POST /forgot-password`
#[derive(Debug, Clone, Serialize)]
pub struct ForgotPassword {
    pub email: String,
}

impl ForgotPassword {
    pub fn new(email: &str) -> Result<Self> {
        let email = email.trim();
        if !is_email(email) {
            return Err(invalid("Valid email is required"));
        }
        Ok(Self {
            email: email.to_string(),
        })
    }
}

fn invalid(message: &str) -> ApiError {
    ApiError::Validation(message.to_string())
}

fn is_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    let local_ok = !local.is_empty()
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "._%+-".contains(c));
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    let host_ok = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || ".-".contains(c));
    let tld_ok = tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic());

    local_ok && host_ok && tld_ok
}

fn is_strong_password(password: &str) -> bool {
    password.chars().count() >= 8
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
        && password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || PASSWORD_SYMBOLS.contains(c))
}

/// Ten digits, starting with 6-9
fn is_mobile_number(mobile: &str) -> bool {
    mobile.len() == 10
        && mobile.chars().all(|c| c.is_ascii_digit())
        && mobile.starts_with(['6', '7', '8', '9'])
}

/// Successful `POST /login` response
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: UserProfile,
}

/// Successful `POST /refresh` response
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

/// Body of `POST /reset-password/{token}`
#[derive(Debug, Clone, Serialize)]
pub struct PasswordReset {
    pub new_password: String,
}

/// Body of `PATCH /bookings/{id}`
#[derive(Debug, Clone, Serialize)]
pub struct StatusBody {
    pub status: &'static str,
}
