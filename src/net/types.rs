//! Request/response schemas for the back-office API.
//!
//! DESIGN
//! ======
//! Wire names follow the server (Spanish field names on the admin endpoints);
//! Rust names are English and mapped with `#[serde(rename)]`. Optional
//! server fields are `Option`/`#[serde(default)]` so additive server changes
//! do not break decoding, while missing required fields fail fast with a
//! [`crate::error::DecodeError`] at the facade boundary.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

// =============================================================================
// USERS
// =============================================================================

/// Authorization role attached to a back-office account.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Staff,
    /// Any role the server knows about that this client does not.
    Other(String),
}

impl Role {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Admin => "admin",
            Self::Staff => "staff",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "admin" => Self::Admin,
            "staff" => Self::Staff,
            _ => Self::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(name) => name,
            known => known.as_str().to_owned(),
        }
    }
}

impl FromStr for Role {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s.to_owned()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated back-office user as returned by `/auth/me` and `/auth/login`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Server identifier; numeric ids are kept in their decimal string form.
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Authorization role.
    pub role: Role,
    /// Avatar image URL, if available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

// =============================================================================
// AUTH PAYLOADS
// =============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful `/auth/login` body.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct LoginResponse {
    /// Opaque bearer token for subsequent requests.
    pub token: String,
    pub user: User,
}

/// Fields accepted by `/auth/register`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[derive(Debug, Serialize)]
pub(crate) struct PasswordResetRequest<'a> {
    pub email: &'a str,
}

/// Acknowledgement body for endpoints that return no resource.
///
/// Servers answer with anything from an empty body to `{"success": true,
/// "message": "..."}`; only those two fields are picked up.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Ack {
    pub success: Option<bool>,
    pub message: Option<String>,
}

impl Ack {
    #[must_use]
    pub fn from_value(value: &serde_json::Value) -> Self {
        Self {
            success: value.get("success").and_then(serde_json::Value::as_bool),
            message: value
                .get("message")
                .or_else(|| value.get("mensaje"))
                .and_then(serde_json::Value::as_str)
                .map(ToOwned::to_owned),
        }
    }
}

// =============================================================================
// DASHBOARD
// =============================================================================

/// Headline numbers on the dashboard. Missing counters read as zero.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminStats {
    pub bookings_today: i64,
    pub revenue_month: f64,
    pub active_customers: i64,
    pub active_tours: i64,
}

// =============================================================================
// BOOKINGS
// =============================================================================

/// A booking request as listed on `/admin/reservas`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: i64,
    #[serde(default)]
    pub tour_id: Option<i64>,
    #[serde(rename = "nombre", default)]
    pub customer_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(rename = "telefono", default)]
    pub phone: Option<String>,
    #[serde(rename = "num_personas", default)]
    pub travelers: Option<i64>,
    #[serde(rename = "mensaje", default)]
    pub message: Option<String>,
    #[serde(rename = "fecha_solicitud", default)]
    pub requested_at: Option<String>,
    #[serde(rename = "estado", default)]
    pub status: String,
}

/// Query string for the bookings list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct BookingQuery {
    #[serde(rename = "estado", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

/// Partial update for a booking; absent fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingUpdate {
    #[serde(rename = "estado", default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "num_personas", default, skip_serializing_if = "Option::is_none")]
    pub travelers: Option<i64>,
    #[serde(rename = "mensaje", default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "notas", default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// The list endpoint answers with either a bare array or `{"reservas": [...]}`.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum BookingList {
    Bare(Vec<Booking>),
    Wrapped { reservas: Vec<Booking> },
}

impl From<BookingList> for Vec<Booking> {
    fn from(list: BookingList) -> Self {
        match list {
            BookingList::Bare(bookings) | BookingList::Wrapped { reservas: bookings } => bookings,
        }
    }
}

// =============================================================================
// TOURS
// =============================================================================

/// A catalog tour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tour {
    #[serde(deserialize_with = "deserialize_i64_from_number")]
    pub id: i64,
    #[serde(flatten)]
    pub details: TourDetails,
}

/// Editable tour fields, shared by reads, creates and updates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TourDetails {
    #[serde(rename = "titulo", default)]
    pub title: String,
    #[serde(rename = "descripcion", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "destino", default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(rename = "precio_desde", default, skip_serializing_if = "Option::is_none")]
    pub price_from: Option<f64>,
    #[serde(rename = "precio_hasta", default, skip_serializing_if = "Option::is_none")]
    pub price_to: Option<f64>,
    #[serde(rename = "duracion_dias", default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<i64>,
    #[serde(rename = "categoria", default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "continente", default, skip_serializing_if = "Option::is_none")]
    pub continent: Option<String>,
    #[serde(rename = "pais", default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "tipo_viaje", default, skip_serializing_if = "Option::is_none")]
    pub trip_type: Option<String>,
    #[serde(rename = "imagen_url", default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(rename = "destacado", default)]
    pub featured: bool,
}

/// Sort order accepted by `/tours/buscar`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum TourOrder {
    #[serde(rename = "precio_asc")]
    PriceAsc,
    #[serde(rename = "precio_desc")]
    PriceDesc,
    #[serde(rename = "popularidad")]
    Popularity,
    #[serde(rename = "recientes")]
    Newest,
}

impl FromStr for TourOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "precio_asc" | "price_asc" => Ok(Self::PriceAsc),
            "precio_desc" | "price_desc" => Ok(Self::PriceDesc),
            "popularidad" | "popularity" => Ok(Self::Popularity),
            "recientes" | "newest" => Ok(Self::Newest),
            other => Err(format!("unknown tour order '{other}'")),
        }
    }
}

/// Filters and paging for `/tours/buscar`.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TourQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(rename = "continente", skip_serializing_if = "Option::is_none")]
    pub continent: Option<String>,
    #[serde(rename = "pais", skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(rename = "categoria", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "tipo_viaje", skip_serializing_if = "Option::is_none")]
    pub trip_type: Option<String>,
    #[serde(rename = "precio_min", skip_serializing_if = "Option::is_none")]
    pub price_min: Option<f64>,
    #[serde(rename = "precio_max", skip_serializing_if = "Option::is_none")]
    pub price_max: Option<f64>,
    #[serde(rename = "destacados", skip_serializing_if = "Option::is_none")]
    pub featured_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_by: Option<TourOrder>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

/// One page of tour search results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TourPage {
    pub tours: Vec<Tour>,
    #[serde(default)]
    pub total: i64,
    #[serde(default = "first_page")]
    pub page: i64,
    #[serde(default)]
    pub per_page: i64,
    #[serde(default)]
    pub total_pages: i64,
}

fn first_page() -> i64 {
    1
}

// =============================================================================
// ANALYTICS
// =============================================================================

/// Reporting window for `/admin/analytics`; dates are passed through verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AnalyticsQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

// =============================================================================
// NUMBER COERCION
// =============================================================================

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) if !s.is_empty() => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(D::Error::custom(format!("expected string or number id, got {other}"))),
    }
}

fn deserialize_i64_from_number<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(number) => number
            .as_i64()
            .ok_or_else(|| D::Error::custom(format!("expected integer, got {number}"))),
        serde_json::Value::String(s) => {
            s.parse::<i64>()
                .map_err(|_| D::Error::custom(format!("expected integer, got string {s:?}")))
        }
        other => Err(D::Error::custom(format!("expected integer, got {other}"))),
    }
}
