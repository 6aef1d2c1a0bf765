//! Back-office endpoints behind the dashboard, bookings, tours and analytics pages.

#[cfg(test)]
#[path = "admin_api_test.rs"]
mod admin_api_test;

use super::http::HttpClient;
use super::types::{
    Ack, AdminStats, AnalyticsQuery, Booking, BookingList, BookingQuery, BookingUpdate, Tour,
    TourDetails, TourPage, TourQuery,
};
use crate::error::ApiError;

pub const STATS_PATH: &str = "/admin/stats";
pub const BOOKINGS_PATH: &str = "/admin/reservas";
pub const TOUR_SEARCH_PATH: &str = "/tours/buscar";
pub const ADMIN_TOURS_PATH: &str = "/admin/tours";
pub const ANALYTICS_PATH: &str = "/admin/analytics";

fn booking_path(id: i64) -> String {
    format!("{BOOKINGS_PATH}/{id}")
}

fn booking_cancel_path(id: i64) -> String {
    format!("{BOOKINGS_PATH}/{id}/cancel")
}

fn tour_detail_path(id: i64) -> String {
    format!("/tours/{id}/completo")
}

fn admin_tour_path(id: i64) -> String {
    format!("{ADMIN_TOURS_PATH}/{id}")
}

/// Typed admin calls. All share the HTTP client, so a 401 anywhere ends the session.
#[derive(Clone)]
pub struct AdminApi {
    http: HttpClient,
}

impl AdminApi {
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// `GET /admin/stats`.
    ///
    /// # Errors
    ///
    /// Returns the HTTP client's error or a decode error.
    pub async fn stats(&self) -> Result<AdminStats, ApiError> {
        Ok(self.http.get(STATS_PATH).send().await?.decode()?)
    }

    /// `GET /admin/reservas`.
    ///
    /// # Errors
    ///
    /// Returns the HTTP client's error or a decode error.
    pub async fn list_bookings(&self, query: &BookingQuery) -> Result<Vec<Booking>, ApiError> {
        let list: BookingList = self.http.get(BOOKINGS_PATH).query(query).send().await?.decode()?;
        Ok(list.into())
    }

    /// `GET /admin/reservas/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the HTTP client's error or a decode error.
    pub async fn booking(&self, id: i64) -> Result<Booking, ApiError> {
        Ok(self.http.get(&booking_path(id)).send().await?.decode()?)
    }

    /// `PUT /admin/reservas/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the HTTP client's error or a decode error.
    pub async fn update_booking(
        &self,
        id: i64,
        update: &BookingUpdate,
    ) -> Result<Booking, ApiError> {
        Ok(self.http.put(&booking_path(id)).json(update).send().await?.decode()?)
    }

    /// `POST /admin/reservas/{id}/cancel`.
    ///
    /// # Errors
    ///
    /// Returns the HTTP client's error or a decode error.
    pub async fn cancel_booking(&self, id: i64) -> Result<Ack, ApiError> {
        Ok(self.http.post(&booking_cancel_path(id)).send().await?.ack()?)
    }

    /// `GET /tours/buscar`.
    ///
    /// # Errors
    ///
    /// Returns the HTTP client's error or a decode error.
    pub async fn search_tours(&self, query: &TourQuery) -> Result<TourPage, ApiError> {
        Ok(self.http.get(TOUR_SEARCH_PATH).query(query).send().await?.decode()?)
    }

    /// `GET /tours/{id}/completo`.
    ///
    /// # Errors
    ///
    /// Returns the HTTP client's error or a decode error.
    pub async fn tour(&self, id: i64) -> Result<Tour, ApiError> {
        Ok(self.http.get(&tour_detail_path(id)).send().await?.decode()?)
    }

    /// `POST /admin/tours`.
    ///
    /// # Errors
    ///
    /// Returns the HTTP client's error or a decode error.
    pub async fn create_tour(&self, details: &TourDetails) -> Result<Tour, ApiError> {
        Ok(self.http.post(ADMIN_TOURS_PATH).json(details).send().await?.decode()?)
    }

    /// `PUT /admin/tours/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the HTTP client's error or a decode error.
    pub async fn update_tour(&self, id: i64, details: &TourDetails) -> Result<Tour, ApiError> {
        Ok(self.http.put(&admin_tour_path(id)).json(details).send().await?.decode()?)
    }

    /// `DELETE /admin/tours/{id}`.
    ///
    /// # Errors
    ///
    /// Returns the HTTP client's error or a decode error.
    pub async fn delete_tour(&self, id: i64) -> Result<Ack, ApiError> {
        Ok(self.http.delete(&admin_tour_path(id)).send().await?.ack()?)
    }

    /// `GET /admin/analytics`. The report is passed through as raw JSON.
    ///
    /// # Errors
    ///
    /// Returns the HTTP client's error or a decode error.
    pub async fn analytics(&self, query: &AnalyticsQuery) -> Result<serde_json::Value, ApiError> {
        Ok(self.http.get(ANALYTICS_PATH).query(query).send().await?.decode()?)
    }
}
