use crate::models::{Booking, BookingStatus, Listing};
use serde::{Deserialize, Serialize};

/// Headline numbers on the owner dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_listings: u64,
    /// Confirmed bookings only
    pub total_bookings: u64,
    /// Monthly rent summed over confirmed, past visits
    pub total_revenue: f64,
}

/// Response of `GET /owner/dashboard`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwnerDashboard {
    #[serde(rename = "summary_stats")]
    pub summary: DashboardSummary,
    /// Newest first
    #[serde(rename = "all_bookings", default)]
    pub bookings: Vec<Booking>,
    /// Ordered by title
    #[serde(rename = "my_listings", default)]
    pub listings: Vec<Listing>,
}

impl OwnerDashboard {
    pub fn pending_bookings(&self) -> usize {
        self.bookings
            .iter()
            .filter(|b| b.status == BookingStatus::Pending)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Availability;
    use serde_json::json;

    #[test]
    fn test_dashboard_from_wire_format() {
        let raw = json!({
            "summary_stats": {"total_listings": 2, "total_bookings": 3, "total_revenue": 27000.0},
            "all_bookings": [
                {
                    "booking_id": 11,
                    "booking_date": "2025-04-01",
                    "status": "Pending",
                    "attendees": 2,
                    "listing": {"id": 4, "title": "Sea View PG", "city": "Goa", "state": "Goa"},
                    "tenant": {"id": 9, "username": "kabir", "email": "kabir@example.com"}
                },
                {
                    "booking_id": 10,
                    "booking_date": "2025-03-28",
                    "status": "Left",
                    "attendees": 1,
                    "listing": null,
                    "tenant": null
                }
            ],
            "my_listings": [{
                "id": 4,
                "title": "Sea View PG",
                "street_address": "2 Beach Road",
                "city": "Goa",
                "state": "Goa",
                "pincode": "403001",
                "monthlyRent": 12000.0,
                "availability_status": "Booked"
            }]
        });

        let dashboard: OwnerDashboard = serde_json::from_value(raw).unwrap();

        assert_eq!(dashboard.summary.total_bookings, 3);
        assert_eq!(dashboard.summary.total_revenue, 27000.0);
        assert_eq!(dashboard.bookings[0].id, 11);
        assert_eq!(dashboard.bookings[1].status, BookingStatus::Left);
        assert_eq!(dashboard.pending_bookings(), 1);
        assert_eq!(dashboard.listings[0].availability, Availability::Booked);
        assert_eq!(dashboard.listings[0].average_rating, None);
    }
}
