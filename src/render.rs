//! Plain-text rendering for the terminal.

use crate::models::{Availability, Booking, FavoriteSummary, Listing, OwnerDashboard};
use crate::pipeline::filter::DEFAULT_MAX_RENT;
use crate::pipeline::{page_controls, FilterCriteria, Page, PageControl, SortMode};
use std::fmt::Write;

/// `₹15,000` style rent with thousands separators
pub fn rupees(amount: f64) -> String {
    let rounded = amount.round() as i64;
    let digits = rounded.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if rounded < 0 {
        format!("-₹{}", grouped)
    } else {
        format!("₹{}", grouped)
    }
}

fn rating_label(listing: &Listing) -> String {
    match listing.average_rating {
        Some(rating) => format!("{:.1} ({} reviews)", rating, listing.review_count),
        None => "New".to_string(),
    }
}

/// Numbered card for list views
pub fn listing_card(position: usize, listing: &Listing, favorite: bool) -> String {
    let mut out = String::new();
    let heart = if favorite { " ♥" } else { "" };

    let _ = writeln!(
        out,
        "{}. {} ({}/month){}",
        position,
        listing.title,
        rupees(listing.monthly_rent),
        heart
    );
    let _ = writeln!(
        out,
        "   {} bed, {} bath, seats {}",
        listing.bedrooms, listing.bathrooms, listing.seating
    );
    let _ = writeln!(out, "   Location: {}", listing.address.locality());
    let availability = match listing.availability {
        Availability::Available => "Available",
        Availability::Booked => "Booked today",
    };
    let _ = writeln!(out, "   Rating: {} | {}", rating_label(listing), availability);
    if !listing.amenities.is_empty() {
        let amenities: Vec<&str> = listing.amenities.iter().map(String::as_str).collect();
        let _ = writeln!(out, "   Amenities: {}", amenities.join(", "));
    }
    let _ = writeln!(out, "   ID: {}", listing.id);
    out
}

/// Full detail view for `GET /listings/{id}`
pub fn listing_detail(listing: &Listing, favorite: bool) -> String {
    let mut out = listing_card(1, listing, favorite)
        .trim_start_matches("1. ")
        .to_string();

    let address = &listing.address;
    let _ = writeln!(
        out,
        "   Address: {}, {}, {} {}",
        address.street, address.city, address.state, address.pincode
    );
    let _ = writeln!(out, "   Deposit: {}", rupees(listing.security_deposit));
    if let Some(kind) = &listing.property_type {
        let _ = writeln!(out, "   Type: {}", kind);
    }
    if let Some(furnishing) = &listing.furnishing {
        let _ = writeln!(out, "   Furnishing: {}", furnishing);
    }
    if let Some(area) = &listing.area {
        let _ = writeln!(out, "   Area: {}", area);
    }
    if let Some(owner) = &listing.owner {
        let verified = if listing.is_verified { " (verified)" } else { "" };
        let _ = writeln!(out, "   Owner: {}{}", owner.username, verified);
    }
    if let Some(description) = &listing.description {
        let _ = writeln!(out, "\n{}", description);
    }
    if let Some(cover) = listing.cover_image() {
        let _ = writeln!(out, "\nCover: {}", cover);
    }
    if !listing.reviews.is_empty() {
        let _ = writeln!(out, "\nReviews:");
        for review in &listing.reviews {
            let _ = writeln!(
                out,
                "  {}★ {}: {}",
                review.rating,
                review.author_username,
                review.comment.as_deref().unwrap_or("")
            );
        }
    }
    out
}

/// "Showing 13-24 of 25 • Page 2 of 3" plus the navigation bar
pub fn page_footer<T>(page: &Page<T>) -> String {
    if page.is_empty() {
        return "No properties found. Try adjusting your search or filters.".to_string();
    }

    let mut out = format!(
        "Showing {}-{} of {} • Page {} of {}",
        page.first_position(),
        page.last_position(),
        page.total_items,
        page.number,
        page.total_pages
    );

    if page.total_pages > 1 {
        let controls: Vec<String> = page_controls(page.number, page.total_pages)
            .into_iter()
            .map(|control| match control {
                PageControl::Page(n) if n == page.number => format!("[{}]", n),
                PageControl::Page(n) => n.to_string(),
                PageControl::Gap => "…".to_string(),
            })
            .collect();
        let prev = if page.has_previous() { "‹" } else { " " };
        let next = if page.has_next() { "›" } else { " " };
        let _ = write!(out, "\n{} {} {}", prev, controls.join(" "), next);
    }
    out
}

/// Badges for every criterion that differs from the defaults
pub fn active_filters(criteria: &FilterCriteria) -> Vec<String> {
    let mut badges = Vec::new();

    let range = criteria.price_range;
    if range.min() > 0.0 || range.max() < DEFAULT_MAX_RENT {
        badges.push(format!("{} - {}", rupees(range.min()), rupees(range.max())));
    }
    if criteria.min_rating > 0.0 {
        badges.push(format!("{}+ Stars", criteria.min_rating));
    }
    if let Some(keyword) = criteria.keyword.as_deref().filter(|k| !k.trim().is_empty()) {
        badges.push(format!("\"{}\"", keyword.trim()));
    }
    if criteria.sort != SortMode::Default {
        badges.push(format!("Sort: {}", criteria.sort.to_string().replace('_', " ")));
    }
    badges
}

pub fn favorite_line(position: usize, favorite: &FavoriteSummary) -> String {
    format!(
        "{}. {} ({}/month) - {}, {} [ID {}]",
        position,
        favorite.title,
        rupees(favorite.monthly_rent),
        favorite.city,
        favorite.state,
        favorite.id
    )
}

pub fn booking_line(booking: &Booking) -> String {
    let listing = booking
        .listing
        .as_ref()
        .map(|l| format!("{} ({})", l.title, l.city))
        .unwrap_or_else(|| "unknown listing".to_string());
    let tenant = booking
        .tenant
        .as_ref()
        .map(|t| format!(" by {}", t.username))
        .unwrap_or_default();

    format!(
        "#{} {} - {}{}, {} attendee(s), {}",
        booking.id, booking.booking_date, listing, tenant, booking.attendees, booking.status
    )
}

/// Totals, then the owner's listings, then incoming bookings
pub fn owner_dashboard(dashboard: &OwnerDashboard) -> String {
    let summary = &dashboard.summary;
    let mut out = format!(
        "📊 {} listings | {} confirmed bookings | {} earned\n",
        summary.total_listings,
        summary.total_bookings,
        rupees(summary.total_revenue)
    );

    let _ = writeln!(out, "\nMy listings:");
    if dashboard.listings.is_empty() {
        let _ = writeln!(out, "  none yet");
    }
    for listing in &dashboard.listings {
        let availability = match listing.availability {
            Availability::Available => "Available",
            Availability::Booked => "Booked today",
        };
        let _ = writeln!(
            out,
            "  [{}] {} - {}/month, {}",
            listing.id,
            listing.title,
            rupees(listing.monthly_rent),
            availability
        );
    }

    let _ = writeln!(
        out,
        "\nBookings ({} pending):",
        dashboard.pending_bookings()
    );
    if dashboard.bookings.is_empty() {
        let _ = writeln!(out, "  none yet");
    }
    for booking in &dashboard.bookings {
        let _ = writeln!(out, "  {}", booking_line(booking));
    }
    out
}
