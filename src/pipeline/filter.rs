use crate::error::{ApiError, Result};
use crate::models::Listing;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Upper rent bound offered by the listings view before the viewer narrows it
pub const DEFAULT_MAX_RENT: f64 = 50_000.0;

/// Highest average rating a listing can have
pub const MAX_RATING: f64 = 5.0;

/// Inclusive monthly rent bounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawPriceRange")]
pub struct PriceRange {
    min: f64,
    max: f64,
}

#[derive(Deserialize)]
struct RawPriceRange {
    min: f64,
    max: f64,
}

impl TryFrom<RawPriceRange> for PriceRange {
    type Error = ApiError;

    fn try_from(raw: RawPriceRange) -> Result<Self> {
        PriceRange::new(raw.min, raw.max)
    }
}

impl PriceRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() || min < 0.0 {
            return Err(ApiError::Validation(format!(
                "price range {}..={} is not valid",
                min, max
            )));
        }
        if min > max {
            return Err(ApiError::Validation(format!(
                "minimum rent {} is above maximum rent {}",
                min, max
            )));
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn contains(&self, rent: f64) -> bool {
        self.min <= rent && rent <= self.max
    }
}

impl Default for PriceRange {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: DEFAULT_MAX_RENT,
        }
    }
}

/// Ordering applied after filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Keep fetch order
    #[default]
    Default,
    PriceAsc,
    PriceDesc,
    RatingAsc,
    RatingDesc,
}

impl SortMode {
    fn compare(self, a: &Listing, b: &Listing) -> Ordering {
        match self {
            SortMode::Default => Ordering::Equal,
            SortMode::PriceAsc => a.monthly_rent.total_cmp(&b.monthly_rent),
            SortMode::PriceDesc => b.monthly_rent.total_cmp(&a.monthly_rent),
            SortMode::RatingAsc => a.rating().total_cmp(&b.rating()),
            SortMode::RatingDesc => b.rating().total_cmp(&a.rating()),
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortMode::Default => "default",
            SortMode::PriceAsc => "price_asc",
            SortMode::PriceDesc => "price_desc",
            SortMode::RatingAsc => "rating_asc",
            SortMode::RatingDesc => "rating_desc",
        };
        f.write_str(name)
    }
}

impl FromStr for SortMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "" | "default" => Ok(SortMode::Default),
            "price_asc" => Ok(SortMode::PriceAsc),
            "price_desc" => Ok(SortMode::PriceDesc),
            "rating_asc" => Ok(SortMode::RatingAsc),
            "rating_desc" => Ok(SortMode::RatingDesc),
            other => Err(format!(
                "unknown sort '{}', expected one of default, price_asc, price_desc, rating_asc, rating_desc",
                other
            )),
        }
    }
}

/// Criteria held by the listings view
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub price_range: PriceRange,
    pub min_rating: f64,
    pub sort: SortMode,
    /// Free-text match on title or address
    pub keyword: Option<String>,
}

impl FilterCriteria {
    pub fn matches(&self, listing: &Listing) -> bool {
        self.price_range.contains(listing.monthly_rent)
            && listing.rating() >= self.min_rating
            && self
                .keyword
                .as_deref()
                .map_or(true, |keyword| listing.matches_keyword(keyword))
    }

    /// True when anything differs from the defaults
    pub fn is_active(&self) -> bool {
        *self != FilterCriteria::default()
    }
}

/// Minimum-rating threshold, which must lie within `0..=5`
pub fn validate_min_rating(rating: f64) -> Result<f64> {
    if rating.is_finite() && (0.0..=MAX_RATING).contains(&rating) {
        Ok(rating)
    } else {
        Err(ApiError::Validation(format!(
            "minimum rating must be between 0 and {}, got {}",
            MAX_RATING, rating
        )))
    }
}

/// Positions (into `listings`) of the listings that pass `criteria`, in
/// display order.
pub fn select(listings: &[Listing], criteria: &FilterCriteria) -> Vec<usize> {
    let mut selected: Vec<usize> = listings
        .iter()
        .enumerate()
        .filter(|(_, listing)| criteria.matches(listing))
        .map(|(index, _)| index)
        .collect();

    if criteria.sort != SortMode::Default {
        // sort_by is stable, so equal keys keep fetch order
        selected.sort_by(|&a, &b| criteria.sort.compare(&listings[a], &listings[b]));
    }

    selected
}

/// Filter and sort, borrowing the surviving listings
pub fn apply<'a>(listings: &'a [Listing], criteria: &FilterCriteria) -> Vec<&'a Listing> {
    select(listings, criteria)
        .into_iter()
        .map(|index| &listings[index])
        .collect()
}
