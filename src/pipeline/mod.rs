//! Client-side listing pipeline: filter → sort → paginate.
//!
//! Everything here is pure and synchronous; fetching lives in
//! [`crate::feed`].

pub mod browser;
pub mod filter;
pub mod paginate;

pub use browser::ListingBrowser;
pub use filter::{validate_min_rating, FilterCriteria, PriceRange, SortMode};
pub use paginate::{page_controls, Page, PageControl, PAGE_SIZE};
