use crate::models::Listing;
use crate::pipeline::filter::{self, FilterCriteria};
use crate::pipeline::paginate::{self, Page, PAGE_SIZE};
use tracing::debug;

/// State behind the listings view: the fetched snapshot, the viewer's
/// criteria and the page they are on.
///
/// The filtered order is recomputed whenever listings or criteria change;
/// the current page is kept inside `1..=total_pages` at all times.
#[derive(Debug, Clone)]
pub struct ListingBrowser {
    listings: Vec<Listing>,
    criteria: FilterCriteria,
    visible: Vec<usize>,
    current_page: usize,
    page_size: usize,
}

impl ListingBrowser {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self::with_criteria(listings, FilterCriteria::default())
    }

    pub fn with_criteria(listings: Vec<Listing>, criteria: FilterCriteria) -> Self {
        let visible = filter::select(&listings, &criteria);
        Self {
            listings,
            criteria,
            visible,
            current_page: 1,
            page_size: PAGE_SIZE,
        }
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        paginate::total_pages(self.visible.len(), self.page_size)
    }

    /// Listings left after filtering
    pub fn filtered_count(&self) -> usize {
        self.visible.len()
    }

    /// Listings in the fetched snapshot
    pub fn total_count(&self) -> usize {
        self.listings.len()
    }

    /// Swap in a fresh fetch; the viewer starts over on page 1.
    pub fn replace_listings(&mut self, listings: Vec<Listing>) {
        self.listings = listings;
        self.refilter();
    }

    /// Apply new criteria. Any change sends the viewer back to page 1.
    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        if criteria == self.criteria {
            return;
        }
        self.criteria = criteria;
        self.refilter();
    }

    /// Edit criteria in place, e.g. `browser.update_criteria(|c| c.min_rating = 4.0)`
    pub fn update_criteria(&mut self, edit: impl FnOnce(&mut FilterCriteria)) {
        let mut criteria = self.criteria.clone();
        edit(&mut criteria);
        self.set_criteria(criteria);
    }

    pub fn clear_criteria(&mut self) {
        self.set_criteria(FilterCriteria::default());
    }

    /// Jump to a page; out-of-range requests land on the nearest valid page.
    pub fn go_to(&mut self, page: usize) -> usize {
        self.current_page = paginate::clamp_page(page, self.total_pages());
        self.current_page
    }

    pub fn next_page(&mut self) -> usize {
        self.go_to(self.current_page + 1)
    }

    pub fn previous_page(&mut self) -> usize {
        self.go_to(self.current_page.saturating_sub(1))
    }

    pub fn first_page(&mut self) -> usize {
        self.go_to(1)
    }

    pub fn last_page(&mut self) -> usize {
        self.go_to(self.total_pages())
    }

    /// The page currently in view
    pub fn page(&self) -> Page<&Listing> {
        paginate::paginate(&self.visible, self.current_page, self.page_size)
            .map(|index| &self.listings[index])
    }

    fn refilter(&mut self) {
        self.visible = filter::select(&self.listings, &self.criteria);
        self.current_page = 1;
        debug!(
            matched = self.visible.len(),
            total = self.listings.len(),
            sort = %self.criteria.sort,
            "Recomputed listing view"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::listing;
    use crate::pipeline::filter::{PriceRange, SortMode};

    fn twenty_five() -> Vec<Listing> {
        (1..=25)
            .map(|id| listing(id, 1000.0 * id as f64, Some(3.0 + (id % 3) as f64 * 0.5)))
            .collect()
    }

    fn page_ids(browser: &ListingBrowser) -> Vec<u64> {
        browser.page().items.iter().map(|l| l.id.0).collect()
    }

    fn wide_open() -> FilterCriteria {
        FilterCriteria {
            price_range: PriceRange::new(0.0, 100_000.0).unwrap(),
            min_rating: 0.0,
            sort: SortMode::Default,
            keyword: None,
        }
    }

    #[test]
    fn test_twenty_five_listings_paginate_in_fetch_order() {
        let mut browser = ListingBrowser::with_criteria(twenty_five(), wide_open());

        assert_eq!(browser.total_pages(), 3);
        assert_eq!(page_ids(&browser), (1..=12).collect::<Vec<_>>());

        browser.go_to(3);
        assert_eq!(page_ids(&browser), vec![25]);
        assert_eq!(browser.page().items.len(), 1);
    }

    #[test]
    fn test_narrowing_filter_resets_page() {
        let mut browser = ListingBrowser::with_criteria(twenty_five(), wide_open());
        browser.go_to(3);
        assert_eq!(browser.current_page(), 3);

        browser.update_criteria(|c| c.price_range = PriceRange::new(0.0, 5000.0).unwrap());

        assert_eq!(browser.filtered_count(), 5);
        assert_eq!(browser.total_pages(), 1);
        assert_eq!(browser.current_page(), 1);
        assert_eq!(page_ids(&browser), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_unchanged_criteria_keep_page() {
        let mut browser = ListingBrowser::with_criteria(twenty_five(), wide_open());
        browser.go_to(2);

        browser.set_criteria(wide_open());

        assert_eq!(browser.current_page(), 2);
    }

    #[test]
    fn test_clearing_filters_restores_default_view() {
        let mut browser = ListingBrowser::new(twenty_five());
        browser.update_criteria(|c| {
            c.min_rating = 4.0;
            c.sort = SortMode::RatingDesc;
        });
        assert!(browser.criteria().is_active());
        assert!(browser.filtered_count() < 25);

        browser.clear_criteria();

        assert!(!browser.criteria().is_active());
        assert_eq!(browser.filtered_count(), 25);
        assert_eq!(page_ids(&browser)[0], 1);
    }

    #[test]
    fn test_navigation_clamps_at_both_ends() {
        let mut browser = ListingBrowser::with_criteria(twenty_five(), wide_open());

        assert_eq!(browser.previous_page(), 1);
        assert_eq!(browser.last_page(), 3);
        assert_eq!(browser.next_page(), 3);
        assert_eq!(browser.go_to(40), 3);
        assert_eq!(browser.first_page(), 1);
    }

    #[test]
    fn test_empty_result_is_a_single_empty_page() {
        let mut browser = ListingBrowser::with_criteria(twenty_five(), wide_open());
        browser.update_criteria(|c| c.min_rating = 4.8);

        let page = browser.page();
        assert!(page.is_empty());
        assert_eq!(page.number, 1);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_sorted_pages_follow_sort_order() {
        let mut browser = ListingBrowser::with_criteria(twenty_five(), wide_open());
        browser.update_criteria(|c| c.sort = SortMode::PriceDesc);

        assert_eq!(page_ids(&browser)[..3], [25, 24, 23]);
        browser.last_page();
        assert_eq!(page_ids(&browser), vec![1]);
    }

    #[test]
    fn test_refetch_resets_page() {
        let mut browser = ListingBrowser::with_criteria(twenty_five(), wide_open());
        browser.go_to(2);

        browser.replace_listings(twenty_five().into_iter().take(4).collect());

        assert_eq!(browser.current_page(), 1);
        assert_eq!(browser.total_count(), 4);
    }
}
