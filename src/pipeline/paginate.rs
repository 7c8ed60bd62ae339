/// Listings shown per page
pub const PAGE_SIZE: usize = 12;

/// Number of pages needed for `count` items; never less than one so an
/// empty result still has a page to show "no results" on.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// Pull a requested 1-indexed page into `[1, total]`
pub fn clamp_page(requested: usize, total: usize) -> usize {
    requested.clamp(1, total.max(1))
}

/// One page of an ordered collection
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-indexed, always within `1..=total_pages`
    pub number: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_previous(&self) -> bool {
        self.number > 1
    }

    pub fn has_next(&self) -> bool {
        self.number < self.total_pages
    }

    /// 1-based position of the first item, for "Showing 13-24 of 25"
    pub fn first_position(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.number - 1) * self.page_size + 1
        }
    }

    pub fn last_position(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            self.first_position() + self.items.len() - 1
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            total_pages: self.total_pages,
            total_items: self.total_items,
            page_size: self.page_size,
        }
    }
}

/// Page buttons shown before the navigation collapses into gaps
const MAX_VISIBLE_PAGES: usize = 5;

/// One entry in the page navigation bar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageControl {
    Page(usize),
    Gap,
}

/// Page numbers to offer around `current`, e.g. `1 … 4 5 6 … 10`
pub fn page_controls(current: usize, total: usize) -> Vec<PageControl> {
    let total = total.max(1);
    let current = clamp_page(current, total);

    if total <= MAX_VISIBLE_PAGES {
        return (1..=total).map(PageControl::Page).collect();
    }

    let mut controls = Vec::with_capacity(MAX_VISIBLE_PAGES + 2);
    if current <= 3 {
        controls.extend((1..=4).map(PageControl::Page));
        controls.push(PageControl::Gap);
        controls.push(PageControl::Page(total));
    } else if current >= total - 2 {
        controls.push(PageControl::Page(1));
        controls.push(PageControl::Gap);
        controls.extend((total - 3..=total).map(PageControl::Page));
    } else {
        controls.push(PageControl::Page(1));
        controls.push(PageControl::Gap);
        controls.extend((current - 1..=current + 1).map(PageControl::Page));
        controls.push(PageControl::Gap);
        controls.push(PageControl::Page(total));
    }
    controls
}

/// Slice `items` into the requested page, clamping out-of-range requests
pub fn paginate<T: Clone>(items: &[T], requested: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total = total_pages(items.len(), page_size);
    let number = clamp_page(requested, total);

    let start = (number - 1) * page_size;
    let end = (start + page_size).min(items.len());
    let items_on_page = items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();

    Page {
        items: items_on_page,
        number,
        total_pages: total,
        total_items: items.len(),
        page_size,
    }
}
