//! Fixed-size pagination over an already filtered result list.

/// Products shown per listing page.
pub const PAGE_SIZE: usize = 12;

/// One page of a result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number after clamping.
    pub number: usize,
    /// `ceil(total_items / page_size)`; 0 for an empty result.
    pub total_pages: usize,
    pub total_items: usize,
    pub page_size: usize,
}

impl<T: Clone> Page<T> {
    /// Slice `items` into page `requested`, clamped to `[1, max(total_pages, 1)]`.
    #[must_use]
    pub fn slice(items: &[T], requested: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        let total_items = items.len();
        let total_pages = total_items.div_ceil(page_size);
        let number = requested.clamp(1, total_pages.max(1));

        let start = (number - 1) * page_size;
        let end = (start + page_size).min(total_items);
        let items = items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();

        Self {
            items,
            number,
            total_pages,
            total_items,
            page_size,
        }
    }
}

impl<T> Page<T> {
    /// 1-based index of the first item on this page ("Showing 13–24 of 40").
    #[must_use]
    pub const fn first_index(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.number - 1) * self.page_size + 1
        }
    }

    /// 1-based index of the last item on this page.
    #[must_use]
    pub const fn last_index(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            (self.number - 1) * self.page_size + self.items.len()
        }
    }

    #[must_use]
    pub const fn has_prev(&self) -> bool {
        self.number > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.number < self.total_pages
    }
}

/// Receives the scroll side effect of changing pages.
pub trait Viewport {
    fn scroll_to_top(&mut self);
}

/// A viewport that ignores scroll requests.
impl Viewport for () {
    fn scroll_to_top(&mut self) {}
}
