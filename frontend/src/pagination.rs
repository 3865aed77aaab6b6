const SHOW_ALL_UP_TO: u32 = 7;
const WINDOW_SIZE: u32 = 5;

/// Page numbers to offer as links. Up to seven pages are all shown; past
/// that, five consecutive pages around `current`, clamped to `1..=total`.
pub fn page_window(current: u32, total: u32) -> Vec<u32> {
    if total <= SHOW_ALL_UP_TO {
        return (1..=total).collect();
    }

    let start = current.saturating_sub(2).max(1);
    let end = total.min(start + WINDOW_SIZE - 1);
    let start = end.saturating_sub(WINDOW_SIZE - 1).max(1);

    (start..=end).collect()
}

/// Where the pager sits. Moves return the page to load, or `None` when the
/// move would go nowhere.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub total_pages: u32,
}

impl Pagination {
    pub fn new(page: u32, total_pages: u32) -> Self {
        Pagination { page, total_pages }
    }

    pub fn window(&self) -> Vec<u32> {
        page_window(self.page, self.total_pages)
    }

    pub fn go_to(&self, page: u32) -> Option<u32> {
        if page == self.page || page == 0 {
            None
        } else {
            Some(page)
        }
    }

    pub fn next(&self) -> Option<u32> {
        if self.page < self.total_pages {
            Some(self.page + 1)
        } else {
            None
        }
    }

    pub fn prev(&self) -> Option<u32> {
        if self.page > 1 {
            Some(self.page - 1)
        } else {
            None
        }
    }
}
