pub mod app;
pub mod auth;
pub mod blog_detail;
pub mod blog_editor;
pub mod blog_page;
pub mod categories;
pub mod comments;

use std::time::Duration;

pub use self::app::App;
pub use self::auth::AuthView;
pub use self::blog_detail::BlogDetailView;
pub use self::blog_editor::BlogEditor;
pub use self::blog_page::{BlogPageView, BlogSource};
pub use self::categories::CategoryStore;
pub use self::comments::CommentsView;

use crate::{DEFAULT_PAGE_SIZE, LOADING_DELAY};

/// How an optimistic action ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The server accepted it and its values are now shown.
    Confirmed,
    /// The server refused or was unreachable; the local change was undone.
    RolledBack,
    /// Nothing was sent (not loaded, empty input, already waiting...).
    Skipped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    pub page_size: u32,
    pub loading_delay: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            page_size: DEFAULT_PAGE_SIZE,
            loading_delay: LOADING_DELAY,
        }
    }
}

#[cfg(test)]
pub(crate) mod fake;
