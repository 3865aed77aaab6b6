use std::cell::Cell;
use std::rc::Rc;

use futures_signals::signal::{Mutable, Signal};
use log::warn;

use crate::connection::BlogApi;
use crate::models::Category;

/// Category choices for the editor, fetched at most once.
pub struct CategoryStore<A: BlogApi> {
    api: Rc<A>,
    loaded: Cell<bool>,
    categories: Mutable<Vec<Category>>,
}

impl<A: BlogApi> CategoryStore<A> {
    pub fn new(api: Rc<A>) -> Self {
        CategoryStore {
            api,
            loaded: Cell::new(false),
            categories: Mutable::new(Vec::new()),
        }
    }

    /// The list as it fills in, for a select box to render from.
    pub fn signal(&self) -> impl Signal<Item = Vec<Category>> {
        self.categories.signal_cloned()
    }

    pub fn categories(&self) -> Vec<Category> {
        self.categories.get_cloned()
    }

    pub async fn load(&self) -> Vec<Category> {
        if !self.loaded.replace(true) {
            match self.api.categories().await {
                Ok(categories) => self.categories.set(categories),
                Err(err) => {
                    // the editor still works, just without a category list
                    warn!("could not load categories: {}", err);
                    self.loaded.set(false);
                }
            }
        }
        self.categories()
    }
}
