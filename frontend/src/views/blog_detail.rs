use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use futures::join;
use futures_signals::signal::Mutable;
use log::warn;

use crate::connection::BlogApi;
use crate::error::ReactionError;
use crate::load_state::{load_state, LoadState};
use crate::models::BlogItem;
use crate::notice::Notices;
use crate::query_result::ReactionSummary;
use crate::reaction::{PendingReaction, Reaction, ReactionGuard, ReactionReducer};
use crate::session::Identity;
use crate::views::{CommentsView, Outcome};
use crate::BlogId;

/// A single blog with its discussion underneath.
pub struct BlogDetailView<A: BlogApi> {
    api: Rc<A>,
    blog_id: BlogId,
    state: Mutable<LoadState<BlogItem>>,
    comments: CommentsView<A>,
    reactions: RefCell<ReactionReducer>,
    notices: Notices,
}

impl<A: BlogApi> BlogDetailView<A> {
    pub fn new(api: Rc<A>, blog_id: BlogId, author: Option<Identity>, notices: Notices) -> Self {
        BlogDetailView {
            comments: CommentsView::new(api.clone(), blog_id, author, notices.clone()),
            api,
            blog_id,
            state: Mutable::new(LoadState::Loading),
            reactions: RefCell::new(ReactionReducer::new()),
            notices,
        }
    }

    pub fn blog_id(&self) -> BlogId {
        self.blog_id
    }

    pub fn state(&self) -> &Mutable<LoadState<BlogItem>> {
        &self.state
    }

    pub fn blog(&self) -> Option<BlogItem> {
        self.state.lock_ref().data().cloned()
    }

    pub fn comments(&self) -> &CommentsView<A> {
        &self.comments
    }

    /// Blog and comments are fetched side by side; either may fail alone.
    pub async fn load(&self) {
        let blog = load_state(self.api.blog(self.blog_id), Duration::ZERO, |state| {
            self.reactions.borrow_mut().items_replaced();
            self.state.set(state)
        });
        join!(blog, self.comments.load());
    }

    pub async fn react(&self, reaction: Reaction) -> Outcome {
        let blog_id = self.blog_id;
        let begun = match self.state.lock_mut().data_mut() {
            Some(blog) => self.reactions.borrow_mut().begin(
                std::slice::from_mut(blog),
                blog_id,
                reaction,
            ),
            None => Err(ReactionError::NotLoaded),
        };
        let guard = match begun {
            Ok(pending) => ReactionGuard::new(pending, |pending, summary| self.settle(pending, summary)),
            Err(_) => return Outcome::Skipped,
        };

        match self.api.react(blog_id, guard.pending().next).await {
            Ok(summary) => {
                guard.confirm(summary);
                Outcome::Confirmed
            }
            Err(err) => {
                warn!("reaction on blog {} failed, rolling back: {}", blog_id, err);
                guard.fail();
                self.notices.error("Could not save your reaction");
                Outcome::RolledBack
            }
        }
    }

    fn settle(&self, pending: &PendingReaction, summary: Option<ReactionSummary>) {
        let mut state = self.state.lock_mut();
        let mut reactions = self.reactions.borrow_mut();
        match (state.data_mut(), summary) {
            (Some(blog), Some(summary)) => {
                reactions.confirm(std::slice::from_mut(blog), pending, summary);
            }
            (Some(blog), None) => {
                reactions.fail(std::slice::from_mut(blog), pending);
            }
            (None, _) => reactions.release(pending),
        }
    }
}
