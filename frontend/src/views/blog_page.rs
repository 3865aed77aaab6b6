use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use futures_signals::signal::Mutable;
use log::{debug, warn};

use crate::connection::BlogApi;
use crate::error::ReactionError;
use crate::load_state::{load_state, LoadState};
use crate::models::{BlogItem, PaginatedResult};
use crate::notice::Notices;
use crate::operators::only_latest::OnlyLatest;
use crate::pagination::Pagination;
use crate::query_result::ReactionSummary;
use crate::reaction::{PendingReaction, Reaction, ReactionGuard, ReactionReducer};
use crate::views::{Outcome, Settings};
use crate::{BlogId, UserId};

pub type BlogPage = PaginatedResult<BlogItem>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlogSource {
    All,
    User(UserId),
}

/// One page of blogs with paging and optimistic reactions.
pub struct BlogPageView<A: BlogApi> {
    api: Rc<A>,
    source: BlogSource,
    page_size: u32,
    loading_delay: Duration,
    page: Cell<u32>,
    state: Mutable<LoadState<BlogPage>>,
    latest: OnlyLatest,
    reactions: RefCell<ReactionReducer>,
    notices: Notices,
}

impl<A: BlogApi> BlogPageView<A> {
    pub fn new(api: Rc<A>, source: BlogSource, settings: Settings, notices: Notices) -> Self {
        BlogPageView {
            api,
            source,
            page_size: settings.page_size,
            loading_delay: settings.loading_delay,
            page: Cell::new(1),
            state: Mutable::new(LoadState::Loading),
            latest: OnlyLatest::new(),
            reactions: RefCell::new(ReactionReducer::new()),
            notices,
        }
    }

    pub fn state(&self) -> &Mutable<LoadState<BlogPage>> {
        &self.state
    }

    pub fn source(&self) -> BlogSource {
        self.source
    }

    pub fn page(&self) -> u32 {
        self.page.get()
    }

    pub fn blogs(&self) -> Vec<BlogItem> {
        self.state
            .lock_ref()
            .data()
            .map(|page| page.items.clone())
            .unwrap_or_default()
    }

    pub fn total_count(&self) -> u32 {
        self.state.lock_ref().data().map(|page| page.total_count).unwrap_or(0)
    }

    pub fn total_pages(&self) -> u32 {
        self.state.lock_ref().data().map(|page| page.total_pages).unwrap_or(0)
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page(), self.total_pages())
    }

    pub fn window(&self) -> Vec<u32> {
        self.pagination().window()
    }

    /// Fetch the current page again. Only the newest fetch may write the state.
    pub async fn refresh(&self) {
        let ticket = self.latest.issue();
        let page = self.page.get();

        let fetch = async {
            match self.source {
                BlogSource::All => self.api.blogs(page, self.page_size).await,
                BlogSource::User(user_id) => {
                    self.api.user_blogs(user_id, page, self.page_size).await
                }
            }
        };

        load_state(fetch, self.loading_delay, |state| {
            if self.latest.is_latest(ticket) {
                self.reactions.borrow_mut().items_replaced();
                self.state.set(state);
            } else {
                debug!("dropping result for superseded page {}", page);
            }
        })
        .await;
    }

    pub async fn load_page(&self, page: u32) {
        if self.pagination().go_to(page).is_none() {
            return;
        }
        self.page.set(page);
        self.refresh().await;
    }

    pub async fn next(&self) {
        if let Some(page) = self.pagination().next() {
            self.load_page(page).await;
        }
    }

    pub async fn prev(&self) {
        if let Some(page) = self.pagination().prev() {
            self.load_page(page).await;
        }
    }

    pub async fn react(&self, blog_id: BlogId, reaction: Reaction) -> Outcome {
        let begun = match self.state.lock_mut().data_mut() {
            Some(page) => self
                .reactions
                .borrow_mut()
                .begin(&mut page.items, blog_id, reaction),
            None => Err(ReactionError::NotLoaded),
        };
        let guard = match begun {
            Ok(pending) => ReactionGuard::new(pending, |pending, summary| self.settle(pending, summary)),
            Err(err) => {
                debug!("reaction skipped: {}", err);
                return Outcome::Skipped;
            }
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
            (Some(page), Some(summary)) => {
                reactions.confirm(&mut page.items, pending, summary);
            }
            (Some(page), None) => {
                reactions.fail(&mut page.items, pending);
            }
            (None, _) => reactions.release(pending),
        }
    }

    /// Deletes a blog and reloads the page it was on.
    pub async fn delete(&self, blog_id: BlogId) -> Outcome {
        match self.api.delete_blog(blog_id).await {
            Ok(()) => {
                self.notices.success("Blog deleted");
                self.refresh().await;
                Outcome::Confirmed
            }
            Err(err) => {
                warn!("deleting blog {} failed: {}", blog_id, err);
                self.notices.error(err.to_string());
                Outcome::RolledBack
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::models::ReactionState::*;
    use crate::notice::NoticeLevel;
    use crate::reaction::blog;
    use crate::views::fake::{page_of, FakeApi};
    use futures::{join, pin_mut, poll, StreamExt};
    use futures_signals::signal::SignalExt;

    fn settings() -> Settings {
        Settings {
            page_size: 6,
            loading_delay: Duration::ZERO,
        }
    }

    fn view(api: &Rc<FakeApi>) -> BlogPageView<FakeApi> {
        BlogPageView::new(api.clone(), BlogSource::All, settings(), Notices::new())
    }

    fn liked(like: u32, dislike: u32) -> ReactionSummary {
        ReactionSummary {
            like,
            dislike,
            user_reaction: Liked,
        }
    }

    #[tokio::test]
    async fn refresh_loads_the_page() {
        let api = Rc::new(FakeApi::new());
        api.serve_page(1, Ok(page_of(vec![blog(1, Neutral, 0, 0), blog(2, Neutral, 1, 0)], 1, 3)));

        let view = view(&api);
        assert!(view.state().lock_ref().is_loading());
        view.refresh().await;

        assert_eq!(view.blogs().iter().map(|b| b.id).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(view.total_pages(), 3);
        assert_eq!(view.window(), vec![1, 2, 3]);
        assert_eq!(api.calls(), vec!["blogs 1 6"]);
    }

    #[tokio::test]
    async fn read_failure_becomes_error_state() {
        let api = Rc::new(FakeApi::new());
        api.serve_page(1, Err(ApiError::Network("down".into())));

        let view = view(&api);
        view.refresh().await;

        assert_eq!(
            view.state().get_cloned(),
            LoadState::Error(ApiError::Network("down".into()))
        );
        assert!(view.blogs().is_empty());
        assert_eq!(view.total_pages(), 0);
    }

    #[tokio::test]
    async fn paging_moves_within_bounds() {
        let api = Rc::new(FakeApi::new());
        api.serve_page(1, Ok(page_of(vec![blog(1, Neutral, 0, 0)], 1, 2)));
        api.serve_page(2, Ok(page_of(vec![blog(2, Neutral, 0, 0)], 2, 2)));

        let view = view(&api);
        view.prev().await;
        view.next().await;
        // nothing loaded yet, so there is no page to move to
        assert!(api.calls().is_empty());

        view.refresh().await;
        view.next().await;
        assert_eq!(view.page(), 2);
        assert_eq!(view.blogs()[0].id, 2);

        view.next().await;
        view.load_page(2).await;
        assert_eq!(api.calls(), vec!["blogs 1 6", "blogs 2 6"]);

        view.prev().await;
        assert_eq!(view.page(), 1);
    }

    #[tokio::test]
    async fn superseded_page_result_is_dropped() {
        let api = Rc::new(FakeApi::new());
        api.serve_page(1, Ok(page_of(vec![blog(1, Neutral, 0, 0)], 1, 3)));
        api.serve_page(2, Ok(page_of(vec![blog(2, Neutral, 0, 0)], 2, 3)));
        api.serve_page(3, Ok(page_of(vec![blog(3, Neutral, 0, 0)], 3, 3)));

        let view = view(&api);
        view.refresh().await;

        let slow = api.gate_page(2);
        let go_to_two = view.load_page(2);
        let go_to_three = async {
            view.load_page(3).await;
            let _ = slow.send(());
        };
        join!(go_to_two, go_to_three);

        assert_eq!(view.page(), 3);
        assert_eq!(view.blogs()[0].id, 3);
    }

    #[tokio::test]
    async fn reaction_is_optimistic_then_confirmed() {
        let api = Rc::new(FakeApi::new());
        api.serve_page(1, Ok(page_of(vec![blog(1, Neutral, 2, 0), blog(2, Neutral, 0, 0)], 1, 1)));
        let view = view(&api);
        view.refresh().await;

        let reply = api.next_reaction();
        let react = view.react(1, Reaction::Like);
        let check = async {
            let blogs = view.blogs();
            assert_eq!(blogs[0].user_reaction, Liked);
            assert_eq!(blogs[0].like_counts, 3);
            let _ = reply.send(Ok(liked(9, 0)));
        };
        let (outcome, ()) = join!(react, check);

        assert_eq!(outcome, Outcome::Confirmed);
        assert_eq!(view.blogs()[0].like_counts, 9);
        assert_eq!(view.blogs()[1], blog(2, Neutral, 0, 0));
        assert_eq!(api.calls().last().map(String::as_str), Some("react 1 Liked"));
    }

    #[tokio::test]
    async fn failed_reaction_rolls_back_and_notifies() {
        let api = Rc::new(FakeApi::new());
        api.serve_page(1, Ok(page_of(vec![blog(1, Disliked, 2, 5)], 1, 1)));
        let notices = Notices::new();
        let view = BlogPageView::new(api.clone(), BlogSource::All, settings(), notices.clone());
        view.refresh().await;

        let _ = api
            .next_reaction()
            .send(Err(ApiError::Status { status: 500, message: "boom".into() }));
        assert_eq!(view.react(1, Reaction::Like).await, Outcome::RolledBack);

        assert_eq!(view.blogs()[0], blog(1, Disliked, 2, 5));
        let drained = notices.drain();
        assert_eq!(drained.len(), 1);
        assert_eq!(drained[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn reaction_while_waiting_is_skipped() {
        let api = Rc::new(FakeApi::new());
        api.serve_page(1, Ok(page_of(vec![blog(1, Neutral, 0, 0)], 1, 1)));
        let view = view(&api);
        view.refresh().await;

        let reply = api.next_reaction();
        let first = view.react(1, Reaction::Like);
        let second = async {
            let outcome = view.react(1, Reaction::Like).await;
            let _ = reply.send(Ok(liked(1, 0)));
            outcome
        };
        let (first, second) = join!(first, second);

        assert_eq!(first, Outcome::Confirmed);
        assert_eq!(second, Outcome::Skipped);
        assert_eq!(
            api.calls().iter().filter(|c| c.starts_with("react")).count(),
            1
        );
        assert_eq!(view.blogs()[0].user_reaction, Liked);
    }

    #[tokio::test]
    async fn reaction_before_load_is_skipped() {
        let api = Rc::new(FakeApi::new());
        let view = view(&api);
        assert_eq!(view.react(1, Reaction::Like).await, Outcome::Skipped);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn user_source_fetches_user_blogs() {
        let api = Rc::new(FakeApi::new());
        api.serve_page(1, Ok(page_of(vec![blog(4, Neutral, 0, 0)], 1, 1)));
        let view = BlogPageView::new(api.clone(), BlogSource::User(12), settings(), Notices::new());
        view.refresh().await;
        assert_eq!(api.calls(), vec!["user_blogs 12 1 6"]);

        assert_eq!(view.delete(4).await, Outcome::Confirmed);
        assert_eq!(api.calls()[1], "delete 4");
        assert_eq!(api.calls().len(), 3);
    }

    #[tokio::test]
    async fn state_signal_follows_the_load() {
        let api = Rc::new(FakeApi::new());
        api.serve_page(1, Ok(page_of(vec![blog(1, Neutral, 0, 0)], 1, 1)));
        let view = view(&api);

        let loading = view.state().signal_ref(|state| state.is_loading()).to_stream();
        pin_mut!(loading);
        assert_eq!(loading.next().await, Some(true));

        view.refresh().await;
        assert_eq!(loading.next().await, Some(false));
    }

    #[tokio::test]
    async fn reload_during_reaction_keeps_fresh_counts() {
        let api = Rc::new(FakeApi::new());
        api.serve_page(1, Ok(page_of(vec![blog(1, Neutral, 0, 0)], 1, 1)));
        let view = view(&api);
        view.refresh().await;

        let reply = api.next_reaction();
        let react = view.react(1, Reaction::Like);
        let reload = async {
            api.serve_page(1, Ok(page_of(vec![blog(1, Neutral, 50, 7)], 1, 1)));
            view.refresh().await;
            let _ = reply.send(Err(ApiError::Network("timeout".into())));
        };
        let (outcome, ()) = join!(react, reload);

        assert_eq!(outcome, Outcome::RolledBack);
        assert_eq!(view.blogs()[0], blog(1, Neutral, 50, 7));
    }

    #[tokio::test]
    async fn abandoned_reaction_unlocks_the_blog() {
        let api = Rc::new(FakeApi::new());
        api.serve_page(1, Ok(page_of(vec![blog(1, Neutral, 4, 0)], 1, 1)));
        let view = view(&api);
        view.refresh().await;

        let _unanswered = api.next_reaction();
        {
            let react = view.react(1, Reaction::Like);
            pin_mut!(react);
            assert!(poll!(react.as_mut()).is_pending());
            assert_eq!(view.blogs()[0].like_counts, 5);
        }
        assert_eq!(view.blogs()[0], blog(1, Neutral, 4, 0));

        let _ = api.next_reaction().send(Ok(liked(5, 0)));
        assert_eq!(view.react(1, Reaction::Like).await, Outcome::Confirmed);
        assert_eq!(view.blogs()[0].like_counts, 5);
    }
}
