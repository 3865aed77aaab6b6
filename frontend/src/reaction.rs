//! Optimistic like/dislike toggling.
//!
//! `begin` applies the toggle to the local item and records what it looked
//! like before; the caller then sends `(blog_id, next)` to the server and
//! finishes with either `confirm` (server values win) or `fail` (exact
//! restore). One reaction per blog may be outstanding: a second request for
//! the same blog while the first is unanswered is refused.
//!
//! When the caller swaps in freshly fetched items (`items_replaced`), answers
//! to reactions begun before the swap no longer touch the items: the fetched
//! values already reflect whatever the server decided.

use std::collections::HashSet;

use log::debug;

use crate::error::ReactionError;
use crate::models::{BlogItem, ReactionState};
use crate::query_result::ReactionSummary;
use crate::BlogId;

/// What the user clicked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Reaction {
    Like,
    Dislike,
}

impl From<Reaction> for ReactionState {
    fn from(reaction: Reaction) -> Self {
        match reaction {
            Reaction::Like => ReactionState::Liked,
            Reaction::Dislike => ReactionState::Disliked,
        }
    }
}

impl ReactionState {
    /// Clicking the active reaction again clears it.
    pub fn toggle(self, requested: Reaction) -> ReactionState {
        let requested = ReactionState::from(requested);
        if self == requested {
            ReactionState::Neutral
        } else {
            requested
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReactionSnapshot {
    pub state: ReactionState,
    pub like_count: u32,
    pub dislike_count: u32,
}

impl ReactionSnapshot {
    pub fn of(item: &BlogItem) -> Self {
        ReactionSnapshot {
            state: item.user_reaction,
            like_count: item.like_counts,
            dislike_count: item.dislike_counts,
        }
    }

    pub fn apply_to(&self, item: &mut BlogItem) {
        item.user_reaction = self.state;
        item.like_counts = self.like_count;
        item.dislike_counts = self.dislike_count;
    }

    /// The provisional result of `requested`: leave the old counted state,
    /// enter the new one. Counters never drop below zero.
    pub fn toggled(&self, requested: Reaction) -> ReactionSnapshot {
        let next = self.state.toggle(requested);
        let mut result = ReactionSnapshot { state: next, ..*self };

        match self.state {
            ReactionState::Liked => result.like_count = result.like_count.saturating_sub(1),
            ReactionState::Disliked => {
                result.dislike_count = result.dislike_count.saturating_sub(1)
            }
            ReactionState::Neutral => {}
        }
        match next {
            ReactionState::Liked => result.like_count += 1,
            ReactionState::Disliked => result.dislike_count += 1,
            ReactionState::Neutral => {}
        }

        result
    }
}

impl From<ReactionSummary> for ReactionSnapshot {
    fn from(summary: ReactionSummary) -> Self {
        ReactionSnapshot {
            state: summary.user_reaction,
            like_count: summary.like,
            dislike_count: summary.dislike,
        }
    }
}

/// A reaction that has been applied locally and awaits the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingReaction {
    pub blog_id: BlogId,
    pub next: ReactionState,
    pub previous: ReactionSnapshot,
    epoch: u64,
}

#[derive(Default, Debug)]
pub struct ReactionReducer {
    in_flight: HashSet<BlogId>,
    epoch: u64,
}

impl ReactionReducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_in_flight(&self, blog_id: BlogId) -> bool {
        self.in_flight.contains(&blog_id)
    }

    /// The items were reloaded from the server.
    pub fn items_replaced(&mut self) {
        self.epoch += 1;
    }

    fn settle<'a>(
        &mut self,
        items: &'a mut [BlogItem],
        pending: &PendingReaction,
    ) -> Option<&'a mut BlogItem> {
        self.in_flight.remove(&pending.blog_id);
        if pending.epoch != self.epoch {
            debug!("blog {} was reloaded while its reaction was out", pending.blog_id);
            return None;
        }
        items.iter_mut().find(|item| item.id == pending.blog_id)
    }

    pub fn begin(
        &mut self,
        items: &mut [BlogItem],
        blog_id: BlogId,
        requested: Reaction,
    ) -> Result<PendingReaction, ReactionError> {
        if self.is_in_flight(blog_id) {
            debug!("dropping {:?} on blog {}: already waiting", requested, blog_id);
            return Err(ReactionError::InFlight(blog_id));
        }

        let item = items
            .iter_mut()
            .find(|item| item.id == blog_id)
            .ok_or(ReactionError::NotFound(blog_id))?;

        let previous = ReactionSnapshot::of(item);
        let provisional = previous.toggled(requested);
        provisional.apply_to(item);
        self.in_flight.insert(blog_id);

        debug!(
            "blog {} reaction {:?} -> {:?} (optimistic)",
            blog_id, previous.state, provisional.state
        );

        Ok(PendingReaction {
            blog_id,
            next: provisional.state,
            previous,
            epoch: self.epoch,
        })
    }

    /// Server values replace the local arithmetic. Returns false when the
    /// blog is no longer in `items` or the items were replaced since `begin`.
    pub fn confirm(
        &mut self,
        items: &mut [BlogItem],
        pending: &PendingReaction,
        summary: ReactionSummary,
    ) -> bool {
        match self.settle(items, pending) {
            Some(item) => {
                ReactionSnapshot::from(summary).apply_to(item);
                true
            }
            None => false,
        }
    }

    pub fn fail(&mut self, items: &mut [BlogItem], pending: &PendingReaction) -> bool {
        match self.settle(items, pending) {
            Some(item) => {
                pending.previous.apply_to(item);
                true
            }
            None => false,
        }
    }

    /// Forget an outstanding reaction without touching any item.
    pub fn release(&mut self, pending: &PendingReaction) {
        self.in_flight.remove(&pending.blog_id);
    }
}

/// Owns an outstanding reaction until it is answered. If the request future
/// is dropped first, the guard settles it as failed so the blog does not stay
/// locked with provisional counts.
pub struct ReactionGuard<F: FnMut(&PendingReaction, Option<ReactionSummary>)> {
    pending: PendingReaction,
    settle: F,
    done: bool,
}

impl<F: FnMut(&PendingReaction, Option<ReactionSummary>)> ReactionGuard<F> {
    /// `settle` receives the server summary, or `None` to roll back.
    pub fn new(pending: PendingReaction, settle: F) -> Self {
        ReactionGuard {
            pending,
            settle,
            done: false,
        }
    }

    pub fn pending(&self) -> &PendingReaction {
        &self.pending
    }

    pub fn confirm(mut self, summary: ReactionSummary) {
        self.done = true;
        (self.settle)(&self.pending, Some(summary));
    }

    pub fn fail(mut self) {
        self.done = true;
        (self.settle)(&self.pending, None);
    }
}

impl<F: FnMut(&PendingReaction, Option<ReactionSummary>)> Drop for ReactionGuard<F> {
    fn drop(&mut self) {
        if !self.done {
            debug!("reaction on blog {} abandoned", self.pending.blog_id);
            (self.settle)(&self.pending, None);
        }
    }
}

#[cfg(test)]
pub(crate) fn blog(id: BlogId, state: ReactionState, like: u32, dislike: u32) -> BlogItem {
    BlogItem {
        id,
        title: format!("blog {}", id),
        description: "a description that is long enough".into(),
        blog_visibility: 0,
        category_id: 1,
        category_name: "General".into(),
        author_id: 1,
        author_name: "ann".into(),
        created_at: "2024-05-01T10:00:00".into(),
        last_updated_at: None,
        like_counts: like,
        dislike_counts: dislike,
        user_reaction: state,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ReactionState::*;

    fn snapshot(state: ReactionState, like: u32, dislike: u32) -> ReactionSnapshot {
        ReactionSnapshot {
            state,
            like_count: like,
            dislike_count: dislike,
        }
    }

    #[test]
    fn toggle_transitions() {
        assert_eq!(Neutral.toggle(Reaction::Like), Liked);
        assert_eq!(Liked.toggle(Reaction::Like), Neutral);
        assert_eq!(Liked.toggle(Reaction::Dislike), Disliked);
        assert_eq!(Disliked.toggle(Reaction::Dislike), Neutral);
    }

    #[test]
    fn counters_follow_the_transition() {
        assert_eq!(snapshot(Neutral, 2, 1).toggled(Reaction::Like), snapshot(Liked, 3, 1));
        assert_eq!(snapshot(Liked, 3, 1).toggled(Reaction::Dislike), snapshot(Disliked, 2, 2));
        assert_eq!(snapshot(Disliked, 2, 2).toggled(Reaction::Dislike), snapshot(Neutral, 2, 1));
        // a stale zero count must not wrap
        assert_eq!(snapshot(Liked, 0, 0).toggled(Reaction::Like), snapshot(Neutral, 0, 0));
    }

    #[test]
    fn double_toggle_restores_counts() {
        let start = snapshot(Neutral, 5, 4);
        let back = start.toggled(Reaction::Dislike).toggled(Reaction::Dislike);
        assert_eq!(back, start);
    }

    #[test]
    fn confirm_takes_server_values() {
        let mut items = vec![blog(1, Neutral, 0, 0), blog(2, Neutral, 7, 0)];
        let mut reducer = ReactionReducer::new();

        let pending = reducer.begin(&mut items, 2, Reaction::Like).unwrap();
        assert_eq!(pending.next, Liked);
        assert_eq!(items[1].like_counts, 8);
        assert!(reducer.is_in_flight(2));

        let summary = ReactionSummary {
            like: 10,
            dislike: 1,
            user_reaction: Liked,
        };
        assert!(reducer.confirm(&mut items, &pending, summary));
        assert_eq!(ReactionSnapshot::of(&items[1]), snapshot(Liked, 10, 1));
        // the other blog is untouched
        assert_eq!(items[0], blog(1, Neutral, 0, 0));
        assert!(!reducer.is_in_flight(2));
    }

    #[test]
    fn fail_restores_exact_snapshot() {
        let mut items = vec![blog(3, Disliked, 4, 9)];
        let mut reducer = ReactionReducer::new();

        let pending = reducer.begin(&mut items, 3, Reaction::Like).unwrap();
        assert_eq!(ReactionSnapshot::of(&items[0]), snapshot(Liked, 5, 8));

        assert!(reducer.fail(&mut items, &pending));
        assert_eq!(items[0], blog(3, Disliked, 4, 9));
    }

    #[test]
    fn second_reaction_while_waiting_is_refused() {
        let mut items = vec![blog(4, Neutral, 0, 0)];
        let mut reducer = ReactionReducer::new();

        let pending = reducer.begin(&mut items, 4, Reaction::Like).unwrap();
        assert_eq!(
            reducer.begin(&mut items, 4, Reaction::Dislike),
            Err(ReactionError::InFlight(4))
        );
        // refused request changed nothing
        assert_eq!(ReactionSnapshot::of(&items[0]), snapshot(Liked, 1, 0));

        reducer.fail(&mut items, &pending);
        assert!(reducer.begin(&mut items, 4, Reaction::Dislike).is_ok());
    }

    #[test]
    fn unknown_blog_is_reported() {
        let mut items = vec![blog(1, Neutral, 0, 0)];
        let mut reducer = ReactionReducer::new();
        assert_eq!(
            reducer.begin(&mut items, 99, Reaction::Like),
            Err(ReactionError::NotFound(99))
        );
        assert!(!reducer.is_in_flight(99));
    }

    #[test]
    fn confirmation_after_page_change_is_ignored() {
        let mut items = vec![blog(1, Neutral, 0, 0)];
        let mut reducer = ReactionReducer::new();
        let pending = reducer.begin(&mut items, 1, Reaction::Like).unwrap();

        let mut next_page = vec![blog(8, Neutral, 0, 0)];
        let summary = ReactionSummary {
            like: 1,
            dislike: 0,
            user_reaction: Liked,
        };
        assert!(!reducer.confirm(&mut next_page, &pending, summary));
        assert_eq!(next_page[0], blog(8, Neutral, 0, 0));
        assert!(!reducer.is_in_flight(1));
    }

    #[test]
    fn answer_after_reload_leaves_fresh_values() {
        let mut items = vec![blog(1, Neutral, 0, 0)];
        let mut reducer = ReactionReducer::new();
        let pending = reducer.begin(&mut items, 1, Reaction::Like).unwrap();

        items = vec![blog(1, Neutral, 50, 7)];
        reducer.items_replaced();

        assert!(!reducer.fail(&mut items, &pending));
        assert_eq!(items[0], blog(1, Neutral, 50, 7));
        assert!(!reducer.is_in_flight(1));

        // reactions begun after the reload apply normally
        let pending = reducer.begin(&mut items, 1, Reaction::Dislike).unwrap();
        assert!(reducer.fail(&mut items, &pending));
        assert_eq!(items[0], blog(1, Neutral, 50, 7));
    }

    #[test]
    fn last_confirmation_wins_over_several_rounds() {
        let mut items = vec![blog(5, Neutral, 3, 3)];
        let mut reducer = ReactionReducer::new();
        let answers = [
            (Reaction::Like, ReactionSummary { like: 4, dislike: 3, user_reaction: Liked }),
            (Reaction::Dislike, ReactionSummary { like: 9, dislike: 6, user_reaction: Disliked }),
            (Reaction::Dislike, ReactionSummary { like: 11, dislike: 2, user_reaction: Neutral }),
        ];

        for (requested, summary) in answers {
            let pending = reducer.begin(&mut items, 5, requested).unwrap();
            assert!(reducer.confirm(&mut items, &pending, summary));
        }

        assert_eq!(ReactionSnapshot::of(&items[0]), snapshot(Neutral, 11, 2));
        assert!(!reducer.is_in_flight(5));
    }

    #[test]
    fn dropped_guard_rolls_back() {
        let mut items = vec![blog(6, Liked, 2, 0)];
        let mut reducer = ReactionReducer::new();
        let pending = reducer.begin(&mut items, 6, Reaction::Dislike).unwrap();

        let mut settled = Vec::new();
        drop(ReactionGuard::new(pending, |p, summary| settled.push((p.blog_id, summary))));
        assert_eq!(settled, vec![(6, None)]);

        let summary = ReactionSummary { like: 1, dislike: 1, user_reaction: Disliked };
        let mut settled = Vec::new();
        ReactionGuard::new(pending, |p, summary| settled.push((p.blog_id, summary))).confirm(summary);
        assert_eq!(settled, vec![(6, Some(summary))]);
    }
}
