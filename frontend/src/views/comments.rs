use std::rc::Rc;
use std::time::Duration;

use futures_signals::signal::Mutable;
use log::{debug, warn};

use crate::comment_tree::{CommentNode, CommentThread, PendingComment};
use crate::connection::BlogApi;
use crate::error::ApiError;
use crate::load_state::{load_state, LoadState};
use crate::models::Comment;
use crate::notice::Notices;
use crate::session::Identity;
use crate::views::Outcome;
use crate::{BlogId, CommentId};

/// Comments under one blog. Posting needs an author; without one every post
/// is skipped.
pub struct CommentsView<A: BlogApi> {
    api: Rc<A>,
    blog_id: BlogId,
    author: Option<Identity>,
    state: Mutable<LoadState<CommentThread>>,
    notices: Notices,
}

impl<A: BlogApi> CommentsView<A> {
    pub fn new(api: Rc<A>, blog_id: BlogId, author: Option<Identity>, notices: Notices) -> Self {
        CommentsView {
            api,
            blog_id,
            author,
            state: Mutable::new(LoadState::Loading),
            notices,
        }
    }

    pub fn blog_id(&self) -> BlogId {
        self.blog_id
    }

    pub fn state(&self) -> &Mutable<LoadState<CommentThread>> {
        &self.state
    }

    pub fn author(&self) -> Option<&Identity> {
        self.author.as_ref()
    }

    pub async fn load(&self) {
        let blog_id = self.blog_id;
        let fetch = async {
            let comments = self.api.comments(blog_id).await?;
            Ok::<_, ApiError>(CommentThread::new(blog_id, comments))
        };
        load_state(fetch, Duration::ZERO, |state| self.state.set(state)).await;
    }

    pub fn tree(&self) -> Vec<CommentNode> {
        self.state.lock_ref().data().map(CommentThread::tree).unwrap_or_default()
    }

    pub fn draft(&self) -> String {
        self.state
            .lock_ref()
            .data()
            .map(|thread| thread.draft().to_owned())
            .unwrap_or_default()
    }

    pub fn set_draft(&self, draft: impl Into<String>) {
        if let Some(thread) = self.state.lock_mut().data_mut() {
            thread.set_draft(draft);
        }
    }

    /// New top-level comment.
    pub async fn post(&self, content: &str) -> Outcome {
        let pending = match self.begin(|thread, author| thread.add_root(author, content)) {
            Some(pending) => pending,
            None => return Outcome::Skipped,
        };
        self.send(pending, "Failed to post comment").await
    }

    /// Posts the current draft as a top-level comment.
    pub async fn post_draft(&self) -> Outcome {
        let pending = match self.begin(|thread, author| thread.post_draft(author)) {
            Some(pending) => pending,
            None => return Outcome::Skipped,
        };
        self.send(pending, "Failed to post comment").await
    }

    pub async fn reply(&self, parent: CommentId, content: &str) -> Outcome {
        let pending = match self.begin(|thread, author| thread.add_reply(author, parent, content)) {
            Some(pending) => pending,
            None => return Outcome::Skipped,
        };
        self.send(pending, "Failed to reply").await
    }

    fn begin(
        &self,
        insert: impl FnOnce(&mut CommentThread, &Identity) -> Option<PendingComment>,
    ) -> Option<PendingComment> {
        let author = match &self.author {
            Some(author) => author,
            None => {
                self.notices.error("Log in to join the discussion");
                return None;
            }
        };
        self.state
            .lock_mut()
            .data_mut()
            .and_then(|thread| insert(thread, author))
    }

    async fn send(&self, pending: PendingComment, failure: &str) -> Outcome {
        let placeholder = Placeholder {
            state: &self.state,
            temp_id: pending.temp_id,
            armed: true,
        };
        match self
            .api
            .post_comment(self.blog_id, &pending.content, pending.parent)
            .await
        {
            Ok(comment) => {
                placeholder.confirm(comment);
                Outcome::Confirmed
            }
            Err(err) => {
                warn!(
                    "comment {} on blog {} failed, removing it: {}",
                    pending.temp_id, self.blog_id, err
                );
                drop(placeholder);
                self.notices.error(failure);
                Outcome::RolledBack
            }
        }
    }
}

/// The optimistic comment of one post. Removed from the thread on drop
/// unless the server confirmed it, so an abandoned post leaves nothing behind.
struct Placeholder<'a> {
    state: &'a Mutable<LoadState<CommentThread>>,
    temp_id: CommentId,
    armed: bool,
}

impl Placeholder<'_> {
    fn confirm(mut self, comment: Comment) {
        self.armed = false;
        if let Some(thread) = self.state.lock_mut().data_mut() {
            thread.confirm(self.temp_id, comment);
        }
    }
}

impl Drop for Placeholder<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Some(thread) = self.state.lock_mut().data_mut() {
            if thread.fail(self.temp_id) {
                debug!("removed unsent comment {}", self.temp_id);
            }
        }
    }
}
