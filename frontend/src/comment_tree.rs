//! Flat comment list with optimistic posting, and the reply tree derived
//! from it.
//!
//! Comments posted locally get a negative placeholder id until the server
//! answers; the placeholder is then swapped for the real comment in place, or
//! the comment is dropped if the post failed. Replies whose parent is not in
//! the list are shown as top-level comments, as is the first listed comment
//! of a parent cycle.

use std::collections::HashMap;

use chrono::Utc;
use log::debug;

use crate::models::Comment;
use crate::session::Identity;
use crate::{BlogId, CommentId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentNode {
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}

impl CommentNode {
    /// This node plus all of its descendants.
    pub fn size(&self) -> usize {
        1 + self.replies.iter().map(CommentNode::size).sum::<usize>()
    }
}

/// A comment shown locally but not yet acknowledged by the server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingComment {
    pub temp_id: CommentId,
    pub parent: Option<CommentId>,
    pub content: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommentThread {
    blog_id: BlogId,
    comments: Vec<Comment>,
    draft: String,
    last_temp_id: CommentId,
}

impl CommentThread {
    pub fn new(blog_id: BlogId, comments: Vec<Comment>) -> Self {
        CommentThread {
            blog_id,
            comments,
            draft: String::new(),
            last_temp_id: 0,
        }
    }

    pub fn blog_id(&self) -> BlogId {
        self.blog_id
    }

    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.draft = draft.into();
    }

    pub fn get(&self, id: CommentId) -> Option<&Comment> {
        self.comments.iter().find(|comment| comment.id == id)
    }

    /// Millisecond timestamps, negated, and always below the previous one so
    /// two posts in the same millisecond still get distinct ids.
    fn next_temp_id(&mut self) -> CommentId {
        let stamp = -Utc::now().timestamp_millis().max(1);
        self.last_temp_id = stamp.min(self.last_temp_id - 1);
        self.last_temp_id
    }

    fn optimistic(
        &mut self,
        author: &Identity,
        parent: Option<CommentId>,
        content: &str,
    ) -> Option<Comment> {
        let content = content.trim();
        if content.is_empty() {
            return None;
        }

        Some(Comment {
            id: self.next_temp_id(),
            blog_id: self.blog_id,
            content: content.to_owned(),
            user_id: author.user_id,
            user_name: author.display_name().to_owned(),
            parent_comment_id: parent,
            created_at: Utc::now().to_rfc3339(),
            last_updated_at: None,
            is_optimistic: true,
        })
    }

    /// New top-level comment, shown first. Clears the draft.
    pub fn add_root(&mut self, author: &Identity, content: &str) -> Option<PendingComment> {
        let comment = self.optimistic(author, None, content)?;
        let pending = PendingComment {
            temp_id: comment.id,
            parent: None,
            content: comment.content.clone(),
        };
        self.comments.insert(0, comment);
        self.draft.clear();
        debug!("optimistic comment {} on blog {}", pending.temp_id, self.blog_id);
        Some(pending)
    }

    /// Posts whatever is in the draft as a top-level comment.
    pub fn post_draft(&mut self, author: &Identity) -> Option<PendingComment> {
        let draft = std::mem::take(&mut self.draft);
        self.add_root(author, &draft)
    }

    /// Reply to `parent`, appended after everything already shown.
    pub fn add_reply(
        &mut self,
        author: &Identity,
        parent: CommentId,
        content: &str,
    ) -> Option<PendingComment> {
        let comment = self.optimistic(author, Some(parent), content)?;
        let pending = PendingComment {
            temp_id: comment.id,
            parent: Some(parent),
            content: comment.content.clone(),
        };
        self.comments.push(comment);
        debug!("optimistic reply {} to {}", pending.temp_id, parent);
        Some(pending)
    }

    /// Swap the placeholder for the server's comment, keeping its position.
    pub fn confirm(&mut self, temp_id: CommentId, mut confirmed: Comment) -> bool {
        match self.comments.iter_mut().find(|comment| comment.id == temp_id) {
            Some(slot) => {
                confirmed.is_optimistic = false;
                *slot = confirmed;
                true
            }
            None => false,
        }
    }

    /// The comment never existed server side, so it is removed outright.
    pub fn fail(&mut self, temp_id: CommentId) -> bool {
        let before = self.comments.len();
        self.comments.retain(|comment| comment.id != temp_id);
        self.comments.len() != before
    }

    pub fn tree(&self) -> Vec<CommentNode> {
        build_tree(&self.comments)
    }
}

/// Groups `comments` under their parents, keeping list order among siblings.
/// Comments whose parent is missing become roots, and so does the first
/// listed comment of any parent cycle, so every comment appears exactly once.
/// Works without recursion, however deep the replies go.
pub fn build_tree(comments: &[Comment]) -> Vec<CommentNode> {
    let index_of: HashMap<CommentId, usize> = comments
        .iter()
        .enumerate()
        .map(|(index, comment)| (comment.id, index))
        .collect();

    let mut parent: Vec<Option<usize>> = comments
        .iter()
        .enumerate()
        .map(|(index, comment)| {
            comment
                .parent_comment_id
                .and_then(|id| index_of.get(&id).copied())
                .filter(|&parent| parent != index)
        })
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); comments.len()];
    for (index, parent) in parent.iter().enumerate() {
        if let Some(parent) = *parent {
            children[parent].push(index);
        }
    }

    fn visit(start: usize, children: &[Vec<usize>], reached: &mut [bool], order: &mut Vec<usize>) {
        let mut stack = vec![start];
        while let Some(index) = stack.pop() {
            reached[index] = true;
            order.push(index);
            stack.extend(children[index].iter().rev());
        }
    }

    let mut reached = vec![false; comments.len()];
    let mut order = Vec::with_capacity(comments.len());
    for index in 0..comments.len() {
        if parent[index].is_none() {
            visit(index, &children, &mut reached, &mut order);
        }
    }
    // whatever is left hangs off a cycle
    for index in 0..comments.len() {
        if reached[index] {
            continue;
        }
        if let Some(old) = parent[index].take() {
            debug!("comment {} is part of a reply cycle", comments[index].id);
            children[old].retain(|&child| child != index);
        }
        visit(index, &children, &mut reached, &mut order);
    }

    // children come after their parent in `order`, so build back to front
    let mut built: Vec<Option<CommentNode>> = vec![None; comments.len()];
    for &index in order.iter().rev() {
        let replies = children[index]
            .iter()
            .filter_map(|&child| built[child].take())
            .collect();
        built[index] = Some(CommentNode {
            comment: comments[index].clone(),
            replies,
        });
    }

    (0..comments.len())
        .filter(|&index| parent[index].is_none())
        .filter_map(|index| built[index].take())
        .collect()
}

#[cfg(test)]
pub(crate) fn comment(id: CommentId, parent: Option<CommentId>, content: &str) -> Comment {
    Comment {
        id,
        blog_id: 1,
        content: content.into(),
        user_id: 5,
        user_name: "ann".into(),
        parent_comment_id: parent,
        created_at: "2024-05-01T10:00:00".into(),
        last_updated_at: None,
        is_optimistic: false,
    }
}
