use serde::{Deserialize, Deserializer};

use crate::{BlogId, CommentId, UserId};

/// The viewer's own reaction to a blog. On the wire this is the server's
/// `ReactionType` integer where `2` means "no reaction".
#[derive(Hash, Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(try_from = "u8", into = "u8")]
pub enum ReactionState {
    Liked,
    Disliked,
    #[default]
    Neutral,
}

impl From<ReactionState> for u8 {
    fn from(state: ReactionState) -> u8 {
        match state {
            ReactionState::Liked => 0,
            ReactionState::Disliked => 1,
            ReactionState::Neutral => 2,
        }
    }
}

impl TryFrom<u8> for ReactionState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ReactionState::Liked),
            1 => Ok(ReactionState::Disliked),
            2 => Ok(ReactionState::Neutral),
            other => Err(format!("unknown reaction type {}", other)),
        }
    }
}

#[derive(Hash, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlogItem {
    pub id: BlogId,
    pub title: String,
    pub description: String,
    pub blog_visibility: u8,
    pub category_id: i64,
    #[serde(default)]
    pub category_name: String,
    pub author_id: UserId,
    #[serde(default)]
    pub author_name: String,
    pub created_at: String,
    #[serde(default)]
    pub last_updated_at: Option<String>,
    #[serde(default)]
    pub like_counts: u32,
    #[serde(default)]
    pub dislike_counts: u32,
    #[serde(default)]
    pub user_reaction: ReactionState,
}

impl BlogItem {
    pub fn is_public(&self) -> bool {
        self.blog_visibility == 0
    }
}

#[derive(Hash, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub blog_id: BlogId,
    pub content: String,
    pub user_id: UserId,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub parent_comment_id: Option<CommentId>,
    pub created_at: String,
    #[serde(default)]
    pub last_updated_at: Option<String>,
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_optimistic: bool,
}

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_count: u32,
    pub total_pages: u32,
}

#[derive(Hash, Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    #[serde(alias = "Id")]
    pub id: i64,
    #[serde(alias = "Name")]
    pub name: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn from_code(code: u8) -> Self {
        if code == 0 {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }
}

/// Body for both create and update; the server takes visibility as a string.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BlogForm {
    pub title: String,
    pub description: String,
    pub category_id: i64,
    pub blog_visibility: Option<Visibility>,
}

impl From<&BlogItem> for BlogForm {
    fn from(blog: &BlogItem) -> Self {
        BlogForm {
            title: blog.title.clone(),
            description: blog.description.clone(),
            category_id: blog.category_id,
            blog_visibility: Some(Visibility::from_code(blog.blog_visibility)),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ReactRequest {
    pub blog_id: BlogId,
    pub reaction_type: ReactionState,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PostCommentRequest {
    pub blog_id: BlogId,
    pub content: String,
    pub parent_comment_id: Option<CommentId>,
}
