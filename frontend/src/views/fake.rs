//! Scripted `BlogApi` for view tests. Reactions and comment posts wait on a
//! oneshot per call so tests decide when (and how) each one answers.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use futures::channel::oneshot;

use crate::connection::BlogApi;
use crate::error::ApiError;
use crate::models::{
    BlogForm, BlogItem, Category, Comment, LoginRequest, PaginatedResult, ReactionState,
    RegisterRequest,
};
use crate::query_result::ReactionSummary;
use crate::{BlogId, CommentId, UserId};

type Reply<T> = oneshot::Receiver<Result<T, ApiError>>;

#[derive(Default)]
pub(crate) struct FakeApi {
    pub pages: RefCell<HashMap<u32, Result<PaginatedResult<BlogItem>, ApiError>>>,
    pub page_gates: RefCell<HashMap<u32, oneshot::Receiver<()>>>,
    pub blog: RefCell<Option<Result<BlogItem, ApiError>>>,
    pub comments: RefCell<Option<Result<Vec<Comment>, ApiError>>>,
    pub categories: RefCell<Option<Result<Vec<Category>, ApiError>>>,
    pub login_token: RefCell<Option<Result<String, ApiError>>>,
    pub reactions: RefCell<VecDeque<Reply<ReactionSummary>>>,
    pub posts: RefCell<VecDeque<Reply<Comment>>>,
    pub token: RefCell<Option<String>>,
    pub calls: RefCell<Vec<String>>,
}

pub(crate) fn page_of(items: Vec<BlogItem>, page: u32, total_pages: u32) -> PaginatedResult<BlogItem> {
    PaginatedResult {
        total_count: items.len() as u32 * total_pages,
        page_size: items.len() as u32,
        items,
        page_number: page,
        total_pages,
    }
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve_page(&self, page: u32, result: Result<PaginatedResult<BlogItem>, ApiError>) {
        self.pages.borrow_mut().insert(page, result);
    }

    /// Holds the answer for `page` until the returned sender fires.
    pub fn gate_page(&self, page: u32) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.page_gates.borrow_mut().insert(page, rx);
        tx
    }

    pub fn next_reaction(&self) -> oneshot::Sender<Result<ReactionSummary, ApiError>> {
        let (tx, rx) = oneshot::channel();
        self.reactions.borrow_mut().push_back(rx);
        tx
    }

    pub fn next_post(&self) -> oneshot::Sender<Result<Comment, ApiError>> {
        let (tx, rx) = oneshot::channel();
        self.posts.borrow_mut().push_back(rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    async fn page(&self, page: u32) -> Result<PaginatedResult<BlogItem>, ApiError> {
        let gate = self.page_gates.borrow_mut().remove(&page);
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.pages
            .borrow()
            .get(&page)
            .cloned()
            .unwrap_or_else(|| Err(ApiError::Status {
                status: 404,
                message: format!("no page {}", page),
            }))
    }
}

async fn answer<T>(reply: Option<Reply<T>>) -> Result<T, ApiError> {
    match reply {
        Some(reply) => reply
            .await
            .unwrap_or_else(|_| Err(ApiError::Network("reply dropped".into()))),
        None => Err(ApiError::Network("nothing scripted".into())),
    }
}

fn scripted<T: Clone>(slot: &RefCell<Option<Result<T, ApiError>>>) -> Result<T, ApiError> {
    slot.borrow()
        .clone()
        .unwrap_or_else(|| Err(ApiError::Network("nothing scripted".into())))
}

#[async_trait(?Send)]
impl BlogApi for FakeApi {
    fn authorize(&self, token: Option<String>) {
        *self.token.borrow_mut() = token;
    }

    async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        self.record(format!("register {}", request.full_name));
        Ok(())
    }

    async fn login(&self, request: &LoginRequest) -> Result<String, ApiError> {
        self.record(format!("login {}", request.email));
        scripted(&self.login_token)
    }

    async fn blogs(&self, page: u32, page_size: u32) -> Result<PaginatedResult<BlogItem>, ApiError> {
        self.record(format!("blogs {} {}", page, page_size));
        self.page(page).await
    }

    async fn user_blogs(
        &self,
        user_id: UserId,
        page: u32,
        page_size: u32,
    ) -> Result<PaginatedResult<BlogItem>, ApiError> {
        self.record(format!("user_blogs {} {} {}", user_id, page, page_size));
        self.page(page).await
    }

    async fn blog(&self, id: BlogId) -> Result<BlogItem, ApiError> {
        self.record(format!("blog {}", id));
        scripted(&self.blog)
    }

    async fn create_blog(&self, form: &BlogForm) -> Result<Option<String>, ApiError> {
        self.record(format!("create {}", form.title));
        Ok(Some("Blog created".into()))
    }

    async fn update_blog(&self, id: BlogId, form: &BlogForm) -> Result<Option<String>, ApiError> {
        self.record(format!("update {} {}", id, form.title));
        Ok(None)
    }

    async fn delete_blog(&self, id: BlogId) -> Result<(), ApiError> {
        self.record(format!("delete {}", id));
        Ok(())
    }

    async fn react(&self, blog_id: BlogId, reaction: ReactionState) -> Result<ReactionSummary, ApiError> {
        self.record(format!("react {} {:?}", blog_id, reaction));
        let reply = self.reactions.borrow_mut().pop_front();
        answer(reply).await
    }

    async fn post_comment(
        &self,
        blog_id: BlogId,
        content: &str,
        parent: Option<CommentId>,
    ) -> Result<Comment, ApiError> {
        self.record(format!("comment {} {:?} {}", blog_id, parent, content));
        let reply = self.posts.borrow_mut().pop_front();
        answer(reply).await
    }

    async fn comments(&self, blog_id: BlogId) -> Result<Vec<Comment>, ApiError> {
        self.record(format!("comments {}", blog_id));
        scripted(&self.comments)
    }

    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.record("categories".into());
        scripted(&self.categories)
    }
}
