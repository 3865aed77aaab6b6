use std::cell::RefCell;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ApiError;
use crate::models::{
    BlogForm, BlogItem, Category, Comment, LoginRequest, PaginatedResult, PostCommentRequest,
    ReactRequest, ReactionState, RegisterRequest,
};
use crate::query_result::{ApiFailure, ApiResponse, ReactionSummary, TokenPayload};
use crate::{BlogId, CommentId, UserId};

/// The REST surface the views talk to. Futures are not `Send`: everything
/// runs on the one UI thread, and in the browser the request futures can't
/// leave it anyway.
#[async_trait(?Send)]
pub trait BlogApi {
    /// Attach (or drop, with `None`) the bearer token sent with every request.
    fn authorize(&self, token: Option<String>);

    async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError>;
    async fn login(&self, request: &LoginRequest) -> Result<String, ApiError>;

    async fn blogs(&self, page: u32, page_size: u32)
        -> Result<PaginatedResult<BlogItem>, ApiError>;
    async fn user_blogs(
        &self,
        user_id: UserId,
        page: u32,
        page_size: u32,
    ) -> Result<PaginatedResult<BlogItem>, ApiError>;
    async fn blog(&self, id: BlogId) -> Result<BlogItem, ApiError>;
    async fn create_blog(&self, form: &BlogForm) -> Result<Option<String>, ApiError>;
    async fn update_blog(&self, id: BlogId, form: &BlogForm) -> Result<Option<String>, ApiError>;
    async fn delete_blog(&self, id: BlogId) -> Result<(), ApiError>;

    async fn react(&self, blog_id: BlogId, reaction: ReactionState)
        -> Result<ReactionSummary, ApiError>;

    async fn post_comment(
        &self,
        blog_id: BlogId,
        content: &str,
        parent: Option<CommentId>,
    ) -> Result<Comment, ApiError>;
    async fn comments(&self, blog_id: BlogId) -> Result<Vec<Comment>, ApiError>;

    async fn categories(&self) -> Result<Vec<Category>, ApiError>;
}

pub struct Connection {
    base_url: String,
    client: Client,
    token: RefCell<Option<String>>,
}

impl Connection {
    pub fn new(base_url: &str) -> Self {
        Connection {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client: Client::new(),
            token: RefCell::new(None),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let builder = self.client.request(method, url);
        match self.token.borrow().as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthenticated);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiFailure>(&body)
            .ok()
            .and_then(|failure| failure.message)
            .unwrap_or(body);

        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn data<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let response = self.send(builder).await?;
        let envelope: ApiResponse<T> = response.json().await?;
        Ok(envelope.data)
    }

    // mutations answer with `{ message }` and sometimes no body at all
    async fn message(&self, builder: RequestBuilder) -> Result<Option<String>, ApiError> {
        let response = self.send(builder).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(serde_json::from_str::<ApiFailure>(&body)
            .ok()
            .and_then(|reply| reply.message))
    }

    fn json<B: Serialize + ?Sized>(&self, method: Method, path: &str, body: &B) -> RequestBuilder {
        self.request(method, path).json(body)
    }

    fn paged(&self, path: &str, page: u32, page_size: u32) -> RequestBuilder {
        self.request(Method::GET, path).query(&[
            ("pageNumber", page.to_string()),
            ("pageSize", page_size.to_string()),
        ])
    }
}

#[async_trait(?Send)]
impl BlogApi for Connection {
    fn authorize(&self, token: Option<String>) {
        *self.token.borrow_mut() = token;
    }

    async fn register(&self, request: &RegisterRequest) -> Result<(), ApiError> {
        self.message(self.json(Method::POST, "/api/Auth/register", request))
            .await
            .map(|_| ())
    }

    async fn login(&self, request: &LoginRequest) -> Result<String, ApiError> {
        let payload: TokenPayload = self
            .data(self.json(Method::POST, "/api/Auth/login", request))
            .await?;
        Ok(payload.token)
    }

    async fn blogs(
        &self,
        page: u32,
        page_size: u32,
    ) -> Result<PaginatedResult<BlogItem>, ApiError> {
        self.data(self.paged("/api/Blog", page, page_size)).await
    }

    async fn user_blogs(
        &self,
        user_id: UserId,
        page: u32,
        page_size: u32,
    ) -> Result<PaginatedResult<BlogItem>, ApiError> {
        let path = format!("/api/blog/userBlogs/{}", user_id);
        self.data(self.paged(&path, page, page_size)).await
    }

    async fn blog(&self, id: BlogId) -> Result<BlogItem, ApiError> {
        self.data(self.request(Method::GET, &format!("/blog/{}", id)))
            .await
    }

    async fn create_blog(&self, form: &BlogForm) -> Result<Option<String>, ApiError> {
        self.message(self.json(Method::POST, "/api/Blog", form)).await
    }

    async fn update_blog(&self, id: BlogId, form: &BlogForm) -> Result<Option<String>, ApiError> {
        let path = format!("/api/Blog/{}", id);
        self.message(self.json(Method::PUT, &path, form)).await
    }

    async fn delete_blog(&self, id: BlogId) -> Result<(), ApiError> {
        let path = format!("/api/Blog/{}", id);
        self.message(self.request(Method::DELETE, &path))
            .await
            .map(|_| ())
    }

    async fn react(
        &self,
        blog_id: BlogId,
        reaction: ReactionState,
    ) -> Result<ReactionSummary, ApiError> {
        let body = ReactRequest {
            blog_id,
            reaction_type: reaction,
        };
        self.data(self.json(Method::POST, "/api/BlogReaction/react", &body))
            .await
    }

    async fn post_comment(
        &self,
        blog_id: BlogId,
        content: &str,
        parent: Option<CommentId>,
    ) -> Result<Comment, ApiError> {
        let body = PostCommentRequest {
            blog_id,
            content: content.to_owned(),
            parent_comment_id: parent,
        };
        self.data(self.json(Method::POST, "/api/Comment/comment", &body))
            .await
    }

    async fn comments(&self, blog_id: BlogId) -> Result<Vec<Comment>, ApiError> {
        let path = format!("/api/Comment/{}/comments", blog_id);
        self.data(self.request(Method::GET, &path)).await
    }

    async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        self.data(self.request(Method::GET, "/api/Categories")).await
    }
}
