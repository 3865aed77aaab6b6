use std::rc::Rc;
use std::time::Duration;

use futures_signals::signal::Mutable;
use log::{info, warn};

use crate::connection::BlogApi;
use crate::error::{ApiError, FormError};
use crate::load_state::{load_state, LoadState};
use crate::models::BlogForm;
use crate::notice::Notices;
use crate::validation::validate_blog;
use crate::BlogId;

/// Create and edit forms. Nothing reaches the server until the form passes
/// `validate_blog`.
pub struct BlogEditor<A: BlogApi> {
    api: Rc<A>,
    form: Mutable<LoadState<BlogForm>>,
    notices: Notices,
}

impl<A: BlogApi> BlogEditor<A> {
    pub fn new(api: Rc<A>, notices: Notices) -> Self {
        BlogEditor {
            api,
            form: Mutable::new(LoadState::Success(BlogForm::default())),
            notices,
        }
    }

    pub fn form(&self) -> &Mutable<LoadState<BlogForm>> {
        &self.form
    }

    /// Prefills the form from an existing blog.
    pub async fn load_form(&self, blog_id: BlogId) {
        let fetch = async {
            let blog = self.api.blog(blog_id).await?;
            Ok::<_, ApiError>(BlogForm::from(&blog))
        };
        load_state(fetch, Duration::ZERO, |state| self.form.set(state)).await;
    }

    pub async fn create(&self, form: &BlogForm) -> Result<(), FormError> {
        validate_blog(form)?;
        let message = self.api.create_blog(form).await.map_err(|err| self.failed(err))?;
        info!("created blog {:?}", form.title);
        self.notices
            .success(message.unwrap_or_else(|| "Blog created".to_owned()));
        Ok(())
    }

    pub async fn update(&self, blog_id: BlogId, form: &BlogForm) -> Result<(), FormError> {
        validate_blog(form)?;
        let message = self
            .api
            .update_blog(blog_id, form)
            .await
            .map_err(|err| self.failed(err))?;
        info!("updated blog {}", blog_id);
        self.notices
            .success(message.unwrap_or_else(|| "Blog updated".to_owned()));
        Ok(())
    }

    pub async fn delete(&self, blog_id: BlogId) -> Result<(), ApiError> {
        self.api
            .delete_blog(blog_id)
            .await
            .map_err(|err| self.failed(err))?;
        self.notices.success("Blog deleted");
        Ok(())
    }

    fn failed(&self, err: ApiError) -> ApiError {
        warn!("blog request failed: {}", err);
        self.notices.error(err.to_string());
        err
    }
}
