use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, info};

use crate::connection::BlogApi;
use crate::error::{ApiError, StorageError};
use crate::notice::Notices;
use crate::persisted::TokenStorage;
use crate::session::{Identity, Session};
use crate::views::{
    AuthView, BlogDetailView, BlogEditor, BlogPageView, BlogSource, CategoryStore, Settings,
};
use crate::BlogId;

/// Everything the pages share: one connection, one session, one notice
/// queue. Nothing is read from storage until `initialize`.
pub struct App<A: BlogApi, S: TokenStorage> {
    api: Rc<A>,
    session: Rc<RefCell<Session<S>>>,
    notices: Notices,
    settings: Settings,
    categories: Rc<CategoryStore<A>>,
}

impl<A: BlogApi, S: TokenStorage> App<A, S> {
    pub fn new(api: A, storage: S, settings: Settings) -> Self {
        let api = Rc::new(api);
        App {
            categories: Rc::new(CategoryStore::new(api.clone())),
            api,
            session: Rc::new(RefCell::new(Session::new(storage))),
            notices: Notices::new(),
            settings,
        }
    }

    /// Restores a stored session and authorizes the connection with it.
    pub fn initialize(&self) {
        let mut session = self.session.borrow_mut();
        session.initialize();
        self.api.authorize(session.token().map(str::to_owned));
        match session.identity() {
            Some(identity) => info!("restored session for user {}", identity.user_id),
            None => debug!("starting anonymously"),
        }
    }

    pub fn teardown(&self) -> Result<(), StorageError> {
        self.api.authorize(None);
        self.session.borrow_mut().teardown()
    }

    pub fn api(&self) -> &Rc<A> {
        &self.api
    }

    pub fn session(&self) -> &Rc<RefCell<Session<S>>> {
        &self.session
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    pub fn is_logged_in(&self) -> bool {
        self.session.borrow().is_logged_in()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.session.borrow().identity().cloned()
    }

    /// Guard for pages that only make sense signed in.
    pub fn require_login(&self) -> Result<Identity, ApiError> {
        match self.identity() {
            Some(identity) => Ok(identity),
            None => {
                self.notices.error("Please log in first");
                Err(ApiError::Unauthenticated)
            }
        }
    }

    pub fn blogs(&self) -> BlogPageView<A> {
        BlogPageView::new(
            self.api.clone(),
            BlogSource::All,
            self.settings,
            self.notices.clone(),
        )
    }

    pub fn my_blogs(&self) -> Result<BlogPageView<A>, ApiError> {
        let identity = self.require_login()?;
        Ok(BlogPageView::new(
            self.api.clone(),
            BlogSource::User(identity.user_id),
            self.settings,
            self.notices.clone(),
        ))
    }

    pub fn blog_detail(&self, blog_id: BlogId) -> BlogDetailView<A> {
        BlogDetailView::new(
            self.api.clone(),
            blog_id,
            self.identity(),
            self.notices.clone(),
        )
    }

    pub fn editor(&self) -> Result<BlogEditor<A>, ApiError> {
        self.require_login()?;
        Ok(BlogEditor::new(self.api.clone(), self.notices.clone()))
    }

    pub fn categories(&self) -> Rc<CategoryStore<A>> {
        self.categories.clone()
    }

    pub fn auth(&self) -> AuthView<A, S> {
        AuthView::new(self.api.clone(), self.session.clone(), self.notices.clone())
    }
}
