use std::cell::RefCell;
use std::rc::Rc;

use log::{info, warn};

use crate::connection::BlogApi;
use crate::error::{ApiError, FormError};
use crate::models::LoginRequest;
use crate::notice::Notices;
use crate::persisted::TokenStorage;
use crate::session::{Identity, Session};
use crate::validation::{validate_login, RegisterForm};

pub struct AuthView<A: BlogApi, S: TokenStorage> {
    api: Rc<A>,
    session: Rc<RefCell<Session<S>>>,
    notices: Notices,
}

impl<A: BlogApi, S: TokenStorage> AuthView<A, S> {
    pub fn new(api: Rc<A>, session: Rc<RefCell<Session<S>>>, notices: Notices) -> Self {
        AuthView {
            api,
            session,
            notices,
        }
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<(), FormError> {
        let request = form.validate()?;
        self.api.register(&request).await.map_err(|err| {
            warn!("registration failed: {}", err);
            self.notices.error(err.to_string());
            err
        })?;
        self.notices.success("Registration successful, please log in");
        Ok(())
    }

    /// Signs in, persists the token and starts sending it with every request.
    /// A token the client cannot read an identity from is refused. While a
    /// session is active nothing is sent and the current identity is kept.
    pub async fn login(&self, request: &LoginRequest) -> Result<Identity, FormError> {
        if let Some(identity) = self.session.borrow().identity() {
            info!("login skipped, user {} is signed in", identity.user_id);
            self.notices.info("You are already logged in");
            return Ok(identity.clone());
        }
        validate_login(request)?;
        let token = self.api.login(request).await.map_err(|err| {
            warn!("login failed: {}", err);
            self.notices.error("Invalid email or password");
            err
        })?;

        let mut session = self.session.borrow_mut();
        session.sign_in(token)?;
        let identity = match session.identity() {
            Some(identity) => identity.clone(),
            None => {
                warn!("login returned a token without an identity");
                session.teardown()?;
                return Err(ApiError::Unauthenticated.into());
            }
        };
        self.api.authorize(session.token().map(str::to_owned));

        info!("logged in as user {}", identity.user_id);
        self.notices
            .success(format!("Welcome, {}", identity.display_name()));
        Ok(identity)
    }

    pub fn logout(&self) -> Result<(), FormError> {
        self.api.authorize(None);
        self.session.borrow_mut().teardown()?;
        info!("logged out");
        Ok(())
    }
}
