//! The signed-in user, held as an explicit context object instead of ambient
//! global state. `initialize` reads the persisted token, `teardown` forgets it.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use log::debug;
use serde_json::Value;

use crate::error::StorageError;
use crate::persisted::TokenStorage;
use crate::{UserId, TOKEN_LOCAL_STORAGE_KEY};

pub const NAME_IDENTIFIER_CLAIM: &'static str =
    "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/nameidentifier";
pub const NAME_CLAIM: &'static str = "http://schemas.xmlsoap.org/ws/2005/05/identity/claims/name";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub user_name: Option<String>,
}

impl Identity {
    pub fn display_name(&self) -> &str {
        self.user_name.as_deref().unwrap_or("You")
    }
}

/// Reads the claims segment of a JWT. Signatures are the server's business;
/// anything that doesn't decode is simply anonymous.
pub fn decode_identity(token: &str) -> Option<Identity> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|err| debug!("token payload is not base64: {}", err))
        .ok()?;
    let claims: Value = serde_json::from_slice(&bytes)
        .map_err(|err| debug!("token payload is not json: {}", err))
        .ok()?;

    let user_id = match claims.get(NAME_IDENTIFIER_CLAIM)? {
        Value::String(id) => id.parse().ok()?,
        Value::Number(id) => id.as_i64()?,
        _ => return None,
    };
    let user_name = claims
        .get(NAME_CLAIM)
        .and_then(Value::as_str)
        .map(str::to_owned);

    Some(Identity { user_id, user_name })
}

pub struct Session<S: TokenStorage> {
    storage: S,
    token: Option<String>,
    identity: Option<Identity>,
}

impl<S: TokenStorage> Session<S> {
    pub fn new(storage: S) -> Self {
        Session {
            storage,
            token: None,
            identity: None,
        }
    }

    pub fn initialize(&mut self) {
        self.token = self.storage.get_item(TOKEN_LOCAL_STORAGE_KEY);
        self.identity = self.token.as_deref().and_then(decode_identity);
        if self.token.is_some() && self.identity.is_none() {
            debug!("stored token could not be decoded, continuing anonymously");
        }
    }

    pub fn sign_in(&mut self, token: String) -> Result<(), StorageError> {
        self.storage.set_item(TOKEN_LOCAL_STORAGE_KEY, &token)?;
        self.identity = decode_identity(&token);
        self.token = Some(token);
        Ok(())
    }

    pub fn teardown(&mut self) -> Result<(), StorageError> {
        self.token = None;
        self.identity = None;
        self.storage.clear()
    }

    pub fn is_logged_in(&self) -> bool {
        self.identity.is_some()
    }

    /// The bearer token, but only when it decodes to a usable identity.
    pub fn token(&self) -> Option<&str> {
        self.identity.as_ref().and(self.token.as_deref())
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.identity.as_ref().map(|identity| identity.user_id)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

#[cfg(test)]
pub(crate) fn make_token(claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{}.{}.signature", header, payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persisted::MemoryStorage;
    use serde_json::json;

    #[test]
    fn decodes_string_and_numeric_ids() {
        let token = make_token(&json!({ (NAME_IDENTIFIER_CLAIM): "42", (NAME_CLAIM): "Ada" }));
        assert_eq!(
            decode_identity(&token),
            Some(Identity {
                user_id: 42,
                user_name: Some("Ada".into()),
            })
        );

        let token = make_token(&json!({ (NAME_IDENTIFIER_CLAIM): 7 }));
        assert_eq!(decode_identity(&token).map(|id| id.user_id), Some(7));
    }

    #[test]
    fn malformed_tokens_are_anonymous() {
        assert_eq!(decode_identity(""), None);
        assert_eq!(decode_identity("not-a-jwt"), None);
        assert_eq!(decode_identity("a.%%%.c"), None);
        let no_claim = make_token(&json!({ "sub": "x" }));
        assert_eq!(decode_identity(&no_claim), None);
        let bad_id = make_token(&json!({ (NAME_IDENTIFIER_CLAIM): "abc" }));
        assert_eq!(decode_identity(&bad_id), None);
    }

    #[test]
    fn initialize_reads_persisted_token() {
        let storage = MemoryStorage::new();
        let token = make_token(&json!({ (NAME_IDENTIFIER_CLAIM): "3" }));
        storage.set_item(TOKEN_LOCAL_STORAGE_KEY, &token).unwrap();

        let mut session = Session::new(storage);
        assert!(!session.is_logged_in());
        session.initialize();
        assert!(session.is_logged_in());
        assert_eq!(session.user_id(), Some(3));
        assert_eq!(session.token(), Some(token.as_str()));
    }

    #[test]
    fn garbage_token_leaves_session_anonymous() {
        let storage = MemoryStorage::new();
        storage.set_item(TOKEN_LOCAL_STORAGE_KEY, "garbage").unwrap();

        let mut session = Session::new(storage);
        session.initialize();
        assert!(!session.is_logged_in());
        assert_eq!(session.user_id(), None);
        assert_eq!(session.token(), None);
    }

    #[test]
    fn sign_in_persists_and_teardown_clears() {
        let mut session = Session::new(MemoryStorage::new());
        let token = make_token(&json!({ (NAME_IDENTIFIER_CLAIM): "11" }));
        session.sign_in(token.clone()).unwrap();
        assert_eq!(session.user_id(), Some(11));
        assert_eq!(
            session.storage().get_item(TOKEN_LOCAL_STORAGE_KEY),
            Some(token)
        );

        session.teardown().unwrap();
        assert!(!session.is_logged_in());
        assert_eq!(session.storage().get_item(TOKEN_LOCAL_STORAGE_KEY), None);
    }
}
