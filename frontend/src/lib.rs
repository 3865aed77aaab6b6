extern crate serde;
#[macro_use]
extern crate serde_derive;

pub mod comment_tree;
pub mod connection;
pub mod error;
pub mod load_state;
pub mod models;
pub mod notice;
pub mod operators;
pub mod pagination;
pub mod persisted;
pub mod query_result;
pub mod reaction;
pub mod session;
pub mod validation;
pub mod views;

use std::time::Duration;

pub const API_BASE_URL: &'static str = "http://localhost:5105";
pub const TOKEN_LOCAL_STORAGE_KEY: &'static str = "token";
pub const DEFAULT_PAGE_SIZE: u32 = 6;

// how long a finished page fetch is held back so the loading state stays visible
pub const LOADING_DELAY: Duration = Duration::from_millis(2000);

pub type BlogId = i64;
pub type CommentId = i64;
pub type UserId = i64;

#[cfg(target_arch = "wasm32")]
mod bootstrap {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen]
    pub fn bootstrap() {
        std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    }
}
