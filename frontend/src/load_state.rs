use std::future::Future;
use std::time::Duration;

use futures_timer::Delay;
use log::{debug, warn};

use crate::error::ApiError;

/// Status of one asynchronous fetch, replaced wholesale on every emission.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState<T, E = ApiError> {
    Loading,
    Success(T),
    Error(E),
}

impl<T, E> Default for LoadState<T, E> {
    fn default() -> Self {
        LoadState::Loading
    }
}

impl<T, E> LoadState<T, E> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            LoadState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn data_mut(&mut self) -> Option<&mut T> {
        match self {
            LoadState::Success(data) => Some(data),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            LoadState::Error(err) => Some(err),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LoadState<U, E> {
        match self {
            LoadState::Loading => LoadState::Loading,
            LoadState::Success(data) => LoadState::Success(f(data)),
            LoadState::Error(err) => LoadState::Error(err),
        }
    }
}

/// Runs `producer` and reports its progress through `emit`: `Loading` right
/// away, then `Success` once the value is ready and `success_delay` has
/// passed, or `Error` as soon as the producer fails. Failures never escape.
pub async fn load_state<T, E, F>(
    producer: F,
    success_delay: Duration,
    mut emit: impl FnMut(LoadState<T, E>),
) where
    F: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    emit(LoadState::Loading);

    match producer.await {
        Ok(data) => {
            if !success_delay.is_zero() {
                Delay::new(success_delay).await;
            }
            debug!("load finished");
            emit(LoadState::Success(data));
        }
        Err(err) => {
            warn!("load failed: {}", err);
            emit(LoadState::Error(err));
        }
    }
}
