use futures_signals::signal::{Mutable, Signal};
use log::info;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Messages for the user (toasts in the browser, stderr in the shell).
#[derive(Clone)]
pub struct Notices {
    queue: Mutable<Vec<Notice>>,
}

impl Default for Notices {
    fn default() -> Self {
        Notices {
            queue: Mutable::new(Vec::new()),
        }
    }
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, level: NoticeLevel, message: impl Into<String>) {
        let notice = Notice {
            level,
            message: message.into(),
        };
        info!("notice {:?}: {}", notice.level, notice.message);
        self.queue.lock_mut().push(notice);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Info, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Error, message);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(NoticeLevel::Success, message);
    }

    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.queue.lock_mut())
    }

    /// Pending notices, for a toast area to render from.
    pub fn signal(&self) -> impl Signal<Item = Vec<Notice>> {
        self.queue.signal_cloned()
    }
}
