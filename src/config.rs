use std::path::PathBuf;
use std::time::Duration;

use blog_app_frontend::views::Settings;
use blog_app_frontend::API_BASE_URL;

use crate::cli::Cli;

pub const DEFAULT_TOKEN_FILE: &'static str = "blog_app_token.json";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub api_base_url: String,
    pub token_file: PathBuf,
    pub settings: Settings,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base_url: API_BASE_URL.to_owned(),
            token_file: PathBuf::from(DEFAULT_TOKEN_FILE),
            settings: Settings::default(),
        }
    }
}

impl From<&Cli> for Config {
    fn from(cli: &Cli) -> Self {
        let defaults = Config::default();
        Config {
            api_base_url: cli.api_url.clone(),
            token_file: cli.token_file.clone(),
            settings: Settings {
                page_size: cli.page_size.max(1),
                loading_delay: cli
                    .loading_delay_ms
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.settings.loading_delay),
            },
        }
    }
}
