extern crate blog_app;
extern crate blog_app_frontend;
extern crate tokio;

use std::io;

use clap::Parser;

use blog_app::cli::{self, Cli, CliError};
use blog_app::config::Config;
use blog_app_frontend::connection::Connection;
use blog_app_frontend::notice::NoticeLevel;
use blog_app_frontend::persisted::FileStorage;
use blog_app_frontend::views::App;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), CliError> {
    blog_app::init_logger();
    let cli = Cli::parse();
    let config = Config::from(&cli);

    let app = App::new(
        Connection::new(&config.api_base_url),
        FileStorage::new(&config.token_file),
        config.settings,
    );
    app.initialize();

    let stdout = io::stdout();
    let result = cli::run(&app, cli.command, &mut stdout.lock()).await;

    for notice in app.notices().drain() {
        match notice.level {
            NoticeLevel::Error => eprintln!("error: {}", notice.message),
            _ => eprintln!("{}", notice.message),
        }
    }
    result
}
