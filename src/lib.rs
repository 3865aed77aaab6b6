extern crate blog_app_frontend;
extern crate env_logger;
extern crate log;

pub mod cli;
pub mod config;

use std::io::Write;

pub fn init_logger() {
    // tests call this once per test, only the first one installs the logger
    let _ = env_logger::builder()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .try_init();
}
