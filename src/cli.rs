//! Command line front end: each subcommand drives one of the frontend views
//! the way a page would, then prints the resulting state.

use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::debug;
use thiserror::Error;

use blog_app_frontend::comment_tree::CommentNode;
use blog_app_frontend::connection::BlogApi;
use blog_app_frontend::error::{ApiError, FormError, StorageError};
use blog_app_frontend::load_state::LoadState;
use blog_app_frontend::models::{BlogForm, BlogItem, LoginRequest, ReactionState, Visibility};
use blog_app_frontend::persisted::TokenStorage;
use blog_app_frontend::reaction::Reaction;
use blog_app_frontend::validation::RegisterForm;
use blog_app_frontend::views::{App, BlogPageView, Outcome};
use blog_app_frontend::{BlogId, CommentId, API_BASE_URL, DEFAULT_PAGE_SIZE};

use crate::config::DEFAULT_TOKEN_FILE;

#[derive(Parser, Debug)]
#[command(name = "blog_app")]
#[command(about = "Read, write and discuss blogs from the terminal")]
pub struct Cli {
    /// Base URL of the blog API
    #[arg(long, env = "BLOG_API_URL", default_value = API_BASE_URL)]
    pub api_url: String,

    /// Blogs per page
    #[arg(long, env = "BLOG_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: u32,

    /// Hold finished page loads back this long (milliseconds)
    #[arg(long, env = "BLOG_LOADING_DELAY_MS")]
    pub loading_delay_ms: Option<u64>,

    /// Where the login token is kept between runs
    #[arg(long, env = "BLOG_TOKEN_FILE", default_value = DEFAULT_TOKEN_FILE)]
    pub token_file: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List public blogs
    List {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// List your own blogs
    Mine {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Show one blog with its comments
    Show { id: BlogId },
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long)]
        password: String,
    },
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        #[arg(long)]
        agree_terms: bool,
    },
    Logout,
    /// Toggle your like on a blog
    Like { id: BlogId },
    /// Toggle your dislike on a blog
    Dislike { id: BlogId },
    /// Comment on a blog, or reply to a comment with --reply-to
    Comment {
        blog_id: BlogId,
        content: String,
        #[arg(long)]
        reply_to: Option<CommentId>,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        category: i64,
        #[arg(long)]
        private: bool,
    },
    /// Edit a blog; fields left out keep their current value
    Update {
        id: BlogId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long)]
        private: Option<bool>,
    },
    Delete { id: BlogId },
    Categories,
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("output failed: {0}")]
    Io(#[from] io::Error),
    #[error("{0}")]
    Rejected(&'static str),
}

fn outcome(result: Outcome, skipped: &'static str) -> Result<(), CliError> {
    match result {
        Outcome::Confirmed => Ok(()),
        Outcome::RolledBack => Err(CliError::Rejected("the server did not accept the change")),
        Outcome::Skipped => Err(CliError::Rejected(skipped)),
    }
}

fn loaded<T>(state: LoadState<T>) -> Result<T, CliError> {
    match state {
        LoadState::Success(data) => Ok(data),
        LoadState::Error(err) => Err(err.into()),
        LoadState::Loading => Err(CliError::Rejected("still loading")),
    }
}

pub fn render_blog(blog: &BlogItem) -> String {
    let mark = match blog.user_reaction {
        ReactionState::Liked => " (liked)",
        ReactionState::Disliked => " (disliked)",
        ReactionState::Neutral => "",
    };
    let visibility = if blog.is_public() { "" } else { " [private]" };
    format!(
        "#{} {}{} by {} in {} | +{} -{}{}",
        blog.id,
        blog.title,
        visibility,
        blog.author_name,
        blog.category_name,
        blog.like_counts,
        blog.dislike_counts,
        mark
    )
}

pub fn render_comments(nodes: &[CommentNode], depth: usize, out: &mut impl Write) -> io::Result<()> {
    for node in nodes {
        let comment = &node.comment;
        let sending = if comment.is_optimistic { " (sending)" } else { "" };
        writeln!(
            out,
            "{:indent$}[{}] {}: {}{}",
            "",
            comment.id,
            comment.user_name,
            comment.content,
            sending,
            indent = depth * 2
        )?;
        render_comments(&node.replies, depth + 1, out)?;
    }
    Ok(())
}

async fn open_page<A: BlogApi>(view: &BlogPageView<A>, page: u32) {
    let page = page.max(1);
    if view.page() == page {
        view.refresh().await;
    } else {
        view.load_page(page).await;
    }
}

pub fn render_page<A: BlogApi>(view: &BlogPageView<A>, out: &mut impl Write) -> Result<(), CliError> {
    let page = loaded(view.state().get_cloned())?;
    if page.items.is_empty() {
        writeln!(out, "no blogs yet")?;
    }
    for blog in &page.items {
        writeln!(out, "{}", render_blog(blog))?;
    }
    let window: Vec<String> = view
        .window()
        .into_iter()
        .map(|n| if n == view.page() { format!("[{}]", n) } else { n.to_string() })
        .collect();
    writeln!(
        out,
        "page {} of {} ({} blogs): {}",
        view.page(),
        page.total_pages,
        page.total_count,
        window.join(" ")
    )?;
    Ok(())
}

pub async fn run<A: BlogApi, S: TokenStorage>(
    app: &App<A, S>,
    command: Command,
    out: &mut impl Write,
) -> Result<(), CliError> {
    debug!("running {:?}", command);
    match command {
        Command::List { page } => {
            let view = app.blogs();
            open_page(&view, page).await;
            render_page(&view, out)
        }
        Command::Mine { page } => {
            let view = app.my_blogs()?;
            open_page(&view, page).await;
            render_page(&view, out)
        }
        Command::Show { id } => {
            let view = app.blog_detail(id);
            view.load().await;
            let blog = loaded(view.state().get_cloned())?;
            writeln!(out, "{}", render_blog(&blog))?;
            writeln!(out, "{}", blog.description)?;
            match view.comments().state().get_cloned() {
                LoadState::Error(err) => writeln!(out, "comments unavailable: {}", err)?,
                _ => render_comments(&view.comments().tree(), 0, out)?,
            }
            Ok(())
        }
        Command::Login { email, password } => {
            let identity = app.auth().login(&LoginRequest { email, password }).await?;
            writeln!(out, "logged in as {}", identity.display_name())?;
            Ok(())
        }
        Command::Register {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
            agree_terms,
        } => {
            let form = RegisterForm {
                first_name,
                last_name,
                email,
                password,
                confirm_password,
                agree_terms,
            };
            app.auth().register(&form).await?;
            Ok(())
        }
        Command::Logout => {
            app.auth().logout()?;
            writeln!(out, "logged out")?;
            Ok(())
        }
        Command::Like { id } => react(app, id, Reaction::Like, out).await,
        Command::Dislike { id } => react(app, id, Reaction::Dislike, out).await,
        Command::Comment {
            blog_id,
            content,
            reply_to,
        } => {
            app.require_login()?;
            let view = app.blog_detail(blog_id);
            view.comments().load().await;
            let result = match reply_to {
                Some(parent) => view.comments().reply(parent, &content).await,
                None => view.comments().post(&content).await,
            };
            outcome(result, "nothing to post")?;
            render_comments(&view.comments().tree(), 0, out)?;
            Ok(())
        }
        Command::Create {
            title,
            description,
            category,
            private,
        } => {
            let form = BlogForm {
                title,
                description,
                category_id: category,
                blog_visibility: Some(if private {
                    Visibility::Private
                } else {
                    Visibility::Public
                }),
            };
            app.editor()?.create(&form).await?;
            Ok(())
        }
        Command::Update {
            id,
            title,
            description,
            category,
            private,
        } => {
            let editor = app.editor()?;
            editor.load_form(id).await;
            let mut form = loaded(editor.form().get_cloned())?;
            if let Some(title) = title {
                form.title = title;
            }
            if let Some(description) = description {
                form.description = description;
            }
            if let Some(category) = category {
                form.category_id = category;
            }
            if let Some(private) = private {
                form.blog_visibility = Some(if private {
                    Visibility::Private
                } else {
                    Visibility::Public
                });
            }
            editor.update(id, &form).await?;
            Ok(())
        }
        Command::Delete { id } => {
            app.editor()?.delete(id).await?;
            Ok(())
        }
        Command::Categories => {
            for category in app.categories().load().await {
                writeln!(out, "{}\t{}", category.id, category.name)?;
            }
            Ok(())
        }
    }
}

async fn react<A: BlogApi, S: TokenStorage>(
    app: &App<A, S>,
    id: BlogId,
    reaction: Reaction,
    out: &mut impl Write,
) -> Result<(), CliError> {
    app.require_login()?;
    let view = app.blog_detail(id);
    view.load().await;
    loaded(view.state().get_cloned())?;
    outcome(view.react(reaction).await, "the blog is not loaded")?;
    if let Some(blog) = view.blog() {
        writeln!(out, "{}", render_blog(&blog))?;
    }
    Ok(())
}
