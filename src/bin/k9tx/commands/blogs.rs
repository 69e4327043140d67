use std::path::PathBuf;
use std::sync::Arc;

use clap::Subcommand;
use colored::Colorize;
use k9tx_bank_sdk::models::{Attachment, NewBlog};
use k9tx_bank_sdk::{BlogFeedWatcher, CommentThread, FeedEntry, SessionContext, SyncEvent};
use tokio::sync::mpsc;

use crate::error::CliError;
use crate::utils::{confirm, format_timestamp, print_error, print_success, require_user};

#[derive(Subcommand, Clone)]
pub enum BlogCommands {
    /// Show every post with its comments
    List,

    /// Publish a post
    Create {
        #[arg(short, long)]
        title: String,

        #[arg(short, long)]
        content: String,

        /// Path to an image to attach
        #[arg(short, long)]
        image: Option<PathBuf>,
    },

    /// Delete a post (staff only)
    Delete {
        id: i64,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the comments of a post
    Comments { id: i64 },

    /// Comment on a post or reply to a comment
    Comment {
        /// Post to comment on
        blog_id: i64,

        content: String,

        /// Comment to reply to
        #[arg(short, long)]
        reply_to: Option<i64>,
    },

    /// Print the feed every time it refreshes, until Ctrl+C
    Watch,
}

impl BlogCommands {
    pub async fn execute(self, session: &SessionContext) -> Result<(), CliError> {
        require_user(session)?;
        let client = session.client();

        match self {
            BlogCommands::List => {
                let feed = client.blog_feed().await?;
                print_feed(&feed);
            }
            BlogCommands::Create {
                title,
                content,
                image,
            } => {
                let image = match image {
                    Some(path) => Some(Attachment::from_path(&path).await?),
                    None => None,
                };
                let blog = client
                    .create_blog(NewBlog {
                        title,
                        content,
                        image,
                    })
                    .await?;
                print_success(&format!("Published post #{}", blog.id));
            }
            BlogCommands::Delete { id, yes } => {
                if !yes && !confirm(&format!("Delete post #{}?", id))? {
                    println!("Nothing deleted");
                    return Ok(());
                }
                client.delete_blog(id).await?;
                print_success(&format!("Deleted post #{}", id));
            }
            BlogCommands::Comments { id } => {
                let thread = client.comments(id).await?;
                if thread.is_empty() {
                    println!("No comments yet.");
                } else {
                    print_thread(&thread, 0);
                }
            }
            BlogCommands::Comment {
                blog_id,
                content,
                reply_to,
            } => {
                let mut thread = client.comments(blog_id).await?;
                if let Some(parent) = reply_to {
                    if thread.find(parent).is_none() {
                        return Err(CliError::Command(format!(
                            "Comment #{} not found on post #{}",
                            parent, blog_id
                        )));
                    }
                }

                let comment = client.add_comment(blog_id, &content, reply_to).await?;
                thread.insert(comment);
                print_success("Comment posted");
                print_thread(&thread, 0);
            }
            BlogCommands::Watch => watch(session).await?,
        }
        Ok(())
    }
}

async fn watch(session: &SessionContext) -> Result<(), CliError> {
    let (sender, mut receiver) = mpsc::unbounded_channel();
    let mut watcher = BlogFeedWatcher::start(Arc::clone(session.client()), sender);
    println!("Watching the blog feed (Ctrl+C to stop)");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = receiver.recv() => match event {
                Some(SyncEvent::Blogs(feed)) => {
                    println!("{}", format!("--- {} ---", chrono::Local::now().format("%H:%M:%S")).dimmed());
                    print_feed(&feed);
                }
                Some(SyncEvent::Error(message)) => print_error(&message),
                Some(SyncEvent::Balance(_)) => {}
                None => break,
            },
        }

        if session.current_user().is_none() {
            print_error("Session ended. Log in again.");
            break;
        }
    }

    watcher.stop();
    Ok(())
}

fn print_feed(feed: &[FeedEntry]) {
    if feed.is_empty() {
        println!("No posts yet.");
        return;
    }

    for entry in feed {
        let blog = &entry.blog;
        println!(
            "{} {} by {} on {}",
            format!("#{}", blog.id).dimmed(),
            blog.title.bold(),
            blog.author_username,
            format_timestamp(&blog.created_at)
        );
        println!("{}", blog.content);
        if let Some(url) = &blog.image_url {
            println!("{} {}", "image:".dimmed(), url);
        }
        print_thread(&entry.comments, 1);
        println!();
    }
}

fn print_thread(thread: &CommentThread, indent: usize) {
    for (depth, comment) in thread.walk() {
        println!(
            "{}{} {}: {}",
            "  ".repeat(indent + depth),
            format!("#{}", comment.id).dimmed(),
            comment.author_username.cyan(),
            comment.content
        );
    }
}
