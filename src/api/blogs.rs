use futures::future::join_all;
use serde_json::json;
use tracing::debug;

use super::models::{Blog, Comment, NewBlog};
use super::paths;
use crate::client::BankClient;
use crate::comments::CommentThread;
use crate::error::Error;
use crate::transport::{ApiRequest, FormField};
use crate::validation;

/// A blog post together with its comment tree
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub blog: Blog,
    pub comments: CommentThread,
}

impl BankClient {
    /// All posts, newest first
    pub async fn blogs(&self) -> Result<Vec<Blog>, Error> {
        self.call(ApiRequest::get(paths::BLOGS)).await
    }

    /// Publish a post, optionally with an image (sent as a multipart form)
    pub async fn create_blog(&self, post: NewBlog) -> Result<Blog, Error> {
        let title = validation::require_text("Title", &post.title)?;
        let content = validation::require_text("Content", &post.content)?;

        let mut fields = vec![
            FormField::Text {
                name: "title".to_string(),
                value: title,
            },
            FormField::Text {
                name: "content".to_string(),
                value: content,
            },
        ];
        if let Some(image) = post.image {
            fields.push(FormField::File {
                name: "image".to_string(),
                file_name: image.file_name,
                bytes: image.bytes,
            });
        }

        self.call(ApiRequest::post(paths::BLOGS).form(fields)).await
    }

    /// Remove a post. Staff only; others get a 403 from the server.
    pub async fn delete_blog(&self, blog_id: i64) -> Result<(), Error> {
        let request = ApiRequest::delete(paths::BLOGS).query("id", blog_id.to_string());
        self.execute(request).await?;
        Ok(())
    }

    /// Top-level comments of a post with their replies
    pub async fn comments(&self, blog_id: i64) -> Result<CommentThread, Error> {
        let comments: Vec<Comment> = self
            .call(ApiRequest::get(paths::blog_comments(blog_id)))
            .await?;
        Ok(CommentThread::from(comments))
    }

    /// Comment on a post, or reply to `parent`. Returns the created comment so it can
    /// be inserted into a local [`CommentThread`].
    pub async fn add_comment(
        &self,
        blog_id: i64,
        content: &str,
        parent: Option<i64>,
    ) -> Result<Comment, Error> {
        let content = validation::require_text("Comment", content)?;
        let request = ApiRequest::post(paths::blog_comments(blog_id)).json(json!({
            "content": content,
            "parent": parent,
        }));
        self.call(request).await
    }

    /// Posts plus their comments, fetched concurrently. A post whose comments fail to
    /// load gets an empty thread.
    pub async fn blog_feed(&self) -> Result<Vec<FeedEntry>, Error> {
        let blogs = self.blogs().await?;

        let threads = join_all(blogs.iter().map(|blog| self.comments(blog.id))).await;

        Ok(blogs
            .into_iter()
            .zip(threads)
            .map(|(blog, thread)| {
                let comments = thread.unwrap_or_else(|e| {
                    debug!("Comments of blog {} unavailable: {}", blog.id, e);
                    CommentThread::default()
                });
                FeedEntry { blog, comments }
            })
            .collect())
    }
}
