//! Local comment tree of one blog post
//!
//! Comments created through the API are inserted in place instead of reloading the
//! whole thread.

use crate::api::models::Comment;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentThread {
    comments: Vec<Comment>,
}

impl CommentThread {
    pub fn new() -> Self {
        Self::default()
    }

    /// Top-level comments in display order
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    /// Total number of comments, replies included
    pub fn len(&self) -> usize {
        fn count(comments: &[Comment]) -> usize {
            comments.iter().map(|c| 1 + count(&c.replies)).sum()
        }
        count(&self.comments)
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn find(&self, id: i64) -> Option<&Comment> {
        fn search(comments: &[Comment], id: i64) -> Option<&Comment> {
            comments
                .iter()
                .find_map(|c| if c.id == id { Some(c) } else { search(&c.replies, id) })
        }
        search(&self.comments, id)
    }

    /// Place a freshly created comment: appended at the top level when it has no
    /// parent, otherwise appended to its parent's replies. Returns `false` (tree
    /// untouched) when the parent is not in this thread.
    pub fn insert(&mut self, comment: Comment) -> bool {
        let parent_id = match comment.parent {
            None => {
                self.comments.push(comment);
                return true;
            }
            Some(parent_id) => parent_id,
        };

        match find_mut(&mut self.comments, parent_id) {
            Some(parent) => {
                parent.replies.push(comment);
                true
            }
            None => false,
        }
    }

    /// Depth-first walk yielding each comment with its nesting depth
    pub fn walk(&self) -> Vec<(usize, &Comment)> {
        fn visit<'a>(comments: &'a [Comment], depth: usize, out: &mut Vec<(usize, &'a Comment)>) {
            for comment in comments {
                out.push((depth, comment));
                visit(&comment.replies, depth + 1, out);
            }
        }
        let mut out = Vec::new();
        visit(&self.comments, 0, &mut out);
        out
    }
}

impl From<Vec<Comment>> for CommentThread {
    fn from(comments: Vec<Comment>) -> Self {
        Self { comments }
    }
}

fn find_mut(comments: &mut [Comment], id: i64) -> Option<&mut Comment> {
    for comment in comments.iter_mut() {
        if comment.id == id {
            return Some(comment);
        }
        if let Some(found) = find_mut(&mut comment.replies, id) {
            return Some(found);
        }
    }
    None
}
