use std::sync::Arc;

use domains::{
    AppError, ForumRepository, Post, PostDetails, PostRelation, PostRepository, PostUpdate, Result,
    ThreadRepository, UserRepository,
};
use tracing::debug;

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    threads: Arc<dyn ThreadRepository>,
    forums: Arc<dyn ForumRepository>,
    users: Arc<dyn UserRepository>,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        threads: Arc<dyn ThreadRepository>,
        forums: Arc<dyn ForumRepository>,
        users: Arc<dyn UserRepository>,
    ) -> Self {
        Self { posts, threads, forums, users }
    }

    async fn find(&self, id: i64) -> Result<Post> {
        self.posts.find(id).await?.ok_or_else(|| AppError::not_found("post", id))
    }

    /// Fetches a post and whichever related records were asked for.
    pub async fn details(&self, id: i64, related: &[PostRelation]) -> Result<PostDetails> {
        let post = self.find(id).await?;
        let mut details = PostDetails { post, author: None, thread: None, forum: None };

        for relation in related {
            match relation {
                PostRelation::User => {
                    let author = &details.post.author;
                    details.author = Some(
                        self.users
                            .find_by_nickname(author)
                            .await?
                            .ok_or_else(|| AppError::not_found("user", author))?,
                    );
                }
                PostRelation::Thread => {
                    let thread = details.post.thread;
                    details.thread = Some(
                        self.threads
                            .find_by_id(thread)
                            .await?
                            .ok_or_else(|| AppError::not_found("thread", thread))?,
                    );
                }
                PostRelation::Forum => {
                    let forum = &details.post.forum;
                    details.forum = Some(
                        self.forums
                            .find_by_slug(forum)
                            .await?
                            .ok_or_else(|| AppError::not_found("forum", forum))?,
                    );
                }
            }
        }
        Ok(details)
    }

    /// Edits a post's message. Blank or identical messages leave the post
    /// (and its edited flag) untouched.
    pub async fn update(&self, id: i64, update: PostUpdate) -> Result<Post> {
        let post = self.find(id).await?;
        match update.message.as_deref() {
            Some(message) if !message.is_empty() && message != post.message => {
                debug!(post = id, "post message edited");
                self.posts.update_message(id, message).await
            }
            _ => Ok(post),
        }
    }
}
