/// Comment service - gated creation and threaded listing
use crate::db::{comment_repo, post_repo};
use crate::error::{AppError, Result};
use crate::models::{Comment, CommentThread, CommentView};
use crate::services::CommunityService;
use sqlx::PgPool;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

pub struct CommentService {
    pool: PgPool,
}

impl CommentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Comment on a post, optionally replying to another comment of the same post
    pub async fn create_comment(
        &self,
        author_id: Uuid,
        post_id: Uuid,
        text: &str,
        reply_to_id: Option<Uuid>,
    ) -> Result<Comment> {
        let post = post_repo::find_post_by_id(&self.pool, post_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {} not found", post_id)))?;

        // Replies attach to the top-level comment of their thread
        let reply_to_id = match reply_to_id {
            Some(parent_id) => {
                let parent = comment_repo::find_comment_by_id(&self.pool, parent_id)
                    .await?
                    .filter(|c| c.post_id == post_id)
                    .ok_or_else(|| {
                        AppError::Validation(
                            "replyToId must reference a comment on the same post".to_string(),
                        )
                    })?;
                Some(parent.reply_to_id.unwrap_or(parent.id))
            }
            None => None,
        };

        CommunityService::new(self.pool.clone())
            .ensure_subscribed(author_id, post.community_id)
            .await?;

        let comment =
            comment_repo::create_comment(&self.pool, post_id, author_id, text, reply_to_id).await?;

        tracing::info!(
            comment_id = %comment.id,
            post_id = %post_id,
            author_id = %author_id,
            reply = reply_to_id.is_some(),
            "comment created"
        );

        Ok(comment)
    }

    pub async fn list_threads(
        &self,
        post_id: Uuid,
        viewer_id: Option<Uuid>,
    ) -> Result<Vec<CommentThread>> {
        if post_repo::find_post_by_id(&self.pool, post_id).await?.is_none() {
            return Err(AppError::NotFound(format!("Post {} not found", post_id)));
        }

        let comments = comment_repo::list_for_post(&self.pool, post_id, viewer_id).await?;
        Ok(build_threads(comments))
    }
}

/// Group comments into two-level threads, keeping the input order.
///
/// Every reply lands under the top-level comment its chain leads to, however
/// deep the stored chain is. Comments whose parent is not in the list are
/// treated as top-level so nothing is dropped.
pub fn build_threads(comments: Vec<CommentView>) -> Vec<CommentThread> {
    let parents: HashMap<Uuid, Option<Uuid>> =
        comments.iter().map(|c| (c.id, c.reply_to_id)).collect();
    let roots = resolve_roots(&parents);

    let mut threads = Vec::new();
    let mut replies: HashMap<Uuid, Vec<CommentView>> = HashMap::new();
    for comment in comments {
        match roots.get(&comment.id) {
            Some(&root) if root != comment.id => replies.entry(root).or_default().push(comment),
            _ => threads.push(CommentThread {
                comment,
                replies: Vec::new(),
            }),
        }
    }

    for thread in &mut threads {
        if let Some(found) = replies.remove(&thread.comment.id) {
            thread.replies = found;
        }
    }
    threads
}

/// Map every comment id to the id of its top-level ancestor (itself when
/// top-level). A reply cycle is cut where the walk first revisits a comment.
fn resolve_roots(parents: &HashMap<Uuid, Option<Uuid>>) -> HashMap<Uuid, Uuid> {
    let mut roots: HashMap<Uuid, Uuid> = HashMap::with_capacity(parents.len());

    for &start in parents.keys() {
        let mut path = Vec::new();
        let mut on_path = HashSet::new();
        let mut current = start;

        let root = loop {
            if let Some(&root) = roots.get(&current) {
                break root;
            }
            if !on_path.insert(current) {
                break current;
            }
            path.push(current);
            match parents.get(&current).copied().flatten() {
                Some(parent) if parents.contains_key(&parent) => current = parent,
                _ => break current,
            }
        };

        for id in path {
            roots.insert(id, root);
        }
    }

    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn view(id: Uuid, reply_to_id: Option<Uuid>, age_mins: i64) -> CommentView {
        CommentView {
            id,
            text: format!("comment {}", id),
            author_id: Uuid::new_v4(),
            author_username: Some("ferris".to_string()),
            post_id: Uuid::nil(),
            reply_to_id,
            created_at: Utc::now() - Duration::minutes(age_mins),
            score: 0,
            current_vote: None,
        }
    }

    #[test]
    fn nested_replies_flatten_into_their_thread() {
        let (a, b, a1, a1x) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        // newest first, as the repository returns them
        let threads = build_threads(vec![
            view(a1x, Some(a1), 1),
            view(b, None, 2),
            view(a1, Some(a), 3),
            view(a, None, 4),
        ]);

        assert_eq!(threads.len(), 2);
        assert_eq!(threads[0].comment.id, b);
        assert!(threads[0].replies.is_empty());

        let first = &threads[1];
        assert_eq!(first.comment.id, a);
        let replies: Vec<Uuid> = first.replies.iter().map(|r| r.id).collect();
        assert_eq!(replies, vec![a1x, a1]);
    }

    #[test]
    fn sibling_order_is_preserved() {
        let root = Uuid::new_v4();
        let (newer, older) = (Uuid::new_v4(), Uuid::new_v4());
        let threads = build_threads(vec![
            view(newer, Some(root), 1),
            view(older, Some(root), 2),
            view(root, None, 3),
        ]);

        let replies: Vec<Uuid> = threads[0].replies.iter().map(|r| r.id).collect();
        assert_eq!(replies, vec![newer, older]);
    }

    #[test]
    fn orphaned_replies_become_top_level() {
        let orphan = Uuid::new_v4();
        let threads = build_threads(vec![view(orphan, Some(Uuid::new_v4()), 1)]);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].comment.id, orphan);
    }

    #[test]
    fn deep_reply_chain_builds_and_serializes() {
        const DEPTH: usize = 20_000;
        let ids: Vec<Uuid> = (0..=DEPTH).map(|_| Uuid::new_v4()).collect();
        let mut chain = vec![view(ids[0], None, 0)];
        chain.extend(ids.windows(2).map(|pair| view(pair[1], Some(pair[0]), 0)));
        chain.reverse();

        let threads = build_threads(chain);
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].comment.id, ids[0]);
        assert_eq!(threads[0].replies.len(), DEPTH);

        let json = serde_json::to_string(&threads).unwrap();
        assert!(json.contains(&ids[DEPTH].to_string()));
    }

    #[test]
    fn reply_cycles_do_not_drop_comments() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let threads = build_threads(vec![view(a, Some(b), 1), view(b, Some(a), 2)]);

        let total: usize = threads.iter().map(|t| 1 + t.replies.len()).sum();
        assert_eq!(total, 2);
        assert!(!threads.is_empty());
    }

    #[test]
    fn empty_input_yields_no_threads() {
        assert!(build_threads(Vec::new()).is_empty());
    }
}
