use crate::database::models::PostRecord;
use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqlitePostRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

const POST_COLUMNS: &str = "id, author_id, title, body, category, tags, upvote_count, \
    downvote_count, view_count, bookmark_count, repost_count, comment_count, created_at, \
    updated_at";

fn map_post(row: &Row<'_>) -> rusqlite::Result<(PostRecord, String)> {
    let tags: String = row.get(5)?;
    Ok((
        PostRecord {
            id: row.get(0)?,
            author_id: row.get(1)?,
            title: row.get(2)?,
            body: row.get(3)?,
            category: row.get(4)?,
            tags: Vec::new(),
            upvote_count: row.get(6)?,
            downvote_count: row.get(7)?,
            view_count: row.get(8)?,
            bookmark_count: row.get(9)?,
            repost_count: row.get(10)?,
            comment_count: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        },
        tags,
    ))
}

fn decode_tags(post_id: &str, raw: &str) -> Result<Vec<String>> {
    serde_json::from_str(raw).with_context(|| format!("post {post_id} has malformed tags"))
}

impl<'conn> super::PostRepository for SqlitePostRepository<'conn> {
    fn create(&self, record: &PostRecord) -> Result<()> {
        let tags = serde_json::to_string(&record.tags)?;
        self.conn.execute(
            r#"
            INSERT INTO posts (id, author_id, title, body, category, tags, upvote_count,
                downvote_count, view_count, bookmark_count, repost_count, comment_count,
                created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
            params![
                record.id,
                record.author_id,
                record.title,
                record.body,
                record.category,
                tags,
                record.upvote_count,
                record.downvote_count,
                record.view_count,
                record.bookmark_count,
                record.repost_count,
                record.comment_count,
                record.created_at,
                record.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<PostRecord>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
                params![id],
                map_post,
            )
            .optional()?;
        match row {
            Some((mut record, tags)) => {
                record.tags = decode_tags(&record.id, &tags)?;
                Ok(Some(record))
            }
            None => Ok(None),
        }
    }

    fn update_content(&self, record: &PostRecord) -> Result<()> {
        let tags = serde_json::to_string(&record.tags)?;
        self.conn.execute(
            r#"
            UPDATE posts
            SET title = ?2, body = ?3, category = ?4, tags = ?5, updated_at = ?6
            WHERE id = ?1
            "#,
            params![
                record.id,
                record.title,
                record.body,
                record.category,
                tags,
                record.updated_at,
            ],
        )?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }

    fn increment_views(&self, id: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE posts SET view_count = view_count + 1 WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    fn adjust_comment_count(&self, id: &str, delta: i64) -> Result<()> {
        self.conn.execute(
            "UPDATE posts SET comment_count = MAX(comment_count + ?2, 0) WHERE id = ?1",
            params![id, delta],
        )?;
        Ok(())
    }
}
