use crate::database::models::CommentRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqliteCommentRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

const COMMENT_COLUMNS: &str = "id, post_id, author_id, content, comment_key, upvote_count, \
    downvote_count, created_at, updated_at";

fn map_comment(row: &Row<'_>) -> rusqlite::Result<CommentRecord> {
    Ok(CommentRecord {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        content: row.get(3)?,
        comment_key: row.get(4)?,
        upvote_count: row.get(5)?,
        downvote_count: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl<'conn> super::CommentRepository for SqliteCommentRepository<'conn> {
    fn create(&self, record: &CommentRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO comments (id, post_id, author_id, content, comment_key, upvote_count,
                downvote_count, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.id,
                record.post_id,
                record.author_id,
                record.content,
                record.comment_key,
                record.upvote_count,
                record.downvote_count,
                record.created_at,
                record.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<CommentRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1"),
                params![id],
                map_comment,
            )
            .optional()?)
    }

    fn find_by_key(
        &self,
        post_id: &str,
        author_id: &str,
        comment_key: &str,
    ) -> Result<Option<CommentRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!(
                    "SELECT {COMMENT_COLUMNS} FROM comments \
                     WHERE post_id = ?1 AND author_id = ?2 AND comment_key = ?3"
                ),
                params![post_id, author_id, comment_key],
                map_comment,
            )
            .optional()?)
    }

    fn list_for_post(&self, post_id: &str) -> Result<Vec<CommentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments WHERE post_id = ?1 ORDER BY rowid ASC"
        ))?;
        let rows = stmt.query_map(params![post_id], map_comment)?;
        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }

    fn delete(&self, id: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        Ok(removed > 0)
    }
}
