use crate::database::models::ReplyRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqliteReplyRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

const REPLY_COLUMNS: &str = "id, comment_id, post_id, author_id, content, reply_to_id, \
    reply_to_author_id, upvote_count, downvote_count, created_at, updated_at";

fn map_reply(row: &Row<'_>) -> rusqlite::Result<ReplyRecord> {
    Ok(ReplyRecord {
        id: row.get(0)?,
        comment_id: row.get(1)?,
        post_id: row.get(2)?,
        author_id: row.get(3)?,
        content: row.get(4)?,
        reply_to_id: row.get(5)?,
        reply_to_author_id: row.get(6)?,
        upvote_count: row.get(7)?,
        downvote_count: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

impl<'conn> super::ReplyRepository for SqliteReplyRepository<'conn> {
    fn create(&self, record: &ReplyRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO replies (id, comment_id, post_id, author_id, content, reply_to_id,
                reply_to_author_id, upvote_count, downvote_count, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                record.id,
                record.comment_id,
                record.post_id,
                record.author_id,
                record.content,
                record.reply_to_id,
                record.reply_to_author_id,
                record.upvote_count,
                record.downvote_count,
                record.created_at,
                record.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<ReplyRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {REPLY_COLUMNS} FROM replies WHERE id = ?1"),
                params![id],
                map_reply,
            )
            .optional()?)
    }

    fn list_for_post(&self, post_id: &str) -> Result<Vec<ReplyRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {REPLY_COLUMNS} FROM replies WHERE post_id = ?1 ORDER BY rowid ASC"
        ))?;
        let rows = stmt.query_map(params![post_id], map_reply)?;
        let mut replies = Vec::new();
        for row in rows {
            replies.push(row?);
        }
        Ok(replies)
    }

    fn ids_for_comment(&self, comment_id: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM replies WHERE comment_id = ?1 ORDER BY rowid ASC")?;
        let rows = stmt.query_map(params![comment_id], |row| row.get::<_, String>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }
}
