use super::{placeholders, table_for};
use crate::database::models::{EngagementRecord, TargetCounters, TargetOwnership};
use crate::target::{EngagementKind, TargetKind, TargetRef};
use anyhow::{ensure, Result};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

pub(super) struct SqliteEngagementRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::EngagementRepository for SqliteEngagementRepository<'conn> {
    fn exists(&self, target: &TargetRef, actor_id: &str, kind: EngagementKind) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM engagements
            WHERE target_type = ?1 AND target_id = ?2 AND actor_id = ?3 AND kind = ?4
            "#,
            params![target.kind.as_str(), target.id, actor_id, kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn insert(&self, record: &EngagementRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO engagements (target_type, target_id, actor_id, kind, post_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.target_type,
                record.target_id,
                record.actor_id,
                record.kind,
                record.post_id,
                record.created_at,
            ],
        )?;
        Ok(())
    }

    fn remove(&self, target: &TargetRef, actor_id: &str, kind: EngagementKind) -> Result<bool> {
        let removed = self.conn.execute(
            r#"
            DELETE FROM engagements
            WHERE target_type = ?1 AND target_id = ?2 AND actor_id = ?3 AND kind = ?4
            "#,
            params![target.kind.as_str(), target.id, actor_id, kind.as_str()],
        )?;
        Ok(removed > 0)
    }

    fn list_for_actor_in_post(
        &self,
        actor_id: &str,
        post_id: &str,
    ) -> Result<Vec<EngagementRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT target_type, target_id, actor_id, kind, post_id, created_at
            FROM engagements
            WHERE actor_id = ?1 AND post_id = ?2
            "#,
        )?;
        let rows = stmt.query_map(params![actor_id, post_id], |row| {
            Ok(EngagementRecord {
                target_type: row.get(0)?,
                target_id: row.get(1)?,
                actor_id: row.get(2)?,
                kind: row.get(3)?,
                post_id: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    fn delete_for_targets(&self, kind: TargetKind, target_ids: &[String]) -> Result<()> {
        if target_ids.is_empty() {
            return Ok(());
        }
        let sql = format!(
            "DELETE FROM engagements WHERE target_type = ?1 AND target_id IN ({})",
            placeholders(2, target_ids.len())
        );
        let mut values = vec![kind.as_str().to_string()];
        values.extend(target_ids.iter().cloned());
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }

    fn resolve(&self, target: &TargetRef) -> Result<Option<TargetOwnership>> {
        let sql = match target.kind {
            TargetKind::Post => "SELECT author_id, id FROM posts WHERE id = ?1",
            TargetKind::Comment => "SELECT author_id, post_id FROM comments WHERE id = ?1",
            TargetKind::Reply => "SELECT author_id, post_id FROM replies WHERE id = ?1",
        };
        Ok(self
            .conn
            .query_row(sql, params![target.id], |row| {
                Ok(TargetOwnership {
                    author_id: row.get(0)?,
                    post_id: row.get(1)?,
                })
            })
            .optional()?)
    }

    fn counters(&self, target: &TargetRef) -> Result<TargetCounters> {
        let sql = match target.kind {
            TargetKind::Post => {
                "SELECT upvote_count, downvote_count, bookmark_count, repost_count \
                 FROM posts WHERE id = ?1"
            }
            TargetKind::Comment => {
                "SELECT upvote_count, downvote_count, 0, 0 FROM comments WHERE id = ?1"
            }
            TargetKind::Reply => {
                "SELECT upvote_count, downvote_count, 0, 0 FROM replies WHERE id = ?1"
            }
        };
        let counters = self
            .conn
            .query_row(sql, params![target.id], |row| {
                Ok(TargetCounters {
                    upvote_count: row.get(0)?,
                    downvote_count: row.get(1)?,
                    bookmark_count: row.get(2)?,
                    repost_count: row.get(3)?,
                })
            })
            .optional()?;
        Ok(counters.unwrap_or_default())
    }

    fn adjust_counter(&self, target: &TargetRef, kind: EngagementKind, delta: i64) -> Result<()> {
        ensure!(
            kind.applies_to(target.kind),
            "{} has no {} counter",
            target.kind,
            kind.as_str()
        );
        let column = kind.counter_column();
        let sql = format!(
            "UPDATE {table} SET {column} = MAX({column} + ?2, 0) WHERE id = ?1",
            table = table_for(target.kind),
        );
        self.conn.execute(&sql, params![target.id, delta])?;
        Ok(())
    }
}
