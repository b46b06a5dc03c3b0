use super::placeholders;
use crate::database::models::NotificationRecord;
use crate::target::TargetKind;
use anyhow::Result;
use rusqlite::{params, params_from_iter, Connection};

pub(super) struct SqliteNotificationRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

impl<'conn> super::NotificationRepository for SqliteNotificationRepository<'conn> {
    fn create(&self, record: &NotificationRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO notifications (id, kind, actor_id, recipient_id, target_type, target_id,
                post_id, is_read, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.id,
                record.kind,
                record.actor_id,
                record.recipient_id,
                record.target_type,
                record.target_id,
                record.post_id,
                record.is_read,
                record.created_at,
            ],
        )?;
        Ok(())
    }

    fn list_for_recipient(
        &self,
        recipient_id: &str,
        limit: usize,
    ) -> Result<Vec<NotificationRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, kind, actor_id, recipient_id, target_type, target_id, post_id, is_read,
                created_at
            FROM notifications
            WHERE recipient_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )?;
        let rows = stmt.query_map(params![recipient_id, limit as i64], |row| {
            Ok(NotificationRecord {
                id: row.get(0)?,
                kind: row.get(1)?,
                actor_id: row.get(2)?,
                recipient_id: row.get(3)?,
                target_type: row.get(4)?,
                target_id: row.get(5)?,
                post_id: row.get(6)?,
                is_read: row.get(7)?,
                created_at: row.get(8)?,
            })
        })?;
        let mut notifications = Vec::new();
        for row in rows {
            notifications.push(row?);
        }
        Ok(notifications)
    }

    fn mark_read(&self, recipient_id: &str, ids: &[String]) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let sql = format!(
            "UPDATE notifications SET is_read = 1 \
             WHERE recipient_id = ?1 AND is_read = 0 AND id IN ({})",
            placeholders(2, ids.len())
        );
        let mut values = vec![recipient_id.to_string()];
        values.extend(ids.iter().cloned());
        let updated = self.conn.execute(&sql, params_from_iter(values))?;
        Ok(updated)
    }

    fn count_unread(&self, recipient_id: &str) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND is_read = 0",
            params![recipient_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn delete_for_targets(&self, kind: TargetKind, target_ids: &[String]) -> Result<()> {
        if target_ids.is_empty() {
            return Ok(());
        }
        let sql = format!(
            "DELETE FROM notifications WHERE target_type = ?1 AND target_id IN ({})",
            placeholders(2, target_ids.len())
        );
        let mut values = vec![kind.as_str().to_string()];
        values.extend(target_ids.iter().cloned());
        self.conn.execute(&sql, params_from_iter(values))?;
        Ok(())
    }
}
