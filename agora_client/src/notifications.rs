use crate::api::{ClientError, ContentApi};
use crate::models::NotificationItem;
use std::collections::HashSet;

/// The viewer's notification list and its read state.
///
/// Items only move from unread to read. Closing the list while unread items
/// are visible marks them read locally first, then tells the server; a
/// failed request is reported but never reverts the local flags.
#[derive(Debug)]
pub struct NotificationInbox {
    recipient_id: String,
    items: Vec<NotificationItem>,
    read_locally: HashSet<String>,
    open: bool,
}

impl NotificationInbox {
    pub fn new(recipient_id: impl Into<String>) -> Self {
        Self {
            recipient_id: recipient_id.into(),
            items: Vec::new(),
            read_locally: HashSet::new(),
            open: false,
        }
    }

    pub fn recipient_id(&self) -> &str {
        &self.recipient_id
    }

    pub fn items(&self) -> &[NotificationItem] {
        &self.items
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn unread_count(&self) -> usize {
        self.items.iter().filter(|item| !item.is_read).count()
    }

    /// Replaces the window with a fresh fetch. Anything already read here
    /// stays read even if the server has not caught up.
    pub async fn refresh<A>(&mut self, api: &A) -> Result<(), ClientError>
    where
        A: ContentApi + ?Sized,
    {
        let mut items = api.list_notifications(&self.recipient_id).await?;
        for item in &mut items {
            if self.read_locally.contains(&item.id) {
                item.is_read = true;
            }
        }
        self.items = items;
        Ok(())
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    /// Closes the list. When unread items were visible, returns the ids that
    /// were marked and the server's answer for them.
    pub async fn close<A>(&mut self, api: &A) -> Option<(Vec<String>, Result<usize, ClientError>)>
    where
        A: ContentApi + ?Sized,
    {
        let was_open = std::mem::replace(&mut self.open, false);
        if !was_open {
            return None;
        }
        let ids: Vec<String> = self
            .items
            .iter()
            .filter(|item| !item.is_read)
            .map(|item| item.id.clone())
            .collect();
        if ids.is_empty() {
            return None;
        }

        for item in self.items.iter_mut().filter(|item| !item.is_read) {
            item.is_read = true;
        }
        self.read_locally.extend(ids.iter().cloned());

        let result = api.mark_read(&self.recipient_id, &ids).await;
        match &result {
            Ok(updated) => tracing::debug!(
                recipient_id = %self.recipient_id,
                requested = ids.len(),
                updated,
                "notifications marked read"
            ),
            Err(err) => tracing::warn!(
                recipient_id = %self.recipient_id,
                error = %err,
                "failed to mark notifications read"
            ),
        }
        Some((ids, result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_api::FakeApi;
    use crate::models::{NotificationKind, TargetRef};

    fn item(id: &str, is_read: bool) -> NotificationItem {
        NotificationItem {
            id: id.into(),
            kind: NotificationKind::Upvote,
            actor_id: "bob".into(),
            recipient_id: "alice".into(),
            target: TargetRef::post("p1"),
            post_id: "p1".into(),
            is_read,
            created_at: "2024-01-01T00:00:00Z".into(),
        }
    }

    fn api_serving(items: Vec<NotificationItem>) -> FakeApi {
        let api = FakeApi::default();
        api.state().notifications = items;
        api
    }

    #[tokio::test]
    async fn closing_marks_visible_unread_once() {
        let api = api_serving(vec![
            item("n1", false),
            item("n2", false),
            item("n3", false),
            item("n4", true),
        ]);
        let mut inbox = NotificationInbox::new("alice");
        inbox.refresh(&api).await.unwrap();
        assert_eq!(inbox.unread_count(), 3);

        inbox.open();
        assert_eq!(inbox.unread_count(), 3, "opening does not mark anything");

        let (ids, result) = inbox.close(&api).await.expect("marked");
        assert_eq!(ids, vec!["n1", "n2", "n3"]);
        assert_eq!(result.unwrap(), 3);
        assert_eq!(inbox.unread_count(), 0);

        assert!(inbox.close(&api).await.is_none());
        assert_eq!(api.state().mark_read_calls.len(), 1);
    }

    #[tokio::test]
    async fn failed_request_keeps_local_read_state() {
        let api = api_serving(vec![item("n1", false), item("n2", false)]);
        api.fail("mark_read");
        let mut inbox = NotificationInbox::new("alice");
        inbox.refresh(&api).await.unwrap();
        inbox.open();

        let (_, result) = inbox.close(&api).await.expect("attempted");
        assert!(result.is_err());
        assert_eq!(inbox.unread_count(), 0);

        // the server still reports them unread
        inbox.refresh(&api).await.unwrap();
        assert_eq!(inbox.unread_count(), 0);
        assert!(inbox.items().iter().all(|item| item.is_read));
    }

    #[tokio::test]
    async fn closing_without_unread_sends_nothing() {
        let api = api_serving(vec![item("n1", true)]);
        let mut inbox = NotificationInbox::new("alice");
        inbox.refresh(&api).await.unwrap();
        inbox.open();
        assert!(inbox.close(&api).await.is_none());
        assert!(!inbox.is_open());
        assert!(api.state().mark_read_calls.is_empty());
    }

    #[tokio::test]
    async fn new_items_after_refresh_start_unread() {
        let api = api_serving(vec![item("n1", false)]);
        let mut inbox = NotificationInbox::new("alice");
        inbox.refresh(&api).await.unwrap();
        inbox.open();
        inbox.close(&api).await;

        api.state().notifications.insert(0, item("n2", false));
        inbox.refresh(&api).await.unwrap();
        assert_eq!(inbox.unread_count(), 1);
        assert_eq!(inbox.items()[0].id, "n2");
    }
}
