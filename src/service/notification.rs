//! In-memory notification store
//!
//! Notifications are kept per user in process memory and reset on
//! restart. Each user holds at most the newest fifty entries.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use chrono::Utc;

use crate::model::notification::{Notification, NotificationEvent};

/// Upper bound on stored and listed notifications per user
pub const MAX_PER_USER: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification store lock poisoned")]
    LockFailed,
}

/// Per-user notification feed backed by RwLock.
/// Newest entries sit at the front of each user's list.
pub struct NotificationStore {
    next_id: AtomicI64,
    entries: RwLock<HashMap<i64, Vec<Notification>>>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Record an event for a user and return the notification id.
    pub fn notify(&self, user_id: i64, event: NotificationEvent) -> Result<i64, NotificationError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let notification = Notification {
            id,
            kind: event.kind(),
            message: event.message(),
            read: false,
            created_at: Utc::now(),
        };

        let mut entries = self
            .entries
            .write()
            .map_err(|_| NotificationError::LockFailed)?;
        let feed = entries.entry(user_id).or_default();
        feed.insert(0, notification);
        feed.truncate(MAX_PER_USER);

        tracing::debug!(user_id = %user_id, notification_id = %id, "Notification recorded");
        Ok(id)
    }

    /// Newest-first notifications for a user, with the user's total
    /// unread count. The count ignores the `unread_only` filter.
    pub fn list(
        &self,
        user_id: i64,
        unread_only: bool,
        limit: usize,
    ) -> Result<(Vec<Notification>, usize), NotificationError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| NotificationError::LockFailed)?;

        let Some(feed) = entries.get(&user_id) else {
            return Ok((Vec::new(), 0));
        };

        let unread_count = feed.iter().filter(|n| !n.read).count();
        let notifications = feed
            .iter()
            .filter(|n| !unread_only || !n.read)
            .take(limit)
            .cloned()
            .collect();

        Ok((notifications, unread_count))
    }

    /// Returns true if the notification existed and belongs to the user.
    pub fn mark_read(&self, user_id: i64, id: i64) -> Result<bool, NotificationError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| NotificationError::LockFailed)?;

        let found = entries
            .get_mut(&user_id)
            .and_then(|feed| feed.iter_mut().find(|n| n.id == id));
        match found {
            Some(notification) => {
                notification.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Mark every notification read and return how many changed.
    pub fn mark_all_read(&self, user_id: i64) -> Result<usize, NotificationError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| NotificationError::LockFailed)?;

        let Some(feed) = entries.get_mut(&user_id) else {
            return Ok(0);
        };

        let mut marked = 0;
        for notification in feed.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            marked += 1;
        }
        Ok(marked)
    }

    /// Returns true if the notification existed and was removed.
    pub fn remove(&self, user_id: i64, id: i64) -> Result<bool, NotificationError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| NotificationError::LockFailed)?;

        let Some(feed) = entries.get_mut(&user_id) else {
            return Ok(false);
        };

        let before = feed.len();
        feed.retain(|n| n.id != id);
        Ok(feed.len() < before)
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn welcome() -> NotificationEvent {
        NotificationEvent::Welcome {
            first_name: "Asha".to_string(),
        }
    }

    #[test]
    fn notifications_list_newest_first() {
        let store = NotificationStore::new();
        let first = store.notify(1, welcome()).unwrap();
        let second = store
            .notify(1, NotificationEvent::HighRisk)
            .unwrap();

        let (notifications, unread) = store.list(1, false, MAX_PER_USER).unwrap();
        assert_eq!(unread, 2);
        assert_eq!(notifications[0].id, second);
        assert_eq!(notifications[1].id, first);
    }

    #[test]
    fn feed_is_capped_at_fifty() {
        let store = NotificationStore::new();
        for _ in 0..60 {
            store.notify(1, welcome()).unwrap();
        }

        let (notifications, unread) = store.list(1, false, 100).unwrap();
        assert_eq!(notifications.len(), MAX_PER_USER);
        assert_eq!(unread, MAX_PER_USER);
        // The newest id survives the truncation
        assert_eq!(notifications[0].id, 60);
    }

    #[test]
    fn unread_filter_does_not_change_the_count() {
        let store = NotificationStore::new();
        let first = store.notify(1, welcome()).unwrap();
        store.notify(1, NotificationEvent::HighRisk).unwrap();

        assert!(store.mark_read(1, first).unwrap());

        let (notifications, unread) = store.list(1, true, MAX_PER_USER).unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(unread, 1);

        let (all, unread) = store.list(1, false, MAX_PER_USER).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(unread, 1);
    }

    #[test]
    fn mark_read_is_scoped_to_the_user() {
        let store = NotificationStore::new();
        let id = store.notify(1, welcome()).unwrap();

        assert!(!store.mark_read(2, id).unwrap());
        assert!(store.mark_read(1, id).unwrap());
        assert!(store.mark_read(1, id).unwrap());
    }

    #[test]
    fn mark_all_read_reports_how_many_changed() {
        let store = NotificationStore::new();
        let first = store.notify(1, welcome()).unwrap();
        store.notify(1, NotificationEvent::HighRisk).unwrap();
        store.mark_read(1, first).unwrap();

        assert_eq!(store.mark_all_read(1).unwrap(), 1);
        assert_eq!(store.mark_all_read(1).unwrap(), 0);
        assert_eq!(store.mark_all_read(99).unwrap(), 0);
    }

    #[test]
    fn remove_deletes_only_the_given_notification() {
        let store = NotificationStore::new();
        let first = store.notify(1, welcome()).unwrap();
        let second = store.notify(1, NotificationEvent::HighRisk).unwrap();

        assert!(store.remove(1, first).unwrap());
        assert!(!store.remove(1, first).unwrap());

        let (notifications, _) = store.list(1, false, MAX_PER_USER).unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].id, second);
    }
}
