//! Follow edges and notifications.

use super::backend::StorageBackend;
use super::AudioStore;
use crate::error::{MurmurError, Result};
use crate::model::{Follow, Notification, NotificationKind};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

impl<B: StorageBackend> AudioStore<B> {
    // --- Follows ---

    /// Adds the edge `follower_id → followee_id` and notifies the followee.
    ///
    /// The followee must be known, either as a user record or as the owner
    /// of some track.
    pub fn follow(&mut self, follower_id: &str, followee_id: &str) -> Result<()> {
        if follower_id.trim().is_empty() || followee_id.trim().is_empty() {
            return Err(MurmurError::invalid("follow: user ids must not be empty"));
        }
        if follower_id == followee_id {
            return Err(MurmurError::SelfReferenceRejected(format!(
                "{} cannot follow themselves",
                follower_id
            )));
        }
        if !self.is_known_user(followee_id) {
            return Err(MurmurError::not_found("user", followee_id));
        }
        let key = (follower_id.to_string(), followee_id.to_string());
        if self.state.follows.contains_key(&key) {
            return Err(MurmurError::already_exists(
                "follow",
                format!("{} -> {}", follower_id, followee_id),
            ));
        }

        self.state.follows.insert(
            key,
            Follow {
                follower_id: follower_id.to_string(),
                followee_id: followee_id.to_string(),
                created_at: Utc::now(),
            },
        );
        self.push_notification(
            followee_id,
            NotificationKind::Follow,
            json!({ "actorId": follower_id }),
        );
        self.write_through();
        debug!(follower_id, followee_id, "followed");
        Ok(())
    }

    pub fn unfollow(&mut self, follower_id: &str, followee_id: &str) -> Result<()> {
        let key = (follower_id.to_string(), followee_id.to_string());
        if self.state.follows.remove(&key).is_none() {
            return Err(MurmurError::not_found(
                "follow",
                format!("{} -> {}", follower_id, followee_id),
            ));
        }
        self.write_through();
        debug!(follower_id, followee_id, "unfollowed");
        Ok(())
    }

    pub fn is_following(&self, follower_id: &str, followee_id: &str) -> bool {
        self.state
            .follows
            .contains_key(&(follower_id.to_string(), followee_id.to_string()))
    }

    /// Ids following `user_id`, in id order.
    pub fn followers_of(&self, user_id: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .state
            .follows
            .values()
            .filter(|f| f.followee_id == user_id)
            .map(|f| f.follower_id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Ids `user_id` follows, in id order.
    pub fn following_of(&self, user_id: &str) -> Vec<String> {
        self.state
            .follows
            .keys()
            .filter(|(follower, _)| follower == user_id)
            .map(|(_, followee)| followee.clone())
            .collect()
    }

    pub(crate) fn is_known_user(&self, user_id: &str) -> bool {
        self.state.users.contains(user_id)
            || self.state.tracks.iter().any(|t| t.owner_id == user_id)
    }

    // --- Notifications ---

    pub fn add_notification(&mut self, notification: Notification) -> Result<()> {
        if notification.id.trim().is_empty() || notification.user_id.trim().is_empty() {
            return Err(MurmurError::invalid(
                "notification: id and userId must not be empty",
            ));
        }
        let id = notification.id.clone();
        self.state.notifications.insert(notification)?;
        self.write_through();
        debug!(notification_id = %id, "added notification");
        Ok(())
    }

    /// Notifications addressed to `user_id`, newest first.
    pub fn notifications_for(&self, user_id: &str) -> Vec<&Notification> {
        let mut list: Vec<&Notification> = self
            .state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .collect();
        // Equal timestamps list the most recently inserted first.
        list.reverse();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        list
    }

    pub fn unread_count(&self, user_id: &str) -> usize {
        self.state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.is_read())
            .count()
    }

    /// Stamps `readAt` if unset. Marking an already read notification is a no-op.
    pub fn mark_notification_read(&mut self, id: &str) -> Result<()> {
        let notification = self.state.notifications.require_mut(id)?;
        if notification.read_at.is_some() {
            return Ok(());
        }
        notification.read_at = Some(Utc::now());
        self.write_through();
        debug!(notification_id = %id, "marked notification read");
        Ok(())
    }

    /// Marks every unread notification of `user_id` read. Returns how many changed.
    pub fn mark_all_read(&mut self, user_id: &str) -> usize {
        let now = Utc::now();
        let mut changed = 0;
        for n in self.state.notifications.iter_mut() {
            if n.user_id == user_id && n.read_at.is_none() {
                n.read_at = Some(now);
                changed += 1;
            }
        }
        if changed > 0 {
            self.write_through();
        }
        changed
    }

    pub fn delete_notification(&mut self, id: &str) -> Result<Notification> {
        let removed = self
            .state
            .notifications
            .remove(id)
            .ok_or_else(|| MurmurError::not_found("notification", id))?;
        self.write_through();
        Ok(removed)
    }

    /// Queues a generated notification. The caller saves.
    pub(crate) fn push_notification(
        &mut self,
        user_id: &str,
        kind: NotificationKind,
        payload: serde_json::Value,
    ) {
        let notification = Notification::new(Uuid::new_v4().to_string(), user_id, kind, payload);
        if let Err(e) = self.state.notifications.insert(notification) {
            warn!(user_id = %user_id, error = %e, "dropped generated notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Comment, Track, User, UserSnapshot};
    use crate::store::mem_backend::MemBackend;

    fn make_store() -> AudioStore<MemBackend> {
        let mut store = AudioStore::open(MemBackend::new());
        store.add_user(User::new("u1", "ana")).unwrap();
        store.add_user(User::new("u2", "bo")).unwrap();
        store
    }

    #[test]
    fn test_follow_rules() {
        let mut store = make_store();
        store.follow("u1", "u2").unwrap();
        assert!(store.is_following("u1", "u2"));
        assert!(!store.is_following("u2", "u1"));

        assert!(matches!(
            store.follow("u1", "u2"),
            Err(MurmurError::AlreadyExists { kind: "follow", .. })
        ));
        assert!(matches!(
            store.follow("u1", "u1"),
            Err(MurmurError::SelfReferenceRejected(_))
        ));
        assert!(matches!(
            store.follow("u1", "ghost"),
            Err(MurmurError::NotFound { kind: "user", .. })
        ));
        assert_eq!(store.state.follows.len(), 1);
    }

    #[test]
    fn test_follow_track_owner_without_user_record() {
        let mut store = make_store();
        store
            .add_track(Track::new("t1", UserSnapshot::new("u3", "cy"), "T", "u", 1.0))
            .unwrap();
        store.delete_user("u3").unwrap();
        store.follow("u1", "u3").unwrap();
    }

    #[test]
    fn test_followers_and_following() {
        let mut store = make_store();
        store.add_user(User::new("u3", "cy")).unwrap();
        store.follow("u3", "u1").unwrap();
        store.follow("u2", "u1").unwrap();
        store.follow("u1", "u2").unwrap();

        assert_eq!(store.followers_of("u1"), vec!["u2", "u3"]);
        assert_eq!(store.following_of("u1"), vec!["u2"]);

        store.unfollow("u2", "u1").unwrap();
        assert_eq!(store.followers_of("u1"), vec!["u3"]);
        assert!(store.unfollow("u2", "u1").is_err());
    }

    #[test]
    fn test_delete_user_drops_edges_and_notifications() {
        let mut store = make_store();
        store.follow("u1", "u2").unwrap();
        store.follow("u2", "u1").unwrap();
        store.delete_user("u2").unwrap();

        assert!(store.state.follows.is_empty());
        assert!(store.notifications_for("u2").is_empty());
        assert_eq!(store.notifications_for("u1").len(), 1);
    }

    #[test]
    fn test_generated_notifications() {
        let mut store = make_store();
        store.follow("u2", "u1").unwrap();
        store
            .add_track(Track::new("t1", UserSnapshot::new("u1", "ana"), "T", "u", 1.0))
            .unwrap();
        store
            .add_comment(Comment::new("c1", "t1", UserSnapshot::new("u2", "bo"), "nice"))
            .unwrap();
        store
            .add_comment(Comment::new("c2", "t1", UserSnapshot::new("u1", "ana"), "thanks"))
            .unwrap();

        let kinds: Vec<NotificationKind> =
            store.notifications_for("u1").iter().map(|n| n.kind).collect();
        assert_eq!(kinds.len(), 2);
        assert!(kinds.contains(&NotificationKind::Follow));
        assert!(kinds.contains(&NotificationKind::Comment));
        assert!(store.notifications_for("u2").is_empty());
    }

    #[test]
    fn test_read_state() {
        let mut store = make_store();
        let mut n = Notification::new("n1", "u1", NotificationKind::System, json!({"msg": "hi"}));
        n.created_at = Utc::now() - chrono::Duration::minutes(5);
        store.add_notification(n).unwrap();
        store
            .add_notification(Notification::new("n2", "u1", NotificationKind::System, json!({})))
            .unwrap();
        assert!(store
            .add_notification(Notification::new("n2", "u1", NotificationKind::System, json!({})))
            .is_err());

        let ids: Vec<&str> = store.notifications_for("u1").iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n2", "n1"]);
        assert_eq!(store.unread_count("u1"), 2);

        store.mark_notification_read("n1").unwrap();
        let first_read = store.state.notifications.get("n1").unwrap().read_at;
        store.mark_notification_read("n1").unwrap();
        assert_eq!(store.state.notifications.get("n1").unwrap().read_at, first_read);
        assert_eq!(store.unread_count("u1"), 1);

        assert_eq!(store.mark_all_read("u1"), 1);
        assert_eq!(store.unread_count("u1"), 0);

        store.delete_notification("n1").unwrap();
        assert!(store.mark_notification_read("n1").is_err());
    }

    #[test]
    fn test_equal_timestamps_list_latest_insert_first() {
        let mut store = make_store();
        let at = Utc::now();
        for id in ["n1", "n2", "n3"] {
            let mut n = Notification::new(id, "u1", NotificationKind::System, json!({}));
            n.created_at = at;
            store.add_notification(n).unwrap();
        }
        let ids: Vec<&str> = store.notifications_for("u1").iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["n3", "n2", "n1"]);
    }

    #[test]
    fn test_generated_notifications_get_distinct_ids() {
        let mut store = make_store();
        store.push_notification("u1", NotificationKind::System, json!({}));
        store.push_notification("u1", NotificationKind::System, json!({}));

        let list = store.notifications_for("u1");
        assert_eq!(list.len(), 2);
        assert_ne!(list[0].id, list[1].id);
    }
}
