//! In-memory state: canonical collections plus the derived indexes.

use super::collection::Collection;
use crate::index::{PlayIndex, SetIndex};
use crate::model::{Comment, ContentReport, Follow, Notification, PendingUpload, Track, User, UserSnapshot};
use crate::tags::{count_tags, TagCount};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

pub(crate) type FollowKey = (String, String);

/// Record counts per collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreCounts {
    pub tracks: usize,
    pub users: usize,
    pub comments: usize,
    pub follows: usize,
    pub notifications: usize,
    pub reports: usize,
    pub pending_uploads: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    pub(crate) tracks: Collection<Track>,
    pub(crate) users: Collection<User>,
    pub(crate) comments: Collection<Comment>,
    /// track id → comment ids in insertion order. Never serialized.
    pub(crate) track_comments: HashMap<String, Vec<String>>,
    pub(crate) reports: Collection<ContentReport>,
    pub(crate) notifications: Collection<Notification>,
    pub(crate) pending_uploads: Collection<PendingUpload>,
    pub(crate) follows: BTreeMap<FollowKey, Follow>,
    pub(crate) likes: SetIndex,
    pub(crate) bookmarks: SetIndex,
    pub(crate) comment_likes: SetIndex,
    pub(crate) plays: PlayIndex,
    /// Full tag frequency table, sorted. Readers slice it.
    pub(crate) top_tags: Vec<TagCount>,
}

impl StoreState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store counts as empty when it holds no tracks.
    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    pub fn counts(&self) -> StoreCounts {
        StoreCounts {
            tracks: self.tracks.len(),
            users: self.users.len(),
            comments: self.comments.len(),
            follows: self.follows.len(),
            notifications: self.notifications.len(),
            reports: self.reports.len(),
            pending_uploads: self.pending_uploads.len(),
        }
    }

    pub fn recompute_top_tags(&mut self) {
        self.top_tags = count_tags(self.tracks.iter().map(|t| t.tags.as_slice()));
    }

    /// Registers the owner/author of an embedded snapshot as a user if unseen.
    /// Returns true when a user record was created.
    pub fn register_user(&mut self, snapshot: &UserSnapshot, created_at: DateTime<Utc>) -> bool {
        if snapshot.id.is_empty() || self.users.contains(&snapshot.id) {
            return false;
        }
        self.users
            .insert(User::from_snapshot(snapshot, created_at))
            .is_ok()
    }

    pub(crate) fn link_comment(&mut self, track_id: &str, comment_id: &str) {
        self.track_comments
            .entry(track_id.to_string())
            .or_default()
            .push(comment_id.to_string());
    }

    pub(crate) fn unlink_comment(&mut self, track_id: &str, comment_id: &str) {
        if let Some(ids) = self.track_comments.get_mut(track_id) {
            ids.retain(|id| id != comment_id);
            if ids.is_empty() {
                self.track_comments.remove(track_id);
            }
        }
    }

    pub fn rebuild_comment_index(&mut self) {
        let mut index: HashMap<String, Vec<String>> = HashMap::new();
        for comment in &self.comments {
            index
                .entry(comment.track_id.clone())
                .or_default()
                .push(comment.id.clone());
        }
        self.track_comments = index;
    }

    /// Comments addressed to `track_id`, oldest first.
    pub fn comments_of(&self, track_id: &str) -> Vec<&Comment> {
        self.track_comments
            .get(track_id)
            .map(|ids| ids.iter().filter_map(|id| self.comments.get(id)).collect())
            .unwrap_or_default()
    }

    /// Rewrites every track's materialized counters from the indexes.
    pub fn sync_track_counters(&mut self) {
        for track in self.tracks.iter_mut() {
            track.likes = self.likes.count(&track.id);
            track.plays = self.plays.get(&track.id);
        }
    }

    /// Drops index keys and comments pointing at records that do not exist.
    /// Returns how many entries were dropped.
    pub fn drop_dangling_references(&mut self) -> usize {
        let tracks = &self.tracks;
        let mut dropped = self
            .comments
            .extract_where(|c| !tracks.contains(&c.track_id))
            .len();

        dropped += self.likes.retain_keys(|k| tracks.contains(k));
        dropped += self.bookmarks.retain_keys(|k| tracks.contains(k));
        dropped += self.plays.retain_keys(|k| tracks.contains(k));

        let comments = &self.comments;
        dropped += self.comment_likes.retain_keys(|k| comments.contains(k));
        dropped
    }
}
