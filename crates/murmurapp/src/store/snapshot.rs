//! # Durable Blob Format
//!
//! The whole store is written as one JSON document under a versioned key
//! ([`super::STORE_KEY`]). Its logical shape:
//!
//! ```text
//! {
//!   tracks, users, comments, reports, notifications,
//!   pendingUploads, follows,                      // canonical arrays
//!   likes, bookmarks, commentLikes,               // [{key, values: [...]}]
//!   plays,                                        // [{key, count}]
//!   topTags,                                      // [{tag, count}]
//!   timestamp                                     // RFC 3339
//! }
//! ```
//!
//! Canonical arrays are written in collection order and read back verbatim.
//! Set indexes are written as ordered adjacency lists and rebuilt into
//! [`SetIndex`] on restore. Every field defaults to empty when missing, so a
//! blob written by an older build of the same schema still loads.
//!
//! Restoring is defensive about what it finds: repeated ids keep their first
//! record, self-follow edges are rejected, index entries and comments
//! pointing at unknown records are dropped, and materialized counters and the
//! top tags cache are recomputed from what survived.
//! [`RestoreReport`] says how much of that happened.

use super::collection::Collection;
use super::state::StoreState;
use crate::error::Result;
use crate::index::{IndexEntry, PlayEntry, PlayIndex, SetIndex};
use crate::model::{Comment, ContentReport, Follow, Notification, PendingUpload, Track, User};
use crate::tags::TagCount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    #[serde(default)]
    pub tracks: Vec<Track>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub reports: Vec<ContentReport>,
    #[serde(default)]
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub pending_uploads: Vec<PendingUpload>,
    #[serde(default)]
    pub follows: Vec<Follow>,
    #[serde(default)]
    pub likes: Vec<IndexEntry>,
    #[serde(default)]
    pub bookmarks: Vec<IndexEntry>,
    #[serde(default)]
    pub comment_likes: Vec<IndexEntry>,
    #[serde(default)]
    pub plays: Vec<PlayEntry>,
    #[serde(default)]
    pub top_tags: Vec<TagCount>,
    pub timestamp: DateTime<Utc>,
}

/// What [`StoreSnapshot::restore`] had to discard.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RestoreReport {
    /// Repeated ids and self-follow edges.
    pub rejected_records: usize,
    pub dangling_references: usize,
}

impl RestoreReport {
    pub fn is_clean(&self) -> bool {
        self.rejected_records == 0 && self.dangling_references == 0
    }
}

impl StoreSnapshot {
    pub fn capture(state: &StoreState) -> Self {
        Self {
            tracks: state.tracks.to_vec(),
            users: state.users.to_vec(),
            comments: state.comments.to_vec(),
            reports: state.reports.to_vec(),
            notifications: state.notifications.to_vec(),
            pending_uploads: state.pending_uploads.to_vec(),
            follows: state.follows.values().cloned().collect(),
            likes: state.likes.to_entries(),
            bookmarks: state.bookmarks.to_entries(),
            comment_likes: state.comment_likes.to_entries(),
            plays: state.plays.to_entries(),
            top_tags: state.top_tags.clone(),
            timestamp: Utc::now(),
        }
    }

    pub fn restore(self) -> (StoreState, RestoreReport) {
        let mut report = RestoreReport::default();

        let (tracks, d1) = Collection::from_records(self.tracks);
        let (users, d2) = Collection::from_records(self.users);
        let (comments, d3) = Collection::from_records(self.comments);
        let (reports, d4) = Collection::from_records(self.reports);
        let (notifications, d5) = Collection::from_records(self.notifications);
        let (pending_uploads, d6) = Collection::from_records(self.pending_uploads);
        report.rejected_records = d1 + d2 + d3 + d4 + d5 + d6;

        let mut state = StoreState {
            tracks,
            users,
            comments,
            reports,
            notifications,
            pending_uploads,
            likes: SetIndex::from_entries(self.likes),
            bookmarks: SetIndex::from_entries(self.bookmarks),
            comment_likes: SetIndex::from_entries(self.comment_likes),
            plays: PlayIndex::from_entries(self.plays),
            ..StoreState::default()
        };

        for follow in self.follows {
            let key = follow.key();
            if follow.follower_id == follow.followee_id || state.follows.contains_key(&key) {
                report.rejected_records += 1;
                continue;
            }
            state.follows.insert(key, follow);
        }

        report.dangling_references = state.drop_dangling_references();
        state.rebuild_comment_index();
        state.sync_track_counters();
        state.recompute_top_tags();

        (state, report)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}
