//! # Domain Model: Canonical Records
//!
//! This module defines the canonical entity records held by the store:
//! [`User`], [`Track`], [`Comment`], [`Follow`], [`PendingUpload`],
//! [`Notification`] and [`ContentReport`].
//!
//! ## Canonical vs Derived
//!
//! A canonical record is the single authoritative copy kept in memory and
//! written to the durable blob. Anything that depends on *who is looking*
//! (`isLiked`, `isBookmarked`) or on *other records* (`totalUploads`,
//! `totalLikes`, the embedded comment list of a track) is not part of these
//! structs. Those fields live on the projections in [`crate::views`].
//!
//! Two counters do live on [`Track`]: `likes` and `plays`. They are
//! materialized counters, rewritten by the store in the same call that
//! changes the underlying index, so the stored value always matches the
//! index cardinality.
//!
//! ## Owner Snapshots
//!
//! Tracks and comments embed a [`UserSnapshot`] of their owner/author as it
//! looked when the record was created. `Track::owner_id` is a redundant copy
//! of `owner.id`, kept so lookups by owner never have to reach into the
//! snapshot.
//!
//! ## Wire Names
//!
//! All records serialize with camelCase field names, matching the durable
//! blob layout described in [`crate::store::snapshot`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Records addressable by a unique string id inside a [`crate::store::collection::Collection`].
pub trait Entity {
    /// Human readable kind, used in error messages.
    const KIND: &'static str;

    fn id(&self) -> &str;
}

/// The identifying slice of a user, embedded into tracks and comments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub verified: bool,
}

impl UserSnapshot {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            avatar_url: None,
            verified: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            email: None,
            bio: None,
            avatar_url: None,
            verified: false,
            created_at: Utc::now(),
        }
    }

    /// Builds a user record out of an embedded snapshot.
    pub fn from_snapshot(snapshot: &UserSnapshot, created_at: DateTime<Utc>) -> Self {
        Self {
            id: snapshot.id.clone(),
            username: snapshot.username.clone(),
            email: None,
            bio: None,
            avatar_url: snapshot.avatar_url.clone(),
            verified: snapshot.verified,
            created_at,
        }
    }

    pub fn snapshot(&self) -> UserSnapshot {
        UserSnapshot {
            id: self.id.clone(),
            username: self.username.clone(),
            avatar_url: self.avatar_url.clone(),
            verified: self.verified,
        }
    }
}

impl Entity for User {
    const KIND: &'static str = "user";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TrackStatus {
    #[default]
    Published,
    Hidden,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub owner_id: String,
    pub owner: UserSnapshot,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    /// Length in seconds. Always > 0 for stored tracks.
    pub duration: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub status: TrackStatus,
    #[serde(default)]
    pub likes: usize,
    #[serde(default)]
    pub plays: u64,
    pub created_at: DateTime<Utc>,
}

impl Track {
    /// A published track with no tags, owned by `owner`.
    pub fn new(
        id: impl Into<String>,
        owner: UserSnapshot,
        title: impl Into<String>,
        url: impl Into<String>,
        duration: f64,
    ) -> Self {
        Self {
            id: id.into(),
            owner_id: owner.id.clone(),
            owner,
            title: title.into(),
            description: None,
            url: url.into(),
            duration,
            tags: Vec::new(),
            status: TrackStatus::Published,
            likes: 0,
            plays: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

impl Entity for Track {
    const KIND: &'static str = "track";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Shallow update for a track. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub url: Option<String>,
    pub duration: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub status: Option<TrackStatus>,
}

/// Shallow update for a user. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub username: Option<String>,
    pub email: Option<Option<String>>,
    pub bio: Option<Option<String>>,
    pub avatar_url: Option<Option<String>>,
    pub verified: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub track_id: String,
    pub content: String,
    pub author: UserSnapshot,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(
        id: impl Into<String>,
        track_id: impl Into<String>,
        author: UserSnapshot,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            track_id: track_id.into(),
            content: content.into(),
            author,
            created_at: Utc::now(),
        }
    }
}

impl Entity for Comment {
    const KIND: &'static str = "comment";

    fn id(&self) -> &str {
        &self.id
    }
}

/// A directed follow edge. Keyed by `(follower_id, followee_id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Follow {
    pub follower_id: String,
    pub followee_id: String,
    pub created_at: DateTime<Utc>,
}

impl Follow {
    pub fn key(&self) -> (String, String) {
        (self.follower_id.clone(), self.followee_id.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

/// A track waiting for moderator approval before it is published.
///
/// `decided_at`/`decided_by` are written exactly once, on the transition
/// out of [`UploadStatus::Pending`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingUpload {
    pub id: String,
    pub track: Track,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub status: UploadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decided_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl PendingUpload {
    pub fn new(id: impl Into<String>, track: Track) -> Self {
        Self {
            id: id.into(),
            track,
            submitted_at: Utc::now(),
            status: UploadStatus::Pending,
            decided_at: None,
            decided_by: None,
            note: None,
        }
    }
}

impl Entity for PendingUpload {
    const KIND: &'static str = "pending upload";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
    Moderation,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(default)]
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        kind: NotificationKind,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            kind,
            payload,
            created_at: Utc::now(),
            read_at: None,
        }
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

impl Entity for Notification {
    const KIND: &'static str = "notification";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportTarget {
    Track,
    Comment,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Pending,
    Reviewed,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentReport {
    pub id: String,
    #[serde(rename = "type")]
    pub target: ReportTarget,
    pub target_id: String,
    pub reporter_id: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,
}

impl ContentReport {
    pub fn new(
        id: impl Into<String>,
        target: ReportTarget,
        target_id: impl Into<String>,
        reporter_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            target,
            target_id: target_id.into(),
            reporter_id: reporter_id.into(),
            reason: reason.into(),
            status: ReportStatus::Pending,
            created_at: Utc::now(),
            reviewed_at: None,
            reviewed_by: None,
        }
    }
}

impl Entity for ContentReport {
    const KIND: &'static str = "report";

    fn id(&self) -> &str {
        &self.id
    }
}
