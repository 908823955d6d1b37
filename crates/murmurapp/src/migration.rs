//! # Schema Migration: v1 → v2
//!
//! The previous schema stored everything under [`LEGACY_STORE_KEY`] in a
//! looser shape:
//!
//! ```text
//! v1 blob                                  v2 blob
//! ───────                                  ───────
//! tracks[].user | tracks[].owner      →    tracks[].owner + tracks[].ownerId
//! tracks[].tags (optional)            →    tracks[].tags (defaults to [])
//! tracks[].comments[] (embedded)      ┐
//! comments[] (flat, may repeat ids)   ┴→   comments[] (one record per id)
//! comments[].text | .content          →    comments[].content
//! likes: [[trackId, [userId…]]…]      →    likes: [{key, values}…]
//! plays: [[trackId, count]…]          →    plays: [{key, count}…]
//! notifications[].read (bool)         →    notifications[].readAt
//! reports[] / pendingUploads[]        →    same, targets re-checked
//! (absent)                            →    topTags (recomputed)
//! ```
//!
//! ## Guard
//!
//! Migration runs at most once. The [`MIGRATION_FLAG_KEY`] flag is the
//! primary guard: once set, nothing is read. Independently, a current store
//! that already holds a track is never touched; the flag is then set so the
//! decision is not revisited. Migration never merges into existing data.
//!
//! An unreadable legacy blob is logged and left in place with the flag
//! unset, so a later build can retry it.
//!
//! ## Dirty Legacy Data
//!
//! Records that cannot be expressed in the current schema (no owner, empty
//! title, non-positive duration, a comment whose track is gone, a report
//! whose target is gone, an unknown notification type) are skipped with a
//! warning rather than failing the whole migration. Tags that fail
//! validation are dropped from their track.
//!
//! The legacy blob itself is never deleted here; see
//! [`AudioStore::purge_legacy_blob`].

use crate::error::{MurmurError, Result};
use crate::index::{IndexEntry, PlayEntry, PlayIndex, SetIndex};
use crate::model::{
    Comment, ContentReport, Follow, Notification, PendingUpload, ReportStatus, ReportTarget, Track,
    TrackStatus, UploadStatus, User, UserSnapshot,
};
use crate::store::audio_store::validate_track;
use crate::store::{
    AudioStore, StorageBackend, StoreState, LEGACY_STORE_KEY, MIGRATION_FLAG_KEY,
};
use crate::tags::validate_tag;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyStore {
    #[serde(default)]
    tracks: Vec<LegacyTrack>,
    #[serde(default)]
    users: Vec<LegacyUser>,
    #[serde(default)]
    comments: Vec<LegacyComment>,
    #[serde(default)]
    follows: Vec<LegacyFollow>,
    #[serde(default)]
    notifications: Vec<LegacyNotification>,
    #[serde(default)]
    reports: Vec<LegacyReport>,
    #[serde(default)]
    pending_uploads: Vec<LegacyUpload>,
    #[serde(default)]
    likes: Vec<(String, Vec<String>)>,
    #[serde(default)]
    bookmarks: Vec<(String, Vec<String>)>,
    #[serde(default)]
    comment_likes: Vec<(String, Vec<String>)>,
    #[serde(default)]
    plays: Vec<(String, u64)>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyTrack {
    id: String,
    #[serde(default, alias = "user")]
    owner: Option<UserSnapshot>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: String,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    tags: Option<Vec<String>>,
    #[serde(default)]
    comments: Vec<LegacyComment>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyUser {
    id: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    bio: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
    #[serde(default)]
    verified: bool,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyComment {
    id: String,
    #[serde(default)]
    track_id: Option<String>,
    #[serde(default, alias = "text")]
    content: String,
    #[serde(alias = "user")]
    author: Option<UserSnapshot>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyFollow {
    follower_id: String,
    followee_id: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

/// Enum-valued fields (`type`, `status`) are kept as strings so one unknown
/// value skips its record instead of failing the whole blob.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyNotification {
    id: String,
    #[serde(default)]
    user_id: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    payload: serde_json::Value,
    #[serde(default)]
    read: bool,
    #[serde(default)]
    read_at: Option<DateTime<Utc>>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyReport {
    id: String,
    #[serde(default, rename = "type")]
    target: String,
    #[serde(default)]
    target_id: String,
    #[serde(default)]
    reporter_id: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    reviewed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    reviewed_by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyUpload {
    id: String,
    track: LegacyTrack,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    decided_at: Option<DateTime<Utc>>,
    #[serde(default)]
    decided_by: Option<String>,
    #[serde(default)]
    note: Option<String>,
}

/// What a migration run carried over.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    pub tracks: usize,
    pub users: usize,
    pub comments: usize,
    pub notifications: usize,
    pub reports: usize,
    pub pending_uploads: usize,
    /// Records and index entries dropped as invalid, duplicate or dangling.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationOutcome {
    Migrated(MigrationReport),
    /// The marker flag was already set; nothing was read.
    AlreadyMarked,
    /// The current store already holds tracks; left untouched.
    StoreNotEmpty,
    /// No legacy blob exists.
    NoLegacyData,
    /// A legacy blob exists but cannot be parsed. The flag stays unset.
    LegacyUnreadable,
}

/// Runs the one-time v1 → v2 migration if it is due.
///
/// Returns an error only when the migrated store could not be saved; in that
/// case the marker flag is not set and in-memory state holds the migrated data.
pub fn run_migration<B: StorageBackend>(store: &mut AudioStore<B>) -> Result<MigrationOutcome> {
    let marked = store.backend.read_flag(MIGRATION_FLAG_KEY).unwrap_or_else(|e| {
        warn!(key = MIGRATION_FLAG_KEY, error = %e, "could not read migration flag");
        false
    });
    if marked {
        return Ok(MigrationOutcome::AlreadyMarked);
    }

    if store.state.has_tracks() {
        info!("current store already holds tracks, skipping migration");
        store.backend.write_flag(MIGRATION_FLAG_KEY, true)?;
        return Ok(MigrationOutcome::StoreNotEmpty);
    }

    let raw = match store.backend.read_blob(LEGACY_STORE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => {
            store.backend.write_flag(MIGRATION_FLAG_KEY, true)?;
            return Ok(MigrationOutcome::NoLegacyData);
        }
        Err(e) => {
            warn!(key = LEGACY_STORE_KEY, error = %e, "could not read legacy blob");
            return Ok(MigrationOutcome::LegacyUnreadable);
        }
    };
    let legacy: LegacyStore = match serde_json::from_str(&raw) {
        Ok(legacy) => legacy,
        Err(e) => {
            warn!(key = LEGACY_STORE_KEY, error = %e, "legacy blob is corrupt, not migrating");
            return Ok(MigrationOutcome::LegacyUnreadable);
        }
    };

    let (state, report) = convert(legacy);
    store.state = state;
    store.save()?;
    store.backend.write_flag(MIGRATION_FLAG_KEY, true)?;

    info!(
        tracks = report.tracks,
        users = report.users,
        comments = report.comments,
        skipped = report.skipped,
        "migrated legacy store"
    );
    Ok(MigrationOutcome::Migrated(report))
}

fn convert(legacy: LegacyStore) -> (StoreState, MigrationReport) {
    let now = Utc::now();
    let mut state = StoreState::new();
    let mut report = MigrationReport::default();

    for user in legacy.users {
        if user.id.trim().is_empty() || user.username.trim().is_empty() {
            warn!(user_id = %user.id, "skipping legacy user without id or username");
            report.skipped += 1;
            continue;
        }
        let record = User {
            id: user.id,
            username: user.username,
            email: user.email,
            bio: user.bio,
            avatar_url: user.avatar_url,
            verified: user.verified,
            created_at: user.created_at.unwrap_or(now),
        };
        if state.users.insert(record).is_err() {
            report.skipped += 1;
        }
    }

    let mut comments: Vec<LegacyComment> = Vec::new();
    for mut legacy_track in legacy.tracks {
        let track_id = legacy_track.id.clone();
        for mut comment in std::mem::take(&mut legacy_track.comments) {
            comment.track_id.get_or_insert_with(|| track_id.clone());
            comments.push(comment);
        }

        let Some(track) = migrate_track(legacy_track, now) else {
            report.skipped += 1;
            continue;
        };
        state.register_user(&track.owner, track.created_at);
        if state.tracks.insert(track).is_err() {
            report.skipped += 1;
        }
    }

    // Embedded copies come first, so they win over the flat duplicates.
    comments.extend(legacy.comments);
    for comment in comments {
        match migrate_comment(comment, now, &state) {
            Some(record) => {
                state.register_user(&record.author, record.created_at);
                if state.comments.insert(record).is_err() {
                    report.skipped += 1;
                }
            }
            None => report.skipped += 1,
        }
    }

    for follow in legacy.follows {
        let key = (follow.follower_id.clone(), follow.followee_id.clone());
        if follow.follower_id == follow.followee_id || state.follows.contains_key(&key) {
            report.skipped += 1;
            continue;
        }
        state.follows.insert(
            key,
            Follow {
                follower_id: follow.follower_id,
                followee_id: follow.followee_id,
                created_at: follow.created_at.unwrap_or(now),
            },
        );
    }

    for notification in legacy.notifications {
        match migrate_notification(notification, now) {
            Some(record) => {
                if state.notifications.insert(record).is_err() {
                    report.skipped += 1;
                }
            }
            None => report.skipped += 1,
        }
    }

    for legacy_report in legacy.reports {
        match migrate_report(legacy_report, now, &state) {
            Some(record) => {
                if state.reports.insert(record).is_err() {
                    report.skipped += 1;
                }
            }
            None => report.skipped += 1,
        }
    }

    for upload in legacy.pending_uploads {
        match migrate_upload(upload, now) {
            Some(record) => {
                if state.pending_uploads.insert(record).is_err() {
                    report.skipped += 1;
                }
            }
            None => report.skipped += 1,
        }
    }

    state.likes = SetIndex::from_entries(pairs_to_entries(legacy.likes));
    state.bookmarks = SetIndex::from_entries(pairs_to_entries(legacy.bookmarks));
    state.comment_likes = SetIndex::from_entries(pairs_to_entries(legacy.comment_likes));
    state.plays = PlayIndex::from_entries(
        legacy
            .plays
            .into_iter()
            .map(|(key, count)| PlayEntry { key, count }),
    );

    report.skipped += state.drop_dangling_references();
    state.rebuild_comment_index();
    state.sync_track_counters();
    state.recompute_top_tags();

    report.tracks = state.tracks.len();
    report.users = state.users.len();
    report.comments = state.comments.len();
    report.notifications = state.notifications.len();
    report.reports = state.reports.len();
    report.pending_uploads = state.pending_uploads.len();
    (state, report)
}

fn migrate_track(legacy: LegacyTrack, now: DateTime<Utc>) -> Option<Track> {
    let Some(owner) = legacy.owner else {
        warn!(track_id = %legacy.id, "skipping legacy track without owner");
        return None;
    };
    let tags: Vec<String> = legacy
        .tags
        .unwrap_or_default()
        .into_iter()
        .filter(|t| validate_tag(t).is_ok())
        .collect();
    let track = Track {
        id: legacy.id,
        owner_id: owner.id.clone(),
        owner,
        title: legacy.title,
        description: legacy.description,
        url: legacy.url,
        duration: legacy.duration,
        tags,
        status: TrackStatus::Published,
        likes: 0,
        plays: 0,
        created_at: legacy.created_at.unwrap_or(now),
    };
    if let Err(e) = validate_track(&track) {
        warn!(track_id = %track.id, error = %e, "skipping invalid legacy track");
        return None;
    }
    Some(track)
}

/// Parses a lowercase enum tag through its serde representation.
fn parse_tag<T: serde::de::DeserializeOwned>(value: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(value.trim().to_lowercase())).ok()
}

fn migrate_notification(legacy: LegacyNotification, now: DateTime<Utc>) -> Option<Notification> {
    if legacy.id.trim().is_empty() || legacy.user_id.trim().is_empty() {
        warn!(notification_id = %legacy.id, "skipping legacy notification without id or recipient");
        return None;
    }
    let Some(kind) = parse_tag(&legacy.kind) else {
        warn!(notification_id = %legacy.id, kind = %legacy.kind, "skipping legacy notification of unknown type");
        return None;
    };
    let created_at = legacy.created_at.unwrap_or(now);
    let read_at = legacy.read_at.or(legacy.read.then_some(created_at));
    Some(Notification {
        id: legacy.id,
        user_id: legacy.user_id,
        kind,
        payload: legacy.payload,
        created_at,
        read_at,
    })
}

fn migrate_report(legacy: LegacyReport, now: DateTime<Utc>, state: &StoreState) -> Option<ContentReport> {
    if legacy.id.trim().is_empty() || legacy.reporter_id.trim().is_empty() {
        warn!(report_id = %legacy.id, "skipping legacy report without id or reporter");
        return None;
    }
    let Some(target) = parse_tag::<ReportTarget>(&legacy.target) else {
        warn!(report_id = %legacy.id, target = %legacy.target, "skipping legacy report of unknown type");
        return None;
    };
    let exists = match target {
        ReportTarget::Track => state.tracks.contains(&legacy.target_id),
        ReportTarget::Comment => state.comments.contains(&legacy.target_id),
        ReportTarget::User => {
            state.users.contains(&legacy.target_id)
                || state.tracks.iter().any(|t| t.owner_id == legacy.target_id)
        }
    };
    if !exists {
        warn!(report_id = %legacy.id, target_id = %legacy.target_id, "skipping legacy report on unknown target");
        return None;
    }
    let Some(status) = legacy.status.as_deref().map_or(Some(ReportStatus::Pending), parse_tag) else {
        warn!(report_id = %legacy.id, "skipping legacy report with unknown status");
        return None;
    };
    Some(ContentReport {
        id: legacy.id,
        target,
        target_id: legacy.target_id,
        reporter_id: legacy.reporter_id,
        reason: legacy.reason,
        status,
        created_at: legacy.created_at.unwrap_or(now),
        reviewed_at: legacy.reviewed_at,
        reviewed_by: legacy.reviewed_by,
    })
}

fn migrate_upload(legacy: LegacyUpload, now: DateTime<Utc>) -> Option<PendingUpload> {
    if legacy.id.trim().is_empty() {
        warn!("skipping legacy upload without id");
        return None;
    }
    let Some(status) = legacy.status.as_deref().map_or(Some(UploadStatus::Pending), parse_tag) else {
        warn!(upload_id = %legacy.id, "skipping legacy upload with unknown status");
        return None;
    };
    let track = migrate_track(legacy.track, now)?;
    Some(PendingUpload {
        id: legacy.id,
        track,
        submitted_at: legacy.submitted_at.unwrap_or(now),
        status,
        decided_at: legacy.decided_at,
        decided_by: legacy.decided_by,
        note: legacy.note,
    })
}

fn migrate_comment(comment: LegacyComment, now: DateTime<Utc>, state: &StoreState) -> Option<Comment> {
    let track_id = comment.track_id.unwrap_or_default();
    if !state.tracks.contains(&track_id) {
        warn!(comment_id = %comment.id, track_id = %track_id, "skipping legacy comment on unknown track");
        return None;
    }
    let author = comment.author.filter(|a| !a.id.trim().is_empty())?;
    if comment.id.trim().is_empty() || comment.content.trim().is_empty() {
        warn!(comment_id = %comment.id, "skipping empty legacy comment");
        return None;
    }
    Some(Comment {
        id: comment.id,
        track_id,
        content: comment.content,
        author,
        created_at: comment.created_at.unwrap_or(now),
    })
}

fn pairs_to_entries(pairs: Vec<(String, Vec<String>)>) -> impl Iterator<Item = IndexEntry> {
    pairs
        .into_iter()
        .map(|(key, values)| IndexEntry { key, values })
}

impl<B: StorageBackend> AudioStore<B> {
    /// Deletes the superseded v1 blob. Returns whether one existed.
    ///
    /// Refuses while the migration flag is unset, since the legacy blob may
    /// still hold the only copy of the data.
    pub fn purge_legacy_blob(&mut self) -> Result<bool> {
        if self.backend.read_blob(LEGACY_STORE_KEY)?.is_none() {
            return Ok(false);
        }
        if !self.backend.read_flag(MIGRATION_FLAG_KEY)? {
            return Err(MurmurError::invalid(
                "legacy blob: refusing to purge before migration has run",
            ));
        }
        self.backend.delete_blob(LEGACY_STORE_KEY)?;
        info!(key = LEGACY_STORE_KEY, "purged legacy blob");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem_backend::MemBackend;
    use crate::store::STORE_KEY;
    use crate::tags::TagCount;

    const LEGACY: &str = r#"{
        "tracks": [
            {
                "id": "t1",
                "user": {"id": "u1", "username": "ana"},
                "title": "Rain", "url": "data:a", "duration": 12,
                "tags": ["ASMR", "Rain"],
                "likes": 40,
                "comments": [
                    {"id": "c1", "text": "lovely", "user": {"id": "u2", "username": "bo"}}
                ],
                "createdAt": "2024-03-01T10:00:00Z"
            },
            {
                "id": "t2",
                "owner": {"id": "u1", "username": "ana"},
                "title": "Waves", "url": "data:b", "duration": 30
            },
            {"id": "t3", "title": "orphan", "url": "data:c", "duration": 5},
            {"id": "t4", "user": {"id": "u1", "username": "ana"}, "title": "", "url": "x", "duration": 1}
        ],
        "users": [{"id": "u1", "username": "ana", "bio": "hi"}],
        "comments": [
            {"id": "c1", "trackId": "t1", "content": "lovely", "author": {"id": "u2", "username": "bo"}},
            {"id": "c2", "trackId": "t2", "content": "calm", "author": {"id": "u3", "username": "cy"}},
            {"id": "c9", "trackId": "gone", "content": "?", "author": {"id": "u3", "username": "cy"}}
        ],
        "likes": [["t1", ["u2", "u3"]], ["gone", ["u2"]]],
        "bookmarks": [["t2", ["u2"]]],
        "commentLikes": [["c1", ["u1"]]],
        "plays": [["t1", 7]],
        "notifications": [
            {"id": "n1", "userId": "u1", "type": "Like", "payload": {"actorId": "u2", "trackId": "t1"},
             "read": true, "createdAt": "2024-03-02T10:00:00Z"},
            {"id": "n2", "userId": "u1", "type": "poke"}
        ],
        "reports": [
            {"id": "r1", "type": "comment", "targetId": "c1", "reporterId": "u1", "reason": "spam",
             "status": "reviewed", "reviewedBy": "mod"},
            {"id": "r2", "type": "track", "targetId": "t3", "reporterId": "u1"}
        ],
        "pendingUploads": [
            {"id": "p1", "submittedAt": "2024-03-03T10:00:00Z",
             "track": {"id": "t9", "user": {"id": "u4", "username": "di"}, "title": "Draft", "url": "data:d", "duration": 3}}
        ]
    }"#;

    fn legacy_backend() -> MemBackend {
        let backend = MemBackend::new();
        backend.insert_raw(LEGACY_STORE_KEY, LEGACY);
        backend
    }

    #[test]
    fn test_migrates_legacy_blob() {
        let mut store = AudioStore::open(legacy_backend());
        let outcome = run_migration(&mut store).unwrap();

        let MigrationOutcome::Migrated(report) = outcome else {
            panic!("expected migration, got {:?}", outcome);
        };
        assert_eq!(report.tracks, 2);
        assert_eq!(report.comments, 2);
        assert_eq!((report.notifications, report.reports, report.pending_uploads), (1, 1, 1));
        // t3, t4, flat duplicate c1, c9, the dangling like entry, n2 (unknown
        // type) and r2 (report on the skipped t3).
        assert_eq!(report.skipped, 7);

        let t1 = store.get_track_by_id("t1").unwrap();
        assert_eq!(t1.owner_id, "u1");
        assert_eq!(t1.likes, 2);
        assert_eq!(t1.plays, 7);
        assert!(store.get_track_by_id("t2").unwrap().tags.is_empty());

        assert_eq!(store.get_comment_by_id("c1").unwrap().content, "lovely");
        assert_eq!(store.state().comments_of("t1").len(), 1);
        assert!(store.is_bookmarked("t2", "u2"));
        assert_eq!(store.state().comment_likes.count("c1"), 1);
        assert_eq!(
            store.top_tags(10),
            vec![TagCount::new("asmr", 1), TagCount::new("rain", 1)]
        );
        assert_eq!(store.get_user_by_id("u1").unwrap().bio.as_deref(), Some("hi"));
        assert!(store.get_user_by_id("u3").is_ok());

        let inbox = store.notifications_for("u1");
        assert_eq!(inbox.len(), 1);
        assert!(inbox[0].is_read());
        let r1 = store.get_report_by_id("r1").unwrap();
        assert_eq!((r1.target, r1.status), (ReportTarget::Comment, ReportStatus::Reviewed));
        let p1 = store.get_upload_by_id("p1").unwrap();
        assert_eq!((p1.status, p1.track.owner_id.as_str()), (UploadStatus::Pending, "u4"));
        assert!(store.get_track_by_id("t9").is_err());
    }

    #[test]
    fn test_migration_persists_and_marks() {
        let mut store = AudioStore::open(legacy_backend());
        run_migration(&mut store).unwrap();

        let backend = store.into_backend();
        assert!(backend.read_flag(MIGRATION_FLAG_KEY).unwrap());
        assert!(backend.read_blob(STORE_KEY).unwrap().is_some());
        assert!(backend.read_blob(LEGACY_STORE_KEY).unwrap().is_some());

        let reopened = AudioStore::open(backend);
        assert_eq!(reopened.get_all_tracks(None).len(), 2);
    }

    #[test]
    fn test_second_run_changes_nothing() {
        let mut store = AudioStore::open(legacy_backend());
        run_migration(&mut store).unwrap();
        let after_first = store.state().clone();

        assert_eq!(run_migration(&mut store).unwrap(), MigrationOutcome::AlreadyMarked);
        assert_eq!(store.state(), &after_first);

        // Even with the marker gone, a populated store is never merged into.
        store.backend.delete_blob(MIGRATION_FLAG_KEY).unwrap();
        assert_eq!(run_migration(&mut store).unwrap(), MigrationOutcome::StoreNotEmpty);
        assert_eq!(store.state(), &after_first);
    }

    #[test]
    fn test_non_empty_store_is_left_alone() {
        let backend = legacy_backend();
        let mut store = AudioStore::open(backend);
        store
            .add_track(Track::new("mine", UserSnapshot::new("u7", "g"), "Mine", "u", 2.0))
            .unwrap();

        assert_eq!(run_migration(&mut store).unwrap(), MigrationOutcome::StoreNotEmpty);
        assert_eq!(store.get_all_tracks(None).len(), 1);
        assert!(store.backend.read_flag(MIGRATION_FLAG_KEY).unwrap());
    }

    #[test]
    fn test_no_legacy_blob() {
        let mut store = AudioStore::open(MemBackend::new());
        assert_eq!(run_migration(&mut store).unwrap(), MigrationOutcome::NoLegacyData);
        assert!(store.backend.read_flag(MIGRATION_FLAG_KEY).unwrap());
    }

    #[test]
    fn test_corrupt_legacy_blob_leaves_flag_unset() {
        let backend = MemBackend::new();
        backend.insert_raw(LEGACY_STORE_KEY, "[[[");
        let mut store = AudioStore::open(backend);

        assert_eq!(run_migration(&mut store).unwrap(), MigrationOutcome::LegacyUnreadable);
        assert!(!store.backend.read_flag(MIGRATION_FLAG_KEY).unwrap());
        assert!(!store.state().has_tracks());
    }

    #[test]
    fn test_failed_save_does_not_mark() {
        let backend = legacy_backend();
        backend.set_simulate_write_error(true);
        let mut store = AudioStore::open(backend);

        assert!(run_migration(&mut store).is_err());
        store.backend.set_simulate_write_error(false);
        assert!(!store.backend.read_flag(MIGRATION_FLAG_KEY).unwrap());
    }

    #[test]
    fn test_purge_requires_migration() {
        let mut store = AudioStore::open(legacy_backend());
        assert!(matches!(
            store.purge_legacy_blob(),
            Err(MurmurError::Invalid(_))
        ));

        run_migration(&mut store).unwrap();
        assert!(store.purge_legacy_blob().unwrap());
        assert!(!store.purge_legacy_blob().unwrap());
        assert!(store.get_track_by_id("t1").is_ok());
    }
}
