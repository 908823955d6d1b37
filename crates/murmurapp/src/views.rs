//! # Read Enrichment: Per-Viewer Projections
//!
//! Canonical records never carry viewer-relative or cross-record fields.
//! Every read that reaches a consumer goes through this module, which builds
//! a fresh projection out of a canonical record plus the current index state:
//!
//! - [`TrackView`]: a track copy with `isLiked`/`isBookmarked` for the
//!   viewer, `likes` re-read from the like index, and the track's comments
//!   embedded in insertion order.
//! - [`CommentView`]: a comment copy with its like count and `isLiked`.
//! - [`UserView`]: a user record (explicit or *phantom*) with live
//!   `totalUploads`/`totalLikes` and follow counts.
//!
//! Projections are owned values. Mutating one never reaches back into the
//! store.
//!
//! ## Phantom Users
//!
//! A track's owner is normally registered as a user when the track is
//! added, but a user record can be deleted while its tracks stay. Such owners
//! still appear in [`AudioStore::get_all_users`], built from the most recent
//! owner snapshot and flagged `phantom`.
//!
//! ## Ordering
//!
//! [`AudioStore::get_all_tracks`] returns newest first. [`AudioStore::tracks_sorted`]
//! takes a [`TrackSort`]; sorting is stable, so tracks with equal keys keep
//! their collection (insertion) order.

use crate::error::{MurmurError, Result};
use crate::model::{Comment, Track, User};
use crate::store::{AudioStore, StorageBackend};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackView {
    #[serde(flatten)]
    pub track: Track,
    pub is_liked: bool,
    pub is_bookmarked: bool,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: Comment,
    pub likes: usize,
    pub is_liked: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(flatten)]
    pub user: User,
    /// Inferred from track ownership; no explicit record exists.
    pub phantom: bool,
    pub total_uploads: usize,
    pub total_likes: usize,
    pub followers: usize,
    pub following: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Created,
    Likes,
    Plays,
    Title,
    Duration,
}

impl FromStr for SortKey {
    type Err = MurmurError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "created" | "date" => Ok(SortKey::Created),
            "likes" => Ok(SortKey::Likes),
            "plays" => Ok(SortKey::Plays),
            "title" => Ok(SortKey::Title),
            "duration" => Ok(SortKey::Duration),
            other => Err(MurmurError::invalid(format!("sort key: unknown {:?}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Sort key plus direction. The default is newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrackSort {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl TrackSort {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    fn compare(&self, a: &Track, b: &Track) -> Ordering {
        let ord = match self.key {
            SortKey::Created => a.created_at.cmp(&b.created_at),
            SortKey::Likes => a.likes.cmp(&b.likes),
            SortKey::Plays => a.plays.cmp(&b.plays),
            SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            SortKey::Duration => a.duration.total_cmp(&b.duration),
        };
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

impl<B: StorageBackend> AudioStore<B> {
    /// Every track projected for `viewer`, newest first.
    ///
    /// Without a viewer `isLiked`/`isBookmarked` are false everywhere.
    pub fn get_all_tracks(&self, viewer: Option<&str>) -> Vec<TrackView> {
        self.tracks_sorted(viewer, TrackSort::default())
    }

    pub fn tracks_sorted(&self, viewer: Option<&str>, sort: TrackSort) -> Vec<TrackView> {
        let mut views: Vec<TrackView> = self
            .state
            .tracks
            .iter()
            .map(|t| self.track_view(t, viewer))
            .collect();
        views.sort_by(|a, b| sort.compare(&a.track, &b.track));
        views
    }

    pub fn get_track_view(&self, id: &str, viewer: Option<&str>) -> Result<TrackView> {
        let track = self.state.tracks.require(id)?;
        Ok(self.track_view(track, viewer))
    }

    /// Tracks owned by `owner_id`, newest first.
    pub fn tracks_by_owner(&self, owner_id: &str, viewer: Option<&str>) -> Vec<TrackView> {
        let mut views: Vec<TrackView> = self
            .state
            .tracks
            .iter()
            .filter(|t| t.owner_id == owner_id)
            .map(|t| self.track_view(t, viewer))
            .collect();
        views.sort_by(|a, b| TrackSort::default().compare(&a.track, &b.track));
        views
    }

    /// Tracks `viewer` has bookmarked, newest first.
    pub fn bookmarked_tracks(&self, viewer: &str) -> Vec<TrackView> {
        let mut views: Vec<TrackView> = self
            .state
            .bookmarks
            .keys_with_member(viewer)
            .filter_map(|id| self.state.tracks.get(id))
            .map(|t| self.track_view(t, Some(viewer)))
            .collect();
        views.sort_by(|a, b| TrackSort::default().compare(&a.track, &b.track));
        views
    }

    /// Comments of a track, oldest first, with per-viewer like state.
    pub fn comments_for_track(&self, track_id: &str, viewer: Option<&str>) -> Result<Vec<CommentView>> {
        self.state.tracks.require(track_id)?;
        Ok(self.comment_views(track_id, viewer))
    }

    /// Explicit users followed by phantom users, with live aggregates.
    pub fn get_all_users(&self) -> Vec<UserView> {
        let mut uploads: HashMap<&str, (usize, usize)> = HashMap::new();
        for track in &self.state.tracks {
            let entry = uploads.entry(track.owner_id.as_str()).or_default();
            entry.0 += 1;
            entry.1 += self.state.likes.count(&track.id);
        }

        let mut views: Vec<UserView> = self
            .state
            .users
            .iter()
            .map(|u| self.user_view(u.clone(), false, &uploads))
            .collect();

        // Latest snapshot wins for phantoms; order follows first appearance.
        let mut phantoms: Vec<User> = Vec::new();
        for track in &self.state.tracks {
            if self.state.users.contains(&track.owner_id) {
                continue;
            }
            match phantoms.iter_mut().find(|u| u.id == track.owner_id) {
                Some(existing) => {
                    if track.created_at >= existing.created_at {
                        let since = existing.created_at.min(track.created_at);
                        *existing = User::from_snapshot(&track.owner, since);
                    }
                }
                None => phantoms.push(User::from_snapshot(&track.owner, track.created_at)),
            }
        }
        views.extend(
            phantoms
                .into_iter()
                .map(|u| self.user_view(u, true, &uploads)),
        );
        views
    }

    fn track_view(&self, track: &Track, viewer: Option<&str>) -> TrackView {
        let mut copy = track.clone();
        copy.likes = self.state.likes.count(&track.id);
        copy.plays = self.state.plays.get(&track.id);
        TrackView {
            is_liked: viewer.is_some_and(|v| self.state.likes.contains(&track.id, v)),
            is_bookmarked: viewer.is_some_and(|v| self.state.bookmarks.contains(&track.id, v)),
            comments: self.comment_views(&track.id, viewer),
            track: copy,
        }
    }

    fn comment_views(&self, track_id: &str, viewer: Option<&str>) -> Vec<CommentView> {
        self.state
            .comments_of(track_id)
            .into_iter()
            .map(|c| CommentView {
                likes: self.state.comment_likes.count(&c.id),
                is_liked: viewer.is_some_and(|v| self.state.comment_likes.contains(&c.id, v)),
                comment: c.clone(),
            })
            .collect()
    }

    fn user_view(
        &self,
        user: User,
        phantom: bool,
        uploads: &HashMap<&str, (usize, usize)>,
    ) -> UserView {
        let (total_uploads, total_likes) = uploads.get(user.id.as_str()).copied().unwrap_or_default();
        let followers = self
            .state
            .follows
            .keys()
            .filter(|(_, followee)| *followee == user.id)
            .count();
        let following = self
            .state
            .follows
            .keys()
            .filter(|(follower, _)| *follower == user.id)
            .count();
        UserView {
            user,
            phantom,
            total_uploads,
            total_likes,
            followers,
            following,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserSnapshot;
    use crate::store::mem_backend::MemBackend;
    use chrono::{Duration, Utc};

    fn make_store() -> AudioStore<MemBackend> {
        AudioStore::open(MemBackend::new())
    }

    fn track(id: &str, minutes_ago: i64) -> Track {
        Track::new(id, UserSnapshot::new("u1", "ana"), "Test", "data:audio/mp3;base64,AAAA", 10.0)
            .with_created_at(Utc::now() - Duration::minutes(minutes_ago))
    }

    #[test]
    fn test_add_then_list_grows_by_one() {
        let mut store = make_store();
        let before = store.get_all_tracks(None).len();
        store.add_track(track("t1", 0)).unwrap();
        assert!(store.add_track(track("t1", 0)).is_err());
        assert_eq!(store.get_all_tracks(None).len(), before + 1);
    }

    #[test]
    fn test_viewer_relative_flags() {
        let mut store = make_store();
        store.add_track(track("t1", 0)).unwrap();
        store.toggle_like("t1", "u1").unwrap();
        store.toggle_bookmark("t1", "u1").unwrap();

        let mine = &store.get_all_tracks(Some("u1"))[0];
        assert!(mine.is_liked);
        assert!(mine.is_bookmarked);
        assert_eq!(mine.track.likes, 1);

        let theirs = &store.get_all_tracks(Some("u2"))[0];
        assert!(!theirs.is_liked);
        assert!(!theirs.is_bookmarked);
        assert_eq!(theirs.track.likes, 1);

        let anonymous = &store.get_all_tracks(None)[0];
        assert!(!anonymous.is_liked);
    }

    #[test]
    fn test_projection_does_not_touch_canonical_records() {
        let mut store = make_store();
        store.add_track(track("t1", 0)).unwrap();
        store.toggle_like("t1", "u2").unwrap();
        let before = store.state().clone();

        let mut views = store.get_all_tracks(Some("u2"));
        views[0].track.likes = 500;
        views[0].track.title = "changed".into();
        views[0].is_liked = false;

        assert_eq!(store.state(), &before);
        assert_eq!(store.get_track_by_id("t1").unwrap().likes, 1);
    }

    #[test]
    fn test_deleted_track_leaves_no_trace_in_views() {
        let mut store = make_store();
        store.add_track(track("t1", 1)).unwrap();
        store.add_track(track("t2", 0)).unwrap();
        store
            .add_comment(Comment::new("c1", "t1", UserSnapshot::new("u2", "bo"), "hi"))
            .unwrap();
        store.toggle_like("t1", "u2").unwrap();
        store.toggle_bookmark("t1", "u2").unwrap();
        store.increment_play("t1").unwrap();

        store.delete_track("t1").unwrap();

        let views = store.get_all_tracks(Some("u2"));
        assert_eq!(views.len(), 1);
        assert!(views
            .iter()
            .flat_map(|v| v.comments.iter())
            .all(|c| c.comment.track_id != "t1"));
        assert!(store.bookmarked_tracks("u2").is_empty());
        assert_eq!(store.state().likes.count("t1"), 0);
        assert_eq!(store.play_count("t1"), 0);
    }

    #[test]
    fn test_default_order_is_newest_first() {
        let mut store = make_store();
        store.add_track(track("old", 30)).unwrap();
        store.add_track(track("new", 1)).unwrap();
        store.add_track(track("mid", 10)).unwrap();

        let ids: Vec<String> = store
            .get_all_tracks(None)
            .into_iter()
            .map(|v| v.track.id)
            .collect();
        assert_eq!(ids, vec!["new", "mid", "old"]);
    }

    #[test]
    fn test_sorted_accessor_is_stable() {
        let mut store = make_store();
        for (i, id) in ["a", "b", "c", "d"].iter().enumerate() {
            store.add_track(track(id, i as i64)).unwrap();
        }
        store.toggle_like("c", "x").unwrap();

        let ids = |sort: TrackSort| -> Vec<String> {
            store
                .tracks_sorted(None, sort)
                .into_iter()
                .map(|v| v.track.id)
                .collect()
        };
        assert_eq!(
            ids(TrackSort::new(SortKey::Likes, SortDirection::Descending)),
            vec!["c", "a", "b", "d"]
        );
        assert_eq!(
            ids(TrackSort::new(SortKey::Likes, SortDirection::Ascending)),
            vec!["a", "b", "d", "c"]
        );
        assert_eq!(
            ids(TrackSort::new(SortKey::Title, SortDirection::Ascending)),
            vec!["a", "b", "c", "d"]
        );
    }

    #[test]
    fn test_sort_key_parsing() {
        assert_eq!("Plays".parse::<SortKey>().unwrap(), SortKey::Plays);
        assert_eq!("date".parse::<SortKey>().unwrap(), SortKey::Created);
        assert!(matches!(
            "loudness".parse::<SortKey>(),
            Err(MurmurError::Invalid(_))
        ));
    }

    #[test]
    fn test_comment_views_carry_like_state() {
        let mut store = make_store();
        store.add_track(track("t1", 0)).unwrap();
        store
            .add_comment(Comment::new("c1", "t1", UserSnapshot::new("u2", "bo"), "first"))
            .unwrap();
        store
            .add_comment(Comment::new("c2", "t1", UserSnapshot::new("u3", "cy"), "second"))
            .unwrap();
        store.toggle_comment_like("c2", "u1").unwrap();

        let comments = store.comments_for_track("t1", Some("u1")).unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].comment.id, "c1");
        assert!(!comments[0].is_liked);
        assert_eq!((comments[1].likes, comments[1].is_liked), (1, true));

        assert!(store.comments_for_track("ghost", None).is_err());
        assert_eq!(store.get_track_view("t1", None).unwrap().comments.len(), 2);
    }

    #[test]
    fn test_tracks_by_owner_and_bookmarks() {
        let mut store = make_store();
        store.add_track(track("t1", 2)).unwrap();
        store
            .add_track(Track::new("t2", UserSnapshot::new("u9", "zed"), "Other", "u", 4.0))
            .unwrap();
        store.toggle_bookmark("t2", "u1").unwrap();

        let owned: Vec<String> = store
            .tracks_by_owner("u1", None)
            .into_iter()
            .map(|v| v.track.id)
            .collect();
        assert_eq!(owned, vec!["t1"]);

        let saved = store.bookmarked_tracks("u1");
        assert_eq!(saved.len(), 1);
        assert!(saved[0].is_bookmarked);
    }

    #[test]
    fn test_users_merge_explicit_and_phantom() {
        let mut store = make_store();
        store.add_track(track("t1", 2)).unwrap();
        store.add_track(track("t2", 1)).unwrap();
        store
            .add_track(Track::new("t3", UserSnapshot::new("u9", "zed"), "Z", "u", 4.0))
            .unwrap();
        store.toggle_like("t1", "u9").unwrap();
        store.toggle_like("t2", "u9").unwrap();
        store.toggle_like("t2", "u5").unwrap();
        store.follow("u9", "u1").unwrap();

        // Drop the explicit record; u9 still owns t3.
        store.delete_user("u9").unwrap();

        let users = store.get_all_users();
        assert_eq!(users.len(), 2);

        let ana = users.iter().find(|u| u.user.id == "u1").unwrap();
        assert!(!ana.phantom);
        assert_eq!((ana.total_uploads, ana.total_likes), (2, 3));
        assert_eq!(ana.followers, 0);

        let zed = users.iter().find(|u| u.user.id == "u9").unwrap();
        assert!(zed.phantom);
        assert_eq!(zed.user.username, "zed");
        assert_eq!((zed.total_uploads, zed.total_likes), (1, 0));
    }

    #[test]
    fn test_track_view_serializes_flat() {
        let mut store = make_store();
        store.add_track(track("t1", 0)).unwrap();
        let json = serde_json::to_value(store.get_track_view("t1", Some("u1")).unwrap()).unwrap();
        assert_eq!(json["id"], "t1");
        assert_eq!(json["ownerId"], "u1");
        assert_eq!(json["isLiked"], false);
        assert!(json["comments"].as_array().unwrap().is_empty());
    }
}
