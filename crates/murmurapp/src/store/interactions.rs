//! Index-layer operations: likes, bookmarks, comment likes, plays, top tags.
//!
//! Every toggle checks that its key refers to an existing record before the
//! index is touched. `toggle_like` and `increment_play` rewrite the track's
//! materialized counter inside the same call.

use super::backend::StorageBackend;
use super::AudioStore;
use crate::error::{MurmurError, Result};
use crate::model::NotificationKind;
use crate::tags::{top, TagCount};
use serde::Serialize;
use serde_json::json;
use tracing::debug;

/// Result of a membership toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Toggle {
    /// Membership after the toggle.
    pub active: bool,
    /// Set cardinality after the toggle.
    pub count: usize,
}

impl<B: StorageBackend> AudioStore<B> {
    /// Likes or unlikes a track on behalf of `viewer_id`.
    ///
    /// The track's `likes` field equals the like set's cardinality when this
    /// returns. A like (not an unlike) by someone other than the owner
    /// notifies the owner.
    pub fn toggle_like(&mut self, track_id: &str, viewer_id: &str) -> Result<Toggle> {
        require_viewer(viewer_id)?;
        let owner_id = self.state.tracks.require(track_id)?.owner_id.clone();

        let active = self.state.likes.toggle(track_id, viewer_id);
        let count = self.state.likes.count(track_id);
        self.state.tracks.require_mut(track_id)?.likes = count;

        if active && viewer_id != owner_id {
            self.push_notification(
                &owner_id,
                NotificationKind::Like,
                json!({ "trackId": track_id, "actorId": viewer_id }),
            );
        }
        self.write_through();
        debug!(track_id, viewer_id, active, count, "toggled like");
        Ok(Toggle { active, count })
    }

    pub fn toggle_bookmark(&mut self, track_id: &str, viewer_id: &str) -> Result<Toggle> {
        require_viewer(viewer_id)?;
        self.state.tracks.require(track_id)?;

        let active = self.state.bookmarks.toggle(track_id, viewer_id);
        let count = self.state.bookmarks.count(track_id);
        self.write_through();
        debug!(track_id, viewer_id, active, "toggled bookmark");
        Ok(Toggle { active, count })
    }

    pub fn toggle_comment_like(&mut self, comment_id: &str, viewer_id: &str) -> Result<Toggle> {
        require_viewer(viewer_id)?;
        self.state.comments.require(comment_id)?;

        let active = self.state.comment_likes.toggle(comment_id, viewer_id);
        let count = self.state.comment_likes.count(comment_id);
        self.write_through();
        debug!(comment_id, viewer_id, active, count, "toggled comment like");
        Ok(Toggle { active, count })
    }

    /// Counts one play and mirrors the total onto the track. Returns the total.
    pub fn increment_play(&mut self, track_id: &str) -> Result<u64> {
        self.state.tracks.require(track_id)?;

        let plays = self.state.plays.increment(track_id);
        self.state.tracks.require_mut(track_id)?.plays = plays;
        self.write_through();
        debug!(track_id, plays, "counted play");
        Ok(plays)
    }

    pub fn is_liked(&self, track_id: &str, viewer_id: &str) -> bool {
        self.state.likes.contains(track_id, viewer_id)
    }

    pub fn is_bookmarked(&self, track_id: &str, viewer_id: &str) -> bool {
        self.state.bookmarks.contains(track_id, viewer_id)
    }

    pub fn play_count(&self, track_id: &str) -> u64 {
        self.state.plays.get(track_id)
    }

    /// Rescans every track's tags, refreshes the cache and returns the top
    /// `limit` entries (count descending, then tag ascending).
    pub fn recompute_top_tags(&mut self, limit: usize) -> Vec<TagCount> {
        self.state.recompute_top_tags();
        self.write_through();
        top(&self.state.top_tags, limit)
    }

    /// Top `limit` entries of the cached table, without rescanning.
    pub fn top_tags(&self, limit: usize) -> Vec<TagCount> {
        top(&self.state.top_tags, limit)
    }
}

fn require_viewer(viewer_id: &str) -> Result<()> {
    if viewer_id.trim().is_empty() {
        return Err(MurmurError::invalid("viewer id: must not be empty"));
    }
    Ok(())
}
