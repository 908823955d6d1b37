use super::backend::StorageBackend;
use super::snapshot::{RestoreReport, StoreSnapshot};
use super::state::StoreState;
use super::STORE_KEY;
use crate::error::{MurmurError, Result};
use crate::model::{Comment, NotificationKind, Track, TrackPatch, User, UserPatch};
use crate::tags::validate_tags;
use serde_json::json;
use tracing::{debug, error, info, warn};

/// Outcome of reading the current blob into memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No blob stored yet; the store starts empty.
    Empty,
    /// Blob restored. The report lists anything that had to be discarded.
    Loaded(RestoreReport),
    /// Blob unreadable; the store was reset to empty.
    Reset,
}

/// The data layer: canonical collections, derived indexes and a durable backend.
///
/// One instance is constructed at startup and handed by reference to every
/// consumer. All calls run to completion synchronously.
pub struct AudioStore<B: StorageBackend> {
    /// The underlying storage backend.
    /// Exposed as pub(crate) for testing and internal access only.
    pub(crate) backend: B,
    pub(crate) state: StoreState,
}

impl<B: StorageBackend> AudioStore<B> {
    /// Opens a store over `backend`, loading the current blob if any.
    pub fn open(backend: B) -> Self {
        let mut store = Self {
            backend,
            state: StoreState::new(),
        };
        store.load();
        store
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    /// Replaces in-memory state with the stored blob. Never fails: an
    /// unreadable blob resets the store to empty.
    pub fn load(&mut self) -> LoadOutcome {
        let raw = match self.backend.read_blob(STORE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.state = StoreState::new();
                return LoadOutcome::Empty;
            }
            Err(e) => {
                warn!(key = STORE_KEY, error = %e, "could not read store blob, starting empty");
                self.state = StoreState::new();
                return LoadOutcome::Reset;
            }
        };

        match StoreSnapshot::from_json(&raw) {
            Ok(snapshot) => {
                let (state, report) = snapshot.restore();
                if !report.is_clean() {
                    warn!(
                        rejected_records = report.rejected_records,
                        dangling_references = report.dangling_references,
                        "discarded inconsistent records while loading store"
                    );
                }
                info!(
                    tracks = state.tracks.len(),
                    users = state.users.len(),
                    comments = state.comments.len(),
                    "loaded store"
                );
                self.state = state;
                LoadOutcome::Loaded(report)
            }
            Err(e) => {
                warn!(key = STORE_KEY, error = %e, "store blob is corrupt, starting empty");
                self.state = StoreState::new();
                LoadOutcome::Reset
            }
        }
    }

    /// Serializes the whole store under [`STORE_KEY`].
    pub fn save(&self) -> Result<()> {
        let json = StoreSnapshot::capture(&self.state).to_json()?;
        self.backend.write_blob(STORE_KEY, &json)
    }

    /// Save after a successful mutation. Failures are logged, not returned.
    pub(crate) fn write_through(&self) {
        if let Err(e) = self.save() {
            error!(key = STORE_KEY, error = %e, "write-through save failed; durable blob is stale");
        }
    }

    pub(crate) fn replace_state(&mut self, state: StoreState) {
        self.state = state;
        self.write_through();
    }

    /// Drops every record and index and saves the empty store.
    ///
    /// The seed flag is left alone, so a wiped store stays empty on the
    /// next startup.
    pub fn wipe(&mut self) {
        info!("wiping store");
        self.replace_state(StoreState::new());
    }

    // --- Tracks ---

    pub fn add_track(&mut self, mut track: Track) -> Result<()> {
        if track.owner_id.is_empty() {
            track.owner_id = track.owner.id.clone();
        }
        validate_track(&track)?;
        if self.state.tracks.contains(&track.id) {
            return Err(MurmurError::already_exists("track", track.id));
        }

        track.likes = self.state.likes.count(&track.id);
        track.plays = self.state.plays.get(&track.id);
        self.state.register_user(&track.owner, track.created_at);

        let id = track.id.clone();
        self.state.tracks.insert(track)?;
        self.state.recompute_top_tags();
        self.write_through();
        debug!(track_id = %id, "added track");
        Ok(())
    }

    pub fn get_track_by_id(&self, id: &str) -> Result<&Track> {
        self.state.tracks.require(id)
    }

    /// Applies a shallow update. Tag changes refresh the top tags cache.
    pub fn update_track(&mut self, id: &str, patch: TrackPatch) -> Result<()> {
        let mut updated = self.state.tracks.require(id)?.clone();
        let tags_changed = patch.tags.as_ref().is_some_and(|t| *t != updated.tags);

        if let Some(title) = patch.title {
            updated.title = title;
        }
        if let Some(description) = patch.description {
            updated.description = description;
        }
        if let Some(url) = patch.url {
            updated.url = url;
        }
        if let Some(duration) = patch.duration {
            updated.duration = duration;
        }
        if let Some(tags) = patch.tags {
            updated.tags = tags;
        }
        if let Some(status) = patch.status {
            updated.status = status;
        }
        validate_track(&updated)?;

        *self.state.tracks.require_mut(id)? = updated;
        if tags_changed {
            self.state.recompute_top_tags();
        }
        self.write_through();
        debug!(track_id = %id, tags_changed, "updated track");
        Ok(())
    }

    /// Deletes a track and everything addressed by its id: likes, bookmarks,
    /// play count, comments (and their likes). Refreshes the top tags cache.
    pub fn delete_track(&mut self, id: &str) -> Result<Track> {
        let track = self
            .state
            .tracks
            .remove(id)
            .ok_or_else(|| MurmurError::not_found("track", id))?;

        self.state.likes.remove_key(id);
        self.state.bookmarks.remove_key(id);
        self.state.plays.remove(id);

        let comments = self.state.comments.extract_where(|c| c.track_id == id);
        for comment in &comments {
            self.state.comment_likes.remove_key(&comment.id);
        }
        self.state.track_comments.remove(id);

        self.state.recompute_top_tags();
        self.write_through();
        debug!(track_id = %id, comments = comments.len(), "deleted track");
        Ok(track)
    }

    // --- Users ---

    pub fn add_user(&mut self, user: User) -> Result<()> {
        validate_user(&user)?;
        let id = user.id.clone();
        self.state.users.insert(user)?;
        self.write_through();
        debug!(user_id = %id, "added user");
        Ok(())
    }

    /// The explicit user record. Users only inferred from track ownership
    /// are visible through [`AudioStore::get_all_users`].
    pub fn get_user_by_id(&self, id: &str) -> Result<&User> {
        self.state.users.require(id)
    }

    pub fn update_user(&mut self, id: &str, patch: UserPatch) -> Result<()> {
        let mut updated = self.state.users.require(id)?.clone();
        if let Some(username) = patch.username {
            updated.username = username;
        }
        if let Some(email) = patch.email {
            updated.email = email;
        }
        if let Some(bio) = patch.bio {
            updated.bio = bio;
        }
        if let Some(avatar_url) = patch.avatar_url {
            updated.avatar_url = avatar_url;
        }
        if let Some(verified) = patch.verified {
            updated.verified = verified;
        }
        validate_user(&updated)?;

        *self.state.users.require_mut(id)? = updated;
        self.write_through();
        debug!(user_id = %id, "updated user");
        Ok(())
    }

    /// Removes the explicit user record, its follow edges and its
    /// notifications. Tracks it owns are kept.
    pub fn delete_user(&mut self, id: &str) -> Result<User> {
        let user = self
            .state
            .users
            .remove(id)
            .ok_or_else(|| MurmurError::not_found("user", id))?;

        self.state
            .follows
            .retain(|(follower, followee), _| follower != id && followee != id);
        let dropped = self.state.notifications.extract_where(|n| n.user_id == id);

        self.write_through();
        debug!(user_id = %id, notifications = dropped.len(), "deleted user");
        Ok(user)
    }

    // --- Comments ---

    /// Adds a comment to an existing track and notifies the track owner.
    pub fn add_comment(&mut self, comment: Comment) -> Result<()> {
        validate_comment(&comment)?;
        let owner_id = self.state.tracks.require(&comment.track_id)?.owner_id.clone();
        if self.state.comments.contains(&comment.id) {
            return Err(MurmurError::already_exists("comment", comment.id));
        }

        self.state.register_user(&comment.author, comment.created_at);
        let (id, track_id, author_id) = (
            comment.id.clone(),
            comment.track_id.clone(),
            comment.author.id.clone(),
        );
        self.state.comments.insert(comment)?;
        self.state.link_comment(&track_id, &id);

        if author_id != owner_id {
            self.push_notification(
                &owner_id,
                NotificationKind::Comment,
                json!({ "trackId": track_id, "commentId": id, "actorId": author_id }),
            );
        }
        self.write_through();
        debug!(comment_id = %id, track_id = %track_id, "added comment");
        Ok(())
    }

    pub fn get_comment_by_id(&self, id: &str) -> Result<&Comment> {
        self.state.comments.require(id)
    }

    pub fn update_comment(&mut self, id: &str, content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(MurmurError::invalid("comment content: must not be empty"));
        }
        self.state.comments.require_mut(id)?.content = content.to_string();
        self.write_through();
        debug!(comment_id = %id, "updated comment");
        Ok(())
    }

    pub fn delete_comment(&mut self, id: &str) -> Result<Comment> {
        let comment = self
            .state
            .comments
            .remove(id)
            .ok_or_else(|| MurmurError::not_found("comment", id))?;
        self.state.unlink_comment(&comment.track_id, id);
        self.state.comment_likes.remove_key(id);

        self.write_through();
        debug!(comment_id = %id, "deleted comment");
        Ok(comment)
    }
}

pub(crate) fn validate_track(track: &Track) -> Result<()> {
    if track.id.trim().is_empty() {
        return Err(MurmurError::invalid("track id: must not be empty"));
    }
    if track.title.trim().is_empty() {
        return Err(MurmurError::invalid("track title: must not be empty"));
    }
    if track.url.trim().is_empty() {
        return Err(MurmurError::invalid("track url: must not be empty"));
    }
    if !track.duration.is_finite() || track.duration <= 0.0 {
        return Err(MurmurError::invalid(format!(
            "track duration: must be > 0, got {}",
            track.duration
        )));
    }
    if track.owner.id.trim().is_empty() {
        return Err(MurmurError::invalid("track owner: id must not be empty"));
    }
    if track.owner_id != track.owner.id {
        return Err(MurmurError::invalid(format!(
            "track owner: ownerId {} does not match owner {}",
            track.owner_id, track.owner.id
        )));
    }
    validate_tags(&track.tags)
        .map_err(|(tag, e)| MurmurError::invalid(format!("track tag {:?}: {}", tag, e)))
}

fn validate_user(user: &User) -> Result<()> {
    if user.id.trim().is_empty() {
        return Err(MurmurError::invalid("user id: must not be empty"));
    }
    if user.username.trim().is_empty() {
        return Err(MurmurError::invalid("username: must not be empty"));
    }
    Ok(())
}

fn validate_comment(comment: &Comment) -> Result<()> {
    if comment.id.trim().is_empty() {
        return Err(MurmurError::invalid("comment id: must not be empty"));
    }
    if comment.content.trim().is_empty() {
        return Err(MurmurError::invalid("comment content: must not be empty"));
    }
    if comment.author.id.trim().is_empty() {
        return Err(MurmurError::invalid("comment author: id must not be empty"));
    }
    Ok(())
}
