//! First-run demo data.
//!
//! The [`SEED_FLAG_KEY`] flag, not collection emptiness, decides whether
//! seeding runs: a store that was emptied on purpose (by deletions or
//! [`AudioStore::wipe`]) stays empty. Records go through the ordinary add
//! operations, so owners are registered, tag counts refreshed and every
//! insert saved like any other write. Demo ids that already exist (for
//! instance after a migration brought them over) are skipped.

use crate::error::{MurmurError, Result};
use crate::model::{Comment, Track, User, UserSnapshot};
use crate::store::{AudioStore, StorageBackend, SEED_FLAG_KEY};
use chrono::{Duration, Utc};
use tracing::{debug, info};

pub const DEMO_USER_ID: &str = "demo-user";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded { tracks: usize, comments: usize },
    AlreadySeeded,
}

struct DemoTrack {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    url: &'static str,
    duration: f64,
    tags: &'static [&'static str],
    comments: &'static [(&'static str, &'static str)],
}

const DEMO_TRACKS: [DemoTrack; 3] = [
    DemoTrack {
        id: "demo-track-rain",
        title: "Rain on a Tin Roof",
        description: "Twenty minutes of steady rain, recorded on a porch.",
        url: "https://cdn.murmur.app/demo/rain-on-tin.mp3",
        duration: 1212.0,
        tags: &["rain", "sleep", "nature"],
        comments: &[("demo-comment-rain-1", "Recorded this during the first storm of the season.")],
    },
    DemoTrack {
        id: "demo-track-whisper",
        title: "Soft Spoken Bedtime Story",
        description: "A quiet reading to fall asleep to.",
        url: "https://cdn.murmur.app/demo/bedtime-story.mp3",
        duration: 845.5,
        tags: &["asmr", "whisper", "sleep"],
        comments: &[
            ("demo-comment-whisper-1", "Chapter two is coming soon."),
            ("demo-comment-whisper-2", "Headphones recommended."),
        ],
    },
    DemoTrack {
        id: "demo-track-cafe",
        title: "Morning Cafe Ambience",
        description: "Cups, chatter and an espresso machine.",
        url: "https://cdn.murmur.app/demo/morning-cafe.mp3",
        duration: 1800.0,
        tags: &["ambience", "focus"],
        comments: &[("demo-comment-cafe-1", "Good for deep work sessions.")],
    },
];

fn demo_user() -> User {
    let mut user = User::new(DEMO_USER_ID, "murmur");
    user.bio = Some("Sample sounds to get you started.".to_string());
    user.verified = true;
    user
}

/// Inserts the demo user, tracks and comments unless the seed flag is set.
pub fn run_seed<B: StorageBackend>(store: &mut AudioStore<B>) -> Result<SeedOutcome> {
    if store.backend.read_flag(SEED_FLAG_KEY)? {
        return Ok(SeedOutcome::AlreadySeeded);
    }

    let user = demo_user();
    let owner: UserSnapshot = user.snapshot();
    tolerate_existing(store.add_user(user))?;

    let now = Utc::now();
    let (mut tracks, mut comments) = (0, 0);
    for (age, demo) in DEMO_TRACKS.iter().enumerate() {
        let mut track = Track::new(demo.id, owner.clone(), demo.title, demo.url, demo.duration)
            .with_tags(demo.tags.iter().copied())
            .with_created_at(now - Duration::hours(age as i64 + 1));
        track.description = Some(demo.description.to_string());
        if tolerate_existing(store.add_track(track))? {
            tracks += 1;
        }

        for (id, content) in demo.comments {
            let comment = Comment::new(*id, demo.id, owner.clone(), *content);
            if tolerate_existing(store.add_comment(comment))? {
                comments += 1;
            }
        }
    }

    store.backend.write_flag(SEED_FLAG_KEY, true)?;
    info!(tracks, comments, "seeded demo data");
    Ok(SeedOutcome::Seeded { tracks, comments })
}

/// Maps `AlreadyExists` to `Ok(false)`.
fn tolerate_existing(result: Result<()>) -> Result<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(MurmurError::AlreadyExists { kind, id }) => {
            debug!(kind, id = %id, "demo record already present");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
