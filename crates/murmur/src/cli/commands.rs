//! # Command Dispatch
//!
//! `run` is the whole life of one invocation:
//!
//! 1. Parse arguments.
//! 2. Resolve the data directory and read `murmur.toml` from it.
//! 3. Install the tracing subscriber (stderr only, so `--json` stdout stays
//!    parseable).
//! 4. Initialize the context: load the store, run migration and seeding.
//! 5. Run one handler and print what it renders.
//!
//! Handlers receive the whole context and return the text to print. Library
//! errors bubble up as `anyhow` errors and `main` turns them into exit code 1.

use super::render;
use super::setup::{AddTrackArgs, Cli, Commands, TracksArgs};
use anyhow::{bail, Context, Result};
use clap::Parser;
use murmurapp::config::MurmurConfig;
use murmurapp::init::{initialize, load_config, resolve_data_dir, MurmurContext};
use murmurapp::model::{Comment, Track, User, UserSnapshot};
use murmurapp::store::Toggle;
use murmurapp::views::TrackSort;
use serde_json::json;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let data_dir = resolve_data_dir(cli.data.as_ref().map(PathBuf::from))?;
    let config = load_config(&data_dir);
    init_tracing(&config, cli.verbose);

    let mut ctx = initialize(Some(data_dir), cli.no_seed.then_some(false))
        .context("could not open the murmur store")?;
    debug!(data_dir = %ctx.data_dir.display(), startup = ?ctx.startup, "store ready");

    let output = dispatch(&cli, &mut ctx)?;
    print!("{}", output);
    Ok(())
}

/// `RUST_LOG` wins. Otherwise `-v` means debug and the config decides.
fn init_tracing(config: &MurmurConfig, verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { config.log_level.as_str() };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
    });
    // A second init (tests calling run twice) is harmless; ignore it.
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn dispatch(cli: &Cli, ctx: &mut MurmurContext) -> Result<String> {
    let json = cli.json;
    match &cli.command {
        None => list_tracks(ctx, &default_tracks_args(), json),
        Some(Commands::Tracks(args)) => list_tracks(ctx, args, json),
        Some(Commands::Show { track_id, viewer }) => {
            let view = ctx.store.get_track_view(track_id, viewer.as_deref())?;
            if json {
                render::render_json(&view)
            } else {
                Ok(render::render_track_detail(&view))
            }
        }
        Some(Commands::AddTrack(args)) => add_track(ctx, args, json),
        Some(Commands::DeleteTrack { track_id }) => {
            let track = ctx.store.delete_track(track_id)?;
            if json {
                render::render_json(&track)
            } else {
                Ok(render::render_success(&format!("Deleted \"{}\" ({})", track.title, track.id)))
            }
        }
        Some(Commands::Like { track_id, viewer }) => {
            let toggle = ctx.store.toggle_like(track_id, viewer)?;
            toggle_output(toggle, json, || describe_toggle(toggle, "Liked", "Unliked", track_id, "likes"))
        }
        Some(Commands::Bookmark { track_id, viewer }) => {
            let toggle = ctx.store.toggle_bookmark(track_id, viewer)?;
            toggle_output(toggle, json, || {
                describe_toggle(toggle, "Bookmarked", "Removed bookmark on", track_id, "bookmarks")
            })
        }
        Some(Commands::Play { track_id }) => {
            let plays = ctx.store.increment_play(track_id)?;
            if json {
                render::render_json(&json!({ "trackId": track_id, "plays": plays }))
            } else {
                Ok(render::render_success(&format!("{}: {} plays", track_id, plays)))
            }
        }
        Some(Commands::Comment {
            track_id,
            author,
            author_name,
            content,
        }) => add_comment(ctx, track_id, author, author_name.as_deref(), &content.join(" "), json),
        Some(Commands::Users) => {
            let users = ctx.store.get_all_users();
            if json {
                render::render_json(&users)
            } else {
                Ok(render::render_users(&users))
            }
        }
        Some(Commands::Follow { follower, followee }) => {
            ctx.store.follow(follower, followee)?;
            edge_output(json, follower, followee, true)
        }
        Some(Commands::Unfollow { follower, followee }) => {
            ctx.store.unfollow(follower, followee)?;
            edge_output(json, follower, followee, false)
        }
        Some(Commands::Notifications { user_id, mark_read }) => {
            let rendered = {
                let notifications = ctx.store.notifications_for(user_id);
                if json {
                    render::render_json(&notifications)?
                } else {
                    render::render_notifications(&notifications)
                }
            };
            if *mark_read {
                let marked = ctx.store.mark_all_read(user_id);
                debug!(user_id = %user_id, marked, "marked notifications read");
            }
            Ok(rendered)
        }
        Some(Commands::Tags { limit }) => {
            let limit = limit.unwrap_or_else(|| ctx.config.top_tags_limit());
            let tags = ctx.store.top_tags(limit);
            if json {
                render::render_json(&tags)
            } else {
                Ok(render::render_tags(&tags))
            }
        }
        Some(Commands::Info) => info(ctx, json),
        Some(Commands::PurgeLegacy) => {
            let purged = ctx.store.purge_legacy_blob()?;
            if json {
                render::render_json(&json!({ "purged": purged }))
            } else if purged {
                Ok(render::render_success("Removed the legacy store blob."))
            } else {
                Ok(render::render_warning("No legacy store blob to remove."))
            }
        }
        Some(Commands::Wipe { yes }) => {
            if !yes {
                bail!("refusing to wipe without --yes");
            }
            ctx.store.wipe();
            ctx.store.save().context("could not persist the wiped store")?;
            Ok(render::render_success("Store wiped."))
        }
    }
}

fn default_tracks_args() -> TracksArgs {
    TracksArgs {
        viewer: None,
        sort: super::setup::SortArg::Created,
        asc: false,
        owner: None,
        bookmarked: false,
    }
}

fn list_tracks(ctx: &MurmurContext, args: &TracksArgs, json: bool) -> Result<String> {
    let sort = TrackSort::new(args.sort.into(), args.direction());
    let mut tracks = ctx.store.tracks_sorted(args.viewer.as_deref(), sort);
    if let Some(owner) = &args.owner {
        tracks.retain(|v| &v.track.owner_id == owner);
    }
    if args.bookmarked {
        tracks.retain(|v| v.is_bookmarked);
    }
    if json {
        render::render_json(&tracks)
    } else {
        Ok(render::render_track_list(&tracks))
    }
}

fn add_track(ctx: &mut MurmurContext, args: &AddTrackArgs, json: bool) -> Result<String> {
    let owner = snapshot_for(ctx, &args.owner, args.owner_name.as_deref());
    let id = args.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
    let mut track =
        Track::new(id.clone(), owner, &args.title, &args.url, args.duration).with_tags(args.tags.iter().cloned());
    track.description = args.description.clone();
    ctx.store.add_track(track)?;

    let track = ctx.store.get_track_by_id(&id)?;
    if json {
        render::render_json(track)
    } else {
        Ok(render::render_success(&format!("Added \"{}\" ({})", track.title, track.id)))
    }
}

fn add_comment(
    ctx: &mut MurmurContext,
    track_id: &str,
    author: &str,
    author_name: Option<&str>,
    content: &str,
    json: bool,
) -> Result<String> {
    let snapshot = snapshot_for(ctx, author, author_name);
    let id = Uuid::new_v4().to_string();
    ctx.store.add_comment(Comment::new(id.clone(), track_id, snapshot, content))?;

    let comment = ctx.store.get_comment_by_id(&id)?;
    if json {
        render::render_json(comment)
    } else {
        Ok(render::render_success(&format!("Commented on {} ({})", track_id, comment.id)))
    }
}

/// Uses the stored profile when there is one, otherwise the given name (or
/// the id itself) for the embedded snapshot.
fn snapshot_for(ctx: &MurmurContext, user_id: &str, name: Option<&str>) -> UserSnapshot {
    match ctx.store.get_user_by_id(user_id) {
        Ok(user) if name.is_none() => user.snapshot(),
        _ => User::new(user_id, name.unwrap_or(user_id)).snapshot(),
    }
}

fn toggle_output(toggle: Toggle, json: bool, describe: impl FnOnce() -> String) -> Result<String> {
    if json {
        render::render_json(&toggle)
    } else {
        Ok(render::render_success(&describe()))
    }
}

fn describe_toggle(toggle: Toggle, on: &str, off: &str, track_id: &str, noun: &str) -> String {
    let verb = if toggle.active { on } else { off };
    format!("{} {} ({} {})", verb, track_id, toggle.count, noun)
}

fn edge_output(json: bool, follower: &str, followee: &str, following: bool) -> Result<String> {
    if json {
        return render::render_json(&json!({
            "followerId": follower,
            "followeeId": followee,
            "following": following,
        }));
    }
    let verb = if following { "now follows" } else { "no longer follows" };
    Ok(render::render_success(&format!("{} {} {}", follower, verb, followee)))
}

fn info(ctx: &MurmurContext, json: bool) -> Result<String> {
    let counts = ctx.store.state().counts();
    let migration = ctx
        .startup
        .migration
        .map_or_else(|| "failed (see log)".to_string(), |m| format!("{:?}", m));
    let seed = ctx
        .startup
        .seed
        .map_or_else(|| "skipped".to_string(), |s| format!("{:?}", s));

    if json {
        return render::render_json(&json!({
            "dataDir": ctx.data_dir,
            "config": ctx.config,
            "migration": migration,
            "seed": seed,
            "counts": counts,
        }));
    }

    Ok(format!(
        "data dir:   {}\n\
         log level:  {}\n\
         seed demo:  {}\n\
         migration:  {}\n\
         seed:       {}\n\
         \n\
         tracks {}  users {}  comments {}  follows {}\n\
         notifications {}  reports {}  pending uploads {}\n",
        ctx.data_dir.display(),
        ctx.config.log_level,
        ctx.config.seed_demo_data,
        migration,
        seed,
        counts.tracks,
        counts.users,
        counts.comments,
        counts.follows,
        counts.notifications,
        counts.reports,
        counts.pending_uploads,
    ))
}
