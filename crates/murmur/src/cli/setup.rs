use clap::{Args, Parser, Subcommand, ValueEnum};
use murmurapp::views::{SortDirection, SortKey};

#[derive(Parser, Debug)]
#[command(
    name = "murmur",
    bin_name = "murmur",
    version,
    disable_help_subcommand = true
)]
#[command(about = "Inspect and edit a murmur audio store", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data directory (defaults to $MURMUR_DATA, then the OS data dir)
    #[arg(long, global = true, value_name = "PATH", help_heading = "Options")]
    pub data: Option<String>,

    /// Print JSON instead of formatted text
    #[arg(long, global = true, help_heading = "Options")]
    pub json: bool,

    /// Skip demo data seeding on a fresh store
    #[arg(long, global = true, help_heading = "Options")]
    pub no_seed: bool,

    /// Verbose output (debug logging)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List tracks
    #[command(alias = "ls", display_order = 1)]
    Tracks(TracksArgs),

    /// Show one track with its comments
    #[command(display_order = 2)]
    Show {
        track_id: String,

        #[arg(long)]
        viewer: Option<String>,
    },

    /// Add a track
    #[command(display_order = 3)]
    AddTrack(AddTrackArgs),

    /// Delete a track and everything attached to it
    #[command(alias = "rm", display_order = 4)]
    DeleteTrack { track_id: String },

    /// Toggle a like on a track
    #[command(display_order = 10)]
    Like {
        track_id: String,

        #[arg(long)]
        viewer: String,
    },

    /// Toggle a bookmark on a track
    #[command(display_order = 11)]
    Bookmark {
        track_id: String,

        #[arg(long)]
        viewer: String,
    },

    /// Count one play of a track
    #[command(display_order = 12)]
    Play { track_id: String },

    /// Comment on a track
    #[command(display_order = 13)]
    Comment {
        track_id: String,

        /// Author user id
        #[arg(long)]
        author: String,

        /// Author display name (defaults to the id)
        #[arg(long)]
        author_name: Option<String>,

        /// Comment text words (joined with spaces)
        #[arg(required = true, trailing_var_arg = true)]
        content: Vec<String>,
    },

    /// List users with upload and like totals
    #[command(display_order = 20)]
    Users,

    /// Follow a user
    #[command(display_order = 21)]
    Follow { follower: String, followee: String },

    /// Stop following a user
    #[command(display_order = 22)]
    Unfollow { follower: String, followee: String },

    /// Show a user's notifications
    #[command(display_order = 23)]
    Notifications {
        user_id: String,

        /// Mark all of them read afterwards
        #[arg(long)]
        mark_read: bool,
    },

    /// Most used tags
    #[command(display_order = 30)]
    Tags {
        /// Number of tags (defaults to the configured top_tags_limit)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Show data directory, configuration and startup results
    #[command(display_order = 40)]
    Info,

    /// Delete the pre-migration store blob
    #[command(display_order = 41)]
    PurgeLegacy,

    /// Remove every record from the store
    #[command(display_order = 42)]
    Wipe {
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
pub struct TracksArgs {
    /// Project likes/bookmarks for this user
    #[arg(long)]
    pub viewer: Option<String>,

    #[arg(long, value_enum, default_value_t = SortArg::Created)]
    pub sort: SortArg,

    /// Ascending order (default is descending)
    #[arg(long)]
    pub asc: bool,

    /// Only tracks owned by this user
    #[arg(long, conflicts_with = "bookmarked")]
    pub owner: Option<String>,

    /// Only tracks the viewer bookmarked (requires --viewer)
    #[arg(long, requires = "viewer")]
    pub bookmarked: bool,
}

#[derive(Args, Debug)]
pub struct AddTrackArgs {
    /// Track id (generated if omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Owner user id
    #[arg(long)]
    pub owner: String,

    /// Owner display name (defaults to the id)
    #[arg(long)]
    pub owner_name: Option<String>,

    #[arg(long)]
    pub title: String,

    #[arg(long)]
    pub url: String,

    /// Length in seconds
    #[arg(long)]
    pub duration: f64,

    #[arg(long)]
    pub description: Option<String>,

    /// Tag (repeatable)
    #[arg(long = "tag", value_name = "TAG")]
    pub tags: Vec<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum SortArg {
    Created,
    Likes,
    Plays,
    Title,
    Duration,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Created => SortKey::Created,
            SortArg::Likes => SortKey::Likes,
            SortArg::Plays => SortKey::Plays,
            SortArg::Title => SortKey::Title,
            SortArg::Duration => SortKey::Duration,
        }
    }
}

impl TracksArgs {
    pub fn direction(&self) -> SortDirection {
        if self.asc {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        }
    }
}
