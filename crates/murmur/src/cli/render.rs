//! Output formatting for the CLI.
//!
//! Every function here returns a `String` and never prints, so handlers stay
//! in charge of stdout and the formatting is unit-testable.
//!
//! ## List layout
//!
//! ```text
//! ♥ Rain on a Tin Roof          ana        3:00   12♥    40▶  2 days ago
//!   #rain #sleep
//! ```
//!
//! The leading marker is `♥` when the viewer liked the track and `★` when
//! they only bookmarked it. Titles are truncated by display width (not
//! chars) so wide glyphs do not break the columns.

use super::styles::Palette;
use chrono::{DateTime, Utc};
use murmurapp::model::{Notification, NotificationKind};
use murmurapp::tags::TagCount;
use murmurapp::views::{CommentView, TrackView, UserView};
use serde::Serialize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const TITLE_WIDTH: usize = 30;
const OWNER_WIDTH: usize = 12;
const ELLIPSIS: char = '…';

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<String> {
    Ok(format!("{}\n", serde_json::to_string_pretty(value)?))
}

pub fn render_track_list(tracks: &[TrackView]) -> String {
    let p = Palette::new();
    if tracks.is_empty() {
        return format!("{}\n", p.muted.apply_to("No tracks."));
    }
    let mut out = String::new();
    for view in tracks {
        let t = &view.track;
        out.push_str(&format!(
            "{} {} {} {:>6} {} {} {}\n",
            p.active.apply_to(viewer_marker(view)),
            p.title.apply_to(pad_to_width(&t.title, TITLE_WIDTH)),
            p.muted.apply_to(pad_to_width(&t.owner.username, OWNER_WIDTH)),
            format_duration(t.duration),
            p.count.apply_to(format!("{:>5}♥", t.likes)),
            p.count.apply_to(format!("{:>5}▶", t.plays)),
            p.time.apply_to(format_time_ago(t.created_at)),
        ));
        if !t.tags.is_empty() {
            out.push_str(&format!("  {}\n", p.tag.apply_to(format_tags(&t.tags))));
        }
    }
    out
}

pub fn render_track_detail(view: &TrackView) -> String {
    let p = Palette::new();
    let t = &view.track;
    let mut out = format!("{}\n", p.title.apply_to(&t.title));
    out.push_str(&format!(
        "{} {}  {}  {}\n",
        p.muted.apply_to("by"),
        t.owner.username,
        format_duration(t.duration),
        p.time.apply_to(format_time_ago(t.created_at)),
    ));
    if let Some(description) = &t.description {
        out.push_str(&format!("\n{}\n", description));
    }
    if !t.tags.is_empty() {
        out.push_str(&format!("\n{}\n", p.tag.apply_to(format_tags(&t.tags))));
    }
    out.push_str(&format!(
        "\n{} likes  {} plays{}{}\n",
        p.count.apply_to(t.likes),
        p.count.apply_to(t.plays),
        if view.is_liked { "  (liked)" } else { "" },
        if view.is_bookmarked { "  (bookmarked)" } else { "" },
    ));
    out.push_str(&format!(
        "\n{}\n",
        p.faint.apply_to(format!("── {} comments ──", view.comments.len()))
    ));
    for comment in &view.comments {
        out.push_str(&render_comment(comment, &p));
    }
    out
}

fn render_comment(view: &CommentView, p: &Palette) -> String {
    let liked = if view.is_liked { "♥" } else { " " };
    format!(
        "{} {}: {} {}\n",
        p.active.apply_to(liked),
        p.title.apply_to(&view.comment.author.username),
        view.comment.content,
        p.muted.apply_to(format!("({}♥, {})", view.likes, format_time_ago(view.comment.created_at).trim())),
    )
}

pub fn render_users(users: &[UserView]) -> String {
    let p = Palette::new();
    if users.is_empty() {
        return format!("{}\n", p.muted.apply_to("No users."));
    }
    let mut out = String::new();
    for u in users {
        let name = if u.phantom {
            format!("{} {}", u.user.username, p.faint.apply_to("(no profile)"))
        } else {
            u.user.username.clone()
        };
        out.push_str(&format!(
            "{}  {}  {} uploads, {} likes, {} followers, {} following\n",
            p.muted.apply_to(pad_to_width(&u.user.id, OWNER_WIDTH)),
            name,
            u.total_uploads,
            u.total_likes,
            u.followers,
            u.following,
        ));
    }
    out
}

pub fn render_tags(tags: &[TagCount]) -> String {
    let p = Palette::new();
    if tags.is_empty() {
        return format!("{}\n", p.muted.apply_to("No tags."));
    }
    tags.iter()
        .map(|t| format!("{:>4}  {}\n", p.count.apply_to(t.count), p.tag.apply_to(format!("#{}", t.tag))))
        .collect()
}

pub fn render_notifications(notifications: &[&Notification]) -> String {
    let p = Palette::new();
    if notifications.is_empty() {
        return format!("{}\n", p.muted.apply_to("No notifications."));
    }
    let mut out = String::new();
    for n in notifications {
        let marker = if n.is_read() { " " } else { "•" };
        out.push_str(&format!(
            "{} {} {}\n",
            p.active.apply_to(marker),
            describe_notification(n),
            p.time.apply_to(format_time_ago(n.created_at).trim()),
        ));
    }
    out
}

pub fn render_success(message: &str) -> String {
    format!("{}\n", Palette::new().success.apply_to(message))
}

pub fn render_warning(message: &str) -> String {
    format!("{}\n", Palette::new().warning.apply_to(message))
}

fn describe_notification(n: &Notification) -> String {
    let field = |name: &str| n.payload.get(name).and_then(|v| v.as_str()).unwrap_or("?").to_string();
    match n.kind {
        NotificationKind::Like => format!("{} liked {}", field("actorId"), field("trackId")),
        NotificationKind::Comment => format!("{} commented on {}", field("actorId"), field("trackId")),
        NotificationKind::Follow => format!("{} started following you", field("actorId")),
        NotificationKind::Moderation => {
            format!("upload {} was {}", field("uploadId"), field("status"))
        }
        NotificationKind::System => n
            .payload
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("system notice")
            .to_string(),
    }
}

fn viewer_marker(view: &TrackView) -> &'static str {
    if view.is_liked {
        "♥"
    } else if view.is_bookmarked {
        "★"
    } else {
        " "
    }
}

fn format_tags(tags: &[String]) -> String {
    tags.iter().map(|t| format!("#{}", t)).collect::<Vec<_>>().join(" ")
}

/// `m:ss`, or `h:mm:ss` from one hour up.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{}:{:02}:{:02}", h, m, s)
    } else {
        format!("{}:{:02}", m, s)
    }
}

/// Truncates to `width` display columns (ending in `…` when cut) and pads
/// with spaces up to exactly `width`.
pub fn pad_to_width(text: &str, width: usize) -> String {
    let mut out = if text.width() <= width {
        text.to_string()
    } else {
        let budget = width.saturating_sub(ELLIPSIS.width().unwrap_or(1));
        let mut used = 0;
        let mut cut = String::new();
        for c in text.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > budget {
                break;
            }
            used += w;
            cut.push(c);
        }
        cut.push(ELLIPSIS);
        cut
    };
    let pad = width.saturating_sub(out.width());
    out.extend(std::iter::repeat(' ').take(pad));
    out
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let formatter = timeago::Formatter::new();
    // Right-align so the "ago" column lines up across rows.
    format!("{:>16}", formatter.convert(duration.to_std().unwrap_or_default()))
}
