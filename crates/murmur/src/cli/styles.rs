//! Styles for the murmur CLI.
//!
//! Renderers refer to styles by what the text *is* (a title, a timestamp, a
//! count) and never pick colors directly. [`Palette`] maps those roles to
//! `console` styles, so a look change happens here and nowhere else.
//!
//! `console` drops the escape codes on its own when stdout is not a
//! terminal, which keeps piped output and the integration tests plain.

use console::Style;

pub struct Palette {
    pub title: Style,
    pub muted: Style,
    pub faint: Style,
    pub time: Style,
    pub tag: Style,
    pub count: Style,
    /// Liked, bookmarked, unread.
    pub active: Style,
    pub success: Style,
    pub warning: Style,
    pub error: Style,
}

impl Palette {
    pub fn new() -> Self {
        let muted = Style::new().color256(245);
        Self {
            title: Style::new().bold(),
            faint: Style::new().color256(240),
            time: muted.clone().italic(),
            muted,
            tag: Style::new().cyan(),
            count: Style::new().yellow(),
            active: Style::new().magenta().bold(),
            success: Style::new().green(),
            warning: Style::new().yellow().bold(),
            error: Style::new().red().bold(),
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::new()
    }
}
