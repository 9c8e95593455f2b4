//! Chat-reply markdown to HTML.
//!
//! The reply is passed through a fixed chain of whole-text substitutions
//! rather than parsed into blocks. Stage order is significant: the list and
//! heading patterns are anchored on newlines, so line breaks are converted
//! last, and italics run after bold so `**` pairs stay intact. Captures stop
//! at `\r`, which stays in place.
//!
//! Input is trusted backend output and is not escaped.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static H3: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?mR)^### (.*)$"));
static H2: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?mR)^## (.*)$"));
static H1: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?mR)^# (.*)$"));
static BOLD: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?R)\*\*(.+?)\*\*"));
static ITALIC: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?R)\*(.+?)\*"));
static BULLET_ITEM: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?R)(^|\n)[*-] (.+)"));
static NUMBERED_ITEM: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?R)(^|\n)[0-9]+\. (.+)"));
// Greedy across lines: one span from the first item to the last.
static ITEM_RUN: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?s)<li>.*</li>"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"\[([^\]]+)\]\((https?://[^\s)]+)\)"));
static SHORTCODE: LazyLock<Regex> = LazyLock::new(|| pattern(r":([a-z_]+):"));

fn pattern(re: &str) -> Regex {
    // Patterns are literals; a failure here is a programming error caught by the tests.
    Regex::new(re).unwrap_or_else(|e| panic!("invalid markdown pattern {re}: {e}"))
}

const EMOJI: &[(&str, &str)] = &[
    ("sparkle", "✨"),
    ("star", "⭐"),
    ("fire", "🔥"),
    ("heart", "❤️"),
    ("smile", "😊"),
    ("blush", "😊"),
    ("wink", "😉"),
    ("wave", "👋"),
    ("check", "✅"),
    ("warning", "⚠️"),
    ("info", "ℹ️"),
    ("lipstick", "💄"),
    ("eyes", "👀"),
    ("sun", "☀️"),
    ("moon", "🌙"),
    ("droplet", "💧"),
    ("face", "🧑"),
    ("hair", "💇"),
    ("perfume", "🧴"),
];

/// Character for a `:shortcode:` name, if it is in the table.
pub fn emoji(code: &str) -> Option<&'static str> {
    EMOJI.iter().find(|(name, _)| *name == code).map(|(_, ch)| *ch)
}

/// Converts a chat reply to an HTML fragment.
pub fn render(markdown: &str) -> String {
    let html = headings(markdown);
    let html = BOLD.replace_all(&html, "<strong>${1}</strong>");
    let html = ITALIC.replace_all(&html, "<em>${1}</em>");
    let html = bullet_list(&html);
    let html = numbered_list(&html);
    let html = LINK.replace_all(&html, r#"<a href="${2}" target="_blank">${1}</a>"#);
    let html = shortcodes(&html);
    html.replace('\n', "<br>")
}

fn headings(text: &str) -> String {
    let html = H3.replace_all(text, "<h3>${1}</h3>");
    let html = H2.replace_all(&html, "<h2>${1}</h2>");
    H1.replace_all(&html, "<h1>${1}</h1>").into_owned()
}

fn bullet_list(text: &str) -> String {
    let html = BULLET_ITEM.replace_all(text, "${1}<li>${2}</li>");
    ITEM_RUN.replace_all(&html, "<ul>${0}</ul>").into_owned()
}

/// Items already inside the bullet wrapper are left alone.
fn numbered_list(text: &str) -> String {
    let html = NUMBERED_ITEM.replace_all(text, "${1}<li>${2}</li>");
    let Some(run) = ITEM_RUN.find(&html) else {
        return html.into_owned();
    };
    if run.as_str().contains("<ul>") || html[..run.start()].ends_with("<ul>") {
        return html.into_owned();
    }
    format!(
        "{}<ol>{}</ol>{}",
        &html[..run.start()],
        run.as_str(),
        &html[run.end()..]
    )
}

fn shortcodes(text: &str) -> String {
    SHORTCODE
        .replace_all(text, |caps: &Captures| match emoji(&caps[1]) {
            Some(ch) => ch.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
