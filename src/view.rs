//! HTML fragments for the widget panels.

use crate::filter::NO_MATCHES;
use crate::{Product, Role, SelectionSet, Transcript, markdown};

const RTL_LANGS: &[&str] = &["ar", "he", "fa", "ur"];

/// `rtl` for Arabic, Hebrew, Persian and Urdu locales, else `ltr`.
pub fn text_direction(lang: &str) -> &'static str {
    if RTL_LANGS.iter().any(|l| lang.starts_with(l)) { "rtl" } else { "ltr" }
}

pub fn render_product_grid(products: &[&Product], selection: &SelectionSet) -> String {
    if products.is_empty() {
        return format!("<div class=\"placeholder-message\">{NO_MATCHES}</div>");
    }
    products
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            let selected = if selection.contains(&p.name) { " selected" } else { "" };
            format!(
                concat!(
                    "<div class=\"product-card{sel}\" data-name=\"{name}\">",
                    "<img src=\"{image}\" alt=\"{name}\" />",
                    "<div class=\"product-info\">",
                    "<div class=\"product-brand\">{brand}</div>",
                    "<div class=\"product-name\">{name}</div>",
                    "<button class=\"more-info-btn\" data-idx=\"{idx}\"><i class=\"fa-solid fa-circle-info\"></i></button>",
                    "</div>",
                    "<div class=\"product-desc-overlay\"><strong>Description:</strong><p>{desc}</p>",
                    "<button class=\"more-info-btn close-desc-btn\">Close</button></div>",
                    "</div>"
                ),
                sel = selected,
                name = escape_html(&p.name),
                image = escape_html(&p.image),
                brand = escape_html(&p.brand),
                idx = idx,
                desc = escape_html(&p.description),
            )
        })
        .collect()
}

pub fn render_selected_panel(selection: &SelectionSet) -> String {
    let mut out: String = selection
        .iter()
        .enumerate()
        .map(|(idx, p)| {
            format!(
                concat!(
                    "<div class=\"selected-product-item\">",
                    "<span><strong>{name}</strong> <span class=\"brand\">({brand})</span></span>",
                    "<button class=\"remove-btn tooltip\" data-idx=\"{idx}\">",
                    "<i class=\"fa-solid fa-xmark\"></i><span class=\"tooltiptext\">Remove</span></button>",
                    "</div>"
                ),
                name = escape_html(&p.name),
                brand = escape_html(&p.brand),
                idx = idx,
            )
        })
        .collect();
    if !selection.is_empty() {
        out.push_str("<button class=\"clear-btn\">Clear All</button>");
    }
    out
}

/// User turns are escaped; assistant turns go through the markdown renderer.
pub fn render_transcript(transcript: &Transcript) -> String {
    transcript
        .turns()
        .iter()
        .map(|turn| {
            let (role, bubble, body) = match turn.role {
                Role::User => ("user", "user-bubble", escape_html(&turn.content)),
                Role::Assistant => ("assistant", "assistant-bubble", markdown::render(&turn.content)),
            };
            format!("<div class=\"chat-message {role}\"><span class=\"bubble {bubble}\">{body}</span></div>")
        })
        .collect()
}

/// A one-off assistant bubble that is not part of the transcript.
pub fn render_notice(message: &str) -> String {
    format!(
        "<div class=\"chat-message assistant\"><span class=\"bubble assistant-bubble\">{}</span></div>",
        escape_html(message)
    )
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::sample;
    use crate::{MemorySelectionStore, Turn};
    use std::sync::Arc;

    fn selection_with(products: &[Product]) -> SelectionSet {
        let mut set = SelectionSet::restore(Arc::new(MemorySelectionStore::new()));
        for p in products {
            set.toggle(p).unwrap();
        }
        set
    }

    #[test]
    fn direction_from_language() {
        assert_eq!(text_direction("ar-EG"), "rtl");
        assert_eq!(text_direction("he"), "rtl");
        assert_eq!(text_direction("en-US"), "ltr");
        assert_eq!(text_direction(""), "ltr");
    }

    #[test]
    fn empty_grid_shows_placeholder() {
        let html = render_product_grid(&[], &selection_with(&[]));
        assert!(html.contains("placeholder-message"));
        assert!(html.contains(NO_MATCHES));
    }

    #[test]
    fn grid_marks_selected_cards_and_escapes() {
        let a = sample("Rose & Oud", "fragrance", "Warm <woody> scent");
        let b = sample("Day Cream", "moisturizer", "SPF 30");
        let html = render_product_grid(&[&a, &b], &selection_with(&[b.clone()]));
        assert_eq!(html.matches("product-card selected").count(), 1);
        assert!(html.contains("Rose &amp; Oud"));
        assert!(html.contains("Warm &lt;woody&gt; scent"));
        assert!(html.contains("data-idx=\"1\""));
    }

    #[test]
    fn selected_panel_has_clear_button_only_when_non_empty() {
        assert_eq!(render_selected_panel(&selection_with(&[])), "");
        let html = render_selected_panel(&selection_with(&[sample("Toner", "toner", "")]));
        assert!(html.contains("<strong>Toner</strong>"));
        assert!(html.contains("Clear All"));
    }

    #[test]
    fn panel_items_follow_selection_order() {
        let set = selection_with(&[sample("Toner", "toner", ""), sample("Mask", "mask", "")]);
        let html = render_selected_panel(&set);
        let toner = html.find("<strong>Toner</strong>").unwrap();
        let mask = html.find("<strong>Mask</strong>").unwrap();
        assert!(toner < mask);
        assert_eq!(html.matches("remove-btn").count(), 2);
        assert!(html[toner..mask].contains("data-idx=\"0\""));
        assert!(html[mask..].contains("data-idx=\"1\""));
        assert!(html.ends_with("<button class=\"clear-btn\">Clear All</button>"));
    }

    #[test]
    fn transcript_escapes_user_and_renders_assistant() {
        let mut transcript = Transcript::default();
        transcript.push(Turn::user("<b>hi</b>"));
        transcript.push(Turn::assistant("**Hello**"));
        let html = render_transcript(&transcript);
        assert!(html.contains("<span class=\"bubble user-bubble\">&lt;b&gt;hi&lt;/b&gt;</span>"));
        assert!(html.contains("<span class=\"bubble assistant-bubble\"><strong>Hello</strong></span>"));
    }
}
