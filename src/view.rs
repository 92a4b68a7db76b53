//! Text rendering of the engine state for the terminal. Nothing here
//! changes state; every function is a projection of what it is given.

use colored::*;
use scraper::{Html, Selector};

use crate::actors::tracking_store::UsageStats;
use crate::catalog::strip_tags;
use crate::engine::{DebugInfo, Engine, Focus};
use crate::resolver::{CardSlot, PanelItem};

/// Every visible step with its options. The selected option is marked
/// with `*` and the focused step with `>`.
pub fn render_steps(engine: &Engine) -> String {
    let document = engine.document();
    let traversal = engine.traversal();
    let mut out = String::new();

    for (index, step) in document.steps.iter().enumerate() {
        if !traversal.is_visible(index) {
            continue;
        }
        let marker = if traversal.focus() == Focus::Step(index) { ">" } else { " " };
        out.push_str(&format!("{} {}. {}\n", marker, index + 1, step.title.bold()));
        if let Some(description) = &step.description {
            out.push_str(&format!("     {}\n", strip_tags(description)));
        }
        for (o, option) in step.options.iter().enumerate() {
            let selected = if traversal.selected(index) == Some(o) { "*" } else { " " };
            out.push_str(&format!("    [{}] {}) {}", selected, o + 1, option.label));
            if let Some(description) = &option.description {
                out.push_str(&format!(" - {}", strip_tags(description)));
            }
            out.push('\n');
        }
    }
    out
}

/// Title, price and link of a rendered card, or its plain text when it
/// does not look like one of ours.
pub fn card_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    let pick = |css: &str| -> Option<String> {
        let selector = Selector::parse(css).ok()?;
        fragment
            .select(&selector)
            .next()
            .map(|el| el.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|t| !t.is_empty())
    };
    let link = Selector::parse("a[href]").ok().and_then(|selector| {
        fragment
            .select(&selector)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string)
    });

    let Some(title) = pick("h4") else {
        return strip_tags(html);
    };
    let mut parts = vec![title];
    if let Some(price) = pick(".wf-product-price") {
        parts.push(price);
    }
    if let Some(rating) = pick(".wf-product-rating") {
        parts.push(rating.replace(' ', ""));
    }
    if let Some(excerpt) = pick("p") {
        parts.push(excerpt);
    }
    if let Some(link) = link {
        parts.push(format!("<{}>", link));
    }
    parts.join(" | ")
}

pub fn render_panel(items: &[PanelItem]) -> String {
    if items.is_empty() {
        return format!("{}\n", "No recommendations are configured.".yellow());
    }
    let mut out = format!("{}\n", "Recommended for you".green().bold());
    for item in items {
        if let Some(title) = &item.title {
            out.push_str(&format!("  {}\n", title.bold()));
        }
        if let Some(content) = &item.content {
            let text = strip_tags(content);
            if !text.is_empty() {
                out.push_str(&format!("  {}\n", text));
            }
        }
        for (content_id, slot) in &item.cards {
            match slot {
                CardSlot::Loading => out.push_str(&format!("    - loading #{}...\n", content_id)),
                CardSlot::Ready(html) => out.push_str(&format!("    - {}\n", card_text(html))),
            }
        }
    }
    out
}

pub fn render_debug(info: &DebugInfo) -> String {
    let mut out = format!("{}\n", "Debug".magenta().bold());
    out.push_str(&format!("  session id:    {}\n", info.session_id));
    out.push_str(&format!(
        "  cookie state:  {}\n",
        info.cookie_state.as_deref().unwrap_or("(none)")
    ));
    out.push_str(&format!("  current state: {}\n", info.current_state.to_json()));
    out.push_str(&format!("  url:           {}\n", info.url));
    out.push_str(&format!(
        "  styles:        {}\n",
        serde_json::to_string(&info.styles).unwrap_or_default()
    ));
    out
}

/// One line for a card that just arrived in the open panel.
pub fn render_arrival(item: &PanelItem, html: &str) -> String {
    match &item.title {
        Some(title) => format!("    + {}: {}\n", title.bold(), card_text(html)),
        None => format!("    + {}\n", card_text(html)),
    }
}

pub fn render_stats(stats: &UsageStats) -> String {
    let rate = |n: usize| {
        if stats.total == 0 {
            0.0
        } else {
            (n as f64 / stats.total as f64 * 1000.0).round() / 10.0
        }
    };
    format!(
        "Sessions:    {}\nCompleted:   {} ({}%)\nAbandoned:   {} ({}%)\nIn progress: {}\nStarted:     {}\n",
        stats.total,
        stats.completed,
        rate(stats.completed),
        stats.abandoned,
        rate(stats.abandoned),
        stats.in_progress,
        stats.started
    )
}

pub fn render_help(debug_enabled: bool) -> String {
    let mut out = String::from(
        "Commands:\n  <n>        choose option n on the current step\n  <s>.<n>    choose option n on step s\n  b          back\n  f          forward\n  r          start over\n",
    );
    if debug_enabled {
        out.push_str("  d          debug information\n");
    }
    out.push_str("  q          quit\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::engine_at;
    use crate::state::FormState;
    use crate::wizard::{fixtures, Styles};
    use actix_web::cookie::CookieJar;

    #[test]
    fn test_steps_show_visible_steps_and_selection() {
        colored::control::set_override(false);
        let (mut engine, _) = engine_at(fixtures::shoes(), "/finder", CookieJar::new());
        engine.select("size", "large").unwrap();
        let text = render_steps(&engine);
        assert!(text.contains("  1. Size"));
        assert!(text.contains("> 2. Color"));
        assert!(text.contains("[*] 2) Large"));
        assert!(text.contains("[ ] 1) Small"));
        assert!(!text.contains("Budget"));
    }

    #[test]
    fn test_card_text() {
        let html = r#"<div class="wf-product-card"><a href="/trail"><img src="x.jpg"></a>
            <h4 class="wf-product-title"><a href="/trail">Trail Runner</a></h4>
            <p class="wf-product-excerpt">Light shoe</p>
            <div class="wf-product-rating"><span>★</span><span>★</span><span>☆</span></div>
            <div class="wf-product-price">89 €</div></div>"#;
        assert_eq!(card_text(html), "Trail Runner | 89 € | ★★☆ | Light shoe | </trail>");
        assert_eq!(card_text("<p>just text</p>"), "just text");
    }

    #[test]
    fn test_panel() {
        colored::control::set_override(false);
        let items = vec![PanelItem {
            id: "r1".into(),
            title: Some("Blue runners".into()),
            content: Some("<p>Great for <em>roads</em></p>".into()),
            cards: vec![
                (1, CardSlot::Loading),
                (2, CardSlot::Ready("<div><h4>Road shoe</h4></div>".into())),
            ],
        }];
        let text = render_panel(&items);
        assert!(text.contains("Blue runners"));
        assert!(text.contains("Great for roads"));
        assert!(text.contains("loading #1"));
        assert!(text.contains("- Road shoe"));
        assert!(render_panel(&[]).contains("No recommendations"));

        let line = render_arrival(&items[0], "<div><h4>Trail shoe</h4></div>");
        assert_eq!(line, "    + Blue runners: Trail shoe\n");
    }

    #[test]
    fn test_debug_and_stats() {
        colored::control::set_override(false);
        let info = DebugInfo {
            session_id: "wf_1_abc".into(),
            cookie_state: None,
            current_state: vec![("size", "small")].into_iter().collect::<FormState>(),
            url: "/finder?size=small".into(),
            styles: Styles::default(),
        };
        let text = render_debug(&info);
        assert!(text.contains("wf_1_abc"));
        assert!(text.contains("(none)"));
        assert!(text.contains(r#"{"size":"small"}"#));
        assert!(text.contains(r#""results_excerpt_length":35"#));

        let stats = UsageStats { total: 4, started: 1, in_progress: 1, completed: 1, abandoned: 1 };
        let text = render_stats(&stats);
        assert!(text.contains("Completed:   1 (25%)"));
        assert!(render_stats(&UsageStats::default()).contains("Sessions:    0"));
    }
}
