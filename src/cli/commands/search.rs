//! Search command handler

use std::sync::Arc;

use anyhow::Context;
use serde::Serialize;
use tracing::warn;

use crate::cli::SearchArgs;
use crate::clients::CardApiClient;
use crate::config::Config;
use crate::domain::events::{SearchState, SearchStatus};
use crate::models::{CardImage, TagParseError};
use crate::services::display::{self, EmptyState};
use crate::services::{Outcome, SearchEngine};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput<'a> {
    query: &'a str,
    pages: usize,
    has_more: bool,
    error: Option<&'a str>,
    results: Vec<&'a CardImage>,
}

pub async fn cmd_search(config: &Config, args: &SearchArgs) -> anyhow::Result<()> {
    let client = CardApiClient::from_config(&config.api)?;
    let engine = SearchEngine::new(Arc::new(client), config.paging.page_sizes());

    let query = args.query();
    let terms = query.terms.to_string();

    if let Outcome::Rejected(reason) = engine.search(query).await {
        println!("{reason}");
        println!("Usage: cardgrid search <terms>  (e.g. cardgrid search \"Pikachu, Blastoise\")");
        return Ok(());
    }

    let pages = load_pages(&engine, args.pages).await;
    let state = engine.snapshot();
    let filters = args.display_filters(&config.display);
    let visible = filters.apply(&state.results);

    if args.json {
        let output = JsonOutput {
            query: &terms,
            pages,
            has_more: state.has_more,
            error: state.error.as_deref(),
            results: visible,
        };
        let json =
            serde_json::to_string_pretty(&output).context("Failed to serialize results")?;
        println!("{json}");
        return Ok(());
    }

    if let Some(error) = &state.error {
        println!("✗ {error}");
    }

    if visible.is_empty() {
        if let Some(empty) = EmptyState::for_state(&state) {
            println!("{}", empty.message());
        } else if !state.results.is_empty() {
            println!(
                "All {} loaded cards are hidden by display filters.",
                state.results.len()
            );
        }
        return Ok(());
    }

    println!();
    println!(
        "Cards for '{terms}' ({} shown, {} loaded, {pages} page(s))",
        visible.len(),
        state.results.len()
    );
    println!("{:-<70}", "");

    for line in render_rows(&visible, &config.api.image_base_url) {
        println!("{line}");
    }

    print_footer(&state, pages);
    Ok(())
}

/// Loads follow-up pages until `wanted` pages are in or the query runs out.
async fn load_pages(engine: &SearchEngine, wanted: usize) -> usize {
    let mut pages = usize::from(engine.snapshot().status == SearchStatus::Ready);
    while pages > 0 && pages < wanted {
        match engine.load_more().await {
            Outcome::Applied => pages += 1,
            _ => break,
        }
    }
    pages
}

/// Rendered lines for every card. A card that cannot be rendered is reported
/// in place and does not affect its neighbours.
fn render_rows(cards: &[&CardImage], image_base_url: &str) -> Vec<String> {
    let mut lines = Vec::new();
    for card in cards {
        match render_card(card, image_base_url) {
            Ok(card_lines) => lines.extend(card_lines),
            Err(e) => {
                warn!(
                    event = "card_render_failed",
                    image_key = %card.image_key,
                    error = %e,
                    "Skipping card with unreadable tags"
                );
                lines.push(format!("• {}", display::CARD_RENDER_FAILED));
            }
        }
        lines.push(String::new());
    }
    lines
}

fn render_card(card: &CardImage, image_base_url: &str) -> Result<Vec<String>, TagParseError> {
    let tags = card.tags()?;

    let title = if card.card_title.is_empty() {
        card.image_key.as_str()
    } else {
        card.card_title.as_str()
    };
    let mut lines = vec![format!("• {title} [{}]", card.card_number)];

    let mut details = vec![format!("Set: {}", display::capitalize_words(&card.set_name))];
    if !card.illustrator.is_empty() {
        details.push(format!("Illus: {}", card.illustrator));
    }
    if !card.release_date.is_empty() {
        details.push(format!("Released: {}", card.release_date));
    }
    lines.push(format!("  {}", details.join(" | ")));

    if !tags.is_empty() {
        lines.push(format!("  Tags: {}", tags.join(", ")));
    }
    lines.push(format!("  {}", card.image_url(image_base_url)));
    Ok(lines)
}

fn print_footer(state: &SearchState, pages: usize) {
    if state.has_more {
        println!(
            "More results available: rerun with --pages {}",
            pages + 1
        );
    }
}
