//! CLI module - Command-line interface for Cardgrid
//!
//! This module provides a structured CLI using clap for argument parsing.

pub mod commands;

use clap::{Args, Parser, Subcommand};

use crate::domain::{FilterKind, SearchFilters, SearchQuery, SortOrder};
use crate::services::DisplayFilters;

/// Cardgrid - Trading card image search
#[derive(Parser)]
#[command(name = "cardgrid")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search cards and print the results
    #[command(alias = "s")]
    Search(SearchArgs),

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    /// Search terms; separate several names with commas
    #[arg(required = true)]
    pub terms: Vec<String>,

    /// Match cards the pokemon appears on
    #[arg(long)]
    pub cameo: bool,

    /// Match trainer cards
    #[arg(long)]
    pub trainer: bool,

    /// Search by illustrator
    #[arg(long)]
    pub illustrator: bool,

    /// List a whole set in collector order
    #[arg(long)]
    pub set: bool,

    #[arg(long)]
    pub descending: bool,

    /// Number of pages to load
    #[arg(long, default_value_t = 1)]
    pub pages: usize,

    #[arg(long)]
    pub hide_reverse_holos: bool,

    #[arg(long)]
    pub hide_first_editions: bool,

    #[arg(long)]
    pub show_energy: bool,

    #[arg(long)]
    pub hide_items: bool,

    #[arg(long)]
    pub hide_trainer_owned: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchArgs {
    /// Filters in flag order, so a later exclusive flag wins.
    #[must_use]
    pub fn filters(&self) -> SearchFilters {
        [
            (FilterKind::Cameo, self.cameo),
            (FilterKind::Trainer, self.trainer),
            (FilterKind::Illustrator, self.illustrator),
            (FilterKind::Set, self.set),
        ]
        .into_iter()
        .filter(|(_, checked)| *checked)
        .fold(SearchFilters::none(), |filters, (kind, _)| {
            filters.toggle(kind, true)
        })
    }

    #[must_use]
    pub fn query(&self) -> SearchQuery {
        let sort = if self.descending {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        };
        SearchQuery::new(&self.terms.join(" "), self.filters(), sort)
    }

    /// Config defaults with command-line overrides applied.
    #[must_use]
    pub fn display_filters(&self, defaults: &DisplayFilters) -> DisplayFilters {
        let mut filters = *defaults;
        if self.hide_reverse_holos {
            filters.show_reverse_holos = false;
        }
        if self.hide_first_editions {
            filters.hide_first_editions = true;
        }
        if self.show_energy {
            filters.show_energy_cards = true;
        }
        if self.hide_items {
            filters.show_item_cards = false;
        }
        if self.hide_trainer_owned {
            filters.show_trainer_owned = false;
        }
        filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search_command() {
        let cli = Cli::try_parse_from([
            "cardgrid",
            "search",
            "mr",
            "mime,",
            "pikachu",
            "--cameo",
            "--pages",
            "3",
            "--hide-items",
        ])
        .unwrap();

        let Some(Commands::Search(args)) = cli.command else {
            panic!("expected search command");
        };
        assert_eq!(args.pages, 3);

        let query = args.query();
        assert_eq!(query.terms.as_str(), "mr-mime,pikachu");
        assert!(query.filters.cameo);
        assert_eq!(query.sort_order, SortOrder::Ascending);

        let display = args.display_filters(&DisplayFilters::default());
        assert!(!display.show_item_cards);
        assert!(display.show_reverse_holos);
    }

    #[test]
    fn test_exclusive_flags_last_wins() {
        let args = SearchArgs {
            cameo: true,
            trainer: true,
            set: true,
            ..SearchArgs::default()
        };
        let filters = args.filters();
        assert!(filters.set);
        assert!(!filters.cameo && !filters.trainer);

        let args = SearchArgs {
            cameo: true,
            trainer: true,
            ..SearchArgs::default()
        };
        assert_eq!(
            args.filters(),
            SearchFilters {
                cameo: true,
                trainer: true,
                ..SearchFilters::none()
            }
        );
    }

    #[test]
    fn test_search_requires_terms() {
        assert!(Cli::try_parse_from(["cardgrid", "search"]).is_err());
    }
}
