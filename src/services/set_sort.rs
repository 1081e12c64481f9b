//! Client-side ordering for full set listings.
//!
//! Set listings are shown in collector order: release date, then the numeric
//! part of the card number, then printing variant, then the raw number.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;

use crate::domain::SortOrder;
use crate::models::CardImage;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Release date as a unix timestamp. Unparseable dates yield `None`.
fn release_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp());
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.and_utc().timestamp());
    }

    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(raw, fmt)
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc().timestamp())
    })
}

/// Leading decimal digits of a card number prefix, `None` when there are none.
fn leading_number(prefix: &str) -> Option<u64> {
    let digits: String = prefix
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

/// Known dates sort before unknown ones.
fn compare_dates(a: Option<i64>, b: Option<i64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_ascending(a: &CardImage, b: &CardImage) -> Ordering {
    let by_date = compare_dates(
        release_timestamp(&a.release_date),
        release_timestamp(&b.release_date),
    );
    if by_date != Ordering::Equal {
        return by_date;
    }

    let (prefix_a, prefix_b) = (a.number_prefix(), b.number_prefix());

    if let (Some(num_a), Some(num_b)) = (leading_number(prefix_a), leading_number(prefix_b)) {
        if num_a != num_b {
            return num_a.cmp(&num_b);
        }
    }

    a.variant()
        .cmp(&b.variant())
        .then_with(|| prefix_a.cmp(prefix_b))
}

/// Set-listing comparator; descending flips the whole comparison.
#[must_use]
pub fn compare(a: &CardImage, b: &CardImage, order: SortOrder) -> Ordering {
    let ordering = compare_ascending(a, b);
    match order {
        SortOrder::Ascending => ordering,
        SortOrder::Descending => ordering.reverse(),
    }
}

/// Stable in-place sort. Returns true when the order changed.
pub fn sort_cards(cards: &mut [CardImage], order: SortOrder) -> bool {
    let before: Vec<_> = cards.iter().map(|c| c.image_key.clone()).collect();
    cards.sort_by(|a, b| compare(a, b, order));
    cards
        .iter()
        .zip(&before)
        .any(|(card, key)| &card.image_key != key)
}
