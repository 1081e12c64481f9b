use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::constants::variants;
use crate::domain::ImageKey;

/// One card image record as returned in `image_rows`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardImage {
    pub image_key: ImageKey,
    #[serde(default, deserialize_with = "nullable")]
    pub card_title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub set_name: String,
    #[serde(default, deserialize_with = "nullable")]
    pub card_number: String,
    #[serde(default, deserialize_with = "nullable")]
    pub illustrator: String,
    #[serde(default, deserialize_with = "nullable")]
    pub release_date: String,
    /// Serialized tag list, e.g. `"['energy', '1st-edition']"`.
    #[serde(default, deserialize_with = "nullable")]
    pub tags: String,
    #[serde(default, deserialize_with = "nullable")]
    pub is_reverse_holo: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub item: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub trainer_owned: i64,
}

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Error)]
#[error("Invalid tag list {raw:?}: {source}")]
pub struct TagParseError {
    pub raw: String,
    #[source]
    pub source: serde_json::Error,
}

/// Variant of a printing, derived from the card number suffix.
///
/// Ordered the way set listings show them: plain first, master ball last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Variant {
    Plain,
    ReverseHolo,
    Promo,
    MasterBall,
}

impl Variant {
    #[must_use]
    pub fn from_card_number(card_number: &str) -> Self {
        if card_number.ends_with(variants::MASTER_BALL_SUFFIX) {
            Self::MasterBall
        } else if card_number.ends_with(variants::PROMO_SUFFIX) {
            Self::Promo
        } else if card_number.ends_with(variants::REVERSE_HOLO_SUFFIX) {
            Self::ReverseHolo
        } else {
            Self::Plain
        }
    }
}

impl CardImage {
    #[must_use]
    pub const fn is_reverse_holo(&self) -> bool {
        self.is_reverse_holo == 1
    }

    #[must_use]
    pub const fn is_item(&self) -> bool {
        self.item == 1
    }

    #[must_use]
    pub const fn is_trainer_owned(&self) -> bool {
        self.trainer_owned == 1
    }

    #[must_use]
    pub fn variant(&self) -> Variant {
        Variant::from_card_number(&self.card_number)
    }

    /// Collector number before the `/`, e.g. `"5"` for `"5/100-RH"`.
    #[must_use]
    pub fn number_prefix(&self) -> &str {
        self.card_number
            .split('/')
            .next()
            .unwrap_or(&self.card_number)
    }

    /// Parses the serialized tag list. The API emits single-quoted lists,
    /// which are accepted by swapping quotes before JSON parsing.
    pub fn tags(&self) -> Result<Vec<String>, TagParseError> {
        let raw = self.tags.trim();
        if raw.is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str::<Vec<String>>(&raw.replace('\'', "\"")).map_err(|source| {
            TagParseError {
                raw: self.tags.clone(),
                source,
            }
        })
    }

    /// Tag membership. Falls back to a substring match on the raw list when
    /// it does not parse.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        match self.tags() {
            Ok(tags) => tags.iter().any(|t| t == tag),
            Err(_) => self.tags.contains(tag),
        }
    }

    #[must_use]
    pub fn image_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.image_key)
    }

    #[cfg(test)]
    pub(crate) fn with_key(key: &str) -> Self {
        Self {
            image_key: ImageKey::new(key),
            card_title: String::new(),
            set_name: String::new(),
            card_number: String::new(),
            illustrator: String::new(),
            release_date: String::new(),
            tags: String::new(),
            is_reverse_holo: 0,
            item: 0,
            trainer_owned: 0,
        }
    }
}
