pub mod card;

pub use card::{CardImage, TagParseError, Variant};
