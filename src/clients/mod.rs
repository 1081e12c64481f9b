pub mod card_api;

pub use card_api::{CardApiClient, CardSource, FetchError};
