pub mod cache;
pub mod key;

pub use cache::OptionsCache;
pub use key::OptionsKey;
