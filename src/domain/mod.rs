pub mod entry;
pub mod feed;
pub mod layout;

pub use entry::Entry;
pub use feed::Feed;
pub use layout::{AssetLifetime, AssetReference, OutputLayout};
