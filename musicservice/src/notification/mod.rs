pub mod artwork;
pub mod description;
pub mod manager;

pub use artwork::{Artwork, ArtworkError, ArtworkLoader, ArtworkRequest, ArtworkSource, HttpArtworkLoader};
pub use description::DescriptionRenderer;
pub use manager::{NotificationManager, NowPlayingCard, StatusDisplay};
