use async_trait::async_trait;
use image::DynamicImage;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;

/// Failure of a single artwork fetch; never retried
#[derive(Debug, thiserror::Error)]
pub enum ArtworkError {
    #[error("Artwork request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Artwork server answered with HTTP status {0}")]
    Status(u16),

    #[error("Artwork could not be decoded: {0}")]
    Decode(#[from] image::ImageError),
}

/// Decoded artwork bitmap
#[derive(Debug, Clone)]
pub struct Artwork {
    pub url: String,
    pub image: Arc<DynamicImage>,
}

impl Artwork {
    pub fn new(url: impl Into<String>, image: DynamicImage) -> Self {
        Self {
            url: url.into(),
            image: Arc::new(image),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Where the renderer takes the artwork URL from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtworkSource {
    /// Always the same resource, whatever is playing
    Fixed(String),
    /// The current track's artwork, else `fallback`
    Metadata { fallback: Option<String> },
}

impl Default for ArtworkSource {
    fn default() -> Self {
        ArtworkSource::Metadata { fallback: None }
    }
}

/// Fetches and decodes artwork
#[async_trait]
pub trait ArtworkLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<Artwork, ArtworkError>;
}

/// [`ArtworkLoader`] that downloads over HTTP and decodes the body as an image
pub struct HttpArtworkLoader {
    client: reqwest::Client,
}

impl HttpArtworkLoader {
    pub fn new(timeout: Duration) -> Result<Self, ArtworkError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ArtworkLoader for HttpArtworkLoader {
    async fn load(&self, url: &str) -> Result<Artwork, ArtworkError> {
        log::debug!("Fetching artwork from {}", url);
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ArtworkError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        let image = image::load_from_memory(&bytes)?;
        log::debug!(
            "Decoded artwork {}x{} from {}",
            image.width(),
            image.height(),
            url
        );
        Ok(Artwork::new(url, image))
    }
}

/// Single-shot delivery of one artwork fetch
///
/// Resolves to `Some` when the fetch succeeds and was not superseded by a later
/// request. Resolves to `None` on failure, when there was nothing to fetch, or
/// when a newer request made this one obsolete.
pub struct ArtworkRequest {
    id: u64,
    receiver: oneshot::Receiver<Artwork>,
}

impl ArtworkRequest {
    pub(crate) fn new(id: u64, receiver: oneshot::Receiver<Artwork>) -> Self {
        Self { id, receiver }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Future for ArtworkRequest {
    type Output = Option<Artwork>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.receiver)
            .poll(cx)
            .map(|result| result.ok())
    }
}
