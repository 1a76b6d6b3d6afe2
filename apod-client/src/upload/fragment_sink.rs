use apod_core::TrackIndex;
use bytes::Bytes;
use reqwest::header::CONTENT_TYPE;
use tracing::debug;

pub const FRAGMENT_CONTENT_TYPE: &str = "video/webm";

/// Destination of finished fragments. Submission never blocks and never
/// reports failure: a lost fragment is simply lost.
pub trait FragmentSink: Send + Sync {
    fn submit(&self, track: TrackIndex, fragment: Bytes);
}

/// Posts fragments to `{base}/save/{track}` on the relay.
#[derive(Clone)]
pub struct HttpFragmentSink {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFragmentSink {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_owned();
        Self { client, base_url }
    }

    pub fn endpoint(&self, track: TrackIndex) -> String {
        format!("{}/save/{}", self.base_url, track)
    }
}

impl FragmentSink for HttpFragmentSink {
    fn submit(&self, track: TrackIndex, fragment: Bytes) {
        let request = self
            .client
            .post(self.endpoint(track))
            .header(CONTENT_TYPE, FRAGMENT_CONTENT_TYPE)
            .body(fragment);

        tokio::spawn(async move {
            match request.send().await {
                Ok(response) => debug!("Fragment for track {} stored: {}", track, response.status()),
                Err(e) => debug!("Fragment for track {} dropped: {}", track, e),
            }
        });
    }
}
