//! Carousel publishing glue: media upload, child containers, publish.
//!
//! Storage and the publishing API are collaborator seams. `MediaStore` has
//! no production implementation here; the `post` command takes
//! already-hosted image URLs instead.
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

const GRAPH_BASE_URL: &str = "https://graph.facebook.com/v24.0";
const PUBLISH_TIMEOUT: Duration = Duration::from_secs(30);
/// The Graph API needs a moment between carousel container creation and
/// the publish call.
const PUBLISH_SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Object storage that serves uploads back over a temporarily-valid URL.
pub trait MediaStore {
    fn upload(&self, local_path: &Path, dest_path: &str) -> Result<String>;
}

/// Carousel assembly: one media container per image, then a single publish.
pub trait CarouselPublisher {
    fn create_media_item(&self, image_url: &str) -> Result<String>;
    fn publish_carousel(&self, media_ids: &[String], caption: &str) -> Result<String>;
}

/// Instagram Graph API client.
pub struct InstagramClient {
    agent: ureq::Agent,
    user_id: String,
    access_token: String,
    base_url: String,
}

impl InstagramClient {
    pub fn new(user_id: String, access_token: String) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(PUBLISH_TIMEOUT))
            .build()
            .into();
        InstagramClient {
            agent,
            user_id,
            access_token,
            base_url: GRAPH_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (test double).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn post_media(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<MediaReply> {
        let url = format!("{}/{}/{endpoint}", self.base_url, self.user_id);
        let mut request = self.agent.post(url.as_str());
        for (key, value) in params {
            request = request.query(key, value);
        }
        let mut response = request
            .query("access_token", &self.access_token)
            .send_empty()
            .map_err(|err| Error::ExternalService {
                service: "instagram",
                message: err.to_string(),
            })?;
        response
            .body_mut()
            .read_json()
            .map_err(|err| Error::ExternalService {
                service: "instagram",
                message: format!("decode media reply: {err}"),
            })
    }
}

#[derive(Deserialize)]
struct MediaReply {
    #[serde(default)]
    id: Option<String>,
}

impl CarouselPublisher for InstagramClient {
    fn create_media_item(&self, image_url: &str) -> Result<String> {
        let reply = self.post_media(
            "media",
            &[("image_url", image_url), ("is_carousel_item", "true")],
        )?;
        reply.id.ok_or_else(|| Error::ExternalService {
            service: "instagram",
            message: format!("child media creation returned no id for {image_url}"),
        })
    }

    fn publish_carousel(&self, media_ids: &[String], caption: &str) -> Result<String> {
        let children = media_ids.join(",");
        let reply = self.post_media(
            "media",
            &[
                ("caption", caption),
                ("children", &children),
                ("media_type", "CAROUSEL"),
            ],
        )?;
        let parent_id = reply.id.ok_or_else(|| Error::ExternalService {
            service: "instagram",
            message: "carousel container creation returned no id".to_string(),
        })?;
        tracing::info!(parent_id = %parent_id, children = media_ids.len(), "carousel container created");

        thread::sleep(PUBLISH_SETTLE_DELAY);

        let reply = self.post_media("media_publish", &[("creation_id", &parent_id)])?;
        reply.id.ok_or_else(|| Error::ExternalService {
            service: "instagram",
            message: "carousel publish returned no id".to_string(),
        })
    }
}

/// Upload local images through the store and publish them as one carousel.
pub fn post_carousel(
    store: &dyn MediaStore,
    publisher: &dyn CarouselPublisher,
    image_paths: &[PathBuf],
    caption: &str,
) -> Result<String> {
    let mut image_urls = Vec::with_capacity(image_paths.len());
    for path in image_paths {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| Error::Schema(format!("image path has no file name: {}", path.display())))?;
        let dest = format!("instagram/{file_name}");
        image_urls.push(store.upload(path, &dest)?);
    }
    publish_urls(publisher, &image_urls, caption)
}

/// Publish already-hosted images as one carousel.
///
/// An image whose child container fails is skipped; a carousel with zero
/// children cannot be published, so that is fatal.
pub fn publish_urls(
    publisher: &dyn CarouselPublisher,
    image_urls: &[String],
    caption: &str,
) -> Result<String> {
    let mut media_ids = Vec::with_capacity(image_urls.len());
    for url in image_urls {
        match publisher.create_media_item(url) {
            Ok(id) => media_ids.push(id),
            Err(err) => {
                tracing::warn!(url = %url, error = %err, "skipping image; child media creation failed");
            }
        }
    }
    if media_ids.is_empty() {
        return Err(Error::ExternalService {
            service: "instagram",
            message: "no child media could be created".to_string(),
        });
    }
    publisher.publish_carousel(&media_ids, caption)
}
