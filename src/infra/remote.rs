//! HTTP adapter for the remote content API.

use std::time::Duration;

use async_trait::async_trait;
use lectern_api_types::{PostListEnvelope, RemoteMedia, RemotePost, RemotePostSummary};
use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::{
    application::source::{ContentSource, SourceError},
    domain::posts::{MediaRef, PostContent, PostMetadata, SeoFields},
};

use super::error::InfraError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

static BODY_SANITIZER: Lazy<ammonia::Builder<'static>> = Lazy::new(build_body_sanitizer);

fn build_body_sanitizer() -> ammonia::Builder<'static> {
    let mut builder = ammonia::Builder::default();
    builder.add_tags(&["figure", "figcaption", "picture", "source"]);
    builder.add_tag_attributes("img", &["loading", "width", "height"]);
    builder.add_tag_attributes("source", &["srcset", "type", "media"]);
    builder
}

/// [`ContentSource`] backed by `GET {base}/posts` and `GET {base}/posts/{slug}`.
#[derive(Debug, Clone)]
pub struct HttpContentSource {
    client: Client,
    base_url: Url,
    timeout: Duration,
}

impl HttpContentSource {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, InfraError> {
        if base_url.cannot_be_a_base() {
            return Err(InfraError::configuration(format!(
                "remote base url `{base_url}` cannot carry a path"
            )));
        }

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT.min(timeout))
            .timeout(timeout)
            .user_agent(concat!("lectern/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(InfraError::http_client)?;

        Ok(Self {
            client,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// `Ok(None)` on 404, the decoded body on any 2xx.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, SourceError> {
        debug!(target = "lectern::remote", %url, "GET");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| self.classify(err))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|err| self.classify(err))
    }

    fn classify(&self, err: reqwest::Error) -> SourceError {
        if err.is_timeout() {
            SourceError::Timeout(self.timeout)
        } else if err.is_decode() {
            SourceError::malformed(err)
        } else {
            SourceError::transport(err)
        }
    }
}

#[async_trait]
impl ContentSource for HttpContentSource {
    async fn list_posts(&self) -> Result<Vec<PostMetadata>, SourceError> {
        let envelope: PostListEnvelope = self
            .get_json(self.endpoint(&["posts"]))
            .await?
            .ok_or_else(|| SourceError::Status(StatusCode::NOT_FOUND.as_u16()))?;

        Ok(envelope.posts.into_iter().map(metadata_from_wire).collect())
    }

    async fn post_by_slug(&self, slug: &str) -> Result<Option<PostContent>, SourceError> {
        let post: Option<RemotePost> = self.get_json(self.endpoint(&["posts", slug])).await?;
        Ok(post.map(content_from_wire))
    }
}

fn metadata_from_wire(summary: RemotePostSummary) -> PostMetadata {
    PostMetadata {
        id: summary.id,
        slug: summary.slug,
        title: summary.title,
        excerpt: summary.excerpt,
        author: summary.author,
        published_at: summary.published_at,
        category: summary.category,
        tags: summary.tags.into_iter().collect(),
        cover_image: summary.cover_image,
        featured: summary.featured,
    }
}

fn content_from_wire(post: RemotePost) -> PostContent {
    PostContent {
        metadata: metadata_from_wire(post.summary),
        body: BODY_SANITIZER.clean(&post.body).to_string(),
        seo: SeoFields {
            meta_title: post.seo.meta_title,
            meta_description: post.seo.meta_description,
            keywords: post.seo.keywords,
        },
        related_media: post.related_media.into_iter().map(media_from_wire).collect(),
    }
}

fn media_from_wire(media: RemoteMedia) -> MediaRef {
    MediaRef {
        url: media.url,
        kind: media.kind,
        caption: media.caption,
    }
}
