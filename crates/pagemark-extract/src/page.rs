//! Page snapshot input and content classification.

use serde::{Deserialize, Serialize};
use url::Url;

/// Tab metadata captured alongside the page HTML
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

/// Raw page HTML plus its metadata, as captured from a browser tab
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub html: String,
    #[serde(flatten)]
    pub metadata: PageMetadata,
}

/// Whether content can be read from a page at this URL.
///
/// Browser-internal pages (`chrome://`, `about:`, extension pages, store
/// pages served over other schemes) are not readable.
pub fn is_supported_url(url: &str) -> bool {
    ["http://", "https://", "file:///"]
        .iter()
        .any(|prefix| url.starts_with(prefix))
}

/// Video hosts with subtitle support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoSite {
    Youtube,
    Bilibili,
}

/// What kind of page the content came from
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ContentKind {
    Webpage,
    #[serde(rename_all = "camelCase")]
    VideoPage { site: VideoSite, video_id: String },
}

impl ContentKind {
    /// Classify a page by its URL. Anything that is not a recognizable video
    /// page, including URLs that do not parse, is a plain webpage.
    pub fn detect(url: &str) -> Self {
        let Ok(parsed) = Url::parse(url) else {
            return Self::Webpage;
        };
        let Some(host) = parsed.host_str() else {
            return Self::Webpage;
        };

        let video = if host.contains("youtube.com") || host.contains("youtu.be") {
            youtube_id(&parsed, host).map(|id| (VideoSite::Youtube, id))
        } else if host.contains("bilibili.com") {
            bilibili_id(&parsed).map(|id| (VideoSite::Bilibili, id))
        } else {
            None
        };

        match video {
            Some((site, video_id)) => Self::VideoPage { site, video_id },
            None => Self::Webpage,
        }
    }

    pub fn is_video(&self) -> bool {
        matches!(self, Self::VideoPage { .. })
    }
}

fn youtube_id(url: &Url, host: &str) -> Option<String> {
    let id = if host.contains("youtu.be") {
        url.path().trim_matches('/').to_string()
    } else {
        url.query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())?
    };
    (!id.is_empty()).then_some(id)
}

// /video/<id>[/...]
fn bilibili_id(url: &Url) -> Option<String> {
    let mut segments = url.path_segments()?;
    if segments.next()? != "video" {
        return None;
    }
    segments
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
