use once_cell::sync::Lazy;
use regex::Regex;
use richfield_html::Element;
use serde::{Deserialize, Serialize};

pub const DEFAULT_YOUTUBE_WIDTH: u32 = 560;
pub const DEFAULT_TWEET_WIDTH: u32 = 550;
/// Widest embed accepted from markup or commands, in px.
pub const MAX_EMBED_WIDTH: u32 = 4096;

const YOUTUBE_EMBED_BASE: &str = "https://www.youtube-nocookie.com/embed/";
const YOUTUBE_ALLOW: &str =
    "accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture";

static YOUTUBE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?:^|[/.])(?:youtube(?:-nocookie)?\.com/(?:watch\?(?:.*&)?v=|embed/|shorts/|live/|v/)|youtu\.be/)([A-Za-z0-9_-]{11})",
    )
    .expect("invalid youtube url regex")
});

static YOUTUBE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]{11}$").expect("invalid youtube id regex"));

static TWEET_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[/.])(?:twitter|x)\.com/(?:#!/)?(?:\w+|i)/status(?:es)?/(\d+)")
        .expect("invalid tweet url regex")
});

static TWEET_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,20}$").expect("invalid tweet id regex"));

/// Accepts a watch/share/embed url or a bare 11 character video id.
pub fn extract_youtube_video_id(input: &str) -> Option<String> {
    let input = input.trim();
    if YOUTUBE_ID.is_match(input) {
        return Some(input.to_string());
    }
    YOUTUBE_URL
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Accepts a twitter.com or x.com status url or a bare numeric id.
pub fn extract_tweet_id(input: &str) -> Option<String> {
    let input = input.trim();
    if TWEET_ID.is_match(input) {
        return Some(input.to_string());
    }
    TWEET_URL
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedAlignment {
    Left,
    #[default]
    Center,
    Right,
}

impl EmbedAlignment {
    pub fn as_str(self) -> &'static str {
        match self {
            EmbedAlignment::Left => "left",
            EmbedAlignment::Center => "center",
            EmbedAlignment::Right => "right",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "left" => Some(EmbedAlignment::Left),
            "center" => Some(EmbedAlignment::Center),
            "right" => Some(EmbedAlignment::Right),
            _ => None,
        }
    }
}

/// Zero falls back to `default`; anything wider than [`MAX_EMBED_WIDTH`] is capped.
pub fn clamp_embed_width(width: Option<u32>, default: u32) -> u32 {
    width
        .filter(|w| *w > 0)
        .map_or(default, |w| w.min(MAX_EMBED_WIDTH))
}

fn parse_width(value: Option<&str>, default: u32) -> u32 {
    let width = value.and_then(|w| {
        let digits = w.trim();
        match digits.parse::<u32>() {
            Ok(w) => Some(w),
            Err(_) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                Some(MAX_EMBED_WIDTH)
            }
            Err(_) => None,
        }
    });
    clamp_embed_width(width, default)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YouTubeData {
    #[serde(rename = "videoID")]
    pub video_id: String,
    #[serde(default = "default_youtube_width")]
    pub width: u32,
    #[serde(default)]
    pub alignment: EmbedAlignment,
}

fn default_youtube_width() -> u32 {
    DEFAULT_YOUTUBE_WIDTH
}

impl YouTubeData {
    pub fn from_url(url: &str) -> Option<Self> {
        Some(Self {
            video_id: extract_youtube_video_id(url)?,
            width: DEFAULT_YOUTUBE_WIDTH,
            alignment: EmbedAlignment::default(),
        })
    }

    pub fn height(&self) -> u32 {
        (u64::from(self.width) * 9 / 16) as u32
    }

    pub fn embed_url(&self) -> String {
        format!("{YOUTUBE_EMBED_BASE}{}", self.video_id)
    }

    pub(crate) fn from_element(el: &Element) -> Option<Self> {
        let video_id = el
            .attr("data-youtube-id")
            .and_then(extract_youtube_video_id)
            .or_else(|| el.attr("src").and_then(extract_youtube_video_id))?;
        Some(Self {
            video_id,
            width: parse_width(el.attr("width"), DEFAULT_YOUTUBE_WIDTH),
            alignment: el
                .attr("data-alignment")
                .and_then(EmbedAlignment::parse)
                .unwrap_or_default(),
        })
    }

    pub(crate) fn export_element(&self) -> Element {
        Element::new("iframe")
            .with_attr("src", self.embed_url())
            .with_attr("width", self.width.to_string())
            .with_attr("height", self.height().to_string())
            .with_attr("data-youtube-id", self.video_id.clone())
            .with_attr("data-alignment", self.alignment.as_str())
            .with_attr("frameborder", "0")
            .with_attr("allow", YOUTUBE_ALLOW)
            .with_attr("allowfullscreen", "true")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetData {
    #[serde(rename = "tweetID")]
    pub tweet_id: String,
    #[serde(default = "default_tweet_width")]
    pub width: u32,
    #[serde(default)]
    pub alignment: EmbedAlignment,
}

fn default_tweet_width() -> u32 {
    DEFAULT_TWEET_WIDTH
}

impl TweetData {
    pub fn from_url(url: &str) -> Option<Self> {
        Some(Self {
            tweet_id: extract_tweet_id(url)?,
            width: DEFAULT_TWEET_WIDTH,
            alignment: EmbedAlignment::default(),
        })
    }

    pub fn status_url(&self) -> String {
        format!("https://twitter.com/i/status/{}", self.tweet_id)
    }

    pub(crate) fn from_element(el: &Element) -> Option<Self> {
        let tweet_id = el.attr("data-tweet-id").and_then(extract_tweet_id).or_else(|| {
            el.element_children()
                .filter(|child| child.tag == "a")
                .find_map(|a| a.attr("href").and_then(extract_tweet_id))
        })?;
        Some(Self {
            tweet_id,
            width: parse_width(el.attr("data-width"), DEFAULT_TWEET_WIDTH),
            alignment: el
                .attr("data-alignment")
                .and_then(EmbedAlignment::parse)
                .unwrap_or_default(),
        })
    }

    pub(crate) fn export_element(&self) -> Element {
        let url = self.status_url();
        Element::new("blockquote")
            .with_attr("class", "twitter-tweet")
            .with_attr("data-tweet-id", self.tweet_id.clone())
            .with_attr("data-width", self.width.to_string())
            .with_attr("data-alignment", self.alignment.as_str())
            .with_child(Element::new("a").with_attr("href", url.clone()).with_text(url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn youtube_id_extraction_is_idempotent() {
        let urls = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?t=10",
            "https://www.youtube.com/embed/dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "dQw4w9WgXcQ",
        ];
        for url in urls {
            let id = extract_youtube_video_id(url).unwrap();
            assert_eq!(id, "dQw4w9WgXcQ");
            assert_eq!(extract_youtube_video_id(&id).as_deref(), Some("dQw4w9WgXcQ"));
        }
        assert_eq!(extract_youtube_video_id("https://vimeo.com/123"), None);
        assert_eq!(
            extract_youtube_video_id("https://notyoutube.com/embed/dQw4w9WgXcQ"),
            None
        );
    }

    #[test]
    fn tweet_id_extraction_is_idempotent() {
        for url in [
            "https://twitter.com/jack/status/20",
            "https://x.com/jack/status/20?s=46",
            "20",
        ] {
            let id = extract_tweet_id(url).unwrap();
            assert_eq!(id, "20");
            assert_eq!(extract_tweet_id(&id).as_deref(), Some("20"));
        }
        assert_eq!(extract_tweet_id("https://example.com/status/abc"), None);
        assert_eq!(extract_tweet_id("https://box.com/a/status/123"), None);
        assert_eq!(
            extract_tweet_id("https://mobile.twitter.com/jack/status/20").as_deref(),
            Some("20")
        );
    }

    #[test]
    fn widths_are_capped_and_height_never_overflows() {
        assert_eq!(parse_width(Some("4000000000"), DEFAULT_YOUTUBE_WIDTH), MAX_EMBED_WIDTH);
        assert_eq!(parse_width(Some("99999999999999"), DEFAULT_YOUTUBE_WIDTH), MAX_EMBED_WIDTH);
        assert_eq!(parse_width(Some("0"), DEFAULT_YOUTUBE_WIDTH), DEFAULT_YOUTUBE_WIDTH);
        assert_eq!(parse_width(Some("wide"), DEFAULT_TWEET_WIDTH), DEFAULT_TWEET_WIDTH);

        let video = YouTubeData {
            width: u32::MAX,
            ..YouTubeData::from_url("dQw4w9WgXcQ").unwrap()
        };
        assert_eq!(video.height(), (u64::from(u32::MAX) * 9 / 16) as u32);
    }
}
