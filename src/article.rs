// src/article.rs
//
// Article document model as stored by the editor, the editor's save-time
// validation, and the object-store keys normalized images are uploaded under.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum subtitle length, in UTF-16 code units (as the editor's input counts).
pub const SUBTITLE_MAX_LENGTH: usize = 100;

/// Title used in storage keys while an article has none.
const FALLBACK_TITLE: &str = "temp";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleStatus {
    #[default]
    Published,
}

/// One entry of the article body, in display order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Paragraph {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Image {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_name: Option<String>,
    },
}

impl Block {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Block::Paragraph { text: text.into() }
    }

    pub fn image(url: impl Into<String>, file_name: Option<String>) -> Self {
        Block::Image {
            url: url.into(),
            alt: None,
            file_name,
        }
    }
}

/// Stored article document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub title: String,
    pub subtitle: String,
    #[serde(default)]
    pub status: ArticleStatus,
    #[serde(default)]
    pub blocks: Vec<Block>,
    /// Header image (16:9, at most 1 MiB)
    pub header_url: String,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Reasons the editor refuses to save.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArticleError {
    #[error("A title is required")]
    MissingTitle,

    #[error("A subtitle is required")]
    MissingSubtitle,

    #[error("The subtitle must be at most {max} characters (got {len})")]
    SubtitleTooLong { len: usize, max: usize },

    #[error("A header image is required")]
    MissingHeaderImage,
}

/// Editor state at save time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ArticleDraft {
    pub title: String,
    pub subtitle: String,
    /// URL of an already uploaded header image
    pub header_url: Option<String>,
    /// True when a header file has been picked but not uploaded yet
    pub header_pending: bool,
    pub blocks: Vec<Block>,
}

impl ArticleDraft {
    /// Swap block `idx` with its neighbour in direction `dir` (-1 or 1).
    /// Moves past either end leave the blocks unchanged.
    pub fn move_block(&mut self, idx: usize, dir: isize) {
        let Some(target) = idx.checked_add_signed(dir) else {
            return;
        };
        if idx < self.blocks.len() && target < self.blocks.len() {
            self.blocks.swap(idx, target);
        }
    }

    pub fn remove_block(&mut self, idx: usize) -> Option<Block> {
        (idx < self.blocks.len()).then(|| self.blocks.remove(idx))
    }

    /// Validate in the order the editor reports problems; the first failure wins.
    pub fn validate(&self) -> Result<(), ArticleError> {
        if self.title.trim().is_empty() {
            return Err(ArticleError::MissingTitle);
        }
        if self.subtitle.trim().is_empty() {
            return Err(ArticleError::MissingSubtitle);
        }
        let len = self.subtitle.encode_utf16().count();
        if len > SUBTITLE_MAX_LENGTH {
            return Err(ArticleError::SubtitleTooLong {
                len,
                max: SUBTITLE_MAX_LENGTH,
            });
        }
        let has_header = self
            .header_url
            .as_deref()
            .is_some_and(|url| !url.is_empty());
        if !has_header && !self.header_pending {
            return Err(ArticleError::MissingHeaderImage);
        }
        Ok(())
    }
}

fn title_segment(title: &str) -> &str {
    if title.is_empty() {
        FALLBACK_TITLE
    } else {
        title
    }
}

/// Object key of an article's header image: `articles/{title}/header`.
pub fn header_object_key(title: &str) -> String {
    format!("articles/{}/header", title_segment(title))
}

/// Object key of a content image: `articles/{title}/images/{millis}_{name}`,
/// with every whitespace run in the file name (including leading and
/// trailing ones) replaced by a single `_`.
pub fn content_object_key(title: &str, uploaded_at: DateTime<Utc>, file_name: &str) -> String {
    let mut name = String::with_capacity(file_name.len());
    let mut in_space = false;
    for ch in file_name.chars() {
        if ch.is_whitespace() {
            if !in_space {
                name.push('_');
            }
            in_space = true;
        } else {
            name.push(ch);
            in_space = false;
        }
    }
    format!(
        "articles/{}/images/{}_{}",
        title_segment(title),
        uploaded_at.timestamp_millis(),
        name
    )
}
