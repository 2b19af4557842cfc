use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::MaterialId;

/// Number of leading characters kept as a material preview.
pub const PREVIEW_CHARS: usize = 500;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MaterialError {
    #[error("please provide a title for your material")]
    EmptyTitle,

    #[error("please provide some study material")]
    EmptyContent,
}

/// Study material handed to the plan and quiz workflows.
///
/// Title and content are trimmed and must be non-empty. Once built the text is
/// never changed; only the store-assigned id may be attached later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    id: Option<MaterialId>,
    title: String,
    content: String,
}

impl Material {
    /// Validate and build a material from user input.
    ///
    /// # Errors
    ///
    /// Returns `MaterialError::EmptyContent` when the content is blank and
    /// `MaterialError::EmptyTitle` when the title is blank.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Result<Self, MaterialError> {
        let title = title.into();
        let content = content.into();
        if content.trim().is_empty() {
            return Err(MaterialError::EmptyContent);
        }
        if title.trim().is_empty() {
            return Err(MaterialError::EmptyTitle);
        }
        Ok(Self {
            id: None,
            title: title.trim().to_owned(),
            content: content.trim().to_owned(),
        })
    }

    /// Attach the id returned by the store.
    #[must_use]
    pub fn with_id(mut self, id: MaterialId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn id(&self) -> Option<MaterialId> {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// First `PREVIEW_CHARS` characters of the content.
    #[must_use]
    pub fn preview(&self) -> &str {
        match self.content.char_indices().nth(PREVIEW_CHARS) {
            Some((idx, _)) => &self.content[..idx],
            None => &self.content,
        }
    }
}
