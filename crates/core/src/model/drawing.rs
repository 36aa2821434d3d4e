use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::{DrawingId, PromptId, UserId};
use crate::model::image::{ImageUrl, ImageUrlError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DrawingError {
    #[error("prompt text cannot be empty")]
    EmptyPrompt,

    #[error(transparent)]
    Image(#[from] ImageUrlError),
}

/// A user-authored free-drawing prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawingPrompt {
    pub id: PromptId,
    pub user_id: UserId,
    pub prompt_text: String,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated draft for a new prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPrompt {
    prompt_text: String,
    category: Option<String>,
}

impl NewPrompt {
    /// Build a validated prompt draft.
    ///
    /// # Errors
    ///
    /// Returns `DrawingError::EmptyPrompt` when the text is blank.
    pub fn new(
        prompt_text: impl Into<String>,
        category: Option<String>,
    ) -> Result<Self, DrawingError> {
        let prompt_text = prompt_text.into();
        if prompt_text.trim().is_empty() {
            return Err(DrawingError::EmptyPrompt);
        }
        Ok(Self {
            prompt_text,
            category,
        })
    }

    #[must_use]
    pub fn prompt_text(&self) -> &str {
        &self.prompt_text
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

/// A free-drawing session record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub id: DrawingId,
    pub user_id: UserId,
    pub image_url: Option<String>,
    pub time_spent_minutes: Option<u32>,
    pub notes: Option<String>,
    pub prompt_id: Option<PromptId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated draft for submitting a free drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDrawing {
    image_url: ImageUrl,
    time_spent_minutes: u32,
    notes: String,
    prompt_id: Option<PromptId>,
}

impl NewDrawing {
    /// Build a validated drawing draft.
    ///
    /// # Errors
    ///
    /// Returns `DrawingError::Image` for a malformed image URL.
    pub fn new(
        image_url: impl AsRef<str>,
        time_spent_minutes: u32,
        notes: impl Into<String>,
        prompt_id: Option<PromptId>,
    ) -> Result<Self, DrawingError> {
        Ok(Self {
            image_url: ImageUrl::parse(image_url)?,
            time_spent_minutes,
            notes: notes.into(),
            prompt_id,
        })
    }

    #[must_use]
    pub fn image_url(&self) -> &str {
        self.image_url.as_str()
    }

    #[must_use]
    pub fn time_spent_minutes(&self) -> u32 {
        self.time_spent_minutes
    }

    #[must_use]
    pub fn notes(&self) -> &str {
        &self.notes
    }

    #[must_use]
    pub fn prompt_id(&self) -> Option<PromptId> {
        self.prompt_id
    }
}

/// A drawing joined with the prompt it answered, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDrawing {
    pub drawing: Drawing,
    pub prompt: Option<DrawingPrompt>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_rejects_blank_text() {
        assert_eq!(NewPrompt::new(" ", None), Err(DrawingError::EmptyPrompt));
    }

    #[test]
    fn drawing_draft_carries_prompt_link() {
        let draft = NewDrawing::new(
            "https://cdn.example.com/d.png",
            25,
            "ink study",
            Some(PromptId::new(4)),
        )
        .unwrap();
        assert_eq!(draft.prompt_id(), Some(PromptId::new(4)));
        assert_eq!(draft.time_spent_minutes(), 25);
    }
}
