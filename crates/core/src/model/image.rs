use thiserror::Error;
use url::Url;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImageUrlError {
    #[error("image url cannot be empty")]
    Empty,

    #[error("image url is not a valid url")]
    Invalid,
}

/// A validated URL pointing at an uploaded image.
///
/// Rows store the raw string the backend returned; this type exists so drafts
/// reject malformed input before anything is sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrl(Url);

impl ImageUrl {
    /// Parse and validate an image URL.
    ///
    /// # Errors
    ///
    /// Returns `ImageUrlError::Empty` for blank input and
    /// `ImageUrlError::Invalid` when the string does not parse as a URL.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, ImageUrlError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ImageUrlError::Empty);
        }
        let url = Url::parse(trimmed).map_err(|_| ImageUrlError::Invalid)?;
        Ok(Self(url))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_https_url() {
        let url = ImageUrl::parse("https://cdn.example.com/u/1/sketch.png").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.com/u/1/sketch.png");
    }

    #[test]
    fn rejects_empty_and_whitespace() {
        assert_eq!(ImageUrl::parse(""), Err(ImageUrlError::Empty));
        assert_eq!(ImageUrl::parse("   "), Err(ImageUrlError::Empty));
    }

    #[test]
    fn rejects_relative_path() {
        assert_eq!(ImageUrl::parse("uploads/sketch.png"), Err(ImageUrlError::Invalid));
    }
}
