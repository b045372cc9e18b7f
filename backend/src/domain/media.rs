//! Image references attached to accounts and catalogue items.

use std::fmt;

use url::Url;

const MAX_IMAGE_URL_LEN: usize = 2048;

/// Validation failures for [`ImageUrl`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ImageUrlError {
    /// Not an absolute URL.
    #[error("image must be an absolute URL")]
    Malformed,
    /// Scheme other than http or https.
    #[error("image URL must use http or https")]
    UnsupportedScheme,
    /// Longer than the storage limit.
    #[error("image URL must be at most {MAX_IMAGE_URL_LEN} characters")]
    TooLong,
}

/// Absolute http(s) URL pointing at an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrl(String);

impl ImageUrl {
    /// Validate and normalise a URL string.
    ///
    /// # Examples
    /// ```
    /// use storefront::domain::ImageUrl;
    ///
    /// let url = ImageUrl::new("https://cdn.example.com/rex.png").expect("valid url");
    /// assert_eq!(url.as_str(), "https://cdn.example.com/rex.png");
    /// assert!(ImageUrl::new("ftp://example.com/rex.png").is_err());
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, ImageUrlError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.chars().count() > MAX_IMAGE_URL_LEN {
            return Err(ImageUrlError::TooLong);
        }
        let parsed = Url::parse(trimmed).map_err(|_| ImageUrlError::Malformed)?;
        match parsed.scheme() {
            "http" | "https" => Ok(Self(parsed.into())),
            _ => Err(ImageUrlError::UnsupportedScheme),
        }
    }

    /// Borrow the URL text.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ImageUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
