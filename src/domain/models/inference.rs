use std::path::{Path, PathBuf};

/// What the background-removal endpoint handed back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceResult {
    /// A URL the browser can fetch directly. Nothing is copied locally.
    RemoteUrl(String),
    /// A file on this machine that must be copied into scratch storage.
    LocalPath(PathBuf),
    /// The processed image itself.
    Bytes(Vec<u8>),
}

impl InferenceResult {
    /// Classifies a textual upstream answer.
    ///
    /// An existing local path wins over a URL-looking string; anything that is
    /// neither an `http(s)://` URL nor an existing file is still reported as a
    /// path so the caller can surface it as invalid.
    pub fn from_upstream_text(text: &str) -> Self {
        let is_url = text.starts_with("http://") || text.starts_with("https://");
        if is_url && !Path::new(text).exists() {
            InferenceResult::RemoteUrl(text.to_string())
        } else {
            InferenceResult::LocalPath(PathBuf::from(text))
        }
    }

    /// The upstream string, when the result was textual.
    pub fn api_url(&self) -> Option<String> {
        match self {
            InferenceResult::RemoteUrl(url) => Some(url.clone()),
            InferenceResult::LocalPath(path) => Some(path.display().to_string()),
            InferenceResult::Bytes(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_text_is_remote() {
        let result = InferenceResult::from_upstream_text("https://example.com/out.png");
        assert_eq!(
            result,
            InferenceResult::RemoteUrl("https://example.com/out.png".to_string())
        );
    }

    #[test]
    fn test_plain_text_is_local_path() {
        let result = InferenceResult::from_upstream_text("/tmp/gradio/abc/image.webp");
        assert_eq!(
            result,
            InferenceResult::LocalPath(PathBuf::from("/tmp/gradio/abc/image.webp"))
        );
    }

    #[test]
    fn test_api_url_only_for_textual_results() {
        assert_eq!(
            InferenceResult::RemoteUrl("https://x/y.png".into()).api_url(),
            Some("https://x/y.png".to_string())
        );
        assert_eq!(
            InferenceResult::LocalPath(PathBuf::from("/tmp/out.png")).api_url(),
            Some("/tmp/out.png".to_string())
        );
        assert_eq!(InferenceResult::Bytes(vec![1, 2, 3]).api_url(), None);
    }
}
