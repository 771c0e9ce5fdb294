use std::fmt;

use uuid::Uuid;

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// Per-upload identifier used to namespace scratch filenames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JobId(Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Uploads are always stored with a `.jpg` suffix, whatever the client sent.
    pub fn input_filename(&self) -> String {
        format!("{}_input.jpg", self.0)
    }

    pub fn output_filename(&self) -> String {
        format!("{}_output.png", self.0)
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Returns true when the text after the last `.` is one of the allowed image
/// extensions, compared case-insensitively.
pub fn is_allowed_filename(filename: &str) -> bool {
    match filename.rsplit_once('.') {
        Some((_, ext)) => {
            let ext = ext.to_ascii_lowercase();
            ALLOWED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

pub fn allowed_extensions_list() -> String {
    ALLOWED_EXTENSIONS.join(", ")
}
