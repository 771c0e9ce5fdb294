#[derive(Debug)]
pub enum ApplicationError {
    InvalidContentType,
    MissingFile,
    EmptyFilename,
    UnsupportedType,
    UploadError(String),
    UpstreamInvalidPath(String),
    UpstreamUnsupportedFormat,
    ProcessingFailure(String),
    NotFound,
}
