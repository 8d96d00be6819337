//! Error types you might see while relocating a bundle

use thiserror::Error;

/// Errors while parsing or constructing image references
#[derive(Error, Debug)]
pub enum ImageError {
    /// invalid image reference format
    #[error("invalid image reference format: {0:?}")]
    InvalidReferenceFormat(String),

    /// the target host and user leave no room for a flattened repository
    #[error("relocated image name would exceed {limit} characters below {prefix:?}")]
    NameTooLong { prefix: String, limit: usize },
}

/// Errors loading, validating, or saving a manifest or an image manifest
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("error reading {kind} file: {source}")]
    Read {
        kind: &'static str,
        source: ResourceError,
    },

    #[error("error parsing {kind} file: {source}")]
    Parse {
        kind: &'static str,
        source: serde_yaml::Error,
    },

    #[error("{kind} has unsupported version: {version}")]
    UnsupportedVersion { kind: &'static str, version: String },

    /// one of the required lists or maps was absent
    #[error("{kind} is incomplete: {missing} missing: {location}")]
    Incomplete {
        kind: &'static str,
        missing: &'static str,
        location: String,
    },

    #[error("resources must use a http or https URL or a relative path: absolute path not supported: {0}")]
    AbsoluteResourcePath(String),

    #[error("resources must use a http or https URL or a relative path: scheme {scheme} not supported: {resource}")]
    UnsupportedResourceScheme { scheme: String, resource: String },

    #[error("relative path undefined since manifest was not read from a directory")]
    NoSourceDirectory,

    /// the image manifest contains a name which is not an image reference
    #[error("invalid image in image manifest: {0}")]
    InvalidImage(#[from] ImageError),

    #[error("error writing {kind} file: {source}")]
    Write {
        kind: &'static str,
        source: std::io::Error,
    },

    #[error("error serializing {kind}: {source}")]
    Serialize {
        kind: &'static str,
        source: serde_yaml::Error,
    },
}

/// Errors locating or fetching a resource file
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("unsupported URL scheme {scheme} in {location}")]
    UnsupportedScheme { scheme: String, location: String },

    #[error("invalid URL {location}: {source}")]
    InvalidUrl {
        location: String,
        source: url::ParseError,
    },

    #[error("file URL does not name a local path: {0}")]
    NotALocalFile(String),

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// network request error
    #[error("network request error: {0}")]
    NetworkRequest(#[from] reqwest::Error),

    /// fetching is disabled on this client
    #[error("we are in offline mode, but a download was requested: {0}")]
    DownloadInOfflineMode(String),
}

/// Errors that abort a relocation run
#[derive(Error, Debug)]
pub enum RelocationError {
    #[error("invalid registry hostname: '{value}' contains '{found}'")]
    InvalidRegistryHostname { value: String, found: &'static str },

    #[error("invalid user: '{value}' contains '{found}'")]
    InvalidUser { value: String, found: &'static str },

    #[error("output directory is a file: {0}")]
    OutputIsFile(String),

    /// the output location is one of the inputs being relocated
    #[error("output would overwrite its own input: {0}")]
    OutputIsInput(String),

    /// the combined image matcher exceeded the regex engine's limits
    #[error("cannot compile image matcher: {0}")]
    Matcher(#[from] regex::Error),

    #[error("cannot relocate manifest due to collisions in output paths")]
    OutputCollision,

    #[error("image manifest already exists, use --force to overwrite it")]
    ImageManifestExists,

    #[error("error parsing resource file {resource}: {source}")]
    ResourceParse {
        resource: String,
        source: serde_yaml::Error,
    },

    /// relocated image name could not be parsed
    #[error("{0}")]
    Image(#[from] ImageError),

    #[error("{0}")]
    Manifest(#[from] ManifestError),

    #[error("{0}")]
    Resource(#[from] ResourceError),

    /// storage io error
    #[error("storage io error at {path}: {source}")]
    Storage {
        path: String,
        source: std::io::Error,
    },
}
