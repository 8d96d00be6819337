use crate::errors::ResourceError;
use std::{
    fmt,
    path::{Path, PathBuf},
};
use url::Url;

/// A resource file, either on the local filesystem or on a web server
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Location {
    Url(Url),
    Path(PathBuf),
}

impl Location {
    /// Interpret a string as an http or https URL, a `file:` URL, or a path
    ///
    /// ```
    /// # use relocator::resource::Location;
    /// assert!(Location::parse("https://example.com/istio.yaml").unwrap().is_url());
    /// assert!(!Location::parse("istio/istio.yaml").unwrap().is_url());
    /// assert!(Location::parse("ftp://example.com/istio.yaml").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Location, ResourceError> {
        match Url::parse(s) {
            Ok(url) => match url.scheme() {
                "http" | "https" => Ok(Location::Url(url)),
                "file" => url
                    .to_file_path()
                    .map(Location::Path)
                    .map_err(|()| ResourceError::NotALocalFile(s.to_owned())),
                scheme => Err(ResourceError::UnsupportedScheme {
                    scheme: scheme.to_owned(),
                    location: s.to_owned(),
                }),
            },
            Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Location::Path(PathBuf::from(s))),
            Err(source) => Err(ResourceError::InvalidUrl {
                location: s.to_owned(),
                source,
            }),
        }
    }

    pub fn is_url(&self) -> bool {
        matches!(self, Location::Url(_))
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Location::Path(path) => Some(path),
            Location::Url(_) => None,
        }
    }

    /// Resolve a relative reference against the directory holding this
    /// location
    pub fn sibling(&self, relative: &str) -> Result<Location, ResourceError> {
        match self {
            Location::Url(url) => url.join(relative).map(Location::Url).map_err(|source| {
                ResourceError::InvalidUrl {
                    location: relative.to_owned(),
                    source,
                }
            }),
            Location::Path(path) => Ok(Location::Path(match path.parent() {
                Some(dir) => dir.join(relative),
                None => PathBuf::from(relative),
            })),
        }
    }
}

impl From<PathBuf> for Location {
    fn from(path: PathBuf) -> Self {
        Location::Path(path)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Url(url) => write!(f, "{}", url),
            Location::Path(path) => write!(f, "{}", path.display()),
        }
    }
}
