use crate::errors::ImageError;
use regex::Regex;
use std::{fmt, str::FromStr};

/// Human-chosen version label, the part after `:` in `istio/proxyv2:1.0.1`
///
/// At most 128 characters. The first one is a word character; dots and
/// dashes are allowed after it.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Tag {
    serialized: String,
}

static LOCAL_STR: &str = "local";

impl Tag {
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    pub fn parse(s: &str) -> Result<Self, ImageError> {
        lazy_static! {
            static ref RE: Regex = Regex::new(&format!("^{}$", Tag::regex_str())).unwrap();
        }
        if RE.is_match(s) {
            Ok(Tag {
                serialized: s.to_owned(),
            })
        } else {
            Err(ImageError::InvalidReferenceFormat(s.to_owned()))
        }
    }

    /// The tag given to untagged images relocated to the local-only registry
    pub fn local() -> Self {
        Tag {
            serialized: LOCAL_STR.to_owned(),
        }
    }

    pub(crate) fn regex_str() -> &'static str {
        "(?P<tag>[a-zA-Z0-9_][a-zA-Z0-9_.-]{0,127})"
    }
}

impl FromStr for Tag {
    type Err = ImageError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tag::parse(s)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tag({})", self)
    }
}
