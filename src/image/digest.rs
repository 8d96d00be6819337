use crate::errors::ImageError;
use regex::Regex;
use std::{fmt, ops::Range, str::FromStr};

/// A digest pinning the exact contents of an image
///
/// Image references may carry one after an `@`. Relocation never recomputes
/// digests; they are only parsed so that references holding one can be
/// validated and re-spelled.
#[derive(Clone)]
pub struct ContentDigest {
    serialized: String,
    format_pos: Range<usize>,
    hex_pos: Range<usize>,
}

impl ContentDigest {
    /// `format:hex`, with exactly one colon
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    /// ```
    /// # use relocator::image::ContentDigest;
    /// let pinned = ContentDigest::parse("sha256:0123456789abcdef0123456789abcdef").unwrap();
    /// assert_eq!(pinned.format_str(), "sha256");
    /// assert_eq!(pinned.hex_str().len(), 32);
    /// ```
    pub fn parse(s: &str) -> Result<Self, ImageError> {
        lazy_static! {
            static ref RE: Regex =
                Regex::new(&format!("^{}$", ContentDigest::regex_str())).unwrap();
        }
        match RE.captures(s) {
            None => Err(ImageError::InvalidReferenceFormat(s.to_owned())),
            Some(captures) => Ok(ContentDigest {
                serialized: s.to_owned(),
                format_pos: captures.name("dig_f").unwrap().range(),
                hex_pos: captures.name("dig_h").unwrap().range(),
            }),
        }
    }

    /// The hash algorithm portion, usually `sha256`
    pub fn format_str(&self) -> &str {
        &self.serialized[self.format_pos.clone()]
    }

    /// The hexadecimal portion, at least 32 digits
    pub fn hex_str(&self) -> &str {
        &self.serialized[self.hex_pos.clone()]
    }

    pub(crate) fn regex_str() -> &'static str {
        concat!(
            "(?P<dig>",
            /*  */ "(?P<dig_f>", // algorithm
            /* -- */ "[a-zA-Z][a-zA-Z0-9]*",
            /* -- */ "(?:[-_+.][a-zA-Z][a-zA-Z0-9]*)*", // separated format components
            /*  */ ")",
            /*  */ "[:]",
            /*  */ "(?P<dig_h>[a-fA-F0-9]{32,})",
            ")",
        )
    }
}

impl Eq for ContentDigest {}

impl PartialEq for ContentDigest {
    fn eq(&self, other: &Self) -> bool {
        self.serialized == other.serialized
    }
}

impl std::hash::Hash for ContentDigest {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.serialized.hash(state);
    }
}

impl FromStr for ContentDigest {
    type Err = ImageError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentDigest::parse(s)
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentDigest({})", self)
    }
}
