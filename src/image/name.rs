use crate::{
    errors::ImageError,
    image::{ContentDigest, DefaultRegistry, Registry, Repository, Tag},
};
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    ops::Range,
    str::FromStr,
};

lazy_static! {
    static ref DEFAULT_REGISTRY: DefaultRegistry = DefaultRegistry::new();
}

/// An image reference as it appears in a resource file
///
/// The reference is kept as one owned string plus the byte ranges of each
/// component: an optional [Registry], the [Repository], an optional [Tag]
/// after `:` and an optional [ContentDigest] after `@`.
///
/// Whether the first path segment names a registry is decided the way Docker
/// decides it: a segment containing a dot or a port, or the literal
/// `localhost`, is a host. Anything else belongs to the repository.
///
/// Equality and ordering compare the exact spelling. Use [ImageName::normalize]
/// or [ImageName::synonyms] to compare spellings of the same image.
#[derive(Clone)]
pub struct ImageName {
    serialized: String,
    registry_pos: Option<Range<usize>>,
    repository_pos: Range<usize>,
    tag_pos: Option<Range<usize>>,
    digest_pos: Option<Range<usize>>,
}

impl ImageName {
    /// The reference exactly as it was spelled
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    /// Join components into a reference
    ///
    /// Fails when a component is malformed, and also when the joined string
    /// would not split back into the same components, e.g. a `registry` of
    /// `None` with a `repository` whose first segment looks like a host.
    pub fn from_parts(
        registry: Option<&str>,
        repository: &str,
        tag: Option<&str>,
        digest: Option<&str>,
    ) -> Result<Self, ImageError> {
        let mut combined = String::new();
        if let Some(registry) = registry {
            combined.push_str(registry);
            combined.push('/');
        }
        combined.push_str(repository);
        if let Some(tag) = tag {
            combined.push(':');
            combined.push_str(tag);
        }
        if let Some(digest) = digest {
            combined.push('@');
            combined.push_str(digest);
        }
        let parsed = ImageName::parse(&combined)?;
        if parsed.as_parts() == (registry, repository, tag, digest) {
            Ok(parsed)
        } else {
            // would reparse differently
            Err(ImageError::InvalidReferenceFormat(combined))
        }
    }

    /// Registry, repository, tag and digest as borrowed slices
    pub fn as_parts(&self) -> (Option<&str>, &str, Option<&str>, Option<&str>) {
        (
            self.registry_str(),
            self.repository_str(),
            self.tag_str(),
            self.content_digest_str(),
        )
    }

    pub fn parse(s: &str) -> Result<Self, ImageError> {
        lazy_static! {
            // First segment is a host: dotted name with optional port,
            // bare name with a port, or localhost.
            static ref HAS_REGISTRY: Regex = Regex::new(&format!(
                "^(?:{label}(?:\\.{label})+(?::[0-9]+)?|{label}:[0-9]+|localhost(?::[0-9]+)?)/",
                label = "(?:[a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9])"
            ))
            .unwrap();
            static ref WITH_REGISTRY: Regex = Regex::new(&format!(
                "^{}/{}(:{})?(@{})?$",
                Registry::regex_str(),
                Repository::regex_str(),
                Tag::regex_str(),
                ContentDigest::regex_str()
            ))
            .unwrap();
            static ref NO_REGISTRY: Regex = Regex::new(&format!(
                "^{}(:{})?(@{})?$",
                Repository::regex_str(),
                Tag::regex_str(),
                ContentDigest::regex_str()
            ))
            .unwrap();
        }
        let pattern: &Regex = if HAS_REGISTRY.is_match(s) {
            &*WITH_REGISTRY
        } else {
            &*NO_REGISTRY
        };
        let captures = pattern
            .captures(s)
            .ok_or_else(|| ImageError::InvalidReferenceFormat(s.to_owned()))?;
        // The grammar allows any digits after the colon, but a port is a u16
        if let Some(registry) = captures.name("reg") {
            Registry::parse(registry.as_str()).map_err(|_| ImageError::InvalidReferenceFormat(s.to_owned()))?;
        }
        Ok(ImageName {
            serialized: s.to_owned(),
            registry_pos: captures.name("reg").map(|m| m.range()),
            repository_pos: captures.name("repo").unwrap().range(),
            tag_pos: captures.name("tag").map(|m| m.range()),
            digest_pos: captures.name("dig").map(|m| m.range()),
        })
    }

    /// Registry host as spelled, if any
    pub fn registry_str(&self) -> Option<&str> {
        self.registry_pos
            .as_ref()
            .map(|pos| &self.serialized[pos.clone()])
    }

    /// Repository path as spelled
    pub fn repository_str(&self) -> &str {
        &self.serialized[self.repository_pos.clone()]
    }

    /// Tag without the leading `:`
    pub fn tag_str(&self) -> Option<&str> {
        self.tag_pos
            .as_ref()
            .map(|pos| &self.serialized[pos.clone()])
    }

    /// Digest without the leading `@`
    pub fn content_digest_str(&self) -> Option<&str> {
        self.digest_pos
            .as_ref()
            .map(|pos| &self.serialized[pos.clone()])
    }

    pub fn registry(&self) -> Option<Registry> {
        self.registry_str()
            .map(|s| Registry::parse(s).expect("already parsed"))
    }

    pub fn repository(&self) -> Repository {
        Repository::parse(self.repository_str()).expect("already parsed")
    }

    pub fn tag(&self) -> Option<Tag> {
        self.tag_str()
            .map(|s| Tag::parse(s).expect("already parsed"))
    }

    pub fn content_digest(&self) -> Option<ContentDigest> {
        self.content_digest_str()
            .map(|s| ContentDigest::parse(s).expect("already parsed"))
    }

    /// The registry host this image lives on, after normalization
    ///
    /// ```
    /// # use relocator::ImageName;
    /// let image: ImageName = "istio/proxyv2:1.0.1".parse().unwrap();
    /// assert_eq!(image.host().as_str(), "docker.io");
    /// ```
    pub fn host(&self) -> Registry {
        DEFAULT_REGISTRY.resolve(self).0
    }

    /// The repository path below the host, after normalization
    ///
    /// ```
    /// # use relocator::ImageName;
    /// let image: ImageName = "busybox".parse().unwrap();
    /// assert_eq!(image.path().as_str(), "library/busybox");
    /// ```
    pub fn path(&self) -> Repository {
        DEFAULT_REGISTRY.resolve(self).1
    }

    /// Spell this image with an explicit canonical host and complete path
    pub fn normalize(&self) -> ImageName {
        DEFAULT_REGISTRY.normalize(self)
    }

    /// All the spellings which denote this same image, normalized name first
    pub fn synonyms(&self) -> Vec<ImageName> {
        DEFAULT_REGISTRY.synonyms(self)
    }

    /// A copy of this name with the tag replaced, keeping any digest
    pub fn with_tag(&self, tag: &Tag) -> ImageName {
        ImageName::from_parts(
            self.registry_str(),
            self.repository_str(),
            Some(tag.as_str()),
            self.content_digest_str(),
        )
        .expect("retagging a parsed name is unambiguous")
    }

    /// A copy of this name with no tag and no digest
    pub fn without_version(&self) -> ImageName {
        ImageName::from_parts(self.registry_str(), self.repository_str(), None, None)
            .expect("removing the version of a parsed name is unambiguous")
    }
}

impl Eq for ImageName {}

impl PartialEq for ImageName {
    fn eq(&self, other: &Self) -> bool {
        self.serialized == other.serialized
    }
}

impl FromStr for ImageName {
    type Err = ImageError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageName::parse(s)
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageName({})", self)
    }
}

impl Hash for ImageName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.serialized.hash(state);
    }
}

impl Ord for ImageName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.serialized.cmp(&other.serialized)
    }
}

impl PartialOrd for ImageName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Serialize for ImageName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ImageName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ImageName::parse(&s).map_err(de::Error::custom)
    }
}
