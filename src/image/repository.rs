use crate::errors::ImageError;
use regex::Regex;
use std::{fmt, str::FromStr};

/// Path of a Docker-style image repository, without its registry host
///
/// Repository names are path-like groupings of lowercase alphanumeric segments
/// separated by slashes. Each segment may also contain internal separator
/// characters: single periods, single underscores, double underscores, or any
/// number of dashes.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Repository {
    serialized: String,
}

/// Iterator over the slash-separated segments of a [Repository] path
pub struct RepositoryIter<'a> {
    remaining: Option<&'a str>,
}

impl<'a> Iterator for RepositoryIter<'a> {
    type Item = &'a str;
    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.remaining.take()?;
        let mut parts = remaining.splitn(2, '/');
        let first = parts.next();
        self.remaining = parts.next();
        first
    }
}

impl Repository {
    /// Full path, segments joined by `/`
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    /// ```
    /// # use relocator::image::Repository;
    /// let repo = Repository::parse("knative-releases/github.com/knative/build").unwrap();
    /// assert_eq!(repo.len(), 4);
    /// assert_eq!(repo.iter().last(), Some("build"));
    /// ```
    pub fn parse(s: &str) -> Result<Self, ImageError> {
        lazy_static! {
            static ref RE: Regex = Regex::new(&format!("^{}$", Repository::regex_str())).unwrap();
        }
        if RE.is_match(s) {
            Ok(Repository {
                serialized: s.to_owned(),
            })
        } else {
            Err(ImageError::InvalidReferenceFormat(s.to_owned()))
        }
    }

    /// Produce an iterator over the slash-separated segments of this path
    pub fn iter(&self) -> RepositoryIter<'_> {
        RepositoryIter {
            remaining: Some(&self.serialized),
        }
    }

    /// Number of slash-separated segments
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// `self/other` as one repository path
    pub fn join(&self, other: &Self) -> Self {
        Repository {
            serialized: format!("{}/{}", self.serialized, other.serialized),
        }
    }

    /// Split off the first segment, if there is more than one
    pub fn strip_first(&self) -> Option<(&str, Repository)> {
        let mut parts = self.serialized.splitn(2, '/');
        let first = parts.next()?;
        let rest = parts.next()?;
        Some((
            first,
            Repository {
                serialized: rest.to_owned(),
            },
        ))
    }

    pub(crate) fn regex_str() -> &'static str {
        concat!(
            "(?P<repo>",
            /*  */ "(?:", // First path segment
            /* -- */ "[a-z0-9]+",
            /* -- */ "(?:(?:[._]|__|[-]*)[a-z0-9]+)*", // separated alphanumeric runs
            /*  */ ")",
            /*  */ "(?:", // Optional additional path segments
            /* -- */ "/",
            /* -- */ "[a-z0-9]+",
            /* -- */ "(?:(?:[._]|__|[-]*)[a-z0-9]+)*",
            /*  */ ")*",
            ")"
        )
    }
}

impl FromStr for Repository {
    type Err = ImageError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Repository::parse(s)
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Repository({})", self)
    }
}
