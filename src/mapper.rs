//! Rewriting image references embedded in arbitrary text
//!
//! The mapper has no model of YAML or of the resources it rewrites. It only
//! replaces an image reference where it follows a double quote or a space,
//! which is how images appear in the resource files it was built for. This
//! keeps `http://x.x/y/z` and similar text safe, but a space-delimited image
//! which is a path prefix of an unregistered longer image is still rewritten
//! inside that longer image.

use crate::{
    errors::RelocationError,
    image::ImageName,
    pathmap::PathMapping,
};
use regex::bytes::{Captures, Regex, RegexBuilder};
use std::collections::HashMap;

/// Characters which would let a host or user escape its position in a name
const FORBIDDEN: &[&str] = &["/", "\"", " "];

/// Larger than the default, to accommodate a few thousand image synonyms
const MATCHER_SIZE_LIMIT: usize = 64 << 20;

/// An immutable set of image replacement rules
///
/// Build one per relocation run with [ImageMapper::new], then apply it to
/// any number of documents with [ImageMapper::map_images].
pub struct ImageMapper {
    matcher: Option<Regex>,
    replacements: HashMap<Vec<u8>, Vec<u8>>,
    names: HashMap<ImageName, ImageName>,
}

impl ImageMapper {
    /// Prepare rules relocating each image to the registry `host` below
    /// `user`
    ///
    /// Every synonym of each image gets a rule for its quoted spelling and
    /// one for its space-prefixed spelling. All rules are combined into a
    /// single leftmost-first matcher whose alternatives are in reverse
    /// lexical order, so a pattern that is a prefix of another pattern is
    /// tried only after the longer one.
    pub fn new(
        host: &str,
        user: &str,
        images: &[ImageName],
        flatten: bool,
    ) -> Result<ImageMapper, RelocationError> {
        if let Some(found) = forbidden_in(host) {
            return Err(RelocationError::InvalidRegistryHostname {
                value: host.to_owned(),
                found,
            });
        }
        if let Some(found) = forbidden_in(user) {
            return Err(RelocationError::InvalidUser {
                value: user.to_owned(),
                found,
            });
        }

        let path_mapping = if flatten {
            PathMapping::Flatten
        } else {
            PathMapping::Preserve
        };

        let mut names = HashMap::new();
        let mut replacements = HashMap::new();
        for image in images {
            let mapped = path_mapping.map(host, user, image)?;
            log::debug!("mapping {} to {}", image, mapped);
            names.insert(image.clone(), mapped.clone());
            for synonym in image.synonyms() {
                replacements
                    .entry(quoted(synonym.as_str()))
                    .or_insert_with(|| quoted(mapped.as_str()));
                replacements
                    .entry(space_prefixed(synonym.as_str()))
                    .or_insert_with(|| space_prefixed(mapped.as_str()));
                names.entry(synonym).or_insert_with(|| mapped.clone());
            }
        }

        let mut patterns: Vec<&Vec<u8>> = replacements.keys().collect();
        patterns.sort();
        patterns.reverse();
        let matcher = if patterns.is_empty() {
            None
        } else {
            let alternation: Vec<String> = patterns
                .iter()
                .map(|p| regex::escape(&String::from_utf8_lossy(p)))
                .collect();
            Some(
                RegexBuilder::new(&alternation.join("|"))
                    .size_limit(MATCHER_SIZE_LIMIT)
                    .build()?,
            )
        };
        log::info!("prepared {} image replacement rules", replacements.len());

        Ok(ImageMapper {
            matcher,
            replacements,
            names,
        })
    }

    /// A mapper with no rules, which leaves every input unchanged
    pub fn identity() -> ImageMapper {
        ImageMapper {
            matcher: None,
            replacements: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// Replace every registered image occurrence in `input`
    ///
    /// Input is scanned once from left to right; replaced text is never
    /// rescanned.
    pub fn map_images(&self, input: &[u8]) -> Vec<u8> {
        match &self.matcher {
            None => input.to_vec(),
            Some(matcher) => matcher
                .replace_all(input, |captures: &Captures<'_>| {
                    let found = &captures[0];
                    match self.replacements.get(found) {
                        Some(replacement) => replacement.clone(),
                        None => found.to_vec(),
                    }
                })
                .into_owned(),
        }
    }

    /// The relocated name for an image or any of its synonyms
    pub fn mapped_name(&self, image: &ImageName) -> Option<&ImageName> {
        self.names.get(image)
    }
}

fn forbidden_in(value: &str) -> Option<&'static str> {
    FORBIDDEN.iter().copied().find(|c| value.contains(c))
}

fn quoted(image: &str) -> Vec<u8> {
    format!("\"{}\"", image).into_bytes()
}

fn space_prefixed(image: &str) -> Vec<u8> {
    format!(" {}", image).into_bytes()
}
