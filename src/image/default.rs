//! Spelling rules for the registry used when an image names no host

use crate::image::{ImageName, Registry, Repository};

/// Settings describing the default registry and its aliases
///
/// Docker treats `busybox`, `library/busybox`, `docker.io/library/busybox`
/// and `index.docker.io/library/busybox` as the same image. These settings
/// capture those equivalences so names can be normalized, and so every
/// spelling of an image can be recognized in text.
#[derive(Clone, Debug)]
pub struct DefaultRegistry {
    /// Canonical name of the default registry
    pub canonical_name: Registry,
    /// This registry is also known under additional names
    pub also_known_as: Vec<Registry>,
    /// Use this prefix for an image repository with only a single path
    /// segment
    pub library_prefix: Option<Repository>,
}

impl From<Registry> for DefaultRegistry {
    fn from(canonical_name: Registry) -> Self {
        DefaultRegistry {
            canonical_name,
            also_known_as: vec![],
            library_prefix: None,
        }
    }
}

impl Default for DefaultRegistry {
    fn default() -> Self {
        DefaultRegistry::new()
    }
}

impl DefaultRegistry {
    /// Return the built-in Docker Hub defaults
    pub fn new() -> Self {
        DefaultRegistry {
            canonical_name: "docker.io".parse().unwrap(),
            also_known_as: vec!["index.docker.io".parse().unwrap()],
            library_prefix: Some("library".parse().unwrap()),
        }
    }

    /// Check whether a particular registry is considered default under these
    /// settings
    ///
    /// Returns true if the given registry is None or if it matches either the
    /// `canonical_name` or any of the `also_known_as` settings here.
    pub fn is_default(&self, registry: Option<&Registry>) -> bool {
        match registry {
            None => true,
            Some(registry) => {
                registry == &self.canonical_name || self.also_known_as.contains(registry)
            }
        }
    }

    /// Determine the canonical registry and complete repository path for an
    /// image
    pub fn resolve(&self, image: &ImageName) -> (Registry, Repository) {
        if let Some(registry) = image.registry() {
            if !self.is_default(Some(&registry)) {
                return (registry, image.repository());
            }
        }

        let image_repo = image.repository();
        let complete_repo = match &self.library_prefix {
            Some(prefix) if image_repo.len() == 1 => prefix.join(&image_repo),
            _ => image_repo,
        };
        (self.canonical_name.clone(), complete_repo)
    }

    /// Spell an image with its canonical registry and complete repository
    /// path, keeping any tag and digest
    pub fn normalize(&self, image: &ImageName) -> ImageName {
        let (registry, repository) = self.resolve(image);
        ImageName::from_parts(
            Some(registry.as_str()),
            repository.as_str(),
            image.tag_str(),
            image.content_digest_str(),
        )
        .expect("canonical registry and repository always form a valid name")
    }

    /// Every spelling of an image which denotes the same image
    ///
    /// The normalized name always comes first. Images on the default registry
    /// also gain the host-elided spelling, the library-elided spelling when
    /// the path has the library prefix, and one spelling per registry alias.
    /// Spellings which would parse back differently are skipped.
    pub fn synonyms(&self, image: &ImageName) -> Vec<ImageName> {
        let normalized = self.normalize(image);
        let mut names = vec![normalized.clone()];
        if !self.is_default(normalized.registry().as_ref()) {
            return names;
        }

        let repository = normalized.repository();
        let tag = normalized.tag_str();
        let digest = normalized.content_digest_str();
        let mut candidates = vec![ImageName::from_parts(None, repository.as_str(), tag, digest)];
        if let (Some(prefix), Some((first, rest))) = (&self.library_prefix, repository.strip_first()) {
            if first == prefix.as_str() && rest.len() == 1 {
                candidates.push(ImageName::from_parts(None, rest.as_str(), tag, digest));
            }
        }
        for alias in &self.also_known_as {
            candidates.push(ImageName::from_parts(
                Some(alias.as_str()),
                repository.as_str(),
                tag,
                digest,
            ));
        }

        for candidate in candidates.into_iter().flatten() {
            if !names.contains(&candidate) {
                names.push(candidate);
            }
        }
        names
    }
}
