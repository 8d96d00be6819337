//! The versioned list of images in a bundle, with their content digests

use crate::{
    errors::{ManifestError, ResourceError},
    image::ImageName,
    mapper::ImageMapper,
    storage,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};

/// The only image manifest format version understood here
pub const IMAGE_MANIFEST_VERSION: &str = "0.1";

const KIND: &str = "image manifest";

#[derive(Serialize, Deserialize)]
struct RawImageManifest {
    #[serde(rename = "manifestVersion", default)]
    manifest_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    images: Option<BTreeMap<String, Option<String>>>,
}

/// Map from image reference to content digest
///
/// Names are stored in normalized form, so two spellings of one image share
/// an entry. An empty digest means the image has not been resolved yet.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ImageManifest {
    images: BTreeMap<ImageName, String>,
}

impl ImageManifest {
    /// An image manifest with no images
    pub fn empty() -> Self {
        ImageManifest::default()
    }

    /// Read and validate an image manifest file
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        log::debug!("loading image manifest from {:?}", path);
        let data = fs::read(path).map_err(|source| ManifestError::Read {
            kind: KIND,
            source: ResourceError::Io {
                path: path.display().to_string(),
                source,
            },
        })?;
        ImageManifest::from_slice(&data, &path.display().to_string())
    }

    fn from_slice(data: &[u8], location: &str) -> Result<Self, ManifestError> {
        let raw: RawImageManifest =
            serde_yaml::from_slice(data).map_err(|source| ManifestError::Parse { kind: KIND, source })?;
        if raw.manifest_version != IMAGE_MANIFEST_VERSION {
            return Err(ManifestError::UnsupportedVersion {
                kind: KIND,
                version: raw.manifest_version,
            });
        }
        let raw_images = raw.images.ok_or_else(|| ManifestError::Incomplete {
            kind: KIND,
            missing: "images map is",
            location: location.to_owned(),
        })?;

        let mut manifest = ImageManifest::empty();
        for (name, digest) in raw_images {
            manifest.add_image(&name, &digest.unwrap_or_default())?;
        }
        Ok(manifest)
    }

    /// Write this image manifest as YAML, replacing `path` atomically
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let raw = RawImageManifest {
            manifest_version: IMAGE_MANIFEST_VERSION.to_owned(),
            images: Some(
                self.images
                    .iter()
                    .map(|(name, digest)| (name.to_string(), Some(digest.clone())))
                    .collect(),
            ),
        };
        let yaml = serde_yaml::to_string(&raw).map_err(|source| ManifestError::Serialize { kind: KIND, source })?;
        storage::write_atomic(path, yaml.as_bytes()).map_err(|source| ManifestError::Write { kind: KIND, source })?;
        log::info!("wrote image manifest with {} images to {:?}", self.images.len(), path);
        Ok(())
    }

    /// Insert or replace an image and its digest
    pub fn add_image(&mut self, name: &str, digest: &str) -> Result<(), ManifestError> {
        let name = ImageName::parse(name)?.normalize();
        self.images.insert(name, digest.to_owned());
        Ok(())
    }

    /// Remove an image, returning its digest if it was present
    pub fn remove_image(&mut self, name: &str) -> Result<Option<String>, ManifestError> {
        let name = ImageName::parse(name)?.normalize();
        Ok(self.images.remove(&name))
    }

    pub fn images(&self) -> &BTreeMap<ImageName, String> {
        &self.images
    }

    /// Names of every image, in sorted order
    pub fn image_names(&self) -> Vec<ImageName> {
        self.images.keys().cloned().collect()
    }

    /// Digest of an image, which is empty if unresolved
    pub fn digest(&self, name: &ImageName) -> Option<&str> {
        self.images.get(&name.normalize()).map(String::as_str)
    }

    /// A copy of this image manifest with every name rewritten by `mapper`
    ///
    /// Names the mapper has no rule for are kept. Digests carry over.
    pub fn relocate(&self, mapper: &ImageMapper) -> Result<ImageManifest, ManifestError> {
        let mut relocated = ImageManifest::empty();
        for (name, digest) in &self.images {
            let mapped = mapper.mapped_name(name).unwrap_or(name);
            log::trace!("image manifest entry {} relocated to {}", name, mapped);
            relocated.add_image(mapped.as_str(), digest)?;
        }
        Ok(relocated)
    }
}
