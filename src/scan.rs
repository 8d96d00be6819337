//! Finding the images referenced by a bundle's resource files
//!
//! Resource files are not interpreted as Kubernetes objects. Instead each
//! YAML document is walked looking for the places where images customarily
//! appear: `image` values, keys such as `queueSidecarImage` or
//! `controller-image`, `--*-image` command line flags, configuration
//! embedded as a YAML string, templates, and image parameters.

use crate::{
    errors::RelocationError,
    image::ImageName,
    image_manifest::ImageManifest,
    manifest::Manifest,
    resource::{Location, ResourceClient},
};
use serde::Deserialize;
use serde_yaml::Value;
use std::path::{Path, PathBuf};

/// File name of an image manifest kept next to its manifest
pub const IMAGE_MANIFEST_FILE_NAME: &str = "image-manifest.yaml";

/// Collect every candidate image in a multi-document YAML resource file
///
/// Candidates are returned in the order they were found, possibly with
/// duplicates, and are not checked for validity.
pub fn list_images(data: &[u8]) -> Result<Vec<String>, serde_yaml::Error> {
    let mut images = vec![];
    for document in serde_yaml::Deserializer::from_slice(data) {
        let value = Value::deserialize(document)?;
        if !value.is_null() {
            visit_images(&value, &mut |image| images.push(image.to_owned()));
        }
    }
    Ok(images)
}

fn visit_images<F: FnMut(&str)>(value: &Value, visitor: &mut F) {
    match value {
        Value::Mapping(mapping) => {
            if let Some(image) = mapping.get("image").and_then(Value::as_str) {
                visitor(image);
            }

            if let Some(args) = mapping.get("args").and_then(Value::as_sequence) {
                for pair in args.windows(2) {
                    if let (Some(flag), Some(image)) = (pair[0].as_str(), pair[1].as_str()) {
                        if flag.starts_with('-') && flag.ends_with("-image") {
                            visitor(image);
                        }
                    }
                }
            }

            if let Some(config) = mapping.get("config").and_then(Value::as_str) {
                if let Ok(embedded) = serde_yaml::from_str::<Value>(config) {
                    visit_images(&embedded, visitor);
                }
            }

            // Templates may not be valid YAML as a whole, but their lines often are
            if let Some(template) = mapping.get("template").and_then(Value::as_str) {
                for line in template.lines() {
                    if let Ok(embedded) = serde_yaml::from_str::<Value>(line) {
                        visit_images(&embedded, visitor);
                    }
                }
            }

            if let Some(parameters) = mapping.get("parameters").and_then(Value::as_sequence) {
                for parameter in parameters {
                    let name = parameter.get("name").and_then(Value::as_str);
                    let default = parameter.get("default").and_then(Value::as_str);
                    if let (Some(name), Some(default)) = (name, default) {
                        if name.ends_with("IMAGE") {
                            visitor(default);
                        }
                    }
                }
            }

            for (key, val) in mapping {
                if let (Some(key), Some(image)) = (key.as_str(), val.as_str()) {
                    if key.ends_with("Image") || key.ends_with("-image") {
                        visitor(image);
                    }
                }
                visit_images(val, visitor);
            }
        }
        Value::Sequence(sequence) => {
            for item in sequence {
                visit_images(item, visitor);
            }
        }
        Value::Tagged(tagged) => visit_images(&tagged.value, visitor),
        _ => {}
    }
}

/// Where an image manifest for `manifest` is written by default
///
/// Only a manifest on the local filesystem has a directory to write into.
pub fn default_image_manifest_path(manifest: &Location) -> Option<PathBuf> {
    let path = manifest.as_path()?;
    Some(match path.parent() {
        Some(dir) => dir.join(IMAGE_MANIFEST_FILE_NAME),
        None => PathBuf::from(IMAGE_MANIFEST_FILE_NAME),
    })
}

/// Scan every resource of a manifest and write an image manifest listing
/// the images found, with empty digests
///
/// An existing image manifest at `output` is only replaced if `force` is
/// set. Candidates which are not valid image references are skipped.
pub fn list_manifest_images(
    client: &ResourceClient,
    manifest_location: &Location,
    output: &Path,
    force: bool,
) -> Result<ImageManifest, RelocationError> {
    let manifest = Manifest::load(client, manifest_location)?;
    if !force && output.exists() {
        return Err(RelocationError::ImageManifestExists);
    }

    let mut candidates = vec![];
    for (_, entry) in manifest.resources() {
        let location = manifest.resolve_absolute_path(entry)?;
        log::info!("scanning {}", location);
        let data = client.fetch(&location)?;
        let found = list_images(&data).map_err(|source| RelocationError::ResourceParse {
            resource: location.to_string(),
            source,
        })?;
        log::debug!("{} candidate images in {}", found.len(), location);
        candidates.extend(found);
    }

    let mut image_manifest = ImageManifest::empty();
    for candidate in candidates {
        match ImageName::parse(&candidate) {
            Err(err) => log::warn!("omitting {:?}, {}", candidate, err),
            Ok(image) => {
                if image_manifest.digest(&image).is_none() {
                    image_manifest.add_image(image.as_str(), "")?;
                }
            }
        }
    }
    image_manifest.save(output)?;
    Ok(image_manifest)
}
