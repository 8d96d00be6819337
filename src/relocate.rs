//! Relocating single resource files and whole bundles

use crate::{
    errors::RelocationError,
    image_manifest::ImageManifest,
    manifest::Manifest,
    mapper::ImageMapper,
    naming::{select_naming, OutputNaming, MANIFEST_INPUT},
    resource::{Location, ResourceClient},
    scan::IMAGE_MANIFEST_FILE_NAME,
    storage::{self, storage_error},
};
use std::path::{Path, PathBuf};

/// Directory of image archives kept next to an image manifest
pub const IMAGES_DIR_NAME: &str = "images";

/// What a relocation run rewrites
#[derive(Clone, Debug)]
pub enum Target {
    /// One resource file, written to the output file or into the output
    /// directory
    File(Location),
    /// A manifest and every resource it lists, written into the output
    /// directory
    Manifest(Location),
}

/// Settings for one relocation run
#[derive(Clone, Debug)]
pub struct RelocateOptions {
    /// Host, and optional port, of the registry images are relocated to
    pub registry: String,
    /// User or organization on that registry
    pub registry_user: String,
    /// Image manifest listing the images to relocate
    pub images: PathBuf,
    pub target: Target,
    pub output: PathBuf,
}

/// Relocate every image listed in the image manifest, within the target
pub fn relocate_images(client: &ResourceClient, options: &RelocateOptions) -> Result<(), RelocationError> {
    let image_manifest = ImageManifest::load(&options.images)?;
    let mapper = ImageMapper::new(
        &options.registry,
        &options.registry_user,
        &image_manifest.image_names(),
        true,
    )?;
    match &options.target {
        Target::File(location) => {
            relocate_single_file(client, location, &mapper, &options.output)?;
            Ok(())
        }
        Target::Manifest(location) => {
            relocate_manifest(client, location, &mapper, Some(&options.images), &options.output)
        }
    }
}

/// Rewrite the images in one resource file
///
/// The result goes to `output`, or into it under the resource's base name if
/// `output` is an existing directory. Returns the path written.
pub fn relocate_single_file(
    client: &ResourceClient,
    location: &Location,
    mapper: &ImageMapper,
    output: &Path,
) -> Result<PathBuf, RelocationError> {
    let dest = if output.is_dir() {
        output.join(OutputNaming::Basename.flatten(&location.to_string()))
    } else {
        output.to_path_buf()
    };
    if let Some(source) = location.as_path() {
        if storage::same_path(source, &dest) {
            return Err(RelocationError::OutputIsInput(dest.display().to_string()));
        }
    }
    let data = client.fetch(location)?;
    storage::write_atomic(&dest, &mapper.map_images(&data)).map_err(|source| storage_error(&dest, source))?;
    log::info!("relocated {} to {:?}", location, dest);
    Ok(dest)
}

/// Rewrite a manifest and all its resources into the directory `output`
///
/// Resource output names come from the first naming strategy free of
/// collisions, and the written manifest lists those names. With an image
/// manifest, its relocated form and any image archives beside it are
/// written too. A failure part way leaves whatever was already written.
///
/// `output` must not be the directory of a local manifest or image manifest,
/// since the inputs would be overwritten while they are being read.
pub fn relocate_manifest(
    client: &ResourceClient,
    manifest_location: &Location,
    mapper: &ImageMapper,
    image_manifest: Option<&Path>,
    output: &Path,
) -> Result<(), RelocationError> {
    let inputs = manifest_location.as_path().into_iter().chain(image_manifest);
    for input in inputs {
        if storage::same_path(storage::parent_dir(input), output) {
            return Err(RelocationError::OutputIsInput(output.display().to_string()));
        }
    }
    storage::ensure_directory(output)?;

    let manifest = Manifest::load(client, manifest_location)?;
    let naming = select_naming(&manifest).ok_or(RelocationError::OutputCollision)?;

    let relocated = manifest.visit_resources(|group, entry| -> Result<String, RelocationError> {
        let location = manifest.resolve_absolute_path(entry)?;
        let name = naming.flatten(entry);
        let dest = output.join(&name);
        let data = client.fetch(&location)?;
        storage::write_atomic(&dest, &mapper.map_images(&data)).map_err(|source| storage_error(&dest, source))?;
        log::info!("relocated {} resource {} to {:?}", group.as_str(), location, dest);
        Ok(name)
    })?;
    relocated.save(&output.join(naming.flatten(MANIFEST_INPUT)))?;

    if let Some(image_manifest_path) = image_manifest {
        let image_manifest = ImageManifest::load(image_manifest_path)?;
        image_manifest
            .relocate(mapper)?
            .save(&output.join(IMAGE_MANIFEST_FILE_NAME))?;

        let images_dir = storage::parent_dir(image_manifest_path).join(IMAGES_DIR_NAME);
        storage::copy_dir(&images_dir, &output.join(IMAGES_DIR_NAME))?;
    }
    Ok(())
}

/// Make a local, self-contained copy of a possibly remote manifest
///
/// Images are left as they are.
pub fn download_system(
    client: &ResourceClient,
    manifest_location: &Location,
    output: &Path,
) -> Result<(), RelocationError> {
    relocate_manifest(client, manifest_location, &ImageMapper::identity(), None, output)
}
