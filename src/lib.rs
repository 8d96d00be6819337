//! Relocate a bundle of Kubernetes resource files to another image registry
//!
//! A bundle is a [manifest::Manifest] listing resource files, plus an
//! [image_manifest::ImageManifest] listing the images those files use.
//! Relocation rewrites every image reference to point at a new registry and
//! user, flattening long image paths into unique names, and writes a
//! self-contained copy of the bundle.
//!
//! ```no_run
//! use relocator::{relocate, ResourceClient};
//!
//! let client = ResourceClient::new()?;
//! relocate::relocate_images(
//!     &client,
//!     &relocate::RelocateOptions {
//!         registry: "registry.example.com".into(),
//!         registry_user: "ops".into(),
//!         images: "bundle/image-manifest.yaml".into(),
//!         target: relocate::Target::Manifest(relocator::Location::parse("bundle/manifest.yaml")?),
//!         output: "relocated".into(),
//!     },
//! )?;
//! # Ok::<(), relocator::errors::RelocationError>(())
//! ```

#[cfg(not(unix))]
compile_error!("relocator only works on unix-like systems");

#[macro_use] extern crate lazy_static;

pub mod errors;
pub mod image;
pub mod image_manifest;
pub mod manifest;
pub mod mapper;
pub mod naming;
pub mod pathmap;
pub mod relocate;
pub mod resource;
pub mod scan;

mod storage;

pub use crate::{
    image::ImageName,
    image_manifest::ImageManifest,
    manifest::Manifest,
    mapper::ImageMapper,
    resource::{Location, ResourceClient},
};
