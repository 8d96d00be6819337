//! Choosing output file names for relocated resources

use crate::manifest::Manifest;
use md5::Md5;
use sha2::{Digest, Sha256};
use std::collections::HashMap;

/// Output name of the manifest itself, whatever it was called originally
pub const MANIFEST_FILE_NAME: &str = "manifest.yaml";

/// Stand-in input for the manifest when choosing its output name
pub const MANIFEST_INPUT: &str = "./manifest.yaml";

/// Ways to turn a resource path or URL into a file name in the output
/// directory
///
/// Strategies are tried in declaration order, from most to least readable.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OutputNaming {
    /// The final path segment
    Basename,
    /// The final path segment followed by the MD5 of the whole input
    Md5,
    /// The final path segment followed by the SHA-256 of the whole input
    Sha256,
}

impl OutputNaming {
    pub const ALL: [OutputNaming; 3] = [OutputNaming::Basename, OutputNaming::Md5, OutputNaming::Sha256];

    /// Output file name for `input`
    ///
    /// An input named `manifest.yaml` always keeps that name.
    ///
    /// ```
    /// # use relocator::naming::OutputNaming;
    /// assert_eq!(OutputNaming::Basename.flatten("https://example.com/a/istio.yaml"), "istio.yaml");
    /// assert_eq!(OutputNaming::Sha256.flatten("./manifest.yaml"), "manifest.yaml");
    /// ```
    pub fn flatten(&self, input: &str) -> String {
        let base = basename(input);
        if base == MANIFEST_FILE_NAME {
            return base.to_owned();
        }
        match self {
            OutputNaming::Basename => base.to_owned(),
            OutputNaming::Md5 => format!("{}-{:x}", base, Md5::digest(input.as_bytes())),
            OutputNaming::Sha256 => format!("{}-{:x}", base, Sha256::digest(input.as_bytes())),
        }
    }

    /// Does this strategy give every distinct input its own output name?
    pub fn is_collision_free(&self, manifest: &Manifest) -> bool {
        let mut unflattened: HashMap<String, &str> = HashMap::new();
        let inputs = manifest
            .resources()
            .map(|(_, entry)| entry)
            .chain(std::iter::once(MANIFEST_INPUT));
        for input in inputs {
            let output = self.flatten(input);
            if let Some(colliding) = unflattened.get(&output) {
                if *colliding != input {
                    log::warn!(
                        "collision between {} and {} using {:?} naming, trying another strategy",
                        colliding,
                        input,
                        self
                    );
                    return false;
                }
            }
            unflattened.insert(output, input);
        }
        true
    }
}

/// Pick the first naming strategy without collisions for this manifest
pub fn select_naming(manifest: &Manifest) -> Option<OutputNaming> {
    let naming = OutputNaming::ALL
        .iter()
        .copied()
        .find(|naming| naming.is_collision_free(manifest));
    if let Some(naming) = naming {
        log::debug!("using {:?} naming for output files", naming);
    }
    naming
}

fn basename(input: &str) -> &str {
    let trimmed = input.trim_end_matches('/');
    match trimmed.rsplit('/').next() {
        Some(base) if !base.is_empty() => base,
        _ => input,
    }
}
