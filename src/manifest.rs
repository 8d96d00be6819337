//! The versioned list of resource files that make up a bundle

use crate::{
    errors::{ManifestError, ResourceError},
    resource::{Location, ResourceClient},
    storage,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// The only manifest format version understood here
pub const MANIFEST_VERSION: &str = "0.1";

const KIND: &str = "manifest";

#[derive(Serialize, Deserialize)]
struct RawManifest {
    #[serde(rename = "manifestVersion", default)]
    manifest_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    istio: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    knative: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    namespace: Option<Vec<String>>,
}

/// The install phase a resource file belongs to
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResourceGroup {
    Istio,
    Knative,
    Namespace,
}

impl ResourceGroup {
    /// Every group, in install order
    pub const ALL: [ResourceGroup; 3] = [ResourceGroup::Istio, ResourceGroup::Knative, ResourceGroup::Namespace];

    /// Key of this group in a manifest file
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceGroup::Istio => "istio",
            ResourceGroup::Knative => "knative",
            ResourceGroup::Namespace => "namespace",
        }
    }
}

/// Lists of resource files grouped by install phase
///
/// Each entry is a relative path or an http(s) URL. Relative entries are
/// resolved against the location the manifest was loaded from. Two
/// manifests are equal when their resource lists are, wherever they came
/// from.
#[derive(Clone, Debug)]
pub struct Manifest {
    pub istio: Vec<String>,
    pub knative: Vec<String>,
    pub namespace: Vec<String>,
    source: Option<Location>,
}

impl PartialEq for Manifest {
    fn eq(&self, other: &Self) -> bool {
        self.istio == other.istio && self.knative == other.knative && self.namespace == other.namespace
    }
}

impl Eq for Manifest {}

impl Manifest {
    /// Build a manifest in memory
    ///
    /// It has no source location, so relative entries can be checked but
    /// not resolved.
    pub fn new(istio: Vec<String>, knative: Vec<String>, namespace: Vec<String>) -> Result<Self, ManifestError> {
        let manifest = Manifest {
            istio,
            knative,
            namespace,
            source: None,
        };
        manifest.check_resources()?;
        Ok(manifest)
    }

    /// Read and validate a manifest from a local file or a URL
    pub fn load(client: &ResourceClient, location: &Location) -> Result<Self, ManifestError> {
        log::debug!("loading manifest from {}", location);
        let data = client
            .fetch(location)
            .map_err(|source| ManifestError::Read { kind: KIND, source })?;
        let mut manifest = Manifest::from_slice(&data, &location.to_string())?;
        manifest.source = Some(location.clone());
        Ok(manifest)
    }

    fn from_slice(data: &[u8], location: &str) -> Result<Self, ManifestError> {
        let raw: RawManifest =
            serde_yaml::from_slice(data).map_err(|source| ManifestError::Parse { kind: KIND, source })?;
        if raw.manifest_version != MANIFEST_VERSION {
            return Err(ManifestError::UnsupportedVersion {
                kind: KIND,
                version: raw.manifest_version,
            });
        }
        let incomplete = |group: ResourceGroup| ManifestError::Incomplete {
            kind: KIND,
            missing: match group {
                ResourceGroup::Istio => "istio array",
                ResourceGroup::Knative => "knative array",
                ResourceGroup::Namespace => "namespace array",
            },
            location: location.to_owned(),
        };
        let istio = raw.istio.ok_or_else(|| incomplete(ResourceGroup::Istio))?;
        let knative = raw.knative.ok_or_else(|| incomplete(ResourceGroup::Knative))?;
        let namespace = raw.namespace.ok_or_else(|| incomplete(ResourceGroup::Namespace))?;
        Manifest::new(istio, knative, namespace)
    }

    /// Where this manifest was loaded from, if anywhere
    pub fn source(&self) -> Option<&Location> {
        self.source.as_ref()
    }

    /// Entries of one group
    pub fn group(&self, group: ResourceGroup) -> &[String] {
        match group {
            ResourceGroup::Istio => &self.istio,
            ResourceGroup::Knative => &self.knative,
            ResourceGroup::Namespace => &self.namespace,
        }
    }

    /// Every entry of every group, in install order
    pub fn resources(&self) -> impl Iterator<Item = (ResourceGroup, &str)> + '_ {
        let groups: &'static [ResourceGroup] = &ResourceGroup::ALL;
        groups
            .iter()
            .flat_map(move |&group| self.group(group).iter().map(move |entry| (group, entry.as_str())))
    }

    /// Build a new manifest by passing each entry through `f`
    ///
    /// Groups are visited in install order, and the first error stops the
    /// visit. The result keeps this manifest's source.
    pub fn visit_resources<E, F>(&self, mut f: F) -> Result<Manifest, E>
    where
        F: FnMut(ResourceGroup, &str) -> Result<String, E>,
    {
        let mut visit = |group: ResourceGroup| -> Result<Vec<String>, E> {
            self.group(group).iter().map(|entry| f(group, entry)).collect()
        };
        Ok(Manifest {
            istio: visit(ResourceGroup::Istio)?,
            knative: visit(ResourceGroup::Knative)?,
            namespace: visit(ResourceGroup::Namespace)?,
            source: self.source.clone(),
        })
    }

    /// Find the resource named by a manifest entry
    ///
    /// URLs are returned as they are, and relative paths are resolved
    /// against the directory the manifest was loaded from.
    pub fn resolve_absolute_path(&self, entry: &str) -> Result<Location, ManifestError> {
        if let Ok(url) = Url::parse(entry) {
            if url.scheme() == "http" || url.scheme() == "https" {
                return Ok(Location::Url(url));
            }
        }
        match &self.source {
            Some(source) => source
                .sibling(entry)
                .map_err(|source| ManifestError::Read { kind: KIND, source }),
            None => Err(ManifestError::NoSourceDirectory),
        }
    }

    /// Write this manifest as YAML, replacing `path` atomically
    pub fn save(&self, path: &Path) -> Result<(), ManifestError> {
        let raw = RawManifest {
            manifest_version: MANIFEST_VERSION.to_owned(),
            istio: Some(self.istio.clone()),
            knative: Some(self.knative.clone()),
            namespace: Some(self.namespace.clone()),
        };
        let yaml = serde_yaml::to_string(&raw).map_err(|source| ManifestError::Serialize { kind: KIND, source })?;
        storage::write_atomic(path, yaml.as_bytes()).map_err(|source| ManifestError::Write { kind: KIND, source })?;
        log::info!("wrote manifest to {:?}", path);
        Ok(())
    }

    fn check_resources(&self) -> Result<(), ManifestError> {
        for (_, entry) in self.resources() {
            check_resource_entry(entry)?;
        }
        Ok(())
    }
}

fn check_resource_entry(entry: &str) -> Result<(), ManifestError> {
    match Url::parse(entry) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Ok(()),
        Ok(url) => Err(ManifestError::UnsupportedResourceScheme {
            scheme: url.scheme().to_owned(),
            resource: entry.to_owned(),
        }),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            if Path::new(entry).is_absolute() {
                Err(ManifestError::AbsoluteResourcePath(entry.to_owned()))
            } else {
                Ok(())
            }
        }
        Err(source) => Err(ManifestError::Read {
            kind: KIND,
            source: ResourceError::InvalidUrl {
                location: entry.to_owned(),
                source,
            },
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{fs, path::PathBuf};
    use tempfile::TempDir;

    fn load(dir: &TempDir, name: &str, content: &str) -> Result<Manifest, ManifestError> {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        Manifest::load(&ResourceClient::new().unwrap(), &Location::Path(path))
    }

    const VALID: &str = concat!(
        "manifestVersion: \"0.1\"\n",
        "istio:\n- istio-crds\n- istio-release\n",
        "knative:\n- serving-release\n- eventing-release\n- stub-bus-release\n",
        "namespace:\n- buildtemplate-release\n",
    );

    #[test]
    fn load_errors() {
        let dir = TempDir::new().unwrap();
        let err = Manifest::load(
            &ResourceClient::new().unwrap(),
            &Location::Path(dir.path().join("absent.yaml")),
        )
        .unwrap_err();
        assert!(err.to_string().starts_with("error reading manifest file: "));

        let err = load(&dir, "invalid.yaml", "istio: [\n").unwrap_err();
        assert!(err.to_string().starts_with("error parsing manifest file: "));

        let err = load(&dir, "wrongversion.yaml", "manifestVersion: \"0.0\"\n").unwrap_err();
        assert_eq!(err.to_string(), "manifest has unsupported version: 0.0");

        let err = load(&dir, "noistio.yaml", "manifestVersion: \"0.1\"\nknative: []\nnamespace: []\n").unwrap_err();
        assert!(err.to_string().starts_with("manifest is incomplete: istio array missing: "));

        let err = load(&dir, "noknative.yaml", "manifestVersion: \"0.1\"\nistio: []\nnamespace: []\n").unwrap_err();
        assert!(err.to_string().contains("knative array missing"));

        let err = load(&dir, "nonamespace.yaml", "manifestVersion: \"0.1\"\nistio: []\nknative: []\n").unwrap_err();
        assert!(err.to_string().starts_with("manifest is incomplete: namespace array missing: "));
    }

    #[test]
    fn load_valid() {
        let dir = TempDir::new().unwrap();
        let manifest = load(&dir, "valid.yaml", VALID).unwrap();
        assert_eq!(manifest.istio, vec!["istio-crds", "istio-release"]);
        assert_eq!(manifest.knative, vec!["serving-release", "eventing-release", "stub-bus-release"]);
        assert_eq!(manifest.namespace, vec!["buildtemplate-release"]);
        let order: Vec<&str> = manifest.resources().map(|(_, entry)| entry).collect();
        assert_eq!(order[0], "istio-crds");
        assert_eq!(order[5], "buildtemplate-release");
    }

    #[test]
    fn empty_groups_are_allowed() {
        let dir = TempDir::new().unwrap();
        let manifest = load(&dir, "empty.yaml", "manifestVersion: \"0.1\"\nistio: []\nknative: []\nnamespace: []\n").unwrap();
        assert_eq!(manifest.resources().count(), 0);
    }

    #[test]
    fn unquoted_version_is_accepted() {
        let dir = TempDir::new().unwrap();
        let manifest = load(&dir, "unquoted.yaml", "manifestVersion: 0.1\nistio: [a.yaml]\nknative: []\nnamespace: []\n").unwrap();
        assert_eq!(manifest.istio, vec!["a.yaml"]);
    }

    #[test]
    fn entries_must_be_relative_or_http() {
        let err = Manifest::new(vec!["/abs/istio.yaml".into()], vec![], vec![]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "resources must use a http or https URL or a relative path: absolute path not supported: /abs/istio.yaml"
        );
        let err = Manifest::new(vec![], vec!["file:///abs/k.yaml".into()], vec![]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "resources must use a http or https URL or a relative path: scheme file not supported: file:///abs/k.yaml"
        );
        assert!(Manifest::new(
            vec!["https://example.com/istio.yaml".into()],
            vec!["http://example.com/k.yaml".into()],
            vec!["ns/release.yaml".into()],
        )
        .is_ok());
    }

    #[test]
    fn resolve_paths() {
        let dir = TempDir::new().unwrap();
        let manifest = load(&dir, "valid.yaml", VALID).unwrap();
        assert_eq!(
            manifest.resolve_absolute_path("istio/crds.yaml").unwrap(),
            Location::Path(dir.path().join("istio/crds.yaml"))
        );
        assert_eq!(
            manifest.resolve_absolute_path("https://example.com/a.yaml").unwrap().to_string(),
            "https://example.com/a.yaml"
        );

        let memory = Manifest::new(vec![], vec![], vec![]).unwrap();
        let err = memory.resolve_absolute_path("a.yaml").unwrap_err();
        assert_eq!(
            err.to_string(),
            "relative path undefined since manifest was not read from a directory"
        );
        assert!(memory.resolve_absolute_path("http://example.com/a.yaml").is_ok());
    }

    #[test]
    fn resolve_against_url_source() {
        let mut manifest = Manifest::new(vec!["istio.yaml".into()], vec![], vec![]).unwrap();
        manifest.source = Some(Location::parse("https://example.com/bundle/manifest.yaml").unwrap());
        assert_eq!(
            manifest.resolve_absolute_path("istio.yaml").unwrap().to_string(),
            "https://example.com/bundle/istio.yaml"
        );
    }

    #[test]
    fn visit_rewrites_entries() {
        let manifest = Manifest::new(vec!["a/x.yaml".into()], vec!["b/y.yaml".into()], vec![]).unwrap();
        let visited = manifest
            .visit_resources(|group, entry| -> Result<String, ()> {
                Ok(format!("{}-{}", group.as_str(), PathBuf::from(entry).file_name().unwrap().to_string_lossy()))
            })
            .unwrap();
        assert_eq!(visited.istio, vec!["istio-x.yaml"]);
        assert_eq!(visited.knative, vec!["knative-y.yaml"]);

        let failed: Result<Manifest, &str> = manifest.visit_resources(|_, _| Err("stop"));
        assert_eq!(failed.unwrap_err(), "stop");
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let manifest = Manifest::new(
            vec!["istio.yaml".into()],
            vec!["https://example.com/serving.yaml".into()],
            vec![],
        )
        .unwrap();
        let path = dir.path().join("manifest.yaml");
        manifest.save(&path).unwrap();
        let loaded = Manifest::load(&ResourceClient::new().unwrap(), &Location::Path(path)).unwrap();
        assert_eq!(loaded, manifest);
    }
}
