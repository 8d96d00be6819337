use mockito::Server;
use relocator::{
    naming::OutputNaming,
    relocate::{download_system, relocate_images, relocate_manifest, RelocateOptions, Target},
    ImageManifest, ImageMapper, Location, Manifest, ResourceClient,
};
use std::{fs, path::Path};
use tempfile::TempDir;

const CREDS_INIT: &str = "gcr.io/knative-releases/github.com/knative/build/cmd/creds-init@sha256:deadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeefdeadbeef";
const CREDS_INIT_RELOCATED: &str =
    "testregistry.com/testuser/knative-releases-github.com-knative-build-cmd-creds-init-b692cdd35af41412d71a4bc138128dd6";
const INJECTOR_RELOCATED: &str =
    "testregistry.com/testuser/istio-sidecar_injector-6bad934e7f077e63cae18277203bb414";

fn write(dir: &Path, name: &str, content: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn bundle(istio: &str, knative: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "manifest.yaml",
        &format!(
            "manifestVersion: \"0.1\"\nistio: [{}]\nknative: [{}]\nnamespace: []\n",
            istio, knative
        ),
    );
    write(
        dir.path(),
        "image-manifest.yaml",
        &format!(
            "manifestVersion: \"0.1\"\nimages:\n  istio/sidecar_injector: \"sha256:0123\"\n  {}: \"\"\n",
            CREDS_INIT
        ),
    );
    dir
}

fn options(dir: &TempDir, target: Target, output: &Path) -> RelocateOptions {
    RelocateOptions {
        registry: "testregistry.com".into(),
        registry_user: "testuser".into(),
        images: dir.path().join("image-manifest.yaml"),
        target,
        output: output.to_path_buf(),
    }
}

#[test]
fn relocate_manifest_with_unique_names() {
    let dir = bundle("istio/istio.yaml", "knative/build.yaml");
    write(dir.path(), "istio/istio.yaml", "spec:\n  image: \"docker.io/istio/sidecar_injector\"\n");
    write(
        dir.path(),
        "knative/build.yaml",
        &format!("args: [\"-creds-image\", \"{}\"]\ninit:\n  image: {}\n", CREDS_INIT, CREDS_INIT),
    );
    write(dir.path(), "images/sha256/0123", "archive");

    let output = dir.path().join("out");
    let target = Target::Manifest(Location::Path(dir.path().join("manifest.yaml")));
    relocate_images(&ResourceClient::new().unwrap(), &options(&dir, target, &output)).unwrap();

    assert_eq!(
        fs::read_to_string(output.join("istio.yaml")).unwrap(),
        format!("spec:\n  image: \"{}\"\n", INJECTOR_RELOCATED)
    );
    assert_eq!(
        fs::read_to_string(output.join("build.yaml")).unwrap(),
        format!(
            "args: [\"-creds-image\", \"{}\"]\ninit:\n  image: {}\n",
            CREDS_INIT_RELOCATED, CREDS_INIT_RELOCATED
        )
    );

    let client = ResourceClient::new().unwrap();
    let relocated = Manifest::load(&client, &Location::Path(output.join("manifest.yaml"))).unwrap();
    assert_eq!(relocated.istio, vec!["istio.yaml"]);
    assert_eq!(relocated.knative, vec!["build.yaml"]);
    assert!(relocated.namespace.is_empty());

    let images = ImageManifest::load(&output.join("image-manifest.yaml")).unwrap();
    assert_eq!(images.digest(&INJECTOR_RELOCATED.parse().unwrap()), Some("sha256:0123"));
    assert_eq!(images.digest(&CREDS_INIT_RELOCATED.parse().unwrap()), Some(""));
    assert_eq!(fs::read_to_string(output.join("images/sha256/0123")).unwrap(), "archive");
}

#[test]
fn relocate_manifest_with_colliding_names() {
    let dir = bundle("istio/release.yaml", "knative/release.yaml");
    write(dir.path(), "istio/release.yaml", "image: istio/sidecar_injector\n");
    write(dir.path(), "knative/release.yaml", "kind: Namespace\n");

    let output = dir.path().join("out");
    let target = Target::Manifest(Location::Path(dir.path().join("manifest.yaml")));
    relocate_images(&ResourceClient::new().unwrap(), &options(&dir, target, &output)).unwrap();

    let istio_name = OutputNaming::Md5.flatten("istio/release.yaml");
    let knative_name = OutputNaming::Md5.flatten("knative/release.yaml");
    assert_ne!(istio_name, knative_name);
    assert_eq!(
        fs::read_to_string(output.join(&istio_name)).unwrap(),
        format!("image: {}\n", INJECTOR_RELOCATED)
    );
    assert_eq!(fs::read_to_string(output.join(&knative_name)).unwrap(), "kind: Namespace\n");

    let relocated = Manifest::load(
        &ResourceClient::new().unwrap(),
        &Location::Path(output.join("manifest.yaml")),
    )
    .unwrap();
    assert_eq!(relocated.istio, vec![istio_name]);
    assert_eq!(relocated.knative, vec![knative_name]);
    assert!(!output.join("images").exists());
}

#[test]
fn relocate_manifest_with_unresolvable_collision() {
    let dir = bundle("istio/manifest.yaml", "");
    let output = dir.path().join("out");
    let target = Target::Manifest(Location::Path(dir.path().join("manifest.yaml")));
    let err = relocate_images(&ResourceClient::new().unwrap(), &options(&dir, target, &output)).unwrap_err();
    assert_eq!(err.to_string(), "cannot relocate manifest due to collisions in output paths");
}

#[test]
fn relocate_into_a_file_fails() {
    let dir = bundle("istio.yaml", "");
    write(dir.path(), "out", "not a directory");
    let output = dir.path().join("out");
    let target = Target::Manifest(Location::Path(dir.path().join("manifest.yaml")));
    let err = relocate_images(&ResourceClient::new().unwrap(), &options(&dir, target, &output)).unwrap_err();
    assert_eq!(err.to_string(), format!("output directory is a file: {}", output.display()));
}

#[test]
fn relocate_into_the_bundle_directory_fails() {
    let dir = bundle("istio.yaml", "");
    write(dir.path(), "istio.yaml", "image: istio/sidecar_injector\n");
    write(dir.path(), "images/0123", "archive-bytes");
    let image_manifest = fs::read_to_string(dir.path().join("image-manifest.yaml")).unwrap();

    let output = dir.path().to_path_buf();
    let target = Target::Manifest(Location::Path(dir.path().join("manifest.yaml")));
    let err = relocate_images(&ResourceClient::new().unwrap(), &options(&dir, target, &output)).unwrap_err();
    assert_eq!(
        err.to_string(),
        format!("output would overwrite its own input: {}", output.display())
    );

    assert_eq!(fs::read_to_string(dir.path().join("images/0123")).unwrap(), "archive-bytes");
    assert_eq!(
        fs::read_to_string(dir.path().join("image-manifest.yaml")).unwrap(),
        image_manifest
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("istio.yaml")).unwrap(),
        "image: istio/sidecar_injector\n"
    );
}

#[test]
fn relocate_next_to_the_image_manifest_fails() {
    let dir = bundle("istio.yaml", "");
    write(dir.path(), "bundle/manifest.yaml", "manifestVersion: \"0.1\"\nistio: []\nknative: []\nnamespace: []\n");
    let output = dir.path().to_path_buf();
    let target = Target::Manifest(Location::Path(dir.path().join("bundle/manifest.yaml")));
    let err = relocate_images(&ResourceClient::new().unwrap(), &options(&dir, target, &output)).unwrap_err();
    assert!(err.to_string().starts_with("output would overwrite its own input: "));
}

#[test]
fn download_into_the_manifest_directory_fails() {
    let dir = bundle("istio.yaml", "");
    write(dir.path(), "istio.yaml", "kind: Namespace\n");
    let location = Location::Path(dir.path().join("manifest.yaml"));
    assert!(download_system(&ResourceClient::new().unwrap(), &location, dir.path()).is_err());
    assert_eq!(fs::read_to_string(dir.path().join("istio.yaml")).unwrap(), "kind: Namespace\n");
}

#[test]
fn relocate_file_onto_itself_fails() {
    let dir = bundle("", "");
    write(dir.path(), "sidecar.yaml", "image: istio/sidecar_injector\n");
    let target = Target::File(Location::Path(dir.path().join("sidecar.yaml")));
    let output = dir.path().join("sidecar.yaml");
    let err = relocate_images(&ResourceClient::new().unwrap(), &options(&dir, target, &output)).unwrap_err();
    assert!(err.to_string().starts_with("output would overwrite its own input: "));
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "image: istio/sidecar_injector\n"
    );
}

#[test]
fn relocate_single_file_into_directory() {
    let dir = bundle("", "");
    write(dir.path(), "deploy/sidecar.yaml", "image: istio/sidecar_injector\n");
    let output = dir.path().join("out");
    fs::create_dir(&output).unwrap();

    let target = Target::File(Location::Path(dir.path().join("deploy/sidecar.yaml")));
    relocate_images(&ResourceClient::new().unwrap(), &options(&dir, target, &output)).unwrap();
    assert_eq!(
        fs::read_to_string(output.join("sidecar.yaml")).unwrap(),
        format!("image: {}\n", INJECTOR_RELOCATED)
    );
}

#[test]
fn relocate_manifest_without_image_manifest() {
    let dir = bundle("istio.yaml", "");
    write(dir.path(), "istio.yaml", "image: x.x/y/z\n");
    let output = dir.path().join("out");
    let mapper = ImageMapper::new("r.r", "u", &["x.x/y/z".parse().unwrap()], true).unwrap();
    relocate_manifest(
        &ResourceClient::new().unwrap(),
        &Location::Path(dir.path().join("manifest.yaml")),
        &mapper,
        None,
        &output,
    )
    .unwrap();
    assert_eq!(
        fs::read_to_string(output.join("istio.yaml")).unwrap(),
        "image: r.r/u/y-z-622eedc03bbe568ed522e1e4903704b2\n"
    );
    assert!(!output.join("image-manifest.yaml").exists());
}

#[test]
fn download_remote_manifest() {
    let mut server = Server::new();
    let _manifest = server
        .mock("GET", "/bundle/manifest.yaml")
        .with_body("manifestVersion: \"0.1\"\nistio: [istio.yaml]\nknative: []\nnamespace: [ns/setup.yaml]\n")
        .create();
    let _istio = server
        .mock("GET", "/bundle/istio.yaml")
        .with_body("image: istio/sidecar_injector\n")
        .create();
    let _namespace = server
        .mock("GET", "/bundle/ns/setup.yaml")
        .with_body("kind: ServiceAccount\n")
        .create();

    let dir = TempDir::new().unwrap();
    let output = dir.path().join("system");
    let location = Location::parse(&format!("{}/bundle/manifest.yaml", server.url())).unwrap();
    download_system(&ResourceClient::new().unwrap(), &location, &output).unwrap();

    assert_eq!(
        fs::read_to_string(output.join("istio.yaml")).unwrap(),
        "image: istio/sidecar_injector\n"
    );
    assert_eq!(fs::read_to_string(output.join("setup.yaml")).unwrap(), "kind: ServiceAccount\n");
    let local = Manifest::load(
        &ResourceClient::new().unwrap(),
        &Location::Path(output.join("manifest.yaml")),
    )
    .unwrap();
    assert_eq!(local.namespace, vec!["setup.yaml"]);
}
