#[macro_use] extern crate clap;

use clap::{App, ArgMatches};
use env_logger::{from_env, Env};
use relocator::{
    relocate::{self, RelocateOptions, Target},
    scan, Location, ResourceClient,
};
use std::{error::Error, path::PathBuf, process, time::Duration};

fn main() {
    let yaml = load_yaml!("cli.yml");
    let matches = App::from_yaml(yaml).version(crate_version!()).get_matches();

    let log_level = matches.value_of("log_level").unwrap();
    from_env(Env::default().default_filter_or(log_level)).init();

    if let Err(err) = run(&matches) {
        log::debug!("{:?}", err);
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    match matches.subcommand() {
        ("relocate", Some(sub)) => {
            let client = client(sub)?;
            let target = match sub.value_of("file") {
                Some(file) => Target::File(Location::parse(file)?),
                None => Target::Manifest(Location::parse(sub.value_of("manifest").unwrap())?),
            };
            let options = RelocateOptions {
                registry: sub.value_of("registry").unwrap().to_owned(),
                registry_user: sub.value_of("registry_user").unwrap().to_owned(),
                images: PathBuf::from(sub.value_of("images").unwrap()),
                target,
                output: PathBuf::from(sub.value_of("output").unwrap()),
            };
            relocate::relocate_images(&client, &options)?;
            println!("relocate completed successfully");
        }
        ("download", Some(sub)) => {
            let client = client(sub)?;
            let manifest = Location::parse(sub.value_of("manifest").unwrap())?;
            relocate::download_system(&client, &manifest, &PathBuf::from(sub.value_of("output").unwrap()))?;
            println!("download completed successfully");
        }
        ("list", Some(sub)) => {
            let client = client(sub)?;
            let manifest = Location::parse(sub.value_of("manifest").unwrap())?;
            let output = match sub.value_of("images") {
                Some(images) => PathBuf::from(images),
                None => scan::default_image_manifest_path(&manifest)
                    .ok_or("--images is required when the manifest is not a local file")?,
            };
            let listed = scan::list_manifest_images(&client, &manifest, &output, sub.is_present("force"))?;
            println!("listed {} images in {}", listed.images().len(), output.display());
        }
        _ => unreachable!("clap requires a subcommand"),
    }
    Ok(())
}

fn client(matches: &ArgMatches) -> Result<ResourceClient, Box<dyn Error>> {
    let mut client = ResourceClient::builder();
    if let Some(seconds) = matches.value_of("timeout") {
        client = client.request_timeout(Duration::from_secs(seconds.parse()?));
    }
    if let Some(seconds) = matches.value_of("connect_timeout") {
        client = client.connect_timeout(Duration::from_secs(seconds.parse()?));
    }
    if matches.is_present("offline") {
        client = client.offline();
    }
    Ok(client.build()?)
}
