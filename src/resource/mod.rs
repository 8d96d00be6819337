//! Where resource files live, and how to read them


mod client;
mod location;

pub use client::{ResourceClient, ResourceClientBuilder};
pub use location::Location;
