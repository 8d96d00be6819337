//! Container image references and their alternate spellings


mod default;
mod digest;
mod name;
mod registry;
mod repository;
mod tag;

pub use default::DefaultRegistry;
pub use digest::ContentDigest;
pub use name::ImageName;
pub use registry::{Registry, LOCAL_ONLY_REGISTRY};
pub use repository::{Repository, RepositoryIter};
pub use tag::Tag;
