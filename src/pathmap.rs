//! Spelling original image paths under a target registry and user
//!
//! Image paths from public registries can be deeply nested, for example
//! `gcr.io/knative-releases/github.com/knative/serving/cmd/queue`, while a
//! private registry typically offers a single user namespace with a flat list
//! of repositories. [PathMapping::Flatten] compresses an original path into a
//! single repository segment which stays readable where the length limit
//! allows, and unique thanks to a hash of the complete original reference.

use crate::{
    errors::ImageError,
    image::{ImageName, Tag},
};
use md5::{Digest, Md5};

/// Maximum length of an image name, not counting its tag or digest
pub const MAX_NAME_LENGTH: usize = 255;

/// Marks the place where path segments were left out of a flattened path
const OMISSION: &str = "---";

/// How an original repository path is spelled below the target user
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PathMapping {
    /// Compress the path into one segment suffixed with a hash of the
    /// original reference
    Flatten,
    /// Keep the original path, replacing only its first segment with the
    /// target user
    Preserve,
}

impl PathMapping {
    /// Compute the relocated name of `original` on `host` below `user`
    ///
    /// Fails if `host` and `user` do not form a valid image name.
    pub fn map(&self, host: &str, user: &str, original: &ImageName) -> Result<ImageName, ImageError> {
        let mapped = match self {
            PathMapping::Flatten => flatten_repo_path(host, user, original)?,
            PathMapping::Preserve => preserve_repo_path(host, user, original)?,
        };
        let local_only = mapped.registry().map_or(false, |r| r.is_local_only());
        if local_only && mapped.tag_str().is_none() && mapped.content_digest_str().is_none() {
            Ok(mapped.with_tag(&Tag::local()))
        } else {
            Ok(mapped)
        }
    }
}

/// Flatten the path of `original` into a single segment below `host/user`
///
/// The result has the form `host/user/<readable>-<hash>`, or
/// `host/user/<hash>` when no readable part fits. The hash is the MD5 of the
/// whole normalized reference, tag and digest included, so distinct versions
/// of one repository never share a flattened name. An original tag is kept
/// while the digest is dropped since it no longer describes a name on the
/// target registry.
pub fn flatten_repo_path(host: &str, user: &str, original: &ImageName) -> Result<ImageName, ImageError> {
    let normalized = original.normalize();
    let hash = format!("{:x}", Md5::digest(normalized.as_str().as_bytes()));
    let prefix = format!("{}/{}/", host, user);

    if prefix.len() + hash.len() > MAX_NAME_LENGTH {
        return Err(ImageError::NameTooLong {
            prefix,
            limit: MAX_NAME_LENGTH,
        });
    }
    let budget = MAX_NAME_LENGTH.saturating_sub(prefix.len() + 1 + hash.len());
    let path = normalized.repository();
    let segments: Vec<&str> = path.iter().collect();
    let readable = flat_path(&segments, budget);

    let name = if readable.is_empty() {
        format!("{}{}", prefix, hash)
    } else {
        format!("{}{}-{}", prefix, readable, hash)
    };
    let mapped = ImageName::parse(&name)?;
    Ok(match original.tag() {
        Some(tag) => mapped.with_tag(&tag),
        None => mapped,
    })
}

/// Join path segments with dashes into at most `budget` characters
///
/// When everything does not fit, the last and most specific segment is kept
/// and preceded by as many leading segments as fit, with [OMISSION] marking
/// the gap. An empty string means not even the last segment fits.
fn flat_path(segments: &[&str], budget: usize) -> String {
    let joined = segments.join("-");
    if joined.len() <= budget {
        return joined;
    }
    let (last, leading) = match segments.split_last() {
        Some(split) => split,
        None => return String::new(),
    };
    if last.len() > budget {
        return String::new();
    }

    let mut kept = String::new();
    for segment in leading {
        let candidate = if kept.is_empty() {
            segment.to_string()
        } else {
            format!("{}-{}", kept, segment)
        };
        if candidate.len() + OMISSION.len() + last.len() > budget {
            break;
        }
        kept = candidate;
    }

    if kept.is_empty() {
        last.to_string()
    } else {
        format!("{}{}{}", kept, OMISSION, last)
    }
}

fn preserve_repo_path(host: &str, user: &str, original: &ImageName) -> Result<ImageName, ImageError> {
    let path = original.path();
    let below_user = match path.strip_first() {
        Some((_, rest)) => rest,
        None => path,
    };
    ImageName::from_parts(
        Some(host),
        &format!("{}/{}", user, below_user),
        original.tag_str(),
        original.content_digest_str(),
    )
}
