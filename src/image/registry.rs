use crate::errors::ImageError;
use regex::Regex;
use std::{fmt, ops::Range, str::FromStr};

/// Images relocated to this registry exist only in a local Docker daemon
pub const LOCAL_ONLY_REGISTRY: &str = "dev.local";

/// Registry host that images are pulled from or relocated to
///
/// A domain name, optionally followed by `:port`.
#[derive(Clone)]
pub struct Registry {
    serialized: String,
    domain_pos: Range<usize>,
    port: Option<u16>,
}

impl Registry {
    /// Host and port exactly as parsed
    pub fn as_str(&self) -> &str {
        &self.serialized
    }

    pub fn parse(s: &str) -> Result<Self, ImageError> {
        lazy_static! {
            static ref RE: Regex = Regex::new(&format!("^{}$", Registry::regex_str())).unwrap();
        }
        let captures = RE
            .captures(s)
            .ok_or_else(|| ImageError::InvalidReferenceFormat(s.to_owned()))?;
        let port = match captures.name("reg_p") {
            None => None,
            Some(m) => Some(
                m.as_str()
                    .parse()
                    .map_err(|_| ImageError::InvalidReferenceFormat(s.to_owned()))?,
            ),
        };
        Ok(Registry {
            serialized: s.to_owned(),
            domain_pos: captures.name("reg_d").unwrap().range(),
            port,
        })
    }

    /// Host name without the port
    pub fn domain_str(&self) -> &str {
        &self.serialized[self.domain_pos.clone()]
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Is this the registry for images which are never pushed anywhere?
    pub fn is_local_only(&self) -> bool {
        self.serialized == LOCAL_ONLY_REGISTRY
    }

    pub(crate) fn regex_str() -> &'static str {
        concat!(
            "(?P<reg>",
            /*  */ "(?P<reg_d>", // host
            /* -- */ "(?:[a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9])",
            /* -- */ "(?:", // more dotted labels
            /* -- -- */ "\\.",
            /* -- -- */ "(?:[a-zA-Z0-9]|[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9])",
            /* -- */ ")*",
            /*  */ ")",
            /*  */ "(?:[:](?P<reg_p>[0-9]+))?", // port
            ")",
        )
    }
}

impl Eq for Registry {}

impl PartialEq for Registry {
    fn eq(&self, other: &Self) -> bool {
        self.serialized == other.serialized
    }
}

impl std::hash::Hash for Registry {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.serialized.hash(state);
    }
}

impl FromStr for Registry {
    type Err = ImageError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Registry::parse(s)
    }
}

impl fmt::Display for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Registry({})", self)
    }
}
