//! Reading resource files from disk or over HTTP

use crate::{errors::ResourceError, resource::Location};
use std::{fs, time::Duration};

/// Builder for configuring custom [ResourceClient] instances
#[derive(Debug)]
pub struct ResourceClientBuilder {
    req: reqwest::blocking::ClientBuilder,
    offline: bool,
}

impl ResourceClientBuilder {
    /// Start constructing a custom resource client
    pub fn new() -> Self {
        let req = reqwest::blocking::Client::builder().user_agent(ResourceClient::default_user_agent());
        ResourceClientBuilder { req, offline: false }
    }

    /// Set a timeout for each network request
    ///
    /// This timeout applies from the beginning of a request until the last
    /// byte has been received. Without one, reqwest's default of 30 seconds
    /// applies.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.req = self.req.timeout(timeout);
        self
    }

    /// Set a timeout for only the initial connect phase of each network request
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.req = self.req.connect_timeout(timeout);
        self
    }

    /// Sets the `User-Agent` header used by this client
    ///
    /// By default, the value returned by [ResourceClient::default_user_agent()]
    /// is used.
    pub fn user_agent(mut self, value: &str) -> Self {
        self.req = self.req.user_agent(value.to_owned());
        self
    }

    /// Refuse every network request, reading only local files
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Construct a ResourceClient using the parameters from this Builder
    pub fn build(self) -> Result<ResourceClient, ResourceError> {
        if self.offline {
            log::info!("resource client is offline, only local files will be read");
        }
        Ok(ResourceClient {
            req: self.req.build()?,
            offline: self.offline,
        })
    }
}

impl Default for ResourceClientBuilder {
    fn default() -> Self {
        ResourceClientBuilder::new()
    }
}

/// Reads manifests and resource files from their [Location]
///
/// One client can be shared by every read in a relocation run.
#[derive(Clone, Debug)]
pub struct ResourceClient {
    req: reqwest::blocking::Client,
    offline: bool,
}

impl ResourceClient {
    /// Construct a new resource client with default options
    pub fn new() -> Result<ResourceClient, ResourceError> {
        ResourceClient::builder().build()
    }

    /// Construct a resource client with custom options, via
    /// ResourceClientBuilder
    pub fn builder() -> ResourceClientBuilder {
        ResourceClientBuilder::new()
    }

    /// Return the default `User-Agent` that we use if no other is set
    pub fn default_user_agent() -> &'static str {
        concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"))
    }

    /// Read the complete contents of a resource
    pub fn fetch(&self, location: &Location) -> Result<Vec<u8>, ResourceError> {
        match location {
            Location::Path(path) => {
                log::debug!("reading {:?}", path);
                fs::read(path).map_err(|source| ResourceError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
            Location::Url(url) => {
                if self.offline {
                    return Err(ResourceError::DownloadInOfflineMode(url.to_string()));
                }
                log::info!("<{}> downloading...", url);
                let response = self.req.get(url.clone()).send()?.error_for_status()?;
                let body = response.bytes()?;
                log::debug!("<{}> downloaded, {} bytes", url, body.len());
                Ok(body.to_vec())
            }
        }
    }
}
