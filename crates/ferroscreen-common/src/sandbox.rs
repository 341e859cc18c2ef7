use reqwest::{Client, ClientBuilder};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;
use crate::error::ScreenError;

/// An HTTP client that only talks to approved registry hosts.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    client: Client,
    allowlist: HashSet<String>,
}

impl SandboxClient {
    /// Creates a client with the default registry allowlist and a 30 s timeout.
    pub fn new() -> Result<Self, ScreenError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, ScreenError> {
        let domains = [
            "www.ebi.ac.uk",  // ChEMBL
            "data.rcsb.org",  // PDB
            "files.rcsb.org", // PDB downloads
            "localhost",
            "127.0.0.1",
        ];
        let allowlist = domains.iter().map(|d| d.to_string()).collect();

        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(concat!("ferroscreen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ScreenError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist })
    }

    /// Appends an exact hostname to the allowlist.
    pub fn allow_domain(&mut self, domain: &str) {
        self.allowlist.insert(domain.to_string());
    }

    /// Allows the host of `base_url`, so a configured mirror is reachable.
    pub fn allow_url_host(&mut self, base_url: &str) -> Result<(), ScreenError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ScreenError::Validation(format!("Invalid URL {base_url}: {e}")))?;
        if let Some(host) = parsed.host_str() {
            self.allow_domain(host);
        }
        Ok(())
    }

    /// Whether a URL is permitted under the current allowlist.
    pub fn is_allowed(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        let Some(host) = parsed.host_str() else {
            return false;
        };
        self.allowlist
            .iter()
            .any(|allowed| host == allowed || host.ends_with(&format!(".{}", allowed)))
    }

    /// GET builder for an allowed URL.
    pub fn get(&self, url: &str) -> Result<reqwest::RequestBuilder, ScreenError> {
        if !self.is_allowed(url) {
            return Err(ScreenError::Security(format!(
                "Domain not in allowlist for URL {}",
                url
            )));
        }
        Ok(self.client.get(url))
    }
}
