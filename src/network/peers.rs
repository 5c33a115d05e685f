use std::collections::BTreeSet;

use url::Url;

use crate::error::ValidationError;

/// Known peers, stored as `host[:port]` network locations.
#[derive(Debug, Default, Clone)]
pub struct PeerRegistry {
    nodes: BTreeSet<String>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a peer. Registering the same location twice is a no-op.
    /// Returns the stored network location.
    pub fn register(&mut self, address: &str) -> Result<String, ValidationError> {
        let location = network_location(address)?;
        self.nodes.insert(location.clone());
        Ok(location)
    }

    /// Add every address or none: all are parsed before any is stored.
    /// Returns the stored network locations in input order.
    pub fn register_all(
        &mut self,
        addresses: &[String],
    ) -> Result<Vec<String>, ValidationError> {
        let locations = addresses
            .iter()
            .map(|address| network_location(address))
            .collect::<Result<Vec<_>, _>>()?;
        self.nodes.extend(locations.iter().cloned());
        Ok(locations)
    }

    pub fn members(&self) -> &BTreeSet<String> {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
}

/// Extract `host[:port]` from a URL, ignoring scheme, credentials and path.
/// A bare `host:port` is read as an `http://` URL. A port written in the
/// address is kept even when it is the scheme's default.
pub fn network_location(address: &str) -> Result<String, ValidationError> {
    let trimmed = address.trim();
    let invalid = || ValidationError::InvalidAddress(address.to_string());

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    let url = Url::parse(&with_scheme).map_err(|_| invalid())?;
    let host = url.host_str().filter(|h| !h.is_empty()).ok_or_else(invalid)?;

    // The parser drops default ports (`:80` for http), so look at the text.
    let port = url.port().or_else(|| {
        has_explicit_port(&with_scheme)
            .then(|| url.port_or_known_default())
            .flatten()
    });

    Ok(match port {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn has_explicit_port(url: &str) -> bool {
    let after_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority = after_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    host_port
        .rsplit_once(':')
        .is_some_and(|(host, port)| {
            !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit())
                && (!host.starts_with('[') || host.ends_with(']'))
        })
}
