use std::io::BufRead;
use std::net::IpAddr;

use crate::error::ConfigError;

/// Resolve one address line: an IP literal, or a host name looked up via DNS.
pub fn parse_address(index: usize, line: &str) -> Result<IpAddr, ConfigError> {
    let text = line.trim();
    let invalid = || ConfigError::InvalidAddress {
        index,
        text: text.to_owned(),
    };
    if text.is_empty() {
        return Err(invalid());
    }
    if let Ok(address) = text.parse::<IpAddr>() {
        return Ok(address);
    }
    let addresses = dns_lookup::lookup_host(text).map_err(|_| invalid())?;
    addresses.first().copied().ok_or_else(invalid)
}

/// Read exactly `count` peer addresses, one per line. Lines beyond `count` are ignored.
pub fn load_addresses<R: BufRead>(reader: R, count: usize) -> Result<Vec<IpAddr>, ConfigError> {
    if count == 0 {
        return Err(ConfigError::NoPeers);
    }
    let mut lines = reader.lines();
    let mut addresses = Vec::with_capacity(count);
    for index in 0..count {
        let line = lines
            .next()
            .ok_or(ConfigError::MissingAddress { index })??;
        addresses.push(parse_address(index, &line)?);
    }
    Ok(addresses)
}
