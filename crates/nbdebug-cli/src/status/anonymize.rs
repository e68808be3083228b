//! Stable replacement of identifying names and addresses.
//!
//! Domains become `anon-<n>.domain`; public IPv4 addresses are drawn from
//! the documentation blocks 198.51.100.0/24, 203.0.113.0/24 and
//! 192.0.2.0/24 in turn, wrapping once all three are used, and public IPv6
//! addresses from 2001:db8::/32. Private, loopback, link-local and shared
//! (CGNAT) space identifies nothing outside the host's own network and is
//! left alone, which keeps overlay addresses readable.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use nbdebug_daemon_types::{PeerState, ServiceState, StatusSummary};
use url::{Host, Url};

const IPV4_BLOCKS: [[u8; 3]; 3] = [[198, 51, 100], [203, 0, 113], [192, 0, 2]];
/// Usable hosts per /24, skipping the network and broadcast addresses.
const HOSTS_PER_BLOCK: u32 = 254;
const IPV6_BASE: Ipv6Addr = Ipv6Addr::new(0x2001, 0x0db8, 0, 0, 0, 0, 0, 0);
/// Interface bits below the /32 documentation prefix.
const IPV6_HOST_MASK: u128 = (1 << 96) - 1;

/// Maps each distinct domain or public address to one stable stand-in.
#[derive(Debug, Default)]
pub(crate) struct Anonymizer {
    domains: HashMap<String, String>,
    addresses: HashMap<IpAddr, IpAddr>,
    next_v4: u32,
    next_v6: u128,
}

impl Anonymizer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of `summary` with identifying fields replaced.
    pub(crate) fn summary(&mut self, summary: &StatusSummary) -> StatusSummary {
        let mut anonymised = summary.clone();
        for peer in &mut anonymised.peers {
            self.peer(peer);
        }
        self.service(&mut anonymised.management);
        self.service(&mut anonymised.signal);
        anonymised.local_peer.fqdn = self.domain(&anonymised.local_peer.fqdn);
        anonymised.local_peer.ip = self.address_text(&anonymised.local_peer.ip);
        anonymised
    }

    fn peer(&mut self, peer: &mut PeerState) {
        peer.fqdn = self.domain(&peer.fqdn);
        peer.ip = self.address_text(&peer.ip);
        for endpoint in [&mut peer.local_endpoint, &mut peer.remote_endpoint] {
            if let Some(text) = endpoint.as_mut() {
                *text = self.address_text(text);
            }
        }
    }

    fn service(&mut self, service: &mut ServiceState) {
        service.url = self.url(&service.url);
        if let Some(reason) = service.error.as_mut() {
            *reason = self.free_text(reason);
        }
    }

    /// Replaces a domain name, keeping empty values and `localhost`.
    pub(crate) fn domain(&mut self, domain: &str) -> String {
        if domain.is_empty() || domain.eq_ignore_ascii_case("localhost") {
            return domain.to_owned();
        }
        let key = domain.trim_end_matches('.').to_ascii_lowercase();
        let next = self.domains.len() + 1;
        self.domains
            .entry(key)
            .or_insert_with(|| format!("anon-{next}.domain"))
            .clone()
    }

    /// Replaces a public address, leaving private ranges untouched.
    pub(crate) fn ip(&mut self, address: IpAddr) -> IpAddr {
        if !is_public(address) {
            return address;
        }
        if let Some(existing) = self.addresses.get(&address) {
            return *existing;
        }
        let replacement = match address {
            IpAddr::V4(_) => {
                let index = self.next_v4;
                self.next_v4 = self.next_v4.wrapping_add(1);
                IpAddr::V4(documentation_v4(index))
            }
            IpAddr::V6(_) => {
                self.next_v6 = self.next_v6.wrapping_add(1);
                let host = self.next_v6 & IPV6_HOST_MASK;
                IpAddr::V6(Ipv6Addr::from(u128::from(IPV6_BASE) | host))
            }
        };
        self.addresses.insert(address, replacement);
        replacement
    }

    /// Anonymises an address written as `ip`, `ip/prefix` or `ip:port`.
    fn address_text(&mut self, text: &str) -> String {
        if let Ok(socket) = text.parse::<SocketAddr>() {
            return SocketAddr::new(self.ip(socket.ip()), socket.port()).to_string();
        }
        let (address, suffix) = match text.split_once('/') {
            Some((address, prefix)) => (address, Some(prefix)),
            None => (text, None),
        };
        match address.parse::<IpAddr>() {
            Ok(ip) => {
                let replaced = self.ip(ip);
                suffix.map_or_else(
                    || replaced.to_string(),
                    |prefix| format!("{replaced}/{prefix}"),
                )
            }
            Err(_) => text.to_owned(),
        }
    }

    /// Replaces the host of a URL while keeping the rest verbatim.
    ///
    /// The parser normalises hosts (case, IDNA, numeric IPv4 forms), so when
    /// the normalised host cannot be found in the original text the URL is
    /// re-serialised with the replacement host instead.
    fn url(&mut self, text: &str) -> String {
        let Ok(mut parsed) = Url::parse(text) else {
            return self.domain_or_address(text);
        };
        let host = parsed.host().map(|host| host.to_owned());
        match host {
            Some(Host::Domain(domain)) => {
                // Non-special schemes keep IP literals as opaque hosts.
                let replacement = match domain.parse::<IpAddr>() {
                    Ok(ip) => self.ip(ip).to_string(),
                    Err(_) => self.domain(&domain),
                };
                replace_host(text, &domain, &replacement)
                    .or_else(|| {
                        parsed.set_host(Some(&replacement)).ok()?;
                        Some(parsed.to_string())
                    })
                    .unwrap_or(replacement)
            }
            Some(Host::Ipv4(ip)) => {
                let replacement = self.ip(IpAddr::V4(ip));
                replace_host(text, &ip.to_string(), &replacement.to_string())
                    .or_else(|| {
                        parsed.set_ip_host(replacement).ok()?;
                        Some(parsed.to_string())
                    })
                    .unwrap_or_else(|| replacement.to_string())
            }
            Some(Host::Ipv6(ip)) => {
                let replacement = self.ip(IpAddr::V6(ip));
                if parsed.set_ip_host(replacement).is_err() {
                    return replacement.to_string();
                }
                parsed.to_string()
            }
            None => text.to_owned(),
        }
    }

    fn domain_or_address(&mut self, token: &str) -> String {
        let replaced = self.address_text(token);
        if replaced != token || !looks_like_domain(token) {
            return replaced;
        }
        self.domain(token)
    }

    /// Anonymises addresses, URLs and domains inside free-form text such as
    /// error reasons, token by token.
    pub(crate) fn free_text(&mut self, text: &str) -> String {
        text.split(' ')
            .map(|token| {
                let trimmed = token
                    .trim_matches(|c: char| matches!(c, ',' | ';' | '"' | '\'' | '(' | ')'))
                    .trim_end_matches(':');
                if trimmed.is_empty() {
                    return token.to_owned();
                }
                let replaced = if trimmed.contains("://") {
                    self.url(trimmed)
                } else {
                    self.domain_or_address(trimmed)
                };
                token.replacen(trimmed, &replaced, 1)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Swaps the first ASCII-case-insensitive occurrence of `host` in `text`.
fn replace_host(text: &str, host: &str, replacement: &str) -> Option<String> {
    let start = text
        .to_ascii_lowercase()
        .find(&host.to_ascii_lowercase())?;
    let before = text.get(..start)?;
    let after = text.get(start + host.len()..)?;
    Some(format!("{before}{replacement}{after}"))
}

fn documentation_v4(index: u32) -> Ipv4Addr {
    let slot = index % (HOSTS_PER_BLOCK * 3);
    let block = usize::try_from(slot / HOSTS_PER_BLOCK).unwrap_or_default();
    let [a, b, c] = IPV4_BLOCKS.get(block).copied().unwrap_or(IPV4_BLOCKS[0]);
    let host = u8::try_from(slot % HOSTS_PER_BLOCK + 1).unwrap_or(1);
    Ipv4Addr::new(a, b, c, host)
}

fn looks_like_domain(token: &str) -> bool {
    let labels: Vec<&str> = token.trim_end_matches('.').split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
        && labels
            .last()
            .is_some_and(|tld| tld.chars().all(|c| c.is_ascii_alphabetic()))
}

fn is_public(address: IpAddr) -> bool {
    match address {
        IpAddr::V4(ip) => {
            let [first, second, ..] = ip.octets();
            let shared = first == 100 && (second & 0xc0) == 64;
            !(ip.is_private()
                || ip.is_loopback()
                || ip.is_link_local()
                || ip.is_unspecified()
                || ip.is_broadcast()
                || ip.is_multicast()
                || shared)
        }
        IpAddr::V6(ip) => {
            let first = ip.segments()[0];
            let unique_local = (first & 0xfe00) == 0xfc00;
            let link_local = (first & 0xffc0) == 0xfe80;
            !(ip.is_loopback()
                || ip.is_unspecified()
                || ip.is_multicast()
                || unique_local
                || link_local)
        }
    }
}
