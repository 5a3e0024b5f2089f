//! Connection descriptor parsing
//!
//! Turns a `vless://<uuid>@<host>:<port>[?<query>][#<remark>]` link into a
//! [`ConnectionDescriptor`] with every optional field filled from its default.
//! Pure string processing, no I/O.

mod query;

use crate::error::ParseError;
use query::QueryParams;
use std::fmt;
use std::str::FromStr;

/// Literal prefix every link must start with
pub const SCHEME: &str = "vless://";

/// Security layer requested by a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Security {
    /// Plaintext
    None,
    /// Regular TLS
    Tls,
    /// TLS camouflage keyed by a server public key
    Reality,
}

impl Security {
    /// Map a link's `security` value, `None` when it is not one of the known modes
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "none" => Some(Self::None),
            "tls" => Some(Self::Tls),
            "reality" => Some(Self::Reality),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Tls => "tls",
            Self::Reality => "reality",
        }
    }
}

impl fmt::Display for Security {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transport kind requested by a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Tcp,
    /// WebSocket, the only transport with its own stream settings
    Ws,
    /// Anything else; passed to the engine as the bare network name
    Other,
}

impl Transport {
    pub fn from_name(name: &str) -> Self {
        match name {
            "tcp" => Self::Tcp,
            "ws" => Self::Ws,
            _ => Self::Other,
        }
    }
}

/// Parsed connection link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    /// User identity token
    pub uuid: String,
    /// Server address, IPv6 brackets removed
    pub host: String,
    pub port: u16,
    /// `none`, `tls` or `reality`; other values are kept verbatim
    pub security: String,
    /// Flow hint
    pub flow: String,
    /// TLS fingerprint profile
    pub fp: String,
    /// Reality public key
    pub pbk: String,
    /// Server name indication, the host unless the link sets it
    pub sni: String,
    /// Transport kind (`type` in the link)
    pub transport: String,
    /// WebSocket path
    pub path: String,
    /// Reality short id
    pub sid: String,
    /// Reality spider-X
    pub spx: String,
    /// Human label from the `#fragment`
    pub remark: String,
}

impl ConnectionDescriptor {
    /// Typed security mode, `None` for values outside the known set
    pub fn security_mode(&self) -> Option<Security> {
        Security::from_name(&self.security)
    }

    pub fn transport_kind(&self) -> Transport {
        Transport::from_name(&self.transport)
    }
}

impl FromStr for ConnectionDescriptor {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

/// Parse a `vless://` link
pub fn parse(uri: &str) -> Result<ConnectionDescriptor, ParseError> {
    let rest = uri.strip_prefix(SCHEME).ok_or(ParseError::Scheme)?;

    let (rest, remark) = match rest.split_once('#') {
        Some((rest, fragment)) => (rest, decode_remark(fragment)),
        None => (rest, String::new()),
    };

    let (uuid, address) = rest
        .split_once('@')
        .ok_or_else(|| ParseError::format("missing '@' between identity and address"))?;
    if uuid.is_empty() {
        return Err(ParseError::format("identity is empty"));
    }

    let (host_port, query) = address.split_once('?').unwrap_or((address, ""));
    let (host, port) = host_port
        .rsplit_once(':')
        .ok_or_else(|| ParseError::format("port is missing from the address"))?;
    let host = strip_brackets(host);
    if host.is_empty() {
        return Err(ParseError::format("host is empty"));
    }
    let port: u16 = port.trim().parse()?;

    let mut params = QueryParams::resolve(query, host);

    Ok(ConnectionDescriptor {
        uuid: uuid.to_string(),
        host: host.to_string(),
        port,
        security: params.take("security"),
        flow: params.take("flow"),
        fp: params.take("fp"),
        pbk: params.take("pbk"),
        sni: params.take("sni"),
        transport: params.take("type"),
        path: params.take("path"),
        sid: params.take("sid"),
        spx: params.take("spx"),
        remark,
    })
}

fn strip_brackets(host: &str) -> &str {
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host)
}

fn decode_remark(fragment: &str) -> String {
    urlencoding::decode(fragment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| fragment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_link_gets_defaults() {
        let d = parse("vless://abc-123@example.com:443").unwrap();
        assert_eq!(d.uuid, "abc-123");
        assert_eq!(d.host, "example.com");
        assert_eq!(d.port, 443);
        assert_eq!(d.security, "none");
        assert_eq!(d.flow, "");
        assert_eq!(d.fp, "chrome");
        assert_eq!(d.pbk, "");
        assert_eq!(d.sni, "example.com");
        assert_eq!(d.transport, "tcp");
        assert_eq!(d.path, "/");
        assert_eq!(d.sid, "");
        assert_eq!(d.spx, "");
        assert_eq!(d.remark, "");
    }

    #[test]
    fn test_reality_link() {
        let d = parse(
            "vless://id@1.2.3.4:8443?security=reality&pbk=KEY&sid=ab12&spx=%2F&fp=firefox&sni=www.microsoft.com&flow=xtls-rprx-vision",
        )
        .unwrap();
        assert_eq!(d.security_mode(), Some(Security::Reality));
        assert_eq!(d.pbk, "KEY");
        assert_eq!(d.sid, "ab12");
        assert_eq!(d.spx, "/");
        assert_eq!(d.fp, "firefox");
        assert_eq!(d.sni, "www.microsoft.com");
        assert_eq!(d.flow, "xtls-rprx-vision");
    }

    #[test]
    fn test_explicit_blank_sni_is_not_replaced_by_host() {
        let d = parse("vless://id@example.com:443?sni=").unwrap();
        assert_eq!(d.sni, "");
    }

    #[test]
    fn test_fragment_becomes_remark() {
        let d = parse("vless://id@example.com:443?type=ws&path=%2Fws#My%20Node").unwrap();
        assert_eq!(d.remark, "My Node");
        assert_eq!(d.path, "/ws");

        let d = parse("vless://id@example.com:443#plain").unwrap();
        assert_eq!(d.port, 443);
        assert_eq!(d.remark, "plain");
    }

    #[test]
    fn test_ipv6_host() {
        let d = parse("vless://id@[2001:db8::1]:443").unwrap();
        assert_eq!(d.host, "2001:db8::1");
        assert_eq!(d.sni, "2001:db8::1");
        assert_eq!(d.port, 443);
    }

    #[test]
    fn test_unknown_values_pass_through() {
        let d = parse("vless://id@h:1?security=xtls&type=grpc&serviceName=svc").unwrap();
        assert_eq!(d.security, "xtls");
        assert_eq!(d.security_mode(), None);
        assert_eq!(d.transport, "grpc");
        assert_eq!(d.transport_kind(), Transport::Other);
    }

    #[test]
    fn test_wrong_scheme() {
        assert_eq!(parse("http://x@h:1"), Err(ParseError::Scheme));
        assert_eq!(parse("VLESS://x@h:1"), Err(ParseError::Scheme));
    }

    #[test]
    fn test_missing_separators() {
        assert!(matches!(parse("vless://nouser"), Err(ParseError::Format(_))));
        assert!(matches!(
            parse("vless://u@hostnoport"),
            Err(ParseError::Format(_))
        ));
        assert!(matches!(
            parse("vless://u@hostnoport?security=tls"),
            Err(ParseError::Format(_))
        ));
    }

    #[test]
    fn test_empty_identity_or_host() {
        assert!(matches!(parse("vless://@h:1"), Err(ParseError::Format(_))));
        assert!(matches!(parse("vless://u@:1"), Err(ParseError::Format(_))));
    }

    #[test]
    fn test_bad_port() {
        assert!(matches!(parse("vless://u@h:abc"), Err(ParseError::Numeric(_))));
        assert!(matches!(parse("vless://u@h:"), Err(ParseError::Numeric(_))));
        assert!(matches!(parse("vless://u@h:70000"), Err(ParseError::Numeric(_))));
    }

    #[test]
    fn test_port_surrounding_whitespace_is_ignored() {
        let d = parse("vless://u@h: 443 ?security=tls").unwrap();
        assert_eq!(d.host, "h");
        assert_eq!(d.port, 443);
    }

    #[test]
    fn test_from_str() {
        let d: ConnectionDescriptor = "vless://u@h:10".parse().unwrap();
        assert_eq!(d.port, 10);
    }

    #[test]
    fn test_security_names_round_trip() {
        for mode in [Security::None, Security::Tls, Security::Reality] {
            assert_eq!(Security::from_name(mode.as_str()), Some(mode));
        }
    }
}
