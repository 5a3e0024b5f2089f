//! Serde model of the engine configuration

use serde::Serialize;

/// Complete engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProxyConfig {
    pub log: LogSettings,
    pub dns: DnsSettings,
    pub inbounds: Vec<Inbound>,
    pub outbounds: Vec<Outbound>,
    pub routing: Routing,
}

impl ProxyConfig {
    /// Serialize for the engine
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Stream settings of the VLESS outbound
    pub fn proxy_stream(&self) -> Option<&StreamSettings> {
        self.outbounds.iter().find_map(|o| match o {
            Outbound::Vless {
                stream_settings, ..
            } => Some(stream_settings),
            Outbound::Dns { .. } => None,
        })
    }

    /// User entry of the VLESS outbound
    pub fn proxy_user(&self) -> Option<&VlessUser> {
        self.outbounds.iter().find_map(|o| match o {
            Outbound::Vless { settings, .. } => {
                settings.vnext.first().and_then(|server| server.users.first())
            }
            Outbound::Dns { .. } => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogSettings {
    pub loglevel: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsSettings {
    pub servers: Vec<String>,
    pub tag: String,
}

/// SOCKS listener
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Inbound {
    pub port: u16,
    pub listen: String,
    pub protocol: String,
    pub settings: SocksSettings,
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SocksSettings {
    pub auth: String,
    pub udp: bool,
    pub ip: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum Outbound {
    Vless {
        settings: VlessSettings,
        #[serde(rename = "streamSettings")]
        stream_settings: StreamSettings,
        tag: String,
    },
    Dns {
        tag: String,
    },
}

impl Outbound {
    pub fn tag(&self) -> &str {
        match self {
            Self::Vless { tag, .. } | Self::Dns { tag } => tag,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VlessSettings {
    pub vnext: Vec<VnextServer>,
    pub domain_strategy: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VnextServer {
    pub address: String,
    pub port: u16,
    pub users: Vec<VlessUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VlessUser {
    pub id: String,
    pub flow: String,
    pub encryption: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSettings {
    pub network: String,
    pub security: String,
    /// Serialized as a `realitySettings` or `tlsSettings` key
    #[serde(flatten)]
    pub security_settings: Option<SecuritySettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws_settings: Option<WsSettings>,
}

impl StreamSettings {
    pub fn reality_settings(&self) -> Option<&RealitySettings> {
        match &self.security_settings {
            Some(SecuritySettings::Reality(reality)) => Some(reality),
            _ => None,
        }
    }

    pub fn tls_settings(&self) -> Option<&TlsSettings> {
        match &self.security_settings {
            Some(SecuritySettings::Tls(tls)) => Some(tls),
            _ => None,
        }
    }
}

/// At most one security object per stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SecuritySettings {
    #[serde(rename = "realitySettings")]
    Reality(RealitySettings),
    #[serde(rename = "tlsSettings")]
    Tls(TlsSettings),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealitySettings {
    pub public_key: String,
    pub short_id: String,
    pub fingerprint: String,
    pub server_name: String,
    pub spider_x: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsSettings {
    pub server_name: String,
    pub fingerprint: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WsSettings {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Routing {
    pub domain_strategy: String,
    pub rules: Vec<RoutingRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingRule {
    #[serde(rename = "type")]
    pub rule_type: String,
    pub inbound_tag: Vec<String>,
    pub network: String,
    pub port: u16,
    pub outbound_tag: String,
}

#[cfg(test)]
mod tests {
    use crate::descriptor::parse;
    use crate::synth::synthesize;
    use serde_json::json;

    #[test]
    fn test_json_layout_tls_ws() {
        let d =
            parse("vless://id@example.com:443?security=tls&sni=foo.com&type=ws&path=/x").unwrap();
        let value = serde_json::to_value(synthesize(&d, 25443)).unwrap();

        assert_eq!(
            value,
            json!({
                "log": { "loglevel": "debug" },
                "dns": { "servers": ["8.8.8.8", "1.1.1.1"], "tag": "dns_out" },
                "inbounds": [{
                    "port": 25443,
                    "listen": "127.0.0.1",
                    "protocol": "socks",
                    "settings": { "auth": "noauth", "udp": false, "ip": "127.0.0.1" },
                    "tag": "socks-in"
                }],
                "outbounds": [{
                    "protocol": "vless",
                    "settings": {
                        "vnext": [{
                            "address": "example.com",
                            "port": 443,
                            "users": [{ "id": "id", "flow": "", "encryption": "none" }]
                        }],
                        "domainStrategy": "UseIP"
                    },
                    "streamSettings": {
                        "network": "ws",
                        "security": "tls",
                        "tlsSettings": { "serverName": "foo.com", "fingerprint": "chrome" },
                        "wsSettings": { "path": "/x" }
                    },
                    "tag": "vless-out"
                }, {
                    "protocol": "dns",
                    "tag": "dns-out"
                }],
                "routing": {
                    "domainStrategy": "IPIfNonMatch",
                    "rules": [{
                        "type": "field",
                        "inboundTag": ["socks-in"],
                        "network": "udp",
                        "port": 53,
                        "outboundTag": "dns-out"
                    }]
                }
            })
        );
    }

    #[test]
    fn test_reality_keys() {
        let d = parse("vless://id@h:443?security=reality&pbk=K&sid=S&spx=%2F").unwrap();
        let value = serde_json::to_value(synthesize(&d, 1)).unwrap();
        let stream = &value["outbounds"][0]["streamSettings"];

        assert_eq!(
            stream["realitySettings"],
            json!({
                "publicKey": "K",
                "shortId": "S",
                "fingerprint": "chrome",
                "serverName": "h",
                "spiderX": "/"
            })
        );
        assert!(stream.get("tlsSettings").is_none());
        assert!(stream.get("wsSettings").is_none());
    }

    #[test]
    fn test_plain_stream_has_only_base_keys() {
        let d = parse("vless://id@h:443").unwrap();
        let value = serde_json::to_value(synthesize(&d, 1)).unwrap();
        assert_eq!(
            value["outbounds"][0]["streamSettings"],
            json!({ "network": "tcp", "security": "none" })
        );
    }

    #[test]
    fn test_pretty_json_parses_back() {
        let d = parse("vless://id@h:443").unwrap();
        let text = synthesize(&d, 1).to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["inbounds"][0]["port"], 1);
    }
}
