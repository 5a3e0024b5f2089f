//! Engine configuration synthesis
//!
//! Maps a [`ConnectionDescriptor`] onto the JSON layout the proxy engine
//! reads: one loopback SOCKS inbound, the VLESS outbound plus a DNS
//! outbound, and a single routing rule that sends UDP/53 from the inbound
//! to the DNS outbound. Synthesis is total; every descriptor yields a
//! complete config.

mod model;

pub use model::*;

use crate::descriptor::{ConnectionDescriptor, Security, Transport};

/// Port the SOCKS inbound listens on unless configured otherwise
pub const DEFAULT_LOCAL_PORT: u16 = 25443;

pub const SOCKS_INBOUND_TAG: &str = "socks-in";
pub const PROXY_OUTBOUND_TAG: &str = "vless-out";
pub const DNS_OUTBOUND_TAG: &str = "dns-out";

const ENGINE_LOG_LEVEL: &str = "debug";
const DNS_SERVERS: [&str; 2] = ["8.8.8.8", "1.1.1.1"];
const DNS_TAG: &str = "dns_out";
const LOOPBACK: &str = "127.0.0.1";

/// Vision flows only apply to the server side and are dropped from the
/// client outbound.
pub const VISION_FLOWS: [&str; 2] = ["xtls-rprx-vision", "xtls-rprx-vision-udp443"];

/// Flow value to place on the outbound user
pub fn client_flow(flow: &str) -> &str {
    if VISION_FLOWS.contains(&flow) {
        ""
    } else {
        flow
    }
}

/// Build the engine config for `d` with the SOCKS inbound on `local_port`
pub fn synthesize(d: &ConnectionDescriptor, local_port: u16) -> ProxyConfig {
    ProxyConfig {
        log: LogSettings {
            loglevel: ENGINE_LOG_LEVEL.to_string(),
        },
        dns: DnsSettings {
            servers: DNS_SERVERS.iter().map(|s| s.to_string()).collect(),
            tag: DNS_TAG.to_string(),
        },
        inbounds: vec![socks_inbound(local_port)],
        outbounds: vec![
            vless_outbound(d),
            Outbound::Dns {
                tag: DNS_OUTBOUND_TAG.to_string(),
            },
        ],
        routing: Routing {
            domain_strategy: "IPIfNonMatch".to_string(),
            rules: vec![RoutingRule {
                rule_type: "field".to_string(),
                inbound_tag: vec![SOCKS_INBOUND_TAG.to_string()],
                network: "udp".to_string(),
                port: 53,
                outbound_tag: DNS_OUTBOUND_TAG.to_string(),
            }],
        },
    }
}

fn socks_inbound(port: u16) -> Inbound {
    Inbound {
        port,
        listen: LOOPBACK.to_string(),
        protocol: "socks".to_string(),
        settings: SocksSettings {
            auth: "noauth".to_string(),
            udp: false,
            ip: LOOPBACK.to_string(),
        },
        tag: SOCKS_INBOUND_TAG.to_string(),
    }
}

fn vless_outbound(d: &ConnectionDescriptor) -> Outbound {
    Outbound::Vless {
        settings: VlessSettings {
            vnext: vec![VnextServer {
                address: d.host.clone(),
                port: d.port,
                users: vec![VlessUser {
                    id: d.uuid.clone(),
                    flow: client_flow(&d.flow).to_string(),
                    encryption: "none".to_string(),
                }],
            }],
            domain_strategy: "UseIP".to_string(),
        },
        stream_settings: stream_settings(d),
        tag: PROXY_OUTBOUND_TAG.to_string(),
    }
}

fn stream_settings(d: &ConnectionDescriptor) -> StreamSettings {
    let security = match d.security_mode() {
        Some(Security::Reality) => Some(SecuritySettings::Reality(RealitySettings {
            public_key: d.pbk.clone(),
            short_id: d.sid.clone(),
            fingerprint: d.fp.clone(),
            server_name: d.sni.clone(),
            spider_x: d.spx.clone(),
        })),
        Some(Security::Tls) => Some(SecuritySettings::Tls(TlsSettings {
            server_name: d.sni.clone(),
            fingerprint: d.fp.clone(),
        })),
        Some(Security::None) => None,
        None => {
            tracing::warn!(
                security = %d.security,
                "unrecognized security mode, no security settings attached"
            );
            None
        }
    };

    let ws_settings = match d.transport_kind() {
        Transport::Ws => Some(WsSettings {
            path: d.path.clone(),
        }),
        Transport::Tcp | Transport::Other => None,
    };

    StreamSettings {
        network: d.transport.clone(),
        security: d.security.clone(),
        security_settings: security,
        ws_settings,
    }
}
