//! IANA protocol registry
//!
//! Fixed bidirectional mapping between protocol names and IANA protocol
//! numbers. Lookups by number fall back to the decimal string so that a
//! protocol outside the table still has a printable name.

use std::borrow::Cow;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Protocols known by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum IanaProtocol {
    Icmp = 1,
    Igmp = 2,
    Tcp = 6,
    Udp = 17,
    Gre = 47,
    Esp = 50,
    Ah = 51,
    Sctp = 132,
}

impl IanaProtocol {
    pub const ALL: [IanaProtocol; 8] = [
        IanaProtocol::Icmp,
        IanaProtocol::Igmp,
        IanaProtocol::Tcp,
        IanaProtocol::Udp,
        IanaProtocol::Gre,
        IanaProtocol::Esp,
        IanaProtocol::Ah,
        IanaProtocol::Sctp,
    ];

    /// IANA protocol number
    pub fn number(self) -> i64 {
        self as i64
    }

    /// Lower-case protocol name
    pub fn name(self) -> &'static str {
        match self {
            IanaProtocol::Icmp => "icmp",
            IanaProtocol::Igmp => "igmp",
            IanaProtocol::Tcp => "tcp",
            IanaProtocol::Udp => "udp",
            IanaProtocol::Gre => "gre",
            IanaProtocol::Esp => "esp",
            IanaProtocol::Ah => "ah",
            IanaProtocol::Sctp => "sctp",
        }
    }

    pub fn from_number(number: i64) -> Option<Self> {
        match number {
            1 => Some(IanaProtocol::Icmp),
            2 => Some(IanaProtocol::Igmp),
            6 => Some(IanaProtocol::Tcp),
            17 => Some(IanaProtocol::Udp),
            47 => Some(IanaProtocol::Gre),
            50 => Some(IanaProtocol::Esp),
            51 => Some(IanaProtocol::Ah),
            132 => Some(IanaProtocol::Sctp),
            _ => None,
        }
    }
}

impl std::fmt::Display for IanaProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for IanaProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        IanaProtocol::ALL
            .into_iter()
            .find(|p| p.name() == normalized)
            .ok_or_else(|| format!("Unknown protocol: {}", s))
    }
}

/// Resolve a protocol name (case-insensitive) to its number.
///
/// Returns `None` for names outside the registry so callers can skip the row.
pub fn protocol_number(name: &str) -> Option<i64> {
    name.parse::<IanaProtocol>().ok().map(IanaProtocol::number)
}

/// Display name for a protocol number: the registry name when known,
/// otherwise the decimal number itself.
pub fn protocol_display_name(number: i64) -> Cow<'static, str> {
    match IanaProtocol::from_number(number) {
        Some(proto) => Cow::Borrowed(proto.name()),
        None => Cow::Owned(number.to_string()),
    }
}
