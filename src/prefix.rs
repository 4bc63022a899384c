// hijack-mitigation: Planning of Tunnel and De-aggregation Countermeasures for BGP Prefix Hijacks
// Copyright (C) 2024-2025 The hijack-mitigation developers
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Helpers to work with IPv4 CIDR blocks: netmask conversion, normalization, containment, and the
//! single-bit split used for de-aggregation.

use std::{fmt, net::Ipv4Addr};

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

/// Convert a dotted netmask (e.g., `255.255.240.0`) into a prefix length. Returns `None` if the
/// ones in the mask are not contiguous.
pub fn netmask_to_len(mask: Ipv4Addr) -> Option<u8> {
    let bits = u32::from(mask);
    let len = bits.leading_ones();
    // shifting out the leading ones must leave nothing behind
    (bits.checked_shl(len).unwrap_or(0) == 0).then_some(len as u8)
}

/// Build the CIDR block for a network address and a dotted netmask. Host bits of `network` are
/// cleared, such that equal blocks always yield the same key.
pub fn normalize(network: Ipv4Addr, mask: Ipv4Addr) -> Option<Ipv4Net> {
    let len = netmask_to_len(mask)?;
    Ipv4Net::new(network, len).ok().map(|net| net.trunc())
}

/// Returns `true` if every address in `inner` is also contained in `outer` (equality included).
pub fn covers(outer: &Ipv4Net, inner: &Ipv4Net) -> bool {
    outer.contains(inner)
}

/// Split a prefix into its two halves one bit longer. The first half is the lower one. Returns
/// `None` for a `/32`.
pub fn split(net: &Ipv4Net) -> Option<(Ipv4Net, Ipv4Net)> {
    let mut halves = net.trunc().subnets(net.prefix_len().checked_add(1)?).ok()?;
    Some((halves.next()?, halves.next()?))
}

/// Prefix description handed to the executor, as `{cidr, network, netmask}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrefixInfo {
    pub cidr: Ipv4Net,
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,
}

impl From<Ipv4Net> for PrefixInfo {
    fn from(net: Ipv4Net) -> Self {
        let cidr = net.trunc();
        Self {
            cidr,
            network: cidr.network(),
            netmask: cidr.netmask(),
        }
    }
}

impl fmt::Display for PrefixInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.cidr, self.network, self.netmask)
    }
}
