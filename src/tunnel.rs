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
//! Static tunnel definitions: for a covering prefix, the helper AS that redirects the traffic into
//! a tunnel towards the own AS.

use std::collections::BTreeMap;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

use hijack_utils::serde::ordered_map::OrderedMap;

use crate::{prefix, topology::Asn};

/// One end of a tunnel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TunnelEndpoint {
    #[serde(deserialize_with = "crate::topology::deserialize_asn")]
    pub asn: Asn,
    #[serde(alias = "routerId")]
    pub router_id: String,
    #[serde(alias = "tunnelInterfaceName")]
    pub tunnel_interface_name: String,
    /// Remaining tunnel attributes (addresses, MTU, MSS, ...). They are passed through untouched.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TunnelDefinition {
    #[serde(rename = "helperAS")]
    pub helper_as: TunnelEndpoint,
    #[serde(rename = "ownAS", alias = "myAS", default)]
    pub own_as: Option<TunnelEndpoint>,
}

/// Tunnel definitions keyed by the prefix they protect. The order of the configuration file is
/// kept, since the first covering definition is the one that is used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TunnelCatalog(OrderedMap<Ipv4Net, TunnelDefinition>);

impl TunnelCatalog {
    /// Return the first definition whose prefix covers all of `prefix` (or is equal to it).
    pub fn find(&self, prefix: &Ipv4Net) -> Option<(&Ipv4Net, &TunnelDefinition)> {
        self.iter().find(|(covering, _)| prefix::covers(covering, prefix))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Ipv4Net, &TunnelDefinition)> {
        self.0 .0.iter().map(|(k, v)| (k, v))
    }

    pub fn len(&self) -> usize {
        self.0 .0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0 .0.is_empty()
    }
}
