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
//! Router snapshots as exported by the configuration parsers, and the sources they are read from.
//!
//! A snapshot holds one JSON object per router, written back to back into a single document:
//!
//! ```json
//! {"origin_as": [{"asn": 65001}], "bgp_router_id": [{"router_id": "192.168.10.1"}],
//!  "prefixes": [{"network": "130.10.0.0", "mask": "255.255.255.0"}],
//!  "interfaces": [{"interface_name": "Gi0/1", "interface_ip": "130.10.0.1", "interface_mask": "255.255.240.0"}]}
//! ```

use std::{
    io,
    net::Ipv4Addr,
    path::{Path, PathBuf},
};

use ipnet::Ipv4Net;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};

use hijack_utils::json_stream::{JsonFile, JsonStr};

use crate::prefix;

/// Autonomous system number.
pub type Asn = u32;

#[derive(Debug, thiserror::Error)]
pub enum TopologyError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Router record is missing `{0}`")]
    MissingField(&'static str),
}

/// A prefix announced by a router, exactly as written in the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnouncedPrefix {
    pub network: String,
    pub mask: String,
}

impl AnnouncedPrefix {
    pub fn new(network: impl Into<String>, mask: impl Into<String>) -> Self {
        Self {
            network: network.into(),
            mask: mask.into(),
        }
    }

    /// The normalized CIDR block, or `None` if either field is malformed.
    pub fn cidr(&self) -> Option<Ipv4Net> {
        parse_cidr(&self.network, &self.mask)
    }
}

/// A local interface of a router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    #[serde(rename = "interface_name", alias = "interfaceName")]
    pub name: String,
    #[serde(rename = "interface_ip", alias = "interfaceIp")]
    pub ip: String,
    #[serde(rename = "interface_mask", alias = "interfaceMask")]
    pub mask: String,
}

impl Interface {
    pub fn new(name: impl Into<String>, ip: impl Into<String>, mask: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ip: ip.into(),
            mask: mask.into(),
        }
    }

    /// The local network of this interface, or `None` if either field is malformed.
    pub fn network(&self) -> Option<Ipv4Net> {
        parse_cidr(&self.ip, &self.mask)
    }
}

fn parse_cidr(addr: &str, mask: &str) -> Option<Ipv4Net> {
    let addr: Ipv4Addr = addr.trim().parse().ok()?;
    let mask: Ipv4Addr = mask.trim().parse().ok()?;
    prefix::normalize(addr, mask)
}

/// BGP configuration of a single router: its AS, its router-id, the prefixes it announces and its
/// local interfaces. Both lists keep the order of the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawRouterRecord")]
pub struct RouterRecord {
    pub origin_as: Asn,
    pub router_id: String,
    pub prefixes: Vec<AnnouncedPrefix>,
    pub interfaces: Vec<Interface>,
}

impl RouterRecord {
    /// Find the interface through which `prefix` is reached: the first interface (in snapshot
    /// order) whose local network contains the whole prefix.
    pub fn attribute(&self, prefix: &Ipv4Net) -> Option<&Interface> {
        self.interfaces.iter().find(|iface| match iface.network() {
            Some(net) => prefix::covers(&net, prefix),
            None => {
                log::warn!(
                    "Ignoring interface {} of router {}: invalid address {}/{}",
                    iface.name,
                    self.router_id,
                    iface.ip,
                    iface.mask
                );
                false
            }
        })
    }
}

/// Shape of a router record in the snapshot, where AS and router-id are wrapped in lists.
#[derive(Deserialize)]
struct RawRouterRecord {
    #[serde(alias = "originAS")]
    origin_as: Vec<RawAsn>,
    #[serde(alias = "bgpRouterId")]
    bgp_router_id: Vec<RawRouterId>,
    #[serde(default)]
    prefixes: Vec<AnnouncedPrefix>,
    #[serde(default)]
    interfaces: Vec<Interface>,
}

#[derive(Deserialize)]
struct RawAsn {
    #[serde(deserialize_with = "deserialize_asn")]
    asn: Asn,
}

#[derive(Deserialize)]
struct RawRouterId {
    #[serde(alias = "routerId")]
    router_id: String,
}

impl TryFrom<RawRouterRecord> for RouterRecord {
    type Error = TopologyError;

    fn try_from(raw: RawRouterRecord) -> Result<Self, Self::Error> {
        let origin_as = raw
            .origin_as
            .first()
            .ok_or(TopologyError::MissingField("origin_as"))?
            .asn;
        let router_id = raw
            .bgp_router_id
            .into_iter()
            .next()
            .ok_or(TopologyError::MissingField("bgp_router_id"))?
            .router_id;
        Ok(Self {
            origin_as,
            router_id,
            prefixes: raw.prefixes,
            interfaces: raw.interfaces,
        })
    }
}

/// Deserialize an AS number given either as a JSON number or as a string (`"65001"`).
pub(crate) fn deserialize_asn<'de, D: Deserializer<'de>>(de: D) -> Result<Asn, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum AsnRepr {
        Num(Asn),
        Str(String),
    }

    match AsnRepr::deserialize(de)? {
        AsnRepr::Num(asn) => Ok(asn),
        AsnRepr::Str(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid AS number {s:?}"))),
    }
}

/// Something that yields the router records of one topology snapshot. Every call to `records`
/// starts a fresh pass over the snapshot; records are decoded lazily.
pub trait TopologySource {
    fn records(
        &self,
    ) -> Result<impl Iterator<Item = Result<RouterRecord, TopologyError>> + '_, TopologyError>;
}

/// Snapshot stored in a file.
#[derive(Debug, Clone)]
pub struct TopologyFile(JsonFile<RouterRecord>);

impl TopologyFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self(JsonFile::new(path))
    }

    pub fn path(&self) -> PathBuf {
        self.0.path().to_path_buf()
    }
}

impl TopologySource for TopologyFile {
    fn records(
        &self,
    ) -> Result<impl Iterator<Item = Result<RouterRecord, TopologyError>> + '_, TopologyError>
    {
        Ok(self.0.iter()?.map(|r| r.map_err(TopologyError::from)))
    }
}

/// Snapshot held in memory.
#[derive(Debug, Clone, Copy)]
pub struct TopologyStr<'a>(JsonStr<'a, RouterRecord>);

impl<'a> TopologyStr<'a> {
    pub fn new(document: &'a str) -> Self {
        Self(JsonStr::new(document))
    }
}

impl TopologySource for TopologyStr<'_> {
    fn records(
        &self,
    ) -> Result<impl Iterator<Item = Result<RouterRecord, TopologyError>> + '_, TopologyError>
    {
        Ok(self.0.iter().map(|r| r.map_err(TopologyError::from)))
    }
}
