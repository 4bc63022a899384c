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
//! End-to-end planning scenarios: snapshot and configuration are parsed through the real loaders,
//! then planned.

use ipnet::Ipv4Net;

use crate::{
    config::AdminConfig,
    index::PrefixIndex,
    topology::{TopologySource, TopologyStr},
    tunnel::TunnelCatalog,
};

/// Two routers of AS 65001 announce 130.10.0.0/24 on different interfaces. The first router also
/// announces the covering 130.10.0.0/20, and a third router in AS 65002 announces 140.0.0.0/16
/// without any matching interface.
pub const SNAPSHOT: &str = r#"
{
    "origin_as": [{"asn": 65001}],
    "bgp_router_id": [{"router_id": "192.168.10.1"}],
    "prefixes": [
        {"network": "130.10.0.0", "mask": "255.255.240.0"},
        {"network": "130.10.0.0", "mask": "255.255.255.0"}
    ],
    "interfaces": [
        {"interface_name": "GigabitEthernet0/0", "interface_ip": "10.0.0.1", "interface_mask": "255.255.255.252"},
        {"interface_name": "GigabitEthernet0/1", "interface_ip": "130.10.0.1", "interface_mask": "255.255.240.0"}
    ]
}
{
    "origin_as": [{"asn": 65001}],
    "bgp_router_id": [{"router_id": "192.168.10.2"}],
    "prefixes": [
        {"network": "130.10.0.0", "mask": "255.255.255.0"}
    ],
    "interfaces": [
        {"interface_name": "GigabitEthernet0/3", "interface_ip": "130.10.0.2", "interface_mask": "255.255.255.0"}
    ]
}
{
    "origin_as": [{"asn": 65002}],
    "bgp_router_id": [{"router_id": "192.168.20.1"}],
    "prefixes": [
        {"network": "140.0.0.0", "mask": "255.255.0.0"}
    ],
    "interfaces": []
}
"#;

pub const CONFIG: &str = r#"{
    "mitigation_playbook_path": "/root/mitigation_playbook.yaml",
    "tunnel_mitigation_playbook_path": "/root/tunnel_mitigation_playbook.yaml",
    "ansible_hosts_file_path": "/root/hosts",
    "bgp_results_path": "/root/results.json",
    "tunnel_definitions": {
        "hijacked_prefix": {
            "150.0.0.0/16": {
                "helperAS": {"asn": 65009, "router_id": "192.168.90.2", "tunnel_interface_name": "Tunnel9"}
            },
            "130.10.0.0/20": {
                "myAS": {"asn": 65001, "router_id": "192.168.10.1", "tunnel_interface_name": "Tunnel0"},
                "helperAS": {"asn": 65006, "router_id": "192.168.100.2", "tunnel_interface_name": "Tunnel0"}
            }
        }
    }
}"#;

pub fn net(s: &str) -> Ipv4Net {
    s.parse().unwrap()
}

pub fn index() -> PrefixIndex {
    PrefixIndex::build_from(&TopologyStr::new(SNAPSHOT)).unwrap()
}

pub fn config() -> AdminConfig {
    AdminConfig::from_json(CONFIG).unwrap()
}

pub fn catalog() -> TunnelCatalog {
    config().tunnel_catalog().clone()
}

#[test]
fn snapshot_index() {
    let index = index();
    assert_eq!(index.len(), 3);

    let entry = index.search_exact(&net("130.10.0.0/24")).unwrap();
    let bindings = entry
        .bindings
        .iter()
        .map(|b| (b.router_id.as_str(), b.interface.as_deref()))
        .collect::<Vec<_>>();
    assert_eq!(
        bindings,
        vec![
            ("192.168.10.1", Some("GigabitEthernet0/1")),
            ("192.168.10.2", Some("GigabitEthernet0/3")),
        ]
    );

    assert_eq!(index.unattributed().count(), 1);
}

#[test]
fn rebuilding_gives_the_same_index() {
    let source = TopologyStr::new(SNAPSHOT);
    let a = PrefixIndex::build(source.records().unwrap()).unwrap();
    let b = PrefixIndex::build(source.records().unwrap()).unwrap();
    assert_eq!(a, b);
}
