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
//! Prefix index over the prefixes announced in a topology snapshot.
//!
//! Every entry maps a normalized CIDR block to the list of routers announcing it, in the order in
//! which the announcements were read. The index supports exact lookups and longest-prefix-match
//! lookups for a single address. It is built once per snapshot and never changed afterwards.

use std::{convert::Infallible, fmt, net::Ipv4Addr};

use ipnet::Ipv4Net;
use prefix_trie::PrefixMap;
use serde::{Deserialize, Serialize};

use crate::topology::{Asn, RouterRecord, TopologyError, TopologySource};

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("Router {router_id} announces an invalid prefix {network} with mask {mask}")]
    InvalidPrefix {
        router_id: String,
        network: String,
        mask: String,
    },
    #[error("Topology error: {0}")]
    Topology(#[from] TopologyError),
}

impl From<Infallible> for IndexError {
    fn from(x: Infallible) -> Self {
        match x {}
    }
}

/// A router that announces a prefix, together with the local interface through which it reaches
/// the prefix. `interface` is `None` if no interface of the router covers the prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrefixBinding {
    pub asn: Asn,
    pub router_id: String,
    pub interface: Option<String>,
}

/// All bindings of a single prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefixEntry {
    pub prefix: Ipv4Net,
    /// Bindings in announcement order. Several routers announcing the same prefix are all kept.
    pub bindings: Vec<PrefixBinding>,
}

#[derive(Clone)]
pub struct PrefixIndex {
    trie: PrefixMap<Ipv4Net, PrefixEntry>,
    /// prefixes in order of their first announcement
    order: Vec<Ipv4Net>,
}

impl Default for PrefixIndex {
    fn default() -> Self {
        Self {
            trie: PrefixMap::new(),
            order: Vec::new(),
        }
    }
}

impl PartialEq for PrefixIndex {
    fn eq(&self, other: &Self) -> bool {
        self.iter().eq(other.iter())
    }
}

impl Eq for PrefixIndex {}

impl fmt::Debug for PrefixIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl PrefixIndex {
    /// Build the index from a sequence of router records.
    ///
    /// The records are processed in order, and so are the prefixes of each record. The first
    /// error (either from the record sequence itself or from a malformed prefix) aborts the whole
    /// build; no partial index is ever returned.
    pub fn build<I, E>(records: I) -> Result<Self, IndexError>
    where
        I: IntoIterator<Item = Result<RouterRecord, E>>,
        IndexError: From<E>,
    {
        let mut index = Self::default();
        let mut num_routers = 0;
        for record in records {
            index.add_router(&record?)?;
            num_routers += 1;
        }
        log::debug!(
            "Built prefix index with {} prefixes from {num_routers} routers",
            index.len()
        );
        Ok(index)
    }

    /// Build the index from records that are already in memory.
    pub fn from_records<'a>(
        records: impl IntoIterator<Item = &'a RouterRecord>,
    ) -> Result<Self, IndexError> {
        Self::build(records.into_iter().cloned().map(Ok::<_, Infallible>))
    }

    /// Build the index from a full pass over a topology source.
    pub fn build_from(source: &impl TopologySource) -> Result<Self, IndexError> {
        Self::build(source.records()?)
    }

    fn add_router(&mut self, record: &RouterRecord) -> Result<(), IndexError> {
        for announced in record.prefixes.iter() {
            let prefix = announced.cidr().ok_or_else(|| IndexError::InvalidPrefix {
                router_id: record.router_id.clone(),
                network: announced.network.clone(),
                mask: announced.mask.clone(),
            })?;

            let interface = record.attribute(&prefix).map(|iface| iface.name.clone());
            if interface.is_none() {
                log::warn!(
                    "No interface of router {} (AS{}) covers {prefix}",
                    record.router_id,
                    record.origin_as
                );
            }
            log::trace!(
                "{prefix} announced by {} (AS{}) via {interface:?}",
                record.router_id,
                record.origin_as
            );

            self.insert(
                prefix,
                PrefixBinding {
                    asn: record.origin_as,
                    router_id: record.router_id.clone(),
                    interface,
                },
            );
        }
        Ok(())
    }

    fn insert(&mut self, prefix: Ipv4Net, binding: PrefixBinding) {
        match self.trie.get_mut(&prefix) {
            Some(entry) => entry.bindings.push(binding),
            None => {
                self.order.push(prefix);
                self.trie.insert(
                    prefix,
                    PrefixEntry {
                        prefix,
                        bindings: vec![binding],
                    },
                );
            }
        }
    }

    /// Get the entry stored for exactly this prefix. Host bits of `prefix` are ignored.
    pub fn search_exact(&self, prefix: &Ipv4Net) -> Option<&PrefixEntry> {
        self.trie.get(&prefix.trunc())
    }

    /// Longest-prefix match: among all stored prefixes containing `addr`, return the one with the
    /// greatest prefix length.
    pub fn search_best(&self, addr: Ipv4Addr) -> Option<&PrefixEntry> {
        let host = Ipv4Net::new(addr, 32).ok()?;
        self.trie.get_lpm(&host).map(|(_, entry)| entry)
    }

    /// Number of distinct prefixes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterate over all entries in the order in which their prefix was first announced.
    pub fn iter(&self) -> impl Iterator<Item = &PrefixEntry> {
        self.order.iter().filter_map(|prefix| self.trie.get(prefix))
    }

    /// All bindings for which no covering interface was found.
    pub fn unattributed(&self) -> impl Iterator<Item = (&Ipv4Net, &PrefixBinding)> {
        self.iter().flat_map(|entry| {
            entry
                .bindings
                .iter()
                .filter(|b| b.interface.is_none())
                .map(move |b| (&entry.prefix, b))
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::topology::{AnnouncedPrefix, Interface, TopologyStr};

    fn net(s: &str) -> Ipv4Net {
        s.parse().unwrap()
    }

    fn router(
        asn: Asn,
        rid: &str,
        prefixes: &[(&str, &str)],
        ifaces: &[(&str, &str, &str)],
    ) -> RouterRecord {
        RouterRecord {
            origin_as: asn,
            router_id: rid.to_string(),
            prefixes: prefixes
                .iter()
                .map(|(n, m)| AnnouncedPrefix::new(*n, *m))
                .collect(),
            interfaces: ifaces
                .iter()
                .map(|(name, ip, mask)| Interface::new(*name, *ip, *mask))
                .collect(),
        }
    }

    /// Nested prefixes inside 130.10.0.0/21, all announced by one router.
    fn lab_index() -> PrefixIndex {
        let prefixes = [
            ("130.10.0.0", "255.255.248.0"),
            ("130.10.0.0", "255.255.254.0"),
            ("130.10.2.0", "255.255.254.0"),
            ("130.10.0.0", "255.255.255.0"),
            ("130.10.1.0", "255.255.255.0"),
            ("130.10.3.0", "255.255.255.0"),
        ];
        let r = router(
            65001,
            "192.168.10.1",
            &prefixes,
            &[("Gi0/1", "130.10.0.1", "255.255.240.0")],
        );
        PrefixIndex::from_records([&r]).unwrap()
    }

    #[test]
    fn longest_match() {
        let index = lab_index();
        assert_eq!(index.len(), 6);

        let best = |a: &str| index.search_best(a.parse().unwrap()).map(|e| e.prefix);
        assert_eq!(best("130.10.2.0"), Some(net("130.10.2.0/23")));
        assert_eq!(best("130.10.3.7"), Some(net("130.10.3.0/24")));
        assert_eq!(best("130.10.0.200"), Some(net("130.10.0.0/24")));
        assert_eq!(best("130.10.1.1"), Some(net("130.10.1.0/24")));
        assert_eq!(best("130.10.5.1"), Some(net("130.10.0.0/21")));
        assert_eq!(best("130.10.8.0"), None);
        assert_eq!(best("8.8.8.8"), None);
    }

    #[test]
    fn longest_match_agrees_with_linear_scan() {
        let index = lab_index();
        for third in 0..=9u8 {
            for last in [0u8, 1, 127, 255] {
                let addr = Ipv4Addr::new(130, 10, third, last);
                let expected = index
                    .iter()
                    .filter(|e| e.prefix.contains(&addr))
                    .max_by_key(|e| e.prefix.prefix_len())
                    .map(|e| e.prefix);
                assert_eq!(index.search_best(addr).map(|e| e.prefix), expected);
            }
        }
    }

    #[test]
    fn default_route() {
        let r = router(1, "1.1.1.1", &[("0.0.0.0", "0.0.0.0")], &[]);
        let index = PrefixIndex::from_records([&r]).unwrap();
        assert_eq!(
            index.search_best(Ipv4Addr::new(200, 1, 2, 3)).unwrap().prefix,
            net("0.0.0.0/0")
        );
    }

    #[test]
    fn shared_between_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PrefixIndex>();

        let index = std::sync::Arc::new(lab_index());
        let handles = (0..4u8)
            .map(|i| {
                let index = index.clone();
                std::thread::spawn(move || {
                    index
                        .search_best(Ipv4Addr::new(130, 10, i, 1))
                        .map(|e| e.prefix)
                })
            })
            .collect::<Vec<_>>();
        let found = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .collect::<Vec<_>>();
        assert_eq!(
            found,
            vec![
                Some(net("130.10.0.0/24")),
                Some(net("130.10.1.0/24")),
                Some(net("130.10.2.0/23")),
                Some(net("130.10.3.0/24")),
            ]
        );
    }

    #[test]
    fn exact_match() {
        let index = lab_index();
        assert!(index.search_exact(&net("130.10.0.0/23")).is_some());
        assert!(index.search_exact(&net("130.10.0.5/23")).is_some());
        assert!(index.search_exact(&net("130.10.0.0/22")).is_none());
    }

    #[test]
    fn bindings_are_kept_in_order() {
        let r1 = router(
            65001,
            "192.168.10.1",
            &[("130.10.0.0", "255.255.255.0")],
            &[("Gi0/1", "130.10.0.1", "255.255.255.0")],
        );
        let r2 = router(
            65002,
            "192.168.20.1",
            &[("130.10.0.0", "255.255.255.0")],
            &[("Gi0/7", "130.10.0.2", "255.255.252.0")],
        );
        let index = PrefixIndex::from_records([&r1, &r2]).unwrap();
        assert_eq!(index.len(), 1);
        let entry = index.search_exact(&net("130.10.0.0/24")).unwrap();
        assert_eq!(
            entry.bindings,
            vec![
                PrefixBinding {
                    asn: 65001,
                    router_id: "192.168.10.1".to_string(),
                    interface: Some("Gi0/1".to_string()),
                },
                PrefixBinding {
                    asn: 65002,
                    router_id: "192.168.20.1".to_string(),
                    interface: Some("Gi0/7".to_string()),
                },
            ]
        );

        // the same router announcing twice is recorded twice
        let index = PrefixIndex::from_records([&r1, &r2, &r1]).unwrap();
        let entry = index.search_exact(&net("130.10.0.0/24")).unwrap();
        assert_eq!(entry.bindings.len(), 3);
        assert_eq!(entry.bindings[2].router_id, "192.168.10.1");
    }

    #[test]
    fn build_is_deterministic() {
        let r1 = router(
            1,
            "1.1.1.1",
            &[("10.0.0.0", "255.0.0.0"), ("10.1.0.0", "255.255.0.0")],
            &[("eth0", "10.0.0.1", "255.0.0.0")],
        );
        let r2 = router(2, "2.2.2.2", &[("10.1.0.0", "255.255.0.0")], &[]);
        let a = PrefixIndex::from_records([&r1, &r2]).unwrap();
        let b = PrefixIndex::from_records([&r1, &r2]).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            a.iter().map(|e| e.prefix).collect::<Vec<_>>(),
            vec![net("10.0.0.0/8"), net("10.1.0.0/16")]
        );
    }

    #[test]
    fn missing_interface_is_recorded() {
        let r = router(
            65001,
            "192.168.10.1",
            &[("130.10.0.0", "255.255.255.0"), ("140.0.0.0", "255.255.0.0")],
            &[("Gi0/1", "130.10.0.1", "255.255.255.0")],
        );
        let index = PrefixIndex::from_records([&r]).unwrap();
        assert_eq!(index.len(), 2);
        let entry = index.search_exact(&net("140.0.0.0/16")).unwrap();
        assert_eq!(entry.bindings[0].interface, None);

        let unattributed = index.unattributed().collect::<Vec<_>>();
        assert_eq!(unattributed.len(), 1);
        assert_eq!(*unattributed[0].0, net("140.0.0.0/16"));
    }

    #[test]
    fn invalid_prefix_aborts_build() {
        let good = router(1, "1.1.1.1", &[("10.0.0.0", "255.0.0.0")], &[]);
        let bad = router(2, "2.2.2.2", &[("10.1.0.0", "255.0.255.0")], &[]);
        match PrefixIndex::from_records([&good, &bad]) {
            Err(IndexError::InvalidPrefix {
                router_id,
                network,
                mask,
            }) => {
                assert_eq!(router_id, "2.2.2.2");
                assert_eq!(network, "10.1.0.0");
                assert_eq!(mask, "255.0.255.0");
            }
            x => panic!("unexpected result: {x:?}"),
        }
    }

    #[test]
    fn loader_error_aborts_build() {
        let doc = r#"{"origin_as": [{"asn": 1}], "bgp_router_id": [{"router_id": "1.1.1.1"}],
                      "prefixes": [{"network": "10.0.0.0", "mask": "255.0.0.0"}]}
                     {"origin_as": "#;
        assert!(matches!(
            PrefixIndex::build_from(&TopologyStr::new(doc)),
            Err(IndexError::Topology(TopologyError::Json(_)))
        ));
    }
}
