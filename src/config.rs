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
//! Administrative configuration of the mitigation service and the policy derived from it.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

use crate::{plan::Strategy, tunnel::TunnelCatalog};

/// Hijacked prefixes of exactly this length are mitigated by tunneling, unless configured
/// otherwise. Prefixes of any other length are de-aggregated.
pub const DEFAULT_TUNNEL_PREFIX_LEN: u8 = 24;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid tunnel prefix length /{0}")]
    InvalidPrefixLen(u8),
}

/// Policy used by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MitigationPolicy {
    tunnel_prefix_len: u8,
}

impl MitigationPolicy {
    pub fn new(tunnel_prefix_len: u8) -> Result<Self, ConfigError> {
        if tunnel_prefix_len > 32 {
            return Err(ConfigError::InvalidPrefixLen(tunnel_prefix_len));
        }
        Ok(Self { tunnel_prefix_len })
    }

    pub fn tunnel_prefix_len(&self) -> u8 {
        self.tunnel_prefix_len
    }

    /// Select the strategy for a hijacked prefix. Only its length matters.
    pub fn strategy(&self, hijacked: &Ipv4Net) -> Strategy {
        if hijacked.prefix_len() == self.tunnel_prefix_len {
            Strategy::Tunnel
        } else {
            Strategy::Deaggregation
        }
    }
}

impl Default for MitigationPolicy {
    fn default() -> Self {
        Self {
            tunnel_prefix_len: DEFAULT_TUNNEL_PREFIX_LEN,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TunnelDefinitions {
    #[serde(default)]
    pub hijacked_prefix: TunnelCatalog,
}

/// Content of the administrative configuration file. Keys not listed here are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Router snapshot produced by the configuration parsers
    pub bgp_results_path: PathBuf,
    pub ansible_hosts_file_path: PathBuf,
    /// Playbook run for tunnel mitigation
    pub tunnel_mitigation_playbook_path: PathBuf,
    /// Playbook run for de-aggregation
    pub mitigation_playbook_path: PathBuf,
    #[serde(default)]
    pub tunnel_definitions: TunnelDefinitions,
    #[serde(default = "_default_tunnel_prefix_len")]
    pub tunnel_prefix_len: u8,
}

const fn _default_tunnel_prefix_len() -> u8 {
    DEFAULT_TUNNEL_PREFIX_LEN
}

impl AdminConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        log::debug!("Loading configuration from {:?}", path.as_ref());
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s)?;
        // reject a bad threshold right away
        config.policy()?;
        Ok(config)
    }

    pub fn policy(&self) -> Result<MitigationPolicy, ConfigError> {
        MitigationPolicy::new(self.tunnel_prefix_len)
    }

    pub fn tunnel_catalog(&self) -> &TunnelCatalog {
        &self.tunnel_definitions.hijacked_prefix
    }
}
