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
//! Description of a detected hijack, as handed over by the detection system.

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum HijackError {
    #[error("Cannot parse hijack information: {0}")]
    Json(#[from] serde_json::Error),
}

/// `{"prefix": "130.10.0.0/24"}`. Other keys of the event are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HijackDescriptor {
    pub prefix: Ipv4Net,
}

impl HijackDescriptor {
    pub fn from_json(s: &str) -> Result<Self, HijackError> {
        let descriptor: Self = serde_json::from_str(s)?;
        if descriptor.prefix != descriptor.prefix.trunc() {
            log::warn!(
                "Hijacked prefix {} has host bits set, using {}",
                descriptor.prefix,
                descriptor.prefix.trunc()
            );
        }
        Ok(descriptor)
    }

    /// The hijacked prefix, with host bits cleared.
    pub fn hijacked(&self) -> Ipv4Net {
        self.prefix.trunc()
    }
}
