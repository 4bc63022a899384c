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
//! Library for planning the mitigation of BGP prefix hijacks.
//!
//! The [`index::PrefixIndex`] is built from a topology snapshot of the own routers. For a
//! hijacked prefix, [`plan::plan`] selects the routers that must act and the strategy (tunneling
//! or de-aggregation). The resulting actions are carried out by an [`executor::ActionExecutor`].

pub mod config;
pub mod executor;
pub mod hijack;
pub mod index;
pub mod plan;
pub mod prefix;
pub mod topology;
pub mod tunnel;
pub mod util;

#[cfg(test)]
mod test;

pub mod prelude {
    pub use super::{
        config::{AdminConfig, MitigationPolicy},
        executor::{dispatch, ActionExecutor, AnsibleExecutor, DryRunExecutor},
        hijack::HijackDescriptor,
        index::{PrefixBinding, PrefixEntry, PrefixIndex},
        plan::{plan, ActionKind, MitigationAction, MitigationPlan, PlanWarning, Strategy},
        topology::{RouterRecord, TopologyFile, TopologySource, TopologyStr},
        tunnel::TunnelCatalog,
    };
}
