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
//! Mitigation planner.
//!
//! Given a hijacked prefix, the prefix index of the own network, and the tunnel catalog, compute
//! which routers must act, and how:
//!
//! - **Tunnel**: if the hijacked prefix has the tunnel prefix length (`/24` by default), every
//!   router currently routing the prefix redirects its traffic, and the helper AS of the first
//!   covering tunnel definition redirects the traffic into its tunnel.
//! - **De-aggregation**: otherwise, every router currently routing the prefix announces both
//!   halves of it, each one bit more specific than the hijacked prefix.
//!
//! The routers "currently routing the prefix" are the bindings of the longest-prefix match of the
//! hijacked network address. Actions are returned in the order of these bindings.
//!
//! Planning is a pure function. Nothing is executed here; see [`crate::executor`].

use std::fmt;

use ipnet::Ipv4Net;
use serde::{Deserialize, Serialize};

use crate::{
    config::MitigationPolicy,
    index::{PrefixBinding, PrefixIndex},
    prefix::{self, PrefixInfo},
    topology::Asn,
    tunnel::{TunnelCatalog, TunnelEndpoint},
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanError {
    #[error("No prefix in the index covers the hijacked prefix {0}")]
    NoRouteFound(Ipv4Net),
    #[error("Cannot de-aggregate {0} any further")]
    CannotDeaggregate(Ipv4Net),
}

/// Conditions that do not prevent a plan, but that the operator must know about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum PlanWarning {
    #[error("No tunnel definition covers {0}; the helper AS is not involved")]
    MissingTunnelDefinition(Ipv4Net),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    Tunnel,
    Deaggregation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    /// Performed by a router of the own network that currently routes the hijacked prefix.
    PrimaryRedirect,
    /// Performed by the helper AS at the remote end of the tunnel.
    HelperRedirect,
}

/// Router (and interface) on which an action is performed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Target {
    pub asn: Asn,
    pub router_id: String,
    pub interface: Option<String>,
}

impl From<&PrefixBinding> for Target {
    fn from(b: &PrefixBinding) -> Self {
        Self {
            asn: b.asn,
            router_id: b.router_id.clone(),
            interface: b.interface.clone(),
        }
    }
}

impl From<&TunnelEndpoint> for Target {
    fn from(e: &TunnelEndpoint) -> Self {
        Self {
            asn: e.asn,
            router_id: e.router_id.clone(),
            interface: Some(e.tunnel_interface_name.clone()),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AS{} {} [{}]",
            self.asn,
            self.router_id,
            self.interface.as_deref().unwrap_or("?")
        )
    }
}

/// Prefixes an action is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrefixPayload {
    /// The hijacked prefix itself (tunnel strategy).
    Single(PrefixInfo),
    /// The two halves of the hijacked prefix (de-aggregation), lower half first.
    Split(PrefixInfo, PrefixInfo),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MitigationAction {
    pub kind: ActionKind,
    pub target: Target,
    pub prefixes: PrefixPayload,
}

impl fmt::Display for MitigationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} on {}: ", self.kind, self.target)?;
        match &self.prefixes {
            PrefixPayload::Single(p) => write!(f, "{}", p.cidr),
            PrefixPayload::Split(a, b) => write!(f, "{} + {}", a.cidr, b.cidr),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MitigationPlan {
    pub hijacked: Ipv4Net,
    pub strategy: Strategy,
    pub actions: Vec<MitigationAction>,
    pub warnings: Vec<PlanWarning>,
}

impl MitigationPlan {
    pub fn primary_actions(&self) -> impl Iterator<Item = &MitigationAction> {
        self.actions
            .iter()
            .filter(|a| a.kind == ActionKind::PrimaryRedirect)
    }

    pub fn helper_actions(&self) -> impl Iterator<Item = &MitigationAction> {
        self.actions
            .iter()
            .filter(|a| a.kind == ActionKind::HelperRedirect)
    }
}

/// Compute the mitigation plan for `hijacked`. Host bits of `hijacked` are ignored.
pub fn plan(
    hijacked: Ipv4Net,
    index: &PrefixIndex,
    tunnels: &TunnelCatalog,
    policy: &MitigationPolicy,
) -> Result<MitigationPlan, PlanError> {
    let hijacked = hijacked.trunc();
    let strategy = policy.strategy(&hijacked);
    log::info!("Planning {strategy:?} mitigation for {hijacked}");

    let mut plan = MitigationPlan {
        hijacked,
        strategy,
        actions: Vec::new(),
        warnings: Vec::new(),
    };
    match strategy {
        Strategy::Tunnel => plan_tunnel(&mut plan, index, tunnels)?,
        Strategy::Deaggregation => plan_deaggregation(&mut plan, index)?,
    }

    log::debug!(
        "{} actions planned for {hijacked}: {:#?}",
        plan.actions.len(),
        plan.actions
    );
    Ok(plan)
}

/// Bindings of the longest-prefix match of the hijacked network address.
fn routing_bindings(
    hijacked: Ipv4Net,
    index: &PrefixIndex,
) -> Result<&[PrefixBinding], PlanError> {
    let entry = index
        .search_best(hijacked.network())
        .ok_or(PlanError::NoRouteFound(hijacked))?;
    log::debug!(
        "{hijacked} is routed as {} by {} router(s)",
        entry.prefix,
        entry.bindings.len()
    );
    Ok(&entry.bindings)
}

fn plan_tunnel(
    plan: &mut MitigationPlan,
    index: &PrefixIndex,
    tunnels: &TunnelCatalog,
) -> Result<(), PlanError> {
    let hijacked = plan.hijacked;
    let info = PrefixInfo::from(hijacked);

    plan.actions.extend(
        routing_bindings(hijacked, index)?
            .iter()
            .map(|b| MitigationAction {
                kind: ActionKind::PrimaryRedirect,
                target: b.into(),
                prefixes: PrefixPayload::Single(info),
            }),
    );

    match tunnels.find(&hijacked) {
        Some((covering, def)) => {
            log::debug!("Using tunnel definition of {covering} for {hijacked}");
            plan.actions.push(MitigationAction {
                kind: ActionKind::HelperRedirect,
                target: (&def.helper_as).into(),
                prefixes: PrefixPayload::Single(info),
            });
        }
        None => {
            let warning = PlanWarning::MissingTunnelDefinition(hijacked);
            log::warn!("{warning}");
            plan.warnings.push(warning);
        }
    }
    Ok(())
}

fn plan_deaggregation(plan: &mut MitigationPlan, index: &PrefixIndex) -> Result<(), PlanError> {
    let hijacked = plan.hijacked;
    let (low, high) = prefix::split(&hijacked).ok_or(PlanError::CannotDeaggregate(hijacked))?;
    let payload = PrefixPayload::Split(low.into(), high.into());

    // attribution uses the aggregate, which is what the network routes today
    plan.actions.extend(
        routing_bindings(hijacked, index)?
            .iter()
            .map(|b| MitigationAction {
                kind: ActionKind::PrimaryRedirect,
                target: b.into(),
                prefixes: payload,
            }),
    );
    Ok(())
}
