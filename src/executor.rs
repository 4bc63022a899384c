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
//! Execution of planned mitigation actions.
//!
//! The planner only describes what must happen. An [`ActionExecutor`] turns a single action into
//! an effect on the network, e.g., by running an Ansible playbook against the target router.
//! [`dispatch`] runs a whole plan: actions on the same target are executed one after the other
//! (in plan order), while actions on different targets run in parallel. Failures are reported per
//! action and never retried.

use std::{
    io,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};

use itertools::Itertools;
use rayon::prelude::*;

use crate::{
    config::AdminConfig,
    plan::{MitigationAction, PrefixPayload, Target},
    prefix::PrefixInfo,
};

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Mitigation on {target} failed: {status}")]
    Failed { target: Target, status: ExitStatus },
    #[error("Cannot mitigate on {0}: the interface is unknown")]
    MissingInterface(Target),
}

/// Something that performs a single mitigation action.
pub trait ActionExecutor: Sync {
    fn execute(&self, action: &MitigationAction) -> Result<(), ExecutorError>;
}

/// Render the playbook variables for an action, in the form
/// `target=<asn>:&<router-id> asn=<asn> pr_cidr=... pr_network=... pr_netmask=... interface_name=...`.
///
/// Actions carrying both halves of a de-aggregated prefix use `pr1_*` and `pr2_*` instead of
/// `pr_*`.
pub fn extra_vars(action: &MitigationAction) -> Result<String, ExecutorError> {
    let target = &action.target;
    let interface = target
        .interface
        .as_deref()
        .ok_or_else(|| ExecutorError::MissingInterface(target.clone()))?;

    let prefixes = match &action.prefixes {
        PrefixPayload::Single(p) => prefix_vars("pr", p),
        PrefixPayload::Split(p1, p2) => {
            format!("{} {}", prefix_vars("pr1", p1), prefix_vars("pr2", p2))
        }
    };

    Ok(format!(
        "target={asn}:&{rid} asn={asn} {prefixes} interface_name={interface}",
        asn = target.asn,
        rid = target.router_id,
    ))
}

fn prefix_vars(name: &str, p: &PrefixInfo) -> String {
    format!(
        "{name}_cidr={} {name}_network={} {name}_netmask={}",
        p.cidr, p.network, p.netmask
    )
}

/// Runs `ansible-playbook` for every action. Single-prefix actions use the tunnel mitigation
/// playbook, de-aggregation actions use the mitigation playbook.
#[derive(Debug, Clone)]
pub struct AnsibleExecutor {
    program: PathBuf,
    hosts_file: PathBuf,
    tunnel_playbook: PathBuf,
    deaggregation_playbook: PathBuf,
}

impl AnsibleExecutor {
    pub fn new(
        hosts_file: impl AsRef<Path>,
        tunnel_playbook: impl AsRef<Path>,
        deaggregation_playbook: impl AsRef<Path>,
    ) -> Self {
        Self {
            program: PathBuf::from("ansible-playbook"),
            hosts_file: hosts_file.as_ref().to_path_buf(),
            tunnel_playbook: tunnel_playbook.as_ref().to_path_buf(),
            deaggregation_playbook: deaggregation_playbook.as_ref().to_path_buf(),
        }
    }

    pub fn from_config(config: &AdminConfig) -> Self {
        Self::new(
            &config.ansible_hosts_file_path,
            &config.tunnel_mitigation_playbook_path,
            &config.mitigation_playbook_path,
        )
    }

    /// Use a different executable than `ansible-playbook` from the `PATH`.
    pub fn with_program(mut self, program: impl AsRef<Path>) -> Self {
        self.program = program.as_ref().to_path_buf();
        self
    }

    pub fn playbook(&self, action: &MitigationAction) -> &Path {
        match action.prefixes {
            PrefixPayload::Single(_) => &self.tunnel_playbook,
            PrefixPayload::Split(..) => &self.deaggregation_playbook,
        }
    }

    /// Build the command for an action without running it.
    pub fn command(&self, action: &MitigationAction) -> Result<Command, ExecutorError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-i")
            .arg(&self.hosts_file)
            .arg(self.playbook(action))
            .arg("--extra-vars")
            .arg(extra_vars(action)?);
        Ok(cmd)
    }
}

impl ActionExecutor for AnsibleExecutor {
    fn execute(&self, action: &MitigationAction) -> Result<(), ExecutorError> {
        let mut cmd = self.command(action)?;
        log::info!("Executing {action}");
        log::debug!("Running {cmd:?}");
        let status = cmd.status()?;
        if status.success() {
            Ok(())
        } else {
            Err(ExecutorError::Failed {
                target: action.target.clone(),
                status,
            })
        }
    }
}

/// Only logs what would be executed.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

impl ActionExecutor for DryRunExecutor {
    fn execute(&self, action: &MitigationAction) -> Result<(), ExecutorError> {
        let vars = extra_vars(action)?;
        log::info!("[dry-run] {action}");
        log::info!("[dry-run] --extra-vars \"{vars}\"");
        Ok(())
    }
}

/// Execute all actions. Actions with the same target run sequentially in the given order; groups
/// of different targets run concurrently. The results are returned in the order of `actions`.
pub fn dispatch<E>(actions: &[MitigationAction], executor: &E) -> Vec<Result<(), ExecutorError>>
where
    E: ActionExecutor + ?Sized,
{
    let groups = actions
        .iter()
        .enumerate()
        .into_group_map_by(|&(_, action)| &action.target);
    log::debug!(
        "Dispatching {} actions on {} targets",
        actions.len(),
        groups.len()
    );

    let mut results = groups
        .into_par_iter()
        .flat_map_iter(|(_, group)| {
            group
                .into_iter()
                .map(|(i, action)| (i, executor.execute(action)))
                .collect::<Vec<_>>()
        })
        .collect::<Vec<_>>();
    results.sort_by_key(|(i, _)| *i);

    results
        .into_iter()
        .map(|(i, result)| {
            if let Err(e) = &result {
                log::error!("Action {i} ({}) failed: {e}", actions[i]);
            }
            result
        })
        .collect()
}
