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
use std::{fs, path::PathBuf};

use clap::Parser;

use hijack_mitigation::{prelude::*, util};

#[derive(Parser, Debug)]
#[command(author, version, about)] // get author/version information from Cargo.toml
struct Args {
    /// Hijack event information, e.g., `{"prefix": "130.10.0.0/24"}`
    #[arg(short, long)]
    info_hijack: String,
    /// Administrative configuration file
    #[arg(short, long, default_value = "/root/admin_configs.json")]
    config: PathBuf,
    /// Prefix length that is mitigated by tunneling (overrides the configuration)
    #[arg(long)]
    tunnel_prefix_len: Option<u8>,
    /// Only log the playbook invocations instead of running them
    #[arg(long)]
    dry_run: bool,
    /// Write the computed plan as JSON to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    util::init_logging();
    let args = Args::parse();

    let config = AdminConfig::load(&args.config)?;
    let policy = match args.tunnel_prefix_len {
        Some(len) => MitigationPolicy::new(len)?,
        None => config.policy()?,
    };
    let hijack = HijackDescriptor::from_json(&args.info_hijack)?;

    let topology = TopologyFile::new(&config.bgp_results_path);
    let index = PrefixIndex::build_from(&topology)?;
    log::info!(
        "Loaded {} prefixes from {:?}",
        index.len(),
        topology.path()
    );

    let plan = plan(hijack.hijacked(), &index, config.tunnel_catalog(), &policy)?;

    if let Some(output) = args.output {
        fs::write(&output, serde_json::to_string_pretty(&plan)?)?;
        log::info!("Plan written to {output:?}");
    }

    let results = if args.dry_run {
        dispatch(&plan.actions, &DryRunExecutor)
    } else {
        dispatch(&plan.actions, &AnsibleExecutor::from_config(&config))
    };

    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        return Err(format!(
            "{failed} of {} mitigation actions for {} failed",
            results.len(),
            plan.hijacked
        )
        .into());
    }
    log::info!(
        "Mitigation of {} done: {} actions, {} warnings",
        plan.hijacked,
        plan.actions.len(),
        plan.warnings.len()
    );
    Ok(())
}
