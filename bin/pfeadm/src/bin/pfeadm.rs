// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

use std::fs;
use std::io;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use clap::Subcommand;

use pfe::api::API_VERSION;
use pfe::api::DEFAULT_DENY_PORT;
use pfe::api::FilterCfg;
use pfe::api::Ipv4Addr;
use pfe::api::MAJOR_VERSION;
use pfe::print::print_blocklist;
use pfe::print::print_decisions_into;
use pfe::print::print_stats;
use pfeadm::DEFAULT_BLOCKLIST_PATH;
use pfeadm::PfeHdl;

/// Administer the Packet Filter Engine (PFE)
#[derive(Debug, Parser)]
#[command(version=pfe_pkg_version())]
struct Cli {
    /// The file holding the blocklist, one IPv4 address per line.
    #[arg(long, global = true, default_value = DEFAULT_BLOCKLIST_PATH)]
    blocklist: PathBuf,

    /// Discard TCP segments addressed to this port.
    #[arg(long, global = true, default_value_t = DEFAULT_DENY_PORT)]
    deny_port: u16,

    /// Print engine events as they happen.
    #[arg(long, global = true)]
    trace: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Block all traffic from an address.
    AddBlock { addr: Ipv4Addr },

    /// Stop blocking traffic from an address.
    RmBlock { addr: Ipv4Addr },

    /// List the blocked addresses.
    ListBlocked,

    /// Remove every blocked address.
    ClearBlocked,

    /// Run the frames of an Ethernet pcap file through the filter.
    Classify {
        pcap: PathBuf,

        /// Print the decision made for each frame.
        #[arg(short, long)]
        verbose: bool,
    },
}

fn pfe_pkg_version() -> String {
    format!("{MAJOR_VERSION}.{API_VERSION}")
}

fn classify(hdl: &PfeHdl, pcap: &PathBuf, verbose: bool) -> anyhow::Result<()> {
    let bytes = fs::read(pcap)
        .with_context(|| format!("failed to read {}", pcap.display()))?;
    let frames = pfeadm::read_capture(&bytes)?;
    let decisions = pfeadm::classify_frames(hdl, &frames);

    if verbose {
        print_decisions_into(&mut io::stdout(), &decisions)?;
        println!();
    }
    println!("{} frames", frames.len());
    print_stats(&hdl.dump_stats()?)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let hdl = PfeHdl::new(FilterCfg { deny_port: cli.deny_port }, cli.trace);

    let saved = pfeadm::read_blocklist(&cli.blocklist)?;
    hdl.set_blocklist(saved.clone())?;

    match cli.cmd {
        Command::AddBlock { addr } => {
            if saved.contains(&addr) {
                println!("{addr} is already blocked");
            } else {
                hdl.add_block(addr)?;
                println!("blocked {addr}");
            }
        }

        Command::RmBlock { addr } => {
            hdl.rem_block(addr)?;
            println!("unblocked {addr}");
        }

        Command::ListBlocked => {
            print_blocklist(&hdl.list_blocked()?)?;
        }

        Command::ClearBlocked => {
            let resp = hdl.clear_blocked()?;
            println!("cleared {} entries", resp.cleared);
        }

        Command::Classify { pcap, verbose } => {
            classify(&hdl, &pcap, verbose)?;
        }
    }

    let mut current = hdl.list_blocked()?.addrs;
    current.sort();
    let mut before = saved;
    before.sort();
    before.dedup();
    if current != before {
        pfeadm::write_blocklist(&cli.blocklist, &current)?;
    }

    Ok(())
}
