// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

//! Print command responses in human-friendly manner.
//!
//! This is mostly just a place to hang printing routines so that they
//! can be used by both pfeadm and integration tests.

use crate::api::CounterId;
use crate::api::DumpStatsResp;
use crate::api::ListBlockedResp;
use std::io::Write;
use tabwriter::TabWriter;

#[cfg(feature = "engine")]
use crate::engine::Decision;

/// Print a [`DumpStatsResp`].
pub fn print_stats(resp: &DumpStatsResp) -> std::io::Result<()> {
    print_stats_into(&mut std::io::stdout(), resp)
}

/// Print a [`DumpStatsResp`] into a given writer.
pub fn print_stats_into(
    writer: &mut impl Write,
    resp: &DumpStatsResp,
) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);
    writeln!(t, "COUNTER\tVALUE")?;
    for id in CounterId::ALL {
        writeln!(t, "{}\t{}", id, resp.stats.get(id))?;
    }
    t.flush()
}

/// Print a [`ListBlockedResp`].
pub fn print_blocklist(resp: &ListBlockedResp) -> std::io::Result<()> {
    print_blocklist_into(&mut std::io::stdout(), resp)
}

/// Print a [`ListBlockedResp`] into a given writer.
pub fn print_blocklist_into(
    writer: &mut impl Write,
    resp: &ListBlockedResp,
) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);
    writeln!(t, "Blocklist: {}/{}", resp.addrs.len(), resp.capacity)?;
    write_hr(&mut t)?;

    let mut addrs = resp.addrs.clone();
    addrs.sort();
    for addr in addrs {
        writeln!(t, "{addr}")?;
    }
    t.flush()
}

/// Print the header for [`print_decision()`].
#[cfg(feature = "engine")]
pub fn print_decision_header(t: &mut impl Write) -> std::io::Result<()> {
    writeln!(t, "FRAME\tLEN\tVERDICT\tREASON")
}

/// Print one frame's [`Decision`].
#[cfg(feature = "engine")]
pub fn print_decision(
    t: &mut impl Write,
    idx: usize,
    len: usize,
    decision: &Decision,
) -> std::io::Result<()> {
    writeln!(t, "{}\t{}\t{}\t{}", idx, len, decision.verdict, decision.reason)
}

/// Print a list of frame decisions into a given writer.
#[cfg(feature = "engine")]
pub fn print_decisions_into(
    writer: &mut impl Write,
    decisions: &[(usize, Decision)],
) -> std::io::Result<()> {
    let mut t = TabWriter::new(writer);
    print_decision_header(&mut t)?;
    for (idx, (len, d)) in decisions.iter().enumerate() {
        print_decision(&mut t, idx, *len, d)?;
    }
    t.flush()
}

/// Print a horizontal rule.
pub fn write_hr(t: &mut impl Write) -> std::io::Result<()> {
    writeln!(t, "{:-<70}", "-")
}
