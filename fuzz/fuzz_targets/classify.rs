// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

// Copyright 2026 Oxide Computer Company

#![no_main]

use libfuzzer_sys::fuzz_target;
use pfe::api::FilterCfg;
use pfe::api::Ipv4Addr;
use pfe::api::Verdict;
use pfe::ddi::kstat::KStatProvider;
use pfe::engine::Filter;
use pfe::engine::Reason;
use pfe::engine::blocklist::AddrSet;
use pfe::engine::blocklist::insert_bounded;
use pfe::engine::stat::FilterStats;
use pfe::provider::NullLog;
use pfe::provider::Providers;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    let mut set = AddrSet::new();
    // The low bit of the destination MAC decides whether the frame's own
    // source is blocklisted, so both sides of the gate get exercised.
    let block_src = data.first().is_some_and(|b| b & 1 == 1);
    if let (true, Some(src)) = (block_src, data.get(26..30)) {
        let src = Ipv4Addr::from([src[0], src[1], src[2], src[3]]);
        assert_eq!(insert_bounded(&mut set, src), Ok(true));
    }

    let filter = Filter::new(
        FilterCfg::default(),
        set,
        Arc::new(FilterStats::default()),
        Providers { log: Box::new(NullLog) },
    );

    let d = filter.classify(data);
    let snap = filter.stats().snapshot();
    assert!(snap.allowed + snap.blocked <= 1);
    match d.reason {
        Reason::Blocklisted(_) => assert_eq!(d.verdict, Verdict::Discard),
        Reason::DenyPort(_) => assert_eq!(d.verdict, Verdict::Discard),
        _ => assert_eq!(d.verdict, Verdict::Admit),
    }
});
