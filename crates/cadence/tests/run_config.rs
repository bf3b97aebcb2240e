//! Integration test: complete runs from JSON configuration.
//!
//! Covers the global and local time-stepping layouts, simulated
//! multi-process runs, receivers, and the setup-time failures that must
//! abort before any cluster steps.

use cadence::prelude::*;
use cadence::engine::ConfigError;
use cadence::setup;
use cadence_test_utils::RecordingReporter;

fn config(json: &str) -> RunConfig {
    RunConfig::from_json(json).unwrap()
}

// ── Global time stepping ─────────────────────────────────────────────

#[test]
fn advection_four_sync_points_twenty_updates() {
    // width 0.1, velocity 1, cfl 0.5: dt_global = 0.05.
    let c = config(
        r#"{ "end_time": 1.0, "wave_field_int": 0.25, "equation": "advection",
             "mesh": { "n_elements": 10, "x_min": 0.0, "x_max": 1.0 } }"#,
    );
    let reporter = RecordingReporter::new();
    let outcomes = setup::run(&c, &reporter).unwrap();
    assert_eq!(outcomes.len(), 1);
    let o = &outcomes[0];
    assert_eq!(o.negotiated.dt_global, 0.05);
    assert_eq!(o.report.update_counts, vec![(ClusterId(0), 20)]);
    assert_eq!(o.report.sync_points, 4);
    assert_eq!(o.report.final_time, 1.0);
    assert_eq!(reporter.sync_points.lock().unwrap().len(), 4);
    assert!(o.store.values().iter().all(|v| v.is_finite()));
}

#[test]
fn periodic_advection_conserves_mass() {
    let c = config(
        r#"{ "end_time": 0.5, "wave_field_int": 0.1, "equation": "advection",
             "mesh": { "n_elements": 50, "x_min": 0.0, "x_max": 1.0, "boundary": "periodic" } }"#,
    );
    let before: f64 = {
        let p = setup::Partition::new(&c, 0, 1);
        setup::build_store(&c, &p).unwrap().values().iter().sum()
    };
    let outcomes = setup::run(&c, &NullReporter).unwrap();
    let after: f64 = outcomes[0].store.values().iter().sum();
    assert!((before - after).abs() < 1e-10);
}

#[test]
fn elastic_and_shallow_water_stay_finite() {
    for equation in ["elastic", "shallow_water"] {
        let c = config(&format!(
            r#"{{ "end_time": 0.2, "wave_field_int": 0.05, "equation": "{equation}",
                 "threads": 2,
                 "mesh": {{ "n_elements": 40, "x_min": 0.0, "x_max": 1.0, "boundary": "reflect" }} }}"#
        ));
        let outcomes = setup::run(&c, &NullReporter).unwrap();
        assert!(outcomes[0].store.values().iter().all(|v| v.is_finite()));
        assert_eq!(outcomes[0].report.sync_points, 4);
    }
}

// ── Local time stepping ──────────────────────────────────────────────

#[test]
fn configured_clusters_step_at_their_rates() {
    // The left half is twice as fast, so dt_global = 0.025 and the right
    // half is stable at twice that.
    let c = config(
        r#"{ "end_time": 1.0, "wave_field_int": 0.5, "equation": "advection",
             "mesh": { "n_elements": 10, "x_min": 0.0, "x_max": 1.0 },
             "materials": [ { "domain": [0.0, 0.5], "values": [2.0, 0.0, 0.0] } ],
             "clusters": [ { "first": 0, "len": 5, "rate": 1.0 },
                           { "first": 5, "len": 5, "rate": 2.0 } ] }"#,
    );
    let outcomes = setup::run(&c, &NullReporter).unwrap();
    assert!((outcomes[0].negotiated.dt_global - 0.025).abs() < 1e-15);
    let report = &outcomes[0].report;
    assert_eq!(
        report.update_counts,
        vec![(ClusterId(0), 40), (ClusterId(1), 20)]
    );
    assert_eq!(report.total_updates, 60);
}

#[test]
fn cluster_faster_than_its_stable_step_is_rejected() {
    let c = config(
        r#"{ "end_time": 1.0, "wave_field_int": 0.5, "equation": "advection",
             "mesh": { "n_elements": 10, "x_min": 0.0, "x_max": 1.0 },
             "clusters": [ { "first": 0, "len": 5, "rate": 1.0 },
                           { "first": 5, "len": 5, "rate": 8.0 } ] }"#,
    );
    let reporter = RecordingReporter::new();
    let err = setup::run(&c, &reporter).unwrap_err();
    assert!(matches!(
        err,
        RunError::Sched(SchedError::InvalidConfiguration { .. })
    ));
    assert!(err.to_string().contains("stable step"));
    assert!(reporter.sync_points.lock().unwrap().is_empty());
}

#[test]
fn unstable_cluster_on_one_rank_fails_the_run() {
    let c = config(
        r#"{ "end_time": 1.0, "wave_field_int": 0.5, "equation": "advection",
             "processes": 2,
             "mesh": { "n_elements": 10, "x_min": 0.0, "x_max": 1.0 },
             "clusters": [ { "first": 0, "len": 8, "rate": 1.0 },
                           { "first": 8, "len": 2, "rate": 3.0 } ] }"#,
    );
    let err = setup::run(&c, &NullReporter).unwrap_err();
    assert!(matches!(
        err,
        RunError::Sched(SchedError::InvalidConfiguration { .. })
    ));
}

#[test]
fn overlapping_clusters_are_duplicate() {
    let c = config(
        r#"{ "end_time": 1.0, "equation": "advection",
             "mesh": { "n_elements": 10, "x_min": 0.0, "x_max": 1.0 },
             "clusters": [ { "first": 0, "len": 6, "rate": 1.0 },
                           { "first": 4, "len": 6, "rate": 2.0 } ] }"#,
    );
    let err = setup::run(&c, &NullReporter).unwrap_err();
    assert!(matches!(
        err,
        RunError::Sched(SchedError::DuplicateCluster { .. })
    ));
}

// ── Simulated processes ──────────────────────────────────────────────

#[test]
fn ranks_agree_and_advance_in_lockstep() {
    let c = config(
        r#"{ "end_time": 1.0, "wave_field_int": 0.25, "equation": "advection",
             "processes": 2,
             "mesh": { "n_elements": 10, "x_min": 0.0, "x_max": 1.0 },
             "receivers": { "positions": [0.25, 0.75], "interval": 0.25 } }"#,
    );
    let outcomes = setup::run(&c, &NullReporter).unwrap();
    assert_eq!(outcomes.len(), 2);
    for (rank, o) in outcomes.iter().enumerate() {
        assert_eq!(o.rank, rank);
        assert_eq!(o.negotiated.dt_global, 0.05);
        assert_eq!(o.negotiated.global.count, 10);
        assert_eq!(o.store.n_elements(), 5);
        assert_eq!(o.report.total_updates, 20);
        // One receiver per rank, sampled at 0, 0.25, ..., 1.0.
        assert_eq!(o.receivers.len(), 1);
        assert_eq!(o.receivers[0].samples.len(), 5);
    }
    assert_eq!(outcomes[0].receivers[0].position, 0.25);
    assert_eq!(outcomes[1].receivers[0].position, 0.75);
}

#[test]
fn ranks_take_the_most_restrictive_step() {
    // Subdomain widths differ by rounding only; every rank must still
    // adopt the same minimum.
    let c = config(
        r#"{ "end_time": 0.5, "wave_field_int": 0.25, "equation": "elastic",
             "processes": 3, "cfl": 0.6,
             "mesh": { "n_elements": 12, "x_min": 0.0, "x_max": 1.0 } }"#,
    );
    let outcomes = setup::run(&c, &NullReporter).unwrap();
    let dts: Vec<f64> = outcomes.iter().map(|o| o.negotiated.dt_global).collect();
    assert!(dts.iter().all(|&dt| dt == dts[0]));
    for o in &outcomes {
        assert!(o.negotiated.dt_global <= o.negotiated.local.min);
    }
}

// ── Setup-time failures ──────────────────────────────────────────────

#[test]
fn vertex_override_fails_before_any_step() {
    let json = r#"{ "end_time": 1.0, "equation": "advection",
             "mesh": { "n_elements": 10, "x_min": 0.0, "x_max": 1.0 },
             "overrides": { "vertex": [ { "domain": [0.0, 0.1], "value": 1 } ] } }"#;
    let err = RunConfig::from_json(json).unwrap_err();
    assert!(matches!(
        err,
        ConfigError::Sched(SchedError::InvalidConfiguration { .. })
    ));
    assert!(err.to_string().contains("vertex"));

    // Bypassing the loader still fails in setup, before any rank runs.
    let mut c = config(
        r#"{ "end_time": 1.0, "equation": "advection",
             "mesh": { "n_elements": 10, "x_min": 0.0, "x_max": 1.0 } }"#,
    );
    c.overrides.vertex.push(cadence::mesh::SparseTypeOverride {
        domain: [0.0, 0.1],
        value: 1,
    });
    let reporter = RecordingReporter::new();
    let err = setup::run(&c, &reporter).unwrap_err();
    assert!(matches!(
        err,
        RunError::Sched(SchedError::InvalidConfiguration { .. })
    ));
    assert!(reporter.sync_points.lock().unwrap().is_empty());
}

#[test]
fn face_and_element_overrides_are_applied() {
    let c = config(
        r#"{ "end_time": 0.1, "equation": "advection",
             "mesh": { "n_elements": 10, "x_min": 0.0, "x_max": 1.0, "boundary": "outflow" },
             "overrides": {
                 "face": [ { "domain": [1.0, 1.0], "value": 1 } ],
                 "element": [ { "domain": [0.0, 0.2], "value": 2 } ]
             } }"#,
    );
    let outcomes = setup::run(&c, &NullReporter).unwrap();
    let store = &outcomes[0].store;
    assert_eq!(store.faces()[10].sparse_type, 1);
    assert_eq!(store.elements()[0].sparse_type, 2);
    assert_eq!(store.elements()[1].sparse_type, 2);
    assert_eq!(store.elements()[2].sparse_type, 0);
}

#[test]
fn unknown_config_field_is_rejected() {
    let err = RunConfig::from_json(
        r#"{ "end_time": 1.0, "equation": "advection", "dt": 0.1,
             "mesh": { "n_elements": 10, "x_min": 0.0, "x_max": 1.0 } }"#,
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}
