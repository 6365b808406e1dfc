mod common;

use mission_core::{
    build_logistics, ExpeditionFault, MissionConfig, MissionError, RiskTier,
};

#[test]
fn single_target_brief_is_rejected() {
    let logistics = build_logistics(MissionConfig::default());
    let err = logistics
        .generate_brief(&common::expedition(&["caracol"]))
        .unwrap_err();
    assert!(matches!(
        err,
        MissionError::InvalidExpedition(ExpeditionFault::TooFewTargets(1))
    ));
}

#[test]
fn unknown_target_brief_is_rejected() {
    let logistics = build_logistics(MissionConfig::default());
    let err = logistics
        .generate_brief(&common::expedition(&["caracol", "atlantis"]))
        .unwrap_err();
    assert!(matches!(err, MissionError::Route(_)));
}

#[test]
fn brief_risk_is_the_sum_of_leg_risks() {
    let logistics = build_logistics(MissionConfig::default());
    let brief = logistics
        .generate_brief(&common::expedition(&["xunantunich", "caracol", "atm-cave"]))
        .expect("brief");

    // xunantunich->caracol: 2 + 3 + ruins 2; caracol->atm-cave: 3 + 5 + ruins 2.
    assert!((brief.risk.score - 17.0).abs() < 1e-9);
    assert_eq!(brief.risk.tier, RiskTier::Low);
    assert!((brief.route.base_risk - 17.0).abs() < 1e-9);
}

#[test]
fn brief_duration_adds_overhead_per_intermediate_stop() {
    let logistics = build_logistics(MissionConfig::default());
    let brief = logistics
        .generate_brief(&common::expedition(&[
            "xunantunich",
            "caracol",
            "atm-cave",
            "nohoch-cheen",
        ]))
        .expect("brief");

    // Two intermediate stops at 1.5 hours each.
    let overhead = brief.estimated_duration_hours - brief.route.total_travel_hours;
    assert!((overhead - 3.0).abs() < 1e-9);
}

#[test]
fn brief_lists_targets_in_visit_order_with_deduplicated_gear() {
    let logistics = build_logistics(MissionConfig::default());
    let brief = logistics
        .generate_brief(&common::expedition(&["xunantunich", "lubaantun"]))
        .expect("brief");

    let ids: Vec<&str> = brief.targets.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["xunantunich", "lubaantun"]);
    // Both ruins carry the same kit; the manifest holds it once.
    assert_eq!(brief.gear_manifest, vec!["hiking_boots", "sun_protection"]);
}

#[test]
fn resource_estimate_scales_with_route_length() {
    let logistics = build_logistics(MissionConfig::default());
    let short = logistics
        .generate_brief(&common::expedition(&["xunantunich", "caracol"]))
        .expect("short");
    let long = logistics
        .generate_brief(&common::expedition(&["xunantunich", "great-blue-hole"]))
        .expect("long");

    assert!(short.resources.supplies > 0.0);
    assert!(long.resources.supplies > short.resources.supplies);
    assert!(long.resources.fatigue > short.resources.fatigue);
    assert!(long.resources.integrity > 0.0);
}
