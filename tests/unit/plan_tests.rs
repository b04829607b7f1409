/*!
 * Tests for change plans, placement normalization and scoping
 */

use anyhow::Result;
use scriptwai::errors::SchemaError;
use scriptwai::plan::{normalize_placement, parse_change_plan, relevant_changes, ChangePlan, Placement};
use crate::common;

/// A well-formed plan keeps its ids and order
#[test]
fn test_parse_change_plan_withValidPlan_shouldKeepOrder() -> Result<()> {
    let json = common::plan_json(&[("Open stronger", "Act I"), ("Make it rain", "Entire Screenplay")]);

    let plan = parse_change_plan(&json)?;

    assert_eq!(plan.len(), 2);
    assert_eq!(plan.changes[0].id, "C1");
    assert_eq!(plan.changes[0].placement, Placement::ActI);
    assert_eq!(plan.changes[1].description, "Make it rain");

    Ok(())
}

/// Bad entries are skipped, the rest of the plan survives
#[test]
fn test_parse_change_plan_withBadEntries_shouldSkipThem() -> Result<()> {
    let json = r#"{"scene_level_changes": [
        "not an object",
        {"change_id": "C2", "description": "", "placement": "Act I"},
        {"change_id": "C3", "description": "Fix it", "placement": "Act IV"},
        {"description": "Keep me", "placement": "act ii"}
    ]}"#;

    let plan = parse_change_plan(json)?;

    assert_eq!(plan.len(), 1);
    assert_eq!(plan.changes[0].id, "C4");
    assert_eq!(plan.changes[0].placement, Placement::ActII);

    Ok(())
}

/// Structural problems with the root are fatal
#[test]
fn test_parse_change_plan_withBadRoot_shouldReturnSchemaError() {
    assert!(matches!(parse_change_plan("[]"), Err(SchemaError::NotAnObject)));
    assert!(matches!(parse_change_plan("{}"), Err(SchemaError::MissingChanges)));
    assert!(matches!(
        parse_change_plan(r#"{"scene_level_changes": {"a": 1}}"#),
        Err(SchemaError::ChangesNotASequence)
    ));
    assert!(matches!(parse_change_plan("{"), Err(SchemaError::InvalidJson(_))));
}

/// "Act III" is not mistaken for "Act I"
#[test]
fn test_normalize_placement_withActNumbers_shouldPreferLongestNumeral() {
    assert_eq!(normalize_placement("Late in Act III"), Placement::ActIII);
    assert_eq!(normalize_placement("act 2 midpoint"), Placement::ActII);
    assert_eq!(normalize_placement("ACT I opening"), Placement::ActI);
    assert_eq!(normalize_placement("throughout the film"), Placement::EntireScreenplay);
    assert_eq!(normalize_placement("the diner scene"), Placement::SpecificScene);
}

/// Unrecognized placement text broadens to the whole screenplay
#[test]
fn test_normalize_placement_withUnknownText_shouldDefaultToEntire() {
    assert_eq!(normalize_placement(""), Placement::EntireScreenplay);
    assert_eq!(normalize_placement("somewhere"), Placement::EntireScreenplay);
    assert_eq!(normalize_placement("factions"), Placement::EntireScreenplay);
}

/// Raw notes get normalized placements and ids by source position
#[test]
fn test_from_raw_notes_withArray_shouldNormalizeAndNumber() -> Result<()> {
    let json = r#"[
        {"description": "Tighten finale", "placement": "third act, act 3"},
        {"description": "", "placement": "Act I"},
        {"description": "Give her a dog", "placement": "whole script"}
    ]"#;

    let plan = ChangePlan::from_raw_notes(json)?;

    assert_eq!(plan.len(), 2);
    assert_eq!(plan.changes[0].id, "C1");
    assert_eq!(plan.changes[0].placement, Placement::ActIII);
    assert_eq!(plan.changes[1].id, "C3");
    assert_eq!(plan.changes[1].placement, Placement::EntireScreenplay);

    Ok(())
}

/// Raw notes without a change list form an empty plan
#[test]
fn test_from_raw_notes_withoutChangeList_shouldBeEmpty() -> Result<()> {
    let plan = ChangePlan::from_raw_notes(r#"{"title": "Pilot notes"}"#)?;
    assert!(plan.is_empty());

    let result = ChangePlan::from_raw_notes(r#"{"scene_level_changes": "rain"}"#);
    assert_eq!(result.unwrap_err(), SchemaError::ChangesNotASequence);

    Ok(())
}

/// Scenes only see changes for their act or the whole screenplay
#[test]
fn test_relevant_changes_shouldMatchActsAndEntireScreenplay() -> Result<()> {
    let screenplay = common::screenplay_with_scenes(4);
    let plan = parse_change_plan(&common::plan_json(&[
        ("Open stronger", "Act I"),
        ("Make it rain", "Entire Screenplay"),
        ("Fix the diner", "Specific Scene"),
        ("Tighten finale", "Act III"),
    ]))?;

    let first: Vec<&str> = relevant_changes(&screenplay.scenes[0], &plan).into_iter().map(|c| c.id.as_str()).collect();
    let second: Vec<&str> = relevant_changes(&screenplay.scenes[1], &plan).into_iter().map(|c| c.id.as_str()).collect();
    let last: Vec<&str> = relevant_changes(&screenplay.scenes[3], &plan).into_iter().map(|c| c.id.as_str()).collect();

    assert_eq!(first, ["C1", "C2"]);
    assert_eq!(second, ["C2"]);
    assert_eq!(last, ["C2", "C4"]);

    Ok(())
}
