/*!
 * Change scoping: which changes of a plan apply to a scene.
 *
 * A change applies when its placement is `EntireScreenplay` or names the
 * scene's act. `SpecificScene` changes are never matched here since the plan
 * does not identify the scene; those scenes are reached through an explicit
 * scene range instead.
 */

use super::change::{Change, ChangePlan, Placement};
use crate::screenplay::Scene;

/// Whether a single change applies to the scene.
pub fn is_relevant(change: &Change, scene: &Scene) -> bool {
    match change.placement {
        Placement::EntireScreenplay => true,
        Placement::SpecificScene => false,
        placement => scene.act.is_some() && placement.act() == scene.act,
    }
}

/// Changes relevant to the scene, in plan order.
pub fn relevant_changes<'a>(scene: &Scene, plan: &'a ChangePlan) -> Vec<&'a Change> {
    plan.changes
        .iter()
        .filter(|change| is_relevant(change, scene))
        .collect()
}
