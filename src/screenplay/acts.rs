/*!
 * Position-based act classification.
 */

use super::model::{Act, Screenplay};

/// Act of the scene at `index` (0-based) in a screenplay of `total` scenes.
///
/// `ratio = index / max(total, 1)`: below 0.25 is Act I, below 0.75 is Act II,
/// the rest Act III. Compared in integers so exact quarters are not subject
/// to rounding.
pub fn act_for_position(index: usize, total: usize) -> Act {
    let total = total.max(1);
    if 4 * index < total {
        Act::ActI
    } else if 4 * index < 3 * total {
        Act::ActII
    } else {
        Act::ActIII
    }
}

/// Assign an act to every scene, overwriting previous values.
pub fn classify_acts(screenplay: &mut Screenplay) {
    let total = screenplay.scenes.len();
    for (index, scene) in screenplay.scenes.iter_mut().enumerate() {
        scene.act = Some(act_for_position(index, total));
    }
}
