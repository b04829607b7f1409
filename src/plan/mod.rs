/*!
 * Change plans: decoding, placement normalization and per-scene scoping.
 */

pub mod change;
pub mod scoper;

pub use self::change::{normalize_placement, parse_change_plan, Change, ChangePlan, Placement};
pub use self::scoper::{is_relevant, relevant_changes};
