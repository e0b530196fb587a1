//! Optimal assignment of students to topics by maximum weight perfect matching.
//!
//! The topic capacities are expanded into one slot per place (see `capacity`), such that the assignment problem
//! becomes a matching of students and slots. The weight matrix (see `weights`) holds the students' preferences and
//! marks conflicts of interest with a prohibitive negative weight. The hungarian method then finds the matching with
//! the highest total preference. All the conversion from slot columns back to topics happens within this module.

use super::hungarian::{hungarian_algorithm, Matching};
use super::weights::{self, WeightMatrix};
use super::{AssignmentsByTopic, CapacityPlan, ConfigurationError, Lecturers, PreferenceStore};
use log::{info, warn};
use rand::Rng;


/// Main method of the module to assign every student of the `store` to exactly one topic, maximizing the sum of
/// preference values.
///
/// The slot list is allocated from the capacity `plan`, then students and slots are shuffled to randomize the
/// resolution of ties.
///
/// # Errors
///
/// Fails, if the plan's fixed capacities exceed the number of students (see `CapacityPlan::allocate_slots()`).
pub fn assign<R: Rng + ?Sized>(
    store: &PreferenceStore,
    lecturers: &Lecturers,
    plan: &CapacityPlan,
    rng: &mut R,
) -> Result<AssignmentsByTopic, ConfigurationError> {
    let slots = plan.allocate_slots(rng)?;
    let problem = weights::build(store, slots, lecturers, rng);

    let (matching, score) = hungarian_algorithm(&problem.adjacency_matrix);
    info!("Found optimal matching with total weight {}", score);

    let mut assignments_by_topic: AssignmentsByTopic =
        plan.topics().map(|t| (t.clone(), Vec::new())).collect();
    for (student, topic) in matched_pairs(&problem, &matching) {
        assignments_by_topic
            .entry(topic.to_owned())
            .or_default()
            .push(student.to_owned());
    }
    Ok(assignments_by_topic)
}

/// Convert the slot matching into (student email, topic) pairs, in row order of the weight matrix.
///
/// Warns about every pairing, that the lecturer has excluded. These can only be part of the optimal matching, if
/// there is no perfect matching without them.
fn matched_pairs<'p>(problem: &'p WeightMatrix, matching: &Matching) -> Vec<(&'p str, &'p str)> {
    matching
        .iter()
        .enumerate()
        .map(|(row, column)| {
            let student = problem.students[row].as_str();
            let topic = problem.slots[*column].as_str();
            if problem.adjacency_matrix[[row, *column]] == problem.excluded_weight {
                warn!(
                    "Student {} had to be assigned to '{}' despite the lecturer's conflict of interest",
                    student, topic
                );
            }
            (student, topic)
        })
        .collect()
}
