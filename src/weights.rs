//! Generation of the student × slot weight matrix for the optimal assignment.

pub use super::hungarian::EdgeWeight;
use super::{Lecturers, Preference, PreferenceStore, Topic};
use rand::seq::SliceRandom;
use rand::Rng;

/// Factor between the largest possible total weight of legitimate pairings and the (absolute) weight of an excluded
/// pairing
const EXCLUSION_FACTOR: EdgeWeight = 1000;

/// Weight to mark excluded student/topic pairings in a matrix of the given size.
///
/// It is chosen several orders of magnitude below the lowest possible total weight of any matching, that does not
/// use excluded pairings, so that avoiding a single excluded pairing is always worth more than every preference of
/// all other students. At the same time, summing it up over all rows must not overflow, so it is not just
/// `EdgeWeight::MIN`.
pub fn exclusion_weight(size: usize, max_preference: Preference) -> EdgeWeight {
    -((size as EdgeWeight + 1) * (max_preference as EdgeWeight + 1) * EXCLUSION_FACTOR)
}

/// Problem definition for the hungarian method
pub struct WeightMatrix {
    /// Student emails in row order
    pub students: Vec<String>,
    /// Topic of each slot in column order
    pub slots: Vec<Topic>,
    /// Adjacency matrix. Each row represents one student, each column one slot. The entry is the student's preference
    /// for the slot's topic, 0 if the topic was not chosen, or the exclusion weight.
    pub adjacency_matrix: ndarray::Array2<EdgeWeight>,
    /// The weight used to mark excluded pairings in this matrix
    pub excluded_weight: EdgeWeight,
}

/// Generate the weight matrix from the students and the slot list.
///
/// Both the students and the slots are shuffled, such that ties in the matching are not systematically resolved in
/// favour of the same students or topics.
///
/// # Panics
///
/// Panics, if the number of slots does not equal the number of students. `CapacityPlan::allocate_slots()` guarantees
/// this.
pub fn build<R: Rng + ?Sized>(
    store: &PreferenceStore,
    mut slots: Vec<Topic>,
    lecturers: &Lecturers,
    rng: &mut R,
) -> WeightMatrix {
    let students: Vec<String> = store
        .randomized_student_list(rng)
        .into_iter()
        .map(String::from)
        .collect();
    slots.shuffle(rng);
    let n = students.len();
    assert_eq!(
        n,
        slots.len(),
        "Number of slots does not match number of students"
    );

    let excluded_weight = exclusion_weight(n, store.max_preference());
    let mut adjacency_matrix = ndarray::Array2::<EdgeWeight>::zeros([n, n]);
    for (x, email) in students.iter().enumerate() {
        let student = match store.get_student(email) {
            Some(s) => s,
            None => continue,
        };
        for (y, topic) in slots.iter().enumerate() {
            let excluded = lecturers
                .get(topic)
                .map_or(false, |l| l.excludes(email));
            adjacency_matrix[[x, y]] = if excluded {
                excluded_weight
            } else {
                student.preference_for(topic) as EdgeWeight
            };
        }
    }

    WeightMatrix {
        students,
        slots,
        adjacency_matrix,
        excluded_weight,
    }
}
