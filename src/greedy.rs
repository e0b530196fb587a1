//! Randomized greedy assignment.
//!
//! Students are first given their preferred topics, going through the preference values from the highest to the
//! lowest and through the students in random order. Students who could not get any of their choices are put into
//! the remaining topics afterwards. A topic takes a student only as long as it has capacity left and the lecturer
//! has no conflict of interest with the student.

use super::{AssignmentsByTopic, CapacityPlan, Lecturers, PreferenceStore};
use log::{debug, warn};
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

/// Result of the greedy assignment
#[derive(Debug, Clone, PartialEq)]
pub struct GreedyOutcome {
    pub assignments_by_topic: AssignmentsByTopic,
    /// Students who could not be assigned to any topic, in processing order
    pub unassigned: Vec<String>,
}

/// State of one greedy run
struct AllocationContext<'a> {
    plan: &'a CapacityPlan,
    lecturers: &'a Lecturers,
    unassigned: BTreeSet<&'a str>,
    assignment_count: BTreeMap<&'a str, usize>,
    assignments_by_topic: AssignmentsByTopic,
}

impl<'a> AllocationContext<'a> {
    fn new(
        store: &'a PreferenceStore,
        plan: &'a CapacityPlan,
        lecturers: &'a Lecturers,
    ) -> Self {
        AllocationContext {
            plan,
            lecturers,
            unassigned: store.students().map(|s| s.email.as_str()).collect(),
            assignment_count: plan.topics().map(|t| (t.as_str(), 0)).collect(),
            assignments_by_topic: plan.topics().map(|t| (t.clone(), Vec::new())).collect(),
        }
    }

    fn is_unassigned(&self, student_email: &str) -> bool {
        self.unassigned.contains(student_email)
    }

    /// Assign the student to the topic, if the topic has capacity left and does not exclude the
    /// student.
    fn assign_if_possible(&mut self, student_email: &'a str, topic: &'a str) -> bool {
        let currently_picked = self.assignment_count.get(topic).copied().unwrap_or(0);
        if currently_picked >= self.plan.capacity_of(topic) {
            return false;
        }
        if let Some(lecturer) = self.lecturers.get(topic) {
            if lecturer.excludes(student_email) {
                debug!(
                    "Not assigning {} to '{}' due to conflict of interest",
                    student_email, topic
                );
                return false;
            }
        }

        self.assignments_by_topic
            .entry(topic.to_owned())
            .or_default()
            .push(student_email.to_owned());
        self.unassigned.remove(student_email);
        self.assignment_count.insert(topic, currently_picked + 1);
        true
    }

    /// Topics ordered from most to least assigned students (ties in lexical order)
    fn topics_by_load(&self) -> Vec<&'a str> {
        let mut topics: Vec<(&'a str, usize)> =
            self.assignment_count.iter().map(|(t, c)| (*t, *c)).collect();
        topics.sort_by_key(|(_topic, count)| std::cmp::Reverse(*count));
        topics.into_iter().map(|(topic, _count)| topic).collect()
    }
}

/// Assign all students of the store greedily.
///
/// Never fails: students who cannot be placed into any topic (all full or excluding them) are returned in
/// `GreedyOutcome::unassigned`.
pub fn assign<R: Rng + ?Sized>(
    store: &PreferenceStore,
    lecturers: &Lecturers,
    plan: &CapacityPlan,
    rng: &mut R,
) -> GreedyOutcome {
    let mut context = AllocationContext::new(store, plan, lecturers);
    let student_list = store.randomized_student_list(rng);

    // Try to match preferences first, from the highest stated value down
    for preference in store.stated_preferences().into_iter().rev() {
        for student_email in student_list.iter().copied() {
            if !context.is_unassigned(student_email) {
                continue;
            }
            if let Some(topic) = store.student_preference(student_email, preference) {
                context.assign_if_possible(student_email, topic);
            }
        }
    }

    // Put remaining students into the first topic that takes them, starting with the most loaded topics
    let remaining: Vec<&str> = student_list
        .iter()
        .copied()
        .filter(|s| context.is_unassigned(s))
        .collect();
    debug!("{} students are left without any of their choices", remaining.len());
    let mut unassigned = Vec::new();
    for student_email in remaining {
        let placed = context
            .topics_by_load()
            .into_iter()
            .any(|topic| context.assign_if_possible(student_email, topic));
        if !placed {
            warn!("Unable to assign student: {}", student_email);
            unassigned.push(student_email.to_owned());
        }
    }

    GreedyOutcome {
        assignments_by_topic: context.assignments_by_topic,
        unassigned,
    }
}

#[cfg(test)]
mod tests {
    use super::assign;
    use crate::{build_store, excluding, fixed, CapacityPlan, Lecturers, PreferenceStore};
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeMap;

    fn run(store: &PreferenceStore, lecturers: &Lecturers, seed: u64) -> super::GreedyOutcome {
        let plan = CapacityPlan::new(store, lecturers).unwrap();
        assign(store, lecturers, &plan, &mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_capacity_limited_first_choice() {
        let store = build_store(&[
            ("s1@x", &[("A", 3), ("B", 1)]),
            ("s2@x", &[("A", 3), ("B", 1)]),
            ("s3@x", &[("A", 3), ("B", 1)]),
            ("s4@x", &[("A", 3), ("B", 1)]),
        ]);
        let mut lecturers = Lecturers::new();
        lecturers.insert("A".into(), fixed(2, &[]));
        lecturers.insert("B".into(), fixed(2, &[]));

        for seed in 0..10 {
            let outcome = run(&store, &lecturers, seed);
            assert!(outcome.unassigned.is_empty());
            assert_eq!(outcome.assignments_by_topic["A"].len(), 2);
            assert_eq!(outcome.assignments_by_topic["B"].len(), 2);
            let mut score = 0;
            for (topic, students) in outcome.assignments_by_topic.iter() {
                for s in students {
                    score += store.get_student(s).unwrap().preference_for(topic);
                }
            }
            assert_eq!(score, 8);
        }
    }

    #[test]
    fn test_fallback_prefers_most_loaded_topic() {
        // s3 has no choices. A has capacity left after s1, so s3 joins A before the empty topic C.
        let mut store = build_store(&[
            ("s1@x", &[("A", 3)]),
            ("s2@x", &[("B", 3)]),
            ("s3@x", &[]),
        ]);
        let mut lecturers = Lecturers::new();
        lecturers.insert("A".into(), fixed(2, &[]));
        lecturers.insert("B".into(), fixed(1, &[]));
        store.add_topics(["C"]);

        let outcome = run(&store, &lecturers, 0);
        assert!(outcome.unassigned.is_empty());
        assert_eq!(outcome.assignments_by_topic["A"].len(), 2);
        assert!(outcome.assignments_by_topic["A"].contains(&"s3@x".to_string()));
        assert_eq!(outcome.assignments_by_topic["B"], vec!["s2@x"]);
        assert!(outcome.assignments_by_topic["C"].is_empty());
    }

    #[test]
    fn test_exclusions_are_respected() {
        let store = build_store(&[
            ("s1@x", &[("A", 3)]),
            ("s2@x", &[("A", 3)]),
            ("s3@x", &[("B", 3)]),
        ]);
        let mut lecturers = Lecturers::new();
        lecturers.insert("A".into(), excluding(&["s1@x"]));
        for seed in 0..10 {
            let outcome = run(&store, &lecturers, seed);
            assert!(outcome.unassigned.is_empty());
            assert!(!outcome.assignments_by_topic["A"].contains(&"s1@x".to_string()));
            assert_eq!(outcome.assignments_by_topic["B"].len(), 2);
        }
    }

    #[test]
    fn test_unassignable_student_is_reported() {
        let mut store = build_store(&[("s1@x", &[("A", 3)]), ("s2@x", &[("A", 2)])]);
        let mut lecturers = Lecturers::new();
        lecturers.insert("A".into(), fixed(1, &["s1@x"]));
        lecturers.insert("B".into(), excluding(&["s1@x"]));
        store.add_topics(["B"]);

        let outcome = run(&store, &lecturers, 0);
        assert_eq!(outcome.unassigned, vec!["s1@x"]);
        assert_eq!(outcome.assignments_by_topic["A"], vec!["s2@x"]);
        assert!(outcome.assignments_by_topic["B"].is_empty());
    }

    #[test]
    fn test_fixed_capacities_exceeding_students() {
        let store = build_store(&[
            ("s1@x", &[("A", 3)]),
            ("s2@x", &[("B", 3)]),
            ("s3@x", &[("B", 3), ("A", 1)]),
        ]);
        let mut lecturers = Lecturers::new();
        lecturers.insert("A".into(), fixed(5, &[]));
        for seed in 0..10 {
            let outcome = run(&store, &lecturers, seed);
            assert!(outcome.unassigned.is_empty());
            assert_eq!(outcome.assignments_by_topic["A"].len(), 3);
            assert!(outcome.assignments_by_topic["B"].is_empty());
        }
    }

    #[test]
    fn test_large_preference_values() {
        let store = build_store(&[
            ("s1@x", &[("A", 300_000_000), ("B", 1)]),
            ("s2@x", &[("B", 2), ("A", 1)]),
        ]);
        let outcome = run(&store, &Lecturers::new(), 0);
        assert!(outcome.unassigned.is_empty());
        assert_eq!(outcome.assignments_by_topic["A"], vec!["s1@x"]);
        assert_eq!(outcome.assignments_by_topic["B"], vec!["s2@x"]);
    }

    #[test]
    fn test_lecturer_only_topic_takes_students() {
        let store = build_store(&[("s1@x", &[("A", 3)]), ("s2@x", &[("A", 3)])]);
        let mut lecturers = Lecturers::new();
        lecturers.insert("Z".into(), excluding(&[]));
        let outcome = run(&store, &lecturers, 0);
        assert!(outcome.unassigned.is_empty());
        assert_eq!(outcome.assignments_by_topic["A"].len(), 1);
        assert_eq!(outcome.assignments_by_topic["Z"].len(), 1);
    }

    #[test]
    fn test_random_problems_respect_constraints() {
        let topics = ["A", "B", "C", "D", "E"];
        let mut rng = StdRng::seed_from_u64(99);
        for seed in 0..50 {
            let num_students: usize = rng.random_range(1..30);
            let emails: Vec<String> = (0..num_students).map(|i| format!("s{}@x", i)).collect();
            let prefs: Vec<Vec<(&str, u32)>> = emails
                .iter()
                .map(|_| {
                    let mut chosen = topics.to_vec();
                    chosen.shuffle(&mut rng);
                    chosen.into_iter().zip([3, 2, 1]).collect()
                })
                .collect();
            let students: Vec<(&str, &[(&str, u32)])> = emails
                .iter()
                .zip(prefs.iter())
                .map(|(e, p)| (e.as_str(), &p[..]))
                .collect();
            let mut store = build_store(&students);
            store.add_topics(topics);

            let mut lecturers = Lecturers::new();
            lecturers.insert("A".into(), fixed(emails.len() / 5, &[emails[0].as_str()]));
            lecturers.insert("C".into(), excluding(&[emails[emails.len() - 1].as_str()]));
            let plan = CapacityPlan::new(&store, &lecturers).unwrap();
            let outcome = assign(&store, &lecturers, &plan, &mut StdRng::seed_from_u64(seed));

            let mut seen = BTreeMap::new();
            for (topic, students) in outcome.assignments_by_topic.iter() {
                assert!(students.len() <= plan.capacity_of(topic));
                for s in students {
                    assert!(!lecturers.get(topic).map_or(false, |l| l.excludes(s)));
                    *seen.entry(s.clone()).or_insert(0) += 1;
                }
            }
            for s in outcome.unassigned.iter() {
                *seen.entry(s.clone()).or_insert(0) += 1;
            }
            assert_eq!(seen.len(), emails.len());
            assert!(seen.values().all(|c| *c == 1));
        }
    }
}
