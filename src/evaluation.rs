//! Evaluation of a finished topic distribution: which student got which topic with which preference value, and the
//! resulting total score.

use super::{AssignmentsByTopic, Preference, PreferenceStore, Student, Topic};
use std::cell::OnceCell;
use std::collections::BTreeMap;

/// A finished assignment of students to topics together with the data needed to evaluate it.
///
/// All derived values are computed on first use and cached. The distribution itself is immutable.
pub struct Distribution<'a> {
    store: &'a PreferenceStore,
    assignments_by_topic: AssignmentsByTopic,
    unassigned: Vec<String>,
    assignments_by_student: OnceCell<BTreeMap<String, Topic>>,
    assignment_count: OnceCell<BTreeMap<Preference, usize>>,
    score: OnceCell<u64>,
}

impl<'a> Distribution<'a> {
    pub fn new(
        store: &'a PreferenceStore,
        assignments_by_topic: AssignmentsByTopic,
        unassigned: Vec<String>,
    ) -> Self {
        Distribution {
            store,
            assignments_by_topic,
            unassigned,
            assignments_by_student: OnceCell::new(),
            assignment_count: OnceCell::new(),
            score: OnceCell::new(),
        }
    }

    pub fn store(&self) -> &'a PreferenceStore {
        self.store
    }

    pub fn assignments_by_topic(&self) -> &AssignmentsByTopic {
        &self.assignments_by_topic
    }

    /// Students that could not be assigned to any topic (only possible with the greedy algorithm)
    pub fn unassigned(&self) -> &[String] {
        &self.unassigned
    }

    /// Reverse index of the assignment: topic by student email
    pub fn assignments_by_student(&self) -> &BTreeMap<String, Topic> {
        self.assignments_by_student.get_or_init(|| {
            self.assignments_by_topic
                .iter()
                .flat_map(|(topic, emails)| {
                    emails
                        .iter()
                        .map(move |email| (email.clone(), topic.clone()))
                })
                .collect()
        })
    }

    pub fn topic_of(&self, student_email: &str) -> Option<&str> {
        self.assignments_by_student()
            .get(student_email)
            .map(|t| t.as_str())
    }

    /// Preference value of the student for their assigned topic (0 if it was none of their choices). None, if the
    /// student is unknown or not assigned.
    pub fn matched_preference(&self, student_email: &str) -> Option<Preference> {
        let student = self.store.get_student(student_email)?;
        let topic = self.topic_of(student_email)?;
        Some(student.preference_for(topic))
    }

    /// Number of assigned students by the preference value they got. Unassigned students are not counted.
    pub fn assignment_count(&self) -> &BTreeMap<Preference, usize> {
        self.assignment_count.get_or_init(|| {
            let mut count = BTreeMap::new();
            for student in self.store.students() {
                if let Some(topic) = self.topic_of(&student.email) {
                    *count.entry(student.preference_for(topic)).or_insert(0) += 1;
                }
            }
            count
        })
    }

    /// Total score: Sum of the preference values of all assigned students
    pub fn score(&self) -> u64 {
        *self.score.get_or_init(|| {
            self.assignment_count()
                .iter()
                .map(|(pref, count)| *pref as u64 * *count as u64)
                .sum()
        })
    }

    /// All assigned students, sorted by name and email, with their topic and matched preference value
    pub fn student_results(&self) -> Vec<(&'a Student, &str, Preference)> {
        let mut students: Vec<&'a Student> = self.store.students().collect();
        students.sort_by(|a, b| (&a.name, &a.email).cmp(&(&b.name, &b.email)));
        students
            .into_iter()
            .filter_map(|student| {
                let topic = self.topic_of(&student.email)?;
                Some((student, topic, student.preference_for(topic)))
            })
            .collect()
    }
}
