pub mod capacity;
pub mod evaluation;
pub mod greedy;
mod hungarian;
pub mod io;
pub mod optimal;
pub mod weights;

use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

pub use capacity::CapacityPlan;
pub use evaluation::Distribution;

/// Opaque identifier of a topic, as used in the preference files and the lecturer metadata
pub type Topic = String;

/// Preference value of a student for a topic. Higher is more preferred, 0 means "no preference".
pub type Preference = u32;

/// Assigned student emails for each topic
pub type AssignmentsByTopic = BTreeMap<Topic, Vec<String>>;

/// Lecturer metadata by topic
pub type Lecturers = BTreeMap<Topic, LecturerConstraint>;

/// Representation of a student to be assigned
#[derive(Clone, Debug, PartialEq)]
pub struct Student {
    /// Student's name. Only used for reports
    pub name: String,
    /// Student's email address, which identifies the student
    pub email: String,
    /// Non-zero preference values of the student by topic
    pub prefs: BTreeMap<Topic, Preference>,
}

impl Student {
    /// Preference value of this student for the given topic (0 if the topic was not chosen)
    pub fn preference_for(&self, topic: &str) -> Preference {
        self.prefs.get(topic).copied().unwrap_or(0)
    }
}

/// Constraints a lecturer has put on their topic
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LecturerConstraint {
    /// Exact number of students the lecturer wants for this topic. If None, the topic gets the
    /// default capacity computed from the remaining students.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_topics: Option<usize>,
    /// Emails of students who must not be assigned to this topic (conflict of interest)
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub exclude: BTreeSet<String>,
    /// Any other metadata of the lecturer. It is passed through to the result file untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl LecturerConstraint {
    pub fn excludes(&self, student_email: &str) -> bool {
        self.exclude.contains(student_email)
    }
}

/// The students to be assigned and the set of available topics.
///
/// The store is filled by the loaders in `io` once and only read by the assignment strategies.
#[derive(Clone, Debug, Default)]
pub struct PreferenceStore {
    students: BTreeMap<String, Student>,
    topics: BTreeSet<Topic>,
}

impl PreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn student_count(&self) -> usize {
        self.students.len()
    }

    pub fn topic_count(&self) -> usize {
        self.topics.len()
    }

    /// Iterate all students, ordered by email
    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.students.values()
    }

    /// Iterate all topics in lexical order
    pub fn topics(&self) -> impl Iterator<Item = &Topic> {
        self.topics.iter()
    }

    pub fn get_student(&self, student_email: &str) -> Option<&Student> {
        self.students.get(student_email)
    }

    /// Add a student (replacing any student with the same email). The student's chosen topics are
    /// added to the topic set.
    pub fn add_student(&mut self, student: Student) {
        self.topics.extend(student.prefs.keys().cloned());
        self.students.insert(student.email.clone(), student);
    }

    pub fn add_topics<I, T>(&mut self, topics: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<Topic>,
    {
        self.topics.extend(topics.into_iter().map(Into::into));
    }

    /// Merge another store into this one. Students of `other` replace students with the same email.
    pub fn merge(&mut self, other: PreferenceStore) {
        self.students.extend(other.students);
        self.topics.extend(other.topics);
    }

    /// Highest preference value any student has stated (0 if there are no preferences at all)
    pub fn max_preference(&self) -> Preference {
        self.students
            .values()
            .flat_map(|s| s.prefs.values().copied())
            .max()
            .unwrap_or(0)
    }

    /// All distinct preference values any student has stated
    pub fn stated_preferences(&self) -> BTreeSet<Preference> {
        self.students
            .values()
            .flat_map(|s| s.prefs.values().copied())
            .collect()
    }

    /// Find the topic, for which the student stated exactly the given preference value.
    ///
    /// If the student gave the same value to multiple topics, the lexically first topic is
    /// returned.
    pub fn student_preference(&self, student_email: &str, preference: Preference) -> Option<&str> {
        self.students
            .get(student_email)?
            .prefs
            .iter()
            .find(|(_topic, value)| **value == preference)
            .map(|(topic, _value)| topic.as_str())
    }

    pub fn randomized_student_list<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<&str> {
        let mut students: Vec<&str> = self.students.keys().map(|e| e.as_str()).collect();
        students.shuffle(rng);
        students
    }
}

/// Assignment strategy to use for a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Algorithm {
    /// Randomized greedy heuristic, see `greedy`
    Greedy,
    /// Maximum weight perfect matching, see `optimal`
    Optimal,
}

impl Algorithm {
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Greedy => "greedy",
            Algorithm::Optimal => "optimal",
        }
    }
}

impl std::str::FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "greedy" => Ok(Algorithm::Greedy),
            "optimal" => Ok(Algorithm::Optimal),
            _ => Err(format!("Unknown algorithm '{}'", s)),
        }
    }
}

/// Error, which prevents any assignment from being computed
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error(
        "All topics have a fixed capacity ({fixed} places in total), but there are {students} \
        students. Cannot compute a default capacity without flexible topics."
    )]
    NoFlexibleTopics { students: usize, fixed: usize },
    #[error(
        "Fixed topic capacities sum up to {fixed} places, but there are only {students} \
        students. The slots cannot match the students one to one."
    )]
    FixedCapacityExceeded { students: usize, fixed: usize },
}

/// Main entry point of the library: Assign every student of the `store` to a topic, using the
/// given algorithm.
///
/// The available topics are the store's topics together with all topics of the `lecturers`
/// metadata.
///
/// All intermediate state (capacities, slot lists, matrices, counters) is created freshly for
/// each call. The `rng` is used for all randomized orders, so passing a seeded generator gives
/// reproducible results.
pub fn distribute<'a, R: Rng + ?Sized>(
    store: &'a PreferenceStore,
    lecturers: &Lecturers,
    algorithm: Algorithm,
    rng: &mut R,
) -> Result<Distribution<'a>, ConfigurationError> {
    let plan = CapacityPlan::new(store, lecturers)?;
    info!(
        "{} students and {} topics; default maximum of {} assignments per topic",
        store.student_count(),
        plan.topics().count(),
        plan.default_capacity()
    );

    Ok(match algorithm {
        Algorithm::Greedy => {
            let outcome = greedy::assign(store, lecturers, &plan, rng);
            Distribution::new(store, outcome.assignments_by_topic, outcome.unassigned)
        }
        Algorithm::Optimal => {
            let assignments_by_topic = optimal::assign(store, lecturers, &plan, rng)?;
            Distribution::new(store, assignments_by_topic, Vec::new())
        }
    })
}

#[cfg(test)]
fn build_store(students: &[(&str, &[(&str, Preference)])]) -> PreferenceStore {
    let mut store = PreferenceStore::new();
    for (email, prefs) in students {
        store.add_student(Student {
            name: format!("Student {}", email),
            email: email.to_string(),
            prefs: prefs.iter().map(|(t, p)| (t.to_string(), *p)).collect(),
        });
    }
    store
}

#[cfg(test)]
fn fixed(max_topics: usize, exclude: &[&str]) -> LecturerConstraint {
    LecturerConstraint {
        max_topics: Some(max_topics),
        exclude: exclude.iter().map(|e| e.to_string()).collect(),
        ..Default::default()
    }
}

#[cfg(test)]
fn excluding(exclude: &[&str]) -> LecturerConstraint {
    LecturerConstraint {
        max_topics: None,
        exclude: exclude.iter().map(|e| e.to_string()).collect(),
        ..Default::default()
    }
}
