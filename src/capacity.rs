//! Turns the lecturers' capacities into a concrete list of assignable slots.
//!
//! Topics with a fixed `max_topics` get exactly that many slots. All other ("flexible") topics
//! share the remaining students. As the share is usually fractional, the number of slots per
//! flexible topic is determined with a running remainder (like rasterizing a line), such that the
//! total matches the number of remaining students exactly and every flexible topic gets its ideal
//! share rounded up or down.

use super::{ConfigurationError, Lecturers, PreferenceStore, Topic};
use log::{debug, warn};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};

/// Capacities of all topics for one run
#[derive(Clone, Debug)]
pub struct CapacityPlan {
    /// Topics with a fixed capacity and their capacity
    fixed: BTreeMap<Topic, usize>,
    /// Topics without a fixed capacity
    flexible: Vec<Topic>,
    /// Total number of students
    students: usize,
    /// Number of students to be distributed among the flexible topics
    remaining_students: usize,
}

impl CapacityPlan {
    /// Split the topics into fixed and flexible ones.
    ///
    /// The topics are those of the store together with all topics named in the lecturer metadata. If the fixed
    /// capacities exceed the number of students, no students remain for the flexible topics and their default
    /// capacity is 0. Such a plan can still be used by the greedy strategy, but `allocate_slots()` refuses it.
    ///
    /// # Errors
    ///
    /// Fails, if there are no topics at all or if there are students left after filling the fixed topics, but no
    /// flexible topic to take them.
    pub fn new(store: &PreferenceStore, lecturers: &Lecturers) -> Result<Self, ConfigurationError> {
        let topics: BTreeSet<&Topic> = store.topics().chain(lecturers.keys()).collect();
        let mut fixed = BTreeMap::new();
        let mut flexible = Vec::new();
        for topic in topics {
            match lecturers.get(topic).and_then(|l| l.max_topics) {
                Some(capacity) => {
                    fixed.insert(topic.clone(), capacity);
                }
                None => flexible.push(topic.clone()),
            }
        }

        let students = store.student_count();
        let fixed_total: usize = fixed.values().sum();
        let remaining_students = students.saturating_sub(fixed_total);
        if flexible.is_empty() && (remaining_students > 0 || fixed.is_empty()) {
            return Err(ConfigurationError::NoFlexibleTopics {
                students,
                fixed: fixed_total,
            });
        }
        if fixed_total > students {
            warn!(
                "Fixed capacities sum up to {} places for {} students. Flexible topics stay empty.",
                fixed_total, students
            );
        }

        Ok(CapacityPlan {
            fixed,
            flexible,
            students,
            remaining_students,
        })
    }

    /// Iterate all topics of the plan: the fixed topics followed by the flexible ones, each in lexical order
    pub fn topics(&self) -> impl Iterator<Item = &Topic> {
        self.fixed.keys().chain(self.flexible.iter())
    }

    /// Ideal (fractional) number of students per flexible topic
    pub fn flexible_share(&self) -> f64 {
        if self.flexible.is_empty() {
            0.0
        } else {
            self.remaining_students as f64 / self.flexible.len() as f64
        }
    }

    /// Capacity of every flexible topic in the greedy strategy: the flexible share, rounded up.
    pub fn default_capacity(&self) -> usize {
        if self.flexible.is_empty() {
            0
        } else {
            (self.remaining_students + self.flexible.len() - 1) / self.flexible.len()
        }
    }

    /// Effective capacity of a topic: its fixed capacity or the default capacity
    pub fn capacity_of(&self, topic: &str) -> usize {
        self.fixed
            .get(topic)
            .copied()
            .unwrap_or_else(|| self.default_capacity())
    }

    pub fn is_fixed(&self, topic: &str) -> bool {
        self.fixed.contains_key(topic)
    }

    /// Number of slots for each flexible topic, processed in random order.
    ///
    /// Topic k (0-based, in processing order) gets `round(R - k*s) - round(R - (k+1)*s)` slots,
    /// where R is the number of remaining students and s the flexible share. The sum telescopes
    /// to `round(R) - round(0) = R`.
    pub fn flexible_allocation<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<(Topic, usize)> {
        let mut order: Vec<&Topic> = self.flexible.iter().collect();
        order.shuffle(rng);

        let share = self.flexible_share();
        let total = self.remaining_students as f64;
        let n = order.len();
        // The counter of students still to place, computed from scratch for each step to avoid
        // accumulating floating point errors. It is exactly 0 after the last topic.
        let counter = |k: usize| {
            if k == n {
                0.0
            } else {
                total - k as f64 * share
            }
        };
        order
            .into_iter()
            .enumerate()
            .map(|(k, topic)| {
                let slots = counter(k).round() - counter(k + 1).round();
                (topic.clone(), slots as usize)
            })
            .collect()
    }

    /// Generate the list of slots: one entry per place in a topic. The list has exactly one entry
    /// per student.
    ///
    /// Fixed topics come first (in lexical order), followed by the flexible topics in random
    /// order.
    ///
    /// # Errors
    ///
    /// Fails, if the fixed capacities alone exceed the number of students, as the slots could not
    /// match the students one to one.
    pub fn allocate_slots<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
    ) -> Result<Vec<Topic>, ConfigurationError> {
        let fixed_total: usize = self.fixed.values().sum();
        if fixed_total > self.students {
            return Err(ConfigurationError::FixedCapacityExceeded {
                students: self.students,
                fixed: fixed_total,
            });
        }
        let mut slots = Vec::with_capacity(self.students);
        for (topic, capacity) in self.fixed.iter() {
            debug!("Fixed topic '{}' gets {} slots", topic, capacity);
            slots.extend(std::iter::repeat(topic.clone()).take(*capacity));
        }
        for (topic, capacity) in self.flexible_allocation(rng) {
            debug!("Flexible topic '{}' gets {} slots", topic, capacity);
            slots.extend(std::iter::repeat(topic).take(capacity));
        }
        Ok(slots)
    }
}
