//! IO functionality for writing the finished distribution as JSON result file.

use crate::{Algorithm, Distribution, Lecturers};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::json;

/// Write the finished distribution as JSON document to a Writer (e.g. an output file).
///
/// The document contains a `meta` object with the time of the assignment and the algorithm, and an `assignments`
/// list with one entry per assigned student (sorted by name and email): the student's name, email, all their
/// preferences, the assigned topic, the preference value they got for it and the lecturer metadata of the topic (or
/// null).
pub fn write<W: std::io::Write>(
    writer: W,
    distribution: &Distribution,
    lecturers: &Lecturers,
    algorithm: Algorithm,
    assigned_at: DateTime<Utc>,
) -> Result<(), String> {
    let assignments: Vec<serde_json::Value> = distribution
        .student_results()
        .into_iter()
        .map(|(student, topic, pref)| {
            json!({
                "name": student.name,
                "email": student.email,
                "topic": topic,
                "prefs": student.prefs,
                "picked_pref": pref,
                "lecturer": lecturers.get(topic),
            })
        })
        .collect();
    let data = json!({
        "meta": {
            "assigned_at_utc": assigned_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            "algorithm": algorithm.name(),
            "score": distribution.score(),
            "unassigned": distribution.unassigned(),
        },
        "assignments": assignments,
    });
    serde_json::to_writer_pretty(writer, &data).map_err(|e| format!("{}", e))?;

    Ok(())
}
