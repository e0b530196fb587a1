use crate::Distribution;
use std::fmt::Write;

/// Format the finished distribution into a human readable String (e.g. to print it to stdout).
///
/// The output format will look like
/// ```text
/// Student assignments:
/// Anton Administrator <anton@example.com>               [3] Compilers
/// …
///
/// Number of assignments per topic:
///    Compilers (1)
///         [3] Anton Administrator <anton@example.com>
/// …
///
/// Breakdown of preference matching:
///    1 x 0
///    3 x 3
///
/// Total students: 4
/// Total score: 9
/// ```
pub fn format_distribution(distribution: &Distribution) -> String {
    let store = distribution.store();
    let mut result = String::new();

    writeln!(result, "Student assignments:").unwrap();
    for (student, topic, pref) in distribution.student_results() {
        let name_email = format!("{} <{}>", student.name, student.email);
        writeln!(result, "{:<70} [{}] {}", name_email, pref, topic).unwrap();
    }
    writeln!(result).unwrap();

    writeln!(result, "Number of assignments per topic:").unwrap();
    for (topic, assigned_emails) in distribution.assignments_by_topic() {
        writeln!(result, "   {} ({})", topic, assigned_emails.len()).unwrap();
        let mut students: Vec<_> = assigned_emails
            .iter()
            .filter_map(|email| store.get_student(email))
            .collect();
        students.sort_by(|a, b| (&a.name, &a.email).cmp(&(&b.name, &b.email)));
        for student in students {
            writeln!(
                result,
                "        [{}] {} <{}>",
                student.preference_for(topic),
                student.name,
                student.email
            )
            .unwrap();
        }
    }
    writeln!(result).unwrap();

    writeln!(result, "Breakdown of preference matching:").unwrap();
    for (pref, count) in distribution.assignment_count() {
        writeln!(result, "   {} x {}", count, pref).unwrap();
    }
    writeln!(result).unwrap();

    if !distribution.unassigned().is_empty() {
        writeln!(result, "Unassigned students:").unwrap();
        for email in distribution.unassigned() {
            match store.get_student(email) {
                Some(student) => {
                    writeln!(result, "   {} <{}>", student.name, student.email).unwrap()
                }
                None => writeln!(result, "   <{}>", email).unwrap(),
            }
        }
        writeln!(result).unwrap();
    }

    writeln!(result, "Total students: {}", store.student_count()).unwrap();
    write!(result, "Total score: {}", distribution.score()).unwrap();
    result
}
