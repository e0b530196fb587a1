//! IO functionality for reading the students and their topic preferences.

use crate::{PreferenceStore, Student};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Number of leading student metadata columns in the preference CSV file
const METADATA_COLUMNS: usize = 4;
/// Column index of the student's name
const NAME_COLUMN: usize = 0;
/// Column index of the student's email address
const EMAIL_COLUMN: usize = 2;

/// Read students and their preferences from a CSV file (e.g. exported from a survey tool).
///
/// The first record is the header: The first four columns contain student metadata (name in column 0, email address
/// in column 2), each further column is one topic. Every other record holds one student, with an integer preference
/// value for each topic. Zero values are dropped. All topics of the header are added to the store, even if no one
/// chose them. A leading UTF-8 byte order mark is skipped. Quoted fields may contain line breaks.
///
/// # Errors
///
/// Fails with a string error message to be displayed to the user, if the file cannot be read, a record has less
/// columns than the header, or a preference value is not an integer.
pub fn read_csv<R: std::io::Read>(mut reader: R) -> Result<PreferenceStore, String> {
    let mut data = String::new();
    reader.read_to_string(&mut data).map_err(|e| e.to_string())?;
    let data = data.trim_start_matches('\u{feff}');

    let mut store = PreferenceStore::new();
    let mut records = split_csv_records(data).into_iter();
    let topics: Vec<String> = match records.next() {
        Some((_lineno, header)) => header.into_iter().skip(METADATA_COLUMNS).collect(),
        None => return Ok(store),
    };
    store.add_topics(topics.iter().cloned());

    for (lineno, fields) in records {
        if fields.len() < METADATA_COLUMNS + topics.len() {
            return Err(format!(
                "Line {} has {} columns, expected {}",
                lineno,
                fields.len(),
                METADATA_COLUMNS + topics.len()
            ));
        }
        let mut prefs = BTreeMap::new();
        for (topic, value) in topics.iter().zip(fields[METADATA_COLUMNS..].iter()) {
            let value: u32 = value.trim().parse().map_err(|e: std::num::ParseIntError| {
                format!(
                    "Invalid preference value '{}' for topic '{}' in line {}: {}",
                    value, topic, lineno, e
                )
            })?;
            if value != 0 {
                prefs.insert(topic.clone(), value);
            }
        }
        store.add_student(Student {
            name: fields[NAME_COLUMN].clone(),
            email: fields[EMAIL_COLUMN].clone(),
            prefs,
        });
    }

    Ok(store)
}

/// Split CSV data into records of fields, each with the (1-based) line number the record starts at. Fields may be
/// quoted with `"`. Quotes within quoted fields are escaped by doubling them, line breaks within quoted fields are
/// part of the field. Blank lines are skipped.
fn split_csv_records(data: &str) -> Vec<(usize, Vec<String>)> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut lineno = 1;
    let mut record_start = 1;
    let mut chars = data.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' {
            lineno += 1;
        }
        match c {
            '"' if quoted => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    quoted = false;
                }
            }
            '"' if current.is_empty() => quoted = true,
            _ if quoted => current.push(c),
            ',' => fields.push(std::mem::take(&mut current)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                fields.push(std::mem::take(&mut current));
                if !(fields.len() == 1 && fields[0].trim().is_empty()) {
                    records.push((record_start, std::mem::take(&mut fields)));
                }
                fields.clear();
                record_start = lineno;
            }
            _ => current.push(c),
        }
    }
    if !fields.is_empty() || !current.trim().is_empty() {
        fields.push(current);
        records.push((record_start, fields));
    }
    records
}

/// A student entry of the student roster JSON file
#[derive(Deserialize, Debug)]
struct RosterEntry {
    vorname: String,
    nachname: String,
    #[serde(rename = "mail-dh")]
    email: String,
}

/// Read a student roster from a JSON file: a list of objects with `vorname`, `nachname` and `mail-dh` fields.
///
/// The students are added without any preferences. This way, students who did not answer the survey are assigned,
/// too, when the roster is merged with the preference CSV files.
pub fn read_student_json<R: std::io::Read>(reader: R) -> Result<PreferenceStore, String> {
    let entries: Vec<RosterEntry> = serde_json::from_reader(reader).map_err(|err| err.to_string())?;
    let mut store = PreferenceStore::new();
    for entry in entries {
        store.add_student(Student {
            name: format!("{} {}", entry.vorname, entry.nachname),
            email: entry.email,
            prefs: Default::default(),
        });
    }
    Ok(store)
}

#[cfg(test)]
mod tests {
    #[test]
    fn parse_preference_csv() {
        let data = include_bytes!("test_ressources/preferences.csv");
        let store = super::read_csv(&data[..]).unwrap();

        assert_eq!(store.student_count(), 4);
        assert_eq!(store.topic_count(), 4);
        let topics: Vec<&String> = store.topics().collect();
        assert_eq!(topics, vec!["Compilers", "Databases", "Networks", "Operating Systems"]);

        let anton = store.get_student("anton@example.com").unwrap();
        assert_eq!(anton.name, "Anton Administrator");
        assert_eq!(anton.prefs.len(), 3);
        assert_eq!(anton.preference_for("Compilers"), 3);
        assert_eq!(anton.preference_for("Networks"), 0);

        let doe = store.get_student("doe@example.com").unwrap();
        assert_eq!(doe.name, "Doe, Jane \"JD\"");
        assert!(doe.prefs.is_empty());
    }

    #[test]
    fn parse_invalid_csv() {
        let data = "Name,Id,Email,Date,A,B\nAnton,1,anton@x,today,3,x\n";
        let result = super::read_csv(data.as_bytes());
        assert!(result.unwrap_err().contains("line 2"));

        let data = "Name,Id,Email,Date,A,B\nAnton,1,anton@x,today,3\n";
        assert!(super::read_csv(data.as_bytes()).is_err());
    }

    #[test]
    fn parse_student_json() {
        let data = include_bytes!("test_ressources/students.json");
        let mut store = super::read_student_json(&data[..]).unwrap();
        assert_eq!(store.student_count(), 2);
        assert_eq!(store.topic_count(), 0);
        assert_eq!(store.get_student("carla@example.com").unwrap().name, "Carla Clown");

        // Merge with survey results: students with preferences replace the roster entries
        let csv = include_bytes!("test_ressources/preferences.csv");
        store.merge(super::read_csv(&csv[..]).unwrap());
        assert_eq!(store.student_count(), 5);
        assert_eq!(
            store.get_student("anton@example.com").unwrap().preference_for("Compilers"),
            3
        );
        assert!(store.get_student("carla@example.com").unwrap().prefs.is_empty());
    }

    #[test]
    fn split_quoted_fields() {
        assert_eq!(
            super::split_csv_records("a,\"b,c\",\"d \"\"e\"\"\",,f\r\n\r\ng,h"),
            vec![
                (1, vec!["a".to_string(), "b,c".into(), "d \"e\"".into(), "".into(), "f".into()]),
                (3, vec!["g".to_string(), "h".into()]),
            ]
        );
    }

    #[test]
    fn parse_multiline_quoted_name() {
        let data = include_bytes!("test_ressources/preferences_multiline.csv");
        let store = super::read_csv(&data[..]).unwrap();

        assert_eq!(store.student_count(), 2);
        let anton = store.get_student("anton@example.com").unwrap();
        assert_eq!(anton.name, "Anton\nAdministrator");
        assert_eq!(anton.preference_for("Compilers"), 3);
        let bertalotta = store.get_student("bertalotta@example.com").unwrap();
        assert_eq!(bertalotta.preference_for("Databases"), 2);

        // Errors refer to the line the record starts at
        let data = concat!(
            "Name,Id,Email,Date,A\n",
            "\"Anton\nAdmin\",1,anton@x,today,3\n",
            "\"Emil\",2,emil@x,today,x\n"
        );
        let err = super::read_csv(data.as_bytes()).unwrap_err();
        assert!(err.contains("line 4"), "{}", err);
    }
}
