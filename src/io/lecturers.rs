//! IO functionality for reading the lecturer metadata file.

use crate::Lecturers;

/// Read the lecturer metadata from a JSON object, which maps each topic to an object with the optional keys
/// `max_topics` (fixed number of students for this topic) and `exclude` (list of student email addresses with a
/// conflict of interest). Other keys are kept and passed through to the result file.
pub fn read<R: std::io::Read>(reader: R) -> Result<Lecturers, String> {
    serde_json::from_reader(reader).map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    #[test]
    fn parse_lecturer_file() {
        let data = include_bytes!("test_ressources/lecturers.json");
        let lecturers = super::read(&data[..]).unwrap();

        assert_eq!(lecturers.len(), 3);
        let compilers = &lecturers["Compilers"];
        assert_eq!(compilers.max_topics, Some(1));
        assert!(compilers.excludes("emil@example.com"));
        assert!(!compilers.excludes("anton@example.com"));
        assert_eq!(compilers.extra["name"], "Prof. Dr. Ada Lovelace");

        let networks = &lecturers["Networks"];
        assert_eq!(networks.max_topics, None);
        assert!(networks.exclude.is_empty());

        assert_eq!(lecturers["Databases"].max_topics, Some(0));
    }

    #[test]
    fn parse_invalid_lecturer_file() {
        let data = r#"{"Compilers": {"max_topics": "three"}}"#;
        assert!(super::read(data.as_bytes()).is_err());
        let data = r#"["Compilers"]"#;
        assert!(super::read(data.as_bytes()).is_err());
    }

    #[test]
    fn passthrough_of_extra_fields() {
        let data = r#"{"A": {"name": "Bob", "room": 12, "exclude": ["x@y"]}}"#;
        let lecturers = super::read(data.as_bytes()).unwrap();
        let value = serde_json::to_value(&lecturers["A"]).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"name": "Bob", "room": 12, "exclude": ["x@y"]})
        );
    }
}
