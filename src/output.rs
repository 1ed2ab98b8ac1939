//! Output record of the step

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Version emitted by the step
#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Version {
    /// Time of the send attempt
    pub time: DateTime<Utc>,
}

/// One metadata entry
#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct MetadataItem {
    /// Entry name
    pub name: String,
    /// Entry value
    pub value: String,
}

impl MetadataItem {
    fn new(name: &str, value: &str) -> MetadataItem {
        MetadataItem {
            name: name.to_owned(),
            value: value.to_owned(),
        }
    }
}

/// Record describing what was sent
///
/// Metadata always holds `smtp_host`, `subject` and `version`, in this order.
#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
pub struct Output {
    /// Emitted version
    pub version: Version,
    /// Ordered metadata entries
    pub metadata: Vec<MetadataItem>,
}

impl Output {
    /// Creates the record, stamped with the current time
    pub fn new(smtp_host: &str, subject: &str, version: &str) -> Output {
        Output {
            version: Version { time: Utc::now() },
            metadata: vec![
                MetadataItem::new("smtp_host", smtp_host),
                MetadataItem::new("subject", subject),
                MetadataItem::new("version", version),
            ],
        }
    }

    /// Serializes the record
    pub fn to_json(&self) -> Result<Vec<u8>, Error> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod test {
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;
    use serde_json::Value;

    use super::Output;

    #[test]
    fn test_metadata_order() {
        let output = Output::new("smtp.example.org", "Build 42", "1.0.0");
        let names: Vec<_> = output.metadata.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["smtp_host", "subject", "version"]);
        assert_eq!(output.metadata[0].value, "smtp.example.org");
        assert_eq!(output.metadata[1].value, "Build 42");
        assert_eq!(output.metadata[2].value, "1.0.0");
    }

    #[test]
    fn test_json_shape() {
        let before = Utc::now();
        let output = Output::new("h", "s", "v");
        let json: Value = serde_json::from_slice(&output.to_json().unwrap()).unwrap();

        let time = json["version"]["time"].as_str().unwrap();
        let time: DateTime<Utc> = DateTime::parse_from_rfc3339(time).unwrap().into();
        assert!(time >= before && time <= Utc::now());

        assert_eq!(
            json["metadata"],
            serde_json::json!([
                {"name": "smtp_host", "value": "h"},
                {"name": "subject", "value": "s"},
                {"name": "version", "value": "v"},
            ])
        );
    }

    #[test]
    fn test_round_trip_time() {
        let output = Output::new("h", "s", "v");
        let parsed: Output = serde_json::from_slice(&output.to_json().unwrap()).unwrap();
        assert_eq!(parsed, output);
    }
}
