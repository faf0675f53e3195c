//! Core record types for vitalrecords.
//!
//! Birth and death registrations are stored as JSON objects with camelCase
//! field names. Fields the registration workflow writes that are not modelled
//! here are kept in `extra` so a load/save cycle never drops them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Which collection a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// The birth registrations collection.
    Birth,
    /// The death registrations collection.
    Death,
}

impl Origin {
    /// Both origins, in the order views concatenate them.
    pub const ALL: [Origin; 2] = [Origin::Birth, Origin::Death];

    /// The key under which this collection is persisted.
    #[must_use]
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Birth => "birthRecords",
            Self::Death => "deathRecords",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Birth => "birth",
            Self::Death => "death",
        })
    }
}

impl FromStr for Origin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "birth" => Ok(Self::Birth),
            "death" => Ok(Self::Death),
            _ => Err(Error::InvalidOrigin(s.to_string())),
        }
    }
}

/// A record identifier as it appears in storage.
///
/// Stored JSON holds either a number or a string. Identifiers compare by
/// their string form, so `7` and `"7"` name the same record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    /// A numeric identifier.
    Number(i64),
    /// A textual identifier.
    Text(String),
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Number(n), Self::Text(t)) | (Self::Text(t), Self::Number(n)) => {
                *t == n.to_string()
            }
        }
    }
}

impl Eq for RecordId {}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(t) => f.write_str(t),
        }
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

/// Accept strings, numbers, booleans and null for descriptive text fields.
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(s) => s,
        other => other.to_string(),
    })
}

/// Like [`lenient_string`], but null stays absent.
fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

/// Parse a stored timestamp.
///
/// RFC 3339 is what the registration workflow writes; bare dates and naive
/// date-times are read as UTC, and a bare integer as epoch milliseconds.
#[must_use]
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(millis) = raw.parse::<i64>() {
        return DateTime::from_timestamp_millis(millis);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// A registered birth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthRecord {
    /// Identifier, unique within the birth collection.
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub middle_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date_of_birth: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub gender: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub father_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub mother_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub place_of_birth: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub weight: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: String,
    /// When the birth was registered, as stored.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub registration_date: Option<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A registered death.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeathRecord {
    /// Identifier, unique within the death collection.
    pub id: RecordId,
    #[serde(default, deserialize_with = "lenient_string")]
    pub first_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub middle_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub last_name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date_of_birth: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub date_of_death: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub cause_of_death: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub place_of_death: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub gender: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub address: String,
    /// When the death was registered, as stored.
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub registration_date: Option<String>,
    /// Fields not modelled above.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A record from either collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Record {
    /// A birth registration.
    Birth(BirthRecord),
    /// A death registration.
    Death(DeathRecord),
}

impl Record {
    /// Deserialize a single record of the given origin from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a record object.
    pub fn from_value(origin: Origin, value: Value) -> Result<Self> {
        Ok(match origin {
            Origin::Birth => Self::Birth(serde_json::from_value(value)?),
            Origin::Death => Self::Death(serde_json::from_value(value)?),
        })
    }

    /// The collection this record belongs to.
    #[must_use]
    pub fn origin(&self) -> Origin {
        match self {
            Self::Birth(_) => Origin::Birth,
            Self::Death(_) => Origin::Death,
        }
    }

    #[must_use]
    pub fn id(&self) -> &RecordId {
        match self {
            Self::Birth(r) => &r.id,
            Self::Death(r) => &r.id,
        }
    }

    #[must_use]
    pub fn first_name(&self) -> &str {
        match self {
            Self::Birth(r) => &r.first_name,
            Self::Death(r) => &r.first_name,
        }
    }

    #[must_use]
    pub fn last_name(&self) -> &str {
        match self {
            Self::Birth(r) => &r.last_name,
            Self::Death(r) => &r.last_name,
        }
    }

    /// "First Last", as shown in feeds and menus.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name(), self.last_name())
    }

    /// Initials of the first and last name, used for avatars.
    #[must_use]
    pub fn initials(&self) -> String {
        self.first_name()
            .chars()
            .take(1)
            .chain(self.last_name().chars().take(1))
            .collect()
    }

    /// The parsed registration timestamp, if present and readable.
    #[must_use]
    pub fn registered_at(&self) -> Option<DateTime<Utc>> {
        let raw = match self {
            Self::Birth(r) => r.registration_date.as_deref(),
            Self::Death(r) => r.registration_date.as_deref(),
        };
        raw.and_then(parse_timestamp)
    }

    /// Serialize this record to a JSON object.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_object(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(Error::internal("record did not serialize to an object")),
        }
    }

    /// Return a copy of this record with `patch` shallow-merged over it.
    ///
    /// Keys use the stored camelCase names. The identifier may be repeated
    /// in the patch but not changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the patch changes the identifier or produces a
    /// value that is no longer a valid record.
    pub fn patched(&self, patch: &Map<String, Value>) -> Result<Self> {
        if let Some(raw_id) = patch.get("id") {
            let patched_id: RecordId = serde_json::from_value(raw_id.clone())
                .map_err(|e| Error::invalid_patch(format!("bad id: {e}")))?;
            if patched_id != *self.id() {
                return Err(Error::invalid_patch(format!(
                    "cannot change id from {} to {patched_id}",
                    self.id()
                )));
            }
        }

        let mut object = self.to_object()?;
        for (key, value) in patch.iter().filter(|(key, _)| key.as_str() != "id") {
            object.insert(key.clone(), value.clone());
        }

        Self::from_value(self.origin(), Value::Object(object))
            .map_err(|e| Error::invalid_patch(e.to_string()))
    }
}

impl From<BirthRecord> for Record {
    fn from(record: BirthRecord) -> Self {
        Self::Birth(record)
    }
}

impl From<DeathRecord> for Record {
    fn from(record: DeathRecord) -> Self {
        Self::Death(record)
    }
}

/// The key that uniquely names a profile across both collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileKey {
    pub origin: Origin,
    pub id: RecordId,
}

impl fmt::Display for ProfileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.origin, self.id)
    }
}

/// A record annotated with the collection it came from.
///
/// Serializes as the record's own fields plus `"type"`. A `"type"` already
/// carried in the record's unmodelled fields is replaced, never repeated.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    origin: Origin,
    record: Record,
}

impl Serialize for Profile {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut object = self
            .record
            .to_object()
            .map_err(serde::ser::Error::custom)?;
        object.insert("type".to_string(), Value::String(self.origin.to_string()));
        object.serialize(serializer)
    }
}

impl Profile {
    #[must_use]
    pub fn new(record: Record) -> Self {
        Self {
            origin: record.origin(),
            record,
        }
    }

    #[must_use]
    pub fn origin(&self) -> Origin {
        self.origin
    }

    #[must_use]
    pub fn record(&self) -> &Record {
        &self.record
    }

    #[must_use]
    pub fn into_record(self) -> Record {
        self.record
    }

    #[must_use]
    pub fn key(&self) -> ProfileKey {
        ProfileKey {
            origin: self.origin,
            id: self.record.id().clone(),
        }
    }
}

impl From<Record> for Profile {
    fn from(record: Record) -> Self {
        Self::new(record)
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{birth, death};
    use super::*;
    use serde_json::json;

    #[test]
    fn test_origin_display_and_parse() {
        assert_eq!(Origin::Birth.to_string(), "birth");
        assert_eq!(Origin::Death.to_string(), "death");
        assert_eq!("Birth".parse::<Origin>().unwrap(), Origin::Birth);
        assert_eq!(" death ".parse::<Origin>().unwrap(), Origin::Death);
        assert!("marriage".parse::<Origin>().is_err());
    }

    #[test]
    fn test_origin_storage_keys() {
        assert_eq!(Origin::Birth.storage_key(), "birthRecords");
        assert_eq!(Origin::Death.storage_key(), "deathRecords");
    }

    #[test]
    fn test_record_id_compares_by_string_form() {
        assert_eq!(RecordId::Number(7), RecordId::Text("7".to_string()));
        assert_eq!(RecordId::from("7"), RecordId::Number(7));
        assert_eq!(RecordId::from("007"), RecordId::Text("007".to_string()));
        assert_ne!(RecordId::from("007"), RecordId::Number(7));
        assert_ne!(RecordId::Number(7), RecordId::Number(70));
    }

    #[test]
    fn test_birth_record_from_camel_case_json() {
        let record: BirthRecord = serde_json::from_value(json!({
            "id": 1_700_000_000_000_i64,
            "firstName": "Ann",
            "middleName": "Marie",
            "lastName": "Lee",
            "dateOfBirth": "2024-01-01",
            "gender": "female",
            "fatherName": "Tom Lee",
            "motherName": "Sue Lee",
            "placeOfBirth": "Ward 3",
            "weight": 3.2,
            "address": "1 Main St",
            "registrationDate": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(record.id, RecordId::Number(1_700_000_000_000));
        assert_eq!(record.middle_name, "Marie");
        assert_eq!(record.place_of_birth, "Ward 3");
        assert_eq!(record.weight, "3.2");
        assert!(record.extra.is_empty());
    }

    #[test]
    fn test_missing_fields_default() {
        let record: DeathRecord = serde_json::from_value(json!({ "id": "D1" })).unwrap();
        assert_eq!(record.first_name, "");
        assert_eq!(record.cause_of_death, "");
        assert!(record.registration_date.is_none());
    }

    #[test]
    fn test_unknown_fields_survive_round_trip() {
        let value = json!({
            "id": 3,
            "firstName": "Kim",
            "lastName": "Park",
            "attendingPhysician": "Dr. Moss"
        });
        let record = Record::from_value(Origin::Death, value).unwrap();
        let object = record.to_object().unwrap();
        assert_eq!(object["attendingPhysician"], json!("Dr. Moss"));
    }

    #[test]
    fn test_record_accessors() {
        let record = birth(1, "Ann", "Lee", "2024-01-01T00:00:00Z");
        assert_eq!(record.origin(), Origin::Birth);
        assert_eq!(record.display_name(), "Ann Lee");
        assert_eq!(record.initials(), "AL");
        assert_eq!(
            record.registered_at(),
            Some("2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap())
        );
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2024-03-05T10:15:00.123Z").is_some());
        assert!(parse_timestamp("2024-03-05T10:15:00+05:30").is_some());
        assert!(parse_timestamp("2024-03-05T10:15:00").is_some());
        assert!(parse_timestamp("2024-03-05").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_unreadable_timestamp_is_none() {
        let record = death(2, "Bo", "Ray", "not a date");
        assert!(record.registered_at().is_none());
    }

    #[test]
    fn test_patched_merges_fields() {
        let record = birth(1, "Ann", "Lee", "2024-01-01T00:00:00Z");
        let patch = json!({ "lastName": "Park", "weight": "3.4" });
        let patched = record.patched(patch.as_object().unwrap()).unwrap();

        assert_eq!(patched.last_name(), "Park");
        assert_eq!(patched.first_name(), "Ann");
        assert_eq!(patched.id(), record.id());
        match patched {
            Record::Birth(b) => assert_eq!(b.weight, "3.4"),
            Record::Death(_) => panic!("origin changed"),
        }
    }

    #[test]
    fn test_patched_rejects_id_change() {
        let record = birth(1, "Ann", "Lee", "2024-01-01T00:00:00Z");
        let patch = json!({ "id": 2 });
        let err = record.patched(patch.as_object().unwrap()).unwrap_err();
        assert!(matches!(err, Error::InvalidPatch(_)));

        let same = json!({ "id": "1", "firstName": "Anne" });
        assert!(record.patched(same.as_object().unwrap()).is_ok());
    }

    #[test]
    fn test_profile_serializes_with_type_tag() {
        let profile = Profile::new(death(7, "Kim", "Park", "2024-02-01T00:00:00Z"));
        let value = serde_json::to_value(&profile).unwrap();
        assert_eq!(value["type"], json!("death"));
        assert_eq!(value["id"], json!(7));
        assert_eq!(value["firstName"], json!("Kim"));
    }

    #[test]
    fn test_profile_type_key_is_not_repeated() {
        let stored = json!({ "id": 1, "firstName": "Ann", "type": "birth" });
        let record = Record::from_value(Origin::Birth, stored).unwrap();

        let text = serde_json::to_string(&Profile::new(record)).unwrap();
        assert_eq!(text.matches("\"type\"").count(), 1, "{text}");
    }

    #[test]
    fn test_profile_type_reflects_collection() {
        let stale = json!({ "id": 1, "firstName": "Ann", "type": "death" });
        let record = Record::from_value(Origin::Birth, stale).unwrap();

        let value = serde_json::to_value(Profile::new(record.clone())).unwrap();
        assert_eq!(value["type"], json!("birth"));
        assert_eq!(record.to_object().unwrap()["type"], json!("death"));
    }

    #[test]
    fn test_numeric_registration_date_is_epoch_millis() {
        let record = Record::from_value(
            Origin::Death,
            json!({ "id": 4, "registrationDate": 1_704_067_200_000_i64 }),
        )
        .unwrap();
        assert_eq!(
            record.registered_at(),
            Some("2024-01-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap())
        );

        let blank: DeathRecord =
            serde_json::from_value(json!({ "id": 5, "registrationDate": null })).unwrap();
        assert!(blank.registration_date.is_none());
    }

    #[test]
    fn test_profile_key() {
        let profile = Profile::new(birth(9, "Ann", "Lee", "2024-01-01T00:00:00Z"));
        let key = profile.key();
        assert_eq!(key.origin, Origin::Birth);
        assert_eq!(key.to_string(), "birth:9");
    }
}
