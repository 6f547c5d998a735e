use crate::error::{ParkingError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type SpaceId = u64;

/// Reservation state of a parking space.
///
/// Stored as the boolean `available` flag; `Occupied` means the space has
/// been reserved and not yet released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpaceStatus {
    Available,
    Occupied,
}

impl SpaceStatus {
    pub fn from_available(available: bool) -> Self {
        if available {
            SpaceStatus::Available
        } else {
            SpaceStatus::Occupied
        }
    }

    pub fn is_available(self) -> bool {
        self == SpaceStatus::Available
    }
}

impl fmt::Display for SpaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpaceStatus::Available => f.write_str("AVAILABLE"),
            SpaceStatus::Occupied => f.write_str("OCCUPIED"),
        }
    }
}

/// Parses the administrative status vocabulary.
impl FromStr for SpaceStatus {
    type Err = ParkingError;

    fn from_str(token: &str) -> Result<Self> {
        match token.trim().to_ascii_lowercase().as_str() {
            "available" | "free" | "true" => Ok(SpaceStatus::Available),
            "occupied" | "reserved" | "false" => Ok(SpaceStatus::Occupied),
            _ => Err(ParkingError::InvalidStatusValue(token.to_string())),
        }
    }
}

fn serialize_status<S>(status: &SpaceStatus, serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_bool(status.is_available())
}

fn deserialize_status<'de, D>(deserializer: D) -> std::result::Result<SpaceStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let available = bool::deserialize(deserializer)?;
    Ok(SpaceStatus::from_available(available))
}

/// A single allocatable parking space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingSpace {
    pub id: SpaceId,
    pub location: String,
    pub zone: String,
    #[serde(rename = "type")]
    pub space_type: String,
    /// The only flag consulted by `reserve` and `release`.
    #[serde(
        rename = "available",
        serialize_with = "serialize_status",
        deserialize_with = "deserialize_status"
    )]
    pub status: SpaceStatus,
    pub external_ref_id: Option<String>,
}

impl ParkingSpace {
    pub fn is_available(&self) -> bool {
        self.status.is_available()
    }
}

/// Registration payload for a new space. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewSpace {
    pub location: String,
    pub zone: String,
    #[serde(rename = "type")]
    pub space_type: String,
    #[serde(default = "default_available", deserialize_with = "empty_as_available")]
    pub available: bool,
    #[serde(default)]
    pub external_ref_id: Option<String>,
}

fn default_available() -> bool {
    true
}

fn empty_as_available<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(default_available()),
        Some(flag) => flag.parse().map_err(serde::de::Error::custom),
    }
}

impl NewSpace {
    pub fn new(
        location: impl Into<String>,
        zone: impl Into<String>,
        space_type: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            zone: zone.into(),
            space_type: space_type.into(),
            available: true,
            external_ref_id: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("location", &self.location),
            ("zone", &self.zone),
            ("type", &self.space_type),
        ] {
            if value.trim().is_empty() {
                return Err(ParkingError::InvalidRequest(format!(
                    "{field} cannot be blank"
                )));
            }
        }
        Ok(())
    }

    pub fn into_space(self, id: SpaceId) -> ParkingSpace {
        ParkingSpace {
            id,
            location: self.location,
            zone: self.zone,
            space_type: self.space_type,
            status: SpaceStatus::from_available(self.available),
            external_ref_id: self.external_ref_id,
        }
    }
}

/// Partial update of a space's descriptive fields.
///
/// Only `Some` fields overwrite. Availability is not patchable; it changes
/// through `reserve`, `release` or `set_status`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpacePatch {
    pub location: Option<String>,
    pub zone: Option<String>,
    pub space_type: Option<String>,
    pub external_ref_id: Option<String>,
}

impl SpacePatch {
    pub fn is_empty(&self) -> bool {
        self.location.is_none()
            && self.zone.is_none()
            && self.space_type.is_none()
            && self.external_ref_id.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("location", &self.location),
            ("zone", &self.zone),
            ("type", &self.space_type),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(ParkingError::InvalidRequest(format!(
                    "{field} cannot be blank"
                )));
            }
        }
        Ok(())
    }

    pub fn apply_to(&self, space: &mut ParkingSpace) {
        if let Some(location) = &self.location {
            space.location = location.clone();
        }
        if let Some(zone) = &self.zone {
            space.zone = zone.clone();
        }
        if let Some(space_type) = &self.space_type {
            space.space_type = space_type.clone();
        }
        if let Some(external_ref_id) = &self.external_ref_id {
            space.external_ref_id = Some(external_ref_id.clone());
        }
    }
}

/// Query over spaces. Text fields match case-insensitively as substrings,
/// empty strings are ignored, and all present predicates must hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpaceFilter {
    pub location: Option<String>,
    pub zone: Option<String>,
    pub space_type: Option<String>,
    pub available: Option<bool>,
}

impl SpaceFilter {
    pub fn matches(&self, space: &ParkingSpace) -> bool {
        contains_ignore_case(&space.location, self.location.as_deref())
            && contains_ignore_case(&space.zone, self.zone.as_deref())
            && contains_ignore_case(&space.space_type, self.space_type.as_deref())
            && self
                .available
                .is_none_or(|available| space.is_available() == available)
    }
}

fn contains_ignore_case(value: &str, needle: Option<&str>) -> bool {
    match needle {
        Some(needle) if !needle.is_empty() => value
            .to_lowercase()
            .contains(&needle.to_lowercase()),
        _ => true,
    }
}
