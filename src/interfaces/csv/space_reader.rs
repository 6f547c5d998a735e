use crate::domain::space::NewSpace;
use crate::error::{ParkingError, Result};
use std::io::Read;

/// Reads a space inventory: `location, zone, type, available, external_ref_id`.
/// `available` defaults to `true` and `external_ref_id` may be empty.
pub struct SpaceReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> SpaceReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn spaces(self) -> impl Iterator<Item = Result<NewSpace>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(ParkingError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reader_inventory() {
        let data = "location, zone, type, available, external_ref_id\n\
                    Galle Road, A, Compact, true, EXT-1\n\
                    Kandy Road, B, EV, false, ";
        let spaces: Vec<NewSpace> = SpaceReader::new(data.as_bytes())
            .spaces()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(spaces.len(), 2);
        assert_eq!(spaces[0].space_type, "Compact");
        assert_eq!(spaces[0].external_ref_id.as_deref(), Some("EXT-1"));
        assert!(!spaces[1].available);
        assert_eq!(spaces[1].external_ref_id, None);
    }

    #[test]
    fn test_reader_empty_or_missing_flag_defaults_to_available() {
        let data = "location, zone, type, available, external_ref_id\n\
                    Galle Road, A, Compact, , EXT-1\n\
                    Kandy Road, B, EV";
        let spaces: Vec<NewSpace> = SpaceReader::new(data.as_bytes())
            .spaces()
            .collect::<Result<_>>()
            .unwrap();

        assert!(spaces[0].available);
        assert_eq!(spaces[0].external_ref_id.as_deref(), Some("EXT-1"));
        assert!(spaces[1].available);
        assert_eq!(spaces[1].external_ref_id, None);
    }

    #[test]
    fn test_reader_rejects_bad_flag() {
        let data = "location, zone, type, available, external_ref_id\n\
                    Galle Road, A, Compact, maybe, ";
        let results: Vec<Result<NewSpace>> = SpaceReader::new(data.as_bytes()).spaces().collect();
        assert!(matches!(results[0], Err(ParkingError::Csv(_))));
    }
}
