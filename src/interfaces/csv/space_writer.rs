use crate::domain::space::ParkingSpace;
use crate::error::Result;
use std::io::Write;

/// Writes spaces as CSV: `id,location,zone,type,available,external_ref_id`.
pub struct SpaceWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> SpaceWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_spaces<'a, I>(&mut self, spaces: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a ParkingSpace>,
    {
        for space in spaces {
            self.writer.serialize(space)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
