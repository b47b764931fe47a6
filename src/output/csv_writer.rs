// THEORY:
// The only thing this program persists is one CSV line per key frame:
// `time,v0,v1,...` with the time in seconds to two decimals and the cell values
// in row-major order. There is no header and no quoting, since every field is a
// number. The writer streams records as they are produced so a long video never
// has to be held in memory.

use std::io::{self, Write};

/// The result for one key frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub time_seconds: f64,
    pub values: Vec<i64>,
}

pub struct CsvRecordWriter<W: Write> {
    inner: W,
    records_written: usize,
}

impl<W: Write> CsvRecordWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            records_written: 0,
        }
    }

    pub fn write_record(&mut self, time_seconds: f64, values: &[i64]) -> io::Result<()> {
        write!(self.inner, "{time_seconds:.2}")?;
        for value in values {
            write!(self.inner, ",{value}")?;
        }
        writeln!(self.inner)?;
        self.records_written += 1;
        Ok(())
    }

    pub fn write_frame_record(&mut self, record: &FrameRecord) -> io::Result<()> {
        self.write_record(record.time_seconds, &record.values)
    }

    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Flushes and hands back the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}
