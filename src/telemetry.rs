// src/telemetry.rs - CSV telemetry stream (one row per tick)
use crate::monitor::TickReport;
use csv::{Writer, WriterBuilder};
use std::io::Write;

/// Rows are `timestamp,x,y,z,magnitude,activity,counter`. A finished run is
/// flagged with a row of seven zeros followed by the message.
pub struct TelemetryWriter<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> TelemetryWriter<W> {
    pub fn new(inner: W) -> Self {
        let writer = WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(inner);
        Self { writer }
    }

    pub fn write_tick(&mut self, report: &TickReport) -> Result<(), csv::Error> {
        let sample = &report.output.sample;
        self.writer.write_record([
            sample.timestamp_ms.to_string(),
            sample.x.to_string(),
            sample.y.to_string(),
            sample.z.to_string(),
            report.output.magnitude.to_string(),
            report.output.activity.to_string(),
            report.counter.to_string(),
        ])?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_finished(&mut self, message: &str) -> Result<(), csv::Error> {
        self.writer.write_record(["0", "0", "0", "0", "0", "0", "0", message])?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W, csv::Error> {
        self.writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::hardware::RawSample;
    use crate::monitor::Monitor;

    #[test]
    fn test_tick_row_layout() {
        let mut monitor = Monitor::new(&Config::default(), 0);
        let report = monitor.tick(RawSample::new(8000, 0, 16000), 1234);
        let mut telemetry = TelemetryWriter::new(Vec::new());
        telemetry.write_tick(&report).unwrap();
        let out = String::from_utf8(telemetry.into_inner().unwrap()).unwrap();
        let fields: Vec<&str> = out.trim_end().split(',').collect();
        assert_eq!(fields.len(), 7);
        assert_eq!(fields[0], "1234");
        assert_eq!(fields[1], "0.5");
        assert_eq!(fields[3], "1");
        assert_eq!(fields[6], "0");
    }

    #[test]
    fn test_finished_row_is_flagged() {
        let mut telemetry = TelemetryWriter::new(Vec::new());
        telemetry.write_finished("Washing done at 661000").unwrap();
        let out = String::from_utf8(telemetry.into_inner().unwrap()).unwrap();
        assert_eq!(out, "0,0,0,0,0,0,0,Washing done at 661000\n");
    }
}
