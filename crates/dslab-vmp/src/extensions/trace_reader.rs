//! Streaming reader of workload traces.
//!
//! Each line is a request with 15 tab-separated fields:
//! `time serviceId datacenterId vmId cpu ram net utilCpu utilRam utilNet revenueCpu revenueRam revenueNet tinit tend`.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, StringRecordsIntoIter};

use crate::core::request::Request;
use crate::core::resources::Resources;
use crate::error::VmpError;

pub const TRACE_FIELDS: usize = 15;

/// Iterator over the requests of a trace.
pub struct TraceReader<R: Read> {
    records: StringRecordsIntoIter<R>,
    line: usize,
}

impl TraceReader<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, VmpError> {
        Ok(Self::from_reader(File::open(path)?))
    }
}

impl<R: Read> TraceReader<R> {
    pub fn from_reader(source: R) -> Self {
        let records = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(source)
            .into_records();
        Self { records, line: 0 }
    }
}

impl<R: Read> Iterator for TraceReader<R> {
    type Item = Result<Request, VmpError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = self.records.next()?;
            self.line += 1;
            let record = match record {
                Ok(record) => record,
                Err(e) => return Some(Err(e.into())),
            };
            if let Some(position) = record.position() {
                self.line = position.line() as usize;
            }
            if record.iter().all(|f| f.is_empty()) {
                continue;
            }
            return Some(parse_request(&record, self.line));
        }
    }
}

/// Reads the whole trace into memory.
pub fn read_trace<P: AsRef<Path>>(path: P) -> Result<Vec<Request>, VmpError> {
    TraceReader::open(path)?.collect()
}

fn parse_request(record: &StringRecord, line: usize) -> Result<Request, VmpError> {
    if record.len() != TRACE_FIELDS {
        return Err(VmpError::Trace {
            line,
            message: format!("expected {} fields, got {}", TRACE_FIELDS, record.len()),
        });
    }
    let int = |i: usize| -> Result<u32, VmpError> {
        record[i].parse::<u32>().map_err(|_| VmpError::Trace {
            line,
            message: format!("field {} is not an unsigned integer: `{}`", i + 1, &record[i]),
        })
    };
    let float = |i: usize| -> Result<f64, VmpError> {
        record[i].parse::<f64>().map_err(|_| VmpError::Trace {
            line,
            message: format!("field {} is not a number: `{}`", i + 1, &record[i]),
        })
    };
    let triple = |from: usize| -> Result<Resources, VmpError> {
        Ok(Resources::new(float(from)?, float(from + 1)?, float(from + 2)?))
    };

    Ok(Request {
        time: int(0)?,
        service_id: int(1)?,
        datacenter_id: int(2)?,
        vm_id: int(3)?,
        resources: triple(4)?,
        utilization: triple(7)?,
        revenue: triple(10)?,
        tinit: int(13)?,
        tend: int(14)?,
    })
}
