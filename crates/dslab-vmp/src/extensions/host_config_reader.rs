//! Reader of host configuration files.
//!
//! Each line describes one host as tab-separated `cpu ram net powerMax`. Host ids are assigned
//! from the 1-based line index.

use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};

use crate::core::physical_machine::PhysicalMachine;
use crate::core::resources::Resources;
use crate::error::VmpError;

const HOST_FIELDS: usize = 4;

/// Reads hosts from the file.
pub fn read_hosts<P: AsRef<Path>>(path: P) -> Result<Vec<PhysicalMachine>, VmpError> {
    let file = std::fs::File::open(path)?;
    read_hosts_from(file)
}

/// Reads hosts from any source with the host file layout.
pub fn read_hosts_from<R: Read>(source: R) -> Result<Vec<PhysicalMachine>, VmpError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);
    let mut hosts = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let line = index + 1;
        let values = parse_fields(&record, line)?;
        let id = hosts.len() as u32 + 1;
        hosts.push(PhysicalMachine::new(
            id,
            Resources::new(values[0], values[1], values[2]),
            values[3],
        ));
    }
    Ok(hosts)
}

fn parse_fields(record: &StringRecord, line: usize) -> Result<[f64; HOST_FIELDS], VmpError> {
    if record.len() < HOST_FIELDS {
        return Err(VmpError::Trace {
            line,
            message: format!("expected {} host fields, got {}", HOST_FIELDS, record.len()),
        });
    }
    let mut values = [0.; HOST_FIELDS];
    for (i, value) in values.iter_mut().enumerate() {
        *value = record[i].parse().map_err(|_| VmpError::Trace {
            line,
            message: format!("invalid host value `{}`", &record[i]),
        })?;
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_ids_follow_line_order() {
        let hosts = read_hosts_from("10\t20\t30\t250\n5\t5\t5\t100\n".as_bytes()).unwrap();
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0].id, 1);
        assert_eq!(hosts[0].capacity, Resources::new(10., 20., 30.));
        assert_eq!(hosts[0].power_max, 250.);
        assert_eq!(hosts[1].id, 2);
    }

    #[test]
    fn test_short_line_is_rejected() {
        let result = read_hosts_from("10\t20\t30\n".as_bytes());
        assert!(matches!(result, Err(VmpError::Trace { line: 1, .. })));
    }
}
