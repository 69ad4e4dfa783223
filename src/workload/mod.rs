//! Workload file parsing for the benchmark driver.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::warn;

/// Fixed value size used for workload writes.
pub const DEFAULT_VALUE_LEN: usize = 1024;

/// The 1 KiB filler value written for every workload write.
pub fn default_value() -> Vec<u8> {
    vec![b'*'; DEFAULT_VALUE_LEN]
}

/// One line of a workload file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkloadOp {
    Read { key: String },
    Write { key: String },
    Scan { key: String, limit: usize },
}

/// Parses a workload file.
///
/// Line format, one operation per line:
/// - `0,<key>`         read
/// - `1,<key>`         write (fixed 1 KiB value)
/// - `2,<key>,<limit>` scan
///
/// Malformed lines are skipped with a warning, matching how partially
/// generated workloads are normally replayed.
pub fn load(path: &Path) -> Result<Vec<WorkloadOp>> {
    let file =
        File::open(path).with_context(|| format!("failed to open workload file {path:?}"))?;
    let reader = BufReader::new(file);

    let mut operations = Vec::new();
    for (number, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read workload file {path:?}"))?;
        if line.is_empty() {
            continue;
        }
        match parse_line(&line) {
            Some(op) => operations.push(op),
            None => warn!(
                component = "workload",
                event = "malformed_line",
                line = number + 1,
                content = %line,
                "skipping line"
            ),
        }
    }
    Ok(operations)
}

fn parse_line(line: &str) -> Option<WorkloadOp> {
    let mut fields = line.split(',');
    let command = fields.next()?;
    let key = fields.next()?.to_string();
    if key.is_empty() {
        return None;
    }
    match command {
        "0" => Some(WorkloadOp::Read { key }),
        "1" => Some(WorkloadOp::Write { key }),
        "2" => {
            let limit = fields.next()?.trim().parse().ok()?;
            Some(WorkloadOp::Scan { key, limit })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_parse_line_variants() {
        assert_eq!(
            parse_line("0,user:1"),
            Some(WorkloadOp::Read {
                key: "user:1".to_string()
            })
        );
        assert_eq!(
            parse_line("1,user:2"),
            Some(WorkloadOp::Write {
                key: "user:2".to_string()
            })
        );
        assert_eq!(
            parse_line("2,user:,25"),
            Some(WorkloadOp::Scan {
                key: "user:".to_string(),
                limit: 25
            })
        );
    }

    #[test]
    fn test_parse_line_rejects_garbage() {
        assert_eq!(parse_line("3,key"), None);
        assert_eq!(parse_line("2,key"), None);
        assert_eq!(parse_line("2,key,abc"), None);
        assert_eq!(parse_line("0,"), None);
    }

    #[test]
    fn test_load_skips_bad_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "1,a").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "nonsense").unwrap();
        writeln!(file, "2,a,10").unwrap();
        let ops = load(file.path()).unwrap();
        assert_eq!(ops.len(), 2);
        assert_eq!(
            ops[1],
            WorkloadOp::Scan {
                key: "a".to_string(),
                limit: 10
            }
        );
    }

    #[test]
    fn test_default_value_is_one_kib_of_stars() {
        let value = default_value();
        assert_eq!(value.len(), 1024);
        assert!(value.iter().all(|&b| b == b'*'));
    }
}
