// Capture parsing - raw measurement directories written by the build runner
//
// A capture directory is named after the commit hash and holds mem.json
// (the sampler output), commit_info.txt (author, timestamp, subject) and
// optionally time.txt (GNU time output). Removing time.txt is the way to
// say a capture has no trustworthy cpu measurement.
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tokio::fs;

use crate::domain::commit::CommitId;
use crate::domain::series::{PassTiming, SamplePoint};

const BORS_AUTHOR: &str = "bors bors@rust-lang.org";

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("could not read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not valid JSON")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("time output is malformed: `{0}`")]
    MalformedTime(String),
    #[error("commit info is malformed: `{0}`")]
    MalformedCommitInfo(String),
}

// mirrors the structure of mem.json exactly
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct RawCpuAcct {
    hz: f64,
    usage: u32,
    user: f64,
    system: f64,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct RawMeasurement {
    cli: Option<String>,
    stdout: String,
    stderr: String,
    elapsed: f64,
    cpuacct: RawCpuAcct,
    max_memory: f64,
    memory_data: Vec<SamplePoint>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitInfo {
    pub author: String,
    pub timestamp: u64,
    pub subject: String,
}

impl CommitInfo {
    /// Pull request number for bors merge commits; other commits have none.
    pub fn pull_request(&self) -> Option<u32> {
        if self.author != BORS_AUTHOR {
            return None;
        }
        let start = self.subject.find('#')? + 1;
        let digits = &self.subject[start..];
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        digits[..end].parse().ok()
    }
}

/// Everything a capture directory says about one commit.
#[derive(Debug)]
pub struct RawCapture {
    pub stdout: String,
    pub max_memory: f64,
    pub memory_data: Vec<SamplePoint>,
    pub cpu_time: Option<f64>,
    pub timestamp: u64,
    pub pull_request: Option<u32>,
}

impl RawCapture {
    pub async fn load(dir: &Path) -> Result<Self, CaptureError> {
        let mem_path = dir.join("mem.json");
        let bytes = fs::read(&mem_path).await.map_err(|source| CaptureError::Io {
            path: mem_path.clone(),
            source,
        })?;
        let raw: RawMeasurement =
            serde_json::from_slice(&bytes).map_err(|source| CaptureError::Json {
                path: mem_path,
                source,
            })?;

        // an unreadable time.txt counts as absent; a present one must parse
        let cpu_time = match fs::read_to_string(dir.join("time.txt")).await {
            Ok(raw_time) => {
                let (user, system) = parse_gnu_time(&raw_time)?;
                Some(user + system)
            }
            Err(_) => None,
        };

        let info_path = dir.join("commit_info.txt");
        let raw_info = fs::read_to_string(&info_path)
            .await
            .map_err(|source| CaptureError::Io {
                path: info_path,
                source,
            })?;
        let info = parse_commit_info(&raw_info)?;
        let pull_request = info.pull_request();

        Ok(RawCapture {
            stdout: raw.stdout,
            max_memory: raw.max_memory,
            memory_data: raw.memory_data,
            cpu_time,
            timestamp: info.timestamp,
            pull_request,
        })
    }
}

/// Parse the `Xuser Ysystem ...` summary line GNU time writes.
pub fn parse_gnu_time(raw: &str) -> Result<(f64, f64), CaptureError> {
    let malformed = || CaptureError::MalformedTime(raw.trim().to_string());
    let i = raw.find("user ").ok_or_else(malformed)?;
    let j = raw.find("system ").ok_or_else(malformed)?;
    if j < i + 5 {
        return Err(malformed());
    }
    let user = raw[..i].trim().parse().map_err(|_| malformed())?;
    let system = raw[i + 5..j].trim().parse().map_err(|_| malformed())?;
    Ok((user, system))
}

/// Parse commit_info.txt: author line, unix timestamp line, subject line.
pub fn parse_commit_info(raw: &str) -> Result<CommitInfo, CaptureError> {
    let mut lines = raw.lines();
    match (
        lines.next(),
        lines.next().and_then(|s| s.trim().parse().ok()),
        lines.next(),
    ) {
        (Some(author), Some(timestamp), Some(subject)) => Ok(CommitInfo {
            author: author.trim().to_string(),
            timestamp,
            subject: subject.trim().to_string(),
        }),
        _ => Err(CaptureError::MalformedCommitInfo(raw.trim().to_string())),
    }
}

/// Pull the pass timings out of rustc's `-Z time-passes` output. Lines
/// that do not look like timings are ignored, so an empty or unrelated
/// stdout yields an empty list.
pub fn parse_pass_timings(stdout: &str) -> Vec<PassTiming> {
    let mut passes = Vec::new();
    for line in stdout.lines() {
        let Some(rest) = line.trim_start().strip_prefix("time: ") else {
            continue;
        };
        let Some((value, name)) = rest.split_once('\t') else {
            continue;
        };
        let Some(first) = value.split_whitespace().next() else {
            continue;
        };
        match first.parse::<f64>() {
            Ok(seconds) => passes.push(PassTiming {
                name: name.trim().to_string(),
                seconds,
            }),
            Err(_) => tracing::debug!(line, "unparseable pass timing line"),
        }
    }
    passes
}

/// Find the capture directories under `dir`: immediate subdirectories
/// whose name parses as a commit hash, sorted by hash.
pub async fn scan_captures(dir: &Path) -> Result<Vec<(CommitId, PathBuf)>, CaptureError> {
    let io_error = |source| CaptureError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = fs::read_dir(dir).await.map_err(io_error)?;
    let mut captures = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_error)? {
        let file_type = entry.file_type().await.map_err(|source| CaptureError::Io {
            path: entry.path(),
            source,
        })?;
        if !file_type.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let name = name.to_string_lossy();
        match CommitId::parse(&name) {
            Ok(hash) => captures.push((hash, entry.path())),
            Err(_) => tracing::debug!(%name, "not a capture directory"),
        }
    }
    captures.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(captures)
}

#[cfg(test)]
mod tests {
    use std::fs as std_fs;

    use super::*;

    #[test]
    fn test_parse_gnu_time() {
        let (user, system) =
            parse_gnu_time("10.10user 1.40system 0:12.50elapsed 91%CPU\n").unwrap();
        assert_eq!(user, 10.10);
        assert_eq!(system, 1.40);
    }

    #[test]
    fn test_parse_gnu_time_rejects_other_output() {
        assert!(parse_gnu_time("").is_err());
        assert!(parse_gnu_time("command not found\n").is_err());
        assert!(parse_gnu_time("xuser ysystem \n").is_err());
    }

    #[test]
    fn test_parse_commit_info() {
        let info =
            parse_commit_info("bors bors@rust-lang.org\n1400000000\nauto merge of #13921 : a/b\n")
                .unwrap();
        assert_eq!(info.timestamp, 1400000000);
        assert_eq!(info.pull_request(), Some(13921));
    }

    #[test]
    fn test_pull_request_with_number_at_line_end() {
        let info = parse_commit_info("bors bors@rust-lang.org\n1400000000\nrollup merge #99\n")
            .unwrap();
        assert_eq!(info.pull_request(), Some(99));
    }

    #[test]
    fn test_pull_request_only_for_bors() {
        let info =
            parse_commit_info("Jane Doe jane@example.com\n1400000000\nlanded #123 manually\n")
                .unwrap();
        assert_eq!(info.pull_request(), None);
    }

    #[test]
    fn test_bors_commit_without_number() {
        let info = parse_commit_info("bors bors@rust-lang.org\n1400000000\nmerge things\n").unwrap();
        assert_eq!(info.pull_request(), None);
    }

    #[test]
    fn test_parse_commit_info_needs_three_lines() {
        assert!(parse_commit_info("bors bors@rust-lang.org\n1400000000\n").is_err());
        assert!(parse_commit_info("bors bors@rust-lang.org\nnot-a-stamp\nsubject\n").is_err());
    }

    #[test]
    fn test_parse_pass_timings() {
        let stdout = "time: 0.456\t parsing\n\
                      time: 0.103\t configuration\n\
                      \x20\x20time: 0.011\t intrinsic checking\n\
                      warning: something unrelated\n\
                      time: 1.870\t expansion\n";
        let passes = parse_pass_timings(stdout);
        let names: Vec<&str> = passes.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["parsing", "configuration", "intrinsic checking", "expansion"]
        );
        assert_eq!(passes[3].seconds, 1.870);
    }

    #[test]
    fn test_parse_pass_timings_of_empty_stdout() {
        assert!(parse_pass_timings("").is_empty());
    }

    #[tokio::test]
    async fn test_scan_captures_filters_non_captures() {
        let root = std::env::temp_dir().join(format!(
            "build-telemetry-capture-scan-{}",
            std::process::id()
        ));
        let _ = std_fs::remove_dir_all(&root);
        std_fs::create_dir_all(root.join("ab34fe017cd839e7ba176bbf6e987653b92eb1cb")).unwrap();
        std_fs::create_dir_all(root.join("not-a-hash")).unwrap();
        std_fs::write(root.join("history.txt"), "x").unwrap();

        let captures = scan_captures(&root).await.unwrap();
        assert_eq!(captures.len(), 1);
        assert_eq!(captures[0].0.short(), "ab34fe0");

        std_fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_load_requires_the_measurement_file() {
        let root = std::env::temp_dir().join(format!(
            "build-telemetry-capture-load-{}",
            std::process::id()
        ));
        let _ = std_fs::remove_dir_all(&root);
        std_fs::create_dir_all(&root).unwrap();

        let error = RawCapture::load(&root).await.unwrap_err();
        assert!(matches!(error, CaptureError::Io { .. }));

        std_fs::remove_dir_all(&root).unwrap();
    }
}
