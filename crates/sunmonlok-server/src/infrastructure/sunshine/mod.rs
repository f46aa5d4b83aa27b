//! Sunshine monitor-index source.
//!
//! Sunshine numbers the monitors it can stream in its own order and prints
//! that order to its log:
//!
//! ```text
//! -------- Start of Wayland monitor list --------
//! Monitor 0 is HDMI-A-1: XXX Projector (HDMI-A-1)
//! Monitor 1 is DP-1: Dell U2720Q (DP-1)
//! Monitor 2 is SUNSHINE:
//! --------- End of Wayland monitor list ---------
//! ```
//!
//! The most recent block wins. The journal is read first
//! (`journalctl -xe --no-pager -n 1000`); if it holds no complete block the
//! known log file locations are tried in order.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use sunmonlok_core::{IndexSourceError, MonitorId, MonitorIndexSource};
use tracing::{debug, info};

use crate::infrastructure::display::run_command;

const START_MARKER: &str = "-------- Start of Wayland monitor list --------";
const END_MARKER: &str = "--------- End of Wayland monitor list ---------";

/// Upper bound on the `journalctl` call.
pub const JOURNAL_TIMEOUT: Duration = Duration::from_secs(5);

/// Reads Sunshine's monitor order from the journal or its log files.
pub struct SunshineIndexSource {
    log_files: Vec<PathBuf>,
    use_journal: bool,
}

impl SunshineIndexSource {
    /// Journal first, then the default log file locations.
    pub fn new() -> Self {
        Self {
            log_files: default_log_files(),
            use_journal: true,
        }
    }

    /// Reads only the given log files, skipping the journal.
    pub fn from_log_files(log_files: Vec<PathBuf>) -> Self {
        Self {
            log_files,
            use_journal: false,
        }
    }

    async fn from_journal(&self) -> Option<HashMap<String, MonitorId>> {
        let args = ["-xe", "--no-pager", "-n", "1000"];
        let stdout = match run_command("journalctl", &args, JOURNAL_TIMEOUT).await {
            Ok(stdout) => stdout,
            Err(e) => {
                debug!("journalctl unavailable: {e}");
                return None;
            }
        };
        match parse_monitor_list(&stdout) {
            Ok(Some(map)) if !map.is_empty() => {
                info!(monitors = map.len(), "parsed Sunshine monitor list from journal");
                Some(map)
            }
            Ok(_) => None,
            Err(e) => {
                debug!("journal monitor list rejected: {e}");
                None
            }
        }
    }

    async fn from_log_file(path: &Path) -> Result<Option<HashMap<String, MonitorId>>, IndexSourceError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                debug!(path = %path.display(), "cannot read Sunshine log: {e}");
                return Ok(None);
            }
        };
        let map = parse_monitor_list(&content)?;
        if let Some(map) = &map {
            info!(path = %path.display(), monitors = map.len(), "parsed Sunshine monitor list from log file");
        }
        Ok(map)
    }
}

impl Default for SunshineIndexSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MonitorIndexSource for SunshineIndexSource {
    async fn load_index_map(&self) -> Result<HashMap<String, MonitorId>, IndexSourceError> {
        if self.use_journal {
            if let Some(map) = self.from_journal().await {
                return Ok(map);
            }
        }

        for path in &self.log_files {
            if let Some(map) = Self::from_log_file(path).await? {
                return Ok(map);
            }
        }

        Err(IndexSourceError::Unavailable(
            "no Sunshine monitor list found in journal or log files".to_string(),
        ))
    }
}

/// Known Sunshine log file locations, most specific first.
pub fn default_log_files() -> Vec<PathBuf> {
    let mut paths = Vec::new();
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        paths.push(home.join(".local/share/sunshine/sunshine.log"));
        paths.push(home.join(".config/sunshine/sunshine.log"));
    }
    paths.push(PathBuf::from("/var/log/sunshine/sunshine.log"));
    paths.push(PathBuf::from("/tmp/sunshine.log"));
    paths
}

/// Extracts `NAME -> N` from the last complete monitor list block in `text`.
///
/// Returns `Ok(None)` when no complete block exists.
///
/// # Errors
///
/// [`IndexSourceError::InvalidIndex`] when a listed index does not fit a
/// [`MonitorId`].
pub fn parse_monitor_list(text: &str) -> Result<Option<HashMap<String, MonitorId>>, IndexSourceError> {
    let Some(start) = text.rfind(START_MARKER) else {
        return Ok(None);
    };
    let block = &text[start + START_MARKER.len()..];
    let Some(end) = block.find(END_MARKER) else {
        return Ok(None);
    };

    let mut map = HashMap::new();
    for line in block[..end].lines() {
        if let Some((name, index)) = parse_monitor_line(line) {
            let id = u8::try_from(index)
                .map(MonitorId::new)
                .map_err(|_| IndexSourceError::InvalidIndex {
                    name: name.to_string(),
                    index,
                })?;
            debug!(monitor = name, index = id.get(), "Sunshine monitor");
            map.insert(name.to_string(), id);
        }
    }
    Ok(Some(map))
}

/// Matches `… Monitor <N> is <NAME>:<DESCRIPTION>` anywhere in the line.
///
/// Indices too long for `u64` saturate so they are still reported as invalid.
fn parse_monitor_line(line: &str) -> Option<(&str, u64)> {
    let after = &line[line.find("Monitor ")? + "Monitor ".len()..];
    let (index, rest) = after.split_once(" is ")?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (name, _description) = rest.split_once(':')?;
    let name = name.trim();
    let index = index.parse::<u64>().unwrap_or(u64::MAX);
    (!name.is_empty()).then_some((name, index))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn block(lines: &[&str]) -> String {
        format!("{START_MARKER}\n{}\n{END_MARKER}\n", lines.join("\n"))
    }

    #[test]
    fn test_parse_monitor_list_maps_names_to_indices() {
        // Arrange
        let text = block(&[
            "[2024-05-01 10:00:00]: Info: Monitor 0 is HDMI-A-1: XXX Projector (HDMI-A-1)",
            "[2024-05-01 10:00:00]: Info: Monitor 1 is DP-1: Dell U2720Q (DP-1)",
            "[2024-05-01 10:00:00]: Info: Monitor 2 is SUNSHINE:",
        ]);

        // Act
        let map = parse_monitor_list(&text).unwrap().expect("block present");

        // Assert
        assert_eq!(map.len(), 3);
        assert_eq!(map["HDMI-A-1"], MonitorId::new(0));
        assert_eq!(map["DP-1"], MonitorId::new(1));
        assert_eq!(map["SUNSHINE"], MonitorId::new(2));
    }

    #[test]
    fn test_parse_monitor_list_uses_last_block() {
        let text = format!(
            "{}noise\n{}",
            block(&["Monitor 0 is DP-1: old"]),
            block(&["Monitor 0 is DP-2: new", "Monitor 1 is DP-1: new"])
        );

        let map = parse_monitor_list(&text).unwrap().unwrap();

        assert_eq!(map["DP-1"], MonitorId::new(1));
        assert_eq!(map["DP-2"], MonitorId::new(0));
    }

    #[test]
    fn test_parse_monitor_list_without_block_is_none() {
        assert_eq!(parse_monitor_list("just some log lines\n"), Ok(None));
    }

    #[test]
    fn test_parse_monitor_list_unterminated_block_is_none() {
        let text = format!("{START_MARKER}\nMonitor 0 is DP-1: x\n");
        assert_eq!(parse_monitor_list(&text), Ok(None));
    }

    #[test]
    fn test_parse_monitor_list_rejects_oversized_index() {
        let text = block(&["Monitor 300 is DP-9: too many"]);

        let result = parse_monitor_list(&text);

        assert_eq!(
            result,
            Err(IndexSourceError::InvalidIndex {
                name: "DP-9".to_string(),
                index: 300,
            })
        );
    }

    #[test]
    fn test_parse_monitor_line_ignores_unrelated_lines() {
        assert_eq!(parse_monitor_line("Monitor list follows"), None);
        assert_eq!(parse_monitor_line("Monitor x is DP-1: nope"), None);
        assert_eq!(parse_monitor_line("Monitor 1 is DP-1"), None);
    }

    #[tokio::test]
    async fn test_log_file_source_reads_first_file_with_a_block() {
        // Arrange: the first path does not exist, the second holds a list
        let dir = std::env::temp_dir().join(format!("sunmonlok-sunshine-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let log = dir.join("sunshine.log");
        let mut file = std::fs::File::create(&log).unwrap();
        file.write_all(block(&["Monitor 0 is DP-3: desk"]).as_bytes()).unwrap();
        let source = SunshineIndexSource::from_log_files(vec![dir.join("missing.log"), log.clone()]);

        // Act
        let map = source.load_index_map().await;

        // Assert
        let _ = std::fs::remove_dir_all(&dir);
        let map = map.expect("log file parsed");
        assert_eq!(map.get("DP-3"), Some(&MonitorId::new(0)));
    }

    #[tokio::test]
    async fn test_log_file_source_with_nothing_found_is_unavailable() {
        let source = SunshineIndexSource::from_log_files(vec![PathBuf::from("/nonexistent/sunshine.log")]);

        let result = source.load_index_map().await;

        assert!(matches!(result, Err(IndexSourceError::Unavailable(_))));
    }
}
