use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::vars::{VarChange, Variables};

/// How read responses are written to the exchange log. `Diffed` writes the
/// first read in full and afterwards only the variables that changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLogMode {
    Full,
    Diffed,
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum Direction {
    Req,
    Resp,
    Fail,
}

/// One NDJSON line. Exchanges are correlated by `id`.
#[derive(Serialize)]
struct Entry<'a> {
    ts: String,
    id: &'a str,
    dir: Direction,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    full: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    body: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    changes: Option<Vec<VarChange>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl<'a> Entry<'a> {
    fn new(id: &'a str, dir: Direction) -> Self {
        Self {
            ts: Utc::now().to_rfc3339(),
            id,
            dir,
            action: None,
            full: None,
            body: None,
            changes: None,
            error: None,
        }
    }
}

pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
    previous: Option<Variables>,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            mode,
            file,
            previous: None,
        })
    }

    pub fn log_request(&mut self, id: &str, action: &str, body: &Value) {
        self.write(Entry {
            action: Some(action),
            body: Some(body),
            ..Entry::new(id, Direction::Req)
        });
    }

    pub fn log_response(&mut self, id: &str, body: &Value) {
        self.write(Entry {
            body: Some(body),
            ..Entry::new(id, Direction::Resp)
        });
    }

    pub fn log_failure(&mut self, id: &str, error: &str) {
        self.write(Entry {
            error: Some(error),
            ..Entry::new(id, Direction::Fail)
        });
    }

    /// Read responses go through here so diffed mode can track the last snapshot.
    pub fn log_read(&mut self, id: &str, body: &Value, vars: &Variables) {
        if self.mode == MessageLogMode::Full {
            self.log_response(id, body);
            return;
        }

        let entry = match self.previous.replace(vars.clone()) {
            Some(prev) => Entry {
                changes: Some(prev.diff(vars)),
                ..Entry::new(id, Direction::Resp)
            },
            None => Entry {
                full: Some(true),
                body: Some(body),
                ..Entry::new(id, Direction::Resp)
            },
        };
        self.write(entry);
    }

    fn write(&mut self, entry: Entry<'_>) {
        let line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => {
                warn!("failed to encode log entry: {e}");
                return;
            }
        };
        if let Err(e) = writeln!(self.file, "{line}") {
            warn!("failed to write log entry: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::JnapVar;
    use serde_json::json;
    use tempfile::NamedTempFile;

    fn read_lines(path: &str) -> Vec<Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn vars(pairs: &[(&str, &str)]) -> Variables {
        Variables::from_response(pairs.iter().map(|(k, v)| JnapVar::new(*k, *v)))
    }

    #[test]
    fn log_request_writes_ndjson() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, path).unwrap();
        logger.log_request("abc", "http://phyn.com/jnap/uponorsky/GetAttributes", &json!({}));

        let lines = read_lines(path);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["dir"], "req");
        assert_eq!(lines[0]["id"], "abc");
        assert!(lines[0]["action"].as_str().unwrap().ends_with("GetAttributes"));
        assert!(lines[0]["ts"].as_str().is_some());
    }

    #[test]
    fn diffed_mode_logs_full_first_then_changes() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Diffed, path).unwrap();

        let first = vars(&[("C1_T1_room_temperature", "680")]);
        logger.log_read("1", &json!({"result": "OK"}), &first);
        let second = vars(&[("C1_T1_room_temperature", "684")]);
        logger.log_read("2", &json!({"result": "OK"}), &second);

        let lines = read_lines(path);
        assert_eq!(lines[0]["full"], true);
        assert!(lines[0]["body"].is_object());
        let changes = lines[1]["changes"].as_array().unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0]["name"], "C1_T1_room_temperature");
        assert_eq!(changes[0]["old"], "680");
        assert_eq!(changes[0]["new"], "684");
    }

    #[test]
    fn diffed_mode_no_changes_logs_empty_array() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Diffed, path).unwrap();

        let same = vars(&[("sys_heat_cool_mode", "0")]);
        logger.log_read("1", &json!({}), &same);
        logger.log_read("2", &json!({}), &same);

        let lines = read_lines(path);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1]["changes"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn full_mode_always_writes_body() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, path).unwrap();

        let v = vars(&[("sys_heat_cool_mode", "0")]);
        logger.log_read("1", &json!({"result": "OK"}), &v);
        logger.log_read("2", &json!({"result": "OK"}), &v);

        let lines = read_lines(path);
        assert!(lines.iter().all(|l| l["body"]["result"] == "OK"));
    }

    #[test]
    fn log_failure_records_error() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let mut logger = MessageLogger::new(MessageLogMode::Full, path).unwrap();
        logger.log_failure("x", "connection refused");

        let lines = read_lines(path);
        assert_eq!(lines[0]["dir"], "fail");
        assert_eq!(lines[0]["error"], "connection refused");
    }
}
