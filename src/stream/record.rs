//! Wire records of the live build stream.

use chrono::Utc;
use serde::Serialize;

use crate::process::BuildResult;
use crate::stage::StageInfo;

/// One record of the live stream, serialized as `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum StreamRecord {
    /// Raw, unfiltered stdout chunk.
    Stdout(String),
    /// Raw, unfiltered stderr chunk.
    Stderr(String),
    /// Stage change, only when stage annotations were requested.
    Stage(StageInfo),
    /// The build could not be started.
    Error(String),
    /// Terminal record; nothing follows it.
    Done(BuildResult),
}

#[derive(Serialize)]
struct Envelope<'a> {
    #[serde(flatten)]
    record: &'a StreamRecord,
    timestamp: i64,
}

impl StreamRecord {
    /// Wire name of the record type.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Stdout(_) => "stdout",
            Self::Stderr(_) => "stderr",
            Self::Stage(_) => "stage",
            Self::Error(_) => "error",
            Self::Done(_) => "done",
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_))
    }

    /// JSON payload with a millisecond timestamp attached.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&Envelope {
            record: self,
            timestamp: Utc::now().timestamp_millis(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Completion;
    use crate::stage::Stage;

    #[test]
    fn test_stdout_record_json() {
        let json: serde_json::Value =
            serde_json::from_str(&StreamRecord::Stdout("hi\n".into()).to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "stdout");
        assert_eq!(json["data"], "hi\n");
        assert!(json["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_done_record_json() {
        let result = BuildResult::new(&Completion::Exited(1), String::new(), "boom".into());
        let record = StreamRecord::Done(result);
        assert!(record.is_terminal());

        let json: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(json["type"], "done");
        assert_eq!(json["data"]["ok"], false);
        assert_eq!(json["data"]["exitCode"], 1);
        assert_eq!(json["data"]["stderr"], "boom");
    }

    #[test]
    fn test_stage_record_json() {
        let record = StreamRecord::Stage(Stage::DownloadingToolchain.info());
        assert_eq!(record.kind(), "stage");

        let json: serde_json::Value = serde_json::from_str(&record.to_json().unwrap()).unwrap();
        assert_eq!(json["data"]["stage"], "downloading_toolchain");
        assert_eq!(json["data"]["indeterminate"], true);
    }
}
