use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::player::{LastAction, PlayerId};
use crate::table::Stage;

/// One action as it happened, kept for the hand record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionRecord {
    pub player_id: PlayerId,
    pub stage: Stage,
    pub action: LastAction,
    /// Chips moved by this action (zero for checks and folds).
    pub amount: u32,
}

/// Complete record of one finished hand, appended as a JSONL line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandRecord {
    /// `{tableId}-{round}` by convention.
    pub hand_id: String,
    pub table_id: String,
    /// Seed of the hand's deal, enabling an exact replay.
    pub seed: u64,
    pub actions: Vec<ActionRecord>,
    pub board: Vec<Card>,
    pub winners: Vec<PlayerId>,
    /// RFC3339, injected on write when missing.
    #[serde(default)]
    pub ts: Option<String>,
}

/// Append-only JSONL writer for hand records.
pub struct HandLogger {
    writer: BufWriter<File>,
}

impl HandLogger {
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                create_dir_all(parent)?;
            }
        }
        let f = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(f),
        })
    }

    pub fn write(&mut self, record: &HandRecord) -> std::io::Result<()> {
        let mut rec = record.clone();
        if rec.ts.is_none() {
            rec.ts = Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));
        }
        let line = serde_json::to_string(&rec).map_err(std::io::Error::other)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hand_record_round_trips() {
        let record = HandRecord {
            hand_id: "t1-3".into(),
            table_id: "t1".into(),
            seed: 42,
            actions: vec![ActionRecord {
                player_id: "p1".into(),
                stage: Stage::PreFlop,
                action: LastAction::Call,
                amount: 50,
            }],
            board: Vec::new(),
            winners: vec!["p1".into()],
            ts: Some("2026-01-01T00:00:00Z".into()),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""handId":"t1-3""#));
        let back: HandRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
