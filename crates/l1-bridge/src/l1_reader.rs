//! L1 Reader - Source of bridge events and time ticks
//!
//! Until the bridge watcher is wired to a live L1 node, inputs are read from
//! a JSON-lines script, one `BridgeInput` per line. Blank lines and lines
//! starting with `#` are skipped.

use crate::error::BridgeError;
use l1_integration::BridgeInput;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Reads bridge inputs and feeds them to the closing driver
pub struct L1Reader {
    inputs: Vec<BridgeInput>,
    /// Delay between inputs when feeding (zero = as fast as possible)
    pace: Duration,
}

impl L1Reader {
    /// Parse a JSON-lines script
    pub fn from_script(script: &str) -> Result<Self, BridgeError> {
        let mut inputs = Vec::new();
        for (idx, line) in script.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let input = serde_json::from_str(line)
                .map_err(|source| BridgeError::InvalidInput { line: idx + 1, source })?;
            inputs.push(input);
        }

        Ok(Self {
            inputs,
            pace: Duration::ZERO,
        })
    }

    /// Load a JSON-lines script from disk
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, BridgeError> {
        let script = tokio::fs::read_to_string(path.as_ref()).await?;
        let reader = Self::from_script(&script)?;
        tracing::debug!("Loaded {} bridge inputs from {:?}", reader.inputs.len(), path.as_ref());
        Ok(reader)
    }

    /// Set the delay between fed inputs
    pub fn with_pace(mut self, pace: Duration) -> Self {
        self.pace = pace;
        self
    }

    /// Parsed inputs, in order
    pub fn inputs(&self) -> &[BridgeInput] {
        &self.inputs
    }

    /// Feed every input into `tx`, then drop the sender
    ///
    /// Stops early if the receiving side goes away.
    pub fn spawn_feed(self, tx: mpsc::Sender<BridgeInput>) -> JoinHandle<usize> {
        tokio::spawn(async move {
            let mut fed = 0;
            for input in self.inputs {
                if !self.pace.is_zero() {
                    tokio::time::sleep(self.pace).await;
                }
                if tx.send(input).await.is_err() {
                    tracing::debug!("Driver stopped listening after {} inputs", fed);
                    break;
                }
                fed += 1;
            }
            fed
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use l1_integration::L1Event;
    use std::io::Write;

    const SCRIPT: &str = r#"
# proposal agreed at t=10
{"kind":"event","time":10,"event":{"type":"proposed_unanimous_assertion","sequence_num":5}}
{"kind":"tick","time":31}

{"kind":"event","time":40,"event":{"type":"confirmed_unanimous_assertion"}}
"#;

    #[test]
    fn test_parse_script_skips_comments() {
        let reader = L1Reader::from_script(SCRIPT).unwrap();
        assert_eq!(reader.inputs().len(), 3);
        assert_eq!(reader.inputs()[1], BridgeInput::Tick { time: 31 });
        assert_eq!(
            reader.inputs()[2],
            BridgeInput::Event {
                time: 40,
                event: L1Event::ConfirmedUnanimousAssertion,
            }
        );
    }

    #[test]
    fn test_parse_error_reports_line() {
        let err = L1Reader::from_script("{\"kind\":\"tick\",\"time\":1}\nnot json").err().unwrap();
        assert!(matches!(err, BridgeError::InvalidInput { line: 2, .. }));
    }

    #[tokio::test]
    async fn test_from_file_and_feed() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCRIPT.as_bytes()).unwrap();

        let reader = L1Reader::from_file(file.path()).await.unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        let handle = reader.spawn_feed(tx);

        let mut received = Vec::new();
        while let Some(input) = rx.recv().await {
            received.push(input);
        }
        assert_eq!(handle.await.unwrap(), 3);
        assert_eq!(received.len(), 3);
        assert_eq!(received[0].time(), 10);
    }

    #[tokio::test]
    async fn test_feed_stops_when_receiver_dropped() {
        let reader = L1Reader::from_script(SCRIPT).unwrap();
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let fed = reader.spawn_feed(tx).await.unwrap();
        assert_eq!(fed, 0);
    }
}
