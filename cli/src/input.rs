//! Operator input: stdin lines pumped into a bounded channel.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const INPUT_CHANNEL_CAPACITY: usize = 64;

pub struct LinePump {
    rx: mpsc::Receiver<String>,
    join: Option<JoinHandle<()>>,
}

impl LinePump {
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn stdin() -> Self {
        let (tx, rx) = mpsc::channel(INPUT_CHANNEL_CAPACITY);
        let join = tokio::spawn(read_lines(tx));
        Self {
            rx,
            join: Some(join),
        }
    }

    /// Next line, `None` at end of input. Cancel-safe.
    pub async fn next_line(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    pub fn shutdown(&mut self) {
        self.rx.close();
        if let Some(join) = self.join.take() {
            join.abort();
        }
    }
}

impl Drop for LinePump {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn read_lines(tx: mpsc::Sender<String>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if tx.send(line).await.is_err() {
                    return;
                }
            }
            Ok(None) => return,
            Err(e) => {
                tracing::warn!("Failed to read operator input: {e}");
                return;
            }
        }
    }
}
