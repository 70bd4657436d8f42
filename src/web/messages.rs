use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use tokio::{fs::OpenOptions, io::AsyncWriteExt, sync::Mutex};

/// Append-only log of dashboard messages, one `name: text` line per entry.
#[derive(Clone)]
pub struct MessageLog {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl MessageLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    /// Append a single message line. Writers hold the exclusive lock and
    /// emit the whole line with one `write_all`, so concurrent appends
    /// never interleave partial lines.
    pub async fn append(&self, student_name: &str, text: &str) -> Result<()> {
        let line = format!("{student_name}: {text}\n");

        let _guard = self.lock.lock().await;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| {
                format!("failed to open message log at {}", self.path.display())
            })?;
        file.write_all(line.as_bytes())
            .await
            .context("failed to append to message log")?;
        file.flush().await.context("failed to flush message log")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn append_writes_single_line() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("messages.txt");
        let log = MessageLog::new(&path);

        log.append("Ada", "hello there").await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "Ada: hello there\n");
    }

    #[tokio::test]
    async fn appends_accumulate_in_order_of_completion() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("messages.txt");
        let log = MessageLog::new(&path);

        log.append("Ada", "first").await.unwrap();
        log.append("Grace", "second").await.unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(contents, "Ada: first\nGrace: second\n");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_do_not_interleave() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("messages.txt");
        let log = MessageLog::new(&path);

        let mut handles = Vec::new();
        for i in 0..32 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                let text = format!("message number {i} with a reasonably long body");
                log.append(&format!("student-{i}"), &text).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 32);
        for line in lines {
            let (name, text) = line.split_once(": ").expect("line should be well formed");
            let index: usize = name
                .strip_prefix("student-")
                .expect("name should carry the writer index")
                .parse()
                .unwrap();
            assert_eq!(
                text,
                format!("message number {index} with a reasonably long body")
            );
        }
    }
}
