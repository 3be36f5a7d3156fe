//! Python execution session: interpreter bootstrap, one-at-a-time script
//! runs, and translation of interpreter events into output-sink calls.

use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;

use crate::config::Config;

pub mod protocol;

use protocol::{parse_line, RuntimeEvent, BOOTSTRAP};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// Interpreter bootstrap failed. Fatal for the session; the shell shows
    /// a blocking banner with no retry path.
    #[error("python runtime failed to start: {0}")]
    Init(String),
    /// The user script raised or the interpreter died mid-run. Recovered
    /// into exactly one stderr transcript entry; the session stays usable.
    #[error("{0}")]
    Execution(String),
    /// A run was submitted while another is in flight.
    #[error("a script is already running")]
    Busy,
}

/// Sink invoked once per output chunk as the script emits it.
pub type OutputSink = Box<dyn Fn(&str) + Send + Sync>;

/// Single-slot run latch: `Idle | Running` with a defined `Busy` outcome,
/// rather than an advisory boolean the caller is trusted to check.
#[derive(Debug, Default)]
struct RunLatch {
    running: Arc<AtomicBool>,
}

struct RunGuard {
    running: Arc<AtomicBool>,
}

impl RunLatch {
    fn try_begin(&self) -> Result<RunGuard, RuntimeError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(RuntimeError::Busy);
        }
        Ok(RunGuard {
            running: Arc::clone(&self.running),
        })
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Ready handle to the Python interpreter. Constructed once by the
/// composition root and shared by reference for the life of the session;
/// there is no process-global instance.
pub struct PythonRuntime {
    python_bin: String,
    version: String,
    on_stdout: OutputSink,
    on_stderr: OutputSink,
    latch: RunLatch,
}

impl std::fmt::Debug for PythonRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PythonRuntime")
            .field("python_bin", &self.python_bin)
            .field("version", &self.version)
            .field("running", &self.latch.is_running())
            .finish()
    }
}

impl PythonRuntime {
    /// Async bootstrap: resolve and probe the interpreter binary, then
    /// register the output sinks. Fails with `RuntimeError::Init` when no
    /// working interpreter is found.
    pub async fn initialize(
        cfg: &Config,
        on_stdout: OutputSink,
        on_stderr: OutputSink,
    ) -> Result<Self, RuntimeError> {
        let candidates: Vec<String> = match cfg.get("PYTHON_BIN") {
            Some(bin) => vec![bin],
            None => vec!["python3".into(), "python".into()],
        };

        for bin in &candidates {
            if let Some(version) = probe(bin).await {
                return Ok(Self {
                    python_bin: bin.clone(),
                    version,
                    on_stdout,
                    on_stderr,
                    latch: RunLatch::default(),
                });
            }
        }
        Err(RuntimeError::Init(format!(
            "no working Python interpreter found (tried {})",
            candidates.join(", ")
        )))
    }

    /// Interpreter version banner captured at bootstrap, e.g. "Python 3.12.3".
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_running(&self) -> bool {
        self.latch.is_running()
    }

    /// Execute one script to completion. Stream chunks are forwarded to the
    /// registered sinks in emission order, before this future resolves. On
    /// success returns the script's final-expression value, if any; the
    /// caller appends it as one extra stdout entry. Every failure surfaces
    /// as an `Err` carrying a human-readable message, never silently.
    pub async fn run(&self, source: &str) -> Result<Option<String>, RuntimeError> {
        let _guard = self.latch.try_begin()?;

        let mut child = Command::new(&self.python_bin)
            .arg("-u")
            .arg("-c")
            .arg(BOOTSTRAP)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RuntimeError::Execution(format!("failed to spawn interpreter: {e}")))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| RuntimeError::Execution("interpreter stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RuntimeError::Execution("interpreter stdout unavailable".into()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| RuntimeError::Execution("interpreter stderr unavailable".into()))?;

        stdin
            .write_all(source.as_bytes())
            .await
            .map_err(|e| RuntimeError::Execution(format!("failed to hand source over: {e}")))?;
        // Closing stdin is the end-of-source signal for the bootstrap.
        drop(stdin);

        // The bootstrap's own stderr only carries noise when the bootstrap
        // itself dies; collect it for the no-terminal-event diagnosis below.
        let raw_stderr = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut terminal: Option<Result<Option<String>, RuntimeError>> = None;
        while let Ok(Some(line)) = lines.next_line().await {
            match parse_line(&line) {
                Some(RuntimeEvent::Stdout(text)) => (self.on_stdout)(&text),
                Some(RuntimeEvent::Stderr(text)) => (self.on_stderr)(&text),
                Some(RuntimeEvent::Result(value)) => terminal = Some(Ok(value)),
                Some(RuntimeEvent::Error(message)) => {
                    terminal = Some(Err(RuntimeError::Execution(message)))
                }
                None => {}
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| RuntimeError::Execution(format!("failed to reap interpreter: {e}")))?;

        match terminal {
            Some(outcome) => outcome,
            None => {
                let noise = raw_stderr.await.unwrap_or_default();
                let noise = noise.trim();
                if noise.is_empty() {
                    Err(RuntimeError::Execution(format!(
                        "interpreter exited without a result ({status})"
                    )))
                } else {
                    Err(RuntimeError::Execution(noise.to_string()))
                }
            }
        }
    }
}

async fn probe(bin: &str) -> Option<String> {
    let output = Command::new(bin).arg("-V").output().await.ok()?;
    if !output.status.success() {
        return None;
    }
    // Some interpreters historically printed the banner on stderr.
    let banner = if output.stdout.is_empty() {
        String::from_utf8_lossy(&output.stderr).trim().to_string()
    } else {
        String::from_utf8_lossy(&output.stdout).trim().to_string()
    };
    if banner.is_empty() {
        None
    } else {
        Some(banner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::{Entry, EntryKind, Transcript};
    use std::sync::Mutex;

    #[test]
    fn latch_rejects_second_run_with_busy() {
        let latch = RunLatch::default();
        let guard = latch.try_begin().expect("first begin");
        assert!(latch.is_running());
        assert!(matches!(latch.try_begin(), Err(RuntimeError::Busy)));
        drop(guard);
        assert!(!latch.is_running());
        assert!(latch.try_begin().is_ok());
    }

    /// Session wired the way the shell wires it: sinks append stream chunks
    /// straight into a transcript. Returns `None` when no interpreter is
    /// installed, in which case the tests below skip.
    async fn ready_runtime(log: &Arc<Mutex<Transcript>>) -> Option<PythonRuntime> {
        let cfg = Config::load();
        let out = Arc::clone(log);
        let err = Arc::clone(log);
        let on_stdout: OutputSink =
            Box::new(move |text| out.lock().unwrap().push(Entry::stdout(text)));
        let on_stderr: OutputSink =
            Box::new(move |text| err.lock().unwrap().push(Entry::stderr(text)));
        match PythonRuntime::initialize(&cfg, on_stdout, on_stderr).await {
            Ok(rt) => Some(rt),
            Err(_) => {
                println!("no Python interpreter found, skipping");
                None
            }
        }
    }

    fn kinds(log: &Arc<Mutex<Transcript>>) -> Vec<EntryKind> {
        log.lock().unwrap().iter().map(|e| e.kind).collect()
    }

    #[tokio::test]
    async fn print_lands_as_one_stdout_entry() {
        let log = Arc::new(Mutex::new(Transcript::new()));
        let Some(rt) = ready_runtime(&log).await else {
            return;
        };
        let value = rt.run("print('hi')").await.expect("run");
        assert_eq!(value, None);
        let entries = log.lock().unwrap();
        assert_eq!(entries.len(), 1);
        let entry = entries.iter().next().unwrap();
        assert_eq!(entry.kind, EntryKind::Stdout);
        assert_eq!(entry.content, "hi");
    }

    #[tokio::test]
    async fn silent_script_emits_nothing() {
        let log = Arc::new(Mutex::new(Transcript::new()));
        let Some(rt) = ready_runtime(&log).await else {
            return;
        };
        let value = rt.run("x = 1").await.expect("run");
        assert_eq!(value, None);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn trailing_expression_value_is_reported() {
        let log = Arc::new(Mutex::new(Transcript::new()));
        let Some(rt) = ready_runtime(&log).await else {
            return;
        };
        assert_eq!(rt.run("1 + 1").await.expect("run"), Some("2".into()));
        // None values are suppressed, REPL-style.
        assert_eq!(rt.run("None").await.expect("run"), None);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn division_by_zero_is_one_execution_error() {
        let log = Arc::new(Mutex::new(Transcript::new()));
        let Some(rt) = ready_runtime(&log).await else {
            return;
        };
        let err = rt.run("1/0").await.expect_err("must fail");
        match &err {
            RuntimeError::Execution(msg) => assert!(msg.contains("division by zero")),
            other => panic!("unexpected error: {other:?}"),
        }
        // Nothing was streamed before the failure.
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stream_order_is_preserved() {
        let log = Arc::new(Mutex::new(Transcript::new()));
        let Some(rt) = ready_runtime(&log).await else {
            return;
        };
        let source = "import sys\nprint('a')\nsys.stderr.write('b\\n')\nprint('c')";
        rt.run(source).await.expect("run");
        assert_eq!(
            kinds(&log),
            vec![EntryKind::Stdout, EntryKind::Stderr, EntryKind::Stdout]
        );
        let contents: Vec<String> = log
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.content.clone())
            .collect();
        assert_eq!(contents, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn concurrent_run_is_rejected_busy() {
        let log = Arc::new(Mutex::new(Transcript::new()));
        let Some(rt) = ready_runtime(&log).await else {
            return;
        };
        let rt = Arc::new(rt);
        let slow = Arc::clone(&rt);
        let first = tokio::spawn(async move { slow.run("import time\ntime.sleep(1.5)").await });
        // Give the first run time to take the latch.
        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        assert!(matches!(
            rt.run("print('nope')").await,
            Err(RuntimeError::Busy)
        ));
        first.await.expect("join").expect("first run");
        // Latch released, the session is usable again.
        assert_eq!(rt.run("2 * 2").await.expect("run"), Some("4".into()));
    }

    #[tokio::test]
    async fn syntax_error_is_an_execution_error() {
        let log = Arc::new(Mutex::new(Transcript::new()));
        let Some(rt) = ready_runtime(&log).await else {
            return;
        };
        let err = rt.run("def broken(:").await.expect_err("must fail");
        assert!(matches!(err, RuntimeError::Execution(_)));
        assert!(err.to_string().contains("SyntaxError"));
    }
}
