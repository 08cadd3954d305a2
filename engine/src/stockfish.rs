use crate::session::EngineSession;
use crate::uci::{parse_uci_line, EngineCommand, EngineOptions, UciEvent};
use crate::{EngineError, EngineEvent, UciTransport};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Child;
use tokio::sync::mpsc;

/// Common install locations, checked in order before falling back to `PATH`.
const STOCKFISH_PATHS: &[&str] = &[
    "/usr/local/bin/stockfish",
    "/usr/bin/stockfish",
    "/opt/homebrew/bin/stockfish",
    "/usr/games/stockfish",
];

/// Configuration for spawning an engine process.
#[derive(Debug, Clone)]
pub struct StockfishConfig {
    /// Explicit executable; searched for when `None`.
    pub path: Option<PathBuf>,
    pub options: EngineOptions,
    /// How long to wait for `uciok` and `readyok` each.
    pub handshake_timeout: Duration,
    /// Label attached to log lines, useful when several sessions run.
    pub label: Option<String>,
}

impl Default for StockfishConfig {
    fn default() -> Self {
        Self {
            path: None,
            options: EngineOptions::default(),
            handshake_timeout: Duration::from_secs(10),
            label: None,
        }
    }
}

/// One engine process, one session. Dropping the engine kills the process.
pub struct StockfishEngine {
    process: Child,
    stdin_tx: mpsc::Sender<String>,
    event_rx: mpsc::Receiver<EngineEvent>,
    session: EngineSession,
    label: String,
}

impl StockfishEngine {
    /// Spawn an engine and run the handshake: `uci`, options, `isready`.
    /// The returned engine is in the `ready` state.
    #[tracing::instrument(level = "info", skip(config), fields(label = ?config.label))]
    pub async fn spawn_with_config(config: StockfishConfig) -> Result<Self, EngineError> {
        let label = config.label.clone().unwrap_or_else(|| "engine".to_string());
        let path = match &config.path {
            Some(path) => path.clone(),
            None => find_stockfish_path().ok_or(EngineError::NotFound)?,
        };
        tracing::info!("Spawning engine at {:?}", path);

        let mut process = tokio::process::Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                tracing::error!("Failed to spawn engine: {}", e);
                EngineError::Spawn(e)
            })?;

        let mut stdin = process.stdin.take().ok_or(EngineError::NoStdin)?;
        let stdout = process.stdout.take().ok_or(EngineError::NoStdout)?;

        let (event_tx, event_rx) = mpsc::channel::<EngineEvent>(256);
        let (stdin_tx, mut stdin_rx) = mpsc::channel::<String>(32);

        // Output reader task
        let reader_label = label.clone();
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        tracing::warn!(label = %reader_label, "Engine stdout EOF - engine closed");
                        let _ = event_tx
                            .send(EngineEvent::Failed("engine closed its output".to_string()))
                            .await;
                        break;
                    }
                    Ok(_) => {
                        let trimmed = line.trim();
                        tracing::trace!(label = %reader_label, "UCI << {}", trimmed);

                        let event = parse_uci_line(trimmed);
                        if matches!(event, UciEvent::Unrecognized(_)) {
                            continue;
                        }
                        if event_tx.send(EngineEvent::Uci(event)).await.is_err() {
                            tracing::debug!(label = %reader_label, "Event receiver dropped");
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(label = %reader_label, "Error reading engine stdout: {}", e);
                        let _ = event_tx
                            .send(EngineEvent::Failed(format!("read error: {}", e)))
                            .await;
                        break;
                    }
                }
            }
            tracing::info!(label = %reader_label, "Output reader task exiting");
        });

        // Stdin writer task
        let writer_label = label.clone();
        tokio::spawn(async move {
            while let Some(cmd) = stdin_rx.recv().await {
                tracing::trace!(label = %writer_label, "UCI >> {}", cmd);
                let written = async {
                    stdin.write_all(cmd.as_bytes()).await?;
                    stdin.write_all(b"\n").await?;
                    stdin.flush().await
                }
                .await;
                if let Err(e) = written {
                    tracing::error!(label = %writer_label, "Failed to write to stdin: {}", e);
                    break;
                }
            }
            tracing::info!(label = %writer_label, "Stdin writer task exiting");
        });

        let mut engine = Self {
            process,
            stdin_tx,
            event_rx,
            session: EngineSession::new(),
            label,
        };

        engine.send(EngineCommand::Uci).await?;
        engine
            .wait_for(config.handshake_timeout, "uciok", |e| matches!(e, UciEvent::UciOk))
            .await?;

        for cmd in config.options.to_commands() {
            engine.send(cmd).await?;
        }

        engine.send(EngineCommand::IsReady).await?;
        engine
            .wait_for(config.handshake_timeout, "readyok", |e| {
                matches!(e, UciEvent::ReadyOk)
            })
            .await?;

        tracing::info!(label = %engine.label, "Engine spawned and initialized successfully");
        Ok(engine)
    }

    async fn wait_for(
        &mut self,
        timeout: Duration,
        what: &'static str,
        done: impl Fn(&UciEvent) -> bool,
    ) -> Result<(), EngineError> {
        let waited = tokio::time::timeout(timeout, async {
            while let Some(event) = self.recv().await {
                match event {
                    EngineEvent::Uci(ref uci) if done(uci) => return Ok(()),
                    EngineEvent::Uci(UciEvent::Id { key, value }) => {
                        tracing::info!(label = %self.label, "Engine {}: {}", key, value);
                    }
                    EngineEvent::Uci(_) => {}
                    EngineEvent::Failed(reason) => return Err(EngineError::Failed(reason)),
                }
            }
            Err(EngineError::ChannelClosed)
        })
        .await;

        match waited {
            Ok(result) => result,
            Err(_) => {
                self.session.fail(format!("timeout waiting for {}", what));
                Err(EngineError::Timeout(what))
            }
        }
    }

    /// Shutdown the engine
    pub async fn shutdown(mut self) {
        if !self.session.is_failed() {
            let _ = self.stdin_tx.send(EngineCommand::Quit.to_uci_line()).await;
        }
        let _ = tokio::time::timeout(Duration::from_secs(1), self.process.wait()).await;
        let _ = self.process.kill().await;
        tracing::info!(label = %self.label, "Engine shut down");
    }
}

#[async_trait]
impl UciTransport for StockfishEngine {
    async fn send(&mut self, cmd: EngineCommand) -> Result<(), EngineError> {
        self.session.on_command(&cmd)?;
        let line = cmd.to_uci_line();
        tracing::debug!(label = %self.label, "Queueing command: {}", line);
        if self.stdin_tx.send(line).await.is_err() {
            self.session.fail("stdin writer closed");
            return Err(EngineError::ChannelClosed);
        }
        Ok(())
    }

    async fn recv(&mut self) -> Option<EngineEvent> {
        let event = self.event_rx.recv().await?;
        match &event {
            EngineEvent::Uci(uci) => self.session.on_event(uci),
            EngineEvent::Failed(reason) => self.session.fail(reason.clone()),
        }
        Some(event)
    }
}

/// Find Stockfish executable in common locations
pub fn find_stockfish_path() -> Option<PathBuf> {
    for path_str in STOCKFISH_PATHS {
        let path = Path::new(path_str);
        if path.exists() {
            return Some(path.to_path_buf());
        }
    }

    // In PATH: only accept it if it actually runs.
    let runs = std::process::Command::new("stockfish")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .arg("quit")
        .status()
        .is_ok();
    runs.then(|| PathBuf::from("stockfish"))
}
