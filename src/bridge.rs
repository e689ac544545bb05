//! Unix socket bridge between host surfaces and the agent.
//!
//! Host surfaces connect over a Unix socket and speak newline-delimited
//! JSON. The first message on a connection selects the session kind:
//! `init` attaches a page (selection events in, button visuals out),
//! `panel` attaches a settings surface (save commands in, status and
//! counter updates out).

use crate::button::ButtonVisual;
use crate::client::CaptureClient;
use crate::page::{PageEvent, PageIntegration};
use crate::panel::{SettingsPanel, StatusMessage, STATUS_DISMISS_DELAY};
use crate::relay::NotificationRelay;
use crate::settings::SettingsStore;
use crate::types::{PageContext, SelectionSnapshot};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Bridge configuration
pub struct BridgeConfig {
    /// Path to the Unix socket
    pub socket_path: PathBuf,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/tmp/capture-agent.sock"),
        }
    }
}

/// Messages a host surface may send
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
    /// Opens a page session
    Init { url: String, title: String },
    /// Opens a panel session
    Panel,
    MouseReleased {
        #[serde(flatten)]
        snapshot: SelectionSnapshot,
    },
    SelectionChanged { collapsed: bool },
    #[serde(rename_all = "camelCase")]
    PointerDown {
        inside_button: bool,
        selection_collapsed: bool,
    },
    ButtonClicked,
    Save { value: String },
}

/// Messages the agent sends back
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum AgentMessage {
    Button {
        #[serde(flatten)]
        visual: ButtonVisual,
    },
    #[serde(rename_all = "camelCase")]
    Settings { api_url: String, capture_count: u64 },
    Status {
        #[serde(flatten)]
        status: StatusMessage,
    },
    StatusCleared,
    CaptureCount { value: u64 },
    Error { message: String },
}

/// Bridge server accepting host surface connections
pub struct HostBridge {
    config: BridgeConfig,
    settings: Arc<SettingsStore>,
    relay: NotificationRelay,
    client: CaptureClient,
}

impl HostBridge {
    pub fn new(config: BridgeConfig, settings: Arc<SettingsStore>, relay: NotificationRelay) -> Self {
        let client = CaptureClient::new(Arc::clone(&settings), relay.clone());
        Self {
            config,
            settings,
            relay,
            client,
        }
    }

    /// Get the socket path
    pub fn socket_path(&self) -> &Path {
        &self.config.socket_path
    }

    /// Start the bridge and accept connections
    pub async fn run(&self) -> Result<(), BridgeError> {
        // Remove existing socket file if present
        if self.config.socket_path.exists() {
            std::fs::remove_file(&self.config.socket_path)?;
        }

        let listener = UnixListener::bind(&self.config.socket_path)?;
        info!("Host bridge listening on {:?}", self.config.socket_path);

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let settings = Arc::clone(&self.settings);
                    let relay = self.relay.clone();
                    let client = self.client.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, settings, relay, client).await {
                            error!("Connection error: {}", e);
                        }
                    });
                }
                Err(e) => {
                    error!("Accept error: {}", e);
                }
            }
        }
    }
}

type HostLines = Lines<BufReader<OwnedReadHalf>>;

/// Handle a single host connection
async fn handle_connection(
    stream: UnixStream,
    settings: Arc<SettingsStore>,
    relay: NotificationRelay,
    client: CaptureClient,
) -> Result<(), BridgeError> {
    let (reader, writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    let (out_tx, out_rx) = mpsc::channel::<AgentMessage>(100);
    let writer_task = tokio::spawn(write_messages(writer, out_rx));

    let Some(first) = lines.next_line().await? else {
        drop(out_tx);
        let _ = writer_task.await;
        return Ok(());
    };

    match serde_json::from_str::<HostMessage>(&first) {
        Ok(HostMessage::Init { url, title }) => {
            page_session(PageContext { url, title }, lines, out_tx, client).await?;
        }
        Ok(HostMessage::Panel) => {
            panel_session(lines, out_tx, settings, relay).await?;
        }
        Ok(_) => {
            let _ = out_tx
                .send(AgentMessage::Error {
                    message: "session must open with init or panel".to_string(),
                })
                .await;
            drop(out_tx);
        }
        Err(e) => {
            warn!("Failed to parse opening message: {}", e);
            let _ = out_tx
                .send(AgentMessage::Error {
                    message: format!("Parse error: {}", e),
                })
                .await;
            drop(out_tx);
        }
    }

    let _ = writer_task.await;
    Ok(())
}

/// Serialize agent messages to the host, one JSON object per line
async fn write_messages(mut writer: OwnedWriteHalf, mut messages: mpsc::Receiver<AgentMessage>) {
    while let Some(message) = messages.recv().await {
        let line = match serde_json::to_string(&message) {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to serialize agent message: {}", e);
                continue;
            }
        };

        if writer.write_all(line.as_bytes()).await.is_err() {
            break;
        }
        if writer.write_all(b"\n").await.is_err() {
            break;
        }
        let _ = writer.flush().await;
    }
}

/// Drive one attached page: host events in, button visuals out
async fn page_session(
    context: PageContext,
    mut lines: HostLines,
    out_tx: mpsc::Sender<AgentMessage>,
    client: CaptureClient,
) -> Result<(), BridgeError> {
    info!("Page session started: {}", context.url);

    let (events_tx, events_rx) = mpsc::channel(100);
    let (visuals_tx, mut visuals_rx) = mpsc::channel(100);

    let integration = PageIntegration::new(context, client, events_tx.clone(), visuals_tx);
    tokio::spawn(integration.run(events_rx));

    // forward visuals to the host
    let visual_out = out_tx.clone();
    tokio::spawn(async move {
        while let Some(visual) = visuals_rx.recv().await {
            if visual_out.send(AgentMessage::Button { visual }).await.is_err() {
                break;
            }
        }
    });

    while let Some(line) = lines.next_line().await? {
        match serde_json::from_str::<HostMessage>(&line) {
            Ok(message) => match page_event(message) {
                Some(event) => {
                    if events_tx.send(event).await.is_err() {
                        break;
                    }
                }
                None => {
                    let _ = out_tx
                        .send(AgentMessage::Error {
                            message: "unexpected message in page session".to_string(),
                        })
                        .await;
                }
            },
            Err(e) => {
                warn!("Failed to parse host message: {}", e);
                let _ = out_tx
                    .send(AgentMessage::Error {
                        message: format!("Parse error: {}", e),
                    })
                    .await;
            }
        }
    }

    Ok(())
}

fn page_event(message: HostMessage) -> Option<PageEvent> {
    match message {
        HostMessage::MouseReleased { snapshot } => Some(PageEvent::MouseReleased { snapshot }),
        HostMessage::SelectionChanged { collapsed } => {
            Some(PageEvent::SelectionChanged { collapsed })
        }
        HostMessage::PointerDown {
            inside_button,
            selection_collapsed,
        } => Some(PageEvent::PointerDown {
            inside_button,
            selection_collapsed,
        }),
        HostMessage::ButtonClicked => Some(PageEvent::ButtonClicked),
        HostMessage::Init { .. } | HostMessage::Panel | HostMessage::Save { .. } => None,
    }
}

/// Drive one attached settings surface
async fn panel_session(
    mut lines: HostLines,
    out_tx: mpsc::Sender<AgentMessage>,
    settings: Arc<SettingsStore>,
    relay: NotificationRelay,
) -> Result<(), BridgeError> {
    info!("Panel session started");

    let mut panel = SettingsPanel::open(settings).await;
    let _ = out_tx
        .send(AgentMessage::Settings {
            api_url: panel.api_url_field().to_string(),
            capture_count: panel.capture_count(),
        })
        .await;

    let mut notices = relay.subscribe();

    let dismiss = tokio::time::sleep(STATUS_DISMISS_DELAY);
    tokio::pin!(dismiss);
    let mut dismiss_armed = false;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };

                match serde_json::from_str::<HostMessage>(&line) {
                    Ok(HostMessage::Save { value }) => {
                        if let Err(e) = panel.save(&value).await {
                            warn!("Failed to save settings: {}", e);
                            let _ = out_tx
                                .send(AgentMessage::Error {
                                    message: format!("Settings error: {}", e),
                                })
                                .await;
                            continue;
                        }

                        if let Some(status) = panel.status() {
                            let _ = out_tx
                                .send(AgentMessage::Status {
                                    status: status.clone(),
                                })
                                .await;
                            dismiss
                                .as_mut()
                                .reset(Instant::now() + STATUS_DISMISS_DELAY);
                            dismiss_armed = true;
                        }
                    }
                    Ok(_) => {
                        let _ = out_tx
                            .send(AgentMessage::Error {
                                message: "unexpected message in panel session".to_string(),
                            })
                            .await;
                    }
                    Err(e) => {
                        warn!("Failed to parse host message: {}", e);
                        let _ = out_tx
                            .send(AgentMessage::Error {
                                message: format!("Parse error: {}", e),
                            })
                            .await;
                    }
                }
            }

            notice = notices.recv() => {
                match notice {
                    Ok(_) => match panel.record_capture().await {
                        Ok(count) => {
                            let _ = out_tx
                                .send(AgentMessage::CaptureCount { value: count })
                                .await;
                        }
                        Err(e) => warn!("Failed to record capture: {}", e),
                    },
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        warn!("Panel session lagged, {} notices missed", missed);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            _ = dismiss.as_mut(), if dismiss_armed => {
                dismiss_armed = false;
                panel.dismiss_status();
                let _ = out_tx.send(AgentMessage::StatusCleared).await;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_socket_path() {
        let config = BridgeConfig::default();
        assert_eq!(config.socket_path, PathBuf::from("/tmp/capture-agent.sock"));
    }

    #[test]
    fn test_host_message_parsing() {
        let message: HostMessage = serde_json::from_str(
            r#"{"type":"init","url":"https://example.com","title":"Example"}"#,
        )
        .unwrap();
        assert!(matches!(message, HostMessage::Init { .. }));

        let message: HostMessage = serde_json::from_str(
            r#"{"type":"mouseReleased","selection":{"text":"hello there world","rect":{"top":10,"left":20,"width":100,"height":16}},"scroll":{"x":0,"y":250}}"#,
        )
        .unwrap();
        match message {
            HostMessage::MouseReleased { snapshot } => {
                assert_eq!(snapshot.selection.unwrap().text, "hello there world");
                assert_eq!(snapshot.scroll.y, 250.0);
            }
            other => panic!("unexpected message: {:?}", other),
        }

        let message: HostMessage = serde_json::from_str(
            r#"{"type":"pointerDown","insideButton":false,"selectionCollapsed":true}"#,
        )
        .unwrap();
        assert!(matches!(
            message,
            HostMessage::PointerDown {
                inside_button: false,
                selection_collapsed: true,
            }
        ));
    }

    #[test]
    fn test_agent_message_wire_format() {
        let json = serde_json::to_value(AgentMessage::Settings {
            api_url: "http://localhost:8000".to_string(),
            capture_count: 4,
        })
        .unwrap();
        assert_eq!(json["type"], "settings");
        assert_eq!(json["apiUrl"], "http://localhost:8000");
        assert_eq!(json["captureCount"], 4);

        let json = serde_json::to_value(AgentMessage::StatusCleared).unwrap();
        assert_eq!(json["type"], "statusCleared");
    }

    #[test]
    fn test_page_event_rejects_session_openers() {
        assert!(page_event(HostMessage::Panel).is_none());
        assert!(page_event(HostMessage::Save {
            value: "x".to_string()
        })
        .is_none());
        assert!(page_event(HostMessage::ButtonClicked).is_some());
    }
}
