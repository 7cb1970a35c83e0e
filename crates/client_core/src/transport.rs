use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use shared::protocol::{ClientRequest, ServerEvent};
use tokio::{
    net::TcpStream,
    sync::{broadcast, Mutex},
};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::info;

use crate::{ChannelEvent, JobChannel};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket-backed job channel.
///
/// Text frames from the server are decoded as [`ServerEvent`] and fanned out
/// on a broadcast channel; undecodable frames and receive failures become
/// [`ChannelEvent::Error`] so the failure is visible instead of silent. A
/// single [`ChannelEvent::Disconnected`] is published when the reader stops,
/// for any reason.
pub struct WsJobChannel {
    writer: Mutex<SplitSink<WsStream, Message>>,
    events: broadcast::Sender<ChannelEvent>,
}

impl WsJobChannel {
    pub async fn connect(server_url: &str) -> Result<Arc<Self>> {
        let ws_url = if server_url.starts_with("https://") {
            server_url.replacen("https://", "wss://", 1)
        } else if server_url.starts_with("http://") {
            server_url.replacen("http://", "ws://", 1)
        } else {
            return Err(anyhow!("server_url must start with http:// or https://"));
        };
        let ws_url = format!("{}/ws", ws_url.trim_end_matches('/'));

        let (ws_stream, _) = connect_async(&ws_url)
            .await
            .with_context(|| format!("failed to connect websocket: {ws_url}"))?;
        let (writer, reader) = ws_stream.split();

        let (events, _) = broadcast::channel(1024);
        let channel = Arc::new(Self {
            writer: Mutex::new(writer),
            events,
        });
        channel.spawn_reader(reader);
        info!(url = %ws_url, "job channel connected");
        Ok(channel)
    }

    fn spawn_reader(self: &Arc<Self>, mut reader: SplitStream<WsStream>) {
        let channel = Arc::clone(self);
        tokio::spawn(async move {
            while let Some(frame) = reader.next().await {
                match frame {
                    Ok(Message::Text(text)) => match serde_json::from_str::<ServerEvent>(&text) {
                        Ok(event) => {
                            let _ = channel.events.send(ChannelEvent::Server(event));
                        }
                        Err(err) => {
                            let _ = channel
                                .events
                                .send(ChannelEvent::Error(format!("invalid server event: {err}")));
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        let _ = channel
                            .events
                            .send(ChannelEvent::Error(format!("websocket receive failed: {err}")));
                        break;
                    }
                }
            }
            let _ = channel.events.send(ChannelEvent::Disconnected);
        });
    }
}

#[async_trait]
impl JobChannel for WsJobChannel {
    async fn send_request(&self, request: ClientRequest) -> Result<()> {
        let payload = serde_json::to_string(&request).context("failed to encode client request")?;
        let mut writer = self.writer.lock().await;
        writer
            .send(Message::Text(payload))
            .await
            .context("failed to send over websocket")?;
        Ok(())
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ChannelEvent> {
        self.events.subscribe()
    }
}
