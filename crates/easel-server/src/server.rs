//! WebSocket endpoint and session lifecycle
//!
//! One warp route: `GET /ws/asset/edit?assetId=N`. The handshake gate runs
//! before the upgrade; an accepted connection gets one reader task (this
//! function) and one writer task draining the viewer's outbound channel
//! into the socket. Inbound frames are parsed and published to the ordered
//! pipeline; the reader never blocks on the consumer's progress.

use crate::config::ServerConfig;
use crate::gate::{HandshakeGate, SessionTicket, UpgradeRequest};
use easel_session::{
    BroadcastDispatcher, ConnectionId, ConnectionRegistry, EditEvent, EditLocks, EventPipeline,
    InboundFrame, Notification, SessionProcessor, ViewerHandle,
};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use warp::ws::{Message, WebSocket, Ws};
use warp::{Filter, Reply};

/// The coordinator server: gate, registry, locks, pipeline, dispatcher
///
/// Cheap to clone; all state is shared behind `Arc`s with process-lifetime
/// scope. One instance owns all session state for the assets it serves.
#[derive(Clone)]
pub struct CollabServer {
    gate: Arc<HandshakeGate>,
    registry: Arc<ConnectionRegistry>,
    locks: Arc<EditLocks>,
    dispatcher: BroadcastDispatcher,
    pipeline: EventPipeline,
}

impl CollabServer {
    /// Wire up the server and spawn the pipeline consumer
    #[must_use]
    pub fn new(gate: HandshakeGate, config: &ServerConfig) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let locks = Arc::new(EditLocks::new());
        let dispatcher = BroadcastDispatcher::new(Arc::clone(&registry));
        let processor = SessionProcessor::new(Arc::clone(&locks), dispatcher.clone());
        let (pipeline, _consumer) = EventPipeline::start(config.queue_capacity, processor);

        Self {
            gate: Arc::new(gate),
            registry,
            locks,
            dispatcher,
            pipeline,
        }
    }

    /// The connection registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// The edit-lock map
    #[inline]
    #[must_use]
    pub fn locks(&self) -> &Arc<EditLocks> {
        &self.locks
    }

    /// The WebSocket upgrade route
    pub fn routes(&self) -> impl Filter<Extract = impl Reply, Error = warp::Rejection> + Clone {
        let server = self.clone();
        warp::path!("ws" / "asset" / "edit")
            .and(warp::ws())
            .and(warp::query::<HashMap<String, String>>())
            .and(warp::header::optional::<String>("authorization"))
            .and_then(
                move |ws: Ws, query: HashMap<String, String>, auth: Option<String>| {
                    let server = server.clone();
                    async move {
                        let request = UpgradeRequest {
                            asset_id: query.get("assetId").cloned(),
                            auth_token: auth.or_else(|| query.get("token").cloned()),
                        };
                        match server.gate.authorize(&request).await {
                            Ok(ticket) => {
                                let session = server.clone();
                                Ok::<_, warp::Rejection>(
                                    ws.on_upgrade(move |socket| session.run_session(socket, ticket))
                                        .into_response(),
                                )
                            }
                            Err(err) => Ok(warp::reply::with_status(
                                err.to_string(),
                                err.http_status(),
                            )
                            .into_response()),
                        }
                    }
                },
            )
    }

    /// Serve until the process is stopped
    pub async fn run(self, bind: SocketAddr) {
        info!(%bind, "collaborative session endpoint listening");
        warp::serve(self.routes()).run(bind).await;
    }

    /// One accepted connection, from registration to eviction
    async fn run_session(self, socket: WebSocket, ticket: SessionTicket) {
        let SessionTicket {
            asset_id,
            principal,
        } = ticket;
        let connection_id = ConnectionId::new();
        let (mut ws_tx, mut ws_rx) = socket.split();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();

        // Writer task: drains the viewer's outbound channel into the
        // socket until either side goes away.
        tokio::spawn(async move {
            while let Some(frame) = out_rx.recv().await {
                if ws_tx.send(Message::text(frame)).await.is_err() {
                    break;
                }
            }
        });

        self.registry.register(
            asset_id,
            ViewerHandle::new(connection_id, Arc::clone(&principal), out_tx),
        );
        info!(
            asset = %asset_id,
            principal = %principal.id,
            connection = %connection_id,
            "viewer joined"
        );
        self.dispatcher.broadcast(
            asset_id,
            &Notification::info(
                format!("{} joined the session", principal.display_name),
                &principal,
            ),
            None,
        );

        while let Some(result) = ws_rx.next().await {
            let message = match result {
                Ok(message) => message,
                Err(err) => {
                    debug!(connection = %connection_id, %err, "socket read error");
                    break;
                }
            };
            if message.is_close() {
                break;
            }
            let text = match message.to_str() {
                Ok(text) => text,
                // Binary, ping and pong frames carry no edit events.
                Err(()) => continue,
            };
            match serde_json::from_str::<InboundFrame>(text) {
                Ok(frame) => {
                    if let Some(event) = EditEvent::from_frame(
                        asset_id,
                        connection_id,
                        Arc::clone(&principal),
                        frame,
                    ) {
                        self.pipeline.publish(event);
                    }
                }
                Err(err) => {
                    // A single malformed frame must not end an otherwise
                    // healthy session.
                    debug!(connection = %connection_id, %err, "dropping malformed frame");
                }
            }
        }

        // Eviction first, then the synthetic disconnection event; the
        // departing viewer is excluded from the resulting broadcasts.
        self.registry.unregister(asset_id, connection_id);
        self.pipeline
            .publish(EditEvent::disconnected(asset_id, connection_id, principal));
        info!(asset = %asset_id, connection = %connection_id, "viewer left");
    }
}
