//! WebSocket server: accept loop and per-session read loop.
//!
//! Each accepted connection gets its own Tokio task.  Inside a session,
//! frames are handled strictly one at a time: parse, translate, dispatch on
//! the blocking pool, await, reply, and only then read the next frame.  That
//! keeps commands in arrival order at the cost of head-of-line blocking
//! behind a slow serial write.
//!
//! When a session ends for any reason, every key, media key and mouse button
//! is released so nothing stays held on the target.

use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use lkvm_core::{Command, Dispatcher};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::EventTranslator;
use crate::domain::config::ServerConfig;
use crate::domain::messages::{EventReply, InboundEvent};

/// How often the accept loop re-checks the shutdown flag.
const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// Everything a session needs, shared by all sessions.
struct SessionContext {
    dispatcher: Arc<Dispatcher>,
    translator: EventTranslator,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Binds `config.bind_addr()` and serves until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound.
pub async fn run_server(
    config: ServerConfig,
    dispatcher: Arc<Dispatcher>,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let addr = config.bind_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {addr}"))?;

    info!("WebSocket server listening on {addr}");

    serve(
        listener,
        dispatcher,
        EventTranslator::new(config.mouse_mode),
        running,
    )
    .await
}

/// Runs the accept loop on an already bound listener.
///
/// Split out from [`run_server`] so callers can bind port 0 and read the
/// chosen address first.
///
/// # Errors
///
/// Currently never fails; accept errors are logged and skipped.
pub async fn serve(
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    translator: EventTranslator,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let screen = dispatcher.screen();
    info!(
        "replaying input on a {}x{} screen, {} mouse",
        screen.width,
        screen.height,
        translator.mouse_mode()
    );

    let ctx = Arc::new(SessionContext {
        dispatcher,
        translator,
    });

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping accept loop");
            break;
        }

        match timeout(ACCEPT_POLL, listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                let ctx = Arc::clone(&ctx);
                tokio::spawn(async move {
                    handle_session(stream, peer_addr, ctx).await;
                });
            }
            Ok(Err(e)) => error!("accept error: {e}"),
            Err(_) => {}
        }
    }

    Ok(())
}

// ── Per-session handler ───────────────────────────────────────────────────────

async fn handle_session(stream: TcpStream, peer_addr: SocketAddr, ctx: Arc<SessionContext>) {
    let session_id = Uuid::new_v4();
    info!("session {session_id}: connection from {peer_addr}");

    match run_session(stream, session_id, &ctx).await {
        Ok(()) => info!("session {session_id} closed"),
        Err(e) => warn!("session {session_id} closed with error: {e:#}"),
    }

    let dispatcher = Arc::clone(&ctx.dispatcher);
    match tokio::task::spawn_blocking(move || dispatcher.release_all()).await {
        Ok(Ok(())) => debug!("session {session_id}: released all inputs"),
        Ok(Err(e)) => warn!("session {session_id}: release on disconnect failed: {e}"),
        Err(e) => error!("session {session_id}: release task failed: {e}"),
    }
}

async fn run_session(
    stream: TcpStream,
    session_id: Uuid,
    ctx: &SessionContext,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream)
        .await
        .context("WebSocket handshake failed")?;
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    while let Some(frame) = ws_rx.next().await {
        let text = match frame {
            Ok(WsMessage::Text(text)) => text,
            Ok(WsMessage::Close(_)) => {
                debug!("session {session_id}: close frame received");
                break;
            }
            Ok(WsMessage::Binary(_)) => {
                warn!("session {session_id}: unexpected binary frame (ignored)");
                continue;
            }
            Ok(_) => continue,
            Err(WsError::ConnectionClosed | WsError::Protocol(_)) => {
                debug!("session {session_id}: connection closed");
                break;
            }
            Err(e) => return Err(e).context("WebSocket read failed"),
        };

        let reply = handle_event(&text, session_id, ctx).await;
        let json = serde_json::to_string(&reply).context("failed to encode reply")?;
        ws_tx
            .send(WsMessage::Text(json))
            .await
            .context("failed to send reply")?;
    }

    Ok(())
}

/// Parses, translates and executes one text frame, producing its reply.
async fn handle_event(text: &str, session_id: Uuid, ctx: &SessionContext) -> EventReply {
    let event: InboundEvent = match serde_json::from_str(text) {
        Ok(event) => event,
        Err(e) => {
            warn!("session {session_id}: invalid event: {e}");
            return EventReply::invalid_format();
        }
    };

    let command = match ctx.translator.translate(&event) {
        Ok(command) => command,
        Err(e) => {
            warn!("session {session_id}: rejected {:?} event: {e}", event.kind);
            return EventReply::error(e.to_string());
        }
    };

    match execute(&ctx.dispatcher, command).await {
        Ok(()) => EventReply::ok(),
        Err(e) => {
            warn!("session {session_id}: {e:#}");
            EventReply::error(e.to_string())
        }
    }
}

/// Runs one command on the blocking pool and waits for it.
async fn execute(dispatcher: &Arc<Dispatcher>, command: Command) -> anyhow::Result<()> {
    let dispatcher = Arc::clone(dispatcher);
    tokio::task::spawn_blocking(move || dispatcher.dispatch(&command))
        .await
        .context("dispatch task failed")??;
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
