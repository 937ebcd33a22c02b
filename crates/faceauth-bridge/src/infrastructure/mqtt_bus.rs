//! MQTT adapter: request subscription in, status and responses out.
//!
//! The rumqttc event loop is polled on the current task.  Every incoming
//! request is handed to the [`AuthBridge`] on its own task, so a second
//! request arriving mid-transaction reaches the bridge (and gets its busy
//! rejection) instead of queueing behind the first.
//!
//! On shutdown the loop stops taking requests but keeps polling the broker
//! until every in-flight transaction has published its result and released
//! the camera.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use faceauth_core::protocol::auth::{TOPIC_REQUEST, TOPIC_RESPONSE, TOPIC_STATUS};
use faceauth_core::{AuthRequest, AuthResponse, StatusUpdate};
use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::application::{AuthBridge, AuthPublisher, PublishError};
use crate::domain::BridgeConfig;

const KEEP_ALIVE: Duration = Duration::from_secs(30);
const REQUEST_QUEUE: usize = 32;

/// Creates the client and its event loop for `host`:`port`.
pub fn connect(config: &BridgeConfig, host: &str, port: u16) -> (AsyncClient, EventLoop) {
    let mut options = MqttOptions::new(&config.client_id, host, port);
    options.set_keep_alive(KEEP_ALIVE);
    AsyncClient::new(options, REQUEST_QUEUE)
}

/// Publishes on the status and response topics.
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
}

impl MqttPublisher {
    pub fn new(client: AsyncClient) -> Self {
        Self { client }
    }

    async fn publish_json<T: Serialize + Sync>(&self, topic: &str, payload: &T) -> Result<(), PublishError> {
        let bytes = serde_json::to_vec(payload).map_err(|e| PublishError(e.to_string()))?;
        self.client
            .publish(topic, QoS::AtLeastOnce, false, bytes)
            .await
            .map_err(|e| PublishError(e.to_string()))
    }
}

#[async_trait]
impl AuthPublisher for MqttPublisher {
    async fn publish_status(&self, update: &StatusUpdate) -> Result<(), PublishError> {
        info!(status = ?update.status, "{}", update.message);
        self.publish_json(TOPIC_STATUS, update).await
    }

    async fn publish_response(&self, response: &AuthResponse) -> Result<(), PublishError> {
        self.publish_json(TOPIC_RESPONSE, response).await
    }
}

/// Drives the broker connection until `shutdown` completes.
///
/// On every (re)connection the bridge subscribes to the request topic and
/// announces itself ready.  Connection errors are logged and retried after
/// `reconnect_delay`; rumqttc reconnects on the next poll.
pub async fn run(
    client: AsyncClient,
    mut eventloop: EventLoop,
    bridge: Arc<AuthBridge>,
    reconnect_delay: Duration,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);
    let mut in_flight = JoinSet::new();

    loop {
        let event = tokio::select! {
            _ = &mut shutdown => break,
            Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                log_join(joined);
                continue;
            }
            event = eventloop.poll() => event,
        };

        match event {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!("connected to broker");
                if let Err(e) = client.subscribe(TOPIC_REQUEST, QoS::AtLeastOnce).await {
                    warn!("subscribe to {TOPIC_REQUEST} failed: {e}");
                    continue;
                }
                info!("subscribed to {TOPIC_REQUEST}");
                let bridge = Arc::clone(&bridge);
                tokio::spawn(async move { bridge.announce_ready().await });
            }
            Ok(Event::Incoming(Packet::Publish(message))) if message.topic == TOPIC_REQUEST => {
                match AuthRequest::from_payload(&message.payload) {
                    Ok(request) => {
                        debug!(request_id = %request.request_id, "request received");
                        let bridge = Arc::clone(&bridge);
                        in_flight.spawn(async move {
                            bridge.handle_request(request).await;
                        });
                    }
                    Err(e) => warn!("ignoring malformed request: {e}"),
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("broker connection error: {e}; retrying in {reconnect_delay:?}");
                tokio::time::sleep(reconnect_delay).await;
            }
        }
    }

    if !in_flight.is_empty() {
        info!("waiting for {} in-flight request(s)", in_flight.len());
        drain(&mut in_flight, &mut eventloop, reconnect_delay).await;
    }

    if let Err(e) = client.disconnect().await {
        debug!("disconnect: {e}");
    }
    info!("broker loop stopped");
}

/// Waits for every task in `in_flight`, polling `eventloop` meanwhile so
/// their publishes reach the broker.  New requests are ignored.
async fn drain(in_flight: &mut JoinSet<()>, eventloop: &mut EventLoop, reconnect_delay: Duration) {
    while !in_flight.is_empty() {
        tokio::select! {
            Some(joined) = in_flight.join_next() => log_join(joined),
            event = eventloop.poll() => {
                if let Err(e) = event {
                    debug!("broker connection error while draining: {e}");
                    tokio::time::sleep(reconnect_delay).await;
                }
            }
        }
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        warn!("request task failed: {e}");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
