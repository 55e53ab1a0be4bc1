//! Fan-out of inbound drawing events to every other peer.

use std::sync::Arc;

use super::connection::{Connection, ConnectionId, Frame};
use super::event;
use super::registry::ConnectionRegistry;
use crate::error::InboundError;

/// How strictly inbound frames are checked before they are relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validation {
    /// Frames must be drawing events; rejections are reported to the origin.
    Strict,
    /// Frames only need to be JSON; anything else is logged and dropped.
    Lenient,
}

/// Result of one broadcast pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Peers that accepted the frame.
    pub delivered: usize,
    /// Peers whose delivery failed and that were removed afterwards.
    pub dropped: Vec<ConnectionId>,
}

/// What happened to one inbound frame.
#[derive(Debug)]
pub enum InboundOutcome {
    Relayed(BroadcastReport),
    Rejected(InboundError),
}

/// Validates inbound frames and relays them to the rest of the registry.
#[derive(Debug, Clone)]
pub struct Relay {
    registry: Arc<ConnectionRegistry>,
}

impl Relay {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Handles one text frame received from `origin`.
    ///
    /// Valid frames are relayed verbatim. In strict mode an invalid frame
    /// earns the origin a single `{"error": ...}` reply; the origin is never
    /// disconnected for it.
    pub async fn handle_text(
        &self,
        origin: &Connection,
        raw: &str,
        validation: Validation,
    ) -> InboundOutcome {
        let checked = match validation {
            Validation::Strict => event::validate(raw).map(|event| {
                tracing::trace!(
                    conn_id = %origin.id(),
                    kind = event.kind().as_str(),
                    continuation = event.is_continuation(),
                    "Drawing event accepted"
                );
            }),
            Validation::Lenient => event::parse(raw).map(|_| ()),
        };

        match checked {
            Ok(()) => InboundOutcome::Relayed(self.broadcast(origin.id(), raw).await),
            Err(e) => {
                match validation {
                    Validation::Strict => {
                        tracing::warn!(conn_id = %origin.id(), error = %e, "Rejected inbound payload");
                        if let Err(send_err) = origin.send(Frame::from(e.to_reply())).await {
                            tracing::debug!(error = %send_err, "Could not report rejection to origin");
                        }
                    }
                    Validation::Lenient => {
                        tracing::warn!(conn_id = %origin.id(), payload = raw, "Received non-JSON payload");
                    }
                }
                InboundOutcome::Rejected(e)
            }
        }
    }

    /// Sends `raw` to every registered peer except `origin`.
    ///
    /// Targets come from a snapshot taken when the pass starts. A failed
    /// delivery marks that peer closing and the pass carries on; failed
    /// peers are unregistered once every target has been tried.
    pub async fn broadcast(&self, origin: ConnectionId, raw: &str) -> BroadcastReport {
        let targets = self.registry.snapshot();
        let mut report = BroadcastReport::default();
        if targets.is_empty() {
            return report;
        }

        let frame = Frame::from(raw);
        for peer in targets.iter().filter(|peer| peer.id() != origin) {
            match peer.send(Arc::clone(&frame)).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::warn!(conn_id = %peer.id(), error = %e, "Error sending message to client");
                    peer.mark_closing();
                    report.dropped.push(peer.id());
                }
            }
        }

        self.registry.unregister_all(&report.dropped);

        tracing::debug!(
            origin = %origin,
            delivered = report.delivered,
            failed = report.dropped.len(),
            "Broadcast pass complete"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    const VALID: &str = r#"{"type":"draw","x":1,"y":2,"timestamp":3,"layer":"ink"}"#;

    fn make_connection_with_rx() -> (Arc<Connection>, mpsc::Receiver<Frame>) {
        let (conn, rx) = Connection::channel(8);
        (Arc::new(conn), rx)
    }

    fn make_relay() -> Relay {
        Relay::new(Arc::new(ConnectionRegistry::new()))
    }

    fn register_peers(
        relay: &Relay,
        n: usize,
    ) -> Vec<(Arc<Connection>, mpsc::Receiver<Frame>)> {
        (0..n)
            .map(|_| {
                let (conn, rx) = make_connection_with_rx();
                relay.registry().register(Arc::clone(&conn));
                (conn, rx)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_valid_event_reaches_all_but_origin() {
        let relay = make_relay();
        let mut peers = register_peers(&relay, 4);
        let origin = Arc::clone(&peers[0].0);

        let outcome = relay.handle_text(&origin, VALID, Validation::Strict).await;

        match outcome {
            InboundOutcome::Relayed(report) => {
                assert_eq!(report.delivered, 3);
                assert!(report.dropped.is_empty());
            }
            InboundOutcome::Rejected(e) => panic!("unexpected rejection: {e}"),
        }

        assert!(peers[0].1.try_recv().is_err());
        for (_, rx) in peers.iter_mut().skip(1) {
            assert_eq!(&*rx.try_recv().unwrap(), VALID);
            assert!(rx.try_recv().is_err());
        }
    }

    #[tokio::test]
    async fn test_raw_payload_is_relayed_verbatim() {
        let relay = make_relay();
        let mut peers = register_peers(&relay, 2);
        let raw = "{ \"type\": \"draw\", \"x\": 1.50, \"y\": 2, \"timestamp\": 3, \"extra\": {\"a\": [1]} }";

        relay
            .handle_text(&peers[0].0, raw, Validation::Strict)
            .await;

        assert_eq!(&*peers[1].1.try_recv().unwrap(), raw);
    }

    #[tokio::test]
    async fn test_malformed_payload_replies_to_origin_only() {
        let relay = make_relay();
        let mut peers = register_peers(&relay, 3);

        let outcome = relay
            .handle_text(&peers[0].0, "not json", Validation::Strict)
            .await;

        assert!(matches!(
            outcome,
            InboundOutcome::Rejected(InboundError::Malformed(_))
        ));
        assert_eq!(
            &*peers[0].1.try_recv().unwrap(),
            r#"{"error":"Invalid JSON format"}"#
        );
        assert!(peers[0].1.try_recv().is_err());
        assert!(peers[1].1.try_recv().is_err());
        assert!(peers[2].1.try_recv().is_err());
        assert_eq!(relay.registry().count(), 3);
    }

    #[tokio::test]
    async fn test_missing_timestamp_is_rejected() {
        let relay = make_relay();
        let mut peers = register_peers(&relay, 2);

        let outcome = relay
            .handle_text(&peers[0].0, r#"{"type":"draw","x":1,"y":2}"#, Validation::Strict)
            .await;

        assert!(matches!(
            outcome,
            InboundOutcome::Rejected(InboundError::Schema(_))
        ));
        assert_eq!(
            &*peers[0].1.try_recv().unwrap(),
            r#"{"error":"Error processing drawing data"}"#
        );
        assert!(peers[1].1.try_recv().is_err());
        assert!(relay.registry().contains(peers[0].0.id()));
    }

    #[tokio::test]
    async fn test_lenient_relays_any_json_and_ignores_garbage() {
        let relay = make_relay();
        let mut peers = register_peers(&relay, 2);

        relay
            .handle_text(&peers[0].0, r#"{"anything":true}"#, Validation::Lenient)
            .await;
        assert_eq!(&*peers[1].1.try_recv().unwrap(), r#"{"anything":true}"#);

        let outcome = relay
            .handle_text(&peers[0].0, "garbage", Validation::Lenient)
            .await;
        assert!(matches!(outcome, InboundOutcome::Rejected(_)));
        assert!(peers[0].1.try_recv().is_err());
        assert!(peers[1].1.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_peer_is_removed_and_others_still_receive() {
        let relay = make_relay();
        let mut peers = register_peers(&relay, 4);
        let (dead, dead_rx) = peers.remove(2);
        drop(dead_rx);

        let report = relay.broadcast(peers[0].0.id(), VALID).await;

        assert_eq!(report.delivered, 2);
        assert_eq!(report.dropped, vec![dead.id()]);
        assert!(!relay.registry().contains(dead.id()));
        assert_eq!(relay.registry().count(), 3);
        assert_eq!(
            dead.state(),
            crate::relay::connection::ConnectionState::Closed
        );

        for (_, rx) in peers.iter_mut().skip(1) {
            assert_eq!(&*rx.try_recv().unwrap(), VALID);
        }
    }

    #[tokio::test]
    async fn test_stalled_peer_times_out_and_is_removed() {
        let relay = make_relay();
        let mut peers = register_peers(&relay, 3);

        let (stalled, _stalled_rx) = Connection::channel(1);
        let stalled = Arc::new(stalled.with_send_timeout(Duration::from_millis(20)));
        stalled.send(Frame::from("backlog")).await.unwrap();
        relay.registry().register(Arc::clone(&stalled));

        let report = relay.broadcast(peers[0].0.id(), VALID).await;

        assert_eq!(report.delivered, 2);
        assert_eq!(report.dropped, vec![stalled.id()]);
        assert!(!relay.registry().contains(stalled.id()));
        assert_eq!(relay.registry().count(), 3);
        for (_, rx) in peers.iter_mut().skip(1) {
            assert_eq!(&*rx.try_recv().unwrap(), VALID);
        }
    }

    #[tokio::test]
    async fn test_unregistered_peer_receives_nothing() {
        let relay = make_relay();
        let mut peers = register_peers(&relay, 2);
        let (gone, mut gone_rx) = make_connection_with_rx();
        relay.registry().register(Arc::clone(&gone));
        relay.registry().unregister(&gone);

        let report = relay.broadcast(peers[0].0.id(), VALID).await;

        assert_eq!(report.delivered, 1);
        assert!(gone_rx.try_recv().is_err());
        assert!(peers[1].1.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_empty_registry_is_noop() {
        let relay = make_relay();
        let report = relay.broadcast(ConnectionId::new(), VALID).await;
        assert_eq!(report, BroadcastReport::default());
    }

    #[tokio::test]
    async fn test_single_origin_order_preserved() {
        let relay = make_relay();
        let mut peers = register_peers(&relay, 2);
        let frames: Vec<String> = (0..5)
            .map(|i| format!(r#"{{"type":"draw","x":{i},"y":0,"timestamp":{i}}}"#))
            .collect();

        for frame in &frames {
            relay
                .handle_text(&peers[0].0, frame, Validation::Strict)
                .await;
        }

        for frame in &frames {
            assert_eq!(&*peers[1].1.try_recv().unwrap(), frame.as_str());
        }
    }
}
