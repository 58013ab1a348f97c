// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The abstract RPC/broadcast transport contract, plus an in-process
//! reference implementation.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::CommError;
use crate::message::{BroadcastMessage, RpcMessage, RpcReply};

type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A handler for RPC messages addressed to one recipient id.
pub type RpcHandler = Arc<dyn Fn(RpcMessage) -> BoxFuture<RpcReply> + Send + Sync>;

/// A handler that observes every broadcast, regardless of subject.
pub type BroadcastHandler = Arc<dyn Fn(&BroadcastMessage) + Send + Sync>;

/// Transport contract: send RPCs and broadcasts, and manage the
/// subscriber registries that route/observe them.
#[async_trait]
pub trait Communicator: Send + Sync {
    async fn rpc_send(&self, message: RpcMessage) -> Result<RpcReply, CommError>;

    /// Returns `true` if the broadcast found at least one subscriber.
    fn broadcast_send(&self, message: BroadcastMessage) -> bool;

    fn add_rpc_subscriber(&self, recipient_id: String, handler: RpcHandler) -> String;

    fn add_broadcast_subscriber(&self, id: Option<String>, handler: BroadcastHandler) -> String;

    fn remove_rpc_subscriber(&self, recipient_id: &str);

    fn remove_broadcast_subscriber(&self, id: &str);
}

/// In-process reference implementation: RPC messages are routed
/// directly to the matching subscriber's handler; broadcasts fan out to
/// every registered subscriber synchronously. Usable outside
/// `#[cfg(test)]` via the `test-support` feature, since many tests and
/// demos need a communicator without standing up a real transport.
#[derive(Default, Clone)]
pub struct LocalCommunicator {
    rpc_subscribers: Arc<Mutex<HashMap<String, RpcHandler>>>,
    broadcast_subscribers: Arc<Mutex<HashMap<String, BroadcastHandler>>>,
}

impl LocalCommunicator {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Communicator for LocalCommunicator {
    async fn rpc_send(&self, message: RpcMessage) -> Result<RpcReply, CommError> {
        let recipient = message.recipient.to_string();
        let handler = self.rpc_subscribers.lock().get(&recipient).cloned();
        match handler {
            Some(handler) => {
                tracing::debug!(recipient = %recipient, intent = ?message.intent, "rpc_send");
                Ok(handler(message).await)
            }
            None => {
                tracing::warn!(recipient = %recipient, "rpc_send: no subscriber");
                Err(CommError::ConnectionClosed { recipient })
            }
        }
    }

    fn broadcast_send(&self, message: BroadcastMessage) -> bool {
        let subscribers: Vec<BroadcastHandler> =
            self.broadcast_subscribers.lock().values().cloned().collect();
        tracing::debug!(subject = %message.subject, subscribers = subscribers.len(), "broadcast_send");
        for handler in &subscribers {
            handler(&message);
        }
        !subscribers.is_empty()
    }

    fn add_rpc_subscriber(&self, recipient_id: String, handler: RpcHandler) -> String {
        self.rpc_subscribers.lock().insert(recipient_id.clone(), handler);
        recipient_id
    }

    fn add_broadcast_subscriber(&self, id: Option<String>, handler: BroadcastHandler) -> String {
        let id = id.unwrap_or_else(crate::message::new_correlation_id);
        self.broadcast_subscribers.lock().insert(id.clone(), handler);
        id
    }

    fn remove_rpc_subscriber(&self, recipient_id: &str) {
        self.rpc_subscribers.lock().remove(recipient_id);
    }

    fn remove_broadcast_subscriber(&self, id: &str) {
        self.broadcast_subscribers.lock().remove(id);
    }
}
