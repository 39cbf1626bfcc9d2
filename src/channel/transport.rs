// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Ordered, reliable, asynchronous message transport between two endpoints.
//!
//! Messages travel as JSON text so the two sides share no memory: every
//! argument goes through its converter and comes out as a fresh value.

use crate::errors::ChannelError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as Json};
use tokio::sync::mpsc;

/// Wire form of one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub message_type: String,
    #[serde(default)]
    pub message_body: Map<String, Json>,
}

impl Envelope {
    pub fn to_text(&self) -> Result<String, ChannelError> {
        serde_json::to_string(self).map_err(|e| ChannelError::MalformedEnvelope(e.to_string()))
    }

    pub fn from_text(text: &str) -> Result<Self, ChannelError> {
        serde_json::from_str(text).map_err(|e| ChannelError::MalformedEnvelope(e.to_string()))
    }
}

/// Outbound half of a transport.
pub trait Transport: Send + Sync {
    fn send(&self, message: String) -> Result<(), ChannelError>;
}

/// Transport backed by an unbounded tokio channel.
pub struct ChannelTransport {
    label: String,
    sender: mpsc::UnboundedSender<String>,
}

impl Transport for ChannelTransport {
    fn send(&self, message: String) -> Result<(), ChannelError> {
        self.sender
            .send(message)
            .map_err(|_| ChannelError::Closed(self.label.clone()))
    }
}

/// One end of a [`MessageChannel`]: where to send, and what arrives.
pub struct Endpoint {
    pub transport: ChannelTransport,
    pub inbound: mpsc::UnboundedReceiver<String>,
}

/// A connected pair of endpoints.
pub struct MessageChannel;

impl MessageChannel {
    /// Returns `(outer, inner)`. What one side sends, the other receives, in order.
    pub fn pair(label: &str) -> (Endpoint, Endpoint) {
        let (to_inner, inner_inbound) = mpsc::unbounded_channel();
        let (to_outer, outer_inbound) = mpsc::unbounded_channel();
        let outer = Endpoint {
            transport: ChannelTransport {
                label: format!("{}/outer", label),
                sender: to_inner,
            },
            inbound: outer_inbound,
        };
        let inner = Endpoint {
            transport: ChannelTransport {
                label: format!("{}/inner", label),
                sender: to_outer,
            },
            inbound: inner_inbound,
        };
        (outer, inner)
    }
}
