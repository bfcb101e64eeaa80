//! Outbound message delivery.
//!
//! Delivery itself belongs to the host; this crate only hands over
//! `(address, args)` pairs.

use crate::value::Value;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub address: String,
    pub args: Vec<Value>,
}

pub trait Transport {
    fn send(&mut self, address: &str, args: Vec<Value>);

    /// Answer a query on `address` with a single value.
    fn reply(&mut self, address: &str, value: Value) {
        self.send(address, vec![value]);
    }
}

/// Transport that keeps every message in send order.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    messages: Vec<Message>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn drain(&mut self) -> Vec<Message> {
        std::mem::take(&mut self.messages)
    }
}

impl Transport for Outbox {
    fn send(&mut self, address: &str, args: Vec<Value>) {
        self.messages.push(Message {
            address: address.to_string(),
            args,
        });
    }
}
