//! # Content Inspection
//!
//! Reads the `type` tag out of message content without a typed decode, and
//! parses `contact` content for the trust graph.

use minicbor::data::Type;
use minicbor::Decoder;
use serde::Deserialize;
use shared_types::FeedId;

use super::bfe::BfeValue;
use super::gabbygrove::ContentType;
use super::message::{FeedMessage, Message};

/// Content type of contact messages.
pub const CONTACT_TYPE: &str = "contact";

/// The `type` field of a message's content, if it has one.
///
/// Encrypted (string) content and content that is not carried inline yield
/// `None`.
pub fn content_type(msg: &Message) -> Option<String> {
    match msg {
        Message::Classic(m) => json_type(m.content_bytes()?),
        Message::GabbyGrove(m) => match m.content_type() {
            ContentType::Json => json_type(m.content_bytes()?),
            ContentType::Cbor => cbor_type(m.content_bytes()?),
            ContentType::Unknown => None,
        },
        Message::BendyButt(m) => match m.content_field("type")? {
            BfeValue::String(s) => Some(s),
            _ => None,
        },
    }
}

#[derive(Deserialize)]
struct TypeOnly {
    #[serde(rename = "type")]
    kind: String,
}

fn json_type(bytes: &[u8]) -> Option<String> {
    serde_json::from_slice::<TypeOnly>(bytes).ok().map(|t| t.kind)
}

fn cbor_type(bytes: &[u8]) -> Option<String> {
    let mut dec = Decoder::new(bytes);
    let len = dec.map().ok()??;
    for _ in 0..len {
        let is_type = match dec.datatype().ok()? {
            Type::String => dec.str().ok()? == "type",
            _ => {
                dec.skip().ok()?;
                false
            }
        };
        if is_type {
            return dec.str().ok().map(str::to_string);
        }
        dec.skip().ok()?;
    }
    None
}

/// Relationship a contact message declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactState {
    Follow,
    Block,
    /// Neither following nor blocking: any previous edge is removed.
    Neutral,
}

/// A parsed contact message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    /// Author of the contact message.
    pub from: FeedId,
    /// Feed the message is about.
    pub contact: FeedId,
    pub following: Option<bool>,
    pub blocking: Option<bool>,
}

#[derive(Deserialize)]
struct ContactContent {
    #[serde(rename = "type")]
    kind: String,
    contact: FeedId,
    following: Option<bool>,
    blocking: Option<bool>,
}

impl Contact {
    /// Parse contact content from a message. Self-contacts are ignored.
    pub fn from_message(msg: &Message) -> Option<Self> {
        let bytes = match msg {
            Message::Classic(m) => m.content_bytes()?,
            Message::GabbyGrove(m) if m.content_type() == ContentType::Json => {
                m.content_bytes()?
            }
            _ => return None,
        };
        let parsed: ContactContent = serde_json::from_slice(bytes).ok()?;
        if parsed.kind != CONTACT_TYPE || &parsed.contact == msg.author() {
            return None;
        }
        Some(Contact {
            from: *msg.author(),
            contact: parsed.contact,
            following: parsed.following,
            blocking: parsed.blocking,
        })
    }

    /// Edge state: following wins over blocking.
    pub fn state(&self) -> ContactState {
        if self.following == Some(true) {
            ContactState::Follow
        } else if self.blocking == Some(true) {
            ContactState::Block
        } else {
            ContactState::Neutral
        }
    }
}
