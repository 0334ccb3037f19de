//! # Message Sum Type
//!
//! One closed variant per wire format, all exposing [`FeedMessage`].

use shared_types::{FeedFormat, FeedId, MessageRef, Sequence};

use super::bendybutt::BendyButtMessage;
use super::classic::ClassicMessage;
use super::gabbygrove::GabbyGroveMessage;

/// Accessors shared by every message format.
pub trait FeedMessage {
    /// Feed that published the message.
    fn author(&self) -> &FeedId;

    /// 1-based position in the author's feed.
    fn sequence(&self) -> Sequence;

    /// Key of the predecessor. `None` iff `sequence() == 1`.
    fn previous(&self) -> Option<&MessageRef>;

    /// Claimed publishing time in milliseconds since the epoch.
    fn timestamp(&self) -> i64;

    /// Content bytes, if the message carries its content inline.
    fn content_bytes(&self) -> Option<&[u8]>;

    /// Raw Ed25519 signature of the envelope.
    fn signature(&self) -> &[u8];

    /// Content address of this message.
    fn key(&self) -> &MessageRef;

    /// Bytes as received, for re-gossiping bit for bit.
    fn raw(&self) -> &[u8];
}

/// A decoded message of any supported format.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Classic(ClassicMessage),
    GabbyGrove(GabbyGroveMessage),
    BendyButt(BendyButtMessage),
}

impl Message {
    pub fn format(&self) -> FeedFormat {
        match self {
            Message::Classic(_) => FeedFormat::Classic,
            Message::GabbyGrove(_) => FeedFormat::GabbyGrove,
            Message::BendyButt(_) => FeedFormat::BendyButt,
        }
    }

    fn inner(&self) -> &dyn FeedMessage {
        match self {
            Message::Classic(m) => m,
            Message::GabbyGrove(m) => m,
            Message::BendyButt(m) => m,
        }
    }
}

impl FeedMessage for Message {
    fn author(&self) -> &FeedId {
        self.inner().author()
    }

    fn sequence(&self) -> Sequence {
        self.inner().sequence()
    }

    fn previous(&self) -> Option<&MessageRef> {
        self.inner().previous()
    }

    fn timestamp(&self) -> i64 {
        self.inner().timestamp()
    }

    fn content_bytes(&self) -> Option<&[u8]> {
        self.inner().content_bytes()
    }

    fn signature(&self) -> &[u8] {
        self.inner().signature()
    }

    fn key(&self) -> &MessageRef {
        self.inner().key()
    }

    fn raw(&self) -> &[u8] {
        self.inner().raw()
    }
}

impl From<ClassicMessage> for Message {
    fn from(m: ClassicMessage) -> Self {
        Message::Classic(m)
    }
}

impl From<GabbyGroveMessage> for Message {
    fn from(m: GabbyGroveMessage) -> Self {
        Message::GabbyGrove(m)
    }
}

impl From<BendyButtMessage> for Message {
    fn from(m: BendyButtMessage) -> Self {
        Message::BendyButt(m)
    }
}

/// Check the `previous` pointer against the sequence number.
pub(crate) fn check_previous(
    sequence: Sequence,
    previous: Option<&MessageRef>,
) -> Result<(), super::errors::FormatError> {
    use super::errors::FormatError;
    match (sequence, previous) {
        (0, _) => Err(FormatError::malformed("sequence must start at 1")),
        (1, Some(_)) => Err(FormatError::malformed("first message must not have a previous")),
        (n, None) if n > 1 => Err(FormatError::malformed(format!(
            "message {n} is missing its previous"
        ))),
        _ => Ok(()),
    }
}
