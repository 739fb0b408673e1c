//! Send receipts and message source ids.
//!
//! A source id encodes everything needed to quote or recall a message:
//!
//! ```text
//! ids:internal_ids:time:bot_id:kind
//! 1.2:3.4:1650000000:123456:0
//! ```

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use simbot_core::{BotError, BotResult, Id, MessageReceipt};
use tracing::debug;

use crate::native::{MessageSourceKind, NativeMessageSource, NativeReceipt};

/// Builds the id of a message source as seen by `bot_id`.
pub fn source_id(source: &NativeMessageSource, bot_id: i64) -> Id {
    Id::Text(format!(
        "{}:{}:{}:{}:{}",
        join(&source.ids),
        join(&source.internal_ids),
        source.time,
        bot_id,
        source.kind.ordinal()
    ))
}

fn join(ids: &[i32]) -> String {
    ids.iter().map(i32::to_string).collect::<Vec<_>>().join(".")
}

fn split(part: &str, id: &str) -> BotResult<Vec<i32>> {
    if part.is_empty() {
        return Ok(Vec::new());
    }
    part.split('.')
        .map(|n| {
            n.parse()
                .map_err(|_| BotError::invalid_argument(format!("bad number '{n}' in source id '{id}'")))
        })
        .collect()
}

/// The parts of a source id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSourceId {
    /// Message ids.
    pub ids: Vec<i32>,
    /// Internal ids.
    pub internal_ids: Vec<i32>,
    /// Time, epoch seconds.
    pub time: i32,
    /// The bot that saw the message.
    pub bot_id: i64,
    /// Conversation kind.
    pub kind: MessageSourceKind,
}

impl ParsedSourceId {
    /// Rebuilds a source sent by the bot. The target is unknown.
    pub fn into_source(self) -> NativeMessageSource {
        NativeMessageSource {
            ids: self.ids,
            internal_ids: self.internal_ids,
            time: self.time,
            from_id: self.bot_id,
            target_id: 0,
            kind: self.kind,
            original_message: Vec::new(),
        }
    }
}

/// Parses an id produced by [`source_id`].
pub fn parse_source_id(id: &str) -> BotResult<ParsedSourceId> {
    let parts: Vec<&str> = id.split(':').collect();
    let [ids, internal_ids, time, bot_id, kind] = parts.as_slice() else {
        return Err(BotError::invalid_argument(format!(
            "source id '{id}' must have 5 elements, found {}",
            parts.len()
        )));
    };

    let time = time
        .parse()
        .map_err(|_| BotError::invalid_argument(format!("bad time in source id '{id}'")))?;
    let bot_id = bot_id
        .parse()
        .map_err(|_| BotError::invalid_argument(format!("bad bot id in source id '{id}'")))?;
    let kind = kind
        .parse()
        .ok()
        .and_then(MessageSourceKind::from_ordinal)
        .ok_or_else(|| BotError::invalid_argument(format!("bad source kind in source id '{id}'")))?;

    Ok(ParsedSourceId {
        ids: split(ids, id)?,
        internal_ids: split(internal_ids, id)?,
        time,
        bot_id,
        kind,
    })
}

// =============================================================================
// Receipt
// =============================================================================

/// Receipt of a message sent through a mirai contact.
pub struct MiraiMessageReceipt {
    native: Option<Arc<dyn NativeReceipt>>,
    id: Id,
}

impl MiraiMessageReceipt {
    /// Wraps a native receipt.
    pub fn new(native: Arc<dyn NativeReceipt>, bot_id: i64) -> Self {
        let id = source_id(native.source(), bot_id);
        Self {
            native: Some(native),
            id,
        }
    }

    /// A receipt for a message that translated to nothing and was not sent.
    pub fn empty() -> Self {
        Self {
            native: None,
            id: Id::Text(String::new()),
        }
    }

    /// The native receipt, if anything was sent.
    pub fn native(&self) -> Option<&Arc<dyn NativeReceipt>> {
        self.native.as_ref()
    }

    /// Source of the sent message.
    pub fn source(&self) -> Option<&NativeMessageSource> {
        self.native.as_ref().map(|r| r.source())
    }
}

#[async_trait]
impl MessageReceipt for MiraiMessageReceipt {
    fn id(&self) -> Id {
        self.id.clone()
    }

    fn is_success(&self) -> bool {
        self.native.is_some()
    }

    async fn delete(&self) -> BotResult<bool> {
        let Some(native) = &self.native else {
            return Ok(false);
        };
        native.recall().await?;
        debug!(message_id = %self.id, "Message recalled");
        Ok(true)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> NativeMessageSource {
        NativeMessageSource {
            ids: vec![1, 2],
            internal_ids: vec![3, 4],
            time: 1_650_000_000,
            from_id: 5,
            target_id: 6,
            kind: MessageSourceKind::Temp,
            original_message: vec![],
        }
    }

    #[test]
    fn test_source_id_format() {
        assert_eq!(source_id(&source(), 123).literal(), "1.2:3.4:1650000000:123:2");
    }

    #[test]
    fn test_parse_reverses_source_id() {
        let id = source_id(&source(), 123).literal();
        let parsed = parse_source_id(&id).unwrap();
        assert_eq!(parsed.ids, vec![1, 2]);
        assert_eq!(parsed.internal_ids, vec![3, 4]);
        assert_eq!(parsed.time, 1_650_000_000);
        assert_eq!(parsed.bot_id, 123);
        assert_eq!(parsed.kind, MessageSourceKind::Temp);

        let rebuilt = parsed.into_source();
        assert_eq!(rebuilt.from_id, 123);
        assert_eq!(rebuilt.ids, vec![1, 2]);
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        assert!(matches!(
            parse_source_id("1:2:3:4"),
            Err(BotError::InvalidArgument(_))
        ));
        assert!(parse_source_id("1:2:3:4:0:6").is_err());
        assert!(parse_source_id("1:2:x:4:0").is_err());
        assert!(parse_source_id("1:2:3:4:9").is_err());
    }

    #[tokio::test]
    async fn test_empty_receipt() {
        let receipt = MiraiMessageReceipt::empty();
        assert!(!receipt.is_success());
        assert!(!receipt.delete().await.unwrap());
    }
}
