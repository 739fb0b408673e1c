//! Message chain model of the protocol library.
//!
//! A [`NativeMessageChain`] is what the protocol library delivers with every
//! inbound message and what it accepts for sending. Inbound chains carry a
//! [`NativeMessageSource`] that identifies the message for quoting and
//! recalling.

use serde::{Deserialize, Serialize};

/// Kind of conversation a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageSourceKind {
    /// Group message.
    Group,
    /// Friend message.
    Friend,
    /// Group temp message.
    Temp,
    /// Stranger message.
    Stranger,
}

impl MessageSourceKind {
    /// All kinds, in ordinal order.
    pub const ALL: [MessageSourceKind; 4] = [Self::Group, Self::Friend, Self::Temp, Self::Stranger];

    /// Position of the kind in declaration order.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    /// Inverse of [`ordinal`](Self::ordinal).
    pub fn from_ordinal(ordinal: usize) -> Option<Self> {
        Self::ALL.get(ordinal).copied()
    }
}

/// Identity of a sent or received message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeMessageSource {
    /// Message sequence ids.
    pub ids: Vec<i32>,
    /// Internal random ids.
    pub internal_ids: Vec<i32>,
    /// Send time, epoch seconds.
    pub time: i32,
    /// Sender id.
    pub from_id: i64,
    /// Receiver id (a user or a group).
    pub target_id: i64,
    /// Conversation kind.
    pub kind: MessageSourceKind,
    /// The message content, when known.
    #[serde(default)]
    pub original_message: Vec<NativeMessage>,
}

/// An image known to the protocol library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeImage {
    /// Image id, e.g. `{01E9451B-70ED-EAE3-B37C-101F1EEBF5B5}.jpg`.
    pub id: String,
    /// Width in pixels, 0 if unknown.
    pub width: i32,
    /// Height in pixels, 0 if unknown.
    pub height: i32,
    /// Size in bytes, 0 if unknown.
    pub size: i64,
    /// Format name, e.g. `PNG`.
    pub image_type: String,
    /// Download url.
    pub query_url: String,
}

impl NativeImage {
    /// An image referred to by id only.
    pub fn from_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            width: 0,
            height: 0,
            size: 0,
            image_type: "UNKNOWN".into(),
            query_url: String::new(),
        }
    }
}

/// A voice message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeAudio {
    /// File name.
    pub filename: String,
    /// MD5 of the file.
    pub file_md5: Vec<u8>,
    /// Size in bytes.
    pub file_size: i64,
    /// Codec name, e.g. `AMR`, `SILK`.
    pub codec: String,
}

/// Music platforms a share card can point to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MusicKind {
    /// NetEase Cloud Music.
    NeteaseCloudMusic,
    /// QQ Music.
    QQMusic,
    /// Migu Music.
    MiguMusic,
    /// Kugou Music.
    KugouMusic,
    /// Kuwo Music.
    KuwoMusic,
}

impl MusicKind {
    /// Parses a kind name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        [
            Self::NeteaseCloudMusic,
            Self::QQMusic,
            Self::MiguMusic,
            Self::KugouMusic,
            Self::KuwoMusic,
        ]
        .into_iter()
        .find(|kind| kind.name().to_ascii_lowercase() == lower)
    }

    /// Kind name as used in configuration and cat codes.
    pub fn name(self) -> &'static str {
        match self {
            Self::NeteaseCloudMusic => "NeteaseCloudMusic",
            Self::QQMusic => "QQMusic",
            Self::MiguMusic => "MiguMusic",
            Self::KugouMusic => "KugouMusic",
            Self::KuwoMusic => "KuwoMusic",
        }
    }
}

/// A music share card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeMusicShare {
    /// Platform.
    pub kind: MusicKind,
    /// Title.
    pub title: String,
    /// Summary.
    pub summary: String,
    /// Url opened when the card is clicked.
    pub jump_url: String,
    /// Cover picture url.
    pub picture_url: String,
    /// Audio url.
    pub music_url: String,
    /// Text shown in the conversation list.
    pub brief: String,
}

/// One node of a forwarded message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeForwardNode {
    /// Original sender id.
    pub sender_id: i64,
    /// Original send time, epoch seconds.
    pub time: i32,
    /// Original sender name.
    pub sender_name: String,
    /// Node content.
    pub message: Vec<NativeMessage>,
}

/// A single element of a native message chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NativeMessage {
    /// Plain text.
    PlainText(String),
    /// Mention of a user.
    At(i64),
    /// Mention of everyone.
    AtAll,
    /// Platform face.
    Face(i32),
    /// Image.
    Image(NativeImage),
    /// Image that can be viewed once.
    FlashImage(NativeImage),
    /// Voice.
    Audio(NativeAudio),
    /// Quote of another message.
    QuoteReply(NativeMessageSource),
    /// Music share card.
    MusicShare(NativeMusicShare),
    /// Rich message (xml or json service message).
    Rich {
        /// Service id, 1 for xml cards.
        service_id: i32,
        /// Content.
        content: String,
    },
    /// Light app (json) message.
    LightApp(String),
    /// Dice with a value of 1 to 6.
    Dice(i32),
    /// Poke action.
    Poke {
        /// Name of the poke.
        name: String,
        /// Poke type.
        poke_type: i32,
        /// Poke id.
        id: i32,
    },
    /// Group file.
    File {
        /// File id.
        id: String,
        /// File name.
        name: String,
        /// Size in bytes.
        size: i64,
    },
    /// Forwarded messages.
    Forward {
        /// Card title.
        title: String,
        /// Text shown in the conversation list.
        brief: String,
        /// Footer line of the card.
        summary: String,
        /// Preview lines of the card.
        preview: Vec<String>,
        /// Forwarded nodes.
        nodes: Vec<NativeForwardNode>,
    },
    /// An element the protocol library could not decode.
    Unsupported(Vec<u8>),
}

impl NativeMessage {
    /// Content as it would be shown in a conversation summary.
    pub fn content_to_string(&self) -> String {
        match self {
            Self::PlainText(text) => text.clone(),
            Self::At(target) => format!("@{target}"),
            Self::AtAll => "@全体成员".into(),
            Self::Face(id) => format!("[表情:{id}]"),
            Self::Image(_) => "[图片]".into(),
            Self::FlashImage(_) => "[闪照]".into(),
            Self::Audio(_) => "[语音消息]".into(),
            Self::QuoteReply(_) => String::new(),
            Self::MusicShare(share) => format!("[分享]{}", share.title),
            Self::Rich { content, .. } | Self::LightApp(content) => content.clone(),
            Self::Dice(value) => format!("[骰子:{value}]"),
            Self::Poke { name, .. } => format!("[{name}]"),
            Self::File { name, .. } => format!("[文件]{name}"),
            Self::Forward { .. } => "[转发消息]".into(),
            Self::Unsupported(_) => "[不支持的消息]".into(),
        }
    }
}

/// An ordered chain of native elements.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeMessageChain {
    /// Elements in order.
    pub elements: Vec<NativeMessage>,
    /// Identity of the message, present on inbound chains.
    #[serde(default)]
    pub source: Option<NativeMessageSource>,
}

impl NativeMessageChain {
    /// Creates a chain without a source.
    pub fn new(elements: Vec<NativeMessage>) -> Self {
        Self {
            elements,
            source: None,
        }
    }

    /// Attaches a source.
    pub fn with_source(mut self, source: NativeMessageSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Returns true if the chain has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Concatenated summary content of all elements.
    pub fn content_to_string(&self) -> String {
        self.elements
            .iter()
            .map(NativeMessage::content_to_string)
            .collect()
    }
}

impl From<Vec<NativeMessage>> for NativeMessageChain {
    fn from(elements: Vec<NativeMessage>) -> Self {
        Self::new(elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_ordinal() {
        assert_eq!(MessageSourceKind::Temp.ordinal(), 2);
        assert_eq!(
            MessageSourceKind::from_ordinal(3),
            Some(MessageSourceKind::Stranger)
        );
        assert_eq!(MessageSourceKind::from_ordinal(4), None);
    }

    #[test]
    fn test_music_kind_from_name() {
        assert_eq!(MusicKind::from_name("qqmusic"), Some(MusicKind::QQMusic));
        assert_eq!(MusicKind::from_name("Spotify"), None);
    }

    #[test]
    fn test_chain_content() {
        let chain = NativeMessageChain::new(vec![
            NativeMessage::At(1),
            NativeMessage::PlainText(" hi".into()),
        ]);
        assert_eq!(chain.content_to_string(), "@1 hi");
    }
}
