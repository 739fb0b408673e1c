//! Mirai-specific message elements.
//!
//! These travel inside [`Element::Extension`](simbot_core::Element) and are
//! recognized by the message parser. Two families exist:
//!
//! - [`MiraiNativeElement`]: maps directly to one native element.
//! - [`MiraiSendOnlyComputable`]: computed against the receiving contact at
//!   send time. The computation may perform an action and produce nothing.
//!
//! ```rust,ignore
//! let message = Messages::from("look")
//!     + Element::extension(MiraiNudge::new(Some(member_id)))
//!     + Element::extension(MiraiShare::new("https://example.com"));
//! group.send(&message).await?;
//! ```

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use simbot_core::{BotError, BotResult, ElementExtension, Message, Messages, Resource};
use tracing::debug;

use super::parser;
use crate::native::{
    MusicKind, NativeAudio, NativeBot, NativeContact, NativeForwardNode, NativeImage,
    NativeMessage, NativeMessageChain, NativeMessageSource, NativeMusicShare,
};
use crate::receipt::parse_source_id;

/// An element that maps directly to one native element.
pub trait MiraiNativeElement: ElementExtension {
    /// The native element to send.
    fn native_message(&self) -> NativeMessage;
}

/// An element computed against the receiving contact when sent.
#[async_trait]
pub trait MiraiSendOnlyComputable: ElementExtension {
    /// Computes the native element. `None` means nothing is appended.
    async fn compute(
        &self,
        contact: &NativeContact,
        bot: &Arc<dyn NativeBot>,
    ) -> BotResult<Option<NativeMessage>>;
}

/// A mirai element found inside an extension.
pub enum MiraiElement<'a> {
    /// Directly convertible.
    Native(&'a dyn MiraiNativeElement),
    /// Computed at send time.
    Computable(&'a dyn MiraiSendOnlyComputable),
}

/// Recognizes the mirai elements of this crate.
pub fn mirai_element(extension: &dyn ElementExtension) -> Option<MiraiElement<'_>> {
    let any = extension.as_any();

    macro_rules! recognize {
        ($variant:ident: $($ty:ty),+) => {
            $(
                if let Some(element) = any.downcast_ref::<$ty>() {
                    return Some(MiraiElement::$variant(element));
                }
            )+
        };
    }

    recognize!(Native: MiraiImage, MiraiAudio, MiraiMusicShare, MiraiQuoteReply, MiraiShare, MiraiNativeMessage);
    recognize!(Computable: MiraiNudge, MiraiSendOnlyImage, MiraiForwardMessage);
    None
}

macro_rules! extension_key {
    ($ty:ty, $key:literal) => {
        impl $ty {
            /// Extension key.
            pub const KEY: &'static str = $key;
        }
    };
}

// =============================================================================
// Nudge
// =============================================================================

/// A nudge ("poke the avatar") action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MiraiNudge {
    /// Who to nudge. `None` nudges the receiving contact.
    pub target: Option<i64>,
}

extension_key!(MiraiNudge, "mirai.nudge");

impl MiraiNudge {
    /// Creates a nudge.
    pub fn new(target: Option<i64>) -> Self {
        Self { target }
    }
}

impl ElementExtension for MiraiNudge {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn display(&self) -> String {
        match self.target {
            Some(target) => format!("[nudge:{target}]"),
            None => "[nudge]".into(),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl MiraiSendOnlyComputable for MiraiNudge {
    async fn compute(
        &self,
        contact: &NativeContact,
        bot: &Arc<dyn NativeBot>,
    ) -> BotResult<Option<NativeMessage>> {
        match (self.target, contact) {
            (Some(target), _) if target == bot.id() => {
                bot.nudge(contact).await?;
            }
            (Some(target), NativeContact::Group(group)) => {
                let member = group.get_member(target).ok_or_else(|| {
                    BotError::no_such_element(format!("member {target} in group {}", group.id()))
                })?;
                member.nudge(contact).await?;
            }
            (None, NativeContact::Group(_)) => {
                bot.nudge(contact).await?;
            }
            (_, user) => {
                user.nudge(contact).await?;
            }
        }
        debug!(target = ?self.target, contact = ?contact, "Nudge sent");
        Ok(None)
    }
}

// =============================================================================
// Images
// =============================================================================

/// An image known to the protocol library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiraiImage {
    /// Image id.
    pub id: String,
    /// Viewable once.
    pub flash: bool,
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
    /// Size in bytes.
    pub size: i64,
    /// Format name.
    pub image_type: String,
    /// Download url.
    pub query_url: String,
}

extension_key!(MiraiImage, "mirai.image");

impl MiraiImage {
    /// Wraps a native image.
    pub fn of(image: &NativeImage, flash: bool) -> Self {
        Self {
            id: image.id.clone(),
            flash,
            width: image.width,
            height: image.height,
            size: image.size,
            image_type: image.image_type.clone(),
            query_url: image.query_url.clone(),
        }
    }

    /// An image referred to by id only.
    pub fn from_id(id: impl Into<String>, flash: bool) -> Self {
        Self::of(&NativeImage::from_id(id), flash)
    }

    fn native_image(&self) -> NativeImage {
        NativeImage {
            id: self.id.clone(),
            width: self.width,
            height: self.height,
            size: self.size,
            image_type: self.image_type.clone(),
            query_url: self.query_url.clone(),
        }
    }
}

impl ElementExtension for MiraiImage {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn display(&self) -> String {
        if self.flash {
            format!("[flash:{}]", self.id)
        } else {
            format!("[image:{}]", self.id)
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl MiraiNativeElement for MiraiImage {
    fn native_message(&self) -> NativeMessage {
        if self.flash {
            NativeMessage::FlashImage(self.native_image())
        } else {
            NativeMessage::Image(self.native_image())
        }
    }
}

/// An image uploaded to the receiving contact when sent.
#[derive(Debug, Clone, PartialEq)]
pub struct MiraiSendOnlyImage {
    /// Image content.
    pub resource: Resource,
    /// Viewable once.
    pub flash: bool,
}

extension_key!(MiraiSendOnlyImage, "mirai.send_only_image");

impl ElementExtension for MiraiSendOnlyImage {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn display(&self) -> String {
        format!("[image:{}]", self.resource.name())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl MiraiSendOnlyComputable for MiraiSendOnlyImage {
    async fn compute(
        &self,
        contact: &NativeContact,
        _bot: &Arc<dyn NativeBot>,
    ) -> BotResult<Option<NativeMessage>> {
        let data = self.resource.read_bytes()?;
        let image = contact.upload_image(&self.resource.name(), &data).await?;
        Ok(Some(if self.flash {
            NativeMessage::FlashImage(image)
        } else {
            NativeMessage::Image(image)
        }))
    }
}

// =============================================================================
// Audio
// =============================================================================

/// A voice message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiraiAudio {
    /// File name.
    pub filename: String,
    /// MD5 of the file.
    pub file_md5: Vec<u8>,
    /// Size in bytes.
    pub file_size: i64,
    /// Codec name.
    pub codec: String,
}

extension_key!(MiraiAudio, "mirai.audio");

impl MiraiAudio {
    /// Wraps a native audio.
    pub fn of(audio: &NativeAudio) -> Self {
        Self {
            filename: audio.filename.clone(),
            file_md5: audio.file_md5.clone(),
            file_size: audio.file_size,
            codec: audio.codec.clone(),
        }
    }

    /// Hex md5, which is how the audio is referred to by id.
    pub fn id(&self) -> String {
        hex::encode(&self.file_md5)
    }
}

impl ElementExtension for MiraiAudio {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn display(&self) -> String {
        format!("[audio:{}]", self.filename)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl MiraiNativeElement for MiraiAudio {
    fn native_message(&self) -> NativeMessage {
        NativeMessage::Audio(NativeAudio {
            filename: self.filename.clone(),
            file_md5: self.file_md5.clone(),
            file_size: self.file_size,
            codec: self.codec.clone(),
        })
    }
}

// =============================================================================
// Cards
// =============================================================================

/// A music share card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiraiMusicShare {
    /// Platform.
    pub kind: MusicKind,
    /// Title.
    pub title: String,
    /// Summary.
    pub summary: String,
    /// Page url.
    pub jump_url: String,
    /// Cover url.
    pub picture_url: String,
    /// Audio url.
    pub music_url: String,
    /// Text shown in conversation lists.
    pub brief: String,
}

extension_key!(MiraiMusicShare, "mirai.music_share");

impl MiraiMusicShare {
    /// Wraps a native music share.
    pub fn of(share: &NativeMusicShare) -> Self {
        Self {
            kind: share.kind,
            title: share.title.clone(),
            summary: share.summary.clone(),
            jump_url: share.jump_url.clone(),
            picture_url: share.picture_url.clone(),
            music_url: share.music_url.clone(),
            brief: share.brief.clone(),
        }
    }
}

impl ElementExtension for MiraiMusicShare {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn display(&self) -> String {
        format!("[分享]{}", self.title)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl MiraiNativeElement for MiraiMusicShare {
    fn native_message(&self) -> NativeMessage {
        NativeMessage::MusicShare(NativeMusicShare {
            kind: self.kind,
            title: self.title.clone(),
            summary: self.summary.clone(),
            jump_url: self.jump_url.clone(),
            picture_url: self.picture_url.clone(),
            music_url: self.music_url.clone(),
            brief: self.brief.clone(),
        })
    }
}

/// A link share card, sent as an xml rich message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MiraiShare {
    /// Target url.
    pub url: String,
    /// Title.
    pub title: Option<String>,
    /// Description.
    pub content: Option<String>,
    /// Cover image url.
    pub cover_url: Option<String>,
}

extension_key!(MiraiShare, "mirai.share");

/// Service id of xml rich messages.
pub const XML_SERVICE_ID: i32 = 1;

impl MiraiShare {
    /// Creates a share of `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            content: None,
            cover_url: None,
        }
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// Sets the cover.
    pub fn with_cover_url(mut self, cover_url: impl Into<String>) -> Self {
        self.cover_url = Some(cover_url.into());
        self
    }

    fn xml(&self) -> String {
        let title = xml_escape(self.title.as_deref().unwrap_or(&self.url));
        let content = xml_escape(self.content.as_deref().unwrap_or_default());
        let cover = xml_escape(self.cover_url.as_deref().unwrap_or_default());
        let url = xml_escape(&self.url);
        format!(
            r#"<?xml version='1.0' encoding='UTF-8' standalone='yes' ?><msg serviceID="1" templateID="12345" action="web" brief="[分享]{title}" url="{url}"><item layout="2"><picture cover="{cover}"/><title>{title}</title><summary>{content}</summary></item><source/></msg>"#
        )
    }
}

fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

impl ElementExtension for MiraiShare {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn display(&self) -> String {
        format!("[分享]{}", self.title.as_deref().unwrap_or(&self.url))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl MiraiNativeElement for MiraiShare {
    fn native_message(&self) -> NativeMessage {
        NativeMessage::Rich {
            service_id: XML_SERVICE_ID,
            content: self.xml(),
        }
    }
}

// =============================================================================
// Quote
// =============================================================================

/// A quote of another message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiraiQuoteReply {
    /// The quoted message.
    pub source: NativeMessageSource,
}

extension_key!(MiraiQuoteReply, "mirai.quote_reply");

impl MiraiQuoteReply {
    /// Quotes a message source.
    pub fn of(source: NativeMessageSource) -> Self {
        Self { source }
    }

    /// Quotes a message by the id of its receipt.
    pub fn from_receipt_id(id: &str) -> BotResult<Self> {
        Ok(Self::of(parse_source_id(id)?.into_source()))
    }
}

impl ElementExtension for MiraiQuoteReply {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn display(&self) -> String {
        String::new()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl MiraiNativeElement for MiraiQuoteReply {
    fn native_message(&self) -> NativeMessage {
        NativeMessage::QuoteReply(self.source.clone())
    }
}

// =============================================================================
// Forward
// =============================================================================

/// One forwarded message inside a [`MiraiForwardMessage`].
#[derive(Debug, Clone)]
pub struct MiraiForwardNode {
    /// Original sender id.
    pub sender_id: i64,
    /// Original send time, epoch seconds.
    pub time: i32,
    /// Original sender name.
    pub sender_name: String,
    /// Content, translated into framework elements.
    pub messages: Messages,
}

impl MiraiForwardNode {
    /// Creates a node.
    pub fn new(sender_id: i64, time: i32, sender_name: impl Into<String>, messages: impl Into<Messages>) -> Self {
        Self {
            sender_id,
            time,
            sender_name: sender_name.into(),
            messages: messages.into(),
        }
    }

    fn of(node: &NativeForwardNode) -> Self {
        Self {
            sender_id: node.sender_id,
            time: node.time,
            sender_name: node.sender_name.clone(),
            messages: parser::to_simbot(&NativeMessageChain::new(node.message.clone())),
        }
    }
}

/// A merged-forward card carrying other messages.
///
/// Received cards keep their rendered title, brief, summary and preview.
/// Node contents are translated in both directions, so a node may hold any
/// element the parser accepts, including resources uploaded when sent.
#[derive(Debug, Clone)]
pub struct MiraiForwardMessage {
    /// Card title.
    pub title: String,
    /// Text shown in the conversation list.
    pub brief: String,
    /// Footer line of the card.
    pub summary: String,
    /// Preview lines of the card.
    pub preview: Vec<String>,
    /// Forwarded messages.
    pub nodes: Vec<MiraiForwardNode>,
}

extension_key!(MiraiForwardMessage, "mirai.forward");

impl MiraiForwardMessage {
    /// A card rendered the way the official client renders chat history.
    pub fn new(nodes: Vec<MiraiForwardNode>) -> Self {
        let preview = nodes
            .iter()
            .take(4)
            .map(|node| format!("{}: {}", node.sender_name, node.messages.display()))
            .collect();
        let summary = format!("查看{}条转发消息", nodes.len());
        Self {
            title: "群聊的聊天记录".into(),
            brief: "[聊天记录]".into(),
            summary,
            preview,
            nodes,
        }
    }

    /// Translates a received forward card.
    ///
    /// Returns `None` for any other native element.
    pub fn of(native: &NativeMessage) -> Option<Self> {
        let NativeMessage::Forward {
            title,
            brief,
            summary,
            preview,
            nodes,
        } = native
        else {
            return None;
        };
        Some(Self {
            title: title.clone(),
            brief: brief.clone(),
            summary: summary.clone(),
            preview: preview.clone(),
            nodes: nodes.iter().map(MiraiForwardNode::of).collect(),
        })
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the brief.
    pub fn with_brief(mut self, brief: impl Into<String>) -> Self {
        self.brief = brief.into();
        self
    }

    /// Sets the summary.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self
    }
}

impl ElementExtension for MiraiForwardMessage {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn display(&self) -> String {
        self.brief.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[async_trait]
impl MiraiSendOnlyComputable for MiraiForwardMessage {
    async fn compute(
        &self,
        contact: &NativeContact,
        bot: &Arc<dyn NativeBot>,
    ) -> BotResult<Option<NativeMessage>> {
        let mut nodes = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let chain = parser::to_native(&node.messages, contact, bot).await?;
            nodes.push(NativeForwardNode {
                sender_id: node.sender_id,
                time: node.time,
                sender_name: node.sender_name.clone(),
                message: chain.elements,
            });
        }
        Ok(Some(NativeMessage::Forward {
            title: self.title.clone(),
            brief: self.brief.clone(),
            summary: self.summary.clone(),
            preview: self.preview.clone(),
            nodes,
        }))
    }
}

// =============================================================================
// Passthrough
// =============================================================================

/// A native element without a dedicated wrapper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiraiNativeMessage(pub NativeMessage);

extension_key!(MiraiNativeMessage, "mirai.native_message");

impl MiraiNativeMessage {
    /// The wrapped element.
    pub fn native(&self) -> &NativeMessage {
        &self.0
    }
}

impl ElementExtension for MiraiNativeMessage {
    fn key(&self) -> &'static str {
        Self::KEY
    }

    fn display(&self) -> String {
        self.0.content_to_string()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl MiraiNativeElement for MiraiNativeMessage {
    fn native_message(&self) -> NativeMessage {
        self.0.clone()
    }
}
