//! Conversion between framework messages and native chains.

use std::sync::Arc;

use simbot_core::{BotError, BotResult, Element, Id, Image, Message, Messages};
use tracing::debug;

use super::element::{
    MiraiAudio, MiraiElement, MiraiForwardMessage, MiraiImage, MiraiNativeMessage, mirai_element,
};
use crate::native::{NativeBot, NativeContact, NativeImage, NativeMessage, NativeMessageChain};

/// Translates framework messages into a native chain for `contact`.
///
/// Send-only elements are computed here, so this may upload images or
/// nudge users. Extensions of other components are dropped.
pub async fn to_native(
    messages: &Messages,
    contact: &NativeContact,
    bot: &Arc<dyn NativeBot>,
) -> BotResult<NativeMessageChain> {
    let mut elements = Vec::with_capacity(messages.len());
    for element in messages.iter() {
        if let Some(native) = element_to_native(element, contact, bot).await? {
            elements.push(native);
        }
    }
    Ok(NativeMessageChain::new(elements))
}

async fn element_to_native(
    element: &Element,
    contact: &NativeContact,
    bot: &Arc<dyn NativeBot>,
) -> BotResult<Option<NativeMessage>> {
    let native = match element {
        Element::Text { text } => NativeMessage::PlainText(text.clone()),
        Element::At { target, .. } => {
            let target = target
                .to_long()
                .ok_or_else(|| BotError::invalid_argument(format!("at target '{target}' is not numeric")))?;
            NativeMessage::At(target)
        }
        Element::AtAll => NativeMessage::AtAll,
        Element::Face { id } => {
            let id = id
                .to_int()
                .ok_or_else(|| BotError::invalid_argument(format!("face id '{id}' is not numeric")))?;
            NativeMessage::Face(id)
        }
        Element::Emoji { id } => NativeMessage::PlainText(format!(":{id}:")),
        Element::Image(Image::Id(id)) => {
            if id.is_empty() || id.literal().is_empty() {
                return Err(BotError::invalid_argument("image id is empty"));
            }
            NativeMessage::Image(NativeImage::from_id(id.literal()))
        }
        Element::Image(Image::Resource(resource)) => {
            let data = resource.read_bytes()?;
            NativeMessage::Image(contact.upload_image(&resource.name(), &data).await?)
        }
        Element::Extension(extension) => match mirai_element(extension.as_ref()) {
            Some(MiraiElement::Native(native)) => native.native_message(),
            Some(MiraiElement::Computable(computable)) => {
                return computable.compute(contact, bot).await;
            }
            None => {
                debug!(key = extension.key(), "Dropping element unknown to mirai");
                return Ok(None);
            }
        },
    };
    Ok(Some(native))
}

/// Translates a received chain into framework messages.
pub fn to_simbot(chain: &NativeMessageChain) -> Messages {
    chain.elements.iter().map(element_to_simbot).collect()
}

/// Translates one native element.
pub fn element_to_simbot(element: &NativeMessage) -> Element {
    match element {
        NativeMessage::PlainText(text) => Element::text(text.clone()),
        NativeMessage::At(target) => Element::at(*target),
        NativeMessage::AtAll => Element::AtAll,
        NativeMessage::Face(id) => Element::face(Id::Int(*id)),
        NativeMessage::Image(image) => Element::extension(MiraiImage::of(image, false)),
        NativeMessage::FlashImage(image) => Element::extension(MiraiImage::of(image, true)),
        NativeMessage::Audio(audio) => Element::extension(MiraiAudio::of(audio)),
        other => match MiraiForwardMessage::of(other) {
            Some(forward) => Element::extension(forward),
            None => Element::extension(MiraiNativeMessage(other.clone())),
        },
    }
}
