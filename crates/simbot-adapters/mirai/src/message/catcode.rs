//! Cat code: a textual form of mirai messages.
//!
//! A cat code looks like `[CAT:type,key=value,...]`. Text between codes is
//! plain text. Values escape `& [ ] ,` and line breaks; plain text escapes
//! only `& [ ]`.
//!
//! ```rust,ignore
//! let codec = CatCodec::new();
//! let messages = codec.decode_str("hi [CAT:at,code=123][CAT:face,id=178]", None)?;
//! assert_eq!(codec.encode_messages(&messages), "hi [CAT:at,code=123][CAT:face,id=178]");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::Rng;
use simbot_core::{BotError, BotResult, Element, Id, Image, Message, Messages, Resource};

use super::element::{
    MiraiAudio, MiraiImage, MiraiMusicShare, MiraiNativeMessage, MiraiNudge, MiraiQuoteReply,
    MiraiSendOnlyImage, MiraiShare,
};
use crate::native::{MusicKind, NativeMessage, NativeMessageChain};
use crate::receipt::source_id;

const HEAD: &str = "[CAT:";

// =============================================================================
// Escaping
// =============================================================================

/// Escapes a parameter value.
pub fn encode_value(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('[', "&#91;")
        .replace(']', "&#93;")
        .replace(',', "&#44;")
        .replace('\n', "&#13;")
        .replace('\r', "&#10;")
}

/// Reverses [`encode_value`].
pub fn decode_value(value: &str) -> String {
    value
        .replace("&#91;", "[")
        .replace("&#93;", "]")
        .replace("&#44;", ",")
        .replace("&#13;", "\n")
        .replace("&#10;", "\r")
        .replace("&amp;", "&")
}

/// Escapes plain text between codes.
pub fn encode_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('[', "&#91;")
        .replace(']', "&#93;")
}

/// Reverses [`encode_text`].
pub fn decode_text(text: &str) -> String {
    text.replace("&#91;", "[")
        .replace("&#93;", "]")
        .replace("&amp;", "&")
}

// =============================================================================
// Code
// =============================================================================

/// One parsed cat code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatCode {
    kind: String,
    params: Vec<(String, String)>,
}

impl CatCode {
    /// Creates a code without parameters.
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            params: Vec::new(),
        }
    }

    /// Adds a parameter.
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    /// Adds a parameter if present.
    pub fn with_opt(self, key: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    /// Parses `[CAT:type,k=v,...]`.
    pub fn parse(code: &str) -> BotResult<Self> {
        let body = code
            .strip_prefix(HEAD)
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| BotError::invalid_argument(format!("'{code}' is not a cat code")))?;

        let mut parts = body.split(',');
        let kind = parts.next().unwrap_or_default().trim();
        if kind.is_empty() {
            return Err(BotError::invalid_argument(format!("cat code '{code}' has no type")));
        }

        let params = parts
            .filter(|part| !part.is_empty())
            .map(|part| match part.split_once('=') {
                Some((key, value)) => (key.to_string(), decode_value(value)),
                None => (part.to_string(), String::new()),
            })
            .collect();

        Ok(Self {
            kind: kind.to_string(),
            params,
        })
    }

    /// Code type.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Finds a parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Finds a required parameter.
    pub fn require(&self, key: &str) -> BotResult<&str> {
        self.get(key).ok_or_else(|| {
            BotError::invalid_argument(format!("cat code '{}' requires '{key}'", self.kind))
        })
    }

    /// Parses a parameter.
    pub fn parse_param<T: std::str::FromStr>(&self, key: &str) -> BotResult<Option<T>> {
        self.get(key)
            .map(|value| {
                value.trim().parse().map_err(|_| {
                    BotError::invalid_argument(format!(
                        "cat code '{}' has a bad '{key}': {value}",
                        self.kind
                    ))
                })
            })
            .transpose()
    }

    /// True if the parameter is `true`, ignoring case.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }
}

impl fmt::Display for CatCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{HEAD}{}", self.kind)?;
        for (key, value) in &self.params {
            write!(f, ",{key}={}", encode_value(value))?;
        }
        f.write_str("]")
    }
}

// =============================================================================
// Decoding
// =============================================================================

/// Decodes one code type into an element.
pub trait CatCodeDecoder: Send + Sync {
    /// Decodes `code`. `base_chain` is the received chain the code was
    /// produced from, if any.
    fn decode(&self, code: &CatCode, base_chain: Option<&NativeMessageChain>) -> BotResult<Element>;
}

impl<F> CatCodeDecoder for F
where
    F: Fn(&CatCode, Option<&NativeMessageChain>) -> BotResult<Element> + Send + Sync,
{
    fn decode(&self, code: &CatCode, base_chain: Option<&NativeMessageChain>) -> BotResult<Element> {
        self(code, base_chain)
    }
}

/// Cat code encoder and decoder with custom decoders.
#[derive(Default)]
pub struct CatCodec {
    decoders: RwLock<HashMap<String, Arc<dyn CatCodeDecoder>>>,
}

impl CatCodec {
    /// Creates a codec with only the built-in decoders.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a decoder for `kind`. It takes precedence over built-ins.
    pub fn register(&self, kind: impl Into<String>, decoder: impl CatCodeDecoder + 'static) {
        self.decoders.write().insert(kind.into(), Arc::new(decoder));
    }

    /// Removes a custom decoder.
    pub fn unregister(&self, kind: &str) -> bool {
        self.decoders.write().remove(kind).is_some()
    }

    /// Decodes one code string.
    pub fn decode(&self, code: &str, base_chain: Option<&NativeMessageChain>) -> BotResult<Element> {
        let parsed = CatCode::parse(code)?;
        let custom = self.decoders.read().get(parsed.kind()).cloned();
        match custom {
            Some(decoder) => decoder.decode(&parsed, base_chain),
            None => decode_builtin(code, &parsed, base_chain),
        }
    }

    /// Splits mixed text and codes into messages.
    pub fn decode_str(&self, text: &str, base_chain: Option<&NativeMessageChain>) -> BotResult<Messages> {
        let mut messages = Messages::new();
        let mut rest = text;

        while let Some(start) = rest.find(HEAD) {
            let Some(len) = rest[start..].find(']') else {
                break;
            };
            if start > 0 {
                messages.push(Element::text(decode_text(&rest[..start])));
            }
            let end = start + len + 1;
            messages.push(self.decode(&rest[start..end], base_chain)?);
            rest = &rest[end..];
        }

        if !rest.is_empty() {
            messages.push(Element::text(decode_text(rest)));
        }
        Ok(messages)
    }

    /// Encodes one element.
    pub fn encode(&self, element: &Element) -> String {
        encode(element)
    }

    /// Encodes messages, concatenated.
    pub fn encode_messages(&self, messages: &Messages) -> String {
        messages.iter().map(encode).collect()
    }
}

fn id_of(value: &str) -> Id {
    value
        .trim()
        .parse::<i64>()
        .map(Id::Long)
        .unwrap_or_else(|_| Id::Text(value.to_string()))
}

fn decode_builtin(
    raw: &str,
    code: &CatCode,
    base_chain: Option<&NativeMessageChain>,
) -> BotResult<Element> {
    let element = match code.kind() {
        "text" | "message" => Element::text(code.get("text").unwrap_or_default()),
        "at" => {
            if code.flag("all") {
                Element::AtAll
            } else {
                Element::at(id_of(code.require("code")?))
            }
        }
        "atall" | "atAll" => Element::AtAll,
        "face" => Element::face(id_of(code.require("id")?)),
        "emoji" => Element::emoji(id_of(code.require("id")?)),
        "poke" | "shake" => Element::extension(MiraiNativeMessage(NativeMessage::Poke {
            name: code.get("name").unwrap_or("戳一戳").to_string(),
            poke_type: code.parse_param("type")?.unwrap_or(1),
            id: code.parse_param("id")?.unwrap_or(-1),
        })),
        "nudge" => Element::extension(MiraiNudge::new(code.parse_param("target")?)),
        "image" | "img" => decode_image(code, base_chain)?,
        "audio" | "voice" | "record" => decode_audio(code, base_chain)?,
        "share" => {
            let mut share = MiraiShare::new(code.require("url")?);
            share.title = code.get("title").map(str::to_string);
            share.content = code.get("content").map(str::to_string);
            share.cover_url = code.get("coverUrl").map(str::to_string);
            Element::extension(share)
        }
        "rich" => Element::extension(MiraiNativeMessage(NativeMessage::Rich {
            service_id: code.parse_param("serviceId")?.unwrap_or(1),
            content: code.require("content")?.to_string(),
        })),
        "app" | "json" => Element::extension(MiraiNativeMessage(NativeMessage::LightApp(
            code.require("content")?.to_string(),
        ))),
        "xml" => Element::extension(MiraiNativeMessage(NativeMessage::Rich {
            service_id: code.parse_param("serviceId")?.unwrap_or(60),
            content: code.require("content")?.to_string(),
        })),
        "dice" => {
            let value = match code.parse_param::<i32>("value")? {
                Some(value) => value,
                None => rand::thread_rng().gen_range(1..=6),
            };
            if !(1..=6).contains(&value) {
                return Err(BotError::invalid_argument(format!("dice value {value} is not in 1..=6")));
            }
            Element::extension(MiraiNativeMessage(NativeMessage::Dice(value)))
        }
        "music" | "musicShare" => decode_music(code)?,
        "quote" => Element::extension(MiraiQuoteReply::from_receipt_id(code.require("id")?)?),
        _ => Element::text(raw),
    };
    Ok(element)
}

fn decode_image(code: &CatCode, base_chain: Option<&NativeMessageChain>) -> BotResult<Element> {
    let flash = code.flag("flash");

    if let Some(id) = code.get("id") {
        let found = base_chain.and_then(|chain| {
            chain.elements.iter().find_map(|element| match element {
                NativeMessage::Image(image) if image.id == id => Some(MiraiImage::of(image, flash)),
                NativeMessage::FlashImage(image) if image.id == id => Some(MiraiImage::of(image, true)),
                _ => None,
            })
        });
        return Ok(Element::extension(found.unwrap_or_else(|| MiraiImage::from_id(id, flash))));
    }

    if let Some(file) = code.get("file") {
        let path = file.strip_prefix("file:").unwrap_or(file);
        return Ok(Element::extension(MiraiSendOnlyImage {
            resource: Resource::Path(PathBuf::from(path)),
            flash,
        }));
    }

    Err(BotError::invalid_argument("image cat code requires 'id' or 'file'"))
}

fn decode_audio(code: &CatCode, base_chain: Option<&NativeMessageChain>) -> BotResult<Element> {
    let id = code.require("id")?;
    base_chain
        .and_then(|chain| {
            chain.elements.iter().find_map(|element| match element {
                NativeMessage::Audio(audio) if hex::encode(&audio.file_md5).eq_ignore_ascii_case(id) => {
                    Some(Element::extension(MiraiAudio::of(audio)))
                }
                _ => None,
            })
        })
        .ok_or_else(|| BotError::no_such_element(format!("audio '{id}' in the base chain")))
}

fn decode_music(code: &CatCode) -> BotResult<Element> {
    let kind_name = code.require("kind")?;
    let kind = MusicKind::from_name(kind_name)
        .ok_or_else(|| BotError::invalid_argument(format!("unknown music kind '{kind_name}'")))?;
    let title = code.require("title")?.to_string();
    let param = |key: &str| code.get(key).unwrap_or_default().to_string();

    Ok(Element::extension(MiraiMusicShare {
        kind,
        brief: code
            .get("brief")
            .map(str::to_string)
            .unwrap_or_else(|| format!("[分享]{title}")),
        summary: param("summary"),
        jump_url: param("jumpUrl"),
        picture_url: param("pictureUrl"),
        music_url: param("musicUrl"),
        title,
    }))
}

// =============================================================================
// Encoding
// =============================================================================

/// Encodes one element.
pub fn encode(element: &Element) -> String {
    let code = match element {
        Element::Text { text } => return encode_text(text),
        Element::At { target, .. } => CatCode::new("at").with("code", target),
        Element::AtAll => CatCode::new("at").with("all", true),
        Element::Face { id } => CatCode::new("face").with("id", id),
        Element::Emoji { id } => CatCode::new("emoji").with("id", id),
        Element::Image(Image::Id(id)) => CatCode::new("image").with("id", id),
        Element::Image(Image::Resource(Resource::Path(path))) => {
            CatCode::new("image").with("file", path.display())
        }
        Element::Extension(extension) => {
            let any = extension.as_any();
            if let Some(image) = any.downcast_ref::<MiraiImage>() {
                let code = CatCode::new("image").with("id", &image.id);
                if image.flash { code.with("flash", true) } else { code }
            } else if let Some(image) = any.downcast_ref::<MiraiSendOnlyImage>()
                && let Resource::Path(path) = &image.resource
            {
                CatCode::new("image").with("file", path.display())
            } else if let Some(audio) = any.downcast_ref::<MiraiAudio>() {
                CatCode::new("audio").with("id", audio.id())
            } else if let Some(nudge) = any.downcast_ref::<MiraiNudge>() {
                CatCode::new("nudge").with_opt("target", nudge.target)
            } else if let Some(share) = any.downcast_ref::<MiraiShare>() {
                CatCode::new("share")
                    .with("url", &share.url)
                    .with_opt("title", share.title.as_ref())
                    .with_opt("content", share.content.as_ref())
                    .with_opt("coverUrl", share.cover_url.as_ref())
            } else if let Some(music) = any.downcast_ref::<MiraiMusicShare>() {
                CatCode::new("music")
                    .with("kind", music.kind.name())
                    .with("title", &music.title)
                    .with("summary", &music.summary)
                    .with("jumpUrl", &music.jump_url)
                    .with("pictureUrl", &music.picture_url)
                    .with("musicUrl", &music.music_url)
                    .with("brief", &music.brief)
            } else if let Some(quote) = any.downcast_ref::<MiraiQuoteReply>() {
                CatCode::new("quote").with("id", source_id(&quote.source, quote.source.from_id))
            } else if let Some(native) = any.downcast_ref::<MiraiNativeMessage>() {
                encode_native(native.native()).unwrap_or_else(|| other(element))
            } else {
                other(element)
            }
        }
        Element::Image(Image::Resource(_)) => other(element),
    };
    code.to_string()
}

fn encode_native(native: &NativeMessage) -> Option<CatCode> {
    let code = match native {
        NativeMessage::Dice(value) => CatCode::new("dice").with("value", value),
        NativeMessage::Poke { name, poke_type, id } => CatCode::new("poke")
            .with("type", poke_type)
            .with("id", id)
            .with("name", name),
        NativeMessage::Rich { service_id, content } => CatCode::new("rich")
            .with("serviceId", service_id)
            .with("content", content),
        NativeMessage::LightApp(content) => CatCode::new("app").with("content", content),
        _ => return None,
    };
    Some(code)
}

fn other(element: &Element) -> CatCode {
    CatCode::new("other").with("code", element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{MessageSourceKind, NativeAudio, NativeImage, NativeMessageSource};
    use simbot_core::MessageSegment;

    #[test]
    fn test_escaping() {
        assert_eq!(encode_value("a,b[c]&\n"), "a&#44;b&#91;c&#93;&amp;&#13;");
        assert_eq!(decode_value("a&#44;b&#91;c&#93;&amp;&#13;"), "a,b[c]&\n");
        assert_eq!(encode_text("a,[b]&"), "a,&#91;b&#93;&amp;");
        assert_eq!(decode_value("&amp;#44;"), "&#44;");
    }

    #[test]
    fn test_parse_code() {
        let code = CatCode::parse("[CAT:share,url=https://a.b/?x&#44;y,title=T]").unwrap();
        assert_eq!(code.kind(), "share");
        assert_eq!(code.get("url"), Some("https://a.b/?x,y"));
        assert_eq!(code.get("title"), Some("T"));
        assert!(CatCode::parse("[CQ:at,qq=1]").is_err());
        assert!(CatCode::parse("[CAT:]").is_err());
    }

    #[test]
    fn test_decode_str_mixes_text_and_codes() {
        let codec = CatCodec::new();
        let messages = codec
            .decode_str("hi &#91;x&#93; [CAT:at,code=123][CAT:face,id=178]!", None)
            .unwrap();
        let elements = messages.as_slice();
        assert_eq!(elements.len(), 4);
        assert_eq!(elements[0].as_text(), Some("hi [x] "));
        assert!(matches!(&elements[1], Element::At { target, .. } if target.to_long() == Some(123)));
        assert!(matches!(&elements[2], Element::Face { id } if id.to_int() == Some(178)));
        assert_eq!(elements[3].as_text(), Some("!"));
    }

    #[test]
    fn test_decode_builtin_types() {
        let codec = CatCodec::new();
        assert!(matches!(codec.decode("[CAT:at,all=true]", None).unwrap(), Element::AtAll));
        assert!(matches!(codec.decode("[CAT:atAll]", None).unwrap(), Element::AtAll));

        let nudge = codec.decode("[CAT:nudge,target=5]", None).unwrap();
        assert_eq!(nudge.downcast_ref::<MiraiNudge>(), Some(&MiraiNudge::new(Some(5))));

        let dice = codec.decode("[CAT:dice,value=4]", None).unwrap();
        assert_eq!(
            dice.downcast_ref::<MiraiNativeMessage>().map(|n| n.native().clone()),
            Some(NativeMessage::Dice(4))
        );
        let random = codec.decode("[CAT:dice]", None).unwrap();
        assert!(matches!(
            random.downcast_ref::<MiraiNativeMessage>().map(|n| n.native()),
            Some(NativeMessage::Dice(1..=6))
        ));
        assert!(codec.decode("[CAT:dice,value=9]", None).is_err());

        let music = codec
            .decode("[CAT:music,kind=qqmusic,title=Song,jumpUrl=https://j]", None)
            .unwrap();
        let music = music.downcast_ref::<MiraiMusicShare>().unwrap();
        assert_eq!(music.kind, MusicKind::QQMusic);
        assert_eq!(music.brief, "[分享]Song");

        assert!(matches!(
            codec.decode("[CAT:at]", None),
            Err(BotError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unknown_type_is_text() {
        let codec = CatCodec::new();
        let element = codec.decode("[CAT:mystery,a=1]", None).unwrap();
        assert_eq!(element.as_text(), Some("[CAT:mystery,a=1]"));
    }

    #[test]
    fn test_custom_decoder_wins() {
        let codec = CatCodec::new();
        codec.register("face", |code: &CatCode, _: Option<&NativeMessageChain>| {
            Ok(Element::text(format!("face#{}", code.get("id").unwrap_or_default())))
        });
        assert_eq!(codec.decode("[CAT:face,id=1]", None).unwrap().as_text(), Some("face#1"));
        assert!(codec.unregister("face"));
        assert!(matches!(codec.decode("[CAT:face,id=1]", None).unwrap(), Element::Face { .. }));
    }

    #[test]
    fn test_base_chain_lookups() {
        let mut image = NativeImage::from_id("{I}.png");
        image.width = 640;
        let chain = NativeMessageChain::new(vec![
            NativeMessage::Image(image),
            NativeMessage::Audio(NativeAudio {
                filename: "v.amr".into(),
                file_md5: vec![0xab, 0xcd],
                file_size: 10,
                codec: "AMR".into(),
            }),
        ]);
        let codec = CatCodec::new();

        let found = codec.decode("[CAT:image,id={I}.png]", Some(&chain)).unwrap();
        assert_eq!(found.downcast_ref::<MiraiImage>().map(|i| i.width), Some(640));

        let missing = codec.decode("[CAT:img,id={J}.png,flash=true]", Some(&chain)).unwrap();
        let missing = missing.downcast_ref::<MiraiImage>().unwrap();
        assert!(missing.flash);
        assert_eq!(missing.width, 0);

        let audio = codec.decode("[CAT:voice,id=ABCD]", Some(&chain)).unwrap();
        assert_eq!(audio.downcast_ref::<MiraiAudio>().map(|a| a.file_size), Some(10));
        assert!(matches!(
            codec.decode("[CAT:audio,id=ffff]", Some(&chain)),
            Err(BotError::NoSuchElement(_))
        ));
    }

    #[test]
    fn test_encode() {
        let codec = CatCodec::new();
        let messages = Messages::from("a[b]")
            + Element::at(1)
            + Element::AtAll
            + Element::extension(MiraiShare::new("u").with_title("x,y"))
            + Element::extension(MiraiImage::from_id("{I}.png", true));
        assert_eq!(
            codec.encode_messages(&messages),
            "a&#91;b&#93;[CAT:at,code=1][CAT:at,all=true][CAT:share,url=u,title=x&#44;y][CAT:image,id={I}.png,flash=true]"
        );

        let unknown = Element::image_resource(Resource::bytes("p.png", vec![1u8]));
        assert_eq!(encode(&unknown), "[CAT:other,code=&#91;image:p.png&#93;]");
    }

    #[test]
    fn test_quote_reencodes() {
        let source = NativeMessageSource {
            ids: vec![1],
            internal_ids: vec![2],
            time: 3,
            from_id: 4,
            target_id: 0,
            kind: MessageSourceKind::Group,
            original_message: vec![],
        };
        let code = encode(&Element::extension(MiraiQuoteReply::of(source.clone())));
        assert_eq!(code, "[CAT:quote,id=1:2:3:4:0]");

        let decoded = CatCodec::new().decode(&code, None).unwrap();
        assert_eq!(
            decoded.downcast_ref::<MiraiQuoteReply>().map(|q| q.source.clone()),
            Some(source)
        );
    }
}
