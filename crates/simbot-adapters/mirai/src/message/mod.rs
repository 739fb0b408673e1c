//! Messages: mirai elements, translation and the cat-code codec.

pub mod catcode;
pub mod element;
pub mod parser;

pub use catcode::{CatCode, CatCodeDecoder, CatCodec};
pub use element::{
    MiraiAudio, MiraiElement, MiraiForwardMessage, MiraiForwardNode, MiraiImage, MiraiMusicShare,
    MiraiNativeElement, MiraiNativeMessage, MiraiNudge, MiraiQuoteReply, MiraiSendOnlyComputable,
    MiraiSendOnlyImage, MiraiShare, mirai_element,
};
pub use parser::{element_to_simbot, to_native, to_simbot};
