//! Message model shared by all components.
//!
//! # Architecture
//!
//! The message system is built around two abstractions:
//! - [`MessageSegment`]: a single unit of content (text, image, etc.)
//! - [`Message`]: an ordered collection of segments
//!
//! [`Element`] is the framework's closed set of standard segments. Components
//! attach their own segments through [`Element::Extension`], which carries any
//! [`ElementExtension`] implementation and can be downcast back to the
//! concrete type.
//!
//! # Example
//!
//! ```rust,ignore
//! use simbot_core::{Element, Messages};
//!
//! let messages = Messages::from(Element::text("Hello, "))
//!     + Element::at(10001)
//!     + Element::face(178);
//!
//! assert_eq!(messages.extract_plain_text(), "Hello, ");
//! ```

use std::any::Any;
use std::fmt::{self, Debug};
use std::ops::Add;
use std::path::PathBuf;
use std::sync::Arc;

use crate::foundation::id::Id;

// ============================================================================
// Message Segment Trait
// ============================================================================

/// A trait representing a single segment of a message.
pub trait MessageSegment: Debug + Clone + Send + Sync + 'static {
    /// Returns the type identifier of this segment (e.g., "text", "image", "at").
    fn segment_type(&self) -> &str;

    /// Returns true if this is a plain text segment.
    fn is_text(&self) -> bool {
        self.segment_type() == "text"
    }

    /// Returns the text content if this is a text segment.
    fn as_text(&self) -> Option<&str>;

    /// Returns a string representation suitable for display.
    fn display(&self) -> String;
}

// ============================================================================
// Message Trait
// ============================================================================

/// A trait representing a complete message composed of segments.
pub trait Message: Debug + Clone + Send + Sync + 'static {
    /// The segment type used by this message.
    type Segment: MessageSegment;

    /// Returns an iterator over the message segments.
    fn iter(&self) -> impl Iterator<Item = &Self::Segment>;

    /// Returns the number of segments in the message.
    fn len(&self) -> usize;

    /// Returns true if the message has no segments.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Extracts all plain text content from the message.
    fn extract_plain_text(&self) -> String {
        self.iter()
            .filter_map(|seg| seg.as_text())
            .collect::<Vec<_>>()
            .join("")
    }

    /// Returns a display string representation of the entire message.
    fn display(&self) -> String {
        self.iter().map(MessageSegment::display).collect()
    }

    /// Returns the segments as a slice.
    fn as_slice(&self) -> &[Self::Segment];
}

// ============================================================================
// Component Extensions
// ============================================================================

/// A component-specific message element.
///
/// Implementors are carried inside [`Element::Extension`] and recovered with
/// [`Element::downcast_ref`].
pub trait ElementExtension: Any + Debug + Send + Sync {
    /// A stable type key, e.g. `"mirai.nudge"`.
    fn key(&self) -> &'static str;

    /// Display text used when rendering a message.
    fn display(&self) -> String {
        format!("[{}]", self.key())
    }

    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

// ============================================================================
// Standard Elements
// ============================================================================

/// What an [`Element::At`] points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AtKind {
    /// A user.
    #[default]
    User,
    /// A channel.
    Channel,
    /// A role.
    Role,
}

/// Binary content used to upload images and other media.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    /// In-memory content with a file name.
    Bytes {
        /// File name hint.
        name: String,
        /// The content.
        data: Arc<[u8]>,
    },
    /// A file on disk.
    Path(PathBuf),
}

impl Resource {
    /// Creates an in-memory resource.
    pub fn bytes(name: impl Into<String>, data: impl Into<Arc<[u8]>>) -> Self {
        Self::Bytes {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Returns the resource name.
    pub fn name(&self) -> String {
        match self {
            Self::Bytes { name, .. } => name.clone(),
            Self::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }

    /// Reads the full content.
    pub fn read_bytes(&self) -> std::io::Result<Vec<u8>> {
        match self {
            Self::Bytes { data, .. } => Ok(data.to_vec()),
            Self::Path(path) => std::fs::read(path),
        }
    }
}

/// An image element.
#[derive(Debug, Clone, PartialEq)]
pub enum Image {
    /// An image that must be uploaded before sending.
    Resource(Resource),
    /// An image already known to the platform by id.
    Id(Id),
}

/// A standard message element.
#[derive(Debug, Clone)]
pub enum Element {
    /// Plain text.
    Text {
        /// The text content.
        text: String,
    },
    /// Mention of a target.
    At {
        /// Mentioned target.
        target: Id,
        /// Kind of target.
        kind: AtKind,
        /// Original textual form, e.g. `@forte`.
        origin: String,
    },
    /// Mention of everyone.
    AtAll,
    /// Platform face.
    Face {
        /// Face id.
        id: Id,
    },
    /// Unicode-style emoji reference.
    Emoji {
        /// Emoji id.
        id: Id,
    },
    /// Image.
    Image(Image),
    /// Component-specific element.
    Extension(Arc<dyn ElementExtension>),
}

impl Element {
    /// Creates a text element.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Creates a user mention.
    pub fn at(target: impl Into<Id>) -> Self {
        let target = target.into();
        Self::At {
            origin: format!("@{target}"),
            target,
            kind: AtKind::User,
        }
    }

    /// Creates a face element.
    pub fn face(id: impl Into<Id>) -> Self {
        Self::Face { id: id.into() }
    }

    /// Creates an emoji element.
    pub fn emoji(id: impl Into<Id>) -> Self {
        Self::Emoji { id: id.into() }
    }

    /// Creates an image element referring to an existing image id.
    pub fn image_id(id: impl Into<Id>) -> Self {
        Self::Image(Image::Id(id.into()))
    }

    /// Creates an image element to be uploaded.
    pub fn image_resource(resource: Resource) -> Self {
        Self::Image(Image::Resource(resource))
    }

    /// Wraps a component-specific element.
    pub fn extension<E: ElementExtension>(element: E) -> Self {
        Self::Extension(Arc::new(element))
    }

    /// Downcasts an extension element to a concrete type.
    pub fn downcast_ref<E: ElementExtension>(&self) -> Option<&E> {
        match self {
            Self::Extension(ext) => ext.as_any().downcast_ref::<E>(),
            _ => None,
        }
    }
}

impl MessageSegment for Element {
    fn segment_type(&self) -> &str {
        match self {
            Self::Text { .. } => "text",
            Self::At { .. } => "at",
            Self::AtAll => "at_all",
            Self::Face { .. } => "face",
            Self::Emoji { .. } => "emoji",
            Self::Image(_) => "image",
            Self::Extension(ext) => ext.key(),
        }
    }

    fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }

    fn display(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::At { origin, .. } => origin.clone(),
            Self::AtAll => "@all".to_string(),
            Self::Face { id } => format!("[face:{id}]"),
            Self::Emoji { id } => format!(":{id}:"),
            Self::Image(Image::Id(id)) => format!("[image:{id}]"),
            Self::Image(Image::Resource(r)) => format!("[image:{}]", r.name()),
            Self::Extension(ext) => ext.display(),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&MessageSegment::display(self))
    }
}

// ============================================================================
// Messages
// ============================================================================

/// An ordered list of [`Element`]s.
#[derive(Debug, Clone, Default)]
pub struct Messages(Vec<Element>);

impl Messages {
    /// Creates an empty message list.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends an element.
    pub fn push(&mut self, element: Element) {
        self.0.push(element);
    }

    /// Consumes the list and returns the elements.
    pub fn into_vec(self) -> Vec<Element> {
        self.0
    }
}

impl Message for Messages {
    type Segment = Element;

    fn iter(&self) -> impl Iterator<Item = &Element> {
        self.0.iter()
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn as_slice(&self) -> &[Element] {
        &self.0
    }
}

impl From<Element> for Messages {
    fn from(element: Element) -> Self {
        Self(vec![element])
    }
}

impl From<Vec<Element>> for Messages {
    fn from(elements: Vec<Element>) -> Self {
        Self(elements)
    }
}

impl From<&str> for Messages {
    fn from(text: &str) -> Self {
        Self(vec![Element::text(text)])
    }
}

impl FromIterator<Element> for Messages {
    fn from_iter<T: IntoIterator<Item = Element>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Messages {
    type Item = Element;
    type IntoIter = std::vec::IntoIter<Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl Add<Element> for Messages {
    type Output = Messages;

    fn add(mut self, rhs: Element) -> Self::Output {
        self.0.push(rhs);
        self
    }
}

impl Add<Messages> for Messages {
    type Output = Messages;

    fn add(mut self, rhs: Messages) -> Self::Output {
        self.0.extend(rhs.0);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Marker(u8);

    impl ElementExtension for Marker {
        fn key(&self) -> &'static str {
            "test.marker"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_plain_text_skips_non_text() {
        let messages = Messages::from(Element::text("Hello, "))
            + Element::at(10001)
            + Element::text("world")
            + Element::face(178);

        assert_eq!(messages.len(), 4);
        assert_eq!(messages.extract_plain_text(), "Hello, world");
        assert_eq!(Message::display(&messages), "Hello, @10001world[face:178]");
    }

    #[test]
    fn test_extension_downcast() {
        let element = Element::extension(Marker(3));
        assert_eq!(element.segment_type(), "test.marker");
        assert_eq!(element.downcast_ref::<Marker>().map(|m| m.0), Some(3));
        assert!(Element::text("x").downcast_ref::<Marker>().is_none());
    }

    #[test]
    fn test_resource_name() {
        let bytes = Resource::bytes("a.png", vec![1u8, 2, 3]);
        assert_eq!(bytes.name(), "a.png");
        assert_eq!(bytes.read_bytes().unwrap(), vec![1, 2, 3]);
        assert_eq!(Resource::Path(PathBuf::from("/tmp/b.jpg")).name(), "b.jpg");
    }
}
