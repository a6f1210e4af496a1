//! Declarative component descriptions.
//!
//! An [`Element`] describes UI for one frame. It is rebuilt every pass and
//! resolved to a [`TextBuffer`] by a [`Scope`]. Identity across passes comes
//! from the element's position in the tree ([`ViewPath`]).

use std::fmt;

use crate::render::buffer::TextBuffer;

pub mod interaction;
pub mod layout;
pub mod modifiers;
pub mod resolve;
pub mod text;

pub use interaction::{FocusSection, Focusable, Keyed, OnAppear, OnDisappear, OnKey, StatusEntry, Task};
pub use layout::{
    distribute_spacers, resolve_extent, Axis, Dimension, Frame, FrameSpec, HStack, Stack, VStack,
    ZStack,
};
pub use modifiers::{Background, Dimmed, ElementExt, Environmental, Overlay, Padding, Styled};
pub use resolve::{RenderContext, Scope};
pub use text::{Text, TextOverflow};

/// Produces output directly.
pub trait Primitive {
    fn render(&self, scope: &mut Scope<'_>) -> TextBuffer;
}

/// Declares further content instead of rendering.
pub trait Composite {
    fn body(&self, scope: &mut Scope<'_>) -> Element;
}

/// Flexible space inside a stack. Outside a stack it renders nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Spacer {
    pub min: usize,
}

impl Spacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn min(min: usize) -> Self {
        Self { min }
    }
}

pub enum Element {
    Primitive(Box<dyn Primitive>),
    Composite(Box<dyn Composite>),
    Spacer(Spacer),
    Empty,
}

impl Element {
    pub fn primitive(primitive: impl Primitive + 'static) -> Self {
        Element::Primitive(Box::new(primitive))
    }

    pub fn composite(composite: impl Composite + 'static) -> Self {
        Element::Composite(Box::new(composite))
    }

    pub fn spacer() -> Self {
        Element::Spacer(Spacer::new())
    }

    pub fn empty() -> Self {
        Element::Empty
    }

    pub fn as_spacer(&self) -> Option<Spacer> {
        match self {
            Element::Spacer(spacer) => Some(*spacer),
            _ => None,
        }
    }
}

impl Default for Element {
    fn default() -> Self {
        Element::Empty
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Primitive(_) => f.write_str("Element::Primitive"),
            Element::Composite(_) => f.write_str("Element::Composite"),
            Element::Spacer(spacer) => write!(f, "Element::Spacer(min={})", spacer.min),
            Element::Empty => f.write_str("Element::Empty"),
        }
    }
}

impl From<Spacer> for Element {
    fn from(spacer: Spacer) -> Self {
        Element::Spacer(spacer)
    }
}

impl From<&str> for Element {
    fn from(text: &str) -> Self {
        Text::new(text).into()
    }
}

impl From<String> for Element {
    fn from(text: String) -> Self {
        Text::new(text).into()
    }
}

impl<T: Into<Element>> From<Option<T>> for Element {
    fn from(value: Option<T>) -> Self {
        value.map_or(Element::Empty, Into::into)
    }
}

/// Structural position: child indices from the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewPath(Vec<u32>);

impl ViewPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn from_indices(indices: &[u32]) -> Self {
        Self(indices.to_vec())
    }

    pub fn child(&self, index: u32) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        Self(indices)
    }

    pub fn indices(&self) -> &[u32] {
        &self.0
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for ViewPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("root");
        }
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Element, Spacer, ViewPath};

    #[test]
    fn view_path_display_and_child() {
        let root = ViewPath::root();
        assert_eq!(root.to_string(), "root");
        let nested = root.child(0).child(3);
        assert_eq!(nested.to_string(), "0.3");
        assert_eq!(nested.depth(), 2);
        assert_eq!(nested, ViewPath::from_indices(&[0, 3]));
    }

    #[test]
    fn conversions_build_expected_kinds() {
        assert!(matches!(Element::from("hi"), Element::Primitive(_)));
        assert_eq!(Element::from(Spacer::min(2)).as_spacer(), Some(Spacer { min: 2 }));
        assert!(matches!(Element::from(None::<&str>), Element::Empty));
    }
}
