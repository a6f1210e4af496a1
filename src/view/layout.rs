//! Layout containers: stacks with flexible spacers, frames and z-stacks.

use std::iter;

use crate::render::buffer::{Alignment, TextBuffer};
use crate::view::resolve::Scope;
use crate::view::{Element, Primitive};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Vertical,
    Horizontal,
}

/// Sizes for each spacer along an axis.
///
/// Remaining space is split evenly (integer division, excess unused); a
/// spacer whose minimum exceeds its share gets the minimum.
pub fn distribute_spacers(
    available: usize,
    fixed: usize,
    spacing: usize,
    minimums: &[usize],
) -> Vec<usize> {
    if minimums.is_empty() {
        return Vec::new();
    }
    let remaining = available.saturating_sub(fixed + spacing);
    let share = remaining / minimums.len();
    minimums.iter().map(|min| share.max(*min)).collect()
}

enum Item {
    Fixed(TextBuffer),
    Spacer(usize),
}

/// Children laid out along one axis. Built through [`VStack::new`] or [`HStack::new`].
pub struct Stack {
    axis: Axis,
    spacing: usize,
    alignment: Alignment,
    children: Vec<Element>,
}

impl Stack {
    pub fn new(axis: Axis) -> Self {
        Self {
            axis,
            spacing: 0,
            alignment: Alignment::Leading,
            children: Vec::new(),
        }
    }

    pub fn spacing(mut self, spacing: usize) -> Self {
        self.spacing = spacing;
        self
    }

    /// Cross-axis alignment of children narrower (or shorter) than the widest.
    pub fn alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    pub fn child(mut self, child: impl Into<Element>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Add the child built by `build` only when `condition` holds.
    pub fn child_if<E, F>(self, condition: bool, build: F) -> Self
    where
        E: Into<Element>,
        F: FnOnce() -> E,
    {
        if condition {
            self.child(build())
        } else {
            self
        }
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Element>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    fn main_extent(&self, buffer: &TextBuffer) -> usize {
        match self.axis {
            Axis::Vertical => buffer.height(),
            Axis::Horizontal => buffer.width(),
        }
    }

    fn cross_extent(&self, buffer: &TextBuffer) -> usize {
        match self.axis {
            Axis::Vertical => buffer.width(),
            Axis::Horizontal => buffer.height(),
        }
    }
}

impl Primitive for Stack {
    fn render(&self, scope: &mut Scope<'_>) -> TextBuffer {
        let available = match self.axis {
            Axis::Vertical => scope.height(),
            Axis::Horizontal => scope.width(),
        };
        let items: Vec<Item> = self
            .children
            .iter()
            .enumerate()
            .map(|(index, child)| match child.as_spacer() {
                Some(spacer) => Item::Spacer(spacer.min),
                None => Item::Fixed(scope.resolve_child(index, child)),
            })
            .collect();

        let mut fixed = 0;
        let mut cross = 0;
        let mut minimums = Vec::new();
        for item in &items {
            match item {
                Item::Fixed(buffer) => {
                    fixed += self.main_extent(buffer);
                    cross = cross.max(self.cross_extent(buffer));
                }
                Item::Spacer(min) => minimums.push(*min),
            }
        }
        let spacing_total = self.spacing * items.len().saturating_sub(1);
        let mut spacer_sizes = distribute_spacers(available, fixed, spacing_total, &minimums).into_iter();

        match self.axis {
            Axis::Vertical => {
                let mut lines = Vec::new();
                for (index, item) in items.into_iter().enumerate() {
                    if index > 0 {
                        lines.extend(iter::repeat(String::new()).take(self.spacing));
                    }
                    match item {
                        Item::Fixed(buffer) => lines.extend(
                            buffer.align_to_width(cross, self.alignment).into_lines(),
                        ),
                        Item::Spacer(_) => {
                            let size = spacer_sizes.next().unwrap_or(0);
                            lines.extend(iter::repeat(String::new()).take(size));
                        }
                    }
                }
                TextBuffer::from(lines)
            }
            Axis::Horizontal => {
                let columns: Vec<TextBuffer> = items
                    .into_iter()
                    .map(|item| match item {
                        Item::Fixed(buffer) => {
                            let width = buffer.width();
                            buffer
                                .pad_to_height(cross, self.alignment)
                                .pad_to_width(width, Alignment::Leading)
                        }
                        Item::Spacer(_) => TextBuffer::blank(spacer_sizes.next().unwrap_or(0), cross),
                    })
                    .collect();
                let gap = " ".repeat(self.spacing);
                let lines = (0..cross)
                    .map(|row| {
                        columns
                            .iter()
                            .map(|column| column.lines().get(row).map(String::as_str).unwrap_or(""))
                            .collect::<Vec<_>>()
                            .join(&gap)
                    })
                    .collect::<Vec<_>>();
                TextBuffer::from(lines)
            }
        }
    }
}

impl From<Stack> for Element {
    fn from(stack: Stack) -> Self {
        Element::primitive(stack)
    }
}

/// Vertical stack builder: `VStack::new().spacing(1).child(a).child(b)`.
pub struct VStack;

impl VStack {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> Stack {
        Stack::new(Axis::Vertical)
    }
}

/// Horizontal stack builder.
pub struct HStack;

impl HStack {
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> Stack {
        Stack::new(Axis::Horizontal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Cells(usize),
    /// All available space.
    Fill,
}

/// Extent on one axis: explicit maximum, else ideal clamped to available,
/// else the natural size; the minimum then expands the result.
pub fn resolve_extent(
    available: usize,
    natural: usize,
    min: Option<usize>,
    ideal: Option<usize>,
    max: Option<Dimension>,
) -> usize {
    let target = match (max, ideal) {
        (Some(Dimension::Fill), _) => available,
        (Some(Dimension::Cells(cells)), _) => cells,
        (None, Some(ideal)) => ideal.min(available),
        (None, None) => natural,
    };
    target.max(min.unwrap_or(0))
}

fn offered_extent(available: usize, ideal: Option<usize>, max: Option<Dimension>) -> usize {
    match (max, ideal) {
        (Some(Dimension::Fill), _) => available,
        (Some(Dimension::Cells(cells)), _) => cells,
        (None, Some(ideal)) => ideal.min(available),
        (None, None) => available,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSpec {
    pub min_width: Option<usize>,
    pub ideal_width: Option<usize>,
    pub max_width: Option<Dimension>,
    pub min_height: Option<usize>,
    pub ideal_height: Option<usize>,
    pub max_height: Option<Dimension>,
    pub horizontal: Alignment,
    pub vertical: Alignment,
}

impl FrameSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fixed size on both axes.
    pub fn size(width: usize, height: usize) -> Self {
        Self::new()
            .max_width(Dimension::Cells(width))
            .max_height(Dimension::Cells(height))
    }

    pub fn min_width(mut self, width: usize) -> Self {
        self.min_width = Some(width);
        self
    }

    pub fn ideal_width(mut self, width: usize) -> Self {
        self.ideal_width = Some(width);
        self
    }

    pub fn max_width(mut self, width: Dimension) -> Self {
        self.max_width = Some(width);
        self
    }

    pub fn min_height(mut self, height: usize) -> Self {
        self.min_height = Some(height);
        self
    }

    pub fn ideal_height(mut self, height: usize) -> Self {
        self.ideal_height = Some(height);
        self
    }

    pub fn max_height(mut self, height: Dimension) -> Self {
        self.max_height = Some(height);
        self
    }

    pub fn fill(self) -> Self {
        self.max_width(Dimension::Fill).max_height(Dimension::Fill)
    }

    pub fn align(mut self, horizontal: Alignment, vertical: Alignment) -> Self {
        self.horizontal = horizontal;
        self.vertical = vertical;
        self
    }
}

/// Sizes its child per a [`FrameSpec`], aligning and clipping the content.
pub struct Frame {
    child: Element,
    spec: FrameSpec,
}

impl Frame {
    pub fn new(child: impl Into<Element>, spec: FrameSpec) -> Self {
        Self {
            child: child.into(),
            spec,
        }
    }
}

impl Primitive for Frame {
    fn render(&self, scope: &mut Scope<'_>) -> TextBuffer {
        let spec = &self.spec;
        let (available_w, available_h) = (scope.width(), scope.height());
        let offer = scope.context().with_size(
            offered_extent(available_w, spec.ideal_width, spec.max_width),
            offered_extent(available_h, spec.ideal_height, spec.max_height),
        );
        let content = scope.resolve_child_in(0, &self.child, offer);

        let width = resolve_extent(
            available_w,
            content.width(),
            spec.min_width,
            spec.ideal_width,
            spec.max_width,
        );
        let height = resolve_extent(
            available_h,
            content.height(),
            spec.min_height,
            spec.ideal_height,
            spec.max_height,
        );
        content
            .clip(width, height)
            .pad_to_height(height, spec.vertical)
            .align_to_width(width, spec.horizontal)
    }
}

impl From<Frame> for Element {
    fn from(frame: Frame) -> Self {
        Element::primitive(frame)
    }
}

/// Layers drawn back to front, each placed by the stack's alignment.
pub struct ZStack {
    horizontal: Alignment,
    vertical: Alignment,
    layers: Vec<Element>,
}

impl ZStack {
    pub fn new() -> Self {
        Self {
            horizontal: Alignment::Center,
            vertical: Alignment::Center,
            layers: Vec::new(),
        }
    }

    pub fn align(mut self, horizontal: Alignment, vertical: Alignment) -> Self {
        self.horizontal = horizontal;
        self.vertical = vertical;
        self
    }

    pub fn layer(mut self, layer: impl Into<Element>) -> Self {
        self.layers.push(layer.into());
        self
    }
}

impl Default for ZStack {
    fn default() -> Self {
        Self::new()
    }
}

impl Primitive for ZStack {
    fn render(&self, scope: &mut Scope<'_>) -> TextBuffer {
        let layers: Vec<TextBuffer> = self
            .layers
            .iter()
            .enumerate()
            .map(|(index, layer)| scope.resolve_child(index, layer))
            .collect();
        let width = layers.iter().map(TextBuffer::width).max().unwrap_or(0);
        let height = layers.iter().map(TextBuffer::height).max().unwrap_or(0);

        layers
            .iter()
            .fold(TextBuffer::blank(width, height), |base, layer| {
                let (x, _) = self.horizontal.split(width - layer.width());
                let (y, _) = self.vertical.split(height - layer.height());
                base.composite_at(layer, x, y)
            })
    }
}

impl From<ZStack> for Element {
    fn from(stack: ZStack) -> Self {
        Element::primitive(stack)
    }
}
