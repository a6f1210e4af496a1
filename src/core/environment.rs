//! Per-frame environment: appearance, palette and typed service values.
//!
//! An [`Environment`] is immutable; nested scopes derive modified copies with
//! the `with_*` methods. Cloning is cheap (shared maps behind `Arc`).

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::core::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Appearance {
    Light,
    #[default]
    Dark,
}

impl Appearance {
    pub fn toggled(self) -> Self {
        match self {
            Appearance::Light => Appearance::Dark,
            Appearance::Dark => Appearance::Light,
        }
    }
}

/// Semantic colour slots a palette fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorRole {
    Foreground,
    Background,
    Accent,
    Muted,
    Border,
    Selection,
    Error,
}

/// Named colours per appearance. Concrete theme tables live outside the engine.
pub trait Palette: Send + Sync {
    fn name(&self) -> &str;
    fn color(&self, role: ColorRole, appearance: Appearance) -> Color;
}

/// Minimal built-in palette: terminal defaults plus a single accent colour.
#[derive(Debug, Clone)]
pub struct DefaultPalette {
    name: String,
    accent: Color,
}

impl DefaultPalette {
    pub fn new(name: impl Into<String>, accent: Color) -> Self {
        Self {
            name: name.into(),
            accent,
        }
    }
}

impl Default for DefaultPalette {
    fn default() -> Self {
        Self::new("default", Color::CYAN)
    }
}

impl Palette for DefaultPalette {
    fn name(&self) -> &str {
        &self.name
    }

    fn color(&self, role: ColorRole, appearance: Appearance) -> Color {
        match (role, appearance) {
            (ColorRole::Foreground | ColorRole::Background, _) => Color::Default,
            (ColorRole::Accent, _) => self.accent,
            (ColorRole::Muted, Appearance::Dark) => Color::BRIGHT_BLACK,
            (ColorRole::Muted, Appearance::Light) => Color::Indexed(244),
            (ColorRole::Border, Appearance::Dark) => Color::Indexed(240),
            (ColorRole::Border, Appearance::Light) => Color::Indexed(250),
            (ColorRole::Selection, Appearance::Dark) => Color::Indexed(237),
            (ColorRole::Selection, Appearance::Light) => Color::Indexed(254),
            (ColorRole::Error, _) => Color::RED,
        }
    }
}

/// Ordered palettes the theme shortcut cycles through. Never empty.
#[derive(Clone)]
pub struct ThemeSet {
    palettes: Vec<Arc<dyn Palette>>,
}

impl ThemeSet {
    pub fn new(first: Arc<dyn Palette>) -> Self {
        Self {
            palettes: vec![first],
        }
    }

    pub fn with(mut self, palette: Arc<dyn Palette>) -> Self {
        self.palettes.push(palette);
        self
    }

    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }

    /// Palette at `index`, wrapping around.
    pub fn get(&self, index: usize) -> &Arc<dyn Palette> {
        &self.palettes[index % self.palettes.len()]
    }
}

impl Default for ThemeSet {
    fn default() -> Self {
        Self::new(Arc::new(DefaultPalette::default()))
            .with(Arc::new(DefaultPalette::new("amber", Color::YELLOW)))
    }
}

impl fmt::Debug for ThemeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.palettes.iter().map(|palette| palette.name().to_string()))
            .finish()
    }
}

type ValueMap = HashMap<TypeId, Arc<dyn Any + Send + Sync>>;

#[derive(Clone, Default)]
pub struct Environment {
    appearance: Appearance,
    theme_index: usize,
    themes: Arc<ThemeSet>,
    values: Arc<ValueMap>,
}

impl Environment {
    pub fn new(themes: ThemeSet) -> Self {
        Self {
            themes: Arc::new(themes),
            ..Self::default()
        }
    }

    pub fn appearance(&self) -> Appearance {
        self.appearance
    }

    pub fn theme_index(&self) -> usize {
        self.theme_index
    }

    pub fn themes(&self) -> &ThemeSet {
        &self.themes
    }

    pub fn palette(&self) -> &dyn Palette {
        self.themes.get(self.theme_index).as_ref()
    }

    /// Resolve a colour role against the active palette and appearance.
    pub fn color(&self, role: ColorRole) -> Color {
        self.palette().color(role, self.appearance)
    }

    pub fn with_appearance(&self, appearance: Appearance) -> Self {
        Self {
            appearance,
            ..self.clone()
        }
    }

    pub fn with_theme_index(&self, theme_index: usize) -> Self {
        Self {
            theme_index: theme_index % self.themes.len().max(1),
            ..self.clone()
        }
    }

    /// Derive an environment carrying `value`, replacing any previous `T`.
    pub fn with_value<T: Any + Send + Sync>(&self, value: T) -> Self {
        let mut values = (*self.values).clone();
        values.insert(TypeId::of::<T>(), Arc::new(value));
        Self {
            values: Arc::new(values),
            ..self.clone()
        }
    }

    pub fn value<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.values
            .get(&TypeId::of::<T>())
            .and_then(|value| value.downcast_ref::<T>())
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("appearance", &self.appearance)
            .field("theme", &self.palette().name())
            .field("values", &self.values.len())
            .finish()
    }
}
