use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::coord::Coord;
use crate::palette::generate_palette;

/// Gap between grid cells, in pixels.
pub const GRID_GAP: u32 = 2;
/// Padding around a rendered grid, in pixels.
pub const GRID_PAD: u32 = 4;

pub const DEFAULT_FONT_SIZE_PX: f64 = 14.0;
pub const DEFAULT_PADDING_X: f64 = 8.0;
pub const DEFAULT_PADDING_Y: f64 = 6.0;
pub const MAX_PADDING: f64 = 64.0;
pub const DEFAULT_BACKGROUND: &str = "#ffffff";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Named font sizes kept for older documents; `fontSizePx` wins when present.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    Normal,
    Large,
}

impl FontSize {
    pub fn px(self) -> f64 {
        match self {
            FontSize::Small => 12.0,
            FontSize::Normal => 14.0,
            FontSize::Large => 20.0,
        }
    }
}

/// Aspect ratio of a whole block; drives the pixel size of one cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockAspect {
    #[default]
    #[serde(rename = "1/1")]
    Square,
    #[serde(rename = "2/1")]
    Wide,
    #[serde(rename = "1/2")]
    Tall,
}

impl BlockAspect {
    /// `(width, height)` of one cell in pixels.
    pub fn cell_size(self) -> (u32, u32) {
        match self {
            BlockAspect::Square => (50, 50),
            BlockAspect::Wide => (50, 25),
            BlockAspect::Tall => (25, 50),
        }
    }
}

/// Outer pixel size of a `rows × cols` grid: cells, gaps and padding.
pub fn block_outer_size(rows: usize, cols: usize, aspect: BlockAspect) -> (u32, u32) {
    let (cell_w, cell_h) = aspect.cell_size();
    let content = |n: usize, cell: u32| {
        let n = n as u32;
        n * cell + n.saturating_sub(1) * GRID_GAP
    };
    (
        content(cols, cell_w) + GRID_PAD * 2,
        content(rows, cell_h) + GRID_PAD * 2,
    )
}

/// Background chosen from the selected option of a dropdown cell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectSource {
    pub coord: Coord,
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionalBg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select_source: Option<SelectSource>,
    /// Background of a checkbox cell while it is checked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_color: Option<String>,
}

impl ConditionalBg {
    /// A dropdown-driven rule giving each option its own palette colour.
    pub fn for_options(source: Coord, options: &[String]) -> Self {
        let colors = options
            .iter()
            .cloned()
            .zip(generate_palette(options.len()))
            .collect();
        ConditionalBg {
            select_source: Some(SelectSource {
                coord: source,
                colors,
            }),
            checked_color: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_align: Option<TextAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<FontSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size_px: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding_x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding_y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional_bg: Option<ConditionalBg>,
}

/// Concrete presentation values of one cell in view mode.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedStyle {
    pub background: String,
    pub text_align: Option<TextAlign>,
    pub border: bool,
    pub font_size_px: f64,
    pub padding_x: f64,
    pub padding_y: f64,
}

impl ResolvedStyle {
    /// Resolve `style` (absent means defaults).
    ///
    /// `checked` is the cell's own checkbox state; `selected` looks up the
    /// current value of a dropdown cell for `selectSource` rules.
    pub fn resolve<'a>(
        style: Option<&VisualStyle>,
        checked: bool,
        selected: impl Fn(Coord) -> Option<&'a str>,
    ) -> Self {
        let default = VisualStyle::default();
        let style = style.unwrap_or(&default);
        let conditional = style.conditional_bg.as_ref();

        let checked_bg = conditional
            .filter(|_| checked)
            .and_then(|rule| rule.checked_color.clone());
        let select_bg = || {
            let source = conditional?.select_source.as_ref()?;
            let option = selected(source.coord)?;
            source.colors.get(option).cloned()
        };
        let background = checked_bg
            .or_else(select_bg)
            .or_else(|| style.background_color.clone())
            .unwrap_or_else(|| DEFAULT_BACKGROUND.to_string());

        ResolvedStyle {
            background,
            text_align: style.text_align,
            border: style.border.unwrap_or(false),
            font_size_px: style
                .font_size_px
                .or_else(|| style.font_size.map(FontSize::px))
                .unwrap_or(DEFAULT_FONT_SIZE_PX),
            padding_x: style
                .padding_x
                .unwrap_or(DEFAULT_PADDING_X)
                .clamp(0.0, MAX_PADDING),
            padding_y: style
                .padding_y
                .unwrap_or(DEFAULT_PADDING_Y)
                .clamp(0.0, MAX_PADDING),
        }
    }
}

/// Style records keyed by the coordinate of a cell's base.
///
/// Persisted as an object keyed by `"row-col"`; unparseable keys and `null`
/// entries are dropped on load since no cell could ever look them up.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Option<VisualStyle>>",
    into = "BTreeMap<String, VisualStyle>"
)]
pub struct VisualTemplate {
    styles: BTreeMap<Coord, VisualStyle>,
}

impl From<BTreeMap<String, Option<VisualStyle>>> for VisualTemplate {
    fn from(raw: BTreeMap<String, Option<VisualStyle>>) -> Self {
        let styles = raw
            .into_iter()
            .filter_map(|(key, style)| Some((Coord::parse_key(&key)?, style?)))
            .collect();
        VisualTemplate { styles }
    }
}

impl From<VisualTemplate> for BTreeMap<String, VisualStyle> {
    fn from(visual: VisualTemplate) -> Self {
        visual
            .styles
            .into_iter()
            .map(|(at, style)| (at.key(), style))
            .collect()
    }
}

impl FromIterator<(Coord, VisualStyle)> for VisualTemplate {
    fn from_iter<I: IntoIterator<Item = (Coord, VisualStyle)>>(iter: I) -> Self {
        VisualTemplate {
            styles: iter.into_iter().collect(),
        }
    }
}

impl VisualTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, at: Coord) -> Option<&VisualStyle> {
        self.styles.get(&at)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Coord, &VisualStyle)> + '_ {
        self.styles.iter().map(|(at, style)| (*at, style))
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }

    /// Copy-on-write: set or (with `None`) drop the style at `at`.
    pub fn set_style(&self, at: Coord, style: Option<VisualStyle>) -> Self {
        let mut next = self.clone();
        match style {
            Some(style) => {
                next.styles.insert(at, style);
            }
            None => {
                next.styles.remove(&at);
            }
        }
        next
    }
}
