use serde::{Deserialize, Serialize};

use crate::coord::{self, Coord};
use crate::visual::TextAlign;

/// What a configured cell collects (or shows) when the block is filled in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputType {
    #[serde(rename = "staticText")]
    StaticText,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "checkbox")]
    Checkbox,
    #[serde(rename = "select")]
    Select,
    #[serde(rename = "number")]
    Number,
    #[serde(rename = "calculated")]
    Calculated,
}

impl InputType {
    /// Whether the piece's user carries a value for this cell.
    pub fn takes_input(self) -> bool {
        !matches!(self, InputType::StaticText | InputType::Calculated)
    }
}

/// Preview style attached directly to a cell (older documents).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<TextAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

/// One position of a block template.
///
/// `merged_with` points at the base cell of the merge group this cell belongs
/// to. A base never carries a pointer itself; it is recognised by being the
/// target of at least one other cell's pointer.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    #[serde(default)]
    pub active: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub input_type: Option<InputType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropdown_options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decimal_digits: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "coord::lenient_key"
    )]
    pub merged_with: Option<Coord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<CellStyle>,
}

/// A partial edit of a cell's content. `None` fields are left untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellUpdate {
    pub active: Option<bool>,
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub dropdown_options: Option<Vec<String>>,
    pub decimal_digits: Option<u32>,
    pub expression: Option<String>,
    pub style: Option<CellStyle>,
}

impl Cell {
    /// An inactive, unconfigured cell as found in a freshly created block.
    pub fn blank() -> Self {
        Cell {
            label: Some(String::new()),
            ..Cell::default()
        }
    }

    pub fn is_configured(&self) -> bool {
        self.input_type.is_some()
    }

    pub fn apply(&mut self, update: CellUpdate) {
        let CellUpdate {
            active,
            label,
            placeholder,
            dropdown_options,
            decimal_digits,
            expression,
            style,
        } = update;
        if let Some(active) = active {
            self.active = active;
        }
        if label.is_some() {
            self.label = label;
        }
        if placeholder.is_some() {
            self.placeholder = placeholder;
        }
        if dropdown_options.is_some() {
            self.dropdown_options = dropdown_options;
        }
        if decimal_digits.is_some() {
            self.decimal_digits = decimal_digits;
        }
        if expression.is_some() {
            self.expression = expression;
        }
        if style.is_some() {
            self.style = style;
        }
    }

    /// Assign (or with `None`, clear) the input type.
    ///
    /// Assigning activates the cell and resets every type-specific field to
    /// the empty value of the new type. Clearing wipes those fields but keeps
    /// the cell's activation.
    pub fn set_input_type(&mut self, input_type: Option<InputType>) {
        self.label = Some(String::new());
        self.expression = None;
        match input_type {
            None => {
                self.input_type = None;
                self.placeholder = None;
                self.dropdown_options = None;
                self.decimal_digits = None;
            }
            Some(kind) => {
                self.input_type = Some(kind);
                self.active = true;
                self.placeholder = matches!(kind, InputType::Text | InputType::Number)
                    .then(String::new);
                self.dropdown_options = (kind == InputType::Select).then(Vec::new);
                self.decimal_digits = (kind == InputType::Number).then_some(0);
            }
        }
    }

    /// Display text for a static-text cell, trimmed; empty for anything else.
    pub fn static_text(&self) -> &str {
        match (self.input_type, self.label.as_deref()) {
            (Some(InputType::StaticText), Some(label)) => label.trim(),
            _ => "",
        }
    }
}
