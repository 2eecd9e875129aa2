//! Row packing: flat field/separator sequences are bucketed into rows of a
//! fixed 12-unit capacity, padded to full width, and expressed in the
//! fractional units the consuming layout engine understands.

use serde::{Deserialize, Serialize};

use crate::error::FormError;

/// Fixed capacity of one layout row.
pub const ROW_UNITS: u8 = 12;

/// Width in fractional layout units, `"{n}fr"` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FrUnits(pub u8);

impl From<FrUnits> for String {
    fn from(fr: FrUnits) -> Self {
        format!("{}fr", fr.0)
    }
}

impl TryFrom<String> for FrUnits {
    type Error = FormError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        let digits = s
            .strip_suffix("fr")
            .ok_or_else(|| FormError::layout(format!("width '{s}' is missing the 'fr' suffix")))?;
        let units = digits
            .parse::<u8>()
            .map_err(|e| FormError::layout(format!("width '{s}': {e}")))?;
        Ok(Self(units))
    }
}

/// An item before packing, still carrying its integer width.
#[derive(Debug, Clone, PartialEq)]
pub enum FlatItem {
    Field { field: String, width: u8 },
    Separator { label: String },
}

impl FlatItem {
    fn width_units(&self) -> u8 {
        match self {
            Self::Field { width, .. } => *width,
            Self::Separator { .. } => ROW_UNITS,
        }
    }
}

/// One cell of a packed row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RowItem {
    Field { field: String, width: FrUnits },
    Separator { label: String, width: FrUnits },
    Empty { width: FrUnits },
}

impl RowItem {
    pub fn width(&self) -> FrUnits {
        match self {
            Self::Field { width, .. } | Self::Separator { width, .. } | Self::Empty { width } => {
                *width
            }
        }
    }
}

impl From<FlatItem> for RowItem {
    fn from(item: FlatItem) -> Self {
        match item {
            // Separators always occupy the full row.
            FlatItem::Separator { label } => Self::Separator {
                label,
                width: FrUnits(ROW_UNITS),
            },
            FlatItem::Field { field, width } => Self::Field {
                field,
                width: FrUnits(width),
            },
        }
    }
}

pub type Row = Vec<RowItem>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tab {
    pub label: String,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub tabs: Vec<Tab>,
}

/// Greedy left-to-right packing. A row is closed as soon as the next item
/// would push it past [`ROW_UNITS`]; the deficit is padded with an empty
/// cell. An item wider than the capacity becomes its own overflowing row,
/// never truncated.
pub fn pack_rows(items: Vec<FlatItem>) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut current: Vec<FlatItem> = Vec::new();
    let mut used: u16 = 0;

    for item in items {
        if used + u16::from(item.width_units()) > u16::from(ROW_UNITS) && !current.is_empty() {
            rows.push(close_row(std::mem::take(&mut current), used));
            used = 0;
        }
        used += u16::from(item.width_units());
        current.push(item);
    }

    if !current.is_empty() {
        rows.push(close_row(current, used));
    }

    rows
}

fn close_row(items: Vec<FlatItem>, used: u16) -> Row {
    let mut row: Row = items.into_iter().map(RowItem::from).collect();
    if used < u16::from(ROW_UNITS) {
        row.push(RowItem::Empty {
            width: FrUnits(ROW_UNITS - used as u8),
        });
    }
    row
}
