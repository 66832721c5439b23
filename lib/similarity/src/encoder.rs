//! Record encoders
//!
//! An [`Encoder`] turns a row or a query into a fixed-length feature vector.
//! The cosine ranker only ever talks to this trait, so any pre-fitted
//! transformer can sit behind it.
//!
//! [`OneHotEncoder`] is the encoder shipped with matrec. It is fitted on a
//! reference catalog:
//! 1. Columns whose every value is numeric become one min-max scaled feature
//! 2. Any other column becomes a one-hot block over the labels seen
//! 3. Material type is optionally appended as a one-hot block
//!
//! Values outside the fitted vocabulary are rejected instead of guessed.

use matrec_core::{Attribute, AttributeValue, Attributes, CatalogItem, Error, Query, Result, Vector};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::ops::Range;

/// The fields an encoder may look at
#[derive(Debug, Clone, Copy)]
pub struct EncodeRecord<'a> {
    pub material_type: Option<&'a str>,
    pub attributes: &'a Attributes,
}

impl<'a> From<&'a CatalogItem> for EncodeRecord<'a> {
    fn from(item: &'a CatalogItem) -> Self {
        Self {
            material_type: item.material_type.as_deref(),
            attributes: &item.attributes,
        }
    }
}

impl<'a> From<&'a Query> for EncodeRecord<'a> {
    fn from(query: &'a Query) -> Self {
        Self {
            material_type: query.material_type.as_deref(),
            attributes: &query.attributes,
        }
    }
}

/// A named slice of the feature vector, used to explain scores
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSpan {
    pub name: String,
    pub range: Range<usize>,
}

/// A pre-fitted record-to-vector transformer
pub trait Encoder: Send + Sync {
    /// Length of every vector this encoder produces
    fn dim(&self) -> usize;

    /// Encode a record, or fail with [`Error::Encoding`] if it does not fit
    /// the encoder's schema
    fn encode(&self, record: &EncodeRecord<'_>) -> Result<Vector>;

    /// Which parts of the vector belong to which input field.
    /// Encoders that cannot tell return nothing.
    fn feature_spans(&self) -> Vec<FeatureSpan> {
        Vec::new()
    }
}

/// Options for [`OneHotEncoder::fit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitOptions {
    /// Append a one-hot block for the material type
    pub include_material_type: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            include_material_type: true,
        }
    }
}

/// Input field an encoded column reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Column {
    MaterialType,
    Attribute(Attribute),
}

impl Column {
    pub fn key(self) -> &'static str {
        match self {
            Column::MaterialType => "material_type",
            Column::Attribute(a) => a.key(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnKind {
    Categorical { categories: Vec<String> },
    Numeric { min: f32, max: f32 },
}

impl ColumnKind {
    fn width(&self) -> usize {
        match self {
            ColumnKind::Categorical { categories } => categories.len(),
            ColumnKind::Numeric { .. } => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodedColumn {
    pub column: Column,
    pub kind: ColumnKind,
    pub offset: usize,
}

/// One-hot / min-max encoder fitted on a reference catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    columns: Vec<EncodedColumn>,
    dim: usize,
}

impl OneHotEncoder {
    /// Fit on the given rows
    pub fn fit(items: &[CatalogItem], options: FitOptions) -> Result<Self> {
        if items.is_empty() {
            return Err(Error::InvalidConfig(
                "cannot fit an encoder on an empty catalog".into(),
            ));
        }

        let mut columns = Vec::new();
        let mut offset = 0usize;

        for attribute in Attribute::ALL {
            let kind = fit_attribute(items, attribute)?;
            let width = kind.width();
            columns.push(EncodedColumn {
                column: Column::Attribute(attribute),
                kind,
                offset,
            });
            offset += width;
        }

        if options.include_material_type {
            let categories: Vec<String> = items
                .iter()
                .filter_map(|item| item.material_type.as_deref())
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect();

            if !categories.is_empty() {
                let width = categories.len();
                columns.push(EncodedColumn {
                    column: Column::MaterialType,
                    kind: ColumnKind::Categorical { categories },
                    offset,
                });
                offset += width;
            }
        }

        Ok(Self { columns, dim: offset })
    }

    pub fn columns(&self) -> &[EncodedColumn] {
        &self.columns
    }
}

impl Encoder for OneHotEncoder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn encode(&self, record: &EncodeRecord<'_>) -> Result<Vector> {
        let mut out = vec![0.0f32; self.dim];

        for column in &self.columns {
            match column.column {
                Column::Attribute(attribute) => {
                    encode_attribute(column, attribute, record.attributes.get(attribute), &mut out)?;
                }
                Column::MaterialType => {
                    let ColumnKind::Categorical { categories } = &column.kind else {
                        continue;
                    };
                    // No material type leaves the block empty
                    let Some(material_type) = record.material_type.map(str::trim).filter(|t| !t.is_empty()) else {
                        continue;
                    };
                    let index = categories
                        .iter()
                        .position(|c| c.eq_ignore_ascii_case(material_type))
                        .ok_or_else(|| {
                            Error::Encoding(format!("unknown material type '{}'", material_type))
                        })?;
                    out[column.offset + index] = 1.0;
                }
            }
        }

        Ok(Vector::new(out))
    }

    fn feature_spans(&self) -> Vec<FeatureSpan> {
        self.columns
            .iter()
            .map(|c| FeatureSpan {
                name: c.column.key().to_string(),
                range: c.offset..c.offset + c.kind.width(),
            })
            .collect()
    }
}

fn encode_attribute(column: &EncodedColumn, attribute: Attribute, value: &AttributeValue, out: &mut [f32]) -> Result<()> {
    match (&column.kind, value) {
        (ColumnKind::Categorical { categories }, AttributeValue::Level(label)) => {
            let label = label.trim();
            let index = categories.iter().position(|c| c == label).ok_or_else(|| {
                Error::Encoding(format!("unknown {} category '{}'", attribute, label))
            })?;
            out[column.offset + index] = 1.0;
            Ok(())
        }
        (ColumnKind::Numeric { min, max }, AttributeValue::Numeric(n)) if n.is_finite() => {
            let range = if max - min > f32::EPSILON { max - min } else { 1.0 };
            out[column.offset] = (n - min) / range;
            Ok(())
        }
        (_, AttributeValue::Missing) => {
            Err(Error::Encoding(format!("missing value for {}", attribute)))
        }
        (ColumnKind::Categorical { .. }, other) => Err(Error::Encoding(format!(
            "{} expects a category, got '{}'",
            attribute, other
        ))),
        (ColumnKind::Numeric { .. }, other) => Err(Error::Encoding(format!(
            "{} expects a number, got '{}'",
            attribute, other
        ))),
    }
}

fn fit_attribute(items: &[CatalogItem], attribute: Attribute) -> Result<ColumnKind> {
    let values: Vec<&AttributeValue> = items
        .iter()
        .map(|item| item.attributes.get(attribute))
        .filter(|v| !v.is_missing())
        .collect();

    if values.is_empty() {
        return Err(Error::InvalidConfig(format!(
            "column {} has no values to fit",
            attribute
        )));
    }

    let numbers: Option<Vec<f32>> = values
        .iter()
        .map(|v| match v {
            AttributeValue::Numeric(n) if n.is_finite() => Some(*n),
            _ => None,
        })
        .collect();

    if let Some(numbers) = numbers {
        let min = numbers.iter().copied().fold(f32::INFINITY, f32::min);
        let max = numbers.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        return Ok(ColumnKind::Numeric { min, max });
    }

    let categories: Vec<String> = values
        .iter()
        .filter_map(|v| match v {
            AttributeValue::Level(label) => Some(label.trim().to_string()),
            _ => None,
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    Ok(ColumnKind::Categorical { categories })
}
