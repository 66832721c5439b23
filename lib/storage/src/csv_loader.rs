//! CSV catalog source
//!
//! One file per material category. Required columns are `Name`,
//! `Application`, `Strength`, `Cost`, `Water Resistance` and `Durability`;
//! `Eco-Friendly` and `Material Type` are optional. Any other column is kept
//! as an extra display field.

use matrec_core::{Attribute, AttributeValue, Attributes, Catalog, CatalogItem, Error, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

const NAME: &str = "Name";
const APPLICATION: &str = "Application";
const ECO_FRIENDLY: &str = "Eco-Friendly";
const MATERIAL_TYPE: &str = "Material Type";

/// Load a catalog from a CSV file
pub fn load_catalog(id: &str, path: impl AsRef<Path>) -> Result<Catalog> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|e| Error::resource_load(path.display().to_string(), e))?;

    let catalog = read_catalog(id, file)
        .map_err(|e| match e {
            Error::ResourceLoad { reason, .. } => Error::resource_load(path.display().to_string(), reason),
            other => other,
        })?;

    info!(catalog = id, path = %path.display(), rows = catalog.len(), "catalog loaded");
    Ok(catalog)
}

/// Parse a catalog from any CSV reader
pub fn read_catalog<R: Read>(id: &str, reader: R) -> Result<Catalog> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|e| Error::resource_load(id, e))?
        .clone();
    let layout = ColumnLayout::from_headers(&headers).map_err(|reason| Error::resource_load(id, reason))?;

    let mut items = Vec::new();
    for (line, record) in reader.records().enumerate() {
        let record = record.map_err(|e| Error::resource_load(id, format!("row {}: {}", line + 1, e)))?;
        items.push(layout.item(&record));
    }

    Ok(Catalog::new(id, items))
}

/// Header positions resolved once per file
struct ColumnLayout {
    name: usize,
    application: usize,
    eco_friendly: Option<usize>,
    material_type: Option<usize>,
    attributes: [usize; 4],
    extra: Vec<(usize, String)>,
}

impl ColumnLayout {
    fn from_headers(headers: &csv::StringRecord) -> std::result::Result<Self, String> {
        let index: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim(), i))
            .collect();

        let required = |column: &str| {
            index
                .get(column)
                .copied()
                .ok_or_else(|| format!("missing required column '{}'", column))
        };

        let mut attributes = [0usize; 4];
        for (slot, attribute) in attributes.iter_mut().zip(Attribute::ALL) {
            *slot = required(attribute.column())?;
        }

        let name = required(NAME)?;
        let application = required(APPLICATION)?;
        let eco_friendly = index.get(ECO_FRIENDLY).copied();
        let material_type = index.get(MATERIAL_TYPE).copied();

        let known: Vec<usize> = [Some(name), Some(application), eco_friendly, material_type]
            .into_iter()
            .flatten()
            .chain(attributes)
            .collect();
        let extra = headers
            .iter()
            .enumerate()
            .filter(|(i, h)| !known.contains(i) && !h.trim().is_empty())
            .map(|(i, h)| (i, h.trim().to_string()))
            .collect();

        Ok(Self {
            name,
            application,
            eco_friendly,
            material_type,
            attributes,
            extra,
        })
    }

    fn item(&self, record: &csv::StringRecord) -> CatalogItem {
        let cell = |i: usize| record.get(i).unwrap_or("").trim();

        let mut attributes = Attributes::uniform(AttributeValue::Missing);
        for (attribute, i) in Attribute::ALL.into_iter().zip(self.attributes) {
            attributes.set(attribute, AttributeValue::parse_cell(cell(i)));
        }

        let mut item = CatalogItem::new(cell(self.name), cell(self.application), attributes);
        if let Some(i) = self.eco_friendly {
            item = item.with_eco_friendly(cell(i));
        }
        if let Some(material_type) = self.material_type.map(cell).filter(|t| !t.is_empty()) {
            item = item.with_material_type(material_type);
        }
        for (i, column) in &self.extra {
            item = item.with_extra(column.clone(), cell(*i));
        }
        item
    }
}
