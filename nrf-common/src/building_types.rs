//! Building-type field descriptors
//!
//! The building-count page posts one field per configured building type,
//! named `buildingType-1` .. `buildingType-N` by 1-based position in the
//! configured list. The descriptors are built once at startup so that the
//! index <-> name mapping lives in one place.
//!
//! Field names are bound to list position, not to item id: reordering the
//! configured list remaps previously saved answers to different types.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use serde_json::Value;

use crate::state::StateMap;
use crate::{Error, Result};

/// Prefix shared by every building-count field name
pub const FIELD_PREFIX: &str = "buildingType-";

/// Item id of the type that diverts to the non-residential notice
pub const DEFAULT_NON_RESIDENTIAL_ID: &str = "non-residential";

/// One entry of the configured building-type list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingTypeListItem {
    pub id: String,
    pub text: String,
}

impl BuildingTypeListItem {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Compiled-in building-type list, in display order
pub fn default_building_types() -> Vec<BuildingTypeListItem> {
    vec![
        BuildingTypeListItem::new("dwelling-house", "Dwelling house"),
        BuildingTypeListItem::new("hotel", "Hotel"),
        BuildingTypeListItem::new("hmo", "House of multiple occupation (HMO)"),
        BuildingTypeListItem::new(DEFAULT_NON_RESIDENTIAL_ID, "Non-residential development"),
        BuildingTypeListItem::new("residential-institution", "Residential institution"),
        BuildingTypeListItem::new(
            "secure-residential-institution",
            "Secure residential institution",
        ),
    ]
}

/// Field name for a 1-based position
pub fn field_name(index: usize) -> String {
    format!("{}{}", FIELD_PREFIX, index)
}

/// 1-based position encoded in a field name, if it has the expected shape
pub fn field_index(name: &str) -> Option<usize> {
    name.strip_prefix(FIELD_PREFIX)?
        .parse::<usize>()
        .ok()
        .filter(|index| *index > 0)
}

/// A single typed building-count field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingTypeField {
    /// 1-based position in the configured list
    pub index: usize,
    /// Submitted field name, `buildingType-{index}`
    pub name: String,
    pub item: BuildingTypeListItem,
    pub non_residential: bool,
}

impl BuildingTypeField {
    pub fn label(&self) -> &str {
        &self.item.text
    }
}

/// Ordered field descriptors for the building-count page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingTypeFields {
    fields: Vec<BuildingTypeField>,
}

impl BuildingTypeFields {
    /// Build descriptors from the configured list
    ///
    /// Fails on an empty list or duplicate ids. A `non_residential_id`
    /// that matches no item simply disables the non-residential branch.
    pub fn from_items(items: Vec<BuildingTypeListItem>, non_residential_id: &str) -> Result<Self> {
        if items.is_empty() {
            return Err(Error::Config("building type list is empty".to_string()));
        }

        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.id.as_str()) {
                return Err(Error::Config(format!(
                    "duplicate building type id: {}",
                    item.id
                )));
            }
        }

        Ok(Self::build(items, non_residential_id))
    }

    fn build(items: Vec<BuildingTypeListItem>, non_residential_id: &str) -> Self {
        let fields = items
            .into_iter()
            .enumerate()
            .map(|(position, item)| BuildingTypeField {
                index: position + 1,
                name: field_name(position + 1),
                non_residential: item.id == non_residential_id,
                item,
            })
            .collect();
        Self { fields }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BuildingTypeField> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn first(&self) -> Option<&BuildingTypeField> {
        self.fields.first()
    }

    /// Look up a field by 1-based position
    pub fn by_index(&self, index: usize) -> Option<&BuildingTypeField> {
        index.checked_sub(1).and_then(|i| self.fields.get(i))
    }

    /// Look up a field by submitted name; unknown names yield `None`
    pub fn by_name(&self, name: &str) -> Option<&BuildingTypeField> {
        field_index(name).and_then(|index| self.by_index(index))
    }
}

impl Default for BuildingTypeFields {
    fn default() -> Self {
        Self::build(default_building_types(), DEFAULT_NON_RESIDENTIAL_ID)
    }
}

/// Accepted building counts, one per configured field, in field order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingCounts {
    counts: Vec<u32>,
}

impl BuildingCounts {
    /// Counts in field order; `counts.len()` must equal the field count
    pub fn from_values(counts: Vec<u32>) -> Self {
        Self { counts }
    }

    /// Read counts back from the auxiliary bucket
    ///
    /// Fields never answered (or holding anything that is not a whole,
    /// non-negative number) read as 0.
    pub fn from_bucket(fields: &BuildingTypeFields, bucket: Option<&StateMap>) -> Self {
        let counts = fields
            .iter()
            .map(|field| {
                bucket
                    .and_then(|b| b.get(&field.name))
                    .and_then(|value| match value {
                        Value::Number(n) => n.as_u64(),
                        Value::String(s) => s.trim().parse::<u64>().ok(),
                        _ => None,
                    })
                    .and_then(|n| u32::try_from(n).ok())
                    .unwrap_or(0)
            })
            .collect();
        Self { counts }
    }

    /// Count for a field, 0 when out of range
    pub fn get(&self, field: &BuildingTypeField) -> u32 {
        field
            .index
            .checked_sub(1)
            .and_then(|i| self.counts.get(i))
            .copied()
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|c| u64::from(*c)).sum()
    }

    /// Partial bucket update holding every field
    pub fn to_bucket_update(&self, fields: &BuildingTypeFields) -> StateMap {
        fields
            .iter()
            .map(|field| (field.name.clone(), Value::from(self.get(field))))
            .collect()
    }

    /// `(field, count)` pairs in field order
    pub fn entries<'a>(
        &'a self,
        fields: &'a BuildingTypeFields,
    ) -> impl Iterator<Item = (&'a BuildingTypeField, u32)> + 'a {
        fields.iter().map(move |field| (field, self.get(field)))
    }
}
