use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, Serializer};

/// Built-in `Country,Region,Continent` table.
const BUILTIN_REGIONS: &str = include_str!("regions.csv");

// ---------------------------------------------------------------------------
// Lookup seam
// ---------------------------------------------------------------------------

/// Maps a country name to a coarser group label.
pub trait RegionLookup {
    /// `None` when the country has no entry. The label may borrow from
    /// either the table or the argument.
    fn lookup<'a>(&'a self, country: &'a str) -> Option<&'a str>;
}

/// Every country is its own group.
#[derive(Debug, Clone, Copy, Default)]
pub struct CountryIdentity;

impl RegionLookup for CountryIdentity {
    fn lookup<'a>(&'a self, country: &'a str) -> Option<&'a str> {
        Some(country)
    }
}

/// A static country → label table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionTable {
    entries: BTreeMap<String, String>,
}

impl RegionTable {
    pub fn insert(&mut self, country: impl Into<String>, label: impl Into<String>) {
        self.entries.insert(country.into(), label.into());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<C: Into<String>, L: Into<String>> FromIterator<(C, L)> for RegionTable {
    fn from_iter<I: IntoIterator<Item = (C, L)>>(iter: I) -> Self {
        RegionTable {
            entries: iter.into_iter().map(|(c, l)| (c.into(), l.into())).collect(),
        }
    }
}

impl RegionLookup for RegionTable {
    fn lookup<'a>(&'a self, country: &'a str) -> Option<&'a str> {
        self.entries.get(country).map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Aggregation level
// ---------------------------------------------------------------------------

/// Granularity of the aggregated table. Only the lookup consulted differs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum AggregationLevel {
    Country,
    #[default]
    Region,
    Continent,
}

impl fmt::Display for AggregationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregationLevel::Country => write!(f, "Country"),
            AggregationLevel::Region => write!(f, "Region"),
            AggregationLevel::Continent => write!(f, "Continent"),
        }
    }
}

// ---------------------------------------------------------------------------
// RegionCatalog – one lookup per aggregation level
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum RegionTableError {
    #[error("cannot read region table {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid region table: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct RegionRow {
    #[serde(rename = "Country")]
    country: String,
    #[serde(rename = "Region", default)]
    region: Option<String>,
    #[serde(rename = "Continent", default)]
    continent: Option<String>,
}

/// Region and continent tables, plus the identity lookup for the
/// country level.
#[derive(Debug, Clone, Default)]
pub struct RegionCatalog {
    pub region: RegionTable,
    pub continent: RegionTable,
}

impl RegionCatalog {
    /// The table compiled into the binary.
    pub fn builtin() -> Result<Self, RegionTableError> {
        Self::from_reader(BUILTIN_REGIONS.as_bytes())
    }

    /// Read a `Country,Region,Continent` CSV file. Empty cells leave the
    /// country unmapped at that level.
    pub fn from_path(path: &Path) -> Result<Self, RegionTableError> {
        let file = std::fs::File::open(path).map_err(|source| RegionTableError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_reader(file)?;
        log::info!(
            "Loaded {} region and {} continent mappings from {}",
            catalog.region.len(),
            catalog.continent.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn from_reader<R: Read>(source: R) -> Result<Self, RegionTableError> {
        let mut reader = csv::Reader::from_reader(source);
        let mut catalog = RegionCatalog::default();
        for row in reader.deserialize() {
            let row: RegionRow = row?;
            if let Some(region) = row.region.filter(|r| !r.is_empty()) {
                catalog.region.insert(row.country.clone(), region);
            }
            if let Some(continent) = row.continent.filter(|c| !c.is_empty()) {
                catalog.continent.insert(row.country, continent);
            }
        }
        Ok(catalog)
    }

    /// The lookup to consult for `level`.
    pub fn lookup_for(&self, level: AggregationLevel) -> &dyn RegionLookup {
        match level {
            AggregationLevel::Country => &CountryIdentity,
            AggregationLevel::Region => &self.region,
            AggregationLevel::Continent => &self.continent,
        }
    }
}

// ---------------------------------------------------------------------------
// GroupLabel
// ---------------------------------------------------------------------------

/// The group an observation falls in. Unmapped countries share one group,
/// which sorts after every named group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupLabel {
    Named(String),
    Unmapped,
}

impl GroupLabel {
    pub fn resolve(lookup: &dyn RegionLookup, country: &str) -> Self {
        match lookup.lookup(country) {
            Some(label) => GroupLabel::Named(label.to_string()),
            None => GroupLabel::Unmapped,
        }
    }
}

impl fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupLabel::Named(name) => write!(f, "{name}"),
            GroupLabel::Unmapped => write!(f, "Unknown region"),
        }
    }
}

/// Serialized as the label, or `null` for the unmapped group.
impl Serialize for GroupLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            GroupLabel::Named(name) => serializer.serialize_some(name),
            GroupLabel::Unmapped => serializer.serialize_none(),
        }
    }
}
