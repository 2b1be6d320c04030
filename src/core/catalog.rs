use crate::domain::model::Anode;
use crate::utils::error::{QuoteError, Result};
use crate::utils::money::parse_price;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Catalog row as scraped from the supplier. Prices arrive either as
/// numbers or as `"$12.34"` strings.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAnode {
    pub boatzincs_id: Option<String>,
    pub sku: Option<String>,
    pub name: String,
    pub list_price: Option<serde_json::Value>,
    pub sale_price: Option<serde_json::Value>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Wrapped { anodes: Vec<RawAnode> },
    Bare(Vec<RawAnode>),
}

fn price_from_value(value: &serde_json::Value) -> Option<rust_decimal::Decimal> {
    match value {
        serde_json::Value::String(s) => parse_price(s),
        serde_json::Value::Number(n) => parse_price(&n.to_string()),
        _ => None,
    }
}

impl RawAnode {
    /// `None` when the row has neither an id nor a usable price.
    pub fn into_anode(self) -> Option<Anode> {
        let id = self
            .boatzincs_id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .or_else(|| self.sku.clone().filter(|sku| !sku.trim().is_empty()))?;
        let list_price = self
            .list_price
            .as_ref()
            .and_then(price_from_value)
            .or_else(|| self.sale_price.as_ref().and_then(price_from_value))?;

        Some(Anode {
            sku: self.sku.unwrap_or_else(|| id.clone()),
            id,
            name: self.name,
            list_price,
            category: self.category.unwrap_or_default(),
            material: self.material,
            description: self.description,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaftSize {
    Standard,
    Metric,
}

impl std::str::FromStr for ShaftSize {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "inch" => Ok(ShaftSize::Standard),
            "metric" | "mm" => Ok(ShaftSize::Metric),
            other => Err(QuoteError::validation(
                "shaft_size",
                format!("'{}' is not standard or metric", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnodeFilter {
    pub category: Option<String>,
    pub material: Option<String>,
    pub shaft_size: Option<ShaftSize>,
    pub search: Option<String>,
}

fn inch_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?i)\d+/\d+"|[\d.]+"\s|inch"#).expect("valid regex"))
}

fn fraction_inch_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"\d+/\d+"|[\d.]+"\s"#).expect("valid regex"))
}

fn metric_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\d+\s?mm|metric").expect("valid regex"))
}

/// Polishing strips and promotional freebies are never sold on a job.
fn is_sellable(anode: &Anode) -> bool {
    let name = anode.name.to_lowercase();
    let sku = anode.sku.to_lowercase();
    !name.contains("polishing")
        && !sku.contains("polishing-strip")
        && !name.contains("free!!!")
        && !(name.contains("strip") && name.contains("3-foot"))
}

fn matches_category(anode: &Anode, category: &str) -> bool {
    let cat = anode.category.to_lowercase();
    match category.to_lowercase().as_str() {
        "all" | "" => true,
        "shaft" => cat.contains("shaft_anodes"),
        "prop" | "propeller" => cat.contains("propeller"),
        "hull" => cat.contains("hull_anodes"),
        "engine" => cat.contains("engine") || cat.contains("outboard"),
        other => cat.contains(other),
    }
}

fn matches_shaft_size(anode: &Anode, size: ShaftSize) -> bool {
    if !anode.category.to_lowercase().contains("shaft") {
        return false;
    }
    let combined = format!(
        "{} {}",
        anode.name,
        anode.description.as_deref().unwrap_or_default()
    );
    match size {
        ShaftSize::Standard => {
            inch_pattern().is_match(&combined) && !metric_pattern().is_match(&combined)
        }
        ShaftSize::Metric => {
            metric_pattern().is_match(&combined) && !fraction_inch_pattern().is_match(&combined)
        }
    }
}

impl AnodeFilter {
    pub fn matches(&self, anode: &Anode) -> bool {
        if !is_sellable(anode) {
            return false;
        }
        if let Some(category) = &self.category {
            if !matches_category(anode, category) {
                return false;
            }
        }
        if let Some(material) = &self.material {
            let wanted = material.to_lowercase();
            if wanted != "all"
                && anode.material.as_deref().map(str::to_lowercase) != Some(wanted)
            {
                return false;
            }
        }
        if let Some(size) = self.shaft_size {
            if !matches_shaft_size(anode, size) {
                return false;
            }
        }
        if let Some(term) = &self.search {
            let term = term.trim().to_lowercase();
            if !term.is_empty()
                && !anode.name.to_lowercase().contains(&term)
                && !anode.sku.to_lowercase().contains(&term)
            {
                return false;
            }
        }
        true
    }
}

/// Short display name: brand names, model numbers and the words
/// "Anode"/"Zinc" removed.
pub fn simplify_name(name: &str) -> String {
    static BRANDS: OnceLock<Regex> = OnceLock::new();
    static MODEL: OnceLock<Regex> = OnceLock::new();
    static NOISE: OnceLock<Regex> = OnceLock::new();
    static SHAFT: OnceLock<Regex> = OnceLock::new();
    static SPACES: OnceLock<Regex> = OnceLock::new();
    static DASHES: OnceLock<Regex> = OnceLock::new();

    let brands = BRANDS.get_or_init(|| {
        Regex::new(r"(?i)Camp |Martyr |Performance Metals |Tecnoseal |Reliance ")
            .expect("valid regex")
    });
    let model = MODEL.get_or_init(|| Regex::new(r"(?i)\bX-\d+[A-Z]?\b").expect("valid regex"));
    let noise = NOISE.get_or_init(|| Regex::new(r"(?i)\bAnode\b|\bZinc\b").expect("valid regex"));
    let shaft = SHAFT.get_or_init(|| Regex::new(r"(?i)Shaft\s+(-\s+)?").expect("valid regex"));
    let spaces = SPACES.get_or_init(|| Regex::new(r"\s+").expect("valid regex"));
    let dashes = DASHES.get_or_init(|| Regex::new(r"\s+-\s+").expect("valid regex"));

    let name = brands.replace_all(name, "");
    let name = model.replace_all(&name, "");
    let name = noise.replace_all(&name, "");
    let name = shaft.replace_all(&name, "Shaft ");
    let name = spaces.replace_all(&name, " ");
    let name = dashes.replace_all(&name, " ");
    let name = name
        .trim()
        .trim_start_matches('-')
        .trim_end_matches('-')
        .trim();

    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnodeCatalog {
    anodes: Vec<Anode>,
    index: HashMap<String, usize>,
}

impl AnodeCatalog {
    pub fn new(anodes: Vec<Anode>) -> Self {
        let mut index = HashMap::with_capacity(anodes.len() * 2);
        for (pos, anode) in anodes.iter().enumerate() {
            index.entry(anode.id.clone()).or_insert(pos);
            index.entry(anode.sku.clone()).or_insert(pos);
        }
        Self { anodes, index }
    }

    pub fn from_raw(rows: Vec<RawAnode>) -> Self {
        let total = rows.len();
        let anodes: Vec<Anode> = rows.into_iter().filter_map(RawAnode::into_anode).collect();
        if anodes.len() < total {
            tracing::warn!(
                "Skipped {} catalog rows without an id or price",
                total - anodes.len()
            );
        }
        Self::new(anodes)
    }

    /// Accepts `{"anodes": [...]}` or a bare array.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let file: CatalogFile = serde_json::from_slice(bytes)?;
        let rows = match file {
            CatalogFile::Wrapped { anodes } => anodes,
            CatalogFile::Bare(rows) => rows,
        };
        Ok(Self::from_raw(rows))
    }

    pub fn len(&self) -> usize {
        self.anodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anodes.is_empty()
    }

    pub fn into_anodes(self) -> Vec<Anode> {
        self.anodes
    }

    /// Lookup by catalog id or sku.
    pub fn get(&self, id: &str) -> Option<&Anode> {
        self.index.get(id).map(|pos| &self.anodes[*pos])
    }

    pub fn require(&self, id: &str) -> Result<&Anode> {
        self.get(id).ok_or_else(|| QuoteError::UnknownAnode { id: id.to_string() })
    }

    pub fn filter<'a>(&'a self, filter: &'a AnodeFilter) -> impl Iterator<Item = &'a Anode> + 'a {
        self.anodes.iter().filter(move |anode| filter.matches(anode))
    }

    /// Writes the filtered listing as CSV.
    pub fn write_csv<W: std::io::Write>(&self, filter: &AnodeFilter, out: W) -> Result<usize> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record([
            "id",
            "sku",
            "name",
            "display_name",
            "category",
            "material",
            "list_price",
        ])?;
        let mut count = 0;
        for anode in self.filter(filter) {
            writer.write_record([
                anode.id.as_str(),
                anode.sku.as_str(),
                anode.name.as_str(),
                simplify_name(&anode.name).as_str(),
                anode.category.as_str(),
                anode.material.as_deref().unwrap_or_default(),
                anode.list_price.to_string().as_str(),
            ])?;
            count += 1;
        }
        writer.flush()?;
        Ok(count)
    }
}
