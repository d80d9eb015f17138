//! Type definitions for the resource catalog
//!
//! The backend returns one heterogeneous catalog keyed by category. Every
//! record keeps its raw JSON object so the detail view can show all fields
//! in their original order; the fields the engine filters on are lifted into
//! typed fields once, at ingestion time.

use crate::error::{Result, RmonError};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Fixed resource categories, in display and aggregation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Ec2Instances,
    RdsInstances,
    EbsVolumes,
    RdsSnapshots,
    Ec2Snapshots,
    ElasticIps,
}

static CATEGORIES: [Category; 6] = [
    Category::Ec2Instances,
    Category::RdsInstances,
    Category::EbsVolumes,
    Category::RdsSnapshots,
    Category::Ec2Snapshots,
    Category::ElasticIps,
];

impl Category {
    pub fn all() -> &'static [Category] {
        &CATEGORIES
    }

    pub fn key(self) -> &'static str {
        match self {
            Category::Ec2Instances => "ec2_instances",
            Category::RdsInstances => "rds_instances",
            Category::EbsVolumes => "ebs_volumes",
            Category::RdsSnapshots => "rds_snapshots",
            Category::Ec2Snapshots => "ec2_snapshots",
            Category::ElasticIps => "elastic_ips",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Ec2Instances => "EC2 Instances",
            Category::RdsInstances => "RDS Instances",
            Category::EbsVolumes => "EBS Volumes",
            Category::RdsSnapshots => "RDS Snapshots",
            Category::Ec2Snapshots => "EC2 Snapshots",
            Category::ElasticIps => "Elastic IPs",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        CATEGORIES.iter().copied().find(|c| c.key() == key)
    }

    /// Fields that identify a record of this kind, most specific first
    pub fn id_fields(self) -> &'static [&'static str] {
        match self {
            Category::Ec2Instances => &["instance_id", "id"],
            Category::RdsInstances => &["db_instance_identifier", "id"],
            Category::EbsVolumes => &["volume_id", "id"],
            Category::RdsSnapshots => &["db_snapshot_identifier", "snapshot_id", "id"],
            Category::Ec2Snapshots => &["snapshot_id", "id"],
            Category::ElasticIps => &["allocation_id", "public_ip", "id"],
        }
    }

    fn slice(self) -> &'static [Category] {
        let idx = self as usize;
        &CATEGORIES[idx..=idx]
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A viewing context: one category or the synthetic aggregate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    AllResources,
    Category(Category),
}

pub const ALL_RESOURCES_KEY: &str = "all_resources";

impl Tab {
    /// Tabs in display order, aggregate first
    pub fn all() -> Vec<Tab> {
        std::iter::once(Tab::AllResources)
            .chain(CATEGORIES.iter().copied().map(Tab::Category))
            .collect()
    }

    pub fn key(self) -> &'static str {
        match self {
            Tab::AllResources => ALL_RESOURCES_KEY,
            Tab::Category(c) => c.key(),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::AllResources => "All Resources",
            Tab::Category(c) => c.label(),
        }
    }

    /// Categories whose records this tab draws from
    pub fn categories(self) -> &'static [Category] {
        match self {
            Tab::AllResources => &CATEGORIES,
            Tab::Category(c) => c.slice(),
        }
    }

    pub fn next(self) -> Tab {
        let tabs = Tab::all();
        let pos = tabs.iter().position(|t| *t == self).unwrap_or(0);
        tabs[(pos + 1) % tabs.len()]
    }

    pub fn prev(self) -> Tab {
        let tabs = Tab::all();
        let pos = tabs.iter().position(|t| *t == self).unwrap_or(0);
        tabs[(pos + tabs.len() - 1) % tabs.len()]
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Tab {
    type Err = RmonError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace('-', "_");
        if key == ALL_RESOURCES_KEY || key == "all" {
            return Ok(Tab::AllResources);
        }
        Category::from_key(&key).map(Tab::Category).ok_or_else(|| {
            let valid: Vec<&str> = Tab::all().into_iter().map(Tab::key).collect();
            RmonError::validation(
                "tab",
                format!("unknown category '{}' (expected one of: {})", s, valid.join(", ")),
            )
        })
    }
}

impl Serialize for Tab {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

/// AWS-style resource tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    #[serde(rename = "Key", alias = "key")]
    pub key: String,
    #[serde(rename = "Value", alias = "value", default)]
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// `key:value` form used by the tag facet and filter
    pub fn facet_key(&self) -> String {
        format!("{}:{}", self.key, self.value)
    }
}

/// Which record field a type value came from
///
/// EC2 instance types and RDS instance classes are separate vocabularies; a
/// type filter value only matches records whose type came from the same field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeSource {
    InstanceType,
    DbInstanceClass,
}

impl TypeSource {
    pub fn field(self) -> &'static str {
        match self {
            TypeSource::InstanceType => "instance_type",
            TypeSource::DbInstanceClass => "db_instance_class",
        }
    }
}

/// A type facet / filter value tagged with its source field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeKey {
    pub source: TypeSource,
    pub value: String,
}

impl TypeKey {
    pub fn instance_type(value: impl Into<String>) -> Self {
        Self {
            source: TypeSource::InstanceType,
            value: value.into(),
        }
    }

    pub fn db_instance_class(value: impl Into<String>) -> Self {
        Self {
            source: TypeSource::DbInstanceClass,
            value: value.into(),
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl FromStr for TypeKey {
    type Err = RmonError;

    /// Accepts `instance_type:t3.micro`, `db_instance_class:db.t3.micro`, or a
    /// bare value. Bare values starting with `db.` are RDS classes (that prefix
    /// is reserved for them by AWS); everything else is an EC2 instance type.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(RmonError::validation("instance_type", "empty value"));
        }
        if let Some(value) = s.strip_prefix("instance_type:") {
            return Ok(TypeKey::instance_type(value));
        }
        if let Some(value) = s.strip_prefix("db_instance_class:") {
            return Ok(TypeKey::db_instance_class(value));
        }
        if s.starts_with("db.") {
            Ok(TypeKey::db_instance_class(s))
        } else {
            Ok(TypeKey::instance_type(s))
        }
    }
}

/// Kind-specific sizing of a record
#[derive(Debug, Clone, PartialEq)]
pub enum Sizing {
    InstanceType(String),
    DbInstanceClass(String),
    VolumeSize(f64),
    Unspecified,
}

impl Sizing {
    fn from_fields(fields: &Map<String, Value>) -> Self {
        if let Some(t) = non_empty_str(fields, "instance_type") {
            Sizing::InstanceType(t)
        } else if let Some(c) = non_empty_str(fields, "db_instance_class") {
            Sizing::DbInstanceClass(c)
        } else if let Some(size) = fields.get("size").and_then(Value::as_f64) {
            Sizing::VolumeSize(size)
        } else {
            Sizing::Unspecified
        }
    }
}

/// One cost-savings finding for a single cloud resource
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRecord {
    pub category: Category,
    /// Identifier from the kind-specific key; `None` for malformed records
    pub id: Option<String>,
    pub region: String,
    pub potential_cost_savings: f64,
    pub sizing: Sizing,
    pub status: Option<String>,
    pub tags: Vec<Tag>,
    pub recommendations: String,
    fields: Map<String, Value>,
}

impl ResourceRecord {
    /// Lift the typed fields out of a raw record
    ///
    /// Never fails for an object: a missing identifier, region or savings value
    /// degrades to `None`, `""` and `0.0` and the record is kept.
    pub fn from_fields(category: Category, fields: Map<String, Value>) -> Self {
        let id = category
            .id_fields()
            .iter()
            .find_map(|key| scalar_string(&fields, key));

        let region = match non_empty_str(&fields, "region") {
            Some(region) => region,
            None => {
                warn!(
                    "{} record {} has no region",
                    category,
                    id.as_deref().unwrap_or("(unidentified)")
                );
                String::new()
            }
        };

        let potential_cost_savings = match fields.get("potential_cost_savings") {
            None | Some(Value::Null) => {
                debug!(
                    "{} record {} has no potential_cost_savings",
                    category,
                    id.as_deref().unwrap_or("(unidentified)")
                );
                0.0
            }
            Some(raw) => {
                let parsed = match raw {
                    Value::Number(n) => n.as_f64(),
                    Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                };
                // "NaN" and "inf" parse as f64 but are not amounts
                match parsed.filter(|v| v.is_finite()) {
                    Some(savings) => savings,
                    None => {
                        warn!(
                            "{} record {} has malformed potential_cost_savings: {}",
                            category,
                            id.as_deref().unwrap_or("(unidentified)"),
                            raw
                        );
                        0.0
                    }
                }
            }
        };

        let tags = match fields.get("tags") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| serde_json::from_value::<Tag>(item.clone()).ok())
                .collect(),
            _ => Vec::new(),
        };

        let recommendations = fields
            .get("recommendations")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self {
            category,
            id,
            region,
            potential_cost_savings,
            sizing: Sizing::from_fields(&fields),
            status: non_empty_str(&fields, "status"),
            tags,
            recommendations,
            fields,
        }
    }

    /// Parse one element of a category array; non-objects are rejected
    pub fn from_value(category: Category, value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self::from_fields(category, fields)),
            other => {
                warn!("Skipping non-object {} record: {}", category, other);
                None
            }
        }
    }

    /// Type value used by the instance-type facet and clause
    pub fn type_key(&self) -> Option<TypeKey> {
        match &self.sizing {
            Sizing::InstanceType(t) => Some(TypeKey::instance_type(t.clone())),
            Sizing::DbInstanceClass(c) => Some(TypeKey::db_instance_class(c.clone())),
            Sizing::VolumeSize(_) | Sizing::Unspecified => None,
        }
    }

    /// Whether the record carries the given type value (same source field)
    pub fn has_type(&self, key: &TypeKey) -> bool {
        match (&self.sizing, key.source) {
            (Sizing::InstanceType(t), TypeSource::InstanceType) => *t == key.value,
            (Sizing::DbInstanceClass(c), TypeSource::DbInstanceClass) => *c == key.value,
            _ => false,
        }
    }

    pub fn has_tag(&self, facet_key: &str) -> bool {
        self.tags.iter().any(|t| t.facet_key() == facet_key)
    }

    /// Every raw field, in the order the backend sent them
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

impl Serialize for ResourceRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

fn non_empty_str(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn scalar_string(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Records grouped by category, as fetched once per session
///
/// Immutable after construction. A category absent from the backend
/// response reads as an empty list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceCatalog {
    categories: BTreeMap<Category, Vec<ResourceRecord>>,
}

impl ResourceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a catalog from the all-resources response body
    pub fn from_json(value: Value) -> Result<Self> {
        let object = match value {
            Value::Object(object) => object,
            other => {
                return Err(RmonError::unavailable(
                    "catalog",
                    format!("expected a JSON object keyed by category, got {}", type_name(&other)),
                ))
            }
        };

        let mut catalog = ResourceCatalog::new();
        for (key, value) in object {
            if key == ALL_RESOURCES_KEY {
                debug!("Ignoring server-side all_resources; it is recomputed");
                continue;
            }
            let Some(category) = Category::from_key(&key) else {
                warn!("Ignoring unknown resource category '{}'", key);
                continue;
            };
            let records = match value {
                Value::Array(items) => items
                    .into_iter()
                    .filter_map(|item| ResourceRecord::from_value(category, item))
                    .collect(),
                Value::Null => Vec::new(),
                other => {
                    warn!(
                        "Category {} is {} instead of a list; treating as empty",
                        category,
                        type_name(&other)
                    );
                    Vec::new()
                }
            };
            catalog.categories.insert(category, records);
        }
        Ok(catalog)
    }

    /// Records of one category (empty if the backend omitted it)
    pub fn records(&self, category: Category) -> &[ResourceRecord] {
        self.categories
            .get(&category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Records a tab draws from, in fixed category order
    pub fn records_for(&self, tab: Tab) -> impl Iterator<Item = &ResourceRecord> + '_ {
        tab.categories()
            .iter()
            .flat_map(move |category| self.records(*category).iter())
    }

    pub fn len(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Serialize for ResourceCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(CATEGORIES.len()))?;
        for category in Category::all() {
            map.serialize_entry(category.key(), self.records(*category))?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ResourceCatalog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        ResourceCatalog::from_json(value).map_err(serde::de::Error::custom)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(category: Category, value: Value) -> ResourceRecord {
        ResourceRecord::from_value(category, value).unwrap()
    }

    #[test]
    fn test_tab_order_starts_with_aggregate() {
        let tabs = Tab::all();
        assert_eq!(tabs.len(), 7);
        assert_eq!(tabs[0], Tab::AllResources);
        assert_eq!(tabs[1], Tab::Category(Category::Ec2Instances));
        assert_eq!(tabs[6], Tab::Category(Category::ElasticIps));
    }

    #[test]
    fn test_tab_cycling_wraps() {
        assert_eq!(
            Tab::AllResources.next(),
            Tab::Category(Category::Ec2Instances)
        );
        assert_eq!(
            Tab::AllResources.prev(),
            Tab::Category(Category::ElasticIps)
        );
        assert_eq!(Tab::Category(Category::ElasticIps).next(), Tab::AllResources);
    }

    #[test]
    fn test_tab_from_str() {
        assert_eq!("all".parse::<Tab>().unwrap(), Tab::AllResources);
        assert_eq!(
            "ebs-volumes".parse::<Tab>().unwrap(),
            Tab::Category(Category::EbsVolumes)
        );
        assert!("lambda_functions".parse::<Tab>().is_err());
    }

    #[test]
    fn test_type_key_parsing_keeps_vocabularies_apart() {
        assert_eq!(
            "t3.micro".parse::<TypeKey>().unwrap(),
            TypeKey::instance_type("t3.micro")
        );
        assert_eq!(
            "db.t3.micro".parse::<TypeKey>().unwrap(),
            TypeKey::db_instance_class("db.t3.micro")
        );
        assert_eq!(
            "db_instance_class:custom".parse::<TypeKey>().unwrap(),
            TypeKey::db_instance_class("custom")
        );
        assert!("  ".parse::<TypeKey>().is_err());
    }

    #[test]
    fn test_record_lifts_typed_fields() {
        let rec = record(
            Category::Ec2Instances,
            json!({
                "instance_id": "i-0abc",
                "instance_type": "t3.large",
                "region": "us-east-1",
                "potential_cost_savings": 42.5,
                "status": "running",
                "tags": [{"Key": "Env", "Value": "Prod"}],
                "recommendations": "Downsize",
                "launch_time": "2024-01-01T00:00:00Z"
            }),
        );

        assert_eq!(rec.id.as_deref(), Some("i-0abc"));
        assert_eq!(rec.region, "us-east-1");
        assert_eq!(rec.potential_cost_savings, 42.5);
        assert_eq!(rec.type_key(), Some(TypeKey::instance_type("t3.large")));
        assert_eq!(rec.status.as_deref(), Some("running"));
        assert!(rec.has_tag("Env:Prod"));
        assert_eq!(
            rec.field("launch_time"),
            Some(&json!("2024-01-01T00:00:00Z"))
        );
    }

    #[test]
    fn test_record_types_do_not_cross_vocabularies() {
        let rds = record(
            Category::RdsInstances,
            json!({"db_instance_identifier": "db1", "db_instance_class": "m5.large", "region": "eu-west-1"}),
        );
        assert!(rds.has_type(&TypeKey::db_instance_class("m5.large")));
        assert!(!rds.has_type(&TypeKey::instance_type("m5.large")));
    }

    #[test]
    fn test_malformed_record_is_kept_with_fallbacks() {
        let rec = record(Category::EbsVolumes, json!({"size": 100}));
        assert_eq!(rec.id, None);
        assert_eq!(rec.region, "");
        assert_eq!(rec.potential_cost_savings, 0.0);
        assert_eq!(rec.sizing, Sizing::VolumeSize(100.0));
        assert!(rec.tags.is_empty());
    }

    #[test]
    fn test_non_object_record_is_rejected() {
        assert!(ResourceRecord::from_value(Category::ElasticIps, json!("1.2.3.4")).is_none());
    }

    #[test]
    fn test_record_serializes_raw_fields_in_order() {
        let raw = json!({"volume_id": "vol-1", "region": "us-east-1", "size": 8, "extra": {"a": 1}});
        let rec = record(Category::EbsVolumes, raw.clone());
        assert_eq!(serde_json::to_value(&rec).unwrap(), raw);
        let keys: Vec<&String> = rec.fields().keys().collect();
        assert_eq!(keys, vec!["volume_id", "region", "size", "extra"]);
    }

    #[test]
    fn test_catalog_missing_category_reads_empty() {
        let catalog = ResourceCatalog::from_json(json!({
            "ec2_instances": [{"instance_id": "i-1", "region": "us-east-1"}],
            "rds_instances": "oops",
            "all_resources": [{"instance_id": "dup", "region": "us-east-1"}],
            "lambda_functions": []
        }))
        .unwrap();

        assert_eq!(catalog.records(Category::Ec2Instances).len(), 1);
        assert!(catalog.records(Category::RdsInstances).is_empty());
        assert!(catalog.records(Category::ElasticIps).is_empty());
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn test_catalog_rejects_non_object_body() {
        assert!(matches!(
            ResourceCatalog::from_json(json!([1, 2, 3])),
            Err(RmonError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_records_for_aggregate_uses_fixed_order() {
        let catalog = ResourceCatalog::from_json(json!({
            "elastic_ips": [{"allocation_id": "eipalloc-1", "region": "us-east-1"}],
            "ec2_instances": [{"instance_id": "i-1", "region": "us-east-1"}]
        }))
        .unwrap();

        let ids: Vec<_> = catalog
            .records_for(Tab::AllResources)
            .map(|r| r.id.clone().unwrap())
            .collect();
        assert_eq!(ids, vec!["i-1", "eipalloc-1"]);
    }
}
