//! Histogram descriptors and the clone-with-overrides operation.
//!
//! A [`HistogramDescriptor`] is immutable once constructed. New descriptors
//! are derived from existing ones with [`HistogramDescriptor::clone_with`],
//! which copies every field of the template and patches exactly the fields
//! named in an [`Overrides`] map.

use std::collections::BTreeMap;
use std::fmt;

use hc_core::{Error, Result};
use serde::{Deserialize, Serialize};

// ── Schema ─────────────────────────────────────────────────────

/// Field of a histogram descriptor, keyed by its configuration name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// `name`
    Name,
    /// `description`
    Description,
    /// `plotquantity`
    PlotQuantity,
    /// `min`
    Min,
    /// `max`
    Max,
    /// `nbins`
    NBins,
    /// `lazyParsing`
    LazyParsing,
}

impl Field {
    /// All descriptor fields, in serialisation order.
    pub const ALL: [Field; 7] = [
        Field::Name,
        Field::Description,
        Field::PlotQuantity,
        Field::Min,
        Field::Max,
        Field::NBins,
        Field::LazyParsing,
    ];

    /// Configuration key for this field.
    pub fn as_str(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Description => "description",
            Field::PlotQuantity => "plotquantity",
            Field::Min => "min",
            Field::Max => "max",
            Field::NBins => "nbins",
            Field::LazyParsing => "lazyParsing",
        }
    }

    /// Look up a field by its configuration key (case-sensitive).
    pub fn from_name(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == key)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Values ─────────────────────────────────────────────────────

/// A single override value.
///
/// Integers are accepted where a float is expected (`min = 0`); the reverse
/// is rejected.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// String value.
    Str(String),
}

impl FieldValue {
    fn kind(&self) -> &'static str {
        match self {
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "integer",
            FieldValue::Float(_) => "float",
            FieldValue::Str(_) => "string",
        }
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v.into())
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

/// Field-name → value map applied by [`HistogramDescriptor::clone_with`].
///
/// Keys are kept as raw strings so that typos survive until the clone and
/// are reported as [`Error::UnknownField`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Overrides(BTreeMap<String, FieldValue>);

impl Overrides {
    /// Empty override map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `field` to `value`, replacing any earlier value for that key.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// In-place variant of [`Overrides::set`].
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.0.insert(field.into(), value.into());
    }

    /// Value set for `field`, if any.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    /// Iterate over `(key, value)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of overridden fields.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// `true` if nothing is overridden.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for Overrides {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

// ── Construction input ─────────────────────────────────────────

/// Explicit values for every descriptor field, as accepted by
/// [`HistogramDescriptor::define`]. There are no defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DescriptorFields {
    /// Histogram name (output key).
    pub name: String,
    /// Axis label.
    pub description: String,
    /// Per-event expression, opaque to this crate.
    pub plotquantity: String,
    /// Lower axis bound.
    pub min: f64,
    /// Upper axis bound.
    pub max: f64,
    /// Bin count.
    pub nbins: i64,
    /// Parse-strategy hint for the expression evaluator.
    #[serde(rename = "lazyParsing")]
    pub lazy_parsing: bool,
}

impl DescriptorFields {
    /// Build from a loosely typed key/value map.
    ///
    /// Unknown keys fail with [`Error::UnknownField`]; missing keys and
    /// wrongly typed values fail with [`Error::InvalidValue`].
    pub fn from_map(template: &str, map: &BTreeMap<String, FieldValue>) -> Result<Self> {
        let mut fields: BTreeMap<Field, &FieldValue> = BTreeMap::new();
        for (key, value) in map {
            let field = Field::from_name(key).ok_or_else(|| Error::UnknownField {
                template: template.to_string(),
                field: key.clone(),
            })?;
            fields.insert(field, value);
        }

        let take = |field: Field| {
            fields.get(&field).copied().ok_or_else(|| Error::InvalidValue {
                descriptor: template.to_string(),
                field: field.to_string(),
                reason: "missing required field".into(),
            })
        };

        Ok(Self {
            name: expect_str(template, Field::Name, take(Field::Name)?)?,
            description: expect_str(template, Field::Description, take(Field::Description)?)?,
            plotquantity: expect_str(template, Field::PlotQuantity, take(Field::PlotQuantity)?)?,
            min: expect_float(template, Field::Min, take(Field::Min)?)?,
            max: expect_float(template, Field::Max, take(Field::Max)?)?,
            nbins: expect_int(template, Field::NBins, take(Field::NBins)?)?,
            lazy_parsing: expect_bool(template, Field::LazyParsing, take(Field::LazyParsing)?)?,
        })
    }

    /// Overwrite one field with a loosely typed value.
    fn set(&mut self, template: &str, field: Field, value: &FieldValue) -> Result<()> {
        match field {
            Field::Name => self.name = expect_str(template, field, value)?,
            Field::Description => self.description = expect_str(template, field, value)?,
            Field::PlotQuantity => self.plotquantity = expect_str(template, field, value)?,
            Field::Min => self.min = expect_float(template, field, value)?,
            Field::Max => self.max = expect_float(template, field, value)?,
            Field::NBins => self.nbins = expect_int(template, field, value)?,
            Field::LazyParsing => self.lazy_parsing = expect_bool(template, field, value)?,
        }
        Ok(())
    }
}

fn type_mismatch(template: &str, field: Field, expected: &str, got: &FieldValue) -> Error {
    Error::InvalidValue {
        descriptor: template.to_string(),
        field: field.to_string(),
        reason: format!("expected {expected}, got {}", got.kind()),
    }
}

fn expect_str(template: &str, field: Field, v: &FieldValue) -> Result<String> {
    match v {
        FieldValue::Str(s) => Ok(s.clone()),
        other => Err(type_mismatch(template, field, "string", other)),
    }
}

fn expect_float(template: &str, field: Field, v: &FieldValue) -> Result<f64> {
    match v {
        FieldValue::Float(x) => Ok(*x),
        FieldValue::Int(i) => Ok(*i as f64),
        other => Err(type_mismatch(template, field, "number", other)),
    }
}

fn expect_int(template: &str, field: Field, v: &FieldValue) -> Result<i64> {
    match v {
        FieldValue::Int(i) => Ok(*i),
        other => Err(type_mismatch(template, field, "integer", other)),
    }
}

fn expect_bool(template: &str, field: Field, v: &FieldValue) -> Result<bool> {
    match v {
        FieldValue::Bool(b) => Ok(*b),
        other => Err(type_mismatch(template, field, "bool", other)),
    }
}

// ── Descriptor ─────────────────────────────────────────────────

/// A fully specified, validated histogram descriptor.
///
/// Invariants: `name` is non-empty, `min < max` with both bounds finite,
/// and `nbins > 0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DescriptorFields", into = "DescriptorFields")]
pub struct HistogramDescriptor {
    name: String,
    description: String,
    plotquantity: String,
    min: f64,
    max: f64,
    nbins: u32,
    lazy_parsing: bool,
}

impl HistogramDescriptor {
    /// Construct a descriptor from explicit values for every field.
    pub fn define(fields: DescriptorFields) -> Result<Self> {
        let invalid = |field: Field, reason: String| Error::InvalidValue {
            descriptor: if fields.name.trim().is_empty() {
                "<unnamed>".to_string()
            } else {
                fields.name.clone()
            },
            field: field.to_string(),
            reason,
        };

        if fields.name.trim().is_empty() {
            return Err(invalid(Field::Name, "must not be empty".into()));
        }
        if !fields.min.is_finite() {
            return Err(invalid(Field::Min, format!("must be finite, got {}", fields.min)));
        }
        if !fields.max.is_finite() {
            return Err(invalid(Field::Max, format!("must be finite, got {}", fields.max)));
        }
        if fields.min >= fields.max {
            return Err(invalid(
                Field::Max,
                format!("axis range is empty or inverted (min = {}, max = {})", fields.min, fields.max),
            ));
        }
        if fields.nbins <= 0 {
            return Err(invalid(Field::NBins, format!("must be positive, got {}", fields.nbins)));
        }
        let nbins = u32::try_from(fields.nbins)
            .map_err(|_| invalid(Field::NBins, format!("too large: {}", fields.nbins)))?;

        tracing::debug!(name = %fields.name, nbins, min = fields.min, max = fields.max, "defined descriptor");

        Ok(Self {
            name: fields.name,
            description: fields.description,
            plotquantity: fields.plotquantity,
            min: fields.min,
            max: fields.max,
            nbins,
            lazy_parsing: fields.lazy_parsing,
        })
    }

    /// Derive a new descriptor equal to `self` except for the overridden fields.
    ///
    /// All override keys are checked before any value is applied, so an
    /// unknown key is always reported as [`Error::UnknownField`] even when
    /// another override is also invalid. `self` is never modified.
    pub fn clone_with(&self, overrides: &Overrides) -> Result<Self> {
        let patches = overrides
            .iter()
            .map(|(key, value)| {
                Field::from_name(key).map(|f| (f, value)).ok_or_else(|| Error::UnknownField {
                    template: self.name.clone(),
                    field: key.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let mut fields = DescriptorFields::from(self.clone());
        for (field, value) in patches {
            fields.set(&self.name, field, value)?;
        }

        let derived = Self::define(fields)?;
        tracing::debug!(
            template = %self.name,
            name = %derived.name,
            n_overrides = overrides.len(),
            "cloned descriptor"
        );
        Ok(derived)
    }

    /// Histogram name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Axis label.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Per-event expression string.
    pub fn plotquantity(&self) -> &str {
        &self.plotquantity
    }

    /// Lower axis bound.
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper axis bound.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Number of bins.
    pub fn nbins(&self) -> u32 {
        self.nbins
    }

    /// Lazy-parsing hint.
    pub fn lazy_parsing(&self) -> bool {
        self.lazy_parsing
    }

    /// Value of a single field, in override form.
    pub fn value(&self, field: Field) -> FieldValue {
        match field {
            Field::Name => FieldValue::Str(self.name.clone()),
            Field::Description => FieldValue::Str(self.description.clone()),
            Field::PlotQuantity => FieldValue::Str(self.plotquantity.clone()),
            Field::Min => FieldValue::Float(self.min),
            Field::Max => FieldValue::Float(self.max),
            Field::NBins => FieldValue::Int(self.nbins.into()),
            Field::LazyParsing => FieldValue::Bool(self.lazy_parsing),
        }
    }
}

impl TryFrom<DescriptorFields> for HistogramDescriptor {
    type Error = Error;

    fn try_from(fields: DescriptorFields) -> Result<Self> {
        Self::define(fields)
    }
}

impl From<HistogramDescriptor> for DescriptorFields {
    fn from(d: HistogramDescriptor) -> Self {
        Self {
            name: d.name,
            description: d.description,
            plotquantity: d.plotquantity,
            min: d.min,
            max: d.max,
            nbins: d.nbins.into(),
            lazy_parsing: d.lazy_parsing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn pt() -> HistogramDescriptor {
        HistogramDescriptor::define(DescriptorFields {
            name: "Pt".into(),
            description: "p_T".into(),
            plotquantity: "pt".into(),
            min: 0.0,
            max: 200.0,
            nbins: 100,
            lazy_parsing: true,
        })
        .unwrap()
    }

    #[test]
    fn clone_overrides_named_fields_only() {
        let muon_jetpt = pt()
            .clone_with(
                &Overrides::new()
                    .set("name", "MuJetPt")
                    .set("plotquantity", "daughter(0).userFloat('jetPt')"),
            )
            .unwrap();

        let expected = HistogramDescriptor::define(DescriptorFields {
            name: "MuJetPt".into(),
            description: "p_T".into(),
            plotquantity: "daughter(0).userFloat('jetPt')".into(),
            min: 0.0,
            max: 200.0,
            nbins: 100,
            lazy_parsing: true,
        })
        .unwrap();
        assert_eq!(muon_jetpt, expected);
    }

    #[test]
    fn clone_leaves_template_untouched() {
        let template = pt();
        let before = template.clone();
        let _ = template.clone_with(&Overrides::new().set("name", "Other").set("nbins", 7));
        let _ = template.clone_with(&Overrides::new().set("nbins", 0));
        assert_eq!(template, before);
    }

    #[test]
    fn unknown_override_is_rejected() {
        let err = pt().clone_with(&Overrides::new().set("nonexistent", 1)).unwrap_err();
        assert!(matches!(err, Error::UnknownField { ref field, .. } if field == "nonexistent"));

        let err = pt().clone_with(&Overrides::new().set("discription", "x")).unwrap_err();
        assert!(matches!(err, Error::UnknownField { ref template, .. } if template == "Pt"));
    }

    #[test]
    fn unknown_field_wins_over_invalid_value() {
        let err = pt()
            .clone_with(&Overrides::new().set("nbins", 0).set("zzz", true))
            .unwrap_err();
        assert!(matches!(err, Error::UnknownField { .. }));
    }

    #[test]
    fn zero_bins_is_invalid() {
        let mut f = DescriptorFields::from(pt());
        f.nbins = 0;
        let err = HistogramDescriptor::define(f).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { ref field, .. } if field == "nbins"));

        let err = pt().clone_with(&Overrides::new().set("nbins", -3)).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
    }

    #[test]
    fn degenerate_range_is_invalid() {
        let mut f = DescriptorFields::from(pt());
        f.min = 5.0;
        f.max = 5.0;
        assert!(matches!(HistogramDescriptor::define(f), Err(Error::InvalidValue { .. })));

        let err = pt().clone_with(&Overrides::new().set("min", 300)).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));

        let err = pt().clone_with(&Overrides::new().set("max", f64::NAN)).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
    }

    #[test]
    fn empty_name_is_invalid() {
        let err = pt().clone_with(&Overrides::new().set("name", "  ")).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidValue { ref field, ref descriptor, .. }
                if field == "name" && descriptor == "<unnamed>"
        ));
    }

    #[test]
    fn wrong_kind_is_invalid() {
        let err = pt().clone_with(&Overrides::new().set("nbins", 10.0)).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { ref reason, .. } if reason.contains("integer")));

        let err = pt().clone_with(&Overrides::new().set("lazyParsing", "yes")).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
    }

    #[test]
    fn integer_is_accepted_for_bounds() {
        let d = pt().clone_with(&Overrides::new().set("min", -5).set("max", 5)).unwrap();
        assert_relative_eq!(d.min(), -5.0);
        assert_relative_eq!(d.max(), 5.0);
    }

    #[test]
    fn from_map_requires_every_field() {
        let mut map: BTreeMap<String, FieldValue> =
            Field::ALL.iter().map(|f| (f.as_str().to_string(), pt().value(*f))).collect();
        assert_eq!(DescriptorFields::from_map("pt", &map).unwrap(), DescriptorFields::from(pt()));

        map.remove("description");
        let err = DescriptorFields::from_map("pt", &map).unwrap_err();
        assert!(matches!(err, Error::InvalidValue { ref field, .. } if field == "description"));
    }

    #[test]
    fn json_uses_configuration_keys() {
        let v = serde_json::to_value(pt()).unwrap();
        assert_eq!(v["plotquantity"], "pt");
        assert_eq!(v["lazyParsing"], true);
        assert_eq!(v["nbins"], 100);

        let bad = r#"{"name":"x","description":"","plotquantity":"pt","min":1,"max":0,"nbins":1,"lazyParsing":false}"#;
        assert!(serde_json::from_str::<HistogramDescriptor>(bad).is_err());
    }

    fn arb_overrides() -> impl Strategy<Value = Overrides> {
        (
            proptest::option::of("[A-Za-z][A-Za-z0-9]{0,8}"),
            proptest::option::of(".{0,12}"),
            proptest::option::of(1i64..500),
            proptest::option::of(any::<bool>()),
            proptest::option::of((-100.0f64..0.0, 1.0f64..100.0)),
        )
            .prop_map(|(name, plot, nbins, lazy, range)| {
                let mut o = Overrides::new();
                if let Some(n) = name {
                    o.insert("name", n);
                }
                if let Some(p) = plot {
                    o.insert("plotquantity", p);
                }
                if let Some(n) = nbins {
                    o.insert("nbins", n);
                }
                if let Some(l) = lazy {
                    o.insert("lazyParsing", l);
                }
                if let Some((lo, hi)) = range {
                    o.insert("min", lo);
                    o.insert("max", hi);
                }
                o
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

        #[test]
        fn prop_clone_is_pure_and_patches_exactly(overrides in arb_overrides()) {
            let template = pt();
            let before = template.clone();
            let derived = template.clone_with(&overrides).unwrap();

            prop_assert_eq!(&template, &before);
            for field in Field::ALL {
                match overrides.get(field.as_str()) {
                    Some(v) => prop_assert_eq!(&derived.value(field), v),
                    None => prop_assert_eq!(derived.value(field), template.value(field)),
                }
            }
        }
    }
}
