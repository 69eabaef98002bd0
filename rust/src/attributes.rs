//! Typed, provenance-tagged, scenario-scoped attribute storage.
//!
//! Every property (scenario, task, resource) stores its attributes according
//! to a declared [`AttributeSchema`]. Scenario-specific attributes hold one
//! value per scenario; all others share a single slot. Reading or writing an
//! undeclared key, or writing a value of the wrong kind, is a configuration
//! error.

use chrono::NaiveDateTime;
use rustc_hash::FxHashMap;

use crate::error::ScheduleError;

/// Closed set of attribute kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttributeKind {
    Boolean,
    Integer,
    Float,
    Date,
    /// Seconds.
    Duration,
    Text,
}

/// A value of one of the [`AttributeKind`]s.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Date(Option<NaiveDateTime>),
    Duration(i64),
    Text(String),
}

impl AttributeKind {
    pub fn default_value(self) -> AttributeValue {
        match self {
            AttributeKind::Boolean => AttributeValue::Boolean(false),
            AttributeKind::Integer => AttributeValue::Integer(0),
            AttributeKind::Float => AttributeValue::Float(0.0),
            AttributeKind::Date => AttributeValue::Date(None),
            AttributeKind::Duration => AttributeValue::Duration(0),
            AttributeKind::Text => AttributeValue::Text(String::new()),
        }
    }

    /// Whether `value` is a legal value of this kind.
    pub fn validate(self, value: &AttributeValue) -> bool {
        match (self, value) {
            (AttributeKind::Boolean, AttributeValue::Boolean(_))
            | (AttributeKind::Integer, AttributeValue::Integer(_))
            | (AttributeKind::Date, AttributeValue::Date(_))
            | (AttributeKind::Text, AttributeValue::Text(_)) => true,
            (AttributeKind::Float, AttributeValue::Float(f)) => f.is_finite(),
            (AttributeKind::Duration, AttributeValue::Duration(secs)) => *secs >= 0,
            _ => false,
        }
    }

    /// Plain-text rendering used by diagnostics and reports.
    pub fn serialize(self, value: &AttributeValue) -> String {
        match value {
            AttributeValue::Boolean(b) => b.to_string(),
            AttributeValue::Integer(i) => i.to_string(),
            AttributeValue::Float(f) => format!("{:.3}", f),
            AttributeValue::Date(Some(date)) => date.format("%Y-%m-%d-%H:%M").to_string(),
            AttributeValue::Date(None) => "-".to_string(),
            AttributeValue::Duration(secs) => format_duration(*secs),
            AttributeValue::Text(s) => s.clone(),
        }
    }
}

fn format_duration(secs: i64) -> String {
    if secs % 86400 == 0 {
        format!("{}d", secs / 86400)
    } else if secs % 3600 == 0 {
        format!("{}h", secs / 3600)
    } else {
        format!("{}min", secs / 60)
    }
}

impl AttributeValue {
    pub fn kind(&self) -> AttributeKind {
        match self {
            AttributeValue::Boolean(_) => AttributeKind::Boolean,
            AttributeValue::Integer(_) => AttributeKind::Integer,
            AttributeValue::Float(_) => AttributeKind::Float,
            AttributeValue::Date(_) => AttributeKind::Date,
            AttributeValue::Duration(_) => AttributeKind::Duration,
            AttributeValue::Text(_) => AttributeKind::Text,
        }
    }
}

/// Where a stored value came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Provenance {
    /// Never written; the schema default.
    Default,
    /// Set by the user before scheduling.
    Provided,
    /// Copied from a parent property during propagation.
    Inherited,
    /// Derived by the scheduling pass.
    Computed,
}

/// A stored value together with its provenance.
#[derive(Clone, Debug, PartialEq)]
pub struct Attribute {
    pub value: AttributeValue,
    pub provenance: Provenance,
}

impl Attribute {
    pub fn is_set(&self) -> bool {
        self.provenance != Provenance::Default
    }

    pub fn is_provided(&self) -> bool {
        self.provenance == Provenance::Provided
    }
}

/// Declaration of one attribute key.
#[derive(Clone, Debug)]
pub struct AttributeDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: AttributeKind,
    pub inheritable: bool,
    pub scenario_specific: bool,
    pub default: AttributeValue,
}

impl AttributeDefinition {
    pub fn new(
        id: &'static str,
        name: &'static str,
        kind: AttributeKind,
        inheritable: bool,
        scenario_specific: bool,
        default: AttributeValue,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            inheritable,
            scenario_specific,
            default,
        }
    }
}

/// Ordered set of attribute declarations with lookup by id.
#[derive(Clone, Debug, Default)]
pub struct AttributeSchema {
    definitions: Vec<AttributeDefinition>,
    by_id: FxHashMap<&'static str, usize>,
}

impl AttributeSchema {
    pub fn new(definitions: Vec<AttributeDefinition>) -> Self {
        let mut schema = Self::default();
        for def in definitions {
            schema.declare(def);
        }
        schema
    }

    /// Add a declaration. A redeclared id replaces the old definition.
    pub fn declare(&mut self, def: AttributeDefinition) {
        debug_assert!(def.kind.validate(&def.default), "bad default for {}", def.id);
        match self.by_id.get(def.id) {
            Some(&idx) => self.definitions[idx] = def,
            None => {
                self.by_id.insert(def.id, self.definitions.len());
                self.definitions.push(def);
            }
        }
    }

    pub fn lookup(&self, id: &str) -> Result<usize, ScheduleError> {
        self.by_id
            .get(id)
            .copied()
            .ok_or_else(|| ScheduleError::Configuration(format!("Unknown attribute {}", id)))
    }

    pub fn definition(&self, idx: usize) -> &AttributeDefinition {
        &self.definitions[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &AttributeDefinition)> {
        self.definitions.iter().enumerate()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    fn fresh(&self) -> Vec<Attribute> {
        self.definitions
            .iter()
            .map(|def| Attribute {
                value: def.default.clone(),
                provenance: Provenance::Default,
            })
            .collect()
    }
}

/// Per-scenario slots of one property.
#[derive(Clone, Debug)]
struct ScenarioSlots {
    values: Vec<Attribute>,
    /// User input hidden behind a computed or inherited value; restored on
    /// reset.
    displaced: Vec<Option<Attribute>>,
    /// Slots holding a copy of a parent scenario's input rather than input
    /// given for this scenario.
    copied: Vec<bool>,
}

impl ScenarioSlots {
    fn new(schema: &AttributeSchema) -> Self {
        Self {
            values: schema.fresh(),
            displaced: vec![None; schema.len()],
            copied: vec![false; schema.len()],
        }
    }
}

/// Attribute values of one property, keyed by schema index.
#[derive(Clone, Debug)]
pub struct PropertyAttributes {
    shared: Vec<Attribute>,
    scenarios: Vec<ScenarioSlots>,
}

impl PropertyAttributes {
    pub fn new(schema: &AttributeSchema, scenario_count: usize) -> Self {
        Self {
            shared: schema.fresh(),
            scenarios: (0..scenario_count).map(|_| ScenarioSlots::new(schema)).collect(),
        }
    }

    /// Make room for one more scenario.
    pub fn add_scenario(&mut self, schema: &AttributeSchema) {
        self.scenarios.push(ScenarioSlots::new(schema));
    }

    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }

    fn slots(&self, scenario: usize) -> Result<&ScenarioSlots, ScheduleError> {
        self.scenarios.get(scenario).ok_or_else(|| {
            ScheduleError::Configuration(format!("Unknown scenario index {}", scenario))
        })
    }

    fn slots_mut(&mut self, scenario: usize) -> Result<&mut ScenarioSlots, ScheduleError> {
        self.scenarios.get_mut(scenario).ok_or_else(|| {
            ScheduleError::Configuration(format!("Unknown scenario index {}", scenario))
        })
    }

    pub fn get(
        &self,
        schema: &AttributeSchema,
        id: &str,
        scenario: usize,
    ) -> Result<&Attribute, ScheduleError> {
        let idx = schema.lookup(id)?;
        self.get_idx(schema, idx, scenario)
    }

    pub fn get_idx(
        &self,
        schema: &AttributeSchema,
        idx: usize,
        scenario: usize,
    ) -> Result<&Attribute, ScheduleError> {
        if schema.definition(idx).scenario_specific {
            Ok(&self.slots(scenario)?.values[idx])
        } else {
            Ok(&self.shared[idx])
        }
    }

    pub fn set(
        &mut self,
        schema: &AttributeSchema,
        id: &str,
        scenario: usize,
        value: AttributeValue,
        provenance: Provenance,
    ) -> Result<(), ScheduleError> {
        let idx = schema.lookup(id)?;
        self.set_idx(schema, idx, scenario, value, provenance)
    }

    /// Store a value. A scenario value that replaces user input keeps that
    /// input aside until the next [`reset_derived`](Self::reset_derived).
    pub fn set_idx(
        &mut self,
        schema: &AttributeSchema,
        idx: usize,
        scenario: usize,
        value: AttributeValue,
        provenance: Provenance,
    ) -> Result<(), ScheduleError> {
        let def = schema.definition(idx);
        if !def.kind.validate(&value) {
            return Err(ScheduleError::Configuration(format!(
                "Attribute {} expects a {:?} value, got {:?}",
                def.id, def.kind, value
            )));
        }
        if !def.scenario_specific {
            self.shared[idx] = Attribute { value, provenance };
            return Ok(());
        }
        let slots = self.slots_mut(scenario)?;
        if provenance == Provenance::Provided {
            slots.displaced[idx] = None;
            slots.copied[idx] = false;
        } else if slots.values[idx].is_provided() && slots.displaced[idx].is_none() {
            slots.displaced[idx] = Some(slots.values[idx].clone());
        }
        slots.values[idx] = Attribute { value, provenance };
        Ok(())
    }

    /// Undo everything a scheduling pass wrote into one scenario: displaced
    /// input comes back, copies from parent scenarios and inherited or
    /// computed values fall back to the default.
    pub fn reset_derived(&mut self, schema: &AttributeSchema, scenario: usize) {
        let Some(slots) = self.scenarios.get_mut(scenario) else {
            return;
        };
        for (idx, def) in schema.iter() {
            if !def.scenario_specific {
                continue;
            }
            if let Some(input) = slots.displaced[idx].take() {
                slots.values[idx] = input;
            }
            let slot = &mut slots.values[idx];
            if slots.copied[idx]
                || matches!(slot.provenance, Provenance::Inherited | Provenance::Computed)
            {
                *slot = Attribute {
                    value: def.default.clone(),
                    provenance: Provenance::Default,
                };
                slots.copied[idx] = false;
            }
        }
    }

    /// Drop shared values that were inherited from a parent property.
    pub fn reset_inherited_shared(&mut self, schema: &AttributeSchema) {
        for (idx, def) in schema.iter() {
            if !def.scenario_specific && self.shared[idx].provenance == Provenance::Inherited {
                self.shared[idx] = Attribute {
                    value: def.default.clone(),
                    provenance: Provenance::Default,
                };
            }
        }
    }

    /// The value the user gave for this very scenario, if any.
    fn own_input(&self, idx: usize, scenario: usize) -> Option<&Attribute> {
        let slots = self.scenarios.get(scenario)?;
        if slots.copied[idx] {
            return None;
        }
        match &slots.displaced[idx] {
            Some(input) => Some(input),
            None => Some(&slots.values[idx]).filter(|a| a.is_provided()),
        }
    }

    /// Fill unset scenario slots with the input of the nearest ancestor
    /// scenario that has some. `ancestors` is ordered parent first.
    ///
    /// Copies count as provided for this pass and are dropped again by
    /// [`reset_derived`](Self::reset_derived).
    pub fn inherit_scenario(&mut self, schema: &AttributeSchema, scenario: usize, ancestors: &[usize]) {
        if scenario >= self.scenarios.len() {
            return;
        }
        for (idx, def) in schema.iter() {
            if !def.scenario_specific || self.scenarios[scenario].values[idx].is_set() {
                continue;
            }
            let Some(input) = ancestors.iter().find_map(|&a| self.own_input(idx, a)).cloned() else {
                continue;
            };
            let slots = &mut self.scenarios[scenario];
            slots.values[idx] = input;
            slots.copied[idx] = true;
        }
    }
}

macro_rules! typed_getter {
    ($name:ident, $variant:ident, $ty:ty) => {
        pub fn $name(attr: &Attribute, id: &str) -> Result<$ty, ScheduleError> {
            match &attr.value {
                AttributeValue::$variant(v) => Ok(v.clone()),
                other => Err(ScheduleError::Configuration(format!(
                    "Attribute {} is not a {} value: {:?}",
                    id,
                    stringify!($variant),
                    other
                ))),
            }
        }
    };
}

/// Typed extraction helpers that turn kind mismatches into configuration errors.
pub mod typed {
    use super::*;

    typed_getter!(boolean, Boolean, bool);
    typed_getter!(integer, Integer, i64);
    typed_getter!(float, Float, f64);
    typed_getter!(date, Date, Option<NaiveDateTime>);
    typed_getter!(duration, Duration, i64);
    typed_getter!(text, Text, String);
}
