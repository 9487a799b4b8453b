//! Rule annotations.
//!
//! Annotations are metadata attached to a rule that change how its match
//! result shapes the tree or the diagnostics, without changing what it
//! matches:
//!
//! - `token` overrides the token of the produced node (and makes a scanning
//!   rule structural).
//! - `error` replaces the message reported when the rule fails.
//! - `void` consumes input but drops the node and its children.
//! - `transient` drops the node but splices its children into the parent.
//! - `pinned` creates an empty node when an optional rule matched nothing.
//! - `type` is a free-form type hint for consumers of the tree.
//! - `custom(label)` carries anything else, keyed by its label.
//!
//! A rule holds at most one value per annotation kind.

use crate::Token;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Annotation {
    Token,
    Error,
    Void,
    Transient,
    Pinned,
    Type,
    Custom(String),
}

impl Annotation {
    pub fn custom(label: impl Into<String>) -> Self {
        Annotation::Custom(label.into())
    }

    pub fn label(&self) -> &str {
        match self {
            Annotation::Token => "token",
            Annotation::Error => "error",
            Annotation::Void => "void",
            Annotation::Transient => "transient",
            Annotation::Pinned => "pinned",
            Annotation::Type => "type",
            Annotation::Custom(label) => label,
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnnotationValue {
    /// The annotation is present without a value (`@void`).
    Set,
    Bool(bool),
    Int(i64),
    String(String),
}

impl AnnotationValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnnotationValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AnnotationValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// `Set` and `Bool(true)` switch a flag-like annotation on.
    pub fn is_on(&self) -> bool {
        matches!(self, AnnotationValue::Set | AnnotationValue::Bool(true))
    }
}

impl fmt::Display for AnnotationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationValue::Set => Ok(()),
            AnnotationValue::Bool(b) => write!(f, "({b})"),
            AnnotationValue::Int(i) => write!(f, "({i})"),
            AnnotationValue::String(s) => write!(f, "({s:?})"),
        }
    }
}

impl From<&str> for AnnotationValue {
    fn from(value: &str) -> Self {
        AnnotationValue::String(value.to_string())
    }
}

impl From<String> for AnnotationValue {
    fn from(value: String) -> Self {
        AnnotationValue::String(value)
    }
}

impl From<bool> for AnnotationValue {
    fn from(value: bool) -> Self {
        AnnotationValue::Bool(value)
    }
}

impl From<i64> for AnnotationValue {
    fn from(value: i64) -> Self {
        AnnotationValue::Int(value)
    }
}

/// Map from annotation kind to its value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    entries: BTreeMap<Annotation, AnnotationValue>,
}

impl Annotations {
    pub fn new() -> Self {
        Annotations::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, annotation: Annotation, value: impl Into<AnnotationValue>) -> Self {
        self.insert(annotation, value);
        self
    }

    /// Builder-style insert of a value-less annotation.
    pub fn with_flag(self, annotation: Annotation) -> Self {
        self.with(annotation, AnnotationValue::Set)
    }

    /// Set `annotation`, returning the value it replaces.
    pub fn insert(&mut self, annotation: Annotation, value: impl Into<AnnotationValue>) -> Option<AnnotationValue> {
        self.entries.insert(annotation, value.into())
    }

    pub fn remove(&mut self, annotation: &Annotation) -> Option<AnnotationValue> {
        self.entries.remove(annotation)
    }

    pub fn get(&self, annotation: &Annotation) -> Option<&AnnotationValue> {
        self.entries.get(annotation)
    }

    pub fn contains(&self, annotation: &Annotation) -> bool {
        self.entries.contains_key(annotation)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Annotation, &AnnotationValue)> {
        self.entries.iter()
    }

    /// Copy of `self` with every entry of `other` applied on top.
    pub fn merged(&self, other: &Annotations) -> Annotations {
        let mut merged = self.clone();
        for (annotation, value) in other.iter() {
            merged.entries.insert(annotation.clone(), value.clone());
        }
        merged
    }

    pub fn token(&self) -> Option<Token> {
        self.get(&Annotation::Token).and_then(AnnotationValue::as_str).map(Token::new)
    }

    pub fn error(&self) -> Option<&str> {
        self.get(&Annotation::Error).and_then(AnnotationValue::as_str)
    }

    pub fn type_hint(&self) -> Option<&str> {
        self.get(&Annotation::Type).and_then(AnnotationValue::as_str)
    }

    pub fn is_void(&self) -> bool {
        self.flag(&Annotation::Void)
    }

    pub fn is_transient(&self) -> bool {
        self.flag(&Annotation::Transient)
    }

    pub fn is_pinned(&self) -> bool {
        self.flag(&Annotation::Pinned)
    }

    fn flag(&self, annotation: &Annotation) -> bool {
        self.get(annotation).is_some_and(AnnotationValue::is_on)
    }
}

impl FromIterator<(Annotation, AnnotationValue)> for Annotations {
    fn from_iter<I: IntoIterator<Item = (Annotation, AnnotationValue)>>(iter: I) -> Self {
        Annotations { entries: iter.into_iter().collect() }
    }
}

impl fmt::Display for Annotations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (annotation, value) in &self.entries {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "{annotation}{value}")?;
        }
        Ok(())
    }
}
