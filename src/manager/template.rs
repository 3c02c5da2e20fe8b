//! Derived schema templates and reference-type keys.
//!
//! A [`TemplateField`] is the flat, name-resolved form of a class
//! database tree node — the value the manager's derived caches hold.

use std::sync::Arc;

use crate::cldb::{ClassDatabase, ClassRecord, TypeNode};
use crate::sync::SyncMap;
use crate::util::{Error, Result};

/// Bit in `TypeNode::type_flags` marking an array field.
pub const TYPE_FLAG_ARRAY: u8 = 1;

/// A resolved field-layout template derived from a class database node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateField {
    pub name: String,
    pub type_name: String,
    pub byte_size: i32,
    pub version: u16,
    pub is_array: bool,
    pub children: Vec<TemplateField>,
}

impl TemplateField {
    /// Derive a template from one tree node, resolving names through
    /// the database's string table.
    pub fn from_node(db: &ClassDatabase, node: &TypeNode) -> Result<Self> {
        let type_name = db
            .get_string(node.type_name)
            .ok_or_else(|| Error::invalid(format!("type name index {} out of range", node.type_name)))?
            .to_owned();
        let name = db
            .get_string(node.field_name)
            .ok_or_else(|| {
                Error::invalid(format!("field name index {} out of range", node.field_name))
            })?
            .to_owned();

        let mut children = Vec::with_capacity(node.children.len());
        for child in &node.children {
            children.push(TemplateField::from_node(db, child)?);
        }

        Ok(Self {
            name,
            type_name,
            byte_size: node.byte_size,
            version: node.version,
            is_array: node.type_flags & TYPE_FLAG_ARRAY != 0,
            children,
        })
    }

    /// Derive a template from a class record's preferred tree variant.
    /// `None` when the record carries no tree at all.
    pub fn from_record(
        db: &ClassDatabase,
        record: &ClassRecord,
        prefer_editor: bool,
    ) -> Result<Option<Self>> {
        match record.variants.preferred(prefer_editor) {
            Some(node) => Ok(Some(Self::from_node(db, node)?)),
            None => Ok(None),
        }
    }
}

/// Composite key identifying a scripted reference type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeReference {
    pub class_name: String,
    pub namespace: String,
    pub assembly: String,
}

impl TypeReference {
    pub fn new(
        class_name: impl Into<String>,
        namespace: impl Into<String>,
        assembly: impl Into<String>,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            namespace: namespace.into(),
            assembly: assembly.into(),
        }
    }
}

/// Per-instance index resolving reference types to templates, built
/// lazily against the active class database.
pub struct RefTypeLookup {
    templates: SyncMap<TypeReference, Option<Arc<TemplateField>>>,
}

impl RefTypeLookup {
    pub fn new() -> Self {
        Self {
            templates: SyncMap::new(),
        }
    }

    /// Resolve a reference type by class name. Misses (no such class,
    /// or a class without trees) are memoized as `None`.
    pub fn resolve(
        &self,
        db: &ClassDatabase,
        reference: &TypeReference,
        prefer_editor: bool,
    ) -> Result<Option<Arc<TemplateField>>> {
        self.templates
            .get_or_try_insert_with(reference.clone(), || {
                match db.find_class_by_name(&reference.class_name) {
                    Some(record) => Ok(TemplateField::from_record(db, record, prefer_editor)?
                        .map(Arc::new)),
                    None => Ok(None),
                }
            })
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

impl Default for RefTypeLookup {
    fn default() -> Self {
        Self::new()
    }
}
