//! Class database loading and the derived-template caches.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::cldb::{ClassDatabase, ClassPackage, LEGACY_SCRIPT_CLASS_ID};
use crate::instance::AssetsFileInstance;
use crate::sync::SyncMap;
use crate::util::{AssetReader, EngineVersion, ReadSeek, Result};

use super::template::{RefTypeLookup, TemplateField, TypeReference};
use super::AssetsManager;

impl AssetsManager {
    /// The active class database, if one is loaded.
    pub fn class_database(&self) -> Option<Arc<ClassDatabase>> {
        self.class_database.read().clone()
    }

    /// The active class package, if one is loaded.
    pub fn class_package(&self) -> Option<Arc<ClassPackage>> {
        self.class_package.read().clone()
    }

    /// Decode a class database from a stream and make it the active
    /// one. At most one is active; the previous database is replaced.
    pub fn load_class_database<R: ReadSeek>(&self, stream: R) -> Result<Arc<ClassDatabase>> {
        let db = Arc::new(ClassDatabase::read(&mut AssetReader::new(stream))?);
        *self.class_database.write() = Some(Arc::clone(&db));
        debug!(classes = db.classes.len(), "class database activated");
        Ok(db)
    }

    /// Load a class database from disk by path.
    pub fn load_class_database_path(&self, path: impl AsRef<Path>) -> Result<Arc<ClassDatabase>> {
        self.load_class_database(File::open(path)?)
    }

    /// Decode a class package from a stream and make it the active one.
    pub fn load_class_package<R: ReadSeek>(&self, stream: R) -> Result<Arc<ClassPackage>> {
        let pkg = Arc::new(ClassPackage::read(&mut AssetReader::new(stream))?);
        *self.class_package.write() = Some(Arc::clone(&pkg));
        debug!(entries = pkg.len(), "class package activated");
        Ok(pkg)
    }

    /// Load a class package from disk by path.
    pub fn load_class_package_path(&self, path: impl AsRef<Path>) -> Result<Arc<ClassPackage>> {
        self.load_class_package(File::open(path)?)
    }

    /// Select a database for `version` from the active package and make
    /// it the active database. `None` when no package is loaded or no
    /// entry covers the version.
    pub fn load_class_database_from_package(
        &self,
        version: EngineVersion,
    ) -> Result<Option<Arc<ClassDatabase>>> {
        let pkg = match self.class_package() {
            Some(pkg) => pkg,
            None => return Ok(None),
        };
        match pkg.database_for(version)? {
            Some(db) => {
                *self.class_database.write() = Some(Arc::clone(&db));
                debug!(%version, "class database activated from package");
                Ok(Some(db))
            }
            None => Ok(None),
        }
    }

    /// Template for a class id, derived from the active database
    /// through the global template cache. Negative ids share the legacy
    /// sentinel's entry. `None` when no database is active or the id is
    /// unknown.
    pub fn template_field_for_class(
        &self,
        class_id: i32,
        prefer_editor: bool,
    ) -> Result<Option<Arc<TemplateField>>> {
        let db = match self.class_database() {
            Some(db) => db,
            None => return Ok(None),
        };
        let key = if class_id < 0 {
            LEGACY_SCRIPT_CLASS_ID
        } else {
            class_id
        };
        if let Some(field) = self.template_cache.get(&key) {
            return Ok(Some(field));
        }
        let record = match db.find_class_by_id(key) {
            Some(record) => record,
            None => return Ok(None),
        };
        match TemplateField::from_record(&db, record, prefer_editor)? {
            Some(field) => Ok(Some(
                self.template_cache.get_or_insert_with(key, || Arc::new(field)),
            )),
            None => Ok(None),
        }
    }

    /// Template for a scripted reference type, through the global
    /// script-template cache. Misses are memoized.
    pub fn template_field_for_reference(
        &self,
        reference: &TypeReference,
        prefer_editor: bool,
    ) -> Result<Option<Arc<TemplateField>>> {
        let db = match self.class_database() {
            Some(db) => db,
            None => return Ok(None),
        };
        self.script_template_cache
            .get_or_try_insert_with(reference.clone(), || {
                match db.find_class_by_name(&reference.class_name) {
                    Some(record) => Ok(TemplateField::from_record(&db, record, prefer_editor)?
                        .map(Arc::new)),
                    None => Ok(None),
                }
            })
    }

    /// Template for an instance's type id, through the per-instance
    /// type-tree cache. The object table maps the type id to a class.
    pub fn template_field_for_type_id(
        &self,
        inst: &Arc<AssetsFileInstance>,
        type_id: u16,
        prefer_editor: bool,
    ) -> Result<Option<Arc<TemplateField>>> {
        let key = Self::lookup_key(inst.path());
        let per_instance = self
            .type_tree_template_cache
            .get_or_insert_with(key, || Arc::new(SyncMap::new()));

        per_instance.get_or_try_insert_with(type_id, || {
            let class_id = inst.with_file(|f| {
                f.objects
                    .iter()
                    .find(|o| o.type_id == type_id)
                    .map(|o| o.class_id)
            })?;
            match class_id {
                Some(id) => self.template_field_for_class(id, prefer_editor),
                None => Ok(None),
            }
        })
    }

    /// Template for one object of an instance, by its unique path id,
    /// through the per-instance script-id cache.
    pub fn template_field_for_path_id(
        &self,
        inst: &Arc<AssetsFileInstance>,
        path_id: i64,
        prefer_editor: bool,
    ) -> Result<Option<Arc<TemplateField>>> {
        let key = Self::lookup_key(inst.path());
        let per_instance = self
            .script_id_template_cache
            .get_or_insert_with(key, || Arc::new(SyncMap::new()));

        per_instance.get_or_try_insert_with(path_id, || {
            let class_id = inst.with_file(|f| {
                f.objects
                    .iter()
                    .find(|o| o.path_id == path_id)
                    .map(|o| o.class_id)
            })?;
            match class_id {
                Some(id) => self.template_field_for_class(id, prefer_editor),
                None => Ok(None),
            }
        })
    }

    /// The per-instance reference-type lookup, created on first use.
    pub fn ref_type_lookup(&self, inst: &Arc<AssetsFileInstance>) -> Arc<RefTypeLookup> {
        let key = Self::lookup_key(inst.path());
        self.ref_type_cache
            .get_or_insert_with(key, || Arc::new(RefTypeLookup::new()))
    }
}
