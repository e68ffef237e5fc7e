//! JSON-file persistence for the record store.
//!
//! The file is read once on `open` and rewritten on `flush`. Writes go through
//! a temp file in the same directory followed by a rename, so a crash never
//! leaves a half-written store behind.

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use super::{FarmData, FarmRepository, InMemoryStore};
use crate::domain::{
    Crop, CropPatch, Harvest, HarvestFilter, HarvestPatch, HarvestRecord, NewCrop, NewHarvest,
    UserId,
};
use crate::error::StoreError;

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: InMemoryStore,
    dirty: bool,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file is an empty store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let data = match fs::read_to_string(&path) {
            Ok(contents) => {
                serde_json::from_str::<FarmData>(&contents).map_err(|source| {
                    StoreError::Format {
                        path: path.display().to_string(),
                        source,
                    }
                })?
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => FarmData::default(),
            Err(source) => {
                return Err(StoreError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };

        info!(
            path = %path.display(),
            crops = data.crops.len(),
            harvests = data.harvests.len(),
            "store opened"
        );

        Ok(Self {
            path,
            inner: InMemoryStore::from_data(data),
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn inner(&self) -> &InMemoryStore {
        &self.inner
    }

    /// Write pending changes to disk. A no-op when nothing changed.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        if !self.dirty {
            return Ok(());
        }
        write_atomic(&self.path, &self.inner.to_data())?;
        self.dirty = false;
        debug!(path = %self.path.display(), "store flushed");
        Ok(())
    }

    fn mark<T>(&mut self, result: Result<T, StoreError>) -> Result<T, StoreError> {
        if result.is_ok() {
            self.dirty = true;
        }
        result
    }
}

/// Serialize `data` to `path` via a temp file and rename.
pub fn write_atomic(path: &Path, data: &FarmData) -> Result<(), StoreError> {
    let io_err = |source: std::io::Error| StoreError::Io {
        path: path.display().to_string(),
        source,
    };

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(io_err)?;

    let temp = NamedTempFile::new_in(parent).map_err(io_err)?;
    {
        let mut writer = BufWriter::new(temp.as_file());
        serde_json::to_writer_pretty(&mut writer, data).map_err(|source| StoreError::Format {
            path: path.display().to_string(),
            source,
        })?;
        writer.write_all(b"\n").map_err(io_err)?;
        writer.flush().map_err(io_err)?;
    }

    temp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

impl FarmRepository for JsonFileStore {
    fn create_crop(&mut self, owner: UserId, new: NewCrop) -> Result<Crop, StoreError> {
        let result = self.inner.create_crop(owner, new);
        self.mark(result)
    }

    fn list_crops(&self, owner: UserId) -> Result<Vec<Crop>, StoreError> {
        self.inner.list_crops(owner)
    }

    fn get_crop(&self, owner: UserId, id: u64) -> Result<Crop, StoreError> {
        self.inner.get_crop(owner, id)
    }

    fn update_crop(
        &mut self,
        owner: UserId,
        id: u64,
        patch: CropPatch,
    ) -> Result<Crop, StoreError> {
        let result = self.inner.update_crop(owner, id, patch);
        self.mark(result)
    }

    fn delete_crop(&mut self, owner: UserId, id: u64) -> Result<usize, StoreError> {
        let result = self.inner.delete_crop(owner, id);
        self.mark(result)
    }

    fn create_harvest(
        &mut self,
        owner: UserId,
        crop_id: u64,
        new: NewHarvest,
    ) -> Result<Harvest, StoreError> {
        let result = self.inner.create_harvest(owner, crop_id, new);
        self.mark(result)
    }

    fn list_harvests(&self, filter: &HarvestFilter) -> Result<Vec<HarvestRecord>, StoreError> {
        self.inner.list_harvests(filter)
    }

    fn update_harvest(
        &mut self,
        owner: UserId,
        id: u64,
        patch: HarvestPatch,
    ) -> Result<Harvest, StoreError> {
        let result = self.inner.update_harvest(owner, id, patch);
        self.mark(result)
    }

    fn delete_harvest(&mut self, owner: UserId, id: u64) -> Result<(), StoreError> {
        let result = self.inner.delete_harvest(owner, id);
        self.mark(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path().join("farm.json")).unwrap();
        assert_eq!(store.inner().crop_count(), 0);
        assert!(!store.is_dirty());
    }

    #[test]
    fn flush_and_reopen_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("farm.json");

        let mut store = JsonFileStore::open(&path).unwrap();
        let crop = store
            .create_crop(
                1,
                NewCrop {
                    name: "Rice".into(),
                    area: 1.5,
                    planting_date: date(2024, 10, 2),
                },
            )
            .unwrap();
        store
            .create_harvest(
                1,
                crop.id,
                NewHarvest {
                    date: date(2025, 2, 20),
                    yield_amount: 1800.0,
                },
            )
            .unwrap();
        assert!(store.is_dirty());
        store.flush().unwrap();
        assert!(!store.is_dirty());

        let reopened = JsonFileStore::open(&path).unwrap();
        assert_eq!(reopened.get_crop(1, crop.id).unwrap(), crop);
        let rows = reopened.list_harvests(&HarvestFilter::for_owner(1)).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].crop_name, "Rice");

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["tool"], "farm-yield");
        assert_eq!(raw["next_crop_id"], 2);
        assert_eq!(raw["crops"][0]["planting_date"], "2024-10-02");
    }

    #[test]
    fn failed_mutation_does_not_dirty_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = JsonFileStore::open(dir.path().join("farm.json")).unwrap();
        assert!(store.delete_crop(1, 42).is_err());
        assert!(!store.is_dirty());
        store.flush().unwrap();
        assert!(!dir.path().join("farm.json").exists());
    }

    #[test]
    fn corrupt_file_is_a_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("farm.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            JsonFileStore::open(&path),
            Err(StoreError::Format { .. })
        ));
    }
}
