//! Crop and harvest record storage.
//!
//! ## Table of Contents
//! - **FarmRepository**: the storage contract used by the CLI, the TUI and the
//!   prediction pipeline
//! - **InMemoryStore**: the reference implementation (also used in tests)
//! - **JsonFileStore**: an `InMemoryStore` persisted to a JSON document
//!
//! Every operation is scoped by owner. A record owned by somebody else behaves
//! exactly like a missing one.

use std::collections::HashMap;

use crate::domain::{
    Crop, CropPatch, Harvest, HarvestFilter, HarvestPatch, HarvestRecord, HistoricalRecord,
    NewCrop, NewHarvest, UserId,
};
use crate::error::StoreError;

pub mod json;
pub mod memory;

pub use json::JsonFileStore;
pub use memory::{FarmData, InMemoryStore};

pub trait FarmRepository {
    fn create_crop(&mut self, owner: UserId, new: NewCrop) -> Result<Crop, StoreError>;

    /// Crops of `owner`, most recent planting first.
    fn list_crops(&self, owner: UserId) -> Result<Vec<Crop>, StoreError>;

    fn get_crop(&self, owner: UserId, id: u64) -> Result<Crop, StoreError>;

    fn update_crop(&mut self, owner: UserId, id: u64, patch: CropPatch)
        -> Result<Crop, StoreError>;

    /// Delete a crop and its harvests. Returns the number of harvests removed.
    fn delete_crop(&mut self, owner: UserId, id: u64) -> Result<usize, StoreError>;

    fn create_harvest(
        &mut self,
        owner: UserId,
        crop_id: u64,
        new: NewHarvest,
    ) -> Result<Harvest, StoreError>;

    /// Harvests matching `filter`, newest first, joined with their crop name.
    fn list_harvests(&self, filter: &HarvestFilter) -> Result<Vec<HarvestRecord>, StoreError>;

    fn update_harvest(
        &mut self,
        owner: UserId,
        id: u64,
        patch: HarvestPatch,
    ) -> Result<Harvest, StoreError>;

    fn delete_harvest(&mut self, owner: UserId, id: u64) -> Result<(), StoreError>;

    /// Training history for `crop_name`: every harvest of the owner's crops with
    /// exactly that name, as `(planting month, crop area, harvested amount)`.
    ///
    /// Rows with a non-positive area or yield are left out.
    fn training_records(
        &self,
        owner: UserId,
        crop_name: &str,
    ) -> Result<Vec<HistoricalRecord>, StoreError> {
        let crops: HashMap<u64, Crop> = self
            .list_crops(owner)?
            .into_iter()
            .filter(|c| c.name == crop_name)
            .map(|c| (c.id, c))
            .collect();

        if crops.is_empty() {
            return Ok(Vec::new());
        }

        let records = self
            .list_harvests(&HarvestFilter::for_owner(owner))?
            .into_iter()
            .filter_map(|h| {
                let crop = crops.get(&h.crop_id)?;
                (crop.area > 0.0 && h.yield_amount > 0.0).then(|| HistoricalRecord {
                    month: crop.planting_month(),
                    area: crop.area,
                    yield_amount: h.yield_amount,
                })
            })
            .collect();

        Ok(records)
    }
}
