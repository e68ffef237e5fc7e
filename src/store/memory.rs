use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::FarmRepository;
use crate::domain::{
    validate_area, validate_crop_name, validate_yield, Crop, CropPatch, Harvest, HarvestFilter,
    HarvestPatch, HarvestRecord, NewCrop, NewHarvest, UserId,
};
use crate::error::StoreError;

pub const STORE_TOOL: &str = "farm-yield";

/// The whole record set, as written to the JSON store file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmData {
    pub tool: String,
    pub next_crop_id: u64,
    pub next_harvest_id: u64,
    pub crops: Vec<Crop>,
    pub harvests: Vec<Harvest>,
}

impl Default for FarmData {
    fn default() -> Self {
        Self {
            tool: STORE_TOOL.to_string(),
            next_crop_id: 1,
            next_harvest_id: 1,
            crops: Vec::new(),
            harvests: Vec::new(),
        }
    }
}

/// Records held in memory, keyed by id.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    next_crop_id: u64,
    next_harvest_id: u64,
    crops: BTreeMap<u64, Crop>,
    harvests: BTreeMap<u64, Harvest>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::from_data(FarmData::default())
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a loaded document.
    ///
    /// Id counters never go backwards past an existing record, even if the
    /// document's counters were edited by hand.
    pub fn from_data(data: FarmData) -> Self {
        let crops: BTreeMap<u64, Crop> = data.crops.into_iter().map(|c| (c.id, c)).collect();
        let harvests: BTreeMap<u64, Harvest> =
            data.harvests.into_iter().map(|h| (h.id, h)).collect();

        let max_crop = crops.keys().next_back().copied().unwrap_or(0);
        let max_harvest = harvests.keys().next_back().copied().unwrap_or(0);

        Self {
            next_crop_id: data.next_crop_id.max(max_crop + 1),
            next_harvest_id: data.next_harvest_id.max(max_harvest + 1),
            crops,
            harvests,
        }
    }

    pub fn to_data(&self) -> FarmData {
        FarmData {
            tool: STORE_TOOL.to_string(),
            next_crop_id: self.next_crop_id,
            next_harvest_id: self.next_harvest_id,
            crops: self.crops.values().cloned().collect(),
            harvests: self.harvests.values().cloned().collect(),
        }
    }

    pub fn crop_count(&self) -> usize {
        self.crops.len()
    }

    pub fn harvest_count(&self) -> usize {
        self.harvests.len()
    }

    fn owned_crop(&self, owner: UserId, id: u64) -> Result<&Crop, StoreError> {
        self.crops
            .get(&id)
            .filter(|c| c.owner == owner)
            .ok_or(StoreError::CropNotFound { id })
    }

    fn owned_harvest_mut(&mut self, owner: UserId, id: u64) -> Result<&mut Harvest, StoreError> {
        let crops = &self.crops;
        self.harvests
            .get_mut(&id)
            .filter(|h| crops.get(&h.crop_id).is_some_and(|c| c.owner == owner))
            .ok_or(StoreError::HarvestNotFound { id })
    }
}

fn empty_patch() -> StoreError {
    StoreError::invalid("update", "no fields to update")
}

impl FarmRepository for InMemoryStore {
    fn create_crop(&mut self, owner: UserId, new: NewCrop) -> Result<Crop, StoreError> {
        let new = new.validated()?;
        let crop = Crop {
            id: self.next_crop_id,
            owner,
            name: new.name,
            area: new.area,
            planting_date: new.planting_date,
        };
        self.next_crop_id += 1;

        info!(owner, crop_id = crop.id, name = %crop.name, "crop created");
        self.crops.insert(crop.id, crop.clone());
        Ok(crop)
    }

    fn list_crops(&self, owner: UserId) -> Result<Vec<Crop>, StoreError> {
        let mut crops: Vec<Crop> = self
            .crops
            .values()
            .filter(|c| c.owner == owner)
            .cloned()
            .collect();
        crops.sort_by(|a, b| b.planting_date.cmp(&a.planting_date).then(b.id.cmp(&a.id)));
        Ok(crops)
    }

    fn get_crop(&self, owner: UserId, id: u64) -> Result<Crop, StoreError> {
        self.owned_crop(owner, id).cloned()
    }

    fn update_crop(
        &mut self,
        owner: UserId,
        id: u64,
        patch: CropPatch,
    ) -> Result<Crop, StoreError> {
        if patch.is_empty() {
            return Err(empty_patch());
        }
        self.owned_crop(owner, id)?;

        let name = patch.name.as_deref().map(validate_crop_name).transpose()?;
        let area = patch.area.map(validate_area).transpose()?;

        let crop = self
            .crops
            .get_mut(&id)
            .ok_or(StoreError::CropNotFound { id })?;
        if let Some(name) = name {
            crop.name = name;
        }
        if let Some(area) = area {
            crop.area = area;
        }
        if let Some(date) = patch.planting_date {
            crop.planting_date = date;
        }

        info!(owner, crop_id = id, "crop updated");
        Ok(crop.clone())
    }

    fn delete_crop(&mut self, owner: UserId, id: u64) -> Result<usize, StoreError> {
        self.owned_crop(owner, id)?;
        self.crops.remove(&id);

        let before = self.harvests.len();
        self.harvests.retain(|_, h| h.crop_id != id);
        let removed = before - self.harvests.len();

        info!(owner, crop_id = id, harvests = removed, "crop deleted");
        Ok(removed)
    }

    fn create_harvest(
        &mut self,
        owner: UserId,
        crop_id: u64,
        new: NewHarvest,
    ) -> Result<Harvest, StoreError> {
        self.owned_crop(owner, crop_id)?;
        let new = new.validated()?;

        let harvest = Harvest {
            id: self.next_harvest_id,
            crop_id,
            date: new.date,
            yield_amount: new.yield_amount,
        };
        self.next_harvest_id += 1;

        info!(owner, crop_id, harvest_id = harvest.id, "harvest recorded");
        self.harvests.insert(harvest.id, harvest.clone());
        Ok(harvest)
    }

    fn list_harvests(&self, filter: &HarvestFilter) -> Result<Vec<HarvestRecord>, StoreError> {
        let mut rows: Vec<HarvestRecord> = self
            .harvests
            .values()
            .filter(|h| filter.crop_id.is_none_or(|id| h.crop_id == id))
            .filter(|h| filter.matches_date(h.date))
            .filter_map(|h| {
                let crop = self.crops.get(&h.crop_id)?;
                (crop.owner == filter.owner).then(|| HarvestRecord {
                    id: h.id,
                    crop_id: h.crop_id,
                    crop_name: crop.name.clone(),
                    date: h.date,
                    yield_amount: h.yield_amount,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    fn update_harvest(
        &mut self,
        owner: UserId,
        id: u64,
        patch: HarvestPatch,
    ) -> Result<Harvest, StoreError> {
        if patch.is_empty() {
            return Err(empty_patch());
        }
        let harvest = self.owned_harvest_mut(owner, id)?;
        let yield_amount = patch.yield_amount.map(validate_yield).transpose()?;

        if let Some(date) = patch.date {
            harvest.date = date;
        }
        if let Some(amount) = yield_amount {
            harvest.yield_amount = amount;
        }

        info!(owner, harvest_id = id, "harvest updated");
        Ok(harvest.clone())
    }

    fn delete_harvest(&mut self, owner: UserId, id: u64) -> Result<(), StoreError> {
        self.owned_harvest_mut(owner, id)?;
        self.harvests.remove(&id);
        info!(owner, harvest_id = id, "harvest deleted");
        Ok(())
    }
}
