//! Static crop profiles and advisory tips.
//!
//! Values are kg/acre. Lookup is by exact (case-sensitive) crop name; any other
//! name gets `DEFAULT_PROFILE`.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::domain::{CropProfile, YieldCategory};

pub const DEFAULT_PROFILE: CropProfile = CropProfile {
    baseline: 800.0,
    min: 300.0,
    max: 2000.0,
};

/// Crops with a dedicated profile, in display order.
pub const KNOWN_CROPS: [&str; 5] = ["Maize", "Rice", "Beans", "Cassava", "Sorghum"];

static PROFILES: LazyLock<HashMap<&'static str, CropProfile>> = LazyLock::new(|| {
    HashMap::from([
        ("Maize", profile(650.0, 250.0, 1600.0)),
        ("Rice", profile(1200.0, 400.0, 2400.0)),
        ("Beans", profile(400.0, 150.0, 1000.0)),
        ("Cassava", profile(4000.0, 2000.0, 10000.0)),
        ("Sorghum", profile(500.0, 200.0, 1200.0)),
    ])
});

const LOW_TIPS: [&str; 3] = [
    "Add compost/manure and apply recommended fertilizer rates.",
    "Plant on time and keep proper spacing.",
    "Weed early and control pests/diseases quickly.",
];

const MEDIUM_TIPS: [&str; 3] = [
    "Keep regular weeding and correct spacing.",
    "Top-dress fertilizer at the correct growth stage.",
    "Monitor pests/diseases weekly.",
];

const HIGH_TIPS: [&str; 3] = [
    "Keep records (seed type, fertilizer, dates) to repeat success.",
    "Harvest on time and dry/store properly to reduce losses.",
    "Maintain the best practices that worked.",
];

const fn profile(baseline: f64, min: f64, max: f64) -> CropProfile {
    CropProfile { baseline, min, max }
}

/// Profile for `crop_name`, or the default profile.
pub fn profile_for(crop_name: &str) -> CropProfile {
    lookup_profile(crop_name).unwrap_or(DEFAULT_PROFILE)
}

/// Profile for `crop_name` only if the crop is known.
pub fn lookup_profile(crop_name: &str) -> Option<CropProfile> {
    PROFILES.get(crop_name).copied()
}

pub fn tips_for(category: YieldCategory) -> &'static [&'static str; 3] {
    match category {
        YieldCategory::Low => &LOW_TIPS,
        YieldCategory::Medium => &MEDIUM_TIPS,
        YieldCategory::High => &HIGH_TIPS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_crops_all_have_profiles() {
        for name in KNOWN_CROPS {
            let p = lookup_profile(name).unwrap();
            assert!(p.min < p.baseline && p.baseline < p.max, "{name}: {p:?}");
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert_eq!(profile_for("Maize").baseline, 650.0);
        assert_eq!(profile_for("maize"), DEFAULT_PROFILE);
        assert_eq!(profile_for("Okra"), DEFAULT_PROFILE);
    }

    #[test]
    fn each_category_has_three_tips() {
        for category in [YieldCategory::Low, YieldCategory::Medium, YieldCategory::High] {
            assert_eq!(tips_for(category).len(), 3);
        }
        assert!(tips_for(YieldCategory::High)[0].starts_with("Keep records"));
    }
}
