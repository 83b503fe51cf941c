//! The plant-care corpus: profile schema, default seed data, and loading.
//!
//! On first run the default corpus is written to disk so deployments can
//! edit it; afterwards the file is the source of truth.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// One plant's care profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantProfile {
    pub name: String,
    pub water_frequency: String,
    pub sunlight: String,
    pub soil: String,
    pub tips: String,
}

impl PlantProfile {
    /// Render the profile as a retrievable document.
    pub fn document(&self) -> String {
        format!(
            "{}: Water {}, Sunlight: {}, Soil: {}, Tips: {}",
            self.name, self.water_frequency, self.sunlight, self.soil, self.tips
        )
    }
}

/// The built-in seed corpus.
pub fn default_corpus() -> Vec<PlantProfile> {
    vec![
        PlantProfile {
            name: "Tomato".into(),
            water_frequency: "every 2-3 days".into(),
            sunlight: "6-8 hours daily".into(),
            soil: "well-draining, pH 6.0-6.8".into(),
            tips: "Support with stakes, prune suckers regularly".into(),
        },
        PlantProfile {
            name: "Basil".into(),
            water_frequency: "daily in hot weather".into(),
            sunlight: "6 hours daily".into(),
            soil: "rich, moist, well-draining".into(),
            tips: "Pinch flowers to encourage leaf growth".into(),
        },
        PlantProfile {
            name: "Rose".into(),
            water_frequency: "2-3 times per week".into(),
            sunlight: "6+ hours daily".into(),
            soil: "loamy, pH 6.0-7.0".into(),
            tips: "Deadhead spent blooms, fertilize monthly".into(),
        },
        PlantProfile {
            name: "Cactus".into(),
            water_frequency: "every 2-3 weeks".into(),
            sunlight: "bright indirect light".into(),
            soil: "sandy, well-draining cactus mix".into(),
            tips: "Avoid overwatering, ensure drainage holes".into(),
        },
        PlantProfile {
            name: "Orchid".into(),
            water_frequency: "once a week".into(),
            sunlight: "bright indirect light".into(),
            soil: "bark-based orchid mix".into(),
            tips: "Mist leaves, avoid water on flowers".into(),
        },
    ]
}

/// Load the corpus from `path`, seeding it with the defaults when the
/// file does not exist yet.
pub fn load_or_seed(path: &Path) -> std::io::Result<Vec<PlantProfile>> {
    if !path.exists() {
        let corpus = default_corpus();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&corpus)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        std::fs::write(path, json)?;
        info!(path = %path.display(), plants = corpus.len(), "Seeded default plant corpus");
        return Ok(corpus);
    }

    let content = std::fs::read_to_string(path)?;
    let corpus: Vec<PlantProfile> =
        serde_json::from_str(&content).map_err(|e| std::io::Error::other(e.to_string()))?;
    debug!(path = %path.display(), plants = corpus.len(), "Plant corpus loaded");
    Ok(corpus)
}
