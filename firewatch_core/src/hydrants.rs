// firewatch_core/src/hydrants.rs

//! Static infrastructure shown alongside the hazards.

use serde::Deserialize;

use crate::types::LatLng;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum HydrantCondition {
    Operational,
    Unserviceable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum WaterPressure {
    Low,
    High,
    #[serde(rename = "N/A")]
    Unknown,
}

impl WaterPressure {
    pub fn label(&self) -> &'static str {
        match self {
            WaterPressure::Low => "Low",
            WaterPressure::High => "High",
            WaterPressure::Unknown => "N/A",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Hydrant {
    pub lat: f64,
    pub lng: f64,
    pub condition: HydrantCondition,
    pub pressure: WaterPressure,
}

impl Hydrant {
    pub fn location(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }

    pub fn is_operational(&self) -> bool {
        self.condition == HydrantCondition::Operational
    }
}

/// The surveyed hydrants around the Santa Cruz, Laguna town proper.
pub fn santa_cruz_hydrants() -> Vec<Hydrant> {
    use HydrantCondition::{Operational, Unserviceable};
    use WaterPressure::{High, Low, Unknown};

    [
        (14.280248, 121.394529, Operational, Low),
        (14.280069, 121.394703, Operational, High),
        (14.273128, 121.400478, Operational, High),
        (14.271956, 121.399617, Operational, High),
        (14.27774, 121.411473, Operational, Low),
        (14.253727, 121.380829, Operational, High),
        (14.278958, 121.415888, Operational, High),
        (14.286795, 121.411203, Operational, Low),
        (14.287409, 121.411705, Operational, Low),
        (14.277512, 121.419285, Unserviceable, Unknown),
    ]
    .into_iter()
    .map(|(lat, lng, condition, pressure)| Hydrant {
        lat,
        lng,
        condition,
        pressure,
    })
    .collect()
}
