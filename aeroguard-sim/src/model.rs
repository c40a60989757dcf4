use serde::{Deserialize, Serialize};
use std::fmt;

/// CFU/m³ au-delà duquel une salle est au moins `Moderate`.
pub const CFU_MODERATE: u32 = 250;
/// CFU/m³ au-delà duquel une salle est `Poor`.
pub const CFU_HIGH: u32 = 750;

/// Relevé environnemental avec ses extrêmes sur 24h.
///
/// Les trois valeurs sont tirées indépendamment : `min_24h <= current <= max_24h`
/// n'est pas garanti.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvParameter {
    pub current: u32,
    #[serde(rename = "max24h")]
    pub max_24h: u32,
    #[serde(rename = "min24h")]
    pub min_24h: u32,
    pub unit: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfuThresholds {
    pub moderate: u32,
    pub high: u32,
}

impl Default for CfuThresholds {
    fn default() -> Self {
        Self { moderate: CFU_MODERATE, high: CFU_HIGH }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BacterialLoad {
    pub current: u32,
    pub threshold: CfuThresholds,
}

impl BacterialLoad {
    pub fn new(current: u32) -> Self {
        Self { current, threshold: CfuThresholds::default() }
    }

    /// Badge HIGH/OK de l'affichage.
    pub fn is_high(&self) -> bool {
        self.current > self.threshold.high
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HealthStatus {
    Good,
    Moderate,
    Poor,
}

impl HealthStatus {
    pub fn classify(cfu: u32) -> Self {
        if cfu > CFU_HIGH {
            HealthStatus::Poor
        } else if cfu > CFU_MODERATE {
            HealthStatus::Moderate
        } else {
            HealthStatus::Good
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HealthStatus::Good => "Good",
            HealthStatus::Moderate => "Moderate",
            HealthStatus::Poor => "Poor",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UvSterilization {
    Active,
    Inactive,
}

impl UvSterilization {
    /// UV actif uniquement quand la salle est `Poor`.
    pub fn for_health(health: HealthStatus) -> Self {
        if health == HealthStatus::Poor {
            UvSterilization::Active
        } else {
            UvSterilization::Inactive
        }
    }
}

impl fmt::Display for UvSterilization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UvSterilization::Active => f.write_str("Active"),
            UvSterilization::Inactive => f.write_str("Inactive"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub overall_health: HealthStatus,
    /// Renouvellements d'air par heure.
    pub ach: u32,
    pub uv_sterilization: UvSterilization,
    pub last_contamination_event: String,
}

impl SystemStatus {
    /// Ligne d'état libre transmise au service de recommandations.
    pub fn summary(&self) -> String {
        format!(
            "Overall health is {}. UV Sterilization is {}.",
            self.overall_health, self.uv_sterilization
        )
    }
}

/// Un point de la courbe CFU.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfuPoint {
    /// Heure locale affichée, ex. `7:05 AM`.
    pub time: String,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentalParameters {
    pub co2: EnvParameter,
    pub pm25: EnvParameter,
    pub pm4: EnvParameter,
    pub pm10: EnvParameter,
    pub o3: EnvParameter,
    pub tvoc: EnvParameter,
}

/// Tout ce que le dashboard affiche pour une salle à un instant donné.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub hospital_id: String,
    pub room_id: String,
    pub bacterial_load: BacterialLoad,
    pub environmental_parameters: EnvironmentalParameters,
    pub system_status: SystemStatus,
    pub cfu_history: Vec<CfuPoint>,
}
