//! AeroGuard Sim - relevés déterministes de qualité de l'air des salles hospitalières
//!
//! Produit un snapshot complet de salle (charge bactérienne, paramètres
//! environnementaux, état système, historique CFU sur 24h) à partir d'un couple
//! établissement/salle et de la tranche de 5 minutes courante :
//! - Même salle + même tranche => snapshot identique
//! - Comportement par salle piloté par une table de politiques déclarative
//! - Le dernier point d'historique vaut toujours le relevé instantané

pub mod advisory;
pub mod catalog;
pub mod generator;
pub mod model;
pub mod policy;
pub mod seed;

pub use advisory::{AdvisoryError, RecommendActionsInput, RecommendActionsOutput};
pub use catalog::{Catalog, CatalogError, Facility, Room};
pub use generator::{generate_snapshot, SnapshotGenerator};
pub use model::{
    BacterialLoad, CfuPoint, CfuThresholds, EnvParameter, EnvironmentalParameters, HealthStatus,
    RoomSnapshot, SystemStatus, UvSterilization,
};
pub use policy::{policy_for, RoomPolicy};
pub use seed::{time_bucket, SeededDraw, BUCKET_MILLIS};
