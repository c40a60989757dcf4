//! Générateur déterministe de données par salle
//!
//! `generate` est une fonction pure de (établissement, salle, tranche de temps) :
//! un client qui poll plus souvent que toutes les 5 minutes reçoit le même
//! snapshot jusqu'au changement de tranche. Fonction totale : tout `i64` est
//! accepté comme instant.

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Time, UtcOffset};
use tracing::debug;

use crate::model::{
    BacterialLoad, CfuPoint, EnvParameter, EnvironmentalParameters, HealthStatus, RoomSnapshot,
    SystemStatus, UvSterilization,
};
use crate::policy::{policy_for, RoomPolicy};
use crate::seed::{time_bucket, SeededDraw, BUCKET_MILLIS};

const TIME_LABEL: &[BorrowedFormatItem<'static>] =
    format_description!("[hour repr:12 padding:none]:[minute] [period]");

const DAY_MILLIS: i128 = 24 * 3_600_000;

const ACH_OFFSET: u32 = 20;
const CONTAMINATION_OFFSET: u32 = 21;

pub const POLLEN_EVENT: &str = "High pollen count detected 2 days ago.";
pub const NO_EVENT: &str = "No recent events.";

const MICROGRAMS: &str = "µg/m³";

/// Générateur lié au fuseau des libellés d'historique et des fenêtres
/// d'activité journalières.
#[derive(Debug, Clone, Copy)]
pub struct SnapshotGenerator {
    utc_offset: UtcOffset,
}

impl Default for SnapshotGenerator {
    fn default() -> Self {
        Self::new(UtcOffset::UTC)
    }
}

impl SnapshotGenerator {
    pub fn new(utc_offset: UtcOffset) -> Self {
        Self { utc_offset }
    }

    pub fn utc_offset(&self) -> UtcOffset {
        self.utc_offset
    }

    pub fn generate(&self, facility_id: &str, room_id: &str, now_ms: i64) -> RoomSnapshot {
        let bucket = time_bucket(now_ms);
        let rng = SeededDraw::for_room(facility_id, room_id, now_ms);
        let policy = policy_for(facility_id, room_id);

        let current_cfu = policy.current.current_cfu(&rng);
        let overall_health = HealthStatus::classify(current_cfu);
        // en i128 : le début de tranche d'un instant proche de i64::MIN sort de i64
        let anchor_ms = i128::from(bucket) * i128::from(BUCKET_MILLIS);
        let cfu_history = self.history(policy, &rng, anchor_ms, current_cfu);

        debug!(
            facility = facility_id,
            room = room_id,
            bucket,
            seed = rng.seed(),
            current_cfu,
            health = %overall_health,
            "generated room snapshot"
        );

        RoomSnapshot {
            hospital_id: facility_id.to_string(),
            room_id: room_id.to_string(),
            bacterial_load: BacterialLoad::new(current_cfu),
            environmental_parameters: environmental_parameters(&rng),
            system_status: SystemStatus {
                overall_health,
                ach: rng.range(6, 12, ACH_OFFSET),
                uv_sterilization: UvSterilization::for_health(overall_health),
                last_contamination_event: if rng.range(0, 1, CONTAMINATION_OFFSET) == 1 {
                    POLLEN_EVENT.to_string()
                } else {
                    NO_EVENT.to_string()
                },
            },
            cfu_history,
        }
    }

    /// 24h glissantes se terminant à `anchor_ms`, du plus ancien au plus récent.
    /// Le dernier point porte toujours `current_cfu`.
    fn history(&self, policy: &RoomPolicy, rng: &SeededDraw, anchor_ms: i128, current_cfu: u32) -> Vec<CfuPoint> {
        let step_ms = i128::from(policy.sampling_minutes) * 60_000;
        let len = policy.history_len();

        let mut points: Vec<CfuPoint> = (0..len)
            .rev()
            .map(|index| {
                let (hour, minute) = self.wall_clock(anchor_ms - i128::from(index) * step_ms);
                CfuPoint {
                    time: time_label(hour, minute),
                    value: policy.history.point_value(rng, index, hour, minute),
                }
            })
            .collect();

        if let Some(last) = points.last_mut() {
            last.value = current_cfu;
        }
        points
    }

    /// Heure et minute locales d'un instant, calculées sans passer par une date
    /// (pas de limite d'année).
    fn wall_clock(&self, epoch_ms: i128) -> (u8, u8) {
        let local_ms = epoch_ms + i128::from(self.utc_offset.whole_seconds()) * 1000;
        let of_day = local_ms.rem_euclid(DAY_MILLIS);
        ((of_day / 3_600_000) as u8, (of_day % 3_600_000 / 60_000) as u8)
    }
}

fn time_label(hour: u8, minute: u8) -> String {
    Time::from_hms(hour, minute, 0)
        .ok()
        .and_then(|t| t.format(TIME_LABEL).ok())
        .unwrap_or_default()
}

/// Snapshot en UTC.
pub fn generate_snapshot(facility_id: &str, room_id: &str, now_ms: i64) -> RoomSnapshot {
    SnapshotGenerator::default().generate(facility_id, room_id, now_ms)
}

fn environmental_parameters(rng: &SeededDraw) -> EnvironmentalParameters {
    let param = |current: u32, max_24h: u32, min_24h: u32, unit: &str, name: &str| EnvParameter {
        current,
        max_24h,
        min_24h,
        unit: unit.to_string(),
        name: name.to_string(),
    };

    let co2_max = rng.range(400, 900, 3);
    EnvironmentalParameters {
        co2: param(rng.range(400, co2_max, 2), co2_max, rng.range(350, 399, 4), "ppm", "CO2"),
        pm25: param(rng.range(5, 30, 5), rng.range(31, 50, 6), rng.range(1, 4, 7), MICROGRAMS, "PM2.5"),
        pm4: param(rng.range(10, 40, 8), rng.range(41, 60, 9), rng.range(2, 9, 10), MICROGRAMS, "PM4"),
        pm10: param(rng.range(15, 50, 11), rng.range(51, 80, 12), rng.range(5, 14, 13), MICROGRAMS, "PM10"),
        o3: param(rng.range(10, 70, 14), rng.range(71, 100, 15), rng.range(1, 9, 16), "ppb", "Ozone"),
        tvoc: param(rng.range(50, 300, 17), rng.range(301, 500, 18), rng.range(10, 49, 19), MICROGRAMS, "TVOC"),
    }
}
