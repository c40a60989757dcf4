//! Politiques de génération par salle.
//!
//! Table ordonnée sélecteur établissement/salle -> politique (règle du CFU
//! courant, règle d'historique, pas d'échantillonnage). La première ligne qui
//! correspond gagne ; sans correspondance, `DEFAULT_POLICY`.

use crate::seed::SeededDraw;

/// Offset du tirage du CFU instantané.
pub const CURRENT_CFU_OFFSET: u32 = 1;

/// Filtre sur un identifiant.
#[derive(Debug, Clone, Copy)]
pub enum Match {
    Any,
    Is(&'static str),
    OneOf(&'static [&'static str]),
}

impl Match {
    fn matches(&self, id: &str) -> bool {
        match self {
            Match::Any => true,
            Match::Is(expected) => *expected == id,
            Match::OneOf(ids) => ids.contains(&id),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RoomSelector {
    pub facility: Match,
    pub room: Match,
}

impl RoomSelector {
    pub fn matches(&self, facility_id: &str, room_id: &str) -> bool {
        self.facility.matches(facility_id) && self.room.matches(room_id)
    }
}

/// Tirage du CFU instantané.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentPolicy {
    Uniform { min: u32, max: u32 },
    /// Tirage sur toute la plage, retiré dans `[5, 249]` s'il dépasse 250.
    GoodBiased,
}

impl CurrentPolicy {
    pub fn current_cfu(&self, rng: &SeededDraw) -> u32 {
        match *self {
            CurrentPolicy::Uniform { min, max } => rng.range(min, max, CURRENT_CFU_OFFSET),
            CurrentPolicy::GoodBiased => {
                let value = rng.range(5, 1000, CURRENT_CFU_OFFSET);
                if value > 250 {
                    rng.range(5, 249, CURRENT_CFU_OFFSET)
                } else {
                    value
                }
            }
        }
    }
}

/// Position d'une heure locale dans la routine journalière du service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPhase {
    /// Tournées, repas, visites : 07:00-09:00, 11:00-14:00, 16:00-19:30, 20:00-22:30.
    Activity,
    /// Nuit, 22:00-07:00 hors fenêtres d'activité.
    Quiet,
    /// Creux de journée entre deux fenêtres d'activité.
    Transitional,
}

impl DayPhase {
    pub fn at(hour: u8, minute: u8) -> Self {
        let activity = (7..9).contains(&hour)
            || (11..14).contains(&hour)
            || (hour >= 16 && (hour < 19 || (hour == 19 && minute <= 30)))
            || (hour >= 20 && (hour < 22 || (hour == 22 && minute <= 30)));
        if activity {
            DayPhase::Activity
        } else if hour >= 22 || hour < 7 {
            DayPhase::Quiet
        } else {
            DayPhase::Transitional
        }
    }
}

/// Tirage de chaque point d'historique.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryPolicy {
    /// `range(min, max, offset_base + index)`.
    Uniform { min: u32, max: u32, offset_base: u32 },
    /// Plage selon l'heure locale du point.
    DailyRhythm,
}

impl HistoryPolicy {
    /// Valeur du point situé `index` pas avant le plus récent.
    pub fn point_value(&self, rng: &SeededDraw, index: u32, hour: u8, minute: u8) -> u32 {
        match *self {
            HistoryPolicy::Uniform { min, max, offset_base } => rng.range(min, max, offset_base + index),
            HistoryPolicy::DailyRhythm => match DayPhase::at(hour, minute) {
                DayPhase::Activity => rng.range(250, 500, 100 + index),
                DayPhase::Quiet | DayPhase::Transitional => rng.range(5, 249, 100 + index),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomPolicy {
    pub current: CurrentPolicy,
    pub history: HistoryPolicy,
    pub sampling_minutes: u32,
}

impl RoomPolicy {
    /// Nombre de points couvrant 24 heures.
    pub fn history_len(&self) -> u32 {
        24 * 60 / self.sampling_minutes
    }
}

const FULL_RANGE: CurrentPolicy = CurrentPolicy::Uniform { min: 5, max: 1000 };
const FULL_HISTORY: HistoryPolicy = HistoryPolicy::Uniform { min: 5, max: 1000, offset_base: 100 };
const HALF_HOURLY: &[&str] = &["new_hospital", "facility"];

const fn row(
    facility: Match,
    room: Match,
    current: CurrentPolicy,
    history: HistoryPolicy,
    sampling_minutes: u32,
) -> (RoomSelector, RoomPolicy) {
    (
        RoomSelector { facility, room },
        RoomPolicy { current, history, sampling_minutes },
    )
}

/// Table ordonnée, première correspondance gagnante.
pub static POLICY_TABLE: &[(RoomSelector, RoomPolicy)] = &[
    row(Match::Is("mercy_general"), Match::Is("icu_101"), CurrentPolicy::GoodBiased, HistoryPolicy::DailyRhythm, 5),
    row(
        Match::Is("new_hospital"),
        Match::Is("room_a"),
        CurrentPolicy::Uniform { min: 50, max: 70 },
        HistoryPolicy::Uniform { min: 50, max: 70, offset_base: 50 },
        30,
    ),
    row(
        Match::Is("new_hospital"),
        Match::Is("room_b"),
        CurrentPolicy::Uniform { min: 500, max: 750 },
        HistoryPolicy::Uniform { min: 500, max: 750, offset_base: 100 },
        30,
    ),
    row(
        Match::Is("facility"),
        Match::Is("room_a"),
        CurrentPolicy::Uniform { min: 750, max: 900 },
        HistoryPolicy::Uniform { min: 750, max: 900, offset_base: 50 },
        30,
    ),
    row(
        Match::Is("facility"),
        Match::Is("room_b"),
        CurrentPolicy::Uniform { min: 20, max: 80 },
        HistoryPolicy::Uniform { min: 20, max: 80, offset_base: 100 },
        30,
    ),
    // icu_2 garde son CFU courant élevé même dans les établissements à la
    // demi-heure, mais l'historique y suit le défaut de l'établissement.
    row(
        Match::OneOf(HALF_HOURLY),
        Match::Is("icu_2"),
        CurrentPolicy::Uniform { min: 750, max: 1000 },
        FULL_HISTORY,
        30,
    ),
    row(Match::OneOf(HALF_HOURLY), Match::Any, FULL_RANGE, FULL_HISTORY, 30),
    row(
        Match::Is("mercy_general"),
        Match::OneOf(&["or_203", "icu_104"]),
        FULL_RANGE,
        HistoryPolicy::DailyRhythm,
        5,
    ),
    row(
        Match::Any,
        Match::Is("icu_2"),
        CurrentPolicy::Uniform { min: 750, max: 1000 },
        HistoryPolicy::Uniform { min: 500, max: 1000, offset_base: 100 },
        5,
    ),
];

/// Politique des salles qu'aucune ligne de la table ne couvre.
pub static DEFAULT_POLICY: RoomPolicy = RoomPolicy {
    current: FULL_RANGE,
    history: FULL_HISTORY,
    sampling_minutes: 5,
};

/// Politique d'une salle ; jamais d'échec.
pub fn policy_for(facility_id: &str, room_id: &str) -> &'static RoomPolicy {
    POLICY_TABLE
        .iter()
        .find(|(selector, _)| selector.matches(facility_id, room_id))
        .map_or(&DEFAULT_POLICY, |(_, policy)| policy)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unmatched_room_falls_back_to_default_policy() {
        assert!(POLICY_TABLE.iter().all(|(selector, _)| !selector.matches("anything", "at_all")));
        assert!(std::ptr::eq(policy_for("anything", "at_all"), &DEFAULT_POLICY));
        assert_eq!(DEFAULT_POLICY.sampling_minutes, 5);
    }

    #[test]
    fn test_unknown_room_uses_default() {
        let policy = policy_for("st_judes", "pediatrics_a");
        assert_eq!(*policy, DEFAULT_POLICY);
        assert_eq!(policy.current, FULL_RANGE);
        assert_eq!(policy.history, FULL_HISTORY);
        assert_eq!(policy.history_len(), 288);
    }

    #[test]
    fn test_half_hourly_facilities() {
        for (facility, room) in [
            ("new_hospital", "room_a"),
            ("new_hospital", "room_b"),
            ("facility", "room_a"),
            ("facility", "room_b"),
            ("facility", "lobby"),
            ("new_hospital", "icu_2"),
        ] {
            let policy = policy_for(facility, room);
            assert_eq!(policy.sampling_minutes, 30, "{facility}/{room}");
            assert_eq!(policy.history_len(), 48);
        }
    }

    #[test]
    fn test_icu_2_anywhere_is_chronically_high() {
        let policy = policy_for("city_central", "icu_2");
        assert_eq!(policy.current, CurrentPolicy::Uniform { min: 750, max: 1000 });
        assert_eq!(policy.history, HistoryPolicy::Uniform { min: 500, max: 1000, offset_base: 100 });

        let policy = policy_for("new_hospital", "icu_2");
        assert_eq!(policy.current, CurrentPolicy::Uniform { min: 750, max: 1000 });
        assert_eq!(policy.history, FULL_HISTORY);
    }

    #[test]
    fn test_mercy_general_daily_rhythm_rooms() {
        assert_eq!(policy_for("mercy_general", "icu_101").current, CurrentPolicy::GoodBiased);
        for room in ["icu_101", "or_203", "icu_104"] {
            assert_eq!(policy_for("mercy_general", room).history, HistoryPolicy::DailyRhythm);
        }
        assert_eq!(policy_for("mercy_general", "or_203").current, FULL_RANGE);
        assert_eq!(policy_for("city_central", "icu_101").history, FULL_HISTORY);
    }

    #[test]
    fn test_day_phase_windows() {
        assert_eq!(DayPhase::at(6, 59), DayPhase::Quiet);
        assert_eq!(DayPhase::at(7, 0), DayPhase::Activity);
        assert_eq!(DayPhase::at(9, 0), DayPhase::Transitional);
        assert_eq!(DayPhase::at(13, 59), DayPhase::Activity);
        assert_eq!(DayPhase::at(14, 0), DayPhase::Transitional);
        assert_eq!(DayPhase::at(19, 30), DayPhase::Activity);
        assert_eq!(DayPhase::at(19, 31), DayPhase::Transitional);
        assert_eq!(DayPhase::at(22, 30), DayPhase::Activity);
        assert_eq!(DayPhase::at(22, 31), DayPhase::Quiet);
        assert_eq!(DayPhase::at(0, 0), DayPhase::Quiet);
    }

    #[test]
    fn test_good_biased_never_exceeds_250() {
        for seed in 0..2000 {
            let cfu = CurrentPolicy::GoodBiased.current_cfu(&SeededDraw::new(seed));
            assert!((5..=250).contains(&cfu), "seed {seed} gave {cfu}");
        }
    }

    #[test]
    fn test_daily_rhythm_ranges() {
        let rng = SeededDraw::new(987_654);
        for index in 0..288 {
            let busy = HistoryPolicy::DailyRhythm.point_value(&rng, index, 12, 0);
            assert!((250..=500).contains(&busy));
            let night = HistoryPolicy::DailyRhythm.point_value(&rng, index, 3, 0);
            assert!((5..=249).contains(&night));
        }
    }
}
