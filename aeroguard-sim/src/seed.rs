//! Dérivation des seeds et tirages sinusoïdaux indexés par offset.
//!
//! Chaque valeur d'un snapshot vient d'une seed effective
//! (`base_seed + time_bucket`) plus un offset entier fixe par champ. Calcul en
//! `f64` pour retomber sur les mêmes relevés que le dashboard d'origine.

/// Largeur d'une tranche de temps : relevés stables pendant 5 minutes.
pub const BUCKET_MILLIS: i64 = 5 * 60 * 1000;

/// Hash ×31 sur les unités UTF-16, repli sur 32 bits.
///
/// Valeur absolue calculée en `i64` : `i32::MIN` donne `2147483648` au lieu
/// de déborder.
pub fn string_hash(s: &str) -> i64 {
    let mut hash: i32 = 0;
    for unit in s.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit));
    }
    i64::from(hash).abs()
}

/// Seed de base d'une salle : hash de `"{facility}-{room}"`.
pub fn base_seed(facility_id: &str, room_id: &str) -> i64 {
    string_hash(&format!("{facility_id}-{room_id}"))
}

/// Index de la fenêtre de 5 minutes qui contient `now_ms`.
pub fn time_bucket(now_ms: i64) -> i64 {
    now_ms.div_euclid(BUCKET_MILLIS)
}

/// Source de tirages déterministe liée à une seed effective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeededDraw {
    seed: i64,
}

impl SeededDraw {
    pub fn new(seed: i64) -> Self {
        Self { seed }
    }

    /// Seed d'une salle à un instant donné.
    pub fn for_room(facility_id: &str, room_id: &str, now_ms: i64) -> Self {
        Self::new(base_seed(facility_id, room_id) + time_bucket(now_ms))
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    /// `frac(sin(seed + offset) * 10000)`, dans `[0, 1)`.
    pub fn draw(&self, offset: u32) -> f64 {
        let x = ((self.seed + i64::from(offset)) as f64).sin() * 10000.0;
        x - x.floor()
    }

    /// Entier dans `[min, max]` (bornes incluses).
    pub fn range(&self, min: u32, max: u32, offset: u32) -> u32 {
        debug_assert!(min <= max, "empty range {min}..={max}");
        let span = f64::from(max - min + 1);
        (self.draw(offset) * span).floor() as u32 + min
    }
}
