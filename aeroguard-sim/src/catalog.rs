use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Unknown facility: {0}")]
    UnknownFacility(String),
    #[error("Unknown room {room} in facility {facility}")]
    UnknownRoom { facility: String, room: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facility {
    pub id: String,
    pub name: String,
    pub rooms: Vec<Room>,
}

impl Facility {
    fn new(id: &str, name: &str, rooms: &[(&str, &str)]) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            rooms: rooms
                .iter()
                .map(|(id, name)| Room { id: id.to_string(), name: name.to_string() })
                .collect(),
        }
    }

    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == room_id)
    }
}

/// Établissements et salles proposés aux sélecteurs du dashboard.
#[derive(Debug, Clone)]
pub struct Catalog {
    facilities: Vec<Facility>,
}

impl Catalog {
    pub fn new(facilities: Vec<Facility>) -> Self {
        Self { facilities }
    }

    /// Établissements surveillés livrés avec le kernel.
    pub fn builtin() -> Self {
        Self::new(vec![
            Facility::new(
                "mercy_general",
                "General Hospital",
                &[
                    ("icu_101", "ICU Room 101"),
                    ("icu_2", "ICU Room 102"),
                    ("or_203", "ICU Room 103"),
                    ("icu_104", "ICU Room 104"),
                ],
            ),
            Facility::new(
                "city_central",
                "Central Hospital",
                &[("maternity_301", "ICU Room 301"), ("cardiac_402", "ICU Room 402")],
            ),
            Facility::new(
                "st_judes",
                "General Hospital 2",
                &[("pediatrics_a", "ICU Room 101"), ("pediatrics_b", "ICU Room 102")],
            ),
            Facility::new("new_hospital", "New City Hospital", &[("room_a", "Room A"), ("room_b", "Room B")]),
            Facility::new("facility", "Facility", &[("room_a", "Room A"), ("room_b", "Room B")]),
        ])
    }

    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    pub fn facility(&self, facility_id: &str) -> Result<&Facility, CatalogError> {
        self.facilities
            .iter()
            .find(|f| f.id == facility_id)
            .ok_or_else(|| CatalogError::UnknownFacility(facility_id.to_string()))
    }

    pub fn room(&self, facility_id: &str, room_id: &str) -> Result<&Room, CatalogError> {
        self.facility(facility_id)?
            .room(room_id)
            .ok_or_else(|| CatalogError::UnknownRoom {
                facility: facility_id.to_string(),
                room: room_id.to_string(),
            })
    }

    pub fn room_count(&self) -> usize {
        self.facilities.iter().map(|f| f.rooms.len()).sum()
    }

    /// Première salle du premier établissement : sélection initiale du dashboard.
    pub fn default_selection(&self) -> Option<(&Facility, &Room)> {
        let facility = self.facilities.first()?;
        let room = facility.rooms.first()?;
        Some((facility, room))
    }

    /// Garde `current_room` si `facility_id` la contient, sinon première salle
    /// de l'établissement.
    pub fn resolve_room(&self, facility_id: &str, current_room: &str) -> Result<&Room, CatalogError> {
        let facility = self.facility(facility_id)?;
        facility
            .room(current_room)
            .or_else(|| facility.rooms.first())
            .ok_or_else(|| CatalogError::UnknownRoom {
                facility: facility_id.to_string(),
                room: current_room.to_string(),
            })
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}
