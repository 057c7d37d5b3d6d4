use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{normalize_slug, UnknownCatalogEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomKind {
    LivingRoom,
    Bedroom,
    Kitchen,
    Bathroom,
    DiningRoom,
    HomeOffice,
    KidsRoom,
    GameRoom,
    Balcony,
    Entryway,
}

impl RoomKind {
    pub const ALL: [RoomKind; 10] = [
        RoomKind::LivingRoom,
        RoomKind::Bedroom,
        RoomKind::Kitchen,
        RoomKind::Bathroom,
        RoomKind::DiningRoom,
        RoomKind::HomeOffice,
        RoomKind::KidsRoom,
        RoomKind::GameRoom,
        RoomKind::Balcony,
        RoomKind::Entryway,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            RoomKind::LivingRoom => "living_room",
            RoomKind::Bedroom => "bedroom",
            RoomKind::Kitchen => "kitchen",
            RoomKind::Bathroom => "bathroom",
            RoomKind::DiningRoom => "dining_room",
            RoomKind::HomeOffice => "home_office",
            RoomKind::KidsRoom => "kids_room",
            RoomKind::GameRoom => "game_room",
            RoomKind::Balcony => "balcony",
            RoomKind::Entryway => "entryway",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RoomKind::LivingRoom => "Living Room",
            RoomKind::Bedroom => "Bedroom",
            RoomKind::Kitchen => "Kitchen",
            RoomKind::Bathroom => "Bathroom",
            RoomKind::DiningRoom => "Dining Room",
            RoomKind::HomeOffice => "Home Office",
            RoomKind::KidsRoom => "Kids Room",
            RoomKind::GameRoom => "Game Room",
            RoomKind::Balcony => "Balcony",
            RoomKind::Entryway => "Entryway",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            RoomKind::LivingRoom => "A welcoming space for relaxing and entertaining guests.",
            RoomKind::Bedroom => "A restful retreat designed for sleep and calm.",
            RoomKind::Kitchen => "The heart of the home for cooking and gathering.",
            RoomKind::Bathroom => "A refreshing space for daily rituals and relaxation.",
            RoomKind::DiningRoom => "A gathering place for shared meals and conversation.",
            RoomKind::HomeOffice => "A focused workspace that balances productivity and comfort.",
            RoomKind::KidsRoom => "A playful, safe space that grows with your children.",
            RoomKind::GameRoom => "An entertainment space for games, movies and friends.",
            RoomKind::Balcony => "An outdoor nook for fresh air and open views.",
            RoomKind::Entryway => "The first impression of your home, practical and inviting.",
        }
    }
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RoomKind {
    type Err = UnknownCatalogEntry;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_slug(raw);
        RoomKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == wanted)
            .ok_or_else(|| UnknownCatalogEntry {
                catalog: "room",
                value: raw.trim().to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomSpec {
    pub kind: RoomKind,
    pub slug: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone)]
pub struct RoomCatalog {
    rooms: IndexMap<&'static str, RoomSpec>,
}

impl RoomCatalog {
    /// Process-wide catalog, built on first use and read-only afterwards.
    pub fn standard() -> &'static RoomCatalog {
        static CATALOG: OnceLock<RoomCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| RoomCatalog {
            rooms: RoomKind::ALL
                .into_iter()
                .map(|kind| {
                    (
                        kind.slug(),
                        RoomSpec {
                            kind,
                            slug: kind.slug(),
                            name: kind.name(),
                            description: kind.description(),
                        },
                    )
                })
                .collect(),
        })
    }

    pub fn get(&self, slug: &str) -> Option<&RoomSpec> {
        self.rooms.get(normalize_slug(slug).as_str())
    }

    pub fn list(&self) -> impl Iterator<Item = &RoomSpec> {
        self.rooms.values()
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{RoomCatalog, RoomKind};

    #[test]
    fn catalog_lists_every_kind_in_declaration_order() {
        let slugs: Vec<&str> = RoomCatalog::standard().list().map(|room| room.slug).collect();
        let expected: Vec<&str> = RoomKind::ALL.iter().map(|kind| kind.slug()).collect();
        assert_eq!(slugs, expected);
        assert_eq!(RoomCatalog::standard().len(), RoomKind::ALL.len());
    }

    #[test]
    fn room_kind_parses_slug_variants() {
        assert_eq!("living-room".parse::<RoomKind>(), Ok(RoomKind::LivingRoom));
        assert_eq!(" Home Office ".parse::<RoomKind>(), Ok(RoomKind::HomeOffice));
        assert_eq!("KITCHEN".parse::<RoomKind>(), Ok(RoomKind::Kitchen));
        let err = "garage".parse::<RoomKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown room 'garage'");
    }

    #[test]
    fn catalog_lookup_matches_kind_metadata() {
        let spec = RoomCatalog::standard().get("dining-room").unwrap();
        assert_eq!(spec.kind, RoomKind::DiningRoom);
        assert_eq!(spec.name, "Dining Room");
        assert!(spec.description.ends_with('.'));
    }
}
