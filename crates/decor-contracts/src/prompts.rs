use serde::Serialize;

use crate::catalog::{RoomKind, StyleKind};

/// Upper bound the image API accepts for a single text prompt.
pub const MAX_PROMPT_CHARS: usize = 2000;

pub const NEGATIVE_PROMPT: &str = "low quality, blurry, distorted, deformed furniture, wrong scale, \
unrealistic proportions, cartoon style, illustration, watermark, text";

const STRUCTURE_CLAUSE: &str = "Keep the exact room layout, walls, windows, doors, ceiling height \
and all structural elements unchanged, preserving room boundaries and camera perspective; use \
light neutral wall colors for light and classic styles; photorealistic interior photography, \
every piece of furniture at proper real-world scale";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptPair {
    pub positive: String,
    pub negative: String,
}

impl PromptPair {
    pub fn new(positive: impl Into<String>, negative: impl Into<String>) -> Self {
        Self {
            positive: positive.into(),
            negative: negative.into(),
        }
    }

    pub fn fits_within(&self, max_chars: usize) -> bool {
        self.positive.chars().count() <= max_chars && self.negative.chars().count() <= max_chars
    }
}

pub fn build_prompt(room: RoomKind, style: StyleKind) -> PromptPair {
    let room_part = room_clause(room)
        .map(str::to_string)
        .unwrap_or_else(|| fallback_room_clause(room));
    let style_part = style_clause(style)
        .map(str::to_string)
        .unwrap_or_else(|| fallback_style_clause(style));
    PromptPair {
        positive: format!("{room_part}. {style_part}. {STRUCTURE_CLAUSE}."),
        negative: NEGATIVE_PROMPT.to_string(),
    }
}

pub fn fallback_room_clause(room: RoomKind) -> String {
    format!(
        "stunning {}: premium finishes, sophisticated lighting",
        room.name().to_lowercase()
    )
}

pub fn fallback_style_clause(style: StyleKind) -> String {
    format!(
        "beautiful {} style: premium materials, contemporary comfort",
        style.name().to_lowercase()
    )
}

fn room_clause(room: RoomKind) -> Option<&'static str> {
    let clause = match room {
        RoomKind::LivingRoom => {
            "luxurious living room: designer sofa with textured upholstery, layered ambient and \
             accent lighting, natural stone and hardwood accents, curated art pieces"
        }
        RoomKind::Bedroom => {
            "serene bedroom: upholstered headboard, premium linen bedding, soft warm bedside \
             lighting, plush area rug"
        }
        RoomKind::Kitchen => {
            "high-end kitchen: custom cabinetry, marble countertops, integrated premium \
             appliances, statement pendant lights over the island"
        }
        RoomKind::Bathroom => {
            "spa-like bathroom: natural stone tiles, frameless glass shower, brushed metal \
             fixtures, warm indirect lighting"
        }
        RoomKind::DiningRoom => {
            "elegant dining room: solid wood dining table, upholstered chairs, sculptural \
             chandelier, refined tableware"
        }
        RoomKind::HomeOffice => {
            "refined home office: solid wood desk, ergonomic designer chair, built-in shelving, \
             balanced task and ambient lighting"
        }
        RoomKind::KidsRoom | RoomKind::GameRoom | RoomKind::Balcony | RoomKind::Entryway => {
            return None
        }
    };
    Some(clause)
}

fn style_clause(style: StyleKind) -> Option<&'static str> {
    let clause = match style {
        StyleKind::OrganicModern => {
            "organic modern style: natural wood, linen and stone, soft curved silhouettes, warm \
             earthy neutral palette"
        }
        StyleKind::Vintage => {
            "vintage style: antique wood furniture, brass details, faded patterned textiles, \
             nostalgic warm tones"
        }
        StyleKind::Gothic => {
            "gothic style: dark moody palette, ornate carved wood, velvet upholstery, wrought \
             iron candelabra lighting"
        }
        StyleKind::Industrial => {
            "industrial style: exposed brick and concrete, black steel frames, reclaimed wood, \
             Edison bulb lighting"
        }
        StyleKind::Scandinavian => {
            "scandinavian style: light oak, white and soft grey tones, cozy wool textiles, clean \
             functional forms"
        }
        StyleKind::Minimalist => {
            "minimalist style: uncluttered surfaces, clean lines, restrained neutral palette, \
             hidden storage"
        }
        StyleKind::Bohemian => {
            "bohemian style: layered patterned rugs, rattan and macrame, abundant plants, warm \
             eclectic colors"
        }
        StyleKind::Coastal => {
            "coastal style: airy whites and soft blues, light washed wood, linen textiles, \
             natural woven accents"
        }
        StyleKind::MidCenturyModern => {
            "mid-century modern style: tapered wooden legs, walnut veneers, organic shapes, \
             mustard and teal accents"
        }
        StyleKind::Japandi => {
            "japandi style: low-profile light wood furniture, muted earth tones, paper lantern \
             lighting, calm balance"
        }
        StyleKind::Classic => {
            "classic style: symmetrical layout, crown moldings, tufted upholstery, crystal \
             chandelier, cream and gold palette"
        }
        StyleKind::Farmhouse => {
            "modern farmhouse style: shiplap walls, distressed wood, apron-front sink details, \
             black metal hardware"
        }
        StyleKind::ArtDeco | StyleKind::Tropical | StyleKind::Cyberpunk => return None,
    };
    Some(clause)
}
