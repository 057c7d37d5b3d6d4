use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::{normalize_slug, UnknownCatalogEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleKind {
    OrganicModern,
    Vintage,
    Gothic,
    Industrial,
    Scandinavian,
    Minimalist,
    Bohemian,
    Coastal,
    MidCenturyModern,
    Japandi,
    Classic,
    Farmhouse,
    ArtDeco,
    Tropical,
    Cyberpunk,
}

impl StyleKind {
    pub const ALL: [StyleKind; 15] = [
        StyleKind::OrganicModern,
        StyleKind::Vintage,
        StyleKind::Gothic,
        StyleKind::Industrial,
        StyleKind::Scandinavian,
        StyleKind::Minimalist,
        StyleKind::Bohemian,
        StyleKind::Coastal,
        StyleKind::MidCenturyModern,
        StyleKind::Japandi,
        StyleKind::Classic,
        StyleKind::Farmhouse,
        StyleKind::ArtDeco,
        StyleKind::Tropical,
        StyleKind::Cyberpunk,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            StyleKind::OrganicModern => "organic_modern",
            StyleKind::Vintage => "vintage",
            StyleKind::Gothic => "gothic",
            StyleKind::Industrial => "industrial",
            StyleKind::Scandinavian => "scandinavian",
            StyleKind::Minimalist => "minimalist",
            StyleKind::Bohemian => "bohemian",
            StyleKind::Coastal => "coastal",
            StyleKind::MidCenturyModern => "mid_century_modern",
            StyleKind::Japandi => "japandi",
            StyleKind::Classic => "classic",
            StyleKind::Farmhouse => "farmhouse",
            StyleKind::ArtDeco => "art_deco",
            StyleKind::Tropical => "tropical",
            StyleKind::Cyberpunk => "cyberpunk",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StyleKind::OrganicModern => "Organic Modern",
            StyleKind::Vintage => "Vintage",
            StyleKind::Gothic => "Gothic",
            StyleKind::Industrial => "Industrial",
            StyleKind::Scandinavian => "Scandinavian",
            StyleKind::Minimalist => "Minimalist",
            StyleKind::Bohemian => "Bohemian",
            StyleKind::Coastal => "Coastal",
            StyleKind::MidCenturyModern => "Mid-Century Modern",
            StyleKind::Japandi => "Japandi",
            StyleKind::Classic => "Classic",
            StyleKind::Farmhouse => "Farmhouse",
            StyleKind::ArtDeco => "Art Deco",
            StyleKind::Tropical => "Tropical",
            StyleKind::Cyberpunk => "Cyberpunk",
        }
    }

    pub fn tags(self) -> &'static [&'static str] {
        match self {
            StyleKind::OrganicModern => &["natural", "warm", "curved"],
            StyleKind::Vintage => &["antique", "nostalgic", "warm"],
            StyleKind::Gothic => &["dark", "ornate", "dramatic"],
            StyleKind::Industrial => &["raw", "urban", "metal"],
            StyleKind::Scandinavian => &["light", "cozy", "functional"],
            StyleKind::Minimalist => &["clean", "calm", "light"],
            StyleKind::Bohemian => &["eclectic", "colorful", "plants"],
            StyleKind::Coastal => &["airy", "light", "breezy"],
            StyleKind::MidCenturyModern => &["retro", "walnut", "organic"],
            StyleKind::Japandi => &["zen", "natural", "light"],
            StyleKind::Classic => &["elegant", "timeless", "symmetrical"],
            StyleKind::Farmhouse => &["rustic", "cozy", "wood"],
            StyleKind::ArtDeco => &["glamorous", "geometric", "gold"],
            StyleKind::Tropical => &["lush", "vibrant", "rattan"],
            StyleKind::Cyberpunk => &["neon", "futuristic", "dark"],
        }
    }

    pub fn description_key(self) -> String {
        format!("style.{}.description", self.slug())
    }

    pub fn reference_image(self) -> String {
        format!("style_{}", self.slug())
    }
}

impl fmt::Display for StyleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StyleKind {
    type Err = UnknownCatalogEntry;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_slug(raw);
        StyleKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == wanted)
            .ok_or_else(|| UnknownCatalogEntry {
                catalog: "style",
                value: raw.trim().to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyleSpec {
    pub kind: StyleKind,
    pub slug: &'static str,
    pub name: &'static str,
    pub description_key: String,
    pub reference_image: String,
    pub tags: Vec<&'static str>,
}

impl StyleSpec {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|item| *item == tag)
    }
}

#[derive(Debug, Clone)]
pub struct StyleCatalog {
    styles: IndexMap<&'static str, StyleSpec>,
}

impl StyleCatalog {
    /// Process-wide catalog, built on first use and read-only afterwards.
    pub fn standard() -> &'static StyleCatalog {
        static CATALOG: OnceLock<StyleCatalog> = OnceLock::new();
        CATALOG.get_or_init(|| StyleCatalog {
            styles: StyleKind::ALL
                .into_iter()
                .map(|kind| {
                    (
                        kind.slug(),
                        StyleSpec {
                            kind,
                            slug: kind.slug(),
                            name: kind.name(),
                            description_key: kind.description_key(),
                            reference_image: kind.reference_image(),
                            tags: kind.tags().to_vec(),
                        },
                    )
                })
                .collect(),
        })
    }

    pub fn get(&self, slug: &str) -> Option<&StyleSpec> {
        self.styles.get(normalize_slug(slug).as_str())
    }

    pub fn list(&self) -> impl Iterator<Item = &StyleSpec> {
        self.styles.values()
    }

    pub fn by_tag(&self, tag: &str) -> Vec<StyleSpec> {
        self.styles
            .values()
            .filter(|style| style.has_tag(tag))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{StyleCatalog, StyleKind};

    #[test]
    fn style_records_carry_localization_and_reference_ids() {
        let spec = StyleCatalog::standard().get("organic-modern").unwrap();
        assert_eq!(spec.kind, StyleKind::OrganicModern);
        assert_eq!(spec.description_key, "style.organic_modern.description");
        assert_eq!(spec.reference_image, "style_organic_modern");
        assert!(spec.has_tag("natural"));
    }

    #[test]
    fn by_tag_keeps_catalog_order() {
        let light: Vec<StyleKind> = StyleCatalog::standard()
            .by_tag("light")
            .into_iter()
            .map(|style| style.kind)
            .collect();
        assert_eq!(
            light,
            vec![
                StyleKind::Scandinavian,
                StyleKind::Minimalist,
                StyleKind::Coastal,
                StyleKind::Japandi,
            ]
        );
    }

    #[test]
    fn style_kind_rejects_unknown_names() {
        assert_eq!("Mid-Century Modern".parse::<StyleKind>(), Ok(StyleKind::MidCenturyModern));
        let err = "brutalist".parse::<StyleKind>().unwrap_err();
        assert_eq!(err.catalog, "style");
        assert_eq!(err.value, "brutalist");
    }
}
