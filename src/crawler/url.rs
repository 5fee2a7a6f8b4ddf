//! Listing URL construction for the rental portal
//!
//! Results pages hold 48 listings. Page 1 is the base URL, page `p > 1` is
//! `{base}_Desde_{(p-1)*48+1}`.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Portal origin
pub const PORTAL_ORIGIN: &str = "https://www.portalinmobiliario.com";

/// Listings per results page
pub const LISTINGS_PER_PAGE: u32 = 48;

/// Rental property types offered by the portal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    #[default]
    Casa,
    Departamento,
    Oficina,
    Local,
}

impl PropertyType {
    /// Path segment used by the portal
    pub fn slug(self) -> &'static str {
        match self {
            Self::Casa => "casa",
            Self::Departamento => "departamento",
            Self::Oficina => "oficina",
            Self::Local => "local-comercial",
        }
    }

    /// Short name used in output file names
    pub fn name(self) -> &'static str {
        match self {
            Self::Casa => "casa",
            Self::Departamento => "departamento",
            Self::Oficina => "oficina",
            Self::Local => "local",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Regions accepted on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    #[default]
    Metropolitana,
    Valparaiso,
    Biobio,
    Maule,
    Ohiggins,
}

impl Region {
    pub fn slug(self) -> &'static str {
        match self {
            Self::Metropolitana => "santiago-metropolitana",
            Self::Valparaiso => "valparaiso",
            Self::Biobio => "bio-bio",
            Self::Maule => "maule",
            Self::Ohiggins => "libertador-general-bernardo-ohiggins",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Metropolitana => "metropolitana",
            Self::Valparaiso => "valparaiso",
            Self::Biobio => "biobio",
            Self::Maule => "maule",
            Self::Ohiggins => "ohiggins",
        }
    }

    /// Human-readable region name
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Metropolitana => "Región Metropolitana",
            Self::Valparaiso => "Valparaíso",
            Self::Biobio => "Biobío",
            Self::Maule => "Maule",
            Self::Ohiggins => "O'Higgins",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Base rental URL for a property type and region slug
///
/// # Examples
///
/// ```
/// use portal_crawler::crawler::url::{listing_url, PropertyType, PORTAL_ORIGIN};
///
/// assert_eq!(
///     listing_url(PORTAL_ORIGIN, PropertyType::Local, "bio-bio"),
///     "https://www.portalinmobiliario.com/arriendo/local-comercial/bio-bio"
/// );
/// ```
pub fn listing_url(origin: &str, tipo: PropertyType, region_slug: &str) -> String {
    format!(
        "{}/arriendo/{}/{}",
        origin.trim_end_matches('/'),
        tipo.slug(),
        region_slug
    )
}

/// URL of results page `page` (1-based)
pub fn page_url(base: &str, page: u32) -> String {
    if page <= 1 {
        base.to_string()
    } else {
        let offset = (page - 1) * LISTINGS_PER_PAGE + 1;
        format!("{base}_Desde_{offset}")
    }
}

/// URLs of pages `1..=pages`
pub fn page_urls(base: &str, pages: u32) -> Vec<String> {
    (1..=pages).map(|p| page_url(base, p)).collect()
}

/// One region of a multi-region run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPlan {
    /// Value stamped into `region_scraping`
    pub name: String,
    pub slug: String,
    pub pages: u32,
}

impl RegionPlan {
    pub fn new(name: &str, slug: &str, pages: u32) -> Self {
        Self {
            name: name.to_string(),
            slug: slug.to_string(),
            pages,
        }
    }
}

/// Regions and page counts of the national run
pub fn default_region_plan() -> Vec<RegionPlan> {
    vec![
        RegionPlan::new("Región Metropolitana", Region::Metropolitana.slug(), 5),
        RegionPlan::new("Valparaíso", Region::Valparaiso.slug(), 3),
        RegionPlan::new("Biobío", Region::Biobio.slug(), 3),
        RegionPlan::new("Maule", Region::Maule.slug(), 2),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_slugs() {
        assert_eq!(PropertyType::Casa.slug(), "casa");
        assert_eq!(PropertyType::Departamento.slug(), "departamento");
        assert_eq!(PropertyType::Oficina.slug(), "oficina");
        assert_eq!(PropertyType::Local.slug(), "local-comercial");
    }

    #[test]
    fn test_region_slugs() {
        assert_eq!(Region::Metropolitana.slug(), "santiago-metropolitana");
        assert_eq!(Region::Biobio.slug(), "bio-bio");
        assert_eq!(
            Region::Ohiggins.slug(),
            "libertador-general-bernardo-ohiggins"
        );
    }

    #[test]
    fn test_listing_url() {
        assert_eq!(
            listing_url(PORTAL_ORIGIN, PropertyType::Casa, Region::Metropolitana.slug()),
            "https://www.portalinmobiliario.com/arriendo/casa/santiago-metropolitana"
        );
        assert_eq!(
            listing_url("http://127.0.0.1:8080/", PropertyType::Oficina, "maule"),
            "http://127.0.0.1:8080/arriendo/oficina/maule"
        );
    }

    #[test]
    fn test_page_url_offsets() {
        let base = "https://x/arriendo/casa/maule";
        assert_eq!(page_url(base, 1), base);
        assert_eq!(page_url(base, 2), format!("{base}_Desde_49"));
        assert_eq!(page_url(base, 3), format!("{base}_Desde_97"));
        assert_eq!(page_urls(base, 3).len(), 3);
    }

    #[test]
    fn test_default_region_plan() {
        let plan = default_region_plan();
        let pages: Vec<u32> = plan.iter().map(|r| r.pages).collect();
        assert_eq!(pages, vec![5, 3, 3, 2]);
        assert_eq!(plan[2].slug, "bio-bio");
        assert_eq!(plan[0].name, "Región Metropolitana");
    }
}
