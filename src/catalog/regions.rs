//! Named ocean regions with coordinate bounds
//!
//! Tight rectangles drive strict geographic filtering; the `broad`
//! rectangle, where present, is the coarser fallback used when strict
//! filtering leaves nothing.

use super::Rect;

/// A named ocean region recognized in user queries
#[derive(Debug, Clone)]
pub struct Region {
    /// Canonical name, e.g. "Bay of Bengal"
    pub name: &'static str,
    /// Lowercase phrases that identify the region in query text
    pub keywords: &'static [&'static str],
    /// Strict bounding rectangle
    pub bounds: Rect,
    /// Coarser fallback rectangle for filter broadening
    pub broad: Option<Rect>,
    /// Human label for the broadened area, e.g. "broader Indian Ocean region"
    pub broad_label: Option<&'static str>,
}

/// Regions the data store actually covers
static SUPPORTED: &[Region] = &[
    Region {
        name: "Bay of Bengal",
        keywords: &["bay of bengal", "bengal bay", "bengal"],
        bounds: Rect::new(5.0, 25.0, 80.0, 100.0),
        broad: Some(Rect::new(-10.0, 30.0, 60.0, 120.0)),
        broad_label: Some("broader Indian Ocean region"),
    },
    Region {
        name: "Arabian Sea",
        keywords: &["arabian sea", "arabian", "arabia"],
        bounds: Rect::new(10.0, 30.0, 50.0, 80.0),
        broad: Some(Rect::new(5.0, 35.0, 45.0, 85.0)),
        broad_label: Some("broader Arabian Sea region"),
    },
    Region {
        name: "Indian Ocean",
        keywords: &["indian ocean", "indian"],
        bounds: Rect::new(-60.0, 30.0, 20.0, 120.0),
        broad: Some(Rect::new(-60.0, 30.0, 20.0, 120.0)),
        broad_label: Some("broader Indian Ocean region"),
    },
    Region {
        name: "Equatorial",
        keywords: &["equator", "equatorial", "near the equator"],
        bounds: Rect::new(-5.0, 5.0, 20.0, 120.0),
        broad: None,
        broad_label: None,
    },
];

/// Regions users ask about that the store has no data for
static UNSUPPORTED: &[Region] = &[
    Region {
        name: "Pacific Ocean",
        keywords: &["pacific ocean", "pacific"],
        bounds: Rect::new(-60.0, 60.0, 120.0, 180.0),
        broad: None,
        broad_label: None,
    },
    Region {
        name: "Atlantic Ocean",
        keywords: &["atlantic ocean", "atlantic"],
        bounds: Rect::new(-60.0, 60.0, -80.0, 20.0),
        broad: None,
        broad_label: None,
    },
    Region {
        name: "Mediterranean Sea",
        keywords: &["mediterranean sea", "mediterranean"],
        bounds: Rect::new(30.0, 45.0, -5.0, 40.0),
        broad: None,
        broad_label: None,
    },
    Region {
        name: "Arctic Ocean",
        keywords: &["arctic ocean", "arctic"],
        bounds: Rect::new(66.0, 90.0, -180.0, 180.0),
        broad: None,
        broad_label: None,
    },
];

/// Data coverage: a single contiguous rectangle plus a human description
#[derive(Debug, Clone, Copy)]
pub struct Coverage {
    pub bounds: Rect,
    pub description: &'static str,
}

/// The store's geographic coverage (Indian Ocean region)
pub fn coverage() -> Coverage {
    Coverage {
        bounds: Rect::new(-60.0, 30.0, 20.0, 120.0),
        description: "Indian Ocean region (Arabian Sea, Bay of Bengal, equatorial Indian Ocean)",
    }
}

/// All supported regions
pub fn regions() -> &'static [Region] {
    SUPPORTED
}

/// Regions users commonly ask about that the store cannot serve
pub fn unsupported_regions() -> &'static [Region] {
    UNSUPPORTED
}

/// Find the first supported region whose keywords appear in the query.
///
/// Keywords are matched longest-phrase-first within each region, against
/// the lowercased query.
pub fn find_region(query: &str) -> Option<&'static Region> {
    let query_lower = query.to_lowercase();
    SUPPORTED
        .iter()
        .find(|r| r.keywords.iter().any(|k| query_lower.contains(k)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_region_by_keyword() {
        let r = find_region("temperature in the Bay of Bengal").expect("region");
        assert_eq!(r.name, "Bay of Bengal");
        assert!(find_region("salinity trends in 2023").is_none());
    }

    #[test]
    fn test_broad_rectangles_exist_for_named_regions() {
        for name in ["Bay of Bengal", "Arabian Sea", "Indian Ocean"] {
            let region = regions().iter().find(|r| r.name == name).expect("region");
            assert!(region.broad.is_some(), "{name} should have a broad rect");
        }
    }

    #[test]
    fn test_supported_regions_inside_coverage() {
        let cov = coverage();
        for region in regions() {
            assert!(
                region.bounds.intersects(&cov.bounds),
                "{} outside coverage",
                region.name
            );
        }
    }
}
