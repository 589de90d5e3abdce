//! Coordinate Reference System handle
//!
//! The handle is opaque to the rest of the crate: rasters only compare
//! two handles and forward them to reprojection collaborators. Nothing
//! here parses or validates a definition.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coordinate Reference System representation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Crs {
    /// WKT representation
    wkt: Option<String>,
    /// EPSG code if known
    epsg: Option<u32>,
    /// PROJ string if available
    proj: Option<String>,
}

impl Crs {
    /// Create a CRS from an EPSG code
    pub fn from_epsg(code: u32) -> Self {
        Self {
            wkt: None,
            epsg: Some(code),
            proj: None,
        }
    }

    /// Create a CRS from a WKT string
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        Self {
            wkt: Some(wkt.into()),
            epsg: None,
            proj: None,
        }
    }

    /// Create a CRS from a PROJ string
    pub fn from_proj(proj: impl Into<String>) -> Self {
        Self {
            wkt: None,
            epsg: None,
            proj: Some(proj.into()),
        }
    }

    /// Tag a raw, loader-supplied definition by its shape.
    ///
    /// `"EPSG:4326"` (any case) becomes an EPSG code, strings starting with
    /// `+proj` a PROJ string, anything else is kept as WKT.
    pub fn from_user_input(input: &str) -> Self {
        let trimmed = input.trim();
        if let Some((authority, code)) = trimmed.split_once(':') {
            if authority.eq_ignore_ascii_case("epsg") {
                if let Ok(code) = code.trim().parse::<u32>() {
                    return Self::from_epsg(code);
                }
            }
        }
        if trimmed.starts_with("+proj") {
            return Self::from_proj(trimmed);
        }
        Self::from_wkt(trimmed)
    }

    /// WGS84 geographic CRS (EPSG:4326)
    pub fn wgs84() -> Self {
        Self::from_epsg(4326)
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Self::from_epsg(3857)
    }

    /// Get EPSG code if known
    pub fn epsg(&self) -> Option<u32> {
        self.epsg
    }

    /// Get WKT representation
    pub fn wkt(&self) -> Option<&str> {
        self.wkt.as_deref()
    }

    /// Get PROJ string
    pub fn proj(&self) -> Option<&str> {
        self.proj.as_deref()
    }

    /// Check if two CRS are equivalent
    pub fn is_equivalent(&self, other: &Crs) -> bool {
        if let (Some(a), Some(b)) = (self.epsg, other.epsg) {
            return a == b;
        }

        // textual comparison only, no normalisation
        if let (Some(a), Some(b)) = (&self.wkt, &other.wkt) {
            return a == b;
        }

        if let (Some(a), Some(b)) = (&self.proj, &other.proj) {
            return a == b;
        }

        false
    }

    /// Get a string identifier for this CRS
    pub fn identifier(&self) -> String {
        if let Some(code) = self.epsg {
            return format!("EPSG:{}", code);
        }
        if let Some(proj) = &self.proj {
            return proj.clone();
        }
        if let Some(wkt) = &self.wkt {
            let end = wkt.char_indices().nth(50).map_or(wkt.len(), |(i, _)| i);
            return format!("WKT:{}", &wkt[..end]);
        }
        "Unknown".to_string()
    }
}

impl PartialEq for Crs {
    fn eq(&self, other: &Self) -> bool {
        self.is_equivalent(other)
    }
}

impl From<u32> for Crs {
    fn from(code: u32) -> Self {
        Self::from_epsg(code)
    }
}

impl From<&str> for Crs {
    fn from(input: &str) -> Self {
        Self::from_user_input(input)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

/// Equality of optional handles: two missing CRSs agree, a missing and a
/// present one do not.
pub fn same_crs(a: Option<&Crs>, b: Option<&Crs>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.is_equivalent(b),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_epsg() {
        let crs = Crs::from_epsg(4326);
        assert_eq!(crs.epsg(), Some(4326));
        assert_eq!(crs.identifier(), "EPSG:4326");
    }

    #[test]
    fn test_crs_equivalence() {
        let a = Crs::from_epsg(4326);
        let b = Crs::wgs84();
        assert!(a.is_equivalent(&b));
        assert_ne!(a, Crs::web_mercator());
    }

    #[test]
    fn test_from_user_input() {
        assert_eq!(Crs::from("epsg:32633").epsg(), Some(32633));
        assert_eq!(
            Crs::from_user_input("+proj=longlat +datum=WGS84").proj(),
            Some("+proj=longlat +datum=WGS84")
        );
        assert!(Crs::from_user_input("GEOGCS[\"WGS 84\"]").wkt().is_some());
    }

    #[test]
    fn test_same_crs() {
        let a = Crs::wgs84();
        assert!(same_crs(None, None));
        assert!(same_crs(Some(&a), Some(&Crs::from_epsg(4326))));
        assert!(!same_crs(Some(&a), None));
    }
}
