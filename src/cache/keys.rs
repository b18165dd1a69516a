//! Cache key definitions.
//!
//! Keys are derived deterministically from query parameters so that a
//! repeated read lands on the same entry, and every listing namespace has
//! a wildcard pattern that covers all of its pages for invalidation.

use std::fmt;

/// Listing namespaces that are cached page-by-page and invalidated as a
/// whole when any row in the collection changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListingKind {
    Sales,
    Customers,
    Products,
}

impl ListingKind {
    pub fn namespace(self) -> &'static str {
        match self {
            ListingKind::Sales => "sales",
            ListingKind::Customers => "customers",
            ListingKind::Products => "products",
        }
    }

    /// Wildcard pattern matching every cached page of this listing.
    pub fn pattern(self) -> String {
        format!("{}:page:*", self.namespace())
    }
}

/// A single cache entry address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// One page of a paginated listing.
    Listing {
        kind: ListingKind,
        page: u32,
        limit: u32,
    },
    /// One sale with customer and product joined in.
    SaleDetail { id: i64 },
}

impl CacheKey {
    pub fn sales_page(page: u32, limit: u32) -> Self {
        Self::Listing {
            kind: ListingKind::Sales,
            page,
            limit,
        }
    }

    pub fn listing(kind: ListingKind, page: u32, limit: u32) -> Self {
        Self::Listing { kind, page, limit }
    }

    pub fn sale_detail(id: i64) -> Self {
        Self::SaleDetail { id }
    }

    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Listing { kind, page, limit } => {
                write!(f, "{}:page:{page}:limit:{limit}", kind.namespace())
            }
            CacheKey::SaleDetail { id } => write!(f, "sale:{id}"),
        }
    }
}

/// Match a key against a glob pattern where `*` spans any run of
/// characters. This mirrors Redis `SCAN MATCH` closely enough for the
/// pattern shapes used here; the in-process backend relies on it.
pub fn key_matches(key: &str, pattern: &str) -> bool {
    fn matches(key: &[u8], pattern: &[u8]) -> bool {
        match pattern.first() {
            None => key.is_empty(),
            Some(b'*') => {
                // Try every split point for the run the star absorbs.
                let rest = &pattern[1..];
                (0..=key.len()).any(|skip| matches(&key[skip..], rest))
            }
            Some(ch) => key.first() == Some(ch) && matches(&key[1..], &pattern[1..]),
        }
    }

    matches(key.as_bytes(), pattern.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_listing_keys_deterministically() {
        let key = CacheKey::sales_page(1, 10);
        assert_eq!(key.render(), "sales:page:1:limit:10");
        assert_eq!(key, CacheKey::sales_page(1, 10));

        let customers = CacheKey::listing(ListingKind::Customers, 3, 25);
        assert_eq!(customers.render(), "customers:page:3:limit:25");
    }

    #[test]
    fn renders_detail_keys() {
        assert_eq!(CacheKey::sale_detail(42).render(), "sale:42");
    }

    #[test]
    fn listing_pattern_covers_every_page() {
        let pattern = ListingKind::Sales.pattern();
        assert!(key_matches("sales:page:1:limit:10", &pattern));
        assert!(key_matches("sales:page:17:limit:100", &pattern));
        assert!(!key_matches("sale:17", &pattern));
        assert!(!key_matches("customers:page:1:limit:10", &pattern));
    }

    #[test]
    fn wildcard_matching_edge_cases() {
        assert!(key_matches("anything", "*"));
        assert!(key_matches("sales:page:1:limit:10", "sales:page:*:limit:*"));
        assert!(!key_matches("sales:page", "sales:page:*"));
        assert!(key_matches("sales:page:", "sales:page:*"));
        assert!(!key_matches("xsales:page:1", "sales:page:*"));
    }

    #[test]
    fn detail_keys_are_outside_listing_namespaces() {
        for kind in [
            ListingKind::Sales,
            ListingKind::Customers,
            ListingKind::Products,
        ] {
            assert!(!key_matches(
                &CacheKey::sale_detail(7).render(),
                &kind.pattern()
            ));
        }
    }
}
