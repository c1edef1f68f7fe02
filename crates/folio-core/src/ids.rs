//! Identifier types and injectable id generators.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Identifier of a page, unique within a document.
    PageId
);
string_id!(
    /// Identifier of an element, unique within a document.
    ElementId
);
string_id!(
    /// Identifier of an uploaded asset.
    AssetId
);

/// What an identifier is being generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Page,
    Element,
    Asset,
}

impl IdKind {
    /// Prefix used in generated identifiers.
    pub fn prefix(self) -> &'static str {
        match self {
            IdKind::Page => "page",
            IdKind::Element => "el",
            IdKind::Asset => "asset",
        }
    }
}

/// Source of fresh identifiers.
///
/// The store owns one generator and uses it for every page and element it
/// creates, so tests can swap in [`SequentialIds`] for deterministic output.
pub trait IdGenerator {
    /// Produce a fresh identifier string for the given kind.
    fn generate(&mut self, kind: IdKind) -> String;

    fn page_id(&mut self) -> PageId {
        PageId(self.generate(IdKind::Page))
    }

    fn element_id(&mut self) -> ElementId {
        ElementId(self.generate(IdKind::Element))
    }

    fn asset_id(&mut self) -> AssetId {
        AssetId(self.generate(IdKind::Asset))
    }
}

/// Monotonic per-kind counters: `page-1`, `page-2`, `el-1`, ...
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    pages: u64,
    elements: u64,
    assets: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn generate(&mut self, kind: IdKind) -> String {
        let counter = match kind {
            IdKind::Page => &mut self.pages,
            IdKind::Element => &mut self.elements,
            IdKind::Asset => &mut self.assets,
        };
        *counter += 1;
        format!("{}-{}", kind.prefix(), counter)
    }
}

/// Random v4 UUID suffixes, for interactive sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn generate(&mut self, kind: IdKind) -> String {
        format!("{}-{}", kind.prefix(), Uuid::new_v4().simple())
    }
}
