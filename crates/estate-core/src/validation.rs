//! # Validation Module
//!
//! Input validation for ids, category tags, page sizes, profile names and
//! partial record updates.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Page code                                                    │
//! │  └── Whatever the form allows                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: estate-client controllers                                    │
//! │  └── THIS MODULE: names, page sizes, filters (before any store call)   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Store                                                        │
//! │  ├── Immutable fields (this module, called by estate-db)               │
//! │  └── NOT NULL / PRIMARY KEY constraints                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde_json::{Map, Value};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::query::Collection;
use crate::{MAX_DISPLAY_NAME_LEN, MAX_PAGE_SIZE};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Maximum length of a record identifier.
const MAX_ID_LEN: usize = 128;

/// Maximum length of a category tag.
const MAX_CATEGORY_LEN: usize = 32;

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates an opaque record identifier.
///
/// ## Rules
/// - Must not be blank
/// - At most 128 characters
/// - No `/` (ids are single path segments in the document store)
pub fn validate_record_id(field: &str, id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LEN,
        });
    }

    if id.contains('/') {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: "must not contain '/'".to_string(),
        });
    }

    Ok(())
}

/// Validates a category tag.
///
/// ## Rules
/// - Lowercase ASCII letters, digits and hyphens
/// - 1 to 32 characters
///
/// ## Example
/// ```rust
/// use estate_core::validation::validate_category_tag;
///
/// assert!(validate_category_tag("rent").is_ok());
/// assert!(validate_category_tag("Rent").is_err());
/// assert!(validate_category_tag("").is_err());
/// ```
pub fn validate_category_tag(tag: &str) -> ValidationResult<()> {
    if tag.is_empty() {
        return Err(ValidationError::Required {
            field: "type".to_string(),
        });
    }

    if tag.len() > MAX_CATEGORY_LEN {
        return Err(ValidationError::TooLong {
            field: "type".to_string(),
            max: MAX_CATEGORY_LEN,
        });
    }

    if !tag
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "type".to_string(),
            reason: "must contain only lowercase letters, digits, and hyphens".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Paging
// =============================================================================

/// Validates a page size (must be 1..=100).
pub fn validate_page_size(limit: u32) -> ValidationResult<()> {
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(ValidationError::OutOfRange {
            field: "page_size".to_string(),
            min: 1,
            max: i64::from(MAX_PAGE_SIZE),
        });
    }
    Ok(())
}

// =============================================================================
// Profile
// =============================================================================

/// Validates and normalizes a display name.
///
/// Returns the trimmed name.
///
/// ## Example
/// ```rust
/// use estate_core::validation::normalize_display_name;
///
/// assert_eq!(normalize_display_name("  Bob ").unwrap(), "Bob");
/// assert!(normalize_display_name("   ").is_err());
/// ```
pub fn normalize_display_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_DISPLAY_NAME_LEN,
        });
    }

    Ok(name.to_string())
}

// =============================================================================
// Partial Updates
// =============================================================================

/// Fields the store assigns and clients never write.
pub fn immutable_fields(collection: Collection) -> &'static [&'static str] {
    match collection {
        Collection::Listings => &["id", "userRef", "timestamp"],
        Collection::Users => &["id"],
    }
}

/// Checks a partial update against the collection's immutable fields.
///
/// ## Example
/// ```rust
/// use estate_core::validation::validate_update_fields;
/// use estate_core::Collection;
/// use serde_json::{json, Map, Value};
///
/// let mut fields = Map::new();
/// fields.insert("name".into(), json!("Bob"));
/// assert!(validate_update_fields(Collection::Users, &fields).is_ok());
///
/// fields.insert("id".into(), Value::from("other"));
/// assert!(validate_update_fields(Collection::Users, &fields).is_err());
/// ```
pub fn validate_update_fields(collection: Collection, fields: &Map<String, Value>) -> CoreResult<()> {
    if fields.is_empty() {
        return Err(ValidationError::Required {
            field: "fields".to_string(),
        }
        .into());
    }

    let immutable = immutable_fields(collection);
    if let Some(field) = fields.keys().find(|key| immutable.contains(&key.as_str())) {
        return Err(CoreError::ImmutableField {
            collection: collection.to_string(),
            field: field.clone(),
        });
    }

    Ok(())
}
