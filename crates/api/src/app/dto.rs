use serde::Deserialize;

use stockroom_core::DomainError;
use stockroom_inventory::{Location, Part};

// -------------------------
// Request DTOs
// -------------------------

/// Part as posted by clients; its own `location` is optional because the
/// enclosing [`PartRequest`] usually carries it.
#[derive(Debug, Deserialize)]
pub struct PartPayload {
    pub serial_number: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub quantity: i64,
    pub price: f64,
    pub location: Option<Location>,
}

/// Body of `POST /parts` and `PUT /parts/:serial`.
#[derive(Debug, Deserialize)]
pub struct PartRequest {
    pub part: PartPayload,
    pub location: Option<Location>,
}

impl PartRequest {
    /// Split into the part and the location it goes to.
    ///
    /// The top-level location wins over the one nested in the part.
    pub fn into_parts(self) -> Result<(Part, Location), DomainError> {
        let PartRequest { part, location } = self;
        let location = location
            .or_else(|| part.location.clone())
            .ok_or_else(|| DomainError::validation("location is required"))?;

        let part = Part {
            serial_number: part.serial_number,
            name: part.name,
            description: part.description,
            category: part.category,
            quantity: part.quantity,
            price: part.price,
            location: location.clone(),
        };
        Ok((part, location))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    /// Text query; omitted means "list everything".
    pub t: Option<String>,
}
