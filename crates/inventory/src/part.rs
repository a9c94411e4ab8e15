use serde::{Deserialize, Serialize};

use stockroom_core::{CategoryId, DomainError, DomainResult, Entity};

use crate::location::Location;
use crate::validate::{int_range, text_len, DEFAULT_MAX_LEN, DESCRIPTION_MAX_LEN};

/// Part in boundary form: the category is referenced by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub serial_number: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub quantity: i64,
    pub price: f64,
    pub location: Location,
}

impl Part {
    /// Field shape checks, including the embedded location.
    pub fn validate(&self) -> DomainResult<()> {
        text_len("serial_number", &self.serial_number, 1, DEFAULT_MAX_LEN)?;
        text_len("name", &self.name, 1, DEFAULT_MAX_LEN)?;
        text_len("description", &self.description, 0, DESCRIPTION_MAX_LEN)?;
        text_len("category", &self.category, 1, DEFAULT_MAX_LEN)?;
        int_range("quantity", self.quantity, 0, None)?;
        if !(self.price.is_finite() && self.price > 0.0) {
            return Err(DomainError::validation(format!(
                "price must be greater than 0 (got {})",
                self.price
            )));
        }
        self.location.validate()
    }

    pub fn into_record(self, category: CategoryId) -> PartRecord {
        PartRecord {
            serial_number: self.serial_number,
            name: self.name,
            description: self.description,
            category,
            quantity: self.quantity,
            price: self.price,
            location: self.location,
        }
    }
}

/// Part in stored form: the category is referenced by identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartRecord {
    pub serial_number: String,
    pub name: String,
    pub description: String,
    pub category: CategoryId,
    pub quantity: i64,
    pub price: f64,
    pub location: Location,
}

impl Entity for PartRecord {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.serial_number
    }
}

impl PartRecord {
    pub fn into_boundary(self, category_name: String) -> Part {
        Part {
            serial_number: self.serial_number,
            name: self.name,
            description: self.description,
            category: category_name,
            quantity: self.quantity,
            price: self.price,
            location: self.location,
        }
    }
}
