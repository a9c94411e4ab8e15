//! Field shape rules shared by the boundary types.
//!
//! These checks run before any store access. Lengths are counted in Unicode
//! scalar values, not bytes.

use stockroom_core::{DomainError, DomainResult};

/// Maximum length of names, serial numbers and room labels.
pub const DEFAULT_MAX_LEN: usize = 20;

/// Maximum length of a part description.
pub const DESCRIPTION_MAX_LEN: usize = 50;

pub(crate) fn text_len(field: &str, value: &str, min: usize, max: usize) -> DomainResult<()> {
    let len = value.chars().count();
    if len < min || len > max {
        let bounds = if min == 0 {
            format!("at most {max} characters")
        } else {
            format!("between {min} and {max} characters")
        };
        return Err(DomainError::validation(format!(
            "{field} must be {bounds} long (got {len})"
        )));
    }
    Ok(())
}

pub(crate) fn int_range(field: &str, value: i64, min: i64, max: Option<i64>) -> DomainResult<()> {
    let too_high = max.is_some_and(|m| value > m);
    if value < min || too_high {
        let bounds = match max {
            Some(max) => format!("between {min} and {max}"),
            None => format!("at least {min}"),
        };
        return Err(DomainError::validation(format!(
            "{field} must be {bounds} (got {value})"
        )));
    }
    Ok(())
}
