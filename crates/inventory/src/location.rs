use serde::{Deserialize, Serialize};

use stockroom_core::DomainResult;

use crate::validate::{int_range, text_len, DEFAULT_MAX_LEN};

/// Composite physical address of a single storage slot.
///
/// A slot holds at most one part, so two parts must never carry equal
/// locations. Equality is field-by-field (room comparison is case-sensitive).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub room: String,
    /// Bookcases are numbered per room, starting at 1.
    pub bookcase: i64,
    /// Standard bookcases have six shelves.
    pub shelf: i64,
    pub cuvette: i64,
    pub column: i64,
    pub row: i64,
}

impl Location {
    pub const SHELVES: i64 = 6;
    pub const CUVETTES: i64 = 10;
    pub const COLUMNS: i64 = 8;
    pub const ROWS: i64 = 8;

    pub fn validate(&self) -> DomainResult<()> {
        text_len("location.room", &self.room, 1, DEFAULT_MAX_LEN)?;
        int_range("location.bookcase", self.bookcase, 1, None)?;
        int_range("location.shelf", self.shelf, 1, Some(Self::SHELVES))?;
        int_range("location.cuvette", self.cuvette, 1, Some(Self::CUVETTES))?;
        int_range("location.column", self.column, 1, Some(Self::COLUMNS))?;
        int_range("location.row", self.row, 1, Some(Self::ROWS))?;
        Ok(())
    }
}

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "room {}, bookcase {}, shelf {}, cuvette {}, column {}, row {}",
            self.room, self.bookcase, self.shelf, self.cuvette, self.column, self.row
        )
    }
}
