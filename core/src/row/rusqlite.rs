//! [`IntoRawRow`] for [`rusqlite::Row`].

use crate::error::Result;
use crate::row::{IntoRawRow, RawRow};
use crate::value::Value;

impl IntoRawRow for ::rusqlite::Row<'_> {
    fn to_raw_row(&self) -> Result<RawRow> {
        let width = self.as_ref().column_count();
        let mut values = Vec::with_capacity(width);
        for index in 0..width {
            values.push(self.get::<_, Value>(index)?);
        }
        Ok(values)
    }
}
