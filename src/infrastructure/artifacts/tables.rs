use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use calamine::{open_workbook, Reader, Xlsx};
use tracing::debug;

use crate::domain::DomainError;

/// First worksheet of a workbook, every cell rendered as text.
///
/// The first row names the columns; exported tables may carry an unnamed
/// index column in front, which is simply never projected.
pub(crate) struct Sheet {
    source: String,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Sheet {
    pub(crate) fn open(path: &Path) -> Result<Self, DomainError> {
        if !path.exists() {
            return Err(DomainError::not_found(format!("table {}", path.display())));
        }
        debug!(target: "playground::artifacts", path = %path.display(), "loading table");

        let mut workbook: Xlsx<BufReader<File>> = open_workbook(path).map_err(|err| {
            DomainError::storage(format!("failed to open {}: {err}", path.display()))
        })?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| DomainError::storage(format!("{} has no worksheet", path.display())))?
            .map_err(|err| DomainError::storage(format!("failed to read {}: {err}", path.display())))?;

        let mut rows = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string().trim().to_string()).collect::<Vec<_>>());
        let header = rows.next().unwrap_or_default();

        Ok(Self {
            source: path.display().to_string(),
            header,
            rows: rows.collect(),
        })
    }

    fn column(&self, name: &str) -> Result<usize, DomainError> {
        self.header
            .iter()
            .position(|column| column == name)
            .ok_or_else(|| {
                DomainError::storage(format!("{} has no '{name}' column", self.source))
            })
    }

    /// Values of `columns` for every non-blank row, in sheet order.
    pub(crate) fn project<const N: usize>(
        &self,
        columns: [&str; N],
    ) -> Result<Vec<[String; N]>, DomainError> {
        let mut indices = [0usize; N];
        for (slot, name) in indices.iter_mut().zip(columns) {
            *slot = self.column(name)?;
        }

        Ok(self
            .rows
            .iter()
            .map(|row| indices.map(|i| row.get(i).cloned().unwrap_or_default()))
            .filter(|values| values.iter().any(|value| !value.is_empty()))
            .collect())
    }
}
