use std::fmt;

use crate::util::address::CellOffset;

/// Counters kept by every plan since it was created.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GcStats {
    /// Collections run, whether triggered by an allocation failure or requested by the user.
    pub collections: usize,
    pub objects_allocated: usize,
    pub objects_reclaimed: usize,
    pub cells_reclaimed: CellOffset,
    /// Objects evacuated by a copying collector.
    pub objects_copied: usize,
}

impl fmt::Display for GcStats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "collections: {}, allocated: {}, reclaimed: {} ({} cells), copied: {}",
            self.collections,
            self.objects_allocated,
            self.objects_reclaimed,
            self.cells_reclaimed,
            self.objects_copied
        )
    }
}
