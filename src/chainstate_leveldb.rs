use rusty_leveldb::{DBIterator, LdbIterator, Options, DB};
use std::path::Path;

use crate::error::DumpError;
use crate::store::{ChainstateRawEntry, ChainstateStore, RawEntryIter};

/// Read-only chainstate LevelDB reader.
///
/// Opens an existing `chainstate` directory (the node must be stopped, or the
/// directory copied, since LevelDB holds an exclusive lock) and exposes it as
/// a [`ChainstateStore`]. Nothing is ever written back.
pub struct LevelDbChainstate {
    db: DB,
}

impl LevelDbChainstate {
    pub fn open(chainstate_path: &Path) -> Result<Self, DumpError> {
        let mut opts = Options::default();
        opts.create_if_missing = false;
        let db = DB::open(chainstate_path, opts).map_err(|e| {
            DumpError::Store(format!("cannot open {}: {}", chainstate_path.display(), e))
        })?;
        tracing::info!(path = %chainstate_path.display(), "Opened chainstate LevelDB");
        Ok(LevelDbChainstate { db })
    }

    /// Wrap an already opened database.
    pub fn from_db(db: DB) -> Self {
        LevelDbChainstate { db }
    }
}

impl ChainstateStore for LevelDbChainstate {
    fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, DumpError> {
        Ok(self.db.get(key).map(|v| v.to_vec()))
    }

    fn range<'a>(&'a mut self, start: &[u8], end: &[u8]) -> Result<RawEntryIter<'a>, DumpError> {
        let mut iter = self
            .db
            .new_iter()
            .map_err(|e| DumpError::Store(format!("cannot create iterator: {}", e)))?;
        iter.seek(start);
        Ok(Box::new(LevelDbRange {
            iter,
            end: end.to_vec(),
            positioned: true,
            done: false,
        }))
    }
}

/// Forward-only walk from a seek position up to an exclusive end key.
struct LevelDbRange {
    iter: DBIterator,
    end: Vec<u8>,
    /// `seek` already placed the cursor on the first entry.
    positioned: bool,
    done: bool,
}

impl Iterator for LevelDbRange {
    type Item = Result<ChainstateRawEntry, DumpError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.positioned {
            self.positioned = false;
        } else if !self.iter.advance() {
            self.done = true;
            return None;
        }

        let (mut key, mut value) = (Vec::new(), Vec::new());
        if !self.iter.current(&mut key, &mut value) || key.as_slice() >= self.end.as_slice() {
            self.done = true;
            return None;
        }
        Some(Ok((key, value)))
    }
}
