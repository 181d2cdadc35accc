use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::{DateIndex, IndexError, IndexNode};

/// Per-symbol cache of [`DateIndex`]es backed by `<dir>/<symbol>.csv` files.
///
/// A symbol is loaded the first time any query touches it and stays cached
/// until [`evict`](SymbolIndex::evict)ed. Queries therefore take `&mut self`.
#[derive(Debug)]
pub struct SymbolIndex {
    dir: PathBuf,
    symbols: HashMap<String, DateIndex>,
}

impl SymbolIndex {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            symbols: HashMap::new(),
        }
    }

    /// Directory holding the index files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of `symbol`'s index file.
    ///
    /// # Errors
    ///
    /// [`IndexError::InvalidSymbol`] if `symbol` cannot name a file.
    pub fn index_path(&self, symbol: &str) -> Result<PathBuf, IndexError> {
        index_path(&self.dir, symbol)
    }

    pub fn is_loaded(&self, symbol: &str) -> bool {
        self.symbols.contains_key(symbol)
    }

    /// Symbols currently cached, in no particular order.
    pub fn loaded_symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.keys().map(String::as_str)
    }

    /// Loads `symbol` from disk unless it is already cached, and returns its
    /// index for mutation.
    ///
    /// A missing index file yields an empty index. A symbol whose file fails
    /// to load is not cached, so the next call retries.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidSymbol`] for a symbol that cannot name a
    /// file, [`IndexError::Parse`] for a malformed line and
    /// [`IndexError::Io`] for any I/O failure other than `NotFound`.
    pub fn load(&mut self, symbol: &str) -> Result<&mut DateIndex, IndexError> {
        let path = index_path(&self.dir, symbol)?;
        match self.symbols.entry(symbol.to_string()) {
            Entry::Occupied(e) => Ok(e.into_mut()),
            Entry::Vacant(e) => {
                let index = read_index_file(&path)?;
                debug!(symbol, nodes = index.len(), "loaded index");
                Ok(e.insert(index))
            }
        }
    }

    /// Drops `symbol` from the cache without persisting it. The next query
    /// reloads it from disk.
    pub fn evict(&mut self, symbol: &str) -> Option<DateIndex> {
        self.symbols.remove(symbol)
    }

    /// Rewrites the index file of every dirty symbol, omitting tombstones,
    /// and marks it clean. Returns the number of files written.
    ///
    /// Each file is replaced atomically (temp file, fsync, rename). On error
    /// the failing symbol stays dirty; symbols already written stay clean.
    pub fn persist(&mut self) -> Result<usize, IndexError> {
        let mut written = 0;

        for (symbol, index) in self.symbols.iter_mut() {
            if !index.is_dirty() {
                continue;
            }

            fs::create_dir_all(&self.dir)?;
            let path = index_path(&self.dir, symbol)?;
            write_index_file(&path, index)?;
            index.mark_clean();
            written += 1;

            debug!(symbol = symbol.as_str(), nodes = index.live().count(), "persisted index");
        }

        Ok(written)
    }

    /// Exact-date lookup.
    pub fn lookup(&mut self, symbol: &str, date: u64) -> Result<Option<IndexNode>, IndexError> {
        Ok(self.load(symbol)?.get(date))
    }

    pub fn first(&mut self, symbol: &str) -> Result<Option<IndexNode>, IndexError> {
        Ok(self.load(symbol)?.first())
    }

    pub fn last(&mut self, symbol: &str) -> Result<Option<IndexNode>, IndexError> {
        Ok(self.load(symbol)?.last())
    }

    /// Strict predecessor of `date`.
    pub fn prev(&mut self, symbol: &str, date: u64) -> Result<Option<IndexNode>, IndexError> {
        Ok(self.load(symbol)?.prev(date))
    }

    /// Strict successor of `date`.
    pub fn next(&mut self, symbol: &str, date: u64) -> Result<Option<IndexNode>, IndexError> {
        Ok(self.load(symbol)?.next(date))
    }
}

fn index_path(dir: &Path, symbol: &str) -> Result<PathBuf, IndexError> {
    config::index_file_in(dir, symbol).map_err(IndexError::InvalidSymbol)
}

fn read_index_file(path: &Path) -> Result<DateIndex, IndexError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DateIndex::new()),
        Err(e) => return Err(e.into()),
    };

    let mut nodes = Vec::new();
    for (line_num, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let node = line.parse::<IndexNode>().map_err(|source| IndexError::Parse {
            path: path.to_path_buf(),
            line: line_num + 1,
            source,
        })?;
        nodes.push(node);
    }

    Ok(nodes.into_iter().collect())
}

fn write_index_file(path: &Path, index: &DateIndex) -> Result<(), IndexError> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    {
        let f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        let mut w = BufWriter::new(f);
        for node in index.live() {
            writeln!(w, "{}", node)?;
        }
        let f = w.into_inner().map_err(|e| e.into_error())?;
        f.sync_all()?;
    }

    fs::rename(&tmp_path, path)?;
    Ok(())
}
