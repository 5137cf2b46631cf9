use indexmap::IndexMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::format::decode;

/// A labeled file tree held in memory: a leaf is file contents, a branch is
/// an ordered name -> entry mapping. The filesystem mapper converts between
/// this and the IR; only `read`/`write` below ever touch the disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FsTree {
    File(String),
    Dir(IndexMap<String, FsTree>),
}

/// Materialize a tree at `path`, creating directories as needed. Writes are
/// synchronous and not transactional: entries already written stay on disk
/// if a later one fails.
pub fn write(tree: &FsTree, path: &Path) -> io::Result<()> {
    match tree {
        FsTree::File(contents) => fs::write(path, contents),
        FsTree::Dir(entries) => {
            fs::create_dir_all(path)?;
            for (name, child) in entries {
                write(child, &path.join(name))?;
            }
            Ok(())
        }
    }
}

/// Load the tree rooted at `path`, decoding file contents with `encoding`.
/// Directory entries are read in name order so the result does not depend on
/// filesystem iteration order.
pub fn read(path: &Path, encoding: &str) -> io::Result<FsTree> {
    if !fs::metadata(path)?.is_dir() {
        return Ok(FsTree::File(decode(encoding, &fs::read(path)?)?));
    }
    let mut names: Vec<String> = fs::read_dir(path)?
        .map(|entry| Ok(entry?.file_name().to_string_lossy().into_owned()))
        .collect::<io::Result<_>>()?;
    names.sort();
    let mut entries = IndexMap::new();
    for name in names {
        let child = read(&path.join(&name), encoding)?;
        entries.insert(name, child);
    }
    Ok(FsTree::Dir(entries))
}
