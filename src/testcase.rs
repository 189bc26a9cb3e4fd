//! Pairs of `NAME.left` / `NAME.right` files used by the auxiliary tools.

use std::{
    ffi::OsStr,
    fs::{read_dir, read_to_string},
    path::Path,
};

use anyhow::Context as _;
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Testcase {
    pub name: String,
    pub original: String,
    pub modified: String,
}

/// Reads every testcase in `directory` whose name matches `filter`, sorted by name. A `.left`
/// file without a `.right` partner is skipped.
pub fn load_testcases(directory: &Path, filter: &Regex) -> anyhow::Result<Vec<Testcase>> {
    let mut testcases = vec![];
    let entries = read_dir(directory).with_context(|| format!("cannot list {}", directory.display()))?;
    for entry in entries {
        let left = entry?.path();
        if left.extension() != Some(OsStr::new("left")) {
            continue;
        }
        let Some(name) = left.file_stem().and_then(OsStr::to_str) else {
            continue;
        };
        if !filter.is_match(name) {
            continue;
        }
        let right = left.with_extension("right");
        if !right.exists() {
            continue;
        }
        testcases.push(Testcase {
            name: name.to_owned(),
            original: read_to_string(&left)?,
            modified: read_to_string(&right)?,
        });
    }
    testcases.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(testcases)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    #[test]
    fn finds_complete_pairs() {
        let directory = std::env::temp_dir().join(format!("notediff-testcases-{}", std::process::id()));
        fs::create_dir_all(&directory).unwrap();
        fs::write(directory.join("b.left"), "x").unwrap();
        fs::write(directory.join("b.right"), "y").unwrap();
        fs::write(directory.join("a.left"), "1").unwrap();
        fs::write(directory.join("a.right"), "2").unwrap();
        fs::write(directory.join("lonely.left"), "").unwrap();
        fs::write(directory.join("notes.txt"), "").unwrap();

        let all = load_testcases(&directory, &Regex::new("").unwrap()).unwrap();
        let names: Vec<_> = all.iter().map(|testcase| testcase.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(all[1].modified, "y");

        let filtered = load_testcases(&directory, &Regex::new("^b").unwrap()).unwrap();
        assert_eq!(filtered.len(), 1);
        fs::remove_dir_all(&directory).unwrap();
    }
}
