//! Greedy line diff over hashed lines.
//!
//! Each original line is matched to the first equal modified line after the previous match. This
//! keeps the relative order of matches and runs in close to linear time, but it is not a minimal
//! edit script: when a block of lines moves, the lines jumped over are reported as added and the
//! moved block as removed, instead of one move.

use std::{collections::HashMap, convert::Infallible};

use serde::{Deserialize, Serialize};

use crate::algorithm::{align::AlignedLine, preprocess::Line};

/// How many original lines are matched between two checkpoints.
pub const CHECKPOINT_INTERVAL: usize = 1_000;

/// Polynomial string hash, `h * 31 + c` over the chars of the line.
pub fn line_hash(line: &str) -> u32 {
    line.chars().fold(0u32, |hash, c| hash.wrapping_mul(31).wrapping_add(c as u32))
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Unchanged,
    Removed,
    Added,
}

/// A run of consecutive lines of the same kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk<'a> {
    pub kind: ChunkKind,
    /// 0-based index of the first line in the original text. For added lines, the original
    /// position they were inserted at.
    pub original_start: usize,
    /// Same as `original_start`, for the modified text.
    pub modified_start: usize,
    pub lines: Vec<&'a str>,
}

impl Chunk<'_> {
    pub fn aligned_lines(&self) -> Vec<AlignedLine> {
        let (o, m) = (self.original_start, self.modified_start);
        self.lines
            .iter()
            .enumerate()
            .map(|(k, content)| match self.kind {
                ChunkKind::Unchanged => AlignedLine::same(&Line::new(o + k, content), &Line::new(m + k, content)),
                ChunkKind::Removed => AlignedLine::removed(&Line::new(o + k, content)),
                ChunkKind::Added => AlignedLine::added(&Line::new(m + k, content)),
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerStats {
    pub unchanged: usize,
    pub added: usize,
    pub removed: usize,
    pub chunks: usize,
    pub total_lines: usize,
}

impl WorkerStats {
    pub fn new(chunks: &[Chunk], total_lines: usize) -> WorkerStats {
        let mut stats = WorkerStats {
            chunks: chunks.len(),
            total_lines,
            ..WorkerStats::default()
        };
        for chunk in chunks {
            let counter = match chunk.kind {
                ChunkKind::Unchanged => &mut stats.unchanged,
                ChunkKind::Added => &mut stats.added,
                ChunkKind::Removed => &mut stats.removed,
            };
            *counter += chunk.lines.len();
        }
        stats
    }
}

/// Positions of the modified lines, grouped by hash.
pub struct HashIndex {
    positions: HashMap<u32, Vec<usize>>,
}

impl HashIndex {
    pub fn build(lines: &[&str]) -> HashIndex {
        let mut positions: HashMap<u32, Vec<usize>> = HashMap::new();
        for (i, line) in lines.iter().enumerate() {
            positions.entry(line_hash(line)).or_default().push(i);
        }
        HashIndex { positions }
    }

    /// The first line of `lines` equal to `line` and positioned after `after`.
    pub fn find_after(&self, lines: &[&str], line: &str, after: Option<usize>) -> Option<usize> {
        let positions = self.positions.get(&line_hash(line))?;
        let start = after.map_or(0, |after| positions.partition_point(|&p| p <= after));
        positions[start..].iter().copied().find(|&p| lines[p] == line)
    }
}

fn push_run<'a>(
    chunks: &mut Vec<Chunk<'a>>,
    kind: ChunkKind,
    lines: &[&'a str],
    original_start: usize,
    modified_start: usize,
) {
    if lines.is_empty() {
        return;
    }
    match chunks.last_mut() {
        Some(last) if last.kind == kind => last.lines.extend_from_slice(lines),
        _ => chunks.push(Chunk {
            kind,
            original_start,
            modified_start,
            lines: lines.to_vec(),
        }),
    }
}

/// Diffs `original` against `modified`, whose lines are indexed by `index`.
///
/// `checkpoint` is called with the number of original lines processed every
/// [`CHECKPOINT_INTERVAL`] lines; an error from it aborts the diff. Within the gap before a match,
/// removed lines come before added ones.
pub fn diff_chunks<'a, E>(
    original: &[&'a str],
    modified: &[&'a str],
    index: &HashIndex,
    mut checkpoint: impl FnMut(usize) -> Result<(), E>,
) -> Result<Vec<Chunk<'a>>, E> {
    let mut chunks = vec![];
    let mut last_match = None;
    let mut next_original = 0;
    let mut next_modified = 0;

    for (i, line) in original.iter().enumerate() {
        if i > 0 && i % CHECKPOINT_INTERVAL == 0 {
            checkpoint(i)?;
        }
        let Some(j) = index.find_after(modified, line, last_match) else {
            continue;
        };
        push_run(&mut chunks, ChunkKind::Removed, &original[next_original..i], next_original, next_modified);
        push_run(&mut chunks, ChunkKind::Added, &modified[next_modified..j], i, next_modified);
        push_run(&mut chunks, ChunkKind::Unchanged, &original[i..=i], i, j);
        last_match = Some(j);
        next_original = i + 1;
        next_modified = j + 1;
    }

    push_run(&mut chunks, ChunkKind::Removed, &original[next_original..], next_original, next_modified);
    push_run(&mut chunks, ChunkKind::Added, &modified[next_modified..], original.len(), next_modified);
    Ok(chunks)
}

pub fn diff_lines<'a>(original: &[&'a str], modified: &[&'a str]) -> Vec<Chunk<'a>> {
    let index = HashIndex::build(modified);
    match diff_chunks::<Infallible>(original, modified, &index, |_| Ok(())) {
        Ok(chunks) => chunks,
        Err(never) => match never {},
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::algorithm::preprocess::split_line_strs;
    use pretty_assertions::assert_eq;

    fn kinds<'a>(chunks: &[Chunk<'a>]) -> Vec<(ChunkKind, Vec<&'a str>)> {
        chunks.iter().map(|chunk| (chunk.kind, chunk.lines.clone())).collect()
    }

    #[test]
    fn hash_is_polynomial() {
        assert_eq!(line_hash(""), 0);
        assert_eq!(line_hash("a"), 97);
        assert_eq!(line_hash("ab"), 97 * 31 + 98);
    }

    #[test]
    fn identical_texts_are_one_chunk() {
        let lines = split_line_strs("a\nb\nc");
        let chunks = diff_lines(&lines, &lines);
        assert_eq!(kinds(&chunks), [(ChunkKind::Unchanged, vec!["a", "b", "c"])]);
    }

    #[test]
    fn gaps_list_removed_before_added() {
        let original = split_line_strs("a\nold\nb");
        let modified = split_line_strs("a\nnew\nb\nc");
        let chunks = diff_lines(&original, &modified);
        assert_eq!(
            kinds(&chunks),
            [
                (ChunkKind::Unchanged, vec!["a"]),
                (ChunkKind::Removed, vec!["old"]),
                (ChunkKind::Added, vec!["new"]),
                (ChunkKind::Unchanged, vec!["b"]),
                (ChunkKind::Added, vec!["c"]),
            ]
        );
        assert_eq!(chunks[2].modified_start, 1);
        assert_eq!(chunks[3].original_start, 2);
        assert_eq!(chunks[3].modified_start, 2);
    }

    #[test]
    fn moved_block_is_not_detected() {
        let original = split_line_strs("x\ny\na\nb");
        let modified = split_line_strs("a\nb\nx\ny");
        let chunks = diff_lines(&original, &modified);
        let stats = WorkerStats::new(&chunks, 8);
        assert_eq!(stats.unchanged, 2);
        assert_eq!(stats.added, 2);
        assert_eq!(stats.removed, 2);
    }

    #[test]
    fn duplicates_match_greedily() {
        // The second `a` takes the next free `a`, which leaves no `b` after it.
        let original = split_line_strs("a\na\nb");
        let modified = split_line_strs("a\nb\na");
        let chunks = diff_lines(&original, &modified);
        assert_eq!(
            kinds(&chunks),
            [
                (ChunkKind::Unchanged, vec!["a"]),
                (ChunkKind::Added, vec!["b"]),
                (ChunkKind::Unchanged, vec!["a"]),
                (ChunkKind::Removed, vec!["b"]),
            ]
        );
    }

    #[test]
    fn colliding_hashes_are_verified() {
        // "Aa" and "BB" share a hash.
        assert_eq!(line_hash("Aa"), line_hash("BB"));
        let original = ["Aa"];
        let modified = ["BB"];
        let chunks = diff_lines(&original, &modified);
        assert_eq!(
            kinds(&chunks),
            [(ChunkKind::Removed, vec!["Aa"]), (ChunkKind::Added, vec!["BB"])]
        );
    }

    #[test]
    fn aligned_lines_have_line_numbers() {
        let original = split_line_strs("a\nold\nb");
        let modified = split_line_strs("a\nb");
        let chunks = diff_lines(&original, &modified);
        let lines: Vec<_> = chunks.iter().flat_map(Chunk::aligned_lines).collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1].original_line_number, Some(2));
        assert_eq!(lines[1].modified_line_number, None);
        assert_eq!(lines[2].original_line_number, Some(3));
        assert_eq!(lines[2].modified_line_number, Some(2));
    }

    #[test]
    fn checkpoint_error_aborts() {
        let lines: Vec<String> = (0..2_500).map(|i| i.to_string()).collect();
        let lines: Vec<&str> = lines.iter().map(String::as_str).collect();
        let index = HashIndex::build(&lines);
        let mut seen = vec![];
        let result = diff_chunks(&lines, &lines, &index, |done| {
            seen.push(done);
            if done >= 2_000 {
                Err("stop")
            } else {
                Ok(())
            }
        });
        assert_eq!(result, Err("stop"));
        assert_eq!(seen, [1_000, 2_000]);
    }
}
