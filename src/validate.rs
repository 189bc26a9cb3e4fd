use crate::algorithm::{
    align::{AlignedLine, LineType},
    char_diff::{reconstruct, DiffSpan},
    matcher::Match,
};

pub fn validate_matches(matches: &[Match], original_len: usize, modified_len: usize) -> Vec<String> {
    let mut errors = vec![];

    fn side_str(side: usize, index: usize) -> String {
        let side_name = ["Original", "Modified"][side];
        format!("{side_name} line {index}")
    }

    let lens = [original_len, modified_len];
    let mut used: [Vec<Vec<usize>>; 2] = [vec![vec![]; original_len], vec![vec![]; modified_len]];
    for (match_index, m) in matches.iter().enumerate() {
        let indices = [m.original_index, m.modified_index];
        if indices.iter().all(Option::is_none) {
            errors.push(format!("Match #{match_index} has no line on either side"));
        }
        if !(0.0..=1.0).contains(&m.similarity) {
            errors.push(format!("Match #{match_index} has similarity {} outside of [0, 1]", m.similarity));
        }
        for side in 0..2 {
            match indices[side] {
                Some(index) if index >= lens[side] => {
                    errors.push(format!("Match #{match_index} refers to {}, past the end", side_str(side, index)));
                }
                Some(index) => used[side][index].push(match_index),
                None => {}
            }
        }
    }

    // Every line should be in exactly one match.
    for side in 0..2 {
        for (index, users) in used[side].iter().enumerate() {
            match users.len() {
                0 => errors.push(format!("{} is not in any match", side_str(side, index))),
                1 => {}
                _ => errors.push(format!("{} is in multiple matches: {users:?}", side_str(side, index))),
            }
        }
    }

    errors
}

pub fn validate_spans(spans: &[DiffSpan], old: &str, new: &str) -> Vec<String> {
    let mut errors = vec![];

    for (side, expected) in [old, new].into_iter().enumerate() {
        let actual = reconstruct(spans, side);
        if actual != expected {
            let side_name = ["old", "new"][side];
            errors.push(format!("Spans rebuild the {side_name} text as {actual:?} instead of {expected:?}"));
        }
    }
    for (i, span) in spans.iter().enumerate() {
        if span.text.is_empty() {
            errors.push(format!("Span #{i} ({:?}) is empty", span.op));
        }
    }
    for (i, pair) in spans.windows(2).enumerate() {
        if pair[0].op == pair[1].op {
            errors.push(format!("Spans #{i} and #{} are both {:?}", i + 1, pair[0].op));
        }
    }

    errors
}

pub fn validate_alignment(lines: &[AlignedLine], original: &[&str], modified: &[&str]) -> Vec<String> {
    let mut errors = vec![];

    let inputs = [original, modified];
    let mut seen = [vec![false; original.len()], vec![false; modified.len()]];
    let mut last_original = 0;
    for (i, line) in lines.iter().enumerate() {
        let numbers = [line.original_line_number, line.modified_line_number];
        let contents = [&line.original_content, &line.modified_content];
        for side in 0..2 {
            let side_name = ["original", "modified"][side];
            if numbers[side].is_some() != contents[side].is_some() {
                errors.push(format!("Aligned line #{i} has a {side_name} line number xor content"));
            }
            let Some(number) = numbers[side] else {
                continue;
            };
            let Some(index) = number.checked_sub(1).filter(|&index| index < inputs[side].len()) else {
                errors.push(format!("Aligned line #{i} has {side_name} line {number}, out of range"));
                continue;
            };
            if seen[side][index] {
                errors.push(format!("{side_name} line {number} is aligned more than once"));
            }
            seen[side][index] = true;
            if contents[side].as_deref() != Some(inputs[side][index]) {
                errors.push(format!("Aligned line #{i} does not match {side_name} line {number}"));
            }
        }

        // Original lines should be listed in order. Modified lines may cross when matched lines moved.
        if let Some(number) = line.original_line_number {
            if number <= last_original {
                errors.push(format!("Aligned line #{i} has original line {number} after line {last_original}"));
            }
            last_original = number;
        }

        let expected_sides = match line.line_type {
            LineType::Same | LineType::Modified => [true, true],
            LineType::Removed => [true, false],
            LineType::Added => [false, true],
        };
        if expected_sides != [numbers[0].is_some(), numbers[1].is_some()] {
            errors.push(format!("Aligned line #{i} is {:?} but has sides {numbers:?}", line.line_type));
        }
    }
    for side in 0..2 {
        let side_name = ["Original", "Modified"][side];
        for (index, _) in seen[side].iter().enumerate().filter(|(_, is_seen)| !**is_seen) {
            errors.push(format!("{side_name} line {} is not in the alignment", index + 1));
        }
    }

    errors
}

pub fn print_errors(errors: &[String]) {
    if !errors.is_empty() {
        eprintln!("Diff validation errors:");
        for error in errors {
            eprintln!("  {error}");
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::algorithm::{
        align::build_aligned_lines, char_diff::diff_spans, char_diff::SpanOp, matcher::LineMatcher,
        preprocess::{split_line_strs, split_lines},
    };

    #[test]
    fn matcher_output_is_valid() {
        let (original, modified) = ("a\nb\nc\nthe end", "b\nx\na\nthe ends");
        let (o, m) = (split_lines(original), split_lines(modified));
        let matches = LineMatcher::smart().match_lines(&o, &m);
        assert_eq!(validate_matches(&matches, o.len(), m.len()), Vec::<String>::new());
        let lines = build_aligned_lines(&o, &m, &matches);
        let errors = validate_alignment(&lines, &split_line_strs(original), &split_line_strs(modified));
        assert_eq!(errors, Vec::<String>::new());
    }

    #[test]
    fn duplicate_and_missing_lines_are_reported() {
        let matches = [Match::pair(0, 0, 1.0), Match::pair(1, 0, 0.7)];
        let errors = validate_matches(&matches, 3, 1);
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors[0].contains("Original line 2 is not in any match"));
        assert!(errors[1].contains("Modified line 0 is in multiple matches"));
    }

    #[test]
    fn bad_spans_are_reported() {
        assert!(validate_spans(&diff_spans("kitten", "sitting"), "kitten", "sitting").is_empty());
        let spans = [DiffSpan::new(SpanOp::Equal, "a"), DiffSpan::new(SpanOp::Equal, "")];
        let errors = validate_spans(&spans, "ab", "a");
        assert_eq!(errors.len(), 3, "{errors:?}");
    }

    #[test]
    fn out_of_order_alignment_is_reported() {
        let (o, m) = (split_lines("a\nb"), split_lines("a\nb"));
        let mut lines = build_aligned_lines(&o, &m, &LineMatcher::smart().match_lines(&o, &m));
        lines.swap(0, 1);
        assert!(!validate_alignment(&lines, &["a", "b"], &["a", "b"]).is_empty());
    }
}
