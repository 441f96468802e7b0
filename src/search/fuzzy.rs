/// Smallest edit distance between `pattern` and any substring of `text`
/// (Sellers' variant of Levenshtein: a match may start and end anywhere in the
/// text at no cost).
pub fn substring_distance(pattern: &[char], text: &[char]) -> usize {
    let m = pattern.len();
    if m == 0 {
        return 0;
    }

    // column[i]: cost of matching pattern[..i] ending at the current text position
    let mut column: Vec<usize> = (0..=m).collect();
    let mut best = column[m];

    for &t in text {
        let mut diagonal = column[0];
        for i in 1..=m {
            let above = column[i];
            let substitution = diagonal + usize::from(pattern[i - 1] != t);
            column[i] = substitution.min(above + 1).min(column[i - 1] + 1);
            diagonal = above;
        }
        best = best.min(column[m]);
        if best == 0 {
            break;
        }
    }

    best
}

/// Normalised mismatch score in `[0, 1]`: 0 is an exact substring hit, 1 is
/// nothing in common.
pub fn substring_score(pattern: &[char], text: &[char]) -> f64 {
    if pattern.is_empty() {
        return 0.0;
    }
    let distance = substring_distance(pattern, text).min(pattern.len());
    distance as f64 / pattern.len() as f64
}
