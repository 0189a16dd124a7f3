/// Upper bound on suggestions returned for one name.
pub const MAX_SUGGESTIONS: usize = 10;

/// Compute the Levenshtein edit distance between two strings.
///
/// Works on Unicode scalar values; insertions, deletions and substitutions
/// each cost 1.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

/// Rank `candidates` by distance to `target` and keep the closest
/// [`MAX_SUGGESTIONS`].
///
/// Ties keep their input order.
pub fn suggest_names<S: AsRef<str>>(target: &str, candidates: &[S]) -> Vec<String> {
    let mut scored: Vec<(&str, usize)> = candidates
        .iter()
        .map(|c| (c.as_ref(), levenshtein(target, c.as_ref())))
        .collect();
    scored.sort_by_key(|&(_, distance)| distance);
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(name, _)| name.to_string())
        .collect()
}
