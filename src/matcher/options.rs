// src/matcher/options.rs
//! Picking a dropdown / radio option for a resolved answer

const PLACEHOLDER_PREFIXES: &[&str] = &[
    "select",
    "please select",
    "choose",
    "please choose",
    "pick",
    "--",
    "none selected",
];

pub fn is_placeholder(label: &str) -> bool {
    let label = label.trim().to_lowercase();
    label.is_empty() || PLACEHOLDER_PREFIXES.iter().any(|p| label.starts_with(p))
}

fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn contains_words(haystack: &[String], needle: &[String]) -> bool {
    !needle.is_empty()
        && haystack
            .windows(needle.len())
            .any(|window| window == needle)
}

/// Index of the option to pick for `answer`.
///
/// Options containing the answer win, ranked exact > whole word > substring so
/// that "Male" never lands on "Female". Without any containing option the
/// first non-placeholder option is returned.
pub fn choose_option(options: &[String], answer: &str) -> Option<usize> {
    let answer_lc = answer.trim().to_lowercase();
    let answer_words = words(&answer_lc);

    let candidates: Vec<(usize, String)> = options
        .iter()
        .enumerate()
        .filter(|(_, label)| !is_placeholder(label))
        .map(|(i, label)| (i, label.trim().to_lowercase()))
        .collect();

    if !answer_lc.is_empty() {
        if let Some((i, _)) = candidates.iter().find(|(_, label)| *label == answer_lc) {
            return Some(*i);
        }
        if let Some((i, _)) = candidates
            .iter()
            .find(|(_, label)| contains_words(&words(label), &answer_words))
        {
            return Some(*i);
        }
        if let Some((i, _)) = candidates
            .iter()
            .find(|(_, label)| label.contains(&answer_lc))
        {
            return Some(*i);
        }
    }

    candidates.first().map(|(i, _)| *i)
}
