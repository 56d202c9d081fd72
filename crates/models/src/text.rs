/// Lowercase, underscores to spaces, collapse whitespace.
pub fn normalize_name(s: &str) -> String {
    s.replace('_', " ")
        .split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Words ending in -o that pluralise with -es.
const O_ES: [&str; 6] = ["tomato", "potato", "mango", "hero", "echo", "avocado"];
/// Words ending in -ie whose plural is a plain -s.
const IE_S: [&str; 7] = ["cookie", "brownie", "smoothie", "veggie", "pie", "calorie", "movie"];
/// Singular words that happen to end in s.
const KEEP_S: [&str; 6] = ["hummus", "asparagus", "couscous", "molasses", "swiss", "citrus"];

/// Singular form of the last word, for matching ("sweet potatoes" ~ "sweet potato",
/// "shoes" ~ "shoe", "peaches" ~ "peach").
pub fn singular(s: &str) -> String {
    let n = normalize_name(s);
    let (head, last) = match n.rsplit_once(' ') {
        Some((h, l)) => (Some(h), l),
        None => (None, n.as_str()),
    };
    let one = singular_word(last);
    match head {
        Some(h) => format!("{h} {one}"),
        None => one,
    }
}

fn singular_word(w: &str) -> String {
    if w.len() <= 3 || KEEP_S.contains(&w) || !w.ends_with('s') || w.ends_with("ss") || w.ends_with("us") {
        return w.to_string();
    }
    if let Some(stem) = w.strip_suffix("ies") {
        let ie = format!("{stem}ie");
        return if IE_S.contains(&ie.as_str()) { ie } else { format!("{stem}y") };
    }
    if let Some(stem) = w.strip_suffix("oes") {
        let o = format!("{stem}o");
        return if O_ES.contains(&o.as_str()) { o } else { format!("{stem}oe") };
    }
    for suffix in ["ches", "shes", "sses", "xes"] {
        if w.ends_with(suffix) {
            return w[..w.len() - 2].to_string();
        }
    }
    w[..w.len() - 1].to_string()
}

/// Loose ingredient match: singular forms equal, or one contains the other as a word run.
pub fn names_match(a: &str, b: &str) -> bool {
    let (a, b) = (singular(a), singular(b));
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || contains_words(&a, &b) || contains_words(&b, &a)
}

fn contains_words(hay: &str, needle: &str) -> bool {
    let hay: Vec<&str> = hay.split(' ').collect();
    let needle: Vec<&str> = needle.split(' ').collect();
    needle.len() <= hay.len() && hay.windows(needle.len()).any(|w| w == needle.as_slice())
}
