//! Chart style allow-list and menu selection.

pub const DEFAULT_STYLE: &str = "classic";

/// Styles offered to the user, in menu order.
pub const KNOWN_STYLES: &[&str] = &[
    "seaborn-v0_8",
    "seaborn-v0_8-whitegrid",
    "ggplot",
    "fivethirtyeight",
    "bmh",
    "dark_background",
    "fast",
    "classic",
    "Solarize_Light2",
];

pub fn is_known_style(name: &str) -> bool {
    KNOWN_STYLES.contains(&name)
}

/// Known styles the renderer supports, in menu order.
pub fn available_styles(supported: &[String]) -> Vec<String> {
    KNOWN_STYLES
        .iter()
        .filter(|s| supported.iter().any(|x| x == *s))
        .map(|s| s.to_string())
        .collect()
}

/// `"1: ggplot, 2: bmh"` for a menu line.
pub fn format_menu(available: &[String]) -> String {
    available
        .iter()
        .enumerate()
        .map(|(i, s)| format!("{}: {}", i + 1, s))
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleChoice {
    pub style: String,
    pub fell_back: bool,
}

/// Resolve a 1-based menu answer. Anything that is not a listed number
/// selects `default` instead of failing.
pub fn select_style(input: &str, available: &[String], default: &str) -> StyleChoice {
    let picked = input
        .trim()
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| available.get(i));

    match picked {
        Some(style) => StyleChoice {
            style: style.clone(),
            fell_back: false,
        },
        None => StyleChoice {
            style: default.to_string(),
            fell_back: true,
        },
    }
}
