// SPDX-License-Identifier: PMPL-1.0-or-later
//! Contrast rule - WCAG 1.4.3 Contrast Minimum (Level AA)
//!
//! Flags nodes whose inline foreground and background colours are the same
//! colour. This is an equality check only; it does not compute a luminance
//! contrast ratio.

use crate::diagnostic::{Diagnostic, GuidelineLevel, Kind, Severity};
use crate::error::Result;
use crate::rules::{Rule, RuleCategory};
use crate::tree::InterfaceTree;
use regex::Regex;
use std::sync::OnceLock;

pub struct ContrastRule;

impl Rule for ContrastRule {
    fn id(&self) -> &str {
        "contrast"
    }

    fn category(&self) -> RuleCategory {
        RuleCategory::Contrast
    }

    fn description(&self) -> &str {
        "Flags identical foreground/background colour pairs (WCAG 1.4.3)"
    }

    fn level(&self) -> GuidelineLevel {
        GuidelineLevel::AA
    }

    fn evaluate(&self, tree: &InterfaceTree) -> Result<Vec<Diagnostic>> {
        let mut findings = Vec::new();

        for id in tree.walk() {
            let Some(style) = tree.get(id).and_then(|n| n.attr("style")) else {
                continue;
            };
            let (Some(fg), Some(bg)) = style_colors(style) else {
                continue;
            };
            if same_color(&fg, &bg) {
                findings.push(
                    Diagnostic::new(
                        "contrast/identical-colors",
                        RuleCategory::Contrast,
                        Kind::Error,
                        Severity::High,
                        &format!(
                            "Text colour {} is the same as its background {}; the text is invisible.",
                            fg, bg
                        ),
                    )
                    .with_guideline("1.4.3", GuidelineLevel::AA)
                    .at_node(tree, id)
                    .with_suggestion("Choose foreground and background colours with at least 4.5:1 contrast"),
                );
            }
        }

        Ok(findings)
    }
}

/// Extract `color` and `background-color`/`background` from an inline style
fn style_colors(style: &str) -> (Option<String>, Option<String>) {
    let mut fg = None;
    let mut bg = None;
    for decl in style.split(';') {
        let Some((prop, value)) = decl.split_once(':') else {
            continue;
        };
        let value = value.trim().to_lowercase();
        if value.is_empty() {
            continue;
        }
        match prop.trim().to_lowercase().as_str() {
            "color" => fg = Some(value),
            "background-color" => bg = Some(value),
            "background" if bg.is_none() && parse_color(&value).is_some() => bg = Some(value),
            _ => {}
        }
    }
    (fg, bg)
}

/// Same parsed RGB, or the same normalised string when either side is unparseable
fn same_color(a: &str, b: &str) -> bool {
    match (parse_color(a), parse_color(b)) {
        (Some(x), Some(y)) => x == y,
        _ => normalize(a) == normalize(b),
    }
}

fn normalize(value: &str) -> String {
    value.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase()
}

/// Parse a CSS hex color (#rgb, #rrggbb) into (r, g, b) components
pub fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let hex = hex.trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }
    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some((r, g, b))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some((r, g, b))
        }
        _ => None,
    }
}

/// Parse an rgb() or rgba() color into (r, g, b)
pub fn parse_rgb_color(value: &str) -> Option<(u8, u8, u8)> {
    static RGB: OnceLock<Regex> = OnceLock::new();
    let re = RGB.get_or_init(|| {
        Regex::new(r"rgba?\(\s*(\d+)\s*,\s*(\d+)\s*,\s*(\d+)").expect("valid regex")
    });
    let caps = re.captures(value)?;
    let r: u8 = caps[1].parse().ok()?;
    let g: u8 = caps[2].parse().ok()?;
    let b: u8 = caps[3].parse().ok()?;
    Some((r, g, b))
}

/// Parse any CSS color value into (r, g, b)
pub fn parse_color(value: &str) -> Option<(u8, u8, u8)> {
    let trimmed = value.trim().to_lowercase();
    if trimmed.starts_with('#') {
        parse_hex_color(&trimmed)
    } else if trimmed.starts_with("rgb") {
        parse_rgb_color(&trimmed)
    } else {
        parse_named_color(&trimmed)
    }
}

fn parse_named_color(name: &str) -> Option<(u8, u8, u8)> {
    match name {
        "white" => Some((255, 255, 255)),
        "black" => Some((0, 0, 0)),
        "red" => Some((255, 0, 0)),
        "green" => Some((0, 128, 0)),
        "blue" => Some((0, 0, 255)),
        "yellow" => Some((255, 255, 0)),
        "gray" | "grey" => Some((128, 128, 128)),
        "silver" => Some((192, 192, 192)),
        "navy" => Some((0, 0, 128)),
        "orange" => Some((255, 165, 0)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::NodeSpec;

    fn run(style: &str) -> Vec<Diagnostic> {
        let mut tree = InterfaceTree::new();
        tree.append(tree.root(), NodeSpec::new("span").attr("style", style).text("QC passed"))
            .unwrap();
        ContrastRule.evaluate(&tree).unwrap()
    }

    #[test]
    fn test_identical_colors_flagged() {
        let findings = run("color: #ffffff; background-color: white");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity(), Severity::High);
        assert_eq!(findings[0].guideline_level, GuidelineLevel::AA);
        assert_eq!(findings[0].guideline_id, "1.4.3");
    }

    #[test]
    fn test_low_but_distinct_contrast_not_flagged() {
        // Equality check only: near-identical colours pass
        assert!(run("color: #777; background-color: #787878").is_empty());
    }

    #[test]
    fn test_unparseable_colors_compare_as_strings() {
        assert_eq!(run("color: var(--fg); background: var(--fg)").len(), 0);
        assert_eq!(run("color: var(--fg); background-color: var( --fg )").len(), 1);
    }

    #[test]
    fn test_missing_pair_ignored() {
        assert!(run("color: red").is_empty());
    }

    #[test]
    fn test_parse_color_forms() {
        assert_eq!(parse_color("#fff"), Some((255, 255, 255)));
        assert_eq!(parse_color("rgb(1, 2, 3)"), Some((1, 2, 3)));
        assert_eq!(parse_color("navy"), Some((0, 0, 128)));
        assert_eq!(parse_color("#12"), None);
    }
}
