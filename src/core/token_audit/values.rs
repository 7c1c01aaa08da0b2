//! Literal value parsing: normalization, colors, lengths, durations, and the
//! property lookup tables that decide which literals are worth tracking.

use std::sync::LazyLock;

use heck::ToKebabCase;
use regex::Regex;

use crate::tokens::TokenType;
use crate::utils::parser::collapse_whitespace;

static LENGTH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-?(?:\d+\.?\d*|\.\d+))(px|rem|em|pt|%|vh|vw|vmin|vmax|ch|ex)?$").unwrap()
});

static DURATION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(-?(?:\d+\.?\d*|\.\d+))(ms|s)$").unwrap());

static COLOR_FUNCTION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(rgba?|hsla?)\(\s*([^)]*)\)$").unwrap());

/// Keywords that are never a hardcoded design value.
pub const SENTINEL_VALUES: &[&str] = &[
    "inherit",
    "initial",
    "unset",
    "revert",
    "auto",
    "none",
    "transparent",
    "currentcolor",
    "normal",
    "0",
    "100%",
];

/// Markers of an expression rather than a literal.
const EXPRESSION_MARKERS: &[&str] = &["var(", "calc(", "env(", "min(", "max(", "clamp(", "${"];

const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("green", [0, 128, 0]),
    ("blue", [0, 0, 255]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("silver", [192, 192, 192]),
    ("maroon", [128, 0, 0]),
    ("purple", [128, 0, 128]),
    ("fuchsia", [255, 0, 255]),
    ("lime", [0, 255, 0]),
    ("olive", [128, 128, 0]),
    ("yellow", [255, 255, 0]),
    ("navy", [0, 0, 128]),
    ("teal", [0, 128, 128]),
    ("aqua", [0, 255, 255]),
    ("orange", [255, 165, 0]),
];

/// Trim, strip one pair of surrounding quotes, collapse whitespace.
///
/// Idempotent: `normalize_value(normalize_value(v)) == normalize_value(v)`.
pub fn normalize_value(value: &str) -> String {
    let mut current = value.trim();
    loop {
        let stripped = strip_quotes(current).trim();
        if stripped.len() == current.len() {
            break;
        }
        current = stripped;
    }
    collapse_whitespace(current)
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['"', '\'', '`'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Format a float without trailing zeros (`16.0` -> `16`, `0.50` -> `0.5`).
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let s = format!("{:.4}", value);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

// ============================================================================
// Colors
// ============================================================================

/// An RGBA color: channels 0-255, alpha 0-1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    /// Lowercase `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn canonical(&self) -> String {
        let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        let base = format!(
            "#{:02x}{:02x}{:02x}",
            channel(self.r),
            channel(self.g),
            channel(self.b)
        );
        let alpha = channel(self.a * 255.0);
        if alpha == u8::MAX {
            base
        } else {
            format!("{}{:02x}", base, alpha)
        }
    }

    /// Closeness in RGBA space: 1.0 for identical colors, 0.0 for black vs. transparent white.
    pub fn similarity(&self, other: &Rgba) -> f64 {
        let dr = self.r - other.r;
        let dg = self.g - other.g;
        let db = self.b - other.b;
        let da = (self.a - other.a) * 255.0;
        let distance = (dr * dr + dg * dg + db * db + da * da).sqrt();
        (1.0 - distance / 510.0).clamp(0.0, 1.0)
    }
}

pub fn parse_color(value: &str) -> Option<Rgba> {
    let v = value.trim().to_lowercase();

    if let Some(hex) = v.strip_prefix('#') {
        return parse_hex(hex);
    }

    if let Some(caps) = COLOR_FUNCTION_PATTERN.captures(&v) {
        let args: Vec<&str> = caps[2]
            .split(|c: char| c == ',' || c == '/' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();
        return if caps[1].starts_with("rgb") {
            parse_rgb_args(&args)
        } else {
            parse_hsl_args(&args)
        };
    }

    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == v)
        .map(|(_, [r, g, b])| Rgba {
            r: *r as f64,
            g: *g as f64,
            b: *b as f64,
            a: 1.0,
        })
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expanded: String = match hex.len() {
        3 | 4 => hex.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => hex.to_string(),
        _ => return None,
    };
    let byte = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).ok().map(f64::from);
    Some(Rgba {
        r: byte(0)?,
        g: byte(2)?,
        b: byte(4)?,
        a: if expanded.len() == 8 { byte(6)? / 255.0 } else { 1.0 },
    })
}

fn parse_alpha(arg: Option<&&str>) -> Option<f64> {
    match arg {
        None => Some(1.0),
        Some(raw) => match raw.strip_suffix('%') {
            Some(pct) => pct.parse::<f64>().ok().map(|p| (p / 100.0).clamp(0.0, 1.0)),
            None => raw.parse::<f64>().ok().map(|a| a.clamp(0.0, 1.0)),
        },
    }
}

fn parse_rgb_args(args: &[&str]) -> Option<Rgba> {
    if args.len() < 3 || args.len() > 4 {
        return None;
    }
    let channel = |raw: &str| -> Option<f64> {
        match raw.strip_suffix('%') {
            Some(pct) => pct.parse::<f64>().ok().map(|p| p * 255.0 / 100.0),
            None => raw.parse::<f64>().ok(),
        }
        .map(|v| v.clamp(0.0, 255.0))
    };
    Some(Rgba {
        r: channel(args[0])?,
        g: channel(args[1])?,
        b: channel(args[2])?,
        a: parse_alpha(args.get(3))?,
    })
}

fn parse_hsl_args(args: &[&str]) -> Option<Rgba> {
    if args.len() < 3 || args.len() > 4 {
        return None;
    }
    let h = args[0].trim_end_matches("deg").parse::<f64>().ok()?.rem_euclid(360.0) / 360.0;
    let s = args[1].trim_end_matches('%').parse::<f64>().ok()?.clamp(0.0, 100.0) / 100.0;
    let l = args[2].trim_end_matches('%').parse::<f64>().ok()?.clamp(0.0, 100.0) / 100.0;

    let (r, g, b) = if s == 0.0 {
        (l, l, l)
    } else {
        let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
        let p = 2.0 * l - q;
        (
            hue_to_rgb(p, q, h + 1.0 / 3.0),
            hue_to_rgb(p, q, h),
            hue_to_rgb(p, q, h - 1.0 / 3.0),
        )
    };

    Some(Rgba {
        r: r * 255.0,
        g: g * 255.0,
        b: b * 255.0,
        a: parse_alpha(args.get(3))?,
    })
}

fn hue_to_rgb(p: f64, q: f64, t: f64) -> f64 {
    let t = t.rem_euclid(1.0);
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 0.5 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}

// ============================================================================
// Lengths and durations
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Length {
    pub value: f64,
    /// Empty for unitless numbers.
    pub unit: String,
}

impl Length {
    /// Convert absolute and root-relative units to pixels.
    pub fn to_px(&self, rem_base_px: f64) -> Option<f64> {
        match self.unit.as_str() {
            "px" => Some(self.value),
            "rem" | "em" => Some(self.value * rem_base_px),
            "pt" => Some(self.value * 4.0 / 3.0),
            _ => None,
        }
    }

    /// Closeness after unit conversion; `None` when units can't be compared.
    pub fn similarity(&self, other: &Length, rem_base_px: f64) -> Option<f64> {
        let (a, b) = match (self.to_px(rem_base_px), other.to_px(rem_base_px)) {
            (Some(a), Some(b)) => (a, b),
            _ if self.unit == other.unit => (self.value, other.value),
            _ => return None,
        };
        let largest = a.abs().max(b.abs());
        if largest == 0.0 {
            return Some(1.0);
        }
        Some((1.0 - (a - b).abs() / largest).clamp(0.0, 1.0))
    }
}

pub fn parse_length(value: &str) -> Option<Length> {
    let v = value.trim().to_lowercase();
    let caps = LENGTH_PATTERN.captures(&v)?;
    Some(Length {
        value: caps[1].parse().ok()?,
        unit: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
    })
}

/// Parse a CSS time value into milliseconds.
pub fn parse_duration(value: &str) -> Option<f64> {
    let v = value.trim().to_lowercase();
    let caps = DURATION_PATTERN.captures(&v)?;
    let n: f64 = caps[1].parse().ok()?;
    Some(if &caps[2] == "s" { n * 1000.0 } else { n })
}

// ============================================================================
// Classification
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Color,
    Length,
    Duration,
    Number,
    Other,
}

pub fn classify_value(value: &str) -> ValueKind {
    if parse_color(value).is_some() {
        return ValueKind::Color;
    }
    if parse_duration(value).is_some() {
        return ValueKind::Duration;
    }
    match parse_length(value) {
        Some(length) if length.unit.is_empty() => ValueKind::Number,
        Some(_) => ValueKind::Length,
        None => ValueKind::Other,
    }
}

/// Canonical comparison key: colors as hex, convertible lengths as px,
/// durations as ms, everything else normalized and lowercased.
pub fn canonical_value(value: &str, rem_base_px: f64) -> String {
    let normalized = normalize_value(value);
    if let Some(color) = parse_color(&normalized) {
        return color.canonical();
    }
    if let Some(ms) = parse_duration(&normalized) {
        return format!("{}ms", format_number(ms));
    }
    if let Some(length) = parse_length(&normalized) {
        if let Some(px) = length.to_px(rem_base_px) {
            return format!("{}px", format_number(px));
        }
        return format!("{}{}", format_number(length.value), length.unit);
    }
    normalized.to_lowercase()
}

/// What a style property holds, for matching literals to token types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Color,
    Spacing,
    Sizing,
    Typography,
    Radius,
    Shadow,
    Border,
    Timing,
    Other,
}

/// Property-name prefixes, matched as `name == prefix` or `name` starting with `prefix-`.
const PROPERTY_PREFIXES: &[(&str, PropertyKind)] = &[
    ("margin", PropertyKind::Spacing),
    ("padding", PropertyKind::Spacing),
    ("gap", PropertyKind::Spacing),
    ("row-gap", PropertyKind::Spacing),
    ("column-gap", PropertyKind::Spacing),
    ("inset", PropertyKind::Spacing),
    ("top", PropertyKind::Spacing),
    ("right", PropertyKind::Spacing),
    ("bottom", PropertyKind::Spacing),
    ("left", PropertyKind::Spacing),
    ("scroll-margin", PropertyKind::Spacing),
    ("scroll-padding", PropertyKind::Spacing),
    ("font", PropertyKind::Typography),
    ("line-height", PropertyKind::Typography),
    ("letter-spacing", PropertyKind::Typography),
    ("word-spacing", PropertyKind::Typography),
    ("text-indent", PropertyKind::Typography),
    ("border", PropertyKind::Border),
    ("outline", PropertyKind::Border),
    ("transition", PropertyKind::Timing),
    ("animation", PropertyKind::Timing),
    ("width", PropertyKind::Sizing),
    ("height", PropertyKind::Sizing),
    ("min-width", PropertyKind::Sizing),
    ("max-width", PropertyKind::Sizing),
    ("min-height", PropertyKind::Sizing),
    ("max-height", PropertyKind::Sizing),
    ("flex-basis", PropertyKind::Sizing),
];

const COLOR_PROPERTIES: &[&str] = &["color", "fill", "stroke", "background", "background-color"];

/// Look up a property (CSS kebab-case or JS camelCase) in the kind tables.
pub fn property_kind(property: &str) -> PropertyKind {
    let trimmed = property.trim().trim_start_matches('-');
    let name = if trimmed.contains('-') {
        trimmed.to_lowercase()
    } else {
        trimmed.to_kebab_case()
    };
    let name = ["webkit-", "moz-", "ms-"]
        .iter()
        .find_map(|vendor| name.strip_prefix(vendor))
        .map(str::to_string)
        .unwrap_or(name);

    if name.ends_with("-radius") {
        return PropertyKind::Radius;
    }
    if name.ends_with("-color") || COLOR_PROPERTIES.contains(&name.as_str()) {
        return PropertyKind::Color;
    }
    if name.ends_with("-shadow") || name == "shadow" {
        return PropertyKind::Shadow;
    }

    PROPERTY_PREFIXES
        .iter()
        .find(|(prefix, _)| {
            name == *prefix
                || name
                    .strip_prefix(*prefix)
                    .is_some_and(|rest| rest.starts_with('-'))
        })
        .map(|(_, kind)| *kind)
        .unwrap_or(PropertyKind::Other)
}

impl PropertyKind {
    /// Token types a literal of this property can stand in for. Empty means any.
    pub fn token_types(&self) -> &'static [TokenType] {
        match self {
            PropertyKind::Color => &[TokenType::Color],
            PropertyKind::Spacing | PropertyKind::Sizing => &[TokenType::Spacing],
            PropertyKind::Typography => &[TokenType::Typography],
            PropertyKind::Radius => &[TokenType::Border, TokenType::Spacing],
            PropertyKind::Shadow => &[TokenType::Shadow, TokenType::Color],
            PropertyKind::Border => &[TokenType::Border, TokenType::Color, TokenType::Spacing],
            PropertyKind::Timing | PropertyKind::Other => &[],
        }
    }

    pub fn accepts(&self, token_type: TokenType) -> bool {
        let types = self.token_types();
        types.is_empty() || types.contains(&token_type)
    }
}

/// The token type a literal most plausibly stands in for.
pub fn literal_type(value: &str, property: Option<&str>) -> TokenType {
    let kind = property.map(property_kind).unwrap_or(PropertyKind::Other);
    match (classify_value(value), kind) {
        (ValueKind::Color, _) => TokenType::Color,
        (_, PropertyKind::Typography) => TokenType::Typography,
        (_, PropertyKind::Radius | PropertyKind::Border) => TokenType::Border,
        (_, PropertyKind::Shadow) => TokenType::Shadow,
        (ValueKind::Length, _) => TokenType::Spacing,
        _ => TokenType::Other,
    }
}

/// Expressions and sentinel keywords are never reported as hardcoded.
pub fn is_expression_or_sentinel(value: &str) -> bool {
    let v = normalize_value(value).to_lowercase();
    v.is_empty()
        || SENTINEL_VALUES.contains(&v.as_str())
        || EXPRESSION_MARKERS.iter().any(|m| v.contains(m))
        || v.starts_with('$')
        || v.starts_with('@')
        || v.contains('{')
}

/// Whether a literal is a plausible design value for its property.
pub fn is_hardcodable(value: &str, property: Option<&str>) -> bool {
    if is_expression_or_sentinel(value) {
        return false;
    }
    let normalized = normalize_value(value);
    let kind = property.map(property_kind).unwrap_or(PropertyKind::Other);

    match classify_value(&normalized) {
        ValueKind::Color => matches!(
            kind,
            PropertyKind::Color | PropertyKind::Border | PropertyKind::Shadow | PropertyKind::Other
        ),
        ValueKind::Length => matches!(
            kind,
            PropertyKind::Spacing | PropertyKind::Typography | PropertyKind::Radius
        ),
        ValueKind::Duration => kind == PropertyKind::Timing,
        ValueKind::Number => kind == PropertyKind::Typography,
        ValueKind::Other => false,
    }
}

/// Split a multi-part value on whitespace and commas outside parentheses.
pub fn split_value_parts(value: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for ch in value.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            c if depth == 0 && (c.is_whitespace() || c == ',') => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        parts.push(current);
    }
    parts
}
