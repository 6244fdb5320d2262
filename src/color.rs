//! Color token normalization.
//!
//! Maps an open-ended vocabulary of color expressions to either the literal
//! `"none"` or a canonical lowercase `#rrggbb` hex string. The chain tries,
//! in order: "none", hex, `rgb()`, `hsl()`, exact CSS name, fuzzy colloquial
//! name with modifiers, whitespace-stripped CSS name. [`normalize_color`]
//! never fails; unparseable input falls back to black.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static HEX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#([0-9a-f]{3}|[0-9a-f]{6})$").unwrap());
static RGB_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^rgb\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*\)$").unwrap());
static HSL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^hsl\(\s*(\d{1,3})\s*,\s*(\d{1,3})%\s*,\s*(\d{1,3})%\s*\)$").unwrap());
// desaturate-20 / desaturate_20 / desaturate20 / desaturate-20%
static DESATURATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^desaturate[-_]?(\d{1,3})%?$").unwrap());
static PERCENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d{1,3})%$").unwrap());

static CSS_COLORS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("black", "#000000"),
        ("white", "#ffffff"),
        ("red", "#ff0000"),
        ("green", "#008000"),
        ("blue", "#0000ff"),
        ("yellow", "#ffff00"),
        ("purple", "#800080"),
        ("orange", "#ffa500"),
        ("coral", "#ff7f50"),
        ("navy", "#000080"),
        ("teal", "#008080"),
        ("olive", "#808000"),
        ("gray", "#808080"),
        ("grey", "#808080"),
        ("pink", "#ffc0cb"),
        ("brown", "#a52a2a"),
        ("gold", "#ffd700"),
        ("silver", "#c0c0c0"),
        ("indigo", "#4b0082"),
        ("violet", "#ee82ee"),
        ("salmon", "#fa8072"),
        ("tomato", "#ff6347"),
        ("crimson", "#dc143c"),
        ("khaki", "#f0e68c"),
        ("plum", "#dda0dd"),
        ("orchid", "#da70d6"),
        ("turquoise", "#40e0d0"),
        ("cyan", "#00ffff"),
        ("magenta", "#ff00ff"),
        ("aquamarine", "#7fffd4"),
        ("beige", "#f5f5dc"),
        ("chocolate", "#d2691e"),
        ("darkblue", "#00008b"),
        ("darkgreen", "#006400"),
        ("darkred", "#8b0000"),
        ("lightblue", "#add8e6"),
        ("lightgreen", "#90ee90"),
        ("lightpink", "#ffb6c1"),
    ])
});

// Colloquial bases take priority over CSS names during fuzzy resolution, so
// "lavender"-style overlaps resolve to the colloquial shade.
static COLLOQUIAL_COLORS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("matcha", "#a3c686"),
        ("baby blue", "#a7c7e7"),
        ("baby pink", "#f6c1cf"),
        ("baby purple", "#cab8ff"),
        ("pastel blue", "#aec6ff"),
        ("pastel green", "#bfe3b4"),
        ("pastel yellow", "#fff4a3"),
        ("pastel pink", "#ffcfe1"),
        ("pastel purple", "#cbb9ff"),
        ("mint", "#aee5c9"),
        ("lavender", "#e6e6fa"),
        ("peach", "#ffcba4"),
        ("cream", "#fffdd0"),
        ("sage", "#9caf88"),
        ("charcoal", "#36454f"),
    ])
});

/// Saturation/lightness deltas applied by a leading modifier token.
const MODIFIERS: [(&str, f64, f64); 7] = [
    ("baby", -25.0, 20.0),
    ("pastel", -30.0, 18.0),
    ("light", 0.0, 15.0),
    ("dark", 0.0, -15.0),
    ("bright", 20.0, 0.0),
    ("deep", 10.0, -10.0),
    ("neon", 35.0, 0.0),
];

const FALLBACK: &str = "#000000";

/// Normalizes any color token to `"none"` or a `#rrggbb` hex string.
///
/// Never fails: anything the chain cannot resolve becomes black, so a bad
/// color from an upstream generator degrades the image instead of aborting
/// the render.
pub fn normalize_color(value: &str) -> String {
    resolve_color(value).unwrap_or_else(|| FALLBACK.to_string())
}

/// The same resolution chain as [`normalize_color`] but reporting failure
/// instead of falling back to black, for callers that want strict inputs.
pub fn resolve_color(value: &str) -> Option<String> {
    let v = value.trim().to_lowercase();
    if v == "none" {
        return Some("none".to_string());
    }

    if HEX_RE.is_match(&v) {
        return Some(expand_hex(&v));
    }

    if let Some(caps) = RGB_RE.captures(&v) {
        let r = clamp(channel(&caps, 1), 0.0, 255.0) as u8;
        let g = clamp(channel(&caps, 2), 0.0, 255.0) as u8;
        let b = clamp(channel(&caps, 3), 0.0, 255.0) as u8;
        return Some(rgb_to_hex(r, g, b));
    }

    if let Some(caps) = HSL_RE.captures(&v) {
        let h = clamp(channel(&caps, 1), 0.0, 360.0);
        let s = clamp(channel(&caps, 2), 0.0, 100.0);
        let l = clamp(channel(&caps, 3), 0.0, 100.0);
        let (r, g, b) = hsl_to_rgb(h, s, l);
        return Some(rgb_to_hex(r, g, b));
    }

    if let Some(hex) = CSS_COLORS.get(v.as_str()) {
        return Some((*hex).to_string());
    }

    if let Some(hex) = resolve_fuzzy(&v) {
        return Some(hex);
    }

    let squeezed: String = v.split_whitespace().collect();
    if let Some(hex) = CSS_COLORS.get(squeezed.as_str()) {
        return Some((*hex).to_string());
    }

    None
}

/// Fuzzy resolution: the longest trailing window of tokens that names a base
/// color wins (colloquial table first, then CSS); everything before it is a
/// modifier applied left to right.
fn resolve_fuzzy(name: &str) -> Option<String> {
    let tokens: Vec<&str> = name.split_whitespace().collect();
    if tokens.is_empty() {
        return None;
    }

    for split in 0..tokens.len() {
        let base = tokens[split..].join(" ");
        let base_hex = COLLOQUIAL_COLORS
            .get(base.as_str())
            .or_else(|| CSS_COLORS.get(base.as_str()));
        if let Some(hex) = base_hex {
            return Some(apply_modifiers(hex, &tokens[..split]));
        }
    }

    None
}

fn apply_modifiers(base_hex: &str, tokens: &[&str]) -> String {
    let mut out = base_hex.to_string();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i];

        if let Some(&(_, d_s, d_l)) = MODIFIERS.iter().find(|(name, _, _)| *name == token) {
            out = adjust_hsl(&out, d_s, d_l);
            i += 1;
            continue;
        }

        if let Some(caps) = DESATURATE_RE.captures(token) {
            out = desaturate(&out, channel(&caps, 1));
            i += 1;
            continue;
        }

        // Two-token form: "desaturate 20%".
        if token == "desaturate" && i + 1 < tokens.len() {
            if let Some(caps) = PERCENT_RE.captures(tokens[i + 1]) {
                out = desaturate(&out, channel(&caps, 1));
                i += 2;
                continue;
            }
        }

        // Unrecognized modifiers are skipped, not an error.
        i += 1;
    }
    out
}

/// Nudges a hex color in HSL space, clamping saturation and lightness.
fn adjust_hsl(hex: &str, d_s: f64, d_l: f64) -> String {
    let (r, g, b) = hex_to_rgb(hex);
    let (h, s, l) = rgb_to_hsl(r, g, b);
    let (r2, g2, b2) = hsl_to_rgb(h, clamp(s + d_s, 0.0, 100.0), clamp(l + d_l, 0.0, 100.0));
    rgb_to_hex(r2, g2, b2)
}

/// Shrinks saturation multiplicatively by `pct` percent of its current value.
fn desaturate(hex: &str, pct: f64) -> String {
    let pct = clamp(pct, 0.0, 100.0);
    let (r, g, b) = hex_to_rgb(hex);
    let (h, s, l) = rgb_to_hsl(r, g, b);
    let (r2, g2, b2) = hsl_to_rgb(h, s * (1.0 - pct / 100.0), l);
    rgb_to_hex(r2, g2, b2)
}

fn channel(caps: &regex::Captures, idx: usize) -> f64 {
    caps.get(idx)
        .map(|m| m.as_str().parse::<f64>().unwrap_or(0.0))
        .unwrap_or(0.0)
}

fn clamp(x: f64, lo: f64, hi: f64) -> f64 {
    x.max(lo).min(hi)
}

fn expand_hex(hex: &str) -> String {
    let digits = &hex[1..];
    if digits.len() == 3 {
        let mut out = String::with_capacity(7);
        out.push('#');
        for ch in digits.chars() {
            out.push(ch);
            out.push(ch);
        }
        out
    } else {
        hex.to_string()
    }
}

fn hex_to_rgb(hex: &str) -> (u8, u8, u8) {
    let expanded = expand_hex(hex);
    let digits = &expanded[1..];
    let parse = |range: std::ops::Range<usize>| {
        u8::from_str_radix(digits.get(range).unwrap_or("0"), 16).unwrap_or(0)
    };
    (parse(0..2), parse(2..4), parse(4..6))
}

fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Standard RGB→HSL: hue in [0,360), saturation/lightness in [0,100].
pub fn rgb_to_hsl(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let r = r as f64 / 255.0;
    let g = g as f64 / 255.0;
    let b = b as f64 / 255.0;
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;

    if max == min {
        return (0.0, 0.0, l * 100.0);
    }

    let d = max - min;
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
    let h = if max == r {
        (g - b) / d + if g < b { 6.0 } else { 0.0 }
    } else if max == g {
        (b - r) / d + 2.0
    } else {
        (r - g) / d + 4.0
    } / 6.0;

    (h * 360.0, s * 100.0, l * 100.0)
}

/// Standard HSL→RGB, channels rounded to the nearest integer.
pub fn hsl_to_rgb(h: f64, s: f64, l: f64) -> (u8, u8, u8) {
    let h = h / 360.0;
    let s = s / 100.0;
    let l = l / 100.0;

    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return (v, v, v);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let to_channel = |t: f64| (hue_to_rgb(p, q, t) * 255.0).round().min(255.0) as u8;
    (
        to_channel(h + 1.0 / 3.0),
        to_channel(h),
        to_channel(h - 1.0 / 3.0),
    )
}

fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
    if t < 0.0 {
        t += 1.0;
    }
    if t > 1.0 {
        t -= 1.0;
    }
    if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
    } else if t < 1.0 / 2.0 {
        q
    } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
    } else {
        p
    }
}
