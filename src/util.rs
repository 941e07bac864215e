use eframe::egui::Color32;
use serde::Serializer;
use serde::ser::SerializeSeq;

/// Lowercases and collapses every run of non-alphanumeric characters into a
/// single `-`. Applying it twice gives the same result as applying it once.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_separator = false;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.extend(ch.to_lowercase());
        } else {
            pending_separator = true;
        }
    }
    slug
}

/// Turns a normalized key such as `acme-labs` or `machine_learning` into a
/// readable label.
pub fn humanize_key(key: &str) -> String {
    let key = key.rsplit_once(':').map(|(_, rest)| rest).unwrap_or(key);
    key.split(['-', '_', ' '])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Position of `value` between `min` and `max` on a log scale, in `[0, 1]`.
pub fn normalize_log(value: usize, min: usize, max: usize) -> f32 {
    let min = min.max(1) as f64;
    let max = (max as f64).max(min);
    let value = (value.max(1) as f64).clamp(min, max);

    let denominator = max.ln() - min.ln();
    if denominator.abs() < f64::EPSILON {
        return 0.5;
    }

    ((value.ln() - min.ln()) / denominator).clamp(0.0, 1.0) as f32
}

pub fn hex_color(color: Color32) -> String {
    format!("#{:02x}{:02x}{:02x}", color.r(), color.g(), color.b())
}

pub fn serialize_color<S: Serializer>(color: &Color32, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex_color(*color))
}

pub fn serialize_colors<S: Serializer>(
    colors: &[Color32],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut seq = serializer.serialize_seq(Some(colors.len()))?;
    for color in colors {
        seq.serialize_element(&hex_color(*color))?;
    }
    seq.end()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_is_idempotent() {
        let once = slugify("  Technische Universität  Delft (TU) ");
        assert_eq!(once, "technische-universität-delft-tu");
        assert_eq!(slugify(&once), once);
    }

    #[test]
    fn humanize_strips_namespace_prefix() {
        assert_eq!(humanize_key("school:mit-media-lab"), "Mit Media Lab");
        assert_eq!(humanize_key("machine_learning"), "Machine Learning");
    }

    #[test]
    fn normalize_log_handles_flat_ranges() {
        assert_eq!(normalize_log(5, 5, 5), 0.5);
        assert_eq!(normalize_log(0, 0, 0), 0.5);
        assert_eq!(normalize_log(1, 1, 100), 0.0);
        assert_eq!(normalize_log(100, 1, 100), 1.0);
    }

    #[test]
    fn hex_color_formats_rgb() {
        assert_eq!(hex_color(Color32::from_rgb(255, 8, 16)), "#ff0810");
    }
}
