//! Template matching
//!
//! Grayscale normalized cross-correlation, good enough to find UI
//! buttons in screenshots. The matching functions are pure; screenshot
//! capture lives on [`crate::session::GameContext`].

use crate::config::GameConfig;
use crate::error::ControlError;
use image::GrayImage;
use std::collections::HashMap;
use std::path::Path;

/// A template match, addressed by the center of the matched region
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub x: i32,
    pub y: i32,
    pub score: f32,
}

/// Normalized cross-correlation score for the window at (x0, y0)
///
/// Returns 0.0 for zero-variance windows (flat regions can never match
/// a structured template).
fn ncc_at(haystack: &GrayImage, needle: &GrayImage, x0: u32, y0: u32) -> f32 {
    let (w, h) = needle.dimensions();
    let n = (w * h) as f64;

    let mut sum_i = 0.0f64;
    let mut sum_ii = 0.0f64;
    let mut sum_t = 0.0f64;
    let mut sum_tt = 0.0f64;
    let mut sum_it = 0.0f64;

    for y in 0..h {
        for x in 0..w {
            let i = f64::from(haystack.get_pixel(x0 + x, y0 + y).0[0]);
            let t = f64::from(needle.get_pixel(x, y).0[0]);
            sum_i += i;
            sum_ii += i * i;
            sum_t += t;
            sum_tt += t * t;
            sum_it += i * t;
        }
    }

    let cov = sum_it - sum_i * sum_t / n;
    let var_i = sum_ii - sum_i * sum_i / n;
    let var_t = sum_tt - sum_t * sum_t / n;
    let denom = (var_i * var_t).sqrt();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    (cov / denom) as f32
}

/// Find the best match above `threshold`, or `None`
pub fn match_template(haystack: &GrayImage, needle: &GrayImage, threshold: f32) -> Option<Match> {
    let (hw, hh) = haystack.dimensions();
    let (nw, nh) = needle.dimensions();
    if nw == 0 || nh == 0 || nw > hw || nh > hh {
        return None;
    }

    let mut best: Option<Match> = None;
    for y0 in 0..=(hh - nh) {
        for x0 in 0..=(hw - nw) {
            let score = ncc_at(haystack, needle, x0, y0);
            if score < threshold {
                continue;
            }
            if best.map_or(true, |b| score > b.score) {
                best = Some(Match {
                    x: (x0 + nw / 2) as i32,
                    y: (y0 + nh / 2) as i32,
                    score,
                });
            }
        }
    }
    best
}

/// Find all matches above `threshold`
///
/// Overlapping detections are suppressed (best score wins within half a
/// template of a kept match); results are sorted top-to-bottom, then
/// left-to-right.
pub fn match_all(haystack: &GrayImage, needle: &GrayImage, threshold: f32) -> Vec<Match> {
    let (hw, hh) = haystack.dimensions();
    let (nw, nh) = needle.dimensions();
    if nw == 0 || nh == 0 || nw > hw || nh > hh {
        return Vec::new();
    }

    let mut candidates = Vec::new();
    for y0 in 0..=(hh - nh) {
        for x0 in 0..=(hw - nw) {
            let score = ncc_at(haystack, needle, x0, y0);
            if score >= threshold {
                candidates.push(Match {
                    x: (x0 + nw / 2) as i32,
                    y: (y0 + nh / 2) as i32,
                    score,
                });
            }
        }
    }

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    let (sup_x, sup_y) = ((nw / 2) as i32, (nh / 2) as i32);
    let mut kept: Vec<Match> = Vec::new();
    for candidate in candidates {
        let overlaps = kept
            .iter()
            .any(|m| (m.x - candidate.x).abs() <= sup_x && (m.y - candidate.y).abs() <= sup_y);
        if !overlaps {
            kept.push(candidate);
        }
    }

    kept.sort_by_key(|m| (m.y, m.x));
    kept
}

/// Loaded template image with its effective threshold
pub struct Template {
    pub image: GrayImage,
    pub threshold: f32,
}

/// All templates named in the config, decoded into grayscale
pub struct TemplateLibrary {
    templates: HashMap<String, Template>,
}

impl TemplateLibrary {
    /// Load every configured template relative to `base_dir`
    ///
    /// Unreadable entries are skipped with a warning so a missing asset
    /// does not take the whole bot down.
    pub fn load(config: &GameConfig, base_dir: &Path) -> Self {
        let mut templates = HashMap::new();
        for (name, entry) in &config.templates {
            let path = base_dir.join(&entry.path);
            match image::open(&path) {
                Ok(img) => {
                    templates.insert(
                        name.clone(),
                        Template {
                            image: img.to_luma8(),
                            threshold: config.threshold_for(name),
                        },
                    );
                }
                Err(e) => {
                    tracing::warn!("Failed to load template {} from {:?}: {}", name, path, e);
                }
            }
        }
        tracing::info!("Loaded {} templates", templates.len());
        Self { templates }
    }

    /// Empty library (tests, dry runs)
    pub fn empty() -> Self {
        Self {
            templates: HashMap::new(),
        }
    }

    /// Look up a template by registry name
    pub fn get(&self, name: &str) -> Result<&Template, ControlError> {
        self.templates
            .get(name)
            .ok_or_else(|| ControlError::UnknownTemplate(name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Structured 8x8 needle so windows have variance
    fn needle() -> GrayImage {
        GrayImage::from_fn(8, 8, |x, y| image::Luma([((x * 31 + y * 17) % 251) as u8]))
    }

    /// Flat background with the needle stamped at the given corners
    fn haystack_with(needle: &GrayImage, corners: &[(u32, u32)]) -> GrayImage {
        let mut img = GrayImage::from_pixel(64, 64, image::Luma([40]));
        for &(cx, cy) in corners {
            for (x, y, p) in needle.enumerate_pixels() {
                img.put_pixel(cx + x, cy + y, *p);
            }
        }
        img
    }

    #[test]
    fn test_match_template_finds_center() {
        let needle = needle();
        let haystack = haystack_with(&needle, &[(20, 30)]);
        let m = match_template(&haystack, &needle, 0.95).unwrap();
        assert_eq!((m.x, m.y), (24, 34));
        assert!(m.score > 0.99);
    }

    #[test]
    fn test_match_template_threshold_rejects() {
        let needle = needle();
        // Flat image: zero-variance windows never match
        let haystack = GrayImage::from_pixel(64, 64, image::Luma([40]));
        assert!(match_template(&haystack, &needle, 0.5).is_none());
    }

    #[test]
    fn test_match_template_needle_larger_than_haystack() {
        let needle = needle();
        let haystack = GrayImage::from_pixel(4, 4, image::Luma([0]));
        assert!(match_template(&haystack, &needle, 0.5).is_none());
    }

    #[test]
    fn test_match_all_suppresses_and_sorts() {
        let needle = needle();
        let haystack = haystack_with(&needle, &[(40, 10), (10, 10), (10, 40)]);
        let matches = match_all(&haystack, &needle, 0.95);
        assert_eq!(matches.len(), 3);
        // Sorted top-to-bottom, then left-to-right
        assert_eq!((matches[0].x, matches[0].y), (14, 14));
        assert_eq!((matches[1].x, matches[1].y), (44, 14));
        assert_eq!((matches[2].x, matches[2].y), (14, 44));
    }

    #[test]
    fn test_template_library_unknown() {
        let lib = TemplateLibrary::empty();
        assert!(matches!(
            lib.get("home"),
            Err(ControlError::UnknownTemplate(_))
        ));
    }
}
