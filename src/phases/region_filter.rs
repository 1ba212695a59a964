// Region filter: drop detections the detector is unsure about

use tracing::debug;

use crate::core::types::DetectedRegion;

/// Keeps regions with `confidence >= threshold`, in detector order.
pub fn filter_regions(regions: Vec<DetectedRegion>, threshold: f32) -> Vec<DetectedRegion> {
    let total = regions.len();
    let kept: Vec<DetectedRegion> = regions
        .into_iter()
        .filter(|r| r.confidence >= threshold)
        .collect();

    debug!(
        "Region filter: kept {}/{} regions (threshold {:.2})",
        kept.len(),
        total,
        threshold
    );

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(text: &str, confidence: f32) -> DetectedRegion {
        DetectedRegion {
            quad: [[0, 0], [10, 0], [10, 10], [0, 10]],
            text: text.to_string(),
            confidence,
        }
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let kept = filter_regions(
            vec![region("a", 0.29), region("b", 0.3), region("c", 0.95)],
            0.3,
        );
        let texts: Vec<&str> = kept.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["b", "c"]);
    }

    #[test]
    fn test_order_preserved() {
        let kept = filter_regions(
            vec![region("z", 0.9), region("drop", 0.1), region("a", 0.5), region("m", 0.7)],
            0.3,
        );
        let texts: Vec<&str> = kept.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(filter_regions(Vec::new(), 0.3).is_empty());
    }
}
