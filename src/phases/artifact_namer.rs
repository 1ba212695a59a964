// Artifact naming

use crate::core::types::GenerationTime;

/// Extension of every stored artifact
pub const ARTIFACT_EXTENSION: &str = "jpg";

/// Lowercase md5 hex over `"{reference}_{lang}_{time}"`, plus `.jpg`.
pub fn artifact_name(source_reference: &str, target_lang: &str, time: &GenerationTime) -> String {
    let digest = md5::compute(format!("{}_{}_{}", source_reference, target_lang, time));
    format!("{:x}.{}", digest, ARTIFACT_EXTENSION)
}

/// True when `id` has the shape `artifact_name` produces
pub fn is_artifact_name(id: &str) -> bool {
    match id.strip_suffix(ARTIFACT_EXTENSION).and_then(|s| s.strip_suffix('.')) {
        Some(hex) => hex.len() == 32 && hex.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')),
        None => false,
    }
}
