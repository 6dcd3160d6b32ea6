//! Image reference helpers.
//!
//! Image references have the form `registry[:port]/repository[:tag][@digest]`.
//! Only the tag carries a human-readable version; a digest-only reference is
//! a valid image but useless for version reporting.

use thiserror::Error;

/// Errors from parsing an image reference.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImageError {
    /// Reference was empty
    #[error("image reference is empty")]
    Empty,

    /// Reference parsed but has no tag
    #[error("image '{0}' has no tag")]
    NoTag(String),

    /// Reference does not follow `name[:tag][@algorithm:hex]`
    #[error("image '{image}' is malformed: {reason}")]
    Malformed {
        /// Offending reference
        image: String,
        /// What is wrong with it
        reason: String,
    },
}

fn malformed(image: &str, reason: impl Into<String>) -> ImageError {
    ImageError::Malformed {
        image: image.to_string(),
        reason: reason.into(),
    }
}

/// Extracts the tag from an image reference.
///
/// ```text
/// "registry.com:1.2.3"                -> Ok("1.2.3")
/// "registry.com:1.2.3@sha256:<hex>"   -> Ok("1.2.3")
/// "registry.com"                      -> Err(NoTag)
/// "registry.com@sha256:<hex>"         -> Err(NoTag)
/// "registry.com@1.2.3"                -> Err(Malformed)
/// ```
pub fn get_tag_from_image_id(image_id: &str) -> Result<String, ImageError> {
    let image_id = image_id.trim();
    if image_id.is_empty() {
        return Err(ImageError::Empty);
    }

    let (name, digest) = match image_id.split_once('@') {
        Some((name, digest)) => (name, Some(digest)),
        None => (image_id, None),
    };

    if let Some(digest) = digest {
        validate_digest(image_id, digest)?;
    }

    if name.is_empty() {
        return Err(malformed(image_id, "missing repository name"));
    }

    // A colon before the last '/' belongs to the registry port, not the tag.
    let last_component = name.rsplit('/').next().unwrap_or(name);
    let Some((repository, tag)) = last_component.split_once(':') else {
        return Err(ImageError::NoTag(image_id.to_string()));
    };

    if repository.is_empty() {
        return Err(malformed(image_id, "missing repository name"));
    }
    validate_tag(image_id, tag)?;

    Ok(tag.to_string())
}

fn validate_digest(image_id: &str, digest: &str) -> Result<(), ImageError> {
    if digest.contains('@') {
        return Err(malformed(image_id, "multiple '@' delimiters"));
    }
    let Some((algorithm, hex)) = digest.split_once(':') else {
        return Err(malformed(image_id, format!("digest '{}' has no algorithm", digest)));
    };
    let algorithm_ok = !algorithm.is_empty()
        && algorithm
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '+' | '.' | '_' | '-'));
    if !algorithm_ok {
        return Err(malformed(image_id, format!("invalid digest algorithm '{}'", algorithm)));
    }
    if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(malformed(image_id, "digest is not hex encoded"));
    }
    Ok(())
}

fn validate_tag(image_id: &str, tag: &str) -> Result<(), ImageError> {
    let mut chars = tag.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
    let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if !first_ok || !rest_ok || tag.len() > 128 {
        return Err(malformed(image_id, format!("invalid tag '{}'", tag)));
    }
    Ok(())
}

/// Composes `registry/repository:version`.
pub fn default_image(registry: &str, repository: &str, version: &str) -> String {
    format!("{}/{}:{}", registry.trim_end_matches('/'), repository, version)
}
