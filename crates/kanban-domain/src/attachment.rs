//! Deterministic names for binary assets kept under a board's `uploads/`.

use std::path::Path;

/// Extension used when neither the declared name nor the URL carries one.
pub const FALLBACK_EXTENSION: &str = "bin";

const MAX_EXTENSION_LEN: usize = 8;

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "svg", "bmp"];

/// Lower-case a file stem and replace everything outside `[a-z0-9-]` with `-`.
pub fn clean_name(stem: &str) -> String {
    stem.chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

fn is_plain_extension(ext: &str) -> bool {
    (1..=MAX_EXTENSION_LEN).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Split a file name into stem and extension. A suffix that does not look
/// like an extension (`Q1.5 planning notes`) stays part of the stem.
fn split_name(name: &str) -> (&str, Option<&str>) {
    let path = Path::new(name);
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| is_plain_extension(e));
    let stem = match ext {
        Some(_) => path.file_stem().and_then(|s| s.to_str()).unwrap_or(name),
        None => path.file_name().and_then(|s| s.to_str()).unwrap_or(name),
    };
    (stem, ext)
}

/// Extension of the last path segment of a URL, ignoring query and fragment.
pub fn extension_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let segment = path.rsplit('/').next()?;
    let (_, ext) = split_name(segment);
    ext.map(str::to_ascii_lowercase)
}

/// `lower(cleanedName + "-" + id + "." + ext)`: the same inputs always give the same file.
pub fn attachment_filename(clean: &str, id: &str, ext: &str) -> String {
    format!("{}-{}.{}", clean, id, ext).to_lowercase()
}

/// A remote attachment resolved to the local file it will be stored as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRef {
    pub id: String,
    pub url: String,
    pub name: String,
    pub ext: String,
}

impl AttachmentRef {
    pub fn new(id: impl Into<String>, name: Option<&str>, url: impl Into<String>) -> Self {
        let url = url.into();
        let name = name.filter(|n| !n.is_empty()).unwrap_or("attachment");
        let declared_ext = split_name(name).1.map(str::to_ascii_lowercase);
        let ext = declared_ext
            .or_else(|| extension_from_url(&url))
            .unwrap_or_else(|| FALLBACK_EXTENSION.to_string());
        Self {
            id: id.into(),
            url,
            name: name.to_string(),
            ext,
        }
    }

    pub fn filename(&self) -> String {
        let (stem, _) = split_name(&self.name);
        attachment_filename(&clean_name(stem), &self.id, &self.ext)
    }

    pub fn is_image(&self) -> bool {
        IMAGE_EXTENSIONS.contains(&self.ext.as_str())
    }
}

/// File name for a user upload, made unique with `-2`, `-3`, ... suffixes.
pub fn upload_filename<F>(original: &str, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    let (stem, ext) = split_name(original);
    let clean = clean_name(stem);
    let ext = ext.map(str::to_ascii_lowercase).unwrap_or_default();
    let render = |suffix: Option<u32>| {
        let base = match suffix {
            Some(n) => format!("{}-{}", clean, n),
            None => clean.clone(),
        };
        if ext.is_empty() {
            base
        } else {
            format!("{}.{}", base, ext)
        }
    };

    let first = render(None);
    if !exists(&first) {
        return first;
    }
    (2u32..)
        .map(|n| render(Some(n)))
        .find(|name| !exists(name))
        .unwrap_or(first)
}
