use crate::model::MaskId;

const DEFAULT_TITLE: &str = "AI Widget";

/// The copy-paste fragment for displaying a mask's rendered output elsewhere.
///
/// Pure string templating over the fixed rendering endpoint; the only inputs
/// are the mask id and an optional display title.
pub fn embed_snippet(base_url: &str, id: &MaskId, title: Option<&str>) -> String {
    let base_url = base_url.trim_end_matches('/');
    let title = match title {
        Some(t) if !t.trim().is_empty() => t.trim(),
        _ => DEFAULT_TITLE,
    };
    format!(
        "<iframe \n  src=\"{base}/embed/{id}\" \n  width=\"100%\" \n  height=\"600\" \n  style=\"border: none; border-radius: 12px; box-shadow: 0 4px 6px -1px rgb(0 0 0 / 0.1);\"\n  title=\"{title}\">\n</iframe>",
        base = base_url,
        id = id,
        title = title,
    )
}

#[cfg(test)]
#[path = "tests/embed_tests.rs"]
mod tests;
