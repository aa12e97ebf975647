//! Page-qualified problem identifiers.
//!
//! Every problem id takes the form `<page>-problem<n>`. A bare ordinal such
//! as `"3"`, `"problem3"`, `"q3"` or `"第3题"` belongs to the snapshot's
//! page and becomes `page2-problem3` on page `page2`. An id that names its
//! own page (`"第242页-第1题"`, `"page242-1"`, `"p242-q1"`) keeps that page
//! and becomes `page242-problem1`, whatever the snapshot page is. On a
//! two-page spread this keeps problem 1 of the left page apart from
//! problem 1 of the right page.
//!
//! Qualification only rewrites the form of an id, never which problem it
//! names: page and ordinal always come from the id itself when it has them,
//! so it is deterministic and idempotent.

const PROBLEM_MARKER: &str = "-problem";
const PAGE_SUFFIX: char = '页';

/// Canonical page id: bare numbers become `page<n>`.
pub fn normalize_page(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with("page") {
        return Some(raw.to_string());
    }
    match last_number(raw) {
        Some(n) => Some(format!("page{}", n)),
        None => Some(raw.to_string()),
    }
}

/// Qualify a problem id with the page it belongs to.
///
/// Ids naming their own page are qualified with it. Already-qualified ids,
/// ids without a number and bare ordinals seen before any page is known are
/// returned trimmed but otherwise unchanged.
pub fn qualify(raw: &str, page: Option<&str>) -> String {
    let raw = raw.trim();
    if raw.contains(PROBLEM_MARKER) {
        return raw.to_string();
    }
    if let Some((own_page, n)) = own_page(raw) {
        return format!("page{}{}{}", own_page, PROBLEM_MARKER, n);
    }
    match (page, last_number(raw)) {
        (Some(page), Some(n)) => format!("{}{}{}", page, PROBLEM_MARKER, n),
        _ => raw.to_string(),
    }
}

/// Page and ordinal of an id that carries both, such as `第242页-第1题`,
/// `page242-1` or `p3q2`. A lone `p1` is an ordinal, not a page.
fn own_page(raw: &str) -> Option<(u64, u64)> {
    if let Some(idx) = raw.find(PAGE_SUFFIX) {
        let page = trailing_number(&raw[..idx])?;
        let ordinal = last_number(&raw[idx + PAGE_SUFFIX.len_utf8()..])?;
        return Some((page, ordinal));
    }

    let lower = raw.to_ascii_lowercase();
    let rest = lower
        .strip_prefix("page")
        .or_else(|| lower.strip_prefix('p'))?
        .trim_start_matches(['_', ' ']);
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let page = rest[..digits].parse().ok()?;
    let ordinal = last_number(&rest[digits..])?;
    Some((page, ordinal))
}

/// Number formed by the ASCII digits at the very end of `text`.
fn trailing_number(text: &str) -> Option<u64> {
    let digits = text.bytes().rev().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    text[text.len() - digits..].parse().ok()
}

/// Last run of ASCII digits, leading zeros dropped.
fn last_number(text: &str) -> Option<u64> {
    let bytes = text.as_bytes();
    let end = bytes.iter().rposition(u8::is_ascii_digit)? + 1;
    let start = bytes[..end]
        .iter()
        .rposition(|b| !b.is_ascii_digit())
        .map_or(0, |i| i + 1);
    text[start..end].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualify_forms() {
        let page = Some("page2");
        assert_eq!(qualify("3", page), "page2-problem3");
        assert_eq!(qualify("problem3", page), "page2-problem3");
        assert_eq!(qualify("q03", page), "page2-problem3");
        assert_eq!(qualify("第3题", page), "page2-problem3");
        assert_eq!(qualify(" p1 ", page), "page2-problem1");
    }

    #[test]
    fn test_qualify_is_idempotent() {
        let once = qualify("第12题", Some("page4"));
        assert_eq!(qualify(&once, Some("page4")), once);
        assert_eq!(qualify(&once, Some("page9")), once);
    }

    #[test]
    fn test_unqualifiable_ids_kept() {
        assert_eq!(qualify("bonus", Some("page1")), "bonus");
        assert_eq!(qualify("p1", None), "p1");
    }

    #[test]
    fn test_ids_naming_their_page() {
        let spread = Some("page_242_243");
        assert_eq!(qualify("第242页-第1题", spread), "page242-problem1");
        assert_eq!(qualify("第243页-第1题", spread), "page243-problem1");
        assert_eq!(qualify("page7-2", spread), "page7-problem2");
        assert_eq!(qualify("page_7_q2", spread), "page7-problem2");
        assert_eq!(qualify("p3-q4", spread), "page3-problem4");
        assert_eq!(qualify("P3Q4", spread), "page3-problem4");
        // Bare ordinals still take the snapshot page.
        assert_eq!(qualify("第1题", spread), "page_242_243-problem1");
        assert_eq!(qualify("p1", spread), "page_242_243-problem1");
    }

    #[test]
    fn test_ids_naming_their_page_without_snapshot_page() {
        assert_eq!(qualify("第1页-第1题", None), "page1-problem1");
        assert_eq!(qualify("第1页-第2题", None), "page1-problem2");
        assert_eq!(qualify(" 第12页 第3题 ", None), "page12-problem3");
        // A page with no problem number is not a problem id.
        assert_eq!(qualify("第5页", None), "第5页");
    }

    #[test]
    fn test_own_page_matches_bare_ordinal_on_that_page() {
        let page = normalize_page("第5页");
        assert_eq!(
            qualify("第5页-第2题", None),
            qualify("2", page.as_deref())
        );
        let once = qualify("第5页-第2题", Some("page9"));
        assert_eq!(qualify(&once, Some("page9")), once);
    }

    #[test]
    fn test_normalize_page() {
        assert_eq!(normalize_page("3").as_deref(), Some("page3"));
        assert_eq!(normalize_page("page3").as_deref(), Some("page3"));
        assert_eq!(normalize_page("第5页").as_deref(), Some("page5"));
        assert_eq!(normalize_page("cover").as_deref(), Some("cover"));
        assert_eq!(normalize_page("page_242_243").as_deref(), Some("page_242_243"));
        assert_eq!(normalize_page("  "), None);
    }
}
