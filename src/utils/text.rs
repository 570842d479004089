use std::{path::Path, sync::LazyLock};

use regex::Regex;

static WORD_START: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\w").unwrap());

/// Removes Markdown code-fence markers (```json / ```) that models tend to
/// wrap JSON in, then trims the result.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "").replace("```", "").trim().to_string()
}

/// Turns a file stem such as `world_capitals` into `World Capitals`.
pub fn humanize_title(stem: &str) -> String {
    let spaced = stem.replace('_', " ");
    WORD_START
        .replace_all(&spaced, |caps: &regex::Captures| caps[0].to_uppercase())
        .into_owned()
}

/// Shows only the first five characters of a credential.
pub fn mask_credential(credential: &str) -> String {
    let prefix: String = credential.chars().take(5).collect();
    format!("{}...", prefix)
}

/// Quiz identifiers map straight onto file names, so anything that could
/// leave the quiz directory is refused. Any stem the store lists passes.
pub fn is_valid_quiz_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= 255
        && id != "."
        && id != ".."
        && !id.chars().any(|c| c == '/' || c == '\\' || c.is_control())
}

/// Final path component of a client-supplied file name.
pub fn file_name_component(raw: &str) -> String {
    let normalized = raw.replace('\\', "/");
    Path::new(&normalized)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fences_are_stripped() {
        assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fences("  [1, 2] "), "[1, 2]");
    }

    #[test]
    fn titles_are_humanized() {
        assert_eq!(humanize_title("world_capitals"), "World Capitals");
        assert_eq!(humanize_title("unit_3_review"), "Unit 3 Review");
    }

    #[test]
    fn credentials_are_masked() {
        assert_eq!(mask_credential("AIzaSyExample"), "AIzaS...");
        assert_eq!(mask_credential("ab"), "ab...");
    }

    #[test]
    fn quiz_ids_reject_path_tricks() {
        assert!(is_valid_quiz_id("a1b2c3d4"));
        assert!(is_valid_quiz_id("world_capitals"));
        assert!(!is_valid_quiz_id("../secret"));
        assert!(is_valid_quiz_id("unit 3.1"));
        assert!(!is_valid_quiz_id("a/b"));
        assert!(!is_valid_quiz_id("..\\secret"));
        assert!(!is_valid_quiz_id(".."));
        assert!(is_valid_quiz_id("draft..v2"));
        assert!(!is_valid_quiz_id("x\0y"));
        assert!(!is_valid_quiz_id(""));
    }

    #[test]
    fn file_names_lose_their_directories() {
        assert_eq!(file_name_component("../../etc/passwd"), "passwd");
        assert_eq!(file_name_component("C:\\docs\\exam.pdf"), "exam.pdf");
        assert_eq!(file_name_component("exam.pdf"), "exam.pdf");
        assert_eq!(file_name_component(".."), "");
    }
}
