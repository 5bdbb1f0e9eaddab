use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const IMAGE_EXTENSION: &str = "png";

fn unsafe_chars() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"[\s/\\:*?"<>|\x00-\x1f]"#).expect("valid file name pattern")
    })
}

/// Path-safe stem for a tag name. Never empty.
pub fn sanitize_stem(tag_name: &str) -> String {
    let stem = unsafe_chars().replace_all(tag_name, "_");
    match stem.as_ref() {
        "" => "tag".to_string(),
        "." | ".." => stem.replace('.', "_"),
        _ => stem.into_owned(),
    }
}

/// Hands out distinct image file names. Call in catalog order for stable results.
#[derive(Debug, Default)]
pub struct MediaNamer {
    taken: HashSet<String>,
}

impl MediaNamer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_name_for(&mut self, tag_name: &str) -> String {
        let stem = sanitize_stem(tag_name);
        let mut candidate = format!("{}.{}", stem, IMAGE_EXTENSION);
        let mut counter = 2;
        // 大小寫不敏感的檔案系統也不能撞名
        while !self.taken.insert(candidate.to_lowercase()) {
            candidate = format!("{}-{}.{}", stem, counter, IMAGE_EXTENSION);
            counter += 1;
        }
        candidate
    }
}
