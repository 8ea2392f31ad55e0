//! Lossless frontmatter splitting for vendored documentation.
//!
//! A frontmatter block is a leading line `---`, a YAML body, and a closing
//! `---` line. The split is byte-exact: `raw` concatenated with `content`
//! always reconstructs the input, so raw reads and stripped reads stay
//! complementary.

use serde_yaml::Value;

/// Byte-exact split of a document into its frontmatter block and body.
#[derive(Debug, Clone, PartialEq)]
pub struct FrontmatterSplit<'a> {
    /// The raw frontmatter block, delimiters and trailing newline included.
    /// `None` when the document has no well-formed block.
    pub raw: Option<&'a str>,
    /// Everything after the block (the whole input when `raw` is `None`).
    pub content: &'a str,
}

impl FrontmatterSplit<'_> {
    /// YAML text between the delimiters, without the delimiter lines.
    pub fn yaml(&self) -> Option<&str> {
        let raw = self.raw?;
        let after_open = raw.split_once('\n')?.1;
        // Drop the closing delimiter line.
        let close = after_open.rfind("---")?;
        Some(&after_open[..close])
    }
}

fn is_delimiter(line: &str) -> bool {
    line == "---" || line == "---\r"
}

/// Split a document into frontmatter block and body, byte-exactly.
///
/// The block must open on the very first line. An unclosed block is not a
/// block: the whole input is returned as content.
pub fn split_frontmatter(input: &str) -> FrontmatterSplit<'_> {
    let mut lines = input.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return FrontmatterSplit {
            raw: None,
            content: input,
        };
    };
    if !is_delimiter(first.trim_end_matches('\n')) {
        return FrontmatterSplit {
            raw: None,
            content: input,
        };
    }

    let mut offset = first.len();
    for line in lines {
        let end = offset + line.len();
        if is_delimiter(line.trim_end_matches('\n')) {
            return FrontmatterSplit {
                raw: Some(&input[..end]),
                content: &input[end..],
            };
        }
        offset = end;
    }

    // No closing delimiter.
    FrontmatterSplit {
        raw: None,
        content: input,
    }
}

/// Parse the frontmatter block into a YAML mapping.
///
/// Returns `Ok(None)` when the document has no block, an error when the
/// block is present but not valid YAML.
pub fn parse_frontmatter(input: &str) -> Result<Option<Value>, serde_yaml::Error> {
    let split = split_frontmatter(input);
    match split.yaml() {
        Some(yaml) => {
            let value: Value = serde_yaml::from_str(yaml)?;
            // An empty block parses to null; report it as an empty mapping.
            if value.is_null() {
                Ok(Some(Value::Mapping(Default::default())))
            } else {
                Ok(Some(value))
            }
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_basic() {
        let doc = "---\ntitle: Intro\n---\n# Heading\nbody\n";
        let split = split_frontmatter(doc);
        assert_eq!(split.raw, Some("---\ntitle: Intro\n---\n"));
        assert_eq!(split.content, "# Heading\nbody\n");
    }

    #[test]
    fn split_reconstructs_input() {
        let doc = "---\ntitle: Intro\ntags: [a, b]\n---\n\nbody text\n";
        let split = split_frontmatter(doc);
        let rebuilt = format!("{}{}", split.raw.unwrap_or(""), split.content);
        assert_eq!(rebuilt, doc);
    }

    #[test]
    fn no_frontmatter() {
        let doc = "# Just a heading\n";
        let split = split_frontmatter(doc);
        assert_eq!(split.raw, None);
        assert_eq!(split.content, doc);
    }

    #[test]
    fn unclosed_block_is_not_a_block() {
        let doc = "---\ntitle: Dangling\nno closing";
        let split = split_frontmatter(doc);
        assert_eq!(split.raw, None);
        assert_eq!(split.content, doc);
    }

    #[test]
    fn empty_input() {
        let split = split_frontmatter("");
        assert_eq!(split.raw, None);
        assert_eq!(split.content, "");
    }

    #[test]
    fn delimiter_must_open_first_line() {
        let doc = "\n---\ntitle: x\n---\nbody";
        let split = split_frontmatter(doc);
        assert_eq!(split.raw, None);
    }

    #[test]
    fn crlf_delimiters() {
        let doc = "---\r\ntitle: Intro\r\n---\r\nbody\r\n";
        let split = split_frontmatter(doc);
        assert!(split.raw.is_some());
        assert_eq!(split.content, "body\r\n");
        let rebuilt = format!("{}{}", split.raw.unwrap(), split.content);
        assert_eq!(rebuilt, doc);
    }

    #[test]
    fn closing_delimiter_at_eof_without_newline() {
        let doc = "---\ntitle: x\n---";
        let split = split_frontmatter(doc);
        assert_eq!(split.raw, Some("---\ntitle: x\n---"));
        assert_eq!(split.content, "");
    }

    #[test]
    fn parse_returns_mapping() {
        let doc = "---\ntitle: Intro\nstatus: approved\n---\nbody";
        let meta = parse_frontmatter(doc).unwrap().unwrap();
        assert_eq!(meta["title"], Value::String("Intro".into()));
        assert_eq!(meta["status"], Value::String("approved".into()));
    }

    #[test]
    fn parse_empty_block_is_empty_mapping() {
        let doc = "---\n---\nbody";
        let meta = parse_frontmatter(doc).unwrap().unwrap();
        assert!(meta.as_mapping().is_some_and(|m| m.is_empty()));
    }

    #[test]
    fn parse_absent_block_is_none() {
        assert_eq!(parse_frontmatter("plain body").unwrap(), None);
    }

    #[test]
    fn parse_invalid_yaml_errors() {
        let doc = "---\n: : :\n---\nbody";
        assert!(parse_frontmatter(doc).is_err());
    }

    #[test]
    fn later_dashes_do_not_split_body() {
        let doc = "---\na: 1\n---\nbody\n---\nmore\n";
        let split = split_frontmatter(doc);
        assert_eq!(split.content, "body\n---\nmore\n");
    }
}
