use super::{AnnotationParser, AnnotationRecord};
use crate::scanner::SourceProvider;
use anyhow::Result;
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static METHOD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:(?:public|private|protected|static|async|override)\s+)*([A-Za-z_$][\w$]*)\s*(?:<[^>]*>)?\s*\(")
        .unwrap()
});

/// One `/** ... */` block and the action it documents.
#[derive(Debug, Clone, PartialEq)]
pub struct CommentBlock {
    pub action: String,
    /// Trimmed, non-blank lines without the `*` gutter
    pub lines: Vec<String>,
}

/// Finds the documentation blocks of a controller source.
///
/// The action is named by a bare `@actionName` first line, or else by the
/// method declared right after the block. Blocks that document no method are
/// dropped.
pub fn comment_blocks(source: &str) -> Vec<CommentBlock> {
    let mut blocks = Vec::new();
    let mut rest = source;

    while let Some(start) = rest.find("/**") {
        let body_start = start + 3;
        let Some(length) = rest[body_start..].find("*/") else {
            break;
        };
        let body = &rest[body_start..body_start + length];
        rest = &rest[body_start + length + 2..];

        let mut lines: Vec<String> = body
            .lines()
            .map(|line| {
                let line = line.trim();
                line.strip_prefix('*').unwrap_or(line).trim().to_string()
            })
            .filter(|line| !line.is_empty())
            .collect();

        let tagged = lines
            .first()
            .filter(|first| first.starts_with('@') && !first.contains(char::is_whitespace))
            .map(|first| first.trim_start_matches('@').to_string());

        let action = match tagged {
            Some(action) => {
                lines.remove(0);
                Some(action)
            }
            None => following_method(rest),
        };

        match action {
            Some(action) => blocks.push(CommentBlock { action, lines }),
            None => debug!("Comment block not attached to a method, skipping"),
        }
    }

    blocks
}

/// Name of the method declared on the first code line of `text`.
fn following_method(text: &str) -> Option<String> {
    let line = text.lines().map(str::trim).find(|line| !line.is_empty())?;
    METHOD_REGEX
        .captures(line)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().to_string())
        .filter(|name| !matches!(name.as_str(), "if" | "for" | "while" | "switch" | "function"))
}

/// Per-run memo of parsed controller files.
///
/// Each controller file is read and parsed at most once; the first request
/// for a file parses the records of every action in it.
pub struct AnnotationCache<'a> {
    provider: &'a dyn SourceProvider,
    parser: AnnotationParser<'a>,
    files: HashMap<String, HashMap<String, AnnotationRecord>>,
}

impl<'a> AnnotationCache<'a> {
    pub fn new(provider: &'a dyn SourceProvider, parser: AnnotationParser<'a>) -> Self {
        Self {
            provider,
            parser,
            files: HashMap::new(),
        }
    }

    /// The record of `action` in the controller at `source_file`, if documented.
    ///
    /// Fails only when the controller cannot be read.
    pub fn annotations(&mut self, source_file: &str, action: &str) -> Result<Option<&AnnotationRecord>> {
        if !self.files.contains_key(source_file) {
            let records = self.parse_file(source_file)?;
            self.files.insert(source_file.to_string(), records);
        }
        Ok(self.files.get(source_file).and_then(|records| records.get(action)))
    }

    /// Number of controller files parsed so far.
    pub fn parsed_files(&self) -> usize {
        self.files.len()
    }

    fn parse_file(&self, source_file: &str) -> Result<HashMap<String, AnnotationRecord>> {
        let source = self.provider.read_controller(source_file)?;
        let mut records = HashMap::new();

        for block in comment_blocks(&source) {
            if records.contains_key(&block.action) {
                warn!(
                    "Action {} is documented twice in {}, keeping the first block",
                    block.action, source_file
                );
                continue;
            }
            let record = self.parser.parse(&block.action, &block.lines);
            records.insert(block.action, record);
        }

        debug!("Parsed {} documented actions from {}", records.len(), source_file);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorOptions;
    use crate::schema::registry::SchemaRegistry;
    use crate::schema::SourceBlob;
    use std::cell::Cell;

    const CONTROLLER: &str = r#"
import type { HttpContext } from '@adonisjs/core/http'

/**
 * Handles users.
 */
export default class UsersController {
  /**
   * @summary List users
   * @responseBody 200 - <User[]>
   */
  async index({ response }: HttpContext) {}

  /**
   * @show
   * @summary Show one user
   */
  public async find({ params }: HttpContext) {}

  /**
   *     @summary Indented gutter
   *
   */
  destroy() {}
}
"#;

    struct CountingProvider {
        reads: Cell<usize>,
    }

    impl SourceProvider for CountingProvider {
        fn read_controller(&self, logical_path: &str) -> Result<String> {
            self.reads.set(self.reads.get() + 1);
            if logical_path.ends_with("missing") {
                anyhow::bail!("cannot read {}", logical_path);
            }
            Ok(CONTROLLER.to_string())
        }

        fn model_sources(&self) -> Result<Vec<SourceBlob>> {
            Ok(Vec::new())
        }

        fn interface_sources(&self) -> Result<Vec<SourceBlob>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_comment_blocks() {
        let blocks = comment_blocks(CONTROLLER);
        let actions: Vec<&str> = blocks.iter().map(|b| b.action.as_str()).collect();
        // the class header block documents no method
        assert_eq!(actions, vec!["index", "show", "destroy"]);
        assert_eq!(
            blocks[0].lines,
            vec!["@summary List users".to_string(), "@responseBody 200 - <User[]>".to_string()]
        );
        assert_eq!(blocks[1].lines, vec!["@summary Show one user".to_string()]);
        assert_eq!(blocks[2].lines, vec!["@summary Indented gutter".to_string()]);
    }

    #[test]
    fn test_unterminated_block() {
        assert!(comment_blocks("/** @summary never closed\n index() {}").is_empty());
    }

    #[test]
    fn test_following_method() {
        assert_eq!(following_method("\n  async store({ request }) {"), Some("store".to_string()));
        assert_eq!(following_method("public static async handle<T>(ctx) {"), Some("handle".to_string()));
        assert_eq!(following_method("export default class A {"), None);
        assert_eq!(following_method("if (x) {"), None);
    }

    #[test]
    fn test_each_controller_is_read_once() {
        let registry = SchemaRegistry::new();
        let options = GeneratorOptions::default();
        let provider = CountingProvider { reads: Cell::new(0) };
        let mut cache = AnnotationCache::new(&provider, AnnotationParser::new(&registry, &options));

        let index = cache.annotations("app/controllers/users_controller", "index").unwrap();
        assert_eq!(index.unwrap().summary.as_deref(), Some("List users"));

        let show = cache.annotations("app/controllers/users_controller", "show").unwrap();
        assert_eq!(show.unwrap().summary.as_deref(), Some("Show one user"));

        assert!(cache
            .annotations("app/controllers/users_controller", "undocumented")
            .unwrap()
            .is_none());

        assert_eq!(provider.reads.get(), 1);
        assert_eq!(cache.parsed_files(), 1);

        cache.annotations("app/controllers/posts_controller", "index").unwrap();
        assert_eq!(provider.reads.get(), 2);
    }

    #[test]
    fn test_unreadable_controller_fails() {
        let registry = SchemaRegistry::new();
        let options = GeneratorOptions::default();
        let provider = CountingProvider { reads: Cell::new(0) };
        let mut cache = AnnotationCache::new(&provider, AnnotationParser::new(&registry, &options));
        assert!(cache.annotations("app/controllers/missing", "index").is_err());
    }
}
