use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

lazy_static! {
    static ref WILDCARD_RE: Regex = Regex::new(r"\*|\?|\[[^\]]+\]").unwrap();
}

/// Shell-style file name pattern (`*`, `?` and `[...]` classes)
///
/// Matching follows `sh` globbing for a single directory level: wildcards
/// never match a leading `.` unless the pattern itself starts with one.
/// Inside a class only single characters, `a-z` ranges and a leading `!`
/// carry meaning; POSIX `[:name:]` classes are not supported.
#[derive(Debug, Clone)]
pub struct FilePattern {
    source: String,
    regex: Regex,
}

impl FilePattern {
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        let mut translated = String::from("^");
        let mut last = 0;

        for wildcard in WILDCARD_RE.find_iter(pattern) {
            translated.push_str(&regex::escape(&pattern[last..wildcard.start()]));
            match wildcard.as_str() {
                "*" => translated.push_str(".*"),
                "?" => translated.push('.'),
                class => {
                    let body = &class[1..class.len() - 1];
                    translated.push('[');
                    match body.strip_prefix('!') {
                        Some(negated) => {
                            translated.push('^');
                            push_class_body(&mut translated, negated);
                        }
                        None => push_class_body(&mut translated, body),
                    }
                    translated.push(']');
                }
            }
            last = wildcard.end();
        }
        translated.push_str(&regex::escape(&pattern[last..]));
        translated.push('$');

        Ok(FilePattern {
            source: pattern.to_string(),
            regex: Regex::new(&translated)?,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check a bare file name against the pattern
    pub fn matches(&self, file_name: &str) -> bool {
        if file_name.starts_with('.') && !self.source.starts_with('.') {
            return false;
        }
        self.regex.is_match(file_name)
    }

    /// Expand the pattern inside `dir`, like `dir/<pattern>` in a shell.
    ///
    /// Returns full paths sorted by file name. No match yields an empty list
    /// rather than the literal pattern.
    pub fn expand<P: AsRef<Path>>(&self, dir: P) -> io::Result<Vec<PathBuf>> {
        let mut matched = Vec::new();

        for entry in fs::read_dir(dir.as_ref())? {
            let entry = entry?;
            let name = entry.file_name();
            // Non-UTF-8 names are matched lossily but passed on untouched
            if self.matches(&name.to_string_lossy()) {
                matched.push(entry.path());
            }
        }

        matched.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(matched)
    }
}

/// Copy a class body so regex-only class syntax (`&&`, `--`, `~~`, nested
/// `[`, escapes) is taken literally
fn push_class_body(translated: &mut String, body: &str) {
    let mut previous = None;
    for c in body.chars() {
        match c {
            '\\' | '[' | '&' | '~' => {
                translated.push('\\');
                translated.push(c);
            }
            '-' if previous == Some('-') => translated.push_str("\\-"),
            _ => translated.push(c),
        }
        previous = Some(c);
    }
}
