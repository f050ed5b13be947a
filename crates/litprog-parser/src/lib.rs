//! Markdown source scanning for litprog builds.
//!
//! A document is split into an ordered sequence of [`Block`]s: runs of plain
//! Markdown text and fenced directives written as
//!
//! ````markdown
//! ```{name} optional argument
//! :option: value
//! :flag:
//!
//! literal content
//! ```
//! ````
//!
//! Plain fenced code blocks stay inside text blocks, so a directive-looking
//! line nested in an ordinary fence is never treated as a directive. A YAML
//! front-matter block at the top of the file is dropped.

mod fence;
mod line;

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::Path;
use std::sync::OnceLock;

use fence::{detect_fence_start, is_closing_fence, strip_indent, FenceOpen};
use line::{read_lines, LineRecord};
use regex::Regex;

/// Parsed view of one Markdown document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SourceDocument {
    pub blocks: Vec<Block>,
}

impl SourceDocument {
    /// Iterate over the directive blocks in source order.
    pub fn directives(&self) -> impl Iterator<Item = &DirectiveBlock> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Directive(directive) => Some(directive),
            Block::Text(_) => None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    Text(TextBlock),
    Directive(DirectiveBlock),
}

/// Consecutive lines of ordinary Markdown.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextBlock {
    pub line: usize,
    pub lines: Vec<String>,
}

impl TextBlock {
    pub fn text(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

/// One fenced directive occurrence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectiveBlock {
    pub name: String,
    pub argument: Option<String>,
    pub options: Vec<RawOption>,
    pub content: Vec<String>,
    /// 1-based line of the opening fence.
    pub line: usize,
}

/// A `:name: value` option line as written, before any validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawOption {
    pub name: String,
    pub value: Option<String>,
    pub line: usize,
}

pub fn parse_path(path: &Path) -> io::Result<SourceDocument> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    parse_reader(&mut reader)
}

pub fn parse_str(contents: &str) -> SourceDocument {
    let mut reader = BufReader::new(Cursor::new(contents.as_bytes()));
    let lines = read_lines(&mut reader).unwrap_or_default();
    parse_lines(&lines)
}

pub fn parse_reader<R: Read>(reader: &mut BufReader<R>) -> io::Result<SourceDocument> {
    let lines = read_lines(reader)?;
    Ok(parse_lines(&lines))
}

fn parse_lines(lines: &[LineRecord]) -> SourceDocument {
    let mut blocks = Vec::new();
    let mut text = TextAccumulator::default();
    let mut front_matter = FrontMatterState::default();
    let mut plain_fence: Option<FenceOpen> = None;

    let mut idx = 0usize;
    while idx < lines.len() {
        let line = &lines[idx];
        idx += 1;

        if front_matter.consume(line) {
            continue;
        }

        if let Some(fence) = &plain_fence {
            if is_closing_fence(&line.text, fence) {
                plain_fence = None;
            }
            text.push(line);
            continue;
        }

        let Some(fence) = detect_fence_start(&line.text) else {
            text.push(line);
            continue;
        };

        let Some((name, argument)) = directive_header(&fence.info) else {
            plain_fence = Some(fence);
            text.push(line);
            continue;
        };

        let mut body = Vec::new();
        while idx < lines.len() {
            let candidate = &lines[idx];
            idx += 1;
            if is_closing_fence(&candidate.text, &fence) {
                break;
            }
            body.push(strip_indent(&candidate.text, fence.indent).to_string());
        }

        let (options, content) = split_options(body, line.number + 1);
        text.flush_into(&mut blocks);
        blocks.push(Block::Directive(DirectiveBlock {
            name,
            argument,
            options,
            content,
            line: line.number,
        }));
    }

    text.flush_into(&mut blocks);
    SourceDocument { blocks }
}

/// Split `{name} argument` info strings. Anything else is a plain fence.
fn directive_header(info: &str) -> Option<(String, Option<String>)> {
    let rest = info.strip_prefix('{')?;
    let close = rest.find('}')?;
    let name = rest[..close].trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    let argument = rest[close + 1..].trim();
    let argument = (!argument.is_empty()).then(|| argument.to_string());
    Some((name.to_string(), argument))
}

fn option_line() -> &'static Regex {
    static OPTION_LINE: OnceLock<Regex> = OnceLock::new();
    OPTION_LINE.get_or_init(|| {
        Regex::new(r"^\s*:([A-Za-z0-9][A-Za-z0-9_-]*):(?:\s+(.*?))?\s*$")
            .expect("option line pattern is valid")
    })
}

/// Peel leading option lines off a directive body. One blank line directly
/// after the options is treated as a separator and dropped.
fn split_options(body: Vec<String>, first_line: usize) -> (Vec<RawOption>, Vec<String>) {
    let pattern = option_line();
    let mut options = Vec::new();
    let mut consumed = 0usize;

    for text in &body {
        let Some(captures) = pattern.captures(text) else {
            break;
        };
        let value = captures
            .get(2)
            .map(|m| m.as_str().to_string())
            .filter(|value| !value.is_empty());
        options.push(RawOption {
            name: captures[1].to_string(),
            value,
            line: first_line + consumed,
        });
        consumed += 1;
    }

    let mut content: Vec<String> = body.into_iter().skip(consumed).collect();
    if consumed > 0 && content.first().is_some_and(|line| line.trim().is_empty()) {
        content.remove(0);
    }
    (options, content)
}

#[derive(Default)]
struct TextAccumulator {
    start: usize,
    lines: Vec<String>,
}

impl TextAccumulator {
    fn push(&mut self, line: &LineRecord) {
        if self.lines.is_empty() {
            self.start = line.number;
        }
        self.lines.push(line.text.clone());
    }

    fn flush_into(&mut self, blocks: &mut Vec<Block>) {
        if self.lines.is_empty() {
            return;
        }
        blocks.push(Block::Text(TextBlock {
            line: self.start,
            lines: std::mem::take(&mut self.lines),
        }));
    }
}

#[derive(Default)]
struct FrontMatterState {
    active: bool,
    done: bool,
}

impl FrontMatterState {
    fn consume(&mut self, line: &LineRecord) -> bool {
        if self.done {
            return false;
        }

        let trimmed = line.text.trim();

        if line.number == 1 && trimmed == "---" {
            self.active = true;
            return true;
        }

        if self.active {
            if trimmed == "---" || trimmed == "..." {
                self.active = false;
                self.done = true;
            }
            return true;
        }

        self.done = true;
        false
    }
}
