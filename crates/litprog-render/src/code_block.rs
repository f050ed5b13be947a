use crate::error::DirectiveError;
use crate::node::{LiteralBlock, Node};
use crate::options::{DirectiveOptions, OptionKind, OptionSpec, OptionValue};

/// Options understood by the plain code-block renderer.
pub fn code_block_option_spec() -> OptionSpec {
    OptionSpec::new()
        .with("caption", OptionKind::Text)
        .with("class", OptionKind::Text)
        .with("dedent", OptionKind::OptionalUnsigned)
        .with("emphasize-lines", OptionKind::Text)
        .with("force", OptionKind::Flag)
        .with("language", OptionKind::Text)
        .with("lineno-start", OptionKind::Unsigned)
        .with("linenos", OptionKind::Flag)
        .with("name", OptionKind::Text)
}

/// Build the visible output for a code block.
///
/// The language comes from the `language` option, then `argument`, then
/// `fallback_language`. Options outside [`code_block_option_spec`] are
/// ignored here; callers validate their own superset first.
pub fn render_code_block(
    fallback_language: &str,
    argument: Option<&str>,
    content: &[String],
    options: &DirectiveOptions,
) -> Result<Vec<Node>, DirectiveError> {
    let language = options
        .text("language")
        .or(argument)
        .unwrap_or(fallback_language)
        .to_string();

    let lines = match options.get("dedent") {
        Some(OptionValue::Number(Some(width))) => dedent_by(content, *width),
        Some(_) => dedent_common(content),
        None => content.to_vec(),
    };

    let highlight_lines = match options.text("emphasize-lines") {
        Some(spec) => parse_line_spec(spec, lines.len())?,
        None => Vec::new(),
    };

    let lineno_start = options.number("lineno-start");
    let classes = options
        .text("class")
        .map(|value| value.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    Ok(vec![Node::LiteralBlock(LiteralBlock {
        language,
        lines,
        linenos: options.has("linenos") || lineno_start.is_some(),
        lineno_start: lineno_start.unwrap_or(1),
        highlight_lines,
        caption: options.text("caption").map(str::to_string),
        name: options.text("name").map(str::to_string),
        classes,
        force: options.has("force"),
    })])
}

/// Parse specs such as `1,3-5,8-` into sorted, de-duplicated 1-based line
/// numbers. An open end runs to `total`; any line past `total` is an error,
/// raised before a range is expanded.
pub fn parse_line_spec(spec: &str, total: usize) -> Result<Vec<usize>, DirectiveError> {
    let invalid = || DirectiveError::InvalidLineSpec {
        spec: spec.to_string(),
    };
    let out_of_range = || DirectiveError::LineSpecOutOfRange {
        spec: spec.to_string(),
        total,
    };
    let number = |text: &str| -> Result<usize, DirectiveError> {
        match text.trim().parse::<usize>() {
            Ok(0) | Err(_) => Err(invalid()),
            Ok(value) => Ok(value),
        }
    };

    let mut lines = Vec::new();
    for part in spec.split(',') {
        let part = part.trim();
        match part.split_once('-') {
            None => {
                let line = number(part)?;
                if line > total {
                    return Err(out_of_range());
                }
                lines.push(line);
            }
            Some(("", "")) => return Err(invalid()),
            Some((start, end)) => {
                let start = if start.trim().is_empty() { 1 } else { number(start)? };
                let end = if end.trim().is_empty() {
                    total.max(start)
                } else {
                    number(end)?
                };
                if start > end {
                    return Err(invalid());
                }
                if end > total {
                    return Err(out_of_range());
                }
                lines.extend(start..=end);
            }
        }
    }

    lines.sort_unstable();
    lines.dedup();
    Ok(lines)
}

/// Strip at most `width` leading whitespace characters from every line.
fn dedent_by(lines: &[String], width: usize) -> Vec<String> {
    lines
        .iter()
        .map(|line| {
            let cut = line
                .char_indices()
                .take(width)
                .take_while(|(_, ch)| ch.is_whitespace())
                .last()
                .map(|(idx, ch)| idx + ch.len_utf8())
                .unwrap_or(0);
            line[cut..].to_string()
        })
        .collect()
}

/// Remove the indentation shared by all non-blank lines.
fn dedent_common(lines: &[String]) -> Vec<String> {
    let common = lines
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.chars().take_while(|ch| *ch == ' ' || *ch == '\t').count())
        .min()
        .unwrap_or(0);

    lines
        .iter()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                line.chars().skip(common).collect()
            }
        })
        .collect()
}
