use pulldown_cmark::escape::{escape_href, escape_html};
use pulldown_cmark::{html, Options, Parser};

use crate::node::{LiteralBlock, Node, TocTreeNode};

/// Render the nodes of document `docname` as a standalone HTML page.
///
/// Links produced for toctrees are relative to the page's own location, so
/// the output directory can be served from anywhere.
pub fn render_page(docname: &str, nodes: &[Node]) -> String {
    let mut body = String::new();
    for node in nodes {
        match node {
            Node::Markdown(text) => {
                let parser = Parser::new_ext(text, Options::ENABLE_TABLES);
                html::push_html(&mut body, parser);
            }
            Node::LiteralBlock(block) => push_literal_block(&mut body, block),
            Node::TocTree(toctree) => push_toctree(&mut body, docname, toctree),
            Node::SystemMessage(message) => {
                body.push_str("<div class=\"system-message\"><p>");
                push_escaped(&mut body, message);
                body.push_str("</p></div>\n");
            }
        }
    }

    let mut page = String::from("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>");
    push_escaped(&mut page, docname);
    page.push_str("</title>\n</head>\n<body>\n");
    page.push_str(&body);
    page.push_str("</body>\n</html>\n");
    page
}

fn push_literal_block(out: &mut String, block: &LiteralBlock) {
    out.push_str("<div class=\"highlight-");
    push_escaped(out, &block.language);
    for class in &block.classes {
        out.push(' ');
        push_escaped(out, class);
    }
    out.push('"');
    if let Some(name) = &block.name {
        out.push_str(" id=\"");
        push_escaped(out, name);
        out.push('"');
    }
    out.push_str(">\n");

    if let Some(caption) = &block.caption {
        out.push_str("<div class=\"code-block-caption\">");
        push_escaped(out, caption);
        out.push_str("</div>\n");
    }

    out.push_str("<pre>");
    let width = (block.lineno_start + block.lines.len())
        .saturating_sub(1)
        .to_string()
        .len();
    for (idx, line) in block.lines.iter().enumerate() {
        if block.linenos {
            let number = block.lineno_start + idx;
            out.push_str(&format!("<span class=\"linenos\">{number:>width$}</span> "));
        }
        let emphasized = block.highlight_lines.contains(&(idx + 1));
        if emphasized {
            out.push_str("<span class=\"hll\">");
        }
        push_escaped(out, line);
        if emphasized {
            out.push_str("</span>");
        }
        out.push('\n');
    }
    out.push_str("</pre>\n</div>\n");
}

fn push_toctree(out: &mut String, docname: &str, toctree: &TocTreeNode) {
    if toctree.hidden {
        return;
    }

    let prefix = "../".repeat(docname.matches('/').count());
    out.push_str("<div class=\"toctree-wrapper\">\n");
    if let Some(caption) = &toctree.caption {
        out.push_str("<p class=\"caption\">");
        push_escaped(out, caption);
        out.push_str("</p>\n");
    }
    out.push_str("<ul>\n");
    for entry in &toctree.entries {
        out.push_str("<li><a href=\"");
        // Writing into a String cannot fail.
        let _ = escape_href(&mut *out, &format!("{prefix}{}.html", entry.docname));
        out.push_str("\">");
        push_escaped(out, entry.title.as_deref().unwrap_or(&entry.docname));
        out.push_str("</a></li>\n");
    }
    out.push_str("</ul>\n</div>\n");
}

fn push_escaped(out: &mut String, text: &str) {
    // Writing into a String cannot fail.
    let _ = escape_html(&mut *out, text);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::TocEntry;

    fn block(lines: &[&str]) -> LiteralBlock {
        LiteralBlock {
            language: "python".into(),
            lines: lines.iter().map(|line| line.to_string()).collect(),
            linenos: false,
            lineno_start: 1,
            highlight_lines: Vec::new(),
            caption: None,
            name: None,
            classes: Vec::new(),
            force: false,
        }
    }

    #[test]
    fn renders_markdown_and_escapes_code() {
        let page = render_page(
            "index",
            &[
                Node::Markdown("# Title\n".into()),
                Node::LiteralBlock(block(&["if a < b:", "    pass"])),
            ],
        );
        assert!(page.contains("<title>index</title>"));
        assert!(page.contains("<h1>Title</h1>"));
        assert!(page.contains("<div class=\"highlight-python\">"));
        assert!(page.contains("if a &lt; b:\n    pass\n</pre>"));
    }

    #[test]
    fn renders_line_numbers_emphasis_and_caption() {
        let mut literal = block(&["a", "b"]);
        literal.linenos = true;
        literal.lineno_start = 9;
        literal.highlight_lines = vec![2];
        literal.caption = Some("Demo".into());
        let page = render_page("index", &[Node::LiteralBlock(literal)]);
        assert!(page.contains("<div class=\"code-block-caption\">Demo</div>"));
        assert!(page.contains("<span class=\"linenos\"> 9</span> a\n"));
        assert!(page.contains("<span class=\"linenos\">10</span> <span class=\"hll\">b</span>\n"));
    }

    #[test]
    fn toctree_links_are_relative_to_the_page() {
        let toctree = TocTreeNode {
            caption: None,
            entries: vec![TocEntry {
                title: Some("Setup".into()),
                docname: "guide/setup".into(),
            }],
            hidden: false,
        };
        let page = render_page("guide/index", &[Node::TocTree(toctree.clone())]);
        assert!(page.contains("<a href=\"../guide/setup.html\">Setup</a>"));

        let hidden = TocTreeNode {
            hidden: true,
            ..toctree
        };
        let page = render_page("index", &[Node::TocTree(hidden)]);
        assert!(!page.contains("toctree-wrapper"));
    }
}
