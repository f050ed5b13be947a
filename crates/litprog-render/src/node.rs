/// Output produced for a document's rendered page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// Ordinary Markdown passed through from the source.
    Markdown(String),
    LiteralBlock(LiteralBlock),
    TocTree(TocTreeNode),
    /// Inline report of a directive problem, shown where the directive was.
    SystemMessage(String),
}

/// A formatted, highlighted code block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiteralBlock {
    pub language: String,
    pub lines: Vec<String>,
    pub linenos: bool,
    pub lineno_start: usize,
    /// 1-based, relative to the block.
    pub highlight_lines: Vec<usize>,
    pub caption: Option<String>,
    pub name: Option<String>,
    pub classes: Vec<String>,
    pub force: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocTreeNode {
    pub caption: Option<String>,
    pub entries: Vec<TocEntry>,
    pub hidden: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TocEntry {
    pub title: Option<String>,
    pub docname: String,
}
