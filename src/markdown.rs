use pulldown_cmark::{Options, Parser, html};

/// Shared markdown-to-HTML converter. Default CommonMark options only.
#[derive(Debug, Clone, Default)]
pub struct MarkdownConverter;

impl MarkdownConverter {
    pub fn new() -> Self {
        Self
    }

    pub fn make_html(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, Options::empty());
        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, parser);
        html_output
    }
}
