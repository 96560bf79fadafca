use pulldown_cmark::{html, Options, Parser};

/// Renders the buffer to HTML for the preview pane (GitHub-flavoured extensions on).
pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let parser = Parser::new_ext(text, options);
    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::render_markdown;

    #[test]
    fn renders_headings_emphasis_and_lists() {
        let out = render_markdown("# Title\n\n**bold** and *it*\n\n- a\n- b\n");
        assert!(out.contains("<h1>Title</h1>"));
        assert!(out.contains("<strong>bold</strong>"));
        assert!(out.contains("<em>it</em>"));
        assert!(out.contains("<li>a</li>"));
    }

    #[test]
    fn renders_fenced_code_with_language_class() {
        let out = render_markdown("```js\nconsole.log(1);\n```\n");
        assert!(out.contains(r#"<code class="language-js">"#));
    }

    #[test]
    fn renders_gfm_tables_and_strikethrough() {
        let out = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n");
        assert!(out.contains("<table>"));
        assert!(out.contains("<del>gone</del>"));
    }

    #[test]
    fn empty_buffer_renders_nothing() {
        assert_eq!(render_markdown(""), "");
    }
}
