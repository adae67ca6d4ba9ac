//! Reordering of streamed inline scripts inside an HTML body.
//!
//! Out-of-order streaming appends one inline `<script>` per resolved chunk,
//! in completion order. Two renders of the same page can therefore differ only
//! in the order of those scripts. This module moves every qualifying script to
//! the end of `<body>`, sorted by its text, so that such renders serialize to
//! the same markup.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lol_html::errors::RewritingError;
use lol_html::html_content::{ContentType, EndTag};
use lol_html::{element, rewrite_str, text, EndTagHandler, RewriteStrSettings};

/// Errors from markup reordering.
#[derive(Debug, thiserror::Error)]
pub enum MarkupError {
    /// The rewriter rejected the document.
    #[error("failed to rewrite markup: {0}")]
    Rewrite(#[from] RewritingError),

    /// Qualifying scripts were found but `</body>` never appeared.
    #[error("body element is not closed; cannot re-append {0} script(s)")]
    UnclosedBody(usize),
}

/// An inline or external `<script>` found inside `<body>`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ScriptFragment {
    attributes: Vec<(String, String)>,
    text: String,
    external: bool,
}

impl ScriptFragment {
    fn qualifies(&self, marker: &str) -> bool {
        !self.external && self.text.contains(marker)
    }

    fn to_html(&self) -> String {
        let mut html = String::from("<script");
        for (name, value) in &self.attributes {
            html.push(' ');
            html.push_str(name);
            html.push_str("=\"");
            html.push_str(&value.replace('"', "&quot;"));
            html.push('"');
        }
        html.push('>');
        html.push_str(&self.text);
        html.push_str("</script>");
        html
    }
}

/// Move scripts that carry `marker` and no `src` to the end of `<body>`,
/// ordered by their text.
///
/// Returns the input unchanged when no script qualifies. External scripts are
/// never moved.
pub fn reorder_stream_scripts(html: &str, marker: &str) -> Result<String, MarkupError> {
    let scripts = collect_body_scripts(html)?;

    let remove: Vec<bool> = scripts.iter().map(|s| s.qualifies(marker)).collect();
    let mut qualifying: Vec<&ScriptFragment> =
        scripts.iter().filter(|s| s.qualifies(marker)).collect();
    if qualifying.is_empty() {
        return Ok(html.to_string());
    }
    qualifying.sort_by(|a, b| a.text.cmp(&b.text));

    let count = qualifying.len();
    let tail: String = qualifying.iter().map(|s| s.to_html()).collect();

    let remove = Rc::new(remove);
    let tail = Rc::new(tail);
    let index = Rc::new(Cell::new(0usize));
    let body_seen = Rc::new(Cell::new(false));
    let appended = Rc::new(Cell::new(false));

    let rewritten = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("body script", {
                    let remove = Rc::clone(&remove);
                    let index = Rc::clone(&index);
                    move |el| {
                        let i = index.get();
                        index.set(i + 1);
                        if remove.get(i).copied().unwrap_or(false) {
                            el.remove();
                        }
                        Ok(())
                    }
                }),
                element!("body", {
                    let tail = Rc::clone(&tail);
                    let body_seen = Rc::clone(&body_seen);
                    let appended = Rc::clone(&appended);
                    move |el| {
                        if body_seen.replace(true) {
                            return Ok(());
                        }
                        if let Some(handlers) = el.end_tag_handlers() {
                            let tail = Rc::clone(&tail);
                            let appended = Rc::clone(&appended);
                            let handler: EndTagHandler<'static> =
                                Box::new(move |end: &mut EndTag<'_>| {
                                    end.before(&tail, ContentType::Html);
                                    appended.set(true);
                                    Ok(())
                                });
                            handlers.push(handler);
                        }
                        Ok(())
                    }
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )?;

    if !appended.get() {
        return Err(MarkupError::UnclosedBody(count));
    }

    Ok(rewritten)
}

fn collect_body_scripts(html: &str) -> Result<Vec<ScriptFragment>, MarkupError> {
    let scripts: Rc<RefCell<Vec<ScriptFragment>>> = Rc::new(RefCell::new(Vec::new()));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("body script", {
                    let scripts = Rc::clone(&scripts);
                    move |el| {
                        let attributes = el
                            .attributes()
                            .iter()
                            .map(|attr| (attr.name(), attr.value()))
                            .collect();
                        scripts.borrow_mut().push(ScriptFragment {
                            attributes,
                            text: String::new(),
                            external: el.has_attribute("src"),
                        });
                        Ok(())
                    }
                }),
                text!("body script", {
                    let scripts = Rc::clone(&scripts);
                    move |chunk| {
                        if let Some(current) = scripts.borrow_mut().last_mut() {
                            current.text.push_str(chunk.as_str());
                        }
                        Ok(())
                    }
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )?;

    let scripts = Rc::try_unwrap(scripts)
        .map(RefCell::into_inner)
        .unwrap_or_else(|rc| rc.borrow().clone());
    Ok(scripts)
}
