//! Sample editor documents for testing and demonstration.
//!
//! Each sample is markup as the rich-text editor emits it: a flat run of
//! blocks with `ql-*` formatting classes.

/// One-pixel PNG as a data URI.
pub const TINY_PNG_DATA_URI: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNk+M9QDwADhgGAWjR9awAAAABJRU5ErkJggg==";

/// Minimal document for unit testing.
pub fn minimal_draft() -> &'static str {
    "<p>Hello, A4.</p>"
}

/// Short letter with alignment and inline formatting.
pub fn letter_draft() -> &'static str {
    r#"<h1 class="ql-align-center">Notice of Change</h1>
<p class="ql-align-right">18 October 2026</p>
<p>Dear <strong>Customer</strong>,</p>
<p>Starting next month our office moves to a new address. Your account,
contracts and billing details stay <em>exactly</em> as they are.</p>
<p>Please update your records and send any questions to
<u>support@example.com</u>.</p>
<p class="ql-align-right">Kind regards,<br>The Office Team</p>"#
}

/// Meeting notes with headings and both list kinds.
pub fn meeting_notes_draft() -> &'static str {
    r#"<h2>Weekly sync</h2>
<p><strong>Attendees:</strong> Kim, Tanaka, Li, Smith</p>
<h3>Decisions</h3>
<ol>
<li>Ship the export fix on Friday.</li>
<li>Freeze translations for the release.</li>
</ol>
<h3>Follow-ups</h3>
<ul>
<li>Check page breaks on long tables.</li>
<li>Collect feedback on the preview highlight.</li>
<li><s>Rename the save button</s> (dropped)</li>
</ul>
<blockquote>Next sync moves to Thursday.</blockquote>"#
}

/// The same paragraph in every supported UI language.
pub fn multilingual_draft() -> &'static str {
    r#"<h2>다국어 문서</h2>
<p>이 문서는 A4 용지에 맞게 자동으로 페이지가 나뉩니다.</p>
<p>This document is split into A4 pages automatically.</p>
<p>この文書はA4用紙に合わせて自動的にページ分割されます。</p>
<p>本文档会自动按A4纸张分页。</p>"#
}

/// Styled blocks: colors, sizes, code and an embedded image.
pub fn styled_draft() -> String {
    format!(
        r#"<p class="ql-size-large"><span style="color: #1a365d">Quarterly summary</span></p>
<p><span style="background-color: #fef3c7">Highlighted</span> figures are preliminary.</p>
<p class="ql-font-serif">Serif paragraph for the body text.</p>
<pre class="ql-syntax">let pages = paginate(markup);
println!("{{}}", pages.count);</pre>
<p><img src="{TINY_PNG_DATA_URI}" width="64" height="64"></p>
<p class="ql-size-small">Figures rounded to the nearest unit.</p>"#
    )
}

/// Editor content laid out in two columns.
pub fn two_column_draft() -> &'static str {
    r#"<div style="column-count: 2; column-gap: 24px">
<p>Left and right columns share the flow of this block.</p>
<p>Export clears the column styles and restores them afterwards.</p>
</div>"#
}

/// `paragraphs` numbered paragraphs, long enough to need several pages.
pub fn long_draft(paragraphs: usize) -> String {
    let mut out = String::from("<h1>Long document</h1>");
    for i in 1..=paragraphs {
        out.push_str(&format!(
            "<p>Paragraph {i}. The quick brown fox jumps over the lazy dog, \
             and the paginator decides which sheet this block lands on.</p>"
        ));
    }
    out
}

/// A table, an image, lists and every inline format.
pub fn all_elements_draft() -> String {
    format!(
        r#"<h1>Heading 1</h1>
<h2>Heading 2</h2>
<h3>Heading 3</h3>
<p>Plain, <strong>bold</strong>, <em>italic</em>, <u>underline</u>, <s>strike</s> and <code>code</code>.</p>
<ul><li>Bullet one</li><li>Bullet two</li></ul>
<ol><li>First</li><li>Second</li></ol>
<blockquote>A quotation.</blockquote>
<table>
<tr><th>Item</th><th>Qty</th></tr>
<tr><td>Paper</td><td>500</td></tr>
<tr><td>Toner</td><td>2</td></tr>
</table>
<p><img src="{TINY_PNG_DATA_URI}"></p>
<p class="ql-align-justify">Justified text closes the sample.</p>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{parse_html, DomNode};

    #[test]
    fn samples_parse_to_blocks() {
        for sample in [
            minimal_draft().to_string(),
            letter_draft().to_string(),
            meeting_notes_draft().to_string(),
            multilingual_draft().to_string(),
            styled_draft(),
            two_column_draft().to_string(),
            all_elements_draft(),
        ] {
            let blocks = parse_html(&sample);
            assert!(blocks.iter().any(|n| matches!(n, DomNode::Element(_))));
        }
    }

    #[test]
    fn long_draft_has_requested_paragraphs() {
        let blocks = parse_html(&long_draft(12));
        assert_eq!(blocks.iter().filter(|n| n.as_element().is_some()).count(), 13);
    }
}
