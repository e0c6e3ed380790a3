//! Storage-format markup for image nodes.
//!
//! Local attachments and remote URLs serialize differently:
//!
//! ```text
//! <ac:image ac:alt="Chart" ac:width="700"><ri:attachment ri:filename="chart.png" data-width="700" data-height="467" style="max-width: 100%; height: auto;"/></ac:image>
//! <ac:image><ri:url ri:value="https://example.com/logo.png"/></ac:image>
//! ```
//!
//! Output is XML: every attribute value is escaped and empty elements are
//! self-closed.

use crate::responsive::{ImageNode, ImageSource};
use html_escape::encode_double_quoted_attribute;

/// Append ` name="value"` with the value escaped.
fn push_attr(out: &mut String, name: &str, value: impl std::fmt::Display) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&encode_double_quoted_attribute(&value.to_string()));
    out.push('"');
}

/// Serialize one image node as an `ac:image` element.
pub fn render_image(node: &ImageNode) -> String {
    let mut out = String::from("<ac:image");
    if let Some(alt) = &node.alt_text {
        push_attr(&mut out, "ac:alt", alt);
    }
    if let Some(title) = &node.title {
        push_attr(&mut out, "ac:title", title);
    }
    if let Some(attrs) = &node.responsive {
        push_attr(&mut out, "ac:width", attrs.width);
    }
    out.push('>');

    match &node.source {
        ImageSource::Attachment(_) => {
            out.push_str("<ri:attachment");
            push_attr(
                &mut out,
                "ri:filename",
                node.attachment_name().unwrap_or_default(),
            );
            if let Some(attrs) = &node.responsive {
                push_attr(&mut out, "data-width", attrs.data_width);
                push_attr(&mut out, "data-height", attrs.data_height);
                push_attr(&mut out, "style", attrs.style);
            }
            out.push_str("/>");
        }
        ImageSource::Remote(url) => {
            out.push_str("<ri:url");
            push_attr(&mut out, "ri:value", url);
            out.push_str("/>");
        }
    }

    out.push_str("</ac:image>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::responsive::{RESPONSIVE_STYLE, ResponsiveAttributes};
    use std::path::PathBuf;

    fn attachment_node(responsive: Option<ResponsiveAttributes>) -> ImageNode {
        ImageNode {
            source: ImageSource::Attachment(PathBuf::from("/docs/chart.png")),
            alt_text: Some("Chart".to_string()),
            title: None,
            intrinsic: None,
            responsive,
        }
    }

    #[test]
    fn renders_responsive_attachment() {
        let node = attachment_node(Some(ResponsiveAttributes {
            width: 700,
            data_width: 700,
            data_height: 467,
            style: RESPONSIVE_STYLE,
        }));

        assert_eq!(
            render_image(&node),
            r#"<ac:image ac:alt="Chart" ac:width="700"><ri:attachment ri:filename="chart.png" data-width="700" data-height="467" style="max-width: 100%; height: auto;"/></ac:image>"#
        );
    }

    #[test]
    fn renders_plain_attachment_without_sizing() {
        let xml = render_image(&attachment_node(None));
        assert_eq!(
            xml,
            r#"<ac:image ac:alt="Chart"><ri:attachment ri:filename="chart.png"/></ac:image>"#
        );
        assert!(!xml.contains("data-width"));
        assert!(!xml.contains("style="));
    }

    #[test]
    fn renders_remote_url() {
        let node = ImageNode {
            source: ImageSource::Remote("https://example.com/a.png?x=1&y=2".into()),
            alt_text: None,
            title: Some("Logo".into()),
            intrinsic: None,
            responsive: None,
        };
        assert_eq!(
            render_image(&node),
            r#"<ac:image ac:title="Logo"><ri:url ri:value="https://example.com/a.png?x=1&amp;y=2"/></ac:image>"#
        );
    }

    #[test]
    fn escapes_attribute_values() {
        let mut node = attachment_node(None);
        node.alt_text = Some(r#"Say "hi" <b>&</b>"#.into());
        let xml = render_image(&node);
        assert!(xml.contains(r#"ac:alt="Say &quot;hi&quot; &lt;b&gt;&amp;&lt;/b&gt;""#));
    }

    #[test]
    fn style_and_apostrophes_pass_through() {
        let mut node = attachment_node(None);
        node.alt_text = Some("it's 100%".into());
        assert!(render_image(&node).contains(r#"ac:alt="it's 100%""#));
    }
}
