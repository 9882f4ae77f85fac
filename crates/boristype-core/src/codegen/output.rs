use crate::ast::{Directive, Program};

pub const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// Container format of an emitted file, chosen by the file's top-level markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputKind {
    Script,
    /// SPXML inline form whose `OnInit` runs the script
    XmlInit,
    /// Server page with the script in a `<% %>` block
    Html,
}

impl OutputKind {
    /// An `@xml-init` marker wins over `@html` when a file carries both
    pub fn for_program(program: &Program) -> Self {
        if program.has_directive(&Directive::XmlInit) {
            OutputKind::XmlInit
        } else if program.has_directive(&Directive::Html) {
            OutputKind::Html
        } else {
            OutputKind::Script
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputKind::Script => "js",
            OutputKind::XmlInit => "xml",
            OutputKind::Html => "html",
        }
    }

    pub fn wrap(self, code: &str) -> String {
        match self {
            OutputKind::Script => code.to_string(),
            OutputKind::XmlInit => {
                let body = code
                    .split('\n')
                    .map(|line| format!("\t\t{}", line))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!(
                    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<SPXML-INLINE-FORM>\n\t<OnInit PROPERTY=\"1\" EXPR=\"\n{}\n\t\"/>\n</SPXML-INLINE-FORM>",
                    body
                )
            }
            OutputKind::Html => format!("<%\n{}\n%>", code),
        }
    }
}

/// Final file text: the wrapper for `kind`, with the byte-order mark when requested
pub fn finish_output(code: &str, kind: OutputKind, emit_bom: bool) -> String {
    let wrapped = kind.wrap(code);
    if emit_bom {
        let mut text = String::with_capacity(wrapped.len() + 3);
        text.push(BYTE_ORDER_MARK);
        text.push_str(&wrapped);
        text
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    #[test]
    fn test_kind_from_markers() {
        let script = parse_source("log(1);").unwrap();
        let xml = parse_source("/// @xml-init\nlog(1);").unwrap();
        let html = parse_source("/// @html\nlog(1);").unwrap();
        assert_eq!(OutputKind::for_program(&script), OutputKind::Script);
        assert_eq!(OutputKind::for_program(&xml), OutputKind::XmlInit);
        assert_eq!(OutputKind::for_program(&html), OutputKind::Html);
        assert_eq!(OutputKind::XmlInit.extension(), "xml");
    }

    #[test]
    fn test_xml_wrapper_indents_every_line() {
        let text = OutputKind::XmlInit.wrap("a();\nb();");
        assert_eq!(
            text,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<SPXML-INLINE-FORM>\n\t<OnInit PROPERTY=\"1\" EXPR=\"\n\t\ta();\n\t\tb();\n\t\"/>\n</SPXML-INLINE-FORM>"
        );
    }

    #[test]
    fn test_html_wrapper() {
        assert_eq!(OutputKind::Html.wrap("x();"), "<%\nx();\n%>");
    }

    #[test]
    fn test_bom_prefix() {
        assert!(finish_output("x();", OutputKind::Script, true).starts_with('\u{FEFF}'));
        assert_eq!(finish_output("x();", OutputKind::Script, false), "x();");
    }
}
