#![forbid(unsafe_code)]

//! Render engine: the isolated rendering subtree of a component.
//!
//! A [`RenderRoot`] holds exactly one style block and one markup string.
//! [`RenderRoot::replace`] swaps both wholesale and bumps the generation;
//! any ad-hoc bindings made against the previous generation are dropped,
//! because the elements they were bound to no longer exist.
//!
//! # Isolation
//!
//! Every component owns its own root. Styles live only inside that root and
//! nothing here can read or write another component's root, so selectors in
//! one component's style never reach siblings or ancestors and vice versa.
//!
//! # Queries
//!
//! Post-render hooks need to know which elements exist before binding to
//! them. Roots index the start tags of their markup on replacement and
//! answer simple selectors: `tag`, `.class`, `tag.class`, `.a.b`.

use std::fmt;
use std::rc::Rc;

/// Escape text for interpolation into markup.
#[must_use]
pub fn escape(text: &str) -> String {
    v_htmlescape::escape(text).to_string()
}

/// Handler for an ad-hoc (element-level) binding.
pub type ElementHandler = Rc<dyn Fn(&ElementRef)>;

/// A start tag found in the rendered markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef {
    /// Lowercased tag name.
    pub tag: String,
    /// Class tokens in source order.
    pub classes: Vec<String>,
    /// Attributes in source order (the `class` attribute included).
    pub attributes: Vec<(String, String)>,
    /// Position of this element in document order.
    pub index: usize,
}

impl ElementRef {
    /// Whether the element carries `class`.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Value of attribute `name`, if present.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A compound selector: optional tag plus any number of classes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    classes: Vec<String>,
}

impl Selector {
    /// Parse `tag`, `.class`, `tag.class` or `.a.b`. Returns `None` for
    /// anything else (combinators, attribute selectors, empty input).
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let input = input.trim();
        if input.is_empty() || input.contains(char::is_whitespace) {
            return None;
        }
        let mut parts = input.split('.');
        let head = parts.next().unwrap_or_default();
        let tag = if head.is_empty() {
            None
        } else if head.chars().all(is_name_char) {
            Some(head.to_ascii_lowercase())
        } else {
            return None;
        };
        let mut classes = Vec::new();
        for part in parts {
            if part.is_empty() || !part.chars().all(is_name_char) {
                return None;
            }
            classes.push(part.to_string());
        }
        if tag.is_none() && classes.is_empty() {
            return None;
        }
        Some(Self { tag, classes })
    }

    /// Whether `element` satisfies this selector.
    #[must_use]
    pub fn matches(&self, element: &ElementRef) -> bool {
        self.tag.as_ref().is_none_or(|t| *t == element.tag)
            && self.classes.iter().all(|c| element.has_class(c))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Index every start tag in `markup`.
///
/// This is a tolerant scanner, not a parser: it recognizes `<name attrs>`
/// and honors quoted attribute values. End tags and `<!` declarations are
/// skipped; comment bodies are not special-cased. Malformed input yields
/// whatever tags could be recognized.
#[must_use]
pub fn scan_elements(markup: &str) -> Vec<ElementRef> {
    let bytes = markup.as_bytes();
    let mut out = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        let start = i + 1;
        if start >= bytes.len() || !bytes[start].is_ascii_alphabetic() {
            i += 1;
            continue;
        }

        let mut j = start;
        while j < bytes.len() && is_name_char(bytes[j] as char) {
            j += 1;
        }
        let tag = markup[start..j].to_ascii_lowercase();

        let mut attributes = Vec::new();
        loop {
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            if j >= bytes.len() {
                break;
            }
            if bytes[j] == b'>' {
                j += 1;
                break;
            }
            if bytes[j] == b'/' {
                j += 1;
                continue;
            }

            let name_start = j;
            while j < bytes.len()
                && !bytes[j].is_ascii_whitespace()
                && bytes[j] != b'='
                && bytes[j] != b'>'
                && bytes[j] != b'/'
            {
                j += 1;
            }
            let name = markup[name_start..j].to_ascii_lowercase();

            let mut value = String::new();
            if j < bytes.len() && bytes[j] == b'=' {
                j += 1;
                if j < bytes.len() && (bytes[j] == b'"' || bytes[j] == b'\'') {
                    let quote = bytes[j];
                    let value_start = j + 1;
                    j = value_start;
                    while j < bytes.len() && bytes[j] != quote {
                        j += 1;
                    }
                    value = markup[value_start..j.min(bytes.len())].to_string();
                    j = (j + 1).min(bytes.len());
                } else {
                    let value_start = j;
                    while j < bytes.len() && !bytes[j].is_ascii_whitespace() && bytes[j] != b'>' {
                        j += 1;
                    }
                    value = markup[value_start..j].to_string();
                }
            }
            if !name.is_empty() {
                attributes.push((name, value));
            }
        }

        let classes = attributes
            .iter()
            .find(|(k, _)| k == "class")
            .map(|(_, v)| v.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();

        out.push(ElementRef {
            tag,
            classes,
            attributes,
            index: out.len(),
        });
        i = j.max(i + 1);
    }

    out
}

struct Binding {
    selector: Selector,
    event: String,
    handler: ElementHandler,
}

/// A component's private, style-encapsulated output region.
#[derive(Default)]
pub struct RenderRoot {
    style: String,
    markup: String,
    generation: u64,
    elements: Vec<ElementRef>,
    bindings: Vec<Binding>,
}

impl fmt::Debug for RenderRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderRoot")
            .field("generation", &self.generation)
            .field("elements", &self.elements.len())
            .field("bindings", &self.bindings.len())
            .finish()
    }
}

impl RenderRoot {
    /// Create an empty root at generation 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire subtree. Drops every ad-hoc binding.
    pub fn replace(&mut self, style: impl Into<String>, markup: impl Into<String>) {
        self.style = style.into();
        self.markup = markup.into();
        self.elements = scan_elements(&self.markup);
        self.bindings.clear();
        self.generation += 1;
    }

    /// Full subtree: the style block followed by the markup.
    #[must_use]
    pub fn html(&self) -> String {
        format!("<style>{}</style>\n{}", self.style, self.markup)
    }

    /// Current markup without the style block.
    #[must_use]
    pub fn markup(&self) -> &str {
        &self.markup
    }

    /// Current style block contents.
    #[must_use]
    pub fn style(&self) -> &str {
        &self.style
    }

    /// Number of replacements so far.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// First element matching `selector` in document order.
    #[must_use]
    pub fn query(&self, selector: &str) -> Option<&ElementRef> {
        let selector = Selector::parse(selector)?;
        self.elements.iter().find(|e| selector.matches(e))
    }

    /// Every element matching `selector` in document order.
    #[must_use]
    pub fn query_all(&self, selector: &str) -> Vec<&ElementRef> {
        match Selector::parse(selector) {
            Some(selector) => self
                .elements
                .iter()
                .filter(|e| selector.matches(e))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Bind `handler` to `event` on elements matching `selector`.
    ///
    /// Returns `false` (and binds nothing) when no element currently
    /// matches; the binding would be unreachable.
    pub fn bind(
        &mut self,
        selector: &str,
        event: &str,
        handler: impl Fn(&ElementRef) + 'static,
    ) -> bool {
        let Some(parsed) = Selector::parse(selector) else {
            return false;
        };
        if !self.elements.iter().any(|e| parsed.matches(e)) {
            return false;
        }
        self.bindings.push(Binding {
            selector: parsed,
            event: event.to_string(),
            handler: Rc::new(handler),
        });
        true
    }

    /// Live ad-hoc bindings in this generation.
    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.bindings.len()
    }

    /// Drop every ad-hoc binding without replacing content.
    pub fn clear_bindings(&mut self) {
        self.bindings.clear();
    }

    /// Handlers that an `event` on the first element matching `selector`
    /// would reach, cloned out so callers can release any borrow of the
    /// owning component before invoking them.
    #[must_use]
    pub fn handlers_for(&self, selector: &str, event: &str) -> Vec<(ElementRef, ElementHandler)> {
        let Some(target) = self.query(selector) else {
            return Vec::new();
        };
        self.bindings
            .iter()
            .filter(|b| b.event == event && b.selector.matches(target))
            .map(|b| (target.clone(), Rc::clone(&b.handler)))
            .collect()
    }
}
