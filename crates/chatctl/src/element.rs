use std::fmt;

/// A structured reference to one node in an application's accessibility tree.
///
/// An `ElementRef` is an anchor (usually the target's main window) plus an
/// ordered list of segments, innermost first. It is a plain value object:
/// building one never fails and never touches the live tree. Rendering to a
/// System Events reference happens in exactly one place (`render`), so the
/// layout tables stay free of scripting syntax concerns.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementRef {
    anchor: String,
    /// Segments innermost-first, e.g. `["button 1", "group 4"]`.
    segments: Vec<String>,
}

impl ElementRef {
    /// Anchor at a named window, e.g. `window "Claude"`.
    pub fn window(title: &str) -> Self {
        Self {
            anchor: format!("window \"{title}\""),
            segments: Vec::new(),
        }
    }

    /// Anchor at an arbitrary reference expression.
    pub fn anchored(expr: impl Into<String>) -> Self {
        Self {
            anchor: expr.into(),
            segments: Vec::new(),
        }
    }

    /// Descend into a child location. `subpath` may itself be a multi-step
    /// path like `"group 1 of group 2"`; it becomes the new innermost part.
    pub fn descend(&self, subpath: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.insert(0, subpath.to_string());
        Self {
            anchor: self.anchor.clone(),
            segments,
        }
    }

    /// Reference a scalar property of this element, e.g. `value` or `help`.
    pub fn property(&self, name: &str) -> Self {
        self.descend(name)
    }

    /// Reference the n-th item (1-based, AppleScript convention) of a
    /// collection reference.
    pub fn item(&self, index: usize) -> Self {
        self.descend(&format!("item {index}"))
    }

    /// The single render-to-reference step.
    pub fn render(&self) -> String {
        if self.segments.is_empty() {
            return self.anchor.clone();
        }
        format!("{} of {}", self.segments.join(" of "), self.anchor)
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_anchor_alone() {
        let window = ElementRef::window("Claude");
        assert_eq!(window.render(), "window \"Claude\"");
    }

    #[test]
    fn renders_innermost_first() {
        let button = ElementRef::window("Claude")
            .descend("group 2 of group 3")
            .descend("button 1 of group 4");
        assert_eq!(
            button.render(),
            "button 1 of group 4 of group 2 of group 3 of window \"Claude\""
        );
    }

    #[test]
    fn property_and_item_compose() {
        let title = ElementRef::anchored("groups of list 1")
            .item(3)
            .descend("static text 1")
            .property("value");
        assert_eq!(
            title.render(),
            "value of static text 1 of item 3 of groups of list 1"
        );
    }
}
