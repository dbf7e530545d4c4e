//! Variable substitution for tool argument templates.

use std::collections::HashMap;
use std::path::Path;

/// Variable substitution context for argument templates.
///
/// Supports `{varname}` placeholders. Substitution is single-pass, so a
/// value that itself contains braces (a file called `{input}.mp4`, say) is
/// inserted verbatim. Unknown placeholders are left untouched.
///
/// # Example
///
/// ```
/// use vidshelf_av::TemplateContext;
/// use std::path::Path;
///
/// let ctx = TemplateContext::new()
///     .with_input(Path::new("/videos/b.mov"))
///     .with_var("encoder", "libx264");
///
/// assert_eq!(ctx.substitute("{input}"), "/videos/b.mov");
/// assert_eq!(ctx.substitute("{filestem}-{encoder}"), "b-libx264");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    vars: HashMap<String, String>,
}

impl TemplateContext {
    /// Create a new empty template context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set input-file variables:
    /// `{input}`, `{filename}`, `{filestem}`, `{extension}`, `{dirname}`.
    pub fn with_input(mut self, input: &Path) -> Self {
        self.set("input", &input.display().to_string());

        if let Some(name) = input.file_name() {
            self.set("filename", &name.to_string_lossy());
        }
        if let Some(stem) = input.file_stem() {
            self.set("filestem", &stem.to_string_lossy());
        }
        if let Some(ext) = input.extension() {
            self.set("extension", &ext.to_string_lossy());
        }
        if let Some(parent) = input.parent() {
            self.set("dirname", &parent.display().to_string());
        }

        self
    }

    /// Add a custom variable.
    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.set(key, value);
        self
    }

    /// Set a variable.
    pub fn set(&mut self, key: &str, value: &str) {
        self.vars.insert(key.to_string(), value.to_string());
    }

    /// Get a variable value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(|s| s.as_str())
    }

    /// Substitute `{var}` placeholders in a string.
    pub fn substitute(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find('}') {
                Some(close) => {
                    let key = &after[..close];
                    match self.vars.get(key) {
                        Some(value) => out.push_str(value),
                        None => {
                            out.push('{');
                            out.push_str(key);
                            out.push('}');
                        }
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }

    /// Substitute variables in a list of strings.
    pub fn substitute_all(&self, templates: &[String]) -> Vec<String> {
        templates.iter().map(|t| self.substitute(t)).collect()
    }
}
