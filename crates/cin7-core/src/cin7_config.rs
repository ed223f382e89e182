//! Reading and updating the `layers` list in `cin7.config.js`.
//!
//! The config is a CommonJS module, so it is not parsed as a whole. Instead a
//! small scanner walks the source, skipping comments and string literals, until
//! it finds a `layers:` property whose value is an array literal of strings.
//! Rewrites replace only that array's byte span; the rest of the file is kept
//! byte-for-byte.

use crate::error::{Cin7Error, Result};
use crate::{io, paths, templates};
use std::ops::Range;
use std::path::Path;

const LAYERS_KEY: &str = "layers";

/// The parsed `layers` array and where it sits in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerList {
    pub layers: Vec<String>,
    /// Byte range from `[` through `]` inclusive.
    pub span: Range<usize>,
}

/// Locate and parse the `layers` array literal.
pub fn parse_layers(source: &str) -> Result<LayerList> {
    let mut cur = Cursor::new(source);
    while let Some(b) = cur.peek() {
        match b {
            b'/' if matches!(cur.peek_at(1), Some(b'/') | Some(b'*')) => cur.skip_comment()?,
            b'`' => cur.skip_template_literal()?,
            b'\'' | b'"' => {
                let value = cur.string_literal()?;
                if value == LAYERS_KEY {
                    if let Some(list) = cur.try_property_array()? {
                        return Ok(list);
                    }
                }
            }
            b if is_ident_start(b) => {
                let preceded_by_dot = cur.prev_significant() == Some(b'.');
                let ident = cur.identifier();
                if ident == LAYERS_KEY && !preceded_by_dot {
                    if let Some(list) = cur.try_property_array()? {
                        return Ok(list);
                    }
                }
            }
            _ => cur.bump(),
        }
    }
    Err(Cin7Error::ConfigParse("no `layers` array found".into()))
}

/// Render layer names as a single-line array literal: `['core', 'auth']`.
pub fn render_layers(layers: &[String]) -> String {
    let items: Vec<String> = layers
        .iter()
        .map(|l| format!("'{}'", l.replace('\\', "\\\\").replace('\'', "\\'")))
        .collect();
    format!("[{}]", items.join(", "))
}

/// Return `source` with `new_layers` merged into its `layers` array.
///
/// Existing layers keep their order; new ones are appended; duplicates are
/// dropped.
pub fn add_layers(source: &str, new_layers: &[String]) -> Result<String> {
    let list = parse_layers(source)?;
    let mut merged: Vec<String> = Vec::with_capacity(list.layers.len() + new_layers.len());
    for layer in list.layers.iter().chain(new_layers.iter()) {
        if !merged.contains(layer) {
            merged.push(layer.clone());
        }
    }

    let mut out = String::with_capacity(source.len() + 32);
    out.push_str(&source[..list.span.start]);
    out.push_str(&render_layers(&merged));
    out.push_str(&source[list.span.end..]);
    Ok(out)
}

/// Update `root/cin7.config.js` in place. Returns `false` when the file does
/// not exist.
pub fn update_config_file(root: &Path, new_layers: &[String]) -> Result<bool> {
    let path = paths::cin7_config_path(root);
    if !path.exists() {
        return Ok(false);
    }
    let source = std::fs::read_to_string(&path)?;
    let updated = add_layers(&source, new_layers)?;
    if updated != source {
        io::atomic_write(&path, updated.as_bytes())?;
    }
    tracing::debug!(path = %path.display(), "updated layers");
    Ok(true)
}

/// The `cin7.config.js` written for a new project.
pub fn render_config(layers: &[String]) -> Result<String> {
    templates::render(
        "project/cin7.config.js",
        minijinja::context! { layers => render_layers(layers) },
    )
}

/// Read the layers of `root/cin7.config.js`, if present.
pub fn read_layers(root: &Path) -> Result<Option<Vec<String>>> {
    let path = paths::cin7_config_path(root);
    if !path.exists() {
        return Ok(None);
    }
    let source = std::fs::read_to_string(&path)?;
    Ok(Some(parse_layers(&source)?.layers))
}

// ---------------------------------------------------------------------------
// Scanner
// ---------------------------------------------------------------------------

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b'$'
}

fn is_ident_continue(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit()
}

struct Cursor<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn prev_significant(&self) -> Option<u8> {
        self.bytes[..self.pos]
            .iter()
            .rev()
            .copied()
            .find(|b| !b.is_ascii_whitespace())
    }

    fn error(&self, msg: &str) -> Cin7Error {
        let end = self.pos.min(self.bytes.len());
        let line = self.bytes[..end].iter().filter(|&&b| b == b'\n').count() + 1;
        Cin7Error::ConfigParse(format!("{msg} (line {line})"))
    }

    fn skip_comment(&mut self) -> Result<()> {
        match self.peek_at(1) {
            Some(b'/') => {
                while let Some(b) = self.peek() {
                    if b == b'\n' {
                        break;
                    }
                    self.bump();
                }
                Ok(())
            }
            Some(b'*') => {
                self.pos += 2;
                while self.pos < self.bytes.len() {
                    if self.peek() == Some(b'*') && self.peek_at(1) == Some(b'/') {
                        self.pos += 2;
                        return Ok(());
                    }
                    self.bump();
                }
                Err(self.error("unterminated block comment"))
            }
            _ => Ok(()),
        }
    }

    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => self.bump(),
                Some(b'/') if matches!(self.peek_at(1), Some(b'/') | Some(b'*')) => {
                    self.skip_comment()?
                }
                _ => return Ok(()),
            }
        }
    }

    fn identifier(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_continue) {
            self.bump();
        }
        &self.src[start..self.pos]
    }

    /// Consume a quoted literal starting at the cursor and return its value.
    fn string_literal(&mut self) -> Result<String> {
        let quote = self.peek().unwrap_or(b'\'');
        let open = self.pos;
        self.bump();
        let mut value = String::new();
        let mut chunk_start = self.pos;
        loop {
            match self.peek() {
                None => {
                    self.pos = open;
                    return Err(self.error("unterminated string literal"));
                }
                Some(b) if b == quote => {
                    value.push_str(&self.src[chunk_start..self.pos]);
                    self.bump();
                    return Ok(value);
                }
                Some(b'\n') if quote != b'`' => {
                    self.pos = open;
                    return Err(self.error("unterminated string literal"));
                }
                Some(b'$') if quote == b'`' && self.peek_at(1) == Some(b'{') => {
                    return Err(self.error("template interpolation is not allowed in layers"));
                }
                Some(b'\\') => {
                    value.push_str(&self.src[chunk_start..self.pos]);
                    self.bump();
                    let escaped = self.src[self.pos..]
                        .chars()
                        .next()
                        .ok_or_else(|| self.error("unterminated string literal"))?;
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        '0' => value.push('\0'),
                        '\n' => {}
                        other => value.push(other),
                    }
                    self.pos += escaped.len_utf8();
                    chunk_start = self.pos;
                }
                Some(_) => self.bump(),
            }
        }
    }

    /// Skip a template literal, including any `${ ... }` substitutions and
    /// the strings, comments and nested templates inside them.
    fn skip_template_literal(&mut self) -> Result<()> {
        let open = self.pos;
        self.bump();
        loop {
            match self.peek() {
                None => {
                    self.pos = open;
                    return Err(self.error("unterminated template literal"));
                }
                Some(b'`') => {
                    self.bump();
                    return Ok(());
                }
                Some(b'\\') => self.pos += 2,
                Some(b'$') if self.peek_at(1) == Some(b'{') => {
                    self.pos += 2;
                    self.skip_substitution(open)?;
                }
                Some(_) => self.bump(),
            }
        }
    }

    /// Skip to the `}` closing a `${` whose template opened at `open`.
    fn skip_substitution(&mut self, open: usize) -> Result<()> {
        let mut depth = 1usize;
        loop {
            match self.peek() {
                None => {
                    self.pos = open;
                    return Err(self.error("unterminated template literal"));
                }
                Some(b'/') if matches!(self.peek_at(1), Some(b'/') | Some(b'*')) => {
                    self.skip_comment()?
                }
                Some(b'\'') | Some(b'"') => {
                    self.string_literal()?;
                }
                Some(b'`') => self.skip_template_literal()?,
                Some(b'{') => {
                    depth += 1;
                    self.bump();
                }
                Some(b'}') => {
                    self.bump();
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Some(_) => self.bump(),
            }
        }
    }

    /// After a `layers` key: if a `:` follows, parse the array value.
    /// Returns `None` (with the cursor restored) when the key was not a
    /// property name.
    fn try_property_array(&mut self) -> Result<Option<LayerList>> {
        let resume = self.pos;
        self.skip_trivia()?;
        if self.peek() != Some(b':') {
            self.pos = resume;
            return Ok(None);
        }
        self.bump();
        self.skip_trivia()?;
        if self.peek() != Some(b'[') {
            return Err(self.error("`layers` must be an array literal"));
        }
        self.array().map(Some)
    }

    fn array(&mut self) -> Result<LayerList> {
        let start = self.pos;
        self.bump();
        let mut layers = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(b']') => {
                    self.bump();
                    return Ok(LayerList {
                        layers,
                        span: start..self.pos,
                    });
                }
                Some(b'\'') | Some(b'"') | Some(b'`') => {
                    let value = self.string_literal()?;
                    let trimmed = value.trim();
                    if !trimmed.is_empty() {
                        layers.push(trimmed.to_string());
                    }
                    self.skip_trivia()?;
                    match self.peek() {
                        Some(b',') => self.bump(),
                        Some(b']') => {}
                        None => return Err(self.error("unterminated `layers` array")),
                        Some(_) => return Err(self.error("expected `,` or `]` in `layers`")),
                    }
                }
                None => return Err(self.error("unterminated `layers` array")),
                Some(_) => return Err(self.error("`layers` entries must be string literals")),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn s(list: &[&str]) -> Vec<String> {
        list.iter().map(|x| x.to_string()).collect()
    }

    #[test]
    fn adds_layer_to_single_entry_list() {
        let src = "module.exports = {\n  layers: ['core'],\n};\n";
        let out = add_layers(src, &s(&["auth"])).unwrap();
        assert_eq!(out, "module.exports = {\n  layers: ['core', 'auth'],\n};\n");
        assert_eq!(parse_layers(&out).unwrap().layers, s(&["core", "auth"]));
    }

    #[test]
    fn duplicates_are_dropped() {
        let src = "module.exports = { layers: ['core', 'auth'] };";
        let out = add_layers(src, &s(&["auth", "core", "vanilla-js", "vanilla-js"])).unwrap();
        assert_eq!(
            out,
            "module.exports = { layers: ['core', 'auth', 'vanilla-js'] };"
        );
    }

    #[test]
    fn handles_multiline_arrays_comments_and_double_quotes() {
        let src = r#"// layers: ['ignored']
module.exports = {
  /* enabled layers */
  layers: [
    "core", // always on
    'vanilla-js',
  ],

  build: { target: 'production' },
};
"#;
        let list = parse_layers(src).unwrap();
        assert_eq!(list.layers, s(&["core", "vanilla-js"]));

        let out = add_layers(src, &s(&["auth"])).unwrap();
        assert!(out.starts_with("// layers: ['ignored']\nmodule.exports = {\n  /* enabled layers */\n  layers: ['core', 'vanilla-js', 'auth'],"));
        assert!(out.contains("build: { target: 'production' }"));
    }

    #[test]
    fn keys_inside_strings_and_other_identifiers_are_skipped() {
        let src = r#"const note = "layers: ['nope']";
module.exports = { otherlayers: ['x'], config.layers, 'layers': ['core'] };"#;
        assert_eq!(parse_layers(src).unwrap().layers, s(&["core"]));
    }

    #[test]
    fn template_literals_outside_layers_are_skipped() {
        let src = "const out = `${__dirname}/dist`;\n\
                   const nested = `a ${ {x: `b ${'}'}`}.x } c`;\n\
                   module.exports = { output: out, layers: ['core'] };\n";
        assert_eq!(parse_layers(src).unwrap().layers, s(&["core"]));
        let out = add_layers(src, &s(&["auth"])).unwrap();
        assert!(out.starts_with("const out = `${__dirname}/dist`;"));
        assert!(out.contains("layers: ['core', 'auth']"));
    }

    #[test]
    fn interpolation_inside_layers_is_rejected() {
        let err = parse_layers("module.exports = { layers: [`${prefix}core`] };").unwrap_err();
        assert!(err.to_string().contains("template interpolation"));
    }

    #[test]
    fn unterminated_template_literal_is_rejected() {
        assert!(parse_layers("const x = `${a;\nmodule.exports = { layers: ['core'] };").is_err());
    }

    #[test]
    fn empty_array_accepts_new_layers() {
        let out = add_layers("module.exports = { layers: [] };", &s(&["core"])).unwrap();
        assert_eq!(out, "module.exports = { layers: ['core'] };");
    }

    #[test]
    fn missing_layers_is_an_error() {
        let err = parse_layers("module.exports = { build: {} };").unwrap_err();
        assert!(err.to_string().contains("no `layers` array"));
    }

    #[test]
    fn non_string_entries_are_rejected() {
        let err = parse_layers("module.exports = { layers: ['core', someVar] };").unwrap_err();
        assert!(err.to_string().contains("string literals"));
    }

    #[test]
    fn non_array_value_is_rejected() {
        assert!(parse_layers("module.exports = { layers: getLayers() };").is_err());
    }

    #[test]
    fn unterminated_array_is_rejected() {
        assert!(parse_layers("module.exports = { layers: ['core', ").is_err());
    }

    #[test]
    fn escapes_round_trip() {
        let src = r"module.exports = { layers: ['it\'s'] };";
        let list = parse_layers(src).unwrap();
        assert_eq!(list.layers, s(&["it's"]));
        assert_eq!(render_layers(&list.layers), r"['it\'s']");
    }

    #[test]
    fn update_config_file_is_noop_without_file() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(!update_config_file(dir.path(), &s(&["auth"])).unwrap());
        assert!(read_layers(dir.path()).unwrap().is_none());
    }

    #[test]
    fn update_config_file_rewrites_layers() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("cin7.config.js"),
            "module.exports = {\n  layers: ['core'],\n};\n",
        )
        .unwrap();
        assert!(update_config_file(dir.path(), &s(&["auth"])).unwrap());
        assert_eq!(
            read_layers(dir.path()).unwrap().unwrap(),
            s(&["core", "auth"])
        );
    }

    #[test]
    fn rendered_config_parses_back() {
        let out = render_config(&s(&["core", "vanilla-js"])).unwrap();
        assert!(out.starts_with("module.exports = {"));
        assert!(out.contains("largeTableThreshold: 1000"));
        assert_eq!(parse_layers(&out).unwrap().layers, s(&["core", "vanilla-js"]));
    }
}
