//! Built-in tokenizer for common C-family languages, JSON and plain text.
//!
//! This is a single-pass scanner, not a parser. It knows each language's
//! keywords, comment and string delimiters, and a few contextual rules:
//! the identifier after `struct`/`class`/`enum` is a type definition,
//! capitalized identifiers are types, and an identifier followed by `:`
//! inside parentheses is a parameter.

use super::{Highlighter, Token, TokenClass, TokenStream};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Language {
    Rust,
    JavaScript,
    TypeScript,
    C,
    Cpp,
    Java,
    Go,
    Json,
    Plain,
}

impl Language {
    fn from_name(name: &str) -> Option<Self> {
        let lang = match name.trim().to_ascii_lowercase().as_str() {
            "rust" | "rs" => Language::Rust,
            "javascript" | "js" | "jsx" => Language::JavaScript,
            "typescript" | "ts" | "tsx" => Language::TypeScript,
            "c" | "h" => Language::C,
            "cpp" | "c++" | "cc" | "hpp" => Language::Cpp,
            "java" => Language::Java,
            "go" | "golang" => Language::Go,
            "json" => Language::Json,
            "plain" | "text" | "txt" | "" => Language::Plain,
            _ => return None,
        };
        Some(lang)
    }

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Language::Rust => &[
                "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum",
                "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod",
                "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct", "super",
                "trait", "true", "type", "unsafe", "use", "where", "while",
            ],
            Language::JavaScript | Language::TypeScript => &[
                "async", "await", "break", "case", "catch", "class", "const", "continue", "default",
                "delete", "do", "else", "export", "extends", "false", "finally", "for", "from",
                "function", "if", "import", "in", "instanceof", "interface", "let", "new", "null",
                "of", "return", "static", "super", "switch", "this", "throw", "true", "try", "type",
                "typeof", "undefined", "var", "void", "while", "yield",
            ],
            Language::C | Language::Cpp => &[
                "auto", "bool", "break", "case", "char", "class", "const", "continue", "default",
                "delete", "do", "double", "else", "enum", "extern", "false", "float", "for", "if",
                "int", "long", "namespace", "new", "nullptr", "private", "protected", "public",
                "return", "short", "signed", "sizeof", "static", "struct", "switch", "template",
                "this", "true", "typedef", "union", "unsigned", "using", "virtual", "void", "while",
            ],
            Language::Java => &[
                "abstract", "boolean", "break", "byte", "case", "catch", "char", "class", "continue",
                "default", "do", "double", "else", "enum", "extends", "false", "final", "finally",
                "float", "for", "if", "implements", "import", "instanceof", "int", "interface",
                "long", "new", "null", "package", "private", "protected", "public", "return",
                "static", "super", "switch", "this", "throw", "throws", "true", "try", "void",
                "while",
            ],
            Language::Go => &[
                "break", "case", "chan", "const", "continue", "default", "defer", "else",
                "fallthrough", "false", "for", "func", "go", "goto", "if", "import", "interface",
                "map", "nil", "package", "range", "return", "select", "struct", "switch", "true",
                "type", "var",
            ],
            Language::Json => &["true", "false", "null"],
            Language::Plain => &[],
        }
    }

    /// Keywords whose following identifier names a new type.
    fn type_definers(self) -> &'static [&'static str] {
        match self {
            Language::Rust => &["struct", "enum", "trait", "type", "union"],
            Language::JavaScript => &["class"],
            Language::TypeScript => &["class", "interface", "type", "enum"],
            Language::C | Language::Cpp => &["struct", "class", "enum", "union", "typedef"],
            Language::Java => &["class", "interface", "enum"],
            Language::Go => &["type"],
            Language::Json | Language::Plain => &[],
        }
    }

    fn line_comment(self) -> Option<&'static str> {
        match self {
            Language::Json | Language::Plain => None,
            _ => Some("//"),
        }
    }

    fn has_block_comments(self) -> bool {
        !matches!(self, Language::Json | Language::Plain)
    }

    /// `#include`-style lines (and `#[...]` attributes in Rust).
    fn has_preprocessor(self) -> bool {
        matches!(self, Language::C | Language::Cpp | Language::Rust)
    }

    fn string_quotes(self) -> &'static [char] {
        match self {
            Language::JavaScript | Language::TypeScript => &['"', '\'', '`'],
            Language::Go => &['"', '`'],
            Language::Rust | Language::Json => &['"'],
            Language::C | Language::Cpp | Language::Java => &['"', '\''],
            Language::Plain => &[],
        }
    }

    /// Languages with `name: Type` parameters.
    fn typed_parameters(self) -> bool {
        matches!(self, Language::Rust | Language::TypeScript)
    }
}

/// Tokenizer for the languages listed in the module docs.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinHighlighter;

impl Highlighter for BuiltinHighlighter {
    fn tokenize(&self, language: &str, source: &str) -> Option<TokenStream> {
        let language = Language::from_name(language)?;
        let mut lexer = Lexer::new(language, source);
        lexer.run();
        Some(TokenStream::Lines(lexer.into_lines()))
    }
}

const OPERATOR_CHARS: &str = "+-*/%=&|<>!^~?:";
const COMMENT_KEYWORDS: &[&str] = &["TODO", "FIXME", "XXX", "NOTE", "HACK", "SAFETY"];

struct Lexer<'s> {
    language: Language,
    src: &'s str,
    pos: usize,
    tokens: Vec<Token>,
    paren_depth: usize,
    /// The previous keyword introduces a type name.
    pending_definer: bool,
    at_line_start: bool,
}

impl<'s> Lexer<'s> {
    fn new(language: Language, src: &'s str) -> Self {
        Self {
            language,
            src,
            pos: 0,
            tokens: Vec::new(),
            paren_depth: 0,
            pending_definer: false,
            at_line_start: true,
        }
    }

    fn rest(&self) -> &'s str {
        let src = self.src;
        &src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consume while `pred` holds and return the consumed text.
    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'s str {
        let start = self.pos;
        let len = self
            .rest()
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map_or(self.rest().len(), |(i, _)| i);
        self.pos += len;
        let src = self.src;
        &src[start..self.pos]
    }

    fn take(&mut self, len: usize) -> &'s str {
        let start = self.pos;
        self.pos = (self.pos + len).min(self.src.len());
        let src = self.src;
        &src[start..self.pos]
    }

    /// Emit a token, turning embedded newlines into line breaks.
    fn emit(&mut self, class: TokenClass, text: &str) {
        let mut pieces = text.split('\n').peekable();
        while let Some(piece) = pieces.next() {
            if !piece.is_empty() {
                match self.tokens.last_mut() {
                    // Merge plain runs to keep the node count down.
                    Some(last) if class == TokenClass::Plain && last.class == TokenClass::Plain => {
                        last.text.push_str(piece)
                    }
                    _ => self.tokens.push(Token::new(class, piece)),
                }
            }
            if pieces.peek().is_some() {
                self.tokens.push(Token::new(TokenClass::LineBreak, "\n"));
            }
        }
    }

    fn run(&mut self) {
        while let Some(c) = self.peek() {
            let line_start = self.at_line_start;
            self.at_line_start = false;

            if c == '\n' {
                self.take(1);
                self.emit(TokenClass::LineBreak, "\n");
                self.at_line_start = true;
            } else if c == '\r' {
                self.take(1);
            } else if c.is_whitespace() {
                let ws = self.take_while(|c| c.is_whitespace() && c != '\n' && c != '\r');
                self.emit(TokenClass::Plain, ws);
                self.at_line_start = line_start;
            } else if self.language == Language::Plain {
                let text = self.take_while(|c| c != '\n');
                self.emit(TokenClass::Plain, text);
            } else if self.language.line_comment().is_some_and(|m| self.rest().starts_with(m)) {
                let comment = self.take_while(|c| c != '\n');
                self.comment(comment);
            } else if self.language.has_block_comments() && self.rest().starts_with("/*") {
                let len = self.rest()[2..].find("*/").map_or(self.rest().len(), |i| i + 4);
                let comment = self.take(len);
                self.comment(comment);
            } else if self.language.has_preprocessor() && c == '#' && (line_start || self.language == Language::Rust) {
                let line = self.take_while(|c| c != '\n');
                self.emit(TokenClass::Preprocessor, line);
            } else if self.language.string_quotes().contains(&c) {
                let literal = self.string(c);
                self.emit(TokenClass::String, literal);
            } else if c == '\'' && self.language == Language::Rust {
                self.rust_quote();
            } else if c.is_ascii_digit() {
                let number = self.take_while(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
                self.emit(TokenClass::Numeric, number);
            } else if c.is_alphabetic() || c == '_' {
                let word = self.take_while(|c| c.is_alphanumeric() || c == '_');
                self.identifier(word);
            } else if OPERATOR_CHARS.contains(c) {
                let op = self.take_while(|c| OPERATOR_CHARS.contains(c));
                self.emit(TokenClass::Operator, op);
            } else {
                match c {
                    '(' => self.paren_depth += 1,
                    ')' => self.paren_depth = self.paren_depth.saturating_sub(1),
                    _ => {}
                }
                let punct = self.take(c.len_utf8());
                self.emit(TokenClass::Plain, punct);
            }
        }
    }

    /// A quoted literal, honoring backslash escapes. Unterminated literals run to the end.
    fn string(&mut self, quote: char) -> &'s str {
        let start = self.pos;
        self.take(quote.len_utf8());
        let mut escaped = false;
        while let Some(c) = self.peek() {
            self.take(c.len_utf8());
            if escaped {
                escaped = false;
            } else if c == '\\' && quote != '`' {
                escaped = true;
            } else if c == quote {
                break;
            } else if c == '\n' && quote != '`' && quote != '"' {
                break;
            }
        }
        let src = self.src;
        &src[start..self.pos]
    }

    /// Rust char literal (`'a'`, `'\n'`) or lifetime (`'a`).
    fn rust_quote(&mut self) {
        let rest = self.rest();
        let mut chars = rest.char_indices().skip(1);
        let is_char = match chars.next() {
            Some((_, '\\')) => true,
            Some((_, _)) => matches!(chars.next(), Some((_, '\''))),
            None => false,
        };
        if is_char {
            let literal = self.string('\'');
            self.emit(TokenClass::String, literal);
        } else {
            let tick = self.take(1);
            let name = self.take_while(|c| c.is_alphanumeric() || c == '_');
            let lifetime = format!("{}{}", tick, name);
            self.emit(TokenClass::Type, &lifetime);
        }
    }

    fn identifier(&mut self, word: &str) {
        let language = self.language;
        let class = if self.pending_definer {
            self.pending_definer = false;
            TokenClass::TypeDef
        } else if language.keywords().contains(&word) {
            self.pending_definer = language.type_definers().contains(&word);
            TokenClass::Keyword
        } else if language.typed_parameters() && self.paren_depth > 0 && self.followed_by_colon() {
            TokenClass::Parameter
        } else if language != Language::Json && word.chars().next().is_some_and(char::is_uppercase) {
            TokenClass::Type
        } else {
            TokenClass::Plain
        };
        self.emit(class, word);
    }

    /// Next non-blank character is a single `:` (not a `::` path separator).
    fn followed_by_colon(&self) -> bool {
        let rest = self.rest().trim_start_matches([' ', '\t']);
        rest.starts_with(':') && !rest.starts_with("::")
    }

    /// Split a comment into plain comment text, tagged keywords, URLs and `code`.
    fn comment(&mut self, text: &str) {
        let mut plain_start = 0;
        let mut i = 0;
        while i < text.len() {
            let rest = &text[i..];
            let special = if rest.starts_with("http://") || rest.starts_with("https://") {
                let len = rest.find(char::is_whitespace).unwrap_or(rest.len());
                Some((TokenClass::CommentUrl, len))
            } else if rest.starts_with('`') {
                rest[1..]
                    .find('`')
                    .map(|end| (TokenClass::CommentCodeblock, end + 2))
            } else {
                let boundary = i == 0 || !text[..i].ends_with(|c: char| c.is_alphanumeric());
                COMMENT_KEYWORDS
                    .iter()
                    .find(|k| {
                        boundary
                            && rest.starts_with(*k)
                            && !rest[k.len()..].starts_with(|c: char| c.is_alphanumeric())
                    })
                    .map(|k| (TokenClass::CommentKeyword, k.len()))
            };
            match special {
                Some((class, len)) => {
                    if plain_start < i {
                        self.emit(TokenClass::Comment, &text[plain_start..i]);
                    }
                    self.emit(class, &text[i..i + len]);
                    i += len;
                    plain_start = i;
                }
                None => i += rest.chars().next().map_or(1, char::len_utf8),
            }
        }
        if plain_start < text.len() {
            self.emit(TokenClass::Comment, &text[plain_start..]);
        }
    }

    fn into_lines(self) -> Vec<Vec<Token>> {
        let mut lines = vec![Vec::new()];
        for token in self.tokens {
            if token.class == TokenClass::LineBreak {
                lines.push(Vec::new());
            } else if let Some(line) = lines.last_mut() {
                line.push(token);
            }
        }
        lines
    }
}
