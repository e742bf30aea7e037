//! Text-matching fragments used by the lexer's rule table. Each pattern is
//! anchored at the start of its input and reports how much it consumed plus
//! up to three captured groups.

/// Successful pattern match.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Capture<'s> {
    pub text: &'s str,

    pub groups: [Option<&'s str>; 3],
}

pub(crate) type Pattern = for<'s> fn(&'s str) -> Option<Capture<'s>>;

struct Scan<'s> {
    src: &'s str,
    pos: usize,
}

impl<'s> Scan<'s> {
    fn new(src: &'s str) -> Self {
        Scan { src, pos: 0 }
    }

    fn rest(&self) -> &'s str {
        &self.src[self.pos..]
    }

    fn since(&self, start: usize) -> &'s str {
        &self.src[start..self.pos]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.rest().chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn bump_while(&mut self, f: impl Fn(char) -> bool) -> &'s str {
        let start = self.pos;

        while let Some(c) = self.peek() {
            if !f(c) {
                break;
            }
            self.pos += c.len_utf8();
        }

        self.since(start)
    }

    fn bump_if(&mut self, f: impl Fn(char) -> bool) -> bool {
        match self.peek() {
            Some(c) if f(c) => {
                self.pos += c.len_utf8();
                true
            },

            _ => false,
        }
    }

    fn bump_char(&mut self, ch: char) -> bool {
        self.bump_if(|c| c == ch)
    }

    /// Consumes `lit`, ignoring ASCII case.
    fn bump_str(&mut self, lit: &str) -> bool {
        if self.looking_at(lit) {
            self.pos += lit.len();
            true
        } else {
            false
        }
    }

    fn looking_at(&self, lit: &str) -> bool {
        self.rest().get(..lit.len()).is_some_and(|s| s.eq_ignore_ascii_case(lit))
    }

    /// Consumes a keyword, which must end at a word boundary.
    fn bump_word(&mut self, word: &str) -> bool {
        let start = self.pos;

        if self.bump_str(word) && self.at_boundary() {
            return true;
        }

        self.pos = start;
        false
    }

    fn at_boundary(&self) -> bool {
        !self.peek().is_some_and(is_word)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn ws(&mut self) -> &'s str {
        self.bump_while(is_ws)
    }

    fn mws(&mut self) -> bool {
        !self.ws().is_empty()
    }

    /// End of line: consumes a line break if present.
    fn eol(&mut self) -> bool {
        self.bump_char('\n') || self.at_end()
    }

    fn capture(&self, groups: [Option<&'s str>; 3]) -> Option<Capture<'s>> {
        if self.pos == 0 {
            return None;
        }

        Some(Capture {
            text: self.since(0),
            groups,
        })
    }

    fn matched(&self) -> Option<Capture<'s>> {
        self.capture([None; 3])
    }
}

pub(crate) fn is_ws(c: char) -> bool {
    matches!(c,
        ' ' | '\t' | '\x0b' | '\x0c' | '\u{a0}' | '\u{2000}'..='\u{200a}'
        | '\u{2028}' | '\u{2029}' | '\u{202f}' | '\u{205f}' | '\u{3000}'
    )
}

pub(crate) fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_letter(c: char) -> bool {
    is_word(c) || c == '-'
}

/// Run of word characters containing at least one non-digit.
fn property_name<'s>(scan: &mut Scan<'s>) -> Option<&'s str> {
    let start = scan.pos;
    let name = scan.bump_while(is_word);

    if name.chars().all(|c| c.is_ascii_digit()) {
        scan.pos = start;
        return None;
    }

    Some(name)
}

/// Rest of a line, honouring escaped line breaks.
fn line_text<'s>(scan: &mut Scan<'s>) -> &'s str {
    let start = scan.pos;

    loop {
        if scan.bump_str("\\\n") {
            scan.bump_char('\\');
        } else if scan.bump_str("\n\\") {
            continue;
        } else if matches!(scan.peek(), None | Some('\n')) {
            break;
        } else {
            scan.bump();
        }
    }

    scan.since(start)
}

fn literal(src: &str, lit: &str) -> Option<usize> {
    let mut scan = Scan::new(src);
    scan.bump_str(lit).then_some(scan.pos)
}

fn exact<'s>(src: &'s str, lit: &str) -> Option<Capture<'s>> {
    let len = literal(src, lit)?;
    Some(Capture { text: &src[..len], groups: [None; 3] })
}

fn word<'s>(src: &'s str, kw: &str) -> Option<Capture<'s>> {
    let mut scan = Scan::new(src);
    scan.bump_word(kw).then(|| scan.matched())?
}

// Block markup

pub(crate) fn hr(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    scan.ws();
    if scan.bump_while(|c| c == '-').len() < 3 {
        return None;
    }
    scan.ws();
    scan.eol().then(|| scan.matched())?
}

pub(crate) fn bulleted(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    scan.ws();
    let stars = scan.bump_while(|c| c == '*');
    if stars.is_empty() || !scan.mws() {
        return None;
    }
    let text = line_text(&mut scan);
    if text.is_empty() || !scan.eol() {
        return None;
    }
    scan.capture([Some(stars), Some(text), None])
}

pub(crate) fn numbered(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    scan.ws();
    let start = scan.pos;
    while scan.bump_str("0.") {}
    let marks = scan.since(start);
    if marks.is_empty() || !scan.mws() {
        return None;
    }
    let text = line_text(&mut scan);
    if text.is_empty() || !scan.eol() {
        return None;
    }
    scan.capture([Some(marks), Some(text), None])
}

pub(crate) fn heading(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    scan.ws();
    let start = scan.pos;
    while scan.pos - start < 6 && scan.bump_char('#') {}
    let hashes = scan.since(start);
    if hashes.is_empty() {
        return None;
    }
    scan.ws();
    let text = line_text(&mut scan);
    if text.is_empty() || !scan.eol() {
        return None;
    }
    scan.capture([Some(hashes), Some(text), None])
}

pub(crate) fn align(src: &str) -> Option<Capture> {
    let arrows: [fn(&mut Scan) -> bool; 4] = [
        // ==>
        |s| s.bump_while(|c| c == '=').len() >= 2 && s.bump_char('>'),
        // <==
        |s| s.bump_char('<') && !s.bump_while(|c| c == '=').is_empty(),
        // =><=
        |s| !s.bump_while(|c| c == '=').is_empty() && s.bump_str("><") && !s.bump_while(|c| c == '=').is_empty(),
        // <==>
        |s| s.bump_char('<') && s.bump_while(|c| c == '=').len() >= 2 && s.bump_char('>'),
    ];

    for arrow in arrows {
        let mut scan = Scan::new(src);
        scan.ws();
        let start = scan.pos;
        if !arrow(&mut scan) {
            continue;
        }
        let arrow = scan.since(start);
        scan.ws();
        if scan.eol() {
            return scan.capture([Some(arrow), None, None]);
        }
    }

    None
}

// Inline markup

pub(crate) fn br(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    (scan.bump_char('\n') && scan.peek() != Some('\\')).then(|| scan.matched())?
}

pub(crate) fn twine1_macro(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    if !scan.bump_str("<<") || scan.bump_while(|c| c != '>' && !c.is_whitespace()).is_empty() {
        return None;
    }

    loop {
        if scan.bump_str(">>") {
            return scan.matched();
        }

        match scan.bump()? {
            '\\' => {
                scan.bump()?;
            },

            quote @ ('\'' | '"') => {
                loop {
                    match scan.bump()? {
                        '\\' => {
                            scan.bump()?;
                        },
                        c if c == quote => break,
                        _ => continue,
                    }
                }
            },

            _ => continue,
        }
    }
}

pub(crate) fn em(src: &str) -> Option<Capture> {
    exact(src, "*")
}

pub(crate) fn strong(src: &str) -> Option<Capture> {
    exact(src, "**")
}

pub(crate) fn bold_opener(src: &str) -> Option<Capture> {
    exact(src, "''")
}

pub(crate) fn italic_opener(src: &str) -> Option<Capture> {
    exact(src, "//")
}

pub(crate) fn del_opener(src: &str) -> Option<Capture> {
    exact(src, "~~")
}

pub(crate) fn sup_opener(src: &str) -> Option<Capture> {
    exact(src, "^^")
}

pub(crate) fn comment_front(src: &str) -> Option<Capture> {
    exact(src, "<!--")
}

pub(crate) fn comment_back(src: &str) -> Option<Capture> {
    exact(src, "-->")
}

pub(crate) fn script_style_tag(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    if !scan.bump_char('<') {
        return None;
    }
    let name = scan.bump_while(|c| c.is_ascii_alphabetic());
    if !(name.eq_ignore_ascii_case("script") || name.eq_ignore_ascii_case("style")) {
        return None;
    }
    scan.bump_while(|c| c != '>');
    if !scan.bump_char('>') {
        return None;
    }

    let close = format!("</{name}>");
    loop {
        if scan.bump_str(&close) {
            return scan.matched();
        }
        scan.bump()?;
    }
}

pub(crate) fn tag(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    if !scan.bump_char('<') {
        return None;
    }
    scan.bump_char('/');
    if !scan.bump_if(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let start = scan.pos - 1;
    scan.bump_while(|c| is_word(c) || c == '-');
    let name = scan.since(start);

    loop {
        match scan.bump()? {
            '>' => return scan.capture([Some(name), None, None]),
            '<' | '\n' => return None,
            quote @ ('\'' | '"') => {
                scan.bump_while(|c| c != quote);
                scan.bump()?;
            },
            _ => continue,
        }
    }
}

pub(crate) fn url(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    let scheme = ["https", "http", "mailto", "javascript", "ftp", "data"]
        .iter()
        .any(|s| scan.bump_str(s));
    if !scheme || !scan.bump_str("://") {
        return None;
    }
    let body = scan.bump_while(|c| !c.is_whitespace() && c != '<');
    let trimmed = body.trim_end_matches(|c| ".,:;\"')]".contains(c));
    if trimmed.is_empty() {
        return None;
    }
    let len = scan.pos - body.len() + trimmed.len();
    Some(Capture { text: &src[..len], groups: [None; 3] })
}

/// `[[text->passage]]`, `[[passage<-text]]` or `[[text|passage]]`.
/// Captures the link text, then the passage name.
pub(crate) fn passage_link(src: &str) -> Option<Capture> {
    let body = src.strip_prefix("[[")?;
    if body.starts_with('[') {
        return None;
    }
    let close = body.find(']')?;
    if !body[close..].starts_with("]]") {
        return None;
    }
    let inner = &body[..close];
    let text = &src[..close + 4];

    let arrow = inner.rfind("->").map(|at| (at, 2));
    let pipe = inner.rfind('|').map(|at| (at, 1));

    if let Some((at, len)) = arrow.into_iter().chain(pipe).max_by_key(|&(at, _)| at) {
        return Some(Capture {
            text,
            groups: [Some(&inner[..at]), Some(&inner[at + len..]), None],
        });
    }

    let at = inner.find("<-")?;
    Some(Capture {
        text,
        groups: [Some(&inner[at + 2..]), Some(&inner[..at]), None],
    })
}

fn legacy_text<'s>(scan: &mut Scan<'s>) -> &'s str {
    let start = scan.pos;

    loop {
        match scan.peek() {
            Some('|') | None => break,
            Some(']') if scan.peek_second() == Some(']') => break,
            _ => {
                scan.bump();
            },
        }
    }

    scan.since(start)
}

pub(crate) fn simple_link(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    if !scan.bump_str("[[") {
        return None;
    }
    let text = legacy_text(&mut scan);
    if text.is_empty() || !scan.bump_str("]]") {
        return None;
    }
    scan.capture([Some(text), None, None])
}

pub(crate) fn legacy_link(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    if !scan.bump_str("[[") {
        return None;
    }
    let text = legacy_text(&mut scan);
    if text.is_empty() || !scan.bump_char('|') {
        return None;
    }
    let passage = legacy_text(&mut scan);
    if passage.is_empty() || !scan.bump_str("]]") {
        return None;
    }
    scan.capture([Some(text), Some(passage), None])
}

pub(crate) fn hook_prepended_front(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    if !scan.bump_char('|') {
        return None;
    }
    let name = scan.bump_while(is_letter);
    scan.bump_str(">[").then(|| scan.capture([Some(name), None, None]))?
}

pub(crate) fn hook_front(src: &str) -> Option<Capture> {
    exact(src, "[")
}

fn nametag<'s>(scan: &mut Scan<'s>) -> Option<&'s str> {
    let start = scan.pos;

    if scan.bump_char('<') {
        let name = scan.bump_while(is_letter);
        if scan.bump_char('|') {
            return Some(name);
        }
    }

    scan.pos = start;
    None
}

pub(crate) fn hook_back(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    if !scan.bump_char(']') || nametag(&mut scan).is_some() {
        return None;
    }
    scan.matched()
}

pub(crate) fn hook_appended_back(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    if !scan.bump_char(']') {
        return None;
    }
    let name = nametag(&mut scan)?;
    scan.capture([Some(name), None, None])
}

pub(crate) fn verbatim_opener(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    let ticks = scan.bump_while(|c| c == '`');
    scan.capture([Some(ticks), None, None])
}

pub(crate) fn collapsed_front(src: &str) -> Option<Capture> {
    exact(src, "{")
}

pub(crate) fn collapsed_back(src: &str) -> Option<Capture> {
    exact(src, "}")
}

pub(crate) fn escaped_line(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    if scan.bump_str("\\\n") {
        scan.bump_char('\\');
        return scan.matched();
    }
    scan.bump_str("\n\\").then(|| scan.matched())?
}

// Expressions

/// `name:` or `$variable:`. Returns the name and, for method calls, the
/// variable text.
fn macro_name<'s>(scan: &mut Scan<'s>) -> Option<(&'s str, Option<&'s str>)> {
    let start = scan.pos;

    let method = if scan.bump_char('$') {
        property_name(scan)?;
        true
    } else {
        if !scan.bump_if(|c| is_letter(c) || c == '/') {
            return None;
        }
        scan.bump_while(is_letter);
        false
    };

    let name = scan.since(start);

    if !scan.bump_char(':') {
        scan.pos = start;
        return None;
    }

    Some((name, method.then_some(name)))
}

pub(crate) fn macro_front(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    if !scan.bump_char('(') {
        return None;
    }
    let mut ahead = Scan { src, pos: scan.pos };
    let (name, _) = macro_name(&mut ahead)?;
    scan.capture([Some(name), None, None])
}

pub(crate) fn macro_name_token(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    let (name, method) = macro_name(&mut scan)?;
    scan.capture([Some(name), method, None])
}

pub(crate) fn grouping_front(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    if !scan.bump_char('(') {
        return None;
    }
    let mut ahead = Scan { src, pos: scan.pos };
    if macro_name(&mut ahead).is_some() {
        return None;
    }
    scan.matched()
}

pub(crate) fn grouping_back(src: &str) -> Option<Capture> {
    exact(src, ")")
}

pub(crate) fn hook_ref(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    if !scan.bump_char('?') {
        return None;
    }
    let name = scan.bump_while(is_letter);
    if name.is_empty() {
        return None;
    }
    scan.capture([Some(name), None, None])
}

pub(crate) fn variable(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    if !scan.bump_char('$') {
        return None;
    }
    let name = property_name(&mut scan)?;
    scan.capture([Some(name), None, None])
}

pub(crate) fn temp_variable(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    if !scan.bump_char('_') {
        return None;
    }
    let name = property_name(&mut scan)?;
    scan.capture([Some(name), None, None])
}

pub(crate) fn whitespace(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    scan.ws();
    scan.matched()
}

pub(crate) fn property(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    if !scan.bump_str("'s") || !scan.mws() {
        return None;
    }
    let name = property_name(&mut scan)?;
    scan.capture([Some(name), None, None])
}

pub(crate) fn possessive_operator(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    (scan.bump_str("'s") && scan.mws()).then(|| scan.matched())?
}

pub(crate) fn its_property(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    if !scan.bump_str("its") || !scan.mws() {
        return None;
    }
    let name = property_name(&mut scan)?;
    scan.capture([Some(name), None, None])
}

pub(crate) fn its_operator(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    (scan.bump_str("its") && scan.mws()).then(|| scan.matched())?
}

pub(crate) fn belonging_it_property(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    let name = property_name(&mut scan)?;
    let ok = scan.mws() && scan.bump_word("of") && scan.mws() && scan.bump_word("it");
    ok.then(|| scan.capture([Some(name), None, None]))?
}

pub(crate) fn belonging_it_operator(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    let ok = scan.bump_word("of") && scan.mws() && scan.bump_word("it");
    ok.then(|| scan.matched())?
}

pub(crate) fn belonging_property(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    let name = property_name(&mut scan)?;
    let ok = scan.mws() && scan.bump_word("of");
    ok.then(|| scan.capture([Some(name), None, None]))?
}

pub(crate) fn belonging_operator(src: &str) -> Option<Capture> {
    word(src, "of")
}

/// Quoted string with backslash escapes. Captures the raw contents.
pub(crate) fn string(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    let quote = scan.bump().filter(|&c| c == '"' || c == '\'')?;
    let start = scan.pos;

    loop {
        match scan.bump()? {
            '\\' => {
                scan.bump()?;
            },
            c if c == quote => break,
            _ => continue,
        }
    }

    let contents = &src[start..scan.pos - 1];
    scan.capture([Some(contents), None, None])
}

fn decimal<'s>(scan: &mut Scan<'s>) -> &'s str {
    let start = scan.pos;
    scan.bump_while(|c| c.is_ascii_digit());

    let before_dot = scan.pos;
    if scan.bump_char('.') && scan.bump_while(|c| c.is_ascii_digit()).is_empty() && before_dot == start {
        scan.pos = start;
    }

    scan.since(start)
}

pub(crate) fn css_time(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    let number = decimal(&mut scan);
    if number.is_empty() {
        return None;
    }
    let start = scan.pos;
    scan.bump_if(|c| c == 'm' || c == 'M');
    if !scan.bump_str("s") || !scan.at_boundary() {
        return None;
    }
    let unit = scan.since(start);
    scan.capture([Some(number), Some(unit), None])
}

pub(crate) fn colour(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);

    if scan.bump_char('#') {
        let digits = scan.bump_while(|c| c.is_ascii_hexdigit());
        let len = match digits.len() {
            n if n >= 6 => 6,
            n if n >= 3 => 3,
            _ => return None,
        };
        let text = &src[..len + 1];
        return Some(Capture { text, groups: [Some(text), None, None] });
    }

    let name = scan.bump_while(is_word);
    crate::value::Colour::named_hex(name)?;
    scan.capture([Some(name), None, None])
}

pub(crate) fn number(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);

    if scan.bump_word("NaN") {
        return scan.matched();
    }

    if scan.bump_while(|c| c.is_ascii_digit()).is_empty() {
        return None;
    }

    let mark = scan.pos;
    if scan.bump_char('.') && scan.bump_while(|c| c.is_ascii_digit()).is_empty() {
        scan.pos = mark;
    }

    let mark = scan.pos;
    if scan.bump_if(|c| c == 'e' || c == 'E') {
        scan.bump_if(|c| c == '+' || c == '-');
        if scan.bump_while(|c| c.is_ascii_digit()).is_empty() {
            scan.pos = mark;
        }
    }

    if !scan.at_boundary() {
        return None;
    }

    scan.matched()
}

fn operator<'s>(src: &'s str, ops: &str) -> Option<Capture<'s>> {
    let mut scan = Scan::new(src);
    let op = scan.bump().filter(|c| ops.contains(*c))?;
    if scan.peek() == Some('=') {
        return None;
    }
    let text = scan.since(0);
    Some(Capture { text, groups: [Some(&text[..op.len_utf8()]), None, None] })
}

pub(crate) fn addition(src: &str) -> Option<Capture> {
    operator(src, "+")
}

pub(crate) fn subtraction(src: &str) -> Option<Capture> {
    operator(src, "-")
}

pub(crate) fn multiplication(src: &str) -> Option<Capture> {
    operator(src, "*")
}

pub(crate) fn division(src: &str) -> Option<Capture> {
    operator(src, "/%")
}

pub(crate) fn inequality(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    if !scan.bump_if(|c| c == '<' || c == '>') {
        return None;
    }
    scan.bump_char('=');
    let op = scan.since(0);
    scan.capture([Some(op), None, None])
}

pub(crate) fn augmented_assign(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    let op = scan.bump().filter(|c| "+-*/%".contains(*c))?;
    if !scan.bump_char('=') {
        return None;
    }
    let text = scan.since(0);
    Some(Capture { text, groups: [Some(&text[..op.len_utf8()]), None, None] })
}

pub(crate) fn identifier(src: &str) -> Option<Capture> {
    word(src, "it").or_else(|| word(src, "time"))
}

pub(crate) fn boolean(src: &str) -> Option<Capture> {
    word(src, "true").or_else(|| word(src, "false"))
}

/// Whether the text after `is` continues as `is not` or `is in`.
fn followed_by_word(scan: &Scan, words: &[&str]) -> bool {
    let mut ahead = Scan { src: scan.src, pos: scan.pos };
    ahead.mws() && words.iter().any(|w| ahead.bump_word(w))
}

pub(crate) fn is(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    if !scan.bump_word("is") || followed_by_word(&scan, &["not", "in"]) {
        return None;
    }
    scan.matched()
}

pub(crate) fn is_not(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    let ok = scan.bump_word("is") && scan.mws() && scan.bump_word("not");
    ok.then(|| scan.matched())?
}

/// `is in` or `is not in`. The second group is set when negated.
pub(crate) fn is_in(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    if !scan.bump_word("is") || !scan.mws() {
        return None;
    }

    let start = scan.pos;
    let negated = scan.bump_word("not") && scan.mws();
    if !negated {
        scan.pos = start;
    }

    if !scan.bump_word("in") {
        return None;
    }
    scan.capture([None, negated.then_some("not"), None])
}

/// `contains` or `does not contain`. The second group is set when negated.
pub(crate) fn contains(src: &str) -> Option<Capture> {
    let mut scan = Scan::new(src);
    if scan.bump_word("contains") {
        return scan.matched();
    }

    let ok = scan.bump_word("does") && scan.mws() && scan.bump_word("not") && scan.mws() && scan.bump_word("contain");
    ok.then(|| scan.capture([None, Some("not"), None]))?
}

pub(crate) fn to(src: &str) -> Option<Capture> {
    word(src, "to").or_else(|| exact(src, "="))
}

pub(crate) fn into(src: &str) -> Option<Capture> {
    word(src, "into")
}

pub(crate) fn and(src: &str) -> Option<Capture> {
    word(src, "and")
}

pub(crate) fn or(src: &str) -> Option<Capture> {
    word(src, "or")
}

pub(crate) fn not(src: &str) -> Option<Capture> {
    word(src, "not")
}

pub(crate) fn where_kw(src: &str) -> Option<Capture> {
    word(src, "where")
}

pub(crate) fn via(src: &str) -> Option<Capture> {
    word(src, "via")
}

pub(crate) fn with(src: &str) -> Option<Capture> {
    word(src, "with")
}

pub(crate) fn making(src: &str) -> Option<Capture> {
    word(src, "making")
}

pub(crate) fn comma(src: &str) -> Option<Capture> {
    exact(src, ",")
}

pub(crate) fn spread(src: &str) -> Option<Capture> {
    let cap = exact(src, "...")?;
    (!src[3..].starts_with('.')).then_some(cap)
}

#[cfg(test)]
mod test {
    use super::*;

    fn text(p: Pattern, src: &str) -> Option<&str> {
        p(src).map(|c| c.text)
    }

    fn group(p: Pattern, src: &str, n: usize) -> Option<&str> {
        p(src).and_then(|c| c.groups[n])
    }

    #[test]
    fn block_patterns() {
        assert_eq!(text(hr, "---\nnext"), Some("---\n"));
        assert_eq!(text(hr, "--"), None);
        assert_eq!(group(bulleted, "** item\n", 0), Some("**"));
        assert_eq!(group(bulleted, "** item\n", 1), Some("item"));
        assert_eq!(group(numbered, "0.0. two", 0), Some("0.0."));
        assert_eq!(group(heading, "### Title", 0), Some("###"));
        assert_eq!(group(align, "=><==\n", 0), Some("=><=="));
        assert_eq!(group(align, "<==>", 0), Some("<==>"));
        assert_eq!(group(align, "<==", 0), Some("<=="));
        assert_eq!(text(align, "==> x"), None);
    }

    #[test]
    fn link_patterns() {
        assert_eq!(group(passage_link, "[[go->there]]", 0), Some("go"));
        assert_eq!(group(passage_link, "[[go->there]]", 1), Some("there"));
        assert_eq!(group(passage_link, "[[a->b->c]]", 1), Some("c"));
        assert_eq!(group(passage_link, "[[there<-go]]", 0), Some("go"));
        assert_eq!(group(passage_link, "[[go|there]]", 1), Some("there"));
        assert_eq!(text(passage_link, "[[plain]]"), None);
        assert_eq!(group(simple_link, "[[plain]]", 0), Some("plain"));
        assert_eq!(text(simple_link, "[[A"), None);
    }

    #[test]
    fn hook_patterns() {
        assert_eq!(group(hook_prepended_front, "|name>[x]", 0), Some("name"));
        assert_eq!(text(hook_back, "]<name|"), None);
        assert_eq!(text(hook_back, "] rest"), Some("]"));
        assert_eq!(group(hook_appended_back, "]<name|", 0), Some("name"));
        assert_eq!(text(url, "http://example.com/a."), Some("http://example.com/a"));
    }

    #[test]
    fn expression_patterns() {
        assert_eq!(group(macro_front, "(print: 1)", 0), Some("print"));
        assert_eq!(text(macro_front, "(1 + 2)"), None);
        assert_eq!(text(grouping_front, "(1 + 2)"), Some("("));
        assert_eq!(group(macro_name_token, "$obj: 2", 1), Some("$obj"));
        assert_eq!(group(variable, "$foo's bar", 0), Some("foo"));
        assert_eq!(text(variable, "$12"), None);
        assert_eq!(group(property, "'s bar", 0), Some("bar"));
        assert_eq!(group(belonging_it_property, "length of it", 0), Some("length"));
        assert_eq!(group(belonging_property, "length of $a", 0), Some("length"));
        assert_eq!(group(string, r#""a\"b" rest"#, 0), Some(r#"a\"b"#));
        assert_eq!(text(string, "'open"), None);
        assert_eq!(group(css_time, "250ms", 0), Some("250"));
        assert_eq!(group(css_time, "2s", 1), Some("s"));
        assert_eq!(text(number, "2s"), None);
        assert_eq!(text(number, "1.5e3 "), Some("1.5e3"));
        assert_eq!(text(number, "2px"), None);
        assert_eq!(text(colour, "#abcdef0"), Some("#abcdef"));
        assert_eq!(text(colour, "redistribute"), None);
        assert_eq!(text(addition, "+="), None);
        assert_eq!(group(augmented_assign, "*= 2", 0), Some("*"));
        assert_eq!(text(is, "is not 2"), None);
        assert_eq!(text(is, "is inventory"), Some("is"));
        assert_eq!(text(is_not, "is not 2"), Some("is not"));
        assert_eq!(group(is_in, "is not in $a", 1), Some("not"));
        assert_eq!(group(contains, "does not contain 2", 1), Some("not"));
        assert_eq!(text(identifier, "its"), None);
        assert_eq!(text(spread, "...."), None);
    }
}
