//! Markup lexer. Turns source text into a tree of `Token`s.
//!
//! Rules are tried in a fixed priority order at every position; the first
//! one whose predecessor constraints and pattern both succeed wins, and any
//! run of input that no rule claims becomes a text token. Openers ("front"
//! tokens) wait on a stack until a closer that accepts them comes along, at
//! which point the closer swallows everything in between. Openers that are
//! never closed, and closers with nothing to close, turn back into text, so
//! lexing never fails.

use log::debug;

use crate::ast::Binop;
use crate::patterns::{self as p, Capture, Pattern};
use crate::token::{Mode, TagPosition, Tok, Token};
use crate::value::Colour;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Scope {
    Block,
    Inline,

    /// Legal in both modes.
    Expression,

    /// Only legal inside macro arguments.
    MacroOnly,
}

struct Rule {
    kind: Tok,

    scope: Scope,

    /// Characters the match can start with. Empty means any.
    peek: &'static str,

    pattern: Pattern,

    can_follow: Option<&'static [Option<Tok>]>,

    cannot_follow: &'static [Option<Tok>],

    /// Refuse to match right after a word character.
    word_start: bool,

    front: bool,

    /// Closers that share their text with an opener only match when they
    /// have something to close.
    needs_front: bool,

    /// Capture group holding text to lex into the token's children.
    inner: Option<usize>,

    build: fn(&mut Token, &Capture),
}

const BLOCK_START: &[Option<Tok>] = &[
    None,
    Some(Tok::Br),
    Some(Tok::Hr),
    Some(Tok::Bulleted),
    Some(Tok::Numbered),
    Some(Tok::Heading),
    Some(Tok::Align),
];

const AFTER_TEXT: &[Option<Tok>] = &[Some(Tok::Text)];

const HOOKABLE: &[Option<Tok>] = &[Some(Tok::Macro), Some(Tok::Variable), Some(Tok::TempVariable)];

const HAS_PROPERTIES: &[Option<Tok>] = &[
    Some(Tok::Variable),
    Some(Tok::TempVariable),
    Some(Tok::HookRef),
    Some(Tok::Property),
    Some(Tok::ItsProperty),
    Some(Tok::BelongingItProperty),
    Some(Tok::Macro),
    Some(Tok::Grouping),
    Some(Tok::String),
];

const fn rule(kind: Tok, scope: Scope, peek: &'static str, pattern: Pattern) -> Rule {
    Rule {
        kind,
        scope,
        peek,
        pattern,
        can_follow: None,
        cannot_follow: &[],
        word_start: false,
        front: false,
        needs_front: false,
        inner: None,
        build: |_, _| (),
    }
}

impl Rule {
    const fn front(mut self) -> Self {
        self.front = true;
        self
    }

    const fn needs_front(mut self) -> Self {
        self.needs_front = true;
        self
    }

    const fn can_follow(mut self, kinds: &'static [Option<Tok>]) -> Self {
        self.can_follow = Some(kinds);
        self
    }

    const fn cannot_follow(mut self, kinds: &'static [Option<Tok>]) -> Self {
        self.cannot_follow = kinds;
        self
    }

    /// Keywords can't continue a run of text.
    const fn keyword(mut self) -> Self {
        self.cannot_follow = AFTER_TEXT;
        self.word_start = true;
        self
    }

    const fn word_start(mut self) -> Self {
        self.word_start = true;
        self
    }

    const fn inner(mut self, group: usize) -> Self {
        self.inner = Some(group);
        self
    }

    const fn build(mut self, build: fn(&mut Token, &Capture)) -> Self {
        self.build = build;
        self
    }

    fn active_in(&self, mode: Mode) -> bool {
        match (mode, self.scope) {
            (_, Scope::Expression) => true,
            (Mode::Markup, Scope::Block | Scope::Inline) => true,
            (Mode::Macro, Scope::MacroOnly) => true,
            _ => false,
        }
    }

    fn inner_mode(&self) -> Mode {
        match self.scope {
            Scope::Block | Scope::Inline => Mode::Markup,
            Scope::Expression | Scope::MacroOnly => Mode::Macro,
        }
    }
}

fn group(cap: &Capture, n: usize) -> Option<String> {
    cap.groups[n].map(String::from)
}

fn named(token: &mut Token, cap: &Capture) {
    token.name = group(cap, 0);
}

fn operator(token: &mut Token, cap: &Capture) {
    token.operator = match cap.groups[0] {
        Some("+") => Some(Binop::Add),
        Some("-") => Some(Binop::Sub),
        Some("*") => Some(Binop::Mul),
        Some("/") => Some(Binop::Div),
        Some("%") => Some(Binop::Mod),
        Some("<") => Some(Binop::Lt),
        Some("<=") => Some(Binop::Lte),
        Some(">") => Some(Binop::Gt),
        Some(">=") => Some(Binop::Gte),
        _ => None,
    };
}

fn negatable(token: &mut Token, cap: &Capture) {
    token.negate = cap.groups[1].is_some();
}

fn depth(token: &mut Token, cap: &Capture) {
    token.depth = cap.groups[0].map_or(0, |marks| marks.chars().count());
}

fn alignment(token: &mut Token, cap: &Capture) {
    let arrow = cap.groups[0].unwrap_or_default();

    token.align = Some(if arrow.starts_with('<') && arrow.ends_with('>') {
        "justify".into()
    } else if let Some(at) = arrow.find("><") {
        let ratio = ((at + 1) as f64 / arrow.len() as f64 * 100.0).round();
        if ratio == 50.0 {
            "center".into()
        } else {
            format!("{ratio}%")
        }
    } else if arrow.starts_with('<') {
        "left".into()
    } else {
        "right".into()
    });
}

fn link(token: &mut Token, cap: &Capture) {
    token.passage = group(cap, 1).or_else(|| group(cap, 0));
}

fn number(token: &mut Token, cap: &Capture) {
    token.value = Some(if cap.text.eq_ignore_ascii_case("nan") {
        f64::NAN
    } else {
        cap.text.parse().unwrap_or(f64::NAN)
    });
}

fn css_time(token: &mut Token, cap: &Capture) {
    let amount: f64 = cap.groups[0].and_then(|n| n.parse().ok()).unwrap_or(f64::NAN);
    let unit = cap.groups[1].unwrap_or_default();

    token.value = Some(if unit.eq_ignore_ascii_case("ms") {
        amount
    } else {
        amount * 1000.0
    });
}

fn colour(token: &mut Token, cap: &Capture) {
    let name = cap.groups[0].unwrap_or_default();
    token.colour = Some(Colour::named_hex(name).unwrap_or(name).to_string());
}

fn identifier(token: &mut Token, cap: &Capture) {
    token.name = Some(cap.text.to_ascii_lowercase());
}

fn macro_name(token: &mut Token, cap: &Capture) {
    token.name = group(cap, 0);
    token.method_call = cap.groups[1].is_some();
}

static RULES: &[Rule] = &[
    // Block rules
    rule(Tok::Hr, Scope::Block, "", p::hr)
        .can_follow(BLOCK_START).cannot_follow(AFTER_TEXT),
    rule(Tok::Bulleted, Scope::Block, "", p::bulleted)
        .can_follow(BLOCK_START).cannot_follow(AFTER_TEXT).inner(1).build(depth),
    rule(Tok::Numbered, Scope::Block, "", p::numbered)
        .can_follow(BLOCK_START).cannot_follow(AFTER_TEXT).inner(1)
        .build(|t, c| t.depth = c.groups[0].map_or(0, |m| m.len() / 2)),
    rule(Tok::Heading, Scope::Block, "", p::heading)
        .can_follow(BLOCK_START).cannot_follow(AFTER_TEXT).inner(1).build(depth),
    rule(Tok::Align, Scope::Block, "", p::align)
        .can_follow(BLOCK_START).cannot_follow(AFTER_TEXT).build(alignment),

    // Inline rules
    rule(Tok::Error, Scope::Inline, "<", p::twine1_macro)
        .build(|t, _| t.message = Some("Twine 1 macro syntax isn't supported.".into())),
    rule(Tok::Br, Scope::Inline, "\n", p::br),
    rule(Tok::EmBack, Scope::Inline, "*", p::em).needs_front(),
    rule(Tok::StrongBack, Scope::Inline, "*", p::strong).needs_front(),
    rule(Tok::StrongFront, Scope::Inline, "*", p::strong).front(),
    rule(Tok::EmFront, Scope::Inline, "*", p::em).front(),
    rule(Tok::BoldOpener, Scope::Inline, "'", p::bold_opener).front(),
    rule(Tok::ItalicOpener, Scope::Inline, "/", p::italic_opener).front(),
    rule(Tok::DelOpener, Scope::Inline, "~", p::del_opener).front(),
    rule(Tok::SupOpener, Scope::Inline, "^", p::sup_opener).front(),
    rule(Tok::CommentFront, Scope::Inline, "<", p::comment_front).front(),
    rule(Tok::CommentBack, Scope::Inline, "-", p::comment_back),
    rule(Tok::ScriptStyleTag, Scope::Inline, "<", p::script_style_tag),
    rule(Tok::Tag, Scope::Inline, "<", p::tag).build(named),
    rule(Tok::Url, Scope::Inline, "hHmMjJfFdD", p::url),
    rule(Tok::TwineLink, Scope::Inline, "[", p::passage_link).inner(0).build(link),
    rule(Tok::TwineLink, Scope::Inline, "[", p::simple_link).inner(0).build(link),
    rule(Tok::TwineLink, Scope::Inline, "[", p::legacy_link).inner(0).build(link),
    rule(Tok::HookPrependedFront, Scope::Inline, "|", p::hook_prepended_front).front()
        .build(|t, c| {
            t.name = group(c, 0);
            t.tag_position = Some(TagPosition::Prepended);
        }),
    rule(Tok::HookAnonymousFront, Scope::Inline, "[", p::hook_front).front()
        .can_follow(HOOKABLE),
    rule(Tok::HookAppendedFront, Scope::Inline, "[", p::hook_front).front()
        .cannot_follow(HOOKABLE),
    rule(Tok::HookBack, Scope::Inline, "]", p::hook_back),
    rule(Tok::HookAppendedBack, Scope::Inline, "]", p::hook_appended_back)
        .build(|t, c| {
            t.name = group(c, 0);
            t.tag_position = Some(TagPosition::Appended);
        }),
    rule(Tok::VerbatimOpener, Scope::Inline, "`", p::verbatim_opener).front().build(depth),
    rule(Tok::CollapsedFront, Scope::Inline, "{", p::collapsed_front).front(),
    rule(Tok::CollapsedBack, Scope::Inline, "}", p::collapsed_back),
    rule(Tok::EscapedLine, Scope::Inline, "\\\n", p::escaped_line),

    // Expression rules
    rule(Tok::MacroName, Scope::MacroOnly, "", p::macro_name_token)
        .can_follow(&[Some(Tok::MacroFront)]).inner(1).build(macro_name),
    rule(Tok::MacroFront, Scope::Expression, "(", p::macro_front).front().build(named),
    rule(Tok::GroupingBack, Scope::Expression, ")", p::grouping_back),
    rule(Tok::HookRef, Scope::Expression, "?", p::hook_ref).build(named),
    rule(Tok::Variable, Scope::Expression, "$", p::variable).build(named),
    rule(Tok::TempVariable, Scope::Expression, "_", p::temp_variable).word_start().build(named),

    // Macro-only rules
    rule(Tok::Whitespace, Scope::MacroOnly, "", p::whitespace).cannot_follow(AFTER_TEXT),
    rule(Tok::GroupingFront, Scope::MacroOnly, "(", p::grouping_front).front(),
    rule(Tok::Property, Scope::MacroOnly, "'", p::property)
        .can_follow(HAS_PROPERTIES).build(named),
    rule(Tok::PossessiveOperator, Scope::MacroOnly, "'", p::possessive_operator)
        .can_follow(HAS_PROPERTIES),
    rule(Tok::ItsProperty, Scope::MacroOnly, "iI", p::its_property).keyword().build(named),
    rule(Tok::ItsOperator, Scope::MacroOnly, "iI", p::its_operator).keyword(),
    rule(Tok::BelongingItProperty, Scope::MacroOnly, "", p::belonging_it_property).keyword().build(named),
    rule(Tok::BelongingItOperator, Scope::MacroOnly, "oO", p::belonging_it_operator).keyword(),
    rule(Tok::BelongingProperty, Scope::MacroOnly, "", p::belonging_property).keyword().build(named),
    rule(Tok::BelongingOperator, Scope::MacroOnly, "oO", p::belonging_operator).keyword(),
    rule(Tok::String, Scope::MacroOnly, "\"'", p::string),
    rule(Tok::CssTime, Scope::MacroOnly, ".0123456789", p::css_time).word_start().build(css_time),
    rule(Tok::Colour, Scope::MacroOnly, "", p::colour).keyword().build(colour),
    rule(Tok::Number, Scope::MacroOnly, "0123456789nN", p::number).word_start().build(number),
    rule(Tok::Addition, Scope::MacroOnly, "+", p::addition).build(operator),
    rule(Tok::Subtraction, Scope::MacroOnly, "-", p::subtraction).build(operator),
    rule(Tok::Multiplication, Scope::MacroOnly, "*", p::multiplication).build(operator),
    rule(Tok::Division, Scope::MacroOnly, "/%", p::division).build(operator),
    rule(Tok::Inequality, Scope::MacroOnly, "<>", p::inequality).build(operator),
    rule(Tok::AugmentedAssign, Scope::MacroOnly, "+-*/%", p::augmented_assign).build(operator),
    rule(Tok::Identifier, Scope::MacroOnly, "iItT", p::identifier).keyword().build(identifier),
    rule(Tok::Boolean, Scope::MacroOnly, "tTfF", p::boolean).keyword(),
    rule(Tok::Is, Scope::MacroOnly, "iI", p::is).keyword(),
    rule(Tok::IsIn, Scope::MacroOnly, "iI", p::is_in).keyword().build(negatable),
    rule(Tok::IsNot, Scope::MacroOnly, "iI", p::is_not).keyword(),
    rule(Tok::Contains, Scope::MacroOnly, "cCdD", p::contains).keyword().build(negatable),
    rule(Tok::To, Scope::MacroOnly, "tT=", p::to).cannot_follow(AFTER_TEXT),
    rule(Tok::Into, Scope::MacroOnly, "iI", p::into).keyword(),
    rule(Tok::And, Scope::MacroOnly, "aA", p::and).keyword(),
    rule(Tok::Or, Scope::MacroOnly, "oO", p::or).keyword(),
    rule(Tok::Not, Scope::MacroOnly, "nN", p::not).keyword(),
    rule(Tok::Where, Scope::MacroOnly, "wW", p::where_kw).keyword(),
    rule(Tok::Via, Scope::MacroOnly, "vV", p::via).keyword(),
    rule(Tok::With, Scope::MacroOnly, "wW", p::with).keyword(),
    rule(Tok::Making, Scope::MacroOnly, "mM", p::making).keyword(),
    rule(Tok::Comma, Scope::MacroOnly, ",", p::comma),
    rule(Tok::Spread, Scope::MacroOnly, ".", p::spread),
];

/// Lex prose, starting in markup mode.
pub fn lex(src: &str) -> Token {
    lex_in(src, Mode::Markup)
}

/// Lex a bare expression, as if it were the inside of a macro call.
pub fn lex_expression(src: &str) -> Token {
    lex_in(src, Mode::Macro)
}

fn lex_in(src: &str, mode: Mode) -> Token {
    let mut root = Token::new(Tok::Root, 0, src);
    root.inner_text = Some(src.into());
    root.inner_mode = mode;

    lex_children(&mut root, 0);
    merge_text(&mut root.children);

    root
}

/// Lex `parent.inner_text` into its children. `base` is the source offset of
/// the inner text.
fn lex_children(parent: &mut Token, base: usize) {
    let Some(src) = parent.inner_text.clone() else {
        return;
    };

    let mut children: Vec<Token> = Vec::new();
    let mut fronts: Vec<usize> = Vec::new();
    let mut index = 0;
    let mut text_start = 0;

    while index < src.len() {
        let mode = fronts.last().map_or(parent.inner_mode, |&i| children[i].inner_mode);
        let rest = &src[index..];

        let last = if text_start < index {
            Some(Tok::Text)
        } else {
            children.last().map(|t| t.kind)
        };

        let after_word = src[..index].chars().next_back().is_some_and(p::is_word);

        let found = RULES.iter().find_map(|rule| {
            if !rule.active_in(mode) || (rule.word_start && after_word) {
                return None;
            }

            if !rule.peek.is_empty() && !rest.starts_with(|c: char| rule.peek.contains(c)) {
                return None;
            }

            if rule.can_follow.is_some_and(|kinds| !kinds.contains(&last)) {
                return None;
            }

            if rule.cannot_follow.contains(&last) {
                return None;
            }

            if rule.needs_front {
                let adjacent = if text_start < index { None } else { children.len().checked_sub(1) };
                let open = fronts.iter().any(|&i| {
                    Some(i) != adjacent && rule.kind.matches().iter().any(|&(f, _)| f == children[i].kind)
                });

                if !open {
                    return None;
                }
            }

            let cap = (rule.pattern)(rest)?;
            Some((rule, cap))
        });

        let Some((rule, cap)) = found else {
            index += rest.chars().next().map_or(1, char::len_utf8);
            continue;
        };

        if text_start < index {
            let mut text = Token::new(Tok::Text, base + text_start, &src[text_start..index]);
            text.inner_mode = mode;
            children.push(text);
        }

        let token = build(rule, &cap, base + index);
        index += token.text.len();
        text_start = index;

        children.push(token);
        let back = children.len() - 1;

        if rule.kind.is_back() {
            let opener = fronts.iter().rposition(|&i| fold_target(&children[back], &children[i]).is_some());

            if let Some(pos) = opener {
                let front = fronts[pos];

                for &unclosed in &fronts[pos + 1..] {
                    demote(&mut children[unclosed]);
                }

                fronts.truncate(pos);
                fold(&mut children, front);
                continue;
            }

            if !rule.front {
                demote(&mut children[back]);
            }
        }

        if rule.front {
            fronts.push(back);
        }
    }

    if text_start < src.len() {
        let mode = fronts.last().map_or(parent.inner_mode, |&i| children[i].inner_mode);
        let mut text = Token::new(Tok::Text, base + text_start, &src[text_start..]);
        text.inner_mode = mode;
        children.push(text);
    }

    for unclosed in fronts {
        demote(&mut children[unclosed]);
    }

    parent.children = children;
}

fn build(rule: &Rule, cap: &Capture, start: usize) -> Token {
    let mut token = Token::new(rule.kind, start, cap.text);
    token.front = rule.front;
    token.inner_mode = rule.inner_mode();

    (rule.build)(&mut token, cap);

    if let Some(inner) = rule.inner.and_then(|n| cap.groups[n]) {
        // Groups are always slices of the matched text.
        let offset = inner.as_ptr() as usize - cap.text.as_ptr() as usize;
        token.inner_text = Some(inner.into());
        lex_children(&mut token, start + offset);
    }

    token
}

/// Type that `back` would fold `front` into, if any.
fn fold_target(back: &Token, front: &Token) -> Option<Tok> {
    if !front.front {
        return None;
    }

    if back.kind == Tok::VerbatimOpener && back.depth != front.depth {
        return None;
    }

    back.kind.matches().iter().find(|&&(f, _)| f == front.kind).map(|&(_, folded)| folded)
}

/// Fold the last token (a closer) with the opener at `front`, absorbing
/// everything between them.
fn fold(children: &mut Vec<Token>, front: usize) {
    let Some(mut back) = children.pop() else {
        return;
    };

    let inner: Vec<Token> = children.drain(front + 1..).collect();

    let Some(opener) = children.pop() else {
        return;
    };

    let Some(kind) = fold_target(&back, &opener) else {
        return;
    };

    let inner_text: String = inner.iter().map(|t| t.text.as_str()).collect();

    back.kind = kind;
    back.text = format!("{}{}{}", opener.text, inner_text, back.text);
    back.start = opener.start;
    back.inner_text = Some(inner_text);
    back.children = inner;
    back.front = false;
    back.inner_mode = opener.inner_mode;

    back.name = back.name.or(opener.name);
    back.passage = back.passage.or(opener.passage);
    back.tag_position = back.tag_position.or(opener.tag_position);
    back.value = back.value.or(opener.value);
    back.message = back.message.or(opener.message);
    back.depth = back.depth.max(opener.depth);

    children.push(back);
}

fn demote(token: &mut Token) {
    debug!("Unmatched {} at offset {}, treating it as text", token.kind, token.start);

    token.front = false;

    if token.kind == Tok::HookAnonymousFront {
        token.kind = Tok::Error;
        token.message = Some("This hook doesn't have a matching ].".into());
    } else {
        token.kind = Tok::Text;
    }
}

/// Join adjacent leaf text tokens, throughout the tree.
fn merge_text(tokens: &mut Vec<Token>) {
    let mut merged: Vec<Token> = Vec::with_capacity(tokens.len());

    for mut token in tokens.drain(..) {
        merge_text(&mut token.children);

        if let Some(prev) = merged.last_mut() {
            let leaves = prev.children.is_empty() && token.children.is_empty();

            if leaves && prev.kind == Tok::Text && token.kind == Tok::Text {
                prev.text.push_str(&token.text);
                prev.end = token.end;
                continue;
            }
        }

        merged.push(token);
    }

    *tokens = merged;
}

#[cfg(test)]
mod test {
    use super::*;

    use pretty_assertions::assert_eq;

    fn kinds(tokens: &[Token]) -> Vec<Tok> {
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn folds_macro_call() {
        let root = lex("(print: 1 + 2)");

        assert_eq!(kinds(&root.children), vec![Tok::Macro]);

        let mac = &root.children[0];
        assert_eq!(mac.text, "(print: 1 + 2)");
        assert_eq!(mac.name.as_deref(), Some("print"));
        assert_eq!((mac.start, mac.end), (0, 14));
        assert_eq!(kinds(&mac.children), vec![
            Tok::MacroName,
            Tok::Whitespace,
            Tok::Number,
            Tok::Whitespace,
            Tok::Addition,
            Tok::Whitespace,
            Tok::Number,
        ]);
        assert_eq!(mac.children[4].operator, Some(Binop::Add));
    }

    #[test]
    fn operators_only_in_macro_mode() {
        let root = lex("1 + 2 is 3");
        assert_eq!(kinds(&root.children), vec![Tok::Text]);
        assert_eq!(root.children[0].text, "1 + 2 is 3");
    }

    #[test]
    fn nested_grouping() {
        let root = lex("(print: (1 + 2) * 3)");
        let mac = &root.children[0];
        assert_eq!(kinds(&mac.children), vec![
            Tok::MacroName,
            Tok::Whitespace,
            Tok::Grouping,
            Tok::Whitespace,
            Tok::Multiplication,
            Tok::Whitespace,
            Tok::Number,
        ]);
        assert_eq!(mac.children[2].text, "(1 + 2)");
    }

    #[test]
    fn unbalanced_delimiters_demote() {
        let root = lex("[[A");
        assert_eq!(kinds(&root.children), vec![Tok::Text]);
        assert_eq!(root.children[0].text, "[[A");

        let root = lex("a ] b");
        assert_eq!(kinds(&root.children), vec![Tok::Text]);
    }

    #[test]
    fn fold_matching_is_type_scoped() {
        let root = lex("(if: true)[ ) ]");
        assert_eq!(kinds(&root.children), vec![Tok::Macro, Tok::Hook]);
        assert_eq!(kinds(&root.children[1].children), vec![Tok::Text]);
        assert_eq!(root.children[1].children[0].text, " ) ");

        let root = lex("[x)");
        assert_eq!(kinds(&root.children), vec![Tok::Text]);
    }

    #[test]
    fn unclosed_macro_demotes_opener() {
        let root = lex_expression("(a: (b: 1)");
        assert_eq!(root.children[0].kind, Tok::Text);
        assert!(root.children.iter().any(|t| t.kind == Tok::Macro && t.text == "(b: 1)"));
    }

    #[test]
    fn hooks_and_nametags() {
        let root = lex("|name>[in] [out]<tag|");
        assert_eq!(kinds(&root.children), vec![Tok::Hook, Tok::Text, Tok::Hook]);
        assert_eq!(root.children[0].name.as_deref(), Some("name"));
        assert_eq!(root.children[0].tag_position, Some(TagPosition::Prepended));
        assert_eq!(root.children[2].name.as_deref(), Some("tag"));
        assert_eq!(root.children[2].tag_position, Some(TagPosition::Appended));
    }

    #[test]
    fn plain_brackets_without_a_tag_stay_text() {
        let root = lex("see [this]");
        assert_eq!(kinds(&root.children), vec![Tok::Text]);
    }

    #[test]
    fn links() {
        let root = lex("go [[north->Hall]] now");
        assert_eq!(kinds(&root.children), vec![Tok::Text, Tok::TwineLink, Tok::Text]);

        let link = &root.children[1];
        assert_eq!(link.passage.as_deref(), Some("Hall"));
        assert_eq!(link.inner_text.as_deref(), Some("north"));
        assert_eq!(link.children[0].start, 5);

        let root = lex("[[Hall]]");
        assert_eq!(root.children[0].passage.as_deref(), Some("Hall"));
    }

    #[test]
    fn emphasis() {
        let root = lex("*a* **b** ''c'' //d// ~~e~~ ^^f^^");
        let styled: Vec<Tok> = kinds(&root.children).into_iter().filter(|&k| k != Tok::Text).collect();
        assert_eq!(styled, vec![Tok::Em, Tok::Strong, Tok::Bold, Tok::Italic, Tok::Del, Tok::Sup]);

        let root = lex("2 * 3");
        assert_eq!(kinds(&root.children), vec![Tok::Text]);
    }

    #[test]
    fn verbatim_needs_matching_length() {
        let root = lex("``a`b``");
        assert_eq!(kinds(&root.children), vec![Tok::Verbatim]);
        assert_eq!(root.children[0].inner_text.as_deref(), Some("a`b"));
    }

    #[test]
    fn block_rules_only_at_line_start() {
        let root = lex("* one\n* two\nthree * four");
        assert_eq!(kinds(&root.children)[..2].to_vec(), vec![Tok::Bulleted, Tok::Bulleted]);
        assert_eq!(root.children[1].children[0].text, "two");
        assert_eq!(root.children[1].children[0].start, 8);

        let root = lex("# Title\n==>\n");
        assert_eq!(kinds(&root.children), vec![Tok::Heading, Tok::Align]);
        assert_eq!(root.children[0].depth, 1);
        assert_eq!(root.children[1].align.as_deref(), Some("right"));
    }

    #[test]
    fn comments_and_collapsed() {
        let root = lex("<!-- hi -->{ a }");
        assert_eq!(kinds(&root.children), vec![Tok::Comment, Tok::Collapsed]);
    }

    #[test]
    fn expression_literals() {
        let root = lex_expression("\"a(b\" 2s 250ms #fff red 1.5 true it");
        let kinds: Vec<Tok> = kinds(&root.children).into_iter().filter(|&k| k != Tok::Whitespace).collect();
        assert_eq!(kinds, vec![
            Tok::String,
            Tok::CssTime,
            Tok::CssTime,
            Tok::Colour,
            Tok::Colour,
            Tok::Number,
            Tok::Boolean,
            Tok::Identifier,
        ]);

        let values: Vec<Option<f64>> = root.children.iter().map(|t| t.value).filter(Option::is_some).collect();
        assert_eq!(values, vec![Some(2000.0), Some(250.0), Some(1.5)]);
        assert_eq!(root.children[8].colour.as_deref(), Some("#e61919"));
    }

    #[test]
    fn property_access() {
        let root = lex_expression("$a's b's c");
        assert_eq!(kinds(&root.children), vec![Tok::Variable, Tok::Property, Tok::Property]);
        assert_eq!(root.children[2].name.as_deref(), Some("c"));

        let root = lex_expression("length of $a");
        assert_eq!(kinds(&root.children), vec![Tok::BelongingProperty, Tok::Whitespace, Tok::Variable]);

        let root = lex_expression("its 1st");
        assert_eq!(kinds(&root.children), vec![Tok::ItsProperty]);
    }

    #[test]
    fn keywords_need_word_boundaries() {
        let root = lex_expression("$a is not in $b");
        let kinds: Vec<Tok> = kinds(&root.children).into_iter().filter(|&k| k != Tok::Whitespace).collect();
        assert_eq!(kinds, vec![Tok::Variable, Tok::IsIn, Tok::Variable]);
        assert!(root.children[2].negate);

        let root = lex_expression("$a is this");
        assert_eq!(root.children.last().map(|t| t.kind), Some(Tok::Text));
    }

    #[test]
    fn lambda_keywords() {
        let root = lex_expression("_x where _x > 2 via _x * 2");
        let kinds: Vec<Tok> = kinds(&root.children).into_iter().filter(|&k| k != Tok::Whitespace).collect();
        assert_eq!(kinds, vec![
            Tok::TempVariable,
            Tok::Where,
            Tok::TempVariable,
            Tok::Inequality,
            Tok::Number,
            Tok::Via,
            Tok::TempVariable,
            Tok::Multiplication,
            Tok::Number,
        ]);
    }

    #[test]
    fn method_call_name_is_relexed() {
        let root = lex("($obj: 1)");
        let name = &root.children[0].children[0];
        assert_eq!(name.kind, Tok::MacroName);
        assert!(name.method_call);
        assert_eq!(kinds(&name.children), vec![Tok::Variable]);
        assert_eq!(name.children[0].start, 1);
    }

    #[test]
    fn anonymous_hook_without_close_is_an_error() {
        let root = lex("(if: true)[oops");
        assert_eq!(root.children[1].kind, Tok::Error);
    }

    /// Every token's children cover its inner text exactly.
    fn check_covers(token: &Token) {
        if let Some(inner) = &token.inner_text {
            let joined: String = token.children.iter().map(|t| t.text.as_str()).collect();
            assert_eq!(&joined, inner);
            assert!(token.text.contains(inner.as_str()));
        }

        let mut at = token.children.first().map_or(0, |t| t.start);
        for child in token.children.iter() {
            assert_eq!(child.start, at);
            assert_eq!(child.end, child.start + child.text.len());
            at = child.end;
            check_covers(child);
        }
    }

    #[test]
    fn children_cover_source() {
        for src in [
            "(set: $a to (a: 1, 2))[hook] ''bold'' [[x->y]]",
            "* item (print: $b's 1st)\n==>\n",
            "(if: $x is 3 and < 5)[ok]<n| ]",
        ] {
            let root = lex(src);
            assert_eq!(root.inner_text.as_deref(), Some(src));
            check_covers(&root);
        }
    }

    mod prop {
        use super::*;

        use proptest::prelude::*;

        proptest! {
            #[test]
            fn round_trip(src in "[a-c1 $_'\"()\\[\\]*|<>=,.+\\-?\n`{}]{0,48}") {
                let root = lex(&src);
                let joined: String = root.children.iter().map(|t| t.text.as_str()).collect();
                prop_assert_eq!(joined, src.clone());
                check_covers(&root);

                let root = lex_expression(&src);
                let joined: String = root.children.iter().map(|t| t.text.as_str()).collect();
                prop_assert_eq!(joined, src);
            }
        }
    }
}
