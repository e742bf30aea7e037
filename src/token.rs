use std::fmt;

use crate::ast::Binop;

/// Which family of rules is active at a given point in the source.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Mode {
    /// Prose: block and inline markup, plus expressions.
    #[default]
    Markup,

    /// Inside macro arguments and groupings: expressions and operators.
    Macro,
}

/// Node of the token tree produced by the lexer.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: Tok,

    pub start: usize,

    pub end: usize,

    /// Exact source text covered by this token, delimiters included.
    pub text: String,

    /// Text between the delimiters, for tokens that have children.
    pub inner_text: Option<String>,

    pub children: Vec<Token>,

    pub name: Option<String>,

    pub value: Option<f64>,

    pub operator: Option<Binop>,

    pub negate: bool,

    pub passage: Option<String>,

    pub depth: usize,

    pub align: Option<String>,

    pub colour: Option<String>,

    pub tag_position: Option<TagPosition>,

    pub method_call: bool,

    pub message: Option<String>,

    /// Provisional opener waiting to be folded by a matching closer.
    pub front: bool,

    /// Mode that applies to this token's contents.
    pub inner_mode: Mode,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TagPosition {
    Prepended,
    Appended,
}

#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub enum Tok {
    Root,
    Text,
    Error,
    Whitespace,

    // Block markup
    Br,
    Hr,
    Bulleted,
    Numbered,
    Heading,
    Align,

    // Inline markup
    EmFront,
    EmBack,
    Em,
    StrongFront,
    StrongBack,
    Strong,
    BoldOpener,
    Bold,
    ItalicOpener,
    Italic,
    DelOpener,
    Del,
    SupOpener,
    Sup,
    CommentFront,
    CommentBack,
    Comment,
    ScriptStyleTag,
    Tag,
    Url,
    TwineLink,
    HookPrependedFront,
    HookAnonymousFront,
    HookAppendedFront,
    HookBack,
    HookAppendedBack,
    Hook,
    VerbatimOpener,
    Verbatim,
    CollapsedFront,
    CollapsedBack,
    Collapsed,
    EscapedLine,

    // Expressions
    MacroFront,
    MacroName,
    Macro,
    GroupingFront,
    GroupingBack,
    Grouping,
    HookRef,
    Variable,
    TempVariable,
    Property,
    PossessiveOperator,
    ItsProperty,
    ItsOperator,
    BelongingItProperty,
    BelongingItOperator,
    BelongingProperty,
    BelongingOperator,
    String,
    CssTime,
    Colour,
    Number,
    Boolean,
    Identifier,
    Addition,
    Subtraction,
    Multiplication,
    Division,
    Inequality,
    AugmentedAssign,
    Is,
    IsNot,
    IsIn,
    Contains,
    And,
    Or,
    Not,
    To,
    Into,
    Where,
    Via,
    With,
    Making,
    Comma,
    Spread,
}

impl Tok {
    /// For closers, the openers they accept and the type they fold into.
    pub fn matches(self) -> &'static [(Tok, Tok)] {
        use Tok::*;

        match self {
            GroupingBack => &[(GroupingFront, Grouping), (MacroFront, Macro)],
            HookBack => &[(HookPrependedFront, Hook), (HookAnonymousFront, Hook)],
            HookAppendedBack => &[(HookAppendedFront, Hook)],
            EmBack => &[(EmFront, Em)],
            StrongBack => &[(StrongFront, Strong)],
            BoldOpener => &[(BoldOpener, Bold)],
            ItalicOpener => &[(ItalicOpener, Italic)],
            DelOpener => &[(DelOpener, Del)],
            SupOpener => &[(SupOpener, Sup)],
            CommentBack => &[(CommentFront, Comment)],
            CollapsedBack => &[(CollapsedFront, Collapsed)],
            VerbatimOpener => &[(VerbatimOpener, Verbatim)],
            _ => &[],
        }
    }

    pub fn is_back(self) -> bool {
        !self.matches().is_empty()
    }

    /// Whether a token of this type can end an operand, which is what makes
    /// a following `+` or `-` binary rather than a sign.
    pub fn ends_operand(self) -> bool {
        use Tok::*;

        matches!(self,
            Variable | TempVariable | HookRef | String | Number | Boolean | Identifier
            | Colour | CssTime | Macro | Grouping | Property | ItsProperty
            | BelongingItProperty | TwineLink | Text
        )
    }

    /// The comparison operators, which can supply the implicit `it`.
    pub fn is_comparison(self) -> bool {
        matches!(self, Tok::Is | Tok::IsNot | Tok::Contains | Tok::IsIn | Tok::Inequality)
    }
}

impl Token {
    pub fn new(kind: Tok, start: usize, text: impl Into<String>) -> Self {
        let text = text.into();

        Token {
            kind,
            start,
            end: start + text.len(),
            text,
            inner_text: None,
            children: Vec::new(),
            name: None,
            value: None,
            operator: None,
            negate: false,
            passage: None,
            depth: 0,
            align: None,
            colour: None,
            tag_position: None,
            method_call: false,
            message: None,
            front: false,
            inner_mode: Mode::Markup,
        }
    }

    pub fn is_whitespace(&self) -> bool {
        match self.kind {
            Tok::Whitespace | Tok::Br => true,
            Tok::Text => self.text.trim().is_empty(),
            _ => false,
        }
    }

    pub fn last_child(&self) -> Option<&Token> {
        self.children.last()
    }

    /// Deepest token containing the source offset.
    pub fn token_at(&self, offset: usize) -> Option<&Token> {
        self.path_at(offset).last().copied()
    }

    /// Every token containing the source offset, outermost first, excluding
    /// `self`.
    pub fn path_at(&self, offset: usize) -> Vec<&Token> {
        let mut path = Vec::new();
        let mut here = self;

        while let Some(child) = here.children.iter().find(|c| c.start <= offset && offset < c.end) {
            path.push(child);
            here = child;
        }

        path
    }

    /// Opener and closer text around `inner_text`.
    pub fn delimiters(&self) -> (&str, &str) {
        let Some(inner) = self.inner_text.as_deref() else {
            return (&self.text, "");
        };

        match self.text.find(inner) {
            Some(at) => (&self.text[..at], &self.text[at + inner.len()..]),
            None => (&self.text, ""),
        }
    }

    fn dump(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        write!(f, "{:indent$}{}({}→{}) {:?}", "", self.kind, self.start, self.end, self.text, indent = depth * 2)?;

        if let Some(name) = &self.name {
            write!(f, " name={name:?}")?;
        }

        if let Some(value) = self.value {
            write!(f, " value={value}")?;
        }

        writeln!(f)?;

        for child in self.children.iter() {
            child.dump(f, depth + 1)?;
        }

        Ok(())
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dump(f, 0)
    }
}

impl fmt::Display for Tok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Tok::*;

        write!(f, "{}", match self {
            Root => "root",
            Text => "text",
            Error => "error",
            Whitespace => "whitespace",
            Br => "br",
            Hr => "hr",
            Bulleted => "bulleted",
            Numbered => "numbered",
            Heading => "heading",
            Align => "align",
            EmFront => "emFront",
            EmBack => "emBack",
            Em => "em",
            StrongFront => "strongFront",
            StrongBack => "strongBack",
            Strong => "strong",
            BoldOpener => "boldOpener",
            Bold => "bold",
            ItalicOpener => "italicOpener",
            Italic => "italic",
            DelOpener => "delOpener",
            Del => "del",
            SupOpener => "supOpener",
            Sup => "sup",
            CommentFront => "commentFront",
            CommentBack => "commentBack",
            Comment => "comment",
            ScriptStyleTag => "scriptStyleTag",
            Tag => "tag",
            Url => "url",
            TwineLink => "twineLink",
            HookPrependedFront => "hookPrependedFront",
            HookAnonymousFront => "hookAnonymousFront",
            HookAppendedFront => "hookAppendedFront",
            HookBack => "hookBack",
            HookAppendedBack => "hookAppendedBack",
            Hook => "hook",
            VerbatimOpener => "verbatimOpener",
            Verbatim => "verbatim",
            CollapsedFront => "collapsedFront",
            CollapsedBack => "collapsedBack",
            Collapsed => "collapsed",
            EscapedLine => "escapedLine",
            MacroFront => "macroFront",
            MacroName => "macroName",
            Macro => "macro",
            GroupingFront => "groupingFront",
            GroupingBack => "groupingBack",
            Grouping => "grouping",
            HookRef => "hookRef",
            Variable => "variable",
            TempVariable => "tempVariable",
            Property => "property",
            PossessiveOperator => "possessiveOperator",
            ItsProperty => "itsProperty",
            ItsOperator => "itsOperator",
            BelongingItProperty => "belongingItProperty",
            BelongingItOperator => "belongingItOperator",
            BelongingProperty => "belongingProperty",
            BelongingOperator => "belongingOperator",
            String => "string",
            CssTime => "cssTime",
            Colour => "colour",
            Number => "number",
            Boolean => "boolean",
            Identifier => "identifier",
            Addition => "addition",
            Subtraction => "subtraction",
            Multiplication => "multiplication",
            Division => "division",
            Inequality => "inequality",
            AugmentedAssign => "augmentedAssign",
            Is => "is",
            IsNot => "isNot",
            IsIn => "isIn",
            Contains => "contains",
            And => "and",
            Or => "or",
            Not => "not",
            To => "to",
            Into => "into",
            Where => "where",
            Via => "via",
            With => "with",
            Making => "making",
            Comma => "comma",
            Spread => "spread",
        })
    }
}

#[test]
fn token_queries() {
    let root = crate::lexer::lex("a (print: $b)");

    let Some(variable) = root.token_at(11) else {
        panic!("nothing at offset 11");
    };
    assert_eq!(variable.kind, Tok::Variable);

    let path: Vec<Tok> = root.path_at(11).iter().map(|t| t.kind).collect();
    assert_eq!(path, vec![Tok::Macro, Tok::Variable]);

    let mac = &root.children[1];
    assert_eq!(mac.delimiters(), ("(", ")"));
    assert_eq!(mac.last_child().map(|t| t.kind), Some(Tok::Variable));
}
