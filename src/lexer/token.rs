use lex_derive::{LooseEq, Token as TokenDerive};

use crate::span::Span;

/// Alias used by the `#[derive(Token)]` expansion (`lex_derive::token`) for
/// the position type every variant carries — kept as a distinct name there
/// since the macro is generic over whatever position type a token enum uses.
type Position = Span;

/// Every lexical token, keywords and punctuation annotated with `#[terminal]`
/// so `lex_derive` can generate the companion `Terminal` enum the parser
/// combinators match against. Literal/identifier/error variants are left
/// unannotated — they carry payload and are matched structurally by
/// dedicated parsing functions instead (mirrors the teacher's `Token`/
/// `Terminal` split in `crates/why_lib/src/lexer/token.rs`).
#[derive(Clone, TokenDerive, LooseEq)]
pub enum Token {
    // literals & identifiers — structurally matched, no #[terminal]
    Id { value: String, position: Span },
    Integer { value: u64, position: Span },
    Float { value: f64, position: Span },
    Str { value: String, position: Span },
    Char { value: char, position: Span },
    /// Carries an already-diagnosed lexical error; the parser treats it like
    /// any other unexpected token but does not re-report it.
    Error { message: String, position: Span },
    Eof { position: Span },

    // keywords
    #[terminal("package")]
    Package { position: Span },
    #[terminal("import")]
    Import { position: Span },
    #[terminal("pub")]
    Pub { position: Span },
    #[terminal("priv")]
    Priv { position: Span },
    #[terminal("fn")]
    Fn { position: Span },
    #[terminal("extern")]
    Extern { position: Span },
    #[terminal("struct")]
    Struct { position: Span },
    #[terminal("enum")]
    Enum { position: Span },
    #[terminal("type")]
    TypeKw { position: Span },
    #[terminal("let")]
    Let { position: Span },
    #[terminal("mut")]
    Mut { position: Span },
    #[terminal("if")]
    If { position: Span },
    #[terminal("else")]
    Else { position: Span },
    #[terminal("match")]
    Match { position: Span },
    #[terminal("return")]
    Return { position: Span },
    #[terminal("spawn")]
    Spawn { position: Span },
    #[terminal("await")]
    Await { position: Span },
    #[terminal("as")]
    As { position: Span },
    #[terminal("unsafe")]
    Unsafe { position: Span },
    #[terminal("true")]
    True { position: Span },
    #[terminal("false")]
    False { position: Span },
    #[terminal("none")]
    NoneKeyword { position: Span },

    // punctuation & operators
    #[terminal("=")]
    Assign { position: Span },
    #[terminal(";")]
    Semicolon { position: Span },
    #[terminal(":")]
    Colon { position: Span },
    #[terminal(",")]
    Comma { position: Span },
    #[terminal(".")]
    Dot { position: Span },
    #[terminal("->")]
    Arrow { position: Span },
    #[terminal("=>")]
    FatArrow { position: Span },
    #[terminal("(")]
    LParen { position: Span },
    #[terminal(")")]
    RParen { position: Span },
    #[terminal("{")]
    LBrace { position: Span },
    #[terminal("}")]
    RBrace { position: Span },
    #[terminal("[")]
    LBracket { position: Span },
    #[terminal("]")]
    RBracket { position: Span },
    #[terminal("#")]
    Hash { position: Span },
    #[terminal("+")]
    Plus { position: Span },
    #[terminal("-")]
    Minus { position: Span },
    #[terminal("*")]
    Star { position: Span },
    #[terminal("/")]
    Slash { position: Span },
    #[terminal("%")]
    Percent { position: Span },
    #[terminal("==")]
    EqEq { position: Span },
    #[terminal("!=")]
    NotEq { position: Span },
    #[terminal("<")]
    Lt { position: Span },
    #[terminal("<=")]
    Le { position: Span },
    #[terminal(">")]
    Gt { position: Span },
    #[terminal(">=")]
    Ge { position: Span },
    #[terminal("<<")]
    Shl { position: Span },
    #[terminal(">>")]
    Shr { position: Span },
    #[terminal("&&")]
    AndAnd { position: Span },
    #[terminal("||")]
    OrOr { position: Span },
    #[terminal("&")]
    Amp { position: Span },
    #[terminal("|")]
    Pipe { position: Span },
    #[terminal("^")]
    Caret { position: Span },
    #[terminal("!")]
    Bang { position: Span },
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        macro_rules! unit {
            ($name:literal) => {
                f.debug_struct($name).finish()
            };
        }
        match self {
            Self::Id { value, .. } => f.debug_struct("Id").field("value", value).finish(),
            Self::Integer { value, .. } => f.debug_struct("Integer").field("value", value).finish(),
            Self::Float { value, .. } => f.debug_struct("Float").field("value", value).finish(),
            Self::Str { value, .. } => f.debug_struct("Str").field("value", value).finish(),
            Self::Char { value, .. } => f.debug_struct("Char").field("value", value).finish(),
            Self::Error { message, .. } => f.debug_struct("Error").field("message", message).finish(),
            Self::Eof { .. } => unit!("Eof"),
            Self::Package { .. } => unit!("Package"),
            Self::Import { .. } => unit!("Import"),
            Self::Pub { .. } => unit!("Pub"),
            Self::Priv { .. } => unit!("Priv"),
            Self::Fn { .. } => unit!("Fn"),
            Self::Extern { .. } => unit!("Extern"),
            Self::Struct { .. } => unit!("Struct"),
            Self::Enum { .. } => unit!("Enum"),
            Self::TypeKw { .. } => unit!("TypeKw"),
            Self::Let { .. } => unit!("Let"),
            Self::Mut { .. } => unit!("Mut"),
            Self::If { .. } => unit!("If"),
            Self::Else { .. } => unit!("Else"),
            Self::Match { .. } => unit!("Match"),
            Self::Return { .. } => unit!("Return"),
            Self::Spawn { .. } => unit!("Spawn"),
            Self::Await { .. } => unit!("Await"),
            Self::As { .. } => unit!("As"),
            Self::Unsafe { .. } => unit!("Unsafe"),
            Self::True { .. } => unit!("True"),
            Self::False { .. } => unit!("False"),
            Self::NoneKeyword { .. } => unit!("NoneKeyword"),
            Self::Assign { .. } => unit!("Assign"),
            Self::Semicolon { .. } => unit!("Semicolon"),
            Self::Colon { .. } => unit!("Colon"),
            Self::Comma { .. } => unit!("Comma"),
            Self::Dot { .. } => unit!("Dot"),
            Self::Arrow { .. } => unit!("Arrow"),
            Self::FatArrow { .. } => unit!("FatArrow"),
            Self::LParen { .. } => unit!("LParen"),
            Self::RParen { .. } => unit!("RParen"),
            Self::LBrace { .. } => unit!("LBrace"),
            Self::RBrace { .. } => unit!("RBrace"),
            Self::LBracket { .. } => unit!("LBracket"),
            Self::RBracket { .. } => unit!("RBracket"),
            Self::Hash { .. } => unit!("Hash"),
            Self::Plus { .. } => unit!("Plus"),
            Self::Minus { .. } => unit!("Minus"),
            Self::Star { .. } => unit!("Star"),
            Self::Slash { .. } => unit!("Slash"),
            Self::Percent { .. } => unit!("Percent"),
            Self::EqEq { .. } => unit!("EqEq"),
            Self::NotEq { .. } => unit!("NotEq"),
            Self::Lt { .. } => unit!("Lt"),
            Self::Le { .. } => unit!("Le"),
            Self::Gt { .. } => unit!("Gt"),
            Self::Ge { .. } => unit!("Ge"),
            Self::Shl { .. } => unit!("Shl"),
            Self::Shr { .. } => unit!("Shr"),
            Self::AndAnd { .. } => unit!("AndAnd"),
            Self::OrOr { .. } => unit!("OrOr"),
            Self::Amp { .. } => unit!("Amp"),
            Self::Pipe { .. } => unit!("Pipe"),
            Self::Caret { .. } => unit!("Caret"),
            Self::Bang { .. } => unit!("Bang"),
        }
    }
}
