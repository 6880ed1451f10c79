mod loose_eq;
mod token;

use loose_eq::*;
use token::*;

use proc_macro::TokenStream;

/// Derives a companion `Terminal` enum (payload-free) plus the glue needed
/// by the parser combinators to match a terminal against a concrete `Token`
/// regardless of its payload: `Terminal: PartialEq<Token>` (and the
/// reverse), `Terminal::to_token(position)`, and a `GetPosition` impl for
/// the token enum itself.
///
/// Variants are opted into `Terminal` via `#[terminal]`; variants without
/// the attribute (identifiers, literals) are left out of `Terminal` since
/// they are matched structurally by dedicated parsing functions instead.
#[proc_macro_derive(Token, attributes(terminal))]
pub fn derive_token(input: TokenStream) -> TokenStream {
    let ast = syn::parse(input).unwrap();

    impl_token_macro(ast)
}

/// Derives `PartialEq`/`Eq` that only compares enum discriminants, ignoring
/// any fields. Useful for token-kind comparisons where position/value differ
/// but the shape should be considered equal.
#[proc_macro_derive(LooseEq)]
pub fn derive_loose_eq(input: TokenStream) -> TokenStream {
    let ast = syn::parse(input).unwrap();

    impl_loose_eq_macro(ast)
}
