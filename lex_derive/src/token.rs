use proc_macro::TokenStream;
use quote::quote;
use syn::{punctuated::Punctuated, token::Comma, DataEnum, DeriveInput, Expr, ExprLit, Lit, Variant};

pub fn impl_token_macro(ast: syn::DeriveInput) -> TokenStream {
    let DeriveInput { ident, data, .. } = ast;

    let syn::Data::Enum(DataEnum { variants, .. }) = data else {
        panic!("#[derive(Token)] only supports enums")
    };

    let terminal_variants_tuples = variants
        .clone()
        .into_iter()
        .filter_map(|variant| {
            let Variant {
                attrs,
                ident,
                discriminant,
                ..
            } = variant;

            for attr in &attrs {
                let Some(attr_ident) = attr.path().get_ident() else {
                    continue;
                };

                if *attr_ident != "terminal" {
                    continue;
                }

                // The literal is kept only as documentation of what the
                // terminal spells as source text; matching itself happens in
                // the lexer's keyword/operator tables, not here.
                let literal = match attr.parse_args::<Expr>() {
                    Ok(Expr::Lit(ExprLit {
                        lit: Lit::Str(literal),
                        ..
                    })) => Some(literal),
                    _ => None,
                };

                return Some((
                    Variant {
                        attrs: vec![],
                        ident,
                        fields: syn::Fields::Unit,
                        discriminant,
                    },
                    literal,
                ));
            }

            None
        })
        .collect::<Vec<_>>();

    let matches_terminal_enum = terminal_variants_tuples.iter().map(|(variant, _)| {
        let Variant {
            ident: var_ident, ..
        } = variant;
        quote! {
            (Terminal::#var_ident, #ident::#var_ident { .. }) => true,
        }
    });

    let matches_enum_terminal = terminal_variants_tuples.iter().map(|(variant, _)| {
        let Variant {
            ident: var_ident, ..
        } = variant;
        quote! {
            (#ident::#var_ident { .. }, Terminal::#var_ident) => true,
        }
    });

    let matches_to_token = terminal_variants_tuples.iter().map(|(variant, _)| {
        let Variant {
            ident: var_ident, ..
        } = variant;
        quote! {
            Terminal::#var_ident => #ident::#var_ident { position },
        }
    });

    let matches_get_position = variants.iter().map(|variant| {
        let Variant {
            ident: var_ident, ..
        } = variant;
        quote! {
            #ident::#var_ident { position, .. } => position.clone(),
        }
    });

    let terminal_variants = terminal_variants_tuples
        .iter()
        .map(|(variant, _)| variant.clone())
        .collect::<Punctuated<Variant, Comma>>();

    let gen = quote! {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum Terminal {
            #terminal_variants
        }

        impl PartialEq<#ident> for Terminal {
            fn eq(&self, rhs: &#ident) -> bool {
                match (self, rhs) {
                    #(#matches_terminal_enum)*
                    _ => false,
                }
            }
        }

        impl PartialEq<Terminal> for #ident {
            fn eq(&self, rhs: &Terminal) -> bool {
                match (self, rhs) {
                    #(#matches_enum_terminal)*
                    _ => false,
                }
            }
        }

        impl Terminal {
            /// Reconstruct a zero-payload token from this terminal kind at `position`.
            pub fn to_token(&self, position: Position) -> #ident {
                match self {
                    #(#matches_to_token)*
                }
            }
        }

        /// Every token variant carries a `Span`; this trait exposes it uniformly
        /// so the parser combinators can report positions without matching on
        /// every concrete variant themselves.
        pub trait GetPosition {
            fn position(&self) -> Position;
        }

        impl GetPosition for #ident {
            fn position(&self) -> Position {
                match self {
                    #(#matches_get_position)*
                }
            }
        }
    };

    gen.into()
}
