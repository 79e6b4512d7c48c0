//! # courier-contract-tests-macros
//!
//! `#[courier_tck]` 属性宏：把 TCK 套件与第三方处理单元的契约检查展开为标准 `#[test]` 函数。
//!
//! ```ignore
//! #[courier_tck]
//! mod all_suites {}
//!
//! #[courier_tck(suites(lifecycle, processor), processor = MyProcessor::new())]
//! mod my_processor {}
//! ```
//!
//! - `suites(...)` 缺省时展开全部套件，名称在展开期校验；
//! - `processor = <expr>` 额外生成 `processor_contract`，每次调用 `<expr>` 得到一个新实例后交给
//!   `courier_contract_tests::verify::verify_processor`。

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::{format_ident, quote};
use syn::parse::{Parse, ParseStream};
use syn::punctuated::Punctuated;
use syn::{Expr, Ident, ItemMod, Result as SynResult, Token, parse_macro_input};

/// 与 `courier_contract_tests::all_suites()` 同序。
const KNOWN_SUITES: [&str; 5] = ["message", "exchange", "lifecycle", "processor", "adapter"];

#[derive(Default)]
struct TckArgs {
    suites: Option<Vec<Ident>>,
    processor: Option<Expr>,
}

impl Parse for TckArgs {
    fn parse(input: ParseStream<'_>) -> SynResult<Self> {
        let mut args = TckArgs::default();
        while !input.is_empty() {
            let key: Ident = input.parse()?;
            match key.to_string().as_str() {
                "suites" => {
                    if args.suites.is_some() {
                        return Err(syn::Error::new(key.span(), "suites(...) 只能出现一次"));
                    }
                    let content;
                    syn::parenthesized!(content in input);
                    let listed: Punctuated<Ident, Token![,]> =
                        content.parse_terminated(Ident::parse, Token![,])?;
                    args.suites = Some(validate_suites(listed)?);
                }
                "processor" => {
                    if args.processor.is_some() {
                        return Err(syn::Error::new(key.span(), "processor = ... 只能出现一次"));
                    }
                    input.parse::<Token![=]>()?;
                    args.processor = Some(input.parse()?);
                }
                other => {
                    return Err(syn::Error::new(
                        key.span(),
                        format!("未知参数 `{other}`，courier_tck 仅支持 suites(...) 与 processor = ..."),
                    ));
                }
            }
            if !input.is_empty() {
                input.parse::<Token![,]>()?;
            }
        }
        Ok(args)
    }
}

fn validate_suites(listed: Punctuated<Ident, Token![,]>) -> SynResult<Vec<Ident>> {
    let mut suites: Vec<Ident> = Vec::new();
    for suite in listed {
        let name = suite.to_string();
        if !KNOWN_SUITES.contains(&name.as_str()) {
            return Err(syn::Error::new(
                suite.span(),
                format!("未知套件 `{name}`，可选：{}", KNOWN_SUITES.join(", ")),
            ));
        }
        if suites.iter().any(|seen| *seen == suite) {
            return Err(syn::Error::new(suite.span(), format!("套件 `{name}` 重复")));
        }
        suites.push(suite);
    }
    Ok(suites)
}

#[proc_macro_attribute]
/// 为目标模块追加每个套件一个 `#[test]`，以及可选的 `processor_contract` 测试。
///
/// `suites()` 为空列表时只生成 `processor_contract`，两者都缺失视为错误。
pub fn courier_tck(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as TckArgs);
    let module = parse_macro_input!(item as ItemMod);

    match expand(args, module) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(args: TckArgs, module: ItemMod) -> SynResult<TokenStream2> {
    let suites = args.suites.unwrap_or_else(|| {
        KNOWN_SUITES
            .iter()
            .map(|name| Ident::new(name, Span::call_site()))
            .collect()
    });
    if suites.is_empty() && args.processor.is_none() {
        return Err(syn::Error::new(
            module.ident.span(),
            "suites() 为空且未提供 processor = ...，不会生成任何测试",
        ));
    }

    let mut tests: Vec<TokenStream2> = suites
        .iter()
        .map(|suite| {
            let test_ident = format_ident!("{}_suite", suite);
            let runner = format_ident!("run_{}_suite", suite);
            quote! {
                #[test]
                fn #test_ident() {
                    ::courier_contract_tests::#runner();
                }
            }
        })
        .collect();

    if let Some(factory) = args.processor {
        tests.push(quote! {
            #[test]
            fn processor_contract() {
                ::courier_contract_tests::verify::verify_processor(|| #factory);
            }
        });
    }

    Ok(attach(module, tests))
}

/// 内联模块直接追加；`mod x;` 形式没有内容，按原可见性与属性重建为内联模块。
fn attach(mut module: ItemMod, tests: Vec<TokenStream2>) -> TokenStream2 {
    match module.content {
        Some((_, ref mut items)) => {
            for test in tests {
                items.push(syn::Item::Verbatim(test));
            }
            quote! { #module }
        }
        None => {
            let ItemMod {
                attrs, vis, ident, ..
            } = &module;
            quote! {
                #(#attrs)*
                #vis mod #ident {
                    #(#tests)*
                }
            }
        }
    }
}
