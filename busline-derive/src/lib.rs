//! Attribute macro for busline listeners.
//!
//! This crate provides `#[listener]`, which turns the `#[subscribe]` methods
//! of an inherent `impl` block into a `busline::Listener` implementation.

use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::parse::Parser;
use syn::{
    parse_macro_input, Attribute, Expr, ExprLit, ExprUnary, FnArg, GenericArgument, GenericParam,
    Ident, ImplItem, ImplItemFn, ItemImpl, Lit, LitStr, PathArguments, ReturnType, Type, UnOp,
    Visibility,
};

/// Implements `busline::Listener` from the `#[subscribe]` methods of an impl block.
///
/// `events` names the event family and `family` the listener family of the
/// bus the listener is meant for. Both are trait-object types.
///
/// A method becomes a handler when it is marked `#[subscribe]` and has the
/// handler shape: `pub`, not `async`, not `unsafe`, no type or const
/// parameters, a `&self` receiver, exactly one `&P` parameter where `P` is a
/// concrete type, and a return type of `()` or `Result<(), E>`. Marked
/// methods of any other shape are left alone and never registered.
///
/// The event reference may name a lifetime declared on the method itself
/// (`fn on<'a>(&self, event: &'a P)`). Any other named lifetime, `&'static P`
/// included, is not a handler shape: events are only borrowed for the call.
///
/// `#[subscribe(priority = ..)]` sets the handler's priority (lower runs
/// earlier). Integer literals are taken as the raw value; any other expression
/// must convert into `busline::Priority`.
///
/// The generated code fails to compile when the listener type does not
/// implement the listener family, or a handler's event type does not implement
/// the event family.
///
/// # Examples
///
/// ```rust
/// use busline::{listener, Priority};
///
/// pub trait ShopEvent: busline::Event {}
/// pub trait ShopListener: Send + Sync {}
///
/// pub struct OrderPlaced { pub id: u64 }
/// impl ShopEvent for OrderPlaced {}
///
/// pub struct Billing;
/// impl ShopListener for Billing {}
///
/// #[listener(events = dyn ShopEvent, family = dyn ShopListener)]
/// impl Billing {
///     #[subscribe(priority = Priority::EARLY)]
///     pub fn charge(&self, order: &OrderPlaced) -> Result<(), String> {
///         if order.id == 0 {
///             return Err("unknown order".into());
///         }
///         Ok(())
///     }
///
///     #[subscribe(priority = 10)]
///     pub fn receipt(&self, _order: &OrderPlaced) {}
///
///     // Not a handler: no `#[subscribe]`.
///     pub fn refund(&self, _order: &OrderPlaced) {}
/// }
/// ```
#[proc_macro_attribute]
pub fn listener(args: TokenStream, input: TokenStream) -> TokenStream {
    let item = parse_macro_input!(input as ItemImpl);

    match expand(args.into(), item) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(error) => TokenStream::from(error.to_compile_error()),
    }
}

/// Families named in `#[listener(...)]`.
struct ListenerArgs {
    events: Type,
    family: Type,
}

/// One discovered handler method.
struct Handler {
    name: Ident,
    param: Type,
    ret: Type,
    priority: TokenStream2,
}

fn expand(args: TokenStream2, mut item: ItemImpl) -> syn::Result<TokenStream2> {
    let ListenerArgs { events, family } = parse_args(args)?;

    if let Some((_, path, _)) = &item.trait_ {
        return Err(syn::Error::new_spanned(
            path,
            "#[listener] must be placed on an inherent impl block",
        ));
    }

    let mut handlers = Vec::new();
    for impl_item in &mut item.items {
        let ImplItem::Fn(method) = impl_item else {
            continue;
        };
        let Some(priority) = take_subscribe(&mut method.attrs)? else {
            continue;
        };
        if let Some(handler) = discover(method, priority) {
            handlers.push(handler);
        }
    }

    let self_ty = &item.self_ty;
    let (impl_generics, _, where_clause) = item.generics.split_for_impl();

    let params = handlers.iter().map(|handler| &handler.param);
    let descriptors = handlers.iter().map(|handler| {
        let Handler {
            name,
            param,
            ret,
            priority,
        } = handler;
        let label = LitStr::new(&name.to_string(), name.span());
        quote! {
            ::busline::HandlerMethod::<Self>::new::<#param, #ret>(
                #label,
                #priority,
                |this, event| this.#name(event),
            )
        }
    });

    Ok(quote! {
        #item

        impl #impl_generics ::busline::Listener<#events, #family> for #self_ty #where_clause {
            fn handler_methods() -> ::std::vec::Vec<::busline::HandlerMethod<Self>> {
                let _: fn(&Self) -> &(#family) = |listener| listener;
                #( let _: fn(&#params) -> &(#events) = |event| event; )*
                ::std::vec![#(#descriptors),*]
            }
        }
    })
}

fn parse_args(args: TokenStream2) -> syn::Result<ListenerArgs> {
    let mut events = None;
    let mut family = None;

    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("events") {
            events = Some(meta.value()?.parse::<Type>()?);
            Ok(())
        } else if meta.path.is_ident("family") {
            family = Some(meta.value()?.parse::<Type>()?);
            Ok(())
        } else {
            Err(meta.error("unsupported listener property, expected `events` or `family`"))
        }
    });
    parser.parse2(args)?;

    let events = events.ok_or_else(|| {
        syn::Error::new(Span::call_site(), "missing `events = dyn EventFamily`")
    })?;
    let family = family.ok_or_else(|| {
        syn::Error::new(Span::call_site(), "missing `family = dyn ListenerFamily`")
    })?;
    Ok(ListenerArgs { events, family })
}

/// Removes every `#[subscribe]` attribute.
///
/// Returns `None` when there was none, otherwise the priority tokens.
fn take_subscribe(attrs: &mut Vec<Attribute>) -> syn::Result<Option<TokenStream2>> {
    let (subscribe, rest): (Vec<Attribute>, Vec<Attribute>) = std::mem::take(attrs)
        .into_iter()
        .partition(|attr| attr.path().is_ident("subscribe"));
    *attrs = rest;

    let mut subscribe = subscribe.into_iter();
    let Some(attr) = subscribe.next() else {
        return Ok(None);
    };
    if let Some(duplicate) = subscribe.next() {
        return Err(syn::Error::new_spanned(duplicate, "duplicate #[subscribe]"));
    }

    let mut priority = None;
    if let syn::Meta::List(_) = attr.meta {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("priority") {
                priority = Some(meta.value()?.parse::<Expr>()?);
                Ok(())
            } else {
                Err(meta.error("unsupported subscribe property, expected `priority`"))
            }
        })?;
    } else if let syn::Meta::NameValue(_) = attr.meta {
        return Err(syn::Error::new_spanned(
            attr,
            "expected #[subscribe] or #[subscribe(priority = ..)]",
        ));
    }

    Ok(Some(priority_tokens(priority)))
}

fn priority_tokens(priority: Option<Expr>) -> TokenStream2 {
    let Some(expr) = priority else {
        return quote!(::busline::Priority::NORMAL);
    };
    let expr = strip_groups(expr);
    if is_int_literal(&expr) {
        quote!(::busline::Priority::new(#expr))
    } else {
        quote!(::busline::Priority::from(#expr))
    }
}

// Values forwarded through `macro_rules!` arrive wrapped in invisible groups.
fn strip_groups(expr: Expr) -> Expr {
    match expr {
        Expr::Group(group) => strip_groups(*group.expr),
        Expr::Paren(paren) => strip_groups(*paren.expr),
        other => other,
    }
}

fn is_int_literal(expr: &Expr) -> bool {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(_), ..
        }) => true,
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => is_int_literal(&strip_groups((**expr).clone())),
        _ => false,
    }
}

/// Returns the handler described by `method`, or `None` if its shape does not
/// qualify.
fn discover(method: &ImplItemFn, priority: TokenStream2) -> Option<Handler> {
    let sig = &method.sig;

    if !matches!(method.vis, Visibility::Public(_))
        || sig.asyncness.is_some()
        || sig.unsafety.is_some()
        || sig.abi.is_some()
        || sig.variadic.is_some()
        || sig.generics.where_clause.is_some()
        || sig.inputs.len() != 2
    {
        return None;
    }

    let mut lifetimes = Vec::new();
    for param in &sig.generics.params {
        match param {
            GenericParam::Lifetime(def) => lifetimes.push(&def.lifetime),
            GenericParam::Type(_) | GenericParam::Const(_) => return None,
        }
    }

    let mut inputs = sig.inputs.iter();
    match inputs.next()? {
        FnArg::Receiver(receiver)
            if receiver.reference.is_some()
                && receiver.mutability.is_none()
                && receiver.colon_token.is_none() => {}
        _ => return None,
    }

    let param = match inputs.next()? {
        FnArg::Typed(typed) => match &*typed.ty {
            Type::Reference(reference)
                if reference.mutability.is_none()
                    && reference
                        .lifetime
                        .as_ref()
                        .map_or(true, |lifetime| lifetimes.contains(&lifetime)) =>
            {
                (*reference.elem).clone()
            }
            _ => return None,
        },
        FnArg::Receiver(_) => return None,
    };
    if matches!(param, Type::TraitObject(_) | Type::ImplTrait(_) | Type::Infer(_)) {
        return None;
    }

    let ret = match &sig.output {
        ReturnType::Default => syn::parse_quote!(()),
        ReturnType::Type(_, ty) if is_unit(ty) || is_unit_result(ty) => (**ty).clone(),
        ReturnType::Type(..) => return None,
    };

    Some(Handler {
        name: sig.ident.clone(),
        param,
        ret,
        priority,
    })
}

fn is_unit(ty: &Type) -> bool {
    matches!(ty, Type::Tuple(tuple) if tuple.elems.is_empty())
}

/// `Result<(), E>`, or an alias such as `io::Result<()>`.
fn is_unit_result(ty: &Type) -> bool {
    let Type::Path(path) = ty else {
        return false;
    };
    let Some(last) = path.path.segments.last() else {
        return false;
    };
    if last.ident != "Result" {
        return false;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return false;
    };
    matches!(args.args.first(), Some(GenericArgument::Type(ok)) if is_unit(ok))
}
