use fxhash::FxHashSet;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Attribute, Data, DeriveInput, Expr, ExprLit, Field, Fields, FieldsNamed, GenericArgument, Ident,
    Lit, Meta, PathArguments, Type, Variant,
};

const EXCEPTION_ATTR: &str = "exception";
const DEFAULT_EXCEPTION: &str = "Error";
const INTERNAL_VARIANT: &str = "Internal";

struct VariantSpec {
    ident: Ident,
    exception: String,
    source: Option<(Ident, Type)>,
    has_context: bool,
    cfg_attrs: Vec<Attribute>,
}

impl VariantSpec {
    /// Reads the variant shape and strips the `#[exception]` helper attribute from it.
    fn take(variant: &mut Variant) -> syn::Result<Self> {
        let exception = take_exception(&mut variant.attrs)?;

        let Fields::Named(fields) = &variant.fields else {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                "wcrypt_error requires named fields for source/context handling",
            ));
        };

        let has_context = has_context_field(fields)?;
        let source = source_field(fields)
            .and_then(|field| field.ident.clone().map(|ident| (ident, field.ty.clone())));

        if source.is_some() && !has_context {
            return Err(syn::Error::new_spanned(
                &variant.ident,
                "wcrypt_error requires `context: Option<Cow<'static, str>>` for variants with a source",
            ));
        }

        let cfg_attrs =
            variant.attrs.iter().filter(|attr| attr.path().is_ident("cfg")).cloned().collect();

        Ok(Self { ident: variant.ident.clone(), exception, source, has_context, cfg_attrs })
    }
}

pub fn expand(mut input: DeriveInput) -> TokenStream {
    let name = input.ident.clone();
    let ext_name = format_ident!("{}Ext", name);

    let Data::Enum(data) = &mut input.data else {
        return syn::Error::new_spanned(&name, "wcrypt_error can only be applied to enums")
            .to_compile_error();
    };

    let mut specs = Vec::with_capacity(data.variants.len());
    for variant in &mut data.variants {
        match VariantSpec::take(variant) {
            Ok(spec) => specs.push(spec),
            Err(err) => return err.to_compile_error(),
        }
    }

    let derives = missing_derives(&input);
    let exception_impl = exception_impl(&name, &specs);
    let context_impl = context_impl(&name, &ext_name, &specs);
    let source_impls = specs.iter().filter_map(|spec| source_impl(&name, &ext_name, spec));
    let internal_impls = internal_impls(&name, &specs);

    quote! {
        #[allow(non_shorthand_field_patterns)]
        #derives
        #input

        #exception_impl
        #context_impl
        #(#source_impls)*
        #internal_impls

        #[allow(dead_code)]
        fn format_context(context: &Option<std::borrow::Cow<'static, str>>) -> std::borrow::Cow<'static, str> {
            context.as_ref().map_or(std::borrow::Cow::Borrowed(""), |c| std::borrow::Cow::Owned(format!(" ({c})")))
        }
    }
}

fn take_exception(attrs: &mut Vec<Attribute>) -> syn::Result<String> {
    let mut exception = None;
    let mut kept = Vec::with_capacity(attrs.len());

    for attr in attrs.drain(..) {
        if !attr.path().is_ident(EXCEPTION_ATTR) {
            kept.push(attr);
            continue;
        }
        if exception.is_some() {
            return Err(syn::Error::new_spanned(attr, "duplicate `exception` attribute"));
        }
        let Meta::NameValue(meta) = &attr.meta else {
            return Err(syn::Error::new_spanned(attr, "expected `#[exception = \"...\"]`"));
        };
        let Expr::Lit(ExprLit { lit: Lit::Str(value), .. }) = &meta.value else {
            return Err(syn::Error::new_spanned(&meta.value, "exception name must be a string"));
        };
        exception = Some(value.value());
    }

    *attrs = kept;
    Ok(exception.unwrap_or_else(|| DEFAULT_EXCEPTION.to_owned()))
}

fn has_context_field(fields: &FieldsNamed) -> syn::Result<bool> {
    let Some(field) =
        fields.named.iter().find(|field| field.ident.as_ref().is_some_and(|i| i == "context"))
    else {
        return Ok(false);
    };

    if is_optional_cow_str(&field.ty) {
        Ok(true)
    } else {
        Err(syn::Error::new_spanned(&field.ty, "context field must be Option<Cow<'static, str>>"))
    }
}

fn source_field(fields: &FieldsNamed) -> Option<&Field> {
    fields.named.iter().find(|field| {
        field.ident.as_ref().is_some_and(|ident| ident == "source")
            || field.attrs.iter().any(|a| a.path().is_ident("source") || a.path().is_ident("from"))
    })
}

fn missing_derives(input: &DeriveInput) -> TokenStream {
    let mut present = FxHashSet::default();
    for attr in input.attrs.iter().filter(|attr| attr.path().is_ident("derive")) {
        let _ = attr.parse_nested_meta(|meta| {
            if let Some(segment) = meta.path.segments.last() {
                present.insert(segment.ident.to_string());
            }
            Ok(())
        });
    }

    let mut derives = Vec::new();
    if !present.contains("Debug") {
        derives.push(quote! { Debug });
    }
    if !present.contains("Error") {
        derives.push(quote! { ::thiserror::Error });
    }

    if derives.is_empty() { quote! {} } else { quote! { #[derive(#(#derives),*)] } }
}

fn exception_impl(name: &Ident, specs: &[VariantSpec]) -> TokenStream {
    let arms = specs.iter().map(|spec| {
        let VariantSpec { ident, exception, cfg_attrs, .. } = spec;
        quote! { #(#cfg_attrs)* Self::#ident { .. } => #exception, }
    });

    quote! {
        #[automatically_derived]
        impl #name {
            /// Returns the Web Crypto exception name this error is reported as.
            #[must_use]
            pub const fn exception(&self) -> &'static str {
                match self {
                    #(#arms)*
                }
            }
        }
    }
}

fn context_impl(name: &Ident, ext_name: &Ident, specs: &[VariantSpec]) -> TokenStream {
    let arms = specs.iter().filter(|spec| spec.has_context).map(|spec| {
        let VariantSpec { ident, cfg_attrs, .. } = spec;
        quote! { #(#cfg_attrs)* #name::#ident { context: slot, .. } => *slot = Some(context.into()), }
    });

    quote! {
        pub trait #ext_name<T> {
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Result<T, #name>;
        }

        #[automatically_derived]
        impl<T> #ext_name<T> for Result<T, #name> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> Self {
                self.map_err(|mut err| {
                    #[allow(unreachable_patterns)]
                    match &mut err {
                        #(#arms)*
                        _ => {}
                    }
                    err
                })
            }
        }
    }
}

fn source_impl(name: &Ident, ext_name: &Ident, spec: &VariantSpec) -> Option<TokenStream> {
    if spec.ident == INTERNAL_VARIANT {
        return None;
    }
    let (field, ty) = spec.source.as_ref()?;
    let VariantSpec { ident, cfg_attrs, .. } = spec;

    Some(quote! {
        #(#cfg_attrs)*
        #[automatically_derived]
        impl From<#ty> for #name {
            #[inline]
            fn from(#field: #ty) -> Self { Self::#ident { #field, context: None } }
        }

        #(#cfg_attrs)*
        impl<T> #ext_name<T> for std::result::Result<T, #ty> {
            #[inline]
            fn context(self, context: impl Into<std::borrow::Cow<'static, str>>) -> std::result::Result<T, #name> {
                self.map_err(|#field| #name::#ident { #field, context: Some(context.into()) })
            }
        }
    })
}

fn internal_impls(name: &Ident, specs: &[VariantSpec]) -> TokenStream {
    let Some(internal) = specs.iter().find(|spec| spec.ident == INTERNAL_VARIANT) else {
        return quote! {};
    };
    let cfg_attrs = &internal.cfg_attrs;

    quote! {
        #(#cfg_attrs)*
        impl From<&'static str> for #name {
            #[inline]
            fn from(s: &'static str) -> Self {
                Self::Internal { message: std::borrow::Cow::Borrowed(s), context: None }
            }
        }

        #(#cfg_attrs)*
        impl From<String> for #name {
            #[inline]
            fn from(s: String) -> Self {
                Self::Internal { message: std::borrow::Cow::Owned(s), context: None }
            }
        }
    }
}

/// Matches `Option<Cow<'static, str>>` by its last path segments.
fn is_optional_cow_str(ty: &Type) -> bool {
    let Some(cow) = single_generic(ty, "Option").and_then(|arg| match arg {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }) else {
        return false;
    };

    let Type::Path(path) = cow else {
        return false;
    };
    let Some(segment) = path.path.segments.last() else {
        return false;
    };
    if segment.ident != "Cow" {
        return false;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return false;
    };

    let mut args = args.args.iter();
    let lifetime_ok = matches!(args.next(), Some(GenericArgument::Lifetime(lt)) if lt.ident == "static");
    let str_ok = matches!(
        args.next(),
        Some(GenericArgument::Type(Type::Path(p)))
            if p.path.segments.last().is_some_and(|s| s.ident == "str")
    );
    lifetime_ok && str_ok
}

fn single_generic<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a GenericArgument> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    args.args.first()
}
