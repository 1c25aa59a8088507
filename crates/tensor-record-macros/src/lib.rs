use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    parse::Parse, parse::ParseStream, spanned::Spanned, Attribute, Data, DataStruct, DeriveInput,
    Field, Fields, Ident, LitStr, Result as SynResult, Token, Type, Visibility,
};

/// Derives the record capability set for a struct of tensors.
///
/// Generates `TensorRecord` (field bookkeeping plus shape derivation),
/// the companion `<Name>Size` / `<Name>Info` types, `KeyedTensors` when
/// every tensor field shares one declared type, and the field schema
/// consumed by `extend_record!`.
#[proc_macro_derive(TensorRecord, attributes(keyed))]
pub fn derive_tensor_record(item: TokenStream) -> TokenStream {
    match expand_tensor_record(item) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error().into(),
    }
}

/// Declares a standalone size record together with its info companion.
///
/// `shape_record!(pub struct MySize(MyInfo) { a, b });` produces the
/// same pair of types the derive attaches to a record, from an explicit
/// slot list.
#[proc_macro]
pub fn shape_record(input: TokenStream) -> TokenStream {
    match expand_shape_record(input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_tensor_record(item: TokenStream) -> Result<TokenStream, syn::Error> {
    let input: DeriveInput = syn::parse(item)?;

    if let Some(param) = input.generics.params.first() {
        return Err(syn::Error::new(
            param.span(),
            "TensorRecord cannot classify the fields of a generic record; declare a concrete record",
        ));
    }

    let named = match &input.data {
        Data::Struct(DataStruct {
            fields: Fields::Named(named),
            ..
        }) => &named.named,
        Data::Struct(_) => {
            return Err(syn::Error::new(
                input.ident.span(),
                "TensorRecord requires named fields",
            ))
        }
        _ => {
            return Err(syn::Error::new(
                input.ident.span(),
                "TensorRecord can only be derived for structs",
            ))
        }
    };

    let options = RecordOptions::from_attrs(&input.attrs)?;
    let fields = named
        .iter()
        .map(RecordField::parse)
        .collect::<SynResult<Vec<_>>>()?;

    let record_ident = &input.ident;
    let vis = &input.vis;
    let info_ident = format_ident!("{}Info", record_ident);
    let size_ident = format_ident!("{}Size", record_ident);

    let tensor_fields: Vec<&RecordField> =
        fields.iter().filter(|field| field.is_tensor).collect();
    let tensor_idents: Vec<Ident> = tensor_fields
        .iter()
        .map(|field| field.ident.clone())
        .collect();
    let tensor_names: Vec<LitStr> = tensor_fields.iter().map(|field| field.name_lit()).collect();
    let all_names: Vec<LitStr> = fields.iter().map(|field| field.name_lit()).collect();

    let size_types = expand_size_types(vis, &size_ident, &info_ident, &tensor_idents, &[]);

    let record_impl = quote! {
        impl ::tensor_record::TensorRecord for #record_ident {
            type Size = #size_ident;
            type Info = #info_ident;

            const FIELDS: &'static [&'static str] = &[#(#all_names),*];
            const TENSOR_FIELDS: &'static [&'static str] = &[#(#tensor_names),*];

            fn keyed_extents(&self) -> ::std::vec::Vec<(&'static str, ::tensor_record::Extent)> {
                ::std::vec![
                    #((#tensor_names, ::tensor_record::HasExtent::extent(&self.#tensor_idents))),*
                ]
            }

            fn size(&self) -> #size_ident {
                #size_ident {
                    #(#tensor_idents: ::tensor_record::HasExtent::extent(&self.#tensor_idents),)*
                }
            }
        }
    };

    let tensor_access = expand_tensor_access(record_ident, &fields, &tensor_fields);
    let eq_impl = expand_eq_impl(record_ident, &fields, &options);
    let ord_impl = expand_ord_impl(record_ident, &fields, &options);
    let schema_macro = expand_schema_macro(record_ident, &fields);

    let tokens = quote! {
        #size_types
        #record_impl
        #(#tensor_access)*
        #(#eq_impl)*
        #(#ord_impl)*
        #schema_macro
    };
    Ok(tokens.into())
}

/// Emits `KeyedTensors` when the record has tensor fields and they all
/// share one declared type; mixed-type records keep the shape surface
/// but not the uniform accessors.
fn expand_tensor_access(
    record_ident: &Ident,
    fields: &[RecordField],
    tensor_fields: &[&RecordField],
) -> Vec<TokenStream2> {
    let Some(first) = tensor_fields.first() else {
        return Vec::new();
    };
    let tensor_ty = strip_type_wrappers(&first.ty);
    let uniform = tensor_fields
        .iter()
        .all(|field| type_tokens(&field.ty) == type_tokens(tensor_ty));
    if !uniform {
        return Vec::new();
    }

    let tensor_idents: Vec<&Ident> = tensor_fields.iter().map(|field| &field.ident).collect();
    let tensor_names: Vec<LitStr> = tensor_fields.iter().map(|field| field.name_lit()).collect();
    let plain_idents: Vec<&Ident> = fields
        .iter()
        .filter(|field| !field.is_tensor)
        .map(|field| &field.ident)
        .collect();

    vec![quote! {
        impl ::tensor_record::KeyedTensors for #record_ident {
            type Tensor = #tensor_ty;

            fn tensors(&self) -> ::std::vec::Vec<&#tensor_ty> {
                ::std::vec![#(&self.#tensor_idents),*]
            }

            fn keyedtensors(&self) -> ::std::vec::Vec<(&'static str, &#tensor_ty)> {
                ::std::vec![#((#tensor_names, &self.#tensor_idents)),*]
            }

            fn from_keyedtensors<'a, I>(
                pairs: I,
            ) -> ::core::result::Result<Self, ::tensor_record::RecordError>
            where
                I: ::core::iter::IntoIterator<Item = (&'a str, #tensor_ty)>,
            {
                #(let mut #tensor_idents: ::core::option::Option<#tensor_ty> =
                    ::core::option::Option::None;)*
                for (__key, __value) in pairs {
                    match __key {
                        #(#tensor_names => {
                            if #tensor_idents.replace(__value).is_some() {
                                return ::core::result::Result::Err(
                                    ::tensor_record::RecordError::DuplicateField {
                                        field: __key.to_string(),
                                    },
                                );
                            }
                        })*
                        _ => {
                            return ::core::result::Result::Err(
                                ::tensor_record::RecordError::UnexpectedField {
                                    field: __key.to_string(),
                                },
                            );
                        }
                    }
                }
                ::core::result::Result::Ok(Self {
                    #(#tensor_idents: #tensor_idents.ok_or(
                        ::tensor_record::RecordError::MissingField { field: #tensor_names },
                    )?,)*
                    #(#plain_idents: ::core::default::Default::default(),)*
                })
            }
        }
    }]
}

fn expand_eq_impl(
    record_ident: &Ident,
    fields: &[RecordField],
    options: &RecordOptions,
) -> Vec<TokenStream2> {
    if !(options.eq || options.ord) {
        return Vec::new();
    }
    let idents: Vec<&Ident> = fields.iter().map(|field| &field.ident).collect();
    vec![quote! {
        impl ::core::cmp::PartialEq for #record_ident {
            fn eq(&self, other: &Self) -> bool {
                true #(&& self.#idents == other.#idents)*
            }
        }
    }]
}

fn expand_ord_impl(
    record_ident: &Ident,
    fields: &[RecordField],
    options: &RecordOptions,
) -> Vec<TokenStream2> {
    if !options.ord {
        return Vec::new();
    }
    let idents: Vec<&Ident> = fields.iter().map(|field| &field.ident).collect();
    vec![quote! {
        impl ::core::cmp::PartialOrd for #record_ident {
            fn partial_cmp(&self, other: &Self) -> ::core::option::Option<::core::cmp::Ordering> {
                #(
                    match ::core::cmp::PartialOrd::partial_cmp(
                        &self.#idents,
                        &other.#idents,
                    ) {
                        ::core::option::Option::Some(::core::cmp::Ordering::Equal) => {}
                        not_eq => return not_eq,
                    }
                )*
                ::core::option::Option::Some(::core::cmp::Ordering::Equal)
            }
        }
    }]
}

/// Emits the hidden field-schema macro `extend_record!` expands through.
///
/// The macro is named after the record (macros live in their own
/// namespace) and re-declares the record's fields verbatim ahead of the
/// extending record's own, re-deriving `TensorRecord` on the result.
/// The item is assembled as source text so its `$` metavariables pass
/// through the expansion untouched.
fn expand_schema_macro(record_ident: &Ident, fields: &[RecordField]) -> TokenStream2 {
    let field_decls = fields
        .iter()
        .map(|field| {
            let attrs = &field.attrs;
            let fvis = &field.vis;
            let ident = &field.ident;
            let ty = &field.ty;
            quote! { #(#attrs)* #fvis #ident: #ty, }.to_string()
        })
        .collect::<Vec<_>>()
        .join("\n            ");

    let source = format!(
        r#"
#[doc(hidden)]
#[allow(unused_macros)]
macro_rules! {record_ident} {{
    (@extend [$(#[$meta:meta])* $vis:vis struct $name:ident] {{
        $($(#[$fattr:meta])* $fvis:vis $field:ident : $fty:ty),* $(,)?
    }}) => {{
        $(#[$meta])*
        #[derive(::tensor_record::TensorRecord)]
        $vis struct $name {{
            {field_decls}
            $($(#[$fattr])* $fvis $field : $fty,)*
        }}
    }};
}}
"#
    );
    source.parse().expect("field schema macro must lex")
}

fn expand_shape_record(input: TokenStream) -> Result<TokenStream, syn::Error> {
    let input: ShapeRecordInput = syn::parse(input)?;

    let mut seen = std::collections::HashSet::new();
    for slot in &input.slots {
        if !seen.insert(slot.to_string()) {
            return Err(syn::Error::new(
                slot.span(),
                format!("duplicate slot `{slot}`"),
            ));
        }
    }
    if input.size_ident == input.info_ident {
        return Err(syn::Error::new(
            input.info_ident.span(),
            "the size and info types need distinct names",
        ));
    }

    let tokens = expand_size_types(
        &input.vis,
        &input.size_ident,
        &input.info_ident,
        &input.slots,
        &input.attrs,
    );
    Ok(tokens.into())
}

/// Shared expansion behind both macros: the info struct, the size
/// struct, keyed construction, `KeyedSize`, and broadcast equality.
fn expand_size_types(
    vis: &Visibility,
    size_ident: &Ident,
    info_ident: &Ident,
    slots: &[Ident],
    size_attrs: &[Attribute],
) -> TokenStream2 {
    let names: Vec<LitStr> = slots
        .iter()
        .map(|slot| LitStr::new(&slot.to_string(), slot.span()))
        .collect();

    quote! {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        #vis struct #info_ident {
            #(pub #slots: usize,)*
        }

        #(#size_attrs)*
        #[derive(Debug, Clone, PartialEq, Eq)]
        #vis struct #size_ident {
            #(pub #slots: ::tensor_record::Extent,)*
        }

        #[allow(dead_code)]
        impl #size_ident {
            #vis fn new(#(#slots: impl ::tensor_record::ndarray::IntoDimension),*) -> Self {
                Self {
                    #(#slots: ::tensor_record::extent(#slots),)*
                }
            }

            #vis fn from_keyedtensors<'a, T, I>(
                pairs: I,
            ) -> ::core::result::Result<Self, ::tensor_record::RecordError>
            where
                T: ::tensor_record::HasExtent + 'a,
                I: ::core::iter::IntoIterator<Item = (&'a str, &'a T)>,
            {
                #(let mut #slots: ::core::option::Option<::tensor_record::Extent> =
                    ::core::option::Option::None;)*
                for (__key, __value) in pairs {
                    match __key {
                        #(#names => {
                            if #slots
                                .replace(::tensor_record::HasExtent::extent(__value))
                                .is_some()
                            {
                                return ::core::result::Result::Err(
                                    ::tensor_record::RecordError::DuplicateField {
                                        field: __key.to_string(),
                                    },
                                );
                            }
                        })*
                        _ => {
                            return ::core::result::Result::Err(
                                ::tensor_record::RecordError::UnexpectedField {
                                    field: __key.to_string(),
                                },
                            );
                        }
                    }
                }
                ::core::result::Result::Ok(Self {
                    #(#slots: #slots.ok_or(
                        ::tensor_record::RecordError::MissingField { field: #names },
                    )?,)*
                })
            }
        }

        impl ::tensor_record::KeyedSize for #size_ident {
            type Info = #info_ident;

            const FIELDS: &'static [&'static str] = &[#(#names),*];

            fn extents(&self) -> ::std::vec::Vec<&::tensor_record::Extent> {
                ::std::vec![#(&self.#slots),*]
            }

            fn numel(&self) -> #info_ident {
                #info_ident {
                    #(#slots: ::tensor_record::ndarray::Dimension::size(&self.#slots),)*
                }
            }
        }

        impl ::core::cmp::PartialEq<::tensor_record::Extent> for #size_ident {
            fn eq(&self, other: &::tensor_record::Extent) -> bool {
                ::tensor_record::KeyedSize::broadcast_eq(self, other)
            }
        }

        impl ::core::cmp::PartialEq<#size_ident> for ::tensor_record::Extent {
            fn eq(&self, other: &#size_ident) -> bool {
                ::tensor_record::KeyedSize::broadcast_eq(other, self)
            }
        }
    }
}

struct RecordField {
    attrs: Vec<Attribute>,
    vis: Visibility,
    ident: Ident,
    ty: Type,
    is_tensor: bool,
}

impl RecordField {
    fn parse(field: &Field) -> SynResult<Self> {
        let ident = field.ident.clone().expect("named field");
        let is_tensor = match FieldTag::from_attrs(&field.attrs)? {
            Some(FieldTag::Tensor) => true,
            Some(FieldTag::Plain) => false,
            None => is_tensor_type(&field.ty),
        };
        Ok(RecordField {
            attrs: field.attrs.clone(),
            vis: field.vis.clone(),
            ident,
            ty: field.ty.clone(),
            is_tensor,
        })
    }

    fn name_lit(&self) -> LitStr {
        LitStr::new(&self.ident.to_string(), self.ident.span())
    }
}

#[derive(Default)]
struct RecordOptions {
    eq: bool,
    ord: bool,
}

impl RecordOptions {
    fn from_attrs(attrs: &[Attribute]) -> SynResult<Self> {
        let mut options = RecordOptions::default();
        for attr in attrs {
            if !attr.path().is_ident("keyed") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("eq") {
                    options.eq = true;
                    Ok(())
                } else if meta.path.is_ident("ord") {
                    options.ord = true;
                    Ok(())
                } else {
                    Err(meta.error("unknown keyed option (expected eq or ord)"))
                }
            })?;
        }
        Ok(options)
    }
}

#[derive(Clone, Copy)]
enum FieldTag {
    Tensor,
    Plain,
}

impl FieldTag {
    fn from_attrs(attrs: &[Attribute]) -> SynResult<Option<Self>> {
        let mut tag: Option<FieldTag> = None;
        for attr in attrs {
            if !attr.path().is_ident("keyed") {
                continue;
            }
            attr.parse_nested_meta(|meta| {
                let parsed = if meta.path.is_ident("tensor") {
                    FieldTag::Tensor
                } else if meta.path.is_ident("plain") {
                    FieldTag::Plain
                } else {
                    return Err(meta.error("unknown keyed field tag (expected tensor or plain)"));
                };
                if tag.replace(parsed).is_some() {
                    return Err(meta.error("conflicting keyed field tags"));
                }
                Ok(())
            })?;
        }
        Ok(tag)
    }
}

struct ShapeRecordInput {
    attrs: Vec<Attribute>,
    vis: Visibility,
    size_ident: Ident,
    info_ident: Ident,
    slots: Vec<Ident>,
}

impl Parse for ShapeRecordInput {
    fn parse(input: ParseStream<'_>) -> SynResult<Self> {
        let attrs = input.call(Attribute::parse_outer)?;
        let vis: Visibility = input.parse()?;
        input.parse::<Token![struct]>()?;
        let size_ident: Ident = input.parse()?;

        let info_content;
        syn::parenthesized!(info_content in input);
        let info_ident: Ident = info_content.parse()?;
        if !info_content.is_empty() {
            return Err(info_content.error("expected a single info type name"));
        }

        let body;
        syn::braced!(body in input);
        let slots = body
            .parse_terminated(Ident::parse, Token![,])?
            .into_iter()
            .collect();

        Ok(ShapeRecordInput {
            attrs,
            vis,
            size_ident,
            info_ident,
            slots,
        })
    }
}

fn type_tokens(ty: &Type) -> String {
    let ty = strip_type_wrappers(ty);
    quote!(#ty).to_string()
}

/// Macro-expanded field types arrive wrapped in invisible groups.
fn strip_type_wrappers(ty: &Type) -> &Type {
    let mut current = ty;
    loop {
        match current {
            Type::Group(inner) => current = &inner.elem,
            Type::Paren(inner) => current = &inner.elem,
            _ => return current,
        }
    }
}

/// Declared-type membership test for the array family: the type path's
/// final segment, stripped of rank suffixes, has to name one of the
/// `ndarray` container flavors. `#[keyed(...)]` tags override this.
fn is_tensor_type(ty: &Type) -> bool {
    let Type::Path(path) = strip_type_wrappers(ty) else {
        return false;
    };
    let Some(segment) = path.path.segments.last() else {
        return false;
    };
    let name = segment.ident.to_string();
    let trimmed = name.trim_end_matches(|c: char| c.is_ascii_digit());
    let base = trimmed.strip_suffix('D').unwrap_or(trimmed);
    matches!(
        base,
        "Array" | "ArrayBase" | "ArcArray" | "CowArray" | "ArrayView" | "ArrayViewMut"
    )
}
