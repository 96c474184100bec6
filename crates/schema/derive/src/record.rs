use crate::prelude::*;
use proc_macro2::TokenStream as TokenStream2;
use std::collections::HashSet;

struct FieldPlan<'a> {
    ident: &'a syn::Ident,
    ty: &'a syn::Type,
    element_name: String,
    descriptor: TokenStream2,
}

fn plan_fields<'a>(
    opts: &'a XmlRecordOpts,
    krate: &TokenStream2,
) -> Result<Vec<FieldPlan<'a>>, syn::Error> {
    let strategy = opts.rename_strategy()?;
    let fields = opts
        .data
        .as_ref()
        .take_struct()
        .ok_or_else(|| syn::Error::new(opts.ident.span(), "XmlRecord needs a struct"))?;

    let mut seen = HashSet::new();
    let mut plans = Vec::new();
    for field in fields.fields {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new(field.ty.span(), "XmlRecord needs named fields"))?;
        let element_name = field.element_name(strategy);
        let ty = &field.ty;

        if !is_xml_name(&element_name) {
            return Err(syn::Error::new(
                ident.span(),
                format!("element name \"{}\" is not an XML name", element_name),
            ));
        }
        if !seen.insert(element_name.clone()) {
            return Err(syn::Error::new(
                ident.span(),
                format!("element name \"{}\" is used by more than one field", element_name),
            ));
        }
        if field.has_occurs() && !is_vec_type(ty) {
            return Err(syn::Error::new(
                ty.span(),
                "min_occurs and max_occurs only apply to Vec fields",
            ));
        }
        if !occurs_in_order(field.min_occurs, field.max_occurs) {
            return Err(syn::Error::new(
                ident.span(),
                "min_occurs must not exceed max_occurs",
            ));
        }

        let mut descriptor = quote! {
            #krate::FieldDescriptor::of::<#ty>(#element_name)
        };
        if field.has_occurs() {
            let min = match field.min_occurs {
                Some(min) => quote!(Some(#min)),
                None => quote!(None),
            };
            let max = match field.max_occurs {
                Some(MaxOccursArg::Bounded(max)) => {
                    quote!(Some(#krate::MaxOccurs::Bounded(#max)))
                }
                Some(MaxOccursArg::Unbounded) => quote!(Some(#krate::MaxOccurs::Unbounded)),
                None => quote!(None),
            };
            descriptor = quote!(#descriptor.with_occurs(#min, #max));
        }

        plans.push(FieldPlan {
            ident,
            ty,
            element_name,
            descriptor,
        });
    }
    Ok(plans)
}

/// Generate the record type, instance conversions and field impls for a
/// struct with named fields.
pub fn implement_for_struct(opts: &XmlRecordOpts) -> Result<TokenStream2, syn::Error> {
    if !opts.generics.params.is_empty() {
        return Err(syn::Error::new(
            opts.generics.span(),
            "XmlRecord does not support generic structs",
        ));
    }

    let krate = opts.schema_crate();
    let ident = &opts.ident;
    let record_name = opts.record_name();
    if !is_xml_name(&record_name) {
        return Err(syn::Error::new(
            ident.span(),
            format!("record name \"{}\" is not an XML name", record_name),
        ));
    }
    let plans = plan_fields(opts, &krate)?;

    let descriptors = plans.iter().map(|plan| &plan.descriptor);
    let to_values = plans.iter().map(|plan| {
        let field = plan.ident;
        quote!(#krate::XmlField::to_field_value(&self.#field))
    });
    let from_values = plans.iter().map(|plan| {
        let field = plan.ident;
        let ty = plan.ty;
        let name = &plan.element_name;
        quote!(#field: instance.extract::<#ty>(#name)?)
    });

    Ok(quote! {
        impl #krate::ToRecordType for #ident {
            fn record_type() -> #krate::RecordRef {
                static RECORD: #krate::RecordTypeCell = #krate::RecordTypeCell::new();
                RECORD.get_or_build(|| {
                    #krate::RecordType::builder(#record_name)
                        #(.field(#descriptors))*
                        .build()
                        .unwrap_or_else(|err| panic!("invalid XmlRecord {}: {}", #record_name, err))
                })
            }
        }

        impl #krate::ToRecordInstance for #ident {
            fn to_instance(&self) -> #krate::RecordInstance {
                #krate::RecordInstance::from_values_unchecked(
                    <Self as #krate::ToRecordType>::record_type(),
                    vec![#(#to_values),*],
                )
            }
        }

        impl #krate::FromRecordInstance for #ident {
            fn from_instance(instance: &#krate::RecordInstance) -> #krate::Result<Self> {
                if instance.name() != #record_name {
                    return Err(#krate::MarshalError::schema_mismatch(format!(
                        "expected a {} record, found {}",
                        #record_name,
                        instance.name()
                    )));
                }
                Ok(Self {
                    #(#from_values),*
                })
            }
        }

        impl #krate::XmlField for #ident {
            fn field_kind() -> #krate::FieldKind {
                #krate::FieldKind::Record(<Self as #krate::ToRecordType>::record_type())
            }

            fn to_field_value(&self) -> #krate::FieldValue {
                #krate::FieldValue::Record(#krate::ToRecordInstance::to_instance(self))
            }

            fn from_field_value(value: &#krate::FieldValue, field: &str) -> #krate::Result<Self> {
                match value {
                    #krate::FieldValue::Record(instance) => {
                        <Self as #krate::FromRecordInstance>::from_instance(instance)
                    }
                    #krate::FieldValue::Absent => Err(#krate::MarshalError::schema_mismatch(
                        format!("required field {} is missing", field),
                    )),
                    _ => Err(#krate::MarshalError::schema_mismatch(format!(
                        "field {} does not hold a {} record",
                        field, #record_name
                    ))),
                }
            }
        }

        impl #krate::XmlElement for #ident {
            fn element_type() -> #krate::ElementType {
                #krate::ElementType::Record(<Self as #krate::ToRecordType>::record_type())
            }

            fn to_item(&self) -> #krate::Item {
                #krate::Item::Record(#krate::ToRecordInstance::to_instance(self))
            }

            fn from_item(item: &#krate::Item) -> #krate::Result<Self> {
                match item {
                    #krate::Item::Record(instance) => {
                        <Self as #krate::FromRecordInstance>::from_instance(instance)
                    }
                    #krate::Item::Scalar(value) => Err(#krate::MarshalError::schema_mismatch(
                        format!("expected a {} record, found {}", #record_name, value.kind()),
                    )),
                }
            }
        }
    })
}
