use crate::prelude::*;
use darling::FromMeta;
use heck::{
    ToKebabCase, ToLowerCamelCase, ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase,
};

/// Container for attributes specified on the struct
#[derive(Debug, FromDeriveInput)]
#[darling(attributes(xml), supports(struct_named))]
pub struct XmlRecordOpts {
    pub(crate) ident: syn::Ident,

    pub(crate) generics: syn::Generics,

    pub(crate) data: darling::ast::Data<(), XmlFieldOpts>,

    /// Record type name, defaults to the struct name
    #[darling(default)]
    pub(crate) name: Option<String>,

    /// Rename strategy applied to field element names
    #[darling(default)]
    pub(crate) rename_all: Option<String>,

    /// Path of the schema crate in generated code
    #[darling(default, rename = "crate")]
    pub(crate) krate: Option<syn::Path>,
}

impl XmlRecordOpts {
    pub fn record_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.ident.to_string())
    }

    pub fn schema_crate(&self) -> proc_macro2::TokenStream {
        match &self.krate {
            Some(path) => quote!(#path),
            None => quote!(::soapwire_schema),
        }
    }

    pub fn rename_strategy(&self) -> Result<RenameStrategy, syn::Error> {
        match &self.rename_all {
            None => Ok(RenameStrategy::None),
            Some(strategy) => RenameStrategy::from_str(strategy).ok_or_else(|| {
                syn::Error::new(
                    self.ident.span(),
                    format!("unknown rename_all strategy \"{}\"", strategy),
                )
            }),
        }
    }
}

/// Container for attributes specified on struct fields
#[derive(Debug, FromField)]
#[darling(attributes(xml))]
pub struct XmlFieldOpts {
    pub(crate) ident: Option<syn::Ident>,

    pub(crate) ty: syn::Type,

    /// Element name, overrides rename_all
    #[darling(default)]
    pub(crate) name: Option<String>,

    /// minOccurs of a Vec field
    #[darling(default)]
    pub(crate) min_occurs: Option<u32>,

    /// maxOccurs of a Vec field, a number or "unbounded"
    #[darling(default)]
    pub(crate) max_occurs: Option<MaxOccursArg>,
}

/// `max_occurs = 5` or `max_occurs = "unbounded"`
#[derive(Debug, Clone, Copy)]
pub enum MaxOccursArg {
    Bounded(u32),
    Unbounded,
}

impl FromMeta for MaxOccursArg {
    fn from_value(value: &syn::Lit) -> darling::Result<Self> {
        match value {
            syn::Lit::Int(int) => {
                let max = int.base10_parse::<u32>()?;
                if max == 0 {
                    return Err(darling::Error::custom("max_occurs must be positive"));
                }
                Ok(MaxOccursArg::Bounded(max))
            }
            syn::Lit::Str(text) if text.value() == "unbounded" => Ok(MaxOccursArg::Unbounded),
            _ => Err(darling::Error::unexpected_lit_type(value)),
        }
    }
}

/// Rename case conversion strategies
#[derive(Debug, Clone, Copy)]
pub enum RenameStrategy {
    None,
    Lowercase,
    Uppercase,
    PascalCase,
    CamelCase,
    SnakeCase,
    ScreamingSnakeCase,
    KebabCase,
}

impl RenameStrategy {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "lowercase" => Some(RenameStrategy::Lowercase),
            "UPPERCASE" => Some(RenameStrategy::Uppercase),
            "PascalCase" => Some(RenameStrategy::PascalCase),
            "camelCase" => Some(RenameStrategy::CamelCase),
            "snake_case" => Some(RenameStrategy::SnakeCase),
            "SCREAMING_SNAKE_CASE" => Some(RenameStrategy::ScreamingSnakeCase),
            "kebab-case" => Some(RenameStrategy::KebabCase),
            _ => None,
        }
    }

    pub fn apply(self, input: &str) -> String {
        match self {
            RenameStrategy::None => input.to_string(),
            RenameStrategy::Lowercase => input.to_lowercase(),
            RenameStrategy::Uppercase => input.to_uppercase(),
            RenameStrategy::PascalCase => input.to_upper_camel_case(),
            RenameStrategy::CamelCase => input.to_lower_camel_case(),
            RenameStrategy::SnakeCase => input.to_snake_case(),
            RenameStrategy::ScreamingSnakeCase => input.to_shouty_snake_case(),
            RenameStrategy::KebabCase => input.to_kebab_case(),
        }
    }
}

impl XmlFieldOpts {
    /// Element name of this field after renames; raw identifiers lose `r#`.
    pub fn element_name(&self, strategy: RenameStrategy) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        let ident = self
            .ident
            .as_ref()
            .map(|ident| ident.to_string())
            .unwrap_or_default();
        let ident = ident.strip_prefix("r#").unwrap_or(&ident);
        strategy.apply(ident)
    }

    pub fn has_occurs(&self) -> bool {
        self.min_occurs.is_some() || self.max_occurs.is_some()
    }
}
