use thiserror::Error;

pub type Result<T> = std::result::Result<T, MappingError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    /// The `searchable` value is neither a flag nor a customization block.
    #[error("'searchable' property of [{class}] has unknown type: {kind}")]
    UnknownDirectiveType { class: String, kind: String },

    /// A single block invocation set both `only` and `except`.
    #[error(
        "Both 'only' and 'except' were used in '{class}#searchable': provide one or neither but not both."
    )]
    ConflictingScope { class: String },

    /// A block configured a property the class does not declare.
    #[error("Unable to find property [{property}] used in [{class}#searchable].")]
    UnknownProperty { class: String, property: String },

    /// `only` / `except` held something other than a name or a list of names.
    #[error("Unknown argument for '{scope}' in [{class}#searchable]: {value}")]
    InvalidScopeArgument {
        class: String,
        scope: &'static str,
        value: String,
    },

    /// Property attributes must be a map of attribute name to value.
    #[error("Attributes for property [{property}] in [{class}#searchable] must be a map")]
    InvalidAttributes { class: String, property: String },
}

impl MappingError {
    pub fn class_name(&self) -> &str {
        match self {
            Self::UnknownDirectiveType { class, .. }
            | Self::ConflictingScope { class }
            | Self::UnknownProperty { class, .. }
            | Self::InvalidScopeArgument { class, .. }
            | Self::InvalidAttributes { class, .. } => class,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_class() {
        let err = MappingError::ConflictingScope {
            class: "Book".to_string(),
        };
        assert!(err.to_string().contains("'Book#searchable'"));
        assert_eq!(err.class_name(), "Book");

        let err = MappingError::UnknownProperty {
            class: "Book".to_string(),
            property: "isbn".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unable to find property [isbn] used in [Book#searchable]."
        );
    }
}
