use alloc::string::String;

/// Codec-level metadata of a property or constructor argument.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMetadata {
    /// The property must be present in the input.
    pub required: bool,
    pub description: Option<String>,
    /// Position among the bean's properties, when declared.
    pub index: Option<i32>,
    /// Textual default value, parsed with the property's declared type.
    pub default_value: Option<String>,
}

impl PropertyMetadata {
    /// Metadata of an optional property without further information.
    pub const OPTIONAL: PropertyMetadata = PropertyMetadata {
        required: false,
        description: None,
        index: None,
        default_value: None,
    };

    /// Metadata of a required property without further information.
    pub const REQUIRED: PropertyMetadata = PropertyMetadata {
        required: true,
        description: None,
        index: None,
        default_value: None,
    };

    #[inline]
    pub fn is_required(&self) -> bool {
        self.required
    }
}
