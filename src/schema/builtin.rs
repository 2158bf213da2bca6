use super::{FieldKind, FieldSpec, NodeSchema, SchemaRegistry};

/// Defines the built-in node schemas, the function that registers them and
/// the ordered list of their type names.
macro_rules! define_node_schemas {
    ( $( $node_type:literal { $( $field:literal => $spec:expr ),* $(,)? } )* ) => {
        pub(super) fn register_builtin_schemas(registry: &mut SchemaRegistry) {
            $(
                registry.insert_unchecked(
                    $node_type,
                    NodeSchema::new() $( .with_field($field, $spec) )*,
                );
            )*
        }

        /// Names of the built-in node types, in declaration order.
        pub const BUILTIN_TYPES: &[&str] = &[ $( $node_type ),* ];
    };
}

define_node_schemas! {
    "Input File" {
        "file" => FieldSpec::new(FieldKind::String)
            .required()
            .describe("Path to the input EEG file"),
    }

    "Notch Filter" {
        "frequency" => FieldSpec::new(FieldKind::Number)
            .required()
            .with_min(0.0)
            .describe("Frequency (Hz) at which to apply notch filtering. Must be positive."),
        "include eog" => FieldSpec::new(FieldKind::Boolean)
            .required()
            .with_default(true)
            .describe("Whether to include EOG (eye movement) channels in the filter"),
    }

    "Plot Channels" {
        "title" => FieldSpec::new(FieldKind::String)
            .required()
            .describe("Title of the plot window"),
        "n_channels" => FieldSpec::new(FieldKind::Integer)
            .required()
            .with_min(1.0)
            .describe("Number of EEG channels to plot"),
        "block" => FieldSpec::new(FieldKind::Boolean)
            .required()
            .with_default(true)
            .describe("Whether to block execution until the plot is closed"),
    }

    "Output File" {
        "path" => FieldSpec::new(FieldKind::String)
            .required()
            .describe("Path to save the processed EEG data (e.g. 'clean_subject1.edf')"),
    }
}
