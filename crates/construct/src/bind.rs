//! # Field Binding
//!
//! Maps named construct inputs onto the fields of args structs, and reads a
//! component's exposed fields back out as a state bag.
//!
//! ## Field Tables
//!
//! There is no runtime reflection. A struct opts in by implementing `Fields`,
//! normally through `construct_fields!`, which generates one `Field` per
//! tagged struct field: the wire tag plus a setter and a getter. The setter
//! builds the field's own output type from the input, so a field declared
//! `Output<String>` receives a typed output and an `AnyOutput` field receives
//! an untyped one. Untagged fields are simply absent from the table.

use std::collections::BTreeMap;

use output::AnyOutput;
use output::Output;
use output::OutputValue;
use propval::PropertyValue;
use propval::Urn;

/// One decoded construct input: its value, whether it was secret, and the
/// URNs it depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructInput {
    pub value: PropertyValue,
    pub secret: bool,
    pub deps: Vec<Urn>,
}

impl ConstructInput {
    /// A fresh output of type `T` carrying this input, already resolved.
    ///
    /// The output is known unless the whole value is `Computed`; unknowns
    /// nested inside a known value stay where they are. A `Computed` input only
    /// reaches here during a preview: updates reject unknown inputs while
    /// decoding, so outside a preview every bound input is known.
    pub fn to_output<T>(&self) -> Output<T> {
        let out = Output::new(self.deps.clone());
        out.resolve(self.value.clone(), !self.value.is_computed(), self.secret, Vec::new());
        out
    }
}

/// The inputs of one construct call, by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstructInputs {
    inputs: BTreeMap<String, ConstructInput>,
}

impl ConstructInputs {
    pub fn new(inputs: BTreeMap<String, ConstructInput>) -> Self {
        Self { inputs }
    }

    pub fn get(&self, name: &str) -> Option<&ConstructInput> {
        self.inputs.get(name)
    }

    pub fn len(&self) -> usize {
        self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ConstructInput)> {
        self.inputs.iter()
    }

    /// Every input as an untyped output.
    pub fn to_map(&self) -> BTreeMap<String, AnyOutput> {
        self.inputs.iter().map(|(k, v)| (k.clone(), v.to_output())).collect()
    }

    /// Assigns each input to the field of `target` whose tag matches its name.
    /// Inputs with no matching field are ignored.
    pub fn bind<T: Fields>(&self, target: &mut T) {
        let fields = T::fields();
        for (name, input) in &self.inputs {
            for field in fields.iter().filter(|f| f.tag == name.as_str()) {
                (field.assign)(target, input);
            }
        }
    }
}

/// A field type that can receive a construct input and be read back as one.
pub trait InputField {
    fn from_input(input: &ConstructInput) -> Self;

    /// The field's current value, if it holds one.
    fn as_input(&self) -> Option<AnyOutput>;
}

impl<T: OutputValue> InputField for Output<T> {
    fn from_input(input: &ConstructInput) -> Self {
        input.to_output()
    }

    fn as_input(&self) -> Option<AnyOutput> {
        Some(self.untyped())
    }
}

impl<T: OutputValue> InputField for Option<Output<T>> {
    fn from_input(input: &ConstructInput) -> Self {
        Some(input.to_output())
    }

    fn as_input(&self) -> Option<AnyOutput> {
        self.as_ref().map(Output::untyped)
    }
}

/// Setter and getter for one tagged field of `T`.
pub struct Field<T> {
    pub tag: &'static str,
    pub assign: fn(&mut T, &ConstructInput),
    pub read: fn(&T) -> Option<AnyOutput>,
}

/// A struct with a field table.
pub trait Fields: Sized {
    fn fields() -> Vec<Field<Self>>;
}

/// Generates `Fields` for a struct from `field => "tag"` pairs.
///
/// ```ignore
/// construct_fields!(BucketArgs {
///     bucket_name => "bucketName",
///     tags => "tags",
/// });
/// ```
#[macro_export]
macro_rules! construct_fields {
    ($ty:ty { $($field:ident => $tag:literal),* $(,)? }) => {
        impl $crate::bind::Fields for $ty {
            fn fields() -> ::std::vec::Vec<$crate::bind::Field<Self>> {
                ::std::vec![
                    $(
                        $crate::bind::Field {
                            tag: $tag,
                            assign: |target: &mut Self, input: &$crate::bind::ConstructInput| {
                                target.$field = $crate::bind::InputField::from_input(input);
                            },
                            read: |source: &Self| $crate::bind::InputField::as_input(&source.$field),
                        },
                    )*
                ]
            }
        }
    };
}

/// A component resource whose state a construct call returns.
pub trait ComponentResource: Fields {
    fn urn(&self) -> Output<Urn>;
}

/// Every tagged field that currently holds a value, by tag.
pub fn extract_state<T: Fields>(source: &T) -> BTreeMap<String, AnyOutput> {
    T::fields()
        .iter()
        .filter_map(|field| (field.read)(source).map(|out| (field.tag.to_string(), out)))
        .collect()
}
